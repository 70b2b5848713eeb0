pub mod analytic;
pub mod couplings;
pub mod geometry;
pub mod lcoe;
pub mod materials;
pub mod mesh;
pub mod met_history;
pub mod met_models;
pub mod model;
pub mod parameters;
pub mod physics;
pub mod power;
pub mod results;
pub mod study;
pub mod units;

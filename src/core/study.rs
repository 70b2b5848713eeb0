use crate::core::units::{DAYS_PER_YEAR, SECONDS_PER_DAY, SECONDS_PER_HOUR};
use crate::errors::ModelError;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;

/// Most output times a study may ask for: a year at roughly 30 s steps.
pub const MAX_OUTPUT_TIMES: usize = 1_000_000;

/// Output times `start, start + step, ...` up to and including `end` when it falls on a step.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TimeRange {
    #[validate(minimum = 0.)]
    pub start: f64,
    #[validate(exclusive_minimum = 0.)]
    pub step: f64,
    #[validate(minimum = 0.)]
    pub end: f64,
}

impl Default for TimeRange {
    /// One year at hourly steps.
    fn default() -> Self {
        Self {
            start: 0.,
            step: SECONDS_PER_HOUR as f64,
            end: (DAYS_PER_YEAR * SECONDS_PER_DAY) as f64,
        }
    }
}

impl TimeRange {
    pub fn expression(&self) -> String {
        format!("range({},{},{})", self.start, self.step, self.end)
    }

    /// Number of output times, saturating at [`MAX_OUTPUT_TIMES`]; [`TimeRange::check_len`]
    /// rejects ranges that would go beyond it.
    pub fn len(&self) -> usize {
        if self.end < self.start {
            return 0;
        }
        self.output_steps().min(MAX_OUTPUT_TIMES as f64) as usize
    }

    pub fn check_len(&self) -> Result<(), ModelError> {
        let count = self.output_steps();
        if self.end >= self.start && !(count <= MAX_OUTPUT_TIMES as f64) {
            return Err(ModelError::TooManyOutputTimes {
                count,
                max: MAX_OUTPUT_TIMES,
            });
        }

        Ok(())
    }

    fn output_steps(&self) -> f64 {
        // tolerate an end that misses the last step by rounding only
        ((self.end - self.start) / self.step + 1e-9).floor() + 1.
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn outputs(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(|i| self.start + i as f64 * self.step)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BdfSteps {
    Free,
    Intermediate,
    #[default]
    Strict,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JacobianUpdate {
    Minimal,
    #[default]
    Once,
    EveryIteration,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearSolver {
    #[default]
    Pardiso,
    Mumps,
    Spooles,
}

/// Static settings for the transient solve. Every field has a default, so a run configuration
/// only needs to name what it changes.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    #[validate]
    pub times: TimeRange,
    #[validate(exclusive_minimum = 0.)]
    pub absolute_tolerance: f64,
    #[validate(exclusive_minimum = 0.)]
    #[validate(maximum = 1.)]
    pub tolerance_factor: f64,
    pub bdf_steps: BdfSteps,
    #[validate(minimum = 1)]
    #[validate(maximum = 5)]
    pub max_bdf_order: u8,
    #[validate(minimum = 1)]
    pub max_newton_iterations: u32,
    #[validate(exclusive_minimum = 0.)]
    #[validate(maximum = 1.)]
    pub damping: f64,
    pub jacobian_update: JacobianUpdate,
    pub linear_solver: LinearSolver,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            times: Default::default(),
            absolute_tolerance: 1e-3,
            tolerance_factor: 0.1,
            bdf_steps: Default::default(),
            max_bdf_order: 2,
            max_newton_iterations: 5,
            damping: 0.9,
            jacobian_update: Default::default(),
            linear_solver: Default::default(),
        }
    }
}

/// Solved fields that get an explicit absolute tolerance.
pub const TOLERANCE_FIELDS: [&str; 2] = ["comp1_T", "comp1_rad_J"];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldTolerance {
    pub field: String,
    pub absolute: f64,
    pub factor: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransientStudy {
    pub times: String,
    pub output_count: usize,
    pub tolerances: Vec<FieldTolerance>,
    pub config: SolverConfig,
}

impl TransientStudy {
    pub fn new(config: SolverConfig) -> Result<Self, ModelError> {
        config.times.check_len()?;

        Ok(Self {
            times: config.times.expression(),
            output_count: config.times.len(),
            tolerances: TOLERANCE_FIELDS
                .iter()
                .map(|field| FieldTolerance {
                    field: field.to_string(),
                    absolute: config.absolute_tolerance,
                    factor: config.tolerance_factor,
                })
                .collect(),
            config,
        })
    }
}

use crate::core::units::TiltError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PvthermError {
    #[error("Inputs could not be loaded: {0}")]
    InvalidInput(#[from] InputError),
    #[error("Model description is inconsistent: {0}")]
    InvalidModel(#[from] ModelError),
    #[error("Error reported by the solver backend: {0}")]
    FailureInSolve(#[from] SolveError),
    #[error("Error during postprocessing: {0}")]
    ErrorInPostprocessing(#[from] PostprocessingError),
}

/// Errors raised while reading the side-channel inputs. Each one names the file it came from,
/// and none of them is recoverable: a model is never assembled from a partial input.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Could not read tilt file {path}: {source}. Write the array tilt in degrees (e.g. `40`) on its first line.")]
    TiltFileUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Tilt file {path} is empty. Write the array tilt in degrees (e.g. `40`) on its first line.")]
    TiltFileEmpty { path: PathBuf },
    #[error("Tilt file {path} does not hold a usable tilt: {source}")]
    InvalidTilt { path: PathBuf, source: TiltError },
    #[error("Could not open meteorological history {path}: {source}")]
    MetHistoryUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Meteorological history row {row} could not be read: {source}")]
    MetCsv { row: usize, source: csv::Error },
    #[error("Meteorological history row {row} has {found} columns, expected at least {expected} (elapsed time followed by one column per channel)")]
    TooFewColumns {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("Meteorological history row {row}, column {column} is not a finite number: {value:?}")]
    NonNumericField {
        row: usize,
        column: usize,
        value: String,
    },
    #[error("Meteorological history has {found} data rows, at least 2 are needed to interpolate")]
    TooFewRows { found: usize },
    #[error("Meteorological history row {row} has elapsed time {current} which does not follow {previous}")]
    NonIncreasingTime {
        row: usize,
        previous: f64,
        current: f64,
    },
    #[error("Could not read run configuration {path}: {source}")]
    ConfigUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Run configuration is not valid JSON for this model: {0}")]
    ConfigMalformed(#[from] serde_json::Error),
    #[error("Run configuration values are out of range: {0}")]
    ConfigOutOfRange(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Parameter {0} is defined more than once")]
    DuplicateParameter(String),
    #[error("{owner} refers to {symbol}, which is not defined before it")]
    UnresolvedSymbol { owner: String, symbol: String },
    #[error("Parameters depend on each other in a cycle involving {0}")]
    CircularParameters(String),
    #[error("{owner} is attached to {handle}, which the geometry build did not produce")]
    UnknownHandle { owner: String, handle: String },
    #[error("Neighbouring rows reach x = {reach:.3} m, beyond the ground line which ends at ±{half_width} m")]
    RowsBeyondGround { reach: f64, half_width: f64 },
    #[error("Study would produce {count} output times, more than the limit of {max}")]
    TooManyOutputTimes { count: f64, max: usize },
}

/// Problems with an angle-resolved optics table.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AngleTableError {
    #[error("Angle table has {found} angles, at least 2 are needed to interpolate")]
    TooFewAngles { found: usize },
    #[error("Angle table has {angles} angles but {values} values")]
    MismatchedLengths { angles: usize, values: usize },
    #[error("Angle {current} in the angle table does not follow {previous}")]
    NonIncreasingAngle { previous: f64, current: f64 },
    #[error("Angle table holds a non-finite entry at {angle} degrees")]
    NonFiniteEntry { angle: f64 },
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct SolveError {
    error: anyhow::Error,
}

impl SolveError {
    pub fn new(error: anyhow::Error) -> Self {
        Self { error }
    }
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct PostprocessingError {
    error: anyhow::Error,
}

impl PostprocessingError {
    pub fn new(error: anyhow::Error) -> Self {
        Self { error }
    }
}

impl From<anyhow::Error> for PostprocessingError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(error)
    }
}

use thiserror::Error;

/// An error raised while configuring or populating a [Road](crate::Road).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RoadError {
    #[error("no lanes are present; call `init_lanes` before adding vehicles")]
    LanesUninitialized,

    #[error("vehicle can't be placed on the road: needs {required} lanes but only {available} exist")]
    VehicleTooWide { required: usize, available: usize },

    #[error("signal can only be GREEN or RED, got {0:?}")]
    InvalidSignal(String),

    #[error("a road needs at least one lane, got {0}")]
    InvalidLaneCount(usize),

    #[error("speed spread must be a non-negative standard deviation, got {0}")]
    InvalidSpeedSpread(f64),

    #[error("lane table is inconsistent: {0}")]
    InvariantViolation(String),
}

pub type RoadResult<T> = Result<T, RoadError>;

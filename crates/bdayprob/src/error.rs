use thiserror::Error;

/// Failure modes of a solver run.
///
/// Malformed arguments surface as [`SolverError::BadInput`]; the remaining
/// variants describe numeric limits hit while setting up or running a
/// calculation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolverError {
    #[error("{0}")]
    BadInput(String),

    /// The log of the population size needs more integer digits than the
    /// precision cap allows, so no calculation can even start.
    #[error("dLog exceeds maximum size and is needed to initialize calculations")]
    DLogNotCalculated,

    /// The plain population size is unrepresentable but the requested method
    /// cannot work from its log alone.
    #[error("d exceeds maximum size and is needed for method")]
    DNeededForMethod,

    /// The plain sample count is unrepresentable but the requested method
    /// cannot work from its log alone.
    #[error("n exceeds maximum size and is needed for method")]
    NNeededForMethod,

    #[error("needed precision for method exceeds maximum precision")]
    TooHighPrecision,

    /// An intermediate result left the representable range.
    #[error("intermediate result exceeds the representable range")]
    Overflow,
}

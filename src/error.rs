//! Error types for lookup table construction and evaluation.

use thiserror::Error;

/// Errors that can occur while building, loading or evaluating a lookup
/// table.
#[derive(Error, Debug)]
pub enum LutError {
    /// The step size handed to a table constructor was zero or negative.
    #[error("lookup tables need a positive step size, got {step}")]
    NonPositiveStepSize { step: f64 },

    /// A family that samples derivatives was built from a container without
    /// a derivative slot.
    #[error(
        "{family} needs derivatives up to order {order} but the function \
         container has no derivative closure"
    )]
    MissingDerivatives { family: String, order: usize },

    /// The registry has no builder under the requested name.
    #[error("unknown lookup table name: {name}")]
    UnknownTableName { name: String },

    /// Composite construction: at least one child table is required.
    #[error("a composite table needs at least one child table")]
    EmptyComposite,

    /// Composite construction: every child table name needs a step size.
    #[error(
        "{names} table name(s) need a corresponding step size but {steps} \
         step size(s) were given"
    )]
    MismatchedStepSizes { names: usize, steps: usize },

    /// Composite construction: `n` children need `n + 1` special points.
    #[error(
        "{names} child table(s) need {expected} special points (both \
         endpoints and every breakpoint) but {points} were given"
    )]
    MismatchedSpecialPoints {
        names: usize,
        expected: usize,
        points: usize,
    },

    /// Composite construction: breakpoint abscissae must be strictly
    /// increasing.
    #[error(
        "special point x values must be strictly increasing, but point \
         {index} is not above its predecessor"
    )]
    UnorderedSpecialPoints { index: usize },

    /// Composite evaluation outside the union of the children's domains.
    #[error("composite table is undefined for x = {x}")]
    DomainOutOfRange { x: f64 },

    /// No transfer function approximation passed the monotonicity and
    /// endpoint checks.
    #[error(
        "every polynomial approximation of the transfer function using \
         {coefs} coefficients is too poorly conditioned"
    )]
    TransferFunctionFit { coefs: usize },

    /// The generator's bracketing stage ran out of iterations without a
    /// usable lower step size.
    #[error(
        "step-size search did not meet the tolerance within {iterations} \
         iterations; last bracket was [{lo}, {hi}]"
    )]
    ConvergenceFailure {
        iterations: usize,
        lo: f64,
        hi: f64,
    },

    /// Both size probes reported the same data size, so the affine size
    /// model has no slope to solve with.
    #[error("size probes returned identical data sizes ({bytes} bytes)")]
    EqualSizeProbes { bytes: usize },

    /// A serialized table declared a different family than the one it is
    /// being loaded as.
    #[error("serialized table is a {found}, cannot load it as a {expected}")]
    NameMismatch { expected: String, found: String },

    /// A serialized table is internally inconsistent.
    #[error("serialized table is malformed: {reason}")]
    MalformedRecord { reason: String },

    /// JSON (de)serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type for lookup table operations.
pub type LutResult<T> = Result<T, LutError>;

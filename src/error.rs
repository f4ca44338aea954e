//! Error types
//!
//! Two families of failure exist in a run:
//!
//! - [`ConfigError`]: the input cannot describe a simulation (unknown names,
//!   too few grid points, non-positive spacing, ...). Raised while the
//!   configuration is normalized, before any time step runs.
//! - [`SolverError`]: a numerical failure during the time loop. Every variant
//!   carries the step index and simulation time at which it happened.
//!
//! Rate clamping for non-positive reactants and identity rows for vanished
//! solid components are *not* errors; they are handled inside the assembler.

use thiserror::Error;

/// Result type for configuration normalization
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for solver operations
pub type SolverResult<T> = Result<T, SolverError>;

/// Structural problems in the input configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A named entity was referenced but never declared
    #[error("unknown {kind} '{name}'")]
    UnknownName { kind: &'static str, name: String },

    /// The same name was declared twice
    #[error("duplicate {kind} '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    /// A layer asks for fewer than two grid points
    #[error("layer '{layer}' requests {points} grid point(s), at least 2 are required")]
    TooFewPoints { layer: String, points: usize },

    /// A length, spacing, time step or similar quantity is not strictly positive
    #[error("{what} must be strictly positive, got {value}")]
    NonPositive { what: String, value: f64 },

    /// A value outside its admissible range
    #[error("{what} must be {expected}, got {value}")]
    OutOfRange {
        what: String,
        value: f64,
        expected: &'static str,
    },

    /// A per-entity list does not line up with the entity count
    #[error("{what}: expected {expected} entries, got {found}")]
    LengthMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    /// A reaction without reactants has no rate
    #[error("reaction '{0}' has no reactants")]
    EmptyReaction(String),

    /// Nothing to simulate
    #[error("configuration declares no {0}")]
    Missing(&'static str),

    /// The simulated time window is empty or reversed
    #[error("invalid time window: start {start} must precede end {end}")]
    TimeWindow { start: f64, end: f64 },

    /// Deposition needs a deposition layer on top of at least one real layer
    #[error("deposition requires at least two layers (deposition layer + one base layer), got {0}")]
    DepositionWithoutBase(usize),
}

/// Numerical failures during a run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// The input could not be normalized
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// LU factorization failed on the step matrix (or the Newton Jacobian)
    #[error("singular coefficient matrix at step {step} (t = {time})")]
    SingularMatrix { step: usize, time: f64 },

    /// The solution contains NaN or Inf
    #[error("non-finite value for '{species}' at step {step} (t = {time}); try a smaller time step")]
    NonFinite {
        species: String,
        step: usize,
        time: f64,
    },

    /// Newton-Raphson correction exceeded its iteration cap
    #[error(
        "Newton-Raphson did not converge in {iterations} iterations at step {step} (t = {time}): \
         '{species}' still moves by {error:e} (relative)"
    )]
    NotConverged {
        step: usize,
        time: f64,
        iterations: usize,
        species: String,
        error: f64,
    },
}

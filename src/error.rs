// src/error.rs
//
// Error kinds surfaced by the simulation core.

/// Errors raised while configuring or running a search simulation.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Priors, region count, region extents or effectiveness bounds are unusable.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// Bayesian revision denominator was zero (or not finite).
    #[error("degenerate belief update: denominator {denominator}")]
    DegenerateBelief { denominator: f64 },

    /// A policy produced an allocation the round cannot execute.
    #[error("invalid allocation: {reason}")]
    InvalidAllocation { reason: String },

    /// Scenario file could not be read, parsed or validated.
    #[error("scenario '{path}': {reason}")]
    Scenario { path: String, reason: String },

    #[error("worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SearchError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        SearchError::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

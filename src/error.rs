//! Application-wide error types.
//!
//! Library modules use specific error types via `thiserror`, while
//! CLI/main uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: errors from wiring the application together
//! - Subsystem errors (`RecommendationFailure`, `ResolutionFailure`,
//!   `DeviceError`, `ConfigError`) live next to the code that raises them
//! - [`FetchFailure`] / [`FailureKind`]: what the scheduler sees when a
//!   recommend+resolve sequence fails, and the policy class it falls into
//!
//! # Example
//!
//! ```ignore
//! use livedj::error::{FailureKind, FetchFailure};
//!
//! let failure = FetchFailure::from(ResolutionFailure::NoResults);
//! assert_eq!(failure.kind(), FailureKind::NoResults);
//! ```

use crate::recommend::RecommendationFailure;
use crate::resolve::ResolutionFailure;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration content error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Failure of one recommend-then-resolve sequence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    #[error(transparent)]
    Recommendation(#[from] RecommendationFailure),

    #[error(transparent)]
    Resolution(#[from] ResolutionFailure),
}

/// Policy class of a fetch failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Halt the session and send the user to credential entry
    InvalidCredential,
    /// Persistent status message, no automatic retry
    QuotaExceeded,
    /// Transient, retried after a short delay
    NoResults,
    /// Status message, no automatic retry
    Provider(String),
}

impl FetchFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Recommendation(RecommendationFailure::InvalidCredential)
            | Self::Resolution(ResolutionFailure::InvalidCredential) => {
                FailureKind::InvalidCredential
            }
            Self::Resolution(ResolutionFailure::QuotaExceeded) => FailureKind::QuotaExceeded,
            Self::Resolution(ResolutionFailure::NoResults) => FailureKind::NoResults,
            Self::Recommendation(RecommendationFailure::ProviderError(detail))
            | Self::Resolution(ResolutionFailure::ProviderError(detail)) => {
                FailureKind::Provider(detail.clone())
            }
        }
    }
}

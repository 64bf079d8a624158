//! Resolution gateway - turns a recommended track into playable media handles.
//!
//! Providers must preserve their relevance ordering: the first handle is the
//! primary candidate, the rest become the fallback pool. A provider that
//! finds nothing reports [`ResolutionFailure::NoResults`]; an empty success
//! is unrepresentable because [`MediaCandidates`] is non-empty by construction.

pub mod youtube;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{Config, ResolutionProvider};
use crate::error::Error;
use crate::model::{MediaCandidates, Track};

pub use youtube::YouTubeClient;

/// Classified resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionFailure {
    #[error("Media provider rejected the API key")]
    InvalidCredential,

    #[error("Media provider quota exhausted")]
    QuotaExceeded,

    #[error("No playable media found")]
    NoResults,

    #[error("Media provider error: {0}")]
    ProviderError(String),
}

/// A source of playable media for tracks.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, track: &Track) -> Result<MediaCandidates, ResolutionFailure>;
}

#[async_trait]
impl Resolver for YouTubeClient {
    async fn resolve(&self, track: &Track) -> Result<MediaCandidates, ResolutionFailure> {
        self.search(track).await
    }
}

/// Build the resolver selected in `config`.
pub fn build(config: &Config) -> Result<Arc<dyn Resolver>, Error> {
    let provider = config.providers.resolution;
    let key = config
        .credentials
        .get(provider.key())
        .ok_or_else(|| Error::config(format!("No API key configured for {}", provider.name())))?;

    match provider {
        ResolutionProvider::YouTube => Ok(Arc::new(YouTubeClient::new(key))),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_key() {
        let mut config = Config::default();
        config.credentials.set("claude", "sk-test");
        assert!(build(&config).is_err());

        config.credentials.set("youtube", "AIza-test");
        assert!(build(&config).is_ok());
    }

    #[tokio::test]
    async fn test_scripted_resolver_empty_list_is_no_results() {
        let mock = mocks::ScriptedResolver::default();
        mock.push_handles(&[]);
        let track = Track::new("T", "A", None);
        assert_eq!(mock.resolve(&track).await, Err(ResolutionFailure::NoResults));
    }
}

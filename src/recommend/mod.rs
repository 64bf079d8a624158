//! Recommendation gateway - asks a generative provider for the next track.
//!
//! # Architecture
//!
//! Same layering as every external integration in this crate:
//! - **Trait** ([`Recommender`]) - the seam the scheduler depends on
//! - **Decoding** (`decode.rs`) - defensive parsing of free-text provider output
//! - **Providers** (`claude/`) - HTTP client, DTOs and adapter per provider
//!
//! The gateway only shapes the request and classifies the response. Avoiding
//! repeats is delegated to the provider through the supplied history, and
//! retry policy belongs to the scheduler: nothing here retries.

pub mod claude;
pub mod decode;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{Config, RecommendationProvider};
use crate::error::Error;
use crate::model::Track;

pub use claude::ClaudeClient;
pub use decode::parse_track;

/// Classified recommendation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecommendationFailure {
    #[error("Recommendation provider rejected the API key")]
    InvalidCredential,

    #[error("Recommendation provider error: {0}")]
    ProviderError(String),
}

/// A source of track recommendations.
#[async_trait]
pub trait Recommender: Send + Sync {
    /// Suggest exactly one track for `mood`, avoiding what `history` already played.
    async fn recommend(&self, mood: &str, history: &[Track]) -> Result<Track, RecommendationFailure>;
}

#[async_trait]
impl Recommender for ClaudeClient {
    async fn recommend(&self, mood: &str, history: &[Track]) -> Result<Track, RecommendationFailure> {
        self.next_track(mood, history).await
    }
}

/// Build the recommender selected in `config`.
pub fn build(config: &Config) -> Result<Arc<dyn Recommender>, Error> {
    let provider = config.providers.recommendation;
    let key = config
        .credentials
        .get(provider.key())
        .ok_or_else(|| Error::config(format!("No API key configured for {}", provider.name())))?;

    match provider {
        RecommendationProvider::Claude => Ok(Arc::new(ClaudeClient::new(key))),
    }
}

/// Scripted recommenders for scheduler tests.
#[cfg(test)]
pub mod mocks {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Returns queued results in order and records every request's history.
    ///
    /// Once the script runs dry every call fails with a provider error.
    #[derive(Default)]
    pub struct ScriptedRecommender {
        script: Mutex<VecDeque<Result<Track, RecommendationFailure>>>,
        calls: Mutex<Vec<(String, Vec<Track>)>>,
    }

    impl ScriptedRecommender {
        pub fn new(script: Vec<Result<Track, RecommendationFailure>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn push(&self, result: Result<Track, RecommendationFailure>) {
            self.script.lock().push_back(result);
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        pub fn calls(&self) -> Vec<(String, Vec<Track>)> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl Recommender for ScriptedRecommender {
        async fn recommend(
            &self,
            mood: &str,
            history: &[Track],
        ) -> Result<Track, RecommendationFailure> {
            self.calls.lock().push((mood.to_string(), history.to_vec()));
            self.script.lock().pop_front().unwrap_or_else(|| {
                Err(RecommendationFailure::ProviderError("script exhausted".to_string()))
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_scripted_recommender_in_order() {
            let mock = ScriptedRecommender::new(vec![
                Ok(Track::new("A", "X", None)),
                Err(RecommendationFailure::InvalidCredential),
            ]);
            assert_eq!(mock.recommend("calm", &[]).await.unwrap().title, "A");
            assert_eq!(
                mock.recommend("calm", &[]).await,
                Err(RecommendationFailure::InvalidCredential)
            );
            assert!(matches!(
                mock.recommend("calm", &[]).await,
                Err(RecommendationFailure::ProviderError(_))
            ));
            assert_eq!(mock.call_count(), 3);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_key() {
        let config = Config::default();
        assert!(build(&config).is_err());
    }

    #[test]
    fn test_build_with_key() {
        let config = crate::test_utils::complete_config();
        assert!(build(&config).is_ok());
    }
}

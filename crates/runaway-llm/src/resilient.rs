//! Bounded retry with exponential backoff for any collaborator.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use runaway_core::catalog::PassengerProfile;
use runaway_core::collaborator::{
    ChatLine, CollaboratorError, DialogueGenerator, GuessGenerator, GuessRequest, GuessResponse,
    SimilarityScorer, SpeechSynthesizer,
};
use tracing::{error, info, warn};

/// Retry behaviour.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 = single attempt).
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on any delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Random spread applied to each delay, as a fraction of it (0.0-1.0).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 5_000,
            jitter_factor: 0.2,
        }
    }
}

impl RetryConfig {
    /// Default delays with `max_retries` retries.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = exponential.min(self.max_delay_ms);

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let jitter_range = (capped as f64 * self.jitter_factor.clamp(0.0, 1.0)) as u64;
        if jitter_range == 0 {
            return Duration::from_millis(capped);
        }
        let low = capped.saturating_sub(jitter_range);
        let high = capped.saturating_add(jitter_range);
        Duration::from_millis(rand::rng().random_range(low..=high))
    }
}

/// Wraps a collaborator and retries its retryable failures.
#[derive(Debug, Clone)]
pub struct Resilient<C> {
    inner: C,
    config: RetryConfig,
}

impl<C> Resilient<C> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: C, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    async fn execute<T, F, Fut>(&self, operation: &str, call: F) -> Result<T, CollaboratorError>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, CollaboratorError>> + Send,
        T: Send,
        C: Sync,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => {
                    if attempt > 0 {
                        info!(attempt = attempt + 1, operation, "collaborator call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_retryable() => {
                    error!(error = %e, operation, "collaborator call failed with non-retryable error");
                    return Err(e);
                }
                Err(e) if attempt >= self.config.max_retries => {
                    error!(
                        attempts = attempt + 1,
                        error = %e,
                        operation,
                        "collaborator call failed after all retry attempts"
                    );
                    return Err(e);
                }
                Err(e) => {
                    attempt += 1;
                    let delay = self.config.delay_for(attempt);
                    warn!(
                        attempt,
                        max_retries = self.config.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        operation,
                        "collaborator call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl<C: DialogueGenerator> DialogueGenerator for Resilient<C> {
    async fn generate_reply(
        &self,
        profile: &PassengerProfile,
        history: &[ChatLine],
    ) -> Result<String, CollaboratorError> {
        self.execute("generate_reply", || self.inner.generate_reply(profile, history))
            .await
    }
}

#[async_trait]
impl<C: GuessGenerator> GuessGenerator for Resilient<C> {
    async fn generate_guess(&self, request: &GuessRequest) -> Result<GuessResponse, CollaboratorError> {
        self.execute("generate_guess", || self.inner.generate_guess(request))
            .await
    }
}

#[async_trait]
impl<C: SimilarityScorer> SimilarityScorer for Resilient<C> {
    async fn score(&self, passcode: &str, guess: &str, theme: &str) -> Result<f64, CollaboratorError> {
        self.execute("score", || self.inner.score(passcode, guess, theme))
            .await
    }
}

#[async_trait]
impl<C: SpeechSynthesizer> SpeechSynthesizer for Resilient<C> {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, CollaboratorError> {
        self.execute("synthesize", || self.inner.synthesize(text)).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// Fails a set number of times before answering.
    struct Flaky {
        failures_remaining: AtomicU32,
        calls: AtomicU32,
        error: CollaboratorError,
    }

    impl Flaky {
        fn new(failures: u32, error: CollaboratorError) -> Self {
            Self {
                failures_remaining: AtomicU32::new(failures),
                calls: AtomicU32::new(0),
                error,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SimilarityScorer for Flaky {
        async fn score(&self, _p: &str, _g: &str, _t: &str) -> Result<f64, CollaboratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let remaining = self.failures_remaining.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
                Err(self.error.clone())
            } else {
                Ok(0.9)
            }
        }
    }

    fn fast(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay_ms: 1,
            max_delay_ms: 2,
            jitter_factor: 0.0,
        }
    }

    fn transient() -> CollaboratorError {
        CollaboratorError::RequestFailed("connection reset".into())
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let client = Resilient::new(Flaky::new(2, transient()), fast(2));

        let score = client.score("a", "b", "c").await.unwrap();

        assert!((score - 0.9).abs() < f64::EPSILON);
        assert_eq!(client.inner.calls(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let client = Resilient::new(Flaky::new(5, transient()), fast(2));

        let result = client.score("a", "b", "c").await;

        assert!(matches!(result, Err(CollaboratorError::RequestFailed(_))));
        assert_eq!(client.inner.calls(), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_client_errors() {
        let error = CollaboratorError::RequestFailed("status 401 Unauthorized: bad key".into());
        let client = Resilient::new(Flaky::new(1, error), fast(3));

        let result = client.score("a", "b", "c").await;

        assert!(result.is_err());
        assert_eq!(client.inner.calls(), 1);
    }

    #[test]
    fn test_delay_grows_exponentially_and_is_capped() {
        let config = RetryConfig {
            max_retries: 5,
            base_delay_ms: 100,
            max_delay_ms: 300,
            jitter_factor: 0.0,
        };

        assert_eq!(config.delay_for(1), Duration::from_millis(100));
        assert_eq!(config.delay_for(2), Duration::from_millis(200));
        assert_eq!(config.delay_for(3), Duration::from_millis(300));
        assert_eq!(config.delay_for(8), Duration::from_millis(300));
    }

    #[test]
    fn test_delay_jitter_stays_in_range() {
        let config = RetryConfig {
            max_retries: 1,
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
            jitter_factor: 0.2,
        };

        for _ in 0..50 {
            let delay = config.delay_for(1);
            assert!(delay >= Duration::from_millis(800));
            assert!(delay <= Duration::from_millis(1_200));
        }
    }
}

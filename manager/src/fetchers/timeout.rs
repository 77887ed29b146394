use futures::future::BoxFuture;
use keyed_request_core::environment::{ContentFetcher, FetchError};
use std::time::Duration;

/// Fetcher that fails with [`FetchError::Timeout`] when `inner` takes too long
///
/// The inner future is dropped on timeout, so the manager records
/// `Error { message: "timeout" }` for that fetch.
#[derive(Debug, Clone)]
pub struct TimeoutFetcher<F> {
    inner: F,
    timeout: Duration,
}

impl<F> TimeoutFetcher<F> {
    /// Bound `inner` by `timeout`
    #[must_use]
    pub const fn new(inner: F, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Configured timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wrapped fetcher
    #[must_use]
    pub const fn inner(&self) -> &F {
        &self.inner
    }
}

impl<K, F> ContentFetcher<K> for TimeoutFetcher<F>
where
    F: ContentFetcher<K>,
{
    fn fetch(&self, key: &K) -> BoxFuture<'static, Result<String, FetchError>> {
        let fetch = self.inner.fetch(key);
        let timeout = self.timeout;

        Box::pin(async move {
            tokio::time::timeout(timeout, fetch)
                .await
                .unwrap_or(Err(FetchError::Timeout))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyed_request_testing::mocks::{InMemoryFetcher, ScriptedFetcher};

    #[tokio::test]
    async fn test_passes_through_fast_results() {
        let fetcher = TimeoutFetcher::new(
            InMemoryFetcher::new().with_content("p1", "hello"),
            Duration::from_secs(5),
        );

        assert_eq!(fetcher.fetch(&"p1").await, Ok("hello".to_string()));
    }

    #[tokio::test]
    async fn test_passes_through_inner_errors() {
        let fetcher = TimeoutFetcher::new(
            InMemoryFetcher::<&str>::new(),
            Duration::from_secs(5),
        );

        assert!(matches!(
            fetcher.fetch(&"missing").await,
            Err(FetchError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_slow_fetch_times_out() {
        let scripted = ScriptedFetcher::new();
        let fetcher = TimeoutFetcher::new(scripted.clone(), Duration::from_millis(10));

        let result = fetcher.fetch(&"p1").await;
        assert_eq!(result, Err(FetchError::Timeout));
        assert_eq!(result.map_err(|e| e.to_string()), Err("timeout".to_string()));
        assert_eq!(scripted.call_count(), 1);
    }
}

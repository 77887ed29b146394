//! # Keyed Request Testing
//!
//! Testing utilities and helpers for the keyed request workspace.
//!
//! This crate provides:
//! - Mock implementations of the `ContentFetcher` capability
//! - A Given-When-Then harness for reducers
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use keyed_request_testing::mocks::ScriptedFetcher;
//!
//! #[tokio::test]
//! async fn test_slow_page_is_discarded() {
//!     let fetcher = ScriptedFetcher::new();
//!     let manager = KeyedRequestManager::new(fetcher.clone());
//!
//!     let mut first = manager.navigate("p1").await?;
//!     let mut second = manager.navigate("p1").await?;
//!
//!     fetcher.succeed(1, "new");
//!     fetcher.succeed(0, "old");
//!     second.wait().await;
//!     first.wait().await;
//! }
//! ```

/// Ergonomic testing utilities for reducers
pub mod reducer_test;

pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations of the fetch capability
///
/// - [`ScriptedFetcher`](mocks::ScriptedFetcher): every call waits until the test settles it,
///   so tests decide the completion order
/// - [`InMemoryFetcher`](mocks::InMemoryFetcher): canned responses with optional latency
pub mod mocks {
    use futures::future::BoxFuture;
    use keyed_request_core::environment::{ContentFetcher, FetchError};
    use std::collections::HashMap;
    use std::hash::Hash;
    use std::sync::{Arc, Mutex, PoisonError};
    use std::time::Duration;
    use tokio::sync::oneshot;

    type Reply = oneshot::Sender<Result<String, FetchError>>;

    /// One recorded call to [`ScriptedFetcher::fetch`]
    struct ScriptedCall<K> {
        key: K,
        reply: Option<Reply>,
    }

    /// Fetcher whose calls only settle when the test says so
    ///
    /// Calls are numbered in the order they were issued, starting at 0. Each
    /// call's future stays pending until [`succeed`](Self::succeed) or
    /// [`fail`](Self::fail) is called with its index. If the fetcher is dropped
    /// first, the outstanding futures fail with a transport error.
    ///
    /// # Example
    ///
    /// ```
    /// use keyed_request_core::environment::ContentFetcher;
    /// use keyed_request_testing::mocks::ScriptedFetcher;
    ///
    /// # tokio_test::block_on(async {
    /// let fetcher = ScriptedFetcher::new();
    /// let pending = fetcher.fetch(&"p1");
    /// assert_eq!(fetcher.calls(), vec!["p1"]);
    ///
    /// assert!(fetcher.succeed(0, "hello"));
    /// assert_eq!(pending.await, Ok("hello".to_string()));
    /// # });
    /// ```
    pub struct ScriptedFetcher<K> {
        calls: Arc<Mutex<Vec<ScriptedCall<K>>>>,
    }

    impl<K> ScriptedFetcher<K> {
        /// Create a fetcher with no recorded calls
        #[must_use]
        pub fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Keys of every call made so far, in issue order
        #[must_use]
        pub fn calls(&self) -> Vec<K>
        where
            K: Clone,
        {
            self.lock().iter().map(|call| call.key.clone()).collect()
        }

        /// Number of calls made so far
        #[must_use]
        pub fn call_count(&self) -> usize {
            self.lock().len()
        }

        /// Number of calls that have not been settled yet
        #[must_use]
        pub fn outstanding(&self) -> usize {
            self.lock().iter().filter(|call| call.reply.is_some()).count()
        }

        /// Settle call `index` with content
        ///
        /// Returns `false` if there is no such call or it was already settled.
        pub fn succeed(&self, index: usize, content: impl Into<String>) -> bool {
            self.settle(index, Ok(content.into()))
        }

        /// Settle call `index` with an error
        ///
        /// Returns `false` if there is no such call or it was already settled.
        pub fn fail(&self, index: usize, error: FetchError) -> bool {
            self.settle(index, Err(error))
        }

        fn settle(&self, index: usize, result: Result<String, FetchError>) -> bool {
            let reply = self
                .lock()
                .get_mut(index)
                .and_then(|call| call.reply.take());

            match reply {
                // The receiving side may already be gone; the call still counts as settled
                Some(reply) => {
                    let _ = reply.send(result);
                    true
                },
                None => false,
            }
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ScriptedCall<K>>> {
            self.calls.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl<K> Default for ScriptedFetcher<K> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<K> Clone for ScriptedFetcher<K> {
        fn clone(&self) -> Self {
            Self {
                calls: Arc::clone(&self.calls),
            }
        }
    }

    impl<K> ContentFetcher<K> for ScriptedFetcher<K>
    where
        K: Clone + Send + 'static,
    {
        fn fetch(&self, key: &K) -> BoxFuture<'static, Result<String, FetchError>> {
            let (tx, rx) = oneshot::channel();
            self.lock().push(ScriptedCall {
                key: key.clone(),
                reply: Some(tx),
            });

            Box::pin(async move {
                rx.await.unwrap_or_else(|_| {
                    Err(FetchError::Transport(
                        "scripted fetcher dropped before settling".to_string(),
                    ))
                })
            })
        }
    }

    /// Fetcher that answers from a fixed table
    ///
    /// Keys with no entry fail with `FetchError::Status { status: 404, .. }`.
    ///
    /// # Example
    ///
    /// ```
    /// use keyed_request_core::environment::{ContentFetcher, FetchError};
    /// use keyed_request_testing::mocks::InMemoryFetcher;
    ///
    /// # tokio_test::block_on(async {
    /// let fetcher = InMemoryFetcher::new()
    ///     .with_content("home", "welcome")
    ///     .with_failure("broken", FetchError::Timeout);
    ///
    /// assert_eq!(fetcher.fetch(&"home").await, Ok("welcome".to_string()));
    /// assert_eq!(fetcher.fetch(&"broken").await, Err(FetchError::Timeout));
    /// # });
    /// ```
    #[derive(Debug, Clone)]
    pub struct InMemoryFetcher<K> {
        responses: HashMap<K, Result<String, FetchError>>,
        latency: HashMap<K, Duration>,
    }

    impl<K: Eq + Hash> InMemoryFetcher<K> {
        /// Create a fetcher with an empty table
        #[must_use]
        pub fn new() -> Self {
            Self {
                responses: HashMap::new(),
                latency: HashMap::new(),
            }
        }

        /// Answer `key` with `content`
        #[must_use]
        pub fn with_content(mut self, key: K, content: impl Into<String>) -> Self {
            self.responses.insert(key, Ok(content.into()));
            self
        }

        /// Answer `key` with `error`
        #[must_use]
        pub fn with_failure(mut self, key: K, error: FetchError) -> Self {
            self.responses.insert(key, Err(error));
            self
        }

        /// Delay every answer for `key` by `latency`
        #[must_use]
        pub fn with_latency(mut self, key: K, latency: Duration) -> Self {
            self.latency.insert(key, latency);
            self
        }
    }

    impl<K: Eq + Hash> Default for InMemoryFetcher<K> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<K> ContentFetcher<K> for InMemoryFetcher<K>
    where
        K: Eq + Hash + std::fmt::Debug + Send + Sync,
    {
        fn fetch(&self, key: &K) -> BoxFuture<'static, Result<String, FetchError>> {
            let response = self.responses.get(key).cloned().unwrap_or_else(|| {
                Err(FetchError::Status {
                    status: 404,
                    url: format!("{key:?}"),
                })
            });
            let latency = self.latency.get(key).copied();

            Box::pin(async move {
                if let Some(latency) = latency {
                    tokio::time::sleep(latency).await;
                }
                response
            })
        }
    }
}

/// Initialize a `tracing` subscriber for tests
///
/// Honors `RUST_LOG`; safe to call from every test since only the first call
/// installs the subscriber.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{InMemoryFetcher, ScriptedFetcher};

//! Facade tying the keyed request reducer to a running `Store`.

use crate::action::ManagerAction;
use crate::reducer::{KeyedRequestReducer, ManagerEnvironment};
use crate::state::{Key, ManagerState};
use crate::view::PageView;
use keyed_request_core::{environment::ContentFetcher, RequestState};
use keyed_request_runtime::{EffectHandle, Store, StoreConfig, StoreError};
use std::time::Duration;
use tokio::sync::broadcast;

type ManagerStore<K> =
    Store<ManagerState<K>, ManagerAction<K>, ManagerEnvironment<K>, KeyedRequestReducer<K>>;

/// Race-safe manager of per-key request states
///
/// All state changes go through the store, which runs the reducer under a
/// write lock, so they are totally ordered. Fetches run as spawned tasks;
/// each carries the issue token it was dispatched with and its result is
/// dropped if a newer fetch for the same key was issued in the meantime.
///
/// Cloning is cheap and every clone drives the same state.
///
/// # Example
///
/// ```no_run
/// use keyed_request_manager::{KeyedRequestManager, PageView};
/// use keyed_request_manager::fetchers::HttpFetcher;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = KeyedRequestManager::new(HttpFetcher::new("https://example.com")?);
///
/// manager.prefetch(["news".to_string(), "about".to_string()]).await?;
/// let mut handle = manager.navigate("about".to_string()).await?;
/// handle.wait().await;
///
/// if let PageView::Loaded { content } = manager.view().await {
///     println!("{content}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct KeyedRequestManager<K: Key> {
    store: ManagerStore<K>,
}

impl<K: Key> KeyedRequestManager<K> {
    /// Create a manager that fetches through `fetcher`
    #[must_use]
    pub fn new<F>(fetcher: F) -> Self
    where
        F: ContentFetcher<K> + 'static,
    {
        Self::with_config(fetcher, StoreConfig::default())
    }

    /// Create a manager with custom store configuration
    #[must_use]
    pub fn with_config<F>(fetcher: F, config: StoreConfig) -> Self
    where
        F: ContentFetcher<K> + 'static,
    {
        let store = Store::with_config(
            ManagerState::new(),
            KeyedRequestReducer::new(),
            ManagerEnvironment::new(fetcher),
            config,
        );
        Self { store }
    }

    /// Make `key` current and fetch it
    ///
    /// When this returns, `current_key()` is `key` and `get_state(key)` is
    /// `Pending`. The returned handle completes once the fetch has settled
    /// and its result has been applied or discarded. Fetch failures are
    /// recorded as `Error` states and never surface here.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`shutdown`](Self::shutdown).
    pub async fn navigate(&self, key: K) -> Result<EffectHandle, StoreError> {
        self.store.send(ManagerAction::Navigate { key }).await
    }

    /// Fetch every key in `keys` that has never been requested
    ///
    /// Fetches run in parallel; the current key is unchanged and keys that
    /// already have a state are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`shutdown`](Self::shutdown).
    pub async fn prefetch<I>(&self, keys: I) -> Result<EffectHandle, StoreError>
    where
        I: IntoIterator<Item = K>,
    {
        let keys = keys.into_iter().collect();
        self.store.send(ManagerAction::Prefetch { keys }).await
    }

    /// Request state recorded for `key`, or `None` if it was never requested
    pub async fn get_state(&self, key: &K) -> Option<RequestState> {
        self.store.state(|s| s.get(key).cloned()).await
    }

    /// Key most recently navigated to
    pub async fn current_key(&self) -> Option<K> {
        self.store.state(|s| s.current_key().cloned()).await
    }

    /// Copy of the whole state
    pub async fn snapshot(&self) -> ManagerState<K> {
        self.store.state(Clone::clone).await
    }

    /// What the page area shows for the current key
    pub async fn view(&self) -> PageView {
        self.store.state(PageView::of).await
    }

    /// [`view`](Self::view) rendered as text
    pub async fn render(&self) -> String {
        self.view().await.to_string()
    }

    /// Receive every fetch settlement, including ones discarded as stale
    ///
    /// Settlements are broadcast just before the reducer processes them, so
    /// state read immediately on receipt may not reflect them yet. Wait on the
    /// [`EffectHandle`] returned by `navigate` to observe the applied result.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ManagerAction<K>> {
        self.store.subscribe_actions()
    }

    /// Number of fetches still in flight
    #[must_use]
    pub fn pending_fetches(&self) -> usize {
        self.store.pending_effects()
    }

    /// Stop accepting navigation and wait for in-flight fetches to settle
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if fetches are still running
    /// after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }

    /// [`shutdown`](Self::shutdown) with the configured default timeout
    ///
    /// # Errors
    ///
    /// Same as [`shutdown`](Self::shutdown).
    pub async fn shutdown_default(&self) -> Result<(), StoreError> {
        self.store.shutdown_default().await
    }
}

impl<K: Key> Clone for KeyedRequestManager<K> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

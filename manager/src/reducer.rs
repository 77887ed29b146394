//! Reducer implementing navigation, prefetch and stale-result rejection.

use crate::action::ManagerAction;
use crate::state::{IssueToken, Key, ManagerState};
use keyed_request_core::{
    effect::Effect, environment::ContentFetcher, reducer::Reducer, smallvec, RequestState,
    SmallVec,
};
use keyed_request_runtime::metrics::{FetchMetrics, FetchOutcome};
use std::marker::PhantomData;
use std::sync::Arc;

/// Injected dependencies of the manager
///
/// The fetcher is called from inside the reducer, so the returned future is
/// created while the state write lock is held and owns everything it needs.
pub struct ManagerEnvironment<K> {
    /// Capability used to retrieve content for a key
    pub fetcher: Arc<dyn ContentFetcher<K>>,
}

impl<K> ManagerEnvironment<K> {
    /// Create an environment around a fetcher
    #[must_use]
    pub fn new<F>(fetcher: F) -> Self
    where
        F: ContentFetcher<K> + 'static,
    {
        Self {
            fetcher: Arc::new(fetcher),
        }
    }
}

impl<K> Clone for ManagerEnvironment<K> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

impl<K> std::fmt::Debug for ManagerEnvironment<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagerEnvironment")
            .field("fetcher", &"<dyn ContentFetcher>")
            .finish()
    }
}

/// Keyed request reducer
///
/// - `Navigate`: make the key current, mark it `Pending`, issue a token, fetch
/// - `Prefetch`: the same for every never-requested key, current key untouched,
///   fetches run in parallel
/// - `FetchSucceeded` / `FetchFailed`: record the outcome only if the carried
///   token is still the latest one issued for the key
#[derive(Debug, Clone, Copy)]
pub struct KeyedRequestReducer<K> {
    _phantom: PhantomData<K>,
}

impl<K> KeyedRequestReducer<K> {
    /// Create a new keyed request reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<K> Default for KeyedRequestReducer<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key> KeyedRequestReducer<K> {
    /// Mark `key` pending, issue its next token and build the fetch effect
    ///
    /// A key whose tokens are exhausted keeps its last state and is not fetched.
    fn issue_fetch(
        state: &mut ManagerState<K>,
        key: K,
        env: &ManagerEnvironment<K>,
    ) -> Effect<ManagerAction<K>> {
        let Some(token) = state.begin_request(key.clone()) else {
            tracing::error!(key = ?key, "Issue tokens exhausted, fetch not dispatched");
            return Effect::None;
        };
        FetchMetrics::record_issued();
        tracing::debug!(key = ?key, token = token.value(), "Fetch issued");

        let fetch = env.fetcher.fetch(&key);
        Effect::Future(Box::pin(async move {
            let action = match fetch.await {
                Ok(content) => ManagerAction::FetchSucceeded {
                    key,
                    token,
                    content,
                },
                Err(error) => {
                    tracing::warn!(key = ?key, token = token.value(), error = %error, "Fetch failed");
                    ManagerAction::FetchFailed {
                        key,
                        token,
                        message: error.to_string(),
                    }
                },
            };
            Some(action)
        }))
    }

    /// Apply a settled fetch unless a newer one was issued for the same key
    fn settle(
        state: &mut ManagerState<K>,
        key: K,
        token: IssueToken,
        outcome: RequestState,
    ) {
        if !state.is_latest(&key, token) {
            tracing::trace!(
                key = ?key,
                token = token.value(),
                latest = ?state.latest_token(&key),
                "Discarding stale fetch result"
            );
            FetchMetrics::record_stale();
            return;
        }

        let label = if outcome.is_ok() {
            FetchOutcome::Ok
        } else {
            FetchOutcome::Error
        };
        FetchMetrics::record_settled(label);
        tracing::debug!(key = ?key, token = token.value(), outcome = label.as_str(), "Fetch settled");
        state.record(key, outcome);
    }
}

impl<K: Key> Reducer for KeyedRequestReducer<K> {
    type State = ManagerState<K>;
    type Action = ManagerAction<K>;
    type Environment = ManagerEnvironment<K>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ManagerAction::Navigate { key } => {
                tracing::debug!(key = ?key, "Navigating");
                state.set_current(key.clone());
                smallvec![Self::issue_fetch(state, key, env)]
            },
            ManagerAction::Prefetch { keys } => {
                let mut fetches = Vec::new();
                for key in keys {
                    // Also skips duplicates within the same batch
                    if state.get(&key).is_none() {
                        fetches.push(Self::issue_fetch(state, key, env));
                    }
                }

                if fetches.is_empty() {
                    smallvec![Effect::None]
                } else {
                    smallvec![Effect::merge(fetches)]
                }
            },
            ManagerAction::FetchSucceeded {
                key,
                token,
                content,
            } => {
                Self::settle(state, key, token, RequestState::ok(content));
                smallvec![Effect::None]
            },
            ManagerAction::FetchFailed {
                key,
                token,
                message,
            } => {
                Self::settle(state, key, token, RequestState::error(message));
                smallvec![Effect::None]
            },
        }
    }
}

//! Manager state: the current key, per-key request states and issue tokens.

use keyed_request_core::{Deserialize, RequestState, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Bounds every request key must satisfy
///
/// Implemented for all types that qualify, e.g. `String`, `&'static str`, `u32`.
pub trait Key: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Key for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Stamp identifying one issued fetch for one key
///
/// The first fetch issued for a key carries token 1; each later fetch for the
/// same key carries the previous token + 1. Tokens of different keys are
/// unrelated. A key whose latest token is `u64::MAX` cannot be fetched again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IssueToken(u64);

impl IssueToken {
    /// Token of the first fetch issued for a key
    pub const FIRST: Self = Self(1);

    /// Create a token from its raw value
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw token value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Token issued after this one, or `None` once tokens are exhausted
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }
}

/// State owned by the keyed request manager
///
/// Entries are never removed: once a key has been navigated to or
/// prefetched it always has a [`RequestState`], and that state is the
/// result of the most recently issued fetch for the key (or `Pending`
/// while it is outstanding).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize + Eq + Hash",
    deserialize = "K: Deserialize<'de> + Eq + Hash"
))]
pub struct ManagerState<K> {
    current_key: Option<K>,
    requests: HashMap<K, RequestState>,
    issued: HashMap<K, IssueToken>,
}

impl<K: Eq + Hash> ManagerState<K> {
    /// Empty state: nothing requested, no current key
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_key: None,
            requests: HashMap::new(),
            issued: HashMap::new(),
        }
    }

    /// Key most recently navigated to
    #[must_use]
    pub const fn current_key(&self) -> Option<&K> {
        self.current_key.as_ref()
    }

    /// Request state recorded for `key`, if it was ever requested
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&RequestState> {
        self.requests.get(key)
    }

    /// Request state of the current key
    #[must_use]
    pub fn current(&self) -> Option<&RequestState> {
        self.current_key.as_ref().and_then(|key| self.requests.get(key))
    }

    /// Latest token issued for `key`
    #[must_use]
    pub fn latest_token(&self, key: &K) -> Option<IssueToken> {
        self.issued.get(key).copied()
    }

    /// Whether `token` is the latest token issued for `key`
    #[must_use]
    pub fn is_latest(&self, key: &K, token: IssueToken) -> bool {
        self.latest_token(key) == Some(token)
    }

    /// Iterate over every requested key and its state
    pub fn requests(&self) -> impl Iterator<Item = (&K, &RequestState)> {
        self.requests.iter()
    }

    /// Number of keys ever requested
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether nothing has been requested yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub(crate) fn set_current(&mut self, key: K) {
        self.current_key = Some(key);
    }

    /// Mark `key` as `Pending` and issue its next token
    ///
    /// Returns `None` and leaves the state untouched if the key's tokens are
    /// exhausted.
    pub(crate) fn begin_request(&mut self, key: K) -> Option<IssueToken>
    where
        K: Clone,
    {
        let token = match self.issued.get(&key) {
            Some(latest) => latest.next()?,
            None => IssueToken::FIRST,
        };
        self.issued.insert(key.clone(), token);
        self.requests.insert(key, RequestState::Pending);
        Some(token)
    }

    #[cfg(test)]
    pub(crate) fn set_latest_token(&mut self, key: K, token: IssueToken) {
        self.issued.insert(key, token);
    }

    /// Record a settled result for `key`
    pub(crate) fn record(&mut self, key: K, outcome: RequestState) {
        self.requests.insert(key, outcome);
    }
}

impl<K: Eq + Hash> PartialEq for ManagerState<K> {
    fn eq(&self, other: &Self) -> bool {
        self.current_key == other.current_key
            && self.requests == other.requests
            && self.issued == other.issued
    }
}

impl<K: Eq + Hash> Eq for ManagerState<K> {}

impl<K: Eq + Hash> Default for ManagerState<K> {
    fn default() -> Self {
        Self::new()
    }
}

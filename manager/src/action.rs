//! Actions processed by the keyed request reducer.

use crate::state::IssueToken;

/// Everything that can happen to the manager
///
/// `Navigate` and `Prefetch` come from callers. `FetchSucceeded` and
/// `FetchFailed` are produced by fetch effects and carry the token captured
/// when the fetch was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerAction<K> {
    /// Make `key` current and (re)fetch it
    Navigate {
        /// Key to show
        key: K,
    },

    /// Fetch every key that has never been requested, without changing the current key
    Prefetch {
        /// Keys to warm up
        keys: Vec<K>,
    },

    /// A fetch returned content
    FetchSucceeded {
        /// Key the fetch was issued for
        key: K,
        /// Token captured at issue time
        token: IssueToken,
        /// Retrieved content
        content: String,
    },

    /// A fetch failed
    FetchFailed {
        /// Key the fetch was issued for
        key: K,
        /// Token captured at issue time
        token: IssueToken,
        /// Display string of the fetch error
        message: String,
    },
}

impl<K> ManagerAction<K> {
    /// Key this action concerns, if it concerns exactly one
    #[must_use]
    pub const fn key(&self) -> Option<&K> {
        match self {
            Self::Navigate { key }
            | Self::FetchSucceeded { key, .. }
            | Self::FetchFailed { key, .. } => Some(key),
            Self::Prefetch { .. } => None,
        }
    }

    /// Whether this action reports a settled fetch
    #[must_use]
    pub const fn is_settlement(&self) -> bool {
        matches!(self, Self::FetchSucceeded { .. } | Self::FetchFailed { .. })
    }
}

//! What a page area shows for the current key.

use crate::state::ManagerState;
use keyed_request_core::RequestState;
use std::fmt;
use std::hash::Hash;

/// Projection of the current key's request state for rendering
///
/// Each [`RequestState`] tag maps to exactly one view, so a loading
/// indicator and an error message can never be shown together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageView {
    /// No key has been navigated to yet
    NotRequested,
    /// The current key's fetch is outstanding
    Loading,
    /// The current key's latest fetch failed
    Failed {
        /// Error message
        message: String,
    },
    /// The current key's latest fetch returned content
    Loaded {
        /// Page content
        content: String,
    },
}

impl PageView {
    /// View of `state`'s current key
    #[must_use]
    pub fn of<K: Eq + Hash>(state: &ManagerState<K>) -> Self {
        state.current().map_or(Self::NotRequested, Self::from_request)
    }

    /// View of a single request state
    #[must_use]
    pub fn from_request(request: &RequestState) -> Self {
        match request {
            RequestState::Pending => Self::Loading,
            RequestState::Error { message } => Self::Failed {
                message: message.clone(),
            },
            RequestState::Ok { content } => Self::Loaded {
                content: content.clone(),
            },
        }
    }
}

impl fmt::Display for PageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRequested => f.write_str("nothing requested"),
            Self::Loading => f.write_str("loading..."),
            Self::Failed { message } => write!(f, "error: {message}"),
            Self::Loaded { content } => f.write_str(content),
        }
    }
}

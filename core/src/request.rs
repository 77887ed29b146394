//! The state of one asynchronous request for one key.
//!
//! A `RequestState` is exactly one of `Pending`, `Error` or `Ok`. The variant
//! alone decides which fields exist, so "loading and failed at once" cannot be
//! expressed.

use serde::{Deserialize, Serialize};

/// Lifecycle of a single keyed request.
///
/// Serializes as an internally tagged object, e.g.
/// `{"state":"error","message":"timeout"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RequestState {
    /// The request has been issued and has not settled.
    Pending,

    /// The request failed.
    Error {
        /// Why it failed
        message: String,
    },

    /// The request succeeded.
    Ok {
        /// The retrieved content
        content: String,
    },
}

impl RequestState {
    /// A request that has not settled yet
    #[must_use]
    pub const fn pending() -> Self {
        Self::Pending
    }

    /// A failed request
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// A successful request
    #[must_use]
    pub fn ok(content: impl Into<String>) -> Self {
        Self::Ok {
            content: content.into(),
        }
    }

    /// Check if the request is still in flight
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Check if the request failed
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Check if the request succeeded
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// Failure message, if the request failed
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            Self::Pending | Self::Ok { .. } => None,
        }
    }

    /// Retrieved content, if the request succeeded
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Ok { content } => Some(content),
            Self::Pending | Self::Error { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_pick_one_variant() {
        assert!(RequestState::pending().is_pending());

        let failed = RequestState::error("timeout");
        assert!(failed.is_error());
        assert!(!failed.is_pending());
        assert_eq!(failed.message(), Some("timeout"));
        assert_eq!(failed.content(), None);

        let loaded = RequestState::ok("hello");
        assert!(loaded.is_ok());
        assert_eq!(loaded.content(), Some("hello"));
        assert_eq!(loaded.message(), None);
    }

    #[test]
    fn test_serializes_with_state_tag() -> Result<(), serde_json::Error> {
        assert_eq!(
            serde_json::to_string(&RequestState::pending())?,
            r#"{"state":"pending"}"#
        );
        assert_eq!(
            serde_json::to_string(&RequestState::error("timeout"))?,
            r#"{"state":"error","message":"timeout"}"#
        );

        let parsed: RequestState = serde_json::from_str(r#"{"state":"ok","content":"hi"}"#)?;
        assert_eq!(parsed, RequestState::ok("hi"));
        Ok(())
    }

    #[test]
    fn test_tag_decides_required_fields() {
        let unknown = serde_json::from_str::<RequestState>(r#"{"state":"loading"}"#);
        assert!(unknown.is_err());

        let missing = serde_json::from_str::<RequestState>(r#"{"state":"error"}"#);
        assert!(missing.is_err());
    }
}

//! # Keyed Request Core
//!
//! Core traits and types for race-safe, per-key asynchronous request state.
//!
//! This crate provides the fundamental abstractions the rest of the workspace
//! builds on: a pure `Reducer` that owns all state mutation, `Effect`
//! descriptions that the runtime executes, the `ContentFetcher` capability
//! that retrieves content for a key, and the `RequestState` value that
//! describes one fetch lifecycle.
//!
//! ## Core Concepts
//!
//! - **State**: Everything the manager knows (current key, per-key request state)
//! - **Action**: All inputs to the reducer (navigations and fetch settlements)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies via traits (the fetch capability)
//!
//! ## Example
//!
//! ```ignore
//! use keyed_request_core::*;
//!
//! impl Reducer for PageReducer {
//!     type State = PageState;
//!     type Action = PageAction;
//!     type Environment = PageEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut PageState,
//!         action: PageAction,
//!         env: &PageEnvironment,
//!     ) -> SmallVec<[Effect<PageAction>; 4]> {
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

// Re-export commonly used types
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

/// The lifecycle of a single keyed request
pub mod request;

pub use request::RequestState;

/// Reducer module - The core trait for state transitions
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all state mutation and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for PageReducer {
    ///     type State = PageState;
    ///     type Action = PageAction;
    ///     type Environment = PageEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut PageState,
    ///         action: PageAction,
    ///         env: &PageEnvironment,
    ///     ) -> SmallVec<[Effect<PageAction>; 4]> {
    ///         match action {
    ///             PageAction::Open { page } => {
    ///                 state.current = Some(page);
    ///                 smallvec![Effect::None]
    ///             }
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Updates state in place
        /// 2. Returns effect descriptions to be executed
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// Effects to be executed by the runtime
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values, not execution.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Whether this effect does nothing when executed
        ///
        /// An empty `Parallel` counts as a no-op.
        #[must_use]
        pub fn is_none(&self) -> bool {
            match self {
                Effect::None => true,
                Effect::Parallel(effects) => effects.iter().all(Effect::is_none),
                Effect::Future(_) => false,
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use futures::future::BoxFuture;
    use thiserror::Error;

    /// Errors reported by a [`ContentFetcher`].
    ///
    /// The display string of a `FetchError` is exactly the message recorded in
    /// `RequestState::Error` when a fetch fails.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum FetchError {
        /// The transport failed before a response was received.
        #[error("request failed: {0}")]
        Transport(String),

        /// A response arrived with a non-success status.
        #[error("unexpected status {status} from {url}")]
        Status {
            /// HTTP-like status code
            status: u16,
            /// Location that was requested
            url: String,
        },

        /// The response body could not be decoded into text.
        #[error("failed to decode response body: {0}")]
        Decode(String),

        /// The key cannot be mapped onto a location to fetch.
        #[error("invalid key {0:?}")]
        InvalidKey(String),

        /// The fetch did not settle within its time budget.
        #[error("timeout")]
        Timeout,

        /// Free-form failure reported by a fetcher.
        #[error("{0}")]
        Message(String),
    }

    /// The fetch capability: asynchronously retrieve the content stored under a key.
    ///
    /// The returned future must own everything it needs (`'static`). Reducers call
    /// `fetch` at dispatch time and hand the future to the runtime as an effect, so
    /// implementations may record or start work synchronously inside `fetch`.
    ///
    /// Timeouts are the fetcher's own business; a timed out fetch reports
    /// [`FetchError::Timeout`] through the ordinary error path.
    ///
    /// # Example
    ///
    /// ```ignore
    /// struct EchoFetcher;
    ///
    /// impl ContentFetcher<String> for EchoFetcher {
    ///     fn fetch(&self, key: &String) -> BoxFuture<'static, Result<String, FetchError>> {
    ///         let key = key.clone();
    ///         Box::pin(async move { Ok(key) })
    ///     }
    /// }
    /// ```
    pub trait ContentFetcher<K>: Send + Sync {
        /// Start fetching the content for `key`
        fn fetch(&self, key: &K) -> BoxFuture<'static, Result<String, FetchError>>;
    }

    impl<K, F> ContentFetcher<K> for std::sync::Arc<F>
    where
        F: ContentFetcher<K> + ?Sized,
    {
        fn fetch(&self, key: &K) -> BoxFuture<'static, Result<String, FetchError>> {
            (**self).fetch(key)
        }
    }
}

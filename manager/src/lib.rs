//! # Keyed Request Manager
//!
//! Race-safe state for asynchronous fetches keyed by page (or any other key).
//!
//! Every key maps to a [`RequestState`]: `Pending`, `Error { message }` or
//! `Ok { content }`. Navigating to a key marks it `Pending` and dispatches a
//! fetch stamped with a per-key issue token. When the fetch settles, its
//! result is applied only if no newer fetch for the same key has been issued
//! since; superseded results are dropped.
//!
//! ## Architecture
//!
//! - [`ManagerState`]: current key, per-key request states, latest issue tokens
//! - [`ManagerAction`]: navigation, prefetch, and fetch settlements
//! - [`KeyedRequestReducer`]: all state transitions
//! - [`KeyedRequestManager`]: facade over the `Store` that runs the reducer
//!   and the fetch effects
//! - [`fetchers`]: HTTP and timeout adapters for the `ContentFetcher` capability
//!
//! ## Example
//!
//! ```no_run
//! use keyed_request_manager::{KeyedRequestManager, RequestState};
//! use keyed_request_manager::fetchers::HttpFetcher;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HttpFetcher::new("https://example.com/pages")?;
//! let manager = KeyedRequestManager::new(fetcher);
//!
//! let mut handle = manager.navigate("about".to_string()).await?;
//! assert_eq!(manager.get_state(&"about".to_string()).await, Some(RequestState::Pending));
//!
//! handle.wait().await;
//! println!("{}", manager.render().await);
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod config;
pub mod fetchers;
pub mod manager;
pub mod reducer;
pub mod state;
pub mod view;

pub use action::ManagerAction;
pub use config::{ConfigError, ManagerConfig};
pub use keyed_request_core::RequestState;
pub use manager::KeyedRequestManager;
pub use reducer::{KeyedRequestReducer, ManagerEnvironment};
pub use state::{IssueToken, Key, ManagerState};
pub use view::PageView;

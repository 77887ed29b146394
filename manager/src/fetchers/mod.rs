//! Implementations of the `ContentFetcher` capability
//!
//! - [`HttpFetcher`]: GET `<base_url>/<key>` over reqwest
//! - [`TimeoutFetcher`]: bounds any other fetcher by a duration

mod http;
mod timeout;

pub use http::HttpFetcher;
pub use timeout::TimeoutFetcher;

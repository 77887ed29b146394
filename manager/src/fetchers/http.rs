use crate::config::{parse_http_url, ConfigError, FetchConfig};
use futures::future::BoxFuture;
use futures::StreamExt;
use keyed_request_core::environment::{ContentFetcher, FetchError};

/// Default maximum accepted body size (10MB)
const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Fetcher that GETs `<base_url>/<key>`
///
/// The key is appended as a single percent-encoded path segment, so `/`, `?`
/// and `#` inside a key never escape it. The keys `""`, `.` and `..` fail
/// with [`FetchError::InvalidKey`].
///
/// Any non-2xx status fails with [`FetchError::Status`]. Connection and
/// protocol failures become [`FetchError::Transport`]; bodies that are too
/// large or not UTF-8 become [`FetchError::Decode`]. The body is streamed and
/// abandoned as soon as it exceeds the size limit.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: reqwest::Url,
    max_body_size: usize,
}

impl HttpFetcher {
    /// Create a fetcher for `base_url` with a default client
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if `base_url` is not an
    /// `http://` or `https://` URL, or [`ConfigError::HttpClient`] if the
    /// client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        Self::from_config(&FetchConfig {
            base_url: base_url.into(),
            ..FetchConfig::default()
        })
    }

    /// Create a fetcher from configuration
    ///
    /// # Errors
    ///
    /// Same as [`HttpFetcher::new`].
    pub fn from_config(config: &FetchConfig) -> Result<Self, ConfigError> {
        let base_url = config.parse_base_url()?;

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self::from_parts(client, base_url))
    }

    /// Create a fetcher around an existing client
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if `base_url` is not an
    /// `http://` or `https://` URL.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self::from_parts(client, parse_http_url(base_url)?))
    }

    fn from_parts(client: reqwest::Client, mut base_url: reqwest::Url) -> Self {
        if let Ok(mut segments) = base_url.path_segments_mut() {
            segments.pop_if_empty();
        }
        Self {
            client,
            base_url,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Limit accepted bodies to `bytes`
    #[must_use]
    pub fn with_max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Base URL that keys are appended to
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// URL fetched for `key`
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidKey`] for `""`, `.` and `..`, which
    /// would not name a resource below the base URL.
    pub fn url_for(&self, key: &str) -> Result<reqwest::Url, FetchError> {
        if matches!(key, "" | "." | "..") {
            return Err(FetchError::InvalidKey(key.to_string()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidKey(key.to_string()))?
            .pop_if_empty()
            .push(key);
        Ok(url)
    }
}

impl<K> ContentFetcher<K> for HttpFetcher
where
    K: AsRef<str>,
{
    fn fetch(&self, key: &K) -> BoxFuture<'static, Result<String, FetchError>> {
        let client = self.client.clone();
        let url = self.url_for(key.as_ref());
        let max_body_size = self.max_body_size;

        Box::pin(async move {
            let url = url?;
            let response = client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            let too_large = || {
                FetchError::Decode(format!("response body exceeds {max_body_size} bytes"))
            };

            if let Some(length) = response.content_length() {
                if usize::try_from(length).map_or(true, |length| length > max_body_size) {
                    return Err(too_large());
                }
            }

            let mut body = Vec::new();
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| FetchError::Transport(e.to_string()))?;
                if body.len() + chunk.len() > max_body_size {
                    return Err(too_large());
                }
                body.extend_from_slice(&chunk);
            }

            String::from_utf8(body).map_err(|e| FetchError::Decode(e.to_string()))
        })
    }
}

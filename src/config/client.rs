//! Client Configuration
//!
//! Connection settings shared by every request a client makes.

use crate::stream::{StreamObserver, TracingObserver};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Settings for an [`OpenRouterClient`](crate::OpenRouterClient)
#[derive(Clone)]
pub struct ClientConfig {
    auth_token: String,

    /// API root, without a trailing slash
    pub base_url: String,

    /// Sent as `HTTP-Referer` (app attribution)
    pub http_referer: String,

    /// Sent as `X-Title` (app attribution)
    pub x_title: String,

    /// Whole-request timeout for unary calls
    pub timeout: Duration,

    pub connect_timeout: Duration,

    /// Retries for unary calls only. Stream requests are never retried.
    pub max_retries: u32,

    /// Receives stream driver events. Defaults to a [`TracingObserver`].
    pub observer: Option<Arc<dyn StreamObserver>>,
}

impl ClientConfig {
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http_referer: String::new(),
            x_title: String::new(),
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(10),
            max_retries: 0,
            observer: None,
        }
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_http_referer(mut self, referer: impl Into<String>) -> Self {
        self.http_referer = referer.into();
        self
    }

    pub fn with_x_title(mut self, title: impl Into<String>) -> Self {
        self.x_title = title.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Retry failed unary calls with exponential backoff
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn StreamObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Build a URL for an endpoint path such as `/chat/completions`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Observer for a stream, falling back to tracing under `label`
    pub(crate) fn observer_for(&self, label: &'static str) -> Arc<dyn StreamObserver> {
        match &self.observer {
            Some(observer) => Arc::clone(observer),
            None => Arc::new(TracingObserver::new(label)),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("auth_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("http_referer", &self.http_referer)
            .field("x_title", &self.x_title)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_retries", &self.max_retries)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

//! HTTP Client
//!
//! Request building, header injection and error decoding for the API.
//! Unary calls (JSON POST and GET) may retry with exponential backoff; stream
//! requests never do.

use crate::config::ClientConfig;
use crate::error::{ErrorResponse, OpenRouterError, RequestError, Result};
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CACHE_CONTROL, CONNECTION,
    CONTENT_TYPE,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::pin::Pin;
use std::time::Duration;
use tokio_util::io::StreamReader;

const JSON_UTF8: &str = "application/json; charset=utf-8";

const HTTP_REFERER: HeaderName = HeaderName::from_static("http-referer");
const X_TITLE: HeaderName = HeaderName::from_static("x-title");

/// Response body of a successful stream request, readable as bytes
pub type ResponseBody =
    StreamReader<Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>, Bytes>;

/// HTTP client bound to one [`ClientConfig`]
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// Inner reqwest client
    client: Client,

    config: ClientConfig,

    /// Authorization and attribution headers sent with every request
    common_headers: HeaderMap,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(config: ClientConfig) -> Result<Self> {
        // No whole-request timeout here: it would also bound stream bodies.
        // Unary calls set their own.
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| OpenRouterError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let common_headers = common_headers(&config)?;

        Ok(Self {
            client,
            config,
            common_headers,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// POST a JSON body and decode a JSON response, retrying transient
    /// failures up to `max_retries` times
    pub async fn post_json<T, R>(&self, path: &str, body: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.config.url(path);
        let body_json = serde_json::to_string(body)?;

        self.with_retry(&url, || {
            self.client
                .post(&url)
                .header(CONTENT_TYPE, JSON_UTF8)
                .body(body_json.clone())
        })
        .await
    }

    /// GET a JSON response, with query parameters, retrying like
    /// [`HttpClient::post_json`]
    pub async fn get_json<R>(&self, path: &str, query: &[(&str, &str)]) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let url = self.config.url(path);
        self.with_retry(&url, || self.client.get(&url).query(query)).await
    }

    async fn with_retry<R, F>(&self, url: &str, request: F) -> Result<R>
    where
        R: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(120)),
            max_interval: Duration::from_secs(30),
            initial_interval: Duration::from_millis(500),
            multiplier: 2.0,
            ..Default::default()
        };

        let mut retries = 0;

        loop {
            let err = match self.send_json(request()).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            if retries >= self.config.max_retries || !is_retryable(&err) {
                return Err(err);
            }

            let Some(wait) = backoff.next_backoff() else {
                return Err(err);
            };

            retries += 1;
            tracing::warn!(
                url = %url,
                attempt = retries,
                wait_ms = wait.as_millis() as u64,
                error = %err,
                "request failed, retrying"
            );
            tokio::time::sleep(wait).await;
        }
    }

    async fn send_json<R>(&self, request: RequestBuilder) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let response = request
            .headers(self.common_headers.clone())
            .header(ACCEPT, JSON_UTF8)
            .timeout(self.config.timeout)
            .send()
            .await?;

        let status = response.status();
        if is_failure_status(status) {
            return Err(handle_error_response(response).await);
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::debug!(
                error = %e,
                body = body.get(..500).unwrap_or(body.as_str()),
                "failed to parse response"
            );
            OpenRouterError::Json(e)
        })
    }

    /// POST a stream request and return the open response body.
    ///
    /// A failure status is decoded into an API error before any body is
    /// handed out; any other status than 200 is rejected.
    pub async fn post_stream<T>(&self, path: &str, body: &T) -> Result<ResponseBody>
    where
        T: Serialize + ?Sized,
    {
        let url = self.config.url(path);

        let response = self
            .client
            .post(&url)
            .headers(self.common_headers.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .header(CONNECTION, "keep-alive")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if is_failure_status(status) {
            return Err(handle_error_response(response).await);
        }
        if status != StatusCode::OK {
            return Err(OpenRouterError::UnexpectedStatus(status));
        }

        tracing::debug!(url = %url, "stream opened");

        let bytes: Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>> =
            Box::pin(response.bytes_stream().map_err(io::Error::other));
        Ok(StreamReader::new(bytes))
    }
}

fn common_headers(config: &ClientConfig) -> Result<HeaderMap> {
    let value = |name: &str, v: &str| {
        HeaderValue::from_str(v)
            .map_err(|e| OpenRouterError::Config(format!("Invalid {} header value: {}", name, e)))
    };

    let mut headers = HeaderMap::new();
    let mut auth = value("Authorization", &format!("Bearer {}", config.auth_token()))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert(HTTP_REFERER, value("HTTP-Referer", &config.http_referer)?);
    headers.insert(X_TITLE, value("X-Title", &config.x_title)?);
    Ok(headers)
}

fn is_failure_status(status: StatusCode) -> bool {
    status.as_u16() < 200 || status.as_u16() >= 400
}

fn is_retryable(err: &OpenRouterError) -> bool {
    match err {
        OpenRouterError::Timeout(_) => true,
        OpenRouterError::Http(e) => e.is_connect() || e.is_timeout(),
        other => other
            .status_code()
            .is_some_and(|s| s == 429 || (500..600).contains(&s)),
    }
}

/// Decode a failure response into the matching error
pub async fn handle_error_response(response: Response) -> OpenRouterError {
    let status = response.status();
    match response.text().await {
        Ok(body) => decode_error_body(status, body),
        Err(e) => e.into(),
    }
}

/// Turn a failure status and its body into an error.
///
/// A body of the form `{"error": {...}}` becomes [`OpenRouterError::Api`]
/// with the status attached; anything else becomes
/// [`OpenRouterError::Request`] carrying the raw body.
pub fn decode_error_body(status: StatusCode, body: String) -> OpenRouterError {
    let message = match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(ErrorResponse {
            error: Some(mut error),
        }) => {
            error.http_status_code = status.as_u16();
            return OpenRouterError::Api(error);
        }
        Ok(_) => "response body has no error object".to_string(),
        Err(e) => e.to_string(),
    };

    RequestError {
        http_status: status.to_string(),
        http_status_code: status.as_u16(),
        message,
        body,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new(ClientConfig::new("sk-or-test"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_header_value() {
        let err = HttpClient::new(ClientConfig::new("k").with_x_title("bad\ntitle")).unwrap_err();
        assert!(matches!(err, OpenRouterError::Config(msg) if msg.contains("X-Title")));
    }

    #[test]
    fn test_common_headers() {
        let config = ClientConfig::new("sk-or-test")
            .with_http_referer("https://example.com")
            .with_x_title("Example");
        let headers = common_headers(&config).unwrap();

        assert_eq!(headers[AUTHORIZATION], "Bearer sk-or-test");
        assert!(headers[AUTHORIZATION].is_sensitive());
        assert_eq!(headers["http-referer"], "https://example.com");
        assert_eq!(headers["x-title"], "Example");
    }

    #[test]
    fn test_failure_status() {
        assert!(is_failure_status(StatusCode::from_u16(101).unwrap()));
        assert!(is_failure_status(StatusCode::BAD_REQUEST));
        assert!(is_failure_status(StatusCode::BAD_GATEWAY));
        assert!(!is_failure_status(StatusCode::OK));
        assert!(!is_failure_status(StatusCode::NO_CONTENT));
        assert!(!is_failure_status(StatusCode::NOT_MODIFIED));
    }

    #[test]
    fn test_decode_structured_error() {
        let err = decode_error_body(
            StatusCode::PAYMENT_REQUIRED,
            r#"{"error": {"code": 402, "message": "Insufficient credits"}}"#.to_string(),
        );
        match err {
            OpenRouterError::Api(api) => {
                assert_eq!(api.http_status_code, 402);
                assert_eq!(api.message, "Insufficient credits");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_unstructured_error() {
        let err = decode_error_body(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>".to_string());
        match err {
            OpenRouterError::Request(req) => {
                assert_eq!(req.http_status_code, 502);
                assert_eq!(req.body, "<html>bad gateway</html>");
            }
            other => panic!("expected request error, got {other:?}"),
        }

        let err = decode_error_body(StatusCode::BAD_REQUEST, "{}".to_string());
        assert!(matches!(err, OpenRouterError::Request(_)));
    }

    #[test]
    fn test_retryable_errors() {
        let status = |code: u16| {
            decode_error_body(
                StatusCode::from_u16(code).unwrap(),
                format!(r#"{{"error": {{"code": {code}, "message": "x"}}}}"#),
            )
        };

        assert!(is_retryable(&status(429)));
        assert!(is_retryable(&status(503)));
        assert!(!is_retryable(&status(400)));
        assert!(!is_retryable(&OpenRouterError::StreamNotSupported));
        assert!(is_retryable(&OpenRouterError::Timeout("slow".into())));
    }
}

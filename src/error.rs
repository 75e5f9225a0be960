//! OpenRouter Error Types
//!
//! Error taxonomy for the client: setup failures raised before a stream
//! exists, terminal stream failures delivered through `StreamSession::recv`, and the
//! structured error body the API returns on non-success statuses.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

/// Main error type for client operations
#[derive(Debug, thiserror::Error)]
pub enum OpenRouterError {
    /// Configuration errors (missing key, unreadable config file, bad header value)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The API answered with a decodable error body
    #[error("{0}")]
    Api(ApiError),

    /// The API answered with a failure status and an undecodable body
    #[error(transparent)]
    Request(#[from] RequestError),

    /// A stream request succeeded with a status other than 200
    #[error("unexpected status code: {0}")]
    UnexpectedStatus(reqwest::StatusCode),

    /// `stream = true` was passed to a non-streaming method
    #[error("streaming is not supported with this method, use the matching *_stream method")]
    StreamNotSupported,

    /// The caller's token fired before the stream opened
    #[error("request cancelled")]
    Cancelled,

    /// Transport-level failure (connect, TLS, body read during a unary call)
    #[error("Request failed: {0}")]
    Http(reqwest::Error),

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Terminal stream failure
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Request encoding or response decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local file access (attachments, config files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for OpenRouterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OpenRouterError::Timeout(err.to_string())
        } else {
            OpenRouterError::Http(err)
        }
    }
}

impl From<ApiError> for OpenRouterError {
    fn from(err: ApiError) -> Self {
        OpenRouterError::Api(err)
    }
}

impl OpenRouterError {
    /// HTTP status attached to the error, if the server produced one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            OpenRouterError::Api(e) => Some(e.http_status_code),
            OpenRouterError::Request(e) => Some(e.http_status_code),
            OpenRouterError::UnexpectedStatus(s) => Some(s.as_u16()),
            OpenRouterError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Terminal failure of a running stream.
///
/// Delivered at most once per session; the next `recv` reports
/// end-of-stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Reading from the response body failed for a reason other than EOF
    #[error("failed to read stream: {0}")]
    Frame(#[source] std::io::Error),

    /// A data frame did not decode into the chunk type
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// A data frame whose payload could not be decoded.
#[derive(Debug, thiserror::Error)]
#[error("failed to decode stream chunk: {source}. Data: {payload}")]
pub struct DecodeError {
    /// Offending payload, lossily converted to UTF-8
    pub payload: String,

    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl DecodeError {
    /// Wrap a decoder failure together with the payload that caused it
    pub fn new(
        payload: &[u8],
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            payload: String::from_utf8_lossy(payload).into_owned(),
            source: source.into(),
        }
    }
}

/// Failure status whose body did not carry a structured error.
#[derive(Debug, thiserror::Error)]
#[error("error, status code: {http_status_code}, status: {http_status}, message: {message}, body: {body}")]
pub struct RequestError {
    pub http_status: String,
    pub http_status_code: u16,
    pub message: String,
    pub body: String,
}

/// Error body envelope: `{"error": {...}}`
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<ApiError>,
}

/// Structured error returned by the API.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApiError {
    /// Integer codes stay integers; anything else is kept verbatim
    pub code: Option<Value>,

    pub message: String,

    pub metadata: Option<Map<String, Value>>,

    /// Upstream provider payload, decoded from `metadata.raw`
    pub provider_error: Option<Map<String, Value>>,

    /// Set by the transport after decoding; not part of the body
    pub http_status_code: u16,
}

impl ApiError {
    /// Human-readable message from the upstream provider, if one exists.
    ///
    /// Looks at `message`, then `error.message`, then `error` itself.
    pub fn provider_message(&self) -> Option<&Value> {
        let provider = self.provider_error.as_ref()?;
        if let Some(message) = provider.get("message") {
            return Some(message);
        }

        let error = provider.get("error")?;
        match error.as_object() {
            Some(obj) => obj.get("message").or(Some(error)),
            None => Some(error),
        }
    }

    fn code_display(&self) -> String {
        match &self.code {
            Some(Value::String(s)) => s.clone(),
            Some(v) => v.to_string(),
            None => "<nil>".to_string(),
        }
    }
}

fn value_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        v => v.to_string(),
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(provider) = &self.provider_error {
            if let Some(message) = self.provider_message() {
                return write!(
                    f,
                    "provider error, code: {}, message: {}",
                    self.code_display(),
                    value_display(message)
                );
            }
            return write!(
                f,
                "provider error, code: {}, message: {}, error: {}",
                self.code_display(),
                self.message,
                Value::Object(provider.clone())
            );
        }

        if let Some(metadata) = &self.metadata {
            return write!(
                f,
                "error, code: {}, message: {}, metadata: {}",
                self.code_display(),
                self.message,
                Value::Object(metadata.clone())
            );
        }

        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl<'de> Deserialize<'de> for ApiError {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawMessage {
            One(String),
            Many(Vec<String>),
        }

        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            code: Option<Value>,
            message: RawMessage,
            #[serde(default)]
            metadata: Option<Map<String, Value>>,
        }

        let raw = Raw::deserialize(deserializer)?;

        let message = match raw.message {
            RawMessage::One(s) => s,
            RawMessage::Many(parts) => parts.join(", "),
        };

        let provider_error = match raw
            .metadata
            .as_ref()
            .and_then(|m| m.get("raw"))
            .and_then(Value::as_str)
        {
            Some(text) => Some(serde_json::from_str(text).map_err(de::Error::custom)?),
            None => None,
        };

        // Whole-number floats like 429.0 collapse to integers
        let code = raw.code.map(|code| match code.as_f64() {
            Some(f) if code.is_f64() && f.fract() == 0.0 => Value::from(f as i64),
            _ => code,
        });

        Ok(ApiError {
            code,
            message,
            metadata: raw.metadata,
            provider_error,
            http_status_code: 0,
        })
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, OpenRouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_plain_message() {
        let err: ApiError =
            serde_json::from_str(r#"{"code": 401, "message": "No auth credentials found"}"#)
                .unwrap();
        assert_eq!(err.code, Some(Value::from(401)));
        assert_eq!(err.to_string(), "No auth credentials found");
    }

    #[test]
    fn test_api_error_message_array_is_joined() {
        let err: ApiError =
            serde_json::from_str(r#"{"code": 400, "message": ["bad model", "bad temperature"]}"#)
                .unwrap();
        assert_eq!(err.message, "bad model, bad temperature");
    }

    #[test]
    fn test_api_error_string_code_kept() {
        let err: ApiError =
            serde_json::from_str(r#"{"code": "invalid_request", "message": "nope"}"#).unwrap();
        assert_eq!(err.code, Some(Value::from("invalid_request")));
    }

    #[test]
    fn test_api_error_metadata_display() {
        let err: ApiError = serde_json::from_str(
            r#"{"code": 403, "message": "flagged", "metadata": {"reasons": ["violence"]}}"#,
        )
        .unwrap();
        assert!(err.provider_error.is_none());
        assert_eq!(
            err.to_string(),
            r#"error, code: 403, message: flagged, metadata: {"reasons":["violence"]}"#
        );
    }

    #[test]
    fn test_api_error_provider_raw_nested_message() {
        let body = r#"{
            "code": 502,
            "message": "Provider returned error",
            "metadata": {
                "provider_name": "Upstream",
                "raw": "{\"error\":{\"message\":\"model overloaded\"}}"
            }
        }"#;
        let err: ApiError = serde_json::from_str(body).unwrap();
        assert_eq!(
            err.provider_message(),
            Some(&Value::from("model overloaded"))
        );
        assert_eq!(
            err.to_string(),
            "provider error, code: 502, message: model overloaded"
        );
    }

    #[test]
    fn test_api_error_provider_raw_top_level_message() {
        let body = r#"{"code": 400, "message": "x", "metadata": {"raw": "{\"message\":\"too long\"}"}}"#;
        let err: ApiError = serde_json::from_str(body).unwrap();
        assert_eq!(err.to_string(), "provider error, code: 400, message: too long");
    }

    #[test]
    fn test_error_response_without_error_field() {
        let resp: ErrorResponse = serde_json::from_str(r#"{"detail": "gateway"}"#).unwrap();
        assert!(resp.error.is_none());
    }

    #[test]
    fn test_decode_error_keeps_payload() {
        let source = serde_json::from_str::<Value>("{oops").unwrap_err();
        let err = DecodeError::new(b"{oops", source);
        assert_eq!(err.payload, "{oops");
        assert!(err.to_string().contains("Data: {oops"));
    }

    #[test]
    fn test_status_code_accessor() {
        let err = OpenRouterError::Api(ApiError {
            message: "rate limited".into(),
            http_status_code: 429,
            ..Default::default()
        });
        assert_eq!(err.status_code(), Some(429));
        assert_eq!(OpenRouterError::StreamNotSupported.status_code(), None);
    }
}

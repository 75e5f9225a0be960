//! Embeddings API
//!
//! Request and response schema for `/embeddings`.

use crate::api::chat::ProviderPreferences;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Text or tokens to embed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingInput {
    Text(String),
    Texts(Vec<String>),
    Tokens(Vec<f64>),
    TokenBatches(Vec<Vec<f64>>),
    /// Provider-specific structured input, sent as is
    Raw(Value),
}

impl From<&str> for EmbeddingInput {
    fn from(text: &str) -> Self {
        EmbeddingInput::Text(text.to_string())
    }
}

impl From<String> for EmbeddingInput {
    fn from(text: String) -> Self {
        EmbeddingInput::Text(text)
    }
}

impl From<Vec<String>> for EmbeddingInput {
    fn from(texts: Vec<String>) -> Self {
        EmbeddingInput::Texts(texts)
    }
}

impl From<Vec<&str>> for EmbeddingInput {
    fn from(texts: Vec<&str>) -> Self {
        EmbeddingInput::Texts(texts.into_iter().map(String::from).collect())
    }
}

/// Wire encoding of the returned vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingFormat {
    Float,
    Base64,
}

/// Embeddings request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingsRequest {
    pub model: String,

    pub input: EmbeddingInput,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding_format: Option<EncodingFormat>,

    /// Output size, for models that can truncate their vectors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderPreferences>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
}

impl EmbeddingsRequest {
    pub fn new(model: impl Into<String>, input: impl Into<EmbeddingInput>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            encoding_format: None,
            dimensions: None,
            user: None,
            provider: None,
            input_type: None,
        }
    }

    pub fn with_encoding_format(mut self, format: EncodingFormat) -> Self {
        self.encoding_format = Some(format);
        self
    }

    pub fn with_dimensions(mut self, dimensions: u32) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn with_provider(mut self, provider: ProviderPreferences) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_input_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = Some(input_type.into());
        self
    }
}

/// One embedding, as floats or as a base64 string depending on the
/// requested [`EncodingFormat`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EmbeddingValue {
    Vector(Vec<f64>),
    Base64(String),
}

impl EmbeddingValue {
    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            EmbeddingValue::Vector(v) => Some(v),
            EmbeddingValue::Base64(_) => None,
        }
    }

    /// Decode a base64 embedding into little-endian `f32` values.
    ///
    /// Returns `None` for a float vector or for a string that is not valid
    /// base64 of a whole number of floats.
    pub fn decode_base64(&self) -> Option<Vec<f32>> {
        let EmbeddingValue::Base64(encoded) = self else {
            return None;
        };
        let bytes = STANDARD.decode(encoded).ok()?;
        if bytes.len() % 4 != 0 {
            return None;
        }
        Some(
            bytes
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for EmbeddingValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            value @ Value::Array(_) => serde_json::from_value(value)
                .map(EmbeddingValue::Vector)
                .map_err(D::Error::custom),
            Value::String(s) => Ok(EmbeddingValue::Base64(s)),
            _ => Err(D::Error::custom(
                "invalid embedding, expected an array of numbers or a string",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingData {
    #[serde(default)]
    pub object: String,

    pub embedding: EmbeddingValue,

    #[serde(default)]
    pub index: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsUsage {
    pub prompt_tokens: u32,
    pub total_tokens: u32,
    pub cost: f64,
}

/// Embeddings response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingsResponse {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub object: String,

    pub data: Vec<EmbeddingData>,

    #[serde(default)]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<EmbeddingsUsage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = EmbeddingsRequest::new("openai/text-embedding-3-small", vec!["a", "b"])
            .with_encoding_format(EncodingFormat::Base64)
            .with_dimensions(256);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "openai/text-embedding-3-small");
        assert_eq!(json["input"], serde_json::json!(["a", "b"]));
        assert_eq!(json["encoding_format"], "base64");
        assert_eq!(json["dimensions"], 256);
        assert!(json.get("provider").is_none());
        assert!(json.get("user").is_none());
    }

    #[test]
    fn test_single_text_input() {
        let request = EmbeddingsRequest::new("m", "hello");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input"], "hello");
        assert!(json.get("encoding_format").is_none());
    }

    #[test]
    fn test_embedding_value_shapes() {
        let vector: EmbeddingValue = serde_json::from_str("[0.5, -1, 2.25]").unwrap();
        assert_eq!(vector.as_vector(), Some(&[0.5, -1.0, 2.25][..]));
        assert_eq!(vector.decode_base64(), None);

        // 1.0f32 and -2.0f32, little-endian
        let encoded: EmbeddingValue = serde_json::from_str(r#""AACAPwAAAMA=""#).unwrap();
        assert_eq!(encoded, EmbeddingValue::Base64("AACAPwAAAMA=".into()));
        assert_eq!(encoded.as_vector(), None);
        assert_eq!(encoded.decode_base64(), Some(vec![1.0, -2.0]));

        assert_eq!(EmbeddingValue::Base64("AAA=".into()).decode_base64(), None);
    }

    #[test]
    fn test_embedding_value_rejects_other_shapes() {
        assert!(serde_json::from_str::<EmbeddingValue>("{\"x\": 1}").is_err());
        assert!(serde_json::from_str::<EmbeddingValue>("3").is_err());
        assert!(serde_json::from_str::<EmbeddingValue>("[\"a\"]").is_err());
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{
            "id": "emb-1",
            "object": "list",
            "data": [
                {"object": "embedding", "embedding": [0.1, 0.2], "index": 0},
                {"object": "embedding", "embedding": "AACAPw==", "index": 1}
            ],
            "model": "openai/text-embedding-3-small",
            "usage": {"prompt_tokens": 4, "total_tokens": 4, "cost": 0.00001}
        }"#;

        let response: EmbeddingsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.data.len(), 2);
        assert_eq!(response.data[0].embedding.as_vector(), Some(&[0.1, 0.2][..]));
        assert_eq!(response.data[1].index, 1);
        assert_eq!(response.data[1].embedding.decode_base64(), Some(vec![1.0]));
        assert_eq!(response.usage.as_ref().unwrap().total_tokens, 4);
    }
}

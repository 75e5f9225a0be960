//! Generation lookup
//!
//! Cost and timing details of a finished request, fetched from
//! `/generation?id=...` with the id of a completion or chunk.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Generation {
    pub id: String,
    pub total_cost: f64,
    /// RFC 3339 timestamp as sent by the API
    pub created_at: String,
    pub model: String,
    pub origin: String,
    pub usage: f64,
    pub is_byok: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_discount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_inference_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streamed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,

    /// Milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderation_latency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_time: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_finish_reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_prompt: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_completion: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_tokens_prompt: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_tokens_completion: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_tokens_reasoning: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_media_prompt: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_media_completion: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_search_results: Option<u32>,
}

impl Generation {
    pub fn created_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|t| t.with_timezone(&chrono::Utc))
    }
}

/// `{"data": ...}` envelope of the lookup response
#[derive(Debug, Deserialize)]
pub(crate) struct GenerationEnvelope {
    pub data: Generation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_deserialization() {
        let json = r#"{"data": {
            "id": "gen-42",
            "total_cost": 0.0021,
            "created_at": "2025-03-01T12:00:00Z",
            "model": "openai/gpt-4o-mini",
            "origin": "https://example.com",
            "usage": 0.0021,
            "is_byok": false,
            "streamed": true,
            "provider_name": "OpenAI",
            "latency": 812.0,
            "finish_reason": "stop",
            "tokens_prompt": 12,
            "tokens_completion": 40,
            "native_tokens_reasoning": null
        }}"#;

        let generation = serde_json::from_str::<GenerationEnvelope>(json).unwrap().data;
        assert_eq!(generation.id, "gen-42");
        assert_eq!(generation.streamed, Some(true));
        assert_eq!(generation.tokens_completion, Some(40));
        assert_eq!(generation.native_tokens_reasoning, None);
        assert_eq!(generation.cancelled, None);
        assert_eq!(generation.created_at().unwrap().timestamp(), 1740830400);
    }

    #[test]
    fn test_unparseable_timestamp() {
        let generation = Generation {
            created_at: "yesterday".into(),
            ..Default::default()
        };
        assert!(generation.created_at().is_none());
    }
}

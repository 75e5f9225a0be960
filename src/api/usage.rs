//! Usage Accounting

use serde::{Deserialize, Serialize};

/// Token usage information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub prompt_tokens: u32,

    pub completion_tokens: u32,

    pub total_tokens: u32,

    /// Request was served with the caller's own provider key
    pub is_byok: bool,

    /// Cost in credits
    pub cost: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_details: Option<CostDetails>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens_details: Option<PromptTokensDetails>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens_details: Option<CompletionTokensDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostDetails {
    pub upstream_inference_cost: f64,
    pub upstream_inference_prompt_cost: f64,
    pub upstream_inference_completions_cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTokensDetails {
    pub cached_tokens: u32,
    pub cache_write_tokens: u32,
    pub audio_tokens: u32,
    pub video_tokens: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionTokensDetails {
    pub reasoning_tokens: u32,
    pub image_tokens: u32,
}

/// Request flag asking for usage accounting in the response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeUsage {
    pub include: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_with_details() {
        let json = r#"{
            "prompt_tokens": 194,
            "completion_tokens": 2,
            "total_tokens": 196,
            "cost": 0.95,
            "is_byok": false,
            "prompt_tokens_details": {"cached_tokens": 100},
            "completion_tokens_details": {"reasoning_tokens": 0},
            "cost_details": {"upstream_inference_cost": 0.5}
        }"#;
        let usage: Usage = serde_json::from_str(json).unwrap();
        assert_eq!(usage.total_tokens, 196);
        assert_eq!(usage.prompt_tokens_details.unwrap().cached_tokens, 100);
        assert_eq!(usage.cost_details.unwrap().upstream_inference_cost, 0.5);
    }

    #[test]
    fn test_minimal_usage() {
        let usage: Usage =
            serde_json::from_str(r#"{"prompt_tokens":1,"completion_tokens":2,"total_tokens":3}"#)
                .unwrap();
        assert_eq!(usage.completion_tokens, 2);
        assert!(usage.completion_tokens_details.is_none());
    }
}

//! Message Content
//!
//! Content that is either plain text or an ordered list of typed parts, and
//! its JSON codec.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message content.
///
/// Encodes as a JSON string, a JSON array of parts, or `null` when empty.
/// Decoding never fails: anything that is not a non-empty string or a
/// non-empty array of valid parts becomes [`MessageContent::Empty`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MessageContent {
    /// No content (e.g. assistant turns that only carry tool calls)
    #[default]
    Empty,

    /// Simple string content
    Text(String),

    /// Array of content parts (for multimodal)
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Text content; an empty string yields [`MessageContent::Empty`]
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            MessageContent::Empty
        } else {
            MessageContent::Text(text)
        }
    }

    /// Multi-part content; an empty list yields [`MessageContent::Empty`]
    pub fn parts(parts: Vec<ContentPart>) -> Self {
        if parts.is_empty() {
            MessageContent::Empty
        } else {
            MessageContent::Parts(parts)
        }
    }

    /// Check if content is empty
    pub fn is_empty(&self) -> bool {
        match self {
            MessageContent::Empty => true,
            MessageContent::Text(s) => s.is_empty(),
            MessageContent::Parts(parts) => parts.is_empty(),
        }
    }

    /// The text, if this is plain text content
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to string (concatenating text parts if needed)
    pub fn to_string_content(&self) -> String {
        match self {
            MessageContent::Empty => String::new(),
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match &p.kind {
                    PartKind::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }

    /// Encode to JSON bytes
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decode from JSON bytes, falling back to [`MessageContent::Empty`]
    pub fn decode(bytes: &[u8]) -> Self {
        serde_json::from_slice::<Value>(bytes)
            .map(Self::from_value)
            .unwrap_or_default()
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => MessageContent::text(s),
            value @ Value::Array(_) => serde_json::from_value::<Vec<ContentPart>>(value)
                .map(MessageContent::parts)
                .unwrap_or_default(),
            _ => MessageContent::Empty,
        }
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::text(text)
    }
}

impl From<Vec<ContentPart>> for MessageContent {
    fn from(parts: Vec<ContentPart>) -> Self {
        MessageContent::parts(parts)
    }
}

impl Serialize for MessageContent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            MessageContent::Text(s) if !s.is_empty() => serializer.serialize_str(s),
            MessageContent::Parts(parts) if !parts.is_empty() => parts.serialize(serializer),
            _ => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for MessageContent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Buffer first so a malformed value degrades to Empty instead of
        // failing the enclosing message
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(value))
    }
}

/// A content part in a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(flatten)]
    pub kind: PartKind,

    /// Prompt caching hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
}

/// Kind-specific payload of a content part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PartKind {
    /// Text content
    Text { text: String },

    /// Image content
    ImageUrl { image_url: ImageUrl },

    /// File content (PDF processing)
    File { file: FileContent },

    /// Base64 audio
    InputAudio { input_audio: InputAudio },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_kind(PartKind::Text { text: text.into() })
    }

    pub fn image_url(url: impl Into<String>, detail: Option<ImageDetail>) -> Self {
        Self::from_kind(PartKind::ImageUrl {
            image_url: ImageUrl {
                url: url.into(),
                detail,
            },
        })
    }

    pub fn file(filename: impl Into<String>, file_data: impl Into<String>) -> Self {
        Self::from_kind(PartKind::File {
            file: FileContent {
                filename: filename.into(),
                file_data: file_data.into(),
            },
        })
    }

    pub fn input_audio(data: impl Into<String>, format: AudioFormat) -> Self {
        Self::from_kind(PartKind::InputAudio {
            input_audio: InputAudio {
                data: data.into(),
                format,
            },
        })
    }

    /// Attach a cache hint to this part
    pub fn with_cache_control(mut self, cache_control: CacheControl) -> Self {
        self.cache_control = Some(cache_control);
        self
    }

    fn from_kind(kind: PartKind) -> Self {
        Self {
            kind,
            cache_control: None,
        }
    }
}

/// Image URL content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    /// URL or base64 data URL
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ImageDetail>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    High,
    Low,
    Auto,
}

/// Inline file content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContent {
    pub filename: String,

    /// Data URL, e.g. `data:application/pdf;base64,...`
    pub file_data: String,
}

/// Inline audio content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputAudio {
    /// Base64 encoded audio
    pub data: String,

    pub format: AudioFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Wav,
}

/// Prompt caching hint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheControl {
    /// Only "ephemeral" is accepted upstream
    #[serde(rename = "type")]
    pub cache_type: String,

    /// "5m" or "1h"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
}

impl CacheControl {
    pub fn ephemeral() -> Self {
        Self {
            cache_type: "ephemeral".to_string(),
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: impl Into<String>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_encodes_as_string() {
        let content = MessageContent::text("Hello");
        assert_eq!(content.encode().unwrap(), br#""Hello""#);
    }

    #[test]
    fn test_empty_encodes_as_null() {
        assert_eq!(MessageContent::Empty.encode().unwrap(), b"null");
        assert_eq!(MessageContent::Text(String::new()).encode().unwrap(), b"null");
        assert_eq!(MessageContent::Parts(vec![]).encode().unwrap(), b"null");
    }

    #[test]
    fn test_parts_encode_with_discriminator() {
        let content = MessageContent::parts(vec![
            ContentPart::text("What is in this image?"),
            ContentPart::image_url("https://example.com/a.jpg", None),
        ]);
        let json = String::from_utf8(content.encode().unwrap()).unwrap();
        assert_eq!(
            json,
            r#"[{"type":"text","text":"What is in this image?"},{"type":"image_url","image_url":{"url":"https://example.com/a.jpg"}}]"#
        );
    }

    #[test]
    fn test_file_part_encoding() {
        let content = MessageContent::parts(vec![
            ContentPart::text("Analyze this PDF document"),
            ContentPart::file("document.pdf", "data:application/pdf;base64,JVBERi0x"),
        ]);
        let json = String::from_utf8(content.encode().unwrap()).unwrap();
        assert_eq!(
            json,
            r#"[{"type":"text","text":"Analyze this PDF document"},{"type":"file","file":{"filename":"document.pdf","file_data":"data:application/pdf;base64,JVBERi0x"}}]"#
        );
    }

    #[test]
    fn test_cache_control_attaches_to_any_part() {
        let part = ContentPart::input_audio("AAAA", AudioFormat::Wav)
            .with_cache_control(CacheControl::ephemeral().with_ttl("1h"));
        let json = serde_json::to_string(&part).unwrap();
        assert_eq!(
            json,
            r#"{"type":"input_audio","input_audio":{"data":"AAAA","format":"wav"},"cache_control":{"type":"ephemeral","ttl":"1h"}}"#
        );
    }

    #[test]
    fn test_decode_string() {
        let content = MessageContent::decode(br#""hi there""#);
        assert_eq!(content, MessageContent::Text("hi there".into()));
    }

    #[test]
    fn test_decode_parts() {
        let content = MessageContent::decode(
            br#"[{"type":"text","text":"a","cache_control":{"type":"ephemeral"}},{"type":"image_url","image_url":{"url":"u","detail":"low"}}]"#,
        );
        let MessageContent::Parts(parts) = content else {
            panic!("expected parts");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].cache_control, Some(CacheControl::ephemeral()));
        assert_eq!(
            parts[1].kind,
            PartKind::ImageUrl {
                image_url: ImageUrl {
                    url: "u".into(),
                    detail: Some(ImageDetail::Low)
                }
            }
        );
    }

    #[test]
    fn test_decode_tolerates_invalid_content() {
        assert_eq!(MessageContent::decode(b"null"), MessageContent::Empty);
        assert_eq!(MessageContent::decode(b"42"), MessageContent::Empty);
        assert_eq!(MessageContent::decode(br#""""#), MessageContent::Empty);
        assert_eq!(MessageContent::decode(b"[]"), MessageContent::Empty);
        assert_eq!(
            MessageContent::decode(br#"[{"type":"hologram"}]"#),
            MessageContent::Empty
        );
        assert_eq!(MessageContent::decode(b"{not json"), MessageContent::Empty);
    }

    #[test]
    fn test_round_trip_preserves_shape() {
        let values = [
            MessageContent::text("plain"),
            MessageContent::parts(vec![
                ContentPart::text("x"),
                ContentPart::input_audio("QUJD", AudioFormat::Mp3),
            ]),
            MessageContent::Empty,
        ];
        for value in values {
            let bytes = value.encode().unwrap();
            assert_eq!(MessageContent::decode(&bytes), value);
        }
    }

    #[test]
    fn test_to_string_content_joins_text_parts() {
        let content = MessageContent::parts(vec![
            ContentPart::text("Hello "),
            ContentPart::image_url("u", Some(ImageDetail::Auto)),
            ContentPart::text("World"),
        ]);
        assert_eq!(content.to_string_content(), "Hello World");
        assert!(!content.is_empty());
    }
}

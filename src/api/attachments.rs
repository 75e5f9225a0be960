//! Audio and PDF attachments
//!
//! Helpers that read local files and embed them as content parts.

use crate::api::chat::{Message, PdfEngine, PdfPlugin, Plugin, PluginId};
use crate::api::content::{AudioFormat, ContentPart, MessageContent};
use crate::error::{OpenRouterError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

/// User message with a text prompt followed by base64 encoded audio
pub fn user_message_with_audio(prompt: &str, audio: &[u8], format: AudioFormat) -> Message {
    Message::user(MessageContent::parts(vec![
        ContentPart::text(prompt),
        ContentPart::input_audio(STANDARD.encode(audio), format),
    ]))
}

/// Like [`user_message_with_audio`], reading the audio from `path`.
///
/// The format comes from the extension; only `.mp3` and `.wav` are accepted.
pub fn user_message_with_audio_from_file(prompt: &str, path: impl AsRef<Path>) -> Result<Message> {
    let path = path.as_ref();
    let format = audio_format_for(path)?;
    let audio = std::fs::read(path)?;
    Ok(user_message_with_audio(prompt, &audio, format))
}

/// User message with a text prompt followed by a PDF read from `path`.
///
/// The PDF is embedded as a base64 data URL under its file name.
pub fn user_message_with_pdf_from_file(prompt: &str, path: impl AsRef<Path>) -> Result<Message> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    Ok(Message::user(MessageContent::parts(vec![
        ContentPart::text(prompt),
        ContentPart::file(
            filename,
            format!("data:application/pdf;base64,{}", STANDARD.encode(data)),
        ),
    ])))
}

/// File-parser plugin configured for PDFs
pub fn pdf_plugin(engine: PdfEngine) -> Plugin {
    Plugin {
        id: PluginId::FileParser,
        pdf: Some(PdfPlugin { engine }),
    }
}

fn audio_format_for(path: &Path) -> Result<AudioFormat> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp3" => Ok(AudioFormat::Mp3),
        "wav" => Ok(AudioFormat::Wav),
        _ => Err(OpenRouterError::Config(format!(
            "unsupported audio format: {}",
            path.display()
        ))),
    }
}

//! API Module
//!
//! Request, response and chunk types for the chat and text completion
//! endpoints, plus embeddings and generation lookup.

pub mod attachments;
pub mod chat;
pub mod completion;
pub mod content;
pub mod embeddings;
pub mod generation;
pub mod usage;

pub use attachments::{
    pdf_plugin, user_message_with_audio, user_message_with_audio_from_file,
    user_message_with_pdf_from_file,
};
pub use chat::{
    Annotation, ChatChoice, ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse,
    ChunkChoice, ChunkDelta, DataCollection, FinishReason, FunctionCall, FunctionDefinition,
    JsonSchemaFormat, LogProbs, Message, PdfEngine, PdfPlugin, Plugin, PluginId,
    ProviderPreferences, ProviderSort, Reasoning, ResponseFormat, Role, SearchContextSize,
    StreamAccumulator, StreamOptions, Tool, ToolCall, ToolCallDelta, ToolChoice, UrlCitation,
    WebSearchOptions,
};
pub use completion::{CompletionChoice, CompletionRequest, CompletionResponse};
pub use content::{
    AudioFormat, CacheControl, ContentPart, FileContent, ImageDetail, ImageUrl, InputAudio,
    MessageContent, PartKind,
};
pub use embeddings::{
    EmbeddingData, EmbeddingInput, EmbeddingValue, EmbeddingsRequest, EmbeddingsResponse,
    EmbeddingsUsage, EncodingFormat,
};
pub use generation::Generation;
pub use usage::{IncludeUsage, Usage};

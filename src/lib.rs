//! openrouter-stream - OpenRouter API client
//!
//! Chat and text completions, embeddings and generation lookup against the
//! OpenRouter API, with an incremental
//! response stream decoder. Streaming calls return a [`StreamSession`] that
//! delivers decoded chunks in order, stays at most one chunk ahead of the
//! consumer, and releases the response body exactly once however the stream
//! ends.
//!
//! ```no_run
//! use openrouter_stream::{ChatCompletionRequest, Message, OpenRouterClient};
//!
//! # async fn run() -> openrouter_stream::Result<()> {
//! let client = OpenRouterClient::from_env()?;
//! let request = ChatCompletionRequest::new(
//!     "openai/gpt-4o-mini",
//!     vec![Message::user("Write a haiku about rivers")],
//! );
//!
//! let mut stream = client.chat_completion_stream(request).await?;
//! while let Some(chunk) = stream.recv().await? {
//!     print!("{}", chunk.delta_content().unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod stream;

pub use api::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, CompletionRequest,
    CompletionResponse, ContentPart, EmbeddingValue, EmbeddingsRequest, EmbeddingsResponse,
    Generation, Message, MessageContent, Role, StreamAccumulator, Usage,
};
pub use config::{ClientConfig, ConfigLoader};
pub use error::{ApiError, OpenRouterError, Result, StreamError};
pub use stream::{JsonDecoder, StreamObserver, StreamSession};
pub use tokio_util::sync::CancellationToken;

use api::generation::GenerationEnvelope;
use client::HttpClient;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
const COMPLETIONS_PATH: &str = "/completions";
const EMBEDDINGS_PATH: &str = "/embeddings";
const GENERATION_PATH: &str = "/generation";

/// Client for the OpenRouter API
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http_client: HttpClient,
}

impl OpenRouterClient {
    /// Create a client from explicit settings
    pub fn new(config: ClientConfig) -> Result<Self> {
        tracing::debug!(base_url = %config.base_url, "creating client");
        Ok(Self {
            http_client: HttpClient::new(config)?,
        })
    }

    /// Create a client from `.env`, config files and `OPENROUTER_*`
    /// environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ConfigLoader::new()?.into_config()?)
    }

    pub fn config(&self) -> &ClientConfig {
        self.http_client.config()
    }

    /// Send a chat completion request and wait for the whole response.
    ///
    /// Fails with [`OpenRouterError::StreamNotSupported`] if the request asks
    /// for streaming; use [`OpenRouterClient::chat_completion_stream`].
    pub async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        if request.is_stream() {
            return Err(OpenRouterError::StreamNotSupported);
        }

        tracing::debug!(model = %request.model, messages = request.messages.len(), "chat completion");
        self.http_client
            .post_json(CHAT_COMPLETIONS_PATH, &request)
            .await
    }

    /// Start a streaming chat completion
    pub async fn chat_completion_stream(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<StreamSession<ChatCompletionChunk>> {
        self.chat_completion_stream_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Start a streaming chat completion that also stops when `cancel` fires.
    ///
    /// Cancelling `cancel` before the response arrives aborts the request.
    pub async fn chat_completion_stream_with_cancel(
        &self,
        request: ChatCompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<StreamSession<ChatCompletionChunk>> {
        let request = request.with_stream(true);
        tracing::debug!(model = %request.model, messages = request.messages.len(), "chat completion stream");
        self.open_stream(CHAT_COMPLETIONS_PATH, &request, "chat", cancel)
            .await
    }

    /// Send a text completion request and wait for the whole response.
    ///
    /// Fails with [`OpenRouterError::StreamNotSupported`] if the request asks
    /// for streaming.
    pub async fn completion(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        if request.is_stream() {
            return Err(OpenRouterError::StreamNotSupported);
        }

        tracing::debug!(model = %request.model, "completion");
        self.http_client.post_json(COMPLETIONS_PATH, &request).await
    }

    /// Start a streaming text completion. Each chunk is a partial
    /// [`CompletionResponse`].
    pub async fn completion_stream(
        &self,
        request: CompletionRequest,
    ) -> Result<StreamSession<CompletionResponse>> {
        self.completion_stream_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Start a streaming text completion that also stops when `cancel` fires
    pub async fn completion_stream_with_cancel(
        &self,
        request: CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<StreamSession<CompletionResponse>> {
        let request = request.with_stream(true);
        tracing::debug!(model = %request.model, "completion stream");
        self.open_stream(COMPLETIONS_PATH, &request, "completion", cancel)
            .await
    }

    /// Embed text or tokens
    pub async fn embeddings(&self, request: EmbeddingsRequest) -> Result<EmbeddingsResponse> {
        tracing::debug!(model = %request.model, "embeddings");
        self.http_client.post_json(EMBEDDINGS_PATH, &request).await
    }

    /// Look up cost and timing of a finished request by its generation id
    /// (the `id` of a response or chunk)
    pub async fn get_generation(&self, id: &str) -> Result<Generation> {
        tracing::debug!(id, "generation lookup");
        let envelope: GenerationEnvelope = self
            .http_client
            .get_json(GENERATION_PATH, &[("id", id)])
            .await?;
        Ok(envelope.data)
    }

    async fn open_stream<B, T>(
        &self,
        path: &str,
        body: &B,
        label: &'static str,
        cancel: &CancellationToken,
    ) -> Result<StreamSession<T>>
    where
        B: serde::Serialize,
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(OpenRouterError::Cancelled),
            response = self.http_client.post_stream(path, body) => response?,
        };

        tracing::info!(stream = label, "stream started");
        Ok(StreamSession::spawn_with_cancel(
            response,
            JsonDecoder::new(),
            self.config().observer_for(label),
            cancel,
        ))
    }
}

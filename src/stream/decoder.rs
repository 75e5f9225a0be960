//! Chunk decoding
//!
//! Turns the payload of a data frame into the stream's chunk type.

use crate::error::DecodeError;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;

/// Decodes one data-frame payload into a chunk.
///
/// A failure is terminal for the stream; decoders never see the rest of the
/// body.
pub trait ChunkDecoder<T>: Send + Sync + 'static {
    fn decode(&self, payload: &[u8]) -> Result<T, DecodeError>;
}

/// Decodes payloads as JSON into `T`
pub struct JsonDecoder<T> {
    _chunk: PhantomData<fn() -> T>,
}

impl<T> JsonDecoder<T> {
    pub fn new() -> Self {
        Self {
            _chunk: PhantomData,
        }
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonDecoder<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonDecoder")
            .field("chunk", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> ChunkDecoder<T> for JsonDecoder<T>
where
    T: DeserializeOwned + 'static,
{
    fn decode(&self, payload: &[u8]) -> Result<T, DecodeError> {
        serde_json::from_slice(payload).map_err(|e| DecodeError::new(payload, e))
    }
}

/// Decoder backed by a closure, see [`decode_fn`]
#[derive(Clone)]
pub struct DecodeFn<F> {
    f: F,
}

/// Build a decoder from a closure
pub fn decode_fn<T, F>(f: F) -> DecodeFn<F>
where
    F: Fn(&[u8]) -> Result<T, DecodeError> + Send + Sync + 'static,
{
    DecodeFn { f }
}

impl<F> fmt::Debug for DecodeFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeFn").finish_non_exhaustive()
    }
}

impl<T, F> ChunkDecoder<T> for DecodeFn<F>
where
    F: Fn(&[u8]) -> Result<T, DecodeError> + Send + Sync + 'static,
{
    fn decode(&self, payload: &[u8]) -> Result<T, DecodeError> {
        (self.f)(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ChatCompletionChunk;

    #[test]
    fn test_json_decoder_chat_chunk() {
        let decoder = JsonDecoder::<ChatCompletionChunk>::new();
        let chunk = decoder
            .decode(br#"{"id":"gen-1","object":"chat.completion.chunk","created":1,"model":"m","choices":[{"index":0,"delta":{"content":"Hi"}}]}"#)
            .unwrap();
        assert_eq!(chunk.id, "gen-1");
        assert_eq!(chunk.delta_content(), Some("Hi"));
    }

    #[test]
    fn test_json_decoder_reports_payload() {
        let decoder = JsonDecoder::<ChatCompletionChunk>::new();
        let err = decoder.decode(b"{\"id\": ").unwrap_err();
        assert_eq!(err.payload, "{\"id\": ");
    }

    #[test]
    fn test_json_decoder_rejects_wrong_shape() {
        let decoder = JsonDecoder::<ChatCompletionChunk>::new();
        assert!(decoder.decode(b"[1, 2]").is_err());
    }

    #[test]
    fn test_decode_fn() {
        let decoder = decode_fn(|payload: &[u8]| {
            std::str::from_utf8(payload)
                .map(str::to_uppercase)
                .map_err(|e| DecodeError::new(payload, e))
        });
        assert_eq!(decoder.decode(b"abc").unwrap(), "ABC");
        assert!(decoder.decode(&[0xff, 0xfe]).is_err());
    }
}

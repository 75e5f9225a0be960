//! Stream Module
//!
//! Incremental decoding of `text/event-stream` response bodies: line framing,
//! chunk decoding and the session that drives both on a background task.

pub mod decoder;
pub mod frame;
pub mod observer;
pub mod session;

pub use decoder::{decode_fn, ChunkDecoder, DecodeFn, JsonDecoder};
pub use frame::{Frame, FrameReader};
pub use observer::{EndReason, NoopObserver, StreamObserver, TracingObserver};
pub use session::{SessionState, StreamSession};

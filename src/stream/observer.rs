//! Stream observers
//!
//! The driver loop reports what it sees through a [`StreamObserver`] instead
//! of logging directly. [`TracingObserver`] forwards to `tracing`.

use crate::error::DecodeError;
use std::fmt;
use std::io;

/// Why a stream stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// `[DONE]` received
    Terminator,

    /// Body ended without a terminator
    EndOfBody,

    /// Consumer closed the session or the caller's token fired
    Cancelled,

    /// Session dropped its receiver
    ConsumerGone,

    /// Read failure, delivered to the consumer
    ReadError,

    /// Undecodable payload, delivered to the consumer
    DecodeError,
}

impl EndReason {
    /// Whether the stream ended with an error delivered to the consumer
    pub fn is_error(self) -> bool {
        matches!(self, EndReason::ReadError | EndReason::DecodeError)
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EndReason::Terminator => "terminator",
            EndReason::EndOfBody => "end of body",
            EndReason::Cancelled => "cancelled",
            EndReason::ConsumerGone => "consumer gone",
            EndReason::ReadError => "read error",
            EndReason::DecodeError => "decode error",
        };
        f.write_str(s)
    }
}

/// Receives driver events. All methods default to doing nothing.
///
/// Called from the driver task; implementations must not block.
pub trait StreamObserver: Send + Sync {
    /// A comment line was skipped
    fn on_comment(&self, _comment: &[u8]) {}

    /// Chunk number `index` (zero-based) was handed to the consumer
    fn on_chunk(&self, _index: usize) {}

    fn on_read_error(&self, _error: &io::Error) {}

    fn on_decode_error(&self, _error: &DecodeError) {}

    /// The body has been released and the channel closed
    fn on_closed(&self, _reason: EndReason, _delivered: usize) {}
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl StreamObserver for NoopObserver {}

/// Forwards events to `tracing`, tagged with a stream label
#[derive(Debug, Clone)]
pub struct TracingObserver {
    label: &'static str,
}

impl TracingObserver {
    pub fn new(label: &'static str) -> Self {
        Self { label }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("stream")
    }
}

impl StreamObserver for TracingObserver {
    fn on_comment(&self, comment: &[u8]) {
        tracing::trace!(
            stream = self.label,
            comment = %String::from_utf8_lossy(comment),
            "skipped comment line"
        );
    }

    fn on_read_error(&self, error: &io::Error) {
        tracing::error!(stream = self.label, error = %error, "failed to read stream");
    }

    fn on_decode_error(&self, error: &DecodeError) {
        tracing::error!(
            stream = self.label,
            error = %error.source,
            line = %error.payload,
            "failed to decode stream chunk"
        );
    }

    fn on_closed(&self, reason: EndReason, delivered: usize) {
        match reason {
            EndReason::Cancelled => {
                tracing::info!(stream = self.label, delivered, "stream stopped due to cancellation")
            }
            _ => tracing::debug!(stream = self.label, %reason, delivered, "stream closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_reason_error_classification() {
        assert!(EndReason::DecodeError.is_error());
        assert!(EndReason::ReadError.is_error());
        assert!(!EndReason::Cancelled.is_error());
        assert!(!EndReason::EndOfBody.is_error());
        assert_eq!(EndReason::Terminator.to_string(), "terminator");
    }

    #[test]
    fn test_tracing_observer_accepts_events() {
        let observer = TracingObserver::new("chat");
        observer.on_comment(b"OPENROUTER PROCESSING");
        observer.on_closed(EndReason::Cancelled, 3);
        observer.on_closed(EndReason::Terminator, 3);
    }
}

//! Stream Sessions
//!
//! A [`StreamSession`] owns one background driver task bound to one response
//! body. The driver reads frames, decodes data frames into chunks and hands
//! them to the consumer one at a time; the consumer pulls with
//! [`StreamSession::recv`].
//!
//! Lifecycle: `Running` until a terminator, end of body, error or
//! cancellation; `Draining` while the driver tears down; `Closed` once the
//! body has been dropped and the channel closed. The body is owned by the
//! driver and dropped exactly once, whichever path ends the stream.

use crate::error::StreamError;
use crate::stream::decoder::ChunkDecoder;
use crate::stream::frame::{Frame, FrameReader};
use crate::stream::observer::{EndReason, StreamObserver};
use futures::Stream;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::io::{AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Driver liveness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Draining,
    Closed,
}

type Delivery<T> = Result<T, StreamError>;

/// Pull-based handle to a running stream.
///
/// Chunks arrive in body order. The driver is never more than one chunk
/// ahead of the consumer. Dropping the session cancels the driver.
pub struct StreamSession<T> {
    receiver: mpsc::Receiver<Delivery<T>>,
    cancel: CancellationToken,
    state: Arc<Mutex<SessionState>>,
    driver: Option<JoinHandle<()>>,
}

impl<T> std::fmt::Debug for StreamSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("state", &self.state())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<T> StreamSession<T> {
    /// Stop the stream. Safe to call any number of times, including after
    /// the stream has ended on its own.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Whether [`StreamSession::close`] was called or the parent token fired
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Current lifecycle state. `Closed` is reached only after the driver
    /// has dropped the response body.
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }
}

impl<T> StreamSession<T>
where
    T: Send + 'static,
{
    /// Start a driver for `body`. Must be called inside a Tokio runtime.
    pub fn spawn<R, D>(body: R, decoder: D, observer: Arc<dyn StreamObserver>) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        D: ChunkDecoder<T>,
    {
        Self::spawn_with_cancel(body, decoder, observer, &CancellationToken::new())
    }

    /// Like [`StreamSession::spawn`], also stopping when `parent` is
    /// cancelled. Cancelling `parent` is equivalent to calling
    /// [`StreamSession::close`]; closing the session leaves `parent` alone.
    pub fn spawn_with_cancel<R, D>(
        body: R,
        decoder: D,
        observer: Arc<dyn StreamObserver>,
        parent: &CancellationToken,
    ) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        D: ChunkDecoder<T>,
    {
        let cancel = parent.child_token();
        // Capacity 1 plus reserve-before-read keeps at most one undelivered
        // chunk in existence
        let (sender, receiver) = mpsc::channel(1);
        let state = Arc::new(Mutex::new(SessionState::Running));

        let driver = Driver {
            frames: FrameReader::new(BufReader::new(body)),
            decoder,
            observer,
            sender,
            cancel: cancel.clone(),
            state: Arc::clone(&state),
            delivered: 0,
        };

        Self {
            receiver,
            cancel,
            state,
            driver: Some(tokio::spawn(driver.run())),
        }
    }

    /// Receive the next chunk.
    ///
    /// `Ok(None)` is end-of-stream: after a terminator, end of body, a
    /// previously reported error, or cancellation. Once cancelled this
    /// returns `Ok(None)` immediately even if a chunk is pending. An error is
    /// reported once; the following call returns `Ok(None)`.
    pub async fn recv(&mut self) -> Result<Option<T>, StreamError> {
        if self.cancel.is_cancelled() {
            return Ok(None);
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Ok(None),
            item = self.receiver.recv() => item.transpose(),
        }
    }

    /// Close the stream and wait until the driver has released the body.
    pub async fn close_and_wait(mut self) {
        self.close();
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.await {
                if e.is_panic() {
                    std::panic::resume_unwind(e.into_panic());
                }
            }
        }
    }

    /// Adapt into a `futures` stream yielding chunks until end-of-stream.
    /// A terminal error is yielded as the last item.
    pub fn into_stream(mut self) -> impl Stream<Item = Result<T, StreamError>> + Send {
        async_stream::stream! {
            loop {
                match self.recv().await {
                    Ok(Some(chunk)) => yield Ok(chunk),
                    Ok(None) => break,
                    Err(e) => yield Err(e),
                }
            }
        }
    }
}

impl<T> Drop for StreamSession<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Producer side of a session, run as a single task
struct Driver<R, D, T> {
    frames: FrameReader<BufReader<R>>,
    decoder: D,
    observer: Arc<dyn StreamObserver>,
    sender: mpsc::Sender<Delivery<T>>,
    cancel: CancellationToken,
    state: Arc<Mutex<SessionState>>,
    delivered: usize,
}

impl<R, D, T> Driver<R, D, T>
where
    R: AsyncRead + Send + Unpin + 'static,
    D: ChunkDecoder<T>,
    T: Send + 'static,
{
    async fn run(mut self) {
        let reason = self.drive().await;

        *self.state.lock() = SessionState::Draining;

        let Driver {
            frames,
            observer,
            sender,
            state,
            delivered,
            ..
        } = self;
        drop(frames);
        drop(sender);

        *state.lock() = SessionState::Closed;
        observer.on_closed(reason, delivered);
    }

    async fn drive(&mut self) -> EndReason {
        loop {
            // Wait for the consumer to take the previous chunk before
            // touching the body again
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return EndReason::Cancelled,
                permit = self.sender.reserve() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return EndReason::ConsumerGone,
                },
            };

            let payload = loop {
                let next = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return EndReason::Cancelled,
                    next = self.frames.next_frame() => next,
                };

                match next {
                    Ok(Some(Frame::Data(payload))) => break payload,
                    Ok(Some(Frame::Comment(comment))) => self.observer.on_comment(&comment),
                    Ok(Some(Frame::Blank)) => {}
                    Ok(Some(Frame::Terminator)) => return EndReason::Terminator,
                    Ok(None) => return EndReason::EndOfBody,
                    Err(e) => {
                        self.observer.on_read_error(&e);
                        permit.send(Err(StreamError::Frame(e)));
                        return EndReason::ReadError;
                    }
                }
            };

            match self.decoder.decode(&payload) {
                Ok(chunk) => {
                    permit.send(Ok(chunk));
                    self.observer.on_chunk(self.delivered);
                    self.delivered += 1;
                }
                Err(e) => {
                    self.observer.on_decode_error(&e);
                    permit.send(Err(StreamError::Decode(e)));
                    return EndReason::DecodeError;
                }
            }
        }
    }
}

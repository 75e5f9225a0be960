//! Line framing for `text/event-stream` bodies.
//!
//! Every physical line is one frame. A JSON payload split across several
//! lines is not reassembled: the upstream protocol emits exactly one object
//! per `data:` line, and each line is decoded on its own.

use bytes::Bytes;
use futures::Stream;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Prefix stripped from data lines
pub const DATA_PREFIX: &[u8] = b"data:";

/// Lines starting with this byte are comments (keep-alives such as
/// `: OPENROUTER PROCESSING`)
pub const COMMENT_PREFIX: u8 = b':';

/// Payload marking the normal end of a stream
pub const TERMINATOR: &[u8] = b"[DONE]";

/// One classified line of the response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Payload with the `data:` prefix and surrounding whitespace removed
    Data(Bytes),

    /// Comment text after the leading `:`
    Comment(Bytes),

    /// `[DONE]`
    Terminator,

    /// Empty line, or a `data:` line with nothing after the prefix
    Blank,
}

impl Frame {
    /// Classify a single line. A trailing `\n` or `\r\n` is ignored.
    pub fn classify(line: &[u8]) -> Frame {
        let line = line.strip_suffix(b"\n").unwrap_or(line);
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        if line.is_empty() {
            return Frame::Blank;
        }

        if let Some(comment) = line.strip_prefix(&[COMMENT_PREFIX]) {
            return Frame::Comment(Bytes::copy_from_slice(comment.trim_ascii()));
        }

        let payload = line.strip_prefix(DATA_PREFIX).unwrap_or(line).trim_ascii();

        if payload.is_empty() {
            Frame::Blank
        } else if payload == TERMINATOR {
            Frame::Terminator
        } else {
            Frame::Data(Bytes::copy_from_slice(payload))
        }
    }

    /// Comments and blank lines carry nothing for the consumer
    pub fn is_skippable(&self) -> bool {
        matches!(self, Frame::Comment(_) | Frame::Blank)
    }
}

/// Reads classified frames from a buffered byte source.
///
/// The sequence is finite and not restartable: after a terminator, end of
/// input, or a read error, every further call returns `Ok(None)`.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    line: Vec<u8>,
    finished: bool,
}

impl<R> FrameReader<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::with_capacity(1024),
            finished: false,
        }
    }

    /// Read and classify the next line.
    ///
    /// End of input without a terminator is a normal end (`Ok(None)`). An
    /// unterminated final line is still classified.
    pub async fn next_frame(&mut self) -> io::Result<Option<Frame>> {
        if self.finished {
            return Ok(None);
        }

        self.line.clear();
        let read = match self.reader.read_until(b'\n', &mut self.line).await {
            Ok(n) => n,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };

        if read == 0 {
            self.finished = true;
            return Ok(None);
        }

        let frame = Frame::classify(&self.line);
        if frame == Frame::Terminator {
            self.finished = true;
        }
        Ok(Some(frame))
    }

    /// Whether the sequence has ended
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Consume the reader into a stream of frames, comments and blanks
    /// included. The stream ends after the terminator or the first error.
    pub fn into_stream(mut self) -> impl Stream<Item = io::Result<Frame>>
    where
        R: Send + 'static,
    {
        async_stream::stream! {
            loop {
                match self.next_frame().await {
                    Ok(Some(frame)) => yield Ok(frame),
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn data(s: &str) -> Frame {
        Frame::Data(Bytes::copy_from_slice(s.as_bytes()))
    }

    #[test]
    fn test_classify_data_line() {
        assert_eq!(Frame::classify(b"data: {\"id\":1}\n"), data("{\"id\":1}"));
        assert_eq!(Frame::classify(b"data:{\"id\":1}\r\n"), data("{\"id\":1}"));
    }

    #[test]
    fn test_classify_line_without_prefix_is_data() {
        assert_eq!(Frame::classify(b"{\"id\":2}\n"), data("{\"id\":2}"));
    }

    #[test]
    fn test_classify_terminator() {
        assert_eq!(Frame::classify(b"data: [DONE]\n"), Frame::Terminator);
        assert_eq!(Frame::classify(b"data: [DONE]"), Frame::Terminator);
        assert_eq!(Frame::classify(b"[DONE]\r\n"), Frame::Terminator);
    }

    #[test]
    fn test_classify_comment_and_blank() {
        assert_eq!(
            Frame::classify(b": OPENROUTER PROCESSING\n"),
            Frame::Comment(Bytes::from_static(b"OPENROUTER PROCESSING"))
        );
        assert_eq!(Frame::classify(b"\n"), Frame::Blank);
        assert_eq!(Frame::classify(b"\r\n"), Frame::Blank);
        assert_eq!(Frame::classify(b"data:\n"), Frame::Blank);
        assert!(Frame::classify(b":\n").is_skippable());
    }

    #[tokio::test]
    async fn test_reader_sequence() {
        let body: &[u8] =
            b": OPENROUTER PROCESSING\n\ndata: {\"a\":1}\n\ndata: {\"a\":2}\ndata: [DONE]\ndata: {\"a\":3}\n";
        let mut reader = FrameReader::new(body);

        assert!(matches!(reader.next_frame().await.unwrap(), Some(Frame::Comment(_))));
        assert_eq!(reader.next_frame().await.unwrap(), Some(Frame::Blank));
        assert_eq!(reader.next_frame().await.unwrap(), Some(data("{\"a\":1}")));
        assert_eq!(reader.next_frame().await.unwrap(), Some(Frame::Blank));
        assert_eq!(reader.next_frame().await.unwrap(), Some(data("{\"a\":2}")));
        assert_eq!(reader.next_frame().await.unwrap(), Some(Frame::Terminator));

        // Nothing after the terminator is consulted
        assert!(reader.is_finished());
        assert_eq!(reader.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reader_eof_without_terminator() {
        let body: &[u8] = b"data: {\"a\":1}\ndata: {\"a\":2}";
        let mut reader = FrameReader::new(body);

        assert_eq!(reader.next_frame().await.unwrap(), Some(data("{\"a\":1}")));
        assert_eq!(reader.next_frame().await.unwrap(), Some(data("{\"a\":2}")));
        assert_eq!(reader.next_frame().await.unwrap(), None);
        assert_eq!(reader.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reader_surfaces_read_error_once() {
        let mock = tokio_test::io::Builder::new()
            .read(b"data: {\"a\":1}\n")
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let mut reader = FrameReader::new(tokio::io::BufReader::new(mock));

        assert_eq!(reader.next_frame().await.unwrap(), Some(data("{\"a\":1}")));
        let err = reader.next_frame().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
        assert_eq!(reader.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_into_stream_stops_at_terminator() {
        let body: &[u8] = b"data: 1\n: ping\ndata: [DONE]\ndata: 2\n";
        let frames: Vec<_> = FrameReader::new(body)
            .into_stream()
            .map(|f| f.unwrap())
            .collect()
            .await;

        assert_eq!(
            frames,
            vec![
                data("1"),
                Frame::Comment(Bytes::from_static(b"ping")),
                Frame::Terminator
            ]
        );
    }
}

//! Response formatting, ordering and publication.
//!
//! Every framed line produces exactly one `<request> <result>\n` response.
//! Jobs finish on whichever context ran them, so completions are tagged with
//! the line's receipt sequence number and released in that order.

use std::collections::BTreeMap;
use std::fmt;

use tracing::info;

use crate::transport::{LineSink, TransportError};

/// Tracing target mirroring every published response.
pub(crate) const RESPONSE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::response");

/// Result field of a response line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultToken {
    /// `-1`: rejected line or failed handler.
    Failure,
    /// `0`: command completed with nothing to report.
    Ack,
    /// `1` or `0`.
    Flag(bool),
    /// Two lowercase hex digits.
    Byte(u8),
    /// Sixteen lowercase hex digits.
    Quad(u64),
}

impl fmt::Display for ResultToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failure => formatter.write_str("-1"),
            Self::Ack | Self::Flag(false) => formatter.write_str("0"),
            Self::Flag(true) => formatter.write_str("1"),
            Self::Byte(value) => write!(formatter, "{value:02x}"),
            Self::Quad(value) => write!(formatter, "{value:016x}"),
        }
    }
}

/// One response line.
///
/// The request is kept as raw bytes so it is echoed exactly as received.
/// [`Display`](fmt::Display) renders it lossily for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    request: Vec<u8>,
    result: ResultToken,
}

impl ResponseFrame {
    /// Pairs the request line with its result.
    #[must_use]
    pub fn new(request: impl Into<Vec<u8>>, result: ResultToken) -> Self {
        Self {
            request: request.into(),
            result,
        }
    }

    /// The request line as received.
    #[must_use]
    pub fn request(&self) -> &[u8] {
        &self.request
    }

    /// The result token.
    #[must_use]
    pub fn result(&self) -> ResultToken {
        self.result
    }

    /// Wire form: `<request> <result>\n`.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let result = self.result.to_string();
        let mut line = Vec::with_capacity(self.request.len() + result.len() + 2);
        line.extend_from_slice(&self.request);
        line.push(b' ');
        line.extend_from_slice(result.as_bytes());
        line.push(b'\n');
        line
    }
}

impl fmt::Display for ResponseFrame {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            formatter,
            "{} {}",
            String::from_utf8_lossy(&self.request),
            self.result
        )
    }
}

/// A finished command, tagged with the receipt sequence of its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Receipt sequence number of the line.
    pub sequence: u64,
    /// The response to publish.
    pub frame: ResponseFrame,
}

/// Reorders completions into receipt order.
#[derive(Debug, Default)]
pub struct ResponseSequencer {
    next: u64,
    held: BTreeMap<u64, ResponseFrame>,
}

impl ResponseSequencer {
    /// Creates a sequencer expecting sequence number zero first.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a completion and returns every frame now releasable, oldest
    /// first.
    pub fn accept(&mut self, completion: Completion) -> Vec<ResponseFrame> {
        self.held.insert(completion.sequence, completion.frame);
        let mut ready = Vec::new();
        while let Some(frame) = self.held.remove(&self.next) {
            ready.push(frame);
            self.next += 1;
        }
        ready
    }

    /// Completions waiting on an earlier sequence number.
    #[must_use]
    pub fn held(&self) -> usize {
        self.held.len()
    }
}

/// Writes frames to the outbound pipe and mirrors them to the log.
#[derive(Debug, Default)]
pub struct ResponsePublisher {
    published: u64,
}

impl ResponsePublisher {
    /// Creates a publisher with nothing published.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes one frame.
    ///
    /// # Errors
    ///
    /// Returns the sink's error. The frame is still mirrored to the log.
    pub fn publish(
        &mut self,
        sink: &mut dyn LineSink,
        frame: &ResponseFrame,
    ) -> Result<(), TransportError> {
        let line = frame.encode();
        info!(
            target: RESPONSE_TARGET,
            response = %line.trim_ascii_end().escape_ascii(),
            "response"
        );
        sink.write_line(&line)?;
        self.published += 1;
        Ok(())
    }

    /// Frames successfully written so far.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.published
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use camino::Utf8PathBuf;
    use rstest::rstest;

    use super::*;

    #[derive(Default)]
    struct VecSink {
        lines: Vec<Vec<u8>>,
        fail: bool,
    }

    impl LineSink for VecSink {
        fn write_line(&mut self, line: &[u8]) -> Result<(), TransportError> {
            if self.fail {
                return Err(TransportError::Write {
                    path: Utf8PathBuf::from("emu_out"),
                    source: io::Error::from(io::ErrorKind::BrokenPipe),
                });
            }
            self.lines.push(line.to_owned());
            Ok(())
        }
    }

    fn completion(sequence: u64, request: &str) -> Completion {
        Completion {
            sequence,
            frame: ResponseFrame::new(request, ResultToken::Ack),
        }
    }

    #[rstest]
    #[case(ResultToken::Failure, "-1")]
    #[case(ResultToken::Ack, "0")]
    #[case(ResultToken::Flag(true), "1")]
    #[case(ResultToken::Flag(false), "0")]
    #[case(ResultToken::Byte(0x0a), "0a")]
    #[case(ResultToken::Quad(0x3ff0_0000_0000_0000), "3ff0000000000000")]
    #[case(ResultToken::Quad(1), "0000000000000001")]
    fn formats_result_tokens(#[case] token: ResultToken, #[case] expected: &str) {
        assert_eq!(token.to_string(), expected);
    }

    #[test]
    fn frame_echoes_request_verbatim() {
        let frame = ResponseFrame::new("ReadMemory eff 10", ResultToken::Byte(0xab));
        assert_eq!(frame.encode(), b"ReadMemory eff 10 ab\n");
        assert_eq!(frame.to_string(), "ReadMemory eff 10 ab\n");
    }

    #[test]
    fn frame_keeps_invalid_utf8_request_bytes() {
        let frame = ResponseFrame::new(&b"\xff\xfe"[..], ResultToken::Failure);
        assert_eq!(frame.encode(), b"\xff\xfe -1\n");
    }

    #[test]
    fn sequencer_holds_later_completions() {
        let mut sequencer = ResponseSequencer::new();
        assert!(sequencer.accept(completion(1, "b")).is_empty());
        assert!(sequencer.accept(completion(2, "c")).is_empty());
        assert_eq!(sequencer.held(), 2);

        let released: Vec<_> = sequencer
            .accept(completion(0, "a"))
            .into_iter()
            .map(|frame| frame.request().to_vec())
            .collect();
        assert_eq!(released, [b"a", b"b", b"c"]);
        assert_eq!(sequencer.held(), 0);
    }

    #[test]
    fn publisher_writes_through_sink() {
        let mut publisher = ResponsePublisher::new();
        let mut sink = VecSink::default();
        publisher
            .publish(&mut sink, &ResponseFrame::new("Pause", ResultToken::Ack))
            .expect("publish");
        assert_eq!(sink.lines, [b"Pause 0\n"]);
        assert_eq!(publisher.published(), 1);
    }

    #[test]
    fn failed_write_is_not_counted() {
        let mut publisher = ResponsePublisher::new();
        let mut sink = VecSink {
            fail: true,
            ..VecSink::default()
        };
        let result = publisher.publish(&mut sink, &ResponseFrame::new("Pause", ResultToken::Ack));
        assert!(matches!(result, Err(TransportError::Write { .. })));
        assert_eq!(publisher.published(), 0);
    }
}

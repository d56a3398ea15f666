//! Newline framing for the inbound byte stream.
//!
//! Bytes arrive in arbitrary chunks. [`LineFramer`] keeps the unterminated
//! suffix of everything appended so far and hands out complete lines in
//! arrival order, without their `\n` delimiter. Lines stay raw bytes so a
//! rejected line can be echoed exactly as it arrived.

use bytes::{Buf, Bytes, BytesMut};

const INITIAL_CAPACITY: usize = 1024;

/// Accumulates inbound bytes and extracts complete lines.
#[derive(Debug)]
pub struct LineFramer {
    buffer: BytesMut,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    /// Creates an empty framer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Appends freshly read bytes.
    pub fn append(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Removes and returns the oldest complete line, if any.
    pub fn next_line(&mut self) -> Option<Bytes> {
        let newline = self.buffer.iter().position(|byte| *byte == b'\n')?;
        let line = self.buffer.split_to(newline).freeze();
        self.buffer.advance(1);
        Some(line)
    }

    /// Number of buffered bytes not yet terminated by a newline.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

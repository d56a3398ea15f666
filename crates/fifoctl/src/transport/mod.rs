//! Named-pipe endpoints for the control protocol.
//!
//! The transport owns both file descriptors of a pipe pair. Reads are
//! non-blocking and drain everything currently buffered. Writes either block
//! until the whole line has been handed to the kernel or fail straight away,
//! depending on the [`WriteMode`] the pair was opened with.

mod errors;
mod pipe;

pub use self::errors::TransportError;
pub use self::pipe::{LineSink, PipeTransport, WriteMode};

pub(crate) const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

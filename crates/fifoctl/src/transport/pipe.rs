//! Pipe pair implementation.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;

use camino::{Utf8Path, Utf8PathBuf};
use fifoctl_config::PipeLayout;
use tracing::{debug, info};

use super::{TRANSPORT_TARGET, TransportError};

/// Destination for complete response lines.
pub trait LineSink {
    /// Writes `line` (newline included) in a single write.
    fn write_line(&mut self, line: &[u8]) -> Result<(), TransportError>;
}

/// Behaviour of writes when the outbound pipe is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Wait until the reader makes room.
    #[default]
    Blocking,
    /// Fail with [`io::ErrorKind::WouldBlock`] instead of waiting.
    NonBlocking,
}

/// Open inbound/outbound pipe pair.
///
/// Both files are opened read-write. For the inbound pipe this keeps a writer
/// attached so reads never observe end-of-file when the controller closes its
/// end; for the outbound pipe it keeps a reader attached so writes never fail
/// with a broken pipe when the controller's reader goes away.
#[derive(Debug)]
pub struct PipeTransport {
    inbound: InboundPipe,
    outbound_path: Utf8PathBuf,
    outbound: File,
    chunk: Vec<u8>,
}

impl PipeTransport {
    /// Opens the pipe pair described by `layout`.
    ///
    /// # Errors
    ///
    /// Returns the first open failure. Nothing stays open on failure.
    pub fn open(
        layout: &PipeLayout,
        chunk_bytes: usize,
        mode: WriteMode,
    ) -> Result<Self, TransportError> {
        let inbound = InboundPipe::open(layout.inbound_path())?;
        let outbound_path = layout.outbound_path();
        let mut options = OpenOptions::new();
        options.read(true).write(true);
        if mode == WriteMode::NonBlocking {
            options.custom_flags(libc::O_NONBLOCK);
        }
        let outbound = options
            .open(outbound_path.as_std_path())
            .map_err(|source| TransportError::OpenOutbound {
                path: outbound_path.clone(),
                source,
            })?;

        info!(
            target: TRANSPORT_TARGET,
            inbound = %inbound.path,
            outbound = %outbound_path,
            ?mode,
            "pipe pair open"
        );
        Ok(Self {
            inbound,
            outbound_path,
            outbound,
            chunk: vec![0_u8; chunk_bytes.max(1)],
        })
    }

    /// Appends every byte currently buffered in the inbound pipe to
    /// `received` and returns how many were appended.
    ///
    /// A descriptor error other than would-block closes and reopens the
    /// inbound pipe once and retries. Bytes read before a failure are kept in
    /// `received` either way.
    ///
    /// # Errors
    ///
    /// Returns an error when the reopen or the retried read fails; the caller
    /// should try again on its next iteration.
    pub fn read_available(&mut self, received: &mut Vec<u8>) -> Result<usize, TransportError> {
        read_reopening(&mut self.inbound, &mut self.chunk, received)
    }
}

impl LineSink for PipeTransport {
    fn write_line(&mut self, line: &[u8]) -> Result<(), TransportError> {
        self.outbound
            .write_all(line)
            .and_then(|()| self.outbound.flush())
            .map_err(|source| TransportError::Write {
                path: self.outbound_path.clone(),
                source,
            })
    }
}

/// Inbound byte source that can be replaced after a descriptor error.
trait ReopenRead: Read {
    /// Path named in errors.
    fn path(&self) -> &Utf8Path;

    /// Closes the current descriptor and opens a fresh one.
    fn reopen(&mut self) -> Result<(), TransportError>;
}

#[derive(Debug)]
struct InboundPipe {
    path: Utf8PathBuf,
    file: File,
}

impl InboundPipe {
    fn open(path: Utf8PathBuf) -> Result<Self, TransportError> {
        let file = open_inbound(&path)?;
        Ok(Self { path, file })
    }
}

impl Read for InboundPipe {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl ReopenRead for InboundPipe {
    fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn reopen(&mut self) -> Result<(), TransportError> {
        self.file = open_inbound(&self.path)?;
        Ok(())
    }
}

fn read_reopening(
    source: &mut dyn ReopenRead,
    chunk: &mut [u8],
    received: &mut Vec<u8>,
) -> Result<usize, TransportError> {
    let before = received.len();
    if let Err(error) = drain(source, chunk, received) {
        debug!(
            target: TRANSPORT_TARGET,
            %error,
            path = %source.path(),
            "inbound read failed, reopening"
        );
        source.reopen()?;
        drain(source, chunk, received).map_err(|error| TransportError::Read {
            path: source.path().to_path_buf(),
            source: error,
        })?;
    }
    Ok(received.len() - before)
}

fn drain(source: &mut dyn ReopenRead, chunk: &mut [u8], received: &mut Vec<u8>) -> io::Result<()> {
    loop {
        match source.read(chunk) {
            Ok(0) => return Ok(()),
            Ok(read) => received.extend_from_slice(&chunk[..read]),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
}

fn open_inbound(path: &Utf8Path) -> Result<File, TransportError> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path.as_std_path())
        .map_err(|source| TransportError::OpenInbound {
            path: path.to_path_buf(),
            source,
        })
}

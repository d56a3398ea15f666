//! Controller pipe devices.

use std::{fs, io, str};

use camino::{Utf8Path, Utf8PathBuf};
use fifoctl_config::{INBOUND_SUFFIX, PipeLayout};
use tracing::{debug, info, warn};

use crate::framing::LineFramer;
use crate::transport::{LineSink, PipeTransport, TransportError, WriteMode};

use super::command::ControllerCommand;
use super::controller::VirtualController;
use super::{INPUT_TARGET, InputError};

const ACK: &[u8] = b"0\n";
const NACK: &[u8] = b"-1\n";
const CONTROLLER_READ_CHUNK: usize = 32;

/// A virtual controller fed from its own pipe pair.
///
/// Acks are written without blocking. A controller that stops reading its
/// outbound pipe loses acks once the pipe is full; its commands still apply.
#[derive(Debug)]
pub struct ControllerPipe {
    name: String,
    transport: PipeTransport,
    framer: LineFramer,
    controller: VirtualController,
    received: Vec<u8>,
    last_write_error: Option<io::ErrorKind>,
}

impl ControllerPipe {
    /// Opens the controller's pipe pair.
    ///
    /// # Errors
    ///
    /// Returns the transport error if either pipe fails to open.
    pub fn open(layout: &PipeLayout) -> Result<Self, TransportError> {
        Ok(Self {
            name: layout.name().to_owned(),
            transport: PipeTransport::open(layout, CONTROLLER_READ_CHUNK, WriteMode::NonBlocking)?,
            framer: LineFramer::new(),
            controller: VirtualController::new(),
            received: Vec::new(),
            last_write_error: None,
        })
    }

    /// Device name, the pipe base name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current button and axis state.
    #[must_use]
    pub fn controller(&self) -> &VirtualController {
        &self.controller
    }

    /// Consumes every complete pending line and acknowledges each one.
    ///
    /// Returns the number of lines processed.
    pub fn update(&mut self) -> usize {
        self.received.clear();
        if let Err(error) = self.transport.read_available(&mut self.received) {
            debug!(target: INPUT_TARGET, device = %self.name, %error, "controller read failed");
        }
        self.framer.append(&self.received);

        let mut processed = 0;
        while let Some(line) = self.framer.next_line() {
            let reply = match parse_line(&line)
                .and_then(|command| command.apply(&mut self.controller))
            {
                Ok(()) => ACK,
                Err(error) => {
                    debug!(
                        target: INPUT_TARGET,
                        device = %self.name,
                        %error,
                        line = %line.escape_ascii(),
                        "controller command rejected"
                    );
                    NACK
                }
            };
            match self.transport.write_line(reply) {
                Ok(()) => self.last_write_error = None,
                Err(error) => {
                    let kind = error.kind();
                    if self.last_write_error != Some(kind) {
                        warn!(
                            target: INPUT_TARGET,
                            device = %self.name,
                            %error,
                            "controller ack failed"
                        );
                    }
                    self.last_write_error = Some(kind);
                }
            }
            processed += 1;
        }
        processed
    }
}

fn parse_line(line: &[u8]) -> Result<ControllerCommand, InputError> {
    str::from_utf8(line)
        .map_err(|_| InputError::Malformed {
            line: String::from_utf8_lossy(line).into_owned(),
        })
        .and_then(ControllerCommand::parse)
}

/// Lists controller pipe pairs in `dir`.
///
/// Every `<dev>_in` file whose name does not start with `exclude_prefix`
/// counts; its `<dev>_out` partner is only checked when opened.
///
/// # Errors
///
/// Returns an error when `dir` cannot be read.
pub fn discover_controller_pipes(
    dir: &Utf8Path,
    exclude_prefix: &str,
) -> Result<Vec<PipeLayout>, InputError> {
    let entries = fs::read_dir(dir.as_std_path()).map_err(|source| InputError::ScanDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut layouts: Vec<PipeLayout> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|kind| !kind.is_dir()))
        .filter_map(|entry| Utf8PathBuf::from_path_buf(entry.path()).ok())
        .filter(|path| {
            path.file_name().is_some_and(|name| {
                name.ends_with(INBOUND_SUFFIX) && !name.starts_with(exclude_prefix)
            })
        })
        .filter_map(|path| PipeLayout::from_inbound(&path))
        .collect();
    layouts.sort_by(|left, right| left.name().cmp(right.name()));
    Ok(layouts)
}

/// Opens every controller pipe pair in `dir`, skipping pairs that fail.
///
/// # Errors
///
/// Returns an error when `dir` cannot be read.
pub fn attach_controller_pipes(
    dir: &Utf8Path,
    exclude_prefix: &str,
) -> Result<Vec<ControllerPipe>, InputError> {
    let mut devices = Vec::new();
    for layout in discover_controller_pipes(dir, exclude_prefix)? {
        match ControllerPipe::open(&layout) {
            Ok(device) => {
                info!(
                    target: INPUT_TARGET,
                    device = %layout.name(),
                    pipes = %layout,
                    "controller attached"
                );
                devices.push(device);
            }
            Err(error) => {
                warn!(
                    target: INPUT_TARGET,
                    device = %layout.name(),
                    %error,
                    "controller pipes unavailable"
                );
            }
        }
    }
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use std::fs::{File, OpenOptions};
    use std::io::{BufRead, BufReader, Write};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use nix::sys::stat::Mode;
    use nix::unistd::mkfifo;
    use tempfile::TempDir;

    use super::*;
    use crate::input::controller::AxisRails;

    struct PipesDir {
        _temp: TempDir,
        dir: Utf8PathBuf,
    }

    impl PipesDir {
        fn new() -> Self {
            let temp = tempfile::tempdir().expect("temp dir");
            let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 path");
            Self { _temp: temp, dir }
        }

        fn fifo_pair(&self, name: &str) -> PipeLayout {
            let layout = PipeLayout::new(self.dir.clone(), name);
            mkfifo(layout.inbound_path().as_std_path(), Mode::S_IRWXU).expect("mkfifo in");
            mkfifo(layout.outbound_path().as_std_path(), Mode::S_IRWXU).expect("mkfifo out");
            layout
        }
    }

    fn send(layout: &PipeLayout, text: &[u8]) {
        OpenOptions::new()
            .write(true)
            .open(layout.inbound_path().as_std_path())
            .expect("open controller inbound")
            .write_all(text)
            .expect("write controller command");
    }

    fn acks(layout: &PipeLayout, count: usize) -> Vec<String> {
        let mut reader = BufReader::new(
            File::open(layout.outbound_path().as_std_path()).expect("open controller outbound"),
        );
        (0..count)
            .map(|_| {
                let mut line = String::new();
                reader.read_line(&mut line).expect("read ack");
                line
            })
            .collect()
    }

    #[test]
    fn discovers_pairs_except_control_pipes() {
        let pipes = PipesDir::new();
        pipes.fifo_pair("emu");
        pipes.fifo_pair("pad1");
        pipes.fifo_pair("pad0");
        fs::create_dir(pipes.dir.join("nested_in").as_std_path()).expect("dir");

        let names: Vec<String> = discover_controller_pipes(&pipes.dir, "emu")
            .expect("scan")
            .iter()
            .map(|layout| layout.name().to_owned())
            .collect();
        assert_eq!(names, ["pad0", "pad1"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let pipes = PipesDir::new();
        let missing = pipes.dir.join("absent");
        assert!(matches!(
            discover_controller_pipes(&missing, "emu"),
            Err(InputError::ScanDirectory { .. })
        ));
    }

    #[test]
    fn half_created_pairs_are_skipped() {
        let pipes = PipesDir::new();
        let layout = PipeLayout::new(pipes.dir.clone(), "pad0");
        mkfifo(layout.inbound_path().as_std_path(), Mode::S_IRWXU).expect("mkfifo in");
        let devices = attach_controller_pipes(&pipes.dir, "emu").expect("scan");
        assert!(devices.is_empty());
    }

    #[test]
    fn acknowledges_each_line() {
        let pipes = PipesDir::new();
        let layout = pipes.fifo_pair("pad0");
        let mut device = ControllerPipe::open(&layout).expect("open device");

        send(&layout, b"Press A\nSet MAIN 1 -1\nPress Turbo\nSet L");
        assert_eq!(device.update(), 3);
        assert_eq!(acks(&layout, 3), ["0\n", "0\n", "-1\n"]);

        assert_eq!(device.controller().button("A"), Some(true));
        assert_eq!(
            device.controller().axis("MAIN X"),
            Some(AxisRails {
                positive: 1.0,
                negative: 0.0
            })
        );

        send(&layout, b" 1\n");
        assert_eq!(device.update(), 1);
        assert_eq!(
            device.controller().axis("L"),
            Some(AxisRails {
                positive: 1.0,
                negative: 0.0
            })
        );
    }

    #[test]
    fn rejects_lines_that_are_not_utf8() {
        let pipes = PipesDir::new();
        let layout = pipes.fifo_pair("pad0");
        let mut device = ControllerPipe::open(&layout).expect("open device");

        send(&layout, b"Press \xff\n");
        assert_eq!(device.update(), 1);
        assert_eq!(acks(&layout, 1), ["-1\n"]);
    }

    #[test]
    fn unread_acks_never_stall_updates() {
        const ROUNDS: usize = 20;
        const LINES: usize = 4096;

        let pipes = PipesDir::new();
        let layout = pipes.fifo_pair("pad0");
        let mut device = ControllerPipe::open(&layout).expect("open device");
        let batch = b"Press A\n".repeat(LINES);

        let (done, finished) = mpsc::channel();
        thread::spawn(move || {
            let processed: usize = (0..ROUNDS)
                .map(|_| {
                    send(&layout, &batch);
                    device.update()
                })
                .sum();
            done.send(processed).expect("report processed lines");
        });

        let processed = finished
            .recv_timeout(Duration::from_secs(10))
            .expect("updates return while nobody reads the acks");
        assert_eq!(processed, ROUNDS * LINES);
    }
}

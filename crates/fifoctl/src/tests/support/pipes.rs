//! Real-FIFO harness around a running headless machine.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use fifoctl_config::PipeLayout;
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use tempfile::TempDir;

use crate::context::ExecutionContexts;
use crate::headless::{HeadlessMachine, MachineThreads};
use crate::worker::{ProtocolWorker, WorkerHandle, WorkerSettings};

use super::RecordingHealthReporter;

/// How long a test waits for a response it expects.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

const MACHINE_TICK: Duration = Duration::from_millis(1);
const READER_BACKOFF: Duration = Duration::from_millis(1);

/// Reads the outbound pipe on a background thread, one line per message.
///
/// The pipe is opened non-blocking so the reader can be closed at any time.
pub struct ResponseReader {
    stop: Arc<AtomicBool>,
    lines: Receiver<Vec<u8>>,
    handle: Option<JoinHandle<()>>,
}

impl ResponseReader {
    /// Connects to `path`.
    #[must_use]
    pub fn open(path: &Utf8Path) -> Self {
        let mut file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path.as_std_path())
            .expect("open outbound pipe for reading");
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let (sender, lines) = mpsc::channel();
        let handle = thread::spawn(move || {
            let mut pending = Vec::new();
            let mut chunk = [0_u8; 256];
            while !flag.load(Ordering::SeqCst) {
                match file.read(&mut chunk) {
                    Ok(0) => thread::sleep(READER_BACKOFF),
                    Ok(read) => pending.extend_from_slice(&chunk[..read]),
                    Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                        thread::sleep(READER_BACKOFF);
                    }
                    Err(error) => panic!("response reader failed: {error}"),
                }
                while let Some(newline) = pending.iter().position(|byte| *byte == b'\n') {
                    let mut line: Vec<u8> = pending.drain(..=newline).collect();
                    line.pop();
                    if sender.send(line).is_err() {
                        return;
                    }
                }
            }
        });
        Self {
            stop,
            lines,
            handle: Some(handle),
        }
    }

    /// Next response line without its newline.
    #[must_use]
    pub fn next(&self, timeout: Duration) -> Option<String> {
        self.next_bytes(timeout)
            .map(|line| String::from_utf8(line).expect("response line is UTF-8"))
    }

    /// Next response line as raw bytes, without its newline.
    #[must_use]
    pub fn next_bytes(&self, timeout: Duration) -> Option<Vec<u8>> {
        self.lines.recv_timeout(timeout).ok()
    }

    /// Disconnects from the pipe.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.join().expect("response reader panicked");
        }
    }
}

impl Drop for ResponseReader {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Control pipes in a temporary directory, served by a headless machine.
pub struct PipeHarness {
    _temp: TempDir,
    layout: PipeLayout,
    machine: HeadlessMachine,
    threads: Option<MachineThreads>,
    worker: Option<WorkerHandle>,
    writer: File,
    reader: Option<ResponseReader>,
    reporter: Arc<RecordingHealthReporter>,
}

impl PipeHarness {
    /// Creates the FIFOs and starts the machine loops and the worker.
    #[must_use]
    pub fn start() -> Self {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 path");
        let layout = PipeLayout::new(dir, "emu");
        mkfifo(layout.inbound_path().as_std_path(), Mode::S_IRWXU).expect("mkfifo in");
        mkfifo(layout.outbound_path().as_std_path(), Mode::S_IRWXU).expect("mkfifo out");

        let machine = HeadlessMachine::new();
        let contexts = ExecutionContexts::new();
        let reporter = Arc::new(RecordingHealthReporter::default());
        let threads =
            MachineThreads::start(&machine, &contexts, MACHINE_TICK).expect("start machine");
        let worker = ProtocolWorker::start(
            layout.clone(),
            contexts,
            WorkerSettings::default(),
            reporter.clone(),
        )
        .expect("start worker");
        assert!(worker.is_enabled(), "protocol worker should be enabled");

        let writer = OpenOptions::new()
            .write(true)
            .open(layout.inbound_path().as_std_path())
            .expect("open inbound pipe for writing");
        let reader = ResponseReader::open(&layout.outbound_path());

        Self {
            _temp: temp,
            layout,
            machine,
            threads: Some(threads),
            worker: Some(worker),
            writer,
            reader: Some(reader),
            reporter,
        }
    }

    /// Machine served by the worker.
    #[must_use]
    pub fn machine(&self) -> &HeadlessMachine {
        &self.machine
    }

    /// Health events recorded so far.
    #[must_use]
    pub fn reporter(&self) -> &RecordingHealthReporter {
        &self.reporter
    }

    /// Writes raw bytes to the inbound pipe.
    pub fn write(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).expect("write inbound pipe");
    }

    /// Writes one newline-terminated command.
    pub fn send(&mut self, line: &str) {
        self.write(format!("{line}\n").as_bytes());
    }

    /// Waits for the next response line.
    #[must_use]
    pub fn next_response(&self) -> Option<String> {
        self.reader().next(RESPONSE_TIMEOUT)
    }

    /// Waits for the next response line as raw bytes.
    #[must_use]
    pub fn next_response_bytes(&self) -> Option<Vec<u8>> {
        self.reader().next_bytes(RESPONSE_TIMEOUT)
    }

    /// Whether no response arrives within `window`.
    #[must_use]
    pub fn quiet_for(&self, window: Duration) -> bool {
        self.reader().next(window).is_none()
    }

    /// Closes the response reader and connects a fresh one.
    pub fn reconnect_reader(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.close();
        }
        self.reader = Some(ResponseReader::open(&self.layout.outbound_path()));
    }

    fn reader(&self) -> &ResponseReader {
        self.reader.as_ref().expect("response reader connected")
    }
}

impl Drop for PipeHarness {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.shutdown();
            let _ = worker.join();
        }
        if let Some(threads) = self.threads.take() {
            let _ = threads.join();
        }
        if let Some(reader) = self.reader.take() {
            reader.close();
        }
    }
}

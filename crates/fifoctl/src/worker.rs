//! Protocol worker thread.
//!
//! The worker owns the control pipe pair. Each iteration it drains the
//! inbound pipe, frames and dispatches complete lines, then publishes every
//! response whose turn has come. When an iteration finds nothing to do it
//! waits up to one poll interval for a job to complete.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use fifoctl_config::{Config, PipeLayout};
use thiserror::Error;
use tracing::{debug, warn};

use crate::context::ExecutionContexts;
use crate::dispatch::{Completion, Dispatcher, ResponsePublisher, ResponseSequencer};
use crate::framing::LineFramer;
use crate::health::HealthReporter;
use crate::transport::{PipeTransport, TransportError, WriteMode};

pub(crate) const WORKER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::worker");

const THREAD_NAME: &str = "fifoctl-protocol";

/// Errors raised while running the protocol worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker thread could not be spawned.
    #[error("failed to spawn protocol worker: {source}")]
    Spawn {
        /// Error from the thread builder.
        #[source]
        source: io::Error,
    },
    /// The worker thread panicked.
    #[error("protocol worker thread panicked")]
    ThreadPanic,
}

/// Tunables for one protocol worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Longest idle wait for a job completion.
    pub poll_interval: Duration,
    /// Minimum gap between dispatched commands, if throttled.
    pub min_dispatch_interval: Option<Duration>,
    /// Size of each inbound read.
    pub read_chunk_bytes: usize,
}

impl WorkerSettings {
    /// Takes every tunable from `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            min_dispatch_interval: config.min_dispatch_interval(),
            read_chunk_bytes: config.read_chunk_bytes(),
        }
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Reads, dispatches and answers commands for one control pipe pair.
#[derive(Debug)]
pub struct ProtocolWorker {
    layout: PipeLayout,
    transport: PipeTransport,
    framer: LineFramer,
    dispatcher: Dispatcher,
    completions: Receiver<Completion>,
    sequencer: ResponseSequencer,
    publisher: ResponsePublisher,
    poll_interval: Duration,
    received: Vec<u8>,
    last_read_error: Option<io::ErrorKind>,
    last_write_error: Option<io::ErrorKind>,
}

impl ProtocolWorker {
    /// Opens the pipe pair and wires a dispatcher onto `contexts`.
    ///
    /// # Errors
    ///
    /// Returns the transport error if either pipe fails to open.
    pub fn open(
        layout: PipeLayout,
        contexts: ExecutionContexts,
        settings: WorkerSettings,
    ) -> Result<Self, TransportError> {
        let transport =
            PipeTransport::open(&layout, settings.read_chunk_bytes, WriteMode::Blocking)?;
        let (sender, completions) = mpsc::channel();
        Ok(Self {
            layout,
            transport,
            framer: LineFramer::new(),
            dispatcher: Dispatcher::new(contexts, sender, settings.min_dispatch_interval),
            completions,
            sequencer: ResponseSequencer::new(),
            publisher: ResponsePublisher::new(),
            poll_interval: settings.poll_interval,
            received: Vec::with_capacity(settings.read_chunk_bytes),
            last_read_error: None,
            last_write_error: None,
        })
    }

    /// Opens the pipes and starts the worker thread.
    ///
    /// A pipe that fails to open does not fail the call: the protocol is
    /// reported disabled and a disabled handle is returned.
    ///
    /// # Errors
    ///
    /// Returns an error when the worker thread cannot be spawned.
    pub fn start(
        layout: PipeLayout,
        contexts: ExecutionContexts,
        settings: WorkerSettings,
        reporter: Arc<dyn HealthReporter>,
    ) -> Result<WorkerHandle, WorkerError> {
        match Self::open(layout.clone(), contexts, settings) {
            Ok(worker) => worker.spawn(reporter),
            Err(error) => {
                reporter.protocol_disabled(&layout, &error);
                Ok(WorkerHandle::disabled())
            }
        }
    }

    /// Moves the worker onto its own thread.
    ///
    /// The protocol is reported started before this returns, so commands
    /// written from then on are served.
    ///
    /// # Errors
    ///
    /// Returns an error when the thread cannot be spawned.
    pub fn spawn(self, reporter: Arc<dyn HealthReporter>) -> Result<WorkerHandle, WorkerError> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let layout = self.layout.clone();
        let thread_reporter = Arc::clone(&reporter);
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_owned())
            .spawn(move || self.run(&flag, thread_reporter.as_ref()))
            .map_err(|source| WorkerError::Spawn { source })?;
        reporter.protocol_started(&layout);
        Ok(WorkerHandle {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Runs one iteration and reports whether it did any work.
    pub fn poll_once(&mut self) -> bool {
        let dispatched = self.pump_inbound();
        let published = self.flush_completions();
        dispatched + published > 0
    }

    fn run(mut self, shutdown: &AtomicBool, reporter: &dyn HealthReporter) {
        while !shutdown.load(Ordering::SeqCst) {
            if !self.poll_once() {
                self.wait_for_completion();
            }
        }
        debug!(
            target: WORKER_TARGET,
            held = self.sequencer.held(),
            published = self.publisher.published(),
            "protocol worker stopping"
        );
        reporter.protocol_stopped(&self.layout);
    }

    fn pump_inbound(&mut self) -> usize {
        self.received.clear();
        match self.transport.read_available(&mut self.received) {
            Ok(_) => self.last_read_error = None,
            Err(error) => {
                let kind = error.kind();
                if self.last_read_error != Some(kind) {
                    warn!(target: WORKER_TARGET, %error, "inbound pipe read failed");
                }
                self.last_read_error = Some(kind);
            }
        }
        self.framer.append(&self.received);

        let mut dispatched = 0;
        while let Some(line) = self.framer.next_line() {
            self.dispatcher.dispatch_line(&line);
            dispatched += 1;
        }
        dispatched
    }

    fn flush_completions(&mut self) -> usize {
        let mut published = 0;
        while let Ok(completion) = self.completions.try_recv() {
            published += self.release(completion);
        }
        published
    }

    fn wait_for_completion(&mut self) {
        if let Ok(completion) = self.completions.recv_timeout(self.poll_interval) {
            self.release(completion);
        }
    }

    fn release(&mut self, completion: Completion) -> usize {
        let frames = self.sequencer.accept(completion);
        for frame in &frames {
            match self.publisher.publish(&mut self.transport, frame) {
                Ok(()) => self.last_write_error = None,
                Err(error) => {
                    let kind = error.kind();
                    if self.last_write_error != Some(kind) {
                        warn!(target: WORKER_TARGET, %error, "response write failed");
                    }
                    self.last_write_error = Some(kind);
                }
            }
        }
        frames.len()
    }
}

/// Handle to the protocol worker thread.
///
/// A disabled handle has no thread; shutting it down and joining it are
/// no-ops.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    fn disabled() -> Self {
        Self {
            shutdown: Arc::new(AtomicBool::new(true)),
            handle: None,
        }
    }

    /// Whether a worker thread is running behind this handle.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.handle.is_some()
    }

    /// Asks the worker to stop after its current iteration.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Waits for the worker thread to exit.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::ThreadPanic`] if the thread panicked.
    pub fn join(mut self) -> Result<(), WorkerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WorkerError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

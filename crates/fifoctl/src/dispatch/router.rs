//! Routing of framed lines onto execution contexts.
//!
//! The dispatcher runs on the protocol worker. It never executes a handler
//! itself: a valid command becomes a job on the context its table row names,
//! and the job reports back through the completion channel. Rejected lines
//! complete immediately with `-1`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Sender;
use std::time::Duration;

use tracing::{debug, warn};

use crate::command::{Command, Route};
use crate::context::ExecutionContexts;
use crate::emulator::{CpuControl, HostControl};

use super::response::{Completion, ResponseFrame, ResultToken};
use super::throttle::DispatchThrottle;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Turns framed lines into queued jobs.
#[derive(Debug)]
pub struct Dispatcher {
    contexts: ExecutionContexts,
    completions: Sender<Completion>,
    throttle: DispatchThrottle,
    next_sequence: u64,
}

impl Dispatcher {
    /// Creates a dispatcher queueing onto `contexts` and reporting finished
    /// commands on `completions`.
    #[must_use]
    pub fn new(
        contexts: ExecutionContexts,
        completions: Sender<Completion>,
        min_interval: Option<Duration>,
    ) -> Self {
        Self {
            contexts,
            completions,
            throttle: DispatchThrottle::new(min_interval),
            next_sequence: 0,
        }
    }

    /// Dispatches one framed line and returns its receipt sequence number.
    ///
    /// A rejected line is echoed byte for byte in its `-1` response.
    pub fn dispatch_line(&mut self, line: impl AsRef<[u8]>) -> u64 {
        let line = line.as_ref();
        self.throttle.wait();
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        match Command::parse_bytes(line) {
            Ok(command) => self.enqueue(sequence, command),
            Err(error) => {
                debug!(
                    target: DISPATCH_TARGET,
                    %error,
                    line = %line.escape_ascii(),
                    sequence,
                    "rejected command"
                );
                complete(
                    &self.completions,
                    sequence,
                    ResponseFrame::new(line, ResultToken::Failure),
                );
            }
        }
        sequence
    }

    /// Sequence number the next line will receive.
    #[must_use]
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    fn enqueue(&self, sequence: u64, command: Command) {
        let verb = command.verb();
        let (text, route, operands) = command.into_parts();
        let completions = self.completions.clone();
        debug!(
            target: DISPATCH_TARGET,
            verb,
            sequence,
            context = %route.context(),
            "queueing command"
        );

        match route {
            Route::Host(handler) => {
                self.contexts
                    .host()
                    .push(Box::new(move |host: &mut dyn HostControl| {
                        let result = run_guarded(verb, || handler(&operands, host));
                        complete(&completions, sequence, ResponseFrame::new(text, result));
                    }));
            }
            Route::Cpu(handler) => {
                self.contexts
                    .cpu()
                    .push(Box::new(move |cpu: &mut dyn CpuControl| {
                        let result = run_guarded(verb, || handler(&operands, cpu));
                        complete(&completions, sequence, ResponseFrame::new(text, result));
                    }));
            }
        }
    }
}

fn run_guarded(verb: &'static str, handler: impl FnOnce() -> ResultToken) -> ResultToken {
    panic::catch_unwind(AssertUnwindSafe(handler)).unwrap_or_else(|payload| {
        warn!(
            target: DISPATCH_TARGET,
            verb,
            panic = panic_message(payload.as_ref()),
            "handler panicked"
        );
        ResultToken::Failure
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn complete(completions: &Sender<Completion>, sequence: u64, frame: ResponseFrame) {
    if completions.send(Completion { sequence, frame }).is_err() {
        debug!(
            target: DISPATCH_TARGET,
            sequence, "protocol worker gone, dropping response"
        );
    }
}

//! Headless reference machine.
//!
//! A small in-memory stand-in for an emulator core. It implements both
//! control traits and runs the two loops the protocol expects: a host loop
//! draining the host queue once per tick, and a CPU loop that takes the
//! machine lock, drains the CPU queue and executes a frame.

mod ports;
mod state;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::context::ExecutionContexts;
use crate::input::ControllerPipe;

pub use self::ports::{CpuPort, HostPort};
pub use self::state::MachineState;

const HEADLESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::headless");

/// Errors raised by the machine threads.
#[derive(Debug, Error)]
pub enum HeadlessError {
    /// A machine loop thread could not be spawned.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        /// Thread name.
        name: &'static str,
        /// Error from the thread builder.
        #[source]
        source: io::Error,
    },
    /// A machine loop thread panicked.
    #[error("{name} thread panicked")]
    ThreadPanic {
        /// Thread name.
        name: &'static str,
    },
}

/// Shared handle to the machine state.
#[derive(Debug, Clone, Default)]
pub struct HeadlessMachine {
    state: Arc<Mutex<MachineState>>,
}

impl HeadlessMachine {
    /// Fresh machine without controllers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a machine with controller pipes already attached.
    #[must_use]
    pub fn with_controllers(controllers: Vec<ControllerPipe>) -> Self {
        let machine = Self::new();
        machine.lock().attach_controllers(controllers);
        machine
    }

    /// Host-loop view of the machine.
    #[must_use]
    pub fn host_port(&self) -> HostPort {
        HostPort::new(Arc::clone(&self.state))
    }

    /// Locks the machine state. The CPU loop holds this lock while it runs
    /// CPU jobs.
    pub fn lock(&self) -> MutexGuard<'_, MachineState> {
        ports::lock(&self.state)
    }

    /// Runs one host-loop iteration.
    pub fn host_tick(&self, contexts: &ExecutionContexts) -> usize {
        let mut host = self.host_port();
        contexts.host().drain(&mut host)
    }

    /// Runs one CPU-loop iteration under the machine lock.
    pub fn cpu_tick(&self, contexts: &ExecutionContexts) -> usize {
        let mut state = self.lock();
        let drained = contexts.cpu().drain(&mut CpuPort::new(&mut state));
        state.run_frame();
        drained
    }
}

/// The host and CPU loop threads.
///
/// Loops stop in start order, so a host job waiting on a frame step can
/// still finish while the CPU loop runs.
#[derive(Debug)]
pub struct MachineThreads {
    loops: Vec<LoopThread>,
}

#[derive(Debug)]
struct LoopThread {
    name: &'static str,
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl MachineThreads {
    /// Starts both loops, each sleeping `tick` between iterations.
    ///
    /// # Errors
    ///
    /// Returns an error when a thread cannot be spawned. Any loop already
    /// started is stopped.
    pub fn start(
        machine: &HeadlessMachine,
        contexts: &ExecutionContexts,
        tick: Duration,
    ) -> Result<Self, HeadlessError> {
        let mut threads = Self {
            loops: Vec::with_capacity(2),
        };
        threads.spawn("fifoctl-host", machine, contexts, tick, HeadlessMachine::host_tick)?;
        threads.spawn("fifoctl-cpu", machine, contexts, tick, HeadlessMachine::cpu_tick)?;
        Ok(threads)
    }

    fn spawn(
        &mut self,
        name: &'static str,
        machine: &HeadlessMachine,
        contexts: &ExecutionContexts,
        tick: Duration,
        step: fn(&HeadlessMachine, &ExecutionContexts) -> usize,
    ) -> Result<(), HeadlessError> {
        let machine = machine.clone();
        let contexts = contexts.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                debug!(target: HEADLESS_TARGET, thread = name, "loop started");
                while !flag.load(Ordering::SeqCst) {
                    step(&machine, &contexts);
                    thread::sleep(tick);
                }
                debug!(target: HEADLESS_TARGET, thread = name, "loop stopped");
            })
            .map_err(|source| HeadlessError::Spawn { name, source })?;
        self.loops.push(LoopThread {
            name,
            shutdown,
            handle,
        });
        Ok(())
    }

    /// Stops and joins the loops one after another.
    ///
    /// # Errors
    ///
    /// Returns the first loop that panicked.
    pub fn join(mut self) -> Result<(), HeadlessError> {
        let mut result = Ok(());
        for LoopThread {
            name,
            shutdown,
            handle,
        } in self.loops.drain(..)
        {
            shutdown.store(true, Ordering::SeqCst);
            if handle.join().is_err() && result.is_ok() {
                result = Err(HeadlessError::ThreadPanic { name });
            }
        }
        result
    }
}

impl Drop for MachineThreads {
    fn drop(&mut self) {
        for thread in &self.loops {
            thread.shutdown.store(true, Ordering::SeqCst);
        }
    }
}

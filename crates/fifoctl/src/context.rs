//! Execution contexts.
//!
//! Handlers never run on the protocol worker. Each one is boxed into a job and
//! queued on the context its table row names: the host queue is drained once
//! per host control-loop iteration, the CPU queue by the CPU thread while it
//! holds the CPU guard.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::emulator::{CpuControl, HostControl};

/// Job queued for the host control loop.
pub type HostJob = Box<dyn FnOnce(&mut dyn HostControl) + Send>;

/// Job queued for the CPU thread.
pub type CpuJob = Box<dyn FnOnce(&mut dyn CpuControl) + Send>;

/// Queue drained by the host control loop.
pub type HostContext = JobQueue<HostJob>;

/// Queue drained by the CPU thread.
pub type CpuContext = JobQueue<CpuJob>;

/// Names an execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    /// The host control loop.
    Host,
    /// The CPU thread.
    Cpu,
}

impl fmt::Display for ContextKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Host => "host",
            Self::Cpu => "cpu",
        })
    }
}

/// Mutex-protected FIFO of pending jobs.
pub struct JobQueue<J> {
    jobs: Mutex<VecDeque<J>>,
}

impl<J> Default for JobQueue<J> {
    fn default() -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
        }
    }
}

impl<J> fmt::Debug for JobQueue<J> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("JobQueue")
            .field("pending", &self.len())
            .finish()
    }
}

impl<J> JobQueue<J> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job behind everything already queued.
    pub fn push(&self, job: J) {
        self.lock().push_back(job);
    }

    /// Number of jobs waiting for the next drain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no job is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_pending(&self) -> VecDeque<J> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<J>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl JobQueue<HostJob> {
    /// Runs every job queued before the call, in order, outside the lock.
    ///
    /// Jobs pushed while the drain runs wait for the next drain.
    pub fn drain(&self, host: &mut dyn HostControl) -> usize {
        let jobs = self.take_pending();
        let count = jobs.len();
        for job in jobs {
            job(&mut *host);
        }
        count
    }
}

impl JobQueue<CpuJob> {
    /// Runs every job queued before the call, in order, outside the lock.
    pub fn drain(&self, cpu: &mut dyn CpuControl) -> usize {
        let jobs = self.take_pending();
        let count = jobs.len();
        for job in jobs {
            job(&mut *cpu);
        }
        count
    }
}

/// The pair of queues shared by the dispatcher and the threads that pump them.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContexts {
    host: Arc<HostContext>,
    cpu: Arc<CpuContext>,
}

impl ExecutionContexts {
    /// Creates both queues empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue drained by the host control loop.
    #[must_use]
    pub fn host(&self) -> &Arc<HostContext> {
        &self.host
    }

    /// Queue drained by the CPU thread.
    #[must_use]
    pub fn cpu(&self) -> &Arc<CpuContext> {
        &self.cpu
    }

    /// Jobs waiting on `kind`.
    #[must_use]
    pub fn pending(&self, kind: ContextKind) -> usize {
        match kind {
            ContextKind::Host => self.host.len(),
            ContextKind::Cpu => self.cpu.len(),
        }
    }
}

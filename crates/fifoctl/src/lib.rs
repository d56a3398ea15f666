//! Named-pipe command protocol for driving an emulation session.
//!
//! An external process writes newline-terminated commands to `<name>_in` and
//! reads one `<request> <result>` line per command from `<name>_out`. The
//! protocol worker reads and frames the inbound bytes, validates each line
//! against the versioned command table in [`command`], and queues the
//! handler on one of two [`context`]s: the host control loop, or the CPU
//! thread for register access. Responses are published strictly in receipt
//! order whichever context finished first.
//!
//! The emulator itself is reached only through the [`emulator::HostControl`]
//! and [`emulator::CpuControl`] traits. The [`headless`] module provides an
//! in-memory implementation that the `fifoctl-headless` binary runs, together
//! with the bootstrap, telemetry and signal handling around it.
//!
//! ## Wire format
//!
//! ```text
//! > WriteMemory eff 80003100 ab
//! < WriteMemory eff 80003100 ab 0
//! > ReadCPUFReg 1 0
//! < ReadCPUFReg 1 0 3ff0000000000000
//! > LoadSlot 0
//! < LoadSlot 0 -1
//! ```
//!
//! A malformed line and a handler that fails both answer `-1`.

mod bootstrap;
pub mod command;
pub mod context;
pub mod dispatch;
pub mod emulator;
pub mod framing;
pub mod headless;
mod health;
pub mod input;
mod process;
mod telemetry;
pub mod transport;
mod worker;

pub use bootstrap::{
    BootstrapError, ConfigLoader, ProtocolRuntime, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_headless,
    run_headless_with,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use worker::{ProtocolWorker, WorkerError, WorkerHandle, WorkerSettings};

#[cfg(test)]
mod tests;

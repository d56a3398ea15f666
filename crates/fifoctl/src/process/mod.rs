//! Process lifecycle for the headless binary.

mod errors;
mod launch;
mod shutdown;

pub use errors::LaunchError;
pub use launch::{run_headless, run_headless_with};
pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

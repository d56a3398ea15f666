//! Error surface for launching and supervising the headless process.

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::headless::HeadlessError;
use crate::worker::WorkerError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the headless process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrap failed.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The machine loops failed to start or stop cleanly.
    #[error(transparent)]
    Machine(#[from] HeadlessError),
    /// The protocol worker failed to start or stop cleanly.
    #[error(transparent)]
    Worker(#[from] WorkerError),
    /// Waiting for a shutdown signal failed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}

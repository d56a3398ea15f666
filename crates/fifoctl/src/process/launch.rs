//! Launch sequencing for the headless machine.

use std::sync::Arc;

use tracing::{info, warn};

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::context::ExecutionContexts;
use crate::headless::{HeadlessMachine, MachineThreads};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::input::{ControllerPipe, attach_controller_pipes};
use fifoctl_config::Config;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Runs the headless machine with the production collaborators.
///
/// # Errors
///
/// Returns an error if bootstrap, thread startup or signal handling fails.
pub fn run_headless() -> Result<(), LaunchError> {
    run_headless_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
        &SystemShutdownSignal,
    )
}

/// Runs the headless machine with injected collaborators.
///
/// # Errors
///
/// Returns an error if bootstrap, thread startup or signal handling fails.
pub fn run_headless_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    let runtime = bootstrap_with(loader, reporter)?;
    let config = runtime.config();

    let machine = HeadlessMachine::with_controllers(controllers(config));
    let contexts = ExecutionContexts::new();
    let threads = MachineThreads::start(&machine, &contexts, config.poll_interval())?;
    let worker = runtime.start_worker(contexts)?;
    info!(
        target: PROCESS_TARGET,
        protocol_enabled = worker.is_enabled(),
        "headless machine running"
    );

    shutdown.wait()?;
    worker.shutdown();
    worker.join()?;
    threads.join()?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}

fn controllers(config: &Config) -> Vec<ControllerPipe> {
    if !config.controller_pipes {
        return Vec::new();
    }
    attach_controller_pipes(&config.pipes_dir, &config.control_pipe).unwrap_or_else(|error| {
        warn!(target: PROCESS_TARGET, %error, "controller pipes unavailable");
        Vec::new()
    })
}

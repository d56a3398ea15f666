//! Structured health reporting for lifecycle events.

use std::sync::Arc;

use fifoctl_config::{Config, PipeLayout};

use crate::bootstrap::BootstrapError;
use crate::transport::TransportError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the worker thread owns the control pipes.
    fn protocol_started(&self, layout: &PipeLayout);

    /// Invoked when the control pipes could not be opened.
    fn protocol_disabled(&self, layout: &PipeLayout, error: &TransportError);

    /// Invoked when the worker thread exits.
    fn protocol_stopped(&self, layout: &PipeLayout);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn protocol_started(&self, layout: &PipeLayout) {
        (**self).protocol_started(layout);
    }

    fn protocol_disabled(&self, layout: &PipeLayout, error: &TransportError) {
        (**self).protocol_disabled(layout, error);
    }

    fn protocol_stopped(&self, layout: &PipeLayout) {
        (**self).protocol_stopped(layout);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            pipes = %config.control_layout(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "bootstrap failed"
        );
    }

    fn protocol_started(&self, layout: &PipeLayout) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "protocol_started",
            pipes = %layout,
            "pipe protocol listening"
        );
    }

    fn protocol_disabled(&self, layout: &PipeLayout, error: &TransportError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "protocol_disabled",
            pipes = %layout,
            error = %error,
            "pipe protocol disabled"
        );
    }

    fn protocol_stopped(&self, layout: &PipeLayout) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "protocol_stopped",
            pipes = %layout,
            "pipe protocol stopped"
        );
    }
}

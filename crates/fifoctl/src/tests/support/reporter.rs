//! Test double for [`HealthReporter`] that records lifecycle events.

use std::sync::Mutex;

use fifoctl_config::{Config, PipeLayout};

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;
use crate::transport::TransportError;

/// Structured health events tracked during tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ProtocolStarted,
    ProtocolDisabled,
    ProtocolStopped,
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Whether `event` has been recorded.
    #[must_use]
    pub fn saw(&self, event: &HealthEvent) -> bool {
        self.events().contains(event)
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn protocol_started(&self, _layout: &PipeLayout) {
        self.record(HealthEvent::ProtocolStarted);
    }

    fn protocol_disabled(&self, _layout: &PipeLayout, _error: &TransportError) {
        self.record(HealthEvent::ProtocolDisabled);
    }

    fn protocol_stopped(&self, _layout: &PipeLayout) {
        self.record(HealthEvent::ProtocolStopped);
    }
}

//! Shared doubles and harnesses for the test suites.

mod config_loader;
mod pipes;
mod reporter;
mod shutdown;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use pipes::{PipeHarness, RESPONSE_TIMEOUT, ResponseReader};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use shutdown::ManualShutdownSignal;

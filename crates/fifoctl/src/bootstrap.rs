//! Bootstrap orchestration.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use fifoctl_config::{Config, OrthoConfig, PipeLayout, PipePreparationError};
use nix::errno::Errno;
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use ortho_config::OrthoError;
use thiserror::Error;

use crate::context::ExecutionContexts;
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::worker::{ProtocolWorker, WorkerError, WorkerHandle, WorkerSettings};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that hands out a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Loader that always hands out `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying error.
        #[source]
        source: TelemetryError,
    },
    /// The pipes directory could not be prepared.
    #[error("failed to prepare pipes directory: {source}")]
    Pipes {
        /// Underlying error.
        #[source]
        source: PipePreparationError,
    },
    /// A missing FIFO could not be created.
    #[error("failed to create fifo '{path}': {source}")]
    CreateFifo {
        /// FIFO that could not be created.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: Errno,
    },
}

/// Result of a successful bootstrap.
pub struct ProtocolRuntime {
    config: Config,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl ProtocolRuntime {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Reporter shared with the worker thread.
    #[must_use]
    pub fn reporter(&self) -> Arc<dyn HealthReporter> {
        Arc::clone(&self.reporter)
    }

    /// Starts the protocol worker for the control pipes.
    ///
    /// # Errors
    ///
    /// Returns an error when the worker thread cannot be spawned. Pipes that
    /// fail to open yield a disabled handle instead.
    pub fn start_worker(&self, contexts: ExecutionContexts) -> Result<WorkerHandle, WorkerError> {
        ProtocolWorker::start(
            self.config.control_layout(),
            contexts,
            WorkerSettings::from_config(&self.config),
            self.reporter(),
        )
    }
}

/// Bootstraps the protocol using the supplied collaborators.
///
/// # Errors
///
/// Returns the first failing step. Every failure is also reported through
/// `reporter`.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<ProtocolRuntime, BootstrapError> {
    reporter.bootstrap_starting();

    let result = prepare(loader);
    match result {
        Ok((config, telemetry)) => {
            reporter.bootstrap_succeeded(&config);
            Ok(ProtocolRuntime {
                config,
                telemetry,
                reporter,
            })
        }
        Err(error) => {
            reporter.bootstrap_failed(&error);
            Err(error)
        }
    }
}

fn prepare(loader: &dyn ConfigLoader) -> Result<(Config, TelemetryHandle), BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;

    let layout = config.control_layout();
    layout
        .prepare_filesystem()
        .map_err(|source| BootstrapError::Pipes { source })?;
    if config.create_fifos {
        create_fifos(&layout)?;
    }
    Ok((config, telemetry))
}

fn create_fifos(layout: &PipeLayout) -> Result<(), BootstrapError> {
    for path in [layout.inbound_path(), layout.outbound_path()] {
        create_fifo(&path)?;
    }
    Ok(())
}

fn create_fifo(path: &Utf8Path) -> Result<(), BootstrapError> {
    match mkfifo(path.as_std_path(), Mode::S_IRUSR | Mode::S_IWUSR) {
        Ok(()) | Err(Errno::EEXIST) => Ok(()),
        Err(source) => Err(BootstrapError::CreateFifo {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::FileTypeExt;

    use super::*;
    use crate::tests::support::{HealthEvent, RecordingHealthReporter, TestConfigLoader};

    #[test]
    fn creates_missing_fifos_when_asked() {
        let loader = TestConfigLoader::new().creating_fifos();
        let reporter = Arc::new(RecordingHealthReporter::default());
        let runtime = bootstrap_with(&loader, reporter.clone()).expect("bootstrap");

        let layout = runtime.config().control_layout();
        for path in [layout.inbound_path(), layout.outbound_path()] {
            let metadata = std::fs::metadata(path.as_std_path()).expect("fifo exists");
            assert!(metadata.file_type().is_fifo(), "{path} is not a fifo");
        }
        assert_eq!(
            reporter.events(),
            [HealthEvent::BootstrapStarting, HealthEvent::BootstrapSucceeded]
        );
    }

    #[test]
    fn existing_fifos_are_left_alone() {
        let loader = TestConfigLoader::new().creating_fifos();
        let reporter = Arc::new(RecordingHealthReporter::default());
        bootstrap_with(&loader, reporter.clone()).expect("first bootstrap");
        bootstrap_with(&loader, reporter).expect("second bootstrap");
    }

    #[test]
    fn static_loader_returns_its_config() {
        let config = Config {
            control_pipe: "dolphin".to_owned(),
            ..Config::default()
        };
        let loaded = StaticConfigLoader::new(config.clone())
            .load()
            .expect("static load");
        assert_eq!(loaded, config);
    }
}

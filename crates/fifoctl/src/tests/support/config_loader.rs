//! Configuration loaders for success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use camino::Utf8PathBuf;
use fifoctl_config::{Config, OrthoConfig, PipeLayout};
use ortho_config::OrthoError;
use tempfile::TempDir;

use crate::bootstrap::ConfigLoader;

/// Loader that points the pipes directory at a private temporary directory.
#[derive(Clone)]
pub struct TestConfigLoader {
    dir: Arc<TempDir>,
    create_fifos: bool,
    controller_pipes: bool,
}

impl TestConfigLoader {
    /// Loader over a fresh temporary directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: Arc::new(TempDir::new().expect("failed to create temporary pipes directory")),
            create_fifos: false,
            controller_pipes: false,
        }
    }

    /// Asks bootstrap to create the control FIFOs.
    #[must_use]
    pub fn creating_fifos(mut self) -> Self {
        self.create_fifos = true;
        self
    }

    /// Enables controller pipe discovery.
    #[must_use]
    pub fn with_controller_pipes(mut self) -> Self {
        self.controller_pipes = true;
        self
    }

    /// Pipes directory handed out in every loaded config.
    #[must_use]
    pub fn pipes_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().join("pipes"))
            .expect("temporary pipes path was not valid UTF-8")
    }

    /// Control pipe layout handed out in every loaded config.
    #[must_use]
    pub fn layout(&self) -> PipeLayout {
        self.config().control_layout()
    }

    fn config(&self) -> Config {
        Config {
            pipes_dir: self.pipes_dir(),
            create_fifos: self.create_fifos,
            controller_pipes: self.controller_pipes,
            ..Config::default()
        }
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config())
    }
}

/// Loader that intentionally fails by passing an invalid CLI value.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("fifoctl-headless"),
            OsString::from("--poll-interval-ms"),
            OsString::from("often"),
        ];
        Config::load_from_iter(args)
    }
}

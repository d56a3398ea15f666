//! Shared configuration for the fifoctl pipe protocol.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then a
//! TOML file (`--config-path` or `FIFOCTL_CONFIG_PATH`), then `FIFOCTL_*`
//! environment variables, then command-line flags. The resulting [`Config`]
//! tells the protocol worker where the control pipes live, how eagerly to
//! poll them and how to configure telemetry.
//!
//! Loading goes through the [`OrthoConfig`] trait (`Config::load()` and
//! `Config::load_from_iter(args)`), which reports failures as
//! `Arc<ortho_config::OrthoError>`.

mod defaults;
mod logging;
mod pipes;

use std::time::Duration;

use camino::Utf8PathBuf;
pub use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_CONTROL_PIPE, DEFAULT_LOG_FILTER, DEFAULT_POLL_INTERVAL_MS, DEFAULT_READ_CHUNK_BYTES,
    default_control_pipe, default_log_filter, default_log_filter_string, default_log_format,
    default_pipes_dir,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use pipes::{INBOUND_SUFFIX, OUTBOUND_SUFFIX, PipeLayout, PipePreparationError};

/// Resolved configuration shared by the protocol library and the headless
/// binary.
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "FIFOCTL")]
pub struct Config {
    /// Directory holding the control and controller pipes.
    #[serde(default = "default_pipes_dir")]
    #[ortho_config(default = default_pipes_dir())]
    pub pipes_dir: Utf8PathBuf,
    /// Base name of the control pipe pair (`<name>_in`, `<name>_out`).
    #[serde(default = "default_control_pipe")]
    #[ortho_config(default = default_control_pipe())]
    pub control_pipe: String,
    /// Create missing FIFOs during bootstrap instead of disabling the protocol.
    #[serde(default)]
    #[ortho_config(default = false)]
    pub create_fifos: bool,
    /// Minimum delay between two dispatched commands, in milliseconds. Zero
    /// disables rate limiting.
    #[serde(default)]
    #[ortho_config(default = 0)]
    pub min_dispatch_interval_ms: u64,
    /// Sleep between idle iterations of the protocol loop, in milliseconds.
    #[serde(default = "defaults::default_poll_interval_ms")]
    #[ortho_config(default = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,
    /// Size of the scratch buffer used for each inbound read.
    #[serde(default = "defaults::default_read_chunk_bytes")]
    #[ortho_config(default = DEFAULT_READ_CHUNK_BYTES)]
    pub read_chunk_bytes: usize,
    /// Attach every other `*_in`/`*_out` pair in the pipes directory as a
    /// virtual controller.
    #[serde(default = "defaults::default_controller_pipes")]
    #[ortho_config(default = true)]
    pub controller_pipes: bool,
    /// Tracing filter expression.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Tracing output format.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipes_dir: default_pipes_dir(),
            control_pipe: default_control_pipe(),
            create_fifos: false,
            min_dispatch_interval_ms: 0,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            read_chunk_bytes: DEFAULT_READ_CHUNK_BYTES,
            controller_pipes: true,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Layout of the control pipe pair.
    #[must_use]
    pub fn control_layout(&self) -> PipeLayout {
        PipeLayout::new(self.pipes_dir.clone(), self.control_pipe.clone())
    }

    /// Minimum interval between dispatched commands, if rate limiting is on.
    #[must_use]
    pub fn min_dispatch_interval(&self) -> Option<Duration> {
        (self.min_dispatch_interval_ms > 0)
            .then(|| Duration::from_millis(self.min_dispatch_interval_ms))
    }

    /// Idle sleep for the protocol loop.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Size of a single inbound read, never zero.
    #[must_use]
    pub fn read_chunk_bytes(&self) -> usize {
        self.read_chunk_bytes.max(1)
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Tracing output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

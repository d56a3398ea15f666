use camino::Utf8PathBuf;
use std::env;

#[cfg(unix)]
use libc::geteuid;

#[cfg(unix)]
use dirs::runtime_dir;

/// Base name of the control pipe pair.
pub const DEFAULT_CONTROL_PIPE: &str = "emu";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Idle sleep of the protocol loop in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1;

/// Bytes requested by each inbound read.
pub const DEFAULT_READ_CHUNK_BYTES: usize = 128;

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Owned control pipe name.
pub fn default_control_pipe() -> String {
    DEFAULT_CONTROL_PIPE.to_string()
}

pub(crate) fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

pub(crate) fn default_read_chunk_bytes() -> usize {
    DEFAULT_READ_CHUNK_BYTES
}

pub(crate) fn default_controller_pipes() -> bool {
    true
}

/// Computes the default directory holding the pipes.
pub fn default_pipes_dir() -> Utf8PathBuf {
    default_pipes_dir_inner()
}

#[cfg(unix)]
fn default_pipes_dir_inner() -> Utf8PathBuf {
    let (mut base, apply_namespace) = match runtime_base_directory() {
        Some(dir) => (dir, false),
        None => (fallback_base_directory(), true),
    };

    base.push("fifoctl");
    if apply_namespace {
        base.push(user_namespace());
    }
    base.join("pipes")
}

#[cfg(unix)]
fn runtime_base_directory() -> Option<Utf8PathBuf> {
    runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn default_pipes_dir_inner() -> Utf8PathBuf {
    let mut base = fallback_base_directory();
    base.push("fifoctl");
    base.join("pipes")
}

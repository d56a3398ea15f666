//! Layering tests for configuration sources.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use fifoctl_config::{Config, LogFormat, OrthoConfig, default_pipes_dir};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct EnvOverride {
    key: &'static str,
    previous: Option<OsString>,
}

impl EnvOverride {
    fn set_var(key: &'static str, value: &OsStr) -> Self {
        let previous = std::env::var_os(key);
        // Environment mutation is `unsafe` under edition 2024; every override
        // is restored in `Drop` while the caller holds `ENV_MUTEX`.
        unsafe { std::env::set_var(key, value) };
        Self { key, previous }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(self.key, value) },
            None => unsafe { std::env::remove_var(self.key) },
        }
    }
}

struct Harness {
    temp_dir: TempDir,
    args: Vec<OsString>,
    _guard: MutexGuard<'static, ()>,
}

impl Harness {
    fn write_config(&mut self, contents: &str) {
        let path = self.temp_dir.path().join("fifoctl.toml");
        fs::write(&path, contents).expect("write configuration");
        self.args.push(OsString::from("--config-path"));
        self.args.push(path.into_os_string());
    }

    fn push_arg(&mut self, arg: &str) {
        self.args.push(OsString::from(arg));
    }

    fn load(&self) -> Config {
        Config::load_from_iter(self.args.clone()).expect("configuration should load")
    }
}

#[fixture]
fn harness() -> Harness {
    let guard = ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Harness {
        temp_dir: TempDir::new().expect("create temp dir"),
        args: vec![OsString::from("fifoctl-headless")],
        _guard: guard,
    }
}

#[rstest]
fn defaults_apply_without_sources(harness: Harness) {
    let config = harness.load();
    assert_eq!(config.pipes_dir, default_pipes_dir());
    assert_eq!(config.control_pipe, "emu");
    assert_eq!(config.min_dispatch_interval_ms, 0);
    assert!(config.controller_pipes);
    assert_eq!(config.log_format, LogFormat::Json);
}

#[rstest]
fn file_overrides_defaults(mut harness: Harness) {
    harness.write_config(
        "pipes_dir = \"/srv/pipes\"\ncontrol_pipe = \"dolphin\"\nmin_dispatch_interval_ms = 3\n",
    );
    let config = harness.load();
    assert_eq!(config.pipes_dir, "/srv/pipes");
    assert_eq!(config.control_pipe, "dolphin");
    assert_eq!(config.min_dispatch_interval_ms, 3);
}

#[rstest]
fn environment_overrides_file(mut harness: Harness) {
    harness.write_config("control_pipe = \"from-file\"\n");
    let _env = EnvOverride::set_var("FIFOCTL_CONTROL_PIPE", OsStr::new("from-env"));
    let config = harness.load();
    assert_eq!(config.control_pipe, "from-env");
}

#[rstest]
fn cli_overrides_environment(mut harness: Harness) {
    let _env = EnvOverride::set_var("FIFOCTL_CONTROL_PIPE", OsStr::new("from-env"));
    harness.push_arg("--control-pipe");
    harness.push_arg("from-cli");
    let config = harness.load();
    assert_eq!(config.control_pipe, "from-cli");
}

#[rstest]
fn malformed_file_fails_to_load(mut harness: Harness) {
    harness.write_config("poll_interval_ms = \"often\"\n");
    let result = Config::load_from_iter(harness.args.clone());
    assert!(result.is_err(), "malformed configuration must not load");
}

//! Headless machine entry point serving the control pipes.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match fifoctl::run_headless() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let mut stderr = io::stderr().lock();
            let _ = writeln!(stderr, "fifoctl-headless: {error}");
            ExitCode::FAILURE
        }
    }
}

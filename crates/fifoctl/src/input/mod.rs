//! Virtual controllers driven through pipes.
//!
//! Besides the control pair, every other `<dev>_in`/`<dev>_out` pair in the
//! pipes directory is a controller. Each line on `<dev>_in` presses,
//! releases or moves one input and is answered on `<dev>_out` with `0` or,
//! when it cannot be applied, `-1`. Pending lines are consumed whenever the
//! host polls controller input.

mod command;
mod controller;
mod device;

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

pub use self::command::ControllerCommand;
pub use self::controller::{AxisRails, BUTTONS, SHOULDERS, STICKS, VirtualController, rescale};
pub use self::device::{ControllerPipe, attach_controller_pipes, discover_controller_pipes};

pub(crate) const INPUT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::input");

/// Errors raised by controller pipes.
#[derive(Debug, Error)]
pub enum InputError {
    /// Wrong token count for a known verb, or not UTF-8.
    #[error("malformed controller command '{line}'")]
    Malformed {
        /// Offending line.
        line: String,
    },
    /// First token is not `Press`, `Release` or `Set`.
    #[error("unknown controller verb '{verb}'")]
    UnknownVerb {
        /// Offending verb.
        verb: String,
    },
    /// Button name outside [`BUTTONS`].
    #[error("unknown button '{name}'")]
    UnknownButton {
        /// Offending name.
        name: String,
    },
    /// Axis or stick name outside [`SHOULDERS`] and [`STICKS`].
    #[error("unknown axis '{name}'")]
    UnknownAxis {
        /// Offending name.
        name: String,
    },
    /// Value that is not a finite decimal number.
    #[error("invalid axis value '{token}'")]
    InvalidValue {
        /// Offending token.
        token: String,
    },
    /// The pipes directory could not be listed.
    #[error("failed to scan pipes directory '{path}': {source}")]
    ScanDirectory {
        /// Directory that was scanned.
        path: Utf8PathBuf,
        /// Error from the directory listing.
        #[source]
        source: io::Error,
    },
}

//! Controller pipe commands.
//!
//! ```text
//! Press A
//! Release NunchukZ
//! Set L 0.75
//! Set MAIN -1 0.25
//! ```

use super::InputError;
use super::controller::VirtualController;

/// One parsed controller line.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerCommand {
    /// `Press <button>`.
    Press(String),
    /// `Release <button>`.
    Release(String),
    /// `Set <axis> <value>` for a single-axis input.
    SetAxis {
        /// Axis name.
        name: String,
        /// Value in `[-1, 1]` before rescaling.
        value: f64,
    },
    /// `Set <stick> <x> <y>` for a two-axis stick.
    SetStick {
        /// Stick name.
        name: String,
        /// Horizontal value before rescaling.
        x: f64,
        /// Vertical value before rescaling.
        y: f64,
    },
}

impl ControllerCommand {
    /// Parses one framed line.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown verbs, wrong token counts and values that
    /// are not finite decimal numbers.
    pub fn parse(line: &str) -> Result<Self, InputError> {
        let tokens: Vec<&str> = line.split(' ').collect();
        match tokens.as_slice() {
            ["Press", name] => Ok(Self::Press((*name).to_owned())),
            ["Release", name] => Ok(Self::Release((*name).to_owned())),
            ["Set", name, value] => Ok(Self::SetAxis {
                name: (*name).to_owned(),
                value: parse_value(value)?,
            }),
            ["Set", name, x, y] => Ok(Self::SetStick {
                name: (*name).to_owned(),
                x: parse_value(x)?,
                y: parse_value(y)?,
            }),
            ["Press" | "Release" | "Set", ..] => Err(InputError::Malformed {
                line: line.to_owned(),
            }),
            [verb, ..] => Err(InputError::UnknownVerb {
                verb: (*verb).to_owned(),
            }),
            [] => Err(InputError::Malformed {
                line: line.to_owned(),
            }),
        }
    }

    /// Applies the command to `controller`.
    ///
    /// # Errors
    ///
    /// Returns an error when the button or axis name is unknown.
    pub fn apply(&self, controller: &mut VirtualController) -> Result<(), InputError> {
        match self {
            Self::Press(name) => controller.set_button(name, true),
            Self::Release(name) => controller.set_button(name, false),
            Self::SetAxis { name, value } => controller.set_shoulder(name, *value),
            Self::SetStick { name, x, y } => controller.set_stick(name, *x, *y),
        }
    }
}

fn parse_value(token: &str) -> Result<f64, InputError> {
    token
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| InputError::InvalidValue {
            token: token.to_owned(),
        })
}

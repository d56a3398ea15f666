//! Virtual controller state.
//!
//! Every analog axis is exposed as two rails, `+` and `-`, each in `[0, 1]`.
//! A single axis value `v` in `[0, 1]` (0.5 centred) maps onto the rails as
//! `+ = max(0, v - 0.5) * 2` and `- = (0.5 - min(0.5, v)) * 2`.

use std::collections::BTreeMap;

use super::InputError;

/// Digital inputs accepted by `Press` and `Release`.
pub const BUTTONS: [&str; 47] = [
    "A",
    "B",
    "1",
    "2",
    "-",
    "+",
    "Home",
    "DUp",
    "DDown",
    "DLeft",
    "DRight",
    "ShakeX",
    "ShakeY",
    "ShakeZ",
    "IRUp",
    "IRDown",
    "IRLeft",
    "IRRight",
    "AccelUp",
    "AccelDown",
    "AccelLeft",
    "AccelRight",
    "AccelForward",
    "AccelBackward",
    "GyroPitchUp",
    "GyroPitchDown",
    "GyroRollLeft",
    "GyroRollBackward",
    "GyroYawLeft",
    "GyroYawRight",
    "SwingForward",
    "SwingBackward",
    "NunchukStickUp",
    "NunchukStickDown",
    "NunchukStickLeft",
    "NunchukStickRight",
    "NunchukShakeX",
    "NunchukShakeY",
    "NunchukShakeZ",
    "NunchukC",
    "NunchukZ",
    "X",
    "Y",
    "Z",
    "Start",
    "L",
    "R",
];

/// Single analog axes set with `Set <axis> <v>`; they rest at zero.
pub const SHOULDERS: [&str; 2] = ["L", "R"];

/// Two-axis sticks set with `Set <stick> <x> <y>`; they rest centred.
pub const STICKS: [&str; 3] = ["IR", "MAIN", "C"];

const SHOULDER_REST: f64 = 0.0;
const STICK_REST: f64 = 0.5;

/// The `+`/`-` pair backing one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRails {
    /// Deflection above the centre, in `[0, 1]`.
    pub positive: f64,
    /// Deflection below the centre, in `[0, 1]`.
    pub negative: f64,
}

impl AxisRails {
    const fn resting(value: f64) -> Self {
        Self {
            positive: value,
            negative: value,
        }
    }

    /// Splits a `[0, 1]` axis value onto the rails, clamping first.
    #[must_use]
    pub fn from_value(value: f64) -> Self {
        let value = value.clamp(0.0, 1.0);
        Self {
            positive: (value - 0.5).max(0.0) * 2.0,
            negative: (0.5 - value.min(0.5)) * 2.0,
        }
    }
}

/// Rescales a `[-1, 1]` wire value onto `[0, 1]`.
#[must_use]
pub fn rescale(value: f64) -> f64 {
    value / 2.0 + 0.5
}

/// Button and axis state of one virtual controller.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualController {
    buttons: BTreeMap<&'static str, bool>,
    axes: BTreeMap<String, AxisRails>,
}

impl Default for VirtualController {
    fn default() -> Self {
        let buttons = BUTTONS.iter().map(|name| (*name, false)).collect();
        let shoulders = SHOULDERS
            .iter()
            .map(|name| ((*name).to_owned(), AxisRails::resting(SHOULDER_REST)));
        let sticks = STICKS.iter().flat_map(|stick| {
            [
                (format!("{stick} X"), AxisRails::resting(STICK_REST)),
                (format!("{stick} Y"), AxisRails::resting(STICK_REST)),
            ]
        });
        Self {
            buttons,
            axes: shoulders.chain(sticks).collect(),
        }
    }
}

impl VirtualController {
    /// Every button released and every axis at rest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a button's pressed state.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownButton`] for names outside [`BUTTONS`].
    pub fn set_button(&mut self, name: &str, pressed: bool) -> Result<(), InputError> {
        let state = self
            .buttons
            .get_mut(name)
            .ok_or_else(|| InputError::UnknownButton {
                name: name.to_owned(),
            })?;
        *state = pressed;
        Ok(())
    }

    /// Sets a shoulder axis from a `[-1, 1]` wire value.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownAxis`] for names outside [`SHOULDERS`].
    pub fn set_shoulder(&mut self, name: &str, value: f64) -> Result<(), InputError> {
        if !SHOULDERS.contains(&name) {
            return Err(InputError::UnknownAxis {
                name: name.to_owned(),
            });
        }
        self.set_axis(name, rescale(value))
    }

    /// Sets both axes of a stick from `[-1, 1]` wire values.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownAxis`] for names outside [`STICKS`].
    pub fn set_stick(&mut self, name: &str, x: f64, y: f64) -> Result<(), InputError> {
        if !STICKS.contains(&name) {
            return Err(InputError::UnknownAxis {
                name: name.to_owned(),
            });
        }
        self.set_axis(&format!("{name} X"), rescale(x))?;
        self.set_axis(&format!("{name} Y"), rescale(y))
    }

    /// Whether `name` is currently pressed.
    #[must_use]
    pub fn button(&self, name: &str) -> Option<bool> {
        self.buttons.get(name).copied()
    }

    /// Rails of the axis called `name` (`L`, `R`, `IR X`, `MAIN Y`, ...).
    #[must_use]
    pub fn axis(&self, name: &str) -> Option<AxisRails> {
        self.axes.get(name).copied()
    }

    fn set_axis(&mut self, name: &str, value: f64) -> Result<(), InputError> {
        let rails = self
            .axes
            .get_mut(name)
            .ok_or_else(|| InputError::UnknownAxis {
                name: name.to_owned(),
            })?;
        *rails = AxisRails::from_value(value);
        Ok(())
    }
}

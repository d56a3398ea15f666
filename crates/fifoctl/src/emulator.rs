//! Narrow interfaces onto the emulator core.
//!
//! The protocol never links against an emulator. Everything it can do to a
//! running session goes through [`HostControl`] (jobs running on the host
//! control loop) or [`CpuControl`] (jobs running on the CPU thread while it
//! holds exclusive access to the register file).

use std::fmt;

/// Run state of the emulated machine as seen by the host loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunState {
    /// The CPU thread is executing frames.
    #[default]
    Running,
    /// Execution is halted until resumed or stepped.
    Paused,
}

impl RunState {
    /// The opposite state.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Running => Self::Paused,
            Self::Paused => Self::Running,
        }
    }
}

/// Logical memory views exposed by the emulator core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum AddressSpace {
    /// Translated (virtual) addresses.
    #[default]
    Effective,
    /// Auxiliary RAM.
    Auxiliary,
    /// Untranslated physical addresses.
    Physical,
    /// Primary RAM region.
    Mem1,
    /// Secondary RAM region.
    Mem2,
    /// Synthetic view backed by no real hardware.
    Fake,
}

impl AddressSpace {
    /// Every address space, in wire-tag order.
    pub const ALL: [Self; 6] = [
        Self::Effective,
        Self::Auxiliary,
        Self::Physical,
        Self::Mem1,
        Self::Mem2,
        Self::Fake,
    ];

    /// Resolves a wire tag (`eff`, `aux`, `phy`, `mem1`, `mem2`, `fake`).
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "eff" => Some(Self::Effective),
            "aux" => Some(Self::Auxiliary),
            "phy" => Some(Self::Physical),
            "mem1" => Some(Self::Mem1),
            "mem2" => Some(Self::Mem2),
            "fake" => Some(Self::Fake),
            _ => None,
        }
    }

    /// Wire tag for this address space.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Effective => "eff",
            Self::Auxiliary => "aux",
            Self::Physical => "phy",
            Self::Mem1 => "mem1",
            Self::Mem2 => "mem2",
            Self::Fake => "fake",
        }
    }
}

impl fmt::Display for AddressSpace {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.tag())
    }
}

/// Half of a paired-single floating-point register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PairedHalf {
    /// First slot (`ps0`).
    #[default]
    Low,
    /// Second slot (`ps1`).
    High,
}

/// Input channel polled by an `UpdateInput` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputChannel {
    /// Free-look camera controls.
    FreeLook,
    /// Primary controller channel.
    Host,
}

/// Operations available to jobs running on the host control loop.
///
/// Implementations wrap the emulator's own safe-access conventions; memory
/// accessors are expected to take whatever CPU guard the core requires.
#[cfg_attr(test, mockall::automock)]
pub trait HostControl {
    /// Current run state.
    fn run_state(&self) -> RunState;

    /// Transitions the machine to `state`.
    fn set_run_state(&mut self, state: RunState);

    /// Requests execution of exactly one frame.
    fn request_frame_step(&mut self);

    /// Whether the CPU thread is halted in its stepping/idle state.
    fn is_cpu_stepping(&self) -> bool;

    /// Loads the save state stored in `slot`.
    fn load_state_slot(&mut self, slot: u8);

    /// Reads one byte of the given address space.
    fn read_u8(&mut self, space: AddressSpace, address: u32) -> u8;

    /// Writes one byte of the given address space.
    fn write_u8(&mut self, space: AddressSpace, address: u32, value: u8);

    /// Flips the presence of an instruction breakpoint.
    fn toggle_breakpoint(&mut self, address: u32);

    /// Adds a memory breakpoint.
    fn add_memory_breakpoint(&mut self, address: u32);

    /// Whether an instruction breakpoint exists at `address`.
    fn is_breakpoint(&self, address: u32) -> bool;

    /// Polls virtual controller input on `channel`.
    fn update_input(&mut self, channel: InputChannel);
}

/// Register file access for jobs running on the CPU thread.
#[cfg_attr(test, mockall::automock)]
pub trait CpuControl {
    /// Reads one half of a paired-single register as raw bits.
    fn read_paired_single(&self, register: u8, half: PairedHalf) -> u64;

    /// Writes one half of a paired-single register from raw bits.
    fn write_paired_single(&mut self, register: u8, half: PairedHalf, value: u64);
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn toggling_twice_restores_state() {
        assert_eq!(RunState::Running.toggled(), RunState::Paused);
        assert_eq!(RunState::Running.toggled().toggled(), RunState::Running);
    }

    #[rstest]
    fn tags_round_trip_for_every_space() {
        for space in AddressSpace::ALL {
            assert_eq!(AddressSpace::from_tag(space.tag()), Some(space));
        }
    }

    #[rstest]
    #[case::uppercase("EFF")]
    #[case::unknown("rom")]
    #[case::empty("")]
    fn rejects_unknown_tags(#[case] tag: &str) {
        assert_eq!(AddressSpace::from_tag(tag), None);
    }
}

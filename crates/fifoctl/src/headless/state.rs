//! In-memory machine state.

use std::collections::{BTreeMap, BTreeSet};

use crate::emulator::{AddressSpace, InputChannel, PairedHalf, RunState};
use crate::input::ControllerPipe;

const FLOAT_REGISTER_COUNT: usize = 32;

/// Everything the headless machine remembers between frames.
#[derive(Debug, Default)]
pub struct MachineState {
    run_state: RunState,
    step_requested: bool,
    frames: u64,
    memory: BTreeMap<(AddressSpace, u32), u8>,
    breakpoints: BTreeSet<u32>,
    memory_breakpoints: BTreeSet<u32>,
    registers: [[u64; 2]; FLOAT_REGISTER_COUNT],
    loaded_slot: Option<u8>,
    free_look_polls: u64,
    host_polls: u64,
    controllers: Vec<ControllerPipe>,
}

impl MachineState {
    /// Running, with no memory, breakpoints or controllers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the CPU is running or paused.
    #[must_use]
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Switching to running cancels any pending frame step.
    pub fn set_run_state(&mut self, state: RunState) {
        self.run_state = state;
        if state == RunState::Running {
            self.step_requested = false;
        }
    }

    /// Frames executed so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// A running machine pauses; a paused one schedules exactly one frame.
    pub fn request_frame_step(&mut self) {
        match self.run_state {
            RunState::Running => self.run_state = RunState::Paused,
            RunState::Paused => self.step_requested = true,
        }
    }

    /// Paused with no step outstanding.
    #[must_use]
    pub fn is_stepping(&self) -> bool {
        self.run_state == RunState::Paused && !self.step_requested
    }

    /// Executes one CPU tick. Returns whether a frame ran.
    pub fn run_frame(&mut self) -> bool {
        let runs = self.run_state == RunState::Running || self.step_requested;
        if runs {
            self.frames += 1;
            self.step_requested = false;
        }
        runs
    }

    /// Save-state slot loaded last.
    #[must_use]
    pub fn loaded_slot(&self) -> Option<u8> {
        self.loaded_slot
    }

    /// Records a save-state load.
    pub fn load_slot(&mut self, slot: u8) {
        self.loaded_slot = Some(slot);
    }

    /// Unwritten bytes read as zero.
    #[must_use]
    pub fn read_u8(&self, space: AddressSpace, address: u32) -> u8 {
        self.memory.get(&(space, address)).copied().unwrap_or_default()
    }

    /// Stores one byte.
    pub fn write_u8(&mut self, space: AddressSpace, address: u32, value: u8) {
        self.memory.insert((space, address), value);
    }

    /// Adds an instruction breakpoint, or removes it if present.
    pub fn toggle_breakpoint(&mut self, address: u32) {
        if !self.breakpoints.remove(&address) {
            self.breakpoints.insert(address);
        }
    }

    /// Whether an instruction breakpoint is set at `address`.
    #[must_use]
    pub fn is_breakpoint(&self, address: u32) -> bool {
        self.breakpoints.contains(&address)
    }

    /// Adds a memory breakpoint; adding it twice is a no-op.
    pub fn add_memory_breakpoint(&mut self, address: u32) {
        self.memory_breakpoints.insert(address);
    }

    /// Whether a memory breakpoint is set at `address`.
    #[must_use]
    pub fn is_memory_breakpoint(&self, address: u32) -> bool {
        self.memory_breakpoints.contains(&address)
    }

    /// Out-of-range registers read as zero.
    #[must_use]
    pub fn paired_single(&self, register: u8, half: PairedHalf) -> u64 {
        self.registers
            .get(usize::from(register))
            .map_or(0, |pair| pair[half_index(half)])
    }

    /// Writes to out-of-range registers are ignored.
    pub fn set_paired_single(&mut self, register: u8, half: PairedHalf, value: u64) {
        if let Some(pair) = self.registers.get_mut(usize::from(register)) {
            pair[half_index(half)] = value;
        }
    }

    /// Records a poll and, on the host channel, drains every controller pipe.
    pub fn poll_input(&mut self, channel: InputChannel) {
        match channel {
            InputChannel::FreeLook => self.free_look_polls += 1,
            InputChannel::Host => {
                self.host_polls += 1;
                for controller in &mut self.controllers {
                    controller.update();
                }
            }
        }
    }

    /// Polls seen on `channel`.
    #[must_use]
    pub fn input_polls(&self, channel: InputChannel) -> u64 {
        match channel {
            InputChannel::FreeLook => self.free_look_polls,
            InputChannel::Host => self.host_polls,
        }
    }

    /// Adds controller pipes drained on host polls.
    pub fn attach_controllers(&mut self, controllers: impl IntoIterator<Item = ControllerPipe>) {
        self.controllers.extend(controllers);
    }

    /// Attached controller pipes.
    #[must_use]
    pub fn controllers(&self) -> &[ControllerPipe] {
        &self.controllers
    }
}

const fn half_index(half: PairedHalf) -> usize {
    match half {
        PairedHalf::Low => 0,
        PairedHalf::High => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_step_runs_exactly_one_frame() {
        let mut state = MachineState::new();
        state.set_run_state(RunState::Paused);
        assert!(state.is_stepping());

        state.request_frame_step();
        assert!(!state.is_stepping());
        assert!(state.run_frame());
        assert!(state.is_stepping());
        assert!(!state.run_frame());
        assert_eq!(state.frames(), 1);
    }

    #[test]
    fn frame_step_while_running_pauses() {
        let mut state = MachineState::new();
        state.request_frame_step();
        assert_eq!(state.run_state(), RunState::Paused);
        assert!(state.is_stepping());
    }

    #[test]
    fn address_spaces_are_independent() {
        let mut state = MachineState::new();
        state.write_u8(AddressSpace::Mem1, 0x10, 0xab);
        assert_eq!(state.read_u8(AddressSpace::Mem1, 0x10), 0xab);
        assert_eq!(state.read_u8(AddressSpace::Mem2, 0x10), 0);
    }

    #[test]
    fn toggling_a_breakpoint_twice_removes_it() {
        let mut state = MachineState::new();
        state.toggle_breakpoint(0x8000_3100);
        assert!(state.is_breakpoint(0x8000_3100));
        state.toggle_breakpoint(0x8000_3100);
        assert!(!state.is_breakpoint(0x8000_3100));
    }

    #[test]
    fn register_halves_are_separate() {
        let mut state = MachineState::new();
        state.set_paired_single(31, PairedHalf::High, 7);
        assert_eq!(state.paired_single(31, PairedHalf::High), 7);
        assert_eq!(state.paired_single(31, PairedHalf::Low), 0);
    }
}

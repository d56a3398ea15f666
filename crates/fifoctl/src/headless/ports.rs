//! Control-trait adapters over the shared machine state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::emulator::{AddressSpace, CpuControl, HostControl, InputChannel, PairedHalf, RunState};

use super::MachineState;

pub(super) fn lock(state: &Mutex<MachineState>) -> MutexGuard<'_, MachineState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// [`HostControl`] for the host loop. Every call takes the machine lock for
/// its own duration only, so a waiting job never starves the CPU thread.
#[derive(Debug, Clone)]
pub struct HostPort {
    state: Arc<Mutex<MachineState>>,
}

impl HostPort {
    pub(super) fn new(state: Arc<Mutex<MachineState>>) -> Self {
        Self { state }
    }

    fn state(&self) -> MutexGuard<'_, MachineState> {
        lock(&self.state)
    }
}

impl HostControl for HostPort {
    fn run_state(&self) -> RunState {
        self.state().run_state()
    }

    fn set_run_state(&mut self, state: RunState) {
        self.state().set_run_state(state);
    }

    fn request_frame_step(&mut self) {
        self.state().request_frame_step();
    }

    fn is_cpu_stepping(&self) -> bool {
        self.state().is_stepping()
    }

    fn load_state_slot(&mut self, slot: u8) {
        self.state().load_slot(slot);
    }

    fn read_u8(&mut self, space: AddressSpace, address: u32) -> u8 {
        self.state().read_u8(space, address)
    }

    fn write_u8(&mut self, space: AddressSpace, address: u32, value: u8) {
        self.state().write_u8(space, address, value);
    }

    fn toggle_breakpoint(&mut self, address: u32) {
        self.state().toggle_breakpoint(address);
    }

    fn add_memory_breakpoint(&mut self, address: u32) {
        self.state().add_memory_breakpoint(address);
    }

    fn is_breakpoint(&self, address: u32) -> bool {
        self.state().is_breakpoint(address)
    }

    fn update_input(&mut self, channel: InputChannel) {
        self.state().poll_input(channel);
    }
}

/// [`CpuControl`] for jobs drained by the CPU thread while it holds the
/// machine lock.
#[derive(Debug)]
pub struct CpuPort<'a> {
    state: &'a mut MachineState,
}

impl<'a> CpuPort<'a> {
    /// Port over state the caller has already locked.
    #[must_use]
    pub fn new(state: &'a mut MachineState) -> Self {
        Self { state }
    }
}

impl CpuControl for CpuPort<'_> {
    fn read_paired_single(&self, register: u8, half: PairedHalf) -> u64 {
        self.state.paired_single(register, half)
    }

    fn write_paired_single(&mut self, register: u8, half: PairedHalf, value: u64) {
        self.state.set_paired_single(register, half, value);
    }
}

//! Command handlers.
//!
//! Each handler performs one emulator call through the control trait of the
//! context it runs on and reports the result token for its response line.

use std::thread;
use std::time::Duration;

use crate::command::Operands;
use crate::emulator::{CpuControl, HostControl, InputChannel, RunState};

use super::ResultToken;

const STEP_POLL_INTERVAL: Duration = Duration::from_millis(1);

pub(crate) fn toggle_pause(_: &Operands, host: &mut dyn HostControl) -> ResultToken {
    let next = host.run_state().toggled();
    host.set_run_state(next);
    ResultToken::Ack
}

pub(crate) fn pause(_: &Operands, host: &mut dyn HostControl) -> ResultToken {
    host.set_run_state(RunState::Paused);
    ResultToken::Ack
}

pub(crate) fn resume(_: &Operands, host: &mut dyn HostControl) -> ResultToken {
    host.set_run_state(RunState::Running);
    ResultToken::Ack
}

pub(crate) fn is_paused(_: &Operands, host: &mut dyn HostControl) -> ResultToken {
    ResultToken::Flag(host.run_state() == RunState::Paused)
}

/// Requests one frame and blocks the host loop until the CPU thread is back
/// in its stepping state. There is no timeout.
pub(crate) fn frame_advance(_: &Operands, host: &mut dyn HostControl) -> ResultToken {
    host.request_frame_step();
    while !host.is_cpu_stepping() {
        thread::sleep(STEP_POLL_INTERVAL);
    }
    ResultToken::Ack
}

pub(crate) fn load_slot(operands: &Operands, host: &mut dyn HostControl) -> ResultToken {
    host.load_state_slot(operands.slot);
    ResultToken::Ack
}

pub(crate) fn read_memory(operands: &Operands, host: &mut dyn HostControl) -> ResultToken {
    ResultToken::Byte(host.read_u8(operands.space, operands.address))
}

pub(crate) fn write_memory(operands: &Operands, host: &mut dyn HostControl) -> ResultToken {
    host.write_u8(operands.space, operands.address, operands.value);
    ResultToken::Ack
}

pub(crate) fn toggle_breakpoint(operands: &Operands, host: &mut dyn HostControl) -> ResultToken {
    host.toggle_breakpoint(operands.address);
    ResultToken::Ack
}

pub(crate) fn add_memory_breakpoint(
    operands: &Operands,
    host: &mut dyn HostControl,
) -> ResultToken {
    host.add_memory_breakpoint(operands.address);
    ResultToken::Ack
}

pub(crate) fn is_breakpoint(operands: &Operands, host: &mut dyn HostControl) -> ResultToken {
    ResultToken::Flag(host.is_breakpoint(operands.address))
}

pub(crate) fn update_input(_: &Operands, host: &mut dyn HostControl) -> ResultToken {
    host.update_input(InputChannel::FreeLook);
    host.update_input(InputChannel::Host);
    ResultToken::Ack
}

pub(crate) fn read_float_register(operands: &Operands, cpu: &mut dyn CpuControl) -> ResultToken {
    ResultToken::Quad(cpu.read_paired_single(operands.register, operands.half))
}

pub(crate) fn write_float_register(operands: &Operands, cpu: &mut dyn CpuControl) -> ResultToken {
    cpu.write_paired_single(operands.register, operands.half, operands.wide_value);
    ResultToken::Ack
}

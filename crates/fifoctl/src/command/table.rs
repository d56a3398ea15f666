//! Versioned command table.
//!
//! One row per verb: its wire name, exact arity, operand parser, handler and
//! the execution context the handler runs on. Adding a verb means adding a
//! row here and a handler in `dispatch::handlers`.

use std::fmt;

use crate::context::ContextKind;
use crate::dispatch::ResultToken;
use crate::dispatch::handlers;
use crate::emulator::{CpuControl, HostControl};

use super::ParseError;
use super::operands::{
    Operands, parse_address, parse_memory_read, parse_memory_write, parse_none,
    parse_register_read, parse_register_write, parse_slot,
};

/// Revision of the verb set below. Bump when a row is added or changed.
pub const PROTOCOL_REVISION: u32 = 1;

/// Converts validated argument tokens into operands.
pub type OperandParser = fn(&[&str]) -> Result<Operands, ParseError>;

/// Handler run on the host control loop.
pub type HostHandler = fn(&Operands, &mut dyn HostControl) -> ResultToken;

/// Handler run on the CPU thread.
pub type CpuHandler = fn(&Operands, &mut dyn CpuControl) -> ResultToken;

/// Handler paired with the context that must run it.
#[derive(Clone, Copy)]
pub enum Route {
    /// Runs on the host control loop.
    Host(HostHandler),
    /// Runs on the CPU thread with the register file held.
    Cpu(CpuHandler),
}

impl Route {
    /// Context the handler is queued on.
    #[must_use]
    pub const fn context(self) -> ContextKind {
        match self {
            Self::Host(_) => ContextKind::Host,
            Self::Cpu(_) => ContextKind::Cpu,
        }
    }
}

/// One row of the command table.
pub struct VerbSpec {
    /// Verb token, matched case-sensitively.
    pub verb: &'static str,
    /// Exact number of arguments after the verb.
    pub arity: usize,
    /// Validates and converts the arguments.
    pub operands: OperandParser,
    /// Handler and the context it runs on.
    pub route: Route,
}

impl fmt::Debug for VerbSpec {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("VerbSpec")
            .field("verb", &self.verb)
            .field("arity", &self.arity)
            .field("context", &self.route.context())
            .finish()
    }
}

const fn host(
    verb: &'static str,
    arity: usize,
    operands: OperandParser,
    handler: HostHandler,
) -> VerbSpec {
    VerbSpec {
        verb,
        arity,
        operands,
        route: Route::Host(handler),
    }
}

const fn cpu(
    verb: &'static str,
    arity: usize,
    operands: OperandParser,
    handler: CpuHandler,
) -> VerbSpec {
    VerbSpec {
        verb,
        arity,
        operands,
        route: Route::Cpu(handler),
    }
}

/// Every verb the protocol accepts.
pub static VERBS: [VerbSpec; 14] = [
    host("TogglePause", 0, parse_none, handlers::toggle_pause),
    host("Pause", 0, parse_none, handlers::pause),
    host("Resume", 0, parse_none, handlers::resume),
    host("IsPaused", 0, parse_none, handlers::is_paused),
    host("FrameAdvance", 0, parse_none, handlers::frame_advance),
    host("LoadSlot", 1, parse_slot, handlers::load_slot),
    host("ReadMemory", 2, parse_memory_read, handlers::read_memory),
    host("WriteMemory", 3, parse_memory_write, handlers::write_memory),
    host("ToggleBreakpoint", 1, parse_address, handlers::toggle_breakpoint),
    host("AddMemBreakpoint", 1, parse_address, handlers::add_memory_breakpoint),
    host("IsBreakpoint", 1, parse_address, handlers::is_breakpoint),
    cpu("ReadCPUFReg", 2, parse_register_read, handlers::read_float_register),
    cpu("WriteCPUFReg", 3, parse_register_write, handlers::write_float_register),
    host("UpdateInput", 0, parse_none, handlers::update_input),
];

/// Finds the row for `verb`. Verbs are case-sensitive.
#[must_use]
pub fn lookup(verb: &str) -> Option<&'static VerbSpec> {
    VERBS.iter().find(|spec| spec.verb == verb)
}

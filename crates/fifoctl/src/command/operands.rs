//! Typed operand extraction.
//!
//! Each verb's table entry names one of the `parse_*` functions below. They
//! run after the arity check, so every function may index its argument slice
//! up to the verb's declared arity.

use std::ops::RangeInclusive;

use crate::emulator::{AddressSpace, PairedHalf};

use super::ParseError;

/// Save-state slots addressable by `LoadSlot`.
pub const STATE_SLOTS: RangeInclusive<u64> = 1..=10;

/// Paired-single register indices addressable by the register verbs.
pub const FLOAT_REGISTERS: RangeInclusive<u64> = 0..=31;

const PAIRED_HALVES: RangeInclusive<u64> = 0..=1;

/// Operand values captured by a job.
///
/// Fields a verb does not use keep their defaults. The struct is `Copy` so
/// each job owns its operands outright.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Operands {
    /// Address space of a memory access.
    pub space: AddressSpace,
    /// Memory or breakpoint address.
    pub address: u32,
    /// Byte written by `WriteMemory`.
    pub value: u8,
    /// Save-state slot.
    pub slot: u8,
    /// Floating-point register index.
    pub register: u8,
    /// Half of the paired-single register.
    pub half: PairedHalf,
    /// Raw register bits written by `WriteCPUFReg`.
    pub wide_value: u64,
}

pub(crate) fn parse_none(_: &[&str]) -> Result<Operands, ParseError> {
    Ok(Operands::default())
}

pub(crate) fn parse_slot(args: &[&str]) -> Result<Operands, ParseError> {
    let slot = ranged(parse_decimal(args[0])?, "save slot", STATE_SLOTS)?;
    Ok(Operands {
        slot,
        ..Operands::default()
    })
}

pub(crate) fn parse_address(args: &[&str]) -> Result<Operands, ParseError> {
    Ok(Operands {
        address: parse_hex_u32(args[0])?,
        ..Operands::default()
    })
}

pub(crate) fn parse_memory_read(args: &[&str]) -> Result<Operands, ParseError> {
    Ok(Operands {
        space: parse_space(args[0])?,
        address: parse_hex_u32(args[1])?,
        ..Operands::default()
    })
}

pub(crate) fn parse_memory_write(args: &[&str]) -> Result<Operands, ParseError> {
    Ok(Operands {
        value: parse_hex_u8(args[2])?,
        ..parse_memory_read(args)?
    })
}

pub(crate) fn parse_register_read(args: &[&str]) -> Result<Operands, ParseError> {
    let register = ranged(
        u64::from(parse_hex_u32(args[0])?),
        "register",
        FLOAT_REGISTERS,
    )?;
    let half = match ranged::<u8>(parse_decimal(args[1])?, "half", PAIRED_HALVES)? {
        0 => PairedHalf::Low,
        _ => PairedHalf::High,
    };
    Ok(Operands {
        register,
        half,
        ..Operands::default()
    })
}

pub(crate) fn parse_register_write(args: &[&str]) -> Result<Operands, ParseError> {
    Ok(Operands {
        wide_value: u64::from(parse_hex_u32(args[2])?),
        ..parse_register_read(args)?
    })
}

fn parse_space(tag: &str) -> Result<AddressSpace, ParseError> {
    AddressSpace::from_tag(tag).ok_or_else(|| ParseError::UnknownAddressSpace {
        tag: tag.to_owned(),
    })
}

fn is_lower_hex(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte))
}

fn parse_hex_u32(token: &str) -> Result<u32, ParseError> {
    if !is_lower_hex(token) {
        return Err(ParseError::invalid_hex(token));
    }
    u32::from_str_radix(token, 16).map_err(|_| ParseError::invalid_hex(token))
}

fn parse_hex_u8(token: &str) -> Result<u8, ParseError> {
    if !is_lower_hex(token) {
        return Err(ParseError::invalid_hex(token));
    }
    u8::from_str_radix(token, 16).map_err(|_| ParseError::invalid_hex(token))
}

fn parse_decimal(token: &str) -> Result<u64, ParseError> {
    if token.is_empty() || !token.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ParseError::invalid_decimal(token));
    }
    token
        .parse()
        .map_err(|_| ParseError::invalid_decimal(token))
}

fn ranged<T: TryFrom<u64>>(
    value: u64,
    operand: &'static str,
    range: RangeInclusive<u64>,
) -> Result<T, ParseError> {
    let out_of_range = || ParseError::OutOfRange {
        operand,
        value,
        min: *range.start(),
        max: *range.end(),
    };
    if !range.contains(&value) {
        return Err(out_of_range());
    }
    T::try_from(value).map_err(|_| out_of_range())
}

//! Rejection reasons for command lines.
//!
//! On the wire every rejection is the same `-1` token; the variants only
//! exist so the dispatcher can log why a line was refused.

use thiserror::Error;

/// Errors surfaced while tokenizing and validating a command line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line had no verb.
    #[error("empty command line")]
    Empty,

    /// The line is not valid UTF-8.
    #[error("command line is not valid UTF-8")]
    InvalidUtf8,

    /// The verb is not in the command table.
    #[error("unknown verb '{verb}'")]
    UnknownVerb {
        /// The rejected verb token.
        verb: String,
    },

    /// The verb received the wrong number of arguments.
    #[error("{verb} expects {expected} argument(s), got {found}")]
    Arity {
        /// Verb whose arity was violated.
        verb: &'static str,
        /// Arguments the verb takes.
        expected: usize,
        /// Arguments the line carried.
        found: usize,
    },

    /// A token that must be lowercase hexadecimal was not.
    #[error("invalid hexadecimal operand '{token}'")]
    InvalidHex {
        /// The offending token.
        token: String,
    },

    /// A token that must be decimal was not.
    #[error("invalid decimal operand '{token}'")]
    InvalidDecimal {
        /// The offending token.
        token: String,
    },

    /// A numeric operand parsed but lies outside its valid range.
    #[error("{operand} {value} outside {min}..={max}")]
    OutOfRange {
        /// Name of the operand, such as `slot`.
        operand: &'static str,
        /// Parsed value.
        value: u64,
        /// Smallest accepted value.
        min: u64,
        /// Largest accepted value.
        max: u64,
    },

    /// The address-space tag is not recognised.
    #[error("unknown address space '{tag}'")]
    UnknownAddressSpace {
        /// The unrecognised tag.
        tag: String,
    },
}

impl ParseError {
    pub(crate) fn invalid_hex(token: &str) -> Self {
        Self::InvalidHex {
            token: token.to_owned(),
        }
    }

    pub(crate) fn invalid_decimal(token: &str) -> Self {
        Self::InvalidDecimal {
            token: token.to_owned(),
        }
    }
}

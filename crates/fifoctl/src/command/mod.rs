//! Command-line parsing.
//!
//! A command is one line of space-separated tokens: a verb followed by
//! exactly the number of arguments its table row declares. Tokens are split
//! on single spaces, so a doubled space yields an empty token and fails
//! whichever operand it lands on.
//!
//! ```text
//! WriteMemory eff 80003100 ab
//! ```

mod errors;
mod operands;
mod table;

use std::str;

pub use self::errors::ParseError;
pub use self::operands::{FLOAT_REGISTERS, Operands, STATE_SLOTS};
pub use self::table::{
    CpuHandler, HostHandler, OperandParser, PROTOCOL_REVISION, Route, VERBS, VerbSpec, lookup,
};

/// A validated command.
#[derive(Debug, Clone)]
pub struct Command {
    text: String,
    spec: &'static VerbSpec,
    operands: Operands,
}

impl Command {
    /// Parses one framed line as received from the pipe.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidUtf8`] for bytes that are not UTF-8, and
    /// otherwise whatever [`Command::parse`] reports.
    pub fn parse_bytes(line: &[u8]) -> Result<Self, ParseError> {
        str::from_utf8(line)
            .map_err(|_| ParseError::InvalidUtf8)
            .and_then(Self::parse)
    }

    /// Parses and validates one framed line.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] describing the first problem found.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut tokens = line.split(' ');
        let verb = tokens.next().unwrap_or_default();
        if verb.is_empty() {
            return Err(ParseError::Empty);
        }
        let spec = lookup(verb).ok_or_else(|| ParseError::UnknownVerb {
            verb: verb.to_owned(),
        })?;

        let args: Vec<&str> = tokens.collect();
        if args.len() != spec.arity {
            return Err(ParseError::Arity {
                verb: spec.verb,
                expected: spec.arity,
                found: args.len(),
            });
        }

        let operands = (spec.operands)(&args)?;
        Ok(Self {
            text: line.to_owned(),
            spec,
            operands,
        })
    }

    /// The line exactly as received.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Verb of the matched table row.
    #[must_use]
    pub fn verb(&self) -> &'static str {
        self.spec.verb
    }

    /// Handler and context of the matched table row.
    #[must_use]
    pub fn route(&self) -> Route {
        self.spec.route
    }

    /// Validated operands.
    #[must_use]
    pub fn operands(&self) -> Operands {
        self.operands
    }

    /// Splits the command into the parts a job captures.
    #[must_use]
    pub fn into_parts(self) -> (String, Route, Operands) {
        (self.text, self.spec.route, self.operands)
    }
}

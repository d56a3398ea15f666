//! Test suites for the pipe protocol and the headless machine.

pub(crate) mod support;

//! Shutdown signal triggered from the test body.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use crate::process::{ShutdownError, ShutdownSignal};

/// Blocks until its paired sender sends or is dropped.
pub struct ManualShutdownSignal {
    receiver: Mutex<Receiver<()>>,
}

impl ManualShutdownSignal {
    /// Builds a signal and the sender that releases it.
    #[must_use]
    pub fn new() -> (Self, Sender<()>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                receiver: Mutex::new(receiver),
            },
            sender,
        )
    }
}

impl ShutdownSignal for ManualShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let receiver = self.receiver.lock().expect("shutdown mutex poisoned");
        let _ = receiver.recv();
        Ok(())
    }
}

//! Command dispatch.
//!
//! Lines arrive from the framer in receipt order. The [`Dispatcher`] parses
//! each one against the command table and queues a job on the host or CPU
//! context; the job's result travels back over a channel as a
//! [`Completion`]. The worker feeds completions through the
//! [`ResponseSequencer`] so responses leave in the order the lines arrived,
//! and the [`ResponsePublisher`] writes them.
//!
//! ## Responses
//!
//! ```text
//! > ReadMemory eff 80000000
//! < ReadMemory eff 80000000 47
//! > LoadSlot 11
//! < LoadSlot 11 -1
//! ```

pub(crate) mod handlers;
mod response;
mod router;
mod throttle;

pub use self::response::{
    Completion, ResponseFrame, ResponsePublisher, ResponseSequencer, ResultToken,
};
pub use self::router::Dispatcher;
pub use self::throttle::DispatchThrottle;

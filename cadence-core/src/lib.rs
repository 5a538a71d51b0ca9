//! Board-agnostic core of the Cadence runtime
//!
//! This crate holds the parts that do not touch hardware directly:
//!
//! - Cooperative background-task scheduler (round-robin, never preempts)
//! - Drift-free periodic deadlines for task bodies
//! - Fail-stop indicator for unrecoverable faults
//!
//! Tasks are plain structs implementing [`scheduler::Task`]. The
//! application constructs them, registers them with a
//! [`scheduler::Scheduler`] and hands control to
//! [`Scheduler::run_forever`](scheduler::Scheduler::run_forever).

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod halt;
pub mod scheduler;

pub use halt::FailStop;
pub use scheduler::{FnTask, Periodic, Scheduler, SchedulerError, Task};

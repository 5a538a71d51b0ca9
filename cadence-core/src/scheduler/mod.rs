//! Cooperative background-task scheduler
//!
//! A single thread of control walks every registered task once per pass,
//! in registration order. A task body checks its own deadline and returns
//! at once when nothing is due; a body that blocks starves every other
//! task, and the scheduler has no way to notice.

mod executor;
mod periodic;
mod task;

pub use executor::{Scheduler, SchedulerError, DEFAULT_MAX_TASKS};
pub use periodic::Periodic;
pub use task::{FnTask, Task};

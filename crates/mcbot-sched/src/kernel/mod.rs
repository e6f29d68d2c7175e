//! Kernel - the scheduling engine, its task backlog and the standing modes.

mod modes;
mod queue;
mod scheduler;

pub use modes::ModeFlags;
pub use queue::{Task, TaskId, TaskOrigin, TaskQueue, TaskStatus};
pub use scheduler::{CurrentBehavior, Scheduler};

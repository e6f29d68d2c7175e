//! mcbot scheduler - decides which behavior owns the agent's body.
//!
//! The [`Scheduler`] keeps a single active slot, a LIFO stack of paused behaviors, per-instance
//! completion continuations and an ordered task backlog. Standing modes (combat, follow, mining)
//! are re-evaluated on a monitor cadence and promoted into running behaviors when they win on
//! priority.

pub mod command;
pub mod config;
pub mod error;
pub mod kernel;
pub mod observability;
pub mod priority;

pub use command::{CommandKind, CommandRequest, CommandResponse, CommandStatus};
pub use config::SchedulerConfig;
pub use error::{NotifyError, SchedulerError};
pub use kernel::{
    CurrentBehavior, ModeFlags, Scheduler, Task, TaskId, TaskOrigin, TaskQueue, TaskStatus,
};
pub use observability::{
    ChannelNotifier, FanoutNotifier, JsonlNotifier, MemoryNotifier, Notification,
    NotificationKind, Notifier, NullNotifier, StatusSnapshot,
};
pub use priority::PriorityTable;

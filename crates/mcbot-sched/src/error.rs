//! Error types for the scheduler and its reporting sinks.

use mcbot_core::BehaviorKind;
use thiserror::Error;

use crate::kernel::TaskId;

/// Errors surfaced through the command boundary. Behavior failures never show up here; they are
/// completions.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),

    #[error("missing argument '{0}'")]
    MissingArgument(&'static str),

    #[error("unknown task {0}")]
    UnknownTask(TaskId),

    #[error("invalid priority {value} for {kind}: must be within 0..={max}")]
    InvalidPriority {
        kind: BehaviorKind,
        value: i32,
        max: i32,
    },
}

/// Delivery failure of a notification sink. Logged by the scheduler, never propagated.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification sink is closed")]
    Closed,

    #[error("failed to write notification: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode notification: {0}")]
    Encode(#[from] serde_json::Error),
}

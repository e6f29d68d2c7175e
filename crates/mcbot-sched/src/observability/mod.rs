//! Observability - scheduler notifications, their sinks and status snapshots.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use mcbot_core::{BehaviorKind, InstanceId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::kernel::{CurrentBehavior, ModeFlags, Task, TaskId};
use crate::NotifyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BehaviorStarted,
    BehaviorCompleted,
    BehaviorStopped,
    BehaviorInterrupted,
    BehaviorResumed,
    Rejected,
    ModeChanged,
    TaskQueued,
    TaskCancelled,
    Disconnected,
    Reconnected,
}

/// A scheduler event for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub timestamp: DateTime<Utc>,
    pub event_type: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<BehaviorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<InstanceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskId>,
    pub message: String,
}

impl Notification {
    pub fn new(event_type: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            behavior: None,
            instance: None,
            task: None,
            message: message.into(),
        }
    }

    pub fn behavior(mut self, kind: BehaviorKind, instance: InstanceId) -> Self {
        self.behavior = Some(kind);
        self.instance = Some(instance);
        self
    }

    pub fn kind(mut self, kind: BehaviorKind) -> Self {
        self.behavior = Some(kind);
        self
    }

    pub fn task(mut self, task: Option<TaskId>) -> Self {
        self.task = task;
        self
    }
}

/// Reporting sink. Failures are logged by the scheduler and never change its decisions.
pub trait Notifier {
    fn notify(&mut self, notification: &Notification) -> Result<(), NotifyError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&mut self, _notification: &Notification) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Keeps every notification in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryNotifier {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.events().iter().map(|n| n.event_type).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&mut self, notification: &Notification) -> Result<(), NotifyError> {
        let mut events = self.events.lock().map_err(|_| NotifyError::Closed)?;
        events.push(notification.clone());
        Ok(())
    }
}

/// Forwards notifications to an async consumer.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::UnboundedSender<Notification>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&mut self, notification: &Notification) -> Result<(), NotifyError> {
        self.tx
            .send(notification.clone())
            .map_err(|_| NotifyError::Closed)
    }
}

/// Appends notifications to a JSONL file.
#[derive(Debug, Clone)]
pub struct JsonlNotifier {
    events_path: PathBuf,
}

impl JsonlNotifier {
    pub fn new(events_path: impl Into<PathBuf>) -> Self {
        Self {
            events_path: events_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.events_path
    }

    /// Read recent notifications. Unreadable lines are skipped.
    pub fn read_recent(path: &Path, limit: usize) -> Vec<Notification> {
        let file = match std::fs::File::open(path) {
            Ok(f) => f,
            Err(_) => return Vec::new(),
        };

        let reader = BufReader::new(file);
        let mut events: Vec<Notification> = reader
            .lines()
            .filter_map(|line| line.ok())
            .filter_map(|line| serde_json::from_str(&line).ok())
            .collect();

        if events.len() > limit {
            events.drain(0..events.len() - limit);
        }

        events
    }
}

impl Notifier for JsonlNotifier {
    fn notify(&mut self, notification: &Notification) -> Result<(), NotifyError> {
        if let Some(parent) = self.events_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.events_path)?;

        let line = serde_json::to_string(notification)?;
        writeln!(file, "{}", line)?;

        Ok(())
    }
}

/// Delivers to every sink; reports the first failure after trying them all.
#[derive(Default)]
pub struct FanoutNotifier {
    sinks: Vec<Box<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl Notifier + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl Notifier for FanoutNotifier {
    fn notify(&mut self, notification: &Notification) -> Result<(), NotifyError> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(err) = sink.notify(notification) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

/// Scheduler status snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub connected: bool,
    pub tick: u64,
    pub current: Option<CurrentBehavior>,
    pub suspended: Vec<CurrentBehavior>,
    pub modes: ModeFlags,
    pub tasks: Vec<Task>,
}

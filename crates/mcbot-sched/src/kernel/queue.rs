//! Task backlog ordered by (priority, arrival).

use std::fmt;

use chrono::{DateTime, Utc};
use mcbot_core::{BehaviorKind, BehaviorSpec, InstanceId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting in the backlog.
    Pending,
    /// Its instance holds the active slot.
    Running,
    /// Its instance was preempted and sits on the suspension stack.
    Suspended,
}

/// Who asked for a task. Mode-owned tasks feed back into their mode flag when they end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOrigin {
    Command,
    FollowMode,
    MiningMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub kind: BehaviorKind,
    pub spec: BehaviorSpec,
    pub priority: i32,
    pub status: TaskStatus,
    pub origin: TaskOrigin,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<InstanceId>,
    #[serde(skip)]
    seq: u64,
}

/// Backlog plus promoted tasks, kept sorted by (priority asc, arrival asc).
///
/// Promoted tasks stay in the list with a non-pending status so `list_tasks` can show them and a
/// disconnect can put them back without losing their place.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: Vec<Task>,
    next_id: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, spec: BehaviorSpec, priority: i32, origin: TaskOrigin) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        let task = Task {
            id,
            kind: spec.kind(),
            spec,
            priority,
            status: TaskStatus::Pending,
            origin,
            created_at: Utc::now(),
            instance: None,
            seq: self.next_id,
        };
        let at = self
            .tasks
            .partition_point(|t| (t.priority, t.seq) <= (priority, task.seq));
        self.tasks.insert(at, task);
        id
    }

    /// Strongest task still waiting for the slot.
    pub fn head_pending(&self) -> Option<&Task> {
        self.tasks.iter().find(|t| t.status == TaskStatus::Pending)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn by_instance(&self, instance: InstanceId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.instance == Some(instance))
    }

    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(idx))
    }

    pub fn remove_by_instance(&mut self, instance: InstanceId) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.instance == Some(instance))?;
        Some(self.tasks.remove(idx))
    }

    pub fn mark_running(&mut self, id: TaskId, instance: InstanceId) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            task.status = TaskStatus::Running;
            task.instance = Some(instance);
        }
    }

    pub fn set_instance_status(&mut self, instance: InstanceId, status: TaskStatus) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.instance == Some(instance)) {
            task.status = status;
        }
    }

    /// Put every promoted task back in the backlog. Returns how many were requeued.
    pub fn requeue_promoted(&mut self) -> usize {
        let mut count = 0;
        for task in self
            .tasks
            .iter_mut()
            .filter(|t| t.status != TaskStatus::Pending)
        {
            task.status = TaskStatus::Pending;
            task.instance = None;
            count += 1;
        }
        count
    }

    pub fn has_pending(&self) -> bool {
        self.head_pending().is_some()
    }

    pub fn has_origin(&self, origin: TaskOrigin) -> bool {
        self.tasks.iter().any(|t| t.origin == origin)
    }

    /// Ids of tasks from `origin`, strongest first.
    pub fn ids_with_origin(&self, origin: TaskOrigin) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|t| t.origin == origin)
            .map(|t| t.id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

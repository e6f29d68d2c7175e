//! Command surface - JSON requests in, structured responses out.
//!
//! Every request gets a response. Scheduler refusals and argument errors come back with
//! `status: error`; nothing here panics or propagates.

use std::fmt;
use std::str::FromStr;

use mcbot_core::{BehaviorKind, BehaviorSpec, InstanceId, NavWorld, TickContext};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{Scheduler, SchedulerError, TaskId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub kind: String,
    #[serde(default)]
    pub arguments: Value,
}

impl CommandRequest {
    /// New request with a fresh correlation id.
    pub fn new(kind: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: Some(Uuid::new_v4().to_string()),
            kind: kind.into(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    StartBehavior,
    Stop,
    Status,
    SetCombatMode,
    SetFollowMode,
    SetMiningMode,
    SetPriority,
    AddTask,
    CancelTask,
    ListTasks,
    Priorities,
}

impl CommandKind {
    pub const ALL: [CommandKind; 11] = [
        CommandKind::StartBehavior,
        CommandKind::Stop,
        CommandKind::Status,
        CommandKind::SetCombatMode,
        CommandKind::SetFollowMode,
        CommandKind::SetMiningMode,
        CommandKind::SetPriority,
        CommandKind::AddTask,
        CommandKind::CancelTask,
        CommandKind::ListTasks,
        CommandKind::Priorities,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::StartBehavior => "start_behavior",
            CommandKind::Stop => "stop",
            CommandKind::Status => "status",
            CommandKind::SetCombatMode => "set_combat_mode",
            CommandKind::SetFollowMode => "set_follow_mode",
            CommandKind::SetMiningMode => "set_mining_mode",
            CommandKind::SetPriority => "set_priority",
            CommandKind::AddTask => "add_task",
            CommandKind::CancelTask => "cancel_task",
            CommandKind::ListTasks => "list_tasks",
            CommandKind::Priorities => "priorities",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CommandKind {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| SchedulerError::UnknownCommand(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub id: Option<String>,
    pub status: CommandStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CommandResponse {
    pub fn success(id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            id,
            status: CommandStatus::Success,
            message: message.into(),
            data: None,
        }
    }

    pub fn error(id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            id,
            status: CommandStatus::Error,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Success
    }
}

#[derive(Debug, Deserialize)]
struct StartArgs {
    behavior: BehaviorSpec,
    #[serde(default)]
    then: Option<BehaviorSpec>,
}

#[derive(Debug, Deserialize)]
struct StopArgs {
    #[serde(default)]
    instance: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ToggleArgs {
    enabled: bool,
}

#[derive(Debug, Deserialize)]
struct FollowArgs {
    enabled: bool,
    #[serde(default)]
    player: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MiningArgs {
    enabled: bool,
    #[serde(default)]
    block: Option<String>,
    #[serde(default)]
    quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PriorityArgs {
    behavior: BehaviorKind,
    priority: i32,
}

#[derive(Debug, Deserialize)]
struct AddTaskArgs {
    behavior: BehaviorSpec,
    #[serde(default)]
    priority: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct CancelArgs {
    task: u64,
}

/// Missing arguments parse as an empty object so all-optional shapes accept them.
fn parse_args<T: DeserializeOwned>(arguments: &Value) -> Result<T, SchedulerError> {
    let value = if arguments.is_null() {
        Value::Object(Default::default())
    } else {
        arguments.clone()
    };
    Ok(serde_json::from_value(value)?)
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, SchedulerError> {
    Ok(serde_json::to_value(value)?)
}

impl<W> Scheduler<W>
where
    W: NavWorld + 'static,
{
    /// Run one command against the scheduler.
    pub fn handle_command(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        request: CommandRequest,
    ) -> CommandResponse {
        let id = request.id.clone();
        match self.dispatch(ctx, world, &request) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(command = %request.kind, error = %err, "command failed");
                CommandResponse::error(id, err.to_string())
            }
        }
    }

    fn dispatch(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        request: &CommandRequest,
    ) -> Result<CommandResponse, SchedulerError> {
        let kind: CommandKind = request.kind.parse()?;
        let id = request.id.clone();
        tracing::debug!(command = %kind, id = ?id, "handling command");

        let response = match kind {
            CommandKind::StartBehavior => {
                let args: StartArgs = parse_args(&request.arguments)?;
                let behavior = args.behavior.kind();
                if self.start_behavior(ctx, world, args.behavior, args.then) {
                    CommandResponse::success(id, format!("{behavior} started")).with_data(json!({
                        "instance": self.current_instance(),
                    }))
                } else {
                    CommandResponse::error(id, format!("{behavior} was not started"))
                }
            }
            CommandKind::Stop => {
                let args: StopArgs = parse_args(&request.arguments)?;
                let instance = args.instance.map(InstanceId);
                if self.stop_current_behavior(world, instance) {
                    CommandResponse::success(id, "stopped")
                } else {
                    CommandResponse::error(id, "nothing to stop")
                }
            }
            CommandKind::Status => {
                CommandResponse::success(id, "status").with_data(to_value(&self.status())?)
            }
            CommandKind::SetCombatMode => {
                let args: ToggleArgs = parse_args(&request.arguments)?;
                self.set_combat_mode(ctx, world, args.enabled);
                CommandResponse::success(id, format!("combat mode {}", on_off(args.enabled)))
            }
            CommandKind::SetFollowMode => {
                let args: FollowArgs = parse_args(&request.arguments)?;
                let player = if args.enabled {
                    Some(
                        args.player
                            .filter(|p| !p.is_empty())
                            .ok_or(SchedulerError::MissingArgument("player"))?,
                    )
                } else {
                    None
                };
                self.set_follow_mode(ctx, world, player);
                CommandResponse::success(id, format!("follow mode {}", on_off(args.enabled)))
            }
            CommandKind::SetMiningMode => {
                let args: MiningArgs = parse_args(&request.arguments)?;
                let options = if args.enabled {
                    let mut options = self.config().mining.clone();
                    options.block = args
                        .block
                        .filter(|b| !b.is_empty())
                        .ok_or(SchedulerError::MissingArgument("block"))?;
                    if let Some(quantity) = args.quantity {
                        options.quantity = quantity;
                    }
                    Some(options)
                } else {
                    None
                };
                self.set_mining_mode(ctx, world, options);
                CommandResponse::success(id, format!("mining mode {}", on_off(args.enabled)))
            }
            CommandKind::SetPriority => {
                let args: PriorityArgs = parse_args(&request.arguments)?;
                self.set_behavior_priority(args.behavior, args.priority)?;
                CommandResponse::success(
                    id,
                    format!("{} priority set to {}", args.behavior, args.priority),
                )
            }
            CommandKind::AddTask => {
                let args: AddTaskArgs = parse_args(&request.arguments)?;
                let task = self.add_task(ctx, world, args.behavior, args.priority)?;
                CommandResponse::success(id, format!("{task} queued"))
                    .with_data(json!({ "task_id": task }))
            }
            CommandKind::CancelTask => {
                let args: CancelArgs = parse_args(&request.arguments)?;
                let task = TaskId(args.task);
                self.cancel_task(world, task)?;
                CommandResponse::success(id, format!("{task} cancelled"))
            }
            CommandKind::ListTasks => CommandResponse::success(id, "tasks")
                .with_data(json!({ "tasks": to_value(&self.tasks())? })),
            CommandKind::Priorities => {
                let ranked: serde_json::Map<String, Value> = self
                    .priorities()
                    .ranked()
                    .into_iter()
                    .map(|(kind, value)| (kind.to_string(), json!(value)))
                    .collect();
                CommandResponse::success(id, "priorities").with_data(Value::Object(ranked))
            }
        };
        Ok(response)
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}

//! Scheduler - owns the active slot, the suspension stack and every behavior instance.
//!
//! Decision rules for a start request of kind K with priority P:
//!
//! 1. empty slot (or the Idle filler): start K;
//! 2. K already active: stop the active instance, then start K with the new options;
//! 3. P strictly stronger than the active priority and the active behavior does not veto: pause the
//!    active instance, push it on the stack, start K;
//! 4. otherwise reject and leave everything untouched.
//!
//! When the active instance finishes on its own the slot is refilled from, in order: its
//! continuation, the suspension stack, the task backlog, the standing modes, and finally Idle.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use mcbot_behaviors::StandardFactory;
use mcbot_core::{
    Behavior, BehaviorFactory, BehaviorKind, BehaviorSpec, BehaviorStatus, InstanceId, Lifecycle,
    MineOptions, NavWorld, Outcome, TickContext,
};
use serde::Serialize;

use super::{ModeFlags, Task, TaskId, TaskOrigin, TaskQueue, TaskStatus};
use crate::observability::{
    Notification, NotificationKind, Notifier, NullNotifier, StatusSnapshot,
};
use crate::priority::MAX_PRIORITY;
use crate::{PriorityTable, SchedulerConfig, SchedulerError};

/// Status view of one instance, active or suspended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentBehavior {
    pub instance: InstanceId,
    pub kind: BehaviorKind,
    pub target: Option<String>,
    pub lifecycle: Lifecycle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskId>,
}

struct Slot<W>
where
    W: NavWorld + 'static,
{
    instance: InstanceId,
    kind: BehaviorKind,
    behavior: Box<dyn Behavior<W>>,
}

#[derive(Debug, Clone, PartialEq)]
struct Completion {
    instance: InstanceId,
    outcome: Outcome,
}

struct StartRequest {
    spec: BehaviorSpec,
    priority: i32,
    on_complete: Option<BehaviorSpec>,
    /// Skip the priority comparison. The active behavior's veto still applies.
    force: bool,
    task: Option<TaskId>,
}

#[derive(Debug, Clone, PartialEq)]
enum Refusal {
    Disconnected,
    Outranked { active: BehaviorKind, priority: i32 },
    Vetoed(BehaviorKind),
    StartFailed,
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Refusal::Disconnected => f.write_str("agent is disconnected"),
            Refusal::Outranked { active, priority } => {
                write!(f, "{active} (priority {priority}) is not outranked")
            }
            Refusal::Vetoed(active) => write!(f, "{active} refuses to be interrupted"),
            Refusal::StartFailed => f.write_str("behavior preconditions not met"),
        }
    }
}

enum Displace {
    Nothing,
    Idle,
    Override,
    Preempt,
}

pub struct Scheduler<W>
where
    W: NavWorld + 'static,
{
    config: SchedulerConfig,
    priorities: PriorityTable,
    factory: Box<dyn BehaviorFactory<W>>,
    notifier: Box<dyn Notifier>,

    active: Option<Slot<W>>,
    /// Paused instances, most recently preempted last. At most one per kind.
    stack: Vec<Slot<W>>,
    continuations: HashMap<InstanceId, BehaviorSpec>,
    completions: VecDeque<Completion>,
    queue: TaskQueue,
    modes: ModeFlags,

    monitor_every: u64,
    next_instance: u64,
    connected: bool,
    last_tick: u64,
}

impl<W> Scheduler<W>
where
    W: NavWorld + 'static,
{
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_factory(config, StandardFactory)
    }

    pub fn with_factory(config: SchedulerConfig, factory: impl BehaviorFactory<W>) -> Self {
        Self {
            priorities: PriorityTable::with_valid_overrides(&config.priorities),
            monitor_every: config.monitor_every_ticks(),
            config,
            factory: Box::new(factory),
            notifier: Box::new(NullNotifier),
            active: None,
            stack: Vec::new(),
            continuations: HashMap::new(),
            completions: VecDeque::new(),
            queue: TaskQueue::new(),
            modes: ModeFlags::default(),
            next_instance: 0,
            connected: true,
            last_tick: 0,
        }
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn priorities(&self) -> &PriorityTable {
        &self.priorities
    }

    pub fn modes(&self) -> &ModeFlags {
        &self.modes
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Backlog and promoted tasks, strongest first.
    pub fn tasks(&self) -> Vec<Task> {
        self.queue.iter().cloned().collect()
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.queue.get(id)
    }

    pub fn current_behavior(&self) -> Option<CurrentBehavior> {
        self.active.as_ref().map(|slot| self.describe(slot))
    }

    pub fn current_instance(&self) -> Option<InstanceId> {
        self.active.as_ref().map(|slot| slot.instance)
    }

    /// Suspended instances, bottom of the stack first.
    pub fn suspended(&self) -> Vec<CurrentBehavior> {
        self.stack.iter().map(|slot| self.describe(slot)).collect()
    }

    pub fn has_continuation(&self, instance: InstanceId) -> bool {
        self.continuations.contains_key(&instance)
    }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            connected: self.connected,
            tick: self.last_tick,
            current: self.current_behavior(),
            suspended: self.suspended(),
            modes: self.modes.clone(),
            tasks: self.tasks(),
        }
    }

    /// Request `spec` under the decision rules. `on_complete` runs when the new instance finishes on
    /// its own; it is dropped if the instance is stopped instead.
    pub fn start_behavior(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        spec: BehaviorSpec,
        on_complete: Option<BehaviorSpec>,
    ) -> bool {
        let kind = spec.kind();
        let request = StartRequest {
            spec,
            priority: self.priorities.get(kind),
            on_complete,
            force: false,
            task: None,
        };
        match self.try_start(ctx, world, request) {
            Ok(_) => true,
            Err(refusal) => {
                self.reject(kind, None, &refusal);
                false
            }
        }
    }

    /// Stop `instance`, or the active behavior when `None`.
    ///
    /// Only the untargeted form clears the slot right away. A targeted stop of the active instance
    /// leaves it in place as `Done`; the next decision drops it without further bookkeeping.
    pub fn stop_current_behavior(&mut self, world: &mut W, instance: Option<InstanceId>) -> bool {
        let Some(id) = instance else {
            self.drop_stopped_active();
            return match self.active.take() {
                Some(slot) if slot.kind != BehaviorKind::Idle => {
                    self.retire(world, slot, "stopped on request");
                    true
                }
                other => {
                    self.active = other;
                    false
                }
            };
        };

        if let Some(slot) = self.active.as_mut().filter(|s| s.instance == id) {
            if slot.behavior.lifecycle() != Lifecycle::Done {
                slot.behavior.stop(world);
                let kind = slot.kind;
                self.release(id, kind, "stopped on request");
                return true;
            }
            return false;
        }
        self.stop_suspended(world, id, "stopped on request")
    }

    /// Queue an external completion signal for `instance`. Processed on the next tick; ignored if
    /// the instance is no longer active by then.
    pub fn signal_completion(&mut self, instance: InstanceId, outcome: Outcome) {
        self.completions.push_back(Completion { instance, outcome });
    }

    pub fn set_behavior_priority(
        &mut self,
        kind: BehaviorKind,
        value: i32,
    ) -> Result<(), SchedulerError> {
        let previous = self.priorities.set(kind, value)?;
        tracing::info!(kind = %kind, previous, value, "priority updated");
        Ok(())
    }

    pub fn set_combat_mode(&mut self, ctx: &TickContext, world: &mut W, enabled: bool) {
        if self.modes.combat != enabled {
            self.modes.combat = enabled;
            self.mode_changed(format!("combat mode {}", on_off(enabled)));
        }

        self.drop_stopped_active();
        if enabled {
            self.check_combat(ctx, world);
        } else if self.active_kind() == Some(BehaviorKind::Combat) {
            if let Some(slot) = self.active.take() {
                self.retire(world, slot, "combat mode disabled");
            }
            self.refill(ctx, world);
        }
    }

    /// Follow `player`, or turn follow mode off with `None`.
    pub fn set_follow_mode(&mut self, ctx: &TickContext, world: &mut W, player: Option<String>) {
        match player {
            Some(player) => {
                if self.modes.follow.as_deref() != Some(player.as_str()) {
                    self.drop_mode_tasks(world, TaskOrigin::FollowMode, "follow target changed");
                    self.mode_changed(format!("follow mode on: {player}"));
                    self.modes.follow = Some(player);
                }
                self.ensure_follow_task(ctx, world, false);
                self.refill(ctx, world);
            }
            None => {
                if self.modes.follow.take().is_some() {
                    self.mode_changed("follow mode off".to_string());
                }
                self.drop_mode_tasks(world, TaskOrigin::FollowMode, "follow mode disabled");
                self.drop_stopped_active();
                if self.active_kind() == Some(BehaviorKind::FollowPlayer) {
                    if let Some(slot) = self.active.take() {
                        self.retire(world, slot, "follow mode disabled");
                    }
                }
                self.refill(ctx, world);
            }
        }
    }

    /// Mine with `options`, or turn mining mode off with `None`. Enabling replaces any earlier
    /// mining request.
    pub fn set_mining_mode(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        options: Option<MineOptions>,
    ) {
        self.drop_mode_tasks(world, TaskOrigin::MiningMode, "mining mode changed");
        match options {
            Some(options) => {
                self.mode_changed(format!(
                    "mining mode on: {} x{}",
                    options.block, options.quantity
                ));
                self.modes.mining = Some(options.clone());
                self.enqueue(
                    ctx,
                    world,
                    BehaviorSpec::MineBlock(options),
                    None,
                    TaskOrigin::MiningMode,
                );
            }
            None => {
                if self.modes.mining.take().is_some() {
                    self.mode_changed("mining mode off".to_string());
                }
            }
        }
        self.refill(ctx, world);
    }

    /// Queue `spec`. Promoted at once when it outranks the active behavior.
    pub fn add_task(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        spec: BehaviorSpec,
        priority: Option<i32>,
    ) -> Result<TaskId, SchedulerError> {
        if let Some(value) = priority {
            if !(0..=MAX_PRIORITY).contains(&value) {
                return Err(SchedulerError::InvalidPriority {
                    kind: spec.kind(),
                    value,
                    max: MAX_PRIORITY,
                });
            }
        }
        Ok(self.enqueue(ctx, world, spec, priority, TaskOrigin::Command))
    }

    /// Remove a pending task, or stop the instance a promoted task is running as.
    pub fn cancel_task(&mut self, world: &mut W, id: TaskId) -> Result<(), SchedulerError> {
        let Some(task) = self.queue.get(id) else {
            return Err(SchedulerError::UnknownTask(id));
        };

        match task.instance {
            Some(instance) if task.status != TaskStatus::Pending => {
                self.stop_current_behavior(world, Some(instance));
            }
            _ => {
                if let Some(task) = self.queue.remove(id) {
                    tracing::info!(task = %id, kind = %task.kind, "task cancelled");
                    self.emit(
                        Notification::new(NotificationKind::TaskCancelled, "cancelled on request")
                            .kind(task.kind)
                            .task(Some(id)),
                    );
                    self.task_ended(&task);
                }
            }
        }
        Ok(())
    }

    /// Advance the active behavior and make every decision due this tick.
    pub fn tick(&mut self, ctx: &TickContext, world: &mut W) {
        self.last_tick = ctx.tick;

        if !world.is_connected() {
            if self.connected {
                self.handle_disconnect(world);
            }
            return;
        }

        let reconnected = !self.connected;
        if reconnected {
            self.connected = true;
            tracing::info!("connection restored, re-deriving modes");
            self.emit(Notification::new(
                NotificationKind::Reconnected,
                "connection restored",
            ));
        }

        self.tick_active(ctx, world);
        self.drain_completions(ctx, world);
        self.refill(ctx, world);

        if reconnected || ctx.tick % self.monitor_every == 0 {
            self.monitor(ctx, world);
        }
    }

    fn tick_active(&mut self, ctx: &TickContext, world: &mut W) {
        if self.drop_stopped_active() {
            return;
        }
        let Some(slot) = self.active.as_mut() else {
            return;
        };
        if let BehaviorStatus::Done(outcome) = slot.behavior.tick(ctx, world) {
            let instance = slot.instance;
            self.completions.push_back(Completion { instance, outcome });
        }
    }

    fn drain_completions(&mut self, ctx: &TickContext, world: &mut W) {
        while let Some(completion) = self.completions.pop_front() {
            let is_active = self
                .active
                .as_ref()
                .is_some_and(|slot| slot.instance == completion.instance);
            if !is_active {
                tracing::debug!(instance = %completion.instance, "discarding stale completion");
                continue;
            }
            let Some(mut slot) = self.active.take() else {
                continue;
            };
            if slot.behavior.lifecycle() != Lifecycle::Done {
                slot.behavior.stop(world);
            }
            self.handle_completion(ctx, world, slot, completion.outcome);
        }
    }

    fn handle_completion(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        slot: Slot<W>,
        outcome: Outcome,
    ) {
        let Slot {
            instance,
            kind,
            behavior,
        } = slot;
        let task = self.queue.remove_by_instance(instance);

        tracing::info!(kind = %kind, instance = %instance, outcome = %outcome, "behavior finished");
        self.emit(
            Notification::new(NotificationKind::BehaviorCompleted, outcome.to_string())
                .behavior(kind, instance)
                .task(task.as_ref().map(|t| t.id)),
        );

        if let (Outcome::PreconditionFailed(_), BehaviorSpec::FollowPlayer(options)) =
            (&outcome, behavior.options())
        {
            if self.modes.follow.as_deref() == Some(options.player.as_str()) {
                self.modes.follow = None;
                self.mode_changed(format!("follow mode off: {} is gone", options.player));
            }
        }
        if let Some(task) = task {
            self.task_ended(&task);
        }

        if let Some(next) = self.continuations.remove(&instance) {
            let next_kind = next.kind();
            let request = StartRequest {
                spec: next,
                priority: self.priorities.get(next_kind),
                on_complete: None,
                force: false,
                task: None,
            };
            if let Err(refusal) = self.try_start(ctx, world, request) {
                self.reject(next_kind, None, &refusal);
            }
        }
    }

    /// Periodic checks: combat trigger, backlog promotion, follow reinstatement.
    fn monitor(&mut self, ctx: &TickContext, world: &mut W) {
        self.check_combat(ctx, world);
        self.promote_queue(ctx, world);
        self.ensure_follow_task(ctx, world, true);
    }

    /// Fill an empty slot: stack, backlog, modes, then Idle.
    fn refill(&mut self, ctx: &TickContext, world: &mut W) {
        self.drop_stopped_active();
        if self.active.is_some() || !self.connected {
            return;
        }
        if self.resume_stacked(ctx, world) || self.promote_queue(ctx, world) {
            return;
        }
        self.check_combat(ctx, world);
        self.ensure_follow_task(ctx, world, true);
        if self.active.is_none() {
            self.install_idle(ctx, world);
        }
    }

    fn try_start(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        request: StartRequest,
    ) -> Result<InstanceId, Refusal> {
        let kind = request.spec.kind();
        if !self.connected || !world.is_connected() {
            return Err(Refusal::Disconnected);
        }
        self.drop_stopped_active();

        let displace = match &self.active {
            None => Displace::Nothing,
            Some(slot) if slot.kind == BehaviorKind::Idle => Displace::Idle,
            Some(slot) if slot.kind == kind => Displace::Override,
            Some(slot) => {
                let active_priority = self.slot_priority(slot);
                if !request.force && request.priority >= active_priority {
                    return Err(Refusal::Outranked {
                        active: slot.kind,
                        priority: active_priority,
                    });
                }
                if !slot.behavior.can_be_interrupted_by(kind) {
                    return Err(Refusal::Vetoed(slot.kind));
                }
                Displace::Preempt
            }
        };

        match displace {
            Displace::Override => {
                if let Some(old) = self.active.take() {
                    tracing::info!(kind = %kind, instance = %old.instance, "overriding active behavior");
                    self.retire(world, old, "overridden by a new request");
                }
            }
            Displace::Preempt => {
                if let Some(mut old) = self.active.take() {
                    old.behavior.pause(world);
                    self.queue
                        .set_instance_status(old.instance, TaskStatus::Suspended);
                    tracing::info!(
                        paused = %old.kind,
                        instance = %old.instance,
                        by = %kind,
                        "preempting active behavior"
                    );
                    let task = self.queue.by_instance(old.instance).map(|t| t.id);
                    self.emit(
                        Notification::new(
                            NotificationKind::BehaviorInterrupted,
                            format!("{} preempted by {}", old.kind, kind),
                        )
                        .behavior(old.kind, old.instance)
                        .task(task),
                    );
                    self.stack.push(old);
                }
            }
            Displace::Nothing | Displace::Idle => {}
        }

        let instance = self.allocate_instance();
        let mut behavior = self.factory.build(&request.spec);
        if !behavior.start(ctx, world) {
            tracing::warn!(kind = %kind, instance = %instance, "behavior failed to start");
            if self.active.is_none() {
                self.resume_stacked(ctx, world);
            }
            return Err(Refusal::StartFailed);
        }

        // Only the Idle filler can still occupy the slot here.
        if let Some(mut idle) = self.active.take() {
            idle.behavior.stop(world);
        }
        self.purge_stacked(world, kind);

        if let Some(next) = request.on_complete {
            self.continuations.insert(instance, next);
        }
        if let Some(task) = request.task {
            self.queue.mark_running(task, instance);
        }

        let target = behavior.target();
        tracing::info!(kind = %kind, instance = %instance, target = ?target, "behavior started");
        self.emit(
            Notification::new(
                NotificationKind::BehaviorStarted,
                target.unwrap_or_else(|| kind.to_string()),
            )
            .behavior(kind, instance)
            .task(request.task),
        );
        self.active = Some(Slot {
            instance,
            kind,
            behavior,
        });
        Ok(instance)
    }

    /// Promote the strongest pending task if it may take the slot. Tasks whose behavior cannot
    /// start are dropped.
    fn promote_queue(&mut self, ctx: &TickContext, world: &mut W) -> bool {
        self.drop_stopped_active();
        loop {
            let Some(head) = self.queue.head_pending() else {
                return false;
            };
            let (id, spec, priority) = (head.id, head.spec.clone(), head.priority);

            let due = match &self.active {
                None => true,
                Some(slot) => {
                    slot.kind == BehaviorKind::Idle || priority < self.slot_priority(slot)
                }
            };
            if !due {
                return false;
            }

            let kind = spec.kind();
            let request = StartRequest {
                spec,
                priority,
                on_complete: None,
                force: false,
                task: Some(id),
            };
            match self.try_start(ctx, world, request) {
                Ok(instance) => {
                    tracing::debug!(task = %id, instance = %instance, "task promoted");
                    return true;
                }
                Err(Refusal::StartFailed) => {
                    if let Some(task) = self.queue.remove(id) {
                        self.reject(kind, Some(id), &Refusal::StartFailed);
                        self.task_ended(&task);
                    }
                }
                Err(refusal) => {
                    tracing::debug!(task = %id, reason = %refusal, "task promotion deferred");
                    return false;
                }
            }
        }
    }

    fn check_combat(&mut self, ctx: &TickContext, world: &mut W) -> bool {
        self.drop_stopped_active();
        if !self.modes.combat || self.active_kind() == Some(BehaviorKind::Combat) {
            return false;
        }
        let Some(position) = world.position() else {
            return false;
        };
        let Some(hostile) = world.nearest_hostile(position, self.config.combat.detection_range)
        else {
            return false;
        };

        let critical = world.health() <= self.config.combat.critical_health;
        let priority = self.priorities.get(BehaviorKind::Combat);
        let outranks = match &self.active {
            None => true,
            Some(slot) => slot.kind == BehaviorKind::Idle || priority < self.slot_priority(slot),
        };
        if !outranks && !critical {
            return false;
        }

        let request = StartRequest {
            spec: BehaviorSpec::Combat(self.config.combat.options.clone()),
            priority,
            on_complete: None,
            force: critical,
            task: None,
        };
        match self.try_start(ctx, world, request) {
            Ok(instance) => {
                tracing::info!(
                    hostile = %hostile.name,
                    instance = %instance,
                    critical,
                    "combat triggered"
                );
                true
            }
            Err(refusal) => {
                tracing::debug!(reason = %refusal, "combat trigger deferred");
                false
            }
        }
    }

    /// Queue a follow task for follow mode unless one already exists. With `idle_backlog_only`
    /// the task is only synthesized when nothing else is waiting.
    fn ensure_follow_task(&mut self, ctx: &TickContext, world: &mut W, idle_backlog_only: bool) {
        let Some(player) = self.modes.follow.clone() else {
            return;
        };
        if idle_backlog_only && self.queue.has_pending() {
            return;
        }
        let following = self.active_kind() == Some(BehaviorKind::FollowPlayer)
            || self
                .stack
                .iter()
                .any(|slot| slot.kind == BehaviorKind::FollowPlayer);
        if following || self.queue.has_origin(TaskOrigin::FollowMode) {
            return;
        }

        let mut options = self.config.follow.clone();
        options.player = player;
        self.enqueue(
            ctx,
            world,
            BehaviorSpec::FollowPlayer(options),
            None,
            TaskOrigin::FollowMode,
        );
    }

    fn enqueue(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        spec: BehaviorSpec,
        priority: Option<i32>,
        origin: TaskOrigin,
    ) -> TaskId {
        let kind = spec.kind();
        let priority = priority.unwrap_or_else(|| self.priorities.get(kind));
        let id = self.queue.push(spec, priority, origin);
        tracing::info!(task = %id, kind = %kind, priority, ?origin, "task queued");
        self.emit(
            Notification::new(NotificationKind::TaskQueued, format!("priority {priority}"))
                .kind(kind)
                .task(Some(id)),
        );
        self.promote_queue(ctx, world);
        id
    }

    fn handle_disconnect(&mut self, world: &mut W) {
        if let Some(mut slot) = self.active.take() {
            slot.behavior.stop(world);
        }
        for mut slot in self.stack.drain(..) {
            slot.behavior.stop(world);
        }
        self.continuations.clear();
        self.completions.clear();
        let requeued = self.queue.requeue_promoted();
        self.connected = false;

        tracing::warn!(requeued, "connection lost, all behaviors stopped");
        self.emit(Notification::new(
            NotificationKind::Disconnected,
            format!("connection lost; {requeued} task(s) requeued"),
        ));
    }

    fn resume_stacked(&mut self, ctx: &TickContext, world: &mut W) -> bool {
        while let Some(mut slot) = self.stack.pop() {
            if slot.behavior.resume(ctx, world) {
                self.queue
                    .set_instance_status(slot.instance, TaskStatus::Running);
                tracing::info!(kind = %slot.kind, instance = %slot.instance, "behavior resumed");
                let task = self.queue.by_instance(slot.instance).map(|t| t.id);
                self.emit(
                    Notification::new(NotificationKind::BehaviorResumed, "resumed from stack")
                        .behavior(slot.kind, slot.instance)
                        .task(task),
                );
                self.active = Some(slot);
                return true;
            }
            tracing::warn!(kind = %slot.kind, instance = %slot.instance, "suspended behavior could not resume");
            self.retire(world, slot, "could not resume");
        }
        false
    }

    fn install_idle(&mut self, ctx: &TickContext, world: &mut W) {
        let instance = self.allocate_instance();
        let mut behavior = self.factory.build(&BehaviorSpec::Idle);
        if behavior.start(ctx, world) {
            tracing::debug!(instance = %instance, "slot idle");
            self.active = Some(Slot {
                instance,
                kind: BehaviorKind::Idle,
                behavior,
            });
        }
    }

    /// Stop and drop stacked instances of `kind`; a new instance of it just started.
    fn purge_stacked(&mut self, world: &mut W, kind: BehaviorKind) {
        let mut idx = 0;
        while idx < self.stack.len() {
            if self.stack[idx].kind == kind {
                let slot = self.stack.remove(idx);
                self.retire(world, slot, "replaced by a newer instance");
            } else {
                idx += 1;
            }
        }
    }

    fn stop_suspended(&mut self, world: &mut W, instance: InstanceId, reason: &str) -> bool {
        let Some(idx) = self.stack.iter().position(|s| s.instance == instance) else {
            return false;
        };
        let slot = self.stack.remove(idx);
        self.retire(world, slot, reason);
        true
    }

    /// Stop every instance and pending task that belongs to a mode.
    fn drop_mode_tasks(&mut self, world: &mut W, origin: TaskOrigin, reason: &str) {
        for id in self.queue.ids_with_origin(origin) {
            let Some(task) = self.queue.get(id) else {
                continue;
            };
            match task.instance {
                Some(instance) if self.current_instance() == Some(instance) => {
                    if let Some(slot) = self.active.take() {
                        self.retire(world, slot, reason);
                    }
                }
                Some(instance) if task.status == TaskStatus::Suspended => {
                    self.stop_suspended(world, instance, reason);
                }
                _ => {
                    if let Some(task) = self.queue.remove(id) {
                        self.emit(
                            Notification::new(NotificationKind::TaskCancelled, reason)
                                .kind(task.kind)
                                .task(Some(id)),
                        );
                        self.task_ended(&task);
                    }
                }
            }
        }
    }

    /// Empty the slot if its instance was stopped by id. Its bookkeeping already ran.
    fn drop_stopped_active(&mut self) -> bool {
        let stopped = self
            .active
            .as_ref()
            .is_some_and(|slot| slot.behavior.lifecycle() == Lifecycle::Done);
        if stopped {
            self.active = None;
        }
        stopped
    }

    fn retire(&mut self, world: &mut W, mut slot: Slot<W>, reason: &str) {
        slot.behavior.stop(world);
        self.release(slot.instance, slot.kind, reason);
    }

    /// Bookkeeping for a stopped instance: its continuation and task go away.
    fn release(&mut self, instance: InstanceId, kind: BehaviorKind, reason: &str) {
        self.continuations.remove(&instance);
        let task = self.queue.remove_by_instance(instance);
        tracing::info!(kind = %kind, instance = %instance, reason, "behavior stopped");
        self.emit(
            Notification::new(NotificationKind::BehaviorStopped, reason)
                .behavior(kind, instance)
                .task(task.as_ref().map(|t| t.id)),
        );
        if let Some(task) = task {
            self.task_ended(&task);
        }
    }

    /// A task left the queue for good.
    fn task_ended(&mut self, task: &Task) {
        if task.origin == TaskOrigin::MiningMode && self.modes.mining.take().is_some() {
            self.mode_changed(format!("mining mode off: {} ended", task.id));
        }
    }

    fn reject(&mut self, kind: BehaviorKind, task: Option<TaskId>, refusal: &Refusal) {
        tracing::info!(kind = %kind, reason = %refusal, "behavior request rejected");
        self.emit(
            Notification::new(NotificationKind::Rejected, refusal.to_string())
                .kind(kind)
                .task(task),
        );
    }

    fn mode_changed(&mut self, message: String) {
        tracing::info!(%message, "mode changed");
        self.emit(Notification::new(NotificationKind::ModeChanged, message));
    }

    fn emit(&mut self, notification: Notification) {
        if let Err(err) = self.notifier.notify(&notification) {
            tracing::warn!(
                error = %err,
                event = ?notification.event_type,
                "notification delivery failed"
            );
        }
    }

    fn active_kind(&self) -> Option<BehaviorKind> {
        self.active.as_ref().map(|slot| slot.kind)
    }

    /// Task-owned instances rank by their task's priority, everything else by the live table.
    fn slot_priority(&self, slot: &Slot<W>) -> i32 {
        self.queue
            .by_instance(slot.instance)
            .map(|task| task.priority)
            .unwrap_or_else(|| self.priorities.get(slot.kind))
    }

    fn describe(&self, slot: &Slot<W>) -> CurrentBehavior {
        CurrentBehavior {
            instance: slot.instance,
            kind: slot.kind,
            target: slot.behavior.target(),
            lifecycle: slot.behavior.lifecycle(),
            task: self.queue.by_instance(slot.instance).map(|t| t.id),
        }
    }

    fn allocate_instance(&mut self) -> InstanceId {
        self.next_instance += 1;
        InstanceId(self.next_instance)
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

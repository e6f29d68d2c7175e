use mcbot_core::{
    halt_intents, Behavior, BehaviorKind, BehaviorSpec, BehaviorStatus, CombatOptions, EntityId,
    EntitySnapshot, Lifecycle, MoveDirection, NavWorld, Outcome, PathGoal, TickContext, Vec3,
};

use crate::progress::{attempts_exhausted, StallDetector};

/// Targets closer than this are approached with direct movement instead of a path goal.
const DIRECT_APPROACH_DISTANCE: f64 = 5.0;
/// A different hostile must be this much closer before re-validation switches to it.
const RETARGET_MARGIN: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Approach {
    None,
    Direct,
    Path,
}

/// Acquire a hostile, close in, and strike until it dies.
///
/// The current target is looked up every tick (deaths are noticed at once) but range checks and
/// target switching only happen every `retarget_interval` seconds.
#[derive(Debug)]
pub struct CombatBehavior {
    options: CombatOptions,
    lifecycle: Lifecycle,
    target: Option<EntityId>,
    struck_target: bool,
    kills: u32,
    attempts: u32,
    approach: Approach,
    next_retarget_at: f64,
    next_attack_at: f64,
    stall: StallDetector,
}

impl CombatBehavior {
    pub fn new(options: CombatOptions) -> Self {
        let stall = StallDetector::new(options.stall_seconds);
        Self {
            options,
            lifecycle: Lifecycle::Fresh,
            target: None,
            struck_target: false,
            kills: 0,
            attempts: 0,
            approach: Approach::None,
            next_retarget_at: 0.0,
            next_attack_at: 0.0,
            stall,
        }
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn current_target(&self) -> Option<EntityId> {
        self.target
    }

    fn acquire<W: NavWorld>(&self, world: &W) -> Option<EntitySnapshot> {
        let pos = world.position()?;
        match self.options.target {
            Some(id) => world
                .entity(id)
                .filter(|e| e.is_alive() && pos.distance(e.position) <= self.options.max_distance),
            None => world.nearest_hostile(pos, self.options.max_distance),
        }
    }

    fn engage(&mut self, target: EntityId, now: f64) {
        self.target = Some(target);
        self.struck_target = false;
        self.attempts = 0;
        self.approach = Approach::None;
        self.next_retarget_at = now + self.options.retarget_interval.max(0.0) as f64;
    }

    fn withdraw<W: NavWorld>(&mut self, world: &mut W) {
        if self.approach != Approach::None {
            world.clear_path_goal();
            world.clear_move_intents();
            self.approach = Approach::None;
        }
    }

    fn finish<W: NavWorld>(&mut self, world: &mut W, outcome: Outcome) -> BehaviorStatus {
        halt_intents(world);
        self.lifecycle = Lifecycle::Done;
        tracing::info!(kills = self.kills, outcome = %outcome, "combat finished");
        BehaviorStatus::Done(outcome)
    }

    /// Current target is gone (dead, despawned or out of range): count the kill, then re-acquire
    /// or terminate.
    fn target_lost<W: NavWorld>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        killed: bool,
    ) -> BehaviorStatus {
        if killed {
            self.kills += 1;
            tracing::info!(target = ?self.target, kills = self.kills, "target killed");
        }
        self.target = None;
        self.withdraw(world);

        if self.options.stop_after_kill && self.kills > 0 {
            return self.finish(world, Outcome::Completed);
        }
        match self.acquire(world) {
            Some(next) => {
                tracing::debug!(target = ?next.id, name = %next.name, "combat re-acquired target");
                self.engage(next.id, ctx.seconds());
                BehaviorStatus::Running
            }
            None if self.kills > 0 => self.finish(world, Outcome::Completed),
            None if self.options.target.is_some() => self.finish(
                world,
                Outcome::PreconditionFailed("target is gone".to_string()),
            ),
            None => self.finish(world, Outcome::Exhausted),
        }
    }

    fn revalidate<W: NavWorld>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        self_pos: Vec3,
        target: &EntitySnapshot,
    ) -> Option<BehaviorStatus> {
        let now = ctx.seconds();
        if now < self.next_retarget_at {
            return None;
        }
        self.next_retarget_at = now + self.options.retarget_interval.max(0.0) as f64;

        let distance = self_pos.distance(target.position);
        if distance > self.options.max_distance {
            tracing::debug!(target = ?target.id, distance, "target escaped");
            return Some(self.target_lost(ctx, world, false));
        }

        if self.options.target.is_none() {
            if let Some(closer) = world.nearest_hostile(self_pos, self.options.max_distance) {
                let closer_distance = self_pos.distance(closer.position);
                if closer.id != target.id && closer_distance + RETARGET_MARGIN < distance {
                    tracing::debug!(from = ?target.id, to = ?closer.id, "combat switching target");
                    self.withdraw(world);
                    self.engage(closer.id, now);
                }
            }
        }
        None
    }

    fn approach_target<W: NavWorld>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        target: &EntitySnapshot,
        distance: f64,
    ) -> BehaviorStatus {
        let now = ctx.seconds();

        if distance <= DIRECT_APPROACH_DISTANCE {
            if self.approach == Approach::Path {
                world.clear_path_goal();
            }
            world.face(target.position);
            world.set_move_intent(MoveDirection::Forward, true);
            if self.approach != Approach::Direct {
                self.stall.reset(now, distance);
                self.approach = Approach::Direct;
            }
            return BehaviorStatus::Running;
        }

        let stalled = self.approach == Approach::Path
            && self.stall.observe(now, distance, world.is_pathing());
        if self.approach != Approach::Path || stalled {
            if attempts_exhausted(self.attempts, self.options.max_attempts) {
                return self.finish(world, Outcome::Failed("target unreachable".to_string()));
            }
            self.attempts += 1;
            if self.approach == Approach::Direct {
                world.set_move_intent(MoveDirection::Forward, false);
            }
            world.set_path_goal(PathGoal::Follow {
                entity: target.id,
                range: self.options.attack_range * 0.8,
            });
            self.stall.reset(now, distance);
            self.approach = Approach::Path;
        }
        BehaviorStatus::Running
    }
}

impl<W> Behavior<W> for CombatBehavior
where
    W: NavWorld + 'static,
{
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Combat
    }

    fn options(&self) -> BehaviorSpec {
        BehaviorSpec::Combat(self.options.clone())
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn target(&self) -> Option<String> {
        self.target.map(|id| format!("entity#{}", id.0))
    }

    fn start(&mut self, ctx: &TickContext, world: &mut W) -> bool {
        if self.lifecycle != Lifecycle::Fresh {
            return false;
        }
        let Some(target) = self.acquire(world) else {
            tracing::debug!("combat has no target in range");
            self.lifecycle = Lifecycle::Done;
            return false;
        };
        tracing::info!(target = ?target.id, name = %target.name, "combat engaging");
        self.engage(target.id, ctx.seconds());
        self.lifecycle.try_start()
    }

    fn tick(&mut self, ctx: &TickContext, world: &mut W) -> BehaviorStatus {
        if !self.lifecycle.is_running() {
            return BehaviorStatus::Running;
        }
        let Some(pos) = world.position() else {
            return BehaviorStatus::Running;
        };

        let snapshot = self.target.and_then(|id| world.entity(id));
        let Some(target) = snapshot.filter(|e| e.is_alive()) else {
            let killed = self.struck_target;
            return self.target_lost(ctx, world, killed);
        };

        if let Some(done) = self.revalidate(ctx, world, pos, &target) {
            return done;
        }
        // Re-validation may have switched targets; pick it up next tick.
        if self.target != Some(target.id) {
            return BehaviorStatus::Running;
        }

        let distance = pos.distance(target.position);
        if distance > self.options.attack_range {
            return self.approach_target(ctx, world, &target, distance);
        }

        self.withdraw(world);
        world.face(target.position);
        let now = ctx.seconds();
        if now >= self.next_attack_at {
            world.attack(target.id);
            self.struck_target = true;
            self.next_attack_at = now + self.options.attack_interval.max(0.0) as f64;
        }
        BehaviorStatus::Running
    }

    fn pause(&mut self, world: &mut W) {
        if self.lifecycle.try_pause() {
            halt_intents(world);
            self.approach = Approach::None;
        }
    }

    fn resume(&mut self, ctx: &TickContext, _world: &mut W) -> bool {
        if !self.lifecycle.try_resume() {
            return false;
        }
        self.next_retarget_at = ctx.seconds();
        true
    }

    fn stop(&mut self, world: &mut W) {
        if self.lifecycle.try_stop() {
            halt_intents(world);
        }
    }

    fn can_be_interrupted_by(&self, _other: BehaviorKind) -> bool {
        false
    }
}

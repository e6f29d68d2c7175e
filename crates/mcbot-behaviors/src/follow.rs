use mcbot_core::{
    halt_intents, Behavior, BehaviorKind, BehaviorSpec, BehaviorStatus, EntityId, FollowOptions,
    Lifecycle, NavWorld, Outcome, PathGoal, TickContext,
};

use crate::progress::{attempts_exhausted, StallDetector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FollowState {
    /// Target not visible; waiting for it to show up.
    Watching,
    Pathing,
    /// Within range: no movement, facing the target.
    Holding,
}

/// Keep within `distance_threshold` of a named player.
///
/// Every path request counts as an attempt; arriving resets the count. Once `max_attempts` is hit
/// the acceptance radius is widened by `fallback_range` a single time; hitting the ceiling again
/// ends the behavior. A ceiling of 0 never terminates on attempts.
#[derive(Debug)]
pub struct FollowPlayerBehavior {
    options: FollowOptions,
    lifecycle: Lifecycle,
    state: FollowState,
    attempts: u32,
    fallback_used: bool,
    lost_since: Option<f64>,
    stall: StallDetector,
}

impl FollowPlayerBehavior {
    pub fn new(options: FollowOptions) -> Self {
        let stall = StallDetector::new(options.stall_seconds);
        Self {
            options,
            lifecycle: Lifecycle::Fresh,
            state: FollowState::Watching,
            attempts: 0,
            fallback_used: false,
            lost_since: None,
            stall,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn fallback_used(&self) -> bool {
        self.fallback_used
    }

    pub fn is_holding(&self) -> bool {
        self.state == FollowState::Holding
    }

    fn acceptance_radius(&self) -> f64 {
        if self.fallback_used {
            self.options.distance_threshold + self.options.fallback_range
        } else {
            self.options.distance_threshold
        }
    }

    fn finish<W: NavWorld>(&mut self, world: &mut W, outcome: Outcome) -> BehaviorStatus {
        halt_intents(world);
        self.lifecycle = Lifecycle::Done;
        tracing::info!(player = %self.options.player, outcome = %outcome, "follow finished");
        BehaviorStatus::Done(outcome)
    }

    /// Issue a path request, applying the attempt ceiling and the one-time fallback.
    fn request_path<W: NavWorld>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        entity: EntityId,
        distance: f64,
    ) -> Option<BehaviorStatus> {
        if attempts_exhausted(self.attempts, self.options.max_attempts) {
            if self.fallback_used {
                return Some(self.finish(
                    world,
                    Outcome::Failed(format!("cannot reach {}", self.options.player)),
                ));
            }
            self.fallback_used = true;
            self.attempts = 0;
            tracing::debug!(
                player = %self.options.player,
                radius = self.acceptance_radius(),
                "follow widening acceptance radius"
            );
            if distance <= self.acceptance_radius() {
                return None;
            }
        }

        self.attempts += 1;
        world.set_path_goal(PathGoal::Follow {
            entity,
            range: self.acceptance_radius(),
        });
        self.stall.reset(ctx.seconds(), distance);
        self.state = FollowState::Pathing;
        None
    }
}

impl<W> Behavior<W> for FollowPlayerBehavior
where
    W: NavWorld + 'static,
{
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::FollowPlayer
    }

    fn options(&self) -> BehaviorSpec {
        BehaviorSpec::FollowPlayer(self.options.clone())
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn start(&mut self, _ctx: &TickContext, _world: &mut W) -> bool {
        if self.options.player.is_empty() {
            return false;
        }
        self.lifecycle.try_start()
    }

    fn tick(&mut self, ctx: &TickContext, world: &mut W) -> BehaviorStatus {
        if !self.lifecycle.is_running() {
            return BehaviorStatus::Running;
        }
        let now = ctx.seconds();

        let Some(player) = world.player(&self.options.player) else {
            if self.state != FollowState::Watching {
                world.clear_path_goal();
                world.clear_move_intents();
                self.state = FollowState::Watching;
            }
            let since = *self.lost_since.get_or_insert(now);
            if now - since >= self.options.lost_target_timeout as f64 {
                return self.finish(
                    world,
                    Outcome::PreconditionFailed(format!(
                        "player {} not found",
                        self.options.player
                    )),
                );
            }
            return BehaviorStatus::Running;
        };
        self.lost_since = None;

        let Some(pos) = world.position() else {
            return BehaviorStatus::Running;
        };
        let distance = pos.distance(player.position);

        if distance <= self.acceptance_radius() {
            if self.state != FollowState::Holding {
                world.clear_path_goal();
                world.clear_move_intents();
                self.state = FollowState::Holding;
                self.attempts = 0;
            }
            world.face(player.position);
            return BehaviorStatus::Running;
        }

        let stalled = self.state == FollowState::Pathing
            && self.stall.observe(now, distance, world.is_pathing());
        if self.state != FollowState::Pathing || stalled {
            if stalled {
                tracing::debug!(
                    player = %self.options.player,
                    attempts = self.attempts,
                    "follow path stalled"
                );
            }
            if let Some(done) = self.request_path(ctx, world, player.id, distance) {
                return done;
            }
        }
        BehaviorStatus::Running
    }

    fn pause(&mut self, world: &mut W) {
        if self.lifecycle.try_pause() {
            halt_intents(world);
        }
    }

    fn resume(&mut self, _ctx: &TickContext, _world: &mut W) -> bool {
        if !self.lifecycle.try_resume() {
            return false;
        }
        // The path goal was withdrawn on pause; the next tick re-derives it from the distance.
        if self.state == FollowState::Pathing {
            self.state = FollowState::Watching;
        }
        true
    }

    fn stop(&mut self, world: &mut W) {
        if self.lifecycle.try_stop() {
            halt_intents(world);
        }
    }

    fn can_be_interrupted_by(&self, other: BehaviorKind) -> bool {
        other != BehaviorKind::Idle
    }
}

use mcbot_core::{
    halt_intents, Behavior, BehaviorKind, BehaviorSpec, BehaviorStatus, Lifecycle, NavWorld,
    Outcome, PathGoal, PatrolOptions, TickContext, Vec3,
};

use crate::progress::{attempts_exhausted, StallDetector};

#[derive(Debug, Clone, Copy, PartialEq)]
enum PatrolState {
    Moving { requested: bool },
    Dwelling { until: f64 },
}

/// Walk a list of waypoints in order, pausing at each. Loops forever when `looping` is set.
///
/// A waypoint that keeps stalling is skipped after `max_attempts` tries.
#[derive(Debug)]
pub struct PatrolBehavior {
    options: PatrolOptions,
    lifecycle: Lifecycle,
    index: usize,
    state: PatrolState,
    attempts: u32,
    laps: u32,
    stall: StallDetector,
}

impl PatrolBehavior {
    pub fn new(options: PatrolOptions) -> Self {
        let stall = StallDetector::new(options.stall_seconds);
        Self {
            options,
            lifecycle: Lifecycle::Fresh,
            index: 0,
            state: PatrolState::Moving { requested: false },
            attempts: 0,
            laps: 0,
            stall,
        }
    }

    pub fn waypoint_index(&self) -> usize {
        self.index
    }

    pub fn laps(&self) -> u32 {
        self.laps
    }

    fn waypoint(&self) -> Vec3 {
        self.options.waypoints[self.index]
    }

    /// Move on to the next waypoint. Returns false when a non-looping patrol is over.
    fn advance(&mut self) -> bool {
        self.attempts = 0;
        self.index += 1;
        if self.index >= self.options.waypoints.len() {
            self.laps += 1;
            if !self.options.looping {
                return false;
            }
            self.index = 0;
        }
        self.state = PatrolState::Moving { requested: false };
        true
    }

    fn request<W: NavWorld>(&mut self, ctx: &TickContext, world: &mut W, distance: f64) {
        world.set_path_goal(PathGoal::Near {
            position: self.waypoint(),
            range: self.options.range,
        });
        self.attempts += 1;
        self.stall.reset(ctx.seconds(), distance);
        self.state = PatrolState::Moving { requested: true };
    }
}

impl<W> Behavior<W> for PatrolBehavior
where
    W: NavWorld + 'static,
{
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Patrol
    }

    fn options(&self) -> BehaviorSpec {
        BehaviorSpec::Patrol(self.options.clone())
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn target(&self) -> Option<String> {
        Some(format!(
            "waypoint {}/{}",
            self.index + 1,
            self.options.waypoints.len()
        ))
    }

    fn start(&mut self, _ctx: &TickContext, _world: &mut W) -> bool {
        if self.options.waypoints.is_empty() {
            return false;
        }
        self.lifecycle.try_start()
    }

    fn tick(&mut self, ctx: &TickContext, world: &mut W) -> BehaviorStatus {
        if !self.lifecycle.is_running() {
            return BehaviorStatus::Running;
        }
        let now = ctx.seconds();

        if let PatrolState::Dwelling { until } = self.state {
            if now < until {
                return BehaviorStatus::Running;
            }
            if !self.advance() {
                halt_intents(world);
                self.lifecycle = Lifecycle::Done;
                tracing::info!(laps = self.laps, "patrol finished");
                return BehaviorStatus::Done(Outcome::Completed);
            }
        }

        let Some(pos) = world.position() else {
            return BehaviorStatus::Running;
        };
        let distance = pos.distance(self.waypoint());

        if distance <= self.options.range {
            world.clear_path_goal();
            self.state = PatrolState::Dwelling {
                until: now + self.options.dwell.max(0.0) as f64,
            };
            return BehaviorStatus::Running;
        }

        match self.state {
            PatrolState::Moving { requested: false } => self.request(ctx, world, distance),
            PatrolState::Moving { requested: true } => {
                if self.stall.observe(now, distance, world.is_pathing()) {
                    if attempts_exhausted(self.attempts, self.options.max_attempts) {
                        tracing::warn!(index = self.index, "patrol skipping unreachable waypoint");
                        world.clear_path_goal();
                        if !self.advance() {
                            halt_intents(world);
                            self.lifecycle = Lifecycle::Done;
                            return BehaviorStatus::Done(Outcome::Failed(
                                "last waypoint unreachable".to_string(),
                            ));
                        }
                    } else {
                        self.request(ctx, world, distance);
                    }
                }
            }
            PatrolState::Dwelling { .. } => {}
        }
        BehaviorStatus::Running
    }

    fn pause(&mut self, world: &mut W) {
        if self.lifecycle.try_pause() {
            halt_intents(world);
            // Re-issuing the same waypoint after resume is not a new attempt.
            if let PatrolState::Moving { requested: true } = self.state {
                self.attempts = self.attempts.saturating_sub(1);
                self.state = PatrolState::Moving { requested: false };
            }
        }
    }

    fn resume(&mut self, _ctx: &TickContext, _world: &mut W) -> bool {
        self.lifecycle.try_resume()
    }

    fn stop(&mut self, world: &mut W) {
        if self.lifecycle.try_stop() {
            halt_intents(world);
        }
    }
}

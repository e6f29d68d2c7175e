use mcbot_core::{
    halt_intents, Behavior, BehaviorKind, BehaviorSpec, BehaviorStatus, GotoOptions, Lifecycle,
    NavWorld, Outcome, PathGoal, TickContext,
};

use crate::progress::{attempts_exhausted, StallDetector};

#[derive(Debug)]
pub struct GotoBehavior {
    options: GotoOptions,
    lifecycle: Lifecycle,
    attempts: u32,
    requested: bool,
    stall: StallDetector,
}

impl GotoBehavior {
    pub fn new(options: GotoOptions) -> Self {
        let stall = StallDetector::new(options.stall_seconds);
        Self {
            options,
            lifecycle: Lifecycle::Fresh,
            attempts: 0,
            requested: false,
            stall,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Hand the destination to the navigator. Re-issuing after a pause is not a new attempt.
    fn request<W: NavWorld>(&mut self, ctx: &TickContext, world: &mut W, retry: bool) {
        world.set_path_goal(PathGoal::Near {
            position: self.options.position,
            range: self.options.range,
        });
        let distance = world
            .position()
            .map_or(f64::INFINITY, |p| p.distance(self.options.position));
        self.stall.reset(ctx.seconds(), distance);
        if retry || self.attempts == 0 {
            self.attempts += 1;
        }
        self.requested = true;
    }

    fn finish<W: NavWorld>(&mut self, world: &mut W, outcome: Outcome) -> BehaviorStatus {
        halt_intents(world);
        self.lifecycle = Lifecycle::Done;
        tracing::info!(position = ?self.options.position, outcome = %outcome, "goto finished");
        BehaviorStatus::Done(outcome)
    }
}

impl<W> Behavior<W> for GotoBehavior
where
    W: NavWorld + 'static,
{
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Goto
    }

    fn options(&self) -> BehaviorSpec {
        BehaviorSpec::Goto(self.options.clone())
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn start(&mut self, ctx: &TickContext, world: &mut W) -> bool {
        if !self.lifecycle.try_start() {
            return false;
        }
        self.request(ctx, world, false);
        true
    }

    fn tick(&mut self, ctx: &TickContext, world: &mut W) -> BehaviorStatus {
        if !self.lifecycle.is_running() {
            return BehaviorStatus::Running;
        }
        let Some(pos) = world.position() else {
            return BehaviorStatus::Running;
        };
        let distance = pos.distance(self.options.position);
        if distance <= self.options.range {
            return self.finish(world, Outcome::Completed);
        }

        if !self.requested {
            self.request(ctx, world, false);
        } else if self.stall.observe(ctx.seconds(), distance, world.is_pathing()) {
            if attempts_exhausted(self.attempts, self.options.max_attempts) {
                return self.finish(world, Outcome::Failed("no path to destination".to_string()));
            }
            tracing::debug!(attempts = self.attempts, "goto stalled, retrying");
            self.request(ctx, world, true);
        }
        BehaviorStatus::Running
    }

    fn pause(&mut self, world: &mut W) {
        if self.lifecycle.try_pause() {
            halt_intents(world);
            self.requested = false;
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

use mcbot_core::{
    Behavior, BehaviorKind, BehaviorSpec, BehaviorStatus, DropOptions, Lifecycle, NavWorld,
    Outcome, TickContext,
};

const MAX_TOSS_FAILURES: u32 = 3;

/// Toss inventory stacks, one per `toss_interval`, until none match the filter.
#[derive(Debug)]
pub struct DropItemsBehavior {
    options: DropOptions,
    lifecycle: Lifecycle,
    next_toss_at: f64,
    tossed: u32,
    failures: u32,
}

impl DropItemsBehavior {
    pub fn new(options: DropOptions) -> Self {
        Self {
            options,
            lifecycle: Lifecycle::Fresh,
            next_toss_at: 0.0,
            tossed: 0,
            failures: 0,
        }
    }

    pub fn tossed(&self) -> u32 {
        self.tossed
    }

    fn matches(&self, name: &str) -> bool {
        self.options.item.as_deref().map_or(true, |item| item == name)
    }

    fn finish(&mut self, outcome: Outcome) -> BehaviorStatus {
        self.lifecycle = Lifecycle::Done;
        tracing::info!(tossed = self.tossed, outcome = %outcome, "drop finished");
        BehaviorStatus::Done(outcome)
    }
}

impl<W> Behavior<W> for DropItemsBehavior
where
    W: NavWorld + 'static,
{
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::DropItems
    }

    fn options(&self) -> BehaviorSpec {
        BehaviorSpec::DropItems(self.options.clone())
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn start(&mut self, ctx: &TickContext, world: &mut W) -> bool {
        if !self.lifecycle.try_start() {
            return false;
        }
        world.clear_move_intents();
        self.next_toss_at = ctx.seconds();
        true
    }

    fn tick(&mut self, ctx: &TickContext, world: &mut W) -> BehaviorStatus {
        if !self.lifecycle.is_running() {
            return BehaviorStatus::Running;
        }
        let now = ctx.seconds();
        if now < self.next_toss_at {
            return BehaviorStatus::Running;
        }

        let stack = world.inventory().into_iter().find(|s| self.matches(&s.name));
        let Some(stack) = stack else {
            return self.finish(Outcome::Completed);
        };

        if world.toss(&stack.name, stack.count) {
            self.tossed += stack.count;
            self.failures = 0;
        } else {
            self.failures += 1;
            tracing::debug!(item = %stack.name, failures = self.failures, "toss refused");
            if self.failures >= MAX_TOSS_FAILURES {
                return self.finish(Outcome::Failed(format!("cannot toss {}", stack.name)));
            }
        }
        self.next_toss_at = now + self.options.toss_interval.max(0.0) as f64;
        BehaviorStatus::Running
    }

    fn pause(&mut self, _world: &mut W) {
        self.lifecycle.try_pause();
    }

    fn resume(&mut self, _ctx: &TickContext, _world: &mut W) -> bool {
        self.lifecycle.try_resume()
    }

    fn stop(&mut self, world: &mut W) {
        if self.lifecycle.try_stop() {
            world.clear_move_intents();
        }
    }
}

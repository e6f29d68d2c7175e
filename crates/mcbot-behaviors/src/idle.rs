use mcbot_core::{
    Behavior, BehaviorKind, BehaviorSpec, BehaviorStatus, Lifecycle, NavWorld, TickContext,
};

/// Filler for an otherwise empty active slot. Issues nothing and never finishes.
#[derive(Debug, Default)]
pub struct IdleBehavior {
    lifecycle: Lifecycle,
}

impl IdleBehavior {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<W> Behavior<W> for IdleBehavior
where
    W: NavWorld + 'static,
{
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Idle
    }

    fn options(&self) -> BehaviorSpec {
        BehaviorSpec::Idle
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn start(&mut self, _ctx: &TickContext, _world: &mut W) -> bool {
        self.lifecycle.try_start()
    }

    fn tick(&mut self, _ctx: &TickContext, _world: &mut W) -> BehaviorStatus {
        BehaviorStatus::Running
    }

    fn pause(&mut self, _world: &mut W) {
        self.lifecycle.try_pause();
    }

    fn resume(&mut self, _ctx: &TickContext, _world: &mut W) -> bool {
        self.lifecycle.try_resume()
    }

    fn stop(&mut self, _world: &mut W) {
        self.lifecycle.try_stop();
    }
}

use mcbot_core::{Behavior, BehaviorFactory, BehaviorSpec, NavWorld};

use crate::{
    CombatBehavior, DropItemsBehavior, FollowPlayerBehavior, GotoBehavior, IdleBehavior,
    MineBlockBehavior, PatrolBehavior,
};

/// Builds the stock behavior for every kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFactory;

impl<W> BehaviorFactory<W> for StandardFactory
where
    W: NavWorld + 'static,
{
    fn build(&self, spec: &BehaviorSpec) -> Box<dyn Behavior<W>> {
        match spec {
            BehaviorSpec::Idle => Box::new(IdleBehavior::new()),
            BehaviorSpec::Combat(o) => Box::new(CombatBehavior::new(o.clone())),
            BehaviorSpec::MineBlock(o) => Box::new(MineBlockBehavior::new(o.clone())),
            BehaviorSpec::FollowPlayer(o) => Box::new(FollowPlayerBehavior::new(o.clone())),
            BehaviorSpec::DropItems(o) => Box::new(DropItemsBehavior::new(o.clone())),
            BehaviorSpec::Goto(o) => Box::new(GotoBehavior::new(o.clone())),
            BehaviorSpec::Patrol(o) => Box::new(PatrolBehavior::new(o.clone())),
        }
    }
}

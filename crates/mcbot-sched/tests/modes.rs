use mcbot_core::{
    BehaviorKind, BehaviorSpec, BlockPos, GotoOptions, Lifecycle, MineOptions, SimWorld,
    TickContext, Vec3,
};
use mcbot_sched::{
    MemoryNotifier, NotificationKind, Scheduler, SchedulerConfig, TaskOrigin, TaskStatus,
};

const DT: f32 = 0.05;

struct Harness {
    scheduler: Scheduler<SimWorld>,
    world: SimWorld,
    ctx: TickContext,
    events: MemoryNotifier,
}

impl Harness {
    fn new(world: SimWorld) -> Self {
        Self::with_config(world, SchedulerConfig::default())
    }

    fn with_config(world: SimWorld, config: SchedulerConfig) -> Self {
        let events = MemoryNotifier::new();
        Self {
            scheduler: Scheduler::new(config).with_notifier(events.clone()),
            world,
            ctx: TickContext::new(0, DT),
            events,
        }
    }

    fn step(&mut self) {
        self.scheduler.tick(&self.ctx, &mut self.world);
        self.world.step(self.ctx.dt_seconds);
        self.ctx = self.ctx.next();
    }

    fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.step();
        }
    }

    fn run_until(&mut self, max_ticks: usize, mut done: impl FnMut(&Self) -> bool) -> bool {
        for _ in 0..max_ticks {
            if done(self) {
                return true;
            }
            self.step();
        }
        done(self)
    }

    fn current_kind(&self) -> Option<BehaviorKind> {
        self.scheduler.current_behavior().map(|c| c.kind)
    }
}

#[test]
fn follow_mode_walks_to_the_player_then_holds() {
    let mut world = SimWorld::new();
    let alice = Vec3::new(50.0, 0.0, 0.0);
    world.spawn_player("Alice", alice);
    let mut h = Harness::new(world);

    h.scheduler
        .set_follow_mode(&h.ctx, &mut h.world, Some("Alice".to_string()));
    assert_eq!(h.current_kind(), Some(BehaviorKind::FollowPlayer));
    assert_eq!(h.scheduler.modes().follow.as_deref(), Some("Alice"));

    assert!(h.run_until(600, |h| h.world.position.distance(alice) <= 2.0
        && !h.world.has_move_intents()));
    h.run(5);
    assert_eq!(h.current_kind(), Some(BehaviorKind::FollowPlayer));
    assert!(!h.world.has_move_intents());
    assert_eq!(h.world.facing(), Some(alice));
}

#[test]
fn queued_mine_task_runs_to_completion_then_idles() {
    let mut world = SimWorld::new();
    for x in 2..5 {
        world.set_block(BlockPos::new(x, 0, 0), "stone");
    }
    let mut h = Harness::new(world);
    h.step();
    assert_eq!(h.current_kind(), Some(BehaviorKind::Idle));

    let task = h
        .scheduler
        .add_task(
            &h.ctx,
            &mut h.world,
            BehaviorSpec::MineBlock(MineOptions::new("stone", 3)),
            None,
        )
        .unwrap();
    assert_eq!(h.current_kind(), Some(BehaviorKind::MineBlock));
    assert_eq!(h.scheduler.task(task).unwrap().status, TaskStatus::Running);

    assert!(h.run_until(600, |h| h.current_kind() == Some(BehaviorKind::Idle)));
    assert_eq!(h.world.item_count("stone"), 3);
    assert!(h.scheduler.task(task).is_none());
    assert!(h.scheduler.tasks().is_empty());

    let completed = h
        .events
        .events()
        .into_iter()
        .find(|n| n.event_type == NotificationKind::BehaviorCompleted)
        .unwrap();
    assert_eq!(completed.behavior, Some(BehaviorKind::MineBlock));
    assert_eq!(completed.task, Some(task));
    assert_eq!(completed.message, "completed");
}

#[test]
fn combat_preempts_follow_and_follow_resumes_after_the_kill() {
    let mut world = SimWorld::new();
    world.spawn_player("Alice", Vec3::new(1.5, 0.0, 0.0));
    let mut h = Harness::new(world);

    h.scheduler
        .set_follow_mode(&h.ctx, &mut h.world, Some("Alice".to_string()));
    h.scheduler.set_combat_mode(&h.ctx, &mut h.world, true);
    h.run(3);
    let follow = h.scheduler.current_instance().unwrap();
    assert_eq!(h.current_kind(), Some(BehaviorKind::FollowPlayer));

    h.world
        .spawn_hostile("zombie", Vec3::new(-8.0, 0.0, 0.0), 10.0);
    assert!(h.run_until(20, |h| h.current_kind() == Some(BehaviorKind::Combat)));

    let suspended = h.scheduler.suspended();
    assert_eq!(suspended.len(), 1);
    assert_eq!(suspended[0].instance, follow);
    assert_eq!(suspended[0].lifecycle, Lifecycle::Paused);
    let task = suspended[0].task.unwrap();
    assert_eq!(h.scheduler.task(task).unwrap().status, TaskStatus::Suspended);

    assert!(h.run_until(400, |h| h.current_kind() != Some(BehaviorKind::Combat)));
    assert_eq!(h.scheduler.current_instance(), Some(follow));
    assert_eq!(h.scheduler.task(task).unwrap().status, TaskStatus::Running);
    assert!(h.scheduler.suspended().is_empty());
    assert_eq!(h.world.attacks().len(), 2);

    // Resumed, not restarted.
    let follow_starts = h
        .events
        .events()
        .into_iter()
        .filter(|n| n.event_type == NotificationKind::BehaviorStarted)
        .filter(|n| n.instance == Some(follow))
        .count();
    assert_eq!(follow_starts, 1);
}

#[test]
fn combat_mode_does_not_preempt_stronger_work_unless_health_is_critical() {
    let mut world = SimWorld::new();
    world.spawn_player("Alice", Vec3::new(1.5, 0.0, 0.0));
    world.spawn_hostile("zombie", Vec3::new(-5.0, 0.0, 0.0), 100.0);
    let mut h = Harness::new(world);
    h.scheduler
        .set_behavior_priority(BehaviorKind::Combat, 50)
        .unwrap();

    assert!(h.scheduler.start_behavior(
        &h.ctx,
        &mut h.world,
        BehaviorSpec::Goto(GotoOptions::new(Vec3::new(0.0, 0.0, 40.0))),
        None,
    ));
    h.scheduler.set_combat_mode(&h.ctx, &mut h.world, true);
    h.run(20);
    assert_eq!(h.current_kind(), Some(BehaviorKind::Goto));

    h.world.health = 4.0;
    assert!(h.run_until(20, |h| h.current_kind() == Some(BehaviorKind::Combat)));
    assert_eq!(h.scheduler.suspended()[0].kind, BehaviorKind::Goto);
}

#[test]
fn disabling_combat_mode_stops_combat_and_resumes_the_stack() {
    let mut world = SimWorld::new();
    world.spawn_hostile("zombie", Vec3::new(-6.0, 0.0, 0.0), 100.0);
    let mut h = Harness::new(world);

    assert!(h.scheduler.start_behavior(
        &h.ctx,
        &mut h.world,
        BehaviorSpec::Goto(GotoOptions::new(Vec3::new(0.0, 0.0, 40.0))),
        None,
    ));
    h.scheduler.set_combat_mode(&h.ctx, &mut h.world, true);
    assert_eq!(h.current_kind(), Some(BehaviorKind::Combat));

    h.scheduler.set_combat_mode(&h.ctx, &mut h.world, false);
    assert_eq!(h.current_kind(), Some(BehaviorKind::Goto));
    assert!(!h.scheduler.modes().combat);

    h.run(20);
    assert_eq!(h.current_kind(), Some(BehaviorKind::Goto));
}

#[test]
fn combat_mode_engages_the_next_hostile_after_a_kill() {
    let mut world = SimWorld::new();
    world.spawn_hostile("zombie", Vec3::new(2.0, 0.0, 0.0), 5.0);
    world.spawn_hostile("skeleton", Vec3::new(-2.0, 0.0, 0.0), 5.0);
    let mut h = Harness::new(world);
    h.step();

    h.scheduler.set_combat_mode(&h.ctx, &mut h.world, true);
    let first = h.scheduler.current_instance().unwrap();
    assert_eq!(h.current_kind(), Some(BehaviorKind::Combat));

    assert!(h.run_until(100, |h| h.scheduler.current_instance() != Some(first)));
    assert!(h.run_until(40, |h| {
        h.current_kind() == Some(BehaviorKind::Combat)
            && h.scheduler.current_instance() != Some(first)
    }));
    assert!(h.run_until(100, |h| h.current_kind() == Some(BehaviorKind::Idle)));
    assert_eq!(h.world.attacks().len(), 2);
}

#[test]
fn disabling_follow_mode_stops_the_follow() {
    let mut world = SimWorld::new();
    world.spawn_player("Alice", Vec3::new(20.0, 0.0, 0.0));
    let mut h = Harness::new(world);

    h.scheduler
        .set_follow_mode(&h.ctx, &mut h.world, Some("Alice".to_string()));
    h.run(5);
    assert_eq!(h.current_kind(), Some(BehaviorKind::FollowPlayer));

    h.scheduler.set_follow_mode(&h.ctx, &mut h.world, None);
    assert_eq!(h.current_kind(), Some(BehaviorKind::Idle));
    assert!(h.scheduler.tasks().is_empty());
    assert!(!h.scheduler.modes().follow_enabled());
    assert!(!h.world.has_move_intents());

    h.run(30);
    assert_eq!(h.current_kind(), Some(BehaviorKind::Idle));
}

#[test]
fn follow_mode_is_reinstated_once_the_backlog_drains() {
    let mut world = SimWorld::new();
    world.spawn_player("Alice", Vec3::new(1.5, 0.0, 0.0));
    let mut h = Harness::new(world);

    h.scheduler
        .set_follow_mode(&h.ctx, &mut h.world, Some("Alice".to_string()));
    let first = h.scheduler.current_instance().unwrap();

    // Drop the mode task, then let a short errand run.
    assert!(h.scheduler.start_behavior(
        &h.ctx,
        &mut h.world,
        BehaviorSpec::Goto(GotoOptions::new(Vec3::new(0.0, 0.0, 2.0))),
        None,
    ));
    assert!(h.scheduler.stop_current_behavior(&mut h.world, Some(first)));
    assert!(!h.scheduler.tasks().iter().any(|t| t.origin == TaskOrigin::FollowMode));

    assert!(h.run_until(100, |h| h.current_kind() == Some(BehaviorKind::FollowPlayer)));
    assert_ne!(h.scheduler.current_instance(), Some(first));
    let tasks = h.scheduler.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].origin, TaskOrigin::FollowMode);
}

#[test]
fn lost_follow_target_clears_follow_mode() {
    let mut world = SimWorld::new();
    let alice = world.spawn_player("Alice", Vec3::new(1.5, 0.0, 0.0));
    let mut config = SchedulerConfig::default();
    config.follow.lost_target_timeout = 0.5;
    let mut h = Harness::with_config(world, config);

    h.scheduler
        .set_follow_mode(&h.ctx, &mut h.world, Some("Alice".to_string()));
    h.run(3);
    h.world.remove_entity(alice);

    assert!(h.run_until(60, |h| h.current_kind() == Some(BehaviorKind::Idle)));
    assert!(!h.scheduler.modes().follow_enabled());
    assert!(h.events.kinds().contains(&NotificationKind::ModeChanged));

    h.run(30);
    assert_eq!(h.current_kind(), Some(BehaviorKind::Idle));
}

#[test]
fn mining_mode_clears_itself_when_its_task_finishes() {
    let mut world = SimWorld::new();
    world.set_block(BlockPos::new(2, 0, 0), "coal_ore");
    world.set_block(BlockPos::new(3, 0, 0), "coal_ore");
    let mut h = Harness::new(world);

    h.scheduler.set_mining_mode(
        &h.ctx,
        &mut h.world,
        Some(MineOptions::new("coal_ore", 2)),
    );
    assert!(h.scheduler.modes().mining_enabled());
    assert_eq!(h.current_kind(), Some(BehaviorKind::MineBlock));
    assert_eq!(h.scheduler.tasks()[0].origin, TaskOrigin::MiningMode);

    assert!(h.run_until(300, |h| h.current_kind() == Some(BehaviorKind::Idle)));
    assert_eq!(h.world.item_count("coal_ore"), 2);
    assert!(!h.scheduler.modes().mining_enabled());
}

#[test]
fn mining_mode_for_an_unknown_block_is_dropped() {
    let mut h = Harness::new(SimWorld::new());
    h.step();

    h.scheduler.set_mining_mode(
        &h.ctx,
        &mut h.world,
        Some(MineOptions::new("unobtanium", 2)),
    );
    assert!(!h.scheduler.modes().mining_enabled());
    assert!(h.scheduler.tasks().is_empty());
    assert_eq!(h.current_kind(), Some(BehaviorKind::Idle));
    assert!(h.events.kinds().contains(&NotificationKind::Rejected));
}

#[test]
fn re_enabling_mining_mode_replaces_the_request() {
    let mut world = SimWorld::new();
    world.set_block(BlockPos::new(20, 0, 0), "stone");
    world.set_block(BlockPos::new(-20, 0, 0), "dirt");
    let mut h = Harness::new(world);

    h.scheduler
        .set_mining_mode(&h.ctx, &mut h.world, Some(MineOptions::new("stone", 1)));
    h.scheduler
        .set_mining_mode(&h.ctx, &mut h.world, Some(MineOptions::new("dirt", 1)));

    let tasks = h.scheduler.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(
        tasks[0].spec,
        BehaviorSpec::MineBlock(MineOptions::new("dirt", 1))
    );
    assert_eq!(
        h.scheduler.modes().mining.as_ref().map(|m| m.block.as_str()),
        Some("dirt")
    );
    assert!(h.scheduler.suspended().is_empty());

    h.scheduler.set_mining_mode(&h.ctx, &mut h.world, None);
    assert!(h.scheduler.tasks().is_empty());
    assert_eq!(h.current_kind(), Some(BehaviorKind::Idle));
}

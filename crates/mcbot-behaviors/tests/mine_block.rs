use mcbot_behaviors::MineBlockBehavior;
use mcbot_core::{
    Behavior, BehaviorStatus, BlockPos, DigStatus, Lifecycle, MineOptions, Outcome, SimWorld,
    TickContext, WorldView,
};

const DT: f32 = 0.05;

fn drive(
    behavior: &mut MineBlockBehavior,
    world: &mut SimWorld,
    ctx: &mut TickContext,
    max_ticks: usize,
) -> Option<Outcome> {
    for _ in 0..max_ticks {
        let status = behavior.tick(ctx, world);
        world.step(ctx.dt_seconds);
        *ctx = ctx.next();
        if let BehaviorStatus::Done(outcome) = status {
            return Some(outcome);
        }
    }
    None
}

#[test]
fn mines_requested_quantity_walking_between_blocks() {
    let mut world = SimWorld::new();
    world.set_block(BlockPos::new(10, 0, 0), "stone");
    world.set_block(BlockPos::new(12, 0, 0), "stone");
    world.set_block(BlockPos::new(30, 0, 0), "stone");

    let mut ctx = TickContext::new(0, DT);
    let mut mine = MineBlockBehavior::new(MineOptions::new("stone", 2));
    assert!(mine.start(&ctx, &mut world));

    let outcome = drive(&mut mine, &mut world, &mut ctx, 400);
    assert_eq!(outcome, Some(Outcome::Completed));
    assert_eq!(mine.mined(), 2);
    assert_eq!(mine.remaining(), 0);
    assert_eq!(world.item_count("stone"), 2);
    assert_eq!(world.block_at(BlockPos::new(30, 0, 0)), Some("stone"));
    assert!(!world.has_move_intents());
}

#[test]
fn unknown_block_fails_start_and_goes_terminal() {
    let mut world = SimWorld::new();
    let ctx = TickContext::new(0, DT);
    let mut mine = MineBlockBehavior::new(MineOptions::new("unobtanium", 1));

    assert!(!mine.start(&ctx, &mut world));
    assert_eq!(Behavior::<SimWorld>::lifecycle(&mine), Lifecycle::Done);
    assert!(!mine.start(&ctx, &mut world));
}

#[test]
fn no_blocks_within_radius_is_exhausted_not_failed() {
    let mut world = SimWorld::new();
    world.set_block(BlockPos::new(100, 0, 0), "stone");

    let mut ctx = TickContext::new(0, DT);
    let mut mine = MineBlockBehavior::new(MineOptions::new("stone", 1));
    assert!(mine.start(&ctx, &mut world));

    let outcome = drive(&mut mine, &mut world, &mut ctx, 5);
    assert_eq!(outcome, Some(Outcome::Exhausted));
    assert!(outcome.is_some_and(|o| o.is_success()));
}

#[test]
fn dig_failures_back_off_and_recover() {
    let mut world = SimWorld::new();
    world.set_block(BlockPos::new(1, 0, 0), "stone");
    world.fail_digs = 2;

    let mut ctx = TickContext::new(0, DT);
    let mut options = MineOptions::new("stone", 1);
    options.dig_backoff = 0.25;
    let mut mine = MineBlockBehavior::new(options);
    assert!(mine.start(&ctx, &mut world));

    let outcome = drive(&mut mine, &mut world, &mut ctx, 200);
    assert_eq!(outcome, Some(Outcome::Completed));
    assert_eq!(world.item_count("stone"), 1);
}

#[test]
fn dig_retry_ceiling_ends_with_precondition_failure() {
    let mut world = SimWorld::new();
    world.set_block(BlockPos::new(1, 0, 0), "stone");
    world.fail_digs = 100;

    let mut ctx = TickContext::new(0, DT);
    let mut options = MineOptions::new("stone", 1);
    options.dig_backoff = 0.1;
    options.max_dig_retries = 3;
    let mut mine = MineBlockBehavior::new(options);
    assert!(mine.start(&ctx, &mut world));

    let outcome = drive(&mut mine, &mut world, &mut ctx, 200);
    assert!(matches!(outcome, Some(Outcome::PreconditionFailed(_))));
    // Initial dig plus three retries.
    assert_eq!(world.fail_digs, 96);
}

#[test]
fn stalled_movement_skips_blocks_until_attempts_run_out() {
    let mut world = SimWorld::new();
    world.path_blocked = true;
    world.set_block(BlockPos::new(15, 0, 0), "stone");
    world.set_block(BlockPos::new(0, 0, 15), "stone");
    world.set_block(BlockPos::new(-15, 0, 0), "stone");

    let mut ctx = TickContext::new(0, DT);
    let mut options = MineOptions::new("stone", 1);
    options.max_attempts = 2;
    options.stall_seconds = 0.5;
    let mut mine = MineBlockBehavior::new(options);
    assert!(mine.start(&ctx, &mut world));

    let outcome = drive(&mut mine, &mut world, &mut ctx, 200);
    assert_eq!(outcome, Some(Outcome::Failed("movement stalled".to_string())));
    assert_eq!(world.count_blocks("stone"), 3);
}

#[test]
fn pause_keeps_progress_and_resume_continues() {
    let mut world = SimWorld::new();
    for x in 1..=3 {
        world.set_block(BlockPos::new(x, 0, 0), "stone");
    }

    let mut ctx = TickContext::new(0, DT);
    let mut mine = MineBlockBehavior::new(MineOptions::new("stone", 3));
    assert!(mine.start(&ctx, &mut world));

    while mine.mined() == 0 {
        assert_eq!(mine.tick(&ctx, &mut world), BehaviorStatus::Running);
        world.step(DT);
        ctx = ctx.next();
        assert!(ctx.tick < 100, "first block never mined");
    }

    mine.pause(&mut world);
    assert!(!Behavior::<SimWorld>::is_running(&mine));
    assert_eq!(world.dig_status(), DigStatus::Idle);
    assert!(!world.has_move_intents());

    for _ in 0..20 {
        world.step(DT);
        ctx = ctx.next();
    }
    assert_eq!(mine.mined(), 1);
    assert_eq!(mine.remaining(), 2);

    assert!(mine.resume(&ctx, &mut world));
    assert!(!mine.resume(&ctx, &mut world));
    let outcome = drive(&mut mine, &mut world, &mut ctx, 200);
    assert_eq!(outcome, Some(Outcome::Completed));
    assert_eq!(world.item_count("stone"), 3);
}

#[test]
fn stop_is_idempotent() {
    let mut world = SimWorld::new();
    world.set_block(BlockPos::new(10, 0, 0), "stone");

    let ctx = TickContext::new(0, DT);
    let mut mine = MineBlockBehavior::new(MineOptions::new("stone", 1));
    assert!(mine.start(&ctx, &mut world));
    mine.tick(&ctx, &mut world);
    assert!(world.path_goal().is_some());

    mine.stop(&mut world);
    let clears = world.intent_clears();
    assert!(world.path_goal().is_none());

    mine.stop(&mut world);
    assert_eq!(world.intent_clears(), clears);
    assert!(!mine.start(&ctx, &mut world));
}

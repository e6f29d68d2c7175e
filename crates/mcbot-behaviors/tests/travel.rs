use mcbot_behaviors::{GotoBehavior, PatrolBehavior};
use mcbot_core::{
    Behavior, BehaviorStatus, GotoOptions, Outcome, PatrolOptions, SimWorld, TickContext, Vec3,
};

const DT: f32 = 0.05;

fn drive<B: Behavior<SimWorld>>(
    behavior: &mut B,
    world: &mut SimWorld,
    ctx: &mut TickContext,
    ticks: usize,
) -> Option<Outcome> {
    for _ in 0..ticks {
        let status = behavior.tick(ctx, world);
        world.step(ctx.dt_seconds);
        *ctx = ctx.next();
        if let BehaviorStatus::Done(outcome) = status {
            return Some(outcome);
        }
    }
    None
}

fn square(side: f64) -> Vec<Vec3> {
    vec![
        Vec3::new(side, 0.0, 0.0),
        Vec3::new(side, 0.0, side),
        Vec3::new(0.0, 0.0, side),
        Vec3::ZERO,
    ]
}

#[test]
fn goto_arrives_within_range() {
    let mut world = SimWorld::new();
    let target = Vec3::new(6.0, 0.0, 0.0);

    let mut ctx = TickContext::new(0, DT);
    let mut goto = GotoBehavior::new(GotoOptions::new(target));
    assert!(goto.start(&ctx, &mut world));

    let outcome = drive(&mut goto, &mut world, &mut ctx, 100);
    assert_eq!(outcome, Some(Outcome::Completed));
    assert!(world.position.distance(target) <= 1.0);
    assert_eq!(goto.attempts(), 1);
}

#[test]
fn goto_gives_up_after_bounded_retries() {
    let mut world = SimWorld::new();
    world.path_blocked = true;

    let options = GotoOptions {
        max_attempts: 2,
        stall_seconds: 0.5,
        ..GotoOptions::new(Vec3::new(20.0, 0.0, 0.0))
    };
    let mut ctx = TickContext::new(0, DT);
    let mut goto = GotoBehavior::new(options);
    assert!(goto.start(&ctx, &mut world));

    let outcome = drive(&mut goto, &mut world, &mut ctx, 200);
    assert_eq!(
        outcome,
        Some(Outcome::Failed("no path to destination".to_string()))
    );
    assert_eq!(goto.attempts(), 2);
}

#[test]
fn goto_resume_reissues_the_goal_without_counting_an_attempt() {
    let mut world = SimWorld::new();
    let mut ctx = TickContext::new(0, DT);
    let mut goto = GotoBehavior::new(GotoOptions::new(Vec3::new(20.0, 0.0, 0.0)));
    assert!(goto.start(&ctx, &mut world));
    assert_eq!(drive(&mut goto, &mut world, &mut ctx, 5), None);

    goto.pause(&mut world);
    assert!(world.path_goal().is_none());
    let parked = world.position;
    world.step(DT);
    assert_eq!(world.position, parked);

    assert!(goto.resume(&ctx, &mut world));
    goto.tick(&ctx, &mut world);
    assert!(world.path_goal().is_some());
    assert_eq!(goto.attempts(), 1);
}

#[test]
fn goto_stop_is_idempotent() {
    let mut world = SimWorld::new();
    let ctx = TickContext::new(0, DT);
    let mut goto = GotoBehavior::new(GotoOptions::new(Vec3::new(20.0, 0.0, 0.0)));
    assert!(goto.start(&ctx, &mut world));
    assert!(!goto.start(&ctx, &mut world));

    goto.stop(&mut world);
    let clears = world.intent_clears();
    goto.stop(&mut world);
    assert_eq!(world.intent_clears(), clears);
}

#[test]
fn patrol_visits_every_waypoint_once_without_looping() {
    let mut world = SimWorld::new();
    let options = PatrolOptions {
        waypoints: square(4.0),
        dwell: 0.2,
        looping: false,
        ..PatrolOptions::default()
    };
    let mut ctx = TickContext::new(0, DT);
    let mut patrol = PatrolBehavior::new(options);
    assert!(patrol.start(&ctx, &mut world));

    let outcome = drive(&mut patrol, &mut world, &mut ctx, 400);
    assert_eq!(outcome, Some(Outcome::Completed));
    assert_eq!(patrol.laps(), 1);
    assert!(world.position.distance(Vec3::ZERO) <= 1.0);
}

#[test]
fn looping_patrol_keeps_going() {
    let mut world = SimWorld::new();
    let options = PatrolOptions {
        waypoints: square(3.0),
        dwell: 0.1,
        looping: true,
        ..PatrolOptions::default()
    };
    let mut ctx = TickContext::new(0, DT);
    let mut patrol = PatrolBehavior::new(options);
    assert!(patrol.start(&ctx, &mut world));

    assert_eq!(drive(&mut patrol, &mut world, &mut ctx, 600), None);
    assert!(patrol.laps() >= 2);
    assert!(patrol.waypoint_index() < 4);
}

#[test]
fn patrol_skips_unreachable_waypoints() {
    let mut world = SimWorld::new();
    world.path_blocked = true;
    let options = PatrolOptions {
        waypoints: vec![Vec3::new(10.0, 0.0, 0.0), Vec3::new(-10.0, 0.0, 0.0)],
        looping: false,
        max_attempts: 1,
        stall_seconds: 0.5,
        ..PatrolOptions::default()
    };
    let mut ctx = TickContext::new(0, DT);
    let mut patrol = PatrolBehavior::new(options);
    assert!(patrol.start(&ctx, &mut world));

    let outcome = drive(&mut patrol, &mut world, &mut ctx, 200);
    assert!(matches!(outcome, Some(Outcome::Failed(_))));
    assert_eq!(world.position, Vec3::ZERO);
}

#[test]
fn patrol_without_waypoints_does_not_start() {
    let mut world = SimWorld::new();
    let ctx = TickContext::new(0, DT);
    let mut patrol = PatrolBehavior::new(PatrolOptions::default());
    assert!(!patrol.start(&ctx, &mut world));
}

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mcbot_core::{BehaviorSpec, FollowOptions, SimWorld, TickContext, Vec3};
use mcbot_sched::{Scheduler, SchedulerConfig};

fn bench_scheduler_tick(c: &mut Criterion) {
    let mut world = SimWorld::new();
    world.spawn_player("Alice", Vec3::new(1.0, 0.0, 0.0));

    let mut scheduler: Scheduler<SimWorld> = Scheduler::new(SchedulerConfig::default());
    let mut ctx = TickContext::new(0, 0.05);
    scheduler.start_behavior(
        &ctx,
        &mut world,
        BehaviorSpec::FollowPlayer(FollowOptions::new("Alice")),
        None,
    );
    scheduler.set_combat_mode(&ctx, &mut world, true);

    c.bench_function("mcbot-sched/tick(follow+combat_mode)", |b| {
        b.iter(|| {
            scheduler.tick(&ctx, &mut world);
            world.step(ctx.dt_seconds);
            black_box(scheduler.current_instance());
            ctx = ctx.next();
        })
    });
}

fn bench_task_promotion(c: &mut Criterion) {
    let mut world = SimWorld::new();
    let mut ctx = TickContext::new(0, 0.05);

    c.bench_function("mcbot-sched/add_task(tasks=64)", |b| {
        b.iter(|| {
            let mut scheduler: Scheduler<SimWorld> = Scheduler::new(SchedulerConfig::default());
            for i in 0..64 {
                let spec = BehaviorSpec::Goto(mcbot_core::GotoOptions::new(Vec3::new(
                    i as f64, 0.0, 0.0,
                )));
                let _ = scheduler.add_task(&ctx, &mut world, spec, Some(i % 20));
            }
            black_box(scheduler.tasks().len());
            ctx = ctx.next();
        })
    });
}

criterion_group!(benches, bench_scheduler_tick, bench_task_promotion);
criterion_main!(benches);

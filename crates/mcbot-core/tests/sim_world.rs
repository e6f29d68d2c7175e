use mcbot_core::{
    BlockPos, DigStatus, MoveDirection, NavWorld, PathGoal, SimWorld, Vec3, WorldMut, WorldView,
};

#[test]
fn navigator_stops_within_range_and_clears_near_goals() {
    let mut world = SimWorld::new();
    world.set_path_goal(PathGoal::Near {
        position: Vec3::new(10.0, 0.0, 0.0),
        range: 1.0,
    });

    for _ in 0..100 {
        world.step(0.05);
    }

    assert!(world.position.distance(Vec3::new(10.0, 0.0, 0.0)) <= 1.0);
    assert!(!world.is_pathing());
    assert_eq!(world.path_goal(), None);
    assert!(!world.has_move_intents());
}

#[test]
fn follow_goal_tracks_a_moving_entity() {
    let mut world = SimWorld::new();
    let alice = world.spawn_player("Alice", Vec3::new(5.0, 0.0, 0.0));
    world.set_path_goal(PathGoal::Follow {
        entity: alice,
        range: 2.0,
    });

    for _ in 0..40 {
        world.step(0.05);
    }
    assert!(world.position.distance(Vec3::new(5.0, 0.0, 0.0)) <= 2.0);

    world.move_entity(alice, Vec3::new(15.0, 0.0, 0.0));
    world.step(0.05);
    assert!(world.is_pathing());
    assert_eq!(world.move_intents(), vec![MoveDirection::Forward]);
}

#[test]
fn blocked_navigator_drops_the_goal() {
    let mut world = SimWorld::new();
    world.path_blocked = true;
    world.set_path_goal(PathGoal::Near {
        position: Vec3::new(10.0, 0.0, 0.0),
        range: 1.0,
    });
    world.step(0.05);
    assert_eq!(world.path_goal(), None);
    assert_eq!(world.position, Vec3::ZERO);
}

#[test]
fn digging_takes_time_and_yields_the_block() {
    let mut world = SimWorld::new();
    let pos = BlockPos::new(1, 0, 0);
    world.set_block(pos, "stone");

    assert_eq!(world.begin_dig(pos), DigStatus::Digging(pos));
    world.step(0.25);
    assert_eq!(world.dig_status(), DigStatus::Digging(pos));
    world.step(0.25);
    assert_eq!(world.dig_status(), DigStatus::Finished(pos));
    assert_eq!(world.block_at(pos), None);
    assert_eq!(world.item_count("stone"), 1);
}

#[test]
fn scripted_dig_failures_are_consumed_in_order() {
    let mut world = SimWorld::new();
    let pos = BlockPos::new(1, 0, 0);
    world.set_block(pos, "stone");
    world.fail_digs = 1;

    assert_eq!(world.begin_dig(pos), DigStatus::Failed(pos));
    assert_eq!(world.begin_dig(pos), DigStatus::Digging(pos));
}

#[test]
fn attacks_remove_dead_entities() {
    let mut world = SimWorld::new();
    let zombie = world.spawn_hostile("zombie", Vec3::new(2.0, 0.0, 0.0), 8.0);

    world.attack(zombie);
    assert!(world.entity(zombie).is_some());
    world.attack(zombie);
    assert!(world.entity(zombie).is_none());
    assert!(world.nearest_hostile(Vec3::ZERO, 10.0).is_none());
}

#[test]
fn disconnected_world_has_no_position_and_does_not_move() {
    let mut world = SimWorld::new();
    world.connected = false;
    world.set_path_goal(PathGoal::Near {
        position: Vec3::new(3.0, 0.0, 0.0),
        range: 0.5,
    });
    world.step(1.0);
    assert_eq!(world.position(), None);
    assert_eq!(world.position, Vec3::ZERO);
}

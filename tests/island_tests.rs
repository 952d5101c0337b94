use approx::assert_relative_eq;
use glam::Vec2;
use planar_dynamics::{BodyDef, FixtureDef, Shape, World};

fn ground(world: &mut World, half_width: f32) -> planar_dynamics::EntityId {
    let ground = world
        .create_body(&BodyDef::default().position(Vec2::new(0.0, -0.5)))
        .expect("world is unlocked");
    world.create_fixture(
        ground,
        &FixtureDef::new(Shape::boxy(half_width, 0.5)).friction(0.6),
    );
    ground
}

#[test]
fn box_comes_to_rest_and_sleeps() {
    let mut world = World::new(Vec2::new(0.0, -10.0));
    ground(&mut world, 10.0);

    let falling = world
        .create_body(&BodyDef::dynamic().position(Vec2::new(0.0, 1.0)))
        .expect("world is unlocked");
    world.create_fixture(
        falling,
        &FixtureDef::new(Shape::boxy(0.5, 0.5)).friction(0.6),
    );

    for _ in 0..300 {
        world.step(1.0 / 60.0, 8, 3);
    }

    let body = world.body(falling).expect("body exists");
    assert!(
        body.linear_velocity.length() < 0.01,
        "box still moving at {:?}",
        body.linear_velocity
    );
    assert!(!body.is_awake(), "box should have fallen asleep");
    // Resting on the ground surface, give or take solver slop.
    assert_relative_eq!(body.position().y, 0.5, epsilon = 0.02);
}

#[test]
fn distant_stacks_form_separate_islands() {
    let mut world = World::new(Vec2::new(0.0, -10.0));
    ground(&mut world, 50.0);

    for x in [-20.0, 20.0] {
        let body = world
            .create_body(&BodyDef::dynamic().position(Vec2::new(x, 0.6)))
            .expect("world is unlocked");
        world.create_fixture(body, &FixtureDef::new(Shape::boxy(0.5, 0.5)));
    }

    for _ in 0..5 {
        world.step(1.0 / 60.0, 8, 3);
    }

    // The shared static ground bounds both islands without merging them.
    assert_eq!(world.profiler.island_count, 2);
}

#[test]
fn variable_step_lengths_stay_stable() {
    let mut world = World::new(Vec2::new(0.0, -10.0));
    ground(&mut world, 10.0);

    let resting = world
        .create_body(&BodyDef::dynamic().position(Vec2::new(0.0, 0.6)))
        .expect("world is unlocked");
    world.create_fixture(
        resting,
        &FixtureDef::new(Shape::boxy(0.5, 0.5)).friction(0.6),
    );

    // Warm-started impulses get rescaled by the dt ratio each step; a
    // jittering clock must not pump energy into the contact.
    for i in 0..200 {
        let dt = if i % 2 == 0 { 1.0 / 60.0 } else { 1.0 / 120.0 };
        world.step(dt, 8, 3);
    }

    let body = world.body(resting).expect("body exists");
    assert!(
        body.linear_velocity.length() < 0.05,
        "box gained energy under variable dt: {:?}",
        body.linear_velocity
    );
    assert!(body.position().y < 0.6 && body.position().y > 0.4);
}

#[test]
fn sensors_report_touching_without_constraining() {
    let mut world = World::new(Vec2::ZERO);

    let prober = world
        .create_body(
            &BodyDef::dynamic()
                .position(Vec2::new(0.0, 0.0))
                .linear_velocity(Vec2::new(1.0, 0.0)),
        )
        .expect("world is unlocked");
    world.create_fixture(
        prober,
        &FixtureDef::new(Shape::circle(0.5)).sensor(true),
    );

    let target = world
        .create_body(&BodyDef::dynamic().position(Vec2::new(0.6, 0.0)))
        .expect("world is unlocked");
    world.create_fixture(
        target,
        &FixtureDef::new(Shape::circle(0.5)).sensor(true),
    );

    for _ in 0..5 {
        world.step(1.0 / 60.0, 8, 3);
    }

    let touching = world.contacts().any(|(_, contact)| contact.touching);
    assert!(touching, "overlapping sensors must report a touching contact");

    // No impulses: the prober keeps its full velocity, the target stays put.
    let prober = world.body(prober).expect("body exists");
    assert_relative_eq!(prober.linear_velocity.x, 1.0, epsilon = 1e-5);
    let target = world.body(target).expect("body exists");
    assert_eq!(target.linear_velocity, Vec2::ZERO);
}

#[test]
fn stacked_boxes_settle_together() {
    let mut world = World::new(Vec2::new(0.0, -10.0));
    ground(&mut world, 10.0);

    let mut boxes = Vec::new();
    for i in 0..2 {
        let body = world
            .create_body(
                &BodyDef::dynamic().position(Vec2::new(0.0, 0.55 + 1.05 * i as f32)),
            )
            .expect("world is unlocked");
        world.create_fixture(
            body,
            &FixtureDef::new(Shape::boxy(0.5, 0.5)).friction(0.6),
        );
        boxes.push(body);
    }

    for _ in 0..600 {
        world.step(1.0 / 60.0, 8, 3);
    }

    for body_id in boxes {
        let body = world.body(body_id).expect("body exists");
        assert!(
            body.linear_velocity.length() < 0.05,
            "stacked box still moving at {:?}",
            body.linear_velocity
        );
    }
}

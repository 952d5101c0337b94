use approx::assert_relative_eq;
use glam::Vec2;
use planar_dynamics::{BodyDef, FixtureDef, JointDef, Shape, World};

/// Kinetic energy of a body from its current state.
fn kinetic_energy(world: &World, body: planar_dynamics::EntityId) -> f32 {
    let body = world.body(body).expect("body exists");
    0.5 * body.mass * body.linear_velocity.length_squared()
        + 0.5 * body.inertia * body.angular_velocity * body.angular_velocity
}

#[test]
fn pinned_orbit_conserves_energy() {
    let mut world = World::builder()
        .gravity(Vec2::ZERO)
        .allow_sleep(false)
        .build();

    let anchor = world
        .create_body(&BodyDef::default())
        .expect("world is unlocked");
    world.create_fixture(anchor, &FixtureDef::new(Shape::circle(0.1)).density(0.0));

    // A bob rotating rigidly about the origin at 1 rad/s.
    let bob = world
        .create_body(
            &BodyDef::dynamic()
                .position(Vec2::new(1.0, 0.0))
                .linear_velocity(Vec2::new(0.0, 1.0))
                .angular_velocity(1.0),
        )
        .expect("world is unlocked");
    world.create_fixture(bob, &FixtureDef::new(Shape::circle(0.1)));

    world
        .create_revolute_joint(anchor, bob, Vec2::ZERO)
        .expect("world is unlocked");

    let initial = kinetic_energy(&world, bob);
    for _ in 0..60 {
        world.step(1.0 / 60.0, 8, 3);
    }
    let after = kinetic_energy(&world, bob);

    let drift = (after - initial).abs() / initial;
    assert!(
        drift < 0.05,
        "energy drifted by {:.1}% ({} -> {})",
        drift * 100.0,
        initial,
        after
    );

    // The bob stays on its circle around the anchor.
    let bob = world.body(bob).expect("body exists");
    assert_relative_eq!(bob.world_center().length(), 1.0, epsilon = 0.02);
}

#[test]
fn distance_joint_holds_its_length_under_gravity() {
    let mut world = World::builder()
        .gravity(Vec2::new(0.0, -10.0))
        .allow_sleep(false)
        .build();

    let anchor = world
        .create_body(&BodyDef::default().position(Vec2::new(0.0, 5.0)))
        .expect("world is unlocked");
    world.create_fixture(anchor, &FixtureDef::new(Shape::circle(0.1)).density(0.0));

    let bob = world
        .create_body(&BodyDef::dynamic().position(Vec2::new(2.0, 5.0)))
        .expect("world is unlocked");
    world.create_fixture(bob, &FixtureDef::new(Shape::circle(0.2)));

    world
        .create_joint(&JointDef::distance(
            anchor,
            bob,
            Vec2::ZERO,
            Vec2::ZERO,
            2.0,
        ))
        .expect("world is unlocked");

    for _ in 0..120 {
        world.step(1.0 / 60.0, 8, 3);
    }

    let bob = world.body(bob).expect("body exists");
    let distance = (bob.world_center() - Vec2::new(0.0, 5.0)).length();
    assert_relative_eq!(distance, 2.0, epsilon = 0.05);
}

#[test]
fn revolute_pendulum_swings_through_the_bottom() {
    let mut world = World::builder()
        .gravity(Vec2::new(0.0, -10.0))
        .allow_sleep(false)
        .build();

    let anchor = world
        .create_body(&BodyDef::default())
        .expect("world is unlocked");
    world.create_fixture(anchor, &FixtureDef::new(Shape::circle(0.1)).density(0.0));

    let bob = world
        .create_body(&BodyDef::dynamic().position(Vec2::new(1.0, 0.0)))
        .expect("world is unlocked");
    world.create_fixture(bob, &FixtureDef::new(Shape::circle(0.1)));

    world
        .create_revolute_joint(anchor, bob, Vec2::ZERO)
        .expect("world is unlocked");

    let mut lowest = f32::MAX;
    for _ in 0..120 {
        world.step(1.0 / 60.0, 8, 3);
        let y = world.body(bob).expect("body exists").world_center().y;
        lowest = lowest.min(y);
    }

    // Starting horizontal, the bob must pass near the bottom of its arc.
    assert!(lowest < -0.9, "pendulum never dropped, lowest y = {lowest}");
}

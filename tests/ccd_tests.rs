use glam::Vec2;
use planar_dynamics::{BodyDef, FixtureDef, Shape, World};

/// Thin static wall with its near face at x = 4.95.
fn wall(world: &mut World) {
    let wall = world
        .create_body(&BodyDef::default().position(Vec2::new(5.0, 0.0)))
        .expect("world is unlocked");
    world.create_fixture(wall, &FixtureDef::new(Shape::boxy(0.05, 5.0)));
}

fn projectile(world: &mut World, bullet: bool) -> planar_dynamics::EntityId {
    let body = world
        .create_body(
            &BodyDef::dynamic()
                .position(Vec2::new(3.5, 0.0))
                .linear_velocity(Vec2::new(300.0, 0.0))
                .bullet(bullet),
        )
        .expect("world is unlocked");
    world.create_fixture(body, &FixtureDef::new(Shape::boxy(0.1, 0.1)));
    body
}

#[test]
fn bullet_stops_at_thin_wall() {
    let mut world = World::new(Vec2::ZERO);
    wall(&mut world);
    let bullet = projectile(&mut world, true);

    world.step(1.0 / 60.0, 8, 3);

    let body = world.body(bullet).expect("body exists");
    assert!(
        body.position().x < 4.95,
        "bullet passed the wall face: x = {}",
        body.position().x
    );
}

#[test]
fn fast_non_bullet_also_stops_against_static_wall() {
    let mut world = World::new(Vec2::ZERO);
    wall(&mut world);
    let body_id = projectile(&mut world, false);

    world.step(1.0 / 60.0, 8, 3);

    // Pass one sweeps every dynamic body against static geometry.
    let body = world.body(body_id).expect("body exists");
    assert!(
        body.position().x < 4.95,
        "body passed the wall face: x = {}",
        body.position().x
    );
}

#[test]
fn disabling_continuous_physics_allows_tunneling() {
    let mut world = World::new(Vec2::ZERO);
    world.set_continuous_physics(false);
    wall(&mut world);
    let body_id = projectile(&mut world, true);

    world.step(1.0 / 60.0, 8, 3);

    let body = world.body(body_id).expect("body exists");
    assert!(
        body.position().x > 5.1,
        "expected tunneling, but x = {}",
        body.position().x
    );
}

#[test]
fn toi_counts_stay_bounded() {
    let mut world = World::new(Vec2::ZERO);
    wall(&mut world);
    projectile(&mut world, true);

    for _ in 0..10 {
        world.step(1.0 / 60.0, 8, 3);
    }

    for (_, contact) in world.contacts() {
        assert!(contact.toi_count <= 11, "toi_count = {}", contact.toi_count);
    }
}

#[test]
fn bullets_wait_for_the_discrete_pass_against_dynamic_bodies() {
    let mut world = World::new(Vec2::ZERO);

    // A resting dynamic target; the bullet may not tunnel through it.
    let target = world
        .create_body(&BodyDef::dynamic().position(Vec2::new(5.0, 0.0)))
        .expect("world is unlocked");
    world.create_fixture(target, &FixtureDef::new(Shape::boxy(0.05, 5.0)));

    let bullet = world
        .create_body(
            &BodyDef::dynamic()
                .position(Vec2::new(3.5, 0.0))
                .linear_velocity(Vec2::new(300.0, 0.0))
                .bullet(true),
        )
        .expect("world is unlocked");
    world.create_fixture(bullet, &FixtureDef::new(Shape::boxy(0.1, 0.1)));

    world.step(1.0 / 60.0, 8, 3);

    let body = world.body(bullet).expect("body exists");
    assert!(
        body.position().x < 4.95,
        "bullet tunneled through a dynamic body: x = {}",
        body.position().x
    );
}

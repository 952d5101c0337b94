use approx::assert_relative_eq;
use glam::Vec2;
use planar_dynamics::{BodyDef, FixtureDef, Shape, World};

fn drop_world() -> World {
    World::new(Vec2::new(0.0, -10.0))
}

#[test]
fn free_fall_integrates_semi_implicitly() {
    let mut world = drop_world();
    let body = world
        .create_body(&BodyDef::dynamic().position(Vec2::new(0.0, 10.0)))
        .expect("world is unlocked");
    world.create_fixture(body, &FixtureDef::new(Shape::circle(0.5)));

    world.step(1.0 / 60.0, 8, 3);

    let body = world.body(body).expect("body exists");
    // v = g * dt, then x += v * dt.
    assert_relative_eq!(body.linear_velocity.y, -10.0 / 60.0, epsilon = 1e-4);
    assert_relative_eq!(body.position().y, 10.0 - 10.0 / 3600.0, epsilon = 1e-4);
}

#[test]
fn zero_dt_step_changes_nothing() {
    let mut world = drop_world();
    let body = world
        .create_body(
            &BodyDef::dynamic()
                .position(Vec2::new(2.0, 5.0))
                .linear_velocity(Vec2::new(1.0, 3.0)),
        )
        .expect("world is unlocked");
    world.create_fixture(body, &FixtureDef::new(Shape::circle(0.5)));

    world.step(0.0, 8, 3);

    let body = world.body(body).expect("body exists");
    assert_relative_eq!(body.position().x, 2.0, epsilon = 1e-6);
    assert_relative_eq!(body.position().y, 5.0, epsilon = 1e-6);
    assert_relative_eq!(body.linear_velocity.x, 1.0, epsilon = 1e-6);
    assert_relative_eq!(body.linear_velocity.y, 3.0, epsilon = 1e-6);
}

#[test]
fn forces_clear_automatically_by_default() {
    let mut world = World::new(Vec2::ZERO);
    let body_id = world
        .create_body(&BodyDef::dynamic())
        .expect("world is unlocked");
    world.create_fixture(body_id, &FixtureDef::new(Shape::circle(0.5)));

    world
        .body_mut(body_id)
        .expect("body exists")
        .apply_force_to_center(Vec2::new(3.0, 4.0));
    world.step(1.0 / 60.0, 8, 3);

    let body = world.body(body_id).expect("body exists");
    assert_eq!(body.force, Vec2::ZERO);
    assert_eq!(body.torque, 0.0);
}

#[test]
fn forces_persist_when_auto_clear_is_off() {
    let mut world = World::new(Vec2::ZERO);
    world.set_auto_clear_forces(false);
    let body_id = world
        .create_body(&BodyDef::dynamic())
        .expect("world is unlocked");
    world.create_fixture(body_id, &FixtureDef::new(Shape::circle(0.5)));

    world
        .body_mut(body_id)
        .expect("body exists")
        .apply_force_to_center(Vec2::new(3.0, 0.0));
    world.step(1.0 / 60.0, 8, 3);

    assert_relative_eq!(
        world.body(body_id).expect("body exists").force.x,
        3.0,
        epsilon = 1e-6
    );

    world.clear_forces();
    assert_eq!(world.body(body_id).expect("body exists").force, Vec2::ZERO);
}

#[test]
fn static_bodies_do_not_move() {
    let mut world = drop_world();
    let body = world
        .create_body(&BodyDef::default().position(Vec2::new(0.0, 5.0)))
        .expect("world is unlocked");
    world.create_fixture(body, &FixtureDef::new(Shape::boxy(1.0, 1.0)));

    for _ in 0..10 {
        world.step(1.0 / 60.0, 8, 3);
    }

    let body = world.body(body).expect("body exists");
    assert_relative_eq!(body.position().y, 5.0, epsilon = 1e-6);
    assert_eq!(body.linear_velocity, Vec2::ZERO);
}

#[test]
fn gravity_scale_modulates_acceleration() {
    let mut world = drop_world();
    let floaty = world
        .create_body(&BodyDef::dynamic().gravity_scale(0.5))
        .expect("world is unlocked");
    world.create_fixture(floaty, &FixtureDef::new(Shape::circle(0.5)));

    world.step(1.0 / 60.0, 8, 3);

    assert_relative_eq!(
        world.body(floaty).expect("body exists").linear_velocity.y,
        -5.0 / 60.0,
        epsilon = 1e-5
    );
}

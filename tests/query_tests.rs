use approx::assert_relative_eq;
use glam::Vec2;
use planar_dynamics::{Aabb, BodyDef, FixtureDef, Shape, World};

fn circle_at(world: &mut World, position: Vec2, radius: f32) -> planar_dynamics::EntityId {
    let body = world
        .create_body(&BodyDef::default().position(position))
        .expect("world is unlocked");
    world
        .create_fixture(body, &FixtureDef::new(Shape::circle(radius)))
        .expect("world is unlocked")
}

#[test]
fn query_aabb_finds_overlapping_fixtures() {
    let mut world = World::new(Vec2::ZERO);
    let near = circle_at(&mut world, Vec2::new(5.0, 0.0), 1.0);
    circle_at(&mut world, Vec2::new(50.0, 0.0), 1.0);

    let mut found = Vec::new();
    world.query_aabb(&Aabb::new(Vec2::new(3.0, -2.0), Vec2::new(7.0, 2.0)), |f| {
        found.push(f);
        true
    });

    assert_eq!(found, vec![near]);
}

#[test]
fn query_aabb_stops_on_false() {
    let mut world = World::new(Vec2::ZERO);
    circle_at(&mut world, Vec2::new(0.0, 0.0), 1.0);
    circle_at(&mut world, Vec2::new(1.0, 0.0), 1.0);

    let mut visits = 0;
    world.query_aabb(
        &Aabb::new(Vec2::new(-5.0, -5.0), Vec2::new(5.0, 5.0)),
        |_| {
            visits += 1;
            false
        },
    );

    assert_eq!(visits, 1);
}

#[test]
fn ray_cast_reports_hit_point_and_fraction() {
    let mut world = World::new(Vec2::ZERO);
    circle_at(&mut world, Vec2::new(5.0, 0.0), 1.0);

    let mut best = None;
    world.ray_cast(Vec2::ZERO, Vec2::new(10.0, 0.0), |fixture, point, normal, fraction| {
        best = Some((fixture, point, normal, fraction));
        fraction
    });

    let (_, point, normal, fraction) = best.expect("the ray must hit the circle");
    assert_relative_eq!(fraction, 0.4, epsilon = 1e-4);
    assert_relative_eq!(point.x, 4.0, epsilon = 1e-4);
    assert_relative_eq!(normal.x, -1.0, epsilon = 1e-4);
}

#[test]
fn ray_cast_clips_to_the_nearest_hit() {
    let mut world = World::new(Vec2::ZERO);
    let near = circle_at(&mut world, Vec2::new(4.0, 0.0), 1.0);
    circle_at(&mut world, Vec2::new(8.0, 0.0), 1.0);

    let mut closest: Option<(planar_dynamics::EntityId, f32)> = None;
    world.ray_cast(Vec2::ZERO, Vec2::new(10.0, 0.0), |fixture, _, _, fraction| {
        if closest.map_or(true, |(_, f)| fraction < f) {
            closest = Some((fixture, fraction));
        }
        // Clip the ray so nothing farther can report.
        fraction
    });

    let (fixture, fraction) = closest.expect("the ray must hit something");
    assert_eq!(fixture, near);
    assert_relative_eq!(fraction, 0.3, epsilon = 1e-4);
}

#[test]
fn ray_cast_can_stop_at_first_hit() {
    let mut world = World::new(Vec2::ZERO);
    circle_at(&mut world, Vec2::new(4.0, 0.0), 1.0);
    circle_at(&mut world, Vec2::new(8.0, 0.0), 1.0);

    let mut hits = 0;
    world.ray_cast(Vec2::ZERO, Vec2::new(10.0, 0.0), |_, _, _, _| {
        hits += 1;
        0.0
    });

    assert_eq!(hits, 1);
}

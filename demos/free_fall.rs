use glam::Vec2;
use planar_dynamics::{BodyDef, FixtureDef, Shape, World};

fn main() {
    let mut world = World::new(Vec2::new(0.0, -10.0));

    let ball = world
        .create_body(&BodyDef::dynamic().position(Vec2::new(0.0, 10.0)))
        .expect("world is unlocked");
    world.create_fixture(ball, &FixtureDef::new(Shape::circle(0.5)));

    for i in 0..60 {
        world.step(1.0 / 60.0, 8, 3);
        if i % 10 == 0 {
            let body = world.body(ball).expect("ball exists");
            println!(
                "t = {:.2}s  y = {:+.3}  vy = {:+.3}",
                i as f32 / 60.0,
                body.position().y,
                body.linear_velocity.y
            );
        }
    }
}

use glam::Vec2;
use planar_dynamics::{BodyDef, FixtureDef, Shape, World};

fn main() {
    for continuous in [true, false] {
        let mut world = World::new(Vec2::ZERO);
        world.set_continuous_physics(continuous);

        let wall = world
            .create_body(&BodyDef::default().position(Vec2::new(5.0, 0.0)))
            .expect("world is unlocked");
        world.create_fixture(wall, &FixtureDef::new(Shape::boxy(0.05, 5.0)));

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

        let body = world.body(bullet).expect("bullet exists");
        println!(
            "continuous = {:5}  bullet x after one step = {:+.3}  ({})",
            continuous,
            body.position().x,
            if body.position().x < 5.0 {
                "stopped by the wall"
            } else {
                "tunneled through"
            }
        );
    }
}

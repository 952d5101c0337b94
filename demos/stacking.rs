use glam::Vec2;
use planar_dynamics::{BodyDef, FixtureDef, Shape, World};

fn main() {
    let mut world = World::new(Vec2::new(0.0, -10.0));

    let ground = world
        .create_body(&BodyDef::default().position(Vec2::new(0.0, -0.5)))
        .expect("world is unlocked");
    world.create_fixture(ground, &FixtureDef::new(Shape::boxy(10.0, 0.5)).friction(0.6));

    let mut stack = Vec::new();
    for i in 0..5 {
        let body = world
            .create_body(&BodyDef::dynamic().position(Vec2::new(0.0, 0.55 + 1.05 * i as f32)))
            .expect("world is unlocked");
        world.create_fixture(body, &FixtureDef::new(Shape::boxy(0.5, 0.5)).friction(0.6));
        stack.push(body);
    }

    for _ in 0..300 {
        world.step(1.0 / 60.0, 8, 3);
    }

    println!("stack after 5 seconds:");
    for (i, body_id) in stack.iter().enumerate() {
        let body = world.body(*body_id).expect("box exists");
        println!(
            "  box {}: y = {:+.3}  awake = {}",
            i,
            body.position().y,
            body.is_awake()
        );
    }
    println!(
        "islands last step: {}  contacts: {}",
        world.profiler.island_count,
        world.contact_count()
    );
}

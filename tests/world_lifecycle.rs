use glam::Vec2;
use planar_dynamics::{
    BodyDef, ContactListener, DestructionListener, EntityId, FixtureDef, Joint, JointDef, Shape,
    World,
};
use std::cell::RefCell;
use std::rc::Rc;

fn overlap_pair(world: &mut World) -> (EntityId, EntityId) {
    let a = world
        .create_body(&BodyDef::dynamic().position(Vec2::new(0.0, 0.0)))
        .expect("world is unlocked");
    world.create_fixture(a, &FixtureDef::new(Shape::circle(0.5)));
    let b = world
        .create_body(&BodyDef::dynamic().position(Vec2::new(0.5, 0.0)))
        .expect("world is unlocked");
    world.create_fixture(b, &FixtureDef::new(Shape::circle(0.5)));
    (a, b)
}

#[test]
fn counters_track_creation_and_destruction() {
    let mut world = World::new(Vec2::ZERO);
    let (a, b) = overlap_pair(&mut world);
    let joint = world
        .create_joint(&JointDef::distance(a, b, Vec2::ZERO, Vec2::ZERO, 0.5))
        .expect("world is unlocked");

    assert_eq!(world.body_count(), 2);
    assert_eq!(world.joint_count(), 1);
    assert_eq!(world.proxy_count(), 2);

    world.step(1.0 / 60.0, 8, 3);
    assert!(world.contact_count() <= 1);

    world.destroy_joint(joint);
    world.destroy_body(a);
    world.destroy_body(b);

    assert_eq!(world.body_count(), 0);
    assert_eq!(world.joint_count(), 0);
    assert_eq!(world.contact_count(), 0);
    assert_eq!(world.proxy_count(), 0);
}

#[test]
fn joint_edges_are_mirrored_on_both_endpoints() {
    let mut world = World::new(Vec2::ZERO);
    let (a, b) = overlap_pair(&mut world);
    let joint = world
        .create_joint(&JointDef::revolute(a, b, Vec2::ZERO, Vec2::ZERO))
        .expect("world is unlocked");

    let edges_a: Vec<_> = world
        .body(a)
        .expect("body exists")
        .joint_edges
        .iter()
        .filter(|edge| edge.joint == joint)
        .collect();
    assert_eq!(edges_a.len(), 1);
    assert_eq!(edges_a[0].other, b);

    let edges_b: Vec<_> = world
        .body(b)
        .expect("body exists")
        .joint_edges
        .iter()
        .filter(|edge| edge.joint == joint)
        .collect();
    assert_eq!(edges_b.len(), 1);
    assert_eq!(edges_b[0].other, a);

    world.destroy_joint(joint);
    assert!(world.body(a).expect("body exists").joint_edges.is_empty());
    assert!(world.body(b).expect("body exists").joint_edges.is_empty());
}

#[test]
fn destroying_a_body_tears_down_joints_first() {
    struct Goodbyes {
        joints: Rc<RefCell<u32>>,
    }
    impl DestructionListener for Goodbyes {
        fn say_goodbye_joint(&mut self, _joint: &Joint) {
            *self.joints.borrow_mut() += 1;
        }
    }

    let mut world = World::new(Vec2::ZERO);
    let (a, b) = overlap_pair(&mut world);
    world
        .create_joint(&JointDef::distance(a, b, Vec2::ZERO, Vec2::ZERO, 0.5))
        .expect("world is unlocked");

    let joints = Rc::new(RefCell::new(0));
    world.set_destruction_listener(Box::new(Goodbyes {
        joints: joints.clone(),
    }));

    world.destroy_body(a);

    assert_eq!(*joints.borrow(), 1);
    assert_eq!(world.joint_count(), 0);
    assert_eq!(world.body_count(), 1);
    // The survivor no longer references the dead joint.
    assert!(world.body(b).expect("body exists").joint_edges.is_empty());
}

#[test]
fn suppressing_joint_culls_existing_contact() {
    let mut world = World::new(Vec2::ZERO);
    let (a, b) = overlap_pair(&mut world);

    world.step(1.0 / 60.0, 8, 3);
    assert_eq!(world.contact_count(), 1);

    world
        .create_joint(&JointDef::revolute(a, b, Vec2::ZERO, Vec2::new(-0.5, 0.0)))
        .expect("world is unlocked");

    // The next collide pass re-filters and drops the pair.
    world.step(1.0 / 60.0, 8, 3);
    assert_eq!(world.contact_count(), 0);
}

#[test]
fn destroying_joint_wakes_both_endpoints() {
    let mut world = World::new(Vec2::ZERO);
    let (a, b) = overlap_pair(&mut world);
    let joint = world
        .create_joint(&JointDef::distance(a, b, Vec2::ZERO, Vec2::ZERO, 0.5))
        .expect("world is unlocked");

    world.body_mut(a).expect("body exists").set_awake(false);
    world.body_mut(b).expect("body exists").set_awake(false);

    world.destroy_joint(joint);

    assert!(world.body(a).expect("body exists").is_awake());
    assert!(world.body(b).expect("body exists").is_awake());
}

#[test]
fn create_body_during_callback_is_refused() {
    struct Creator {
        outcome: Rc<RefCell<Option<Option<EntityId>>>>,
    }
    impl ContactListener for Creator {
        fn begin_contact(&mut self, world: &mut World, _contact: EntityId) {
            assert!(world.is_locked());
            *self.outcome.borrow_mut() = Some(world.create_body(&BodyDef::dynamic()));
        }
    }

    let mut world = World::new(Vec2::ZERO);
    let _ = overlap_pair(&mut world);

    let outcome = Rc::new(RefCell::new(None));
    world.set_contact_listener(Box::new(Creator {
        outcome: outcome.clone(),
    }));

    world.step(1.0 / 60.0, 8, 3);

    assert_eq!(*outcome.borrow(), Some(None), "creation must be refused");
    assert_eq!(world.body_count(), 2);
    assert!(!world.is_locked());
}

#[test]
fn locked_flag_is_off_between_steps() {
    let mut world = World::new(Vec2::ZERO);
    assert!(!world.is_locked());
    world.step(1.0 / 60.0, 8, 3);
    assert!(!world.is_locked());
}

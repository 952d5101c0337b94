use crate::core::fixture::Fixture;
use crate::core::joint::Joint;
use crate::utils::handles::EntityId;
use crate::world::World;

/// Notified just before the world releases an entity it owns on the caller's
/// behalf (joints and fixtures torn down inside `destroy_body`).
pub trait DestructionListener {
    fn say_goodbye_joint(&mut self, _joint: &Joint) {}
    fn say_goodbye_fixture(&mut self, _fixture: &Fixture) {}
}

/// Decides whether two fixtures may produce a contact.
pub trait ContactFilter {
    fn should_collide(&mut self, fixture_a: &Fixture, fixture_b: &Fixture) -> bool;
}

/// Layer/mask filtering, the default policy.
#[derive(Debug, Default)]
pub struct DefaultContactFilter;

impl ContactFilter for DefaultContactFilter {
    fn should_collide(&mut self, fixture_a: &Fixture, fixture_b: &Fixture) -> bool {
        fixture_a.filter.accepts(&fixture_b.filter)
    }
}

/// Receives touch transitions. The world is locked for the duration of each
/// callback; structural mutations (create/destroy) no-op and return `None`.
pub trait ContactListener {
    fn begin_contact(&mut self, _world: &mut World, _contact: EntityId) {}
    fn end_contact(&mut self, _world: &mut World, _contact: EntityId) {}
}

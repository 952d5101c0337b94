use crate::collision::shapes::Shape;
use crate::utils::handles::EntityId;
use serde::{Deserialize, Serialize};

/// Collision filtering mask. Fixtures collide when each accepts the other's
/// layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Filter {
    pub layer: u32,
    pub mask: u32,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            layer: 1,
            mask: u32::MAX,
        }
    }
}

impl Filter {
    pub fn accepts(&self, other: &Filter) -> bool {
        (self.mask & other.layer) != 0 && (other.mask & self.layer) != 0
    }
}

/// Blueprint for a fixture attached via `World::create_fixture`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureDef {
    pub shape: Shape,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub sensor: bool,
    pub filter: Filter,
}

impl FixtureDef {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            density: 1.0,
            friction: 0.3,
            restitution: 0.0,
            sensor: false,
            filter: Filter::default(),
        }
    }

    pub fn density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }
}

/// A shape bound to a body with surface properties.
#[derive(Debug)]
pub struct Fixture {
    pub id: EntityId,
    pub body: EntityId,
    pub shape: Shape,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub sensor: bool,
    pub filter: Filter,
    /// Broad-phase proxy, present while the owning body is enabled.
    pub proxy: Option<EntityId>,
}

impl Fixture {
    pub fn from_def(id: EntityId, body: EntityId, def: &FixtureDef) -> Self {
        Self {
            id,
            body,
            shape: def.shape.clone(),
            density: def.density,
            friction: def.friction,
            restitution: def.restitution,
            sensor: def.sensor,
            filter: def.filter,
            proxy: None,
        }
    }
}

/// Friction mixing: geometric mean, so either surface can kill sliding.
pub fn mix_friction(a: f32, b: f32) -> f32 {
    (a * b).sqrt()
}

/// Restitution mixing: the bouncier surface wins.
pub fn mix_restitution(a: f32, b: f32) -> f32 {
    a.max(b)
}

use crate::collision::broadphase::BroadPhase;
use crate::core::fixture::Fixture;
use crate::core::math::{cross, cross_sv, Sweep, Transform};
use crate::utils::handles::{Arena, EntityId};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Simulation role of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyKind {
    /// Immovable, infinite mass.
    #[default]
    Static,
    /// Moved by velocity only, infinite mass.
    Kinematic,
    /// Fully simulated.
    Dynamic,
}

/// Adjacency record for one contact incident to a body.
#[derive(Debug, Clone, Copy)]
pub struct ContactEdge {
    pub other: EntityId,
    pub contact: EntityId,
}

/// Adjacency record for one joint incident to a body.
#[derive(Debug, Clone, Copy)]
pub struct JointEdge {
    pub other: EntityId,
    pub joint: EntityId,
}

/// Blueprint consumed by `World::create_body`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyDef {
    pub kind: BodyKind,
    pub position: Vec2,
    pub angle: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub gravity_scale: f32,
    pub allow_sleep: bool,
    pub awake: bool,
    pub bullet: bool,
    pub enabled: bool,
    pub fixed_rotation: bool,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            kind: BodyKind::Static,
            position: Vec2::ZERO,
            angle: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            gravity_scale: 1.0,
            allow_sleep: true,
            awake: true,
            bullet: false,
            enabled: true,
            fixed_rotation: false,
        }
    }
}

impl BodyDef {
    pub fn new(kind: BodyKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn dynamic() -> Self {
        Self::new(BodyKind::Dynamic)
    }

    pub fn kinematic() -> Self {
        Self::new(BodyKind::Kinematic)
    }

    pub fn position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn linear_velocity(mut self, velocity: Vec2) -> Self {
        self.linear_velocity = velocity;
        self
    }

    pub fn angular_velocity(mut self, velocity: f32) -> Self {
        self.angular_velocity = velocity;
        self
    }

    pub fn bullet(mut self, bullet: bool) -> Self {
        self.bullet = bullet;
        self
    }

    pub fn fixed_rotation(mut self, fixed: bool) -> Self {
        self.fixed_rotation = fixed;
        self
    }

    pub fn damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }
}

/// Rigid body owned by the world.
#[derive(Debug)]
pub struct Body {
    pub id: EntityId,
    pub kind: BodyKind,
    pub transform: Transform,
    pub sweep: Sweep,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub force: Vec2,
    pub torque: f32,
    pub mass: f32,
    pub inv_mass: f32,
    /// Rotational inertia about the center of mass.
    pub inertia: f32,
    pub inv_inertia: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub gravity_scale: f32,
    pub sleep_time: f32,

    pub island: bool,
    pub awake: bool,
    pub enabled: bool,
    pub bullet: bool,
    pub allow_sleep: bool,
    pub fixed_rotation: bool,
    /// Set once this body's continuous-collision pass has resolved it.
    pub toi_resolved: bool,
    /// Slot assigned while this body sits in the island being solved.
    pub island_index: usize,

    pub fixtures: Vec<EntityId>,
    pub contact_edges: Vec<ContactEdge>,
    pub joint_edges: Vec<JointEdge>,
}

impl Body {
    pub fn from_def(id: EntityId, def: &BodyDef) -> Self {
        let transform = Transform::new(def.position, def.angle);
        let sweep = Sweep {
            local_center: Vec2::ZERO,
            c0: def.position,
            c: def.position,
            a0: def.angle,
            a: def.angle,
            alpha0: 0.0,
        };
        let (mass, inv_mass) = match def.kind {
            BodyKind::Dynamic => (1.0, 1.0),
            _ => (0.0, 0.0),
        };
        Self {
            id,
            kind: def.kind,
            transform,
            sweep,
            linear_velocity: def.linear_velocity,
            angular_velocity: def.angular_velocity,
            force: Vec2::ZERO,
            torque: 0.0,
            mass,
            inv_mass,
            inertia: 0.0,
            inv_inertia: 0.0,
            linear_damping: def.linear_damping,
            angular_damping: def.angular_damping,
            gravity_scale: def.gravity_scale,
            sleep_time: 0.0,
            island: false,
            awake: def.awake,
            enabled: def.enabled,
            bullet: def.bullet,
            allow_sleep: def.allow_sleep,
            fixed_rotation: def.fixed_rotation,
            toi_resolved: false,
            island_index: 0,
            fixtures: Vec::new(),
            contact_edges: Vec::new(),
            joint_edges: Vec::new(),
        }
    }

    pub fn is_static(&self) -> bool {
        self.kind == BodyKind::Static
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    pub fn is_awake(&self) -> bool {
        self.awake
    }

    /// Center of mass in world coordinates.
    pub fn world_center(&self) -> Vec2 {
        self.sweep.c
    }

    pub fn position(&self) -> Vec2 {
        self.transform.p
    }

    pub fn angle(&self) -> f32 {
        self.sweep.a
    }

    pub fn local_point(&self, world_point: Vec2) -> Vec2 {
        self.transform.apply_inv(world_point)
    }

    pub fn world_point(&self, local_point: Vec2) -> Vec2 {
        self.transform.apply(local_point)
    }

    pub fn set_awake(&mut self, awake: bool) {
        if awake {
            if !self.awake {
                self.awake = true;
                self.sleep_time = 0.0;
            }
        } else {
            self.awake = false;
            self.sleep_time = 0.0;
            self.linear_velocity = Vec2::ZERO;
            self.angular_velocity = 0.0;
            self.force = Vec2::ZERO;
            self.torque = 0.0;
        }
    }

    pub fn apply_force(&mut self, force: Vec2, point: Vec2) {
        if !self.is_dynamic() {
            return;
        }
        self.set_awake(true);
        self.force += force;
        self.torque += cross(point - self.sweep.c, force);
    }

    pub fn apply_force_to_center(&mut self, force: Vec2) {
        if !self.is_dynamic() {
            return;
        }
        self.set_awake(true);
        self.force += force;
    }

    pub fn apply_torque(&mut self, torque: f32) {
        if !self.is_dynamic() {
            return;
        }
        self.set_awake(true);
        self.torque += torque;
    }

    pub fn apply_linear_impulse(&mut self, impulse: Vec2, point: Vec2) {
        if !self.is_dynamic() {
            return;
        }
        self.set_awake(true);
        self.linear_velocity += self.inv_mass * impulse;
        self.angular_velocity += self.inv_inertia * cross(point - self.sweep.c, impulse);
    }

    pub fn apply_angular_impulse(&mut self, impulse: f32) {
        if !self.is_dynamic() {
            return;
        }
        self.set_awake(true);
        self.angular_velocity += self.inv_inertia * impulse;
    }

    /// Rebuilds the body-origin transform from the sweep's end pose.
    pub fn synchronize_transform(&mut self) {
        self.transform = Transform::new(Vec2::ZERO, self.sweep.a);
        self.transform.p = self.sweep.c - self.transform.q.apply(self.sweep.local_center);
    }

    /// Advances the sweep to normalized step time `alpha` and pins the body
    /// there, discarding the remaining interpolation interval.
    pub fn advance(&mut self, alpha: f32) {
        self.sweep.advance(alpha);
        self.sweep.c = self.sweep.c0;
        self.sweep.a = self.sweep.a0;
        self.synchronize_transform();
    }

    /// Recomputes mass, center of mass, and inertia from the fixtures.
    pub fn reset_mass_data(&mut self, fixtures: &Arena<Fixture>) {
        self.mass = 0.0;
        self.inv_mass = 0.0;
        self.inertia = 0.0;
        self.inv_inertia = 0.0;
        self.sweep.local_center = Vec2::ZERO;

        if !self.is_dynamic() {
            self.sweep.c0 = self.transform.p;
            self.sweep.c = self.transform.p;
            self.sweep.a0 = self.sweep.a;
            return;
        }

        let mut center = Vec2::ZERO;
        let mut inertia_about_origin = 0.0;
        for fixture_id in &self.fixtures {
            let fixture = match fixtures.get(*fixture_id) {
                Some(fixture) => fixture,
                None => continue,
            };
            if fixture.density == 0.0 {
                continue;
            }
            let mass_data = fixture.shape.compute_mass(fixture.density);
            self.mass += mass_data.mass;
            center += mass_data.mass * mass_data.center;
            inertia_about_origin += mass_data.inertia;
        }

        if self.mass > 0.0 {
            self.inv_mass = 1.0 / self.mass;
            center *= self.inv_mass;
        } else {
            // Dynamic bodies always carry some mass.
            self.mass = 1.0;
            self.inv_mass = 1.0;
        }

        if inertia_about_origin > 0.0 && !self.fixed_rotation {
            self.inertia = inertia_about_origin - self.mass * center.length_squared();
            debug_assert!(self.inertia > 0.0);
            self.inv_inertia = 1.0 / self.inertia;
        }

        let old_center = self.sweep.c;
        self.sweep.local_center = center;
        self.sweep.c = self.transform.apply(center);
        self.sweep.c0 = self.sweep.c;

        // The velocity of the new center includes rotation about the old one.
        self.linear_velocity += cross_sv(self.angular_velocity, self.sweep.c - old_center);
    }

    /// Pushes the swept AABB of every fixture into the broad phase.
    pub fn synchronize_fixtures(&self, fixtures: &Arena<Fixture>, broad_phase: &mut BroadPhase) {
        let q0 = crate::core::math::Rot::new(self.sweep.a0);
        let xf0 = Transform {
            p: self.sweep.c0 - q0.apply(self.sweep.local_center),
            q: q0,
        };
        let displacement = self.sweep.c - self.sweep.c0;

        for fixture_id in &self.fixtures {
            let fixture = match fixtures.get(*fixture_id) {
                Some(fixture) => fixture,
                None => continue,
            };
            let proxy = match fixture.proxy {
                Some(proxy) => proxy,
                None => continue,
            };
            let aabb = fixture
                .shape
                .compute_aabb(&xf0)
                .union(&fixture.shape.compute_aabb(&self.transform));
            broad_phase.move_proxy(proxy, aabb, displacement);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::shapes::Shape;
    use crate::core::fixture::{Fixture, FixtureDef};
    use approx::assert_relative_eq;

    #[test]
    fn mass_follows_fixtures() {
        let mut fixtures = Arena::new();
        let body_id = EntityId::new(0, 0);
        let mut body = Body::from_def(body_id, &BodyDef::dynamic());

        let def = FixtureDef::new(Shape::boxy(0.5, 0.5)).density(2.0);
        let fixture_id = fixtures.insert(Fixture::from_def(EntityId::default(), body_id, &def));
        body.fixtures.push(fixture_id);
        body.reset_mass_data(&fixtures);

        assert_relative_eq!(body.mass, 2.0, epsilon = 1e-5);
        assert_relative_eq!(body.inv_mass, 0.5, epsilon = 1e-5);
        assert!(body.inertia > 0.0);
    }

    #[test]
    fn sleeping_clears_motion() {
        let mut body = Body::from_def(
            EntityId::new(0, 0),
            &BodyDef::dynamic().linear_velocity(Vec2::new(3.0, 0.0)),
        );
        body.torque = 5.0;
        body.set_awake(false);
        assert_eq!(body.linear_velocity, Vec2::ZERO);
        assert_eq!(body.torque, 0.0);
        assert!(!body.is_awake());
    }

    #[test]
    fn impulses_ignore_non_dynamic_bodies() {
        let mut body = Body::from_def(EntityId::new(0, 0), &BodyDef::default());
        body.apply_linear_impulse(Vec2::new(10.0, 0.0), Vec2::ZERO);
        assert_eq!(body.linear_velocity, Vec2::ZERO);
    }
}

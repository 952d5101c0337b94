mod contact_manager;

pub use contact_manager::ContactManager;

use crate::callbacks::{ContactFilter, ContactListener, DefaultContactFilter, DestructionListener};
use crate::collision::broadphase::BroadPhase;
use crate::collision::shapes::{Aabb, RayCastInput};
use crate::collision::toi::{calculate_time_of_impact, ToiInput, ToiOutput};
use crate::config::{
    DEFAULT_GRAVITY, MAX_TOI_CONTACTS, MAX_TOI_COUNT, MAX_TOI_POSITION_ITERATIONS,
    MAX_TOI_SCAN_ITERATIONS, TOI_BAUMGARTE,
};
use crate::core::body::{Body, BodyDef, BodyKind, JointEdge};
use crate::core::fixture::{Fixture, FixtureDef};
use crate::core::joint::{Joint, JointDef};
use crate::dynamics::contact::{Contact, TouchEvent};
use crate::dynamics::island::Island;
use crate::dynamics::toi_solver::ToiSolver;
use crate::dynamics::TimeStep;
use crate::utils::handles::{Arena, EntityId};
use crate::utils::logging::{ScopedTimer, StepProfiler};
use glam::Vec2;
use log::warn;
use std::time::Instant;

/// Central simulation container orchestrating all subsystems.
///
/// Owns every body, fixture, joint, and contact. `step` is the sole mutating
/// entry point besides the explicit create/destroy APIs; user callbacks run
/// under a lock that turns structural mutation into a no-op.
pub struct World {
    gravity: Vec2,
    bodies: Arena<Body>,
    fixtures: Arena<Fixture>,
    joints: Arena<Joint>,
    contact_manager: ContactManager,
    broad_phase: BroadPhase,

    // Reusable solve-time buffers.
    island: Island,
    stack: Vec<EntityId>,
    toi_contacts: Vec<EntityId>,
    toi_solver: ToiSolver,

    allow_sleep: bool,
    warm_starting: bool,
    continuous_physics: bool,
    auto_clear_forces: bool,
    new_fixture: bool,
    locked: bool,
    /// Inverse of the most recent nonzero dt, for warm-starting ratios.
    inv_dt0: f32,

    destruction_listener: Option<Box<dyn DestructionListener>>,
    contact_filter: Box<dyn ContactFilter>,
    contact_listener: Option<Box<dyn ContactListener>>,

    pub profiler: StepProfiler,
}

impl World {
    pub fn new(gravity: Vec2) -> Self {
        Self::builder().gravity(gravity).build()
    }

    pub fn builder() -> WorldBuilder {
        WorldBuilder::new()
    }
}

pub struct WorldBuilder {
    gravity: Vec2,
    allow_sleep: bool,
}

impl Default for WorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self {
            gravity: Vec2::from_slice(&DEFAULT_GRAVITY),
            allow_sleep: true,
        }
    }

    pub fn gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn allow_sleep(mut self, allow: bool) -> Self {
        self.allow_sleep = allow;
        self
    }

    pub fn build(self) -> World {
        World {
            gravity: self.gravity,
            bodies: Arena::new(),
            fixtures: Arena::new(),
            joints: Arena::new(),
            contact_manager: ContactManager::new(),
            broad_phase: BroadPhase::default(),
            island: Island::default(),
            stack: Vec::new(),
            toi_contacts: Vec::with_capacity(MAX_TOI_CONTACTS),
            toi_solver: ToiSolver::default(),
            allow_sleep: self.allow_sleep,
            warm_starting: true,
            continuous_physics: true,
            auto_clear_forces: true,
            new_fixture: false,
            locked: false,
            inv_dt0: 0.0,
            destruction_listener: None,
            contact_filter: Box::new(DefaultContactFilter),
            contact_listener: None,
            profiler: StepProfiler::default(),
        }
    }
}

impl World {
    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn warm_starting(&self) -> bool {
        self.warm_starting
    }

    pub fn set_warm_starting(&mut self, enabled: bool) {
        self.warm_starting = enabled;
    }

    pub fn continuous_physics(&self) -> bool {
        self.continuous_physics
    }

    pub fn set_continuous_physics(&mut self, enabled: bool) {
        self.continuous_physics = enabled;
    }

    pub fn auto_clear_forces(&self) -> bool {
        self.auto_clear_forces
    }

    pub fn set_auto_clear_forces(&mut self, enabled: bool) {
        self.auto_clear_forces = enabled;
    }

    pub fn allow_sleeping(&self) -> bool {
        self.allow_sleep
    }

    pub fn set_allow_sleeping(&mut self, allow: bool) {
        if allow == self.allow_sleep {
            return;
        }
        self.allow_sleep = allow;
        if !allow {
            for (_, body) in self.bodies.iter_mut() {
                body.set_awake(true);
            }
        }
    }

    pub fn set_destruction_listener(&mut self, listener: Box<dyn DestructionListener>) {
        self.destruction_listener = Some(listener);
    }

    pub fn set_contact_filter(&mut self, filter: Box<dyn ContactFilter>) {
        self.contact_filter = filter;
    }

    pub fn set_contact_listener(&mut self, listener: Box<dyn ContactListener>) {
        self.contact_listener = Some(listener);
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn contact_count(&self) -> usize {
        self.contact_manager.contacts.len()
    }

    pub fn proxy_count(&self) -> usize {
        self.broad_phase.proxy_count()
    }

    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    pub fn fixture(&self, id: EntityId) -> Option<&Fixture> {
        self.fixtures.get(id)
    }

    pub fn joint(&self, id: EntityId) -> Option<&Joint> {
        self.joints.get(id)
    }

    pub fn contact(&self, id: EntityId) -> Option<&Contact> {
        self.contact_manager.contacts.get(id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (EntityId, &Body)> + '_ {
        self.bodies.iter()
    }

    pub fn joints(&self) -> impl Iterator<Item = (EntityId, &Joint)> + '_ {
        self.joints.iter()
    }

    pub fn contacts(&self) -> impl Iterator<Item = (EntityId, &Contact)> + '_ {
        self.contact_manager.contacts.iter()
    }

    /// Suppresses or re-enables a contact's response for the current step.
    /// Intended for use inside contact callbacks.
    pub fn set_contact_enabled(&mut self, contact: EntityId, enabled: bool) {
        if let Some(contact) = self.contact_manager.contacts.get_mut(contact) {
            contact.enabled = enabled;
        }
    }

    pub fn create_body(&mut self, def: &BodyDef) -> Option<EntityId> {
        if self.refuse_locked("create_body") {
            return None;
        }
        let id = self.bodies.insert(Body::from_def(EntityId::default(), def));
        if let Some(body) = self.bodies.get_mut(id) {
            body.id = id;
        }
        Some(id)
    }

    /// Destroys a body and everything attached to it: joints first (announced
    /// to the destruction listener), then contacts, then fixtures.
    pub fn destroy_body(&mut self, body_id: EntityId) {
        if self.refuse_locked("destroy_body") {
            return;
        }
        if self.bodies.get(body_id).is_none() {
            return;
        }

        let joint_ids: Vec<EntityId> = self
            .bodies
            .get(body_id)
            .map(|b| b.joint_edges.iter().map(|edge| edge.joint).collect())
            .unwrap_or_default();
        for joint_id in joint_ids {
            self.destroy_joint_internal(joint_id, true);
        }

        let contact_ids: Vec<EntityId> = self
            .bodies
            .get(body_id)
            .map(|b| b.contact_edges.iter().map(|edge| edge.contact).collect())
            .unwrap_or_default();
        for contact_id in contact_ids {
            self.destroy_contact(contact_id);
        }

        let fixture_ids: Vec<EntityId> = self
            .bodies
            .get(body_id)
            .map(|b| b.fixtures.clone())
            .unwrap_or_default();
        for fixture_id in fixture_ids {
            if let Some(fixture) = self.fixtures.get(fixture_id) {
                if let Some(mut listener) = self.destruction_listener.take() {
                    listener.say_goodbye_fixture(fixture);
                    self.destruction_listener = Some(listener);
                }
            }
            if let Some(fixture) = self.fixtures.remove(fixture_id) {
                if let Some(proxy) = fixture.proxy {
                    self.broad_phase.destroy_proxy(proxy);
                }
            }
        }

        self.bodies.remove(body_id);
    }

    /// Attaches a fixture to a body and schedules new-contact discovery for
    /// the next step.
    pub fn create_fixture(&mut self, body_id: EntityId, def: &FixtureDef) -> Option<EntityId> {
        if self.refuse_locked("create_fixture") {
            return None;
        }
        self.bodies.get(body_id)?;

        let fixture_id = self
            .fixtures
            .insert(Fixture::from_def(EntityId::default(), body_id, def));
        if let Some(fixture) = self.fixtures.get_mut(fixture_id) {
            fixture.id = fixture_id;
        }

        let enabled = {
            let body = match self.bodies.get_mut(body_id) {
                Some(body) => body,
                None => return None,
            };
            body.fixtures.push(fixture_id);
            body.enabled
        };

        if enabled {
            let transform = self.bodies.get(body_id).map(|b| b.transform);
            if let (Some(fixture), Some(xf)) = (self.fixtures.get_mut(fixture_id), transform) {
                let aabb = fixture.shape.compute_aabb(&xf);
                fixture.proxy = Some(self.broad_phase.create_proxy(aabb, fixture_id));
            }
        }

        if let Some(body) = self.bodies.get_mut(body_id) {
            body.reset_mass_data(&self.fixtures);
        }
        self.new_fixture = true;
        Some(fixture_id)
    }

    /// Detaches and destroys a fixture, dropping contacts that involved it.
    pub fn destroy_fixture(&mut self, fixture_id: EntityId) {
        if self.refuse_locked("destroy_fixture") {
            return;
        }
        let body_id = match self.fixtures.get(fixture_id) {
            Some(fixture) => fixture.body,
            None => return,
        };

        let stale_contacts: Vec<EntityId> = self
            .bodies
            .get(body_id)
            .map(|body| {
                body.contact_edges
                    .iter()
                    .filter(|edge| {
                        self.contact_manager
                            .contacts
                            .get(edge.contact)
                            .is_some_and(|c| {
                                c.fixture_a == fixture_id || c.fixture_b == fixture_id
                            })
                    })
                    .map(|edge| edge.contact)
                    .collect()
            })
            .unwrap_or_default();
        for contact_id in stale_contacts {
            self.destroy_contact(contact_id);
        }

        if let Some(fixture) = self.fixtures.remove(fixture_id) {
            if let Some(proxy) = fixture.proxy {
                self.broad_phase.destroy_proxy(proxy);
            }
        }
        if let Some(body) = self.bodies.get_mut(body_id) {
            body.fixtures.retain(|f| *f != fixture_id);
            body.reset_mass_data(&self.fixtures);
        }
    }

    pub fn create_joint(&mut self, def: &JointDef) -> Option<EntityId> {
        if self.refuse_locked("create_joint") {
            return None;
        }
        let (body_a, body_b) = (def.body_a(), def.body_b());
        if self.bodies.get(body_a).is_none() || self.bodies.get(body_b).is_none() {
            return None;
        }

        let id = self.joints.insert(Joint::from_def(EntityId::default(), def));
        if let Some(joint) = self.joints.get_mut(id) {
            joint.id = id;
        }

        if let Some(body) = self.bodies.get_mut(body_a) {
            body.joint_edges.push(JointEdge {
                other: body_b,
                joint: id,
            });
        }
        if let Some(body) = self.bodies.get_mut(body_b) {
            body.joint_edges.push(JointEdge {
                other: body_a,
                joint: id,
            });
        }

        // Suppressed pairs get culled at the next collide pass.
        if !def.collides_connected() {
            self.contact_manager
                .flag_for_filtering(&self.bodies, body_a, body_b);
        }
        Some(id)
    }

    /// Convenience constructor pinning two bodies at a world-space anchor.
    pub fn create_revolute_joint(
        &mut self,
        body_a: EntityId,
        body_b: EntityId,
        world_anchor: Vec2,
    ) -> Option<EntityId> {
        let local_anchor_a = self.bodies.get(body_a)?.local_point(world_anchor);
        let local_anchor_b = self.bodies.get(body_b)?.local_point(world_anchor);
        self.create_joint(&JointDef::revolute(
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
        ))
    }

    pub fn destroy_joint(&mut self, joint_id: EntityId) {
        if self.refuse_locked("destroy_joint") {
            return;
        }
        self.destroy_joint_internal(joint_id, false);
    }

    fn destroy_joint_internal(&mut self, joint_id: EntityId, announce: bool) {
        if announce {
            if let Some(joint) = self.joints.get(joint_id) {
                if let Some(mut listener) = self.destruction_listener.take() {
                    listener.say_goodbye_joint(joint);
                    self.destruction_listener = Some(listener);
                }
            }
        }
        let joint = match self.joints.remove(joint_id) {
            Some(joint) => joint,
            None => return,
        };

        for body_id in [joint.body_a, joint.body_b] {
            if let Some(body) = self.bodies.get_mut(body_id) {
                body.joint_edges.retain(|edge| edge.joint != joint_id);
                body.set_awake(true);
            }
        }

        // The pair may collide again; let the filter re-evaluate it.
        if !joint.collide_connected {
            self.contact_manager
                .flag_for_filtering(&self.bodies, joint.body_a, joint.body_b);
        }
    }

    /// Moves a body instantaneously, bypassing the solver.
    pub fn set_body_transform(&mut self, body_id: EntityId, position: Vec2, angle: f32) {
        if self.refuse_locked("set_body_transform") {
            return;
        }
        let body = match self.bodies.get_mut(body_id) {
            Some(body) => body,
            None => return,
        };
        body.transform = crate::core::math::Transform::new(position, angle);
        body.sweep.c = body.transform.apply(body.sweep.local_center);
        body.sweep.c0 = body.sweep.c;
        body.sweep.a = angle;
        body.sweep.a0 = angle;
        body.synchronize_fixtures(&self.fixtures, &mut self.broad_phase);
    }

    /// Zeroes every body's force and torque accumulators.
    pub fn clear_forces(&mut self) {
        for (_, body) in self.bodies.iter_mut() {
            body.force = Vec2::ZERO;
            body.torque = 0.0;
        }
    }

    /// Advances the simulation: collision, island solve, continuous pass.
    pub fn step(&mut self, dt: f32, velocity_iterations: u32, position_iterations: u32) {
        let step_start = Instant::now();
        self.profiler.reset();

        // Contacts must exist for fixtures added since the last step before
        // any velocity is integrated.
        if self.new_fixture {
            self.find_new_contacts();
            self.new_fixture = false;
        }

        self.locked = true;

        let step = TimeStep {
            dt,
            inv_dt: if dt > 0.0 { 1.0 / dt } else { 0.0 },
            dt_ratio: self.inv_dt0 * dt,
            velocity_iterations,
            position_iterations,
            warm_starting: self.warm_starting,
        };

        let events = {
            let _timer = ScopedTimer::new(&mut self.profiler.collide_time);
            self.contact_manager.collide(
                &self.broad_phase,
                &mut self.bodies,
                &self.fixtures,
                &self.joints,
                self.contact_filter.as_mut(),
            )
        };
        for (contact_id, event) in events {
            self.fire_touch_event(contact_id, event);
        }

        if dt > 0.0 {
            let start = Instant::now();
            self.solve(&step);
            self.profiler.solve_time = start.elapsed();
        }

        if self.continuous_physics && dt > 0.0 {
            let start = Instant::now();
            self.solve_toi();
            self.profiler.toi_time = start.elapsed();
        }

        // Island membership is only meaningful within a step.
        for (_, body) in self.bodies.iter_mut() {
            if !body.is_static() {
                body.island = false;
            }
        }

        if dt > 0.0 {
            self.inv_dt0 = step.inv_dt;
        }

        if self.auto_clear_forces {
            self.clear_forces();
        }

        self.locked = false;

        self.profiler.body_count = self.bodies.len();
        self.profiler.contact_count = self.contact_manager.contacts.len();
        self.profiler.step_time = step_start.elapsed();
        self.profiler.report();
    }

    /// Builds and solves islands: maximal connected components of the awake,
    /// enabled, non-static constraint graph.
    fn solve(&mut self, step: &TimeStep) {
        let World {
            bodies,
            fixtures,
            joints,
            contact_manager,
            broad_phase,
            island,
            stack,
            profiler,
            gravity,
            allow_sleep,
            contact_filter,
            ..
        } = self;

        for (_, body) in bodies.iter_mut() {
            body.island = false;
        }
        for (_, contact) in contact_manager.contacts.iter_mut() {
            contact.island = false;
        }
        for (_, joint) in joints.iter_mut() {
            joint.island = false;
        }

        let seed_ids: Vec<EntityId> = bodies.ids().collect();
        for seed_id in &seed_ids {
            {
                let seed = match bodies.get(*seed_id) {
                    Some(seed) => seed,
                    None => continue,
                };
                if seed.island || !seed.is_awake() || !seed.enabled || seed.is_static() {
                    continue;
                }
            }

            island.clear();
            stack.clear();
            stack.push(*seed_id);
            if let Some(seed) = bodies.get_mut(*seed_id) {
                seed.island = true;
            }

            while let Some(body_id) = stack.pop() {
                island.add_body(body_id);
                {
                    let body = match bodies.get_mut(body_id) {
                        Some(body) => body,
                        None => continue,
                    };
                    debug_assert!(body.enabled);
                    body.set_awake(true);

                    // Statics bound islands; they never pull neighbors in.
                    if body.is_static() {
                        continue;
                    }
                }

                let contact_edge_count =
                    bodies.get(body_id).map_or(0, |b| b.contact_edges.len());
                for i in 0..contact_edge_count {
                    let edge = match bodies.get(body_id) {
                        Some(body) => body.contact_edges[i],
                        None => break,
                    };
                    let skip = match contact_manager.contacts.get(edge.contact) {
                        Some(contact) => {
                            contact.island || !contact.enabled || !contact.touching
                        }
                        None => true,
                    };
                    if skip {
                        continue;
                    }
                    // Sensors report touches but never constrain motion.
                    let sensor = match contact_manager.contacts.get(edge.contact) {
                        Some(contact) => {
                            fixtures.get(contact.fixture_a).is_some_and(|f| f.sensor)
                                || fixtures.get(contact.fixture_b).is_some_and(|f| f.sensor)
                        }
                        None => true,
                    };
                    if sensor {
                        continue;
                    }

                    if let Some(contact) = contact_manager.contacts.get_mut(edge.contact) {
                        contact.island = true;
                    }
                    island.add_contact(edge.contact);

                    if let Some(other) = bodies.get_mut(edge.other) {
                        if !other.island {
                            other.island = true;
                            stack.push(edge.other);
                        }
                    }
                }

                let joint_edge_count = bodies.get(body_id).map_or(0, |b| b.joint_edges.len());
                for i in 0..joint_edge_count {
                    let edge = match bodies.get(body_id) {
                        Some(body) => body.joint_edges[i],
                        None => break,
                    };
                    let skip = match joints.get(edge.joint) {
                        Some(joint) => joint.island,
                        None => true,
                    };
                    if skip {
                        continue;
                    }
                    // Joints to disabled bodies stay out of the solve.
                    let other_enabled = bodies.get(edge.other).is_some_and(|b| b.enabled);
                    if !other_enabled {
                        continue;
                    }

                    if let Some(joint) = joints.get_mut(edge.joint) {
                        joint.island = true;
                    }
                    island.add_joint(edge.joint);

                    if let Some(other) = bodies.get_mut(edge.other) {
                        if !other.island {
                            other.island = true;
                            stack.push(edge.other);
                        }
                    }
                }
            }

            island.solve(
                step,
                *gravity,
                *allow_sleep,
                bodies,
                fixtures,
                &mut contact_manager.contacts,
                joints,
            );
            profiler.island_count += 1;

            // Statics may seed traversal again from another island this step.
            for body_id in &island.bodies {
                if let Some(body) = bodies.get_mut(*body_id) {
                    if body.is_static() {
                        body.island = false;
                    }
                }
            }
        }

        for body_id in &seed_ids {
            let moved = match bodies.get(*body_id) {
                Some(body) => body.island && !body.is_static(),
                None => false,
            };
            if !moved {
                continue;
            }
            if let Some(body) = bodies.get(*body_id) {
                body.synchronize_fixtures(fixtures, broad_phase);
            }
        }

        contact_manager.find_new_contacts(
            broad_phase,
            bodies,
            fixtures,
            joints,
            contact_filter.as_mut(),
        );
    }

    /// Continuous-collision pass: advances fast bodies to their earliest
    /// impact. Non-bullets resolve against static and kinematic geometry
    /// first; bullets then collide against the already-resolved backdrop.
    fn solve_toi(&mut self) {
        for (_, contact) in self.contact_manager.contacts.iter_mut() {
            contact.enabled = true;
            contact.toi_count = 0;
        }
        for (_, body) in self.bodies.iter_mut() {
            body.sweep.alpha0 = 0.0;
            if !body.island {
                // Did not move this step; collapse the sweep interval.
                body.sweep.c0 = body.sweep.c;
                body.sweep.a0 = body.sweep.a;
            }
            body.toi_resolved = !body.island || body.kind != BodyKind::Dynamic;
        }

        let body_ids: Vec<EntityId> = self.bodies.ids().collect();

        for pass_bullets in [false, true] {
            for body_id in &body_ids {
                let eligible = match self.bodies.get(*body_id) {
                    Some(body) => !body.toi_resolved && body.bullet == pass_bullets,
                    None => false,
                };
                if !eligible {
                    continue;
                }
                self.solve_toi_body(*body_id);
                if let Some(body) = self.bodies.get_mut(*body_id) {
                    body.toi_resolved = true;
                }
            }
        }
    }

    /// Advances one body to its minimum time of impact and applies a
    /// position-only correction there.
    fn solve_toi_body(&mut self, body_id: EntityId) {
        let bullet = match self.bodies.get(body_id) {
            Some(body) => body.bullet,
            None => return,
        };

        // Contacts the user disables mid-flight send us back here to find the
        // next candidate, bounded by each contact's TOI budget.
        'retry: loop {
            let mut toi = 1.0_f32;
            let mut toi_contact: Option<EntityId> = None;
            let mut toi_other: Option<EntityId> = None;

            let mut iterations = 0;
            loop {
                let mut considered = 0;
                let mut found = false;

                let edge_count = self
                    .bodies
                    .get(body_id)
                    .map_or(0, |b| b.contact_edges.len());
                for i in 0..edge_count {
                    let edge = match self.bodies.get(body_id) {
                        Some(body) => body.contact_edges[i],
                        None => break,
                    };
                    if Some(edge.contact) == toi_contact {
                        continue;
                    }
                    let other = match self.bodies.get(edge.other) {
                        Some(other) => other,
                        None => continue,
                    };
                    let contact = match self.contact_manager.contacts.get(edge.contact) {
                        Some(contact) => contact,
                        None => continue,
                    };

                    if bullet {
                        // Bullets only sweep against resolved geometry, and
                        // hit each non-static body at most once.
                        if !other.toi_resolved {
                            continue;
                        }
                        if other.kind != BodyKind::Static && contact.bullet_hit {
                            continue;
                        }
                    } else if other.is_dynamic() {
                        continue;
                    }

                    if !contact.enabled || contact.toi_count > MAX_TOI_COUNT {
                        continue;
                    }
                    let sensor = self
                        .fixtures
                        .get(contact.fixture_a)
                        .is_some_and(|f| f.sensor)
                        || self
                            .fixtures
                            .get(contact.fixture_b)
                            .is_some_and(|f| f.sensor);
                    if sensor {
                        continue;
                    }

                    let output = {
                        let (fixture_a, fixture_b) = match (
                            self.fixtures.get(contact.fixture_a),
                            self.fixtures.get(contact.fixture_b),
                        ) {
                            (Some(a), Some(b)) => (a, b),
                            _ => continue,
                        };
                        let (sweep_a, sweep_b) = match (
                            self.bodies.get(contact.body_a),
                            self.bodies.get(contact.body_b),
                        ) {
                            (Some(a), Some(b)) => (a.sweep, b.sweep),
                            _ => continue,
                        };
                        calculate_time_of_impact(&ToiInput {
                            shape_a: &fixture_a.shape,
                            sweep_a,
                            shape_b: &fixture_b.shape,
                            sweep_b,
                            t_max: toi,
                        })
                    };
                    if let ToiOutput::Touching { t } = output {
                        if t < toi {
                            toi = t;
                            toi_contact = Some(edge.contact);
                            toi_other = Some(edge.other);
                            found = true;
                        }
                    }
                    considered += 1;
                }

                iterations += 1;
                if !(found && considered > 1 && iterations < MAX_TOI_SCAN_ITERATIONS) {
                    break;
                }
            }

            let toi_contact_id = match toi_contact {
                Some(id) => id,
                None => {
                    // Nothing ahead; take the full step.
                    if let Some(body) = self.bodies.get_mut(body_id) {
                        body.advance(1.0);
                    }
                    return;
                }
            };

            let backup = match self.bodies.get(body_id) {
                Some(body) => body.sweep,
                None => return,
            };
            if let Some(body) = self.bodies.get_mut(body_id) {
                body.advance(toi);
            }

            // Regenerate the manifold at the impact pose.
            let event = match self.contact_manager.contacts.get_mut(toi_contact_id) {
                Some(contact) => contact.update(&self.bodies, &self.fixtures),
                None => None,
            };
            if let Some(event) = event {
                self.fire_touch_event(toi_contact_id, event);
            }

            if let Some(contact) = self.contact_manager.contacts.get_mut(toi_contact_id) {
                contact.toi_count += 1;
            }

            let rejected = match self.contact_manager.contacts.get(toi_contact_id) {
                Some(contact) => !contact.enabled,
                None => true,
            };
            if rejected {
                // The TOI budget above keeps a listener that always disables
                // from spinning this retry forever.
                if let Some(body) = self.bodies.get_mut(body_id) {
                    body.sweep = backup;
                    body.synchronize_transform();
                }
                continue 'retry;
            }

            self.build_toi_contact_set(body_id, toi_contact_id);

            let toi_contacts = std::mem::take(&mut self.toi_contacts);
            self.toi_solver.initialize(
                &toi_contacts,
                &self.contact_manager.contacts,
                &self.fixtures,
                body_id,
            );
            self.toi_contacts = toi_contacts;

            for _ in 0..MAX_TOI_POSITION_ITERATIONS {
                if self.toi_solver.solve(&mut self.bodies, TOI_BAUMGARTE) {
                    break;
                }
            }

            // Moving counterparts take one bullet hit per step at most.
            let other_non_static = toi_other
                .and_then(|id| self.bodies.get(id))
                .is_some_and(|b| b.kind != BodyKind::Static);
            if other_non_static {
                if let Some(contact) = self.contact_manager.contacts.get_mut(toi_contact_id) {
                    contact.bullet_hit = true;
                }
            }
            return;
        }
    }

    /// Collects the correction set handed to the TOI solver: enabled,
    /// touching, non-sensor contacts against non-dynamic counterparts.
    fn build_toi_contact_set(&mut self, body_id: EntityId, toi_contact_id: EntityId) {
        self.toi_contacts.clear();

        let edge_count = self
            .bodies
            .get(body_id)
            .map_or(0, |b| b.contact_edges.len());
        for i in 0..edge_count {
            if self.toi_contacts.len() == MAX_TOI_CONTACTS {
                break;
            }
            let edge = match self.bodies.get(body_id) {
                Some(body) => body.contact_edges[i],
                None => break,
            };
            let other_dynamic = self
                .bodies
                .get(edge.other)
                .map_or(true, |other| other.is_dynamic());
            if other_dynamic {
                continue;
            }

            let (enabled, sensor) = match self.contact_manager.contacts.get(edge.contact) {
                Some(contact) => (
                    contact.enabled,
                    self.fixtures
                        .get(contact.fixture_a)
                        .is_some_and(|f| f.sensor)
                        || self
                            .fixtures
                            .get(contact.fixture_b)
                            .is_some_and(|f| f.sensor),
                ),
                None => continue,
            };
            if !enabled || sensor {
                continue;
            }

            if edge.contact != toi_contact_id {
                let event = match self.contact_manager.contacts.get_mut(edge.contact) {
                    Some(contact) => contact.update(&self.bodies, &self.fixtures),
                    None => continue,
                };
                if let Some(event) = event {
                    self.fire_touch_event(edge.contact, event);
                }
                let usable = match self.contact_manager.contacts.get(edge.contact) {
                    Some(contact) => contact.enabled && contact.touching,
                    None => false,
                };
                if !usable {
                    continue;
                }
            }
            self.toi_contacts.push(edge.contact);
        }
    }

    /// Runs broad-phase pair discovery and creates missing contacts.
    fn find_new_contacts(&mut self) {
        self.contact_manager.find_new_contacts(
            &mut self.broad_phase,
            &mut self.bodies,
            &self.fixtures,
            &self.joints,
            self.contact_filter.as_mut(),
        );
    }

    fn destroy_contact(&mut self, contact_id: EntityId) {
        if let Some((_, was_touching)) = self
            .contact_manager
            .destroy(contact_id, &mut self.bodies)
        {
            if was_touching {
                self.fire_touch_event(contact_id, TouchEvent::End);
            }
        }
    }

    /// Dispatches a touch transition under the world lock.
    fn fire_touch_event(&mut self, contact_id: EntityId, event: TouchEvent) {
        let mut listener = match self.contact_listener.take() {
            Some(listener) => listener,
            None => return,
        };
        let was_locked = self.locked;
        self.locked = true;
        match event {
            TouchEvent::Begin => listener.begin_contact(self, contact_id),
            TouchEvent::End => listener.end_contact(self, contact_id),
        }
        self.locked = was_locked;
        if self.contact_listener.is_none() {
            self.contact_listener = Some(listener);
        }
    }

    fn refuse_locked(&self, operation: &str) -> bool {
        if self.locked {
            warn!("{operation} ignored: world is locked during a callback");
            return true;
        }
        false
    }

    /// Invokes `callback(fixture_id)` for every fixture whose fat AABB
    /// overlaps `aabb`; return false to stop early.
    pub fn query_aabb<F>(&self, aabb: &Aabb, callback: F)
    where
        F: FnMut(EntityId) -> bool,
    {
        self.broad_phase.query(aabb, callback);
    }

    /// Casts a ray from `p1` to `p2`. The callback receives
    /// `(fixture, point, normal, fraction)` and returns the new clip
    /// fraction: 0 stops, 1 continues unclipped, anything else shortens.
    pub fn ray_cast<F>(&self, p1: Vec2, p2: Vec2, mut callback: F)
    where
        F: FnMut(EntityId, Vec2, Vec2, f32) -> f32,
    {
        let input = RayCastInput {
            p1,
            p2,
            max_fraction: 1.0,
        };
        self.broad_phase.ray_cast(&input, |max_fraction, fixture_id| {
            let fixture = match self.fixtures.get(fixture_id) {
                Some(fixture) => fixture,
                None => return max_fraction,
            };
            let body = match self.bodies.get(fixture.body) {
                Some(body) => body,
                None => return max_fraction,
            };
            let clipped = RayCastInput {
                p1,
                p2,
                max_fraction,
            };
            match fixture.shape.ray_cast(&clipped, &body.transform) {
                Some(hit) => {
                    let point = p1 + hit.fraction * (p2 - p1);
                    callback(fixture_id, point, hit.normal, hit.fraction)
                }
                None => max_fraction,
            }
        });
    }
}

use crate::config::{
    ANGULAR_SLEEP_TOLERANCE, LINEAR_SLEEP_TOLERANCE, MAX_ROTATION, MAX_TRANSLATION, TIME_TO_SLEEP,
};
use crate::core::body::Body;
use crate::core::fixture::Fixture;
use crate::core::joint::Joint;
use crate::dynamics::contact::Contact;
use crate::dynamics::contact_solver::ContactSolver;
use crate::dynamics::{Position, TimeStep, Velocity};
use crate::utils::handles::{Arena, EntityId};
use glam::Vec2;

/// Reusable buffer of one connected component of the constraint graph.
///
/// Capacity grows monotonically across steps; `clear` only resets lengths.
#[derive(Default)]
pub struct Island {
    pub bodies: Vec<EntityId>,
    pub contacts: Vec<EntityId>,
    pub joints: Vec<EntityId>,
    positions: Vec<Position>,
    velocities: Vec<Velocity>,
}

impl Island {
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.contacts.clear();
        self.joints.clear();
        self.positions.clear();
        self.velocities.clear();
    }

    /// Adds a body and returns its island slot.
    pub fn add_body(&mut self, id: EntityId) -> usize {
        self.bodies.push(id);
        self.bodies.len() - 1
    }

    pub fn add_contact(&mut self, id: EntityId) {
        self.contacts.push(id);
    }

    pub fn add_joint(&mut self, id: EntityId) {
        self.joints.push(id);
    }

    /// Integrates forces, solves velocity and position constraints, writes
    /// results back, and handles sleeping.
    #[allow(clippy::too_many_arguments)]
    pub fn solve(
        &mut self,
        step: &TimeStep,
        gravity: Vec2,
        allow_sleep: bool,
        bodies: &mut Arena<Body>,
        fixtures: &Arena<Fixture>,
        contacts: &mut Arena<Contact>,
        joints: &mut Arena<Joint>,
    ) {
        let h = step.dt;

        self.positions.clear();
        self.velocities.clear();
        for (i, body_id) in self.bodies.iter().enumerate() {
            let body = match bodies.get_mut(*body_id) {
                Some(body) => body,
                None => {
                    // Keep the staged arrays aligned with the body list.
                    self.positions.push(Position::default());
                    self.velocities.push(Velocity::default());
                    continue;
                }
            };
            body.island_index = i;

            let c = body.sweep.c;
            let a = body.sweep.a;
            let mut v = body.linear_velocity;
            let mut w = body.angular_velocity;

            // Record the pre-step pose for continuous collision.
            body.sweep.c0 = c;
            body.sweep.a0 = a;
            body.sweep.alpha0 = 0.0;

            if body.is_dynamic() {
                v += h * (body.gravity_scale * gravity + body.inv_mass * body.force);
                w += h * body.inv_inertia * body.torque;

                // Damping as a stable implicit decay.
                v *= 1.0 / (1.0 + h * body.linear_damping);
                w *= 1.0 / (1.0 + h * body.angular_damping);
            }

            self.positions.push(Position { c, a });
            self.velocities.push(Velocity { v, w });
        }

        let mut contact_solver = ContactSolver::new(
            step,
            &self.contacts,
            contacts,
            bodies,
            fixtures,
            &self.positions,
            &self.velocities,
        );
        contact_solver.warm_start(&mut self.velocities);

        for joint_id in &self.joints {
            if let Some(joint) = joints.get_mut(*joint_id) {
                joint.init_velocity_constraints(
                    step,
                    bodies,
                    &self.positions,
                    &mut self.velocities,
                );
            }
        }

        for _ in 0..step.velocity_iterations {
            for joint_id in &self.joints {
                if let Some(joint) = joints.get_mut(*joint_id) {
                    joint.solve_velocity_constraints(&mut self.velocities);
                }
            }
            contact_solver.solve_velocity_constraints(&mut self.velocities);
        }
        contact_solver.store_impulses(contacts);

        // Integrate positions, clamping runaway motion.
        for (position, velocity) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
            let translation = h * velocity.v;
            if translation.length_squared() > MAX_TRANSLATION * MAX_TRANSLATION {
                velocity.v *= MAX_TRANSLATION / translation.length();
            }
            let rotation = h * velocity.w;
            if rotation.abs() > MAX_ROTATION {
                velocity.w *= MAX_ROTATION / rotation.abs();
            }
            position.c += h * velocity.v;
            position.a += h * velocity.w;
        }

        let mut position_solved = false;
        for _ in 0..step.position_iterations {
            let contacts_ok = contact_solver.solve_position_constraints(&mut self.positions);
            let mut joints_ok = true;
            for joint_id in &self.joints {
                if let Some(joint) = joints.get_mut(*joint_id) {
                    joints_ok &= joint.solve_position_constraints(&mut self.positions);
                }
            }
            if contacts_ok && joints_ok {
                position_solved = true;
                break;
            }
        }

        for (i, body_id) in self.bodies.iter().enumerate() {
            let body = match bodies.get_mut(*body_id) {
                Some(body) => body,
                None => continue,
            };
            body.sweep.c = self.positions[i].c;
            body.sweep.a = self.positions[i].a;
            body.linear_velocity = self.velocities[i].v;
            body.angular_velocity = self.velocities[i].w;
            body.synchronize_transform();
        }

        if allow_sleep {
            let mut min_sleep_time = f32::MAX;
            let lin_tol_sq = LINEAR_SLEEP_TOLERANCE * LINEAR_SLEEP_TOLERANCE;
            let ang_tol_sq = ANGULAR_SLEEP_TOLERANCE * ANGULAR_SLEEP_TOLERANCE;

            for body_id in &self.bodies {
                let body = match bodies.get_mut(*body_id) {
                    Some(body) => body,
                    None => continue,
                };
                if body.is_static() {
                    continue;
                }
                if !body.allow_sleep
                    || body.angular_velocity * body.angular_velocity > ang_tol_sq
                    || body.linear_velocity.length_squared() > lin_tol_sq
                {
                    body.sleep_time = 0.0;
                    min_sleep_time = 0.0;
                } else {
                    body.sleep_time += h;
                    min_sleep_time = min_sleep_time.min(body.sleep_time);
                }
            }

            if min_sleep_time >= TIME_TO_SLEEP && position_solved {
                for body_id in &self.bodies {
                    if let Some(body) = bodies.get_mut(*body_id) {
                        body.set_awake(false);
                    }
                }
            }
        }
    }
}

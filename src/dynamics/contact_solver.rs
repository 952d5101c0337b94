use crate::collision::narrowphase::{ManifoldKind, WorldManifold};
use crate::config::{
    BAUMGARTE, LINEAR_SLOP, MAX_LINEAR_CORRECTION, VELOCITY_THRESHOLD,
};
use crate::core::body::Body;
use crate::core::fixture::Fixture;
use crate::core::math::{cross, cross_sv, cross_vs, Rot, Transform};
use crate::dynamics::contact::Contact;
use crate::dynamics::{Position, TimeStep, Velocity};
use crate::utils::handles::{Arena, EntityId};
use glam::Vec2;

struct VelocityConstraintPoint {
    r_a: Vec2,
    r_b: Vec2,
    normal_impulse: f32,
    tangent_impulse: f32,
    normal_mass: f32,
    tangent_mass: f32,
    velocity_bias: f32,
}

struct VelocityConstraint {
    points: Vec<VelocityConstraintPoint>,
    normal: Vec2,
    friction: f32,
    index_a: usize,
    index_b: usize,
    inv_mass_a: f32,
    inv_mass_b: f32,
    inv_i_a: f32,
    inv_i_b: f32,
    contact: EntityId,
}

struct PositionConstraint {
    local_points: Vec<Vec2>,
    local_normal: Vec2,
    local_point: Vec2,
    kind: ManifoldKind,
    index_a: usize,
    index_b: usize,
    inv_mass_a: f32,
    inv_mass_b: f32,
    inv_i_a: f32,
    inv_i_b: f32,
    local_center_a: Vec2,
    local_center_b: Vec2,
    radius_a: f32,
    radius_b: f32,
}

/// Sequential-impulse solver over the touching contacts of one island.
pub struct ContactSolver {
    velocity_constraints: Vec<VelocityConstraint>,
    position_constraints: Vec<PositionConstraint>,
}

impl ContactSolver {
    /// Gathers constraint data for `contact_ids` using the island's staged
    /// positions/velocities. Warm-started impulses are rescaled by
    /// `step.dt_ratio` to survive variable step lengths.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        step: &TimeStep,
        contact_ids: &[EntityId],
        contacts: &Arena<Contact>,
        bodies: &Arena<Body>,
        fixtures: &Arena<Fixture>,
        positions: &[Position],
        velocities: &[Velocity],
    ) -> Self {
        let mut solver = Self {
            velocity_constraints: Vec::with_capacity(contact_ids.len()),
            position_constraints: Vec::with_capacity(contact_ids.len()),
        };

        for contact_id in contact_ids {
            let contact = match contacts.get(*contact_id) {
                Some(contact) => contact,
                None => continue,
            };
            let (fixture_a, fixture_b) = match (
                fixtures.get(contact.fixture_a),
                fixtures.get(contact.fixture_b),
            ) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            let (body_a, body_b) =
                match (bodies.get(contact.body_a), bodies.get(contact.body_b)) {
                    (Some(a), Some(b)) => (a, b),
                    _ => continue,
                };
            if contact.manifold.points.is_empty() {
                continue;
            }

            let radius_a = fixture_a.shape.skin_radius();
            let radius_b = fixture_b.shape.skin_radius();
            let index_a = body_a.island_index;
            let index_b = body_b.island_index;

            solver.position_constraints.push(PositionConstraint {
                local_points: contact
                    .manifold
                    .points
                    .iter()
                    .map(|p| p.local_point)
                    .collect(),
                local_normal: contact.manifold.local_normal,
                local_point: contact.manifold.local_point,
                kind: contact.manifold.kind,
                index_a,
                index_b,
                inv_mass_a: body_a.inv_mass,
                inv_mass_b: body_b.inv_mass,
                inv_i_a: body_a.inv_inertia,
                inv_i_b: body_b.inv_inertia,
                local_center_a: body_a.sweep.local_center,
                local_center_b: body_b.sweep.local_center,
                radius_a,
                radius_b,
            });

            let xf_a = island_transform(&positions[index_a], body_a.sweep.local_center);
            let xf_b = island_transform(&positions[index_b], body_b.sweep.local_center);
            let world =
                WorldManifold::new(&contact.manifold, &xf_a, radius_a, &xf_b, radius_b);

            let mut constraint = VelocityConstraint {
                points: Vec::with_capacity(world.points.len()),
                normal: world.normal,
                friction: contact.friction,
                index_a,
                index_b,
                inv_mass_a: body_a.inv_mass,
                inv_mass_b: body_b.inv_mass,
                inv_i_a: body_a.inv_inertia,
                inv_i_b: body_b.inv_inertia,
                contact: *contact_id,
            };

            let tangent = cross_vs(world.normal, 1.0);
            for (point, manifold_point) in
                world.points.iter().zip(contact.manifold.points.iter())
            {
                let r_a = *point - positions[index_a].c;
                let r_b = *point - positions[index_b].c;

                let rn_a = cross(r_a, world.normal);
                let rn_b = cross(r_b, world.normal);
                let k_normal = body_a.inv_mass
                    + body_b.inv_mass
                    + body_a.inv_inertia * rn_a * rn_a
                    + body_b.inv_inertia * rn_b * rn_b;

                let rt_a = cross(r_a, tangent);
                let rt_b = cross(r_b, tangent);
                let k_tangent = body_a.inv_mass
                    + body_b.inv_mass
                    + body_a.inv_inertia * rt_a * rt_a
                    + body_b.inv_inertia * rt_b * rt_b;

                let dv = velocities[index_b].v
                    + cross_sv(velocities[index_b].w, r_b)
                    - velocities[index_a].v
                    - cross_sv(velocities[index_a].w, r_a);
                let vn = dv.dot(world.normal);
                let velocity_bias = if vn < -VELOCITY_THRESHOLD {
                    -contact.restitution * vn
                } else {
                    0.0
                };

                let (normal_impulse, tangent_impulse) = if step.warm_starting {
                    (
                        step.dt_ratio * manifold_point.normal_impulse,
                        step.dt_ratio * manifold_point.tangent_impulse,
                    )
                } else {
                    (0.0, 0.0)
                };

                constraint.points.push(VelocityConstraintPoint {
                    r_a,
                    r_b,
                    normal_impulse,
                    tangent_impulse,
                    normal_mass: if k_normal > 0.0 { 1.0 / k_normal } else { 0.0 },
                    tangent_mass: if k_tangent > 0.0 { 1.0 / k_tangent } else { 0.0 },
                    velocity_bias,
                });
            }

            solver.velocity_constraints.push(constraint);
        }

        solver
    }

    /// Applies the carried-over impulses before the first iteration.
    pub fn warm_start(&self, velocities: &mut [Velocity]) {
        for vc in &self.velocity_constraints {
            let tangent = cross_vs(vc.normal, 1.0);
            for point in &vc.points {
                let p = point.normal_impulse * vc.normal + point.tangent_impulse * tangent;
                velocities[vc.index_a].v -= vc.inv_mass_a * p;
                velocities[vc.index_a].w -= vc.inv_i_a * cross(point.r_a, p);
                velocities[vc.index_b].v += vc.inv_mass_b * p;
                velocities[vc.index_b].w += vc.inv_i_b * cross(point.r_b, p);
            }
        }
    }

    pub fn solve_velocity_constraints(&mut self, velocities: &mut [Velocity]) {
        for vc in &mut self.velocity_constraints {
            let tangent = cross_vs(vc.normal, 1.0);
            for point in &mut vc.points {
                // Friction first, using the impulse accumulated so far.
                let dv = velocities[vc.index_b].v
                    + cross_sv(velocities[vc.index_b].w, point.r_b)
                    - velocities[vc.index_a].v
                    - cross_sv(velocities[vc.index_a].w, point.r_a);
                let vt = dv.dot(tangent);
                let mut lambda = point.tangent_impulse - point.tangent_mass * vt;
                let max_friction = vc.friction * point.normal_impulse;
                lambda = lambda.clamp(-max_friction, max_friction);
                let applied = lambda - point.tangent_impulse;
                point.tangent_impulse = lambda;

                let p = applied * tangent;
                velocities[vc.index_a].v -= vc.inv_mass_a * p;
                velocities[vc.index_a].w -= vc.inv_i_a * cross(point.r_a, p);
                velocities[vc.index_b].v += vc.inv_mass_b * p;
                velocities[vc.index_b].w += vc.inv_i_b * cross(point.r_b, p);

                // Non-penetration along the normal.
                let dv = velocities[vc.index_b].v
                    + cross_sv(velocities[vc.index_b].w, point.r_b)
                    - velocities[vc.index_a].v
                    - cross_sv(velocities[vc.index_a].w, point.r_a);
                let vn = dv.dot(vc.normal);
                let lambda = -point.normal_mass * (vn - point.velocity_bias);
                let new_impulse = (point.normal_impulse + lambda).max(0.0);
                let applied = new_impulse - point.normal_impulse;
                point.normal_impulse = new_impulse;

                let p = applied * vc.normal;
                velocities[vc.index_a].v -= vc.inv_mass_a * p;
                velocities[vc.index_a].w -= vc.inv_i_a * cross(point.r_a, p);
                velocities[vc.index_b].v += vc.inv_mass_b * p;
                velocities[vc.index_b].w += vc.inv_i_b * cross(point.r_b, p);
            }
        }
    }

    /// Writes accumulated impulses back into the manifolds for the next step.
    pub fn store_impulses(&self, contacts: &mut Arena<Contact>) {
        for vc in &self.velocity_constraints {
            let contact = match contacts.get_mut(vc.contact) {
                Some(contact) => contact,
                None => continue,
            };
            for (manifold_point, point) in
                contact.manifold.points.iter_mut().zip(vc.points.iter())
            {
                manifold_point.normal_impulse = point.normal_impulse;
                manifold_point.tangent_impulse = point.tangent_impulse;
            }
        }
    }

    /// One nonlinear Gauss-Seidel pass over all position constraints. Returns
    /// true once the worst separation is within tolerance.
    pub fn solve_position_constraints(&self, positions: &mut [Position]) -> bool {
        let mut min_separation = 0.0_f32;

        for pc in &self.position_constraints {
            for point_index in 0..pc.local_points.len() {
                let xf_a = island_transform(&positions[pc.index_a], pc.local_center_a);
                let xf_b = island_transform(&positions[pc.index_b], pc.local_center_b);
                let (normal, point, separation) = position_solver_manifold(pc, &xf_a, &xf_b, point_index);
                min_separation = min_separation.min(separation);

                let correction =
                    (BAUMGARTE * (separation + LINEAR_SLOP)).clamp(-MAX_LINEAR_CORRECTION, 0.0);

                let r_a = point - positions[pc.index_a].c;
                let r_b = point - positions[pc.index_b].c;
                let rn_a = cross(r_a, normal);
                let rn_b = cross(r_b, normal);
                let k = pc.inv_mass_a
                    + pc.inv_mass_b
                    + pc.inv_i_a * rn_a * rn_a
                    + pc.inv_i_b * rn_b * rn_b;
                if k <= 0.0 {
                    continue;
                }

                let impulse = -correction / k;
                let p = impulse * normal;
                positions[pc.index_a].c -= pc.inv_mass_a * p;
                positions[pc.index_a].a -= pc.inv_i_a * cross(r_a, p);
                positions[pc.index_b].c += pc.inv_mass_b * p;
                positions[pc.index_b].a += pc.inv_i_b * cross(r_b, p);
            }
        }

        min_separation >= -3.0 * LINEAR_SLOP
    }
}

fn island_transform(position: &Position, local_center: Vec2) -> Transform {
    let q = Rot::new(position.a);
    Transform {
        p: position.c - q.apply(local_center),
        q,
    }
}

fn position_solver_manifold(
    pc: &PositionConstraint,
    xf_a: &Transform,
    xf_b: &Transform,
    point_index: usize,
) -> (Vec2, Vec2, f32) {
    match pc.kind {
        ManifoldKind::Circles => {
            let point_a = xf_a.apply(pc.local_point);
            let point_b = xf_b.apply(pc.local_points[0]);
            let d = point_b - point_a;
            let normal = if d.length_squared() > f32::EPSILON * f32::EPSILON {
                d.normalize()
            } else {
                Vec2::X
            };
            let point = 0.5 * (point_a + point_b);
            let separation = d.dot(normal) - pc.radius_a - pc.radius_b;
            (normal, point, separation)
        }
        ManifoldKind::FaceA => {
            let normal = xf_a.q.apply(pc.local_normal);
            let plane_point = xf_a.apply(pc.local_point);
            let clip_point = xf_b.apply(pc.local_points[point_index]);
            let separation =
                (clip_point - plane_point).dot(normal) - pc.radius_a - pc.radius_b;
            (normal, clip_point, separation)
        }
        ManifoldKind::FaceB => {
            let normal = xf_b.q.apply(pc.local_normal);
            let plane_point = xf_b.apply(pc.local_point);
            let clip_point = xf_a.apply(pc.local_points[point_index]);
            let separation =
                (clip_point - plane_point).dot(normal) - pc.radius_a - pc.radius_b;
            // Point from A to B by convention.
            (-normal, clip_point, separation)
        }
    }
}

use crate::collision::narrowphase::ManifoldKind;
use crate::config::{LINEAR_SLOP, MAX_LINEAR_CORRECTION};
use crate::core::body::Body;
use crate::core::fixture::Fixture;
use crate::core::math::{cross, Rot, Transform};
use crate::dynamics::contact::Contact;
use crate::utils::handles::{Arena, EntityId};
use glam::Vec2;

struct ToiConstraint {
    local_points: Vec<Vec2>,
    local_normal: Vec2,
    local_point: Vec2,
    kind: ManifoldKind,
    body_a: EntityId,
    body_b: EntityId,
    radius_a: f32,
    radius_b: f32,
}

/// Position-only solver pushing one body out of a set of contacts after a
/// time-of-impact advance. Counterpart bodies are non-dynamic and stay put.
#[derive(Default)]
pub struct ToiSolver {
    constraints: Vec<ToiConstraint>,
    body: EntityId,
}

impl ToiSolver {
    pub fn initialize(
        &mut self,
        contact_ids: &[EntityId],
        contacts: &Arena<Contact>,
        fixtures: &Arena<Fixture>,
        body: EntityId,
    ) {
        self.body = body;
        self.constraints.clear();

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
            if contact.manifold.points.is_empty() {
                continue;
            }
            self.constraints.push(ToiConstraint {
                local_points: contact
                    .manifold
                    .points
                    .iter()
                    .map(|p| p.local_point)
                    .collect(),
                local_normal: contact.manifold.local_normal,
                local_point: contact.manifold.local_point,
                kind: contact.manifold.kind,
                body_a: contact.body_a,
                body_b: contact.body_b,
                radius_a: fixture_a.shape.skin_radius(),
                radius_b: fixture_b.shape.skin_radius(),
            });
        }
    }

    /// One pushout pass. Returns true when the worst separation satisfies the
    /// TOI tolerance.
    pub fn solve(&self, bodies: &mut Arena<Body>, baumgarte: f32) -> bool {
        let mut min_separation = 0.0_f32;

        for constraint in &self.constraints {
            for point_index in 0..constraint.local_points.len() {
                let (xf_a, xf_b) = match (
                    bodies.get(constraint.body_a),
                    bodies.get(constraint.body_b),
                ) {
                    (Some(a), Some(b)) => (sweep_transform(a), sweep_transform(b)),
                    _ => continue,
                };
                let (normal, point, separation) =
                    toi_manifold(constraint, &xf_a, &xf_b, point_index);
                min_separation = min_separation.min(separation);

                let correction = (baumgarte * (separation + LINEAR_SLOP))
                    .clamp(-MAX_LINEAR_CORRECTION, 0.0);

                let subject = match bodies.get_mut(self.body) {
                    Some(body) => body,
                    None => continue,
                };
                let r = point - subject.sweep.c;
                let rn = cross(r, normal);
                let k = subject.inv_mass + subject.inv_inertia * rn * rn;
                if k <= 0.0 {
                    continue;
                }

                // The normal points from A to B; push the subject off its side.
                let impulse = if constraint.body_a == self.body {
                    correction / k
                } else {
                    -correction / k
                };
                subject.sweep.c += subject.inv_mass * impulse * normal;
                subject.sweep.a += subject.inv_inertia * cross(r, impulse * normal);
                subject.synchronize_transform();
            }
        }

        min_separation >= -1.5 * LINEAR_SLOP
    }
}

fn sweep_transform(body: &Body) -> Transform {
    let q = Rot::new(body.sweep.a);
    Transform {
        p: body.sweep.c - q.apply(body.sweep.local_center),
        q,
    }
}

fn toi_manifold(
    constraint: &ToiConstraint,
    xf_a: &Transform,
    xf_b: &Transform,
    point_index: usize,
) -> (Vec2, Vec2, f32) {
    match constraint.kind {
        ManifoldKind::Circles => {
            let point_a = xf_a.apply(constraint.local_point);
            let point_b = xf_b.apply(constraint.local_points[0]);
            let d = point_b - point_a;
            let normal = if d.length_squared() > f32::EPSILON * f32::EPSILON {
                d.normalize()
            } else {
                Vec2::X
            };
            let separation = d.dot(normal) - constraint.radius_a - constraint.radius_b;
            (normal, 0.5 * (point_a + point_b), separation)
        }
        ManifoldKind::FaceA => {
            let normal = xf_a.q.apply(constraint.local_normal);
            let plane_point = xf_a.apply(constraint.local_point);
            let clip_point = xf_b.apply(constraint.local_points[point_index]);
            let separation = (clip_point - plane_point).dot(normal)
                - constraint.radius_a
                - constraint.radius_b;
            (normal, clip_point, separation)
        }
        ManifoldKind::FaceB => {
            let normal = xf_b.q.apply(constraint.local_normal);
            let plane_point = xf_b.apply(constraint.local_point);
            let clip_point = xf_a.apply(constraint.local_points[point_index]);
            let separation = (clip_point - plane_point).dot(normal)
                - constraint.radius_a
                - constraint.radius_b;
            (-normal, clip_point, separation)
        }
    }
}

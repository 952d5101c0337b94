use crate::config::{LINEAR_SLOP, MAX_LINEAR_CORRECTION};
use crate::core::body::Body;
use crate::core::joint::{DistanceJoint, Joint, JointKind, RevoluteJoint};
use crate::core::math::{cross, cross_sv, Rot};
use crate::dynamics::{Position, TimeStep, Velocity};
use crate::utils::handles::Arena;
use glam::{Mat2, Vec2};

impl Joint {
    /// Prepares solver scratch data and warm-starts the cached impulse.
    pub(crate) fn init_velocity_constraints(
        &mut self,
        step: &TimeStep,
        bodies: &Arena<Body>,
        positions: &[Position],
        velocities: &mut [Velocity],
    ) {
        let (body_a, body_b) = match (bodies.get(self.body_a), bodies.get(self.body_b)) {
            (Some(a), Some(b)) => (a, b),
            _ => return,
        };
        match &mut self.kind {
            JointKind::Revolute(joint) => {
                joint.init(step, body_a, body_b, positions, velocities)
            }
            JointKind::Distance(joint) => {
                joint.init(step, body_a, body_b, positions, velocities)
            }
        }
    }

    pub(crate) fn solve_velocity_constraints(&mut self, velocities: &mut [Velocity]) {
        match &mut self.kind {
            JointKind::Revolute(joint) => joint.solve_velocity(velocities),
            JointKind::Distance(joint) => joint.solve_velocity(velocities),
        }
    }

    /// Returns true when the positional error is within tolerance.
    pub(crate) fn solve_position_constraints(&mut self, positions: &mut [Position]) -> bool {
        match &mut self.kind {
            JointKind::Revolute(joint) => joint.solve_position(positions),
            JointKind::Distance(joint) => joint.solve_position(positions),
        }
    }
}

/// Effective-mass matrix of a point-to-point constraint.
fn point_mass_matrix(
    inv_mass_a: f32,
    inv_mass_b: f32,
    inv_i_a: f32,
    inv_i_b: f32,
    r_a: Vec2,
    r_b: Vec2,
) -> Mat2 {
    let k = Mat2::from_cols(
        Vec2::new(
            inv_mass_a + inv_mass_b + inv_i_a * r_a.y * r_a.y + inv_i_b * r_b.y * r_b.y,
            -inv_i_a * r_a.x * r_a.y - inv_i_b * r_b.x * r_b.y,
        ),
        Vec2::new(
            -inv_i_a * r_a.x * r_a.y - inv_i_b * r_b.x * r_b.y,
            inv_mass_a + inv_mass_b + inv_i_a * r_a.x * r_a.x + inv_i_b * r_b.x * r_b.x,
        ),
    );
    if k.determinant().abs() > f32::EPSILON {
        k.inverse()
    } else {
        Mat2::ZERO
    }
}

impl RevoluteJoint {
    fn init(
        &mut self,
        step: &TimeStep,
        body_a: &Body,
        body_b: &Body,
        positions: &[Position],
        velocities: &mut [Velocity],
    ) {
        self.index_a = body_a.island_index;
        self.index_b = body_b.island_index;
        self.local_center_a = body_a.sweep.local_center;
        self.local_center_b = body_b.sweep.local_center;
        self.inv_mass_a = body_a.inv_mass;
        self.inv_mass_b = body_b.inv_mass;
        self.inv_i_a = body_a.inv_inertia;
        self.inv_i_b = body_b.inv_inertia;

        let q_a = Rot::new(positions[self.index_a].a);
        let q_b = Rot::new(positions[self.index_b].a);
        self.r_a = q_a.apply(self.local_anchor_a - self.local_center_a);
        self.r_b = q_b.apply(self.local_anchor_b - self.local_center_b);
        self.mass = point_mass_matrix(
            self.inv_mass_a,
            self.inv_mass_b,
            self.inv_i_a,
            self.inv_i_b,
            self.r_a,
            self.r_b,
        );

        if step.warm_starting {
            self.impulse *= step.dt_ratio;
            velocities[self.index_a].v -= self.inv_mass_a * self.impulse;
            velocities[self.index_a].w -= self.inv_i_a * cross(self.r_a, self.impulse);
            velocities[self.index_b].v += self.inv_mass_b * self.impulse;
            velocities[self.index_b].w += self.inv_i_b * cross(self.r_b, self.impulse);
        } else {
            self.impulse = Vec2::ZERO;
        }
    }

    fn solve_velocity(&mut self, velocities: &mut [Velocity]) {
        let cdot = velocities[self.index_b].v
            + cross_sv(velocities[self.index_b].w, self.r_b)
            - velocities[self.index_a].v
            - cross_sv(velocities[self.index_a].w, self.r_a);
        let impulse = self.mass * (-cdot);
        self.impulse += impulse;

        velocities[self.index_a].v -= self.inv_mass_a * impulse;
        velocities[self.index_a].w -= self.inv_i_a * cross(self.r_a, impulse);
        velocities[self.index_b].v += self.inv_mass_b * impulse;
        velocities[self.index_b].w += self.inv_i_b * cross(self.r_b, impulse);
    }

    fn solve_position(&mut self, positions: &mut [Position]) -> bool {
        let q_a = Rot::new(positions[self.index_a].a);
        let q_b = Rot::new(positions[self.index_b].a);
        let r_a = q_a.apply(self.local_anchor_a - self.local_center_a);
        let r_b = q_b.apply(self.local_anchor_b - self.local_center_b);

        let c = (positions[self.index_b].c + r_b) - (positions[self.index_a].c + r_a);
        let error = c.length();

        let mass = point_mass_matrix(
            self.inv_mass_a,
            self.inv_mass_b,
            self.inv_i_a,
            self.inv_i_b,
            r_a,
            r_b,
        );
        let impulse = mass * (-c);

        positions[self.index_a].c -= self.inv_mass_a * impulse;
        positions[self.index_a].a -= self.inv_i_a * cross(r_a, impulse);
        positions[self.index_b].c += self.inv_mass_b * impulse;
        positions[self.index_b].a += self.inv_i_b * cross(r_b, impulse);

        error <= 3.0 * LINEAR_SLOP
    }
}

impl DistanceJoint {
    fn init(
        &mut self,
        step: &TimeStep,
        body_a: &Body,
        body_b: &Body,
        positions: &[Position],
        velocities: &mut [Velocity],
    ) {
        self.index_a = body_a.island_index;
        self.index_b = body_b.island_index;
        self.local_center_a = body_a.sweep.local_center;
        self.local_center_b = body_b.sweep.local_center;
        self.inv_mass_a = body_a.inv_mass;
        self.inv_mass_b = body_b.inv_mass;
        self.inv_i_a = body_a.inv_inertia;
        self.inv_i_b = body_b.inv_inertia;

        let q_a = Rot::new(positions[self.index_a].a);
        let q_b = Rot::new(positions[self.index_b].a);
        self.r_a = q_a.apply(self.local_anchor_a - self.local_center_a);
        self.r_b = q_b.apply(self.local_anchor_b - self.local_center_b);

        self.u = (positions[self.index_b].c + self.r_b)
            - (positions[self.index_a].c + self.r_a);
        let length = self.u.length();
        if length > LINEAR_SLOP {
            self.u /= length;
        } else {
            self.u = Vec2::ZERO;
        }

        let cr_a = cross(self.r_a, self.u);
        let cr_b = cross(self.r_b, self.u);
        let inv_k = self.inv_mass_a
            + self.inv_i_a * cr_a * cr_a
            + self.inv_mass_b
            + self.inv_i_b * cr_b * cr_b;
        self.mass = if inv_k > 0.0 { 1.0 / inv_k } else { 0.0 };

        if step.warm_starting {
            self.impulse *= step.dt_ratio;
            let p = self.impulse * self.u;
            velocities[self.index_a].v -= self.inv_mass_a * p;
            velocities[self.index_a].w -= self.inv_i_a * cross(self.r_a, p);
            velocities[self.index_b].v += self.inv_mass_b * p;
            velocities[self.index_b].w += self.inv_i_b * cross(self.r_b, p);
        } else {
            self.impulse = 0.0;
        }
    }

    fn solve_velocity(&mut self, velocities: &mut [Velocity]) {
        let v_a = velocities[self.index_a].v + cross_sv(velocities[self.index_a].w, self.r_a);
        let v_b = velocities[self.index_b].v + cross_sv(velocities[self.index_b].w, self.r_b);
        let cdot = self.u.dot(v_b - v_a);

        let impulse = -self.mass * cdot;
        self.impulse += impulse;

        let p = impulse * self.u;
        velocities[self.index_a].v -= self.inv_mass_a * p;
        velocities[self.index_a].w -= self.inv_i_a * cross(self.r_a, p);
        velocities[self.index_b].v += self.inv_mass_b * p;
        velocities[self.index_b].w += self.inv_i_b * cross(self.r_b, p);
    }

    fn solve_position(&mut self, positions: &mut [Position]) -> bool {
        let q_a = Rot::new(positions[self.index_a].a);
        let q_b = Rot::new(positions[self.index_b].a);
        let r_a = q_a.apply(self.local_anchor_a - self.local_center_a);
        let r_b = q_b.apply(self.local_anchor_b - self.local_center_b);

        let mut u = (positions[self.index_b].c + r_b) - (positions[self.index_a].c + r_a);
        let length = u.length();
        if length > LINEAR_SLOP {
            u /= length;
        } else {
            u = Vec2::ZERO;
        }
        let c = (length - self.length).clamp(-MAX_LINEAR_CORRECTION, MAX_LINEAR_CORRECTION);

        let impulse = -self.mass * c;
        let p = impulse * u;

        positions[self.index_a].c -= self.inv_mass_a * p;
        positions[self.index_a].a -= self.inv_i_a * cross(r_a, p);
        positions[self.index_b].c += self.inv_mass_b * p;
        positions[self.index_b].a += self.inv_i_b * cross(r_b, p);

        c.abs() < LINEAR_SLOP
    }
}

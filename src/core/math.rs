use glam::Vec2;
use serde::{Deserialize, Serialize};

/// 2D rotation stored as a cached sine/cosine pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rot {
    pub s: f32,
    pub c: f32,
}

impl Default for Rot {
    fn default() -> Self {
        Self { s: 0.0, c: 1.0 }
    }
}

impl Rot {
    pub fn new(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self { s, c }
    }

    pub fn angle(&self) -> f32 {
        self.s.atan2(self.c)
    }

    /// Rotates a vector.
    pub fn apply(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x - self.s * v.y, self.s * v.x + self.c * v.y)
    }

    /// Applies the inverse rotation.
    pub fn apply_inv(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x + self.s * v.y, -self.s * v.x + self.c * v.y)
    }
}

/// Position and orientation of a body frame.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Transform {
    pub p: Vec2,
    pub q: Rot,
}

impl Transform {
    pub fn new(position: Vec2, angle: f32) -> Self {
        Self {
            p: position,
            q: Rot::new(angle),
        }
    }

    /// Maps a local point to world space.
    pub fn apply(&self, v: Vec2) -> Vec2 {
        self.q.apply(v) + self.p
    }

    /// Maps a world point to local space.
    pub fn apply_inv(&self, v: Vec2) -> Vec2 {
        self.q.apply_inv(v - self.p)
    }
}

/// Interpolation state spanning the poses of a body across one step.
///
/// `c0`/`a0` hold the pose at normalized time `alpha0`, `c`/`a` the pose at
/// the end of the step. Positions track the center of mass; `local_center`
/// converts back to the body origin.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Sweep {
    pub local_center: Vec2,
    pub c0: Vec2,
    pub c: Vec2,
    pub a0: f32,
    pub a: f32,
    pub alpha0: f32,
}

impl Sweep {
    /// Body-origin transform at normalized time `beta` within `[alpha0, 1]`.
    pub fn transform_at(&self, beta: f32) -> Transform {
        let denom = 1.0 - self.alpha0;
        let t = if denom > f32::EPSILON {
            ((beta - self.alpha0) / denom).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let c = self.c0.lerp(self.c, t);
        let a = self.a0 + t * (self.a - self.a0);
        let q = Rot::new(a);
        Transform {
            p: c - q.apply(self.local_center),
            q,
        }
    }

    /// Moves the start pose forward to normalized time `alpha`.
    pub fn advance(&mut self, alpha: f32) {
        debug_assert!(self.alpha0 < 1.0);
        let beta = (alpha - self.alpha0) / (1.0 - self.alpha0);
        self.c0 += beta * (self.c - self.c0);
        self.a0 += beta * (self.a - self.a0);
        self.alpha0 = alpha;
    }
}

/// Scalar cross product of two vectors.
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Cross product of a scalar (out-of-plane) and a vector.
pub fn cross_sv(s: f32, v: Vec2) -> Vec2 {
    Vec2::new(-s * v.y, s * v.x)
}

/// Cross product of a vector and a scalar (out-of-plane).
pub fn cross_vs(v: Vec2, s: f32) -> Vec2 {
    Vec2::new(s * v.y, -s * v.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rotation_round_trips() {
        let q = Rot::new(0.7);
        let v = Vec2::new(3.0, -2.0);
        let back = q.apply_inv(q.apply(v));
        assert_relative_eq!(back.x, v.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, v.y, epsilon = 1e-5);
    }

    #[test]
    fn sweep_advance_preserves_interpolant() {
        let mut sweep = Sweep {
            c0: Vec2::ZERO,
            c: Vec2::new(10.0, 0.0),
            a0: 0.0,
            a: 1.0,
            ..Default::default()
        };
        let mid = sweep.transform_at(0.5);
        sweep.advance(0.5);
        assert_relative_eq!(sweep.c0.x, 5.0, epsilon = 1e-5);
        assert_relative_eq!(sweep.a0, 0.5, epsilon = 1e-5);
        // The pose at 0.5 is unchanged by advancing to it.
        let mid_after = sweep.transform_at(0.5);
        assert_relative_eq!(mid.p.x, mid_after.p.x, epsilon = 1e-5);
    }

    #[test]
    fn cross_identities_hold() {
        let v = Vec2::new(2.0, 5.0);
        assert_relative_eq!(cross(v, cross_sv(1.0, v)), v.length_squared());
        assert_relative_eq!(cross_vs(v, 1.0).x, -cross_sv(1.0, v).x);
    }
}

use crate::collision::shapes::Shape;
use crate::core::math::Transform;
use glam::Vec2;

const MAX_GJK_ITERATIONS: usize = 20;

/// Distance between the vertex hulls of two shapes (zero when they overlap).
///
/// Skin radii are not subtracted; callers decide what separation means for
/// their shapes.
pub fn hull_distance(
    shape_a: &Shape,
    xf_a: &Transform,
    shape_b: &Shape,
    xf_b: &Transform,
) -> f32 {
    let hull_a = HullProxy::new(shape_a, xf_a);
    let hull_b = HullProxy::new(shape_b, xf_b);

    let mut simplex = Simplex::default();
    let first = SimplexVertex::support(&hull_a, &hull_b, Vec2::X);
    simplex.push(first);

    for _ in 0..MAX_GJK_ITERATIONS {
        let closest = simplex.closest_to_origin();
        if closest.length_squared() < f32::EPSILON {
            return 0.0;
        }

        let vertex = SimplexVertex::support(&hull_a, &hull_b, -closest);
        if simplex.contains(vertex.index_a, vertex.index_b) {
            // No simplex improvement is possible.
            return closest.length();
        }
        simplex.push(vertex);
    }

    simplex.closest_to_origin().length()
}

/// True when the hulls are closer than the sum of skin radii (plus tolerance).
pub fn test_overlap(shape_a: &Shape, xf_a: &Transform, shape_b: &Shape, xf_b: &Transform) -> bool {
    let distance = hull_distance(shape_a, xf_a, shape_b, xf_b);
    distance < shape_a.skin_radius() + shape_b.skin_radius() + 10.0 * f32::EPSILON
}

struct HullProxy<'a> {
    points: &'a [Vec2],
    xf: &'a Transform,
}

impl<'a> HullProxy<'a> {
    fn new(shape: &'a Shape, xf: &'a Transform) -> Self {
        Self {
            points: shape.hull(),
            xf,
        }
    }

    fn support(&self, world_dir: Vec2) -> (usize, Vec2) {
        let local_dir = self.xf.q.apply_inv(world_dir);
        let mut best = 0;
        let mut best_dot = self.points[0].dot(local_dir);
        for (i, p) in self.points.iter().enumerate().skip(1) {
            let d = p.dot(local_dir);
            if d > best_dot {
                best_dot = d;
                best = i;
            }
        }
        (best, self.xf.apply(self.points[best]))
    }
}

#[derive(Clone, Copy)]
struct SimplexVertex {
    /// Minkowski difference point.
    w: Vec2,
    index_a: usize,
    index_b: usize,
}

impl SimplexVertex {
    fn support(hull_a: &HullProxy, hull_b: &HullProxy, dir: Vec2) -> Self {
        let (index_a, point_a) = hull_a.support(dir);
        let (index_b, point_b) = hull_b.support(-dir);
        Self {
            w: point_a - point_b,
            index_a,
            index_b,
        }
    }
}

#[derive(Default)]
struct Simplex {
    vertices: Vec<SimplexVertex>,
}

impl Simplex {
    fn push(&mut self, vertex: SimplexVertex) {
        self.vertices.push(vertex);
    }

    fn contains(&self, index_a: usize, index_b: usize) -> bool {
        self.vertices
            .iter()
            .any(|v| v.index_a == index_a && v.index_b == index_b)
    }

    /// Closest point of the simplex to the origin; reduces the simplex to the
    /// supporting feature.
    fn closest_to_origin(&mut self) -> Vec2 {
        match self.vertices.len() {
            1 => self.vertices[0].w,
            2 => self.solve_segment(),
            _ => self.solve_triangle(),
        }
    }

    fn solve_segment(&mut self) -> Vec2 {
        let (a, b) = (self.vertices[0], self.vertices[1]);
        let e = b.w - a.w;

        let u = -a.w.dot(e);
        if u <= 0.0 {
            self.vertices = vec![a];
            return a.w;
        }
        let v = b.w.dot(e);
        if v <= 0.0 {
            self.vertices = vec![b];
            return b.w;
        }
        a.w + (u / e.length_squared()) * e
    }

    fn solve_triangle(&mut self) -> Vec2 {
        let (a, b, c) = (self.vertices[0], self.vertices[1], self.vertices[2]);
        let ab = b.w - a.w;
        let ac = c.w - a.w;

        // Unnormalized barycentric coordinates of the origin.
        let d1 = -a.w.dot(ab);
        let d2 = -a.w.dot(ac);
        let d3 = -b.w.dot(ab);
        let d4 = -b.w.dot(ac);
        let d5 = -c.w.dot(ab);
        let d6 = -c.w.dot(ac);

        if d1 <= 0.0 && d2 <= 0.0 {
            self.vertices = vec![a];
            return a.w;
        }
        if d3 >= 0.0 && d4 <= d3 {
            self.vertices = vec![b];
            return b.w;
        }
        if d6 >= 0.0 && d5 <= d6 {
            self.vertices = vec![c];
            return c.w;
        }

        let va = d3 * d6 - d5 * d4;
        let vb = d5 * d2 - d1 * d6;
        let vc = d1 * d4 - d3 * d2;

        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            self.vertices = vec![a, b];
            return a.w + (d1 / (d1 - d3)) * ab;
        }
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            self.vertices = vec![a, c];
            return a.w + (d2 / (d2 - d6)) * ac;
        }
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            self.vertices = vec![b, c];
            return b.w + ((d4 - d3) / ((d4 - d3) + (d5 - d6))) * (c.w - b.w);
        }

        // Origin is inside the triangle.
        Vec2::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn separated_boxes_report_gap() {
        let a = Shape::boxy(1.0, 1.0);
        let b = Shape::boxy(1.0, 1.0);
        let d = hull_distance(
            &a,
            &Transform::default(),
            &b,
            &Transform::new(Vec2::new(5.0, 0.0), 0.0),
        );
        assert_relative_eq!(d, 3.0, epsilon = 1e-4);
    }

    #[test]
    fn overlapping_boxes_report_zero() {
        let a = Shape::boxy(1.0, 1.0);
        let b = Shape::boxy(1.0, 1.0);
        let d = hull_distance(
            &a,
            &Transform::default(),
            &b,
            &Transform::new(Vec2::new(1.0, 0.5), 0.0),
        );
        assert_relative_eq!(d, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn circle_centers_measure_point_distance() {
        let a = Shape::circle(0.5);
        let b = Shape::circle(0.5);
        let d = hull_distance(
            &a,
            &Transform::default(),
            &b,
            &Transform::new(Vec2::new(3.0, 4.0), 0.0),
        );
        assert_relative_eq!(d, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn corner_to_corner_distance() {
        let a = Shape::boxy(1.0, 1.0);
        let b = Shape::boxy(1.0, 1.0);
        let d = hull_distance(
            &a,
            &Transform::default(),
            &b,
            &Transform::new(Vec2::new(5.0, 5.0), 0.0),
        );
        assert_relative_eq!(d, (18.0_f32).sqrt(), epsilon = 1e-4);
    }
}

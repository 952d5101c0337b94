use crate::config::POLYGON_RADIUS;
use crate::core::math::{cross, Transform};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Aabb {
    pub lower: Vec2,
    pub upper: Vec2,
}

impl Aabb {
    pub fn new(lower: Vec2, upper: Vec2) -> Self {
        Self { lower, upper }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.lower.x <= other.upper.x
            && self.lower.y <= other.upper.y
            && other.lower.x <= self.upper.x
            && other.lower.y <= self.upper.y
    }

    pub fn contains(&self, other: &Aabb) -> bool {
        self.lower.x <= other.lower.x
            && self.lower.y <= other.lower.y
            && other.upper.x <= self.upper.x
            && other.upper.y <= self.upper.y
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            lower: self.lower.min(other.lower),
            upper: self.upper.max(other.upper),
        }
    }

    pub fn extended(&self, margin: f32) -> Aabb {
        Aabb {
            lower: self.lower - Vec2::splat(margin),
            upper: self.upper + Vec2::splat(margin),
        }
    }
}

/// Mass, center of mass, and rotational inertia about the body origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct MassData {
    pub mass: f32,
    pub center: Vec2,
    pub inertia: f32,
}

/// Ray segment from `p1` toward `p2`, clipped at `max_fraction`.
#[derive(Debug, Clone, Copy)]
pub struct RayCastInput {
    pub p1: Vec2,
    pub p2: Vec2,
    pub max_fraction: f32,
}

/// Result of a ray cast against a single shape.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub fraction: f32,
    pub normal: Vec2,
}

/// Circle with a local center offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleShape {
    pub center: Vec2,
    pub radius: f32,
}

/// Convex polygon in counter-clockwise winding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolygonShape {
    pub vertices: Vec<Vec2>,
    pub normals: Vec<Vec2>,
    pub centroid: Vec2,
}

impl PolygonShape {
    /// Builds a polygon from counter-clockwise convex vertices.
    pub fn new(vertices: Vec<Vec2>) -> Self {
        debug_assert!(vertices.len() >= 3);
        let count = vertices.len();
        let mut normals = Vec::with_capacity(count);
        for i in 0..count {
            let edge = vertices[(i + 1) % count] - vertices[i];
            debug_assert!(edge.length_squared() > f32::EPSILON);
            normals.push(Vec2::new(edge.y, -edge.x).normalize());
        }
        let centroid = polygon_centroid(&vertices);
        Self {
            vertices,
            normals,
            centroid,
        }
    }

    /// Axis-aligned box with the given half extents, centered at the origin.
    pub fn boxy(half_width: f32, half_height: f32) -> Self {
        Self::new(vec![
            Vec2::new(-half_width, -half_height),
            Vec2::new(half_width, -half_height),
            Vec2::new(half_width, half_height),
            Vec2::new(-half_width, half_height),
        ])
    }

    /// Box with the given half extents placed at `center` with `angle`.
    pub fn boxy_at(half_width: f32, half_height: f32, center: Vec2, angle: f32) -> Self {
        let xf = Transform::new(center, angle);
        let vertices = Self::boxy(half_width, half_height)
            .vertices
            .iter()
            .map(|v| xf.apply(*v))
            .collect();
        Self::new(vertices)
    }
}

fn polygon_centroid(vertices: &[Vec2]) -> Vec2 {
    let mut center = Vec2::ZERO;
    let mut area = 0.0;
    let reference = vertices[0];
    for i in 1..vertices.len() - 1 {
        let e1 = vertices[i] - reference;
        let e2 = vertices[i + 1] - reference;
        let triangle_area = 0.5 * cross(e1, e2);
        area += triangle_area;
        center += triangle_area * (e1 + e2) / 3.0;
    }
    debug_assert!(area > f32::EPSILON);
    reference + center / area
}

/// Collision geometry attached to fixtures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Shape {
    Circle(CircleShape),
    Polygon(PolygonShape),
}

impl Shape {
    pub fn circle(radius: f32) -> Self {
        Shape::Circle(CircleShape {
            center: Vec2::ZERO,
            radius,
        })
    }

    pub fn circle_at(center: Vec2, radius: f32) -> Self {
        Shape::Circle(CircleShape { center, radius })
    }

    pub fn boxy(half_width: f32, half_height: f32) -> Self {
        Shape::Polygon(PolygonShape::boxy(half_width, half_height))
    }

    pub fn polygon(vertices: Vec<Vec2>) -> Self {
        Shape::Polygon(PolygonShape::new(vertices))
    }

    /// Skin thickness used by separation and TOI computations.
    pub fn skin_radius(&self) -> f32 {
        match self {
            Shape::Circle(circle) => circle.radius,
            Shape::Polygon(_) => POLYGON_RADIUS,
        }
    }

    /// Vertex hull consumed by GJK distance queries.
    pub fn hull(&self) -> &[Vec2] {
        match self {
            Shape::Circle(circle) => std::slice::from_ref(&circle.center),
            Shape::Polygon(polygon) => &polygon.vertices,
        }
    }

    /// Largest distance from the centroid to any hull point, plus skin.
    pub fn max_extent(&self) -> f32 {
        match self {
            Shape::Circle(circle) => circle.center.length() + circle.radius,
            Shape::Polygon(polygon) => {
                let mut extent: f32 = 0.0;
                for v in &polygon.vertices {
                    extent = extent.max((*v - polygon.centroid).length());
                }
                extent + POLYGON_RADIUS
            }
        }
    }

    pub fn compute_aabb(&self, xf: &Transform) -> Aabb {
        match self {
            Shape::Circle(circle) => {
                let p = xf.apply(circle.center);
                Aabb::new(p - Vec2::splat(circle.radius), p + Vec2::splat(circle.radius))
            }
            Shape::Polygon(polygon) => {
                let mut lower = xf.apply(polygon.vertices[0]);
                let mut upper = lower;
                for v in &polygon.vertices[1..] {
                    let p = xf.apply(*v);
                    lower = lower.min(p);
                    upper = upper.max(p);
                }
                Aabb::new(lower, upper).extended(POLYGON_RADIUS)
            }
        }
    }

    pub fn compute_mass(&self, density: f32) -> MassData {
        match self {
            Shape::Circle(circle) => {
                let mass = density * std::f32::consts::PI * circle.radius * circle.radius;
                MassData {
                    mass,
                    center: circle.center,
                    inertia: mass
                        * (0.5 * circle.radius * circle.radius + circle.center.length_squared()),
                }
            }
            Shape::Polygon(polygon) => polygon_mass(polygon, density),
        }
    }

    pub fn test_point(&self, xf: &Transform, point: Vec2) -> bool {
        let local = xf.apply_inv(point);
        match self {
            Shape::Circle(circle) => (local - circle.center).length_squared()
                <= circle.radius * circle.radius,
            Shape::Polygon(polygon) => polygon
                .vertices
                .iter()
                .zip(polygon.normals.iter())
                .all(|(v, n)| n.dot(local - *v) <= 0.0),
        }
    }

    pub fn ray_cast(&self, input: &RayCastInput, xf: &Transform) -> Option<RayHit> {
        match self {
            Shape::Circle(circle) => ray_circle(input, xf, circle),
            Shape::Polygon(polygon) => ray_polygon(input, xf, polygon),
        }
    }
}

fn polygon_mass(polygon: &PolygonShape, density: f32) -> MassData {
    let mut center = Vec2::ZERO;
    let mut area = 0.0;
    let mut inertia = 0.0;
    let reference = polygon.vertices[0];

    for i in 1..polygon.vertices.len() - 1 {
        let e1 = polygon.vertices[i] - reference;
        let e2 = polygon.vertices[i + 1] - reference;
        let d = cross(e1, e2);
        let triangle_area = 0.5 * d;
        area += triangle_area;
        center += triangle_area * (e1 + e2) / 3.0;

        let intx2 = e1.x * e1.x + e2.x * e1.x + e2.x * e2.x;
        let inty2 = e1.y * e1.y + e2.y * e1.y + e2.y * e2.y;
        inertia += (0.25 / 3.0) * d * (intx2 + inty2);
    }

    let mass = density * area;
    center /= area;
    let world_center = reference + center;
    // Shift the reference-frame inertia to the centroid, then to the origin.
    let inertia_about_centroid = density * inertia - mass * center.length_squared();
    MassData {
        mass,
        center: world_center,
        inertia: inertia_about_centroid + mass * world_center.length_squared(),
    }
}

fn ray_circle(input: &RayCastInput, xf: &Transform, circle: &CircleShape) -> Option<RayHit> {
    let position = xf.apply(circle.center);
    let s = input.p1 - position;
    let b = s.length_squared() - circle.radius * circle.radius;

    let r = input.p2 - input.p1;
    let c = s.dot(r);
    let rr = r.length_squared();
    let sigma = c * c - rr * b;
    if sigma < 0.0 || rr < f32::EPSILON {
        return None;
    }

    let t = -(c + sigma.sqrt());
    if t >= 0.0 && t <= input.max_fraction * rr {
        let fraction = t / rr;
        return Some(RayHit {
            fraction,
            normal: (s + fraction * r).normalize(),
        });
    }
    None
}

fn ray_polygon(input: &RayCastInput, xf: &Transform, polygon: &PolygonShape) -> Option<RayHit> {
    let p1 = xf.apply_inv(input.p1);
    let p2 = xf.apply_inv(input.p2);
    let d = p2 - p1;

    let mut lower = 0.0;
    let mut upper = input.max_fraction;
    let mut index = None;

    for i in 0..polygon.vertices.len() {
        let numerator = polygon.normals[i].dot(polygon.vertices[i] - p1);
        let denominator = polygon.normals[i].dot(d);

        if denominator == 0.0 {
            if numerator < 0.0 {
                return None;
            }
        } else {
            let t = numerator / denominator;
            if denominator < 0.0 && t > lower {
                lower = t;
                index = Some(i);
            } else if denominator > 0.0 && t < upper {
                upper = t;
            }
        }

        if upper < lower {
            return None;
        }
    }

    index.map(|i| RayHit {
        fraction: lower,
        normal: xf.q.apply(polygon.normals[i]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn box_mass_matches_closed_form() {
        let shape = Shape::boxy(0.5, 0.5);
        let mass_data = shape.compute_mass(1.0);
        assert_relative_eq!(mass_data.mass, 1.0, epsilon = 1e-5);
        assert_relative_eq!(mass_data.center.x, 0.0, epsilon = 1e-5);
        // 1x1 unit box: I = m (w^2 + h^2) / 12.
        assert_relative_eq!(mass_data.inertia, 1.0 / 6.0, epsilon = 1e-5);
    }

    #[test]
    fn circle_aabb_tracks_transform() {
        let shape = Shape::circle(2.0);
        let aabb = shape.compute_aabb(&Transform::new(Vec2::new(1.0, -1.0), 0.3));
        assert_relative_eq!(aabb.lower.x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(aabb.upper.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn ray_hits_polygon_face() {
        let shape = Shape::boxy(1.0, 1.0);
        let input = RayCastInput {
            p1: Vec2::new(-5.0, 0.0),
            p2: Vec2::new(5.0, 0.0),
            max_fraction: 1.0,
        };
        let hit = shape
            .ray_cast(&input, &Transform::default())
            .expect("ray should hit the box");
        assert_relative_eq!(hit.fraction, 0.4, epsilon = 1e-5);
        assert_relative_eq!(hit.normal.x, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn ray_misses_offset_circle() {
        let shape = Shape::circle_at(Vec2::new(0.0, 5.0), 1.0);
        let input = RayCastInput {
            p1: Vec2::new(-5.0, 0.0),
            p2: Vec2::new(5.0, 0.0),
            max_fraction: 1.0,
        };
        assert!(shape.ray_cast(&input, &Transform::default()).is_none());
    }

    #[test]
    fn point_containment() {
        let shape = Shape::boxy(1.0, 2.0);
        let xf = Transform::new(Vec2::new(3.0, 0.0), 0.0);
        assert!(shape.test_point(&xf, Vec2::new(3.5, 1.5)));
        assert!(!shape.test_point(&xf, Vec2::new(1.5, 0.0)));
    }
}

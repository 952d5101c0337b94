use crate::collision::shapes::{CircleShape, PolygonShape, Shape};
use crate::config::{LINEAR_SLOP, POLYGON_RADIUS};
use crate::core::math::{cross_vs, Transform};
use glam::Vec2;

pub const MAX_MANIFOLD_POINTS: usize = 2;

/// How the manifold's local data is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifoldKind {
    /// `local_point` is circle A's center, point data is circle B's center.
    #[default]
    Circles,
    /// `local_normal`/`local_point` live on face A, points on body B.
    FaceA,
    /// `local_normal`/`local_point` live on face B, points on body A.
    FaceB,
}

/// One persisted contact point with its accumulated impulses.
#[derive(Debug, Clone, Copy)]
pub struct ManifoldPoint {
    pub local_point: Vec2,
    pub normal_impulse: f32,
    pub tangent_impulse: f32,
    /// Stable feature id used to match points across steps.
    pub id: u32,
}

impl ManifoldPoint {
    fn new(local_point: Vec2, id: u32) -> Self {
        Self {
            local_point,
            normal_impulse: 0.0,
            tangent_impulse: 0.0,
            id,
        }
    }
}

/// Contact manifold in shape-local coordinates.
#[derive(Debug, Clone, Default)]
pub struct Manifold {
    pub kind: ManifoldKind,
    pub local_normal: Vec2,
    pub local_point: Vec2,
    pub points: Vec<ManifoldPoint>,
}

impl Manifold {
    /// Carries accumulated impulses over from a previous-step manifold by
    /// matching feature ids.
    pub fn inherit_impulses(&mut self, previous: &Manifold) {
        for point in &mut self.points {
            if let Some(old) = previous.points.iter().find(|p| p.id == point.id) {
                point.normal_impulse = old.normal_impulse;
                point.tangent_impulse = old.tangent_impulse;
            }
        }
    }
}

/// Manifold data mapped into world space.
#[derive(Debug, Clone, Default)]
pub struct WorldManifold {
    pub normal: Vec2,
    pub points: Vec<Vec2>,
    pub separations: Vec<f32>,
}

impl WorldManifold {
    pub fn new(
        manifold: &Manifold,
        xf_a: &Transform,
        radius_a: f32,
        xf_b: &Transform,
        radius_b: f32,
    ) -> Self {
        let mut world = WorldManifold::default();
        if manifold.points.is_empty() {
            return world;
        }

        match manifold.kind {
            ManifoldKind::Circles => {
                let point_a = xf_a.apply(manifold.local_point);
                let point_b = xf_b.apply(manifold.points[0].local_point);
                let d = point_b - point_a;
                world.normal = if d.length_squared() > f32::EPSILON * f32::EPSILON {
                    d.normalize()
                } else {
                    Vec2::X
                };
                let c_a = point_a + radius_a * world.normal;
                let c_b = point_b - radius_b * world.normal;
                world.points.push(0.5 * (c_a + c_b));
                world.separations.push((c_b - c_a).dot(world.normal));
            }
            ManifoldKind::FaceA => {
                world.normal = xf_a.q.apply(manifold.local_normal);
                let plane_point = xf_a.apply(manifold.local_point);
                for mp in &manifold.points {
                    let clip_point = xf_b.apply(mp.local_point);
                    let offset = (clip_point - plane_point).dot(world.normal);
                    let c_a = clip_point + (radius_a - offset) * world.normal;
                    let c_b = clip_point - radius_b * world.normal;
                    world.points.push(0.5 * (c_a + c_b));
                    world.separations.push((c_b - c_a).dot(world.normal));
                }
            }
            ManifoldKind::FaceB => {
                let normal = xf_b.q.apply(manifold.local_normal);
                let plane_point = xf_b.apply(manifold.local_point);
                for mp in &manifold.points {
                    let clip_point = xf_a.apply(mp.local_point);
                    let offset = (clip_point - plane_point).dot(normal);
                    let c_b = clip_point + (radius_b - offset) * normal;
                    let c_a = clip_point - radius_a * normal;
                    world.points.push(0.5 * (c_a + c_b));
                    world.separations.push((c_a - c_b).dot(normal));
                }
                // Point toward body B by convention.
                world.normal = -normal;
            }
        }
        world
    }
}

/// Computes the manifold for a shape pair.
///
/// Polygon-vs-circle pairs must be ordered polygon-first; the contact manager
/// enforces that ordering at creation.
pub fn evaluate(shape_a: &Shape, xf_a: &Transform, shape_b: &Shape, xf_b: &Transform) -> Manifold {
    match (shape_a, shape_b) {
        (Shape::Circle(a), Shape::Circle(b)) => collide_circles(a, xf_a, b, xf_b),
        (Shape::Polygon(a), Shape::Circle(b)) => collide_polygon_circle(a, xf_a, b, xf_b),
        (Shape::Polygon(a), Shape::Polygon(b)) => collide_polygons(a, xf_a, b, xf_b),
        (Shape::Circle(_), Shape::Polygon(_)) => {
            debug_assert!(false, "circle-polygon pairs must be created polygon-first");
            Manifold::default()
        }
    }
}

fn collide_circles(
    a: &CircleShape,
    xf_a: &Transform,
    b: &CircleShape,
    xf_b: &Transform,
) -> Manifold {
    let mut manifold = Manifold::default();
    let pa = xf_a.apply(a.center);
    let pb = xf_b.apply(b.center);
    let r = a.radius + b.radius;
    if (pb - pa).length_squared() > r * r {
        return manifold;
    }
    manifold.kind = ManifoldKind::Circles;
    manifold.local_point = a.center;
    manifold.points.push(ManifoldPoint::new(b.center, 0));
    manifold
}

fn collide_polygon_circle(
    polygon: &PolygonShape,
    xf_a: &Transform,
    circle: &CircleShape,
    xf_b: &Transform,
) -> Manifold {
    let mut manifold = Manifold::default();

    // Circle center in the polygon's frame.
    let c_local = xf_a.apply_inv(xf_b.apply(circle.center));
    let radius = POLYGON_RADIUS + circle.radius;
    let count = polygon.vertices.len();

    let mut normal_index = 0;
    let mut separation = f32::MIN;
    for i in 0..count {
        let s = polygon.normals[i].dot(c_local - polygon.vertices[i]);
        if s > radius {
            return manifold;
        }
        if s > separation {
            separation = s;
            normal_index = i;
        }
    }

    let v1 = polygon.vertices[normal_index];
    let v2 = polygon.vertices[(normal_index + 1) % count];

    manifold.kind = ManifoldKind::FaceA;
    if separation < f32::EPSILON {
        // Center inside the polygon; use the deepest face.
        manifold.local_normal = polygon.normals[normal_index];
        manifold.local_point = 0.5 * (v1 + v2);
        manifold.points.push(ManifoldPoint::new(circle.center, 0));
        return manifold;
    }

    let u1 = (c_local - v1).dot(v2 - v1);
    let u2 = (c_local - v2).dot(v1 - v2);
    if u1 <= 0.0 {
        if (c_local - v1).length_squared() > radius * radius {
            return Manifold::default();
        }
        manifold.local_normal = (c_local - v1).normalize();
        manifold.local_point = v1;
    } else if u2 <= 0.0 {
        if (c_local - v2).length_squared() > radius * radius {
            return Manifold::default();
        }
        manifold.local_normal = (c_local - v2).normalize();
        manifold.local_point = v2;
    } else {
        let face_center = 0.5 * (v1 + v2);
        if (c_local - face_center).dot(polygon.normals[normal_index]) > radius {
            return Manifold::default();
        }
        manifold.local_normal = polygon.normals[normal_index];
        manifold.local_point = face_center;
    }
    manifold.points.push(ManifoldPoint::new(circle.center, 0));
    manifold
}

#[derive(Clone, Copy)]
struct ClipVertex {
    v: Vec2,
    id: u32,
}

fn feature_id(reference: usize, incident: usize, flip: bool) -> u32 {
    ((reference as u32) << 9) | ((incident as u32) << 1) | flip as u32
}

/// Greatest separation of `poly2`'s hull from `poly1`'s faces.
fn find_max_separation(
    poly1: &PolygonShape,
    xf1: &Transform,
    poly2: &PolygonShape,
    xf2: &Transform,
) -> (f32, usize) {
    let mut best_edge = 0;
    let mut best_separation = f32::MIN;

    for i in 0..poly1.vertices.len() {
        // Face data mapped into poly2's frame.
        let n = xf2.q.apply_inv(xf1.q.apply(poly1.normals[i]));
        let v1 = xf2.apply_inv(xf1.apply(poly1.vertices[i]));

        let mut deepest = f32::MAX;
        for v2 in &poly2.vertices {
            deepest = deepest.min(n.dot(*v2 - v1));
        }
        if deepest > best_separation {
            best_separation = deepest;
            best_edge = i;
        }
    }
    (best_separation, best_edge)
}

fn incident_edge(
    reference: &PolygonShape,
    xf_ref: &Transform,
    edge: usize,
    incident: &PolygonShape,
    xf_inc: &Transform,
    flip: bool,
) -> [ClipVertex; 2] {
    // Reference face normal in the incident polygon's frame.
    let normal = xf_inc.q.apply_inv(xf_ref.q.apply(reference.normals[edge]));

    let mut index = 0;
    let mut min_dot = f32::MAX;
    for (i, n) in incident.normals.iter().enumerate() {
        let d = normal.dot(*n);
        if d < min_dot {
            min_dot = d;
            index = i;
        }
    }

    let i1 = index;
    let i2 = (index + 1) % incident.vertices.len();
    [
        ClipVertex {
            v: xf_inc.apply(incident.vertices[i1]),
            id: feature_id(edge, i1, flip),
        },
        ClipVertex {
            v: xf_inc.apply(incident.vertices[i2]),
            id: feature_id(edge, i2, flip),
        },
    ]
}

fn clip_segment(
    input: [ClipVertex; 2],
    normal: Vec2,
    offset: f32,
    edge: usize,
    flip: bool,
) -> Option<[ClipVertex; 2]> {
    let d0 = normal.dot(input[0].v) - offset;
    let d1 = normal.dot(input[1].v) - offset;

    let mut out = Vec::with_capacity(2);
    if d0 <= 0.0 {
        out.push(input[0]);
    }
    if d1 <= 0.0 {
        out.push(input[1]);
    }
    if d0 * d1 < 0.0 {
        let t = d0 / (d0 - d1);
        out.push(ClipVertex {
            v: input[0].v + t * (input[1].v - input[0].v),
            id: feature_id(edge | 0x80, (input[0].id >> 1) as usize & 0xff, flip),
        });
    }
    if out.len() < 2 {
        return None;
    }
    Some([out[0], out[1]])
}

fn collide_polygons(
    poly_a: &PolygonShape,
    xf_a: &Transform,
    poly_b: &PolygonShape,
    xf_b: &Transform,
) -> Manifold {
    let manifold = Manifold::default();
    let total_radius = 2.0 * POLYGON_RADIUS;

    let (separation_a, edge_a) = find_max_separation(poly_a, xf_a, poly_b, xf_b);
    if separation_a > total_radius {
        return manifold;
    }
    let (separation_b, edge_b) = find_max_separation(poly_b, xf_b, poly_a, xf_a);
    if separation_b > total_radius {
        return manifold;
    }

    let (reference, xf_ref, incident, xf_inc, edge, kind, flip);
    if separation_b > separation_a + 0.1 * LINEAR_SLOP {
        reference = poly_b;
        xf_ref = xf_b;
        incident = poly_a;
        xf_inc = xf_a;
        edge = edge_b;
        kind = ManifoldKind::FaceB;
        flip = true;
    } else {
        reference = poly_a;
        xf_ref = xf_a;
        incident = poly_b;
        xf_inc = xf_b;
        edge = edge_a;
        kind = ManifoldKind::FaceA;
        flip = false;
    }

    let incident_points = incident_edge(reference, xf_ref, edge, incident, xf_inc, flip);

    let count = reference.vertices.len();
    let v11 = reference.vertices[edge];
    let v12 = reference.vertices[(edge + 1) % count];

    let local_tangent = (v12 - v11).normalize();
    let local_normal = cross_vs(local_tangent, 1.0);
    let plane_point = 0.5 * (v11 + v12);

    let tangent = xf_ref.q.apply(local_tangent);
    let normal = cross_vs(tangent, 1.0);

    let v11w = xf_ref.apply(v11);
    let v12w = xf_ref.apply(v12);

    let front_offset = normal.dot(v11w);
    let side_offset1 = -tangent.dot(v11w) + total_radius;
    let side_offset2 = tangent.dot(v12w) + total_radius;

    let clipped = clip_segment(incident_points, -tangent, side_offset1, edge, flip)
        .and_then(|points| clip_segment(points, tangent, side_offset2, edge, flip));
    let clipped = match clipped {
        Some(points) => points,
        None => return manifold,
    };

    let mut manifold = Manifold {
        kind,
        local_normal,
        local_point: plane_point,
        points: Vec::with_capacity(MAX_MANIFOLD_POINTS),
    };
    for cv in clipped {
        if normal.dot(cv.v) - front_offset <= total_radius {
            manifold
                .points
                .push(ManifoldPoint::new(xf_inc.apply_inv(cv.v), cv.id));
        }
    }
    manifold
}

//! Ray and region picking.
//!
//! Picking is behind the [`Picker`] trait so the editor core stays
//! renderer-agnostic: a host supplies rays and screen rectangles in whatever
//! way its camera produces them, and [`FrustumPicker`] is the bundled
//! implementation for a standard perspective view-projection matrix.
//!
//! What counts as "hit" follows the active selection mode: vertices are
//! picked as small spheres, edges as capsules around their segment, and faces
//! through their cached triangle fans.

use nalgebra::{Matrix4, Point2, Point3, Vector3};

use crate::mesh::{MeshStore, PrimitiveRef};
use crate::select::SelectionMode;

/// A world-space ray.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin.
    pub origin: Point3<f64>,
    /// Ray direction; assumed normalized.
    pub direction: Vector3<f64>,
}

impl Ray {
    /// Create a ray, normalizing the direction.
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// The point at parameter `t` along the ray.
    #[inline]
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }

    /// Intersect with the plane through `point` with the given normal.
    ///
    /// Returns the hit point, or `None` when the ray is parallel to the
    /// plane or the hit lies behind the origin. Translation drags use this
    /// to map cursor rays onto the gizmo's working plane.
    pub fn intersect_plane(
        &self,
        point: Point3<f64>,
        normal: Vector3<f64>,
    ) -> Option<Point3<f64>> {
        let denom = self.direction.dot(&normal);
        if denom.abs() < 1e-12 {
            return None;
        }
        let t = (point - self.origin).dot(&normal) / denom;
        if t < 0.0 {
            return None;
        }
        Some(self.point_at(t))
    }
}

/// A screen-space selection rectangle in normalized device coordinates,
/// both corners in `[-1, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct ScreenRect {
    min: Point2<f64>,
    max: Point2<f64>,
}

impl ScreenRect {
    /// Build a rectangle from two opposite corners, in either order.
    pub fn from_corners(a: Point2<f64>, b: Point2<f64>) -> Self {
        Self {
            min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Is the point inside the rectangle? Boundary counts as inside.
    #[inline]
    pub fn contains(&self, p: Point2<f64>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Maps pointer input to mesh primitives.
pub trait Picker {
    /// The closest primitive of the mode's kind hit by the ray, if any.
    fn raycast_nearest(
        &self,
        store: &MeshStore,
        ray: &Ray,
        mode: SelectionMode,
    ) -> Option<PrimitiveRef>;

    /// Every primitive of the mode's kind fully inside the screen rectangle.
    fn overlap_region(
        &self,
        store: &MeshStore,
        rect: &ScreenRect,
        mode: SelectionMode,
    ) -> Vec<PrimitiveRef>;
}

/// Picker for a perspective camera described by one view-projection matrix.
#[derive(Debug, Clone)]
pub struct FrustumPicker {
    /// Combined view-projection matrix used for region tests.
    pub view_proj: Matrix4<f64>,
    /// World-space pick radius around vertices.
    pub vertex_radius: f64,
    /// World-space pick radius around edge segments.
    pub edge_radius: f64,
}

impl FrustumPicker {
    /// Create a picker with the given camera matrix and default pick radii.
    pub fn new(view_proj: Matrix4<f64>) -> Self {
        Self {
            view_proj,
            vertex_radius: 0.05,
            edge_radius: 0.03,
        }
    }

    /// Project a world point to normalized device coordinates.
    ///
    /// `None` for points behind the camera or outside the depth range.
    fn to_ndc(&self, p: Point3<f64>) -> Option<Point2<f64>> {
        let clip = self.view_proj * p.to_homogeneous();
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip / clip.w;
        if ndc.z < -1.0 || ndc.z > 1.0 {
            return None;
        }
        Some(Point2::new(ndc.x, ndc.y))
    }

    fn in_rect(&self, rect: &ScreenRect, p: Point3<f64>) -> bool {
        self.to_ndc(p).is_some_and(|ndc| rect.contains(ndc))
    }
}

impl Picker for FrustumPicker {
    fn raycast_nearest(
        &self,
        store: &MeshStore,
        ray: &Ray,
        mode: SelectionMode,
    ) -> Option<PrimitiveRef> {
        let mut best: Option<(f64, PrimitiveRef)> = None;
        let mut consider = |t: f64, prim: PrimitiveRef| {
            if best.map_or(true, |(bt, _)| t < bt) {
                best = Some((t, prim));
            }
        };

        match mode {
            SelectionMode::Vertex => {
                for v in store.vertex_ids() {
                    let center = store.vertex(v).position;
                    if let Some(t) = ray_sphere(ray, center, self.vertex_radius) {
                        consider(t, PrimitiveRef::Vertex(v));
                    }
                }
            }
            SelectionMode::Edge => {
                for e in store.edge_ids() {
                    let edge = store.edge(e);
                    let a = store.vertex(edge.a).position;
                    let b = store.vertex(edge.b).position;
                    if let Some(t) = ray_segment(ray, a, b, self.edge_radius) {
                        consider(t, PrimitiveRef::Edge(e));
                    }
                }
            }
            SelectionMode::Face => {
                for p in store.polygon_ids() {
                    for tri in store.polygon(p).triangles.chunks_exact(3) {
                        let a = store.vertex(tri[0]).position;
                        let b = store.vertex(tri[1]).position;
                        let c = store.vertex(tri[2]).position;
                        if let Some(t) = ray_triangle(ray, a, b, c) {
                            consider(t, PrimitiveRef::Polygon(p));
                        }
                    }
                }
            }
        }

        best.map(|(_, prim)| prim)
    }

    fn overlap_region(
        &self,
        store: &MeshStore,
        rect: &ScreenRect,
        mode: SelectionMode,
    ) -> Vec<PrimitiveRef> {
        match mode {
            SelectionMode::Vertex => store
                .vertex_ids()
                .filter(|&v| self.in_rect(rect, store.vertex(v).position))
                .map(PrimitiveRef::Vertex)
                .collect(),
            // An edge is inside only when both endpoints are.
            SelectionMode::Edge => store
                .edge_ids()
                .filter(|&e| {
                    let edge = store.edge(e);
                    self.in_rect(rect, store.vertex(edge.a).position)
                        && self.in_rect(rect, store.vertex(edge.b).position)
                })
                .map(PrimitiveRef::Edge)
                .collect(),
            // A face is inside only when its whole boundary is.
            SelectionMode::Face => store
                .polygon_ids()
                .filter(|&p| {
                    store
                        .polygon_loops(p)
                        .iter()
                        .all(|l| self.in_rect(rect, store.vertex(l.start).position))
                })
                .map(PrimitiveRef::Polygon)
                .collect(),
        }
    }
}

/// Smallest non-negative `t` where the ray enters a sphere.
fn ray_sphere(ray: &Ray, center: Point3<f64>, radius: f64) -> Option<f64> {
    let oc = ray.origin - center;
    let b = oc.dot(&ray.direction);
    let c = oc.norm_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt = disc.sqrt();
    let t = -b - sqrt;
    if t >= 0.0 {
        return Some(t);
    }
    let t = -b + sqrt;
    // Origin inside the sphere still counts as a hit at the exit point.
    (t >= 0.0).then_some(t)
}

/// Ray parameter of the closest approach to segment `ab`, if within `radius`.
fn ray_segment(ray: &Ray, a: Point3<f64>, b: Point3<f64>, radius: f64) -> Option<f64> {
    let seg = b - a;
    let w = ray.origin - a;

    let aa = ray.direction.norm_squared();
    let bb = ray.direction.dot(&seg);
    let cc = seg.norm_squared();
    let dd = ray.direction.dot(&w);
    let ee = seg.dot(&w);
    let denom = aa * cc - bb * bb;

    // Closest-point parameters on ray (t) and segment (s), clamped.
    let (t, s) = if denom.abs() < 1e-12 {
        // Parallel: fix s at the segment start.
        (-dd / aa, 0.0)
    } else {
        let s = ((aa * ee - bb * dd) / denom).clamp(0.0, 1.0);
        ((bb * s - dd) / aa, s)
    };
    if t < 0.0 {
        return None;
    }

    let on_ray = ray.point_at(t);
    let on_seg = a + seg * s;
    ((on_ray - on_seg).norm() <= radius).then_some(t)
}

/// Möller–Trumbore ray-triangle intersection, both windings.
fn ray_triangle(ray: &Ray, a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Option<f64> {
    let ab = b - a;
    let ac = c - a;
    let pvec = ray.direction.cross(&ac);
    let det = ab.dot(&pvec);
    if det.abs() < 1e-12 {
        return None;
    }
    let inv_det = 1.0 / det;
    let tvec = ray.origin - a;
    let u = tvec.dot(&pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let qvec = tvec.cross(&ab);
    let v = ray.direction.dot(&qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = ac.dot(&qvec) * inv_det;
    (t >= 0.0).then_some(t)
}

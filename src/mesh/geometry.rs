//! Polygon normal and triangulation helpers.
//!
//! Triangulation uses ear clipping in the polygon's local 2D projection, as
//! described in the classic Eberly write-up on triangulation by ear clipping.
//! The boundary is rotated so its plane normal aligns with +Z, ears are
//! clipped by a convexity test plus a point-in-triangle containment test, and
//! the remaining three vertices close the fan.
//!
//! Tie-breaks are deliberate and fixed:
//! - the convexity test treats a collinear corner (zero cross product) as
//!   convex;
//! - the point-in-triangle test uses strict half-plane comparisons, so a
//!   point exactly on a triangle edge counts as *not* contained.
//!
//! Both functions operate on plain position slices so they can be unit tested
//! without a store.

use nalgebra::{Point2, Point3, Rotation3, Vector3};

use crate::error::{EditError, Result};

/// Compute a polygon's unit normal from its boundary positions.
///
/// The normal is the cross product of the first two radial directions from
/// the boundary centroid, normalized. Returns [`EditError::UndefinedNormal`]
/// when the boundary is collinear or coincident.
pub fn normal_from_boundary(points: &[Point3<f64>]) -> Result<Vector3<f64>> {
    if points.len() < 3 {
        return Err(EditError::DegeneratePolygon {
            loops: points.len(),
        });
    }

    let mut center = Vector3::zeros();
    for p in points {
        center += p.coords;
    }
    center /= points.len() as f64;

    let r0 = (points[0].coords - center)
        .try_normalize(1e-12)
        .ok_or(EditError::UndefinedNormal)?;
    let r1 = (points[1].coords - center)
        .try_normalize(1e-12)
        .ok_or(EditError::UndefinedNormal)?;

    r0.cross(&r1)
        .try_normalize(1e-12)
        .ok_or(EditError::UndefinedNormal)
}

/// Triangulate a simple polygon boundary by ear clipping.
///
/// `normal` must be the polygon's plane normal (see [`normal_from_boundary`]).
/// Returns indices into `points`, three per triangle, covering every boundary
/// vertex. Fails with [`EditError::NoEarFound`] for degenerate or
/// self-intersecting boundaries; the caller is expected to keep its previous
/// triangulation in that case.
pub fn triangulate_boundary(points: &[Point3<f64>], normal: &Vector3<f64>) -> Result<Vec<usize>> {
    if points.len() < 3 {
        return Err(EditError::DegeneratePolygon {
            loops: points.len(),
        });
    }

    // Rotate the boundary so it lies in the x-y plane. rotation_between is
    // None only for anti-parallel vectors, where any half-turn through a
    // perpendicular axis works.
    let rot = Rotation3::rotation_between(normal, &Vector3::z()).unwrap_or_else(|| {
        Rotation3::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI)
    });
    let flat: Vec<Point2<f64>> = points
        .iter()
        .map(|p| {
            let q = rot * p.coords;
            Point2::new(q.x, q.y)
        })
        .collect();

    let mut working: Vec<usize> = (0..points.len()).collect();
    let mut triangles = Vec::with_capacity((points.len() - 2) * 3);

    // Clip one ear per pass until only the final triangle remains.
    while working.len() > 3 {
        let mut ear_found = false;
        for i in 0..working.len() {
            let prev = (i + working.len() - 1) % working.len();
            let next = (i + 1) % working.len();
            let a = flat[working[prev]];
            let b = flat[working[i]];
            let c = flat[working[next]];

            if !is_convex(a, b, c) {
                continue;
            }

            // Skip if any other boundary vertex lies inside the candidate ear.
            let blocked = (0..working.len()).any(|j| {
                j != i && j != prev && j != next && point_in_triangle(a, b, c, flat[working[j]])
            });
            if blocked {
                continue;
            }

            triangles.push(working[prev]);
            triangles.push(working[i]);
            triangles.push(working[next]);
            working.remove(i);
            ear_found = true;
            break;
        }

        if !ear_found {
            return Err(EditError::NoEarFound {
                remaining: working.len(),
            });
        }
    }

    triangles.push(working[0]);
    triangles.push(working[1]);
    triangles.push(working[2]);
    Ok(triangles)
}

/// Convexity test for the corner a-b-c. Collinear corners count as convex.
fn is_convex(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> bool {
    let d1 = a - b;
    let d2 = b - c;
    d1.x * d2.y - d1.y * d2.x >= 0.0
}

/// Half-plane sign test. A point exactly on a triangle edge is not contained.
fn point_in_triangle(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>, s: Point2<f64>) -> bool {
    let as_x = s.x - a.x;
    let as_y = s.y - a.y;

    let s_ab = (b.x - a.x) * as_y - (b.y - a.y) * as_x > 0.0;

    if ((c.x - a.x) * as_y - (c.y - a.y) * as_x > 0.0) == s_ab {
        return false;
    }
    if ((c.x - b.x) * (s.y - b.y) - (c.y - b.y) * (s.x - b.x) > 0.0) != s_ab {
        return false;
    }
    true
}

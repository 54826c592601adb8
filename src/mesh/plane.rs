//! Directed plane in 3D space and point/polygon classification against it.

use crate::float_types::{EPSILON, Real};
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::Vertex;
use nalgebra::{Point3, Vector3};

/// All vertices lie on the plane within [`EPSILON`].
pub const COPLANAR: i8 = 0;
/// At least one vertex in front of the plane, none behind.
pub const FRONT: i8 = 1;
/// At least one vertex behind the plane, none in front.
pub const BACK: i8 = 2;
/// Vertices on both sides: `FRONT | BACK`.
pub const SPANNING: i8 = 3;

/// A directed plane `{p : n·p = w}` with unit normal `n`.
///
/// The positive (front) side is the one the normal points into; the solid
/// enclosed by a closed mesh lies behind each of its face planes.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    normal: Vector3<Real>,
    w: Real,
}

impl Plane {
    /// Build a plane from a (not necessarily unit) normal and offset.
    /// The pair is renormalized so the stored normal is unit length.
    pub fn from_normal(normal: Vector3<Real>, w: Real) -> Self {
        let len = normal.norm();
        debug_assert!(len > EPSILON, "plane normal must be nonzero");
        Plane {
            normal: normal / len,
            w: w / len,
        }
    }

    /// Plane through three points, oriented by their winding.
    /// Returns `None` when the points are colinear.
    pub fn from_points(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> Option<Self> {
        let cross = (b - a).cross(&(c - a));
        if cross.norm() < EPSILON {
            return None;
        }
        let normal = cross.normalize();
        Some(Plane {
            normal,
            w: normal.dot(&a.coords),
        })
    }

    /// Best-fit plane of a vertex ring using Newell's method, which yields
    /// the winding-correct normal even for concave rings (where the first
    /// vertex triple may sit on a reflex corner).
    pub fn from_vertices(vertices: &[Vertex]) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }

        let mut normal = Vector3::zeros();
        for i in 0..vertices.len() {
            let p0 = vertices[i].pos;
            let p1 = vertices[(i + 1) % vertices.len()].pos;
            normal.x += (p0.y - p1.y) * (p0.z + p1.z);
            normal.y += (p0.z - p1.z) * (p0.x + p1.x);
            normal.z += (p0.x - p1.x) * (p0.y + p1.y);
        }

        // |Newell normal| = 2 * enclosed area
        if normal.norm() < EPSILON {
            return None;
        }

        let normal = normal.normalize();
        Some(Plane {
            normal,
            w: normal.dot(&vertices[0].pos.coords),
        })
    }

    #[inline]
    pub fn normal(&self) -> Vector3<Real> {
        self.normal
    }

    #[inline]
    pub fn offset(&self) -> Real {
        self.w
    }

    /// Flip the plane in place so its front and back sides swap.
    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    /// A copy of this plane facing the other way.
    pub fn flipped(&self) -> Self {
        let mut plane = self.clone();
        plane.flip();
        plane
    }

    /// Signed distance of `point` from the plane (positive in front).
    #[inline]
    pub fn signed_distance(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.w
    }

    /// Classify a point as [`FRONT`], [`BACK`] or [`COPLANAR`].
    /// Ties within [`EPSILON`] classify as coplanar.
    pub fn orient_point(&self, point: &Point3<Real>) -> i8 {
        let t = self.signed_distance(point);
        if t < -EPSILON {
            BACK
        } else if t > EPSILON {
            FRONT
        } else {
            COPLANAR
        }
    }

    /// Whether another plane faces the same way as this one:
    /// [`FRONT`] when the normals agree, [`BACK`] otherwise.
    pub fn orient_plane(&self, other: &Plane) -> i8 {
        if self.normal.dot(&other.normal) > 0.0 {
            FRONT
        } else {
            BACK
        }
    }

    /// Classify a polygon against this plane by folding per-vertex
    /// comparisons, short-circuiting once [`SPANNING`] is reached.
    pub fn classify_polygon<S: Clone>(&self, polygon: &Polygon<S>) -> i8 {
        let mut polygon_type = COPLANAR;
        for vertex in &polygon.vertices {
            polygon_type |= self.orient_point(&vertex.pos);
            if polygon_type == SPANNING {
                break;
            }
        }
        polygon_type
    }

    /// Tolerance equality: same orientation and offset within [`EPSILON`].
    pub fn is_coplanar_with(&self, other: &Plane) -> bool {
        (self.normal - other.normal).norm() < EPSILON && (self.w - other.w).abs() < EPSILON
    }
}

impl approx::AbsDiffEq for Plane {
    type Epsilon = Real;

    fn default_epsilon() -> Self::Epsilon {
        Real::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        approx::AbsDiffEq::abs_diff_eq(&self.normal, &other.normal, epsilon)
            && approx::AbsDiffEq::abs_diff_eq(&self.w, &other.w, epsilon)
    }
}

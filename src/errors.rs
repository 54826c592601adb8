use crate::float_types::Real;
use nalgebra::Point3;

/// Why a vertex ring was rejected by [`Polygon::try_new`](crate::mesh::polygon::Polygon::try_new).
///
/// The engine itself never surfaces these: operations on valid meshes are
/// total, and the plain [`Polygon::new`](crate::mesh::polygon::Polygon::new)
/// constructor collapses them to `None`.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    /// A polygon requires at least three vertices
    #[error("a polygon requires at least 3 vertices, got {0}")]
    TooFewVertices(usize),
    /// Two consecutive vertices are identical
    #[error("Point({}) is repeated consecutively", .0)]
    RepeatedPoint(Point3<Real>),
    /// The vertices are colinear, or enclose no area
    #[error("vertices are colinear or enclose no area")]
    Degenerate,
    /// A `Polygon` is non-planar or not on its plane
    #[error("a Polygon is non-planar or not on its plane")]
    NonPlanar,
}

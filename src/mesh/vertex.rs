//! Struct and functions for working with `Vertex`s from which `Polygon`s are composed.

use crate::float_types::{EPSILON, Real};
use nalgebra::{Point3, Vector2, Vector3};

/// A vertex of a polygon, holding position, normal and texture coordinate.
#[derive(Debug, Clone, PartialEq, Copy)]
pub struct Vertex {
    pub pos: Point3<Real>,
    pub normal: Vector3<Real>,
    pub uv: Vector2<Real>,
}

impl Vertex {
    /// Create a new [`Vertex`] with a zero texture coordinate.
    ///
    /// * `pos`    – the position in model space
    /// * `normal` – (optionally non-unit) normal; it will be **copied verbatim**,
    ///   so make sure it is oriented the way you need it for lighting / BSP tests.
    #[inline]
    pub fn new(pos: Point3<Real>, normal: Vector3<Real>) -> Self {
        Self::textured(pos, normal, Vector2::zeros())
    }

    /// Create a new [`Vertex`] carrying a texture coordinate in `[0,1]²`.
    pub fn textured(mut pos: Point3<Real>, mut normal: Vector3<Real>, mut uv: Vector2<Real>) -> Self {
        // Sanitise position
        for c in pos.coords.iter_mut() {
            if !c.is_finite() {
                *c = 0.0;
            }
        }

        // Sanitise normal
        for c in normal.iter_mut() {
            if !c.is_finite() {
                *c = 0.0;
            }
        }

        // Sanitise texture coordinate
        for c in uv.iter_mut() {
            if !c.is_finite() {
                *c = 0.0;
            }
        }

        Vertex { pos, normal, uv }
    }

    /// Flip vertex normal in place.
    ///
    /// # Example
    /// ```rust
    /// # use nalgebra::{Point3, Vector3};
    /// # use csgkit::mesh::vertex::Vertex;
    /// let mut v = Vertex::new(Point3::new(1.0, 2.0, 3.0), Vector3::x());
    /// v.flip();
    /// assert_eq!(v.pos, Point3::new(1.0, 2.0, 3.0), "position remains the same");
    /// assert_eq!(v.normal, -Vector3::x(), "the normal is negated");
    /// ```
    pub fn flip(&mut self) {
        self.normal = -self.normal;
    }

    /// Linearly interpolate between `self` and `other` by parameter `t`,
    /// blending position, normal and texture coordinate alike.
    pub fn interpolate(&self, other: &Vertex, t: Real) -> Vertex {
        let pos = self.pos + (other.pos - self.pos) * t;
        let normal = self.normal + (other.normal - self.normal) * t;
        let uv = self.uv + (other.uv - self.uv) * t;
        Vertex { pos, normal, uv }
    }

    /// Whether two vertices coincide in position, normal and texture
    /// coordinate within [`EPSILON`]. This is the equality the polygon
    /// merge step uses to detect a shared edge.
    pub fn is_near(&self, other: &Vertex) -> bool {
        (self.pos - other.pos).norm() < EPSILON
            && (self.normal - other.normal).norm() < EPSILON
            && (self.uv - other.uv).norm() < EPSILON
    }

    /// Euclidean distance between vertex positions.
    pub fn distance_to(&self, other: &Vertex) -> Real {
        (self.pos - other.pos).norm()
    }

    /// Squared Euclidean distance, avoiding the square root.
    pub fn distance_squared_to(&self, other: &Vertex) -> Real {
        (self.pos - other.pos).norm_squared()
    }
}

impl approx::AbsDiffEq for Vertex {
    type Epsilon = Real;

    fn default_epsilon() -> Self::Epsilon {
        Real::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        approx::AbsDiffEq::abs_diff_eq(&self.pos, &other.pos, epsilon)
            && approx::AbsDiffEq::abs_diff_eq(&self.normal, &other.normal, epsilon)
            && approx::AbsDiffEq::abs_diff_eq(&self.uv, &other.uv, epsilon)
    }
}

impl approx::RelativeEq for Vertex {
    fn default_max_relative() -> Self::Epsilon {
        Real::EPSILON
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        approx::RelativeEq::relative_eq(&self.pos, &other.pos, epsilon, max_relative)
            && approx::RelativeEq::relative_eq(&self.normal, &other.normal, epsilon, max_relative)
            && approx::RelativeEq::relative_eq(&self.uv, &other.uv, epsilon, max_relative)
    }
}

impl approx::UlpsEq for Vertex {
    fn default_max_ulps() -> u32 {
        4
    }

    fn ulps_eq(&self, other: &Self, epsilon: Self::Epsilon, max_ulps: u32) -> bool {
        approx::UlpsEq::ulps_eq(&self.pos, &other.pos, epsilon, max_ulps)
            && approx::UlpsEq::ulps_eq(&self.normal, &other.normal, epsilon, max_ulps)
            && approx::UlpsEq::ulps_eq(&self.uv, &other.uv, epsilon, max_ulps)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_vertex_new() {
        let pos = Point3::new(1.0, 2.0, 3.0);
        let normal = Vector3::new(0.0, 1.0, 0.0);
        let v = Vertex::new(pos, normal);
        assert_eq!(v.pos, pos);
        assert_eq!(v.normal, normal);
        assert_eq!(v.uv, Vector2::zeros());
    }

    #[test]
    fn test_vertex_interpolate() {
        let v1 = Vertex::textured(Point3::origin(), Vector3::x(), Vector2::zeros());
        let v2 = Vertex::textured(Point3::new(2.0, 2.0, 2.0), Vector3::y(), Vector2::new(1.0, 0.5));
        let v_mid = v1.interpolate(&v2, 0.5);

        approx::assert_relative_eq!(
            v_mid,
            Vertex::textured(
                Point3::new(1.0, 1.0, 1.0),
                Vector3::new(0.5, 0.5, 0.0),
                Vector2::new(0.5, 0.25)
            )
        );
    }

    #[test]
    fn distance() {
        let v1 = Vertex::new(Point3::new(0.0, 0.0, 0.0), Vector3::x());
        let v2 = Vertex::new(Point3::new(3.0, 4.0, 0.0), Vector3::x());

        let distance = v1.distance_to(&v2);
        assert!(
            (distance - 5.0).abs() < 1e-10,
            "Distance should be 5.0 (3-4-5 triangle)"
        );

        let distance_sq = v1.distance_squared_to(&v2);
        assert!(
            (distance_sq - 25.0).abs() < 1e-10,
            "Squared distance should be 25.0"
        );
    }

    #[test]
    fn near() {
        let v1 = Vertex::new(Point3::new(1.0, 0.0, 0.0), Vector3::z());
        let v2 = Vertex::new(Point3::new(1.0, 0.0, 1e-12), Vector3::z());
        let v3 = Vertex::new(Point3::new(1.0, 0.0, 0.0), -Vector3::z());
        assert!(v1.is_near(&v2));
        assert!(!v1.is_near(&v3), "opposed normals are not the same vertex");
    }
}

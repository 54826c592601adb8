//! Basic solid constructors used as operation inputs and test scaffolding.

use crate::float_types::{PI, Real, TAU};
use crate::mesh::Mesh;
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::Vertex;
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;

impl<S: Clone + Send + Sync + Debug> Mesh<S> {
    /// An axis-aligned cube with one corner at the origin.
    pub fn cube(size: Real, metadata: Option<S>) -> Mesh<S> {
        Self::cuboid(size, size, size, metadata)
    }

    /// An axis-aligned rectangular prism spanning `[0,width] × [0,length] ×
    /// [0,height]`, built from six outward-facing quads wound
    /// anticlockwise as seen from outside.
    pub fn cuboid(width: Real, length: Real, height: Real, metadata: Option<S>) -> Mesh<S> {
        // The eight corner points of the prism, (x, y, z)
        let p000 = Point3::new(0.0, 0.0, 0.0);
        let p100 = Point3::new(width, 0.0, 0.0);
        let p110 = Point3::new(width, length, 0.0);
        let p010 = Point3::new(0.0, length, 0.0);

        let p001 = Point3::new(0.0, 0.0, height);
        let p101 = Point3::new(width, 0.0, height);
        let p111 = Point3::new(width, length, height);
        let p011 = Point3::new(0.0, length, height);

        let face = |points: [Point3<Real>; 4], normal: Vector3<Real>| {
            Polygon::new(
                points.iter().map(|&p| Vertex::new(p, normal)).collect(),
                metadata.clone(),
            )
            .expect("cuboid faces are planar")
        };

        let bottom = face([p000, p010, p110, p100], -Vector3::z());
        let top = face([p001, p101, p111, p011], Vector3::z());
        let front = face([p000, p100, p101, p001], -Vector3::y());
        let back = face([p010, p011, p111, p110], Vector3::y());
        let left = face([p000, p001, p011, p010], -Vector3::x());
        let right = face([p100, p110, p111, p101], Vector3::x());

        Mesh::from_polygons(&[bottom, top, front, back, left, right], metadata.clone())
    }

    /// A sphere of `radius` centered at the origin, tessellated into
    /// `segments` longitudinal slices and `stacks` latitudinal shells
    /// (quads, with triangles at the poles).
    pub fn sphere(radius: Real, segments: usize, stacks: usize, metadata: Option<S>) -> Mesh<S> {
        let mut polygons = Vec::with_capacity(segments * stacks);

        for i in 0..segments {
            for j in 0..stacks {
                let mut vertices = Vec::with_capacity(4);

                let vertex = |theta: Real, phi: Real| {
                    let dir = Vector3::new(
                        theta.cos() * phi.sin(),
                        phi.cos(),
                        theta.sin() * phi.sin(),
                    );
                    Vertex::new(
                        Point3::new(dir.x * radius, dir.y * radius, dir.z * radius),
                        dir,
                    )
                };

                let t0 = i as Real / segments as Real;
                let t1 = (i + 1) as Real / segments as Real;
                let p0 = j as Real / stacks as Real;
                let p1 = (j + 1) as Real / stacks as Real;

                let theta0 = t0 * TAU;
                let theta1 = t1 * TAU;
                let phi0 = p0 * PI;
                let phi1 = p1 * PI;

                vertices.push(vertex(theta0, phi0));
                if j > 0 {
                    vertices.push(vertex(theta1, phi0));
                }
                if j < stacks - 1 {
                    vertices.push(vertex(theta1, phi1));
                }
                vertices.push(vertex(theta0, phi1));

                polygons.push(
                    Polygon::new(vertices, metadata.clone())
                        .expect("sphere shells are planar"),
                );
            }
        }
        Mesh::from_polygons(&polygons, metadata)
    }
}

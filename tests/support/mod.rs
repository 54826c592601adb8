//! Test support library
//! Provides various helper functions & utilities for tests.
#![allow(dead_code)]

use csgkit::{
    float_types::Real,
    mesh::{Mesh, polygon::Polygon, vertex::Vertex},
};
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Returns the approximate bounding box `[min_x, min_y, min_z, max_x, max_y, max_z]`
/// for a set of polygons.
pub fn bounding_box<S: Clone + Send + Sync + Debug>(polygons: &[Polygon<S>]) -> [Real; 6] {
    let mut min_x = Real::MAX;
    let mut min_y = Real::MAX;
    let mut min_z = Real::MAX;
    let mut max_x = Real::MIN;
    let mut max_y = Real::MIN;
    let mut max_z = Real::MIN;

    for poly in polygons {
        for v in &poly.vertices {
            let p = v.pos;
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            min_z = min_z.min(p.z);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
            max_z = max_z.max(p.z);
        }
    }

    [min_x, min_y, min_z, max_x, max_y, max_z]
}

/// Area of one polygon: half the magnitude of its Newell normal.
pub fn polygon_area<S: Clone + Send + Sync + Debug>(polygon: &Polygon<S>) -> Real {
    let verts = &polygon.vertices;
    let mut normal = Vector3::<Real>::zeros();
    for i in 0..verts.len() {
        let p0 = verts[i].pos;
        let p1 = verts[(i + 1) % verts.len()].pos;
        normal.x += (p0.y - p1.y) * (p0.z + p1.z);
        normal.y += (p0.z - p1.z) * (p0.x + p1.x);
        normal.z += (p0.x - p1.x) * (p0.y + p1.y);
    }
    normal.norm() * 0.5
}

/// Total surface area of a polygon set.
pub fn total_area<S: Clone + Send + Sync + Debug>(polygons: &[Polygon<S>]) -> Real {
    polygons.iter().map(polygon_area).sum()
}

/// Signed volume enclosed by a mesh: divergence-theorem sum over the
/// triangulated surface. Positive for outward-wound closed meshes.
pub fn signed_volume<S: Clone + Send + Sync + Debug>(mesh: &Mesh<S>) -> Real {
    let mut volume: Real = 0.0;
    for polygon in &mesh.polygons {
        for tri in polygon.triangulate() {
            let a = tri.vertices[0].pos.coords;
            let b = tri.vertices[1].pos.coords;
            let c = tri.vertices[2].pos.coords;
            volume += a.dot(&b.cross(&c));
        }
    }
    volume / 6.0
}

/// Helper to make a simple Polygon in 3D with given vertices.
/// The stored normal is arbitrary; `Polygon::new` re-computes the plane.
pub fn make_polygon_3d(points: &[[Real; 3]]) -> Polygon<()> {
    let verts: Vec<Vertex> = points
        .iter()
        .map(|p| Vertex::new(Point3::new(p[0], p[1], p[2]), Vector3::z()))
        .collect();
    Polygon::new(verts, None).expect("valid test polygon")
}

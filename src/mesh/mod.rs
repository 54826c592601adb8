//! `Mesh` struct, boolean volume operations and plane splitting/clipping.

use crate::float_types::parry3d::bounding_volume::{Aabb, BoundingVolume};
use crate::float_types::{EPSILON, Real};
use crate::mesh::bsp::{ClipMode, Node};
use crate::mesh::plane::{FRONT, Plane};
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::Vertex;
use crate::traits::{BooleanOps, TransformOps};
use hashbrown::HashMap;
use nalgebra::{Matrix4, Point3, Vector3, partial_max, partial_min};
use std::fmt::Debug;
use std::sync::OnceLock;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub mod bsp;
pub mod plane;
pub mod polygon;
pub mod shapes;
pub mod vertex;

/// An unordered collection of polygons bounding a solid, with a lazily
/// cached AABB. Polygons are independent; there is no interior indexing.
#[derive(Clone, Debug)]
pub struct Mesh<S: Clone + Send + Sync + Debug> {
    /// 3D polygons for volumetric shapes
    pub polygons: Vec<Polygon<S>>,

    /// Lazily calculated AABB that spans `polygons`.
    pub bounding_box: OnceLock<Aabb>,

    /// Metadata
    pub metadata: Option<S>,
}

impl<S: Clone + Send + Sync + Debug + PartialEq> Mesh<S> {
    /// Compare just the `metadata` fields of two meshes
    #[inline]
    pub fn same_metadata(&self, other: &Self) -> bool {
        self.metadata == other.metadata
    }

    /// Retain only polygons whose metadata matches `needle`
    #[inline]
    pub fn filter_polygons_by_metadata(&self, needle: &S) -> Mesh<S> {
        let polygons = self
            .polygons
            .iter()
            .filter(|&p| p.metadata.as_ref() == Some(needle))
            .cloned()
            .collect();

        Mesh {
            polygons,
            bounding_box: OnceLock::new(),
            metadata: self.metadata.clone(),
        }
    }

    /// Re-join polygon fragments left behind by splitting.
    ///
    /// Polygons are grouped by split id (zero-id polygons form their own
    /// group, where merging additionally demands matching material and
    /// plane) and greedily stitched along shared edges until no pair
    /// merges. The pass is idempotent; polygon order is not preserved.
    pub fn merge_polygons(&self) -> Mesh<S> {
        let mut by_id: HashMap<u32, Vec<Polygon<S>>> = HashMap::new();
        for polygon in &self.polygons {
            by_id.entry(polygon.id).or_default().push(polygon.clone());
        }

        let mut merged = Vec::with_capacity(self.polygons.len());
        for (_, mut group) in by_id {
            loop {
                let mut found = None;
                'scan: for i in 0..group.len() {
                    for j in (i + 1)..group.len() {
                        if let Some(candidate) = group[i].merge(&group[j]) {
                            found = Some((i, j, candidate));
                            break 'scan;
                        }
                    }
                }
                match found {
                    Some((i, j, candidate)) => {
                        group[i] = candidate;
                        group.swap_remove(j);
                    },
                    None => break,
                }
            }
            merged.append(&mut group);
        }

        Mesh {
            polygons: merged,
            bounding_box: OnceLock::new(),
            metadata: self.metadata.clone(),
        }
    }
}

impl<S: Clone + Send + Sync + Debug> Mesh<S> {
    /// Build a Mesh from an existing polygon list
    pub fn from_polygons(polygons: &[Polygon<S>], metadata: Option<S>) -> Self {
        let mut mesh = Mesh::new();
        mesh.polygons = polygons.to_vec();
        mesh.metadata = metadata;
        mesh
    }

    /// Helper to collect all vertices from the mesh.
    #[cfg(not(feature = "parallel"))]
    pub fn vertices(&self) -> Vec<Vertex> {
        self.polygons
            .iter()
            .flat_map(|p| p.vertices.clone())
            .collect()
    }

    /// Parallel helper to collect all vertices from the mesh.
    #[cfg(feature = "parallel")]
    pub fn vertices(&self) -> Vec<Vertex> {
        self.polygons
            .par_iter()
            .flat_map(|p| p.vertices.clone())
            .collect()
    }

    /// Build the two BSP trees of a boolean operation. The split ids the
    /// builds consume never leave the trees, so under the `parallel`
    /// feature each build runs with a private counter.
    #[cfg(feature = "parallel")]
    fn build_trees(
        a_polygons: &[Polygon<S>],
        b_polygons: &[Polygon<S>],
        _next_id: &mut u32,
    ) -> (Node<S>, Node<S>) {
        rayon::join(
            || {
                let mut id = 0;
                Node::from_polygons(a_polygons, &mut id)
            },
            || {
                let mut id = 0;
                Node::from_polygons(b_polygons, &mut id)
            },
        )
    }

    #[cfg(not(feature = "parallel"))]
    fn build_trees(
        a_polygons: &[Polygon<S>],
        b_polygons: &[Polygon<S>],
        next_id: &mut u32,
    ) -> (Node<S>, Node<S>) {
        (
            Node::from_polygons(a_polygons, next_id),
            Node::from_polygons(b_polygons, next_id),
        )
    }

    /// Return a new Mesh with this mesh's shape and `other`'s surface
    /// material painted onto the parts of the surface that lie inside
    /// `other`.
    ///
    /// Geometry comes entirely from `self`: fragments outside `other` are
    /// kept as-is, fragments inside (boundary included) take the material
    /// of `other`'s first polygon. When `other` carries no material each
    /// fragment keeps its own.
    pub fn stencil(&self, other: &Mesh<S>) -> Mesh<S> {
        let mut next_id = 0;
        let b = Node::from_polygons(&other.polygons, &mut next_id);

        let mut polygons =
            b.clip_polygons(&self.polygons, ClipMode::GreaterThan, &mut next_id);
        let inside = b.clip_polygons(&self.polygons, ClipMode::LessThanEqual, &mut next_id);

        let paint = other.polygons.first().and_then(|p| p.metadata.clone());
        polygons.extend(inside.into_iter().map(|mut p| {
            if let Some(ref material) = paint {
                p.metadata = Some(material.clone());
            }
            p
        }));

        Mesh {
            polygons,
            bounding_box: OnceLock::new(),
            metadata: self.metadata.clone(),
        }
    }

    /// Split the mesh along `plane` into its front and back halves.
    ///
    /// Polygons coplanar with `plane` go to the front half iff their
    /// normal agrees with the plane's. An empty side is `None`.
    pub fn split(&self, plane: &Plane) -> (Option<Mesh<S>>, Option<Mesh<S>>) {
        let mut next_id = 0;
        let mut coplanar = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();

        for polygon in &self.polygons {
            polygon.split(plane, &mut coplanar, &mut front, &mut back, &mut next_id);
        }
        for polygon in coplanar {
            if plane.orient_plane(&polygon.plane) == FRONT {
                front.push(polygon);
            } else {
                back.push(polygon);
            }
        }

        let wrap = |polygons: Vec<Polygon<S>>| {
            (!polygons.is_empty()).then(|| Mesh {
                polygons,
                bounding_box: OnceLock::new(),
                metadata: self.metadata.clone(),
            })
        };
        (wrap(front), wrap(back))
    }

    /// Keep only the front side of `plane`, optionally capping the cut
    /// cross-section with a polygon carrying the `fill` material.
    ///
    /// The cap starts as an oriented square spanning the clipped mesh's
    /// footprint on the plane, facing the clipped-away side, and is carved
    /// to the cut profile by keeping only its parts inside the original
    /// volume.
    pub fn clip(&self, plane: &Plane, fill: Option<S>) -> Mesh<S> {
        let mut next_id = 0;
        let mut coplanar = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();

        for polygon in &self.polygons {
            polygon.split(plane, &mut coplanar, &mut front, &mut back, &mut next_id);
        }
        for polygon in coplanar {
            if plane.orient_plane(&polygon.plane) == FRONT {
                front.push(polygon);
            }
        }

        let mut result = Mesh {
            polygons: front,
            bounding_box: OnceLock::new(),
            metadata: self.metadata.clone(),
        };

        let Some(fill) = fill else {
            return result;
        };
        if result.polygons.is_empty() {
            return result;
        }

        // conservative cap radius: the clipped bounds' corners projected
        // onto the plane
        let normal = plane.normal();
        let anchor = Point3::from(normal * plane.offset());
        let mut radius: Real = 0.0;
        for corner in result.bounding_box().vertices() {
            let offset = corner - anchor;
            let projected = offset - normal * offset.dot(&normal);
            radius = radius.max(projected.norm());
        }
        if radius < EPSILON {
            return result;
        }

        let (u, v) = orthonormal_basis(&normal);
        let cap_plane = plane.flipped();
        let cap_normal = cap_plane.normal();
        let ring = vec![
            Vertex::new(anchor + (u + v) * radius, cap_normal),
            Vertex::new(anchor + (u - v) * radius, cap_normal),
            Vertex::new(anchor - (u + v) * radius, cap_normal),
            Vertex::new(anchor + (v - u) * radius, cap_normal),
        ];
        let cap = Polygon::new_unchecked(ring, cap_plane, true, 0, Some(fill));

        let tree = Node::from_polygons(&self.polygons, &mut next_id);
        result
            .polygons
            .extend(tree.clip_polygons(&[cap], ClipMode::LessThan, &mut next_id));
        result
    }

    /// Union of any number of meshes.
    ///
    /// Bounds-intersecting meshes are folded into an accumulator with the
    /// binary operation; groups whose bounds never touch are concatenated
    /// without any CSG work.
    pub fn union_all(meshes: &[Mesh<S>]) -> Mesh<S> {
        Self::multimerge(meshes, |a, b| a.union(b))
    }

    /// Symmetric difference of any number of meshes; disjoint groups
    /// concatenate exactly as in [`Mesh::union_all`].
    pub fn xor_all(meshes: &[Mesh<S>]) -> Mesh<S> {
        Self::multimerge(meshes, |a, b| a.xor(b))
    }

    /// Left-associative difference: the first mesh minus all the others.
    /// Operands whose bounds never touch the accumulator are no-ops and
    /// are skipped.
    pub fn difference_all(meshes: &[Mesh<S>]) -> Mesh<S> {
        let Some((first, rest)) = meshes.split_first() else {
            return Mesh::new();
        };
        let mut acc = first.clone();
        for mesh in rest {
            if acc.bounding_box().intersects(&mesh.bounding_box()) {
                acc = acc.difference(mesh);
            }
        }
        acc
    }

    /// Left-associative intersection of all meshes. An operand whose
    /// bounds are disjoint from the accumulator empties the result
    /// immediately.
    pub fn intersection_all(meshes: &[Mesh<S>]) -> Mesh<S> {
        let Some((first, rest)) = meshes.split_first() else {
            return Mesh::new();
        };
        let mut acc = first.clone();
        for mesh in rest {
            if !acc.bounding_box().intersects(&mesh.bounding_box()) {
                return Mesh::new();
            }
            acc = acc.intersection(mesh);
        }
        acc
    }

    /// Left-associative stencil: paint the first mesh with each of the
    /// others in turn. Bounds-disjoint operands are no-ops.
    pub fn stencil_all(meshes: &[Mesh<S>]) -> Mesh<S> {
        let Some((first, rest)) = meshes.split_first() else {
            return Mesh::new();
        };
        let mut acc = first.clone();
        for mesh in rest {
            if acc.bounding_box().intersects(&mesh.bounding_box()) {
                acc = acc.stencil(mesh);
            }
        }
        acc
    }

    /// Fold bounds-intersecting meshes into an accumulator, rescanning as
    /// the accumulator's bounds grow; disjoint accumulators commit by
    /// plain concatenation. Requires `op` commutative and associative on
    /// disjoint operands.
    fn multimerge(meshes: &[Mesh<S>], op: impl Fn(&Mesh<S>, &Mesh<S>) -> Mesh<S>) -> Mesh<S> {
        let mut pending: Vec<Mesh<S>> = meshes.to_vec();
        let mut polygons = Vec::new();
        let mut index = 0;

        while index < pending.len() {
            let mut acc = pending[index].clone();
            loop {
                let mut folded = false;
                let mut j = index + 1;
                while j < pending.len() {
                    if acc.bounding_box().intersects(&pending[j].bounding_box()) {
                        let next = pending.remove(j);
                        acc = op(&acc, &next);
                        folded = true;
                    } else {
                        j += 1;
                    }
                }
                if !folded {
                    break;
                }
            }
            polygons.extend(acc.polygons);
            index += 1;
        }

        Mesh {
            polygons,
            bounding_box: OnceLock::new(),
            metadata: meshes.first().and_then(|m| m.metadata.clone()),
        }
    }
}

impl<S: Clone + Send + Sync + Debug> BooleanOps for Mesh<S> {
    type Output = Self;

    /// Return a new Mesh representing union of the two Meshes.
    ///
    /// ```text
    /// let c = a.union(b);
    ///     +-------+            +-------+
    ///     |       |            |       |
    ///     |   a   |            |   c   |
    ///     |    +--+----+   =   |       +----+
    ///     +----+--+    |       +----+       |
    ///          |   b   |            |   c   |
    ///          |       |            |       |
    ///          +-------+            +-------+
    /// ```
    fn union(&self, other: &Mesh<S>) -> Mesh<S> {
        let mut next_id = 0;
        let (a, b) = Self::build_trees(&self.polygons, &other.polygons, &mut next_id);

        // strict on one side, inclusive on the other, so a shared surface
        // is contributed by exactly one operand
        let mut polygons =
            b.clip_polygons(&self.polygons, ClipMode::GreaterThan, &mut next_id);
        polygons.extend(a.clip_polygons(
            &other.polygons,
            ClipMode::GreaterThanEqual,
            &mut next_id,
        ));

        Mesh {
            polygons,
            bounding_box: OnceLock::new(),
            metadata: self.metadata.clone(),
        }
    }

    /// Return a new Mesh representing difference of the two Meshes.
    ///
    /// ```text
    /// let c = a.difference(b);
    ///     +-------+            +-------+
    ///     |       |            |       |
    ///     |   a   |            |   c   |
    ///     |    +--+----+   =   |    +--+
    ///     +----+--+    |       +----+
    ///          |   b   |
    ///          |       |
    ///          +-------+
    /// ```
    fn difference(&self, other: &Mesh<S>) -> Mesh<S> {
        let mut next_id = 0;
        let (a, b) = Self::build_trees(&self.polygons, &other.polygons, &mut next_id);

        let mut polygons =
            b.clip_polygons(&self.polygons, ClipMode::GreaterThan, &mut next_id);
        // the parts of `other` inside `self` face the cavity inward
        let carved = a.clip_polygons(&other.polygons, ClipMode::LessThan, &mut next_id);
        polygons.extend(carved.into_iter().map(|mut p| {
            p.flip();
            p
        }));

        Mesh {
            polygons,
            bounding_box: OnceLock::new(),
            metadata: self.metadata.clone(),
        }
    }

    /// Return a new Mesh representing intersection of the two Meshes.
    ///
    /// ```text
    /// let c = a.intersection(b);
    ///     +-------+
    ///     |       |
    ///     |   a   |
    ///     |    +--+----+   =   +--+
    ///     +----+--+    |       +--+
    ///          |   b   |
    ///          |       |
    ///          +-------+
    /// ```
    fn intersection(&self, other: &Mesh<S>) -> Mesh<S> {
        let mut next_id = 0;
        let (a, b) = Self::build_trees(&self.polygons, &other.polygons, &mut next_id);

        let mut polygons = b.clip_polygons(&self.polygons, ClipMode::LessThan, &mut next_id);
        polygons.extend(a.clip_polygons(
            &other.polygons,
            ClipMode::LessThanEqual,
            &mut next_id,
        ));

        Mesh {
            polygons,
            bounding_box: OnceLock::new(),
            metadata: self.metadata.clone(),
        }
    }

    /// Return a new Mesh representing space in this Mesh excluding the
    /// space in the other Mesh plus the space in the other Mesh excluding
    /// the space in this Mesh.
    ///
    /// ```text
    /// let c = a.xor(b);
    ///     +-------+            +-------+
    ///     |       |            |       |
    ///     |   a   |            |   a   |
    ///     |    +--+----+   =   |    +--+----+
    ///     +----+--+    |       +----+--+    |
    ///          |   b   |            |       |
    ///          |       |            |       |
    ///          +-------+            +-------+
    /// ```
    fn xor(&self, other: &Mesh<S>) -> Mesh<S> {
        let mut next_id = 0;
        let (a, b) = Self::build_trees(&self.polygons, &other.polygons, &mut next_id);

        let a_outside = b.clip_polygons(&self.polygons, ClipMode::GreaterThan, &mut next_id);
        let a_inside = b.clip_polygons(&self.polygons, ClipMode::LessThan, &mut next_id);
        let b_outside = a.clip_polygons(&other.polygons, ClipMode::GreaterThan, &mut next_id);
        let b_inside = a.clip_polygons(&other.polygons, ClipMode::LessThan, &mut next_id);

        // reassembled as A_outside ∪ invert(B_inside) ∪ invert(A_inside) ∪ B_outside
        let mut polygons = a_outside;
        polygons.extend(b_inside.into_iter().map(|mut p| {
            p.flip();
            p
        }));
        polygons.extend(a_inside.into_iter().map(|mut p| {
            p.flip();
            p
        }));
        polygons.extend(b_outside);

        Mesh {
            polygons,
            bounding_box: OnceLock::new(),
            metadata: self.metadata.clone(),
        }
    }
}

impl<S: Clone + Send + Sync + Debug> TransformOps for Mesh<S> {
    /// Returns a new empty Mesh
    fn new() -> Self {
        Mesh {
            polygons: Vec::new(),
            bounding_box: OnceLock::new(),
            metadata: None,
        }
    }

    /// Apply an arbitrary 3D transform (as a 4x4 matrix) to the Mesh.
    ///
    /// Positions transform in homogeneous coordinates; normals use the
    /// inverse-transpose rule so they stay perpendicular to their
    /// surfaces. Cached planes are refit to the transformed rings.
    fn transform(&self, mat: &Matrix4<Real>) -> Mesh<S> {
        let mat_inv_transpose = match mat.try_inverse() {
            Some(inv) => inv.transpose(),
            None => {
                eprintln!(
                    "Warning: Transformation matrix is not invertible, using identity for normals"
                );
                Matrix4::identity()
            },
        };

        let mut mesh = self.clone();

        for poly in &mut mesh.polygons {
            for vert in &mut poly.vertices {
                let hom_pos = mat * vert.pos.to_homogeneous();
                match Point3::from_homogeneous(hom_pos) {
                    Some(transformed_pos) => vert.pos = transformed_pos,
                    None => {
                        eprintln!(
                            "Warning: Invalid homogeneous coordinates after transformation, skipping vertex"
                        );
                        continue;
                    },
                }

                vert.normal = mat_inv_transpose.transform_vector(&vert.normal).normalize();
            }

            if let Some(plane) = Plane::from_vertices(&poly.vertices) {
                poly.plane = plane;
            }
        }

        // invalidate the old cached bounding box
        mesh.bounding_box = OnceLock::new();

        mesh
    }

    /// Returns an [`Aabb`] indicating the 3D bounds of all `polygons`.
    fn bounding_box(&self) -> Aabb {
        *self.bounding_box.get_or_init(|| {
            // Track overall min/max in x, y, z among all 3D polygons
            let mut min_x = Real::MAX;
            let mut min_y = Real::MAX;
            let mut min_z = Real::MAX;
            let mut max_x = -Real::MAX;
            let mut max_y = -Real::MAX;
            let mut max_z = -Real::MAX;

            for poly in &self.polygons {
                for v in &poly.vertices {
                    min_x = *partial_min(&min_x, &v.pos.x).unwrap();
                    min_y = *partial_min(&min_y, &v.pos.y).unwrap();
                    min_z = *partial_min(&min_z, &v.pos.z).unwrap();

                    max_x = *partial_max(&max_x, &v.pos.x).unwrap();
                    max_y = *partial_max(&max_y, &v.pos.y).unwrap();
                    max_z = *partial_max(&max_z, &v.pos.z).unwrap();
                }
            }

            // If still uninitialized (e.g., no polygons), return a trivial AABB at origin
            if min_x > max_x {
                return Aabb::new(Point3::origin(), Point3::origin());
            }

            let mins = Point3::new(min_x, min_y, min_z);
            let maxs = Point3::new(max_x, max_y, max_z);
            Aabb::new(mins, maxs)
        })
    }

    /// Invert this Mesh (flip inside vs. outside)
    fn inverse(&self) -> Mesh<S> {
        let mut mesh = self.clone();
        for polygon in &mut mesh.polygons {
            polygon.flip();
        }
        mesh
    }
}

/// Right-handed orthonormal frame `(u, v)` on the plane with normal `n`,
/// satisfying `u × v = n`.
fn orthonormal_basis(n: &Vector3<Real>) -> (Vector3<Real>, Vector3<Real>) {
    let helper = if n.x.abs() > 0.9 {
        Vector3::y()
    } else {
        Vector3::x()
    };
    let u = n.cross(&helper).normalize();
    let v = n.cross(&u);
    (u, v)
}

//! `Polygon` struct and operations: classification, splitting, ear-clipping
//! triangulation, convex tessellation, merging and point containment.

use crate::errors::ValidationError;
use crate::float_types::{EPSILON, Real};
use crate::mesh::plane::{BACK, COPLANAR, FRONT, Plane, SPANNING};
use crate::mesh::vertex::Vertex;
use nalgebra::{Point3, Vector3};

/// A planar, possibly non-convex polygon in 3D space.
///
/// Vertices wind anticlockwise as seen from the front side of `plane`.
#[derive(Debug, Clone)]
pub struct Polygon<S: Clone> {
    /// Ordered vertex ring.
    pub vertices: Vec<Vertex>,

    /// The plane on which every vertex lies (within tolerance).
    pub plane: Plane,

    /// Cached convexity flag.
    pub convex: bool,

    /// Split tag: fragments cut from one source polygon share a nonzero id,
    /// letting [`Polygon::merge`] recognise sibling pieces later. Zero means
    /// "never split".
    pub id: u32,

    /// Generic metadata (material token)
    pub metadata: Option<S>,
}

impl<S: Clone + Send + Sync> Polygon<S> {
    /// Validating constructor. Checks vertex count, degeneracy (adjacent
    /// coincident vertices, vanishing area) and coplanarity, then derives
    /// the plane and convexity from the ring.
    pub fn try_new(vertices: Vec<Vertex>, metadata: Option<S>) -> Result<Self, ValidationError> {
        if vertices.len() < 3 {
            return Err(ValidationError::TooFewVertices(vertices.len()));
        }

        for i in 0..vertices.len() {
            let j = (i + 1) % vertices.len();
            if (vertices[i].pos - vertices[j].pos).norm() < EPSILON {
                return Err(ValidationError::RepeatedPoint(vertices[i].pos));
            }
        }

        let plane = Plane::from_vertices(&vertices).ok_or(ValidationError::Degenerate)?;

        if ring_area(&vertices) < EPSILON {
            return Err(ValidationError::Degenerate);
        }

        if vertices
            .iter()
            .any(|v| plane.orient_point(&v.pos) != COPLANAR)
        {
            return Err(ValidationError::NonPlanar);
        }

        let convex = vertices_are_convex(&vertices, &plane.normal());

        Ok(Polygon {
            vertices,
            plane,
            convex,
            id: 0,
            metadata,
        })
    }

    /// Like [`Polygon::try_new`] but collapsing the failure reason.
    pub fn new(vertices: Vec<Vertex>, metadata: Option<S>) -> Option<Self> {
        Self::try_new(vertices, metadata).ok()
    }

    /// Constructor for the split/merge paths, which produce rings whose
    /// plane, convexity and id are already known.
    pub(crate) fn new_unchecked(
        vertices: Vec<Vertex>,
        plane: Plane,
        convex: bool,
        id: u32,
        metadata: Option<S>,
    ) -> Self {
        debug_assert!(vertices.len() >= 3, "degenerate polygon");
        Polygon {
            vertices,
            plane,
            convex,
            id,
            metadata,
        }
    }

    /// Reverse the winding and flip all normals, turning the polygon
    /// inside-out. Material, convexity and id are preserved.
    pub fn flip(&mut self) {
        self.vertices.reverse();
        for vertex in &mut self.vertices {
            vertex.flip();
        }
        self.plane.flip();
    }

    /// A copy of this polygon facing the other way.
    pub fn flipped(&self) -> Self {
        let mut polygon = self.clone();
        polygon.flip();
        polygon
    }

    /// Split this polygon along `plane`, appending the pieces to the
    /// caller-provided buckets.
    ///
    /// Non-spanning polygons are placed whole: coplanar ones into
    /// `coplanar` (the caller routes them by normal agreement), the rest
    /// into `front` or `back`. A spanning polygon is cut along the plane;
    /// both halves inherit plane, material and a shared nonzero id drawn
    /// from `next_id`. Spanning non-convex polygons are tessellated into
    /// convex pieces first.
    pub fn split(
        &self,
        plane: &Plane,
        coplanar: &mut Vec<Polygon<S>>,
        front: &mut Vec<Polygon<S>>,
        back: &mut Vec<Polygon<S>>,
        next_id: &mut u32,
    ) {
        match plane.classify_polygon(self) {
            COPLANAR => coplanar.push(self.clone()),
            FRONT => front.push(self.clone()),
            BACK => back.push(self.clone()),
            _ => {
                if !self.convex {
                    let mut source = self.clone();
                    if source.id == 0 {
                        *next_id += 1;
                        source.id = *next_id;
                    }
                    for piece in source.tessellate() {
                        piece.split(plane, coplanar, front, back, next_id);
                    }
                    return;
                }

                let id = if self.id == 0 {
                    *next_id += 1;
                    *next_id
                } else {
                    self.id
                };

                let types: Vec<i8> = self
                    .vertices
                    .iter()
                    .map(|v| plane.orient_point(&v.pos))
                    .collect();

                let count = self.vertices.len();
                let mut f = Vec::with_capacity(count + 1);
                let mut b = Vec::with_capacity(count + 1);

                for i in 0..count {
                    let j = (i + 1) % count;
                    let ti = types[i];
                    let tj = types[j];
                    let vi = &self.vertices[i];
                    let vj = &self.vertices[j];

                    if ti != BACK {
                        f.push(*vi);
                    }
                    if ti != FRONT {
                        b.push(*vi);
                    }

                    // the edge straddles the plane: lerp a crossing vertex
                    if (ti | tj) == SPANNING {
                        let denom = plane.normal().dot(&(vj.pos - vi.pos));
                        if denom.abs() > EPSILON {
                            let t =
                                (plane.offset() - plane.normal().dot(&vi.pos.coords)) / denom;
                            let crossing = vi.interpolate(vj, t);
                            f.push(crossing);
                            b.push(crossing);
                        }
                    }
                }

                if let Some(polygon) = Self::fragment(f, &self.plane, id, &self.metadata) {
                    front.push(polygon);
                }
                if let Some(polygon) = Self::fragment(b, &self.plane, id, &self.metadata) {
                    back.push(polygon);
                }
            },
        }
    }

    /// Build a split fragment, dropping slivers that collapsed below
    /// tolerance. Halves of a convex polygon are convex.
    fn fragment(
        mut vertices: Vec<Vertex>,
        plane: &Plane,
        id: u32,
        metadata: &Option<S>,
    ) -> Option<Self> {
        vertices.dedup_by(|a, b| (a.pos - b.pos).norm() < EPSILON);
        while vertices.len() > 1
            && (vertices[0].pos - vertices[vertices.len() - 1].pos).norm() < EPSILON
        {
            vertices.pop();
        }

        if vertices.len() < 3 || ring_area(&vertices) < EPSILON {
            return None;
        }

        Some(Self::new_unchecked(
            vertices,
            plane.clone(),
            true,
            id,
            metadata.clone(),
        ))
    }

    /// Triangulate by ear clipping. Handles concave rings; colinear corner
    /// vertices that sit between their neighbours are removed as redundant.
    ///
    /// Best-effort: if two full revolutions pass without clipping an ear
    /// (pathological input), the triangles collected so far are returned.
    pub fn triangulate(&self) -> Vec<Polygon<S>> {
        let normal = self.plane.normal();
        let mut ring: Vec<Vertex> = self.vertices.clone();
        let mut triangles = Vec::with_capacity(ring.len().saturating_sub(2));
        let mut i = 0usize;
        let mut stalled = 0usize;

        while ring.len() > 3 {
            if stalled >= ring.len() * 2 {
                return triangles;
            }

            let n = ring.len();
            let a = ring[i % n];
            let b = ring[(i + 1) % n];
            let c = ring[(i + 2) % n];

            let cross = (b.pos - a.pos).cross(&(c.pos - b.pos));
            if cross.norm() < EPSILON {
                // colinear corner: `b` is redundant when it lies between its neighbours
                if (b.pos - a.pos).dot(&(c.pos - b.pos)) > 0.0 {
                    ring.remove((i + 1) % n);
                    stalled = 0;
                } else {
                    i = (i + 1) % n;
                    stalled += 1;
                }
                continue;
            }

            // reflex corner: the candidate bulges away from the polygon front
            if cross.dot(&normal) <= 0.0 {
                i = (i + 1) % n;
                stalled += 1;
                continue;
            }

            // an ear may not contain any other vertex
            let i0 = i % n;
            let i1 = (i + 1) % n;
            let i2 = (i + 2) % n;
            let blocked = (0..n)
                .filter(|&k| k != i0 && k != i1 && k != i2)
                .any(|k| point_in_triangle(&ring[k].pos, &a.pos, &b.pos, &c.pos, &normal));
            if blocked {
                i = (i + 1) % n;
                stalled += 1;
                continue;
            }

            triangles.push(Self::new_unchecked(
                vec![a, b, c],
                self.plane.clone(),
                true,
                self.id,
                self.metadata.clone(),
            ));
            ring.remove(i1);
            stalled = 0;
        }

        if ring_area(&ring) > EPSILON {
            triangles.push(Self::new_unchecked(
                ring,
                self.plane.clone(),
                true,
                self.id,
                self.metadata.clone(),
            ));
        }
        triangles
    }

    /// Decompose into convex pieces: triangulate, then greedily rejoin
    /// adjacent triangles whenever their union is convex. Convex polygons
    /// are returned as-is.
    pub fn tessellate(&self) -> Vec<Polygon<S>> {
        if self.convex {
            return vec![self.clone()];
        }

        let mut pieces = self.triangulate();
        loop {
            let mut found = None;
            'scan: for i in 0..pieces.len() {
                for j in (i + 1)..pieces.len() {
                    if let Some(candidate) = pieces[i].join(&pieces[j]) {
                        if candidate.convex {
                            found = Some((i, j, candidate));
                            break 'scan;
                        }
                    }
                }
            }
            match found {
                Some((i, j, candidate)) => {
                    pieces[i] = candidate;
                    pieces.swap_remove(j);
                },
                None => break,
            }
        }
        pieces
    }

    /// Stitch two polygons along a shared edge.
    ///
    /// Requires exactly two shared vertices (position, normal and texture
    /// coordinate within tolerance) forming an edge traversed in opposite
    /// directions. A join vertex whose adjacent edges become colinear is
    /// dropped. Returns `None` when the shared-edge structure is wrong or
    /// the spliced ring degenerates.
    pub fn join(&self, other: &Polygon<S>) -> Option<Polygon<S>> {
        let n = self.vertices.len();
        let m = other.vertices.len();

        let shared = self
            .vertices
            .iter()
            .filter(|a| other.vertices.iter().any(|b| a.is_near(b)))
            .count();
        if shared != 2 {
            return None;
        }

        for i in 0..n {
            let i2 = (i + 1) % n;
            for j in 0..m {
                let j2 = (j + 1) % m;
                // the shared edge runs a→b in self and b→a in other
                if !(self.vertices[i2].is_near(&other.vertices[j])
                    && self.vertices[i].is_near(&other.vertices[j2]))
                {
                    continue;
                }

                // all of self starting after the shared edge, then other's
                // run strictly between the shared pair, winding preserved
                let mut ring = Vec::with_capacity(n + m - 2);
                let mut k = i2;
                loop {
                    ring.push(self.vertices[k]);
                    if k == i {
                        break;
                    }
                    k = (k + 1) % n;
                }
                let mut k = (j2 + 1) % m;
                while k != j {
                    ring.push(other.vertices[k]);
                    k = (k + 1) % m;
                }

                // join vertices sit at ring[n-1] (= self[i]) and ring[0] (= self[i2])
                if colinear_at(&ring, n - 1) {
                    ring.remove(n - 1);
                }
                if colinear_at(&ring, 0) {
                    ring.remove(0);
                }

                if ring.len() < 3 || ring_area(&ring) < EPSILON {
                    return None;
                }

                let convex = vertices_are_convex(&ring, &self.plane.normal());
                return Some(Self::new_unchecked(
                    ring,
                    self.plane.clone(),
                    convex,
                    self.id,
                    self.metadata.clone(),
                ));
            }
        }
        None
    }

    /// Whether `point` lies on the polygon (boundary included).
    ///
    /// Off-plane points are rejected; on-plane points are projected onto
    /// the axis-aligned plane nearest the polygon normal and tested with
    /// the crossing-number rule.
    pub fn contains_point(&self, point: &Point3<Real>) -> bool {
        if self.plane.orient_point(point) != COPLANAR {
            return false;
        }

        let flattening = FlatteningPlane::from_normal(&self.plane.normal());
        let (px, py) = flattening.project(point);

        let mut inside = false;
        let mut j = self.vertices.len() - 1;
        for i in 0..self.vertices.len() {
            let (xi, yi) = flattening.project(&self.vertices[i].pos);
            let (xj, yj) = flattening.project(&self.vertices[j].pos);
            if ((yi > py) != (yj > py)) && (px < (xj - xi) * (py - yi) / (yj - yi) + xi) {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// For each directed edge, the plane containing the edge whose normal
    /// (`edge × polygon.normal`, normalized) points away from the interior.
    /// A point lies inside a convex polygon iff it is in the back
    /// half-space of every edge plane.
    pub fn edge_planes(&self) -> Vec<Plane> {
        let normal = self.plane.normal();
        let count = self.vertices.len();
        (0..count)
            .map(|i| {
                let p0 = self.vertices[i].pos;
                let p1 = self.vertices[(i + 1) % count].pos;
                let edge_normal = (p1 - p0).cross(&normal).normalize();
                Plane::from_normal(edge_normal, edge_normal.dot(&p0.coords))
            })
            .collect()
    }

    /// Clip `polygon` against this convex polygon's edge planes, splitting
    /// off `outside` fragments edge by edge. Whatever survives every edge
    /// is wholly inside and lands in `inside`. A non-convex clippee is
    /// tessellated first.
    pub fn clip(
        &self,
        polygon: &Polygon<S>,
        inside: &mut Vec<Polygon<S>>,
        outside: &mut Vec<Polygon<S>>,
        next_id: &mut u32,
    ) {
        debug_assert!(self.convex, "clip requires a convex clipper");

        let mut working = if polygon.convex {
            vec![polygon.clone()]
        } else {
            polygon.tessellate()
        };

        for edge_plane in self.edge_planes() {
            let mut coplanar = Vec::new();
            let mut front = Vec::new();
            let mut back = Vec::new();
            for piece in &working {
                piece.split(&edge_plane, &mut coplanar, &mut front, &mut back, next_id);
            }
            // fragments on an edge plane carry no interior area; treat as outside
            outside.append(&mut coplanar);
            outside.append(&mut front);
            if back.is_empty() {
                return;
            }
            working = back;
        }

        inside.append(&mut working);
    }

    /// Thread this polygon through a sequence of convex clippers, the
    /// `outside` fragments of each stage forming the working set of the
    /// next. Non-convex clippers are tessellated into convex pieces.
    pub fn clip_to(
        &self,
        clippers: &[Polygon<S>],
        inside: &mut Vec<Polygon<S>>,
        outside: &mut Vec<Polygon<S>>,
        next_id: &mut u32,
    ) {
        let mut working = vec![self.clone()];

        for clipper in clippers {
            let pieces = if clipper.convex {
                vec![clipper.clone()]
            } else {
                clipper.tessellate()
            };
            for piece in &pieces {
                let mut remaining = Vec::new();
                for polygon in &working {
                    piece.clip(polygon, inside, &mut remaining, next_id);
                }
                working = remaining;
                if working.is_empty() {
                    return;
                }
            }
        }

        outside.append(&mut working);
    }
}

impl<S: Clone + Send + Sync + PartialEq> Polygon<S> {
    /// Merge with another polygon along a shared edge.
    ///
    /// Permitted only when both polygons carry the equal nonzero id of
    /// siblings from a prior split, or when neither was ever split
    /// (`id == 0` on both) and they agree on material and plane. Delegates
    /// the stitching to [`Polygon::join`].
    pub fn merge(&self, other: &Polygon<S>) -> Option<Polygon<S>> {
        let compatible = if self.id == 0 && other.id == 0 {
            self.metadata == other.metadata && self.plane.is_coplanar_with(&other.plane)
        } else {
            self.id == other.id
        };
        if !compatible {
            return None;
        }
        self.join(other)
    }
}

/// Axis-aligned plane used to project a polygon to 2D for point queries:
/// the one whose normal is closest to the polygon normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlatteningPlane {
    Xy,
    Xz,
    Yz,
}

impl FlatteningPlane {
    fn from_normal(normal: &Vector3<Real>) -> Self {
        let (ax, ay, az) = (normal.x.abs(), normal.y.abs(), normal.z.abs());
        if az >= ax && az >= ay {
            FlatteningPlane::Xy
        } else if ay >= ax {
            FlatteningPlane::Xz
        } else {
            FlatteningPlane::Yz
        }
    }

    fn project(&self, point: &Point3<Real>) -> (Real, Real) {
        match self {
            FlatteningPlane::Xy => (point.x, point.y),
            FlatteningPlane::Xz => (point.x, point.z),
            FlatteningPlane::Yz => (point.y, point.z),
        }
    }
}

/// Area enclosed by a vertex ring (half the Newell normal magnitude).
fn ring_area(vertices: &[Vertex]) -> Real {
    let mut normal = Vector3::<Real>::zeros();
    for i in 0..vertices.len() {
        let p0 = vertices[i].pos;
        let p1 = vertices[(i + 1) % vertices.len()].pos;
        normal.x += (p0.y - p1.y) * (p0.z + p1.z);
        normal.y += (p0.z - p1.z) * (p0.x + p1.x);
        normal.z += (p0.x - p1.x) * (p0.y + p1.y);
    }
    normal.norm() * 0.5
}

/// Every corner must turn the same way as the plane normal (colinear
/// corners are tolerated).
fn vertices_are_convex(vertices: &[Vertex], normal: &Vector3<Real>) -> bool {
    let count = vertices.len();
    for i in 0..count {
        let p0 = vertices[i].pos;
        let p1 = vertices[(i + 1) % count].pos;
        let p2 = vertices[(i + 2) % count].pos;
        let cross = (p1 - p0).cross(&(p2 - p1));
        if cross.dot(normal) < -EPSILON {
            return false;
        }
    }
    true
}

/// Strict interior test against the triangle `(a, b, c)` wound around `normal`.
fn point_in_triangle(
    p: &Point3<Real>,
    a: &Point3<Real>,
    b: &Point3<Real>,
    c: &Point3<Real>,
    normal: &Vector3<Real>,
) -> bool {
    (b - a).cross(&(p - a)).dot(normal) > EPSILON
        && (c - b).cross(&(p - b)).dot(normal) > EPSILON
        && (a - c).cross(&(p - c)).dot(normal) > EPSILON
}

/// Whether the two edges meeting at `ring[idx]` are colinear (unit-dot
/// within tolerance of 1).
fn colinear_at(ring: &[Vertex], idx: usize) -> bool {
    let len = ring.len();
    let prev = ring[(idx + len - 1) % len].pos;
    let here = ring[idx].pos;
    let next = ring[(idx + 1) % len].pos;
    let e0 = here - prev;
    let e1 = next - here;
    if e0.norm() < EPSILON || e1.norm() < EPSILON {
        return true;
    }
    e0.normalize().dot(&e1.normalize()) > 1.0 - EPSILON
}

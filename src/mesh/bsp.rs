//! [BSP](https://en.wikipedia.org/wiki/Binary_space_partitioning) tree over
//! polygons, used to classify and clip polygon sets against the volume
//! enclosed by a polygon soup.

use crate::float_types::Real;
use crate::mesh::plane::{BACK, COPLANAR, FRONT, Plane};
use crate::mesh::polygon::Polygon;
use std::fmt::Debug;

/// Which side of the volume [`Node::clip_polygons`] keeps, and whether
/// fragments lying exactly on the boundary are included.
///
/// The strict/inclusive pairing matters: a boolean operation clips one
/// operand strictly and the other inclusively so that a shared boundary
/// surface is contributed by exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipMode {
    /// Keep fragments strictly outside the volume.
    GreaterThan,
    /// Keep fragments outside the volume or on its boundary.
    GreaterThanEqual,
    /// Keep fragments strictly inside the volume.
    LessThan,
    /// Keep fragments inside the volume or on its boundary.
    LessThanEqual,
}

impl ClipMode {
    /// Whether fragments that end up outside the volume survive the clip.
    const fn keeps_outside(self) -> bool {
        matches!(self, ClipMode::GreaterThan | ClipMode::GreaterThanEqual)
    }

    /// Route a boundary fragment to the front (`true`) or back (`false`)
    /// subtree. `facing` is whether the fragment's normal agrees with the
    /// node plane. Front subtrees drain toward the "outside" leaf rule and
    /// back subtrees toward "inside", so this choice decides boundary
    /// inclusion per mode.
    ///
    /// A fragment facing the same way as the boundary is ON the surface:
    /// the inclusive outside mode and the strict inside mode push it
    /// frontward, their counterparts backward. An anti-facing fragment
    /// bounds the solid from within and always counts as interior.
    const fn routes_front(self, facing: bool) -> bool {
        facing && matches!(self, ClipMode::GreaterThanEqual | ClipMode::LessThan)
    }
}

/// A BSP tree node: a splitting plane, front/back subtrees and the
/// polygons coplanar with the node plane.
///
/// The tree encodes the interior of the solid defined by the input soup as
/// "behind every plane" along a path; a missing front child means open
/// space, a missing back child solid interior.
#[derive(Debug, Clone)]
pub struct Node<S: Clone> {
    /// Splitting plane for this node *or* **None** for an empty tree.
    pub plane: Option<Plane>,

    /// Subtree in front of `plane`.
    pub front: Option<Box<Node<S>>>,

    /// Subtree behind `plane`.
    pub back: Option<Box<Node<S>>>,

    /// Polygons lying on `plane` (either orientation), attached as the
    /// node is built.
    pub polygons: Vec<Polygon<S>>,
}

impl<S: Clone + Send + Sync + Debug> Node<S> {
    /// Create a new empty BSP node
    pub const fn new() -> Self {
        Node {
            plane: None,
            front: None,
            back: None,
            polygons: Vec::new(),
        }
    }

    /// Build a BSP tree from polygons. Splits performed during
    /// construction draw ids from `next_id`.
    pub fn from_polygons(polygons: &[Polygon<S>], next_id: &mut u32) -> Self {
        let mut node = Self::new();
        if !polygons.is_empty() {
            node.build(polygons, next_id);
        }
        node
    }

    /// Choose a splitting plane for `polygons`, scoring a sample of
    /// candidate face planes by spanning count and front/back balance.
    /// Any plane drawn from the soup preserves the volume encoding; this
    /// merely keeps the tree shallow.
    pub fn pick_splitting_plane(polygons: &[Polygon<S>]) -> Plane {
        const K_SPANS: Real = 8.0; // weight for spanning polygons
        const K_BALANCE: Real = 1.0; // weight for front/back balance

        let mut best_plane = polygons[0].plane.clone();
        let mut best_score = Real::MAX;

        let sample_size = polygons.len().min(20);
        for candidate in polygons.iter().take(sample_size) {
            let plane = &candidate.plane;
            let mut num_front = 0i32;
            let mut num_back = 0i32;
            let mut num_spanning = 0i32;

            for polygon in polygons {
                match plane.classify_polygon(polygon) {
                    COPLANAR => {}, // not counted for balance
                    FRONT => num_front += 1,
                    BACK => num_back += 1,
                    _ => num_spanning += 1,
                }
            }

            let score = K_SPANS * num_spanning as Real
                + K_BALANCE * ((num_front - num_back) as Real).abs();

            if score < best_score {
                best_score = score;
                best_plane = plane.clone();
            }
        }
        best_plane
    }

    /// Build the tree from `polygons` using an explicit work stack rather
    /// than recursion, so deep trees cannot exhaust the call stack.
    pub fn build(&mut self, polygons: &[Polygon<S>], next_id: &mut u32) {
        if polygons.is_empty() {
            return;
        }

        let mut stack: Vec<(&mut Node<S>, Vec<Polygon<S>>)> = vec![(self, polygons.to_vec())];

        while let Some((node, polys)) = stack.pop() {
            if polys.is_empty() {
                continue;
            }

            if node.plane.is_none() {
                node.plane = Some(Self::pick_splitting_plane(&polys));
            }
            let plane = node.plane.clone().expect("plane just set");

            let mut front = Vec::with_capacity(polys.len() / 2);
            let mut back = Vec::with_capacity(polys.len() / 2);

            for polygon in &polys {
                polygon.split(&plane, &mut node.polygons, &mut front, &mut back, next_id);
            }

            if !front.is_empty() {
                let front_node: &mut Node<S> =
                    node.front.get_or_insert_with(|| Box::new(Node::new()));
                stack.push((front_node, front));
            }

            if !back.is_empty() {
                let back_node: &mut Node<S> =
                    node.back.get_or_insert_with(|| Box::new(Node::new()));
                stack.push((back_node, back));
            }
        }
    }

    /// Return the parts of `polygons` that satisfy `mode` against the
    /// volume encoded by this tree.
    ///
    /// Each polygon is split down the tree; fragments reaching a missing
    /// front child are outside the volume, fragments reaching a missing
    /// back child inside. Boundary fragments route per
    /// [`ClipMode::routes_front`], which is what distinguishes the strict
    /// modes from the inclusive ones.
    pub fn clip_polygons(
        &self,
        polygons: &[Polygon<S>],
        mode: ClipMode,
        next_id: &mut u32,
    ) -> Vec<Polygon<S>> {
        let mut result = Vec::new();
        let mut stack: Vec<(&Node<S>, Vec<Polygon<S>>)> = vec![(self, polygons.to_vec())];

        while let Some((node, polys)) = stack.pop() {
            let Some(plane) = node.plane.as_ref() else {
                // tree built from no polygons encloses nothing: every
                // fragment is outside
                if mode.keeps_outside() {
                    result.extend(polys);
                }
                continue;
            };

            let mut coplanar = Vec::new();
            let mut front = Vec::new();
            let mut back = Vec::new();

            for polygon in &polys {
                polygon.split(plane, &mut coplanar, &mut front, &mut back, next_id);
            }

            for polygon in coplanar {
                let facing = plane.orient_plane(&polygon.plane) == FRONT;
                if mode.routes_front(facing) {
                    front.push(polygon);
                } else {
                    back.push(polygon);
                }
            }

            match &node.front {
                Some(child) => {
                    if !front.is_empty() {
                        stack.push((&**child, front));
                    }
                },
                None => {
                    if mode.keeps_outside() {
                        result.extend(front);
                    }
                },
            }

            match &node.back {
                Some(child) => {
                    if !back.is_empty() {
                        stack.push((&**child, back));
                    }
                },
                None => {
                    if !mode.keeps_outside() {
                        result.extend(back);
                    }
                },
            }
        }

        result
    }
}

impl<S: Clone + Send + Sync + Debug> Default for Node<S> {
    fn default() -> Self {
        Self::new()
    }
}

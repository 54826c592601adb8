use csgkit::{
    float_types::EPSILON,
    mesh::Mesh,
    traits::{BooleanOps, TransformOps},
};

mod support;

use crate::support::{approx_eq, bounding_box, signed_volume, total_area};

#[test]
fn union() {
    let cube1: Mesh<()> = Mesh::cube(2.0, None).translate(-1.0, -1.0, -1.0); // from -1 to +1 in all coords
    let cube2: Mesh<()> = Mesh::cube(1.0, None).translate(0.5, 0.5, 0.5);

    let union_csg = cube1.union(&cube2);
    assert!(
        !union_csg.polygons.is_empty(),
        "Union of two cubes should produce polygons"
    );

    // Check bounding box => should now at least range from -1 to (0.5+1) = 1.5
    let bb = bounding_box(&union_csg.polygons);
    assert!(approx_eq(bb[0], -1.0, 1e-8));
    assert!(approx_eq(bb[1], -1.0, 1e-8));
    assert!(approx_eq(bb[2], -1.0, 1e-8));
    assert!(approx_eq(bb[3], 1.5, 1e-8));
    assert!(approx_eq(bb[4], 1.5, 1e-8));
    assert!(approx_eq(bb[5], 1.5, 1e-8));

    // 8 + 1 minus the shared corner [0.5,1]³
    assert!(approx_eq(signed_volume(&union_csg), 8.875, 1e-6));
}

#[test]
fn union_is_commutative_up_to_permutation() {
    let a: Mesh<()> = Mesh::cube(2.0, None).translate(-1.0, -1.0, -1.0);
    let b: Mesh<()> = Mesh::cube(1.0, None).translate(0.5, 0.5, 0.5);

    let ab = a.union(&b);
    let ba = b.union(&a);
    assert!(approx_eq(signed_volume(&ab), signed_volume(&ba), 1e-6));

    let bb_ab = bounding_box(&ab.polygons);
    let bb_ba = bounding_box(&ba.polygons);
    for i in 0..6 {
        assert!(approx_eq(bb_ab[i], bb_ba[i], 1e-8));
    }
}

#[test]
fn union_with_self_is_identity() {
    let cube: Mesh<()> = Mesh::cube(2.0, None);
    let same = cube.union(&cube);
    // the shared surface is contributed by exactly one operand
    assert_eq!(same.polygons.len(), 6);
    assert!(approx_eq(signed_volume(&same), 8.0, 1e-9));
}

#[test]
fn difference_with_self_has_no_volume() {
    let cube: Mesh<()> = Mesh::cube(2.0, None);
    let nothing = cube.difference(&cube);
    assert!(approx_eq(signed_volume(&nothing), 0.0, 1e-9));
}

#[test]
fn difference_with_empty_is_identity() {
    let cube: Mesh<()> = Mesh::cube(2.0, None);
    let empty: Mesh<()> = Mesh::new();
    let same = cube.difference(&empty);
    assert_eq!(same.polygons.len(), 6);
    assert!(approx_eq(signed_volume(&same), 8.0, 1e-9));
}

#[test]
fn difference() {
    // Subtract a smaller cube from a bigger one
    let big_cube: Mesh<()> = Mesh::cube(4.0, None).translate(-2.0, -2.0, -2.0); // spans [-2,2]
    let small_cube: Mesh<()> = Mesh::cube(2.0, None).translate(-1.0, -1.0, -1.0); // spans [-1,1]

    let result = big_cube.difference(&small_cube);
    assert!(
        !result.polygons.is_empty(),
        "Subtracting a smaller cube should leave polygons"
    );

    let bb = bounding_box(&result.polygons);
    assert!(approx_eq(bb[0], -2.0, 1e-8));
    assert!(approx_eq(bb[3], 2.0, 1e-8));

    // the cavity is carved out of the interior
    assert!(approx_eq(signed_volume(&result), 64.0 - 8.0, 1e-6));
}

#[test]
fn cube_minus_inner_sphere() {
    // cube [-1,1]³ minus a fully interior sphere of radius 0.9
    let cube: Mesh<()> = Mesh::cube(2.0, None).translate(-1.0, -1.0, -1.0);
    let sphere: Mesh<()> = Mesh::sphere(0.9, 16, 8, None);

    let result = cube.difference(&sphere);
    assert!(!result.polygons.is_empty());

    // bounding box is still the cube's
    let bb = bounding_box(&result.polygons);
    assert!(approx_eq(bb[0], -1.0, 1e-8) && approx_eq(bb[3], 1.0, 1e-8));
    assert!(approx_eq(bb[1], -1.0, 1e-8) && approx_eq(bb[4], 1.0, 1e-8));
    assert!(approx_eq(bb[2], -1.0, 1e-8) && approx_eq(bb[5], 1.0, 1e-8));

    // every vertex sits on a cube face or on the carved cavity surface
    for v in result.vertices() {
        let p = v.pos;
        let max_coord = p.x.abs().max(p.y.abs()).max(p.z.abs());
        let on_cube_face = approx_eq(max_coord, 1.0, 1e-6);
        let on_cavity = p.coords.norm() >= 0.9 - 1e-6;
        assert!(
            on_cube_face || on_cavity,
            "vertex {p} belongs to neither surface"
        );
    }

    // 8 minus the faceted sphere's volume (a bit under the ball's 3.054)
    let volume = signed_volume(&result);
    assert!(volume > 4.9 && volume < 5.31, "got {volume}");
}

#[test]
fn intersect_with_self_preserves_shape() {
    let cube: Mesh<()> = Mesh::cube(2.0, None);
    let same = cube.intersection(&cube);

    let bb_same = bounding_box(&same.polygons);
    let bb_cube = bounding_box(&cube.polygons);
    for i in 0..6 {
        assert!(approx_eq(bb_same[i], bb_cube[i], 1e-8));
    }
    assert!(approx_eq(signed_volume(&same), 8.0, 1e-9));
}

#[test]
fn intersect() {
    let c1: Mesh<()> = Mesh::cube(2.0, None).translate(-1.0, -1.0, -1.0);
    let c2: Mesh<()> = Mesh::sphere(1.0, 16, 8, None);
    let isect = c1.intersection(&c2);

    // The intersection bounding box should be smaller than or equal to each
    let bb_isect = isect.bounding_box();
    let bb_cube = c1.bounding_box();
    let bb_sphere = c2.bounding_box();
    assert!(bb_isect.mins.x >= bb_cube.mins.x - EPSILON);
    assert!(bb_isect.mins.x >= bb_sphere.mins.x - EPSILON);
    assert!(bb_isect.maxs.x <= bb_cube.maxs.x + EPSILON);
    assert!(bb_isect.maxs.x <= bb_sphere.maxs.x + EPSILON);
}

#[test]
fn intersection_of_overlapping_cubes() {
    let a: Mesh<()> = Mesh::cube(2.0, None).translate(-1.0, -1.0, -1.0);
    let b: Mesh<()> = Mesh::cube(1.0, None).translate(0.5, 0.5, 0.5);
    let overlap = a.intersection(&b);

    let bb = bounding_box(&overlap.polygons);
    assert!(approx_eq(bb[0], 0.5, 1e-8));
    assert!(approx_eq(bb[3], 1.0, 1e-8));
    assert!(approx_eq(signed_volume(&overlap), 0.125, 1e-9));
}

#[test]
fn xor_is_union_minus_intersection() {
    let a: Mesh<()> = Mesh::cube(2.0, None).translate(-1.0, -1.0, -1.0);
    let b: Mesh<()> = Mesh::cube(1.0, None).translate(0.5, 0.5, 0.5);

    let xor = a.xor(&b);
    let expected = signed_volume(&a.union(&b)) - signed_volume(&a.intersection(&b));
    assert!(approx_eq(signed_volume(&xor), expected, 1e-6));

    // xor with self cancels entirely
    assert!(approx_eq(signed_volume(&a.xor(&a)), 0.0, 1e-9));
}

#[test]
fn face_touching_operands() {
    // B sits flush against A's +x face; coincident boundary faces must be
    // contributed exactly once (or not at all) by each operation
    let a: Mesh<()> = Mesh::cube(1.0, None);
    let b: Mesh<()> = Mesh::cube(1.0, None).translate(1.0, 0.0, 0.0);

    let union = a.union(&b);
    assert!(approx_eq(signed_volume(&union), 2.0, 1e-9), "interior wall vanishes");

    let difference = a.difference(&b);
    assert!(
        approx_eq(signed_volume(&difference), 1.0, 1e-9),
        "subtracting a flush neighbour changes nothing"
    );

    let intersection = a.intersection(&b);
    assert!(
        approx_eq(signed_volume(&intersection), 0.0, 1e-9),
        "flush neighbours share no volume"
    );
}

#[test]
fn disjoint_binary_union_keeps_both_whole() {
    let a: Mesh<()> = Mesh::cube(1.0, None);
    let b: Mesh<()> = Mesh::cube(1.0, None).translate(10.0, 0.0, 0.0);

    let union = a.union(&b);
    assert_eq!(union.polygons.len(), 12);
    assert!(approx_eq(signed_volume(&union), 2.0, 1e-9));
}

#[test]
fn union_all_short_circuits_on_disjoint_bounds() {
    // scenario: two unit cubes centered at (0,0,0) and (10,0,0)
    let a: Mesh<()> = Mesh::cube(1.0, None).center();
    let b: Mesh<()> = Mesh::cube(1.0, None).center().translate(10.0, 0.0, 0.0);

    let union = Mesh::union_all(&[a.clone(), b.clone()]);
    assert_eq!(
        union.polygons.len(),
        a.polygons.len() + b.polygons.len(),
        "disjoint meshes concatenate without clipping"
    );

    let bb = bounding_box(&union.polygons);
    assert!(approx_eq(bb[0], -0.5, 1e-8));
    assert!(approx_eq(bb[3], 10.5, 1e-8));
    assert!(approx_eq(signed_volume(&union), 2.0, 1e-9));
}

#[test]
fn union_all_rescans_as_bounds_grow() {
    let a: Mesh<()> = Mesh::cube(1.0, None);
    let far: Mesh<()> = Mesh::cube(1.0, None).translate(5.0, 0.0, 0.0);
    let overlapping: Mesh<()> = Mesh::cube(1.0, None).translate(0.5, 0.0, 0.0);

    let union = Mesh::union_all(&[a, far.clone(), overlapping]);
    // 1 + 1 - 0.5 overlap, plus the far cube untouched
    assert!(approx_eq(signed_volume(&union), 2.5, 1e-6));
    let bb = bounding_box(&union.polygons);
    assert!(approx_eq(bb[3], 6.0, 1e-8));
}

#[test]
fn xor_all_on_disjoint_operands_is_union() {
    let a: Mesh<()> = Mesh::cube(1.0, None);
    let b: Mesh<()> = Mesh::cube(1.0, None).translate(3.0, 0.0, 0.0);
    let xor = Mesh::xor_all(&[a, b]);
    assert_eq!(xor.polygons.len(), 12);
    assert!(approx_eq(signed_volume(&xor), 2.0, 1e-9));
}

#[test]
fn linear_reductions_handle_disjoint_operands() {
    let a: Mesh<()> = Mesh::cube(1.0, None);
    let b: Mesh<()> = Mesh::cube(1.0, None).translate(10.0, 0.0, 0.0);

    let difference = Mesh::difference_all(&[a.clone(), b.clone()]);
    assert_eq!(difference.polygons.len(), 6, "disjoint subtrahend is a no-op");
    assert!(approx_eq(signed_volume(&difference), 1.0, 1e-9));

    let intersection = Mesh::intersection_all(&[a.clone(), b.clone()]);
    assert!(
        intersection.polygons.is_empty(),
        "a disjoint operand empties the intersection"
    );

    let stencil = Mesh::stencil_all(&[a.clone(), b]);
    assert_eq!(stencil.polygons.len(), 6, "painting with a disjoint mesh is a no-op");

    let empty = Mesh::<()>::union_all(&[]);
    assert!(empty.polygons.is_empty());
}

#[test]
fn stencil_paints_the_overlap() {
    let a: Mesh<&str> = Mesh::cube(2.0, Some("steel"));
    let b: Mesh<&str> = Mesh::cube(2.0, Some("paint")).translate(1.0, 1.0, 1.0);

    let painted = a.stencil(&b);

    // geometry is A's, untouched
    let bb = bounding_box(&painted.polygons);
    assert!(approx_eq(bb[0], 0.0, 1e-8) && approx_eq(bb[3], 2.0, 1e-8));
    assert!(approx_eq(signed_volume(&painted), 8.0, 1e-6));

    // the part of A's surface inside B now carries B's material: a [1,2]²
    // patch on each of the three far faces
    let repainted = painted.filter_polygons_by_metadata(&"paint");
    assert!(!repainted.polygons.is_empty());
    assert!(approx_eq(total_area(&repainted.polygons), 3.0, 1e-6));
    let bb = bounding_box(&repainted.polygons);
    assert!(bb[0] >= 1.0 - EPSILON && bb[1] >= 1.0 - EPSILON && bb[2] >= 1.0 - EPSILON);

    // everything else is still steel
    let steel = painted.filter_polygons_by_metadata(&"steel");
    assert!(approx_eq(
        total_area(&steel.polygons) + total_area(&repainted.polygons),
        total_area(&painted.polygons),
        1e-9
    ));
}

#[test]
fn stencil_without_source_material_keeps_fragments() {
    let a: Mesh<&str> = Mesh::cube(2.0, Some("steel"));
    let b: Mesh<&str> = Mesh::cube(2.0, None).translate(1.0, 1.0, 1.0);

    let painted = a.stencil(&b);
    assert!(
        painted
            .polygons
            .iter()
            .all(|p| p.metadata == Some("steel")),
        "with no material on B, fragments keep their own"
    );
    assert!(approx_eq(signed_volume(&painted), 8.0, 1e-6));
}

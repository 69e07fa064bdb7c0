mod support;

use slatcut::{BspKernel, CSGOps, GeometryKernel, SlatMesh};

use crate::support::{approx_eq, block};

#[test]
fn intersection_of_overlapping_boxes() {
    let kernel = BspKernel::default();
    let a = block([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
    let b = block([1.0, 0.5, -1.0], [3.0, 1.5, 3.0]);

    let hit = kernel.intersect(&a, &b).expect("intersect");
    assert!(approx_eq(hit.signed_volume(), 2.0, 1e-9));
    let bb = hit.bounding_box();
    assert!(approx_eq(bb.mins.x, 1.0, 1e-9));
    assert!(approx_eq(bb.maxs.z, 2.0, 1e-9));
}

#[test]
fn block_inside_a_notch_does_not_intersect_it() {
    let kernel = BspKernel::default();
    let notched = kernel
        .subtract(
            &block([0.0, 0.0, 0.0], [3.0, 1.0, 2.0]),
            &block([1.0, -0.5, 1.0], [2.0, 1.5, 2.5]),
        )
        .expect("subtract");
    let seated = block([1.1, 0.2, 1.2], [1.9, 0.8, 2.4]);

    for (a, b) in [(&notched, &seated), (&seated, &notched)] {
        let hit = kernel.intersect(a, b).expect("intersect");
        assert!(approx_eq(hit.signed_volume(), 0.0, 1e-9), "{}", hit.signed_volume());
    }
}

#[test]
fn intersection_with_nothing_is_empty() {
    let kernel = BspKernel::default();
    let a = block([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
    let hit = kernel.intersect(&a, &SlatMesh::new()).expect("intersect");
    assert!(hit.is_empty());
}

#[test]
fn subtraction_of_a_through_slot() {
    let kernel = BspKernel::default();
    let a = block([0.0, 0.0, 0.0], [3.0, 1.0, 1.0]);
    let slot = block([1.0, -0.5, 0.5], [2.0, 1.5, 1.5]);

    let notched = kernel.subtract(&a, &slot).expect("subtract");
    assert!(approx_eq(notched.signed_volume(), 2.5, 1e-9));
    assert_eq!(kernel.split_connected_components(&notched).len(), 1);

    let cut = block([1.0, -0.5, -0.5], [2.0, 1.5, 1.5]);
    let halves = kernel.subtract(&a, &cut).expect("subtract");
    let parts = kernel.split_connected_components(&halves);
    assert_eq!(parts.len(), 2);
    for part in &parts {
        assert!(approx_eq(part.signed_volume(), 1.0, 1e-9));
    }
}

#[test]
fn outline_extrudes_to_slat() {
    let kernel = BspKernel::default();
    let cross_section = block([-0.0015, -0.1, -0.05], [0.0015, 0.1, 0.05]);

    let outline = kernel
        .extract_boundary_loop(&cross_section, 0)
        .expect("dominant face");
    assert!(approx_eq(outline.area(), 0.2 * 0.1, 1e-9));

    let normal = outline.plane.normal();
    let slat = kernel.extrude_loop(&outline, -normal * 0.003).expect("extrude");
    assert!(approx_eq(slat.signed_volume(), 0.2 * 0.1 * 0.003, 1e-12));
    let bb = slat.bounding_box();
    assert!(approx_eq(bb.extents().x, 0.003, 1e-12));
}

#[test]
fn delete_loose_keeps_main_part() {
    let kernel = BspKernel::default();
    let main = block([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
    let crumb = block([5.0, 5.0, 5.0], [5.01, 5.01, 5.01]);
    let cleaned = kernel.delete_loose(&SlatMesh::merge([&main, &crumb]));

    assert_eq!(cleaned.polygons.len(), 6);
    assert!(approx_eq(cleaned.signed_volume(), 1.0, 1e-9));
}

//! Test support library
//! Models and configurations shared by the integration tests.

#![allow(dead_code)]

use nalgebra::Point3;
use slatcut::{SlatConfig, SlatMesh, float_types::Real};

/// Box spanning `mins..maxs`.
pub fn block(mins: [Real; 3], maxs: [Real; 3]) -> SlatMesh {
    SlatMesh::slab_between(Point3::from(mins), Point3::from(maxs), None)
}

/// A cube already at the default target size, centered on the origin.
pub fn target_cube() -> SlatMesh {
    block([-0.1, -0.1, -0.1], [0.1, 0.1, 0.1])
}

/// Defaults with `slices_y` slices and no voxel pass.
pub fn quick_config(slices_y: usize) -> SlatConfig {
    SlatConfig {
        slices_y,
        remesh: false,
        ..Default::default()
    }
}

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

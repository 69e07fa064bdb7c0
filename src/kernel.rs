//! Geometry capability set the slat pipeline runs on.
//!
//! The pipeline never touches BSP trees or field grids directly: every
//! boolean, split, outline and remesh call goes through [`GeometryKernel`],
//! so another mesh library can stand in for [`BspKernel`] without changes to
//! the stages.

use crate::errors::{Result, SlatError};
use crate::float_types::Real;
use crate::mesh::Mesh;
use crate::mesh::outline::Outline;
use crate::traits::CSGOps;
use nalgebra::Vector3;
use tracing::debug;

/// Mesh type carried through the pipeline.
pub type SlatMesh = Mesh<()>;

/// Surface-area ratio under which a loose part counts as debris.
pub const LOOSE_AREA_RATIO: Real = 1e-3;

/// Mesh operations used by the pipeline.
pub trait GeometryKernel {
    /// Boolean intersection `a ∩ b`. An empty result is `Ok`.
    fn intersect(&self, a: &SlatMesh, b: &SlatMesh) -> Result<SlatMesh>;

    /// Boolean difference `a − b`.
    fn subtract(&self, a: &SlatMesh, b: &SlatMesh) -> Result<SlatMesh>;

    /// One mesh per loose part, in a deterministic order.
    fn split_connected_components(&self, mesh: &SlatMesh) -> Vec<SlatMesh>;

    /// Boundary loops of the dominant face aligned with `axis`, if there is one.
    fn extract_boundary_loop(&self, mesh: &SlatMesh, axis: usize) -> Option<Outline>;

    /// Sweep `outline` along `direction` into a closed solid.
    fn extrude_loop(&self, outline: &Outline, direction: Vector3<Real>) -> Result<SlatMesh>;

    /// Rebuild the surface on a voxel grid, keeping the largest island.
    fn voxel_retessellate(&self, mesh: &SlatMesh, voxel: Real) -> Result<SlatMesh>;

    /// Remove degenerate polygons and disconnected debris.
    fn delete_loose(&self, mesh: &SlatMesh) -> SlatMesh;
}

/// Default kernel: BSP-tree booleans on polygon soups.
#[derive(Debug, Clone, Copy)]
pub struct BspKernel {
    pub loose_area_ratio: Real,
}

impl Default for BspKernel {
    fn default() -> Self {
        BspKernel {
            loose_area_ratio: LOOSE_AREA_RATIO,
        }
    }
}

impl BspKernel {
    pub const fn new() -> Self {
        BspKernel {
            loose_area_ratio: LOOSE_AREA_RATIO,
        }
    }

    /// Degenerate polygons are dropped; a non-finite vertex rejects the operand.
    fn prepare(operation: &'static str, mesh: &SlatMesh) -> Result<SlatMesh> {
        if let Some(poly) = mesh
            .polygons
            .iter()
            .find(|p| !p.vertices.iter().all(|v| v.is_finite()))
        {
            return Err(SlatError::boolean(
                operation,
                format!("operand has a non-finite vertex near {:?}", poly.centroid()),
            ));
        }
        Ok(mesh.without_degenerate())
    }

    fn check_result(operation: &'static str, mesh: SlatMesh) -> Result<SlatMesh> {
        if mesh
            .polygons
            .iter()
            .any(|p| !p.vertices.iter().all(|v| v.is_finite()))
        {
            return Err(SlatError::boolean(operation, "result has non-finite vertices"));
        }
        let cleaned = mesh.without_degenerate();
        debug!(
            operation,
            polygons = cleaned.polygons.len(),
            dropped = mesh.polygons.len() - cleaned.polygons.len(),
            "boolean done"
        );
        Ok(cleaned)
    }
}

impl GeometryKernel for BspKernel {
    fn intersect(&self, a: &SlatMesh, b: &SlatMesh) -> Result<SlatMesh> {
        const OP: &str = "intersection";
        let (a, b) = (Self::prepare(OP, a)?, Self::prepare(OP, b)?);
        if a.is_empty() || b.is_empty() {
            return Ok(SlatMesh::new());
        }
        Self::check_result(OP, a.intersection(&b))
    }

    fn subtract(&self, a: &SlatMesh, b: &SlatMesh) -> Result<SlatMesh> {
        const OP: &str = "difference";
        let (a, b) = (Self::prepare(OP, a)?, Self::prepare(OP, b)?);
        if a.is_empty() {
            return Err(SlatError::boolean(OP, "minuend is empty"));
        }
        if b.is_empty() {
            return Ok(a);
        }
        Self::check_result(OP, a.difference(&b))
    }

    fn split_connected_components(&self, mesh: &SlatMesh) -> Vec<SlatMesh> {
        mesh.connected_components()
    }

    fn extract_boundary_loop(&self, mesh: &SlatMesh, axis: usize) -> Option<Outline> {
        mesh.extract_outline(axis)
    }

    fn extrude_loop(&self, outline: &Outline, direction: Vector3<Real>) -> Result<SlatMesh> {
        const OP: &str = "extrusion";
        if !direction.iter().all(|c| c.is_finite()) {
            return Err(SlatError::boolean(OP, "non-finite extrusion vector"));
        }
        let solid: SlatMesh = outline.extrude(direction, None);
        if solid.is_empty() {
            return Err(SlatError::boolean(
                OP,
                "extrusion vector lies in the outline plane",
            ));
        }
        let volume = solid.signed_volume();
        if !(volume.is_finite() && volume > 0.0) {
            return Err(SlatError::boolean(OP, format!("solid has volume {volume}")));
        }
        Ok(solid)
    }

    fn voxel_retessellate(&self, mesh: &SlatMesh, voxel: Real) -> Result<SlatMesh> {
        mesh.voxel_retessellate(voxel)
    }

    fn delete_loose(&self, mesh: &SlatMesh) -> SlatMesh {
        mesh.delete_loose(self.loose_area_ratio)
    }
}

/// [`BspKernel`] that fails selected boolean and extrude calls, for
/// exercising the recovery paths of the pipeline stages.
#[cfg(test)]
pub(crate) mod flaky {
    use super::*;
    use std::cell::Cell;

    /// Calls are numbered from zero per operation, in the order they arrive.
    #[derive(Debug, Default)]
    pub(crate) struct FlakyKernel {
        pub fail_intersect: Vec<usize>,
        pub fail_subtract: Vec<usize>,
        pub fail_extrude: Vec<usize>,
        pub inner: BspKernel,
        pub intersects: Cell<usize>,
        pub subtracts: Cell<usize>,
        pub extrudes: Cell<usize>,
    }

    fn next_fails(calls: &Cell<usize>, failing: &[usize]) -> bool {
        let call = calls.get();
        calls.set(call + 1);
        failing.contains(&call)
    }

    impl GeometryKernel for FlakyKernel {
        fn intersect(&self, a: &SlatMesh, b: &SlatMesh) -> Result<SlatMesh> {
            if next_fails(&self.intersects, &self.fail_intersect) {
                return Err(SlatError::boolean("intersection", "injected failure"));
            }
            self.inner.intersect(a, b)
        }

        fn subtract(&self, a: &SlatMesh, b: &SlatMesh) -> Result<SlatMesh> {
            if next_fails(&self.subtracts, &self.fail_subtract) {
                return Err(SlatError::boolean("difference", "injected failure"));
            }
            self.inner.subtract(a, b)
        }

        fn split_connected_components(&self, mesh: &SlatMesh) -> Vec<SlatMesh> {
            self.inner.split_connected_components(mesh)
        }

        fn extract_boundary_loop(&self, mesh: &SlatMesh, axis: usize) -> Option<Outline> {
            self.inner.extract_boundary_loop(mesh, axis)
        }

        fn extrude_loop(&self, outline: &Outline, direction: Vector3<Real>) -> Result<SlatMesh> {
            if next_fails(&self.extrudes, &self.fail_extrude) {
                return Err(SlatError::boolean("extrusion", "injected failure"));
            }
            self.inner.extrude_loop(outline, direction)
        }

        fn voxel_retessellate(&self, mesh: &SlatMesh, voxel: Real) -> Result<SlatMesh> {
            self.inner.voxel_retessellate(mesh, voxel)
        }

        fn delete_loose(&self, mesh: &SlatMesh) -> SlatMesh {
            self.inner.delete_loose(mesh)
        }
    }
}

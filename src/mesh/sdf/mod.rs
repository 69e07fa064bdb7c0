//! Voxel re-tessellation
//!
//! Rebuilds a closed mesh's surface on a uniform grid: the mesh is sampled
//! into a signed field, the field is meshed with surface nets, and only the
//! largest connected island is kept. Boolean seams and slivers smaller than
//! a voxel disappear in the process.

pub mod field;
pub mod grid;

pub use grid::GridShape;

use crate::errors::{Result, SlatError};
use crate::float_types::Real;
use crate::mesh::Mesh;
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::Vertex;
use crate::traits::CSGOps;
use fast_surface_nets::{SurfaceNetsBuffer, surface_nets};
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;
use tracing::debug;

const OPERATION: &str = "voxel remesh";

impl<S: Clone + Debug + Send + Sync> Mesh<S> {
    /// Re-tessellate on a grid of cubic voxels of edge `voxel`, keeping the
    /// largest island. Fails on non-positive voxel size, an oversize grid or
    /// an empty result.
    pub fn voxel_retessellate(&self, voxel: Real) -> Result<Mesh<S>> {
        if !(voxel > 0.0) || !voxel.is_finite() {
            return Err(SlatError::boolean(OPERATION, format!("invalid voxel size {voxel}")));
        }
        if self.polygons.is_empty() {
            return Err(SlatError::boolean(OPERATION, "input mesh is empty"));
        }

        let bb = self.bounding_box();
        let grid = GridShape::covering(bb.mins, bb.maxs, voxel).ok_or_else(|| {
            SlatError::boolean(
                OPERATION,
                format!("grid over {:?} at voxel {voxel} exceeds the sample cap", bb.extents()),
            )
        })?;
        debug!(nx = grid.nx, ny = grid.ny, nz = grid.nz, voxel, "sampling field");

        let triangles: Vec<[Point3<Real>; 3]> = self
            .polygons
            .iter()
            .flat_map(|p| p.triangulate())
            .map(|[a, b, c]| [a.pos, b.pos, c.pos])
            .collect();
        let values = field::sample(&grid, &triangles);

        let mut buffer = SurfaceNetsBuffer::default();
        surface_nets(
            &values,
            &grid,
            [0, 0, 0],
            [grid.nx - 1, grid.ny - 1, grid.nz - 1],
            &mut buffer,
        );

        let polygons: Vec<Polygon<S>> = buffer
            .indices
            .chunks_exact(3)
            .filter_map(|tri| {
                let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
                let corners = [i0, i1, i2].map(|i| grid.world(buffer.positions[i]));
                let gradient: Vector3<Real> = [i0, i1, i2]
                    .iter()
                    .map(|&i| {
                        let n = buffer.normals[i];
                        Vector3::new(n[0] as Real, n[1] as Real, n[2] as Real)
                    })
                    .sum();
                if !corners.iter().all(|p| p.coords.iter().all(|c| c.is_finite())) {
                    return None;
                }

                let face = (corners[1] - corners[0]).cross(&(corners[2] - corners[0]));
                let outward = gradient.try_normalize(Real::EPSILON).unwrap_or(face);
                let ordered = if face.dot(&outward) < 0.0 {
                    [corners[0], corners[2], corners[1]]
                } else {
                    corners
                };
                let mut poly = Polygon::new(
                    ordered.iter().map(|&p| Vertex::new(p, outward)).collect(),
                    self.metadata.clone(),
                );
                poly.set_new_normal();
                (!poly.is_degenerate()).then_some(poly)
            })
            .collect();

        let mut surface = Mesh::from_polygons(&polygons);
        surface.metadata = self.metadata.clone();
        surface
            .largest_component()
            .filter(|m| !m.is_empty())
            .ok_or_else(|| SlatError::boolean(OPERATION, "field produced no surface"))
    }
}

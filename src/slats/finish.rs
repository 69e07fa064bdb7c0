//! Final cleanup of each slat and merging them into one exportable assembly.

use crate::errors::{Result, SlatError};
use crate::float_types::Real;
use crate::kernel::{GeometryKernel, SlatMesh};
use crate::slats::Diagnostics;
use crate::slats::piece::{Piece, PieceId};
use crate::traits::CSGOps;
use tracing::{debug, info, instrument, warn};

/// Presentation rotation about X applied to the merged assembly, in degrees.
pub const PRESENTATION_ROTATION_X_DEG: Real = 90.0;

/// All surviving slats merged into a single mesh.
#[derive(Debug, Clone)]
pub struct Assembly {
    /// `<base>_Joined`.
    pub name: String,
    pub mesh: SlatMesh,
    /// Pieces merged in, in merge order.
    pub pieces: Vec<PieceId>,
    /// Welded vertex count as written to interchange files.
    pub vertex_count: usize,
    /// Face count as written to interchange files.
    pub face_count: usize,
}

/// Drop loose debris from every piece, then optionally re-tessellate it on
/// a `voxel` grid. A failed remesh keeps the cleaned geometry; a piece that
/// cleans down to nothing is dropped.
#[instrument(skip_all, fields(pieces = pieces.len(), voxel = ?voxel))]
pub fn finish_pieces<K: GeometryKernel>(
    kernel: &K,
    pieces: Vec<Piece>,
    voxel: Option<Real>,
    diagnostics: &mut Diagnostics,
) -> Vec<Piece> {
    let mut finished = Vec::with_capacity(pieces.len());

    for mut piece in pieces {
        let cleaned = kernel.delete_loose(&piece.mesh);
        if cleaned.is_empty() {
            warn!(piece = %piece.id, "nothing left after removing loose geometry, dropping");
            diagnostics.record(format!("{}: empty after cleanup", piece.id));
            continue;
        }

        let mesh = match voxel {
            Some(size) => match kernel.voxel_retessellate(&cleaned, size) {
                Ok(remeshed) => {
                    debug!(
                        piece = %piece.id,
                        before = cleaned.polygons.len(),
                        after = remeshed.polygons.len(),
                        "remeshed"
                    );
                    remeshed
                },
                Err(e) => {
                    warn!(piece = %piece.id, error = %e, "remesh failed, keeping cleaned geometry");
                    diagnostics.record(format!("{}: remesh: {e}", piece.id));
                    cleaned
                },
            },
            None => cleaned,
        };
        piece.replace_mesh(mesh);
        finished.push(piece);
    }

    info!(pieces = finished.len(), "pieces finished");
    finished
}

/// Merge `pieces` into `<base_name>_Joined` and apply the presentation
/// rotation. Zero pieces is a [`SlatError::EmptyResult`].
#[instrument(skip(pieces), fields(pieces = pieces.len()))]
pub fn assemble(pieces: &[Piece], base_name: &str) -> Result<Assembly> {
    if pieces.is_empty() {
        return Err(SlatError::EmptyResult(format!(
            "no pieces of {base_name} survived to be assembled"
        )));
    }

    let merged = SlatMesh::merge(pieces.iter().map(|p| &p.mesh));
    let mesh = merged.rotate(PRESENTATION_ROTATION_X_DEG, 0.0, 0.0);
    let indexed = mesh.to_indexed();

    let assembly = Assembly {
        name: format!("{base_name}_Joined"),
        pieces: pieces.iter().map(|p| p.id).collect(),
        vertex_count: indexed.vertex_count(),
        face_count: indexed.face_count(),
        mesh,
    };
    info!(
        name = %assembly.name,
        vertices = assembly.vertex_count,
        faces = assembly.face_count,
        "assembly merged"
    );
    Ok(assembly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::BspKernel;
    use crate::slats::piece::Axis;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    fn slat(axis: Axis, slice: usize) -> Piece {
        let mesh = SlatMesh::slab(Point3::origin(), Vector3::new(0.003, 0.04, 0.02), None);
        Piece::new(PieceId { axis, slice, component: 0 }, mesh, axis.unit())
    }

    #[test]
    fn debris_is_removed_without_remesh() {
        let mut piece = slat(Axis::X, 0);
        let chip = SlatMesh::cuboid(0.0001, 0.0001, 0.0001, None).translate(0.5, 0.0, 0.0);
        piece.replace_mesh(SlatMesh::merge([&piece.mesh, &chip]));

        let finished = finish_pieces(
            &BspKernel::default(),
            vec![piece],
            None,
            &mut Diagnostics::default(),
        );
        assert_eq!(finished.len(), 1);
        assert!(finished[0].bounds().maxs.x < 0.01);
    }

    #[test]
    fn remesh_keeps_slat_shape() {
        let finished = finish_pieces(
            &BspKernel::default(),
            vec![slat(Axis::Y, 2)],
            Some(0.003 / 8.0),
            &mut Diagnostics::default(),
        );
        // faces of every orientation land on their planes, not within a voxel
        let bb = finished[0].bounds();
        let tolerance = 0.003 / 8.0 * 0.02;
        assert_relative_eq!(bb.mins, Point3::new(-0.0015, -0.02, -0.01), epsilon = tolerance);
        assert_relative_eq!(bb.maxs, Point3::new(0.0015, 0.02, 0.01), epsilon = tolerance);
    }

    #[test]
    fn remeshed_notch_still_clears_its_mate() {
        let kernel = BspKernel::default();
        let (t, c) = (0.003, 0.00005);
        let h = t / 8.0;
        let (slot_y, slot_top) = (0.0042, -0.002);
        let half_slot = t / 2.0 + c;

        let mut piece = slat(Axis::X, 0);
        let cutter = SlatMesh::slab_between(
            Point3::new(-0.003, slot_y - half_slot, -0.011),
            Point3::new(0.003, slot_y + half_slot, slot_top),
            None,
        );
        let notched = kernel.subtract(&piece.mesh, &cutter).expect("notch");
        piece.replace_mesh(notched);

        let finished = finish_pieces(&kernel, vec![piece], Some(h), &mut Diagnostics::default());
        let vertices: Vec<Point3<Real>> = finished[0]
            .mesh
            .polygons
            .iter()
            .flat_map(|p| p.vertices.iter().map(|v| v.pos))
            .collect();

        // a t thick mate seated in the slot, short of the concave corners at its top
        let mate_top = slot_top - 3.0 * h;
        let intrusions: Vec<_> = vertices
            .iter()
            .filter(|v| (v.y - slot_y).abs() < t / 2.0 - 1e-7 && v.z < mate_top)
            .collect();
        assert!(intrusions.is_empty(), "{intrusions:?}");

        // both slot walls were kept at their cut position
        for wall in [slot_y - half_slot, slot_y + half_slot] {
            assert!(
                vertices
                    .iter()
                    .any(|v| (v.y - wall).abs() < 1e-6 && v.z < mate_top && v.x.abs() < 0.001),
                "wall at {wall} moved"
            );
        }
    }

    #[test]
    fn assembly_is_rotated_and_named() {
        let assembly = assemble(&[slat(Axis::X, 0), slat(Axis::Y, 1)], "Cube").expect("assembly");
        assert_eq!(assembly.name, "Cube_Joined");
        assert_eq!(assembly.pieces.len(), 2);
        // +90° about X maps the Z extent onto Y
        assert_relative_eq!(assembly.mesh.bounding_box().extents().y, 0.02, epsilon = 1e-12);
        assert_eq!(assembly.vertex_count, 8);
        assert_eq!(assembly.face_count, 12);
    }

    #[test]
    fn nothing_to_assemble_is_an_error() {
        assert!(matches!(assemble(&[], "Cube"), Err(SlatError::EmptyResult(_))));
    }
}

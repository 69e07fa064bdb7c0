//! Removal of slats left without any neighbor to hold them.

use crate::float_types::Real;
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::slats::overlap::{ContactThresholds, Overlap};
use crate::slats::piece::Piece;
use tracing::{info, instrument};

/// Keep only pieces that overlap at least one other piece (of either axis)
/// under the looser neighbor rule. All pieces are judged against the same
/// input set before any is removed.
#[instrument(skip_all, fields(pieces = pieces.len()))]
pub fn remove_floating(pieces: Vec<Piece>, thickness: Real, clearance: Real) -> Vec<Piece> {
    let rule = ContactThresholds::neighbor(clearance, thickness);
    let bounds: Vec<Aabb> = pieces.iter().map(Piece::bounds).collect();

    let has_neighbor: Vec<bool> = bounds
        .iter()
        .enumerate()
        .map(|(i, own)| {
            bounds
                .iter()
                .enumerate()
                .any(|(j, other)| i != j && rule.admits(&Overlap::between(own, other)))
        })
        .collect();

    let before = pieces.len();
    let kept: Vec<Piece> = pieces
        .into_iter()
        .zip(has_neighbor)
        .filter_map(|(piece, keep)| {
            if !keep {
                info!(piece = %piece.id, "removing floating piece");
            }
            keep.then_some(piece)
        })
        .collect();

    info!(removed = before - kept.len(), kept = kept.len(), "floating pieces filtered");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::SlatMesh;
    use crate::slats::piece::{Axis, PieceId};
    use nalgebra::Point3;

    fn piece(axis: Axis, slice: usize, mins: [Real; 3], maxs: [Real; 3]) -> Piece {
        let mesh = SlatMesh::slab_between(Point3::from(mins), Point3::from(maxs), None);
        Piece::new(PieceId { axis, slice, component: 0 }, mesh, axis.unit())
    }

    #[test]
    fn lone_piece_is_removed() {
        let pieces = vec![
            piece(Axis::X, 0, [-0.0015, -0.1, -0.1], [0.0015, 0.1, 0.1]),
            piece(Axis::Y, 0, [-0.1, -0.0015, -0.1], [0.1, 0.0015, 0.1]),
            piece(Axis::Y, 1, [-0.1, 0.3, -0.1], [0.1, 0.303, 0.1]),
        ];
        let kept = remove_floating(pieces, 0.003, 0.00005);
        let slices: Vec<(Axis, usize)> = kept.iter().map(|p| (p.id.axis, p.id.slice)).collect();
        assert_eq!(slices, vec![(Axis::X, 0), (Axis::Y, 0)]);
    }

    #[test]
    fn thin_vertical_contact_counts_as_neighbor() {
        // 0.045 mm of vertical overlap: above 1 % but below 2 % of 3 mm
        let pieces = vec![
            piece(Axis::X, 0, [-0.0015, -0.1, 0.0], [0.0015, 0.1, 0.1]),
            piece(Axis::Y, 0, [-0.1, -0.0015, -0.1], [0.1, 0.0015, 0.000045]),
        ];
        assert_eq!(remove_floating(pieces, 0.003, 0.00005).len(), 2);
    }
}

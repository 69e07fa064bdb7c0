//! Lap joints: complementary half-depth notches where an X slat crosses a Y slat.
//!
//! The X slat is notched from the bottom of the shared span upward and the
//! Y slat from the top downward, so the pair slides together flush.

use crate::float_types::Real;
use crate::kernel::{GeometryKernel, SlatMesh};
use crate::slats::Diagnostics;
use crate::slats::overlap::{ContactThresholds, Overlap};
use crate::slats::piece::{Piece, PieceId};
use nalgebra::{Point3, Vector3};
use tracing::{debug, info, instrument, warn};

/// Dimensions that shape every notch, in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointParams {
    pub thickness: Real,
    pub clearance: Real,
    pub slot_margin: Real,
}

impl JointParams {
    /// Notch depth for an overlap of `height`: half the overlap less the
    /// slot margin, but never more than half the material less the clearance.
    pub fn slot_depth(&self, height: Real) -> Real {
        (height / 2.0 - self.slot_margin).min(self.thickness / 2.0 - self.clearance)
    }

    /// Notch width on both in-plane axes.
    pub fn slot_width(&self) -> Real {
        self.thickness + 2.0 * self.clearance
    }

    fn cutter(&self, cx: Real, cy: Real, cz: Real, depth: Real) -> SlatMesh {
        let w = self.slot_width();
        SlatMesh::slab(
            Point3::new(cx, cy, cz),
            Vector3::new(w, w, depth + self.clearance),
            None,
        )
    }
}

/// One attempted joint between an X and a Y slat.
#[derive(Debug, Clone, PartialEq)]
pub struct JointRecord {
    pub x: PieceId,
    pub y: PieceId,
    pub overlap: Overlap,
    pub slot_depth: Real,
    pub x_notched: bool,
    pub y_notched: bool,
}

impl JointRecord {
    /// Both notches were cut.
    pub const fn is_complete(&self) -> bool {
        self.x_notched && self.y_notched
    }
}

/// Notch every (X, Y) pair whose bounds really overlap.
///
/// Bounds are re-read from the current geometry for each pair. A failed
/// notch leaves that piece uncut and is recorded; it never aborts the run.
#[instrument(skip_all, fields(x = x_pieces.len(), y = y_pieces.len()))]
pub fn cut_joints<K: GeometryKernel>(
    kernel: &K,
    x_pieces: &mut [Piece],
    y_pieces: &mut [Piece],
    params: &JointParams,
    diagnostics: &mut Diagnostics,
) -> Vec<JointRecord> {
    let rule = ContactThresholds::contact(params.clearance, params.thickness);
    let mut joints = Vec::new();

    for x_piece in x_pieces.iter_mut() {
        for y_piece in y_pieces.iter_mut() {
            let overlap = Overlap::between(&x_piece.bounds(), &y_piece.bounds());
            if !rule.admits(&overlap) {
                continue;
            }
            let depth = params.slot_depth(overlap.height());
            if depth <= 0.0 {
                debug!(x = %x_piece.id, y = %y_piece.id, height = overlap.height(), "overlap too shallow for a joint");
                continue;
            }

            let (cx, cy) = overlap.center_xy();
            let x_cutter = params.cutter(cx, cy, overlap.mins.z + depth / 2.0, depth);
            let y_cutter = params.cutter(cx, cy, overlap.maxs.z - depth / 2.0, depth);

            let x_notched = notch(kernel, x_piece, &x_cutter, diagnostics);
            let y_notched = notch(kernel, y_piece, &y_cutter, diagnostics);
            if !(x_notched && y_notched) {
                warn!(x = %x_piece.id, y = %y_piece.id, x_notched, y_notched, "joint left incomplete");
            }

            joints.push(JointRecord {
                x: x_piece.id,
                y: y_piece.id,
                overlap,
                slot_depth: depth,
                x_notched,
                y_notched,
            });
        }
    }

    info!(
        attempted = joints.len(),
        complete = joints.iter().filter(|j| j.is_complete()).count(),
        "joints cut"
    );
    joints
}

fn notch<K: GeometryKernel>(
    kernel: &K,
    piece: &mut Piece,
    cutter: &SlatMesh,
    diagnostics: &mut Diagnostics,
) -> bool {
    match kernel.subtract(&piece.mesh, cutter) {
        Ok(mesh) if !mesh.is_empty() => {
            piece.replace_mesh(mesh);
            true
        },
        Ok(_) => {
            warn!(piece = %piece.id, "notch would remove the whole piece");
            diagnostics.record(format!("{}: notch left nothing", piece.id));
            false
        },
        Err(e) => {
            warn!(piece = %piece.id, error = %e, "notch failed");
            diagnostics.record(format!("{}: notch: {e}", piece.id));
            false
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::BspKernel;
    use crate::slats::piece::Axis;
    use approx::assert_relative_eq;

    const PARAMS: JointParams = JointParams {
        thickness: 0.003,
        clearance: 0.00005,
        slot_margin: 0.00005,
    };

    fn piece(axis: Axis, mins: [Real; 3], maxs: [Real; 3]) -> Piece {
        let mesh = SlatMesh::slab_between(Point3::from(mins), Point3::from(maxs), None);
        Piece::new(PieceId { axis, slice: 0, component: 0 }, mesh, axis.unit())
    }

    #[test]
    fn depth_is_bounded_by_material_and_overlap() {
        assert_relative_eq!(PARAMS.slot_depth(0.2), 0.00145, epsilon = 1e-12);
        assert_relative_eq!(PARAMS.slot_depth(0.002), 0.00095, epsilon = 1e-12);
        assert!(PARAMS.slot_depth(0.0001) <= 0.0);
    }

    #[test]
    fn crossing_slats_get_complementary_notches() {
        let mut xs = vec![piece(Axis::X, [-0.0015, -0.1, -0.1], [0.0015, 0.1, 0.1])];
        let mut ys = vec![piece(Axis::Y, [-0.1, -0.0015, -0.1], [0.1, 0.0015, 0.1])];
        let before = xs[0].mesh.signed_volume();

        let mut diagnostics = Diagnostics::default();
        let joints = cut_joints(&BspKernel::default(), &mut xs, &mut ys, &PARAMS, &mut diagnostics);
        assert_eq!(joints.len(), 1);
        let joint = &joints[0];
        assert!(joint.is_complete());
        assert_relative_eq!(joint.slot_depth, 0.00145, epsilon = 1e-12);

        // the X notch is a 0.003 wide slot, slot_depth + clearance/2 high from the bottom
        let removed = before - xs[0].mesh.signed_volume();
        let notch_height = 0.00145 + 0.00005 / 2.0;
        assert_relative_eq!(removed, 0.003 * PARAMS.slot_width() * notch_height, epsilon = 1e-10);
        assert!(ys[0].mesh.signed_volume() < before);
        assert!(diagnostics.warnings.is_empty());
    }

    #[test]
    fn parallel_slats_are_not_jointed() {
        let mut xs = vec![piece(Axis::X, [-0.0015, -0.1, -0.1], [0.0015, 0.1, 0.1])];
        let mut ys = vec![piece(Axis::Y, [0.01, -0.1, -0.1], [0.013, 0.1, 0.1])];
        let joints = cut_joints(
            &BspKernel::default(),
            &mut xs,
            &mut ys,
            &PARAMS,
            &mut Diagnostics::default(),
        );
        assert!(joints.is_empty());
    }
}

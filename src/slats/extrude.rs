//! Turning slice components into constant-thickness slats.

use crate::float_types::Real;
use crate::kernel::GeometryKernel;
use crate::slats::Diagnostics;
use crate::slats::piece::{Piece, PieceId};
use crate::slats::slicer::Slice;
use tracing::{debug, info, instrument, warn};

/// Extrude the dominant cross-section of every component in `slices` by
/// `thickness`, against its outward normal.
///
/// Components without a dominant face yield nothing; failed extrusions are
/// recorded and skipped.
#[instrument(skip_all, fields(slices = slices.len()))]
pub fn extrude_slices<K: GeometryKernel>(
    kernel: &K,
    slices: &[Slice],
    thickness: Real,
    diagnostics: &mut Diagnostics,
) -> Vec<Piece> {
    let mut pieces = Vec::new();

    for slice in slices {
        for (component, mesh) in slice.components.iter().enumerate() {
            let id = PieceId {
                axis: slice.axis,
                slice: slice.index,
                component,
            };

            let Some(outline) = kernel.extract_boundary_loop(mesh, slice.axis.index()) else {
                debug!(piece = %id, "no dominant face");
                continue;
            };
            let normal = outline.plane.normal();

            match kernel.extrude_loop(&outline, -normal * thickness) {
                Ok(solid) => {
                    debug!(
                        piece = %id,
                        loops = outline.loop_count(),
                        area = outline.area(),
                        "extruded"
                    );
                    pieces.push(Piece::new(id, solid, normal));
                },
                Err(e) => {
                    warn!(piece = %id, error = %e, "extrusion failed, skipping");
                    diagnostics.record(format!("{id}: {e}"));
                },
            }
        }
    }

    info!(pieces = pieces.len(), "outlines extruded");
    pieces
}

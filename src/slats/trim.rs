//! Clipping slats to the vertical span where perpendicular slats hold them.

use crate::float_types::Real;
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::kernel::{GeometryKernel, SlatMesh};
use crate::slats::Diagnostics;
use crate::slats::overlap::{ContactThresholds, Overlap};
use crate::slats::piece::Piece;
use nalgebra::Point3;
use tracing::{debug, info, instrument, warn};

/// Protrusion beyond the supported span that is left alone.
pub const TRIM_EPSILON: Real = 1e-4;

/// Trim Y pieces against X pieces, then X pieces against the trimmed Y set.
///
/// The order matters: X pieces measure their contacts against Y pieces that
/// have already lost their excess. Returns `(x_pieces, y_pieces)`.
#[instrument(skip_all, fields(x = x_pieces.len(), y = y_pieces.len()))]
pub fn trim_pieces<K: GeometryKernel>(
    kernel: &K,
    x_pieces: Vec<Piece>,
    y_pieces: Vec<Piece>,
    thickness: Real,
    clearance: Real,
    diagnostics: &mut Diagnostics,
) -> (Vec<Piece>, Vec<Piece>) {
    let rule = ContactThresholds::contact(clearance, thickness);
    let trimmed_y = trim_against(kernel, y_pieces, &x_pieces, &rule, thickness, diagnostics);
    let trimmed_x = trim_against(kernel, x_pieces, &trimmed_y, &rule, thickness, diagnostics);
    info!(x = trimmed_x.len(), y = trimmed_y.len(), "pieces trimmed");
    (trimmed_x, trimmed_y)
}

/// Vertical span `[z_min, z_max]` covered by every real contact between
/// `bounds` and `others`, or `None` if there is no real contact.
pub fn supported_span(
    bounds: &Aabb,
    others: &[Aabb],
    rule: &ContactThresholds,
) -> Option<(Real, Real)> {
    others
        .iter()
        .map(|other| Overlap::between(bounds, other))
        .filter(|overlap| rule.admits(overlap))
        .map(|overlap| (overlap.mins.z, overlap.maxs.z))
        .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
}

fn trim_against<K: GeometryKernel>(
    kernel: &K,
    pieces: Vec<Piece>,
    opposite: &[Piece],
    rule: &ContactThresholds,
    thickness: Real,
    diagnostics: &mut Diagnostics,
) -> Vec<Piece> {
    let opposite_bounds: Vec<Aabb> = opposite.iter().map(Piece::bounds).collect();
    let mut kept = Vec::with_capacity(pieces.len());

    for mut piece in pieces {
        let bounds = piece.bounds();
        let Some((z_min, z_max)) = supported_span(&bounds, &opposite_bounds, rule) else {
            info!(piece = %piece.id, "no real intersection, discarding");
            continue;
        };

        let grow = thickness;
        let (lo_x, lo_y) = (bounds.mins.x - grow, bounds.mins.y - grow);
        let (hi_x, hi_y) = (bounds.maxs.x + grow, bounds.maxs.y + grow);

        let mut cutters: Vec<(&str, SlatMesh)> = Vec::with_capacity(2);
        if bounds.maxs.z > z_max + TRIM_EPSILON {
            cutters.push((
                "top",
                SlatMesh::slab_between(
                    Point3::new(lo_x, lo_y, z_max),
                    Point3::new(hi_x, hi_y, bounds.maxs.z + grow),
                    None,
                ),
            ));
        }
        if bounds.mins.z < z_min - TRIM_EPSILON {
            cutters.push((
                "bottom",
                SlatMesh::slab_between(
                    Point3::new(lo_x, lo_y, bounds.mins.z - grow),
                    Point3::new(hi_x, hi_y, z_min),
                    None,
                ),
            ));
        }

        for (side, cutter) in cutters {
            match kernel.subtract(&piece.mesh, &cutter) {
                Ok(mesh) if !mesh.is_empty() => {
                    debug!(piece = %piece.id, side, z_min, z_max, "trimmed");
                    piece.replace_mesh(mesh);
                },
                Ok(_) => {
                    warn!(piece = %piece.id, side, "trim removed everything, keeping piece uncut");
                    diagnostics.record(format!("{}: {side} trim left nothing", piece.id));
                },
                Err(e) => {
                    warn!(piece = %piece.id, side, error = %e, "trim failed, keeping piece uncut");
                    diagnostics.record(format!("{}: {side} trim: {e}", piece.id));
                },
            }
        }
        kept.push(piece);
    }
    kept
}

//! Recentering and uniform rescaling of the input model.

use crate::errors::{Result, SlatError};
use crate::float_types::{EPSILON, Real};
use crate::kernel::SlatMesh;
use crate::traits::CSGOps;
use nalgebra::Vector3;
use tracing::{info, instrument};

/// The working copy every slice is cut from.
#[derive(Debug, Clone)]
pub struct NormalizedModel {
    pub mesh: SlatMesh,
    /// Uniform factor applied after recentering.
    pub scale: Real,
    /// Bounding-box extents after scaling and offset.
    pub extents: Vector3<Real>,
}

/// Center `mesh` on the origin by its bounding box, scale it so the largest
/// extent equals `target_size`, then shift it by `offset_x` along X.
///
/// The input is left untouched. A zero extent on any axis (including an
/// empty mesh) is a [`SlatError::DegenerateGeometry`].
#[instrument(skip(mesh), fields(polygons = mesh.polygons.len()))]
pub fn normalize(mesh: &SlatMesh, target_size: Real, offset_x: Real) -> Result<NormalizedModel> {
    let extents = mesh.bounding_box().extents();
    if extents.iter().any(|e| !e.is_finite() || *e < EPSILON) {
        return Err(SlatError::DegenerateGeometry { extents });
    }

    let scale = target_size / extents.max();
    let mut normalized = mesh.center().scale(scale, scale, scale);
    if offset_x != 0.0 {
        normalized = normalized.translate(offset_x, 0.0, 0.0);
    }

    let extents = normalized.bounding_box().extents();
    info!(
        scale,
        x = extents.x,
        y = extents.y,
        z = extents.z,
        "normalized model"
    );
    Ok(NormalizedModel {
        mesh: normalized,
        scale,
        extents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn rescales_largest_extent_to_target() {
        let box_ = SlatMesh::cuboid(4.0, 2.0, 1.0, None).translate(10.0, 10.0, 10.0);
        let model = normalize(&box_, 0.2, 0.0).expect("normalize");
        assert_relative_eq!(model.scale, 0.05, epsilon = 1e-12);
        assert_relative_eq!(model.extents, Vector3::new(0.2, 0.1, 0.05), epsilon = 1e-12);
        assert_relative_eq!(model.mesh.bounding_box().center(), Point3::origin(), epsilon = 1e-12);
        // source untouched
        assert_relative_eq!(box_.bounding_box().mins.x, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn offset_moves_along_x_only() {
        let cube = SlatMesh::cuboid(1.0, 1.0, 1.0, None);
        let model = normalize(&cube, 0.2, 0.05).expect("normalize");
        let c = model.mesh.bounding_box().center();
        assert_relative_eq!(c, Point3::new(0.05, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn flat_input_is_degenerate() {
        let quad = SlatMesh::cuboid(1.0, 1.0, 1.0, None).scale(1.0, 1.0, 0.0);
        let err = normalize(&quad, 0.2, 0.0).unwrap_err();
        assert!(matches!(err, SlatError::DegenerateGeometry { .. }));
        assert!(matches!(
            normalize(&SlatMesh::new(), 0.2, 0.0),
            Err(SlatError::DegenerateGeometry { .. })
        ));
    }
}

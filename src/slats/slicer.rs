//! Cutting the normalized model into thin cross-sections along X and Y.

use crate::float_types::Real;
use crate::kernel::{GeometryKernel, SlatMesh};
use crate::slats::Diagnostics;
use crate::slats::piece::Axis;
use crate::traits::CSGOps;
use nalgebra::{Point3, Vector3};
use tracing::{debug, info, instrument, warn};

/// Slice count along X for `slices_y` slices along Y, keeping slice spacing
/// proportional to the model's X/Y aspect ratio. Halves round to even.
pub fn derive_slices_x(slices_y: usize, extents: &Vector3<Real>) -> usize {
    if !(extents.y > 0.0) {
        return 1;
    }
    let ratio = slices_y as Real * extents.x / extents.y;
    if !ratio.is_finite() {
        return 1;
    }
    (ratio.round_ties_even() as usize).max(1)
}

/// Cutting slab for slice `index` of `count` along `axis`.
///
/// The slab is one material thickness thick, centered on the slice midpoint,
/// and oversized on the other axes so it always spans the whole model.
pub fn slab_for(
    axis: Axis,
    index: usize,
    count: usize,
    bounds_min: &Point3<Real>,
    bounds_max: &Point3<Real>,
    thickness: Real,
) -> SlatMesh {
    let extents = bounds_max - bounds_min;
    let mut center = Point3::from((bounds_min.coords + bounds_max.coords) * 0.5);
    let a = axis.index();
    let step = extents[a] / count as Real;
    center[a] = bounds_min[a] + (index as Real + 0.5) * step;

    let in_plane = 2.0 * extents.x.max(extents.y);
    let mut size = Vector3::new(in_plane, in_plane, 2.0 * extents.z);
    size[a] = thickness;
    SlatMesh::slab(center, size, None)
}

/// Loose parts of one slice.
#[derive(Debug, Clone)]
pub struct Slice {
    pub axis: Axis,
    pub index: usize,
    pub components: Vec<SlatMesh>,
}

/// Intersect `model` with `count` slabs along `axis` and split every
/// non-empty result into connected components. Failed or empty slices are
/// skipped.
#[instrument(skip(kernel, model, diagnostics), fields(axis = ?axis))]
pub fn slice_axis<K: GeometryKernel>(
    kernel: &K,
    model: &SlatMesh,
    axis: Axis,
    count: usize,
    thickness: Real,
    diagnostics: &mut Diagnostics,
) -> Vec<Slice> {
    let bounds = model.bounding_box();
    let mut slices = Vec::with_capacity(count);

    for index in 0..count {
        let slab = slab_for(axis, index, count, &bounds.mins, &bounds.maxs, thickness);
        let section = match kernel.intersect(model, &slab) {
            Ok(section) => section,
            Err(e) => {
                warn!(axis = ?axis, slice = index, error = %e, "slice failed, skipping");
                diagnostics.record(format!("slice {}{index}: {e}", axis.letter()));
                continue;
            },
        };
        if section.is_empty() {
            debug!(axis = ?axis, slice = index, "slice is empty");
            continue;
        }

        let components = kernel.split_connected_components(&section);
        debug!(axis = ?axis, slice = index, components = components.len(), "sliced");
        slices.push(Slice {
            axis,
            index,
            components,
        });
    }

    info!(
        axis = ?axis,
        requested = count,
        produced = slices.len(),
        components = slices.iter().map(|s| s.components.len()).sum::<usize>(),
        "axis sliced"
    );
    slices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::BspKernel;
    use approx::assert_relative_eq;

    #[test]
    fn slices_x_follows_aspect_ratio() {
        assert_eq!(derive_slices_x(10, &Vector3::new(0.2, 0.2, 0.2)), 10);
        assert_eq!(derive_slices_x(10, &Vector3::new(0.1, 0.2, 0.2)), 5);
        assert_eq!(derive_slices_x(10, &Vector3::new(0.001, 0.2, 0.2)), 1);
        // 2.5 rounds to even
        assert_eq!(derive_slices_x(5, &Vector3::new(0.1, 0.2, 0.2)), 2);
        assert_eq!(derive_slices_x(3, &Vector3::new(0.2, 0.0, 0.2)), 1);
    }

    #[test]
    fn slab_sits_on_slice_midpoint() {
        let min = Point3::new(-0.1, -0.1, -0.05);
        let max = Point3::new(0.1, 0.1, 0.05);
        let slab = slab_for(Axis::X, 0, 10, &min, &max, 0.003);
        let bb = slab.bounding_box();
        assert_relative_eq!(bb.center().x, -0.09, epsilon = 1e-12);
        assert_relative_eq!(bb.extents(), Vector3::new(0.003, 0.4, 0.2), epsilon = 1e-12);
    }

    #[test]
    fn u_shape_splits_into_two_components() {
        // two legs joined by a bridge at the bottom; a high Y slice cuts both legs only
        let left = SlatMesh::cuboid(0.05, 0.2, 0.2, None);
        let right = left.translate(0.15, 0.0, 0.0);
        let bridge = SlatMesh::cuboid(0.2, 0.05, 0.2, None);
        let u = left.union(&right).union(&bridge);

        let mut diagnostics = Diagnostics::default();
        let slices = slice_axis(&BspKernel::default(), &u, Axis::Y, 4, 0.003, &mut diagnostics);
        assert_eq!(slices.len(), 4);
        assert_eq!(slices[0].components.len(), 1);
        assert_eq!(slices[3].components.len(), 2);
        assert!(diagnostics.warnings.is_empty());
    }
}

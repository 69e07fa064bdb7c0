//! Sample lattice for the re-tessellation field

use crate::float_types::Real;
use nalgebra::{Point3, Vector3};

/// Hard cap on the number of field samples in one grid.
pub const MAX_SAMPLES: u64 = 1 << 26;

/// Samples beyond the mesh bounds on every side, so the field is positive
/// along the whole grid boundary and every surface closes.
pub const PADDING: u32 = 2;

/// A regular lattice of `nx × ny × nz` samples spaced `spacing` apart,
/// starting at `origin`. X varies fastest in the linear layout.
#[derive(Clone, Copy, Debug)]
pub struct GridShape {
    pub nx: u32,
    pub ny: u32,
    pub nz: u32,
    pub origin: Point3<Real>,
    pub spacing: Real,
}

impl GridShape {
    /// Grid covering `[mins, maxs]` plus padding, or `None` when it would
    /// exceed [`MAX_SAMPLES`].
    pub fn covering(mins: Point3<Real>, maxs: Point3<Real>, spacing: Real) -> Option<Self> {
        let extent = maxs - mins;
        let count = |len: Real| -> Option<u32> {
            let cells = (len / spacing).ceil();
            if !cells.is_finite() || cells < 0.0 || cells > u32::MAX as Real {
                return None;
            }
            (cells as u32).checked_add(1 + 2 * PADDING)
        };
        let (nx, ny, nz) = (count(extent.x)?, count(extent.y)?, count(extent.z)?);

        let samples = nx as u64 * ny as u64 * nz as u64;
        if samples > MAX_SAMPLES {
            return None;
        }

        Some(GridShape {
            nx,
            ny,
            nz,
            origin: mins - Vector3::repeat(spacing * PADDING as Real),
            spacing,
        })
    }

    /// World position of a (possibly fractional) lattice coordinate.
    #[inline]
    pub fn world(&self, p: [f32; 3]) -> Point3<Real> {
        self.origin + Vector3::new(p[0] as Real, p[1] as Real, p[2] as Real) * self.spacing
    }

    #[inline]
    pub fn sample_x(&self, ix: u32) -> Real {
        self.origin.x + ix as Real * self.spacing
    }

    #[inline]
    pub fn sample_y(&self, iy: u32) -> Real {
        self.origin.y + iy as Real * self.spacing
    }

    #[inline]
    pub fn sample_z(&self, iz: u32) -> Real {
        self.origin.z + iz as Real * self.spacing
    }
}

impl fast_surface_nets::ndshape::Shape<3> for GridShape {
    type Coord = u32;

    #[inline]
    fn as_array(&self) -> [Self::Coord; 3] {
        [self.nx, self.ny, self.nz]
    }

    fn size(&self) -> Self::Coord {
        self.nx * self.ny * self.nz
    }

    fn usize(&self) -> usize {
        self.nx as usize * self.ny as usize * self.nz as usize
    }

    fn linearize(&self, coords: [Self::Coord; 3]) -> u32 {
        let [x, y, z] = coords;
        (z * self.ny + y) * self.nx + x
    }

    fn delinearize(&self, i: u32) -> [Self::Coord; 3] {
        let x = i % self.nx;
        let yz = i / self.nx;
        let y = yz % self.ny;
        let z = yz / self.ny;
        [x, y, z]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fast_surface_nets::ndshape::Shape;

    #[test]
    fn covering_pads_every_side() {
        let grid = GridShape::covering(Point3::origin(), Point3::new(1.0, 2.0, 0.5), 0.25)
            .expect("small grid");
        assert_eq!((grid.nx, grid.ny, grid.nz), (9, 13, 7));
        assert!((grid.sample_x(PADDING) - 0.0).abs() < 1e-12);
        assert!(grid.sample_y(grid.ny - 1 - PADDING) >= 2.0 - 1e-12);
    }

    #[test]
    fn linearize_round_trips() {
        let grid = GridShape::covering(Point3::origin(), Point3::new(1.0, 1.0, 1.0), 0.1)
            .expect("small grid");
        for i in [0, 17, 555, grid.size() - 1] {
            assert_eq!(grid.linearize(grid.delinearize(i)), i);
        }
    }

    #[test]
    fn oversize_grid_is_refused() {
        assert!(GridShape::covering(Point3::origin(), Point3::new(1.0, 1.0, 1.0), 1e-4).is_none());
    }
}

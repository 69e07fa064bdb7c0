//! Signed field sampling of a closed polygon mesh.
//!
//! Inside/outside is decided per sample by ray parity along +X: each lattice
//! column `(y, z)` is intersected with every triangle once, and the sorted
//! crossing positions classify all `nx` samples of that column. Samples with
//! a lattice neighbor of the other sign then get their true Euclidean
//! distance to the surface, so surface nets places every crossing exactly on
//! planar faces whatever their orientation. All magnitudes are clamped to
//! one voxel.

use crate::float_types::Real;
use crate::float_types::parry3d::query::PointQuery;
use crate::float_types::parry3d::shape::TriMesh;
use crate::mesh::sdf::grid::GridShape;
use nalgebra::Point3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// Irrational-ish fractions of a voxel that keep sample rays off shared edges.
const JITTER_Y: Real = 1.618_033_988_7e-4;
const JITTER_Z: Real = 2.718_281_828_4e-4;

/// Triangle with its YZ bounds, ready for column tests.
struct ColumnTriangle {
    a: Point3<Real>,
    b: Point3<Real>,
    c: Point3<Real>,
    min_y: Real,
    max_y: Real,
}

impl ColumnTriangle {
    /// X coordinate where the line `(·, y, z)` pierces the triangle, if it does.
    fn crossing(&self, y: Real, z: Real) -> Option<Real> {
        if y < self.min_y || y > self.max_y {
            return None;
        }
        let cross = |p: &Point3<Real>, q: &Point3<Real>| (p.y - y) * (q.z - z) - (q.y - y) * (p.z - z);
        let det = (self.b.y - self.a.y) * (self.c.z - self.a.z) - (self.c.y - self.a.y) * (self.b.z - self.a.z);
        if det.abs() < Real::EPSILON {
            return None;
        }
        let wa = cross(&self.b, &self.c) / det;
        let wb = cross(&self.c, &self.a) / det;
        let wc = 1.0 - wa - wb;
        if wa < 0.0 || wb < 0.0 || wc < 0.0 {
            return None;
        }
        Some(wa * self.a.x + wb * self.b.x + wc * self.c.x)
    }
}

/// Sample the signed field of `triangles` on `grid`: negative inside,
/// positive outside, magnitude at most one voxel.
pub fn sample(grid: &GridShape, triangles: &[[Point3<Real>; 3]]) -> Vec<f32> {
    let h = grid.spacing;
    let (nx, ny, nz) = (grid.nx as usize, grid.ny as usize, grid.nz as usize);

    // bucket triangles by the lattice rows their Z range touches
    let mut rows: Vec<Vec<ColumnTriangle>> = (0..nz).map(|_| Vec::new()).collect();
    for &[a, b, c] in triangles {
        let min_z = a.z.min(b.z).min(c.z);
        let max_z = a.z.max(b.z).max(c.z);
        let first = ((min_z - grid.origin.z) / h).floor().max(0.0) as usize;
        let last = (((max_z - grid.origin.z) / h).ceil().max(0.0) as usize).min(nz - 1);
        for row in rows.iter_mut().take(last + 1).skip(first) {
            row.push(ColumnTriangle {
                a,
                b,
                c,
                min_y: a.y.min(b.y).min(c.y),
                max_y: a.y.max(b.y).max(c.y),
            });
        }
    }

    let mut field = vec![h as f32; nx * ny * nz];
    let fill = |(column, values): (usize, &mut [f32])| {
        let (iy, iz) = (column % ny, column / ny);
        let y = grid.sample_y(iy as u32) + h * JITTER_Y;
        let z = grid.sample_z(iz as u32) + h * JITTER_Z;

        let mut crossings: Vec<Real> = rows[iz].iter().filter_map(|t| t.crossing(y, z)).collect();
        if crossings.is_empty() {
            return;
        }
        crossings.sort_by(|p, q| p.total_cmp(q));
        fill_column(grid, &crossings, values);
    };

    #[cfg(not(feature = "parallel"))]
    field.chunks_mut(nx).enumerate().for_each(fill);
    #[cfg(feature = "parallel")]
    field.par_chunks_mut(nx).enumerate().for_each(fill);

    refine_near_surface(grid, triangles, &mut field);
    field
}

/// Replace the column distances of every sample that borders a sign change
/// with its distance to the nearest triangle, keeping the parity sign.
///
/// Surface nets only interpolates along lattice edges whose ends differ in
/// sign, so no other sample influences vertex positions.
fn refine_near_surface(grid: &GridShape, triangles: &[[Point3<Real>; 3]], field: &mut [f32]) {
    let Some(surface) = surface_mesh(triangles) else {
        return;
    };
    let h = grid.spacing;
    let (nx, ny, nz) = (grid.nx as usize, grid.ny as usize, grid.nz as usize);
    let inside: Vec<bool> = field.iter().map(|v| *v < 0.0).collect();

    let borders_surface = |index: usize| {
        let (ix, iy, iz) = (index % nx, (index / nx) % ny, index / (nx * ny));
        let own = inside[index];
        let differs = |other: usize| inside[other] != own;
        (ix > 0 && differs(index - 1))
            || (ix + 1 < nx && differs(index + 1))
            || (iy > 0 && differs(index - nx))
            || (iy + 1 < ny && differs(index + nx))
            || (iz > 0 && differs(index - nx * ny))
            || (iz + 1 < nz && differs(index + nx * ny))
    };

    let refine = |(index, value): (usize, &mut f32)| {
        if !borders_surface(index) {
            return;
        }
        let (ix, iy, iz) = (index % nx, (index / nx) % ny, index / (nx * ny));
        let p = Point3::new(
            grid.sample_x(ix as u32),
            grid.sample_y(iy as u32),
            grid.sample_z(iz as u32),
        );
        let projection = surface.project_local_point(&p, false);
        let distance = (projection.point - p).norm().min(h) as f32;
        *value = if inside[index] { -distance } else { distance };
    };

    #[cfg(not(feature = "parallel"))]
    field.iter_mut().enumerate().for_each(refine);
    #[cfg(feature = "parallel")]
    field.par_iter_mut().enumerate().for_each(refine);
}

/// Unwelded triangle soup as a parry mesh for closest-point queries.
fn surface_mesh(triangles: &[[Point3<Real>; 3]]) -> Option<TriMesh> {
    let vertices: Vec<Point3<Real>> = triangles.iter().flatten().copied().collect();
    let indices: Vec<[u32; 3]> = (0..triangles.len() as u32)
        .map(|t| [3 * t, 3 * t + 1, 3 * t + 2])
        .collect();
    TriMesh::new(vertices, indices).ok()
}

/// Classify one column of samples against its sorted crossings.
fn fill_column(grid: &GridShape, crossings: &[Real], values: &mut [f32]) {
    let h = grid.spacing;
    let mut passed = 0usize;
    for (ix, value) in values.iter_mut().enumerate() {
        let x = grid.sample_x(ix as u32);
        while passed < crossings.len() && crossings[passed] < x {
            passed += 1;
        }
        let behind = passed.checked_sub(1).map(|i| x - crossings[i]);
        let ahead = crossings.get(passed).map(|c| c - x);
        let distance = behind
            .into_iter()
            .chain(ahead)
            .fold(h, Real::min);
        *value = if passed % 2 == 1 {
            -(distance as f32)
        } else {
            distance as f32
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;

    fn triangles(mesh: &Mesh<()>) -> Vec<[Point3<Real>; 3]> {
        mesh.polygons
            .iter()
            .flat_map(|p| p.triangulate())
            .map(|[a, b, c]| [a.pos, b.pos, c.pos])
            .collect()
    }

    #[test]
    fn cube_samples_split_by_parity() {
        let cube: Mesh<()> = Mesh::cuboid(1.0, 1.0, 1.0, None);
        let grid = GridShape::covering(Point3::origin(), Point3::new(1.0, 1.0, 1.0), 0.25)
            .expect("small grid");
        let field = sample(&grid, &triangles(&cube));

        let at = |ix: usize, iy: usize, iz: usize| {
            field[(iz * grid.ny as usize + iy) * grid.nx as usize + ix]
        };
        // lattice index 4 is x = 0.5, the cube center
        assert!(at(4, 4, 4) < 0.0);
        assert!(at(0, 4, 4) > 0.0);
        assert!(at(4, 0, 4) > 0.0);
        assert!((at(4, 4, 4) + 0.25).abs() < 1e-6);
        assert!(field.iter().all(|v| v.abs() <= 0.25 + 1e-6));
    }

    #[test]
    fn walls_of_every_orientation_get_true_distance() {
        // faces sit a fraction of a voxel off the lattice on all three axes
        let slab: Mesh<()> = Mesh::slab_between(
            Point3::new(0.03, 0.07, 0.11),
            Point3::new(0.93, 0.81, 0.62),
            None,
        );
        let grid = GridShape::covering(Point3::origin(), Point3::new(1.0, 1.0, 1.0), 0.1)
            .expect("small grid");
        let field = sample(&grid, &triangles(&slab));
        let index = |ix: u32, iy: u32, iz: u32| {
            ((iz * grid.ny + iy) * grid.nx + ix) as usize
        };

        // two padding samples put lattice index i at -0.2 + 0.1 * i
        let cases = [
            // just outside the +Y face at 0.81: sample y = 0.9
            (index(7, 11, 7), 0.09),
            // just inside the -Z face at 0.11: sample z = 0.2
            (index(7, 7, 4), -0.09),
            // just outside the +Z face at 0.62: sample z = 0.7
            (index(7, 7, 9), 0.08),
            // just inside the -X face at 0.03: sample x = 0.1
            (index(3, 7, 7), -0.07),
        ];
        for (i, expected) in cases {
            assert!((field[i] as Real - expected).abs() < 1e-6, "sample {i}: {}", field[i]);
        }
    }
}

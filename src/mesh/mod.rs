//! `Mesh` struct and implementations of the `CSGOps` trait for `Mesh`

use crate::float_types::{
    Real,
    parry3d::bounding_volume::{Aabb, BoundingVolume},
};
use crate::mesh::{bsp::Node, polygon::Polygon};
use crate::traits::CSGOps;
use geo::{Coord, LineString, Polygon as GeoPolygon, TriangulateEarcut};
use nalgebra::{Matrix4, Point3};
use std::{fmt::Debug, sync::OnceLock};

pub mod bsp;
pub mod connectivity;
pub mod indexed;
pub mod outline;
pub mod plane;
pub mod polygon;
pub mod sdf;
pub mod shapes;
pub mod vertex;

/// A closed (or intended to be closed) polygon soup.
#[derive(Clone, Debug)]
pub struct Mesh<S: Clone + Send + Sync + Debug> {
    pub polygons: Vec<Polygon<S>>,

    /// Lazily calculated AABB that spans `polygons`.
    pub bounding_box: OnceLock<Aabb>,

    pub metadata: Option<S>,
}

/// Which cells of the two BSP trees a boolean keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BooleanKind {
    Union,
    Difference,
    Intersection,
}

impl<S: Clone + Send + Sync + Debug> Mesh<S> {
    pub fn from_polygons(polygons: &[Polygon<S>]) -> Self {
        Mesh {
            polygons: polygons.to_vec(),
            bounding_box: OnceLock::new(),
            metadata: None,
        }
    }

    /// Concatenate the polygons of several meshes without any boolean work.
    pub fn merge<'a, I>(meshes: I) -> Self
    where
        I: IntoIterator<Item = &'a Mesh<S>>,
        S: 'a,
    {
        let polygons = meshes
            .into_iter()
            .flat_map(|mesh| mesh.polygons.iter().cloned())
            .collect();
        Mesh {
            polygons,
            bounding_box: OnceLock::new(),
            metadata: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Ear-cut a 2D polygon (outer ring plus holes) into triangles lying at z=0.
    pub fn triangulate_2d(outer: &[[Real; 2]], holes: &[&[[Real; 2]]]) -> Vec<[Point3<Real>; 3]> {
        let ring = |points: &[[Real; 2]]| {
            LineString::new(points.iter().map(|&[x, y]| Coord { x, y }).collect())
        };
        let polygon = GeoPolygon::new(ring(outer), holes.iter().map(|h| ring(*h)).collect());

        let raw = polygon.earcut_triangles_raw();
        let corner = |i: usize| Point3::new(raw.vertices[2 * i], raw.vertices[2 * i + 1], 0.0);
        raw.triangle_indices
            .chunks_exact(3)
            .map(|tri| [corner(tri[0]), corner(tri[1]), corner(tri[2])])
            .collect()
    }

    /// Copy of this mesh without polygons that cannot take part in a boolean.
    pub fn without_degenerate(&self) -> Mesh<S> {
        Mesh {
            polygons: self
                .polygons
                .iter()
                .filter(|p| !p.is_degenerate())
                .cloned()
                .collect(),
            bounding_box: OnceLock::new(),
            metadata: self.metadata.clone(),
        }
    }

    pub fn surface_area(&self) -> Real {
        self.polygons.iter().map(Polygon::area).sum()
    }

    /// Enclosed volume via the divergence theorem; positive for outward-facing shells.
    pub fn signed_volume(&self) -> Real {
        self.polygons
            .iter()
            .flat_map(|p| p.triangulate())
            .map(|[a, b, c]| a.pos.coords.dot(&b.pos.coords.cross(&c.pos.coords)) / 6.0)
            .sum()
    }

    /// Polygons whose bounding box touches `bounds`, and the rest.
    fn split_by_bounds(polygons: &[Polygon<S>], bounds: &Aabb) -> (Vec<Polygon<S>>, Vec<Polygon<S>>) {
        polygons
            .iter()
            .cloned()
            .partition(|p| p.bounding_box().intersects(bounds))
    }

    /// Run one boolean on BSP trees of the two operands. Union and difference
    /// only build trees from the polygons near the other operand and pass the
    /// far ones through; intersection classifies against both whole solids.
    fn boolean(&self, other: &Mesh<S>, kind: BooleanKind) -> Mesh<S> {
        let ((a_near, a_far), (b_near, b_far)) = match kind {
            BooleanKind::Intersection => (
                (self.polygons.clone(), Vec::new()),
                (other.polygons.clone(), Vec::new()),
            ),
            BooleanKind::Union | BooleanKind::Difference => (
                Self::split_by_bounds(&self.polygons, &other.bounding_box()),
                Self::split_by_bounds(&other.polygons, &self.bounding_box()),
            ),
        };

        let mut a = Node::from_polygons(&a_near);
        let mut b = Node::from_polygons(&b_near);

        let mut polygons = match kind {
            BooleanKind::Union => {
                a.clip_to(&b);
                b.clip_to(&a);
                b.invert();
                b.clip_to(&a);
                b.invert();
                a.build(&b.all_polygons());
                let mut kept = a.all_polygons();
                kept.extend(b_far);
                kept
            },
            BooleanKind::Difference => {
                a.invert();
                a.clip_to(&b);
                b.clip_to(&a);
                b.invert();
                b.clip_to(&a);
                b.invert();
                a.build(&b.all_polygons());
                a.invert();
                a.all_polygons()
            },
            BooleanKind::Intersection => {
                a.invert();
                b.clip_to(&a);
                b.invert();
                a.clip_to(&b);
                b.clip_to(&a);
                a.build(&b.all_polygons());
                a.invert();
                a.all_polygons()
            },
        };
        polygons.extend(a_far);

        Mesh {
            polygons,
            bounding_box: OnceLock::new(),
            metadata: self.metadata.clone(),
        }
    }
}

impl<S: Clone + Send + Sync + Debug> CSGOps for Mesh<S> {
    fn new() -> Self {
        Mesh {
            polygons: Vec::new(),
            bounding_box: OnceLock::new(),
            metadata: None,
        }
    }

    fn union(&self, other: &Mesh<S>) -> Mesh<S> {
        self.boolean(other, BooleanKind::Union)
    }

    /// `self` with the volume of `other` removed.
    fn difference(&self, other: &Mesh<S>) -> Mesh<S> {
        self.boolean(other, BooleanKind::Difference)
    }

    fn intersection(&self, other: &Mesh<S>) -> Mesh<S> {
        self.boolean(other, BooleanKind::Intersection)
    }

    /// Apply a 4x4 transform to every vertex. Normals go through the inverse
    /// transpose; singular matrices leave them untouched.
    fn transform(&self, mat: &Matrix4<Real>) -> Mesh<S> {
        let normal_mat = mat.try_inverse().map(|m| m.transpose());
        let mut mesh = self.clone();

        for poly in &mut mesh.polygons {
            for vert in &mut poly.vertices {
                vert.pos = mat.transform_point(&vert.pos);
                if let Some(nm) = &normal_mat {
                    let n = nm.transform_vector(&vert.normal);
                    vert.normal = n.try_normalize(Real::EPSILON).unwrap_or(n);
                }
            }
            poly.plane = plane::Plane::from_vertices(&poly.vertices);
            poly.bounding_box = OnceLock::new();
        }

        mesh.bounding_box = OnceLock::new();
        mesh
    }

    /// Bounds of every vertex; an empty mesh gives a point box at the origin.
    fn bounding_box(&self) -> Aabb {
        *self.bounding_box.get_or_init(|| {
            let mut points = self.polygons.iter().flat_map(|p| p.vertices.iter().map(|v| v.pos));
            let Some(first) = points.next() else {
                return Aabb::new(Point3::origin(), Point3::origin());
            };
            let (mins, maxs) = points.fold((first, first), |(lo, hi), p| (lo.inf(&p), hi.sup(&p)));
            Aabb::new(mins, maxs)
        })
    }

    /// Flip inside and outside.
    fn inverse(&self) -> Mesh<S> {
        let mut mesh = self.clone();
        mesh.polygons.iter_mut().for_each(Polygon::flip);
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn triangulate_2d_square_with_hole() {
        let outer = [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]];
        let hole: &[[Real; 2]] = &[[1.0, 1.0], [1.0, 3.0], [3.0, 3.0], [3.0, 1.0]];
        let tris = Mesh::<()>::triangulate_2d(&outer, &[hole]);
        let area: Real = tris
            .iter()
            .map(|[a, b, c]| ((b - a).cross(&(c - a))).norm() * 0.5)
            .sum();
        assert_relative_eq!(area, 12.0, epsilon = 1e-9);
    }

    #[test]
    fn transform_moves_bounding_box() {
        let cube: Mesh<()> = Mesh::cuboid(1.0, 2.0, 3.0, None);
        let moved = cube.translate(1.0, 0.0, -1.0);
        let bb = moved.bounding_box();
        assert_relative_eq!(bb.mins, Point3::new(1.0, 0.0, -1.0), epsilon = 1e-12);
        assert_relative_eq!(bb.maxs, Point3::new(2.0, 2.0, 2.0), epsilon = 1e-12);
    }

    #[test]
    fn volume_of_cuboid() {
        let cube: Mesh<()> = Mesh::cuboid(1.0, 2.0, 3.0, None);
        assert_relative_eq!(cube.signed_volume(), 6.0, epsilon = 1e-9);
        assert_relative_eq!(cube.inverse().signed_volume(), -6.0, epsilon = 1e-9);
    }

    #[test]
    fn booleans_of_overlapping_cubes() {
        let a: Mesh<()> = Mesh::cuboid(2.0, 2.0, 2.0, None);
        let b: Mesh<()> = Mesh::cuboid(2.0, 2.0, 2.0, None).translate(1.0, 0.5, 0.25);
        // overlap is 1 x 1.5 x 1.75
        let overlap = 1.0 * 1.5 * 1.75;
        assert_relative_eq!(a.intersection(&b).signed_volume(), overlap, epsilon = 1e-9);
        assert_relative_eq!(a.difference(&b).signed_volume(), 8.0 - overlap, epsilon = 1e-9);
        assert_relative_eq!(a.union(&b).signed_volume(), 16.0 - overlap, epsilon = 1e-9);
    }

    #[test]
    fn intersection_with_block_seated_in_notch_is_empty() {
        // a U-shaped block whose notch holds a smaller block without touching it
        let base: Mesh<()> = Mesh::slab_between(Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 1.0, 2.0), None);
        let notch: Mesh<()> = Mesh::slab_between(Point3::new(1.0, -0.5, 1.0), Point3::new(2.0, 1.5, 2.5), None);
        let notched = base.difference(&notch);
        let seated: Mesh<()> = Mesh::slab_between(Point3::new(1.1, 0.2, 1.2), Point3::new(1.9, 0.8, 2.4), None);

        assert_relative_eq!(notched.signed_volume(), 5.0, epsilon = 1e-9);
        assert_relative_eq!(notched.intersection(&seated).signed_volume(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(seated.intersection(&notched).signed_volume(), 0.0, epsilon = 1e-9);
    }
}

//! Struct and functions for working with planar `Polygon`s without holes

use crate::float_types::{
    Real,
    parry3d::bounding_volume::Aabb,
};
use crate::mesh::plane::{Plane, newell_normal};
use crate::mesh::vertex::Vertex;
use nalgebra::{Point3, Vector3};
use std::sync::OnceLock;

/// A convex polygon, defined by a list of vertices and the plane they lie on.
///
/// Every polygon the crate produces is convex (box faces, triangles, and the
/// convex halves left by BSP splitting), which is what allows fan
/// triangulation in [`Polygon::triangulate`].
#[derive(Debug, Clone)]
pub struct Polygon<S: Clone> {
    /// Vertices defining the Polygon's shape
    pub vertices: Vec<Vertex>,

    /// The plane on which this Polygon lies, used for splitting
    pub plane: Plane,

    /// Lazily‑computed axis‑aligned bounding box of the Polygon
    pub bounding_box: OnceLock<Aabb>,

    /// Generic metadata associated with the Polygon
    pub metadata: Option<S>,
}

impl<S: Clone + PartialEq> PartialEq for Polygon<S> {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
            && self.plane == other.plane
            && self.metadata == other.metadata
    }
}

impl<S: Clone + Send + Sync> Polygon<S> {
    /// Create a polygon from vertices, deriving its plane from their winding.
    pub fn new(vertices: Vec<Vertex>, metadata: Option<S>) -> Self {
        let plane = Plane::from_vertices(&vertices);
        Polygon {
            vertices,
            plane,
            bounding_box: OnceLock::new(),
            metadata,
        }
    }

    /// Create a polygon that keeps a known supporting plane.
    pub fn with_plane(vertices: Vec<Vertex>, plane: Plane, metadata: Option<S>) -> Self {
        Polygon {
            vertices,
            plane,
            bounding_box: OnceLock::new(),
            metadata,
        }
    }

    /// Axis aligned bounding box of this Polygon (cached after first call)
    pub fn bounding_box(&self) -> Aabb {
        *self.bounding_box.get_or_init(|| {
            let mut mins = Point3::new(Real::MAX, Real::MAX, Real::MAX);
            let mut maxs = Point3::new(-Real::MAX, -Real::MAX, -Real::MAX);
            for v in &self.vertices {
                mins = mins.inf(&v.pos);
                maxs = maxs.sup(&v.pos);
            }
            Aabb::new(mins, maxs)
        })
    }

    /// Reverses winding order, flips vertices normals, and flips the plane normal
    pub fn flip(&mut self) {
        self.vertices.reverse();
        for v in &mut self.vertices {
            v.flip();
        }
        self.plane.flip();
    }

    /// Iterate over the closed loop of edges `(v[i], v[i+1])`.
    pub fn edges(&self) -> impl Iterator<Item = (&Vertex, &Vertex)> {
        self.vertices
            .iter()
            .zip(self.vertices.iter().cycle().skip(1))
    }

    /// Fan-triangulate this convex polygon.
    pub fn triangulate(&self) -> Vec<[Vertex; 3]> {
        if self.vertices.len() < 3 {
            return Vec::new();
        }
        let anchor = &self.vertices[0];
        self.vertices[1..]
            .windows(2)
            .map(|pair| [anchor.clone(), pair[0].clone(), pair[1].clone()])
            .collect()
    }

    /// Surface area of the polygon.
    pub fn area(&self) -> Real {
        newell_normal(&self.vertices).map_or(0.0, |n| n.norm() * 0.5)
    }

    /// Whether this polygon cannot take part in boolean operations:
    /// too few vertices, no enclosed area, or non-finite coordinates.
    pub fn is_degenerate(&self) -> bool {
        self.vertices.len() < 3
            || !self.vertices.iter().all(Vertex::is_finite)
            || newell_normal(&self.vertices).is_none()
    }

    /// Recompute the plane from the vertices and assign its normal to all of them.
    pub fn set_new_normal(&mut self) {
        self.plane = Plane::from_vertices(&self.vertices);
        let normal: Vector3<Real> = self.plane.normal();
        for v in &mut self.vertices {
            v.normal = normal;
        }
    }

    /// Arithmetic mean of the vertex positions.
    pub fn centroid(&self) -> Point3<Real> {
        let sum = self
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + v.pos.coords);
        Point3::from(sum / self.vertices.len().max(1) as Real)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(size: Real) -> Polygon<()> {
        let n = Vector3::z();
        Polygon::new(
            vec![
                Vertex::new(Point3::new(0.0, 0.0, 0.0), n),
                Vertex::new(Point3::new(size, 0.0, 0.0), n),
                Vertex::new(Point3::new(size, size, 0.0), n),
                Vertex::new(Point3::new(0.0, size, 0.0), n),
            ],
            None,
        )
    }

    #[test]
    fn area_and_fan_triangulation() {
        let sq = square(2.0);
        assert_relative_eq!(sq.area(), 4.0, epsilon = 1e-12);
        let tris = sq.triangulate();
        assert_eq!(tris.len(), 2);
        let total: Real = tris
            .iter()
            .map(|t| (t[1].pos - t[0].pos).cross(&(t[2].pos - t[0].pos)).norm() * 0.5)
            .sum();
        assert_relative_eq!(total, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn flip_reverses_plane() {
        let mut sq = square(1.0);
        sq.flip();
        assert_relative_eq!(sq.plane.normal, -Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(sq.vertices[0].normal, -Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let n = Vector3::z();
        let line: Polygon<()> = Polygon::new(
            vec![
                Vertex::new(Point3::new(0.0, 0.0, 0.0), n),
                Vertex::new(Point3::new(1.0, 0.0, 0.0), n),
                Vertex::new(Point3::new(2.0, 0.0, 0.0), n),
            ],
            None,
        );
        assert!(line.is_degenerate());
        assert!(!square(1.0).is_degenerate());
    }
}

//! Welded vertex/face view of a polygon soup, as written to interchange files.

use crate::float_types::Real;
use crate::mesh::Mesh;
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::{PositionKey, Vertex};
use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;

/// Shared vertex positions plus faces as index loops into them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedFaces {
    pub positions: Vec<Point3<Real>>,
    /// Zero-based vertex index loops, one per face.
    pub faces: Vec<Vec<usize>>,
    /// Unit normal of each face.
    pub normals: Vec<Vector3<Real>>,
}

impl IndexedFaces {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Rebuild a polygon mesh, skipping loops that cannot form a polygon.
    pub fn to_mesh<S: Clone + Debug + Send + Sync>(&self, metadata: Option<S>) -> Mesh<S> {
        let polygons: Vec<Polygon<S>> = self
            .faces
            .iter()
            .filter(|face| face.len() >= 3 && face.iter().all(|&i| i < self.positions.len()))
            .map(|face| {
                let mut poly = Polygon::new(
                    face.iter()
                        .map(|&i| Vertex::new(self.positions[i], Vector3::zeros()))
                        .collect(),
                    metadata.clone(),
                );
                poly.set_new_normal();
                poly
            })
            .collect();
        let mut mesh = Mesh::from_polygons(&polygons);
        mesh.metadata = metadata;
        mesh
    }
}

impl<S: Clone + Debug + Send + Sync> Mesh<S> {
    /// Weld coincident vertices and list each polygon as an index loop.
    ///
    /// Consecutive repeats inside a loop are collapsed and loops with fewer
    /// than three distinct vertices are dropped.
    pub fn to_indexed(&self) -> IndexedFaces {
        let mut indexed = IndexedFaces::default();
        let mut index_of: HashMap<PositionKey, usize> = HashMap::new();

        for poly in &self.polygons {
            let mut face: Vec<usize> = Vec::with_capacity(poly.vertices.len());
            for v in &poly.vertices {
                let index = *index_of.entry(v.key()).or_insert_with(|| {
                    indexed.positions.push(v.pos);
                    indexed.positions.len() - 1
                });
                if face.last() != Some(&index) {
                    face.push(index);
                }
            }
            while face.len() > 1 && face.first() == face.last() {
                face.pop();
            }
            let mut distinct = face.clone();
            distinct.sort_unstable();
            distinct.dedup();
            if distinct.len() < 3 {
                continue;
            }
            indexed.faces.push(face);
            indexed.normals.push(poly.plane.normal());
        }
        indexed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_welds_to_eight_vertices() {
        let cube: Mesh<()> = Mesh::cuboid(1.0, 1.0, 1.0, None);
        let indexed = cube.to_indexed();
        assert_eq!(indexed.vertex_count(), 8);
        assert_eq!(indexed.face_count(), 6);
        assert!(indexed.faces.iter().all(|f| f.len() == 4));

        let rebuilt: Mesh<()> = indexed.to_mesh(None);
        assert_eq!(rebuilt.polygons.len(), 6);
        assert!((rebuilt.signed_volume() - 1.0).abs() < 1e-9);
    }
}

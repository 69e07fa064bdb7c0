//! STL reading and binary STL writing through `stl_io`.

use crate::float_types::Real;
use crate::io::IoError;
use crate::mesh::Mesh;
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::Vertex;
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;
use std::io::Cursor;

/// Read ASCII or binary STL into a triangle mesh.
pub fn read_stl<S: Clone + Debug + Send + Sync>(bytes: &[u8]) -> Result<Mesh<S>, IoError> {
    let mut cursor = Cursor::new(bytes);
    let stl = stl_io::read_stl(&mut cursor)?;

    let point = |i: usize| -> Result<Point3<Real>, IoError> {
        let v = stl.vertices.get(i).ok_or_else(|| {
            IoError::MalformedInput(format!("STL face references missing vertex {i}"))
        })?;
        Ok(Point3::new(v[0] as Real, v[1] as Real, v[2] as Real))
    };

    let mut polygons = Vec::with_capacity(stl.faces.len());
    for face in &stl.faces {
        let vertices = face
            .vertices
            .iter()
            .map(|&i| point(i).map(|p| Vertex::new(p, Vector3::zeros())))
            .collect::<Result<Vec<_>, _>>()?;
        let mut poly: Polygon<S> = Polygon::new(vertices, None);
        poly.set_new_normal();
        if !poly.is_degenerate() {
            polygons.push(poly);
        }
    }
    Ok(Mesh::from_polygons(&polygons))
}

/// Binary STL bytes for `mesh`; polygons are fanned into triangles.
pub fn to_stl_binary<S: Clone + Debug + Send + Sync>(mesh: &Mesh<S>) -> std::io::Result<Vec<u8>> {
    use stl_io::{Normal, Triangle, Vertex as StlVertex, write_stl};

    let triangles: Vec<Triangle> = mesh
        .polygons
        .iter()
        .flat_map(|poly| {
            let n = poly.plane.normal();
            poly.triangulate().into_iter().map(move |tri| Triangle {
                normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: tri.map(|v| StlVertex::new([v.pos.x as f32, v.pos.y as f32, v.pos.z as f32])),
            })
        })
        .collect();

    let mut cursor = Cursor::new(Vec::new());
    write_stl(&mut cursor, triangles.iter())?;
    Ok(cursor.into_inner())
}

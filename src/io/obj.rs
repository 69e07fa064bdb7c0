//! Wavefront OBJ reading and writing.

use crate::float_types::Real;
use crate::io::IoError;
use crate::mesh::Mesh;
use crate::mesh::plane::Plane;
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::Vertex;
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;

/// Largest distance from a face's best-fit plane at which it still counts as planar.
const PLANARITY_TOLERANCE: Real = 1e-7;

/// Geometry read from an OBJ file: positions and faces as zero-based index
/// loops, exactly as listed in the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjData {
    /// First `o` (or `g`) name seen.
    pub name: Option<String>,
    pub positions: Vec<Point3<Real>>,
    pub faces: Vec<Vec<usize>>,
}

/// Parse OBJ text. Only `v`, `f`, `o` and `g` records are read.
pub fn parse_obj(text: &str) -> Result<ObjData, IoError> {
    let mut data = ObjData::default();

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        let mut tokens = line.split_whitespace();
        let Some(tag) = tokens.next() else {
            continue;
        };

        match tag {
            "v" => {
                let coords: Vec<Real> = tokens
                    .take(3)
                    .map(str::parse::<Real>)
                    .collect::<Result<_, _>>()?;
                let [x, y, z] = coords[..] else {
                    return Err(IoError::MalformedInput(format!(
                        "line {}: vertex needs three coordinates",
                        line_no + 1
                    )));
                };
                data.positions.push(Point3::new(x, y, z));
            },
            "f" => {
                let mut face = Vec::new();
                for token in tokens {
                    let index = resolve_index(token, data.positions.len()).ok_or_else(|| {
                        IoError::MalformedInput(format!(
                            "line {}: bad face index `{token}`",
                            line_no + 1
                        ))
                    })?;
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
                if distinct.len() >= 3 {
                    data.faces.push(face);
                }
            },
            "o" | "g" => {
                if data.name.is_none() {
                    let name = tokens.collect::<Vec<_>>().join(" ");
                    if !name.is_empty() {
                        data.name = Some(name);
                    }
                }
            },
            _ => {},
        }
    }

    Ok(data)
}

/// Zero-based index from a face token (`i`, `i/t`, `i//n` or `i/t/n`).
/// Negative indices count back from the last vertex read so far.
fn resolve_index(token: &str, vertex_count: usize) -> Option<usize> {
    let raw: i64 = token.split('/').next()?.parse().ok()?;
    let index = match raw {
        0 => return None,
        i if i > 0 => usize::try_from(i - 1).ok()?,
        i => vertex_count.checked_sub(usize::try_from(-i).ok()?)?,
    };
    (index < vertex_count).then_some(index)
}

impl ObjData {
    /// Build a polygon mesh.
    ///
    /// Planar convex faces stay whole, planar concave faces are ear-cut and
    /// non-planar faces are fanned into triangles.
    pub fn to_mesh<S: Clone + Debug + Send + Sync>(&self, metadata: Option<S>) -> Mesh<S> {
        let mut polygons: Vec<Polygon<S>> = Vec::with_capacity(self.faces.len());

        for face in &self.faces {
            let vertices: Vec<Vertex> = face
                .iter()
                .map(|&i| Vertex::new(self.positions[i], Vector3::zeros()))
                .collect();
            let plane = Plane::from_vertices(&vertices);
            let planar = vertices
                .iter()
                .all(|v| plane.signed_distance(&v.pos).abs() < PLANARITY_TOLERANCE);

            let loops: Vec<Vec<Vertex>> = if vertices.len() == 3 || (planar && is_convex(&vertices, &plane)) {
                vec![vertices]
            } else if planar {
                ear_cut(&vertices, &plane)
            } else {
                (1..vertices.len() - 1)
                    .map(|i| {
                        vec![vertices[0].clone(), vertices[i].clone(), vertices[i + 1].clone()]
                    })
                    .collect()
            };

            for vertices in loops {
                let mut poly = Polygon::new(vertices, metadata.clone());
                poly.set_new_normal();
                if !poly.is_degenerate() {
                    polygons.push(poly);
                }
            }
        }

        let mut mesh = Mesh::from_polygons(&polygons);
        mesh.metadata = metadata;
        mesh
    }
}

fn is_convex(vertices: &[Vertex], plane: &Plane) -> bool {
    let n = plane.normal();
    let count = vertices.len();
    (0..count).all(|i| {
        let a = vertices[i].pos;
        let b = vertices[(i + 1) % count].pos;
        let c = vertices[(i + 2) % count].pos;
        (b - a).cross(&(c - b)).dot(&n) >= -PLANARITY_TOLERANCE * PLANARITY_TOLERANCE
    })
}

fn ear_cut(vertices: &[Vertex], plane: &Plane) -> Vec<Vec<Vertex>> {
    let (to_local, to_world) = plane.to_xy_transform();
    let outer: Vec<[Real; 2]> = vertices
        .iter()
        .map(|v| {
            let p = to_local.transform_point(&v.pos);
            [p.x, p.y]
        })
        .collect();
    Mesh::<()>::triangulate_2d(&outer, &[])
        .into_iter()
        .map(|tri| {
            let mut loop_: Vec<Vertex> = tri
                .iter()
                .map(|p| Vertex::new(to_world.transform_point(p), Vector3::zeros()))
                .collect();
            // keep the winding of the source face
            let normal = (loop_[1].pos - loop_[0].pos).cross(&(loop_[2].pos - loop_[0].pos));
            if normal.dot(&plane.normal()) < 0.0 {
                loop_.reverse();
            }
            loop_
        })
        .collect()
}

impl<S: Clone + Debug + Send + Sync> Mesh<S> {
    /// Serialize as one OBJ object named `name`: welded `v` records, one
    /// `vn` per face, then `f v//n` records with 1-based indices.
    pub fn to_obj(&self, name: &str) -> String {
        let indexed = self.to_indexed();
        let mut out = String::new();
        out.push_str("# Exported by custom OBJ exporter\n");
        out.push_str("mtllib custom.mtl\n");

        for p in &indexed.positions {
            out.push_str(&format!("v {:.6} {:.6} {:.6}\n", p.x, p.y, p.z));
        }
        for n in &indexed.normals {
            out.push_str(&format!("vn {:.6} {:.6} {:.6}\n", n.x, n.y, n.z));
        }

        out.push_str(&format!("g {name}\n"));
        out.push_str(&format!("o {name}\n"));
        out.push_str("usemtl diffuse_0\n");

        for (face_index, face) in indexed.faces.iter().enumerate() {
            let refs: Vec<String> = face
                .iter()
                .map(|&v| format!("{}//{}", v + 1, face_index + 1))
                .collect();
            out.push_str(&format!("f {}\n", refs.join(" ")));
        }
        out
    }
}

//! Cross-section outlines: finding the dominant face of a slice, recovering
//! its boundary loops, and sweeping them into a closed solid.

use crate::float_types::{EPSILON, Real};
use crate::mesh::Mesh;
use crate::mesh::plane::Plane;
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::Vertex;
use crate::traits::CSGOps;
use geo::{Area, BooleanOps, Coord, LineString, MultiPolygon, Orient, Polygon as GeoPolygon, orient::Direction};
use nalgebra::{Matrix4, Point3, Vector3};
use std::fmt::Debug;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::debug;

/// A face is axis-aligned when the matching normal component exceeds this.
pub const AXIS_ALIGNMENT: Real = 0.99;

/// Distance within which a polygon counts as lying on the dominant plane.
const COPLANAR_TOLERANCE: Real = 1e-7;

/// Closed boundary loops of a planar region, held in the region's local XY frame.
#[derive(Debug, Clone)]
pub struct Outline {
    /// Plane of the source face; its normal is the face's outward normal.
    pub plane: Plane,
    /// Exterior and hole loops, exteriors counter-clockwise.
    pub shape: MultiPolygon<Real>,
    to_local: Matrix4<Real>,
    to_world: Matrix4<Real>,
}

impl<S: Clone + Debug + Send + Sync> Mesh<S> {
    /// Index of the largest polygon whose normal is aligned with `axis`
    /// (0 = X, 1 = Y, 2 = Z).
    pub fn dominant_face(&self, axis: usize) -> Option<usize> {
        self.polygons
            .iter()
            .enumerate()
            .filter(|(_, p)| p.plane.normal()[axis].abs() > AXIS_ALIGNMENT)
            .map(|(i, p)| (i, p.area()))
            .filter(|(_, area)| *area > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Boundary loops of the dominant face along `axis`.
    ///
    /// A boolean cut leaves the cap of a slice as several coplanar fragments,
    /// so every polygon on the dominant plane facing the same way is merged
    /// into one region before the loops are read off. If merging fails the
    /// dominant polygon alone is used.
    pub fn extract_outline(&self, axis: usize) -> Option<Outline> {
        let seed = &self.polygons[self.dominant_face(axis)?];
        let plane = seed.plane.clone();
        let (to_local, to_world) = plane.to_xy_transform();

        let project = |poly: &Polygon<S>| -> GeoPolygon<Real> {
            let coords: Vec<Coord<Real>> = poly
                .vertices
                .iter()
                .map(|v| {
                    let p = to_local.transform_point(&v.pos);
                    Coord { x: p.x, y: p.y }
                })
                .collect();
            GeoPolygon::new(LineString::new(coords), Vec::new())
        };

        let region: Vec<GeoPolygon<Real>> = self
            .polygons
            .iter()
            .filter(|p| {
                p.plane.normal().dot(&plane.normal()) > AXIS_ALIGNMENT
                    && p.vertices
                        .iter()
                        .all(|v| plane.signed_distance(&v.pos).abs() < COPLANAR_TOLERANCE)
            })
            .map(project)
            .collect();

        let merged = if region.len() <= 1 {
            MultiPolygon::new(vec![project(seed)])
        } else {
            match catch_unwind(AssertUnwindSafe(|| union_all(region))) {
                Ok(mp) if mp.unsigned_area() > 0.0 => mp,
                _ => {
                    debug!("cap union failed, keeping dominant polygon only");
                    MultiPolygon::new(vec![project(seed)])
                },
            }
        };

        let shape = clean_multipolygon(&merged).orient(Direction::Default);
        if shape.0.is_empty() {
            return None;
        }

        Some(Outline {
            plane,
            shape,
            to_local,
            to_world,
        })
    }
}

impl Outline {
    /// Wrap loops given in the local XY frame of `plane`.
    pub fn new(plane: Plane, shape: MultiPolygon<Real>) -> Self {
        let (to_local, to_world) = plane.to_xy_transform();
        Outline {
            plane,
            shape: shape.orient(Direction::Default),
            to_local,
            to_world,
        }
    }

    /// Enclosed area (holes subtracted).
    pub fn area(&self) -> Real {
        self.shape.unsigned_area()
    }

    /// Number of boundary loops, exterior and holes.
    pub fn loop_count(&self) -> usize {
        self.shape.0.iter().map(|p| 1 + p.interiors().len()).sum()
    }

    /// Sweep the loops along `direction` into a closed solid with outward normals.
    ///
    /// Both ends are capped with ear-cut triangles; every exterior and hole
    /// loop gets its own side wall.
    pub fn extrude<S: Clone + Debug + Send + Sync>(
        &self,
        direction: Vector3<Real>,
        metadata: Option<S>,
    ) -> Mesh<S> {
        let offset = self.to_local.transform_vector(&direction);
        if offset.z.abs() < EPSILON {
            return Mesh::new();
        }

        // built as if sweeping towards -Z, then flipped when it is not
        let mut local: Vec<Vec<Point3<Real>>> = Vec::new();
        for poly in &self.shape.0 {
            let outer = ring_points(poly.exterior());
            let holes: Vec<Vec<[Real; 2]>> = poly
                .interiors()
                .iter()
                .map(|ring| ring_points(ring).iter().map(|p| [p.x, p.y]).collect())
                .collect();
            let outer_2d: Vec<[Real; 2]> = outer.iter().map(|p| [p.x, p.y]).collect();
            let hole_refs: Vec<&[[Real; 2]]> = holes.iter().map(Vec::as_slice).collect();

            for tri in Mesh::<S>::triangulate_2d(&outer_2d, &hole_refs) {
                let [a, b, c] = tri;
                let ccw = (b - a).cross(&(c - a)).z > 0.0;
                let top = if ccw { vec![a, b, c] } else { vec![a, c, b] };
                let bottom: Vec<Point3<Real>> = top.iter().rev().map(|p| p + offset).collect();
                local.push(top);
                local.push(bottom);
            }

            let rings = std::iter::once(outer).chain(
                poly.interiors().iter().map(ring_points),
            );
            for ring in rings {
                let count = ring.len();
                for i in 0..count {
                    let a = ring[i];
                    let b = ring[(i + 1) % count];
                    local.push(vec![a, a + offset, b + offset, b]);
                }
            }
        }

        let polygons: Vec<Polygon<S>> = local
            .into_iter()
            .map(|points| {
                let vertices: Vec<Vertex> = points
                    .iter()
                    .map(|p| Vertex::new(self.to_world.transform_point(p), Vector3::zeros()))
                    .collect();
                let mut poly = Polygon::new(vertices, metadata.clone());
                if offset.z > 0.0 {
                    poly.flip();
                }
                poly.set_new_normal();
                poly
            })
            .filter(|p| !p.is_degenerate())
            .collect();

        let mut mesh = Mesh::from_polygons(&polygons);
        mesh.metadata = metadata;
        mesh
    }
}

/// Ring vertices without the closing duplicate.
fn ring_points(ring: &LineString<Real>) -> Vec<Point3<Real>> {
    let mut points: Vec<Point3<Real>> = ring.0.iter().map(|c| Point3::new(c.x, c.y, 0.0)).collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

/// Union polygons pairwise in a balanced tree.
fn union_all(polygons: Vec<GeoPolygon<Real>>) -> MultiPolygon<Real> {
    let mut layer: Vec<MultiPolygon<Real>> =
        polygons.into_iter().map(|p| MultiPolygon::new(vec![p])).collect();
    while layer.len() > 1 {
        let mut next = Vec::with_capacity(layer.len() / 2 + 1);
        let mut iter = layer.into_iter();
        while let Some(a) = iter.next() {
            match iter.next() {
                Some(b) => next.push(a.union(&b)),
                None => next.push(a),
            }
        }
        layer = next;
    }
    layer.pop().unwrap_or_else(|| MultiPolygon::new(Vec::new()))
}

/// Drop repeated and collinear vertices, then loops that enclose nothing.
fn clean_multipolygon(mp: &MultiPolygon<Real>) -> MultiPolygon<Real> {
    let polygons = mp
        .0
        .iter()
        .filter_map(|poly| {
            let exterior = clean_ring(poly.exterior())?;
            let interiors = poly.interiors().iter().filter_map(clean_ring).collect();
            Some(GeoPolygon::new(exterior, interiors))
        })
        .collect();
    MultiPolygon::new(polygons)
}

fn clean_ring(ring: &LineString<Real>) -> Option<LineString<Real>> {
    const MERGE: Real = 1e-9;

    let mut points: Vec<Coord<Real>> = Vec::with_capacity(ring.0.len());
    for &c in &ring.0 {
        if points.last().is_none_or(|p: &Coord<Real>| (p.x - c.x).hypot(p.y - c.y) > MERGE) {
            points.push(c);
        }
    }
    while points.len() > 1 {
        let (first, last) = (points[0], points[points.len() - 1]);
        if (first.x - last.x).hypot(first.y - last.y) > MERGE {
            break;
        }
        points.pop();
    }

    // collinear removal until stable
    let mut changed = true;
    while changed && points.len() >= 3 {
        changed = false;
        let n = points.len();
        for i in 0..n {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            let cross = (cur.x - prev.x) * (next.y - prev.y) - (cur.y - prev.y) * (next.x - prev.x);
            let span = (next.x - prev.x).hypot(next.y - prev.y);
            if cross.abs() <= MERGE * span.max(MERGE) {
                points.remove(i);
                changed = true;
                break;
            }
        }
    }

    if points.len() < 3 {
        return None;
    }
    let ring = LineString::new(points);
    let area = GeoPolygon::new(ring.clone(), Vec::new()).unsigned_area();
    (area > MERGE * MERGE).then_some(ring)
}

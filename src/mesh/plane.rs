//! Oriented planes and polygon splitting for the BSP tree.

use crate::float_types::{EPSILON, Real};
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::Vertex;
use nalgebra::{Isometry3, Matrix4, Point3, Rotation3, Translation3, Vector3};
use std::fmt::Debug;

// Plane classification constants
pub const COPLANAR: i8 = 0;
pub const FRONT: i8 = 1;
pub const BACK: i8 = 2;
pub const SPANNING: i8 = 3;

/// A plane in Hessian normal form: every point `p` on it satisfies `normal · p = w`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    /// Unit normal vector of the plane
    pub normal: Vector3<Real>,
    /// Distance from origin along normal
    pub w: Real,
}

impl Plane {
    /// Create a new plane from a (not necessarily unit) normal and offset.
    pub fn from_normal(normal: Vector3<Real>, w: Real) -> Self {
        let len = normal.norm();
        if len < Real::EPSILON {
            return Plane {
                normal: Vector3::z(),
                w: 0.0,
            };
        }
        Plane {
            normal: normal / len,
            w: w / len,
        }
    }

    /// Plane through `point` with the given normal.
    pub fn through_point(point: &Point3<Real>, normal: Vector3<Real>) -> Self {
        let n = normal.normalize();
        Plane {
            normal: n,
            w: n.dot(&point.coords),
        }
    }

    /// Best-fit plane of a polygon loop using Newell's method.
    ///
    /// Falls back to the XY plane for degenerate loops; callers are expected
    /// to discard those with [`Polygon::is_degenerate`].
    pub fn from_vertices(vertices: &[Vertex]) -> Self {
        let Some(normal) = newell_normal(vertices) else {
            return Plane {
                normal: Vector3::z(),
                w: 0.0,
            };
        };
        let centroid = vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + v.pos.coords)
            / vertices.len() as Real;
        Self::through_point(&Point3::from(centroid), normal)
    }

    pub const fn normal(&self) -> Vector3<Real> {
        self.normal
    }

    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    pub fn flipped(&self) -> Self {
        Plane {
            normal: -self.normal,
            w: -self.w,
        }
    }

    /// Signed distance of `point` from the plane, positive on the front side.
    #[inline]
    pub fn signed_distance(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.w
    }

    /// Classify a point as FRONT, BACK or COPLANAR within [`EPSILON`].
    #[inline]
    pub fn orient_point(&self, point: &Point3<Real>) -> i8 {
        let d = self.signed_distance(point);
        if d > EPSILON {
            FRONT
        } else if d < -EPSILON {
            BACK
        } else {
            COPLANAR
        }
    }

    /// Bitmask of the classes of every vertex of `polygon`.
    pub fn classify_polygon<S: Clone>(&self, polygon: &Polygon<S>) -> i8 {
        polygon
            .vertices
            .iter()
            .fold(COPLANAR, |acc, v| acc | self.orient_point(&v.pos))
    }

    /// Splits a polygon by this plane, returning four buckets:
    /// `(coplanar_front, coplanar_back, front, back)`.
    ///
    /// Coplanar polygons go to `coplanar_front` when they face the same way
    /// as the plane. Split halves keep the plane of the source polygon.
    #[allow(clippy::type_complexity)]
    pub fn split_polygon<S: Clone + Send + Sync + Debug>(
        &self,
        polygon: &Polygon<S>,
    ) -> (
        Vec<Polygon<S>>,
        Vec<Polygon<S>>,
        Vec<Polygon<S>>,
        Vec<Polygon<S>>,
    ) {
        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();

        let types: Vec<i8> = polygon
            .vertices
            .iter()
            .map(|v| self.orient_point(&v.pos))
            .collect();
        let polygon_type = types.iter().fold(COPLANAR, |acc, &t| acc | t);

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon.clone());
                } else {
                    coplanar_back.push(polygon.clone());
                }
            },
            FRONT => front.push(polygon.clone()),
            BACK => back.push(polygon.clone()),
            _ => {
                let count = polygon.vertices.len();
                let mut split_front = Vec::with_capacity(count + 1);
                let mut split_back = Vec::with_capacity(count + 1);

                for i in 0..count {
                    let j = (i + 1) % count;
                    let (type_i, type_j) = (types[i], types[j]);
                    let vertex_i = &polygon.vertices[i];
                    let vertex_j = &polygon.vertices[j];

                    if type_i != BACK {
                        split_front.push(vertex_i.clone());
                    }
                    if type_i != FRONT {
                        split_back.push(vertex_i.clone());
                    }

                    if (type_i | type_j) == SPANNING {
                        let denom = self.normal.dot(&(vertex_j.pos - vertex_i.pos));
                        if denom.abs() > Real::EPSILON {
                            let t = (self.w - self.normal.dot(&vertex_i.pos.coords)) / denom;
                            let vertex_new = vertex_i.interpolate(vertex_j, t);
                            split_front.push(vertex_new.clone());
                            split_back.push(vertex_new);
                        }
                    }
                }

                if split_front.len() >= 3 {
                    front.push(Polygon::with_plane(
                        split_front,
                        polygon.plane.clone(),
                        polygon.metadata.clone(),
                    ));
                }
                if split_back.len() >= 3 {
                    back.push(Polygon::with_plane(
                        split_back,
                        polygon.plane.clone(),
                        polygon.metadata.clone(),
                    ));
                }
            },
        }

        (coplanar_front, coplanar_back, front, back)
    }

    /// Returns (T, T_inv), where:
    /// - `T` maps a point on this plane into XY plane (z=0) with the plane's normal going to +Z
    /// - `T_inv` is the inverse transform, mapping back
    pub fn to_xy_transform(&self) -> (Matrix4<Real>, Matrix4<Real>) {
        let n = self.normal;
        let n_len = n.norm();
        if n_len < EPSILON {
            return (Matrix4::identity(), Matrix4::identity());
        }
        let norm_dir = n / n_len;

        // rotation_between is undefined for antiparallel vectors
        let rot = Rotation3::rotation_between(&norm_dir, &Vector3::z()).unwrap_or_else(|| {
            Rotation3::from_axis_angle(&Vector3::x_axis(), crate::float_types::PI)
        });
        let iso_rot = Isometry3::from_parts(Translation3::identity(), rot.into());

        let p0_3d = norm_dir * (self.w / n_len);
        let p0_rot = iso_rot.transform_point(&Point3::from(p0_3d));
        let iso_trans = Translation3::new(0.0, 0.0, -p0_rot.z);

        let transform_to_xy = iso_trans.to_homogeneous() * iso_rot.to_homogeneous();
        let transform_from_xy = transform_to_xy
            .try_inverse()
            .unwrap_or_else(Matrix4::identity);

        (transform_to_xy, transform_from_xy)
    }
}

/// Twice the area below which a loop is treated as having none.
const DEGENERATE_AREA: Real = 1e-18;

/// Newell normal of a closed loop, `None` when the loop encloses no area.
pub fn newell_normal(vertices: &[Vertex]) -> Option<Vector3<Real>> {
    if vertices.len() < 3 {
        return None;
    }
    let normal = vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .fold(Vector3::zeros(), |acc, (curr, next)| {
            acc + Vector3::new(
                (curr.pos.y - next.pos.y) * (curr.pos.z + next.pos.z),
                (curr.pos.z - next.pos.z) * (curr.pos.x + next.pos.x),
                (curr.pos.x - next.pos.x) * (curr.pos.y + next.pos.y),
            )
        });
    if !(normal.norm() > DEGENERATE_AREA) || !normal.iter().all(|c| c.is_finite()) {
        None
    } else {
        Some(normal)
    }
}

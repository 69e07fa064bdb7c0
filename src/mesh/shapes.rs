//! Primitive solids: boxes for cutting slabs and spheres for test input.

use crate::float_types::{PI, Real, TAU};
use crate::mesh::Mesh;
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::Vertex;
use crate::traits::CSGOps;
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;

impl<S: Clone + Debug + Send + Sync> Mesh<S> {
    /// Axis-aligned box spanning `[0, width] × [0, length] × [0, height]`.
    pub fn cuboid(width: Real, length: Real, height: Real, metadata: Option<S>) -> Mesh<S> {
        let p000 = Point3::new(0.0, 0.0, 0.0);
        let p100 = Point3::new(width, 0.0, 0.0);
        let p110 = Point3::new(width, length, 0.0);
        let p010 = Point3::new(0.0, length, 0.0);
        let p001 = Point3::new(0.0, 0.0, height);
        let p101 = Point3::new(width, 0.0, height);
        let p111 = Point3::new(width, length, height);
        let p011 = Point3::new(0.0, length, height);

        // counter-clockwise as seen from outside
        let faces: [([Point3<Real>; 4], Vector3<Real>); 6] = [
            ([p000, p010, p110, p100], -Vector3::z()),
            ([p001, p101, p111, p011], Vector3::z()),
            ([p000, p100, p101, p001], -Vector3::y()),
            ([p010, p011, p111, p110], Vector3::y()),
            ([p000, p001, p011, p010], -Vector3::x()),
            ([p100, p110, p111, p101], Vector3::x()),
        ];

        let polygons: Vec<Polygon<S>> = faces
            .iter()
            .map(|(corners, normal)| {
                Polygon::new(
                    corners.iter().map(|&p| Vertex::new(p, *normal)).collect(),
                    metadata.clone(),
                )
            })
            .collect();

        let mut mesh = Mesh::from_polygons(&polygons);
        mesh.metadata = metadata;
        mesh
    }

    /// Axis-aligned box of full extents `size` centered on `center`.
    pub fn slab(center: Point3<Real>, size: Vector3<Real>, metadata: Option<S>) -> Mesh<S> {
        Mesh::cuboid(size.x, size.y, size.z, metadata).translate_vector(
            center.coords - size * 0.5,
        )
    }

    /// Axis-aligned box spanning two corners.
    pub fn slab_between(mins: Point3<Real>, maxs: Point3<Real>, metadata: Option<S>) -> Mesh<S> {
        let size = maxs - mins;
        Mesh::cuboid(size.x, size.y, size.z, metadata).translate_vector(mins.coords)
    }

    /// UV sphere centered on the origin, `segments` around and `stacks` from pole to pole.
    pub fn sphere(radius: Real, segments: usize, stacks: usize, metadata: Option<S>) -> Mesh<S> {
        let segments = segments.max(3);
        let stacks = stacks.max(2);
        let mut polygons = Vec::with_capacity(segments * stacks);

        let vertex = |theta: Real, phi: Real| {
            let dir = Vector3::new(theta.cos() * phi.sin(), phi.cos(), theta.sin() * phi.sin());
            Vertex::new(Point3::from(dir * radius), dir)
        };

        for i in 0..segments {
            for j in 0..stacks {
                let theta0 = i as Real / segments as Real * TAU;
                let theta1 = (i + 1) as Real / segments as Real * TAU;
                let phi0 = j as Real / stacks as Real * PI;
                let phi1 = (j + 1) as Real / stacks as Real * PI;

                let mut vertices = Vec::with_capacity(4);
                vertices.push(vertex(theta0, phi0));
                if j > 0 {
                    vertices.push(vertex(theta1, phi0));
                }
                if j < stacks - 1 {
                    vertices.push(vertex(theta1, phi1));
                }
                vertices.push(vertex(theta0, phi1));

                polygons.push(Polygon::new(vertices, metadata.clone()));
            }
        }

        let mut mesh = Mesh::from_polygons(&polygons);
        mesh.metadata = metadata;
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cuboid_faces_point_outward() {
        let cube: Mesh<()> = Mesh::cuboid(1.0, 1.0, 1.0, None);
        let center = Point3::new(0.5, 0.5, 0.5);
        for poly in &cube.polygons {
            let outward = poly.centroid() - center;
            assert!(poly.plane.normal().dot(&outward) > 0.0);
        }
    }

    #[test]
    fn slab_is_centered() {
        let slab: Mesh<()> =
            Mesh::slab(Point3::new(1.0, 2.0, 3.0), Vector3::new(0.2, 4.0, 6.0), None);
        let bb = slab.bounding_box();
        assert_relative_eq!(bb.center(), Point3::new(1.0, 2.0, 3.0), epsilon = 1e-12);
        assert_relative_eq!(bb.extents(), Vector3::new(0.2, 4.0, 6.0), epsilon = 1e-12);
    }

    #[test]
    fn sphere_volume_approaches_analytic() {
        let sphere: Mesh<()> = Mesh::sphere(1.0, 48, 24, None);
        let exact = 4.0 / 3.0 * PI;
        let vol = sphere.signed_volume();
        assert!(vol > 0.0);
        assert!((vol - exact).abs() / exact < 0.02);
    }
}

//! Struct and functions for working with `Vertex`s from which `Polygon`s are composed.

use crate::float_types::Real;
use nalgebra::{Point3, Vector3};

/// Positions closer than `1 / QUANTIZATION_FACTOR` share a [`PositionKey`].
pub const QUANTIZATION_FACTOR: Real = 1e7;

/// Integer lattice key of a position, used to weld and connect polygons.
pub type PositionKey = (i64, i64, i64);

/// A vertex of a polygon, holding position and normal.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub pos: Point3<Real>,
    pub normal: Vector3<Real>,
}

impl Vertex {
    /// Create a new [`Vertex`].
    ///
    /// * `pos`    – the position in model space
    /// * `normal` – (optionally non‑unit) normal, stored verbatim
    pub const fn new(pos: Point3<Real>, normal: Vector3<Real>) -> Self {
        Vertex { pos, normal }
    }

    /// Flip vertex normal
    pub fn flip(&mut self) {
        self.normal = -self.normal;
    }

    /// Return the linear interpolation between `self` (`t = 0`) and `other` (`t = 1`).
    pub fn interpolate(&self, other: &Vertex, t: Real) -> Vertex {
        let new_pos = self.pos + (other.pos - self.pos) * t;
        let new_normal = self.normal + (other.normal - self.normal) * t;
        Vertex::new(new_pos, new_normal)
    }

    pub fn is_finite(&self) -> bool {
        self.pos.iter().all(|c| c.is_finite())
    }

    /// Lattice key of this vertex position.
    pub fn key(&self) -> PositionKey {
        position_key(&self.pos)
    }
}

/// Quantize a position onto the welding lattice.
pub fn position_key(p: &Point3<Real>) -> PositionKey {
    (
        (p.x * QUANTIZATION_FACTOR).round() as i64,
        (p.y * QUANTIZATION_FACTOR).round() as i64,
        (p.z * QUANTIZATION_FACTOR).round() as i64,
    )
}

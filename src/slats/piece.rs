//! Slat identities and the solids that carry them.

use crate::float_types::Real;
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::kernel::SlatMesh;
use crate::traits::CSGOps;
use nalgebra::Vector3;
use std::fmt;

/// Slicing axis of a slat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Coordinate index of the axis.
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }

    pub const fn other(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    pub fn unit(self) -> Vector3<Real> {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
        }
    }

    pub const fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
        }
    }
}

/// `(axis, slice, component)`, displayed as `Piece_X_3_0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId {
    pub axis: Axis,
    pub slice: usize,
    pub component: usize,
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Piece_{}_{}_{}", self.axis.letter(), self.slice, self.component)
    }
}

/// One flat slat of material thickness.
#[derive(Debug, Clone)]
pub struct Piece {
    pub id: PieceId,
    pub mesh: SlatMesh,
    /// Outward normal of the outline the slat was extruded from.
    pub normal: Vector3<Real>,
}

impl Piece {
    pub fn new(id: PieceId, mesh: SlatMesh, normal: Vector3<Real>) -> Self {
        Piece { id, mesh, normal }
    }

    pub const fn axis(&self) -> Axis {
        self.id.axis
    }

    /// World-space bounds of the current geometry.
    pub fn bounds(&self) -> Aabb {
        self.mesh.bounding_box()
    }

    /// Extent along the slicing axis.
    pub fn thickness(&self) -> Real {
        self.bounds().extents()[self.axis().index()]
    }

    /// Swap in new geometry.
    pub fn replace_mesh(&mut self, mesh: SlatMesh) {
        self.mesh = mesh;
    }
}

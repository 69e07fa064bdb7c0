//! Bounding-box overlap between two pieces and the contact rules built on it.
//!
//! Z is the joint axis throughout: slats stand upright and meet along
//! vertical lines, so "in-plane" means the X and Y extents of the overlap.

use crate::float_types::Real;
use crate::float_types::parry3d::bounding_volume::Aabb;
use nalgebra::{Point3, Vector3};

/// Vertical overlap, relative to material thickness, a contact needs while
/// trimming and jointing.
pub const CONTACT_HEIGHT_RATIO: Real = 0.02;

/// Looser vertical ratio for the final neighbor check, after joints have
/// thinned the contact area.
pub const NEIGHBOR_HEIGHT_RATIO: Real = 0.01;

/// Intersection of two boxes. Extents go negative when the boxes are apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap {
    pub mins: Point3<Real>,
    pub maxs: Point3<Real>,
}

impl Overlap {
    /// Overlap of `a` and `b`; symmetric in its arguments.
    pub fn between(a: &Aabb, b: &Aabb) -> Self {
        Overlap {
            mins: a.mins.sup(&b.mins),
            maxs: a.maxs.inf(&b.maxs),
        }
    }

    pub fn extents(&self) -> Vector3<Real> {
        self.maxs - self.mins
    }

    /// Overlap along the joint (Z) axis.
    pub fn height(&self) -> Real {
        self.maxs.z - self.mins.z
    }

    /// Center of the overlap in the XY plane.
    pub fn center_xy(&self) -> (Real, Real) {
        (
            (self.mins.x + self.maxs.x) * 0.5,
            (self.mins.y + self.maxs.y) * 0.5,
        )
    }
}

/// Minimum overlaps for two pieces to count as touching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactThresholds {
    /// Required overlap along both X and Y, exclusive.
    pub in_plane: Real,
    /// Required overlap along Z, exclusive.
    pub vertical: Real,
}

impl ContactThresholds {
    /// Rule for trimming and jointing.
    pub fn contact(clearance: Real, thickness: Real) -> Self {
        ContactThresholds {
            in_plane: clearance,
            vertical: thickness * CONTACT_HEIGHT_RATIO,
        }
    }

    /// Rule for the floating-piece filter.
    pub fn neighbor(clearance: Real, thickness: Real) -> Self {
        ContactThresholds {
            in_plane: clearance,
            vertical: thickness * NEIGHBOR_HEIGHT_RATIO,
        }
    }

    pub fn in_plane_ok(&self, overlap: &Overlap) -> bool {
        let e = overlap.extents();
        e.x > self.in_plane && e.y > self.in_plane
    }

    pub fn admits(&self, overlap: &Overlap) -> bool {
        self.in_plane_ok(overlap) && overlap.height() > self.vertical
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn aabb(mins: [Real; 3], maxs: [Real; 3]) -> Aabb {
        Aabb::new(Point3::from(mins), Point3::from(maxs))
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = aabb([0.0, 0.0, 0.0], [0.003, 0.2, 0.1]);
        let b = aabb([-0.1, 0.05, 0.02], [0.1, 0.053, 0.3]);
        assert_eq!(Overlap::between(&a, &b), Overlap::between(&b, &a));
        let o = Overlap::between(&a, &b);
        assert_relative_eq!(o.extents(), Vector3::new(0.003, 0.003, 0.08), epsilon = 1e-12);
    }

    #[test]
    fn thresholds_are_exclusive() {
        let t = 0.003;
        let rule = ContactThresholds::contact(0.00005, t);
        let a = aabb([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let just = aabb([0.0, 0.0, 1.0 - t * 0.015], [1.0, 1.0, 2.0]);
        assert!(!rule.admits(&Overlap::between(&a, &just)));
        assert!(ContactThresholds::neighbor(0.00005, t).admits(&Overlap::between(&a, &just)));

        let apart = aabb([2.0, 0.0, 0.0], [3.0, 1.0, 1.0]);
        assert!(!rule.admits(&Overlap::between(&a, &apart)));
    }
}

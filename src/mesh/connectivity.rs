//! Loose-part detection: splitting a polygon soup into connected shells.

use crate::mesh::Mesh;
use crate::mesh::vertex::PositionKey;
use crate::traits::CSGOps;
use hashbrown::HashMap;
use std::fmt::Debug;

/// Disjoint-set forest over polygon indices.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        UnionFind {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            },
        }
    }
}

impl<S: Clone + Debug + Send + Sync> Mesh<S> {
    /// Split into loose parts: polygons sharing a (quantized) vertex position
    /// belong to the same part.
    ///
    /// Parts are returned in order of their first polygon.
    pub fn connected_components(&self) -> Vec<Mesh<S>> {
        let count = self.polygons.len();
        if count == 0 {
            return Vec::new();
        }

        let mut sets = UnionFind::new(count);
        let mut first_owner: HashMap<PositionKey, usize> = HashMap::new();
        for (index, poly) in self.polygons.iter().enumerate() {
            for v in &poly.vertices {
                let owner = *first_owner.entry(v.key()).or_insert(index);
                sets.union(owner, index);
            }
        }

        let mut part_of_root: HashMap<usize, usize> = HashMap::new();
        let mut parts: Vec<Mesh<S>> = Vec::new();
        for (index, poly) in self.polygons.iter().enumerate() {
            let root = sets.find(index);
            let part = *part_of_root.entry(root).or_insert_with(|| {
                let mut part = Mesh::new();
                part.metadata = self.metadata.clone();
                parts.push(part);
                parts.len() - 1
            });
            parts[part].polygons.push(poly.clone());
        }
        parts
    }

    /// The loose part with the most surface area, if any.
    pub fn largest_component(&self) -> Option<Mesh<S>> {
        self.connected_components()
            .into_iter()
            .max_by(|a, b| a.surface_area().total_cmp(&b.surface_area()))
    }

    /// Drop degenerate polygons and any part whose surface area is negligible
    /// next to the largest one.
    pub fn delete_loose(&self, relative_threshold: crate::float_types::Real) -> Mesh<S> {
        let cleaned = self.without_degenerate();
        let parts = cleaned.connected_components();
        let Some(max_area) = parts
            .iter()
            .map(Mesh::surface_area)
            .max_by(|a, b| a.total_cmp(b))
        else {
            return cleaned;
        };
        let kept: Vec<&Mesh<S>> = parts
            .iter()
            .filter(|p| p.surface_area() >= max_area * relative_threshold)
            .collect();
        let mut mesh = Mesh::merge(kept);
        mesh.metadata = self.metadata.clone();
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn two_disjoint_boxes_are_two_components() {
        let a: Mesh<()> = Mesh::cuboid(1.0, 1.0, 1.0, None);
        let b = a.translate(3.0, 0.0, 0.0);
        let both = Mesh::merge([&a, &b]);
        let parts = both.connected_components();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].polygons.len(), 6);
        assert_relative_eq!(parts[1].bounding_box().mins.x, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn delete_loose_drops_debris() {
        let body: Mesh<()> = Mesh::cuboid(1.0, 1.0, 1.0, None);
        let chip = Mesh::cuboid(0.01, 0.01, 0.01, None).translate(5.0, 5.0, 5.0);
        let cleaned = Mesh::merge([&body, &chip]).delete_loose(0.001);
        assert_eq!(cleaned.polygons.len(), 6);
        assert_relative_eq!(cleaned.bounding_box().maxs.x, 1.0, epsilon = 1e-12);
    }
}

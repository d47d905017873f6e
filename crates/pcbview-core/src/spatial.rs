use std::fmt;

use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::{BBox, Vec2};

/// An entry in the R-tree spatial index.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialEntry {
    /// Position in paint order within the owning layer.
    pub order: usize,
    /// Bounding box of the painted item, with its context.
    pub bbox: BBox,
}

impl RTreeObject for SpatialEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bbox.x, self.bbox.y],
            [self.bbox.x + self.bbox.w, self.bbox.y + self.bbox.h],
        )
    }
}

/// Spatial index for point picking and viewport culling.
pub struct SpatialIndex {
    tree: RTree<SpatialEntry>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
        }
    }

    /// Build the index from a list of boxes in paint order.
    pub fn build(boxes: &[BBox]) -> Self {
        let entries = boxes
            .iter()
            .enumerate()
            .map(|(order, bbox)| SpatialEntry { order, bbox: *bbox })
            .collect::<Vec<_>>();
        log::trace!("bulk loading {} boxes", entries.len());
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Find all entries whose box lies within `tolerance` of `point`, topmost
    /// (last painted) first.
    pub fn query_point(&self, point: &Vec2, tolerance: f64) -> Vec<&SpatialEntry> {
        let t = tolerance.max(0.0);
        let envelope = AABB::from_corners([point.x - t, point.y - t], [point.x + t, point.y + t]);
        let mut hits: Vec<&SpatialEntry> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .collect();
        hits.sort_by(|a, b| b.order.cmp(&a.order));
        hits
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("len", &self.len())
            .finish()
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

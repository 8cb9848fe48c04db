//! Choropleth layer: joins boundary features to region summaries.

use crate::color::{ColorScale, Rgb};
use crate::names::CanonicalNameMap;
use crate::store::Snapshot;
use crate::types::{Boundary, RegionSummary};
use geo::{BoundingRect, Contains, Point};
use rstar::{RTree, RTreeObject, AABB};
use serde::Serialize;

// Wrapper for RTree indexing
struct FeatureIndex {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for FeatureIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// Fill for one boundary feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureFill {
    pub name: String,
    pub canonical: String,
    pub fill: Rgb,
    /// `None` when the store has no summary for the region
    pub total: Option<u64>,
}

/// What the map shows when the pointer is over a feature.
#[derive(Debug, Clone, Serialize)]
pub struct HoverDetail {
    pub name: String,
    pub canonical: String,
    #[serde(rename = "crimeData")]
    pub summary: Option<RegionSummary>,
}

pub struct RegionLayer {
    boundaries: Vec<Boundary>,
    tree: RTree<FeatureIndex>,
}

impl RegionLayer {
    pub fn new(boundaries: Vec<Boundary>) -> Self {
        let items: Vec<FeatureIndex> = boundaries
            .iter()
            .enumerate()
            .filter_map(|(i, boundary)| {
                // Empty geometry has no extent and can never be hit.
                let rect = boundary.geometry.bounding_rect()?;
                Some(FeatureIndex {
                    index: i,
                    aabb: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
                })
            })
            .collect();

        RegionLayer {
            boundaries,
            tree: RTree::bulk_load(items),
        }
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Fill color of every feature, in boundary file order.
    pub fn fills(&self, snapshot: &Snapshot, names: &CanonicalNameMap, scale: &ColorScale) -> Vec<FeatureFill> {
        self.boundaries
            .iter()
            .map(|boundary| {
                let canonical = names.resolve(&boundary.name);
                let total = snapshot.summary(canonical).map(|s| s.total);
                FeatureFill {
                    name: boundary.name.clone(),
                    canonical: canonical.to_string(),
                    fill: scale.fill(total, snapshot.domain_max()),
                    total,
                }
            })
            .collect()
    }

    /// The feature containing `(lon, lat)`, with its summary if any.
    pub fn hover(&self, snapshot: &Snapshot, names: &CanonicalNameMap, lon: f64, lat: f64) -> Option<HoverDetail> {
        let point = Point::new(lon, lat);
        let envelope = AABB::from_point([lon, lat]);

        let boundary = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|candidate| self.boundaries.get(candidate.index))
            .find(|boundary| boundary.geometry.contains(&point))?;

        let canonical = names.resolve(&boundary.name);
        Some(HoverDetail {
            name: boundary.name.clone(),
            canonical: canonical.to_string(),
            summary: snapshot.summary(canonical).cloned(),
        })
    }
}

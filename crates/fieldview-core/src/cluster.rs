//! Grid-based spatial deduplication of samples.
//!
//! Every sample is snapped to a square grid of `factor` degrees. Samples sharing
//! a grid cell collapse into one point located at the snapped cell coordinate
//! (not the centroid of its members) carrying the mean of their values. This
//! bounds the number of tessellation cells regardless of raw sample density.

use std::collections::BTreeMap;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, Result};
use crate::geo::LatLng;
use crate::sample::Sample;

/// Integer grid cell a coordinate snaps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterKey {
    pub lat_cell: i64,
    pub lng_cell: i64,
}

impl ClusterKey {
    pub fn of(lat: f64, lng: f64, factor: f64) -> Self {
        Self { lat_cell: snap(lat / factor), lng_cell: snap(lng / factor) }
    }

    /// The snapped grid coordinate.
    pub fn representative(&self, factor: f64) -> LatLng {
        LatLng::new(self.lat_cell as f64 * factor, self.lng_cell as f64 * factor)
    }
}

/// Round half up, so that `-2.5` snaps to `-2` like `2.5` snaps to `3`.
fn snap(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Samples accumulated into one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterGroup {
    pub representative: LatLng,
    pub values: Vec<f64>,
}

impl ClusterGroup {
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Arithmetic mean, summed in ascending order so the result does not depend
    /// on input order.
    pub fn mean(&self) -> f64 {
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        sorted.iter().sum::<f64>() / sorted.len() as f64
    }
}

/// One point per occupied grid cell; the unit fed to tessellation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusteredSample {
    pub lat: f64,
    pub lng: f64,
    pub value: f64,
}

impl ClusteredSample {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// All groups of one clustering pass, ordered by key.
#[derive(Debug, Clone)]
pub struct ClusterGroups {
    groups: BTreeMap<ClusterKey, ClusterGroup>,
}

impl ClusterGroups {
    pub fn build(samples: &[Sample], factor: f64) -> Result<Self> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(OverlayError::InvalidConfig(format!(
                "simplification factor must be positive, got {factor}"
            )));
        }

        let mut groups: BTreeMap<ClusterKey, ClusterGroup> = BTreeMap::new();
        for s in samples {
            let key = ClusterKey::of(s.lat, s.lng, factor);
            groups
                .entry(key)
                .or_insert_with(|| ClusterGroup {
                    representative: key.representative(factor),
                    values: Vec::new(),
                })
                .values
                .push(s.value);
        }
        Ok(Self { groups })
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &ClusterKey) -> Option<&ClusterGroup> {
        self.groups.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClusterKey, &ClusterGroup)> {
        self.groups.iter()
    }

    /// Number of samples across all groups.
    pub fn total_count(&self) -> usize {
        self.groups.values().map(ClusterGroup::count).sum()
    }

    pub fn to_clustered(&self) -> Vec<ClusteredSample> {
        self.groups
            .values()
            .map(|g| ClusteredSample {
                lat: g.representative.lat,
                lng: g.representative.lng,
                value: g.mean(),
            })
            .collect()
    }
}

/// Cluster `samples` on a `factor`-degree grid.
pub fn cluster_samples(samples: &[Sample], factor: f64) -> Result<Vec<ClusteredSample>> {
    let groups = ClusterGroups::build(samples, factor)?;
    let clustered = groups.to_clustered();
    info!(
        "created {} clustered points from {} original points",
        clustered.len(),
        samples.len()
    );
    Ok(clustered)
}

//! Subject Selector.
//!
//! Picks the cluster most likely to be the tracked person: the largest
//! non-noise cluster, provided it has at least `min_cluster_size` members.
//! When several clusters share the maximum size the one with the smallest
//! cluster id wins (ids follow the first core point in input order, see
//! [`crate::clustering`]).

use std::collections::BTreeMap;

use stagetrack_types::StagePoint;

use crate::clustering::ClusterLabel;

/// The selected cluster and its centroid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Subject {
    pub cluster_id: usize,
    /// Number of member points.
    pub size: usize,
    /// Arithmetic mean of the member points (metres).
    pub centroid: StagePoint,
}

/// Select the subject cluster from labelled points.
///
/// `points` and `labels` are index-aligned.  Returns `None` when there are
/// no clusters or the largest one is smaller than `min_cluster_size`.
pub fn select_subject(
    points: &[StagePoint],
    labels: &[ClusterLabel],
    min_cluster_size: usize,
) -> Option<Subject> {
    // cluster id → (count, Σx, Σy)
    let mut sums: BTreeMap<usize, (usize, f64, f64)> = BTreeMap::new();
    for (p, label) in points.iter().zip(labels) {
        if let Some(id) = label.cluster_id() {
            let entry = sums.entry(id).or_insert((0, 0.0, 0.0));
            entry.0 += 1;
            entry.1 += p.x_m;
            entry.2 += p.y_m;
        }
    }

    // Ascending id order plus a strict `>` keeps the smallest id on ties.
    let mut best: Option<(usize, (usize, f64, f64))> = None;
    for (id, acc) in sums {
        if best.is_none_or(|(_, b)| acc.0 > b.0) {
            best = Some((id, acc));
        }
    }

    let (cluster_id, (size, sx, sy)) = best?;
    if size < min_cluster_size {
        return None;
    }
    let n = size as f64;
    Some(Subject {
        cluster_id,
        size,
        centroid: StagePoint::new(sx / n, sy / n),
    })
}

//! Cluster Engine – density-based spatial clustering (DBSCAN).
//!
//! [`cluster`] is a pure function: same points and parameters in, same
//! labels out, with no hidden state.
//!
//! # Algorithm
//!
//! 1. For every point compute its `eps`-neighbourhood (Euclidean distance
//!    `≤ eps`, the point itself included).
//! 2. A point is a **core point** when its neighbourhood has at least
//!    `min_samples` members.
//! 3. Core points that are mutual neighbours are connected; each connected
//!    component of core points is one cluster.  Cluster ids are assigned in
//!    order of the lowest input index among a component's core points.
//! 4. A non-core point within `eps` of at least one core point is a
//!    **border point**.  It joins the cluster of its nearest core neighbour;
//!    exact distance ties go to the core neighbour with the smaller
//!    `(x, y)` coordinates.
//! 5. Everything else is [`ClusterLabel::Noise`].
//!
//! Steps 3 and 4 make membership independent of input order: reordering the
//! points may renumber clusters but never moves a point between them.
//!
//! Neighbourhoods are computed by brute force, O(n²).  A scan carries a few
//! hundred stage points, well within budget.
//!
//! # Example
//!
//! ```rust
//! use stagetrack_perception::clustering::{cluster, ClusterLabel};
//! use stagetrack_types::StagePoint;
//!
//! let points = vec![
//!     StagePoint::new(0.00, 0.0),
//!     StagePoint::new(0.05, 0.0),
//!     StagePoint::new(0.10, 0.0),
//!     StagePoint::new(2.00, 2.0),
//! ];
//! let labels = cluster(&points, 0.06, 2);
//! assert_eq!(labels[0], ClusterLabel::Cluster(0));
//! assert_eq!(labels[2], ClusterLabel::Cluster(0));
//! assert_eq!(labels[3], ClusterLabel::Noise);
//! ```

use std::cmp::Ordering;
use std::collections::VecDeque;

use stagetrack_types::StagePoint;

/// Per-point clustering result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterLabel {
    /// Reachable from no core point.
    Noise,
    /// Member of the cluster with the given id.
    Cluster(usize),
}

impl ClusterLabel {
    /// The cluster id, or `None` for noise.
    pub fn cluster_id(&self) -> Option<usize> {
        match self {
            ClusterLabel::Cluster(id) => Some(*id),
            ClusterLabel::Noise => None,
        }
    }

    pub fn is_noise(&self) -> bool {
        matches!(self, ClusterLabel::Noise)
    }
}

/// Label every point in `points` as a cluster member or noise.
///
/// The returned vector is index-aligned with `points`.  `eps` is the
/// neighbour radius in metres and `min_samples` the neighbourhood size
/// (self included) required for a core point.  Parameter validity is
/// checked by [`TrackerParams::validate`][crate::processor::TrackerParams::validate];
/// this function never fails.
pub fn cluster(points: &[StagePoint], eps: f64, min_samples: usize) -> Vec<ClusterLabel> {
    let n = points.len();
    let neighbours = neighbourhoods(points, eps);
    let is_core: Vec<bool> = neighbours.iter().map(|nb| nb.len() >= min_samples).collect();

    let mut labels = vec![ClusterLabel::Noise; n];
    let mut next_id = 0;

    // Connect core points.
    for seed in 0..n {
        if !is_core[seed] || !labels[seed].is_noise() {
            continue;
        }
        let id = next_id;
        next_id += 1;
        labels[seed] = ClusterLabel::Cluster(id);

        let mut queue = VecDeque::from([seed]);
        while let Some(i) = queue.pop_front() {
            for &j in &neighbours[i] {
                if is_core[j] && labels[j].is_noise() {
                    labels[j] = ClusterLabel::Cluster(id);
                    queue.push_back(j);
                }
            }
        }
    }

    // Attach border points to their nearest core neighbour.
    for i in 0..n {
        if is_core[i] {
            continue;
        }
        let nearest_core = neighbours[i]
            .iter()
            .copied()
            .filter(|&j| is_core[j])
            .min_by(|&a, &b| {
                let da = points[i].distance_sq(&points[a]);
                let db = points[i].distance_sq(&points[b]);
                da.total_cmp(&db)
                    .then_with(|| compare_coords(&points[a], &points[b]))
            });
        if let Some(j) = nearest_core {
            labels[i] = labels[j];
        }
    }

    labels
}

/// Number of distinct clusters in `labels`.
pub fn cluster_count(labels: &[ClusterLabel]) -> usize {
    labels
        .iter()
        .filter_map(ClusterLabel::cluster_id)
        .max()
        .map_or(0, |max| max + 1)
}

/// Index lists of each point's `eps`-neighbourhood, ascending, self included.
fn neighbourhoods(points: &[StagePoint], eps: f64) -> Vec<Vec<usize>> {
    let eps_sq = eps * eps;
    let n = points.len();
    let mut neighbours: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    if eps < 0.0 {
        return neighbours;
    }
    for i in 0..n {
        for j in (i + 1)..n {
            if points[i].distance_sq(&points[j]) <= eps_sq {
                neighbours[i].push(j);
                neighbours[j].push(i);
            }
        }
    }
    for nb in &mut neighbours {
        nb.sort_unstable();
    }
    neighbours
}

fn compare_coords(a: &StagePoint, b: &StagePoint) -> Ordering {
    a.x_m.total_cmp(&b.x_m).then_with(|| a.y_m.total_cmp(&b.y_m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    /// `count` points on a small ring around `(cx, cy)`.
    fn blob(cx: f64, cy: f64, count: usize, radius: f64) -> Vec<StagePoint> {
        (0..count)
            .map(|k| {
                let a = k as f64 / count as f64 * std::f64::consts::TAU;
                StagePoint::new(cx + radius * a.cos(), cy + radius * a.sin())
            })
            .collect()
    }

    /// Clusters as sets of point coordinates, independent of id numbering.
    fn partition(points: &[StagePoint], labels: &[ClusterLabel]) -> BTreeSet<Vec<(u64, u64)>> {
        let mut groups: std::collections::BTreeMap<usize, Vec<(u64, u64)>> = Default::default();
        for (p, l) in points.iter().zip(labels) {
            if let Some(id) = l.cluster_id() {
                groups
                    .entry(id)
                    .or_default()
                    .push((p.x_m.to_bits(), p.y_m.to_bits()));
            }
        }
        groups
            .into_values()
            .map(|mut g| {
                g.sort_unstable();
                g
            })
            .collect()
    }

    #[test]
    fn empty_input_yields_empty_labels() {
        assert!(cluster(&[], 0.25, 5).is_empty());
    }

    #[test]
    fn isolated_points_are_noise() {
        let pts = vec![
            StagePoint::new(-2.0, -2.0),
            StagePoint::new(0.0, 1.5),
            StagePoint::new(2.0, -1.0),
        ];
        let labels = cluster(&pts, 0.25, 5);
        assert!(labels.iter().all(ClusterLabel::is_noise));
        assert_eq!(cluster_count(&labels), 0);
    }

    #[test]
    fn two_separated_blobs_form_two_clusters() {
        let mut pts = blob(1.0, 0.5, 12, 0.05);
        pts.extend(blob(-1.5, -1.0, 7, 0.05));
        let labels = cluster(&pts, 0.25, 5);
        assert_eq!(cluster_count(&labels), 2);
        assert!(labels[..12].iter().all(|l| *l == ClusterLabel::Cluster(0)));
        assert!(labels[12..].iter().all(|l| *l == ClusterLabel::Cluster(1)));
    }

    #[test]
    fn min_samples_counts_the_point_itself() {
        // Three mutually close points: each neighbourhood has size 3.
        let pts = blob(0.0, 0.0, 3, 0.01);
        assert!(cluster(&pts, 0.1, 3).iter().all(|l| *l == ClusterLabel::Cluster(0)));
        assert!(cluster(&pts, 0.1, 4).iter().all(ClusterLabel::is_noise));
    }

    #[test]
    fn neighbour_radius_is_inclusive() {
        let pts = vec![StagePoint::new(0.0, 0.0), StagePoint::new(0.5, 0.0)];
        let labels = cluster(&pts, 0.5, 2);
        assert_eq!(labels, vec![ClusterLabel::Cluster(0); 2]);
    }

    #[test]
    fn border_point_joins_cluster_but_does_not_extend_it() {
        // Chain: a dense core group, one border point, then a far point that is
        // only reachable through the border point.
        let mut pts = vec![
            StagePoint::new(0.00, 0.0),
            StagePoint::new(0.01, 0.0),
            StagePoint::new(0.02, 0.0),
        ];
        pts.push(StagePoint::new(0.20, 0.0)); // border: only near index 2
        pts.push(StagePoint::new(0.40, 0.0)); // near the border point only
        let labels = cluster(&pts, 0.185, 3);
        assert_eq!(labels[3], ClusterLabel::Cluster(0));
        assert_eq!(labels[4], ClusterLabel::Noise);
    }

    #[test]
    fn shared_border_point_goes_to_nearest_core() {
        // Two core groups with a border point between them, closer to the right.
        let mut pts: Vec<StagePoint> = [-0.22, -0.32, -0.42, -0.52]
            .iter()
            .map(|&x| StagePoint::new(x, 0.0))
            .collect();
        pts.extend([0.20, 0.30, 0.40, 0.50].iter().map(|&x| StagePoint::new(x, 0.0)));
        pts.push(StagePoint::new(0.0, 0.0));
        let labels = cluster(&pts, 0.25, 4);
        assert_eq!(cluster_count(&labels), 2);
        assert_eq!(labels[8], labels[4]);
        assert_ne!(labels[8], labels[0]);

        // Same points, reversed: the border point still sides with the right group.
        let mut rev = pts.clone();
        rev.reverse();
        let rev_labels = cluster(&rev, 0.25, 4);
        assert_eq!(rev_labels[0], rev_labels[2]);
        assert_ne!(rev_labels[0], rev_labels[6]);
    }

    #[test]
    fn membership_is_invariant_under_reordering() {
        let mut pts = blob(1.0, 0.5, 20, 0.08);
        pts.extend(blob(-1.0, -1.0, 9, 0.1));
        pts.extend(blob(0.2, 0.5, 6, 0.04)); // close to the first blob
        pts.push(StagePoint::new(2.5, -2.5));
        let labels = cluster(&pts, 0.25, 5);

        let mut shuffled = pts.clone();
        shuffled.rotate_left(13);
        shuffled.swap(0, 30);
        shuffled.swap(4, 17);
        let shuffled_labels = cluster(&shuffled, 0.25, 5);

        let mut reversed = pts.clone();
        reversed.reverse();
        let reversed_labels = cluster(&reversed, 0.25, 5);

        let expected = partition(&pts, &labels);
        assert_eq!(partition(&shuffled, &shuffled_labels), expected);
        assert_eq!(partition(&reversed, &reversed_labels), expected);
    }

    #[test]
    fn cluster_ids_follow_first_core_point() {
        let mut pts = blob(-1.0, 0.0, 6, 0.05);
        pts.extend(blob(1.0, 0.0, 6, 0.05));
        let labels = cluster(&pts, 0.25, 3);
        assert_eq!(labels[0], ClusterLabel::Cluster(0));
        assert_eq!(labels[6], ClusterLabel::Cluster(1));

        pts.rotate_left(6);
        let labels = cluster(&pts, 0.25, 3);
        assert_eq!(labels[0], ClusterLabel::Cluster(0));
        assert!((pts[0].x_m - 1.0).abs() < 0.1);
    }
}

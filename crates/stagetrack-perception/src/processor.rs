//! [`ScanProcessor`] – the stateless per-scan chain.
//!
//! ```text
//! Scan ─► filter_scan ─► cluster ─► select_subject ─► normalize ─► Option<NormalizedPosition>
//! ```
//!
//! Parameters are validated once, in [`ScanProcessor::new`]; afterwards
//! [`ScanProcessor::process`] cannot fail.  Anything that goes wrong inside a
//! scan degrades to "no detection" for that scan only.
//!
//! # Example
//!
//! ```rust
//! use stagetrack_perception::processor::{ScanProcessor, TrackerParams};
//! use stagetrack_types::Scan;
//!
//! let processor = ScanProcessor::new(TrackerParams::default()).unwrap();
//! let outcome = processor.process(&Scan::default());
//! assert!(outcome.position.is_none());
//! ```

use serde::{Deserialize, Serialize};
use stagetrack_types::{NormalizedPosition, Scan, TrackError};
use tracing::debug;

use crate::clustering::{ClusterLabel, cluster, cluster_count};
use crate::geometry::{RangeWindow, StageGeometry, filter_scan};
use crate::normalize::normalize;
use crate::selector::{Subject, select_subject};

// ────────────────────────────────────────────────────────────────────────────
// Parameters
// ────────────────────────────────────────────────────────────────────────────

/// DBSCAN and subject-size parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Neighbour radius (metres).
    pub eps: f64,
    /// Neighbourhood size, self included, that makes a core point.
    pub min_samples: usize,
    /// Minimum member count for a cluster to count as the person.
    pub min_cluster_size_for_person: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            eps: 0.25,
            min_samples: 5,
            min_cluster_size_for_person: 8,
        }
    }
}

/// Every constant the tracking core consumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerParams {
    pub stage: StageGeometry,
    pub range: RangeWindow,
    pub clustering: ClusterParams,
    /// Minimum displacement (normalized units) that moves the active position.
    pub movement_threshold: f64,
}

impl Default for TrackerParams {
    /// A 6 × 6 m stage and a sensor range of 20 cm – 4.5 m.
    fn default() -> Self {
        Self {
            stage: StageGeometry::new(6.0, 6.0),
            range: RangeWindow::new(200.0, 4500.0),
            clustering: ClusterParams::default(),
            movement_threshold: 0.02,
        }
    }
}

impl TrackerParams {
    /// Reject parameter sets the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::InvalidConfig`] naming the first offending value.
    pub fn validate(&self) -> Result<(), TrackError> {
        fn positive(name: &str, v: f64) -> Result<(), TrackError> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(TrackError::InvalidConfig(format!(
                    "{name} must be a positive finite number (got {v})"
                )))
            }
        }

        positive("stage width", self.stage.width_m)?;
        positive("stage height", self.stage.height_m)?;
        positive("eps", self.clustering.eps)?;

        let range = &self.range;
        if !(range.min_mm.is_finite() && range.min_mm >= 0.0) {
            return Err(TrackError::InvalidConfig(format!(
                "min distance must be a non-negative finite number (got {})",
                range.min_mm
            )));
        }
        if !(range.max_mm.is_finite() && range.max_mm > range.min_mm) {
            return Err(TrackError::InvalidConfig(format!(
                "max distance ({}) must be greater than min distance ({})",
                range.max_mm, range.min_mm
            )));
        }
        if self.clustering.min_samples == 0 {
            return Err(TrackError::InvalidConfig("min_samples must be at least 1".into()));
        }
        if self.clustering.min_cluster_size_for_person == 0 {
            return Err(TrackError::InvalidConfig(
                "min_cluster_size_for_person must be at least 1".into(),
            ));
        }
        if !(self.movement_threshold.is_finite() && self.movement_threshold >= 0.0) {
            return Err(TrackError::InvalidConfig(format!(
                "movement threshold must be a non-negative finite number (got {})",
                self.movement_threshold
            )));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Outcome
// ────────────────────────────────────────────────────────────────────────────

/// Everything one scan produced, for logging and inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    /// Samples in the raw scan.
    pub raw_samples: usize,
    /// Points that survived the geometry filter.
    pub stage_points: usize,
    /// Distinct clusters found.
    pub clusters: usize,
    /// Points labelled as noise.
    pub noise_points: usize,
    /// The selected subject cluster, if any qualified.
    pub subject: Option<Subject>,
    /// The subject's normalized position; `None` means no detection.
    pub position: Option<NormalizedPosition>,
}

// ────────────────────────────────────────────────────────────────────────────
// ScanProcessor
// ────────────────────────────────────────────────────────────────────────────

/// Runs the geometry filter, cluster engine, subject selector and
/// normalizer on one scan.  Holds no cross-scan state.
#[derive(Debug, Clone)]
pub struct ScanProcessor {
    params: TrackerParams,
}

impl ScanProcessor {
    /// Validate `params` and build a processor.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::InvalidConfig`] if `params` fail
    /// [`TrackerParams::validate`].
    pub fn new(params: TrackerParams) -> Result<Self, TrackError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    /// Process one scan.
    pub fn process(&self, scan: &Scan) -> ScanOutcome {
        let p = &self.params;
        let points = filter_scan(scan, &p.stage, &p.range);
        if points.is_empty() {
            debug!(raw = scan.len(), "no stage points in scan");
            return ScanOutcome {
                raw_samples: scan.len(),
                stage_points: 0,
                clusters: 0,
                noise_points: 0,
                subject: None,
                position: None,
            };
        }

        let labels = cluster(&points, p.clustering.eps, p.clustering.min_samples);
        let subject = select_subject(&points, &labels, p.clustering.min_cluster_size_for_person);
        let position = subject.map(|s| normalize(&s.centroid, &p.stage));

        let outcome = ScanOutcome {
            raw_samples: scan.len(),
            stage_points: points.len(),
            clusters: cluster_count(&labels),
            noise_points: labels.iter().filter(|l| **l == ClusterLabel::Noise).count(),
            subject,
            position,
        };
        debug!(
            raw = outcome.raw_samples,
            points = outcome.stage_points,
            clusters = outcome.clusters,
            noise = outcome.noise_points,
            subject_size = outcome.subject.map(|s| s.size),
            "scan processed"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagetrack_types::RawSample;

    /// Raw samples for `count` points on a ring of `radius` around `(cx, cy)`.
    fn ring_samples(cx: f64, cy: f64, count: usize, radius: f64) -> Vec<RawSample> {
        (0..count)
            .map(|k| {
                let a = k as f64 / count as f64 * std::f64::consts::TAU;
                let x = cx + radius * a.cos();
                let y = cy + radius * a.sin();
                RawSample::new(y.atan2(x).to_degrees(), x.hypot(y) * 1000.0)
            })
            .collect()
    }

    fn processor() -> ScanProcessor {
        ScanProcessor::new(TrackerParams::default()).unwrap()
    }

    #[test]
    fn default_params_are_valid() {
        assert!(TrackerParams::default().validate().is_ok());
    }

    #[test]
    fn tight_cluster_is_detected_and_normalized() {
        let scan = Scan::new(ring_samples(1.0, 0.5, 20, 0.05));
        let outcome = processor().process(&scan);

        assert_eq!(outcome.stage_points, 20);
        assert_eq!(outcome.clusters, 1);
        let subject = outcome.subject.expect("subject");
        assert_eq!(subject.size, 20);
        assert!((subject.centroid.x_m - 1.0).abs() < 1e-6);
        assert!((subject.centroid.y_m - 0.5).abs() < 1e-6);

        let pos = outcome.position.expect("position");
        assert!((pos.x - 0.6667).abs() < 1e-4);
        assert!((pos.y - 0.5833).abs() < 1e-4);
    }

    #[test]
    fn stray_points_are_noise_and_yield_no_detection() {
        let scan = Scan::new(vec![
            RawSample::new(10.0, 1000.0),
            RawSample::new(130.0, 2000.0),
            RawSample::new(250.0, 1500.0),
        ]);
        let outcome = processor().process(&scan);
        assert_eq!(outcome.stage_points, 3);
        assert_eq!(outcome.clusters, 0);
        assert_eq!(outcome.noise_points, 3);
        assert!(outcome.position.is_none());
    }

    #[test]
    fn empty_filtered_scan_yields_no_detection() {
        // Everything too close or too far.
        let scan = Scan::new(vec![RawSample::new(0.0, 50.0), RawSample::new(90.0, 9000.0)]);
        let outcome = processor().process(&scan);
        assert_eq!(outcome.raw_samples, 2);
        assert_eq!(outcome.stage_points, 0);
        assert!(outcome.position.is_none());
    }

    #[test]
    fn undersized_cluster_yields_no_detection() {
        // Six points: enough for a core (min_samples = 5) but below 8.
        let scan = Scan::new(ring_samples(-1.0, 1.0, 6, 0.05));
        let outcome = processor().process(&scan);
        assert_eq!(outcome.clusters, 1);
        assert!(outcome.subject.is_none());
        assert!(outcome.position.is_none());
    }

    #[test]
    fn person_beats_smaller_object() {
        let mut samples = ring_samples(-1.5, -1.0, 9, 0.05); // a chair leg group
        samples.extend(ring_samples(1.2, 1.8, 16, 0.12)); // the person
        let outcome = processor().process(&Scan::new(samples));
        assert_eq!(outcome.clusters, 2);
        let s = outcome.subject.unwrap();
        assert_eq!(s.size, 16);
        assert!((s.centroid.x_m - 1.2).abs() < 1e-6);
    }

    #[test]
    fn out_of_stage_returns_never_join_a_cluster() {
        // A dense wall segment just outside the stage plus the subject.
        let mut samples: Vec<RawSample> = (0..30)
            .map(|k| {
                let y = -0.75 + k as f64 * 0.05;
                let x: f64 = 3.05;
                RawSample::new(y.atan2(x).to_degrees(), x.hypot(y) * 1000.0)
            })
            .collect();
        samples.extend(ring_samples(0.5, 0.5, 10, 0.05));
        let outcome = processor().process(&Scan::new(samples));
        assert_eq!(outcome.stage_points, 10);
        assert_eq!(outcome.subject.unwrap().size, 10);
    }

    #[test]
    fn invalid_params_are_rejected() {
        let cases: [fn(&mut TrackerParams); 11] = [
            |p| p.clustering.eps = 0.0,
            |p| p.clustering.eps = -0.1,
            |p| p.clustering.eps = f64::NAN,
            |p| p.stage.width_m = 0.0,
            |p| p.stage.height_m = -6.0,
            |p| p.range.min_mm = -1.0,
            |p| p.range.max_mm = 200.0,
            |p| p.clustering.min_samples = 0,
            |p| p.clustering.min_cluster_size_for_person = 0,
            |p| p.movement_threshold = -0.01,
            |p| p.movement_threshold = f64::INFINITY,
        ];
        for mutate in cases {
            let mut params = TrackerParams::default();
            mutate(&mut params);
            let err = ScanProcessor::new(params).unwrap_err();
            assert!(matches!(err, TrackError::InvalidConfig(_)), "unexpected error: {err}");
        }
    }
}

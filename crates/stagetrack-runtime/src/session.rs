//! [`TrackingSession`] – one tracked subject, one tracker state.
//!
//! The session is the sole owner of its [`MotionStabilizer`].  Nothing about
//! tracking is process-wide: two sessions fed the same scans evolve
//! identically and independently.
//!
//! # Example
//!
//! ```rust
//! use stagetrack_perception::TrackerParams;
//! use stagetrack_runtime::session::TrackingSession;
//! use stagetrack_types::Scan;
//!
//! let mut session = TrackingSession::new(TrackerParams::default()).unwrap();
//!
//! // Nobody seen yet: nothing to publish.
//! assert_eq!(session.process_scan(&Scan::default()), None);
//! assert!(!session.state().is_armed());
//! ```

use stagetrack_perception::{
    MotionStabilizer, ScanOutcome, ScanProcessor, TrackerParams, TrackerState,
};
use stagetrack_types::{NormalizedPosition, Scan, TrackError};

/// Result of feeding one scan through a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStep {
    /// What the stateless pipeline saw in this scan.
    pub outcome: ScanOutcome,
    /// The position to publish this cycle, if any.
    pub emitted: Option<NormalizedPosition>,
}

/// Per-session pipeline: stateless scan processing plus stabilisation.
#[derive(Debug, Clone)]
pub struct TrackingSession {
    processor: ScanProcessor,
    stabilizer: MotionStabilizer,
}

impl TrackingSession {
    /// Start an unarmed session.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::InvalidConfig`] if `params` are invalid.  No
    /// scan is ever processed with bad parameters.
    pub fn new(params: TrackerParams) -> Result<Self, TrackError> {
        let stabilizer = MotionStabilizer::new(params.movement_threshold);
        Ok(Self {
            processor: ScanProcessor::new(params)?,
            stabilizer,
        })
    }

    pub fn params(&self) -> &TrackerParams {
        self.processor.params()
    }

    pub fn state(&self) -> &TrackerState {
        self.stabilizer.state()
    }

    /// Run one scan through the full pipeline and report everything.
    pub fn step(&mut self, scan: &Scan) -> SessionStep {
        let outcome = self.processor.process(scan);
        let emitted = self.stabilizer.update(outcome.position);
        SessionStep { outcome, emitted }
    }

    /// Run one scan and return only the position to publish.
    pub fn process_scan(&mut self, scan: &Scan) -> Option<NormalizedPosition> {
        self.step(scan).emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagetrack_types::RawSample;

    /// Raw samples for `count` points on a ring of `radius` around `(cx, cy)`.
    fn ring(cx: f64, cy: f64, count: usize, radius: f64) -> Scan {
        (0..count)
            .map(|k| {
                let a = k as f64 / count as f64 * std::f64::consts::TAU;
                let x = cx + radius * a.cos();
                let y = cy + radius * a.sin();
                RawSample::new(y.atan2(x).to_degrees(), x.hypot(y) * 1000.0)
            })
            .collect()
    }

    /// A ring wide enough to survive the 200 mm minimum range when centred
    /// near the sensor.
    fn subject_near_centre(cx: f64, cy: f64) -> Scan {
        ring(cx, cy, 40, 0.5)
    }

    fn stray_points() -> Scan {
        Scan::new(vec![
            RawSample::new(20.0, 1200.0),
            RawSample::new(160.0, 2100.0),
            RawSample::new(300.0, 900.0),
        ])
    }

    fn session() -> TrackingSession {
        TrackingSession::new(TrackerParams::default()).unwrap()
    }

    fn assert_close(p: NormalizedPosition, x: f64, y: f64) {
        assert!((p.x - x).abs() < 1e-6 && (p.y - y).abs() < 1e-6, "got {p:?}, want ({x}, {y})");
    }

    #[test]
    fn invalid_params_fail_at_construction() {
        let mut params = TrackerParams::default();
        params.clustering.eps = 0.0;
        assert!(matches!(
            TrackingSession::new(params),
            Err(TrackError::InvalidConfig(_))
        ));
    }

    #[test]
    fn tight_cluster_is_published_normalized() {
        let mut s = session();
        let step = s.step(&ring(1.0, 0.5, 20, 0.05));
        assert_eq!(step.outcome.clusters, 1);
        assert_eq!(step.outcome.subject.unwrap().size, 20);
        let p = step.emitted.unwrap();
        assert!((p.x - 0.6667).abs() < 1e-4);
        assert!((p.y - 0.5833).abs() < 1e-4);
    }

    #[test]
    fn stray_points_before_any_detection_publish_nothing() {
        let mut s = session();
        let step = s.step(&stray_points());
        assert_eq!(step.outcome.noise_points, 3);
        assert_eq!(step.emitted, None);
        assert!(!s.state().is_armed());
    }

    #[test]
    fn jitter_below_threshold_keeps_output() {
        let mut s = session();
        assert_close(s.process_scan(&subject_near_centre(0.0, 0.0)).unwrap(), 0.5, 0.5);
        // (0.03 m, 0.03 m) on a 6 m stage → (0.505, 0.505), ≈ 0.0071 away.
        assert_close(s.process_scan(&subject_near_centre(0.03, 0.03)).unwrap(), 0.5, 0.5);
        assert_close(s.state().last_active_position().unwrap(), 0.5, 0.5);
    }

    #[test]
    fn movement_above_threshold_updates_output() {
        let mut s = session();
        s.process_scan(&subject_near_centre(0.0, 0.0));
        // 0.18 m → 0.03 normalized.
        let p = s.process_scan(&subject_near_centre(0.18, 0.0)).unwrap();
        assert_close(p, 0.53, 0.5);
        assert_close(s.state().last_active_position().unwrap(), 0.53, 0.5);
    }

    #[test]
    fn lost_subject_holds_last_position() {
        let mut s = session();
        let first = s.process_scan(&ring(1.0, 0.5, 20, 0.05)).unwrap();
        assert_eq!(s.process_scan(&Scan::default()), Some(first));
        assert_eq!(s.process_scan(&stray_points()), Some(first));
    }

    #[test]
    fn sessions_do_not_share_state() {
        let mut a = session();
        let mut b = session();
        a.process_scan(&ring(1.0, 0.5, 20, 0.05));
        assert!(a.state().is_armed());
        assert!(!b.state().is_armed());
        assert_eq!(b.process_scan(&Scan::default()), None);
    }
}

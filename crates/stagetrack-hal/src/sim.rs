//! In-process LiDAR simulation for running the tracker without hardware.
//!
//! [`SimLidar`] ray-casts a full rotation from the stage centre against a
//! small scene:
//!
//! - the **subject**, a circle the size of a torso following a
//!   [`SubjectPath`];
//! - static **obstacles** (by default one thin pole, which shows up as a
//!   couple of stray returns);
//! - square **room walls**, placed outside the stage so that their returns
//!   are filtered away.
//!
//! Every scan is a pure function of its index, so runs are reproducible.
//!
//! # Example
//!
//! ```rust
//! use stagetrack_hal::sim::{SimLidar, SubjectPath};
//! use stagetrack_types::StagePoint;
//!
//! let lidar = SimLidar::new("sim-lidar")
//!     .with_subject(SubjectPath::Fixed(StagePoint::new(2.0, 0.0)));
//!
//! let scan = lidar.scan_at(0);
//! let forward = scan.samples.iter().find(|s| s.angle_deg == 0.0).unwrap();
//! assert!((forward.distance_mm - 1820.0).abs() < 1e-6);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use stagetrack_types::{RawSample, Scan, StagePoint, TrackError};
use tracing::debug;

use crate::scan_source::{ScanSource, scan_period};

/// Nominal time between scans used to advance the subject along its path.
const SIM_SCAN_INTERVAL_S: f64 = 0.1;
/// Returns farther than this are dropped, like a real sensor with no echo.
const SIM_MAX_RANGE_MM: f64 = 12_000.0;

// ────────────────────────────────────────────────────────────────────────────
// Scene
// ────────────────────────────────────────────────────────────────────────────

/// How the simulated subject moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubjectPath {
    /// Standing still at a stage position.
    Fixed(StagePoint),
    /// `x = ax·sin(wx·t)`, `y = ay·cos(wy·t)`, with `t` in seconds.
    Lissajous { ax: f64, ay: f64, wx: f64, wy: f64 },
}

impl SubjectPath {
    /// Subject centre at time `t` (seconds).
    pub fn position_at(&self, t: f64) -> StagePoint {
        match *self {
            SubjectPath::Fixed(p) => p,
            SubjectPath::Lissajous { ax, ay, wx, wy } => {
                StagePoint::new(ax * (wx * t).sin(), ay * (wy * t).cos())
            }
        }
    }
}

impl Default for SubjectPath {
    fn default() -> Self {
        SubjectPath::Lissajous {
            ax: 1.8,
            ay: 1.2,
            wx: 0.3,
            wy: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Circle {
    centre: StagePoint,
    radius: f64,
}

impl Circle {
    /// Distance along the unit ray `(dx, dy)` from the origin to the first
    /// intersection, if any.
    fn intersect(&self, dx: f64, dy: f64) -> Option<f64> {
        let b = dx * self.centre.x_m + dy * self.centre.y_m;
        let c = self.centre.x_m.powi(2) + self.centre.y_m.powi(2) - self.radius.powi(2);
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let t = b - disc.sqrt();
        (t > 0.0).then_some(t)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimLidar
// ────────────────────────────────────────────────────────────────────────────

/// A simulated 360° LiDAR sitting at the stage centre.
#[derive(Debug, Clone)]
pub struct SimLidar {
    id: String,
    resolution_deg: f64,
    scan_period: Option<Duration>,
    scan_limit: Option<u64>,
    subject: Option<SubjectPath>,
    subject_radius_m: f64,
    obstacles: Vec<Circle>,
    room_half_extent_m: f64,
    next_index: u64,
}

impl SimLidar {
    /// A sensor with 0.5° resolution, a walking subject, one pole at
    /// `(-2.0, 2.0)` and walls 3.5 m away.  Scans are produced as fast as
    /// they are requested.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resolution_deg: 0.5,
            scan_period: None,
            scan_limit: None,
            subject: Some(SubjectPath::default()),
            subject_radius_m: 0.18,
            obstacles: vec![Circle {
                centre: StagePoint::new(-2.0, 2.0),
                radius: 0.03,
            }],
            room_half_extent_m: 3.5,
            next_index: 0,
        }
    }

    /// Angular step between beams (degrees, clamped to at least 0.05°).
    pub fn with_resolution(mut self, resolution_deg: f64) -> Self {
        self.resolution_deg = resolution_deg.max(0.05);
        self
    }

    /// Pace [`ScanSource::next_scan`] at `hz` rotations per second.
    /// Rates that are not positive, or too low to express as a period,
    /// disable pacing.
    pub fn with_scan_rate(mut self, hz: f64) -> Self {
        self.scan_period = scan_period(hz);
        self
    }

    /// End the stream after `count` scans.
    pub fn with_scan_limit(mut self, count: u64) -> Self {
        self.scan_limit = Some(count);
        self
    }

    pub fn with_subject(mut self, path: SubjectPath) -> Self {
        self.subject = Some(path);
        self
    }

    /// Simulate an empty stage.
    pub fn without_subject(mut self) -> Self {
        self.subject = None;
        self
    }

    pub fn with_obstacle(mut self, centre: StagePoint, radius_m: f64) -> Self {
        self.obstacles.push(Circle {
            centre,
            radius: radius_m,
        });
        self
    }

    pub fn without_obstacles(mut self) -> Self {
        self.obstacles.clear();
        self
    }

    /// Ground-truth subject centre for scan `index`.
    pub fn subject_position(&self, index: u64) -> Option<StagePoint> {
        self.subject
            .map(|path| path.position_at(index as f64 * SIM_SCAN_INTERVAL_S))
    }

    /// Produce scan number `index`.
    pub fn scan_at(&self, index: u64) -> Scan {
        let mut targets = self.obstacles.clone();
        if let Some(centre) = self.subject_position(index) {
            targets.push(Circle {
                centre,
                radius: self.subject_radius_m,
            });
        }

        let beams = (360.0 / self.resolution_deg).floor() as usize;
        (0..beams)
            .filter_map(|k| {
                let angle_deg = k as f64 * self.resolution_deg;
                let (dy, dx) = angle_deg.to_radians().sin_cos();
                let range_m = targets
                    .iter()
                    .filter_map(|c| c.intersect(dx, dy))
                    .fold(self.wall_distance(dx, dy), f64::min);
                let range_mm = range_m * 1000.0;
                (range_mm < SIM_MAX_RANGE_MM).then(|| RawSample::new(angle_deg, range_mm))
            })
            .collect()
    }

    /// Distance to the square room wall along the unit ray `(dx, dy)`.
    fn wall_distance(&self, dx: f64, dy: f64) -> f64 {
        let l = self.room_half_extent_m;
        let tx = if dx.abs() > f64::EPSILON { l / dx.abs() } else { f64::INFINITY };
        let ty = if dy.abs() > f64::EPSILON { l / dy.abs() } else { f64::INFINITY };
        tx.min(ty)
    }
}

#[async_trait]
impl ScanSource for SimLidar {
    fn id(&self) -> &str {
        &self.id
    }

    async fn next_scan(&mut self) -> Result<Option<Scan>, TrackError> {
        if self.scan_limit.is_some_and(|limit| self.next_index >= limit) {
            return Ok(None);
        }
        if let Some(period) = self.scan_period {
            tokio::time::sleep(period).await;
        }
        let scan = self.scan_at(self.next_index);
        debug!(source = %self.id, index = self.next_index, samples = scan.len(), "sim scan");
        self.next_index += 1;
        Ok(Some(scan))
    }
}

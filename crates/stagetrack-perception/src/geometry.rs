//! Geometry Filter.
//!
//! Converts raw polar samples into [`StagePoint`]s and rejects everything the
//! tracker must never see: samples outside the valid range window, samples
//! that fall outside the stage rectangle, and samples with non-finite values.
//!
//! The sensor sits at the stage centre.  Angles follow the sensor's native
//! convention: 0° is the forward axis and maps to `+x`.
//!
//! # Example
//!
//! ```rust
//! use stagetrack_perception::geometry::{filter_scan, RangeWindow, StageGeometry};
//! use stagetrack_types::{RawSample, Scan};
//!
//! let stage = StageGeometry::new(6.0, 6.0);
//! let range = RangeWindow::new(200.0, 4500.0);
//! let scan = Scan::new(vec![
//!     RawSample::new(0.0, 1000.0),   // kept: (1.0, 0.0)
//!     RawSample::new(90.0, 100.0),   // too close
//!     RawSample::new(45.0, 4400.0),  // inside range, outside the stage
//! ]);
//!
//! let points = filter_scan(&scan, &stage, &range);
//! assert_eq!(points.len(), 1);
//! assert!((points[0].x_m - 1.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use stagetrack_types::{Scan, StagePoint};

// ────────────────────────────────────────────────────────────────────────────
// Stage & range
// ────────────────────────────────────────────────────────────────────────────

/// The fixed rectangular stage, centred on the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageGeometry {
    /// Stage extent along `x` (metres).
    pub width_m: f64,
    /// Stage extent along `y` (metres).
    pub height_m: f64,
}

impl StageGeometry {
    pub fn new(width_m: f64, height_m: f64) -> Self {
        Self { width_m, height_m }
    }

    pub fn half_width(&self) -> f64 {
        self.width_m / 2.0
    }

    pub fn half_height(&self) -> f64 {
        self.height_m / 2.0
    }

    /// True when `p` lies strictly inside the stage rectangle.
    pub fn contains(&self, p: &StagePoint) -> bool {
        p.x_m.abs() < self.half_width() && p.y_m.abs() < self.half_height()
    }
}

/// Open interval of accepted ranges, `(min_mm, max_mm)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeWindow {
    pub min_mm: f64,
    pub max_mm: f64,
}

impl RangeWindow {
    pub fn new(min_mm: f64, max_mm: f64) -> Self {
        Self { min_mm, max_mm }
    }

    /// Both bounds are exclusive.
    pub fn accepts(&self, distance_mm: f64) -> bool {
        self.min_mm < distance_mm && distance_mm < self.max_mm
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Filter
// ────────────────────────────────────────────────────────────────────────────

/// Filter `scan` down to the points that lie on the stage.
///
/// The output order follows the input order, but downstream stages do not
/// depend on it.  An empty result is a legitimate "no detection" outcome.
pub fn filter_scan(scan: &Scan, stage: &StageGeometry, range: &RangeWindow) -> Vec<StagePoint> {
    scan.samples
        .iter()
        .filter(|s| s.angle_deg.is_finite() && s.distance_mm.is_finite())
        .filter(|s| range.accepts(s.distance_mm))
        .map(|s| {
            let r = s.distance_mm / 1000.0;
            let (sin, cos) = s.angle_deg.to_radians().sin_cos();
            StagePoint::new(r * cos, r * sin)
        })
        .filter(|p| stage.contains(p))
        .collect()
}

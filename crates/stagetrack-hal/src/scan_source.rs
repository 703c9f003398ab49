//! Generic `ScanSource` trait for rotating range sensors.

use std::time::Duration;

use async_trait::async_trait;
use stagetrack_types::{Scan, TrackError};

/// A provider of complete sensor rotations.
///
/// Drivers own connection set-up and teardown; the tracker only ever asks for
/// the next scan and processes it fully before asking again.
#[async_trait]
pub trait ScanSource: Send {
    /// Stable identifier for this source, e.g. `"sim-lidar"`.
    fn id(&self) -> &str;

    /// Wait for and return the next scan.
    ///
    /// Returns `Ok(None)` once a finite source is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::SensorConnection`] when the sensor cannot be
    /// read.  The tracking session treats this as fatal.
    async fn next_scan(&mut self) -> Result<Option<Scan>, TrackError>;
}

/// Delay between scans for a pacing rate of `hz`.
///
/// Non-positive or non-finite rates, and rates so low that the period does
/// not fit in a [`Duration`], disable pacing.
pub(crate) fn scan_period(hz: f64) -> Option<Duration> {
    if !(hz.is_finite() && hz > 0.0) {
        return None;
    }
    Duration::try_from_secs_f64(1.0 / hz).ok()
}

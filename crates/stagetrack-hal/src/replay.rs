//! Playback of recorded scans.
//!
//! A recording is a text file with one JSON-encoded [`Scan`] per line:
//!
//! ```text
//! {"samples":[{"angle_deg":0.0,"distance_mm":1820.0},{"angle_deg":0.5,"distance_mm":1821.3}]}
//! {"samples":[{"angle_deg":0.0,"distance_mm":1818.7}]}
//! ```
//!
//! Blank lines are skipped.  The whole file is parsed up front, so a
//! malformed recording fails before tracking starts.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use stagetrack_types::{Scan, TrackError};
use tracing::{debug, info};

use crate::scan_source::{ScanSource, scan_period};

/// Replays scans from memory, optionally paced and looped.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    id: String,
    scans: Vec<Scan>,
    cursor: usize,
    scan_period: Option<Duration>,
    looping: bool,
}

impl ReplaySource {
    /// Build a source that yields `scans` in order.
    pub fn from_scans(id: impl Into<String>, scans: Vec<Scan>) -> Self {
        Self {
            id: id.into(),
            scans,
            cursor: 0,
            scan_period: None,
            looping: false,
        }
    }

    /// Load a newline-delimited JSON recording.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::SensorConnection`] if the file cannot be read
    /// or any line is not a valid scan.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, TrackError> {
        let path = path.as_ref();
        let id = format!("replay:{}", path.display());
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| TrackError::SensorConnection {
                source_id: id.clone(),
                details: format!("failed to read recording: {e}"),
            })?;
        let scans = parse_recording(&id, &raw)?;
        info!(source = %id, scans = scans.len(), "recording loaded");
        Ok(Self::from_scans(id, scans))
    }

    /// Pace playback at `hz` scans per second.  Rates that are not positive,
    /// or too low to express as a period, disable pacing.
    pub fn with_scan_rate(mut self, hz: f64) -> Self {
        self.scan_period = scan_period(hz);
        self
    }

    /// Restart from the first scan once the recording is exhausted.
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Number of scans in the recording.
    pub fn len(&self) -> usize {
        self.scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }
}

fn parse_recording(id: &str, raw: &str) -> Result<Vec<Scan>, TrackError> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str::<Scan>(line).map_err(|e| TrackError::SensorConnection {
                source_id: id.to_string(),
                details: format!("line {}: {e}", n + 1),
            })
        })
        .collect()
}

#[async_trait]
impl ScanSource for ReplaySource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn next_scan(&mut self) -> Result<Option<Scan>, TrackError> {
        if self.cursor >= self.scans.len() && self.looping && !self.scans.is_empty() {
            debug!(source = %self.id, "recording restarted");
            self.cursor = 0;
        }
        let Some(scan) = self.scans.get(self.cursor).cloned() else {
            return Ok(None);
        };
        self.cursor += 1;
        if let Some(period) = self.scan_period {
            tokio::time::sleep(period).await;
        }
        Ok(Some(scan))
    }
}

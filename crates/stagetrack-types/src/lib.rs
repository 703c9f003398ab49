use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One range measurement reported by the rotating sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Beam angle measured from the sensor's forward axis (degrees).
    pub angle_deg: f64,
    /// Measured range (millimetres).
    pub distance_mm: f64,
}

impl RawSample {
    pub fn new(angle_deg: f64, distance_mm: f64) -> Self {
        Self {
            angle_deg,
            distance_mm,
        }
    }
}

/// One full (or partial) rotation worth of samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    pub samples: Vec<RawSample>,
}

impl Scan {
    pub fn new(samples: Vec<RawSample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl FromIterator<RawSample> for Scan {
    fn from_iter<I: IntoIterator<Item = RawSample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

/// Cartesian position relative to the stage centre (metres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StagePoint {
    pub x_m: f64,
    pub y_m: f64,
}

impl StagePoint {
    pub fn new(x_m: f64, y_m: f64) -> Self {
        Self { x_m, y_m }
    }

    /// Squared Euclidean distance to `other`.
    pub fn distance_sq(&self, other: &StagePoint) -> f64 {
        let dx = self.x_m - other.x_m;
        let dy = self.y_m - other.y_m;
        dx * dx + dy * dy
    }
}

/// Subject position expressed as fractions of the stage width and height.
///
/// Both components lie in `[0, 1]`; `(0, 0)` is the stage corner at
/// `(-W/2, -H/2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPosition {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other` in normalized units.
    pub fn distance(&self, other: &NormalizedPosition) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Error type shared by every StageTrack crate.
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Sensor connection failed on {source_id}: {details}")]
    SensorConnection { source_id: String, details: String },

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Malformed datagram: {0}")]
    Wire(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_json_roundtrip() {
        let scan = Scan::new(vec![RawSample::new(12.5, 1500.0), RawSample::new(13.0, 1502.0)]);
        let json = serde_json::to_string(&scan).unwrap();
        let back: Scan = serde_json::from_str(&json).unwrap();
        assert_eq!(scan, back);
    }

    #[test]
    fn scan_collects_from_iterator() {
        let scan: Scan = (0..4).map(|i| RawSample::new(i as f64, 1000.0)).collect();
        assert_eq!(scan.len(), 4);
        assert!(!scan.is_empty());
        assert!(Scan::default().is_empty());
    }

    #[test]
    fn normalized_distance_is_euclidean() {
        let a = NormalizedPosition::new(0.5, 0.5);
        let b = NormalizedPosition::new(0.53, 0.54);
        assert!((a.distance(&b) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn stage_point_distance_sq() {
        let a = StagePoint::new(1.0, 1.0);
        let b = StagePoint::new(4.0, 5.0);
        assert!((a.distance_sq(&b) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn track_error_display() {
        let err = TrackError::InvalidConfig("eps must be > 0".to_string());
        assert!(err.to_string().contains("Invalid configuration"));

        let err2 = TrackError::SensorConnection {
            source_id: "rplidar".to_string(),
            details: "port closed".to_string(),
        };
        assert!(err2.to_string().contains("rplidar"));
        assert!(err2.to_string().contains("port closed"));
    }
}

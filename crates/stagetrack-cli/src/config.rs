//! Configuration file – reads/writes `~/.stagetrack/config.toml`.

use serde::{Deserialize, Serialize};
use stagetrack_perception::{ClusterParams, RangeWindow, StageGeometry, TrackerParams};
use stagetrack_types::TrackError;
use std::fs;
use std::path::PathBuf;

/// Where scans come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Built-in ray-cast simulation.
    #[default]
    Sim,
    /// Newline-delimited JSON recording.
    Replay,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Sim => write!(f, "sim"),
            SourceKind::Replay => write!(f, "replay"),
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sim" => Ok(SourceKind::Sim),
            "replay" => Ok(SourceKind::Replay),
            other => Err(format!("unknown scan source {other:?}")),
        }
    }
}

/// `[lidar]` – sensor range window and scan source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LidarConfig {
    pub min_distance_mm: f64,
    pub max_distance_mm: f64,
    pub source: SourceKind,
    /// Recording to play when `source = "replay"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay_path: Option<PathBuf>,
    /// Start the recording over when it ends.
    pub replay_loop: bool,
    /// Scans per second; `0` runs as fast as scans can be produced.
    pub scan_rate_hz: f64,
    /// Beam spacing of the simulated sensor.
    pub angular_resolution_deg: f64,
}

impl Default for LidarConfig {
    fn default() -> Self {
        Self {
            min_distance_mm: 200.0,
            max_distance_mm: 4500.0,
            source: SourceKind::default(),
            replay_path: None,
            replay_loop: false,
            scan_rate_hz: 10.0,
            angular_resolution_deg: 0.5,
        }
    }
}

/// `[motion]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Normalized displacement the subject must exceed to move the output.
    pub movement_threshold: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self { movement_threshold: 0.02 }
    }
}

/// `[network]` – where position datagrams are sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub target_host: String,
    pub target_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            target_host: "127.0.0.1".to_string(),
            target_port: 8888,
        }
    }
}

/// Persisted configuration stored in `~/.stagetrack/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_stage")]
    pub stage: StageGeometry,
    #[serde(default)]
    pub lidar: LidarConfig,
    #[serde(default)]
    pub detection: ClusterParams,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Accepted pacing rates; `0` is also accepted and disables pacing.
const SCAN_RATE_RANGE_HZ: std::ops::RangeInclusive<f64> = 0.01..=1000.0;

fn default_stage() -> StageGeometry {
    StageGeometry::new(6.0, 6.0)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stage: default_stage(),
            lidar: LidarConfig::default(),
            detection: ClusterParams::default(),
            motion: MotionConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl Config {
    /// The tracking-core view of this configuration.
    pub fn tracker_params(&self) -> TrackerParams {
        TrackerParams {
            stage: self.stage,
            range: RangeWindow::new(self.lidar.min_distance_mm, self.lidar.max_distance_mm),
            clustering: self.detection,
            movement_threshold: self.motion.movement_threshold,
        }
    }

    /// Reject a configuration before any scan is processed.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> Result<(), TrackError> {
        self.tracker_params().validate()?;

        if self.network.target_host.trim().is_empty() {
            return Err(TrackError::InvalidConfig("network.target_host is empty".into()));
        }
        if self.network.target_port == 0 {
            return Err(TrackError::InvalidConfig("network.target_port must not be 0".into()));
        }
        let rate = self.lidar.scan_rate_hz;
        if !(rate == 0.0 || SCAN_RATE_RANGE_HZ.contains(&rate)) {
            return Err(TrackError::InvalidConfig(format!(
                "lidar.scan_rate_hz must be 0 (unpaced) or within {}..={} (got {rate})",
                SCAN_RATE_RANGE_HZ.start(),
                SCAN_RATE_RANGE_HZ.end()
            )));
        }
        let res = self.lidar.angular_resolution_deg;
        if !(res.is_finite() && res > 0.0 && res <= 360.0) {
            return Err(TrackError::InvalidConfig(format!(
                "lidar.angular_resolution_deg must be in (0, 360] (got {res})"
            )));
        }
        if self.lidar.source == SourceKind::Replay && self.lidar.replay_path.is_none() {
            return Err(TrackError::InvalidConfig(
                "lidar.source = \"replay\" requires lidar.replay_path".into(),
            ));
        }
        Ok(())
    }
}

/// Return the config path: `$STAGETRACK_CONFIG`, else `~/.stagetrack/config.toml`.
pub fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("STAGETRACK_CONFIG")
        && !p.trim().is_empty()
    {
        return PathBuf::from(p);
    }
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".stagetrack").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path and apply environment overrides.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `STAGETRACK_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `STAGETRACK_TARGET_HOST` | `network.target_host` |
/// | `STAGETRACK_TARGET_PORT` | `network.target_port` |
/// | `STAGETRACK_SOURCE` | `lidar.source` |
/// | `STAGETRACK_REPLAY_PATH` | `lidar.replay_path` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |name| std::env::var(name).ok());
}

fn apply_overrides(cfg: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("STAGETRACK_TARGET_HOST")
        && !v.trim().is_empty()
    {
        cfg.network.target_host = v.trim().to_string();
    }
    if let Some(v) = var("STAGETRACK_TARGET_PORT")
        && let Ok(port) = v.trim().parse::<u16>()
    {
        cfg.network.target_port = port;
    }
    if let Some(v) = var("STAGETRACK_SOURCE")
        && let Ok(kind) = v.parse::<SourceKind>()
    {
        cfg.lidar.source = kind;
    }
    if let Some(v) = var("STAGETRACK_REPLAY_PATH")
        && !v.trim().is_empty()
    {
        cfg.lidar.replay_path = Some(PathBuf::from(v));
    }
}

/// Save the config to disk, creating the parent directory if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}

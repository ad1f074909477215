use crate::engine::{DEFAULT_MATERIAL, EngineConfig};
use crate::feedback::{DEFAULT_COOLDOWN_MS, FeedbackSettings};
use crate::pose::detect::DetectorConfig;
use crate::pose::geometry::DistanceCalibration;
use crate::pose::vision::DEFAULT_ANGLE_SMOOTHING;
use crate::profile::ProcessKind;
use crate::tracker::TrackerConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 33;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub training: Option<TrainingSection>,
    #[serde(default)]
    pub pose: Option<PoseSection>,
    #[serde(default)]
    pub tracker: Option<TrackerSection>,
    #[serde(default)]
    pub feedback: Option<FeedbackSection>,
    #[serde(default)]
    pub server: Option<ServerSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrainingSection {
    pub process: Option<ProcessKind>,
    /// Display only, never affects scoring.
    pub material: Option<String>,
    pub sound_enabled: Option<bool>,
    pub vibration_enabled: Option<bool>,
}

/// Where pose estimates come from.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PoseSourceKind {
    /// Marker detection on synthetic frames, with tilt fallback.
    Vision,
    Tilt,
    Simulated,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PoseSection {
    pub source: Option<PoseSourceKind>,
    /// `distance = constant / sqrt(area)`.
    pub calibration_constant: Option<f64>,
    pub min_distance_cm: Option<f64>,
    pub max_distance_cm: Option<f64>,
    /// Weight kept from the previous angle estimate.
    pub angle_smoothing: Option<f64>,
    pub min_contrast: Option<f64>,
    pub min_area_px: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackerSection {
    pub px_per_cm: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedbackSection {
    pub cooldown_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
    /// Engine tick interval in milliseconds (default: 33)
    pub tick_interval_ms: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    pub fn log_level(&self) -> &str {
        let level = self.logging.level.trim();
        if level.is_empty() {
            DEFAULT_LOG_LEVEL
        } else {
            level
        }
    }

    pub fn process(&self) -> ProcessKind {
        self.training
            .as_ref()
            .and_then(|t| t.process)
            .unwrap_or(ProcessKind::Mig)
    }

    pub fn material(&self) -> &str {
        self.training
            .as_ref()
            .and_then(|t| t.material.as_deref())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_MATERIAL)
    }

    pub fn feedback_settings(&self) -> FeedbackSettings {
        let defaults = FeedbackSettings::default();
        let training = self.training.as_ref();
        FeedbackSettings {
            sound_enabled: training
                .and_then(|t| t.sound_enabled)
                .unwrap_or(defaults.sound_enabled),
            vibration_enabled: training
                .and_then(|t| t.vibration_enabled)
                .unwrap_or(defaults.vibration_enabled),
            cooldown_ms: self
                .feedback
                .as_ref()
                .and_then(|f| f.cooldown_ms)
                .unwrap_or(DEFAULT_COOLDOWN_MS),
        }
    }

    /// Returns the pose source (default: vision)
    pub fn pose_source(&self) -> PoseSourceKind {
        self.pose
            .as_ref()
            .and_then(|p| p.source)
            .unwrap_or(PoseSourceKind::Vision)
    }

    pub fn distance_calibration(&self) -> DistanceCalibration {
        let defaults = DistanceCalibration::default();
        let Some(pose) = self.pose.as_ref() else {
            return defaults;
        };
        DistanceCalibration {
            constant: pose.calibration_constant.unwrap_or(defaults.constant),
            min_cm: pose.min_distance_cm.unwrap_or(defaults.min_cm),
            max_cm: pose.max_distance_cm.unwrap_or(defaults.max_cm),
        }
    }

    pub fn detector_config(&self) -> DetectorConfig {
        let defaults = DetectorConfig::default();
        let Some(pose) = self.pose.as_ref() else {
            return defaults;
        };
        DetectorConfig {
            min_contrast: pose.min_contrast.unwrap_or(defaults.min_contrast),
            min_area_px: pose.min_area_px.unwrap_or(defaults.min_area_px),
            ..defaults
        }
    }

    /// Clamped to `[0, 1)` so new estimates always contribute.
    pub fn angle_smoothing(&self) -> f64 {
        self.pose
            .as_ref()
            .and_then(|p| p.angle_smoothing)
            .filter(|w| w.is_finite())
            .map(|w| w.clamp(0.0, 0.95))
            .unwrap_or(DEFAULT_ANGLE_SMOOTHING)
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        let defaults = TrackerConfig::default();
        let px_per_cm = self
            .tracker
            .as_ref()
            .and_then(|t| t.px_per_cm)
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(defaults.px_per_cm);
        TrackerConfig {
            px_per_cm,
            ..defaults
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            process: self.process(),
            material: self.material().to_string(),
            tracker: self.tracker_config(),
            feedback: self.feedback_settings(),
        }
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    /// Returns the tick interval as Duration (default: 33 ms)
    pub fn tick_interval(&self) -> Duration {
        let millis = self
            .server
            .as_ref()
            .and_then(|s| s.tick_interval_ms)
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_TICK_INTERVAL_MS);
        Duration::from_millis(millis)
    }
}

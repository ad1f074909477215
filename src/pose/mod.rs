//! Pose estimation from a marker quad or a device tilt reading.
//!
//! Every source reports through [`PoseSource`], so the engine never needs to
//! know whether the angle came from the camera, the tilt sensor or the
//! built-in simulation.

use crate::frames::FrameInput;
use serde::{Deserialize, Serialize};

pub mod detect;
pub mod geometry;
pub mod simulated;
pub mod tilt;
pub mod vision;

pub use geometry::Quad;

pub const MAX_ANGLE_DEG: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    VisionMarker,
    DeviceTilt,
    Simulated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseStatus {
    /// Marker found; angle, distance and screen position are known.
    Tracking,
    /// Marker not found, angle comes from the tilt sensor.
    TiltOnly,
    /// Nothing usable this frame.
    Searching,
}

/// One frame's pose estimate. Always well-formed, possibly empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseEstimate {
    pub status: PoseStatus,
    pub quad: Option<Quad>,
    pub angle_deg: Option<f64>,
    pub distance_cm: Option<f64>,
    pub screen_pos: Option<Point>,
}

impl PoseEstimate {
    pub fn searching() -> Self {
        Self {
            status: PoseStatus::Searching,
            quad: None,
            angle_deg: None,
            distance_cm: None,
            screen_pos: None,
        }
    }

    pub fn tilt(angle_deg: f64) -> Self {
        Self {
            status: PoseStatus::TiltOnly,
            quad: None,
            angle_deg: Some(clamp_angle(angle_deg)),
            distance_cm: None,
            screen_pos: None,
        }
    }

    pub fn found(&self) -> bool {
        matches!(self.status, PoseStatus::Tracking)
    }

    /// Freeze this estimate into a sample, or `None` while searching.
    pub fn to_sample(&self, timestamp_ms: u64) -> Option<PoseSample> {
        let angle_deg = self.angle_deg?;
        Some(PoseSample {
            timestamp_ms,
            angle_deg,
            distance_cm: self.distance_cm,
            screen_pos: self.screen_pos,
        })
    }
}

/// Immutable per-tick observation fed to the kinematic tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoseSample {
    pub timestamp_ms: u64,
    pub angle_deg: f64,
    /// Absent on the tilt path.
    pub distance_cm: Option<f64>,
    pub screen_pos: Option<Point>,
}

pub trait PoseSource: Send + std::fmt::Debug {
    fn kind(&self) -> SourceKind;

    /// Estimate the pose for one tick. Never fails; absence is `Searching`.
    fn observe(&mut self, input: &FrameInput) -> PoseEstimate;

    /// Store the latest tilt reading as the zero reference.
    ///
    /// Returns `false` when the source has no tilt reading to calibrate from.
    fn calibrate_zero(&mut self) -> bool {
        false
    }

    /// Drop smoothing state, e.g. when a new session starts.
    fn reset(&mut self) {}
}

pub fn clamp_angle(angle_deg: f64) -> f64 {
    if angle_deg.is_nan() {
        return 0.0;
    }
    angle_deg.clamp(0.0, MAX_ANGLE_DEG)
}

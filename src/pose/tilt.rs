//! Tilt-sensor angle path.

use crate::frames::FrameInput;
use crate::pose::{PoseEstimate, PoseSource, SourceKind, clamp_angle};
use tracing::{debug, info};

/// Zero reference for raw tilt readings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TiltCalibration {
    zero_deg: f64,
    last_reading_deg: Option<f64>,
}

impl TiltCalibration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zero_deg(&self) -> f64 {
        self.zero_deg
    }

    /// Convert a raw reading into an angle in `[0, 90]` relative to the zero.
    pub fn angle(&mut self, raw_deg: f64) -> Option<f64> {
        if !raw_deg.is_finite() {
            debug!(raw_deg, "Ignoring non-finite tilt reading");
            return None;
        }
        let magnitude = raw_deg.abs();
        self.last_reading_deg = Some(magnitude);
        Some(clamp_angle((magnitude - self.zero_deg).abs()))
    }

    /// Use the last seen reading as the new zero.
    pub fn calibrate_zero(&mut self) -> bool {
        match self.last_reading_deg {
            Some(reading) => {
                self.zero_deg = reading;
                info!(zero_deg = reading, "Tilt zero reference captured");
                true
            }
            None => false,
        }
    }
}

/// Pose source backed only by the device's tilt sensor.
#[derive(Debug, Default)]
pub struct DeviceTiltSource {
    calibration: TiltCalibration,
}

impl DeviceTiltSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PoseSource for DeviceTiltSource {
    fn kind(&self) -> SourceKind {
        SourceKind::DeviceTilt
    }

    fn observe(&mut self, input: &FrameInput) -> PoseEstimate {
        input
            .tilt_deg
            .and_then(|raw| self.calibration.angle(raw))
            .map(PoseEstimate::tilt)
            .unwrap_or_else(PoseEstimate::searching)
    }

    fn calibrate_zero(&mut self) -> bool {
        self.calibration.calibrate_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::PoseStatus;

    fn tilt_input(tilt: Option<f64>) -> FrameInput {
        FrameInput {
            timestamp_ms: 0,
            frame: None,
            tilt_deg: tilt,
        }
    }

    #[test]
    fn raw_reading_uses_magnitude() {
        let mut calibration = TiltCalibration::new();

        assert_eq!(calibration.angle(-30.0), Some(30.0));
        assert_eq!(calibration.angle(135.0), Some(90.0));
    }

    #[test]
    fn calibrate_zero_offsets_later_readings() {
        let mut calibration = TiltCalibration::new();
        assert!(!calibration.calibrate_zero());

        let _ = calibration.angle(10.0);
        assert!(calibration.calibrate_zero());

        assert_eq!(calibration.zero_deg(), 10.0);
        assert_eq!(calibration.angle(25.0), Some(15.0));
        assert_eq!(calibration.angle(4.0), Some(6.0));
    }

    #[test]
    fn non_finite_reading_is_ignored() {
        let mut calibration = TiltCalibration::new();
        assert_eq!(calibration.angle(f64::NAN), None);
    }

    #[test]
    fn source_reports_searching_without_reading() {
        let mut source = DeviceTiltSource::new();

        let estimate = source.observe(&tilt_input(None));
        assert_eq!(estimate.status, PoseStatus::Searching);

        let estimate = source.observe(&tilt_input(Some(-22.0)));
        assert_eq!(estimate.status, PoseStatus::TiltOnly);
        assert_eq!(estimate.angle_deg, Some(22.0));
    }
}

use crate::frames::FrameInput;
use crate::pose::detect::MarkerDetector;
use crate::pose::geometry::{DistanceCalibration, angle_from_deviation, distance_from_area, smooth};
use crate::pose::tilt::TiltCalibration;
use crate::pose::{PoseEstimate, PoseSource, PoseStatus, SourceKind, clamp_angle};
use tracing::trace;

/// Weight of the previous angle in the per-frame EMA.
pub const DEFAULT_ANGLE_SMOOTHING: f64 = 0.7;

/// Camera marker tracking with tilt-sensor fallback.
#[derive(Debug)]
pub struct VisionMarkerSource {
    detector: MarkerDetector,
    distance: DistanceCalibration,
    smoothing: f64,
    tilt: TiltCalibration,
    previous_angle: Option<f64>,
}

impl VisionMarkerSource {
    pub fn new(detector: MarkerDetector, distance: DistanceCalibration, smoothing: f64) -> Self {
        Self {
            detector,
            distance,
            smoothing: smoothing.clamp(0.0, 1.0),
            tilt: TiltCalibration::new(),
            previous_angle: None,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(
            MarkerDetector::default(),
            DistanceCalibration::default(),
            DEFAULT_ANGLE_SMOOTHING,
        )
    }

    fn estimate_from_frame(&mut self, input: &FrameInput) -> Option<PoseEstimate> {
        let frame = input.frame.as_ref()?;
        let detection = self.detector.detect(frame)?;
        let quad = detection.quad;
        let distance_cm = distance_from_area(quad.area(), &self.distance)?;
        let raw_angle = angle_from_deviation(quad.asymmetry()?);
        let angle_deg = clamp_angle(smooth(self.previous_angle, raw_angle, self.smoothing));
        self.previous_angle = Some(angle_deg);

        trace!(
            area_px = detection.area_px,
            contrast = detection.contrast,
            raw_angle,
            angle_deg,
            distance_cm,
            "Marker pose"
        );

        Some(PoseEstimate {
            status: PoseStatus::Tracking,
            quad: Some(quad),
            angle_deg: Some(angle_deg),
            distance_cm: Some(distance_cm),
            screen_pos: Some(quad.center()),
        })
    }
}

impl PoseSource for VisionMarkerSource {
    fn kind(&self) -> SourceKind {
        SourceKind::VisionMarker
    }

    fn observe(&mut self, input: &FrameInput) -> PoseEstimate {
        if let Some(estimate) = self.estimate_from_frame(input) {
            return estimate;
        }
        input
            .tilt_deg
            .and_then(|raw| self.tilt.angle(raw))
            .map(PoseEstimate::tilt)
            .unwrap_or_else(PoseEstimate::searching)
    }

    fn calibrate_zero(&mut self) -> bool {
        self.tilt.calibrate_zero()
    }

    fn reset(&mut self) {
        self.previous_angle = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::GrayFrame;
    use crate::frames::synthetic::render_quad;
    use crate::pose::{MAX_ANGLE_DEG, Point};

    fn input(frame: Option<GrayFrame>, tilt: Option<f64>) -> FrameInput {
        FrameInput {
            timestamp_ms: 0,
            frame,
            tilt_deg: tilt,
        }
    }

    fn square_frame() -> GrayFrame {
        let mut frame = GrayFrame::filled(200, 200, 210);
        render_quad(
            &mut frame,
            &[
                Point::new(80.0, 80.0),
                Point::new(120.0, 80.0),
                Point::new(120.0, 120.0),
                Point::new(80.0, 120.0),
            ],
            15,
        );
        frame
    }

    fn trapezoid_frame() -> GrayFrame {
        let mut frame = GrayFrame::filled(200, 200, 210);
        render_quad(
            &mut frame,
            &[
                Point::new(90.0, 80.0),
                Point::new(110.0, 80.0),
                Point::new(125.0, 120.0),
                Point::new(75.0, 120.0),
            ],
            15,
        );
        frame
    }

    #[test]
    fn frontal_marker_reads_near_zero_angle() {
        let mut source = VisionMarkerSource::with_defaults();

        let estimate = source.observe(&input(Some(square_frame()), None));

        assert!(estimate.found());
        let angle = estimate.angle_deg.expect("angle");
        assert!(angle < 5.0, "angle {angle}");
        let distance = estimate.distance_cm.expect("distance");
        assert!((60.0..=90.0).contains(&distance), "distance {distance}");
        assert!(estimate.screen_pos.is_some());
    }

    #[test]
    fn tilted_marker_reads_larger_angle() {
        let mut frontal = VisionMarkerSource::with_defaults();
        let mut tilted = VisionMarkerSource::with_defaults();

        let flat = frontal.observe(&input(Some(square_frame()), None));
        let steep = tilted.observe(&input(Some(trapezoid_frame()), None));

        let flat_angle = flat.angle_deg.expect("flat angle");
        let steep_angle = steep.angle_deg.expect("steep angle");
        assert!(steep_angle > flat_angle + 20.0, "{flat_angle} vs {steep_angle}");
        assert!(steep_angle <= MAX_ANGLE_DEG);
    }

    #[test]
    fn angle_is_smoothed_across_frames() {
        let mut source = VisionMarkerSource::with_defaults();
        let flat = source.observe(&input(Some(square_frame()), None));
        let flat_angle = flat.angle_deg.expect("flat angle");

        let mut reference = VisionMarkerSource::with_defaults();
        let raw_steep = reference
            .observe(&input(Some(trapezoid_frame()), None))
            .angle_deg
            .expect("raw angle");

        let smoothed = source
            .observe(&input(Some(trapezoid_frame()), None))
            .angle_deg
            .expect("smoothed angle");

        let expected = flat_angle * 0.7 + raw_steep * 0.3;
        assert!((smoothed - expected).abs() < 1e-9);
    }

    #[test]
    fn falls_back_to_tilt_when_marker_missing() {
        let mut source = VisionMarkerSource::with_defaults();
        let blank = GrayFrame::filled(200, 200, 210);

        let estimate = source.observe(&input(Some(blank), Some(-18.0)));

        assert_eq!(estimate.status, PoseStatus::TiltOnly);
        assert_eq!(estimate.angle_deg, Some(18.0));
        assert_eq!(estimate.distance_cm, None);
    }

    #[test]
    fn searching_without_any_signal() {
        let mut source = VisionMarkerSource::with_defaults();

        let estimate = source.observe(&input(None, None));

        assert_eq!(estimate, PoseEstimate::searching());
    }

    #[test]
    fn calibrate_zero_applies_to_fallback_path() {
        let mut source = VisionMarkerSource::with_defaults();
        assert!(!source.calibrate_zero());

        let _ = source.observe(&input(None, Some(12.0)));
        assert!(source.calibrate_zero());

        let estimate = source.observe(&input(None, Some(30.0)));
        assert_eq!(estimate.angle_deg, Some(18.0));
    }
}

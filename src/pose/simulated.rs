use crate::frames::FrameInput;
use crate::pose::{PoseEstimate, PoseSource, PoseStatus, Point, SourceKind, clamp_angle};
use std::f64::consts::TAU;

/// Shape of the synthetic weld pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedPass {
    pub start: Point,
    /// Horizontal travel in px/s.
    pub travel_px_per_s: f64,
    pub lateral_wobble_px: f64,
    pub base_angle_deg: f64,
    pub angle_wobble_deg: f64,
    pub base_distance_cm: f64,
    pub distance_wobble_cm: f64,
    pub wobble_period_ms: f64,
    /// The pass restarts from `start` after this long.
    pub pass_duration_ms: u64,
}

impl Default for SimulatedPass {
    fn default() -> Self {
        Self {
            start: Point::new(120.0, 240.0),
            travel_px_per_s: 80.0,
            lateral_wobble_px: 2.0,
            base_angle_deg: 20.0,
            angle_wobble_deg: 1.5,
            base_distance_cm: 20.0,
            distance_wobble_cm: 0.5,
            wobble_period_ms: 1600.0,
            pass_duration_ms: 5000,
        }
    }
}

/// Deterministic pose stream for demos and tests without a camera.
#[derive(Debug, Default)]
pub struct SimulatedSource {
    pass: SimulatedPass,
    origin_ms: Option<u64>,
}

impl SimulatedSource {
    pub fn new(pass: SimulatedPass) -> Self {
        Self {
            pass,
            origin_ms: None,
        }
    }

    fn estimate_at(&self, elapsed_ms: u64) -> PoseEstimate {
        let pass = &self.pass;
        let t_ms = (elapsed_ms % pass.pass_duration_ms.max(1)) as f64;
        let phase = if pass.wobble_period_ms > 0.0 {
            TAU * t_ms / pass.wobble_period_ms
        } else {
            0.0
        };

        let x = pass.start.x + pass.travel_px_per_s * t_ms / 1000.0;
        let y = pass.start.y + pass.lateral_wobble_px * phase.sin();
        let angle = clamp_angle(pass.base_angle_deg + pass.angle_wobble_deg * phase.cos());
        let distance = pass.base_distance_cm + pass.distance_wobble_cm * phase.sin();

        PoseEstimate {
            status: PoseStatus::Tracking,
            quad: None,
            angle_deg: Some(angle),
            distance_cm: Some(distance),
            screen_pos: Some(Point::new(x, y)),
        }
    }
}

impl PoseSource for SimulatedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Simulated
    }

    fn observe(&mut self, input: &FrameInput) -> PoseEstimate {
        let origin = *self.origin_ms.get_or_insert(input.timestamp_ms);
        self.estimate_at(input.timestamp_ms.saturating_sub(origin))
    }

    fn reset(&mut self) {
        self.origin_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_timestamps_give_same_poses() {
        let mut a = SimulatedSource::default();
        let mut b = SimulatedSource::default();

        for ts in [1000, 1033, 1066, 2500] {
            let input = FrameInput::empty(ts);
            assert_eq!(a.observe(&input), b.observe(&input));
        }
    }

    #[test]
    fn pass_travels_right_and_restarts() {
        let mut source = SimulatedSource::default();

        let first = source.observe(&FrameInput::empty(0)).screen_pos.expect("pos");
        let later = source.observe(&FrameInput::empty(1000)).screen_pos.expect("pos");
        let wrapped = source.observe(&FrameInput::empty(5000)).screen_pos.expect("pos");

        assert!((later.x - first.x - 80.0).abs() < 1e-9);
        assert_eq!(wrapped.x, first.x);
    }

    #[test]
    fn angle_stays_in_range() {
        let mut source = SimulatedSource::new(SimulatedPass {
            base_angle_deg: 88.0,
            angle_wobble_deg: 10.0,
            ..SimulatedPass::default()
        });

        for ts in (0..5000).step_by(100) {
            let angle = source.observe(&FrameInput::empty(ts)).angle_deg.expect("angle");
            assert!((0.0..=90.0).contains(&angle));
        }
    }
}

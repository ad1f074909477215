//! Pure kinematic statistics over buffered samples.
//!
//! Every function returns `None` when its input is too short to judge; callers
//! surface that as "unavailable" rather than as a zero.

use crate::pose::Point;

pub const MIN_ANGLE_SAMPLES: usize = 10;
pub const MIN_PATH_POINTS: usize = 3;
/// First/last points closer than this make a path too short to judge.
pub const MIN_PATH_DISPLACEMENT_PX: f64 = 10.0;

const STABILITY_PENALTY_PER_DEG: f64 = 10.0;
const STRAIGHTNESS_PENALTY_PER_PX: f64 = 5.0;

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt())
}

/// `max(0, 100 - 10 * stddev)` over at least [`MIN_ANGLE_SAMPLES`] angles.
pub fn angular_stability(angles: &[f64]) -> Option<f64> {
    if angles.len() < MIN_ANGLE_SAMPLES {
        return None;
    }
    let sd = std_dev(angles)?;
    Some((100.0 - sd * STABILITY_PENALTY_PER_DEG).max(0.0))
}

/// Distance from `point` to the segment `start..end`.
pub fn distance_to_segment(point: Point, start: Point, end: Point) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return point.distance_to(start);
    }
    let t = ((point.x - start.x) * dx + (point.y - start.y) * dy) / len_sq;
    let t = t.clamp(0.0, 1.0);
    point.distance_to(Point::new(start.x + t * dx, start.y + t * dy))
}

/// `max(0, 100 - 5 * avg deviation)` of interior points from the first→last line.
pub fn path_straightness(points: &[Point]) -> Option<f64> {
    if points.len() < MIN_PATH_POINTS {
        return None;
    }
    let first = *points.first()?;
    let last = *points.last()?;
    if first.distance_to(last) < MIN_PATH_DISPLACEMENT_PX {
        return None;
    }

    let interior = &points[1..points.len() - 1];
    let total: f64 = interior
        .iter()
        .map(|p| distance_to_segment(*p, first, last))
        .sum();
    let average = total / interior.len() as f64;
    Some((100.0 - average * STRAIGHTNESS_PENALTY_PER_PX).max(0.0))
}

/// Path length over time span, in cm/s.
///
/// `None` with fewer than two points, `0` for a non-positive span or scale.
pub fn translation_speed(points: &[(u64, Point)], px_per_cm: f64) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let span_ms = points[points.len() - 1].0 as f64 - points[0].0 as f64;
    if span_ms <= 0.0 || px_per_cm <= 0.0 {
        return Some(0.0);
    }
    let path_px: f64 = points
        .windows(2)
        .map(|pair| pair[0].1.distance_to(pair[1].1))
        .sum();
    Some(path_px / (span_ms / 1000.0) / px_per_cm)
}

/// Signed distance rate in cm/s; negative means approaching the work.
pub fn approach_speed(previous: Option<(u64, f64)>, current: (u64, f64)) -> f64 {
    let Some((prev_ts, prev_distance)) = previous else {
        return 0.0;
    };
    if current.0 <= prev_ts {
        return 0.0;
    }
    let dt_s = (current.0 - prev_ts) as f64 / 1000.0;
    (current.1 - prev_distance) / dt_s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_angles_are_perfectly_stable() {
        assert_eq!(angular_stability(&[17.0; 10]), Some(100.0));
    }

    #[test]
    fn stability_follows_standard_deviation() {
        let angles = [20.0, 20.0, 20.0, 22.0, 18.0, 20.0, 20.0, 20.0, 20.0, 20.0];

        let score = angular_stability(&angles).expect("stability");

        // variance = (4 + 4) / 10
        let expected = 100.0 - 10.0 * 0.8f64.sqrt();
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn stability_floors_at_zero() {
        let angles = [0.0, 90.0, 0.0, 90.0, 0.0, 90.0, 0.0, 90.0, 0.0, 90.0];
        assert_eq!(angular_stability(&angles), Some(0.0));
    }

    #[test]
    fn stability_needs_ten_samples() {
        assert_eq!(angular_stability(&[20.0; 9]), None);
    }

    #[test]
    fn colinear_path_is_straight() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(25.0, 0.0),
            Point::new(50.0, 0.0),
        ];
        assert_eq!(path_straightness(&points), Some(100.0));
    }

    #[test]
    fn single_offset_point_scores_fifty() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(25.0, 10.0),
            Point::new(50.0, 0.0),
        ];
        assert_eq!(path_straightness(&points), Some(50.0));
    }

    #[test]
    fn average_deviation_drives_straightness() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 2.0),
            Point::new(20.0, -4.0),
            Point::new(30.0, 0.0),
        ];
        // avg deviation 3 px
        assert_eq!(path_straightness(&points), Some(85.0));
    }

    #[test]
    fn short_path_is_unavailable() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(3.0, 1.0),
            Point::new(5.0, 0.0),
        ];
        assert_eq!(path_straightness(&points), None);
        assert_eq!(path_straightness(&points[..2]), None);
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(10.0, 0.0);

        assert_eq!(distance_to_segment(Point::new(5.0, 3.0), start, end), 3.0);
        assert_eq!(distance_to_segment(Point::new(13.0, 4.0), start, end), 5.0);
        assert_eq!(distance_to_segment(Point::new(3.0, 4.0), start, start), 5.0);
    }

    #[test]
    fn translation_speed_converts_to_cm() {
        let points = [
            (0, Point::new(0.0, 0.0)),
            (200, Point::new(20.0, 0.0)),
            (400, Point::new(40.0, 0.0)),
        ];
        // 40 px over 0.4 s at 10 px/cm
        let speed = translation_speed(&points, 10.0).expect("speed");
        assert!((speed - 10.0).abs() < 1e-9);
    }

    #[test]
    fn translation_speed_degrades_gracefully() {
        assert_eq!(translation_speed(&[(0, Point::new(0.0, 0.0))], 10.0), None);
        let same_time = [(5, Point::new(0.0, 0.0)), (5, Point::new(9.0, 0.0))];
        assert_eq!(translation_speed(&same_time, 10.0), Some(0.0));
    }

    #[test]
    fn approach_speed_sign_convention() {
        assert_eq!(approach_speed(None, (100, 20.0)), 0.0);
        assert_eq!(approach_speed(Some((0, 20.0)), (500, 19.0)), -2.0);
        assert_eq!(approach_speed(Some((0, 20.0)), (1000, 21.5)), 1.5);
        assert_eq!(approach_speed(Some((500, 20.0)), (500, 25.0)), 0.0);
    }
}

//! Quad ordering and the quad → (distance, angle) mapping.
//!
//! Distance is `calibration_constant / sqrt(area)`. The constant is a tuning
//! knob that roughly matches a 100 px marker to 30 cm on a phone camera; it is
//! not derived from camera intrinsics, so distances are approximate.

use crate::pose::{MAX_ANGLE_DEG, Point, clamp_angle};
use serde::Serialize;

/// Curvature of the deviation → angle curve.
const ANGLE_CURVE_K: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quad {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

/// Opposite edge lengths of an ordered quad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeLengths {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceCalibration {
    pub constant: f64,
    pub min_cm: f64,
    pub max_cm: f64,
}

impl Default for DistanceCalibration {
    fn default() -> Self {
        Self {
            constant: 3000.0,
            min_cm: 10.0,
            max_cm: 200.0,
        }
    }
}

impl Quad {
    /// Order four corners into TL, TR, BR, BL.
    ///
    /// The two smallest `y` values form the top row, each row is then sorted
    /// by `x`. Returns `None` for anything other than four finite points.
    pub fn from_corners(corners: &[Point]) -> Option<Self> {
        if corners.len() != 4 || corners.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return None;
        }

        let mut sorted = corners.to_vec();
        sorted.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
        let (top, bottom) = sorted.split_at_mut(2);
        top.sort_by(|a, b| a.x.total_cmp(&b.x));
        bottom.sort_by(|a, b| a.x.total_cmp(&b.x));

        Some(Self {
            top_left: top[0],
            top_right: top[1],
            bottom_right: bottom[1],
            bottom_left: bottom[0],
        })
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    pub fn edges(&self) -> EdgeLengths {
        EdgeLengths {
            top: self.top_left.distance_to(self.top_right),
            bottom: self.bottom_left.distance_to(self.bottom_right),
            left: self.top_left.distance_to(self.bottom_left),
            right: self.top_right.distance_to(self.bottom_right),
        }
    }

    /// Shoelace area in square pixels.
    pub fn area(&self) -> f64 {
        let c = self.corners();
        let mut twice_area = 0.0;
        for i in 0..c.len() {
            let j = (i + 1) % c.len();
            twice_area += c[i].x * c[j].y - c[j].x * c[i].y;
        }
        (twice_area / 2.0).abs()
    }

    pub fn center(&self) -> Point {
        let c = self.corners();
        Point::new(
            c.iter().map(|p| p.x).sum::<f64>() / 4.0,
            c.iter().map(|p| p.y).sum::<f64>() / 4.0,
        )
    }

    /// Combined edge asymmetry in `[0, 1]`; 0 for a frontal marker.
    pub fn asymmetry(&self) -> Option<f64> {
        let edges = self.edges();
        let width = ratio_deviation(edges.top, edges.bottom)?;
        let height = ratio_deviation(edges.left, edges.right)?;
        Some(width.hypot(height).min(1.0))
    }
}

fn ratio_deviation(a: f64, b: f64) -> Option<f64> {
    let longer = a.max(b);
    if longer <= 0.0 {
        return None;
    }
    Some(1.0 - a.min(b) / longer)
}

/// Distance in cm for a marker covering `pixel_area`, or `None` for a
/// non-positive size.
pub fn distance_from_area(pixel_area: f64, calibration: &DistanceCalibration) -> Option<f64> {
    if !pixel_area.is_finite() || pixel_area <= 0.0 {
        return None;
    }
    let raw = calibration.constant / pixel_area.sqrt();
    Some(raw.clamp(calibration.min_cm, calibration.max_cm))
}

/// Saturating map from normalized deviation to degrees.
///
/// Steep near 0 so small tilts stay distinguishable, flattening towards 90.
pub fn angle_from_deviation(deviation: f64) -> f64 {
    let d = deviation.clamp(0.0, 1.0);
    let scale = 1.0 - (-ANGLE_CURVE_K).exp();
    clamp_angle(MAX_ANGLE_DEG * (1.0 - (-ANGLE_CURVE_K * d).exp()) / scale)
}

/// Exponential moving average, `weight` applied to the previous value.
pub fn smooth(previous: Option<f64>, current: f64, weight: f64) -> f64 {
    match previous {
        Some(previous) => previous * weight + current * (1.0 - weight),
        None => current,
    }
}

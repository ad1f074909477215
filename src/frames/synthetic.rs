//! Renders a dark marker sliding along a weld line.
//!
//! Used by the host binary when no camera is attached, and by tests that want
//! to drive the vision path end to end.

use crate::error::AppError;
use crate::frames::{FrameInput, FrameSource, GrayFrame};
use crate::pose::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticScene {
    pub width: usize,
    pub height: usize,
    pub background: u8,
    pub marker: u8,
    pub marker_side_px: f64,
    /// Each top corner is pulled inwards by this much to fake a tilted marker.
    pub top_inset_px: f64,
    pub start_x: f64,
    pub travel_px_per_s: f64,
    pub travel_px: f64,
    /// Reported alongside every frame as the device inclination.
    pub tilt_deg: f64,
}

impl Default for SyntheticScene {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            background: 200,
            marker: 20,
            marker_side_px: 40.0,
            top_inset_px: 2.0,
            start_x: 120.0,
            travel_px_per_s: 80.0,
            travel_px: 80.0,
            tilt_deg: 20.0,
        }
    }
}

#[derive(Debug, Default)]
pub struct SyntheticFrameSource {
    scene: SyntheticScene,
    origin_ms: Option<u64>,
}

impl SyntheticFrameSource {
    pub fn new(scene: SyntheticScene) -> Self {
        Self {
            scene,
            origin_ms: None,
        }
    }

    /// Marker corners (TL, TR, BR, BL) at `elapsed_ms` into the pass.
    pub fn corners_at(&self, elapsed_ms: u64) -> [Point; 4] {
        let scene = &self.scene;
        let travelled = scene.travel_px_per_s * elapsed_ms as f64 / 1000.0;
        let offset = if scene.travel_px > 0.0 {
            travelled % scene.travel_px
        } else {
            0.0
        };
        let half = scene.marker_side_px / 2.0;
        let cx = scene.start_x + offset;
        let cy = scene.height as f64 / 2.0;
        [
            Point::new(cx - half + scene.top_inset_px, cy - half),
            Point::new(cx + half - scene.top_inset_px, cy - half),
            Point::new(cx + half, cy + half),
            Point::new(cx - half, cy + half),
        ]
    }

    pub fn render(&self, elapsed_ms: u64) -> GrayFrame {
        let scene = &self.scene;
        let mut frame = GrayFrame::filled(scene.width, scene.height, scene.background);
        render_quad(&mut frame, &self.corners_at(elapsed_ms), scene.marker);
        frame
    }
}

impl FrameSource for SyntheticFrameSource {
    fn next_frame(&mut self, timestamp_ms: u64) -> Result<FrameInput, AppError> {
        let origin = *self.origin_ms.get_or_insert(timestamp_ms);
        Ok(FrameInput {
            timestamp_ms,
            frame: Some(self.render(timestamp_ms.saturating_sub(origin))),
            tilt_deg: Some(self.scene.tilt_deg),
        })
    }
}

/// Fill a convex polygon given in clockwise or counter-clockwise order.
///
/// Pixels whose coordinates lie on the boundary count as inside.
pub fn render_quad(frame: &mut GrayFrame, corners: &[Point], value: u8) {
    if corners.len() < 3 {
        return;
    }
    let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min).floor().max(0.0);
    let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max).ceil();
    let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min).floor().max(0.0);
    let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max).ceil();
    if !max_x.is_finite() || !max_y.is_finite() || max_x < 0.0 || max_y < 0.0 {
        return;
    }
    let max_x = max_x.min(frame.width() as f64 - 1.0);
    let max_y = max_y.min(frame.height() as f64 - 1.0);

    for y in (min_y as usize)..=(max_y as usize) {
        for x in (min_x as usize)..=(max_x as usize) {
            if inside_convex(corners, Point::new(x as f64, y as f64)) {
                frame.set(x, y, value);
            }
        }
    }
}

fn inside_convex(corners: &[Point], p: Point) -> bool {
    const EPS: f64 = 1e-9;
    let mut sign = 0.0f64;
    for i in 0..corners.len() {
        let a = corners[i];
        let b = corners[(i + 1) % corners.len()];
        let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
        if cross.abs() <= EPS {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

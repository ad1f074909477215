//! Overlay draw commands.
//!
//! The engine never draws. Each tick returns an [`Overlay`] that a renderer
//! can replay onto the camera view.

use crate::pose::{Point, PoseEstimate, PoseStatus};
use crate::profile::Band;
use serde::Serialize;

const RETICLE_HALF_LEN: f64 = 40.0;
const TARGET_RADIUS: f64 = 60.0;
const GAUGE_ARC_RADIUS: f64 = 80.0;
const GAUGE_NEEDLE_LEN: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleZone {
    TooLow,
    Optimal,
    TooHigh,
}

impl AngleZone {
    pub fn classify(angle_deg: f64, optimal: &Band) -> Self {
        if angle_deg < optimal.min {
            AngleZone::TooLow
        } else if angle_deg > optimal.max {
            AngleZone::TooHigh
        } else {
            AngleZone::Optimal
        }
    }

    pub fn color(self) -> Color {
        match self {
            AngleZone::Optimal => Color::GREEN,
            AngleZone::TooLow => Color::YELLOW,
            AngleZone::TooHigh => Color::RED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const GREEN: Color = Color::rgba(0, 255, 0, 1.0);
    pub const YELLOW: Color = Color::rgba(255, 255, 0, 1.0);
    pub const RED: Color = Color::rgba(255, 0, 0, 1.0);
    pub const GUIDE: Color = Color::rgba(0, 255, 0, 0.6);
    pub const TARGET: Color = Color::rgba(0, 200, 255, 0.4);
    pub const OPTIMAL_ARC: Color = Color::rgba(0, 255, 0, 0.3);
    pub const TRAIL: Color = Color::rgba(255, 140, 0, 0.8);

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    Line {
        from: Point,
        to: Point,
        color: Color,
        width: f64,
    },
    Circle {
        center: Point,
        radius: f64,
        color: Color,
        width: f64,
    },
    /// Angles in degrees, 0 pointing up, clockwise.
    Arc {
        center: Point,
        radius: f64,
        start_deg: f64,
        end_deg: f64,
        color: Color,
        width: f64,
    },
    Polygon {
        points: Vec<Point>,
        color: Color,
        width: f64,
    },
    Polyline {
        points: Vec<Point>,
        color: Color,
        width: f64,
    },
    Label {
        at: Point,
        text: String,
        color: Color,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Overlay {
    pub commands: Vec<DrawCommand>,
}

impl Overlay {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Screen point `length` away from `center` at a gauge angle.
fn gauge_point(center: Point, angle_deg: f64, length: f64) -> Point {
    let rad = (angle_deg - 90.0).to_radians();
    Point::new(center.x + rad.cos() * length, center.y + rad.sin() * length)
}

pub fn compose(
    width: f64,
    height: f64,
    estimate: &PoseEstimate,
    trail: &[Point],
    optimal: &Band,
) -> Overlay {
    let center = Point::new(width / 2.0, height / 2.0);
    let mut commands = vec![
        DrawCommand::Line {
            from: Point::new(center.x - RETICLE_HALF_LEN, center.y),
            to: Point::new(center.x + RETICLE_HALF_LEN, center.y),
            color: Color::GUIDE,
            width: 2.0,
        },
        DrawCommand::Line {
            from: Point::new(center.x, center.y - RETICLE_HALF_LEN),
            to: Point::new(center.x, center.y + RETICLE_HALF_LEN),
            color: Color::GUIDE,
            width: 2.0,
        },
        DrawCommand::Circle {
            center,
            radius: TARGET_RADIUS,
            color: Color::TARGET,
            width: 2.0,
        },
    ];

    if let Some(quad) = &estimate.quad {
        commands.push(DrawCommand::Polygon {
            points: quad.corners().to_vec(),
            color: Color::GREEN,
            width: 3.0,
        });
    }

    if trail.len() >= 2 {
        commands.push(DrawCommand::Polyline {
            points: trail.to_vec(),
            color: Color::TRAIL,
            width: 3.0,
        });
    }

    match estimate.angle_deg {
        Some(angle) => {
            let zone = AngleZone::classify(angle, optimal);
            commands.push(DrawCommand::Arc {
                center,
                radius: GAUGE_ARC_RADIUS,
                start_deg: optimal.min,
                end_deg: optimal.max,
                color: Color::OPTIMAL_ARC,
                width: 6.0,
            });
            commands.push(DrawCommand::Line {
                from: center,
                to: gauge_point(center, angle, GAUGE_NEEDLE_LEN),
                color: zone.color(),
                width: 4.0,
            });
        }
        None => {
            commands.push(DrawCommand::Label {
                at: Point::new(center.x, center.y + TARGET_RADIUS + 20.0),
                text: "searching".to_string(),
                color: Color::YELLOW,
            });
        }
    }

    if estimate.status == PoseStatus::TiltOnly {
        commands.push(DrawCommand::Label {
            at: Point::new(10.0, 20.0),
            text: "tilt sensor".to_string(),
            color: Color::TARGET,
        });
    }

    Overlay { commands }
}

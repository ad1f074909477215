//! Sliding-window kinematics for the tracked torch.
//!
//! The tracker only holds bounded history buffers. Each derived signal is
//! recomputed from those buffers on every update.

use crate::pose::{Point, PoseSample};
use serde::Serialize;

pub mod buffer;
pub mod metrics;

pub use buffer::HistoryBuffer;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    pub angle_capacity: usize,
    pub path_capacity: usize,
    pub distance_capacity: usize,
    /// Positions closer together in time than this are not buffered.
    pub min_position_interval_ms: u64,
    pub px_per_cm: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            angle_capacity: 30,
            path_capacity: 50,
            distance_capacity: 10,
            min_position_interval_ms: 100,
            px_per_cm: 10.0,
        }
    }
}

/// Derived signals after one update; `None` means unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Kinematics {
    /// cm/s along the screen path.
    pub translation_speed: Option<f64>,
    /// cm/s, negative while approaching.
    pub approach_speed: Option<f64>,
    pub stability: Option<f64>,
    pub straightness: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct KinematicTracker {
    config: TrackerConfig,
    angles: HistoryBuffer<f64>,
    positions: HistoryBuffer<(u64, Point)>,
    distances: HistoryBuffer<(u64, f64)>,
}

impl KinematicTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            angles: HistoryBuffer::new(config.angle_capacity),
            positions: HistoryBuffer::new(config.path_capacity),
            distances: HistoryBuffer::new(config.distance_capacity),
            config,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn update(&mut self, sample: &PoseSample) -> Kinematics {
        self.angles.push(sample.angle_deg);

        if let Some(pos) = sample.screen_pos {
            let due = match self.positions.latest() {
                Some((last_ts, _)) => {
                    sample.timestamp_ms.saturating_sub(*last_ts) > self.config.min_position_interval_ms
                }
                None => true,
            };
            if due {
                self.positions.push((sample.timestamp_ms, pos));
            }
        }

        let approach_speed = sample.distance_cm.map(|distance| {
            let previous = self.distances.latest().copied();
            self.distances.push((sample.timestamp_ms, distance));
            metrics::approach_speed(previous, (sample.timestamp_ms, distance))
        });

        Kinematics {
            translation_speed: metrics::translation_speed(
                &self.positions.to_vec(),
                self.config.px_per_cm,
            ),
            approach_speed,
            stability: metrics::angular_stability(&self.angles.to_vec()),
            straightness: metrics::path_straightness(&self.path()),
        }
    }

    /// Buffered screen positions, oldest first.
    pub fn path(&self) -> Vec<Point> {
        self.positions.iter().map(|(_, p)| *p).collect()
    }

    /// Drops the timed buffers so speed and path restart after a gap in
    /// updates. Angle history carries over.
    pub fn restart_span(&mut self) {
        self.positions.clear();
        self.distances.clear();
    }

    pub fn reset(&mut self) {
        self.angles.clear();
        self.positions.clear();
        self.distances.clear();
    }
}

impl Default for KinematicTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

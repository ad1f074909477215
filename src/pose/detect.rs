//! Best-effort marker detection on a luminance frame.
//!
//! Finds the darkest connected blob near the frame centre and reads its four
//! corners off the diagonals. No pattern decoding takes place: anything dark,
//! square-ish and big enough in the middle of the frame counts as the marker.
//! Misses are expected and are reported as `None`.

use crate::frames::GrayFrame;
use crate::pose::{Point, Quad};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Fraction of each frame dimension covered by the centred search window.
    pub search_fraction: f64,
    /// Minimum `(background + 1) / (region + 1)` luminance ratio.
    pub min_contrast: f64,
    pub min_area_px: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            search_fraction: 0.6,
            min_contrast: 1.5,
            min_area_px: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerDetection {
    pub quad: Quad,
    pub area_px: usize,
    pub contrast: f64,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

impl Window {
    fn centred(frame: &GrayFrame, fraction: f64) -> Option<Self> {
        let fraction = fraction.clamp(0.05, 1.0);
        let span = |len: usize| -> (usize, usize) {
            let size = ((len as f64) * fraction).round().max(1.0) as usize;
            let start = (len - size.min(len)) / 2;
            (start, start + size.min(len))
        };
        let (x0, x1) = span(frame.width());
        let (y0, y1) = span(frame.height());
        if x1 - x0 < 3 || y1 - y0 < 3 {
            return None;
        }
        Some(Self { x0, y0, x1, y1 })
    }

    fn width(&self) -> usize {
        self.x1 - self.x0
    }

    fn height(&self) -> usize {
        self.y1 - self.y0
    }

    fn on_edge(&self, x: usize, y: usize) -> bool {
        x == self.x0 || y == self.y0 || x + 1 == self.x1 || y + 1 == self.y1
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarkerDetector {
    config: DetectorConfig,
}

impl MarkerDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn detect(&self, frame: &GrayFrame) -> Option<MarkerDetection> {
        let window = Window::centred(frame, self.config.search_fraction)?;
        let (seed, window_sum) = darkest_near_centre(frame, &window);
        let window_count = window.width() * window.height();
        let window_mean = window_sum as f64 / window_count as f64;

        let seed_value = frame.get(seed.0, seed.1) as f64;
        if seed_value >= window_mean {
            return None;
        }
        let threshold = ((seed_value + window_mean) / 2.0).floor() as u8;

        let region = flood_fill(frame, &window, seed, threshold)?;
        if region.pixels < self.config.min_area_px {
            return None;
        }

        let background_count = window_count - region.pixels;
        if background_count == 0 {
            return None;
        }
        let region_mean = region.sum as f64 / region.pixels as f64;
        let background_mean = (window_sum - region.sum) as f64 / background_count as f64;
        let contrast = (background_mean + 1.0) / (region_mean + 1.0);
        if contrast < self.config.min_contrast {
            return None;
        }

        let quad = Quad::from_corners(&region.corners())?;
        if quad.area() <= 0.0 {
            return None;
        }

        Some(MarkerDetection {
            quad,
            area_px: region.pixels,
            contrast,
        })
    }
}

/// Darkest pixel in the window, ties broken towards the window centre.
fn darkest_near_centre(frame: &GrayFrame, window: &Window) -> ((usize, usize), u64) {
    let cx = (window.x0 + window.x1) as f64 / 2.0;
    let cy = (window.y0 + window.y1) as f64 / 2.0;
    let mut best = (window.x0, window.y0);
    let mut best_key = (u8::MAX, f64::INFINITY);
    let mut sum = 0u64;

    for y in window.y0..window.y1 {
        for x in window.x0..window.x1 {
            let value = frame.get(x, y);
            sum += value as u64;
            let dist = (x as f64 - cx).hypot(y as f64 - cy);
            if value < best_key.0 || (value == best_key.0 && dist < best_key.1) {
                best = (x, y);
                best_key = (value, dist);
            }
        }
    }
    (best, sum)
}

struct Region {
    pixels: usize,
    sum: u64,
    // Diagonal extremes: min/max of x+y and x-y.
    min_sum: (i64, Point),
    max_sum: (i64, Point),
    min_diff: (i64, Point),
    max_diff: (i64, Point),
}

impl Region {
    fn new(x: usize, y: usize) -> Self {
        let p = Point::new(x as f64, y as f64);
        let s = x as i64 + y as i64;
        let d = x as i64 - y as i64;
        Self {
            pixels: 0,
            sum: 0,
            min_sum: (s, p),
            max_sum: (s, p),
            min_diff: (d, p),
            max_diff: (d, p),
        }
    }

    fn add(&mut self, x: usize, y: usize, value: u8) {
        self.pixels += 1;
        self.sum += value as u64;
        let p = Point::new(x as f64, y as f64);
        let s = x as i64 + y as i64;
        let d = x as i64 - y as i64;
        if s < self.min_sum.0 {
            self.min_sum = (s, p);
        }
        if s > self.max_sum.0 {
            self.max_sum = (s, p);
        }
        if d < self.min_diff.0 {
            self.min_diff = (d, p);
        }
        if d > self.max_diff.0 {
            self.max_diff = (d, p);
        }
    }

    fn corners(&self) -> [Point; 4] {
        [self.min_sum.1, self.max_diff.1, self.max_sum.1, self.min_diff.1]
    }
}

/// 4-connected fill of pixels at or below `threshold`.
///
/// A region that reaches the window edge is not a marker seen whole and is
/// rejected.
fn flood_fill(
    frame: &GrayFrame,
    window: &Window,
    seed: (usize, usize),
    threshold: u8,
) -> Option<Region> {
    let w = window.width();
    let mut visited = vec![false; w * window.height()];
    let index = |x: usize, y: usize| (y - window.y0) * w + (x - window.x0);

    let mut region = Region::new(seed.0, seed.1);
    let mut queue = VecDeque::new();
    visited[index(seed.0, seed.1)] = true;
    queue.push_back(seed);

    while let Some((x, y)) = queue.pop_front() {
        if window.on_edge(x, y) {
            return None;
        }
        region.add(x, y, frame.get(x, y));

        let neighbours = [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)];
        for (nx, ny) in neighbours {
            let i = index(nx, ny);
            if !visited[i] && frame.get(nx, ny) <= threshold {
                visited[i] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    Some(region)
}

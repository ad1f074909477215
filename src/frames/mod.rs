//! Frame-source boundary.
//!
//! The camera stream and tilt sensor live outside the engine. A
//! [`FrameSource`] hands the driver one [`FrameInput`] per tick; when it
//! fails, the driver logs the error and ticks with an empty input.

use crate::error::AppError;

pub mod mock;
pub mod synthetic;

/// 8-bit luminance image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl GrayFrame {
    /// Returns `None` when `pixels` does not match `width * height`.
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || width.checked_mul(height)? != pixels.len() {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![value; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = value;
        }
    }
}

/// Everything the outside world delivers for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    pub timestamp_ms: u64,
    pub frame: Option<GrayFrame>,
    /// Raw device inclination in degrees, any sign.
    pub tilt_deg: Option<f64>,
}

impl FrameInput {
    pub fn empty(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            frame: None,
            tilt_deg: None,
        }
    }
}

pub trait FrameSource {
    fn next_frame(&mut self, timestamp_ms: u64) -> Result<FrameInput, AppError>;
}

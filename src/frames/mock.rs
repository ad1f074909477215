use crate::error::AppError;
use crate::frames::{FrameInput, FrameSource, GrayFrame};

/// What the mock hands out on one call.
#[derive(Debug, Clone)]
pub enum MockFrame {
    Tilt(f64),
    Frame(GrayFrame),
    Empty,
    Fail,
}

/// Scripted frame source; returns `Empty` once the script runs out.
pub struct MockFrameSource {
    script: Vec<MockFrame>,
    next_index: usize,
}

impl MockFrameSource {
    pub fn new(script: Vec<MockFrame>) -> Self {
        Self {
            script,
            next_index: 0,
        }
    }

    pub fn calls(&self) -> usize {
        self.next_index
    }

    fn next_step(&mut self) -> MockFrame {
        let step = self
            .script
            .get(self.next_index)
            .cloned()
            .unwrap_or(MockFrame::Empty);
        self.next_index += 1;
        step
    }
}

impl FrameSource for MockFrameSource {
    fn next_frame(&mut self, timestamp_ms: u64) -> Result<FrameInput, AppError> {
        match self.next_step() {
            MockFrame::Tilt(tilt) => Ok(FrameInput {
                timestamp_ms,
                frame: None,
                tilt_deg: Some(tilt),
            }),
            MockFrame::Frame(frame) => Ok(FrameInput {
                timestamp_ms,
                frame: Some(frame),
                tilt_deg: None,
            }),
            MockFrame::Empty => Ok(FrameInput::empty(timestamp_ms)),
            MockFrame::Fail => Err(AppError::FrameSource("mock camera disconnected".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_plays_in_order_then_runs_dry() {
        let mut source = MockFrameSource::new(vec![MockFrame::Tilt(12.0), MockFrame::Fail]);

        let first = source.next_frame(10).expect("tilt frame");
        assert_eq!(first.tilt_deg, Some(12.0));

        let err = source.next_frame(20).unwrap_err();
        assert_eq!(err.to_string(), "frame source error: mock camera disconnected");

        let dry = source.next_frame(30).expect("empty frame");
        assert_eq!(dry, FrameInput::empty(30));
        assert_eq!(source.calls(), 3);
    }
}

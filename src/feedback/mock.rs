use crate::error::AppError;
use crate::feedback::{FeedbackChannel, FeedbackEvent, FeedbackSink};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Recorded {
    events: Vec<(FeedbackChannel, FeedbackEvent)>,
    attempts: usize,
}

/// Sink that records delivered cues. Clones share the same log, so a test
/// can keep one handle after boxing the other into a gate.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    recorded: Arc<Mutex<Recorded>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every emit fails and nothing is recorded.
    pub fn failing() -> Self {
        Self {
            recorded: Arc::default(),
            fail: true,
        }
    }

    pub fn events(&self) -> Vec<(FeedbackChannel, FeedbackEvent)> {
        self.recorded
            .lock()
            .map(|guard| guard.events.clone())
            .unwrap_or_default()
    }

    pub fn attempts(&self) -> usize {
        self.recorded.lock().map(|guard| guard.attempts).unwrap_or(0)
    }

    pub fn count(&self, event: FeedbackEvent) -> usize {
        self.events().iter().filter(|(_, e)| *e == event).count()
    }
}

impl FeedbackSink for RecordingSink {
    fn emit(&mut self, channel: FeedbackChannel, event: FeedbackEvent) -> Result<(), AppError> {
        let mut guard = self
            .recorded
            .lock()
            .map_err(|_| AppError::Feedback("recording sink lock poisoned".to_string()))?;
        guard.attempts += 1;
        if self.fail {
            return Err(AppError::Feedback("mock speaker unplugged".to_string()));
        }
        guard.events.push((channel, event));
        Ok(())
    }
}

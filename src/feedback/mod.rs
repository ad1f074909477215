//! Audio and haptic cues.
//!
//! Delivery is best effort: a failing sink is logged and the engine carries
//! on. Each event kind has its own cooldown.

use crate::error::AppError;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

pub mod mock;

pub const DEFAULT_COOLDOWN_MS: u64 = 500;
pub const WELD_PULSE_INTERVAL_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackChannel {
    Sound,
    Vibration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackEvent {
    AngleTooLow,
    AngleTooHigh,
    AngleOptimal,
    CalibrationConfirmed,
    ArcStarted,
    WeldPulse,
}

impl FeedbackEvent {
    pub fn channels(self) -> &'static [FeedbackChannel] {
        match self {
            FeedbackEvent::AngleTooLow | FeedbackEvent::AngleTooHigh | FeedbackEvent::AngleOptimal => {
                &[FeedbackChannel::Sound]
            }
            FeedbackEvent::CalibrationConfirmed | FeedbackEvent::ArcStarted => {
                &[FeedbackChannel::Sound, FeedbackChannel::Vibration]
            }
            FeedbackEvent::WeldPulse => &[FeedbackChannel::Vibration],
        }
    }

    /// Vibration pattern in milliseconds, alternating on/off.
    pub fn vibration_pattern(self) -> &'static [u64] {
        match self {
            FeedbackEvent::ArcStarted => &[50, 30, 50],
            FeedbackEvent::CalibrationConfirmed => &[100],
            FeedbackEvent::WeldPulse => &[50],
            _ => &[],
        }
    }
}

pub trait FeedbackSink: Send {
    fn emit(&mut self, channel: FeedbackChannel, event: FeedbackEvent) -> Result<(), AppError>;
}

/// Sink that only writes a debug line per cue.
#[derive(Debug, Default)]
pub struct LogSink;

impl FeedbackSink for LogSink {
    fn emit(&mut self, channel: FeedbackChannel, event: FeedbackEvent) -> Result<(), AppError> {
        debug!(
            channel = ?channel,
            event = ?event,
            pattern = ?event.vibration_pattern(),
            "Feedback cue"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackSettings {
    pub sound_enabled: bool,
    pub vibration_enabled: bool,
    pub cooldown_ms: u64,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            vibration_enabled: true,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
        }
    }
}

impl FeedbackSettings {
    fn channel_enabled(&self, channel: FeedbackChannel) -> bool {
        match channel {
            FeedbackChannel::Sound => self.sound_enabled,
            FeedbackChannel::Vibration => self.vibration_enabled,
        }
    }

    fn cooldown_for(&self, event: FeedbackEvent) -> u64 {
        match event {
            FeedbackEvent::WeldPulse => WELD_PULSE_INTERVAL_MS,
            _ => self.cooldown_ms,
        }
    }
}

/// Rate-limits events and routes them to the enabled channels.
pub struct FeedbackGate {
    sink: Box<dyn FeedbackSink>,
    settings: FeedbackSettings,
    last_fired_ms: HashMap<FeedbackEvent, u64>,
}

impl FeedbackGate {
    pub fn new(sink: Box<dyn FeedbackSink>, settings: FeedbackSettings) -> Self {
        Self {
            sink,
            settings,
            last_fired_ms: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &FeedbackSettings {
        &self.settings
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.settings.sound_enabled = enabled;
    }

    pub fn set_vibration_enabled(&mut self, enabled: bool) {
        self.settings.vibration_enabled = enabled;
    }

    /// Returns true when the event was handed to at least one channel.
    /// Events with every channel disabled do not start a cooldown.
    pub fn notify(&mut self, event: FeedbackEvent, now_ms: u64) -> bool {
        if let Some(last) = self.last_fired_ms.get(&event)
            && now_ms.saturating_sub(*last) < self.settings.cooldown_for(event)
        {
            return false;
        }

        let mut delivered = false;
        for channel in event.channels() {
            if !self.settings.channel_enabled(*channel) {
                continue;
            }
            delivered = true;
            if let Err(err) = self.sink.emit(*channel, event) {
                warn!(error = %err, channel = ?channel, event = ?event, "Feedback sink failed");
            }
        }

        if delivered {
            self.last_fired_ms.insert(event, now_ms);
        }
        delivered
    }
}

impl std::fmt::Debug for FeedbackGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackGate")
            .field("settings", &self.settings)
            .field("last_fired_ms", &self.last_fired_ms)
            .finish()
    }
}

impl Default for FeedbackGate {
    fn default() -> Self {
        Self::new(Box::new(LogSink), FeedbackSettings::default())
    }
}

//! Tick-driven composition of pose, tracking, session and feedback.
//!
//! `Engine` is single-threaded. Every call runs to completion and nothing in
//! here locks; the host serializes access by owning the engine on one thread.

use crate::display::{self, AngleZone, Overlay};
use crate::feedback::{FeedbackEvent, FeedbackGate, FeedbackSettings, FeedbackSink};
use crate::frames::FrameInput;
use crate::pose::{PoseEstimate, PoseSample, PoseSource, PoseStatus, SourceKind};
use crate::profile::{ProcessKind, ProcessProfile};
use crate::report;
use crate::scoring::Results;
use crate::session::{Session, SessionPhase};
use crate::tracker::{KinematicTracker, Kinematics, TrackerConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_MATERIAL: &str = "steel";
const DEFAULT_VIEW_SIZE: (f64, f64) = (320.0, 240.0);

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub process: ProcessKind,
    pub material: String,
    pub tracker: TrackerConfig,
    pub feedback: FeedbackSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            process: ProcessKind::Mig,
            material: DEFAULT_MATERIAL.to_string(),
            tracker: TrackerConfig::default(),
            feedback: FeedbackSettings::default(),
        }
    }
}

/// Partial settings change; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub process: Option<ProcessKind>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub sound_enabled: Option<bool>,
    #[serde(default)]
    pub vibration_enabled: Option<bool>,
}

/// Everything one tick produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub estimate: PoseEstimate,
    pub sample: Option<PoseSample>,
    /// Only present while welding.
    pub kinematics: Option<Kinematics>,
    pub recorded: bool,
    pub overlay: Overlay,
}

/// Read-only view published after each tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub timestamp_ms: u64,
    pub phase: SessionPhase,
    pub elapsed_ms: Option<u64>,
    pub elapsed: String,
    pub live_score: Option<f64>,
    pub samples: usize,
    pub source: SourceKind,
    pub pose_status: PoseStatus,
    pub angle_deg: Option<f64>,
    pub distance_cm: Option<f64>,
    pub angle_zone: Option<AngleZone>,
    pub kinematics: Kinematics,
    pub process: ProcessKind,
    pub material: String,
    pub sound_enabled: bool,
    pub vibration_enabled: bool,
}

#[derive(Debug)]
pub struct Engine {
    profile: &'static ProcessProfile,
    material: String,
    source: Box<dyn PoseSource>,
    tracker: KinematicTracker,
    session: Session,
    feedback: FeedbackGate,
    last_estimate: PoseEstimate,
    last_kinematics: Kinematics,
    last_zone: Option<AngleZone>,
    view_size: (f64, f64),
}

impl Engine {
    pub fn new(
        source: Box<dyn PoseSource>,
        sink: Box<dyn FeedbackSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            profile: config.process.profile(),
            material: config.material,
            source,
            tracker: KinematicTracker::new(config.tracker),
            session: Session::new(),
            feedback: FeedbackGate::new(sink, config.feedback),
            last_estimate: PoseEstimate::searching(),
            last_kinematics: Kinematics::default(),
            last_zone: None,
            view_size: DEFAULT_VIEW_SIZE,
        }
    }

    pub fn profile(&self) -> &'static ProcessProfile {
        self.profile
    }

    pub fn material(&self) -> &str {
        &self.material
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn results(&self) -> Option<&Results> {
        self.session.results()
    }

    pub fn feedback_settings(&self) -> &FeedbackSettings {
        self.feedback.settings()
    }

    pub fn tick(&mut self, input: &FrameInput) -> TickReport {
        let now_ms = input.timestamp_ms;
        if let Some(frame) = &input.frame {
            self.view_size = (frame.width() as f64, frame.height() as f64);
        }

        let estimate = self.source.observe(input);
        let sample = estimate.to_sample(now_ms);

        let mut kinematics = None;
        let mut recorded = false;
        if self.session.is_welding() {
            if let Some(sample) = &sample {
                let update = self.tracker.update(sample);
                recorded = self.session.record(sample, &update, self.profile);
                self.last_kinematics = update;
                kinematics = Some(update);
                self.angle_feedback(sample.angle_deg, now_ms);
            }
            self.feedback.notify(FeedbackEvent::WeldPulse, now_ms);
        }

        let trail = self.tracker.path();
        let overlay = display::compose(
            self.view_size.0,
            self.view_size.1,
            &estimate,
            &trail,
            &self.profile.optimal_angle,
        );

        self.last_estimate = estimate.clone();
        TickReport {
            estimate,
            sample,
            kinematics,
            recorded,
            overlay,
        }
    }

    /// Out-of-band angles cue every cooldown; re-entering the band cues once.
    fn angle_feedback(&mut self, angle_deg: f64, now_ms: u64) {
        let zone = AngleZone::classify(angle_deg, &self.profile.optimal_angle);
        match zone {
            AngleZone::TooLow => {
                self.feedback.notify(FeedbackEvent::AngleTooLow, now_ms);
            }
            AngleZone::TooHigh => {
                self.feedback.notify(FeedbackEvent::AngleTooHigh, now_ms);
            }
            AngleZone::Optimal => {
                if self.last_zone.is_some_and(|last| last != AngleZone::Optimal) {
                    self.feedback.notify(FeedbackEvent::AngleOptimal, now_ms);
                }
            }
        }
        self.last_zone = Some(zone);
    }

    fn reset_tracking(&mut self) {
        self.tracker.reset();
        self.source.reset();
        self.last_kinematics = Kinematics::default();
        self.last_zone = None;
    }

    pub fn start(&mut self, now_ms: u64) -> bool {
        if !self.session.start(now_ms) {
            return false;
        }
        self.reset_tracking();
        true
    }

    pub fn begin_welding(&mut self, now_ms: u64) -> bool {
        let was_active = self.session.is_active();
        if !self.session.begin_welding(now_ms) {
            return false;
        }
        if was_active {
            self.tracker.restart_span();
        } else {
            self.reset_tracking();
        }
        info!(process = %self.profile.kind, "Arc started");
        self.feedback.notify(FeedbackEvent::ArcStarted, now_ms);
        true
    }

    pub fn pause_welding(&mut self) -> bool {
        let paused = self.session.pause_welding();
        if paused {
            info!("Welding paused");
        }
        paused
    }

    /// Scores the session. `None` if nothing was running.
    pub fn stop(&mut self, now_ms: u64) -> Option<Results> {
        self.session.stop(now_ms, self.profile).cloned()
    }

    pub fn calibrate_zero(&mut self, now_ms: u64) -> bool {
        let calibrated = self.source.calibrate_zero();
        if calibrated {
            self.feedback
                .notify(FeedbackEvent::CalibrationConfirmed, now_ms);
        } else {
            debug!(source = ?self.source.kind(), "No tilt reading to calibrate from");
        }
        calibrated
    }

    /// Recorded angle scores keep the bands they were taken with.
    pub fn set_process(&mut self, process: ProcessKind) {
        if self.profile.kind != process {
            info!(from = %self.profile.kind, to = %process, "Process changed");
            self.profile = process.profile();
        }
    }

    pub fn apply_settings(&mut self, update: SettingsUpdate) {
        if let Some(process) = update.process {
            self.set_process(process);
        }
        if let Some(material) = update.material {
            self.material = material;
        }
        if let Some(enabled) = update.sound_enabled {
            self.feedback.set_sound_enabled(enabled);
        }
        if let Some(enabled) = update.vibration_enabled {
            self.feedback.set_vibration_enabled(enabled);
        }
    }

    pub fn snapshot(&self, now_ms: u64) -> EngineSnapshot {
        let elapsed_ms = self.session.elapsed_ms(now_ms);
        let settings = self.feedback.settings();
        EngineSnapshot {
            timestamp_ms: now_ms,
            phase: self.session.phase(),
            elapsed_ms,
            elapsed: report::format_elapsed(elapsed_ms.unwrap_or(0)),
            live_score: self.session.live_score(),
            samples: self.session.metrics().sample_count(),
            source: self.source.kind(),
            pose_status: self.last_estimate.status,
            angle_deg: self.last_estimate.angle_deg,
            distance_cm: self.last_estimate.distance_cm,
            angle_zone: self
                .last_estimate
                .angle_deg
                .map(|angle| AngleZone::classify(angle, &self.profile.optimal_angle)),
            kinematics: self.last_kinematics,
            process: self.profile.kind,
            material: self.material.clone(),
            sound_enabled: settings.sound_enabled,
            vibration_enabled: settings.vibration_enabled,
        }
    }
}

use crate::pose::PoseSample;
use crate::profile::ProcessProfile;
use crate::scoring::{Results, SessionMetrics, score_session};
use crate::tracker::Kinematics;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    /// Evaluation running, welding not yet started.
    Active,
    Welding,
    Paused,
    Stopped,
}

impl SessionPhase {
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionPhase::Active | SessionPhase::Welding | SessionPhase::Paused
        )
    }
}

/// One evaluation at a time. Results from the last stopped session survive
/// until the next stop overwrites them.
#[derive(Debug, Clone)]
pub struct Session {
    phase: SessionPhase,
    started_at_ms: Option<u64>,
    stopped_at_ms: Option<u64>,
    metrics: SessionMetrics,
    results: Option<Results>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            started_at_ms: None,
            stopped_at_ms: None,
            metrics: SessionMetrics::default(),
            results: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    pub fn is_welding(&self) -> bool {
        self.phase == SessionPhase::Welding
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    pub fn results(&self) -> Option<&Results> {
        self.results.as_ref()
    }

    /// Returns false when a session is already running.
    pub fn start(&mut self, now_ms: u64) -> bool {
        if self.is_active() {
            return false;
        }
        self.metrics.clear();
        self.started_at_ms = Some(now_ms);
        self.stopped_at_ms = None;
        self.phase = SessionPhase::Active;
        info!(started_at_ms = now_ms, "Evaluation session started");
        true
    }

    /// Starts a session first when none is running. Returns false if welding
    /// was already active.
    pub fn begin_welding(&mut self, now_ms: u64) -> bool {
        if !self.is_active() {
            self.start(now_ms);
        }
        if self.phase == SessionPhase::Welding {
            return false;
        }
        self.phase = SessionPhase::Welding;
        true
    }

    pub fn pause_welding(&mut self) -> bool {
        if self.phase != SessionPhase::Welding {
            return false;
        }
        self.phase = SessionPhase::Paused;
        true
    }

    /// Scores the session against `profile`. `None` when nothing was running.
    pub fn stop(&mut self, now_ms: u64, profile: &ProcessProfile) -> Option<&Results> {
        if !self.is_active() {
            return None;
        }
        let duration_ms = self
            .started_at_ms
            .map(|start| now_ms.saturating_sub(start))
            .unwrap_or(0);
        let results = score_session(&self.metrics, profile, duration_ms);
        info!(
            samples = results.sample_count,
            final_score = ?results.final_score,
            duration_ms,
            "Evaluation session stopped"
        );
        self.phase = SessionPhase::Stopped;
        self.stopped_at_ms = Some(now_ms);
        self.results = Some(results);
        self.results.as_ref()
    }

    /// Appends a sample while welding; ignored in every other phase.
    pub fn record(
        &mut self,
        sample: &PoseSample,
        kinematics: &Kinematics,
        profile: &ProcessProfile,
    ) -> bool {
        if !self.is_welding() {
            return false;
        }
        self.metrics.record(sample, kinematics, profile);
        true
    }

    /// Time since start, frozen at the stop time once stopped.
    pub fn elapsed_ms(&self, now_ms: u64) -> Option<u64> {
        let start = self.started_at_ms?;
        let end = match self.phase {
            SessionPhase::Stopped => self.stopped_at_ms.unwrap_or(now_ms),
            _ => now_ms,
        };
        Some(end.saturating_sub(start))
    }

    pub fn live_score(&self) -> Option<f64> {
        self.metrics.live_score()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

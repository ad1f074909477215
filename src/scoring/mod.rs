//! Session scoring.
//!
//! Per-sample angle scores are computed live while welding; everything else is
//! aggregated once, when the session stops. Scoring is deterministic: the same
//! metrics and profile always give the same [`Results`].

use crate::pose::PoseSample;
use crate::profile::{Band, ProcessFamily, ProcessKind, ProcessProfile, ScoreWeights};
use crate::tracker::Kinematics;
use serde::Serialize;

pub mod recommendations;
pub mod tiers;

/// Points lost per degree outside the optimal angle band.
pub const ANGLE_PENALTY_PER_DEG: f64 = 15.0;

pub fn angle_score(angle_deg: f64, optimal: &Band) -> f64 {
    (100.0 - optimal.distance_outside(angle_deg) * ANGLE_PENALTY_PER_DEG).max(0.0)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Angle,
    Stability,
    Speed,
    Approach,
    Straightness,
    Distance,
}

impl MetricKind {
    /// Order used for recommendations and reports.
    pub const PRIORITY: [MetricKind; 6] = [
        MetricKind::Angle,
        MetricKind::Stability,
        MetricKind::Speed,
        MetricKind::Approach,
        MetricKind::Straightness,
        MetricKind::Distance,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MetricKind::Angle => "Angle",
            MetricKind::Stability => "Stability",
            MetricKind::Speed => "Travel speed",
            MetricKind::Approach => "Approach speed",
            MetricKind::Straightness => "Straightness",
            MetricKind::Distance => "Distance",
        }
    }

    fn weight(self, weights: &ScoreWeights) -> f64 {
        match self {
            MetricKind::Angle => weights.angle,
            MetricKind::Stability => weights.stability,
            MetricKind::Speed => weights.speed,
            MetricKind::Approach => weights.approach,
            MetricKind::Straightness => weights.straightness,
            MetricKind::Distance => weights.distance,
        }
    }
}

/// Values accumulated while welding. A value is pushed only when its signal
/// was available on that tick, so the arrays can differ in length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionMetrics {
    pub angle_scores: Vec<f64>,
    pub stability_scores: Vec<f64>,
    pub speed_values: Vec<f64>,
    pub approach_speed_values: Vec<f64>,
    pub straightness_values: Vec<f64>,
    pub distance_values: Vec<f64>,
}

impl SessionMetrics {
    pub fn record(&mut self, sample: &PoseSample, kinematics: &Kinematics, profile: &ProcessProfile) {
        self.angle_scores
            .push(angle_score(sample.angle_deg, &profile.optimal_angle));
        if let Some(stability) = kinematics.stability {
            self.stability_scores.push(stability);
        }
        if let Some(speed) = kinematics.translation_speed {
            self.speed_values.push(speed.abs());
        }
        if let Some(approach) = kinematics.approach_speed {
            self.approach_speed_values.push(approach);
        }
        if let Some(straightness) = kinematics.straightness {
            self.straightness_values.push(straightness);
        }
        if let Some(distance) = sample.distance_cm {
            self.distance_values.push(distance);
        }
    }

    pub fn sample_count(&self) -> usize {
        self.angle_scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angle_scores.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Running score shown while welding: half angle, half stability.
    pub fn live_score(&self) -> Option<f64> {
        let angle = mean(&self.angle_scores)?;
        match mean(&self.stability_scores) {
            Some(stability) => Some(angle * 0.5 + stability * 0.5),
            None => Some(angle),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricScore {
    pub score: f64,
    /// Mean raw value behind the score, for metrics that have one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricScores {
    pub angle: Option<MetricScore>,
    pub stability: Option<MetricScore>,
    pub speed: Option<MetricScore>,
    pub approach: Option<MetricScore>,
    pub straightness: Option<MetricScore>,
    pub distance: Option<MetricScore>,
}

impl MetricScores {
    pub fn get(&self, metric: MetricKind) -> Option<&MetricScore> {
        match metric {
            MetricKind::Angle => self.angle.as_ref(),
            MetricKind::Stability => self.stability.as_ref(),
            MetricKind::Speed => self.speed.as_ref(),
            MetricKind::Approach => self.approach.as_ref(),
            MetricKind::Straightness => self.straightness.as_ref(),
            MetricKind::Distance => self.distance.as_ref(),
        }
    }

    /// Weighted mean over the available metrics, weights renormalized to 1.
    pub fn weighted_final(&self, weights: &ScoreWeights) -> Option<f64> {
        let mut total_weight = 0.0;
        let mut weighted = 0.0;
        for metric in MetricKind::PRIORITY {
            if let Some(score) = self.get(metric) {
                let weight = metric.weight(weights);
                total_weight += weight;
                weighted += score.score * weight;
            }
        }
        if total_weight <= 0.0 {
            return None;
        }
        Some((weighted / total_weight).clamp(0.0, 100.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Expert,
}

impl SkillLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            SkillLevel::Expert
        } else if score >= 60.0 {
            SkillLevel::Intermediate
        } else {
            SkillLevel::Beginner
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Expert => "Expert",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultsStatus {
    Scored,
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Results {
    pub status: ResultsStatus,
    pub process: ProcessKind,
    pub duration_ms: u64,
    pub sample_count: usize,
    pub final_score: Option<f64>,
    /// Share of angle samples inside the optimal band.
    pub angle_in_band_percent: Option<f64>,
    pub skill_level: Option<SkillLevel>,
    pub metrics: MetricScores,
    pub recommendations: Vec<String>,
}

impl Results {
    fn no_data(process: ProcessKind, duration_ms: u64) -> Self {
        Self {
            status: ResultsStatus::NoData,
            process,
            duration_ms,
            sample_count: 0,
            final_score: None,
            angle_in_band_percent: None,
            skill_level: None,
            metrics: MetricScores::default(),
            recommendations: vec![recommendations::NO_DATA_MESSAGE.to_string()],
        }
    }
}

/// Signed mean for consumable electrodes, whose feed direction matters.
/// Other processes average per-sample magnitudes, so moving in and out does
/// not cancel.
fn approach_mean(values: &[f64], family: ProcessFamily) -> Option<f64> {
    match family {
        ProcessFamily::ConsumableElectrode => mean(values),
        ProcessFamily::ContinuousFeed => {
            let magnitudes: Vec<f64> = values.iter().map(|v| v.abs()).collect();
            mean(&magnitudes)
        }
    }
}

pub fn score_session(metrics: &SessionMetrics, profile: &ProcessProfile, duration_ms: u64) -> Results {
    if metrics.is_empty() {
        return Results::no_data(profile.kind, duration_ms);
    }
    let family = profile.kind.family();

    let in_band = metrics.angle_scores.iter().filter(|s| **s >= 100.0).count();
    let angle_in_band_percent = in_band as f64 / metrics.angle_scores.len() as f64 * 100.0;

    let scores = MetricScores {
        angle: mean(&metrics.angle_scores).map(|score| MetricScore {
            score,
            average: None,
        }),
        stability: mean(&metrics.stability_scores).map(|score| MetricScore {
            score,
            average: None,
        }),
        speed: mean(&metrics.speed_values).map(|avg| MetricScore {
            score: tiers::speed_score(avg, &profile.optimal_speed, family),
            average: Some(avg),
        }),
        approach: approach_mean(&metrics.approach_speed_values, family).map(|avg| {
            MetricScore {
                score: tiers::approach_score(avg, family),
                average: Some(avg),
            }
        }),
        straightness: mean(&metrics.straightness_values).map(|score| MetricScore {
            score,
            average: None,
        }),
        distance: mean(&metrics.distance_values).map(|avg| MetricScore {
            score: tiers::distance_score(avg, &profile.optimal_distance, family),
            average: Some(avg),
        }),
    };

    let final_score = scores.weighted_final(&profile.weights);
    let recommendations = recommendations::recommend(&scores, profile.kind);

    Results {
        status: ResultsStatus::Scored,
        process: profile.kind,
        duration_ms,
        sample_count: metrics.sample_count(),
        final_score,
        angle_in_band_percent: Some(angle_in_band_percent),
        skill_level: final_score.map(SkillLevel::from_score),
        metrics: scores,
        recommendations,
    }
}

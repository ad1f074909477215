use crate::profile::ProcessKind;
use crate::scoring::{MetricKind, MetricScores};

/// Metrics scoring below this get a corrective tip.
pub const RECOMMENDATION_THRESHOLD: f64 = 70.0;

pub const POSITIVE_REINFORCEMENT: &str = "Excellent technique! Keep practicing to stay consistent.";
pub const NO_DATA_MESSAGE: &str =
    "No welding samples were recorded. Hold the weld trigger while moving along the joint.";

pub fn tip(metric: MetricKind, process: ProcessKind) -> &'static str {
    use MetricKind::*;
    use ProcessKind::*;
    match (metric, process) {
        (Angle, Mig) => "For MIG/MAG, hold the torch between 15° and 25°.",
        (Angle, Tig) => "For TIG, hold the torch between 10° and 20°.",
        (Angle, Stick) => "Keep the electrode between 5° and 15°.",
        (Stability, _) => "Brace your elbow to steady the torch angle.",
        (Speed, Mig) => "MIG: aim for a travel speed of 5-15 cm/s.",
        (Speed, Tig) => "TIG: aim for a travel speed of 3-10 cm/s.",
        (Speed, Stick) => "Stick: advance slowly, around 0.3-0.8 cm/s.",
        (Approach, Stick) => {
            "Feed the electrode towards the work gradually (-0.1 to -0.5 cm/s) as it burns down."
        }
        (Approach, _) => "Hold the torch distance constant (variation under 0.3 cm/s).",
        (Straightness, _) => "Practice following a straight line along the joint.",
        (Distance, Mig) => "MIG: keep 15-25 cm from the work.",
        (Distance, Tig) => "TIG: keep 8-15 cm from the work.",
        (Distance, Stick) => "Stick: keep 5-10 cm from the work.",
    }
}

/// Tips in metric priority order, or the positive message when nothing
/// falls below the threshold.
pub fn recommend(scores: &MetricScores, process: ProcessKind) -> Vec<String> {
    let mut recommendations: Vec<String> = MetricKind::PRIORITY
        .iter()
        .filter_map(|metric| {
            let score = scores.get(*metric)?.score;
            (score < RECOMMENDATION_THRESHOLD).then(|| tip(*metric, process).to_string())
        })
        .collect();

    if recommendations.is_empty() {
        recommendations.push(POSITIVE_REINFORCEMENT.to_string());
    }
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::MetricScore;

    fn score(value: f64) -> Option<MetricScore> {
        Some(MetricScore {
            score: value,
            average: None,
        })
    }

    #[test]
    fn all_good_gets_positive_message() {
        let scores = MetricScores {
            angle: score(95.0),
            stability: score(88.0),
            speed: score(92.5),
            approach: score(92.5),
            straightness: score(70.0),
            distance: score(80.0),
        };

        assert_eq!(
            recommend(&scores, ProcessKind::Mig),
            vec![POSITIVE_REINFORCEMENT.to_string()]
        );
    }

    #[test]
    fn tips_follow_priority_order() {
        let scores = MetricScores {
            angle: score(95.0),
            stability: score(40.0),
            speed: score(92.5),
            approach: score(47.5),
            straightness: score(90.0),
            distance: score(30.0),
        };

        let tips = recommend(&scores, ProcessKind::Stick);

        assert_eq!(
            tips,
            vec![
                tip(MetricKind::Stability, ProcessKind::Stick).to_string(),
                tip(MetricKind::Approach, ProcessKind::Stick).to_string(),
                tip(MetricKind::Distance, ProcessKind::Stick).to_string(),
            ]
        );
    }

    #[test]
    fn unavailable_metrics_are_skipped() {
        let scores = MetricScores {
            angle: score(50.0),
            ..MetricScores::default()
        };

        let tips = recommend(&scores, ProcessKind::Tig);

        assert_eq!(tips, vec![tip(MetricKind::Angle, ProcessKind::Tig).to_string()]);
    }

    #[test]
    fn tips_are_process_specific() {
        assert_ne!(
            tip(MetricKind::Speed, ProcessKind::Mig),
            tip(MetricKind::Speed, ProcessKind::Stick)
        );
        assert_ne!(
            tip(MetricKind::Approach, ProcessKind::Mig),
            tip(MetricKind::Approach, ProcessKind::Stick)
        );
    }
}

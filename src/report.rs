//! Human-readable session summary.

use crate::profile::{ProcessFamily, ProcessKind};
use crate::scoring::{MetricKind, MetricScore, Results, ResultsStatus};
use std::fmt::Write;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Shown wherever a metric is unavailable.
pub const UNAVAILABLE: &str = "--";

/// `mm:ss`; minutes keep counting past 59.
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let total_secs = elapsed_ms / 1000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(value) if value.is_finite() => format!("{}", value.round() as i64),
        _ => UNAVAILABLE.to_string(),
    }
}

fn format_average(average: Option<f64>, unit: &str) -> String {
    match average {
        Some(value) if value.is_finite() => format!("{value:.1} {unit}"),
        _ => UNAVAILABLE.to_string(),
    }
}

/// One-line verdict for a metric score.
pub fn metric_feedback(metric: MetricKind, score: &MetricScore, process: ProcessKind) -> String {
    let value = score.score;
    let electrode = process.family() == ProcessFamily::ConsumableElectrode;
    match metric {
        MetricKind::Angle => {
            let name = process.display_name();
            if value >= 90.0 {
                format!("Perfect angle for {name}")
            } else if value >= 70.0 {
                format!("Good angle control for {name}")
            } else if value >= 50.0 {
                format!("Acceptable angle for {name}")
            } else {
                format!("Angle needs work for {name}")
            }
        }
        MetricKind::Stability => banded(
            value,
            [
                "Very steady hand",
                "Acceptable stability",
                "Noticeable wobble",
                "Very unsteady, keep training",
            ],
        ),
        MetricKind::Straightness => banded(
            value,
            [
                "Very straight line",
                "Acceptable straightness",
                "Line somewhat curved",
                "Practice following a straight line",
            ],
        ),
        MetricKind::Speed => {
            let avg = format_average(score.average, "cm/s");
            let (good, fair, poor) = if electrode {
                ("Perfect pace", "Acceptable pace", "Irregular pace")
            } else {
                ("Optimal speed", "Moderate speed", "Unsuitable speed")
            };
            format!("{} ({avg})", tiered(value, good, fair, poor))
        }
        MetricKind::Approach => {
            if electrode {
                let avg = format_average(score.average, "cm/s");
                let label = tiered(value, "Steady feed", "Acceptable feed", "Irregular feed");
                format!("{label} ({avg})")
            } else {
                tiered(
                    value,
                    "Very constant distance",
                    "Acceptable distance control",
                    "Too much distance variation",
                )
                .to_string()
            }
        }
        MetricKind::Distance => {
            let avg = format_average(score.average, "cm");
            let label = tiered(value, "Optimal distance", "Adequate distance", "Wrong distance");
            format!("{label} ({avg})")
        }
    }
}

/// Four bands at 85 / 65 / 45.
fn banded(value: f64, labels: [&str; 4]) -> String {
    let label = if value >= 85.0 {
        labels[0]
    } else if value >= 65.0 {
        labels[1]
    } else if value >= 45.0 {
        labels[2]
    } else {
        labels[3]
    };
    label.to_string()
}

/// Three bands at 80 / 60.
fn tiered<'a>(value: f64, good: &'a str, fair: &'a str, poor: &'a str) -> &'a str {
    if value >= 80.0 {
        good
    } else if value >= 60.0 {
        fair
    } else {
        poor
    }
}

/// Plain-text summary suitable for sharing.
pub fn render(results: &Results, material: &str, generated_at: OffsetDateTime) -> String {
    let timestamp = generated_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| generated_at.unix_timestamp().to_string());
    let mut out = String::new();

    let _ = writeln!(out, "Welding trainer results: {}", results.process.display_name());
    let _ = writeln!(out, "Generated: {timestamp}");
    let _ = writeln!(out, "Material: {material}");
    let _ = writeln!(out, "Duration: {}", format_elapsed(results.duration_ms));
    let _ = writeln!(out, "Samples: {}", results.sample_count);

    if results.status == ResultsStatus::NoData {
        let _ = writeln!(out, "Final score: {UNAVAILABLE}");
    } else {
        let _ = writeln!(out, "Final score: {}/100", format_score(results.final_score));
        if let Some(level) = results.skill_level {
            let _ = writeln!(out, "Skill level: {}", level.label());
        }
        if let Some(percent) = results.angle_in_band_percent {
            let _ = writeln!(out, "Time in optimal angle: {percent:.0}%");
        }
    }

    let _ = writeln!(out);
    for metric in MetricKind::PRIORITY {
        match results.metrics.get(metric) {
            Some(score) => {
                let _ = writeln!(
                    out,
                    "{}: {}% - {}",
                    metric.label(),
                    format_score(Some(score.score)),
                    metric_feedback(metric, score, results.process)
                );
            }
            None => {
                let _ = writeln!(out, "{}: {UNAVAILABLE}", metric.label());
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Recommendations:");
    for recommendation in &results.recommendations {
        let _ = writeln!(out, "- {recommendation}");
    }
    out
}

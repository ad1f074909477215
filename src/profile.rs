//! Welding process profiles.
//!
//! Each process carries its optimal angle, distance and travel-speed bands plus
//! the weight vector used for the final session score. The table is fixed at
//! compile time; configuration only selects which entry is active.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Distance to whichever bound was violated, 0 inside the band.
    pub fn distance_outside(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }

    /// Same band with both ends scaled, used for graduated tolerance tiers.
    pub fn widened(&self, low_factor: f64, high_factor: f64) -> Self {
        Self::new(self.min * low_factor, self.max * high_factor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessKind {
    /// MIG/MAG, continuous wire feed.
    #[serde(alias = "mag")]
    Mig,
    Tig,
    /// Shielded metal arc with a consumable covered electrode.
    #[serde(alias = "electrode", alias = "smaw")]
    Stick,
}

/// Scoring family a process belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessFamily {
    ContinuousFeed,
    ConsumableElectrode,
}

impl ProcessKind {
    pub const ALL: [ProcessKind; 3] = [ProcessKind::Mig, ProcessKind::Tig, ProcessKind::Stick];

    pub fn family(self) -> ProcessFamily {
        match self {
            ProcessKind::Mig | ProcessKind::Tig => ProcessFamily::ContinuousFeed,
            ProcessKind::Stick => ProcessFamily::ConsumableElectrode,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ProcessKind::Mig => "MIG/MAG",
            ProcessKind::Tig => "TIG",
            ProcessKind::Stick => "Stick",
        }
    }

    pub fn profile(self) -> &'static ProcessProfile {
        match self {
            ProcessKind::Mig => &MIG_PROFILE,
            ProcessKind::Tig => &TIG_PROFILE,
            ProcessKind::Stick => &STICK_PROFILE,
        }
    }
}

impl fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessKind::Mig => "mig",
            ProcessKind::Tig => "tig",
            ProcessKind::Stick => "stick",
        };
        f.write_str(name)
    }
}

/// Relative importance of each metric in the final score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub angle: f64,
    pub stability: f64,
    pub speed: f64,
    pub approach: f64,
    pub straightness: f64,
    pub distance: f64,
}

impl ScoreWeights {
    pub fn total(&self) -> f64 {
        self.angle + self.stability + self.speed + self.approach + self.straightness + self.distance
    }
}

const CONTINUOUS_FEED_WEIGHTS: ScoreWeights = ScoreWeights {
    angle: 0.25,
    stability: 0.20,
    speed: 0.20,
    approach: 0.10,
    straightness: 0.15,
    distance: 0.10,
};

const CONSUMABLE_ELECTRODE_WEIGHTS: ScoreWeights = ScoreWeights {
    angle: 0.20,
    stability: 0.15,
    speed: 0.15,
    approach: 0.25,
    straightness: 0.15,
    distance: 0.10,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessProfile {
    pub kind: ProcessKind,
    pub optimal_angle: Band,
    pub optimal_distance: Band,
    pub optimal_speed: Band,
    pub weights: ScoreWeights,
}

static MIG_PROFILE: ProcessProfile = ProcessProfile {
    kind: ProcessKind::Mig,
    optimal_angle: Band::new(15.0, 25.0),
    optimal_distance: Band::new(15.0, 25.0),
    optimal_speed: Band::new(5.0, 15.0),
    weights: CONTINUOUS_FEED_WEIGHTS,
};

static TIG_PROFILE: ProcessProfile = ProcessProfile {
    kind: ProcessKind::Tig,
    optimal_angle: Band::new(10.0, 20.0),
    optimal_distance: Band::new(8.0, 15.0),
    optimal_speed: Band::new(3.0, 10.0),
    weights: CONTINUOUS_FEED_WEIGHTS,
};

static STICK_PROFILE: ProcessProfile = ProcessProfile {
    kind: ProcessKind::Stick,
    optimal_angle: Band::new(5.0, 15.0),
    optimal_distance: Band::new(5.0, 10.0),
    optimal_speed: Band::new(0.3, 0.8),
    weights: CONSUMABLE_ELECTRODE_WEIGHTS,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_profile_has_weights_summing_to_one() {
        for kind in ProcessKind::ALL {
            let total = kind.profile().weights.total();
            assert!((total - 1.0).abs() < 1e-9, "{kind}: {total}");
        }
    }

    #[test]
    fn band_distance_is_measured_to_violated_bound() {
        let band = Band::new(15.0, 25.0);

        assert_eq!(band.distance_outside(20.0), 0.0);
        assert_eq!(band.distance_outside(10.0), 5.0);
        assert_eq!(band.distance_outside(27.5), 2.5);
    }

    #[test]
    fn process_accepts_aliases() -> Result<(), Box<dyn std::error::Error>> {
        #[derive(Deserialize)]
        struct Training {
            process: ProcessKind,
        }

        let parse = |name: &str| toml::from_str::<Training>(&format!("process = \"{name}\""));
        assert_eq!(parse("mig")?.process, ProcessKind::Mig);
        assert_eq!(parse("mag")?.process, ProcessKind::Mig);
        assert_eq!(parse("electrode")?.process, ProcessKind::Stick);
        assert_eq!(parse("smaw")?.process, ProcessKind::Stick);
        assert!(parse("laser").is_err());
        Ok(())
    }

    #[test]
    fn stick_is_the_consumable_electrode_family() {
        assert_eq!(ProcessKind::Stick.family(), ProcessFamily::ConsumableElectrode);
        assert_eq!(ProcessKind::Tig.family(), ProcessFamily::ContinuousFeed);
    }
}

//! Tiered sub-scores for session averages.
//!
//! Each tier returns a fixed value so identical sessions always score the
//! same.

use crate::profile::{Band, ProcessFamily};

pub fn speed_score(mean_speed: f64, optimal: &Band, family: ProcessFamily) -> f64 {
    if optimal.contains(mean_speed) {
        return 92.5;
    }
    match family {
        ProcessFamily::ConsumableElectrode => {
            if optimal.widened(0.7, 1.3).contains(mean_speed) {
                75.0
            } else {
                50.0
            }
        }
        ProcessFamily::ContinuousFeed => {
            if optimal.widened(0.8, 1.2).contains(mean_speed) {
                80.0
            } else if optimal.widened(0.6, 1.4).contains(mean_speed) {
                60.0
            } else {
                45.0
            }
        }
    }
}

/// Consumable electrodes want a slow, steady feed towards the work and are
/// given the signed mean. The other processes want the distance held and are
/// given the mean magnitude.
pub fn approach_score(mean_approach: f64, family: ProcessFamily) -> f64 {
    match family {
        ProcessFamily::ConsumableElectrode => {
            if Band::new(-0.5, -0.1).contains(mean_approach) {
                90.0
            } else if Band::new(-0.7, -0.05).contains(mean_approach) {
                70.0
            } else {
                47.5
            }
        }
        ProcessFamily::ContinuousFeed => {
            let magnitude = mean_approach.abs();
            if magnitude < 0.3 {
                92.5
            } else if magnitude < 0.6 {
                75.0
            } else if magnitude < 1.0 {
                55.0
            } else {
                37.5
            }
        }
    }
}

/// Tiers scale with the band width, so narrow bands are judged more strictly.
pub fn distance_score(mean_distance: f64, optimal: &Band, family: ProcessFamily) -> f64 {
    let diff = (mean_distance - optimal.midpoint()).abs();
    let range = optimal.width();
    match family {
        ProcessFamily::ConsumableElectrode => {
            if diff <= range * 0.3 {
                90.0
            } else if diff <= range * 0.6 {
                70.0
            } else if diff <= range {
                50.0
            } else {
                30.0
            }
        }
        ProcessFamily::ContinuousFeed => {
            if diff <= range * 0.2 {
                92.5
            } else if diff <= range * 0.4 {
                80.0
            } else if diff <= range * 0.6 {
                60.0
            } else {
                40.0
            }
        }
    }
}

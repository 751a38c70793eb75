use log::debug;
use serde::{Deserialize, Serialize};

use crate::distribution::{Distribution, Label};
use crate::error::{require_finite, InferenceError, Result};
use crate::types::{Sample, TransportMode};

use TransportMode::*;

/// Stops above this count add weight to bus/auto.
pub const STOP_FREQUENCY_THRESHOLD: f64 = 5.0;
/// Samples slower than this (km/h) count as a stop.
pub const STOP_SPEED_KMH: f64 = 2.0;

pub const FEATURES_USED: [&str; 3] = ["speed", "acceleration", "stop_frequency"];

/// Speed brackets: (upper bound exclusive, base table). Row order is tie-break order.
const SPEED_BRACKETS: [(f64, &[(TransportMode, f64)]); 5] = [
    (5.0, &[(Walk, 0.8), (Bicycle, 0.1), (Car, 0.1)]),
    (15.0, &[(Bicycle, 0.6), (Walk, 0.2), (Auto, 0.2)]),
    (40.0, &[(Auto, 0.4), (Car, 0.3), (Bus, 0.3)]),
    (80.0, &[(Car, 0.5), (Bus, 0.3), (Train, 0.2)]),
    (f64::INFINITY, &[(Train, 0.6), (Car, 0.3), (Airplane, 0.1)]),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModeFeatures {
    /// km/h
    #[serde(alias = "speed")]
    pub speed_kmh: f64,
    #[serde(default)]
    pub acceleration: f64,
    /// Stop episodes per segment: runs of consecutive samples below
    /// `STOP_SPEED_KMH`, each counted once.
    #[serde(default)]
    pub stop_frequency: f64,
}

impl ModeFeatures {
    pub fn new(speed_kmh: f64, acceleration: f64, stop_frequency: f64) -> Self {
        Self { speed_kmh, acceleration, stop_frequency }
    }

    /// Mean speed, mean acceleration magnitude and stop episodes of one track.
    /// Standing still for several samples at one light is a single stop.
    pub fn from_track(samples: &[Sample]) -> Result<Self> {
        if samples.is_empty() {
            return Err(InferenceError::EmptyBatch("mode features need at least one sample"));
        }
        let n = samples.len() as f64;
        let speed = samples.iter().map(|s| s.speed_kmh).sum::<f64>() / n;

        let mags: Vec<f64> = samples
            .iter()
            .filter_map(|s| s.acceleration.map(|a| a.magnitude()))
            .collect();
        let acceleration = if mags.is_empty() {
            0.0
        } else {
            mags.iter().sum::<f64>() / mags.len() as f64
        };

        let mut stops = 0usize;
        let mut stopped = false;
        for s in samples {
            let now_stopped = s.speed_kmh < STOP_SPEED_KMH;
            if now_stopped && !stopped {
                stops += 1;
            }
            stopped = now_stopped;
        }

        Ok(Self::new(speed, acceleration, stops as f64))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeClassification {
    pub mode: TransportMode,
    pub confidence: f64,
    /// Every mode; absent ones at 0.
    pub probabilities: Distribution<TransportMode>,
    pub features_used: [&'static str; 3],
}

fn base_table(speed_kmh: f64) -> &'static [(TransportMode, f64)] {
    SPEED_BRACKETS
        .iter()
        .find(|(upper, _)| speed_kmh < *upper)
        .map(|(_, table)| *table)
        .unwrap_or(SPEED_BRACKETS[SPEED_BRACKETS.len() - 1].1)
}

/// Bracket table by speed, stop adjustment, normalization, argmax.
///
/// Ties go to the earlier row of the bracket table, then to labels added by the
/// stop adjustment (bus before auto). Negative speeds fall into the lowest
/// bracket.
pub fn classify_mode(features: &ModeFeatures) -> Result<ModeClassification> {
    let speed = require_finite("speed", features.speed_kmh)?;
    require_finite("acceleration", features.acceleration)?;
    let stop_frequency = require_finite("stop_frequency", features.stop_frequency)?;

    let mut dist = Distribution::from_table(base_table(speed));
    if stop_frequency > STOP_FREQUENCY_THRESHOLD {
        dist.add(Bus, 0.2);
        dist.add(Auto, 0.1);
    }

    let dist = dist.normalized()?;
    let (mode, confidence) = dist
        .top()
        .ok_or_else(|| InferenceError::NormalizationFailure("empty mode table".into()))?;

    debug!(
        "mode speed={:.1} stops={:.1} -> {} ({:.3})",
        speed,
        stop_frequency,
        mode.as_str(),
        confidence
    );

    Ok(ModeClassification {
        mode,
        confidence,
        probabilities: dist.zero_filled(),
        features_used: FEATURES_USED,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::SUM_TOLERANCE;

    fn top(speed: f64, stops: f64) -> TransportMode {
        classify_mode(&ModeFeatures::new(speed, 0.0, stops)).unwrap().mode
    }

    #[test]
    fn bracket_edges_are_lower_inclusive() {
        assert_eq!(top(0.0, 0.0), Walk);
        assert_eq!(top(4.999, 0.0), Walk);
        assert_eq!(top(5.0, 0.0), Bicycle);
        assert_eq!(top(15.0, 0.0), Auto);
        assert_eq!(top(40.0, 0.0), Car);
        assert_eq!(top(80.0, 0.0), Train);
        assert_eq!(top(300.0, 0.0), Train);
    }

    #[test]
    fn negative_speed_falls_into_lowest_bracket() {
        assert_eq!(top(-3.0, 0.0), Walk);
    }

    #[test]
    fn stop_tie_goes_to_table_order() {
        // [15,40) + stops: auto 0.5, car 0.3, bus 0.5 -> auto wins the tie
        let c = classify_mode(&ModeFeatures::new(20.0, 0.0, 6.0)).unwrap();
        assert_eq!(c.mode, Auto);
        assert!((c.probabilities.get(Auto) - c.probabilities.get(Bus)).abs() < 1e-12);
    }

    #[test]
    fn stop_threshold_is_strict() {
        let at = classify_mode(&ModeFeatures::new(50.0, 0.0, 5.0)).unwrap();
        assert_eq!(at.probabilities.get(Auto), 0.0);
        let above = classify_mode(&ModeFeatures::new(50.0, 0.0, 5.5)).unwrap();
        assert!(above.probabilities.get(Auto) > 0.0);
        assert!((above.probabilities.get(Bus) - 0.5 / 1.3).abs() < 1e-12);
    }

    #[test]
    fn every_mode_reported_and_normalized() {
        for speed in [0.0, 7.0, 22.0, 55.0, 120.0] {
            for stops in [0.0, 9.0] {
                let c = classify_mode(&ModeFeatures::new(speed, 0.0, stops)).unwrap();
                assert_eq!(c.probabilities.entries().len(), TransportMode::ALL.len());
                assert!((c.probabilities.total() - 1.0).abs() < SUM_TOLERANCE);
                assert_eq!(c.probabilities.get(Boat), 0.0);
            }
        }
    }

    fn track(speeds: &[f64]) -> Vec<Sample> {
        use chrono::{Duration, TimeZone, Utc};
        let t0 = Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap();
        speeds
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample::new(t0 + Duration::seconds(i as i64), 9.93, 76.26, v, 5.0))
            .collect()
    }

    #[test]
    fn standing_at_one_light_is_one_stop() {
        let f = ModeFeatures::from_track(&track(&[40.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 35.0])).unwrap();
        assert_eq!(f.stop_frequency, 1.0);
        assert_eq!(classify_mode(&f).unwrap().probabilities.get(Bus), 0.0);

        let f = ModeFeatures::from_track(&track(&[0.0, 0.0, 20.0, 1.0, 25.0, 0.5, 0.0, 30.0])).unwrap();
        assert_eq!(f.stop_frequency, 3.0);
    }

    #[test]
    fn rejects_non_finite_features() {
        assert!(classify_mode(&ModeFeatures::new(f64::NAN, 0.0, 0.0)).is_err());
        assert!(classify_mode(&ModeFeatures::new(10.0, f64::INFINITY, 0.0)).is_err());
    }
}

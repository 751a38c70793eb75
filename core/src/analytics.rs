use serde::Serialize;

use crate::error::{require_finite, InferenceError, Result};
use crate::geo::{path_length_m, GeoPoint};
use crate::mode::STOP_SPEED_KMH;
use crate::types::Sample;

/// Summary of one recorded track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackAnalytics {
    /// km
    pub total_distance: f64,
    pub avg_speed: f64,
    pub max_speed: f64,
    pub min_speed: f64,
    pub points_analyzed: usize,
    /// samples slower than 2 km/h
    pub stop_count: usize,
    /// minutes, assuming one sample per second
    pub moving_time: f64,
}

/// Path length, speed stats and stop/moving split of a track.
pub fn track_analytics(samples: &[Sample]) -> Result<TrackAnalytics> {
    if samples.is_empty() {
        return Err(InferenceError::EmptyBatch("no GPS data"));
    }

    let points = samples
        .iter()
        .map(|s| s.location().validate())
        .collect::<Result<Vec<GeoPoint>>>()?;
    let total_distance = path_length_m(&points)? / 1000.0;

    let speeds = samples
        .iter()
        .map(|s| {
            let v = require_finite("speed", s.speed_kmh)?;
            if v < 0.0 {
                return Err(InferenceError::InvalidInput(format!("speed must be non-negative, got {v}")));
            }
            Ok(v)
        })
        .collect::<Result<Vec<f64>>>()?;
    let n = speeds.len() as f64;
    let avg_speed = speeds.iter().sum::<f64>() / n;
    let max_speed = speeds.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_speed = speeds.iter().copied().fold(f64::INFINITY, f64::min);

    let stop_count = speeds.iter().filter(|v| **v < STOP_SPEED_KMH).count();
    let moving_time = (speeds.len() - stop_count) as f64 / 60.0;

    Ok(TrackAnalytics {
        total_distance,
        avg_speed,
        max_speed,
        min_speed,
        points_analyzed: samples.len(),
        stop_count,
        moving_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn track(speeds: &[f64]) -> Vec<Sample> {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();
        speeds
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                Sample::new(t0 + Duration::seconds(i as i64), 9.95 + i as f64 * 0.001, 76.26, v, 5.0)
            })
            .collect()
    }

    #[test]
    fn summarizes_speeds_and_stops() {
        let a = track_analytics(&track(&[0.0, 1.0, 10.0, 20.0, 30.0, 0.5])).unwrap();
        assert_eq!(a.points_analyzed, 6);
        assert_eq!(a.stop_count, 3);
        assert_eq!(a.max_speed, 30.0);
        assert_eq!(a.min_speed, 0.0);
        assert!((a.moving_time - 3.0 / 60.0).abs() < 1e-12);
        // five hops of ~111 m
        assert!(a.total_distance > 0.5 && a.total_distance < 0.6);
    }

    #[test]
    fn rejects_nan_and_negative_speeds() {
        let mut t = track(&[5.0, 10.0]);
        t[1].speed_kmh = f64::NAN;
        assert!(matches!(track_analytics(&t), Err(InferenceError::InvalidInput(_))));
        t[1].speed_kmh = -4.0;
        assert!(matches!(track_analytics(&t), Err(InferenceError::InvalidInput(_))));

        let mut lone = track(&[5.0]);
        lone[0].lat = 91.0;
        assert!(matches!(track_analytics(&lone), Err(InferenceError::InvalidCoordinate { .. })));
    }

    #[test]
    fn empty_track_is_an_error() {
        assert!(matches!(track_analytics(&[]), Err(InferenceError::EmptyBatch(_))));
    }
}

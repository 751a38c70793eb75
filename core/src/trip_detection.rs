//! Trip boundary detection.
//!
//! Every subject owns one [`TripState`] slot. A sample is "moving" when its
//! speed is above the speed threshold *and* its fix is accurate enough; a poor
//! fix never asserts movement, whatever speed it reports.
//!
//! Confidence is binary (0.95 moving / 0.1 otherwise). It is a fixed rule, not
//! a calibrated probability, and callers should not treat it as one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::TripDetectorConfig;
use crate::error::{require_finite, InferenceError, Result};
use crate::geo::GeoPoint;
use crate::types::Sample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripEventKind {
    TripStart,
    TripContinue,
    TripEnd,
    Idle,
}

impl TripEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripEventKind::TripStart => "trip_start",
            TripEventKind::TripContinue => "trip_continue",
            TripEventKind::TripEnd => "trip_end",
            TripEventKind::Idle => "idle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripEvent {
    #[serde(rename = "event_type")]
    pub kind: TripEventKind,
    pub trip_detected: bool,
    pub confidence: f64,
    pub speed_kmh: f64,
    pub location: GeoPoint,
    /// Timestamp of the triggering sample.
    pub timestamp: DateTime<Utc>,
    /// 1 for the first event of a subject, +1 per evaluated sample.
    pub sequence: u64,
    /// Acceleration magnitude above threshold (supporting signal only).
    pub accelerating: bool,
}

/// Location, speed and accuracy of a sample the detector can use.
fn check_sample(sample: &Sample) -> Result<(GeoPoint, f64, f64)> {
    let location = sample.location().validate()?;
    let speed = require_finite("speed", sample.speed_kmh)?;
    let accuracy = require_finite("accuracy", sample.accuracy_m)?;
    if speed < 0.0 || accuracy < 0.0 {
        return Err(InferenceError::InvalidInput(format!(
            "speed/accuracy must be non-negative (speed={speed}, accuracy={accuracy})"
        )));
    }
    Ok((location, speed, accuracy))
}

/// Detector memory for one subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TripState {
    pub moving: bool,
    pub sequence: u64,
}

impl TripState {
    /// Classifies `sample` and advances the state machine.
    /// Invalid samples leave the state untouched.
    pub fn evaluate(&mut self, sample: &Sample, cfg: &TripDetectorConfig) -> Result<TripEvent> {
        let (location, speed, accuracy) = check_sample(sample)?;

        let moving = speed > cfg.min_moving_speed_kmh && accuracy < cfg.max_accuracy_m;
        let accelerating = sample
            .acceleration
            .map(|a| a.magnitude() > cfg.accel_threshold)
            .unwrap_or(false);

        let kind = match (self.moving, moving) {
            (false, true) => TripEventKind::TripStart,
            (true, true) => TripEventKind::TripContinue,
            (true, false) => TripEventKind::TripEnd,
            (false, false) => TripEventKind::Idle,
        };

        self.moving = moving;
        self.sequence += 1;

        Ok(TripEvent {
            kind,
            trip_detected: moving,
            confidence: if moving { cfg.moving_confidence } else { cfg.idle_confidence },
            speed_kmh: speed,
            location,
            timestamp: sample.timestamp,
            sequence: self.sequence,
            accelerating,
        })
    }
}

/// Subject id → detector slot.
///
/// The map lock is only held to find or create a slot; each slot has its own
/// lock, so samples for one subject are serialized while different subjects
/// proceed in parallel.
#[derive(Debug, Default)]
pub struct TripDetectorRegistry {
    config: TripDetectorConfig,
    slots: Mutex<HashMap<String, Arc<Mutex<TripState>>>>,
}

impl TripDetectorRegistry {
    pub fn new(config: TripDetectorConfig) -> Self {
        Self {
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &TripDetectorConfig {
        &self.config
    }

    fn slot(&self, subject_id: &str) -> Arc<Mutex<TripState>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .entry(subject_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(TripState::default())))
            .clone()
    }

    pub fn detect(&self, subject_id: &str, sample: &Sample) -> Result<TripEvent> {
        if subject_id.is_empty() {
            return Err(InferenceError::InvalidInput("subject id is empty".into()));
        }
        // a rejected sample must not register an unseen subject
        check_sample(sample)?;
        let slot = self.slot(subject_id);
        let mut state = slot.lock().unwrap_or_else(PoisonError::into_inner);
        let event = state.evaluate(sample, &self.config)?;
        debug!(
            "trip subject={} seq={} kind={} speed={:.1} acc_signal={}",
            subject_id,
            event.sequence,
            event.kind.as_str(),
            event.speed_kmh,
            event.accelerating
        );
        Ok(event)
    }

    /// Snapshot of a subject's state, if it has been seen.
    pub fn state(&self, subject_id: &str) -> Option<TripState> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(subject_id)
            .map(|slot| *slot.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Drops a subject's state; its next sample starts from `Idle`.
    pub fn forget(&self, subject_id: &str) -> bool {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(subject_id).is_some()
    }

    pub fn subject_count(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Acceleration;
    use chrono::TimeZone;

    fn sample(speed: f64, accuracy: f64) -> Sample {
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap();
        Sample::new(ts, 9.97, 76.28, speed, accuracy)
    }

    #[test]
    fn poor_accuracy_never_asserts_movement() {
        let mut st = TripState::default();
        let ev = st.evaluate(&sample(90.0, 25.0), &TripDetectorConfig::default()).unwrap();
        assert_eq!(ev.kind, TripEventKind::Idle);
        assert!(!ev.trip_detected);
        assert_eq!(ev.confidence, 0.1);
    }

    #[test]
    fn thresholds_are_strict() {
        let cfg = TripDetectorConfig::default();
        let mut st = TripState::default();
        assert_eq!(st.evaluate(&sample(2.0, 5.0), &cfg).unwrap().kind, TripEventKind::Idle);
        assert_eq!(st.evaluate(&sample(10.0, 20.0), &cfg).unwrap().kind, TripEventKind::Idle);
        assert_eq!(st.evaluate(&sample(2.01, 19.9), &cfg).unwrap().kind, TripEventKind::TripStart);
    }

    #[test]
    fn full_cycle() {
        let cfg = TripDetectorConfig::default();
        let mut st = TripState::default();
        let kinds: Vec<_> = [0.0, 12.0, 30.0, 0.0, 0.0]
            .iter()
            .map(|&v| st.evaluate(&sample(v, 5.0), &cfg).unwrap().kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TripEventKind::Idle,
                TripEventKind::TripStart,
                TripEventKind::TripContinue,
                TripEventKind::TripEnd,
                TripEventKind::Idle
            ]
        );
        assert_eq!(st.sequence, 5);
    }

    #[test]
    fn acceleration_is_recorded_but_does_not_start_trip() {
        let mut st = TripState::default();
        let s = sample(0.0, 5.0).with_acceleration(Acceleration::new(1.0, 1.0, 1.0));
        let ev = st.evaluate(&s, &TripDetectorConfig::default()).unwrap();
        assert!(ev.accelerating);
        assert_eq!(ev.kind, TripEventKind::Idle);
    }

    #[test]
    fn invalid_sample_leaves_state_untouched() {
        let mut st = TripState::default();
        let mut bad = sample(10.0, 5.0);
        bad.lat = 123.0;
        assert!(matches!(
            st.evaluate(&bad, &TripDetectorConfig::default()),
            Err(InferenceError::InvalidCoordinate { .. })
        ));
        assert!(st.evaluate(&sample(f64::NAN, 5.0), &TripDetectorConfig::default()).is_err());
        assert_eq!(st, TripState::default());
    }

    #[test]
    fn registry_keeps_subjects_apart() {
        let reg = TripDetectorRegistry::new(TripDetectorConfig::default());
        assert_eq!(reg.detect("a", &sample(20.0, 5.0)).unwrap().kind, TripEventKind::TripStart);
        assert_eq!(reg.detect("b", &sample(0.0, 5.0)).unwrap().kind, TripEventKind::Idle);
        assert_eq!(reg.detect("a", &sample(20.0, 5.0)).unwrap().kind, TripEventKind::TripContinue);
        assert_eq!(reg.subject_count(), 2);
        assert!(reg.forget("a"));
        assert_eq!(reg.detect("a", &sample(20.0, 5.0)).unwrap().kind, TripEventKind::TripStart);
    }

    #[test]
    fn rejected_first_sample_registers_nothing() {
        let reg = TripDetectorRegistry::new(TripDetectorConfig::default());
        let mut bad = sample(10.0, 5.0);
        bad.lng = 200.0;
        assert!(reg.detect("ghost", &bad).is_err());
        assert!(reg.detect("ghost", &sample(-1.0, 5.0)).is_err());
        assert_eq!(reg.state("ghost"), None);
        assert_eq!(reg.subject_count(), 0);

        assert_eq!(reg.detect("ghost", &sample(10.0, 5.0)).unwrap().sequence, 1);
    }
}

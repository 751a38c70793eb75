//! String-in/string-out call surface for the service layer.
//!
//! Requests are parsed tolerantly (field aliases, optional extras) with
//! `serde_path_to_error` so a rejected payload reports where it broke.
//! `call_<op>_from_json` runs against a process-wide engine; [`dispatch`]
//! takes an explicit one.

use std::env;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::{debug, info};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_path_to_error as spte;

use crate::companion::ProximityReading;
use crate::config::{load_config, EngineConfig};
use crate::engine::TravelInferenceEngine;
use crate::error::{InferenceError, Result};
use crate::geo::{GeoPoint, Geofence};
use crate::mode::ModeFeatures;
use crate::purpose::PurposeContext;
use crate::route::RoutePreferences;
use crate::types::{Acceleration, Sample, TripRecord};

/// Path to an `EngineConfig` JSON file for the process-wide engine.
pub const CONFIG_ENV: &str = "TRAVEL_INFERENCE_CONFIG";

/// Applied when a payload sample carries no accuracy.
pub const DEFAULT_ACCURACY_M: f64 = 10.0;

static ENGINE: Lazy<Result<TravelInferenceEngine>> = Lazy::new(|| {
    let config = match env::var(CONFIG_ENV) {
        Ok(path) => {
            info!("loading engine config from {path}");
            load_config(path)?
        }
        Err(_) => EngineConfig::default(),
    };
    TravelInferenceEngine::new(config)
});

/// The process-wide engine behind the `call_*_from_json` functions.
pub fn shared_engine() -> Result<&'static TravelInferenceEngine> {
    ENGINE.as_ref().map_err(Clone::clone)
}

// ──────────────────────────────────────────────────────────────────────────────
// Operations
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    DetectTrip,
    ClassifyMode,
    PredictPurpose,
    DetectCompanions,
    ScoreRoutes,
    AggregatePatterns,
    TrackAnalytics,
    CheckGeofences,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::DetectTrip,
        Operation::ClassifyMode,
        Operation::PredictPurpose,
        Operation::DetectCompanions,
        Operation::ScoreRoutes,
        Operation::AggregatePatterns,
        Operation::TrackAnalytics,
        Operation::CheckGeofences,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::DetectTrip => "detect_trip",
            Operation::ClassifyMode => "classify_mode",
            Operation::PredictPurpose => "predict_purpose",
            Operation::DetectCompanions => "detect_companions",
            Operation::ScoreRoutes => "score_routes",
            Operation::AggregatePatterns => "aggregate_patterns",
            Operation::TrackAnalytics => "track_analytics",
            Operation::CheckGeofences => "check_geofences",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = InferenceError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.replace('-', "_");
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == wanted)
            .ok_or_else(|| InferenceError::InvalidInput(format!("unknown operation: {s}")))
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Tolerant request shapes
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SampleIn {
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(alias = "lat")]
    latitude: f64,
    #[serde(alias = "lng", alias = "lon")]
    longitude: f64,
    #[serde(default, alias = "altitude_m")]
    altitude: Option<f64>,
    #[serde(default, alias = "speed_kmh")]
    speed: Option<f64>,
    #[serde(default, alias = "accuracy_m")]
    accuracy: Option<f64>,
    #[serde(default, alias = "heading_deg")]
    heading: Option<f64>,
    #[serde(default, alias = "accelerometer")]
    acceleration: Option<Acceleration>,
}

impl SampleIn {
    fn into_sample(self) -> Result<Sample> {
        let speed = self
            .speed
            .ok_or_else(|| InferenceError::InvalidInput("speed is required".into()))?;
        Ok(Sample {
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            lat: self.latitude,
            lng: self.longitude,
            altitude_m: self.altitude,
            speed_kmh: speed,
            accuracy_m: self.accuracy.unwrap_or(DEFAULT_ACCURACY_M),
            heading_deg: self.heading,
            acceleration: self.acceleration,
        })
    }
}

fn into_samples(raw: Vec<SampleIn>) -> Result<Vec<Sample>> {
    raw.into_iter().map(SampleIn::into_sample).collect()
}

#[derive(Debug, Deserialize)]
struct DetectTripIn {
    #[serde(alias = "user_id")]
    subject_id: String,
    #[serde(alias = "location_data", alias = "location")]
    sample: SampleIn,
}

/// Either a recorded track or a ready feature vector; a track wins when both
/// are present.
#[derive(Debug, Deserialize)]
struct ClassifyModeIn {
    #[serde(default, alias = "gps_data")]
    samples: Option<Vec<SampleIn>>,
    #[serde(default, alias = "speed_kmh")]
    speed: Option<f64>,
    #[serde(default)]
    acceleration: Option<f64>,
    #[serde(default)]
    stop_frequency: Option<f64>,
}

impl ClassifyModeIn {
    fn into_features(self) -> Result<ModeFeatures> {
        let speed = self
            .speed
            .ok_or_else(|| InferenceError::InvalidInput("speed is required".into()))?;
        Ok(ModeFeatures::new(
            speed,
            self.acceleration.unwrap_or(0.0),
            self.stop_frequency.unwrap_or(0.0),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct DetectCompanionsIn {
    #[serde(default)]
    trip_id: Option<String>,
    #[serde(default, alias = "bluetooth_data", alias = "devices")]
    readings: Vec<ProximityReading>,
}

#[derive(Debug, Deserialize)]
struct ScoreRoutesIn {
    origin: GeoPoint,
    destination: GeoPoint,
    #[serde(default)]
    preferences: RoutePreferences,
}

#[derive(Debug, Deserialize)]
struct AggregatePatternsIn {
    #[serde(alias = "user_id")]
    subject_id: String,
    #[serde(default)]
    trips: Vec<TripRecord>,
}

#[derive(Debug, Deserialize)]
struct TrackAnalyticsIn {
    #[serde(default, alias = "gps_data")]
    samples: Vec<SampleIn>,
}

#[derive(Debug, Deserialize)]
struct CheckGeofencesIn {
    #[serde(alias = "location")]
    point: GeoPoint,
    #[serde(default)]
    geofences: Vec<Geofence>,
}

fn parse<T: DeserializeOwned>(json_in: &str) -> Result<T> {
    let mut de = serde_json::Deserializer::from_str(json_in);
    let parsed: T = spte::deserialize(&mut de).map_err(|e| InferenceError::Parse {
        path: e.path().to_string(),
        message: e.inner().to_string(),
    })?;
    de.end().map_err(|e| InferenceError::Parse {
        path: ".".into(),
        message: e.to_string(),
    })?;
    Ok(parsed)
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| InferenceError::InvalidInput(format!("unserializable result: {e}")))
}

// ──────────────────────────────────────────────────────────────────────────────
// Dispatch
// ──────────────────────────────────────────────────────────────────────────────

// Rejections raised before the engine is reached are counted here; the
// engine counts its own.
fn payload<T>(engine: &TravelInferenceEngine, op: Operation, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        engine.metrics().record_error(op.as_str(), e);
    }
    result
}

/// Parses `json_in`, runs `op` on `engine` and serializes the result.
pub fn dispatch(engine: &TravelInferenceEngine, op: Operation, json_in: &str) -> Result<String> {
    debug!("json call {op} ({} bytes)", json_in.len());
    match op {
        Operation::DetectTrip => {
            let req: DetectTripIn = payload(engine, op, parse(json_in))?;
            let sample = payload(engine, op, req.sample.into_sample())?;
            to_json(&engine.detect_trip(&req.subject_id, &sample)?)
        }
        Operation::ClassifyMode => {
            let mut req: ClassifyModeIn = payload(engine, op, parse(json_in))?;
            match req.samples.take() {
                Some(samples) => {
                    let samples = payload(engine, op, into_samples(samples))?;
                    to_json(&engine.classify_track(&samples)?)
                }
                None => {
                    let features = payload(engine, op, req.into_features())?;
                    to_json(&engine.classify_mode(&features)?)
                }
            }
        }
        Operation::PredictPurpose => {
            let ctx: PurposeContext = payload(engine, op, parse(json_in))?;
            to_json(&engine.predict_purpose(&ctx)?)
        }
        Operation::DetectCompanions => {
            let req: DetectCompanionsIn = payload(engine, op, parse(json_in))?;
            to_json(&engine.detect_companions(req.trip_id.as_deref(), &req.readings)?)
        }
        Operation::ScoreRoutes => {
            let req: ScoreRoutesIn = payload(engine, op, parse(json_in))?;
            to_json(&engine.score_routes(req.origin, req.destination, &req.preferences)?)
        }
        Operation::AggregatePatterns => {
            let req: AggregatePatternsIn = payload(engine, op, parse(json_in))?;
            to_json(&engine.aggregate_patterns(&req.subject_id, &req.trips)?)
        }
        Operation::TrackAnalytics => {
            let req: TrackAnalyticsIn = payload(engine, op, parse(json_in))?;
            let samples = payload(engine, op, into_samples(req.samples))?;
            to_json(&engine.track_analytics(&samples)?)
        }
        Operation::CheckGeofences => {
            let req: CheckGeofencesIn = payload(engine, op, parse(json_in))?;
            to_json(&engine.check_geofences(req.point, &req.geofences)?)
        }
    }
}

pub fn call_detect_trip_from_json(json_in: &str) -> Result<String> {
    dispatch(shared_engine()?, Operation::DetectTrip, json_in)
}

pub fn call_classify_mode_from_json(json_in: &str) -> Result<String> {
    dispatch(shared_engine()?, Operation::ClassifyMode, json_in)
}

pub fn call_predict_purpose_from_json(json_in: &str) -> Result<String> {
    dispatch(shared_engine()?, Operation::PredictPurpose, json_in)
}

pub fn call_detect_companions_from_json(json_in: &str) -> Result<String> {
    dispatch(shared_engine()?, Operation::DetectCompanions, json_in)
}

pub fn call_score_routes_from_json(json_in: &str) -> Result<String> {
    dispatch(shared_engine()?, Operation::ScoreRoutes, json_in)
}

pub fn call_aggregate_patterns_from_json(json_in: &str) -> Result<String> {
    dispatch(shared_engine()?, Operation::AggregatePatterns, json_in)
}

pub fn call_track_analytics_from_json(json_in: &str) -> Result<String> {
    dispatch(shared_engine()?, Operation::TrackAnalytics, json_in)
}

pub fn call_check_geofences_from_json(json_in: &str) -> Result<String> {
    dispatch(shared_engine()?, Operation::CheckGeofences, json_in)
}

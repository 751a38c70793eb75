//! Travel inference core.
//!
//! Trip boundary detection from streamed GPS samples, transport mode and trip
//! purpose inference, companion detection from Bluetooth proximity, route
//! scoring and per-subject travel pattern summaries. Everything is
//! deterministic rule tables; the service layer calls in through
//! [`TravelInferenceEngine`] or the JSON surface in [`json_api`].

pub mod analytics;
pub mod cli;
pub mod companion;
pub mod config;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod geo;
pub mod json_api;
pub mod metrics;
pub mod mode;
pub mod patterns;
pub mod purpose;
pub mod route;
pub mod trip_detection;
pub mod types;

#[cfg(feature = "python")]
mod py;

pub use analytics::{track_analytics, TrackAnalytics};
pub use companion::{detect_companions, Companion, CompanionReport, ProximityReading, ProximityTier};
pub use config::{
    load_config, save_config, CompanionConfig, EngineConfig, PatternConfig, RouteConfig, TripDetectorConfig,
};
pub use distribution::{Distribution, Label};
pub use engine::TravelInferenceEngine;
pub use error::{InferenceError, Result};
pub use geo::{check_geofences, distance, GeoPoint, Geofence, GeofenceHit};
pub use metrics::InferenceMetrics;
pub use mode::{classify_mode, ModeClassification, ModeFeatures};
pub use patterns::{aggregate_patterns, Histogram, PatternSummary};
pub use purpose::{predict_purpose, PurposeContext, PurposePrediction};
pub use route::{score_routes, RouteCandidate, RouteCategory, RoutePreferences, RouteRecommendation};
pub use trip_detection::{TripDetectorRegistry, TripEvent, TripEventKind, TripState};
pub use types::{Acceleration, Sample, TransportMode, TripPurpose, TripRecord};

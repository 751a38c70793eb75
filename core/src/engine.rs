use log::{info, warn};

use crate::analytics::{track_analytics, TrackAnalytics};
use crate::companion::{detect_companions, CompanionReport, ProximityReading};
use crate::config::EngineConfig;
use crate::distribution::Label;
use crate::error::Result;
use crate::geo::{check_geofences, GeoPoint, Geofence, GeofenceHit};
use crate::metrics::InferenceMetrics;
use crate::mode::{classify_mode, ModeClassification, ModeFeatures};
use crate::patterns::{aggregate_patterns, PatternSummary};
use crate::purpose::{predict_purpose, PurposeContext, PurposePrediction};
use crate::route::{score_routes, RoutePreferences, RouteRecommendation};
use crate::trip_detection::{TripDetectorRegistry, TripEvent, TripState};
use crate::types::{Sample, TripRecord};

/// Entry point for the service layer: config, per-subject detector state and
/// decision counters. Safe to share across threads.
#[derive(Debug)]
pub struct TravelInferenceEngine {
    config: EngineConfig,
    trips: TripDetectorRegistry,
    metrics: InferenceMetrics,
}

impl TravelInferenceEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let metrics = InferenceMetrics::new()?;
        info!(
            "inference engine ready (moving>{} km/h, accuracy<{} m, max_companions={})",
            config.trip.min_moving_speed_kmh,
            config.trip.max_accuracy_m,
            config.companion.max_companions
        );
        Ok(Self {
            trips: TripDetectorRegistry::new(config.trip.clone()),
            config,
            metrics,
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &InferenceMetrics {
        &self.metrics
    }

    /// Rule tables are compiled in; nothing to load.
    pub fn is_ready(&self) -> bool {
        true
    }

    fn observe<T>(&self, operation: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!("{operation} rejected: {e}");
            self.metrics.record_error(operation, e);
        }
        result
    }

    pub fn detect_trip(&self, subject_id: &str, sample: &Sample) -> Result<TripEvent> {
        let event = self.observe("detect_trip", self.trips.detect(subject_id, sample))?;
        self.metrics.record_trip_event(event.kind.as_str());
        Ok(event)
    }

    pub fn trip_state(&self, subject_id: &str) -> Option<TripState> {
        self.trips.state(subject_id)
    }

    pub fn forget_subject(&self, subject_id: &str) -> bool {
        self.trips.forget(subject_id)
    }

    pub fn classify_mode(&self, features: &ModeFeatures) -> Result<ModeClassification> {
        let out = self.observe("classify_mode", classify_mode(features))?;
        self.metrics.record_classification("mode", out.mode.as_str());
        Ok(out)
    }

    /// Derives features from a track, then classifies.
    pub fn classify_track(&self, samples: &[Sample]) -> Result<ModeClassification> {
        let features = self.observe("classify_mode", ModeFeatures::from_track(samples))?;
        self.classify_mode(&features)
    }

    pub fn predict_purpose(&self, ctx: &PurposeContext) -> Result<PurposePrediction> {
        let out = self.observe("predict_purpose", predict_purpose(ctx))?;
        self.metrics.record_classification("purpose", out.purpose.as_str());
        Ok(out)
    }

    pub fn detect_companions(
        &self,
        trip_id: Option<&str>,
        readings: &[ProximityReading],
    ) -> Result<CompanionReport> {
        let report = self.observe(
            "detect_companions",
            detect_companions(trip_id, readings, &self.config.companion),
        )?;
        let label = if report.companions_detected { "detected" } else { "none" };
        self.metrics.record_classification("companions", label);
        Ok(report)
    }

    pub fn score_routes(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        prefs: &RoutePreferences,
    ) -> Result<RouteRecommendation> {
        let rec = self.observe(
            "score_routes",
            score_routes(origin, destination, prefs, &self.config.route),
        )?;
        let label = match rec.preferred.category {
            crate::route::RouteCategory::Fastest => "fastest",
            crate::route::RouteCategory::Shortest => "shortest",
            crate::route::RouteCategory::Scenic => "scenic",
        };
        self.metrics.record_classification("route", label);
        Ok(rec)
    }

    pub fn aggregate_patterns(&self, subject_id: &str, trips: &[TripRecord]) -> Result<PatternSummary> {
        self.observe(
            "aggregate_patterns",
            aggregate_patterns(subject_id, trips, &self.config.pattern),
        )
    }

    pub fn track_analytics(&self, samples: &[Sample]) -> Result<TrackAnalytics> {
        self.observe("track_analytics", track_analytics(samples))
    }

    pub fn check_geofences(&self, point: GeoPoint, fences: &[Geofence]) -> Result<Vec<GeofenceHit>> {
        self.observe("check_geofences", check_geofences(point, fences))
    }
}

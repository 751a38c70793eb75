use std::fmt;

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::{InferenceError, Result};

/// Decision counters for one engine instance.
#[derive(Clone)]
pub struct InferenceMetrics {
    registry: Registry,
    trip_events: IntCounterVec,
    classifications: IntCounterVec,
    errors: IntCounterVec,
}

impl fmt::Debug for InferenceMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceMetrics").finish_non_exhaustive()
    }
}

fn metrics_err(e: prometheus::Error) -> InferenceError {
    InferenceError::Metrics(e.to_string())
}

impl InferenceMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new_custom(Some("travel_inference".into()), None).map_err(metrics_err)?;

        let trip_events = IntCounterVec::new(
            Opts::new("trip_events_total", "Trip boundary events by kind"),
            &["kind"],
        )
        .map_err(metrics_err)?;
        let classifications = IntCounterVec::new(
            Opts::new("classifications_total", "Decisions by classifier and top label"),
            &["classifier", "label"],
        )
        .map_err(metrics_err)?;
        let errors = IntCounterVec::new(
            Opts::new("errors_total", "Rejected calls by operation and error kind"),
            &["operation", "kind"],
        )
        .map_err(metrics_err)?;

        registry.register(Box::new(trip_events.clone())).map_err(metrics_err)?;
        registry.register(Box::new(classifications.clone())).map_err(metrics_err)?;
        registry.register(Box::new(errors.clone())).map_err(metrics_err)?;

        Ok(Self {
            registry,
            trip_events,
            classifications,
            errors,
        })
    }

    pub fn record_trip_event(&self, kind: &str) {
        self.trip_events.with_label_values(&[kind]).inc();
    }

    pub fn record_classification(&self, classifier: &str, label: &str) {
        self.classifications.with_label_values(&[classifier, label]).inc();
    }

    pub fn record_error(&self, operation: &str, err: &InferenceError) {
        self.errors.with_label_values(&[operation, err.kind()]).inc();
    }

    pub fn trip_event_count(&self, kind: &str) -> u64 {
        self.trip_events.with_label_values(&[kind]).get()
    }

    pub fn classification_count(&self, classifier: &str, label: &str) -> u64 {
        self.classifications.with_label_values(&[classifier, label]).get()
    }

    pub fn error_count(&self, operation: &str, kind: &str) -> u64 {
        self.errors.with_label_values(&[operation, kind]).get()
    }

    /// Prometheus text exposition of every counter.
    pub fn gather_text(&self) -> Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(metrics_err)?;
        String::from_utf8(buf).map_err(|e| InferenceError::Metrics(e.to_string()))
    }
}

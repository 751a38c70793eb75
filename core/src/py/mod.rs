use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use crate::json_api::{self, shared_engine};
use crate::InferenceError;

fn to_py_err(e: InferenceError) -> PyErr {
    PyValueError::new_err(format!("{} ({})", e, e.kind()))
}

// ──────────────────────────────────────────────────────────────────────────────
// JSON in, JSON out
// ──────────────────────────────────────────────────────────────────────────────

#[pyfunction]
fn detect_trip_json(json_str: &str) -> PyResult<String> {
    json_api::call_detect_trip_from_json(json_str).map_err(to_py_err)
}

#[pyfunction]
fn classify_mode_json(json_str: &str) -> PyResult<String> {
    json_api::call_classify_mode_from_json(json_str).map_err(to_py_err)
}

#[pyfunction]
fn predict_purpose_json(json_str: &str) -> PyResult<String> {
    json_api::call_predict_purpose_from_json(json_str).map_err(to_py_err)
}

#[pyfunction]
fn detect_companions_json(json_str: &str) -> PyResult<String> {
    json_api::call_detect_companions_from_json(json_str).map_err(to_py_err)
}

#[pyfunction]
fn score_routes_json(json_str: &str) -> PyResult<String> {
    json_api::call_score_routes_from_json(json_str).map_err(to_py_err)
}

#[pyfunction]
fn aggregate_patterns_json(json_str: &str) -> PyResult<String> {
    json_api::call_aggregate_patterns_from_json(json_str).map_err(to_py_err)
}

#[pyfunction]
fn track_analytics_json(json_str: &str) -> PyResult<String> {
    json_api::call_track_analytics_from_json(json_str).map_err(to_py_err)
}

#[pyfunction]
fn check_geofences_json(json_str: &str) -> PyResult<String> {
    json_api::call_check_geofences_from_json(json_str).map_err(to_py_err)
}

#[pyfunction]
fn is_ready() -> bool {
    shared_engine().map(|e| e.is_ready()).unwrap_or(false)
}

/// Prometheus text exposition of the shared engine's counters.
#[pyfunction]
fn metrics_text() -> PyResult<String> {
    shared_engine()
        .and_then(|e| e.metrics().gather_text())
        .map_err(to_py_err)
}

// ──────────────────────────────────────────────────────────────────────────────
// PyO3 module
// ──────────────────────────────────────────────────────────────────────────────

#[pymodule]
fn travel_inference_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(detect_trip_json, m)?)?;
    m.add_function(wrap_pyfunction!(classify_mode_json, m)?)?;
    m.add_function(wrap_pyfunction!(predict_purpose_json, m)?)?;
    m.add_function(wrap_pyfunction!(detect_companions_json, m)?)?;
    m.add_function(wrap_pyfunction!(score_routes_json, m)?)?;
    m.add_function(wrap_pyfunction!(aggregate_patterns_json, m)?)?;
    m.add_function(wrap_pyfunction!(track_analytics_json, m)?)?;
    m.add_function(wrap_pyfunction!(check_geofences_json, m)?)?;
    m.add_function(wrap_pyfunction!(is_ready, m)?)?;
    m.add_function(wrap_pyfunction!(metrics_text, m)?)?;
    Ok(())
}

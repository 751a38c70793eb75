use serde_json::Value;

use crate::error::{InferenceError, Result};
use crate::json_api::Operation;

/// Splits a request file into calls: a top-level array is a batch run in
/// order (detector state carries across it), anything else is one call.
pub fn split_requests(contents: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(contents).map_err(|e| InferenceError::Parse {
        path: ".".into(),
        message: e.to_string(),
    })?;
    Ok(match value {
        Value::Array(items) => items.iter().map(Value::to_string).collect(),
        other => vec![other.to_string()],
    })
}

/// One human-readable line for a response, when the operation has a headline.
pub fn summary_line(op: Operation, response: &str) -> Option<String> {
    let v: Value = serde_json::from_str(response).ok()?;
    let line = match op {
        Operation::DetectTrip => format!(
            "{} (confidence {:.2}, {} km/h)",
            v["event_type"].as_str()?,
            v["confidence"].as_f64()?,
            v["speed_kmh"].as_f64()?
        ),
        Operation::ClassifyMode => format!("mode {} ({:.2})", v["mode"].as_str()?, v["confidence"].as_f64()?),
        Operation::PredictPurpose => {
            format!("purpose {} ({:.2})", v["purpose"].as_str()?, v["confidence"].as_f64()?)
        }
        Operation::DetectCompanions => format!("{} companion(s)", v["companion_count"].as_u64()?),
        Operation::ScoreRoutes => {
            let r = &v["optimal_route"];
            format!(
                "{} route: {} km, {} min",
                r["type"].as_str()?,
                r["distance_km"].as_f64()?,
                r["duration_min"].as_f64()?
            )
        }
        Operation::AggregatePatterns => format!(
            "{} trips, mostly {} for {}",
            v["total_trips"].as_u64()?,
            v["preferred_mode"].as_str()?,
            v["primary_purpose"].as_str()?
        ),
        Operation::TrackAnalytics => format!(
            "{:.2} km over {} points, {} stops",
            v["total_distance"].as_f64()?,
            v["points_analyzed"].as_u64()?,
            v["stop_count"].as_u64()?
        ),
        Operation::CheckGeofences => {
            let hits = v.as_array()?;
            let inside = hits.iter().filter(|h| h["is_inside"].as_bool() == Some(true)).count();
            format!("inside {inside} of {} fence(s)", hits.len())
        }
    };
    Some(line)
}

/// Re-indents a compact response.
pub fn pretty(response: &str) -> Result<String> {
    let v: Value = serde_json::from_str(response).map_err(|e| InferenceError::Parse {
        path: ".".into(),
        message: e.to_string(),
    })?;
    serde_json::to_string_pretty(&v).map_err(|e| InferenceError::InvalidInput(e.to_string()))
}

use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripDetectorConfig {
    /// km/h; strictly above counts as moving
    pub min_moving_speed_kmh: f64,
    /// meters; strictly below counts as a usable fix
    pub max_accuracy_m: f64,
    /// supporting signal only
    pub accel_threshold: f64,
    pub moving_confidence: f64,
    pub idle_confidence: f64,
}

impl Default for TripDetectorConfig {
    fn default() -> Self {
        Self {
            min_moving_speed_kmh: 2.0,
            max_accuracy_m: 20.0,
            accel_threshold: 0.5,
            moving_confidence: 0.95,
            idle_confidence: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    /// dBm; strictly above is kept
    pub min_rssi_dbm: f64,
    /// dBm; strictly above is `close`
    pub close_rssi_dbm: f64,
    pub max_companions: usize,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            min_rssi_dbm: -70.0,
            close_rssi_dbm: -60.0,
            max_companions: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub base_distance_km: f64,
    pub base_duration_min: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            base_distance_km: 25.0,
            base_duration_min: 45.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Divisor for `travel_frequency`. Not derived from trip dates.
    pub frequency_window_days: f64,
    pub short_trip_km: f64,
    pub long_trip_km: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            frequency_window_days: 30.0,
            short_trip_km: 5.0,
            long_trip_km: 50.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub trip: TripDetectorConfig,
    pub companion: CompanionConfig,
    pub route: RouteConfig,
    pub pattern: PatternConfig,
}

/// Reads the engine config (JSON).
/// A missing file yields the defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let path = path.as_ref();
    if !path.exists() {
        warn!("config {} not found, using defaults", path.display());
        return Ok(EngineConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| InferenceError::Config(format!("read {}: {e}", path.display())))?;
    let mut de = serde_json::Deserializer::from_str(&contents);
    let cfg: EngineConfig = serde_path_to_error::deserialize(&mut de).map_err(|e| {
        InferenceError::Config(format!("{} at {}: {}", path.display(), e.path(), e.inner()))
    })?;
    info!(
        "config loaded from {} (max_companions={}, window_days={})",
        path.display(),
        cfg.companion.max_companions,
        cfg.pattern.frequency_window_days
    );
    Ok(cfg)
}

/// Writes the config as pretty JSON.
pub fn save_config(cfg: &EngineConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(cfg)
        .map_err(|e| InferenceError::Config(format!("serialize: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| InferenceError::Config(format!("write {}: {e}", path.display())))?;
    info!("config saved to {}", path.display());
    Ok(())
}

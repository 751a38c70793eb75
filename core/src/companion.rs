use std::cmp::Reverse;

use log::debug;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::config::CompanionConfig;
use crate::error::{require_finite, Result};

/// Calibration constant of the RSSI → confidence transform. Not physical; keep as is.
pub const RSSI_CONFIDENCE_SPAN: f64 = 30.0;
pub const ANALYSIS_METHOD: &str = "bluetooth_proximity";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityReading {
    #[serde(alias = "mac", alias = "id")]
    pub device_id: String,
    #[serde(default = "unknown_name")]
    pub name: String,
    /// dBm
    pub rssi: f64,
}

fn unknown_name() -> String {
    "Unknown".to_string()
}

impl ProximityReading {
    pub fn new(device_id: &str, name: &str, rssi: f64) -> Self {
        Self {
            device_id: device_id.to_string(),
            name: name.to_string(),
            rssi,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProximityTier {
    Close,
    Near,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Companion {
    pub device_id: String,
    pub name: String,
    pub confidence: f64,
    pub rssi: f64,
    pub proximity: ProximityTier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanionReport {
    pub companions_detected: bool,
    pub companion_count: usize,
    pub companions: Vec<Companion>,
    pub trip_id: Option<String>,
    pub analysis_method: &'static str,
}

/// `min(1, (100 + rssi) / 30)`; -70 dBm maps to 1.0.
pub fn rssi_confidence(rssi: f64) -> f64 {
    ((100.0 + rssi) / RSSI_CONFIDENCE_SPAN).min(1.0)
}

/// Filter by RSSI, score, rank (stable on ties), truncate.
pub fn detect_companions(
    trip_id: Option<&str>,
    readings: &[ProximityReading],
    cfg: &CompanionConfig,
) -> Result<CompanionReport> {
    let mut companions = Vec::new();
    for r in readings {
        let rssi = require_finite("rssi", r.rssi)?;
        if rssi <= cfg.min_rssi_dbm {
            continue;
        }
        companions.push(Companion {
            device_id: r.device_id.clone(),
            name: r.name.clone(),
            confidence: rssi_confidence(rssi),
            rssi,
            proximity: if rssi > cfg.close_rssi_dbm {
                ProximityTier::Close
            } else {
                ProximityTier::Near
            },
        });
    }

    companions.sort_by_key(|c| Reverse(OrderedFloat(c.confidence)));
    companions.truncate(cfg.max_companions);

    debug!(
        "companions trip={:?} readings={} kept={}",
        trip_id,
        readings.len(),
        companions.len()
    );

    Ok(CompanionReport {
        companions_detected: !companions.is_empty(),
        companion_count: companions.len(),
        companions,
        trip_id: trip_id.map(str::to_string),
        analysis_method: ANALYSIS_METHOD,
    })
}

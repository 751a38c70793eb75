use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::distribution::Label;
use crate::geo::GeoPoint;

// ──────────────────────────────────────────────────────────────────────────────
// Labels
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Walk,
    Bicycle,
    Car,
    Bus,
    Train,
    Auto,
    Boat,
    Airplane,
}

impl Label for TransportMode {
    const ALL: &'static [Self] = &[
        TransportMode::Walk,
        TransportMode::Bicycle,
        TransportMode::Car,
        TransportMode::Bus,
        TransportMode::Train,
        TransportMode::Auto,
        TransportMode::Boat,
        TransportMode::Airplane,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Walk => "walk",
            TransportMode::Bicycle => "bicycle",
            TransportMode::Car => "car",
            TransportMode::Bus => "bus",
            TransportMode::Train => "train",
            TransportMode::Auto => "auto",
            TransportMode::Boat => "boat",
            TransportMode::Airplane => "airplane",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripPurpose {
    Work,
    Education,
    Shopping,
    Leisure,
    Healthcare,
    Social,
    Religious,
    Tourism,
    Business,
    Home,
    Other,
}

impl Label for TripPurpose {
    const ALL: &'static [Self] = &[
        TripPurpose::Work,
        TripPurpose::Education,
        TripPurpose::Shopping,
        TripPurpose::Leisure,
        TripPurpose::Healthcare,
        TripPurpose::Social,
        TripPurpose::Religious,
        TripPurpose::Tourism,
        TripPurpose::Business,
        TripPurpose::Home,
        TripPurpose::Other,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            TripPurpose::Work => "work",
            TripPurpose::Education => "education",
            TripPurpose::Shopping => "shopping",
            TripPurpose::Leisure => "leisure",
            TripPurpose::Healthcare => "healthcare",
            TripPurpose::Social => "social",
            TripPurpose::Religious => "religious",
            TripPurpose::Tourism => "tourism",
            TripPurpose::Business => "business",
            TripPurpose::Home => "home",
            TripPurpose::Other => "other",
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Sensor input
// ──────────────────────────────────────────────────────────────────────────────

/// Accelerometer reading (3 axes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Acceleration {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Acceleration {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// One GPS/motion observation from the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude", alias = "lon")]
    pub lng: f64,
    #[serde(default, alias = "altitude")]
    pub altitude_m: Option<f64>,
    /// km/h
    #[serde(alias = "speed")]
    pub speed_kmh: f64,
    /// meters
    #[serde(alias = "accuracy")]
    pub accuracy_m: f64,
    #[serde(default, alias = "heading")]
    pub heading_deg: Option<f64>,
    #[serde(default, alias = "accelerometer")]
    pub acceleration: Option<Acceleration>,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, lat: f64, lng: f64, speed_kmh: f64, accuracy_m: f64) -> Self {
        Self {
            timestamp,
            lat,
            lng,
            altitude_m: None,
            speed_kmh,
            accuracy_m,
            heading_deg: None,
            acceleration: None,
        }
    }

    pub fn with_acceleration(mut self, acc: Acceleration) -> Self {
        self.acceleration = Some(acc);
        self
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Completed trips (read-only input to the pattern aggregator)
// ──────────────────────────────────────────────────────────────────────────────

fn unknown_label() -> String {
    "unknown".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    #[serde(default, alias = "user_id")]
    pub subject_id: String,
    /// Free-form label; records from older clients may carry modes outside `TransportMode`.
    #[serde(default = "unknown_label")]
    pub mode: String,
    #[serde(default = "unknown_label")]
    pub purpose: String,
    /// km
    #[serde(default, alias = "distance")]
    pub distance_km: f64,
    /// minutes
    #[serde(default, alias = "duration")]
    pub duration_min: f64,
}

impl TripRecord {
    pub fn new(subject_id: &str, mode: &str, purpose: &str, distance_km: f64, duration_min: f64) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            mode: mode.to_string(),
            purpose: purpose.to_string(),
            distance_km,
            duration_min,
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, Result};

/// Mean earth radius (m).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
/// Radius used when a geofence omits one (m).
pub const DEFAULT_FENCE_RADIUS_M: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude", alias = "lon")]
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Range check: lat in [-90, 90], lng in [-180, 180].
    pub fn validate(&self) -> Result<Self> {
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lng_ok = self.lng.is_finite() && (-180.0..=180.0).contains(&self.lng);
        if lat_ok && lng_ok {
            Ok(*self)
        } else {
            Err(InferenceError::InvalidCoordinate { lat: self.lat, lon: self.lng })
        }
    }
}

/// Great-circle distance in meters (haversine).
pub fn distance(a: GeoPoint, b: GeoPoint) -> Result<f64> {
    let a = a.validate()?;
    let b = b.validate()?;

    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    Ok(EARTH_RADIUS_M * c)
}

/// Inclusive: a point exactly on the radius is inside.
pub fn within_radius(point: GeoPoint, center: GeoPoint, radius_m: f64) -> Result<bool> {
    Ok(distance(point, center)? <= radius_m)
}

/// Sum of consecutive segment lengths (m). Fewer than two points gives 0.
pub fn path_length_m(points: &[GeoPoint]) -> Result<f64> {
    let mut total = 0.0;
    for pair in points.windows(2) {
        total += distance(pair[0], pair[1])?;
    }
    Ok(total)
}

// ──────────────────────────────────────────────────────────────────────────────
// Geofences
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geofence {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub center_lat: f64,
    #[serde(alias = "center_lon")]
    pub center_lng: f64,
    /// Meters; `DEFAULT_FENCE_RADIUS_M` when absent.
    #[serde(default)]
    pub radius: Option<f64>,
}

impl Geofence {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.center_lat, self.center_lng)
    }

    pub fn radius_m(&self) -> f64 {
        self.radius.unwrap_or(DEFAULT_FENCE_RADIUS_M)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceHit {
    pub fence_id: Option<String>,
    pub name: Option<String>,
    pub is_inside: bool,
}

/// One hit per fence, in input order.
pub fn check_geofences(point: GeoPoint, fences: &[Geofence]) -> Result<Vec<GeofenceHit>> {
    fences
        .iter()
        .map(|fence| {
            let is_inside = within_radius(point, fence.center(), fence.radius_m())?;
            Ok(GeofenceHit {
                fence_id: fence.id.clone(),
                name: fence.name.clone(),
                is_inside,
            })
        })
        .collect()
}

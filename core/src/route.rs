//! Route option scoring.
//!
//! Placeholder heuristic: candidates are fixed multiples of a configured base
//! trip, so the result depends on the preferences only, never on road network
//! or live traffic state.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::RouteConfig;
use crate::error::Result;
use crate::geo::{distance, GeoPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteCategory {
    Fastest,
    Shortest,
    Scenic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficLevel {
    Moderate,
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutePreferences {
    pub avoid_traffic: bool,
    #[serde(alias = "scenic_route")]
    pub scenic: bool,
    pub avoid_tolls: bool,
}

impl Default for RoutePreferences {
    fn default() -> Self {
        Self {
            avoid_traffic: true,
            scenic: false,
            avoid_tolls: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteCandidate {
    #[serde(rename = "type")]
    pub category: RouteCategory,
    /// km, one decimal
    pub distance_km: f64,
    /// whole minutes
    pub duration_min: f64,
    pub via: Vec<&'static str>,
    pub traffic_level: TrafficLevel,
    pub has_tolls: bool,
    pub scenic_score: u8,
    pub eco_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRecommendation {
    #[serde(rename = "optimal_route")]
    pub preferred: RouteCandidate,
    #[serde(rename = "alternative_routes")]
    pub alternatives: Vec<RouteCandidate>,
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    /// Great-circle origin → destination (km).
    pub straight_line_km: f64,
    pub preferences_applied: RoutePreferences,
}

struct CategoryProfile {
    category: RouteCategory,
    distance_factor: f64,
    duration_factor: f64,
    via: &'static [&'static str],
}

const CATEGORIES: [CategoryProfile; 3] = [
    CategoryProfile {
        category: RouteCategory::Fastest,
        distance_factor: 1.1,
        duration_factor: 0.9,
        via: &["Highway"],
    },
    CategoryProfile {
        category: RouteCategory::Shortest,
        distance_factor: 0.95,
        duration_factor: 1.1,
        via: &["City roads"],
    },
    CategoryProfile {
        category: RouteCategory::Scenic,
        distance_factor: 1.3,
        duration_factor: 1.5,
        via: &["Coastal road", "Hill station"],
    },
];

// Half-to-even, so 40.5 min reports as 40.
fn round1(x: f64) -> f64 {
    (x * 10.0).round_ties_even() / 10.0
}

/// Candidates in generation order: fastest, shortest, then scenic if requested.
pub fn generate_candidates(prefs: &RoutePreferences, cfg: &RouteConfig) -> Vec<RouteCandidate> {
    CATEGORIES
        .iter()
        .filter(|p| p.category != RouteCategory::Scenic || prefs.scenic)
        .map(|p| RouteCandidate {
            category: p.category,
            distance_km: round1(cfg.base_distance_km * p.distance_factor),
            duration_min: (cfg.base_duration_min * p.duration_factor).round_ties_even(),
            via: p.via.to_vec(),
            traffic_level: if prefs.avoid_traffic {
                TrafficLevel::Moderate
            } else {
                TrafficLevel::Heavy
            },
            has_tolls: !prefs.avoid_tolls && p.category == RouteCategory::Fastest,
            scenic_score: if p.category == RouteCategory::Scenic { 8 } else { 3 },
            eco_score: if p.category == RouteCategory::Shortest { 85 } else { 70 },
        })
        .collect()
}

/// Index of the preferred candidate: scenic if requested, else minimal duration
/// (first on ties) when avoiding traffic, else the first candidate.
fn select_preferred(candidates: &[RouteCandidate], prefs: &RoutePreferences) -> usize {
    if prefs.scenic {
        if let Some(i) = candidates.iter().position(|c| c.category == RouteCategory::Scenic) {
            return i;
        }
    } else if prefs.avoid_traffic {
        let mut best = 0;
        for (i, c) in candidates.iter().enumerate() {
            if c.duration_min < candidates[best].duration_min {
                best = i;
            }
        }
        return best;
    }
    0
}

pub fn score_routes(
    origin: GeoPoint,
    destination: GeoPoint,
    prefs: &RoutePreferences,
    cfg: &RouteConfig,
) -> Result<RouteRecommendation> {
    let straight_line_km = distance(origin, destination)? / 1000.0;

    let mut candidates = generate_candidates(prefs, cfg);
    let idx = select_preferred(&candidates, prefs);
    let preferred = candidates.remove(idx);

    debug!(
        "route prefs={:?} candidates={} preferred={:?}",
        prefs,
        candidates.len() + 1,
        preferred.category
    );

    Ok(RouteRecommendation {
        preferred,
        alternatives: candidates,
        origin,
        destination,
        straight_line_km,
        preferences_applied: *prefs,
    })
}

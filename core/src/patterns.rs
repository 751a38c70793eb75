//! Travel pattern aggregation over a subject's completed trips.
//!
//! Every call recomputes the summary from the records it is given.

use log::debug;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::config::PatternConfig;
use crate::error::{require_finite, Result};
use crate::types::TripRecord;

pub const UNKNOWN_LABEL: &str = "unknown";

/// Label counts in first-encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Histogram {
    counts: Vec<(String, usize)>,
}

impl Histogram {
    pub fn record(&mut self, label: &str) {
        match self.counts.iter_mut().find(|(l, _)| l == label) {
            Some((_, n)) => *n += 1,
            None => self.counts.push((label.to_string(), 1)),
        }
    }

    pub fn count(&self, label: &str) -> usize {
        self.counts
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    pub fn entries(&self) -> &[(String, usize)] {
        &self.counts
    }

    /// Most frequent label; ties go to the first encountered.
    pub fn top(&self) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for (label, n) in &self.counts {
            match best {
                Some((_, bn)) if *n <= bn => {}
                _ => best = Some((label.as_str(), *n)),
            }
        }
        best.map(|(l, _)| l)
    }
}

impl Serialize for Histogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (label, n) in &self.counts {
            map.serialize_entry(label, n)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternSummary {
    pub subject_id: String,
    pub total_trips: usize,
    pub total_distance: f64,
    pub total_duration: f64,
    pub avg_distance: f64,
    pub avg_duration: f64,
    pub preferred_mode: String,
    pub mode_distribution: Histogram,
    pub primary_purpose: String,
    pub purpose_distribution: Histogram,
    /// trips / fixed window (30 days by default), regardless of the dates the
    /// trips actually span. Coarse; a span-based rate needs trip dates.
    pub travel_frequency: f64,
    pub insights: Vec<String>,
}

/// What the insight predicates look at.
#[derive(Debug, Clone, Copy)]
struct PatternFacts<'a> {
    top_mode: Option<&'a str>,
    top_purpose: Option<&'a str>,
    avg_distance: Option<f64>,
}

struct InsightRule {
    applies: fn(&PatternFacts, &PatternConfig) -> bool,
    message: &'static str,
}

// Evaluated in order; every matching rule contributes its message.
const INSIGHT_RULES: [InsightRule; 7] = [
    InsightRule {
        applies: |f, _| f.top_mode == Some("car"),
        message: "You prefer personal vehicle for most trips",
    },
    InsightRule {
        applies: |f, _| matches!(f.top_mode, Some("bus") | Some("train")),
        message: "Great job using public transport!",
    },
    InsightRule {
        applies: |f, _| f.top_mode == Some("walk"),
        message: "You're an active traveler - keep walking!",
    },
    InsightRule {
        applies: |f, _| f.top_purpose == Some("work"),
        message: "Most of your trips are work-related",
    },
    InsightRule {
        applies: |f, _| f.top_purpose == Some("leisure"),
        message: "You travel frequently for leisure activities",
    },
    InsightRule {
        applies: |f, cfg| f.avg_distance.map_or(false, |d| d < cfg.short_trip_km),
        message: "You mostly take short trips within your locality",
    },
    InsightRule {
        applies: |f, cfg| f.avg_distance.map_or(false, |d| d > cfg.long_trip_km),
        message: "You're a long-distance traveler",
    },
];

fn generate_insights(facts: &PatternFacts, cfg: &PatternConfig) -> Vec<String> {
    INSIGHT_RULES
        .iter()
        .filter(|rule| (rule.applies)(facts, cfg))
        .map(|rule| rule.message.to_string())
        .collect()
}

/// Totals, averages, histograms, frequency and insights for one subject.
/// An empty batch gives the zero summary.
pub fn aggregate_patterns(
    subject_id: &str,
    trips: &[TripRecord],
    cfg: &PatternConfig,
) -> Result<PatternSummary> {
    let mut modes = Histogram::default();
    let mut purposes = Histogram::default();
    let mut total_distance = 0.0;
    let mut total_duration = 0.0;

    for trip in trips {
        total_distance += require_finite("trip distance", trip.distance_km)?;
        total_duration += require_finite("trip duration", trip.duration_min)?;
        modes.record(&trip.mode);
        purposes.record(&trip.purpose);
    }

    let n = trips.len();
    let (avg_distance, avg_duration) = if n == 0 {
        (0.0, 0.0)
    } else {
        (total_distance / n as f64, total_duration / n as f64)
    };
    let travel_frequency = if cfg.frequency_window_days > 0.0 {
        n as f64 / cfg.frequency_window_days
    } else {
        0.0
    };

    let facts = PatternFacts {
        top_mode: modes.top(),
        top_purpose: purposes.top(),
        avg_distance: (n > 0).then_some(avg_distance),
    };
    let insights = generate_insights(&facts, cfg);
    let preferred_mode = facts.top_mode.unwrap_or(UNKNOWN_LABEL).to_string();
    let primary_purpose = facts.top_purpose.unwrap_or(UNKNOWN_LABEL).to_string();

    debug!(
        "patterns subject={} trips={} mode={} purpose={} insights={}",
        subject_id,
        n,
        preferred_mode,
        primary_purpose,
        insights.len()
    );

    Ok(PatternSummary {
        subject_id: subject_id.to_string(),
        total_trips: n,
        total_distance,
        total_duration,
        avg_distance,
        avg_duration,
        preferred_mode,
        mode_distribution: modes,
        primary_purpose,
        purpose_distribution: purposes,
        travel_frequency,
        insights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(mode: &str, purpose: &str, km: f64) -> TripRecord {
        TripRecord::new("u1", mode, purpose, km, 20.0)
    }

    #[test]
    fn histogram_tie_goes_to_first_seen() {
        let mut h = Histogram::default();
        for l in ["bus", "car", "car", "bus"] {
            h.record(l);
        }
        assert_eq!(h.top(), Some("bus"));
        assert_eq!(h.count("car"), 2);
    }

    #[test]
    fn empty_batch_is_zero_summary() {
        let s = aggregate_patterns("u1", &[], &PatternConfig::default()).unwrap();
        assert_eq!(s.total_trips, 0);
        assert_eq!(s.total_distance, 0.0);
        assert_eq!(s.avg_duration, 0.0);
        assert_eq!(s.travel_frequency, 0.0);
        assert_eq!(s.preferred_mode, UNKNOWN_LABEL);
        assert!(s.insights.is_empty());
    }

    #[test]
    fn insights_are_independent() {
        let trips = vec![trip("car", "work", 2.0), trip("car", "work", 3.0), trip("bus", "home", 1.0)];
        let s = aggregate_patterns("u1", &trips, &PatternConfig::default()).unwrap();
        assert_eq!(
            s.insights,
            vec![
                "You prefer personal vehicle for most trips",
                "Most of your trips are work-related",
                "You mostly take short trips within your locality",
            ]
        );
        assert!((s.travel_frequency - 0.1).abs() < 1e-12);
    }

    #[test]
    fn mid_range_distance_adds_no_distance_insight() {
        let trips = vec![trip("boat", "tourism", 20.0)];
        let s = aggregate_patterns("u1", &trips, &PatternConfig::default()).unwrap();
        assert!(s.insights.is_empty());
        assert_eq!(s.preferred_mode, "boat");
    }

    #[test]
    fn rejects_non_finite_distance() {
        let trips = vec![trip("car", "work", f64::NAN)];
        assert!(aggregate_patterns("u1", &trips, &PatternConfig::default()).is_err());
    }
}

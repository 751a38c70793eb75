use chrono::{DateTime, Datelike, Timelike, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::distribution::{Distribution, Label};
use crate::error::{require_finite, InferenceError, Result};
use crate::types::TripPurpose;

use TripPurpose::*;

/// Day-of-week convention: 0 = Monday … 6 = Sunday.
pub const FRIDAY: u32 = 4;
pub const SATURDAY: u32 = 5;

/// Inclusive hour brackets, evaluated in order (a boundary hour belongs to the
/// earlier bracket). Hours outside every bracket use `NIGHT_TABLE`.
const HOUR_BRACKETS: [(u32, u32, &[(TripPurpose, f64)]); 5] = [
    (6, 10, &[(Work, 0.4), (Education, 0.3), (Business, 0.2), (Other, 0.1)]),
    (10, 12, &[(Shopping, 0.3), (Business, 0.3), (Healthcare, 0.2), (Other, 0.2)]),
    (12, 14, &[(Home, 0.3), (Leisure, 0.3), (Social, 0.2), (Other, 0.2)]),
    (14, 17, &[(Business, 0.3), (Shopping, 0.2), (Education, 0.2), (Other, 0.3)]),
    (17, 20, &[(Home, 0.5), (Leisure, 0.2), (Shopping, 0.2), (Other, 0.1)]),
];
const NIGHT_TABLE: &[(TripPurpose, f64)] = &[(Home, 0.4), (Leisure, 0.3), (Social, 0.2), (Other, 0.1)];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurposeContext {
    /// 0–23
    #[serde(alias = "time")]
    pub hour: u32,
    /// 0 = Monday … 6 = Sunday
    pub day_of_week: u32,
    #[serde(default = "unknown_mode")]
    pub mode: String,
    /// minutes
    #[serde(default, alias = "duration")]
    pub duration_min: f64,
}

fn unknown_mode() -> String {
    "unknown".to_string()
}

impl PurposeContext {
    pub fn new(hour: u32, day_of_week: u32, mode: &str, duration_min: f64) -> Self {
        Self {
            hour,
            day_of_week,
            mode: mode.to_string(),
            duration_min,
        }
    }

    /// Hour and weekday taken from a UTC timestamp.
    pub fn at(timestamp: DateTime<Utc>, mode: &str, duration_min: f64) -> Self {
        Self::new(
            timestamp.hour(),
            timestamp.weekday().num_days_from_monday(),
            mode,
            duration_min,
        )
    }

    pub fn is_weekend(&self) -> bool {
        self.day_of_week >= SATURDAY
    }

    fn validate(&self) -> Result<()> {
        if self.hour > 23 {
            return Err(InferenceError::InvalidInput(format!("hour must be 0-23, got {}", self.hour)));
        }
        if self.day_of_week > 6 {
            return Err(InferenceError::InvalidInput(format!(
                "day_of_week must be 0-6 (0=Monday), got {}",
                self.day_of_week
            )));
        }
        require_finite("duration", self.duration_min)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextFactors {
    pub time_of_day: u32,
    pub day_of_week: u32,
    pub mode: String,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurposePrediction {
    pub purpose: TripPurpose,
    pub confidence: f64,
    pub probabilities: Distribution<TripPurpose>,
    pub context_factors: ContextFactors,
}

fn base_table(hour: u32) -> &'static [(TripPurpose, f64)] {
    HOUR_BRACKETS
        .iter()
        .find(|(from, to, _)| (*from..=*to).contains(&hour))
        .map(|(_, _, table)| *table)
        .unwrap_or(NIGHT_TABLE)
}

/// Hour bracket table, weekend and Friday adjustments, normalization, argmax.
pub fn predict_purpose(ctx: &PurposeContext) -> Result<PurposePrediction> {
    ctx.validate()?;

    let mut dist = Distribution::from_table(base_table(ctx.hour));

    if ctx.is_weekend() {
        dist.add(Leisure, 0.2);
        dist.add(Tourism, 0.15);
        dist.add(Religious, 0.1);
        // decay, never subtract: mass stays >= 0
        dist.scale(Work, 0.3);
        dist.scale(Education, 0.1);
    }
    if ctx.day_of_week == FRIDAY {
        dist.add(Religious, 0.1);
    }

    let dist = dist.normalized()?;
    let (purpose, confidence) = dist
        .top()
        .ok_or_else(|| InferenceError::NormalizationFailure("empty purpose table".into()))?;

    debug!(
        "purpose hour={} dow={} -> {} ({:.3})",
        ctx.hour,
        ctx.day_of_week,
        purpose.as_str(),
        confidence
    );

    Ok(PurposePrediction {
        purpose,
        confidence,
        probabilities: dist.zero_filled(),
        context_factors: ContextFactors {
            time_of_day: ctx.hour,
            day_of_week: ctx.day_of_week,
            mode: ctx.mode.clone(),
            duration: ctx.duration_min,
        },
    })
}

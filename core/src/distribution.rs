use std::fmt::Debug;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{InferenceError, Result};

/// Tolerance used when checking that a normalized distribution sums to 1.
pub const SUM_TOLERANCE: f64 = 1e-6;

/// A finite, ordered label set (transport modes, trip purposes).
pub trait Label: Copy + Eq + Debug + 'static {
    /// Every label, in zero-fill order.
    const ALL: &'static [Self];
    fn as_str(&self) -> &'static str;
}

/// Ordered label → probability table.
///
/// Entry order is the tie-break priority: `top()` returns the first entry with
/// the maximal value. Tables keep their base row order and labels created by
/// adjustments are appended in creation order.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution<L: Label> {
    entries: Vec<(L, f64)>,
}

impl<L: Label> Distribution<L> {
    pub fn from_table(table: &[(L, f64)]) -> Self {
        Self { entries: table.to_vec() }
    }

    pub fn entries(&self) -> &[(L, f64)] {
        &self.entries
    }

    pub fn get(&self, label: L) -> f64 {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, p)| *p)
            .unwrap_or(0.0)
    }

    fn slot(&mut self, label: L) -> &mut f64 {
        let idx = match self.entries.iter().position(|(l, _)| *l == label) {
            Some(i) => i,
            None => {
                self.entries.push((label, 0.0));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    /// Adds `delta` to a label, creating it at 0 first if absent.
    pub fn add(&mut self, label: L, delta: f64) {
        *self.slot(label) += delta;
    }

    /// Multiplies a label's mass, creating it at 0 first if absent.
    pub fn scale(&mut self, label: L, factor: f64) {
        *self.slot(label) *= factor;
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, p)| *p).sum()
    }

    /// Divides every entry by the total.
    pub fn normalized(mut self) -> Result<Self> {
        let total = self.total();
        if !total.is_finite() || total <= 0.0 {
            return Err(InferenceError::NormalizationFailure(format!(
                "{} labels, total={total}",
                self.entries.len()
            )));
        }
        for (_, p) in self.entries.iter_mut() {
            *p /= total;
        }
        Ok(self)
    }

    /// First label holding the maximal probability.
    pub fn top(&self) -> Option<(L, f64)> {
        let mut best: Option<(L, f64)> = None;
        for &(label, p) in &self.entries {
            match best {
                Some((_, bp)) if p <= bp => {}
                _ => best = Some((label, p)),
            }
        }
        best
    }

    /// Appends every label not yet present at probability 0.
    pub fn zero_filled(mut self) -> Self {
        for &label in L::ALL {
            if !self.entries.iter().any(|(l, _)| *l == label) {
                self.entries.push((label, 0.0));
            }
        }
        self
    }
}

impl<L: Label> Serialize for Distribution<L> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, p) in &self.entries {
            map.serialize_entry(label.as_str(), p)?;
        }
        map.end()
    }
}

//! Runtime feedback on jump-target matching.
//!
//! Each anchor (by its ordinal among the program's anchors) may carry a
//! regulator value that is added to its raw tag distance during matching.
//! Positive values push an anchor away from queries, negative values pull
//! it closer. Values fade back toward zero through [`Regulation::decay`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Regulation {
    regulators: BTreeMap<usize, f64>,
}

impl Regulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, anchor: usize) -> f64 {
        self.regulators.get(&anchor).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, anchor: usize, value: f64) {
        if value == 0.0 || !value.is_finite() {
            self.regulators.remove(&anchor);
        } else {
            self.regulators.insert(anchor, value);
        }
    }

    pub fn adjust(&mut self, anchor: usize, delta: f64) {
        let value = self.get(anchor) + delta;
        self.set(anchor, value);
    }

    /// Scales every regulator by `factor` (expected in `[0, 1]`), dropping
    /// ones that have faded to nothing.
    pub fn decay(&mut self, factor: f64) {
        for value in self.regulators.values_mut() {
            *value *= factor;
        }
        self.regulators.retain(|_, v| v.abs() > f64::EPSILON);
    }

    pub fn clear(&mut self) {
        self.regulators.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.regulators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_anchor_is_neutral() {
        assert_eq!(Regulation::new().get(3), 0.0);
    }

    #[test]
    fn adjust_accumulates_and_cancels() {
        let mut reg = Regulation::new();
        reg.adjust(1, 2.0);
        reg.adjust(1, 1.5);
        assert_eq!(reg.get(1), 3.5);
        reg.adjust(1, -3.5);
        assert!(reg.is_empty());
    }

    #[test]
    fn decay_fades_toward_zero() {
        let mut reg = Regulation::new();
        reg.set(0, 8.0);
        reg.set(2, -4.0);
        reg.decay(0.5);
        assert_eq!(reg.get(0), 4.0);
        assert_eq!(reg.get(2), -2.0);
        reg.decay(0.0);
        assert!(reg.is_empty());
    }
}

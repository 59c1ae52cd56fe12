// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Randomness source abstraction, mirroring [`crate::clock::Clock`] so that
//! probability-dependent actions (theft success, generator variety) can be
//! driven deterministically in tests.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn seed_from_entropy() -> StdRng {
    StdRng::from_rng(rand::rng())
}

/// Produces uniform floats in `[0.0, 1.0)` for probability rolls.
pub trait RngSource: Clone + Send + Sync {
    fn next_f64(&self) -> f64;

    /// Roll against a success probability in `[0.0, 1.0]`.
    fn roll_success(&self, probability: f64) -> bool {
        self.next_f64() < probability
    }
}

/// Thread-safe, OS-seeded RNG for production use.
#[derive(Clone)]
pub struct StdRngSource {
    inner: Arc<Mutex<StdRng>>,
}

impl StdRngSource {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(seed_from_entropy())),
        }
    }

    /// Build from an explicit seed. Still production-usable, but mainly
    /// useful for reproducing a reported bug from a logged seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }
}

impl Default for StdRngSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RngSource for StdRngSource {
    fn next_f64(&self) -> f64 {
        self.inner.lock().random::<f64>()
    }
}

/// Deterministic RNG for tests: returns a fixed sequence of values, cycling
/// once exhausted. A single-value sequence behaves like a constant.
#[derive(Clone)]
pub struct FixedRngSource {
    values: Arc<Vec<f64>>,
    cursor: Arc<Mutex<usize>>,
}

impl FixedRngSource {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        let values = values.into();
        assert!(!values.is_empty(), "FixedRngSource needs at least one value");
        Self {
            values: Arc::new(values),
            cursor: Arc::new(Mutex::new(0)),
        }
    }

    /// A source that always rolls as a success (returns 0.0).
    pub fn always_succeeds() -> Self {
        Self::new(vec![0.0])
    }

    /// A source that always rolls as a failure (returns 1.0).
    pub fn always_fails() -> Self {
        Self::new(vec![1.0])
    }
}

impl RngSource for FixedRngSource {
    fn next_f64(&self) -> f64 {
        let mut cursor = self.cursor.lock();
        let v = self.values[*cursor % self.values.len()];
        *cursor += 1;
        v
    }
}

#[cfg(test)]
#[path = "rng_tests.rs"]
mod tests;

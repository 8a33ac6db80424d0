// Best integer assignment found so far, shared between search workers
//
// The objective of the stored assignment is mirrored in an atomic so that
// pruning can read the bound without taking the lock. The mutex guarding the
// assignment is the source of truth; the atomic only ever lags behind it.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stored incumbent: objective in minimization form and the full assignment
#[derive(Debug, Clone, PartialEq)]
pub struct Incumbent {
    pub objective: f64,
    pub values: Vec<f64>,
}

#[derive(Debug)]
pub struct SharedIncumbent {
    bound_bits: AtomicU64,
    best: Mutex<Option<Incumbent>>,
    tolerance: f64,
}

impl SharedIncumbent {
    /// Empty incumbent; candidates must improve by more than `tolerance`.
    pub fn new(tolerance: f64) -> Self {
        Self {
            bound_bits: AtomicU64::new(f64::INFINITY.to_bits()),
            best: Mutex::new(None),
            tolerance,
        }
    }

    pub fn seeded(incumbent: Incumbent, tolerance: f64) -> Self {
        let shared = Self::new(tolerance);
        shared
            .bound_bits
            .store(incumbent.objective.to_bits(), Ordering::Relaxed);
        *shared.best.lock() = Some(incumbent);
        shared
    }

    /// Objective of the current incumbent, `+∞` when there is none
    pub fn upper_bound(&self) -> f64 {
        f64::from_bits(self.bound_bits.load(Ordering::Relaxed))
    }

    /// Whether a subtree with this relaxation bound can still beat the incumbent
    pub fn can_improve(&self, bound: f64) -> bool {
        bound < self.upper_bound() - self.tolerance
    }

    /// Installs the candidate if it is strictly better; returns whether it was.
    pub fn try_install(&self, objective: f64, values: &[f64]) -> bool {
        if !self.can_improve(objective) {
            return false;
        }

        let mut best = self.best.lock();
        let improves = best
            .as_ref()
            .map_or(true, |current| objective < current.objective - self.tolerance);
        if improves {
            *best = Some(Incumbent {
                objective,
                values: values.to_vec(),
            });
            self.bound_bits.store(objective.to_bits(), Ordering::Relaxed);
        }
        improves
    }

    pub fn snapshot(&self) -> Option<Incumbent> {
        self.best.lock().clone()
    }

    pub fn into_inner(self) -> Option<Incumbent> {
        self.best.into_inner()
    }
}

//! # Fibonacci Backoff
//!
//! Requeue delays for failed reconciliation passes.
//!
//! Delays grow along the Fibonacci sequence in minutes and are capped:
//! 1m, 1m, 2m, 3m, 5m, 8m, 10m. Each store keeps its own sequence, which is
//! reset by the next successful pass.
//!
//! ```rust
//! use secret_store_controller::controller::backoff::FibonacciBackoff;
//! use std::time::Duration;
//!
//! let mut backoff = FibonacciBackoff::new(1, 10);
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(60));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(60));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(120));
//! ```

use crate::crd::StoreKey;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Fibonacci sequence of delays, in minutes
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min_minutes: u64,
    prev_minutes: u64,
    current_minutes: u64,
    max_minutes: u64,
}

impl FibonacciBackoff {
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            min_minutes,
            prev_minutes: 0,
            current_minutes: min_minutes,
            max_minutes: max_minutes.max(min_minutes),
        }
    }

    /// Current delay, then advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let delay = Duration::from_secs(self.current_minutes * 60);
        let next_minutes = self.prev_minutes + self.current_minutes;
        self.prev_minutes = self.current_minutes;
        self.current_minutes = next_minutes.min(self.max_minutes);
        delay
    }

    pub fn reset(&mut self) {
        self.prev_minutes = 0;
        self.current_minutes = self.min_minutes;
    }
}

/// Per-store backoff sequences
///
/// Passes for one store are serialized by the controller, so the lock is only
/// contended across different stores and held for a map lookup.
#[derive(Debug)]
pub struct BackoffStates {
    min_minutes: u64,
    max_minutes: u64,
    states: Mutex<HashMap<StoreKey, FibonacciBackoff>>,
}

impl BackoffStates {
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            min_minutes,
            max_minutes,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Next delay for a failing store
    pub fn next_backoff(&self, key: &StoreKey) -> Duration {
        let mut states = self
            .states
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        states
            .entry(key.clone())
            .or_insert_with(|| FibonacciBackoff::new(self.min_minutes, self.max_minutes))
            .next_backoff()
    }

    /// Forget the failure history of a store
    pub fn reset(&self, key: &StoreKey) {
        let mut states = self
            .states
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        states.remove(key);
    }

    /// Whether a store currently has failure history
    #[must_use]
    pub fn is_tracked(&self, key: &StoreKey) -> bool {
        self.states
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains_key(key)
    }
}

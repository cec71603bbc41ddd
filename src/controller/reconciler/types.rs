//! # Types
//!
//! Shared reconciler context and per-resource backoff state.

use super::engine::Engine;
use crate::clients::Clients;
use crate::config::ControllerConfig;
use kube::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Failure history of one resource
///
/// Delays follow the Fibonacci sequence in whole minutes, capped at the
/// configured maximum: 1m, 1m, 2m, 3m, 5m, 8m, 10m, 10m, ...
/// A successful pass drops the state instead of resetting it.
#[derive(Debug, Clone)]
pub struct BackoffState {
    previous_minutes: u64,
    current_minutes: u64,
    max_minutes: u64,
    pub failures: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            previous_minutes: 0,
            current_minutes: min_minutes.min(max_minutes),
            max_minutes,
            failures: 0,
        }
    }

    /// Record a failure and return the delay before the next attempt
    pub fn next_delay(&mut self) -> Duration {
        self.failures += 1;
        let delay = Duration::from_secs(self.current_minutes * 60);
        let next = self.previous_minutes + self.current_minutes;
        self.previous_minutes = self.current_minutes;
        self.current_minutes = next.min(self.max_minutes);
        delay
    }
}

/// Context shared by every controller
#[derive(Clone)]
pub struct Reconciler {
    pub client: Client,
    pub engine: Engine,
    pub config: ControllerConfig,
    /// Keyed by `kind/namespace/name`
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(client: Client, clients: Clients, config: ControllerConfig) -> Self {
        let engine = Engine::new(
            clients,
            config.vault.clone(),
            config.service_account_token_ttl_secs,
        );
        Self {
            client,
            engine,
            config,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Next backoff delay for a resource, advancing its sequence
    #[must_use]
    pub fn next_backoff(&self, resource_key: &str) -> Duration {
        match self.backoff_states.lock() {
            Ok(mut states) => states
                .entry(resource_key.to_string())
                .or_insert_with(|| {
                    BackoffState::new(self.config.backoff_min_minutes, self.config.backoff_max_minutes)
                })
                .next_delay(),
            Err(e) => {
                tracing::warn!("Failed to lock backoff_states: {}, using minimum backoff", e);
                Duration::from_secs(self.config.backoff_min_minutes * 60)
            }
        }
    }

    /// Forget a resource's failures after a successful pass
    pub fn reset_backoff(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(resource_key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(state: &mut BackoffState, n: usize) -> Vec<u64> {
        (0..n).map(|_| state.next_delay().as_secs() / 60).collect()
    }

    #[test]
    fn test_fibonacci_sequence_capped() {
        let mut state = BackoffState::new(1, 10);
        assert_eq!(minutes(&mut state, 9), vec![1, 1, 2, 3, 5, 8, 10, 10, 10]);
        assert_eq!(state.failures, 9);
    }

    #[test]
    fn test_states_are_independent() {
        let mut first = BackoffState::new(1, 10);
        let mut second = BackoffState::new(1, 10);
        minutes(&mut first, 4);
        assert_eq!(minutes(&mut second, 2), vec![1, 1]);
        assert_eq!(minutes(&mut first, 1), vec![5]);
    }
}

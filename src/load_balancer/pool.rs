//! Backend pool management.
//!
//! # Responsibilities
//! - Own the ordered backend records for the process lifetime
//! - Guard health state and the selection cursor behind one lock
//! - Apply the load balancing algorithm to the healthy subset

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::config::BackendConfig;
use crate::load_balancer::{
    backend::{Backend, HealthState},
    round_robin::RoundRobin,
    LoadBalancer, PoolError,
};

/// Ordered set of backends plus the selector that rotates through them.
///
/// The backend list is fixed at construction. Only health state changes
/// afterwards, and every read or write of it happens under `backends`'
/// lock. The lock is never held across an await point.
#[derive(Debug)]
pub struct BackendPool {
    backends: Mutex<Vec<Backend>>,
    balancer: Box<dyn LoadBalancer>,
}

impl BackendPool {
    /// Create a round-robin pool from already-built backends.
    pub fn new(backends: Vec<Backend>) -> Result<Self, PoolError> {
        Self::with_balancer(backends, Box::new(RoundRobin::new()))
    }

    /// Create a pool with an explicit selection algorithm.
    pub fn with_balancer(
        backends: Vec<Backend>,
        balancer: Box<dyn LoadBalancer>,
    ) -> Result<Self, PoolError> {
        if backends.is_empty() {
            return Err(PoolError::Empty);
        }

        let mut seen = HashSet::new();
        for backend in &backends {
            if !seen.insert(backend.address.as_str()) {
                return Err(PoolError::DuplicateAddress(backend.address.clone()));
            }
        }

        Ok(Self {
            backends: Mutex::new(backends),
            balancer,
        })
    }

    /// Create a new pool from configuration, preserving configured order.
    pub fn from_config(configs: &[BackendConfig]) -> Result<Self, PoolError> {
        let backends = configs
            .iter()
            .map(|config| Backend::new(config.address.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let pool = Self::new(backends)?;
        tracing::debug!(backends = pool.len(), "Backend pool created");
        Ok(pool)
    }

    /// Number of configured backends. Never changes.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Point-in-time copy of every backend, in configured order.
    pub fn snapshot(&self) -> Vec<Backend> {
        self.lock().clone()
    }

    /// Copies of the currently healthy backends, in configured order.
    pub fn healthy_subset(&self) -> Vec<Backend> {
        self.lock()
            .iter()
            .filter(|b| b.is_healthy())
            .cloned()
            .collect()
    }

    /// Select the next backend to serve a request.
    ///
    /// Reading the healthy subset and advancing the cursor happen in one
    /// critical section, so concurrent callers never share a cursor value.
    pub fn select(&self) -> Option<Backend> {
        let backends = self.lock();
        let healthy: Vec<&Backend> = backends.iter().filter(|b| b.is_healthy()).collect();

        let selected = self.balancer.next_server(&healthy).cloned();
        if selected.is_none() {
            tracing::debug!(backend_count = backends.len(), "No healthy backends found");
        }
        selected
    }

    /// Record a probe result for `address`. Returns the previous state.
    ///
    /// Idempotent for known addresses. An unknown address leaves the pool
    /// untouched.
    pub fn set_health(
        &self,
        address: &str,
        healthy: bool,
        at: DateTime<Utc>,
    ) -> Result<HealthState, PoolError> {
        let mut backends = self.lock();
        let backend = backends
            .iter_mut()
            .find(|b| b.address == address)
            .ok_or_else(|| PoolError::UnknownBackend(address.to_string()))?;

        Ok(backend.record_probe(healthy, at))
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Backend>> {
        // Records are plain data and every write is a whole-field store, so a
        // poisoned lock still guards a consistent value.
        self.backends.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request arrives
//!     → pool.rs (lock, take the healthy subset in configured order)
//!     → round_robin.rs (cursor mod subset size, advance cursor)
//!     → backend.rs (copy of the chosen record handed to the proxy)
//!     → lock released before any network I/O
//! ```
//!
//! # Design Decisions
//! - One lock guards health state and the cursor together
//! - Unhealthy backends excluded from selection
//! - Backend set is fixed at startup; no dynamic add/remove

pub mod backend;
pub mod pool;
pub mod round_robin;

use std::fmt::Debug;

pub use backend::{Backend, HealthState};
pub use pool::BackendPool;
pub use round_robin::RoundRobin;

/// A backend selection policy.
///
/// `BackendPool` calls this while holding its lock, so implementations see a
/// stable candidate list and need no synchronization of their own beyond
/// being `Sync`.
pub trait LoadBalancer: Send + Sync + Debug {
    /// Pick one of `candidates`, or `None` when there are none.
    fn next_server<'a>(&self, candidates: &[&'a Backend]) -> Option<&'a Backend>;
}

/// Errors raised by pool construction and health updates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("backend pool must contain at least one backend")]
    Empty,

    #[error("invalid backend address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("backend {0:?} is configured more than once")]
    DuplicateAddress(String),

    #[error("no backend with address {0:?} in pool")]
    UnknownBackend(String),
}

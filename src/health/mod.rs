//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe each backend's health endpoint, one after another
//!     → pool.set_health(address, healthy, now)
//! ```
//!
//! # Design Decisions
//! - No hysteresis: one probe result is enough to flip a backend
//! - Probe failures never escape the monitor; they become state transitions
//! - Health state is per-backend, not per-pool

pub mod active;

pub use active::{HealthMonitor, ProbeFailure};

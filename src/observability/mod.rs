//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy handler and health monitor produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through logs and forwarded requests
//! - Metrics are cheap (atomic increments) and optional

pub mod logging;
pub mod metrics;

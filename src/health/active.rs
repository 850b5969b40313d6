//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe backends
//! - Update backend health state based on results

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::Utc;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::lifecycle::ShutdownSignal;
use crate::load_balancer::{Backend, BackendPool, HealthState};
use crate::observability::metrics;

const USER_AGENT: &str = "lb-proxy-health-check";

/// Why a single probe counted as a failure.
///
/// Never leaves this module: it is turned into an `Unhealthy` transition
/// and a log line.
#[derive(Debug, thiserror::Error)]
pub enum ProbeFailure {
    #[error("invalid probe URI: {0}")]
    InvalidUri(#[from] axum::http::uri::InvalidUri),

    #[error("failed to build probe request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("non-success status {0}")]
    Status(StatusCode),

    #[error("connection error: {0}")]
    Connect(#[from] hyper_util::client::legacy::Error),

    #[error("timed out")]
    Timeout,
}

pub struct HealthMonitor {
    pool: Arc<BackendPool>,
    config: HealthCheckConfig,
    client: Client<HttpConnector, Body>,
}

impl HealthMonitor {
    pub fn new(pool: Arc<BackendPool>, config: HealthCheckConfig) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(HttpConnector::new());

        Self {
            pool,
            config,
            client,
        }
    }

    /// Probe all backends every `interval_secs` until `shutdown` fires.
    ///
    /// The first round runs immediately.
    pub async fn run(self, mut shutdown: ShutdownSignal) {
        tracing::info!(
            interval = self.config.interval_secs,
            timeout = self.config.timeout_secs,
            path = %self.config.path,
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run one probe round over every backend, in configured order.
    pub async fn check_all(&self) {
        let backends = self.pool.snapshot();
        let mut healthy_count = 0;

        for backend in &backends {
            let healthy = match self.probe(backend).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(backend = %backend.address, error = %e, "Health check failed");
                    false
                }
            };
            if healthy {
                healthy_count += 1;
            }

            match self.pool.set_health(&backend.address, healthy, Utc::now()) {
                Ok(previous) => log_transition(&backend.address, previous, healthy),
                Err(e) => tracing::error!(error = %e, "Health result for backend outside the pool"),
            }

            metrics::record_health_check(&backend.address, healthy);
        }

        tracing::debug!(
            healthy = healthy_count,
            total = backends.len(),
            "Health check round complete"
        );
    }

    async fn probe(&self, backend: &Backend) -> Result<(), ProbeFailure> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(backend.health_uri(&self.config.path)?)
            .header(header::USER_AGENT, USER_AGENT)
            .body(Body::empty())?;

        match time::timeout(self.config.timeout(), self.client.request(request)).await {
            Ok(Ok(response)) if response.status().is_success() => Ok(()),
            Ok(Ok(response)) => Err(ProbeFailure::Status(response.status())),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(ProbeFailure::Timeout),
        }
    }
}

fn log_transition(address: &str, previous: HealthState, healthy: bool) {
    match (previous, healthy) {
        (HealthState::Unhealthy, true) => {
            tracing::info!(backend = %address, "Backend recovered, marked healthy");
        }
        (HealthState::Healthy, false) => {
            tracing::warn!(backend = %address, "Backend marked unhealthy");
        }
        _ => {}
    }
}

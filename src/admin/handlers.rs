use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;
use crate::load_balancer::{Backend, BackendPool};

/// Body of `GET /lb/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub backends: Vec<BackendStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendStatus {
    pub url: String,
    pub healthy: bool,
    /// `null` until the first probe of this backend completes.
    pub last_check: Option<DateTime<Utc>>,
}

impl StatusReport {
    pub fn healthy_count(&self) -> usize {
        self.backends.iter().filter(|b| b.healthy).count()
    }
}

impl From<&Backend> for BackendStatus {
    fn from(backend: &Backend) -> Self {
        Self {
            url: backend.address.clone(),
            healthy: backend.is_healthy(),
            last_check: backend.last_checked,
        }
    }
}

/// Build a report from a single pool snapshot, in configured order.
pub fn report(pool: &BackendPool) -> StatusReport {
    StatusReport {
        backends: pool.snapshot().iter().map(BackendStatus::from).collect(),
    }
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusReport> {
    Json(report(&state.pool))
}

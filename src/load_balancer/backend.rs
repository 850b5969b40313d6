//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server by its configured address
//! - Cache the parsed base URI requests are forwarded to
//! - Carry health state (Healthy/Unhealthy) and the time of the last probe

use axum::http::Uri;
use chrono::{DateTime, Utc};

use crate::load_balancer::PoolError;

/// Health State enum.
///
/// Every probe result is a transition; there is no hysteresis and no
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthState {
    #[default]
    Healthy,
    Unhealthy,
}

impl HealthState {
    /// State implied by a single probe outcome.
    pub fn from_probe(success: bool) -> Self {
        if success {
            HealthState::Healthy
        } else {
            HealthState::Unhealthy
        }
    }
}

/// A single backend server.
///
/// Values handed out by the pool are copies; mutating one never affects the
/// pool's own record.
#[derive(Debug, Clone)]
pub struct Backend {
    /// The address as configured. This is the backend's identity.
    pub address: String,
    /// Pre-parsed base URI, the target of every forwarded request.
    pub uri: Uri,
    /// Current health state.
    pub state: HealthState,
    /// When the last probe for this backend completed, if any has.
    pub last_checked: Option<DateTime<Utc>>,
}

impl Backend {
    /// Create a new backend. It starts out healthy and unprobed.
    pub fn new(address: impl Into<String>) -> Result<Self, PoolError> {
        let address = address.into();
        let uri: Uri = address.parse().map_err(|e: axum::http::uri::InvalidUri| {
            PoolError::InvalidAddress {
                address: address.clone(),
                reason: e.to_string(),
            }
        })?;

        if uri.scheme_str() != Some("http") || uri.authority().is_none() {
            return Err(PoolError::InvalidAddress {
                address,
                reason: "expected an absolute http:// URL".to_string(),
            });
        }

        Ok(Self {
            address,
            uri,
            state: HealthState::Healthy,
            last_checked: None,
        })
    }

    /// Return true if the backend may receive traffic.
    pub fn is_healthy(&self) -> bool {
        self.state == HealthState::Healthy
    }

    /// URI of this backend's health endpoint.
    ///
    /// `path` is appended to the base path; any query or fragment on the
    /// configured address is dropped.
    pub fn health_uri(&self, path: &str) -> Result<Uri, axum::http::uri::InvalidUri> {
        let scheme = self.uri.scheme_str().unwrap_or("http");
        let authority = self.uri.authority().map(|a| a.as_str()).unwrap_or_default();
        let base = self.uri.path().trim_end_matches('/');

        format!("{}://{}{}{}", scheme, authority, base, path).parse()
    }

    /// Apply a probe result. Returns the state held before the probe.
    pub(crate) fn record_probe(&mut self, healthy: bool, at: DateTime<Utc>) -> HealthState {
        let previous = self.state;
        self.state = HealthState::from_probe(healthy);
        self.last_checked = Some(at);
        previous
    }
}

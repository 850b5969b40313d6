//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics. Every problem found is
//! returned, not just the first.

use std::collections::HashSet;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("at least one backend must be configured")]
    NoBackends,

    #[error("backend address {address:?} is invalid: {reason}")]
    InvalidBackendAddress { address: String, reason: String },

    #[error("backend address {0:?} is configured more than once")]
    DuplicateBackend(String),

    #[error("bind address {0:?} is not a socket address")]
    InvalidBindAddress(String),

    #[error("health_check.interval_secs must be greater than zero")]
    ZeroInterval,

    #[error("health_check.timeout_secs must be greater than zero")]
    ZeroProbeTimeout,

    #[error("health_check.path must start with '/', got {0:?}")]
    InvalidHealthPath(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    let mut seen = HashSet::new();
    for backend in &config.backends {
        if let Err(reason) = check_backend_address(&backend.address) {
            errors.push(ValidationError::InvalidBackendAddress {
                address: backend.address.clone(),
                reason,
            });
        }
        if !seen.insert(backend.address.as_str()) {
            errors.push(ValidationError::DuplicateBackend(backend.address.clone()));
        }
    }

    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::ZeroInterval);
    }
    if config.health_check.timeout_secs == 0 {
        errors.push(ValidationError::ZeroProbeTimeout);
    }
    if !config.health_check.path.starts_with('/') {
        errors.push(ValidationError::InvalidHealthPath(
            config.health_check.path.clone(),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Backends must be plain `http://host[:port]` URLs; TLS is not terminated or originated.
fn check_backend_address(address: &str) -> Result<(), String> {
    let url = Url::parse(address).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme {:?}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(())
}

//! Read-only status endpoint.
//!
//! `GET /lb/status` reports every configured backend with its health flag
//! and last probe time, taken from one pool snapshot.

pub mod handlers;

use axum::{routing::get, Router};

use self::handlers::get_status;
use crate::http::server::AppState;

pub use handlers::{report, BackendStatus, StatusReport};

pub const STATUS_PATH: &str = "/lb/status";

pub fn status_router() -> Router<AppState> {
    Router::new().route(STATUS_PATH, get(get_status))
}

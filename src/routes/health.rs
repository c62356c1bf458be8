//! Health check endpoint
//!
//! GET /health answers 200 with per-table row counts while the database
//! answers queries, and 503 otherwise.

use hyper::StatusCode;
use serde::Serialize;
use tracing::warn;

use crate::db::DbStats;
use crate::services::Services;

use super::response::json_response;
use super::HttpResponse;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DbStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn health_check(services: &Services) -> HttpResponse {
    let version = env!("CARGO_PKG_VERSION");

    match services.db.stats() {
        Ok(stats) => json_response(
            StatusCode::OK,
            &HealthResponse {
                status: "ok",
                version,
                database: Some(stats),
                error: None,
            },
        ),
        Err(e) => {
            warn!("Health probe failed: {}", e);
            json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                &HealthResponse {
                    status: "unavailable",
                    version,
                    database: None,
                    error: Some(e.message().to_string()),
                },
            )
        }
    }
}

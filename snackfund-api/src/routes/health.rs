/// Health check endpoint
///
/// Reports whether the server is up and the database reachable.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "message": "Service is healthy",
///   "statusCode": 200,
///   "data": {
///     "status": "healthy",
///     "version": "0.1.0",
///     "database": "connected",
///     "pool": { "activeConnections": 1, "idleConnections": 4, "totalConnections": 5 }
///   }
/// }
/// ```

use crate::{app::AppState, response::ApiResponse};
use axum::extract::State;
use serde::{Deserialize, Serialize};
use snackfund_shared::db::pool::{get_pool_stats, health_check as db_health_check, PoolStats};

/// Health check payload
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    /// Application version
    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,

    /// Connection pool usage
    pub pool: PoolStats,
}

/// Health check handler
///
/// Always answers 200; a database outage shows up as `degraded`.
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthResponse> {
    let database_ok = match db_health_check(&state.db).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "database health check failed");
            false
        }
    };

    let (status, message) = if database_ok {
        ("healthy", "Service is healthy")
    } else {
        ("degraded", "Service is degraded")
    };

    ApiResponse::ok(
        message,
        HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: if database_ok { "connected" } else { "disconnected" }.to_string(),
            pool: get_pool_stats(&state.db),
        },
    )
}

// HTTP health endpoint
//
// Optional sidecar started next to the stdio server so process supervisors
// can check liveness. It serves nothing but `/health`.

use std::sync::Arc;

use anyhow::Result;
use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::config::GatewayConfig;

pub fn router(config: Arc<GatewayConfig>) -> Router {
    Router::new().route("/health", get(health_check)).with_state(config)
}

/// Run the health interface on `0.0.0.0:<port>`
pub async fn run_health_interface(port: u16, config: Arc<GatewayConfig>) -> Result<()> {
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", bind_addr, e))?;

    info!("Health endpoint listening on http://{}/health", bind_addr);

    axum::serve(listener, router(config))
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}

/// Health check endpoint
async fn health_check(State(config): State<Arc<GatewayConfig>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "server": "running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": config.environment()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_environment() {
        let Json(body) = health_check(State(Arc::new(GatewayConfig::default()))).await;
        assert_eq!(body["status"], json!("ok"));
        assert_eq!(body["server"], json!("running"));
        assert_eq!(body["environment"], json!("sandbox"));
    }
}

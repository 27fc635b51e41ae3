//! Read-only HTTP status endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use trending_engine::{StatusSnapshot, TrendingMonitor};

/// Create the status router.
pub fn create_status_router(monitor: Arc<TrendingMonitor>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/status", get(status_handler))
        .layer(cors)
        .with_state(monitor)
}

/// Health check handler.
async fn health_handler() -> &'static str {
    "OK"
}

async fn status_handler(State(monitor): State<Arc<TrendingMonitor>>) -> Json<StatusSnapshot> {
    Json(monitor.status())
}

/// Bind and serve in the background.
pub async fn start_status_server(
    monitor: Arc<TrendingMonitor>,
    port: u16,
) -> Result<tokio::task::JoinHandle<()>, Box<dyn std::error::Error + Send + Sync>> {
    let app = create_status_router(monitor);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Status server listening on http://0.0.0.0:{}", port);

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Status server error: {}", e);
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use trending_core::{Clock, ManualClock};
    use trending_engine::{
        CheckCycle, CycleConfig, DedupTracker, MessageFormatter, MonitorConfig, NotificationSink,
        SinkError,
    };
    use trending_feeds::FetchCoordinator;

    struct NullSink;

    #[async_trait::async_trait]
    impl NotificationSink for NullSink {
        async fn emit(&self, _message: &str) -> Result<(), SinkError> {
            Ok(())
        }
    }

    struct NullFormatter;

    impl MessageFormatter for NullFormatter {
        fn format_token(&self, token: &trending_core::TrendingToken) -> String {
            token.id.clone()
        }
    }

    #[tokio::test]
    async fn test_status_endpoint_serves_json() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(1_700_000_000_000));
        let cycle = CheckCycle::new(
            FetchCoordinator::new(Vec::new(), Arc::clone(&clock)),
            Arc::new(DedupTracker::default()),
            Arc::new(NullSink),
            Arc::new(NullFormatter),
            Arc::clone(&clock),
            CycleConfig::default(),
        );
        let monitor = Arc::new(TrendingMonitor::new(
            Arc::new(cycle),
            clock,
            MonitorConfig::default(),
        ));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = create_status_router(monitor);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        let health = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(health.text().await.unwrap(), "OK");

        let status: serde_json::Value = client
            .get(format!("http://{}/api/status", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status["isRunning"], false);
        assert_eq!(status["trackedCount"], 0);
        assert_eq!(status["pollIntervalMs"], 15_000);
    }
}

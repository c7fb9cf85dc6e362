//! HTTP server setup for the pong service.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, timeout, body limit, request id)
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::PropagateRequestIdLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::PongConfig;
use crate::http::handlers;
use crate::ratelimit::RemoteAdmissionController;
use crate::store::RecordStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RemoteAdmissionController>,
    pub store: Arc<RecordStore>,
}

/// HTTP server for the pong service.
pub struct PongServer {
    router: Router,
    config: PongConfig,
}

impl PongServer {
    /// Create a server around explicitly owned limiter and store instances.
    pub fn new(config: PongConfig, limiter: Arc<RemoteAdmissionController>, store: Arc<RecordStore>) -> Self {
        let state = AppState { limiter, store };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &PongConfig, state: AppState) -> Router {
        Router::new()
            .route("/api/pong", get(handlers::pong))
            .route("/api/records", post(handlers::ingest_record).get(handlers::list_records))
            .route("/health", get(handlers::health))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.records.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rate_limit = self.config.rate_limit.rate_limit,
            window_ms = self.config.rate_limit.window_ms,
            "Pong server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Pong server received shutdown signal");
            })
            .await?;

        tracing::info!("Pong server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &PongConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::RateLimiterConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn router(rate_limit: u32) -> (Router, Arc<RecordStore>) {
        let limiter = Arc::new(RemoteAdmissionController::new(
            RateLimiterConfig::new(rate_limit, Duration::from_secs(60)).unwrap(),
        ));
        let store = Arc::new(RecordStore::in_memory());
        let state = AppState {
            limiter,
            store: store.clone(),
        };
        (PongServer::build_router(&PongConfig::default(), state), store)
    }

    async fn body_text(res: axum::response::Response) -> String {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_pong_admits_then_denies() {
        let (app, _) = router(1);
        let req = || {
            Request::get("/api/pong")
                .header("x-request-id", "caller-1")
                .body(Body::empty())
                .unwrap()
        };

        let res = app.clone().oneshot(req()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["x-request-id"], "caller-1");
        assert_eq!(body_text(res).await, "World");

        let res = app.oneshot(req()).await.unwrap();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(res.headers().contains_key("retry-after"));
        assert_eq!(body_text(res).await, "Rate limited by Pong service");
    }

    #[tokio::test]
    async fn test_malformed_record_is_rejected() {
        let (app, store) = router(1);
        let req = Request::post("/api/records")
            .header("content-type", "application/json")
            .body(Body::from("{\"requestId\":"))
            .unwrap();

        let res = app.oneshot(req).await.unwrap();
        assert!(res.status().is_client_error());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_health_reports_record_count() {
        let (app, _) = router(1);
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
        assert_eq!(json["records"], 0);
        assert_eq!(json["status"], "operational");
    }
}

//! `SportzServer`: router assembly and the TCP listener.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::Json;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use sportz_store::{CommentaryRepo, Database, MatchRepo};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::api;
use crate::config::ServerConfig;
use crate::gate::AdmissionGate;
use crate::gate::http::http_gate;
use crate::health::{self, HealthResponse};
use crate::publisher::EventPublisher;
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::handler::ws_handler;
use crate::websocket::hub::ConnectionHub;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Registered WebSocket connections.
    pub hub: Arc<ConnectionHub>,
    /// Admission gate for requests and handshakes.
    pub gate: Arc<AdmissionGate>,
    /// Announces domain events to the hub.
    pub publisher: EventPublisher,
    /// Match storage.
    pub matches: MatchRepo,
    /// Commentary storage.
    pub commentary: CommentaryRepo,
    /// Runtime configuration.
    pub config: Arc<ServerConfig>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// Renders `/metrics`.
    pub metrics: PrometheusHandle,
    /// When the server started.
    pub start_time: Instant,
}

/// The Sportz server.
pub struct SportzServer {
    state: AppState,
}

impl SportzServer {
    /// Create a server over an opened database and a resolved gate.
    pub fn new(
        config: ServerConfig,
        db: Database,
        gate: AdmissionGate,
        metrics: PrometheusHandle,
    ) -> Self {
        let hub = Arc::new(ConnectionHub::new());
        let state = AppState {
            publisher: EventPublisher::new(hub.clone()),
            hub,
            gate: Arc::new(gate),
            matches: MatchRepo::new(db.clone()),
            commentary: CommentaryRepo::new(db),
            config: Arc::new(config),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            metrics,
            start_time: Instant::now(),
        };
        Self { state }
    }

    /// Build the Axum router with all routes.
    ///
    /// Every HTTP request goes through the gate, unmatched paths included,
    /// except the operational endpoints `/health` and `/metrics`. `/ws`
    /// admits inside the upgrade so a rejection can carry a close code.
    pub fn router(&self) -> Router {
        let gated = api::routes()
            .fallback(not_found)
            .layer(from_fn_with_state(self.state.gate.clone(), http_gate));

        Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/ws", get(ws_handler))
            .merge(gated)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Bind and serve in a background task.
    ///
    /// The task stops accepting when the shutdown token fires.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let addr = format!("{}:{}", self.state.config.host, self.state.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        let app = self.router().into_make_service_with_connect_info::<SocketAddr>();
        let token = self.state.shutdown.token();

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                error!(error = %e, "server exited with error");
            }
        });

        info!(
            %local_addr,
            gated = self.state.gate.is_enabled(),
            "sportz server listening"
        );
        Ok((local_addr, handle))
    }

    /// Get the connection hub.
    pub fn hub(&self) -> &Arc<ConnectionHub> {
        &self.state.hub
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.state.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.hub.connection_count(),
    ))
}

/// Unmatched paths. Reached only after admission.
async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{Value, json};
    use sportz_settings::{ShieldMode, ShieldSettings};
    use sportz_shield::DecisionClient;
    use sportz_shield::testing::{FailingProvider, FixedProvider};
    use tower::ServiceExt;

    use crate::metrics::detached_handle;

    fn make_server(gate: AdmissionGate) -> SportzServer {
        SportzServer::new(
            ServerConfig::default(),
            Database::in_memory().unwrap(),
            gate,
            detached_handle(),
        )
    }

    fn open_server() -> SportzServer {
        make_server(AdmissionGate::Disabled)
    }

    fn gated(provider: Arc<dyn sportz_shield::DecisionProvider>, mode: ShieldMode) -> AdmissionGate {
        let settings = ShieldSettings {
            key: Some("test-key".into()),
            mode,
            ..ShieldSettings::default()
        };
        AdmissionGate::Enabled(DecisionClient::with_provider(provider, &settings))
    }

    async fn send(server: &SportzServer, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = server.router().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    fn match_body() -> Value {
        json!({
            "sport": "football",
            "homeTeam": "Lions",
            "awayTeam": "Tigers",
            "startTime": "2030-05-01T15:00:00Z",
            "endTime": "2030-05-01T17:00:00Z"
        })
    }

    async fn create_match(server: &SportzServer) -> i64 {
        let (status, body) = send(server, Method::POST, "/matches", Some(match_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_i64().unwrap()
    }

    // ── operational ─────────────────────────────────────────────────

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let server = open_server();
        let (status, body) = send(&server, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["connections"], 0);
    }

    #[tokio::test]
    async fn metrics_endpoint_renders() {
        let server = open_server();
        let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let resp = server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_is_not_gated() {
        let provider = Arc::new(FixedProvider::rate_limited());
        let server = make_server(gated(provider.clone(), ShieldMode::Live));
        let (status, _) = send(&server, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(provider.seen_profiles().is_empty());
    }

    #[tokio::test]
    async fn unknown_route_is_gated() {
        let provider = Arc::new(FixedProvider::rate_limited());
        let server = make_server(gated(provider.clone(), ShieldMode::Live));
        let (status, body) = send(&server, Method::GET, "/nonexistent", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"error": "Forbidden"}));

        let server = make_server(gated(Arc::new(FixedProvider::allow()), ShieldMode::Live));
        let (status, _) = send(&server, Method::GET, "/nonexistent", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_is_not_gated() {
        let provider = Arc::new(FixedProvider::rate_limited());
        let server = make_server(gated(provider.clone(), ShieldMode::Live));
        let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let resp = server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(provider.seen_profiles().is_empty());
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let server = open_server();
        let (status, _) = send(&server, Method::GET, "/nonexistent", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn root_greets() {
        let server = open_server();
        let (status, body) = send(&server, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Welcome to the Sportz Server!"}));
    }

    // ── HTTP gate ───────────────────────────────────────────────────

    #[tokio::test]
    async fn rate_limit_is_forbidden_and_handler_never_runs() {
        let server = make_server(gated(Arc::new(FixedProvider::rate_limited()), ShieldMode::Live));
        let (status, body) = send(&server, Method::POST, "/matches", Some(match_body())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"error": "Forbidden"}));
        assert!(server.state.matches.list(100).unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_bad_gateway() {
        let server = make_server(gated(Arc::new(FailingProvider), ShieldMode::Live));
        let (status, body) = send(&server, Method::POST, "/matches", Some(match_body())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({"error": "Service Unavailable"}));
        assert!(server.state.matches.list(100).unwrap().is_empty());
    }

    #[tokio::test]
    async fn bot_deny_passes_through_on_http() {
        let provider = Arc::new(FixedProvider::bot());
        let server = make_server(gated(provider.clone(), ShieldMode::Live));
        let (status, _) = send(&server, Method::GET, "/matches", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(provider.seen_profiles(), vec![sportz_shield::Profile::Http]);
    }

    #[tokio::test]
    async fn observe_only_lets_denials_through() {
        let server = make_server(gated(Arc::new(FixedProvider::rate_limited()), ShieldMode::DryRun));
        let (status, _) = send(&server, Method::POST, "/matches", Some(match_body())).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn observe_only_provider_failure_is_bad_gateway() {
        let server = make_server(gated(Arc::new(FailingProvider), ShieldMode::DryRun));
        let (status, body) = send(&server, Method::GET, "/matches", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({"error": "Service Unavailable"}));

        let (status, _) = send(&server, Method::POST, "/matches", Some(match_body())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(server.state.matches.list(100).unwrap().is_empty());
    }

    // ── matches ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn create_then_list_matches() {
        let server = open_server();
        let first = create_match(&server).await;
        let second = create_match(&server).await;

        let (status, body) = send(&server, Method::GET, "/matches", None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<i64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![second, first]);

        let (_, body) = send(&server, Method::GET, "/matches?limit=1", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn created_match_defaults() {
        let server = open_server();
        let (_, body) = send(&server, Method::POST, "/matches", Some(match_body())).await;
        assert_eq!(body["data"]["status"], "scheduled");
        assert_eq!(body["data"]["homeScore"], 0);
        assert_eq!(body["data"]["homeTeam"], "Lions");
    }

    #[tokio::test]
    async fn bad_limit_is_rejected() {
        let server = open_server();
        for uri in ["/matches?limit=0", "/matches?limit=101", "/matches?limit=x"] {
            let (status, body) = send(&server, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"], "Invalid query.");
            assert_eq!(body["details"][0]["path"], "limit");
        }
    }

    #[tokio::test]
    async fn invalid_match_payload() {
        let server = open_server();
        let mut body = match_body();
        body["endTime"] = json!("2030-05-01T14:00:00Z");
        let (status, resp) = send(&server, Method::POST, "/matches", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["error"], "Invalid payload");
        assert_eq!(resp["details"][0]["path"], "endTime");
    }

    #[tokio::test]
    async fn malformed_json_body_is_bad_request() {
        let server = open_server();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/matches")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_score_round_trip() {
        let server = open_server();
        let id = create_match(&server).await;
        let (status, body) = send(
            &server,
            Method::PATCH,
            &format!("/matches/{id}/score"),
            Some(json!({"homeScore": 2, "awayScore": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["homeScore"], 2);
        assert_eq!(body["data"]["awayScore"], 1);
    }

    #[tokio::test]
    async fn update_score_unknown_match() {
        let server = open_server();
        let (status, body) = send(
            &server,
            Method::PATCH,
            "/matches/999/score",
            Some(json!({"homeScore": 1, "awayScore": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Match not found"}));
    }

    #[tokio::test]
    async fn update_score_bad_id() {
        let server = open_server();
        let (status, body) = send(
            &server,
            Method::PATCH,
            "/matches/abc/score",
            Some(json!({"homeScore": 1, "awayScore": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid match ID.");
    }

    // ── commentary ──────────────────────────────────────────────────

    fn commentary_body(minute: u32) -> Value {
        json!({"minute": minute, "period": "1H", "eventType": "goal", "message": "Goal!"})
    }

    #[tokio::test]
    async fn commentary_create_and_list() {
        let server = open_server();
        let id = create_match(&server).await;
        let uri = format!("/matches/{id}/commentary");

        for minute in [10, 20] {
            let (status, body) = send(&server, Method::POST, &uri, Some(commentary_body(minute))).await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["data"]["matchId"], id);
        }

        let (status, body) = send(&server, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let data = body.as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["minute"], 20);
    }

    #[tokio::test]
    async fn commentary_for_unknown_match() {
        let server = open_server();
        let (status, body) =
            send(&server, Method::POST, "/matches/42/commentary", Some(commentary_body(1))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Match not found");
    }

    #[tokio::test]
    async fn commentary_query_errors() {
        let server = open_server();
        let (status, body) = send(&server, Method::GET, "/matches/0/commentary", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid match ID.");

        let (status, body) = send(&server, Method::GET, "/matches/1/commentary?limit=500", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid query parameters.");
    }

    #[tokio::test]
    async fn invalid_commentary_payload() {
        let server = open_server();
        let id = create_match(&server).await;
        let (status, body) = send(
            &server,
            Method::POST,
            &format!("/matches/{id}/commentary"),
            Some(json!({"minute": -1, "period": "1H", "eventType": "goal", "message": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid payload");
        assert_eq!(body["details"].as_array().unwrap().len(), 2);
    }

    // ── accessors ───────────────────────────────────────────────────

    #[test]
    fn accessors() {
        let server = open_server();
        assert_eq!(server.config().port, 0);
        assert_eq!(server.hub().connection_count(), 0);
        assert!(!server.shutdown().is_shutting_down());
        assert_eq!(server.state.publisher.announce_match_created(&sample_match()), 0);
    }

    fn sample_match() -> sportz_core::Match {
        let now = chrono::Utc::now();
        sportz_core::Match {
            id: 1,
            sport: "rugby".into(),
            home_team: "A".into(),
            away_team: "B".into(),
            status: sportz_core::MatchStatus::Live,
            start_time: now,
            end_time: now,
            home_score: 0,
            away_score: 0,
            created_at: now,
        }
    }
}

//! HTTP shell over the failover engine
//!
//! Routes:
//! - `POST /webhook/server1`, `POST /webhook/server2`: heartbeats, guarded by `X-Webhook-Secret`
//! - `GET /healthz`, `GET /metrics`: unauthenticated health and metrics
//! - `/api/*`: operator API, guarded by `X-API-Key` when an admin token is configured
//!
//! `/api/diagnostics` also resolves up to three managed names through a
//! public DoH resolver when one is configured.
//!
//! Handlers hold no state of their own; everything goes through
//! [`FailoverEngine`].

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use crate::dns_check::{DnsCheck, DohResolver, MAX_CHECKS};
use failover_core::model::{REDACTED, constant_time_eq};
use failover_core::{
    Error, FailoverEngine, PublicState, PublishReport, StatusSnapshot, TargetId, Targets,
    TuningUpdate, parse_heartbeat,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{error, warn};

/// Header carrying the webhook shared secret
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Header carrying the admin token
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FailoverEngine>,
    /// Required on `/api/*` when set
    pub admin_token: Option<Arc<str>>,
    /// Public resolver for diagnostics; `None` skips the DNS checks
    pub resolver: Option<DohResolver>,
}

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/status", get(get_status))
        .route("/records", get(get_records))
        .route("/refresh-records", post(refresh_records))
        .route("/switch", post(switch))
        .route("/freeze", post(freeze))
        .route("/config", get(get_config).post(update_config))
        .route("/webhook-secret", get(get_webhook_secret))
        .route("/webhook-secret/rotate", post(rotate_webhook_secret))
        .route("/test-notification", post(test_notification))
        .route("/diagnostics", get(diagnostics))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/webhook/server1", post(webhook_server1))
        .route("/webhook/server2", post(webhook_server2))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .nest("/api", admin)
        .with_state(state)
}

/// Error body returned by every handler: `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NoManagedRecords => StatusCode::CONFLICT,
            Error::RateLimited(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Authentication(_)
            | Error::NotFound(_)
            | Error::Http(_)
            | Error::Provider { .. }
            | Error::Notifier(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(expected) = state.admin_token.as_deref() {
        let presented = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());

        if !presented.is_some_and(|key| constant_time_eq(expected, key)) {
            warn!("Rejected admin request to {}", request.uri().path());
            return ApiError::new(StatusCode::UNAUTHORIZED, "Invalid or missing API key")
                .into_response();
        }
    }

    next.run(request).await
}

// ---------------------------------------------------------------------------
// Webhooks
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub message: String,
    pub server1_status: bool,
    pub server2_status: bool,
    /// Summary of the decision the heartbeat triggered
    pub info: String,
}

async fn webhook_server1(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    heartbeat(&state, TargetId::Target1, &headers, &body).await
}

async fn webhook_server2(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    heartbeat(&state, TargetId::Target2, &headers, &body).await
}

async fn heartbeat(
    state: &AppState,
    target: TargetId,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Json<WebhookResponse>, ApiError> {
    let secret = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if secret.is_empty() || !state.engine.verify_webhook_secret(secret).await {
        warn!("Rejected {} heartbeat: invalid webhook secret", target);
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "Invalid webhook secret",
        ));
    }

    let is_up = parse_heartbeat(body).map_err(|e| {
        warn!("Rejected {} heartbeat: {}", target, e);
        ApiError::from(e)
    })?;

    let source = format!("webhook:{}", target.label().to_lowercase());
    let decision = state.engine.heartbeat(target, is_up, &source).await;

    let number = match target {
        TargetId::Target1 => 1,
        TargetId::Target2 => 2,
    };

    Ok(Json(WebhookResponse {
        message: format!("Server{} status updated", number),
        server1_status: decision.target1_up,
        server2_status: decision.target2_up,
        info: decision.summary(),
    }))
}

// ---------------------------------------------------------------------------
// Health and metrics
// ---------------------------------------------------------------------------

async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.engine.snapshot().await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        render_metrics(&snapshot),
    )
}

/// Prometheus text exposition of the service state
fn render_metrics(snapshot: &StatusSnapshot) -> String {
    let flag = |b: bool| if b { 1 } else { 0 };
    let active = match snapshot.active {
        Some(TargetId::Target1) => 1,
        Some(TargetId::Target2) => 2,
        None => 0,
    };

    let mut out = String::new();
    let mut gauge = |name: &str, help: &str, value: i64| {
        let _ = writeln!(out, "# HELP {} {}", name, help);
        let _ = writeln!(out, "# TYPE {} gauge", name);
        let _ = writeln!(out, "{} {}", name, value);
    };

    gauge(
        "failover_current_active",
        "Target currently published (1 or 2, 0 if neither)",
        active,
    );
    gauge(
        "failover_server1_up",
        "Health of target 1",
        flag(snapshot.state.target1_up),
    );
    gauge(
        "failover_server2_up",
        "Health of target 2",
        flag(snapshot.state.target2_up),
    );
    gauge(
        "failover_frozen",
        "Whether automatic decisions are frozen",
        flag(snapshot.state.freeze),
    );
    if let Some(last) = snapshot.state.last_switch_at {
        gauge(
            "failover_last_switch",
            "Unix time of the last DNS switch",
            last.timestamp(),
        );
    }

    out
}

// ---------------------------------------------------------------------------
// Operator API
// ---------------------------------------------------------------------------

async fn get_status(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.engine.snapshot().await)
}

async fn get_records(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "records": state.engine.records().await }))
}

async fn refresh_records(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let count = state.engine.refresh().await.map_err(|e| {
        error!("Record refresh failed: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(json!({ "count": count })))
}

#[derive(Debug, Deserialize)]
struct SwitchRequest {
    target: String,
}

async fn switch(
    State(state): State<AppState>,
    Json(request): Json<SwitchRequest>,
) -> Result<Json<PublishReport>, ApiError> {
    let target = TargetId::parse(&request.target).ok_or_else(|| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "target must be server1 or server2",
        )
    })?;

    let report = state.engine.manual_switch(target).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
struct FreezeRequest {
    #[serde(default)]
    enabled: Value,
}

/// Accept `true`, `1` and the usual form spellings
fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        _ => false,
    }
}

async fn freeze(
    State(state): State<AppState>,
    Json(request): Json<FreezeRequest>,
) -> Json<PublicState> {
    state.engine.set_freeze(truthy(&request.enabled)).await;
    Json(state.engine.snapshot().await.state)
}

#[derive(Debug, Serialize)]
struct ConfigView {
    targets: Targets,
    records: Vec<String>,
    provider: &'static str,
    notifier: &'static str,
    state_store: String,
    state: PublicState,
}

async fn get_config(State(state): State<AppState>) -> Json<ConfigView> {
    let engine = &state.engine;
    Json(ConfigView {
        targets: engine.targets(),
        records: engine.record_names().to_vec(),
        provider: engine.provider_name(),
        notifier: engine.notifier_name(),
        state_store: engine.state_location(),
        state: engine.snapshot().await.state,
    })
}

async fn update_config(
    State(state): State<AppState>,
    Json(update): Json<TuningUpdate>,
) -> Json<PublicState> {
    Json(state.engine.update_tuning(update).await)
}

async fn get_webhook_secret() -> Json<Value> {
    Json(json!({ "webhook_secret": REDACTED }))
}

async fn rotate_webhook_secret(State(state): State<AppState>) -> Json<Value> {
    state.engine.rotate_webhook_secret().await;
    Json(json!({ "rotated": true, "webhook_secret": REDACTED }))
}

async fn test_notification(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.engine.send_test_notification().await?;
    Ok(Json(json!({ "ok": true, "notifier": state.engine.notifier_name() })))
}

async fn diagnostics(State(state): State<AppState>) -> Json<Value> {
    let engine = &state.engine;
    let (provider_ok, provider_error) = match engine.check_provider().await {
        Ok(()) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };

    let records = engine.records().await;
    let dns_checks = match &state.resolver {
        Some(resolver) => {
            let mut names: Vec<String> = engine.record_names().to_vec();
            if names.is_empty() {
                names = records.iter().map(|r| r.name.clone()).collect();
                names.dedup();
            }
            let current = engine.snapshot().await.state.current_target;

            let mut checks = Vec::new();
            for name in names.iter().take(MAX_CHECKS) {
                checks.push(resolver.check(name, current).await);
            }
            checks
        }
        None => Vec::<DnsCheck>::new(),
    };

    Json(json!({
        "provider": engine.provider_name(),
        "provider_ok": provider_ok,
        "provider_error": provider_error,
        "notifier": engine.notifier_name(),
        "state_store": engine.state_location(),
        "cached_records": records.len(),
        "dns_checks": dns_checks,
    }))
}

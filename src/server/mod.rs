//! HTTP surface: one program-builder endpoint plus a health check.

mod auth;
mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::client::AIClient;
use crate::config::Config;
use crate::contract::validate_request;
use crate::generator::ChatOracle;
use crate::repair::{RepairLoop, RepairPolicy};

use auth::AccessToken;
pub use error::ApiError;

pub const PROGRAM_BUILDER_PATH: &str = "/api/program-builder";
pub const ATTEMPTS_HEADER: &str = "x-generation-attempts";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppInner>,
}

struct AppInner {
    generator: Result<RepairLoop, String>,
    access_token: Option<AccessToken>,
}

impl AppState {
    pub fn new(generator: RepairLoop, access_token: Option<String>) -> Self {
        Self {
            inner: Arc::new(AppInner {
                generator: Ok(generator),
                access_token: access_token.as_deref().map(AccessToken::new),
            }),
        }
    }

    /// State for a process started without the model credential: every
    /// generation request fails with a server error and no model call.
    pub fn misconfigured(message: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            inner: Arc::new(AppInner {
                generator: Err(message.into()),
                access_token: access_token.as_deref().map(AccessToken::new),
            }),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let access_token = config.server.access_token.clone();

        if let Some(message) = config.missing_secret() {
            error!(%message, "model credential missing; generation requests will fail");
            return Ok(Self::misconfigured(message, access_token));
        }

        let client = AIClient::new(&config.llm).context("Failed to build model client")?;
        let oracle = ChatOracle::from_config(Arc::new(client), config);
        let generator = RepairLoop::new(
            Arc::new(oracle),
            RepairPolicy::from_settings(&config.generation),
        );
        Ok(Self::new(generator, access_token))
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// `OPTIONS` never reaches a handler: the CORS layer answers every
/// pre-flight itself with an empty success response.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route(
            PROGRAM_BUILDER_PATH,
            post(generate_program).fallback(method_not_allowed),
        )
        .route("/healthz", get(healthz))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(config: &Config) -> Result<()> {
    let state = AppState::from_config(config)?;
    let app = build_router(state);
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid bind address {}:{}",
                config.server.bind, config.server.port
            )
        })?;

    info!(
        model = %config.models.generator,
        max_attempts = config.generation.max_attempts,
        "program-builder listening on http://{addr}{PROGRAM_BUILDER_PATH}"
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("program-builder shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// In-flight generation stops when the client disconnects: hyper drops this
/// future and with it the repair loop, so no further model call is made.
async fn generate_program(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let generator = state
        .inner
        .generator
        .as_ref()
        .map_err(|message| ApiError::Misconfigured(message.clone()))?;

    if let Some(token) = &state.inner.access_token {
        if !token.authorizes(&headers) {
            return Err(ApiError::Unauthorized);
        }
    }

    let raw: Value = serde_json::from_slice(&body).map_err(|err| ApiError::InvalidJson(err.to_string()))?;
    let request = validate_request(&raw).map_err(|errors| {
        info!(violations = errors.len(), fields = ?errors.paths(), "rejected invalid program request");
        ApiError::InvalidInput(errors)
    })?;

    info!(
        days = request.days_per_week,
        minutes = request.minutes_per_session,
        split = request.split_preference.label(),
        goal = request.goal.label(),
        "generating program"
    );

    let generated = generator.run(&request).await.map_err(|err| {
        warn!(error = %err, "program generation failed");
        ApiError::from(err)
    })?;

    let mut response = Json(generated.program).into_response();
    response
        .headers_mut()
        .insert(ATTEMPTS_HEADER, HeaderValue::from(generated.attempts));
    Ok(response)
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

//! HTTP endpoints for the pipeline.
//!
//! - `POST /process` - summary, tags and flashcards
//! - `POST /summarize` - summary only
//! - `POST /generate-tags` - tags only
//! - `GET /health` - liveness and configured model

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::Provider;
use crate::pipeline::{Pipeline, PipelineError};
use crate::schema::{CombinedResult, Summary, TagSet};

/// Message returned when the request body carries no usable `text`
pub const NO_TEXT_MESSAGE: &str = "No text provided";

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub provider: Provider,
}

impl AppState {
    pub fn new(pipeline: Pipeline, provider: Provider) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            provider,
        }
    }
}

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/process", post(process))
        .route("/summarize", post(summarize))
        .route("/generate-tags", post(generate_tags))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web server.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Error body in the `{"detail": ...}` shape clients already expect.
pub struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            PipelineError::InvalidInput => (StatusCode::BAD_REQUEST, NO_TEXT_MESSAGE.to_string()),
            PipelineError::ModelUnavailable(_) => (
                StatusCode::BAD_GATEWAY,
                "Language model unavailable".to_string(),
            ),
            PipelineError::ModelTimeout(_) => (
                StatusCode::GATEWAY_TIMEOUT,
                "Language model timed out".to_string(),
            ),
            PipelineError::MalformedOutput(_) => (
                StatusCode::BAD_GATEWAY,
                "Language model returned malformed output".to_string(),
            ),
            PipelineError::SchemaViolation { field, .. } => (
                StatusCode::BAD_GATEWAY,
                format!("Language model output failed validation at `{}`", field),
            ),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Pull a non-blank `text` string out of the request body.
///
/// The body is read as JSON whatever its content type.
fn request_text(body: &[u8]) -> Result<String, ApiError> {
    let Ok(body) = serde_json::from_slice::<Value>(body) else {
        return Err(PipelineError::InvalidInput.into());
    };
    match body.get("text").and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        _ => Err(PipelineError::InvalidInput.into()),
    }
}

async fn process(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CombinedResult>, ApiError> {
    let text = request_text(&body)?;
    info!(text_len = text.len(), "process request");
    Ok(Json(state.pipeline.process(&text).await?))
}

async fn summarize(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Summary>, ApiError> {
    let text = request_text(&body)?;
    info!(text_len = text.len(), "summarize request");
    Ok(Json(state.pipeline.summarise(&text).await?))
}

async fn generate_tags(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<TagSet>, ApiError> {
    let text = request_text(&body)?;
    info!(text_len = text.len(), "generate-tags request");
    Ok(Json(state.pipeline.generate_tags(&text).await?))
}

#[derive(Debug, Serialize)]
struct HealthResponse<'a> {
    status: &'static str,
    provider: &'static str,
    model: &'a str,
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        provider: state.provider.as_str(),
        model: state.pipeline.model(),
    })
    .into_response()
}

//! HTTP API
//!
//! Routes:
//! - `GET  /health` liveness probe
//! - `POST /search` similarity search over the indexed documents
//! - `POST /documents` embed and index one more document
//! - `GET  /usage/{user_id}` request counter for a user
//!
//! Valid search requests carrying an `X-User-Id` header are counted in the
//! usage table, including those that end in 404.


use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::SearchConfig;
use crate::database::Database;
use crate::database::models::UserUsage;
use crate::retrieval::{RetrievalError, RetrievalService, SearchHit, SearchQuery};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const DEFAULT_QUERY_TEXT: &str = "example query";

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub retrieval: Arc<RetrievalService>,
    pub database: Database,
    pub defaults: SearchDefaults,
}

/// Values used for fields a search request leaves out
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDefaults {
    pub text: String,
    pub top_k: usize,
    pub threshold: f32,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            text: DEFAULT_QUERY_TEXT.to_string(),
            top_k: crate::retrieval::DEFAULT_TOP_K,
            threshold: crate::retrieval::DEFAULT_THRESHOLD,
        }
    }
}

impl From<&SearchConfig> for SearchDefaults {
    fn from(config: &SearchConfig) -> Self {
        Self {
            text: DEFAULT_QUERY_TEXT.to_string(),
            top_k: config.default_top_k,
            threshold: config.default_threshold,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    pub text: Option<String>,
    pub top_k: Option<usize>,
    pub threshold: Option<f32>,
}

impl SearchRequest {
    #[inline]
    pub fn into_query(self, defaults: &SearchDefaults) -> SearchQuery {
        SearchQuery {
            text: self.text.unwrap_or_else(|| defaults.text.clone()),
            top_k: self.top_k.unwrap_or(defaults.top_k),
            threshold: self.threshold.unwrap_or(defaults.threshold),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub struct AddDocumentRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct AddDocumentResponse {
    pub ordinal: usize,
    pub document_count: usize,
}

/// Error body is always `{"detail": "..."}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    #[inline]
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<RetrievalError> for ApiError {
    fn from(err: RetrievalError) -> Self {
        let status = match &err {
            RetrievalError::NotFound => StatusCode::NOT_FOUND,
            RetrievalError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RetrievalError::Model(_) => StatusCode::SERVICE_UNAVAILABLE,
            RetrievalError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RetrievalError::DimensionMismatch(_)
            | RetrievalError::OutOfRange(_)
            | RetrievalError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", err);
        }

        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!("Internal error: {:#}", err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

#[inline]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/search", post(search))
        .route("/documents", post(add_document))
        .route("/usage/{user_id}", get(usage))
        .with_state(state)
}

/// Serve the API on `listener` until Ctrl-C.
#[inline]
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let address = listener
        .local_addr()
        .context("Failed to read listener address")?;
    info!("HTTP API listening on http://{}", address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("HTTP API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "active" }))
}

fn user_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) = payload?;
    let query = request.into_query(&state.defaults);
    query.validate()?;

    if let Some(user_id) = user_id(&headers) {
        match state.database.record_request(user_id).await {
            Ok(count) => debug!("Recorded request {} for user {}", count, user_id),
            Err(e) => warn!("Failed to record usage for user {}: {:#}", user_id, e),
        }
    }

    let results = state.retrieval.search(&query).await?;
    Ok(Json(SearchResponse { results }))
}

async fn add_document(
    State(state): State<AppState>,
    payload: Result<Json<AddDocumentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AddDocumentResponse>), ApiError> {
    let Json(request) = payload?;

    let ordinal = state.retrieval.add_document(request.text).await?;
    let document_count = state.retrieval.document_count().await;
    info!(
        "Document added at ordinal {}; index holds {}",
        ordinal, document_count
    );

    Ok((
        StatusCode::CREATED,
        Json(AddDocumentResponse {
            ordinal,
            document_count,
        }),
    ))
}

async fn usage(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserUsage>, ApiError> {
    state
        .database
        .get_usage(&user_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::NOT_FOUND,
                format!("No usage recorded for user {user_id}"),
            )
        })
}

//! # API Handlers
//!
//! Map query strings and JSON bodies onto [`QueryEngine`] calls and the
//! results back onto JSON. No filtering logic lives here.

use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use logmeta_core::{FilterRequest, LogMetadataRecord, QueryEngine, QueryError, StatsSummary};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

type ApiFailure = (StatusCode, Json<ApiError>);
type ApiResult<T> = Result<Json<T>, ApiFailure>;

fn failure(status: StatusCode, error: impl Into<String>) -> ApiFailure {
    (
        status,
        Json(ApiError {
            error: error.into(),
        }),
    )
}

fn status_for(err: &QueryError) -> StatusCode {
    match err {
        QueryError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
        QueryError::StorageUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        QueryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Run a blocking engine call off the async workers.
async fn run<T, F>(state: &AppState, op: F) -> Result<T, ApiFailure>
where
    F: FnOnce(&QueryEngine) -> Result<T, QueryError> + Send + 'static,
    T: Send + 'static,
{
    let engine = state.engine.clone();
    let outcome = tokio::task::spawn_blocking(move || op(&engine))
        .await
        .map_err(|e| {
            tracing::error!("Query task failed: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "query task failed")
        })?;

    outcome.map_err(|e| {
        let status = status_for(&e);
        if e.is_client_error() {
            tracing::warn!("Rejected query: {}", e);
        } else {
            tracing::error!("Query failed: {}", e);
        }
        failure(status, e.to_string())
    })
}

// =============================================================================
// Health
// =============================================================================

pub async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "log-metadata-api"}))
}

// =============================================================================
// Metadata API
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LogFilesParams {
    pub server: Option<String>,
}

pub async fn list_servers(State(state): State<Arc<AppState>>) -> ApiResult<Vec<String>> {
    let servers = run(&state, |engine| engine.servers()).await?;
    Ok(Json(servers))
}

pub async fn list_log_files(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LogFilesParams>,
) -> ApiResult<Vec<String>> {
    let files = run(&state, move |engine| engine.log_files(params.server.as_deref())).await?;
    Ok(Json(files))
}

pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<FilterRequest>,
) -> ApiResult<Vec<LogMetadataRecord>> {
    let records = run(&state, move |engine| engine.list(&filter)).await?;
    Ok(Json(records))
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<FilterRequest>,
) -> ApiResult<StatsSummary> {
    let stats = run(&state, move |engine| engine.stats(&filter)).await?;
    Ok(Json(stats))
}

// =============================================================================
// Simple JSON datasource
// =============================================================================

#[derive(Debug, Serialize)]
pub struct SearchTarget {
    pub text: &'static str,
    pub value: &'static str,
}

pub async fn search() -> Json<Vec<SearchTarget>> {
    Json(vec![
        SearchTarget {
            text: "Servers",
            value: "servers",
        },
        SearchTarget {
            text: "Log Files",
            value: "logfiles",
        },
    ])
}

#[derive(Debug, Deserialize)]
pub struct DatasourceQuery {
    #[serde(default)]
    pub targets: Vec<DatasourceTarget>,
}

#[derive(Debug, Deserialize)]
pub struct DatasourceTarget {
    pub target: Option<String>,
}

/// Each known target yields its value list plus a single datapoint of
/// `[count, now_ms]`. Unknown targets are skipped.
pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DatasourceQuery>,
) -> ApiResult<Vec<Value>> {
    let mut results = Vec::new();

    for target in body.targets {
        let name = target.target.unwrap_or_default();
        let values = match name.as_str() {
            "servers" => run(&state, |engine| engine.servers()).await?,
            "logfiles" => run(&state, |engine| engine.log_files(None)).await?,
            other => {
                tracing::debug!("Skipping unknown datasource target '{}'", other);
                continue;
            }
        };
        let now_ms = chrono::Utc::now().timestamp_millis();
        let mut entry = serde_json::Map::new();
        entry.insert("target".into(), json!(name));
        entry.insert("datapoints".into(), json!([[values.len(), now_ms]]));
        entry.insert(name, json!(values));
        results.push(Value::Object(entry));
    }

    Ok(Json(results))
}

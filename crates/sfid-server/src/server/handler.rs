//! HTTP endpoints for single-ID generation.
//!
//! - `GET /idGenerator/get` issues one ID.
//! - `GET /idGenerator/decode/{id}` splits an ID into its fields.
//! - `GET /health` reports liveness.
//!
//! Generation may sleep through a small clock rollback or spin out an
//! exhausted millisecond while holding the generator lock, so it runs on the
//! blocking thread pool rather than on an async worker.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use sfid::{SnowflakeId, SnowflakeParts, SnowflakeWorker};
use std::sync::Arc;

/// Shared state: the process's one generator.
#[derive(Clone)]
pub struct AppState {
    worker: Arc<SnowflakeWorker>,
}

impl AppState {
    pub fn new(worker: SnowflakeWorker) -> Self {
        Self {
            worker: Arc::new(worker),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IdResponse {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Errors surfaced to HTTP clients.
#[derive(Debug)]
pub enum ApiError {
    /// The generator refused; usually a clock rollback the caller may retry.
    Generation(sfid::Error),
    /// The blocking task running the generator did not complete.
    Task(String),
}

impl From<sfid::Error> for ApiError {
    fn from(err: sfid::Error) -> Self {
        Self::Generation(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::Generation(err) => {
                tracing::warn!("ID generation failed: {err}");
                (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            Self::Task(reason) => {
                tracing::error!("ID generation task failed: {reason}");
                (StatusCode::INTERNAL_SERVER_ERROR, reason)
            }
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/idGenerator/get", get(next_id))
        .route("/idGenerator/decode/{id}", get(decode))
        .route("/health", get(health))
        .with_state(state)
}

async fn next_id(State(state): State<AppState>) -> Result<Json<IdResponse>, ApiError> {
    let worker = Arc::clone(&state.worker);
    let id = tokio::task::spawn_blocking(move || worker.next_id())
        .await
        .map_err(|e| ApiError::Task(e.to_string()))??;

    Ok(Json(IdResponse { id: id.to_i64() }))
}

async fn decode(State(state): State<AppState>, Path(id): Path<u64>) -> Json<SnowflakeParts> {
    Json(state.worker.decode(SnowflakeId::from_raw(id)))
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    fn app() -> Router {
        let worker = SnowflakeWorker::new(5, 5, 3, 7).unwrap();
        router(AppState::new(worker))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap_or_default())
    }

    #[tokio::test]
    async fn issues_id_for_configured_worker() {
        let (status, body) = get_json(app(), "/idGenerator/get").await;
        assert_eq!(status, StatusCode::OK);

        let id = body["id"].as_i64().unwrap();
        assert!(id > 0);

        let worker = SnowflakeWorker::new(5, 5, 3, 7).unwrap();
        let parts = worker.decode(SnowflakeId::from_raw(id as u64));
        assert_eq!(parts.worker_id, 3);
        assert_eq!(parts.data_center_id, 7);
    }

    #[tokio::test]
    async fn consecutive_ids_increase() {
        let app = app();
        let (_, first) = get_json(app.clone(), "/idGenerator/get").await;
        let (_, second) = get_json(app, "/idGenerator/get").await;
        assert!(second["id"].as_i64().unwrap() > first["id"].as_i64().unwrap());
    }

    #[tokio::test]
    async fn decodes_issued_id() {
        let app = app();
        let (_, issued) = get_json(app.clone(), "/idGenerator/get").await;
        let id = issued["id"].as_i64().unwrap();

        let (status, parts) = get_json(app, &format!("/idGenerator/decode/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parts["workerId"], 3);
        assert_eq!(parts["dataCenterId"], 7);
        assert!(parts["timestamp"].as_u64().unwrap() > sfid::DEFAULT_EPOCH.as_millis() as u64);
    }

    #[tokio::test]
    async fn rejects_malformed_id() {
        let response = app()
            .oneshot(
                Request::get("/idGenerator/decode/not-a-number")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rollback_maps_to_service_unavailable() {
        let response = ApiError::from(sfid::Error::ClockRollback { backward_ms: 15 }).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body["error"],
            "clock moved backwards, refusing to generate id for 15 milliseconds"
        );
    }
}

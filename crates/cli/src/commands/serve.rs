//! Serve command - HTTP API over the submission service

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use gentle_post_domain::usecases::SubmissionError;
use gentle_post_domain::{
    AttachmentChange, AttachmentRef, PostEdit, PostOrder, PostRecord, SubmissionInput,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::service::{AppService, build_service};
use crate::args::ServeArgs;
use crate::config::AppConfig;

/// Header carrying the authenticated user ID, set by the upstream identity layer
const USER_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub(crate) struct AppState {
    service: AppService,
}

pub async fn execute(args: ServeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let service = build_service(&config).await?;
    let bind = args.bind.unwrap_or(config.server.bind);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    tracing::info!(
        bind = %bind,
        sentiment = %config.sentiment.provider,
        rewriter = %config.rewriter.provider,
        "gentle-post API listening"
    );

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Server stopped");
    Ok(())
}

pub(crate) fn router(service: AppService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/posts", post(create_post).get(list_feed))
        .route("/api/posts/{id}", put(edit_post).delete(delete_post))
        .route("/api/users/{owner}/posts", get(list_user_posts))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SubmitRequest {
    text: Option<String>,
    attachment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EditRequest {
    /// Replacement text; an empty string clears it
    text: Option<String>,
    attachment: Option<String>,
    remove_attachment: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    order: Option<String>,
}

impl ListQuery {
    fn order(&self) -> Result<PostOrder, ApiError> {
        match self.order.as_deref() {
            None => Ok(PostOrder::default()),
            Some(raw) => raw.parse().map_err(ApiError::BadRequest),
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Background submission: processes and stores the post, then reports the shown text
async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<Value>, ApiError> {
    let owner = request_owner(&headers)?;

    let record = state
        .service
        .submit(SubmissionInput {
            owner,
            text: req.text,
            attachment: req.attachment.map(AttachmentRef::new),
        })
        .await?;

    Ok(Json(json!({
        "status": "success",
        "id": record.id,
        "transformed": record.content.transformed,
    })))
}

async fn list_feed(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PostRecord>>, ApiError> {
    let posts = state.service.feed(query.order()?).await?;
    Ok(Json(posts))
}

async fn list_user_posts(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PostRecord>>, ApiError> {
    if request_owner(&headers)? != owner {
        return Err(ApiError::Forbidden);
    }

    let posts = state.service.list_mine(&owner, query.order()?).await?;
    Ok(Json(posts))
}

async fn edit_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<EditRequest>,
) -> Result<Json<PostRecord>, ApiError> {
    let owner = request_owner(&headers)?;

    let attachment = match (req.attachment, req.remove_attachment) {
        (Some(_), true) => {
            return Err(ApiError::BadRequest(
                "attachment and remove_attachment are mutually exclusive".to_string(),
            ));
        }
        (Some(name), false) => AttachmentChange::Replace(AttachmentRef::new(name)),
        (None, true) => AttachmentChange::Remove,
        (None, false) => AttachmentChange::Keep,
    };

    let record = state
        .service
        .edit(
            id,
            &owner,
            PostEdit {
                text: req.text,
                attachment,
            },
        )
        .await?;

    Ok(Json(record))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let owner = request_owner(&headers)?;
    state.service.delete(id, &owner).await?;

    Ok(Json(json!({"status": "success", "id": id})))
}

fn request_owner(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ApiError::MissingUser)
}

/// Error responses of the HTTP API
#[derive(Debug)]
pub(crate) enum ApiError {
    MissingUser,
    Forbidden,
    BadRequest(String),
    Submission(SubmissionError),
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        ApiError::Submission(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingUser => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Submission(err) => match err {
                SubmissionError::EmptySubmission => StatusCode::BAD_REQUEST,
                SubmissionError::NotOwner(_) => StatusCode::FORBIDDEN,
                SubmissionError::NotFound(_) => StatusCode::NOT_FOUND,
                SubmissionError::Pipeline(_) | SubmissionError::TimedOut(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                SubmissionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::MissingUser => format!("missing {} header", USER_HEADER),
            ApiError::Forbidden => "forbidden".to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Submission(err) if err.is_retryable() => {
                "the post could not be processed right now, please try again".to_string()
            }
            ApiError::Submission(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retryable = matches!(&self, ApiError::Submission(err) if err.is_retryable());

        match &self {
            ApiError::Submission(err) if status.is_server_error() => {
                tracing::warn!(error = %err, retryable, "Request failed");
            }
            _ => tracing::debug!(status = %status, "Request rejected"),
        }

        let body = Json(json!({
            "status": "error",
            "error": self.message(),
            "retryable": retryable,
        }));
        (status, body).into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}

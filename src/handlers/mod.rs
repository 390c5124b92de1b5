use std::sync::Arc;

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::{core::orchestrator::Interviewer, error::InterviewError};

pub(crate) mod interview;
pub(crate) mod search;

#[derive(Clone)]
pub struct AppState {
    pub(crate) interviewer: Arc<Interviewer>,
}

impl AppState {
    pub fn new(interviewer: Interviewer) -> Self {
        Self {
            interviewer: Arc::new(interviewer),
        }
    }
}

pub(crate) fn error_response(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

/// Unwraps a JSON body. Rejections become a JSON 400 instead of axum's plain text reply.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, InterviewError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            log::warn!("Rejected request body: {}", rejection.body_text());
            Err(InterviewError::InvalidBody(rejection.body_text()))
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/mcp/gemini/interview/start",
            post(interview::start_interview),
        )
        .route(
            "/mcp/gemini/interview/process",
            post(interview::process_interview),
        )
        .route("/mcp/amazon/search", post(search::search_products))
        .route("/mcp/amazon/products/{id}", get(search::product_details))
        .with_state(state)
}

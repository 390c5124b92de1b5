use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::handlers::{AppState, error_response, json_body};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
}

pub(crate) async fn search_products(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };
    let Some(query) = request.query.filter(|q| !q.trim().is_empty()) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            json!({ "error": "query required" }),
        );
    };

    match state.interviewer.search(&query).await {
        Ok(page) => Json(json!({ "products": page.products })).into_response(),
        Err(e) => {
            log::error!("Search failed for \"{}\": {}", query, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Amazon API error", "details": e.to_string() }),
            )
        }
    }
}

pub(crate) async fn product_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.interviewer.product_details(&id).await {
        Some(product) => Json(product).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            json!({ "error": "product not found", "id": id }),
        ),
    }
}

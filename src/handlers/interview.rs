use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};

use crate::{
    error::InterviewError,
    handlers::{AppState, json_body},
    models::Answers,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartRequest {
    #[serde(default)]
    pub initial_query: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProcessRequest {
    #[serde(default, deserialize_with = "given_answers")]
    pub answers: Option<Answers>,
}

/// `null` and blank strings count as no answers at all.
fn given_answers<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Answers>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(value) => Answers::try_from(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

pub(crate) async fn start_interview(
    State(state): State<AppState>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> Result<Json<Value>, InterviewError> {
    let request = json_body(payload)?;
    let questions = state
        .interviewer
        .start(request.initial_query.as_deref())
        .await?;

    Ok(Json(json!({ "questions": questions })))
}

pub(crate) async fn process_interview(
    State(state): State<AppState>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<Value>, InterviewError> {
    let request = json_body(payload)?;
    let results = state.interviewer.process(request.answers.as_ref()).await?;

    Ok(Json(json!({ "results": results })))
}

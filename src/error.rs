use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required service credential was not configured
    #[error("{0} is not set")]
    MissingCredential(&'static str),

    /// The outbound HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search query must not be empty")]
    EmptyQuery,

    /// The search service is throttling us
    #[error("Amazon API error: 429 Too Many Requests")]
    RateLimited,

    /// Any other non-success HTTP status
    #[error("Amazon API error: {status} {reason}")]
    Status { status: u16, reason: String },

    /// The payload was not `status == "OK"` or had no product list
    #[error("Invalid response from Amazon API")]
    InvalidResponse,

    /// Connection, timeout or body errors. The request URL is stripped so the
    /// keyword in the query string never reaches the rate limit check.
    #[error("Amazon API request failed: {0}")]
    Transport(reqwest::Error),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Transport(err.without_url())
    }
}

#[derive(Error, Debug)]
pub enum DialogError {
    #[error("language model returned an empty response")]
    EmptyGeneration,

    #[error("language model returned malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("Gemini API error: {status} {message}")]
    Upstream { status: u16, message: String },

    #[error("Gemini API request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Overall failures of an interview request. Per-keyword failures never end up
/// here, they are recorded on the matching `SearchOutcome`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InterviewError {
    #[error("{0} required")]
    MissingInput(&'static str),

    /// The body was not JSON or did not match the request shape
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("Failed to generate keywords from answers.")]
    NoKeywords,
}

impl InterviewError {
    pub fn status(&self) -> StatusCode {
        match self {
            InterviewError::MissingInput(_) | InterviewError::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            InterviewError::NoKeywords => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for InterviewError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_message() {
        let message = SearchError::RateLimited.to_string();
        assert!(message.contains("429"));
        assert!(message.contains("Too Many Requests"));
    }

    #[test]
    fn test_interview_error_status() {
        assert_eq!(
            InterviewError::MissingInput("answers").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            InterviewError::NoKeywords.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            InterviewError::MissingInput("answers").to_string(),
            "answers required"
        );
        assert_eq!(
            InterviewError::InvalidBody("expected value".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    const RATE_LIKE_URL: &str = "http://localhost:8080/search?query=rtx+4290";

    #[test]
    fn test_transport_message_has_no_url() {
        let url = reqwest::Url::parse(RATE_LIKE_URL).unwrap();
        let err = reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err()
            .with_url(url);
        assert!(err.to_string().contains("4290"));

        let message = SearchError::from(err).to_string();
        assert!(!message.contains("4290"), "{message}");
        assert!(!crate::core::backoff::is_rate_limited(&message));
    }
}

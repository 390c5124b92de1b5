use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
};
use serde_json::Value;
use tokio::net::TcpListener;

/// A request as seen by [`Upstream`].
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub path: String,
    pub query: String,
    pub headers: HeaderMap,
}

#[derive(Clone)]
struct Script {
    replies: Arc<Vec<(StatusCode, Value)>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

async fn reply(
    State(script): State<Script>,
    uri: Uri,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let mut requests = script.requests.lock().unwrap();
    requests.push(Recorded {
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
        headers,
    });

    let index = (requests.len() - 1).min(script.replies.len() - 1);
    let (status, body) = script.replies[index].clone();
    (status, Json(body))
}

/// HTTP server on a loopback port answering every request with the next
/// scripted reply. The last reply repeats.
pub(crate) struct Upstream {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl Upstream {
    pub(crate) async fn start(replies: Vec<(StatusCode, Value)>) -> Self {
        assert!(!replies.is_empty());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().fallback(reply).with_state(Script {
            replies: Arc::new(replies),
            requests: Arc::clone(&requests),
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Self { base_url, requests }
    }

    pub(crate) fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

/// Base URL of a loopback port nothing listens on.
pub(crate) async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

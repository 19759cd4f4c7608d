//! HTTP invocation server.
//!
//! Implements the hosted agent runtime contract:
//! - `POST /invocations` with a JSON payload, answered with the entrypoint's
//!   string response encoded as JSON
//! - `GET /ping` health check

use super::{Entrypoint, InvocationContext};
use crate::error::AgentHostError;
use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Header carrying the runtime session id.
pub const SESSION_HEADER: &str = "x-amzn-bedrock-agentcore-runtime-session-id";

/// Header carrying the caller's request id.
pub const REQUEST_ID_HEADER: &str = "x-amzn-request-id";

/// Shared server state.
pub struct RuntimeState {
    entrypoint: Arc<dyn Entrypoint>,
    last_update: AtomicI64,
}

impl RuntimeState {
    pub fn new(entrypoint: Arc<dyn Entrypoint>) -> Self {
        Self {
            entrypoint,
            last_update: AtomicI64::new(chrono::Utc::now().timestamp()),
        }
    }

    fn touch(&self) {
        self.last_update
            .store(chrono::Utc::now().timestamp(), Ordering::Relaxed);
    }
}

/// Build the runtime router for an entrypoint.
pub fn router(entrypoint: Arc<dyn Entrypoint>) -> Router {
    let state = Arc::new(RuntimeState::new(entrypoint));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ping", get(ping))
        .route("/invocations", post(invocations))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the runtime until the process is stopped.
pub async fn serve(listener: tokio::net::TcpListener, entrypoint: Arc<dyn Entrypoint>) -> std::io::Result<()> {
    info!(
        "Serving '{}' entrypoint on {}",
        entrypoint.name(),
        listener.local_addr()?
    );
    axum::serve(listener, router(entrypoint)).await
}

#[derive(Serialize)]
struct PingResponse {
    status: &'static str,
    time_of_last_update: i64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

async fn ping(State(state): State<Arc<RuntimeState>>) -> impl IntoResponse {
    Json(PingResponse {
        status: "Healthy",
        time_of_last_update: state.last_update.load(Ordering::Relaxed),
    })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

async fn invocations(
    State(state): State<Arc<RuntimeState>>,
    headers: HeaderMap,
    Json(payload): Json<serde_json::Value>,
) -> Response {
    let session_id = header_value(&headers, SESSION_HEADER)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let request_id = header_value(&headers, REQUEST_ID_HEADER)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    info!(
        "Invocation {} on session {} ({})",
        request_id,
        session_id,
        state.entrypoint.name()
    );

    let ctx = InvocationContext {
        session_id: session_id.clone(),
        request_id,
    };
    let result = state.entrypoint.invoke(payload, ctx).await;
    state.touch();

    let mut response = match result {
        Ok(text) => Json(text).into_response(),
        Err(e) => {
            let status = status_for(&e);
            error!("Invocation failed ({}): {}", status, e);
            (
                status,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&session_id) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

fn status_for(error: &AgentHostError) -> StatusCode {
    if error.is_invalid_input() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, ToolContext, ToolKind};
    use crate::model::testing::ScriptedModel;
    use crate::runtime::ChatEntrypoint;

    async fn spawn(model: Arc<ScriptedModel>) -> String {
        let agent = Agent::new(
            model,
            ToolContext::new(vec![ToolKind::Calculator, ToolKind::Weather]),
        );
        let entrypoint: Arc<dyn Entrypoint> = Arc::new(ChatEntrypoint::new(agent));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = serve(listener, entrypoint).await;
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_ping() {
        let base = spawn(Arc::new(ScriptedModel::new())).await;
        let body: serde_json::Value = reqwest::get(format!("{}/ping", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["status"], "Healthy");
        assert!(body["time_of_last_update"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_invocation_returns_json_string() {
        let model = Arc::new(
            ScriptedModel::new()
                .tool_use("t1", "calculator", serde_json::json!({"expression": "2 + 2"}))
                .reply("2 + 2 = 4"),
        );
        let base = spawn(model).await;

        let response = reqwest::Client::new()
            .post(format!("{}/invocations", base))
            .header(SESSION_HEADER, "session-123")
            .json(&serde_json::json!({"prompt": "What is 2 + 2?"}))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.headers()[SESSION_HEADER], "session-123");
        let body: String = response.json().await.unwrap();
        assert_eq!(body, "2 + 2 = 4");
    }

    #[tokio::test]
    async fn test_invocation_generates_session_id() {
        let base = spawn(Arc::new(ScriptedModel::new().reply("hi"))).await;

        let response = reqwest::Client::new()
            .post(format!("{}/invocations", base))
            .json(&serde_json::json!({"prompt": "hello"}))
            .send()
            .await
            .unwrap();

        let session = response.headers()[SESSION_HEADER].to_str().unwrap();
        assert!(uuid::Uuid::parse_str(session).is_ok());
    }

    #[tokio::test]
    async fn test_missing_prompt_is_bad_request() {
        let base = spawn(Arc::new(ScriptedModel::new())).await;

        let response = reqwest::Client::new()
            .post(format!("{}/invocations", base))
            .json(&serde_json::json!({"question": "hello"}))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("prompt"));
    }

    #[tokio::test]
    async fn test_model_failure_is_server_error() {
        let base = spawn(Arc::new(ScriptedModel::new().fail("throttled"))).await;

        let response = reqwest::Client::new()
            .post(format!("{}/invocations", base))
            .json(&serde_json::json!({"prompt": "hello"}))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&AgentHostError::InvalidInput("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&AgentHostError::Model("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

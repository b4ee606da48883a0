use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use mathtutor_core::{ChatController, Message, Rejected, ResponseRenderer, Role, SubmitOutcome};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

/// Application state shared with all routes
#[derive(Clone)]
pub struct AppState {
    controller: Arc<ChatController>,
    renderer: Arc<ResponseRenderer>,
}

impl AppState {
    pub fn new(controller: ChatController, renderer: ResponseRenderer) -> Self {
        Self {
            controller: Arc::new(controller),
            renderer: Arc::new(renderer),
        }
    }
}

/// A message as the browser sees it
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessageView {
    pub id: String,
    pub role: Role,
    /// Source text; shown verbatim for student messages
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub is_error: bool,
    /// Rendered reply, model messages only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl MessageView {
    fn new(message: Message, renderer: &ResponseRenderer) -> Self {
        let html = match message.role {
            Role::Model => Some(renderer.render(&message.text)),
            Role::User => None,
        };

        Self {
            id: message.id,
            role: message.role,
            text: message.text,
            image_url: message.image_url,
            timestamp: message.timestamp,
            is_error: message.is_error,
            html,
        }
    }
}

/// Request model for submissions
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct SubmitRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Request model for clearing the history
#[derive(Deserialize, Serialize, Debug)]
pub struct ClearRequest {
    #[serde(default)]
    pub confirm: bool,
}

/// Response model listing messages
#[derive(Serialize, Deserialize, Debug)]
pub struct MessagesResponse {
    pub messages: Vec<MessageView>,
    pub busy: bool,
}

/// Response model for clear requests
#[derive(Serialize, Deserialize, Debug)]
pub struct ClearResponse {
    pub cleared: bool,
    pub messages: Vec<MessageView>,
}

/// Error body
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error type for HTTP server
#[derive(Debug)]
pub enum ApiError {
    Rejected(Rejected),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Rejected(reason) => {
                let (status, message) = match reason {
                    Rejected::Empty => (StatusCode::BAD_REQUEST, "Message has no text and no image"),
                    Rejected::InvalidImage => (
                        StatusCode::BAD_REQUEST,
                        "Image must be a data:<mime>;base64,<payload> URL",
                    ),
                    Rejected::Busy => (StatusCode::CONFLICT, "Another question is still being answered"),
                };
                debug!(?reason, "Submission rejected");
                let body = Json(ErrorResponse {
                    error: message.to_string(),
                });
                (status, body).into_response()
            }
        }
    }
}

/// Build the router. Split from [`run_server`] so it can be driven in tests.
pub fn router(state: AppState) -> Router {
    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/messages", get(list_messages).post(submit_message))
        .route("/api/clear", post(clear_history))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn run_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;

    axum::serve(listener, router(state))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start HTTP server: {}", e))
}

fn render_all(state: &AppState, messages: Vec<Message>) -> Vec<MessageView> {
    messages
        .into_iter()
        .map(|message| MessageView::new(message, &state.renderer))
        .collect()
}

/// Health check handler
async fn health() -> impl IntoResponse {
    "MathTutor is running"
}

/// Handler listing the whole conversation
async fn list_messages(State(state): State<AppState>) -> Json<MessagesResponse> {
    let messages = render_all(&state, state.controller.messages());
    Json(MessagesResponse {
        messages,
        busy: state.controller.is_busy(),
    })
}

/// Handler for new questions. Returns the messages the submission appended.
async fn submit_message(
    State(state): State<AppState>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let outcome = state
        .controller
        .submit(&payload.text, payload.image_url)
        .await;

    match outcome {
        SubmitOutcome::Rejected(reason) => Err(ApiError::Rejected(reason)),
        outcome => {
            if let SubmitOutcome::Failed { .. } = outcome {
                warn!("Answered with an error message");
            }
            Ok(Json(MessagesResponse {
                messages: render_all(&state, outcome.appended()),
                busy: state.controller.is_busy(),
            }))
        }
    }
}

/// Handler for clearing the history
async fn clear_history(
    State(state): State<AppState>,
    Json(payload): Json<ClearRequest>,
) -> Json<ClearResponse> {
    let cleared = state.controller.clear(&payload.confirm);
    Json(ClearResponse {
        cleared,
        messages: render_all(&state, state.controller.messages()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use mathtutor_core::prompt::{ERROR_REPLY, RESET_GREETING};
    use mathtutor_core::{Content, GatewayError, GatewayResult, ModelGateway, PendingMessage};
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    /// Always answers with the same text, or always fails
    struct FixedGateway(Option<&'static str>);

    #[async_trait]
    impl ModelGateway for FixedGateway {
        async fn generate(
            &self,
            _history: Vec<Content>,
            _pending: &PendingMessage,
        ) -> GatewayResult<String> {
            match self.0 {
                Some(text) => Ok(text.to_string()),
                None => Err(GatewayError::Connection {
                    detail: "offline".to_string(),
                }),
            }
        }
    }

    fn app(reply: Option<&'static str>) -> Router {
        let controller = ChatController::new(Arc::new(FixedGateway(reply)));
        router(AppState::new(controller, ResponseRenderer::default()))
    }

    async fn send<T: DeserializeOwned>(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, T) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_initial_conversation_has_rendered_welcome() {
        let app = app(Some("ok"));

        let (status, body): (_, MessagesResponse) = send(&app, "GET", "/api/messages", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.messages.len(), 1);
        assert!(!body.busy);
        let html = body.messages[0].html.as_deref().unwrap();
        assert!(html.starts_with("<h3>"));
    }

    #[tokio::test]
    async fn test_submit_returns_question_and_rendered_reply() {
        let app = app(Some("**Kết luận:** hai nghiệm"));

        let (status, body): (_, MessagesResponse) = send(
            &app,
            "POST",
            "/api/messages",
            Some(serde_json::json!({ "text": "Giải phương trình x^2-1=0" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[0].role, Role::User);
        assert_eq!(body.messages[0].html, None);
        assert_eq!(
            body.messages[1].html.as_deref(),
            Some("<p><strong>Kết luận:</strong> hai nghiệm</p>\n")
        );

        let (_, all): (_, MessagesResponse) = send(&app, "GET", "/api/messages", None).await;
        assert_eq!(all.messages.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_call_returns_error_message() {
        let app = app(None);

        let (status, body): (_, MessagesResponse) = send(
            &app,
            "POST",
            "/api/messages",
            Some(serde_json::json!({ "text": "Tính đạo hàm" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let reply = &body.messages[1];
        assert!(reply.is_error);
        assert_eq!(reply.text, ERROR_REPLY);
    }

    #[tokio::test]
    async fn test_empty_submission_is_bad_request() {
        let app = app(Some("ok"));

        let (status, body): (_, ErrorResponse) = send(
            &app,
            "POST",
            "/api/messages",
            Some(serde_json::json!({ "text": "" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.error.is_empty());

        let (_, all): (_, MessagesResponse) = send(&app, "GET", "/api/messages", None).await;
        assert_eq!(all.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_requires_confirmation() {
        let app = app(Some("ok"));
        let _: (_, MessagesResponse) = send(
            &app,
            "POST",
            "/api/messages",
            Some(serde_json::json!({ "text": "câu hỏi" })),
        )
        .await;

        let (_, declined): (_, ClearResponse) = send(
            &app,
            "POST",
            "/api/clear",
            Some(serde_json::json!({ "confirm": false })),
        )
        .await;
        assert!(!declined.cleared);
        assert_eq!(declined.messages.len(), 3);

        let (_, accepted): (_, ClearResponse) = send(
            &app,
            "POST",
            "/api/clear",
            Some(serde_json::json!({ "confirm": true })),
        )
        .await;
        assert!(accepted.cleared);
        assert_eq!(accepted.messages.len(), 1);
        assert_eq!(accepted.messages[0].text, RESET_GREETING);
    }
}

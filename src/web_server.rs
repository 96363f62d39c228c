use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        DefaultBodyLimit, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    serve, Json, Router,
};
use futures::{sink::SinkExt, stream::StreamExt};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use serde::{Deserialize, Serialize};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use crate::error::VerifyError;
use crate::interpreter::ResponseInterpreter;
use crate::render::ResultView;
use crate::request::VerificationRequest;
use crate::verdict::{AnalysisStep, VerificationResult};

pub const WELCOME_MESSAGE: &str =
    "Send me a forwarded message or a screenshot, and I'll verify if it's true using Google Search.";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const RENDER_FAILED_MESSAGE: &str = "The verdict could not be displayed. Please try again.";

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");
const VERDICT_TEMPLATE: &str = include_str!("../templates/verdict.html");

/// Templates compiled into the binary, or loaded from a directory and
/// reloaded on change while developing the UI.
pub enum Templates {
    Embedded(Environment<'static>),
    Reloading(AutoReloader),
}

impl Templates {
    pub fn embedded() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("index.html", INDEX_TEMPLATE)
            .context("Failed to compile index template")?;
        env.add_template("verdict.html", VERDICT_TEMPLATE)
            .context("Failed to compile verdict template")?;
        Ok(Self::Embedded(env))
    }

    pub fn from_dir(dir: &Path) -> Self {
        let dir = dir.to_path_buf();
        Self::Reloading(AutoReloader::new(move |notifier| {
            let mut env = Environment::new();
            env.set_loader(path_loader(dir.clone()));
            notifier.watch_path(&dir, true);
            Ok(env)
        }))
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, minijinja::Error> {
        match self {
            Templates::Embedded(env) => env.get_template(name)?.render(ctx),
            Templates::Reloading(reloader) => {
                let env = reloader.acquire_env()?;
                env.get_template(name)?.render(ctx)
            }
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub interpreter: Arc<ResponseInterpreter>,
    pub templates: Arc<Templates>,
    /// Caps both HTTP request bodies and WebSocket messages.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(interpreter: ResponseInterpreter, templates: Templates) -> Self {
        Self {
            interpreter: Arc::new(interpreter),
            templates: Arc::new(templates),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// HTML card for the chat history.
    pub fn render_result(&self, result: &VerificationResult) -> Result<String, minijinja::Error> {
        let view = ResultView::from(result);
        self.templates
            .render("verdict.html", minijinja::context! { view => view })
            .map_err(|e| {
                error!("Failed to render verdict template: {}", e);
                e
            })
    }

    async fn verify(&self, text: String, image: Option<String>) -> Result<VerificationResult, VerifyError> {
        let request = VerificationRequest::from_parts(text, image.as_deref())?;
        self.interpreter.verify(&request).await
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: PathBuf,
    pub templates_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

/// Body of `POST /api/verify` and of WebSocket `verify` messages.
#[derive(Debug, Deserialize)]
pub struct VerifyPayload {
    #[serde(default)]
    pub text: String,
    /// `data:<mediatype>;base64,<data>` as produced by `FileReader`.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyReply {
    pub result: VerificationResult,
    pub html: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Verify(VerifyPayload),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    Info {
        message: String,
    },
    Step {
        step: AnalysisStep,
        message: String,
    },
    Result {
        result: VerificationResult,
        html: String,
    },
    Error {
        message: String,
    },
}

pub enum ApiError {
    Verify(VerifyError),
    Render(minijinja::Error),
}

impl From<VerifyError> for ApiError {
    fn from(err: VerifyError) -> Self {
        Self::Verify(err)
    }
}

impl From<minijinja::Error> for ApiError {
    fn from(err: minijinja::Error) -> Self {
        Self::Render(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Verify(e) if e.is_user_input() => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Verify(e @ VerifyError::Unavailable { .. }) => {
                (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
            ApiError::Verify(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::Render(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                RENDER_FAILED_MESSAGE.to_string(),
            ),
        };
        let body = Json(serde_json::json!({ "error": message }));
        (status, body).into_response()
    }
}

async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let context = minijinja::context! {
        title => "VeriFact Bot",
        welcome => WELCOME_MESSAGE,
        model => state.interpreter.model(),
    };
    state
        .templates
        .render("index.html", context)
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("Internal Server Error: {}", e)),
            )
        })
}

async fn verify_handler(
    State(state): State<AppState>,
    Json(payload): Json<VerifyPayload>,
) -> Result<Json<VerifyReply>, ApiError> {
    let result = state.verify(payload.text, payload.image).await?;
    let html = state.render_result(&result)?;
    Ok(Json(VerifyReply { result, html }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("WebSocket connection upgrade requested");
    ws.max_message_size(state.max_upload_bytes)
        .max_frame_size(state.max_upload_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Runs one submission, reporting progress and the outcome on `tx`.
pub async fn process_submission(state: &AppState, payload: VerifyPayload, tx: &mpsc::Sender<ServerEvent>) {
    let request = match VerificationRequest::from_parts(payload.text, payload.image.as_deref()) {
        Ok(request) => request,
        Err(e) => {
            let _ = tx.send(ServerEvent::Error { message: e.to_string() }).await;
            return;
        }
    };

    for step in AnalysisStep::IN_FLIGHT {
        let _ = tx
            .send(ServerEvent::Step {
                step,
                message: step.message().to_string(),
            })
            .await;
    }

    let event = match state.interpreter.verify(&request).await {
        Ok(result) => match state.render_result(&result) {
            Ok(html) => ServerEvent::Result { result, html },
            Err(_) => ServerEvent::Error {
                message: RENDER_FAILED_MESSAGE.to_string(),
            },
        },
        Err(e) => ServerEvent::Error { message: e.to_string() },
    };
    let _ = tx.send(event).await;
}

// Submissions on a socket run one at a time; the next message is read only
// after the previous verification finished.
async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("New WebSocket connection established");
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(16);

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json_msg = match serde_json::to_string(&event) {
                Ok(json_msg) => json_msg,
                Err(e) => {
                    error!("Failed to serialize server event: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(json_msg)).await.is_err() {
                warn!("WebSocket client disconnected or send error. Closing connection.");
                break;
            }
        }
    });

    let _ = tx
        .send(ServerEvent::Info {
            message: "Connected to VeriFact".to_string(),
        })
        .await;

    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Verify(payload)) => {
                    debug!(text_len = payload.text.len(), has_image = payload.image.is_some(), "Received verify request");
                    process_submission(&state, payload, &tx).await;
                }
                Err(e) => {
                    warn!("Ignoring malformed client message: {}", e);
                    let _ = tx
                        .send(ServerEvent::Error {
                            message: "Unrecognized message.".to_string(),
                        })
                        .await;
                }
            },
            Message::Binary(_) => {
                warn!("Received unexpected binary message from client");
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => {
                info!("Client requested WebSocket close");
                break;
            }
        }
    }

    drop(tx);
    let _ = writer.await;
    info!("WebSocket connection closed");
}

pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    let max_upload_bytes = state.max_upload_bytes;
    Router::new()
        .route("/", get(index_handler))
        .route("/ws", get(ws_handler))
        .route("/api/verify", post(verify_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

pub async fn start_web_server(config: ServerConfig, interpreter: ResponseInterpreter) -> Result<()> {
    let templates = match &config.templates_dir {
        Some(dir) => {
            info!("Loading templates from {}", dir.display());
            Templates::from_dir(dir)
        }
        None => Templates::embedded().context("Failed to initialize template engine")?,
    };

    let state = AppState::new(interpreter, templates).with_max_upload_bytes(config.max_upload_bytes);
    let app = build_router(state, &config.static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::Verdict;
    use chrono::Utc;

    #[test]
    fn test_client_message_parsing() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"verify","text":"hello","image":null}"#).unwrap();
        let ClientMessage::Verify(payload) = msg;
        assert_eq!(payload.text, "hello");
        assert!(payload.image.is_none());

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"verify"}"#).unwrap();
        let ClientMessage::Verify(payload) = msg;
        assert_eq!(payload.text, "");

        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"delete"}"#).is_err());
    }

    #[test]
    fn test_server_event_shape() {
        let step = serde_json::to_value(ServerEvent::Step {
            step: AnalysisStep::Searching,
            message: AnalysisStep::Searching.message().into(),
        })
        .unwrap();
        assert_eq!(
            step,
            serde_json::json!({
                "type": "step",
                "step": "searching",
                "message": "Cross-referencing web sources..."
            })
        );
    }

    #[test]
    fn test_api_error_status() {
        let status = |e: ApiError| e.into_response().status();
        assert_eq!(status(VerifyError::EmptySubmission.into()), StatusCode::BAD_REQUEST);
        assert_eq!(status(VerifyError::invalid_image("no comma").into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(VerifyError::unavailable("timeout").into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status(VerifyError::Config { message: "no key".into() }.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_embedded_templates_escape_model_output() {
        let templates = Templates::embedded().unwrap();
        let result = VerificationResult {
            score: 40,
            verdict: Verdict::Misleading,
            summary: "<script>alert(1)</script>".into(),
            details: "Old photo, new caption.".into(),
            sources: vec![],
            timestamp: Utc::now(),
        };
        let view = ResultView::from(&result);
        let html = templates
            .render("verdict.html", minijinja::context! { view => view })
            .unwrap();
        assert!(html.contains("tone-orange"));
        assert!(html.contains("40%"));
        assert!(!html.contains("<script>"));
        assert!(!html.contains("Credible Evidence"));
    }
}

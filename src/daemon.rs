use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Json, Path, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Result, SelfCareError};
use crate::interfaces::providers::LlmProvider;
use crate::providers::openai::OpenAiProvider;
use crate::reminders::{OverdueSweepJob, ReminderStore};
use crate::scheduler::Scheduler;
use crate::services::chat::ChatService;
use crate::services::suggestions::SuggestionService;

pub const INDEX_HTML: &str = include_str!("../static/index.html");

const SUGGESTION_FAILED: &str = "Failed to generate suggestion. Please try again.";
const CHAT_FAILED: &str = "Failed to generate a reply. Please try again.";
const LIST_FAILED: &str = "Failed to load reminders";
const CREATE_FAILED: &str = "Failed to create reminder";
const DELETE_FAILED: &str = "Failed to delete reminder";
const INVALID_REQUEST: &str = "Invalid request format";
const INVALID_REMINDER_ID: &str = "Invalid reminder id";

#[derive(Clone)]
pub struct AppState {
    pub reminder_store: Arc<ReminderStore>,
    pub suggestions: Arc<SuggestionService>,
    pub chat: Arc<ChatService>,
    pub index_html: Arc<str>,
}

impl AppState {
    pub fn new(reminder_store: Arc<ReminderStore>, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            reminder_store,
            suggestions: Arc::new(SuggestionService::new(provider.clone())),
            chat: Arc::new(ChatService::new(provider)),
            index_html: Arc::from(INDEX_HTML),
        }
    }

    pub fn with_index_html(mut self, html: impl Into<Arc<str>>) -> Self {
        self.index_html = html.into();
        self
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct SuggestionResponse {
    suggestion: String,
}

#[derive(Deserialize)]
struct CreateReminderRequest {
    activity: Option<String>,
    scheduled_time: Option<String>,
}

#[derive(Serialize)]
struct CreateReminderResponse {
    id: i32,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: Option<String>,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/suggestions", get(get_suggestion))
        .route(
            "/api/reminders",
            get(list_reminders).post(create_reminder),
        )
        .route("/api/reminders/{id}", delete(delete_reminder))
        .route("/api/chat", post(chat))
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(state.index_html.to_string())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn get_suggestion(State(state): State<AppState>) -> Response {
    match state.suggestions.suggest().await {
        Ok(suggestion) => (StatusCode::OK, Json(SuggestionResponse { suggestion })).into_response(),
        Err(err) => failure("get_suggestion", &err, SUGGESTION_FAILED),
    }
}

async fn list_reminders(State(state): State<AppState>) -> Response {
    match state.reminder_store.list_reminders().await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(err) => failure("list_reminders", &err, LIST_FAILED),
    }
}

async fn create_reminder(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateReminderRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected("create_reminder", &rejection, INVALID_REQUEST),
    };

    let (activity, scheduled_time) = match validate_new_reminder(payload) {
        Ok(fields) => fields,
        Err(err) => return failure("create_reminder", &err, CREATE_FAILED),
    };

    match state
        .reminder_store
        .create_reminder(&activity, &scheduled_time)
        .await
    {
        Ok(id) => {
            tracing::info!(id, "Created reminder");
            (StatusCode::OK, Json(CreateReminderResponse { id })).into_response()
        }
        Err(err) => failure("create_reminder", &err, CREATE_FAILED),
    }
}

async fn delete_reminder(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Response {
    let Path(raw_id) = match id {
        Ok(id) => id,
        Err(rejection) => return rejected("delete_reminder", &rejection, INVALID_REMINDER_ID),
    };

    // Ids outside the column range can never match a row.
    let Ok(id) = i32::try_from(raw_id) else {
        tracing::info!(id = raw_id, removed = false, "Delete reminder requested");
        return reminder_deleted();
    };

    match state.reminder_store.delete_reminder(id).await {
        Ok(removed) => {
            tracing::info!(id, removed, "Delete reminder requested");
            reminder_deleted()
        }
        Err(err) => failure("delete_reminder", &err, DELETE_FAILED),
    }
}

fn reminder_deleted() -> Response {
    (
        StatusCode::OK,
        Json(MessageResponse {
            message: "Reminder deleted".to_string(),
        }),
    )
        .into_response()
}

async fn chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected("chat", &rejection, INVALID_REQUEST),
    };

    let message = match required(payload.message, "message") {
        Ok(message) => message,
        Err(err) => return failure("chat", &err, CHAT_FAILED),
    };

    match state.chat.reply(&message).await {
        Ok(reply) => (StatusCode::OK, Json(ChatResponse { reply })).into_response(),
        Err(err) => failure("chat", &err, CHAT_FAILED),
    }
}

fn validate_new_reminder(payload: CreateReminderRequest) -> Result<(String, String)> {
    let activity = required(payload.activity, "activity")?;
    let scheduled_time = required(payload.scheduled_time, "scheduled_time")?;
    Ok((activity, scheduled_time))
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SelfCareError::Validation(format!("`{field}` is required"))),
    }
}

fn error_response(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

/// Client errors echo their message; everything else is logged and flattened
/// into `public_message`.
fn failure(operation: &str, err: &SelfCareError, public_message: &str) -> Response {
    match err {
        SelfCareError::Validation(message) => {
            tracing::debug!(operation, "Rejected request: {}", message);
            error_response(StatusCode::BAD_REQUEST, message)
        }
        other => {
            tracing::error!(operation, "Request failed: {}", other);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, public_message)
        }
    }
}

fn rejected(operation: &str, rejection: &dyn std::fmt::Display, public_message: &str) -> Response {
    tracing::debug!(operation, "Rejected request: {}", rejection);
    error_response(StatusCode::BAD_REQUEST, public_message)
}

fn load_index_html(path: Option<&str>) -> Result<Arc<str>> {
    match path {
        Some(path) => {
            let html = std::fs::read_to_string(path)
                .map_err(|e| SelfCareError::Config(format!("index page {path}: {e}")))?;
            Ok(Arc::from(html))
        }
        None => Ok(Arc::from(INDEX_HTML)),
    }
}

pub async fn run(config: Config) -> Result<()> {
    run_with_shutdown(config, futures::future::pending::<()>()).await
}

pub async fn run_with_shutdown<F>(config: Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let sqlite_path = config.sqlite_path();
    let reminder_store = Arc::new(ReminderStore::new(&sqlite_path).await?);
    tracing::info!(sqlite_path = %sqlite_path, "Opened reminder store");

    let provider = OpenAiProvider::from_config(&config);
    if provider.has_api_key() {
        tracing::info!(model = provider.model(), "AI provider configured");
    } else {
        tracing::warn!("AI API key not configured; suggestion and chat requests will fail");
    }

    let index_html = load_index_html(config.index_path())?;

    let mut scheduler = Scheduler::new();
    if config.auto_complete_overdue() {
        scheduler.register_job(Arc::new(OverdueSweepJob::new(
            reminder_store.clone(),
            Duration::from_secs(config.sweep_seconds()),
        )));
    }
    scheduler.start();

    let state = AppState::new(reminder_store, Arc::new(provider)).with_index_html(index_html);
    let app = build_router(state);

    let addr = format!("{}:{}", config.host(), config.port());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SelfCareError::Runtime(format!("bind {addr}: {e}")))?;
    tracing::info!("Listening on http://{}", addr);

    let shutdown = async move {
        shutdown.await;
        scheduler.stop().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| SelfCareError::Runtime(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_missing_and_blank() {
        assert!(required(None, "activity").unwrap_err().is_client_error());
        assert!(required(Some("  ".to_string()), "activity")
            .unwrap_err()
            .is_client_error());
        assert_eq!(
            required(Some(" Meditate ".to_string()), "activity").unwrap(),
            " Meditate "
        );
    }

    #[test]
    fn missing_index_file_is_a_config_error() {
        let err = load_index_html(Some("/definitely/not/here.html")).unwrap_err();
        assert!(matches!(err, SelfCareError::Config(_)));
        assert_eq!(&*load_index_html(None).unwrap(), INDEX_HTML);
    }
}

//! HTTP server: router assembly and request handlers.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::Utc;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::analytics;
use crate::config::{self, AppConfig};
use crate::events::{ChatEvent, sse_event};
use crate::export;
use crate::extract::{ExtractorSet, is_image_extension};
use crate::intake::RegistrationForm;
use crate::llm::{LlmSettings, Tutor, tutor::GREETING};
use crate::logs::{
    self, CompletionRecord, ContentAccessRecord, FeedbackRecord, FeedbackTrendRecord, LogKind,
    LogStore, RegistrationRecord, ResolutionTimeRecord, ResponseTimeRecord, TopicRecord,
};
use crate::security::{self, RateLimiter};
use crate::session::{Session, SessionDocument, SessionStore};

/// Per-file upload cap (10MB); the request body cap is 25MB.
const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
const MAX_BODY_SIZE: usize = 25 * 1024 * 1024;

/// Build the shared application state from configuration.
pub fn build_state(config: Arc<AppConfig>, settings: LlmSettings) -> anyhow::Result<AppState> {
    let schedule = Arc::new(config::build_schedule(&config.tutoring)?);
    let logs = Arc::new(LogStore::open(&config.storage.data_dir)?);
    let rate_limiter = Arc::new(RateLimiter::new(
        config.resilience.requests_per_second,
        config.resilience.burst_size,
    ));

    Ok(AppState {
        tutor: Arc::new(Tutor::new(settings)),
        sessions: SessionStore::new(),
        logs,
        extractors: Arc::new(ExtractorSet::standard()),
        schedule,
        rate_limiter,
        config,
    })
}

/// Start the server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>, settings: LlmSettings) -> anyhow::Result<()> {
    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        "LLM configuration loaded"
    );

    let state = build_state(Arc::clone(&config), settings)?;
    info!(
        name: "logs.opened",
        data_dir = %state.logs.dir().display(),
        "Log store opened"
    );
    info!(
        name: "schedule.loaded",
        windows = %state.schedule.describe(),
        "Tutoring schedule loaded"
    );

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/overview", get(admin_overview))
        .route("/usage", get(admin_usage))
        .route("/engagement", get(admin_engagement))
        .route("/topics", get(admin_topics))
        .route("/performance", get(admin_performance))
        .route("/students/{name}/success", get(admin_student_success))
        .route("/export/workbook", get(admin_export_workbook))
        .route("/export/{log}", get(admin_export_log))
        .route("/data/{log}", delete(admin_clear_log))
        .route("/data", delete(admin_clear_all))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            security::admin_auth,
        ));

    // Timeouts always run; "disabled" just stretches the deadline so the
    // router type stays uniform.
    let timeout_duration = if state.config.resilience.timeout_disabled {
        Duration::from_secs(365 * 24 * 60 * 60)
    } else {
        Duration::from_secs(30)
    };

    Router::new()
        .route("/health", get(health))
        .route("/chat", post(simple_chat))
        .route("/api/register", post(register))
        .route("/api/chat", post(api_chat))
        .route("/api/chat/stream", get(api_chat_stream))
        .route(
            "/api/sessions/{id}/documents",
            post(upload_documents).get(list_documents),
        )
        .route(
            "/api/sessions/{id}/documents/{doc_id}",
            delete(delete_document),
        )
        .route(
            "/api/sessions/{id}/documents/{doc_id}/move",
            post(move_document),
        )
        .route("/api/sessions/{id}/feedback", post(submit_feedback))
        .route("/api/sessions/{id}/end", post(end_session))
        .nest("/api/admin", admin)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(security::security_headers))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(middleware::from_fn(move |req: Request, next: Next| {
            let duration = timeout_duration;
            async move {
                match tokio::time::timeout(duration, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
                }
            }
        }))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security::rate_limit,
        ))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Liveness and the plain chat endpoint
// ─────────────────────────────────────────────────────────────────────────────

/// GET /health - liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

#[derive(Debug, Deserialize)]
struct SimpleChatRequest {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct SimpleChatResponse {
    response: String,
    status: String,
}

/// POST /chat - one-shot, sessionless chat.
async fn simple_chat(
    State(state): State<AppState>,
    Json(req): Json<SimpleChatRequest>,
) -> Result<Json<SimpleChatResponse>, (StatusCode, Json<serde_json::Value>)> {
    if req.message.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "No message provided" })),
        ));
    }

    match state.tutor.reply(&req.message).await {
        Ok(response) => Ok(Json(SimpleChatResponse {
            response,
            status: "success".to_string(),
        })),
        Err(e) => {
            tracing::error!(error = %e, "One-shot chat failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string(), "status": "error" })),
            ))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registration and session chat
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct RegisterResponse {
    session_id: String,
    greeting: String,
}

/// POST /api/register - validate the intake form and open a session.
async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegistrationForm>,
) -> Result<Json<RegisterResponse>, (StatusCode, String)> {
    let profile = form
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let session = state.sessions.create(profile);
    info!(
        name: "session.registered",
        session_id = %session.id(),
        course_id = %session.profile().course_id,
        "Student registered"
    );

    // The original logged a row at registration time and a second one with
    // the real duration at logout.
    append_registration(&state, &session, 0.0);

    Ok(Json(RegisterResponse {
        session_id: session.id().to_string(),
        greeting: GREETING.to_string(),
    }))
}

fn append_registration(state: &AppState, session: &Session, usage_minutes: f64) {
    let profile = session.profile();
    let record = RegistrationRecord {
        timestamp: logs::timestamp(Utc::now(), state.schedule.timezone()),
        full_name: profile.full_name.clone(),
        grade: profile.grade.to_string(),
        campus: profile.campus.to_string(),
        major: profile.major.to_string(),
        course_name: profile.course_name.clone(),
        course_id: profile.course_id.to_string(),
        professor: profile.professor.clone(),
        usage_time_minutes: usage_minutes,
    };
    if let Err(e) = state.logs.append(LogKind::Registration, &record) {
        tracing::error!(error = %e, "Failed to append registration row");
    }
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    session_id: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    session_id: String,
    stream_url: String,
}

/// POST /api/chat - queue a message and get the stream URL.
async fn api_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<serde_json::Value>)> {
    let Some(session) = state.sessions.get(&req.session_id) else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Session not found" })),
        ));
    };

    if state.schedule.is_open_now() {
        info!(
            name: "chat.deferred",
            session_id = %req.session_id,
            "Chat deferred to in-person tutoring"
        );
        return Err((
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "error": "In-person tutoring is currently available. Please visit the \
                     in-person tutoring session instead of using the bot. The bot will \
                     be available after the tutoring session ends.",
                "tutoring_hours": state.schedule.describe(),
            })),
        ));
    }

    if req.message.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "No message provided" })),
        ));
    }

    session.add_user_message(&req.message);
    tracing::debug!(
        session_id = %req.session_id,
        message_count = session.message_count(),
        "Added user message to session"
    );

    let stream_url = format!("/api/chat/stream?session_id={}", req.session_id);
    Ok(Json(ChatResponse {
        session_id: req.session_id,
        stream_url,
    }))
}

#[derive(Debug, Deserialize)]
struct StreamQuery {
    session_id: String,
    /// Optional message to send (if not already queued via POST /api/chat).
    #[serde(default)]
    message: Option<String>,
}

/// GET /api/chat/stream - SSE stream of the tutor's reply.
async fn api_chat_stream(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Response {
    let Some(session) = state.sessions.get(&query.session_id) else {
        tracing::error!(session_id = %query.session_id, "Session not found");
        return single_error_sse("Session not found");
    };

    if let Some(msg) = &query.message
        && !msg.is_empty()
    {
        session.add_user_message(msg);
    }

    let messages = session.messages();
    let context = session.context();
    let documents = session.documents();
    let user_id = session.profile().full_name.clone();
    let tutor = Arc::clone(&state.tutor);
    let logs = Arc::clone(&state.logs);
    let tz = state.schedule.timezone();
    let started = Utc::now();

    info!(
        session_id = %query.session_id,
        message_count = messages.len(),
        document_count = documents.len(),
        "Starting SSE stream"
    );

    let session_id = query.session_id.clone();
    let sse_stream = async_stream::stream! {
        let stream = match tutor.stream_reply(messages, context).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Failed to start tutor stream");
                let err = ChatEvent::Error {
                    message: e.to_string(),
                    code: None,
                };
                yield Ok::<String, std::convert::Infallible>(sse_event(&err));
                yield Ok::<String, std::convert::Infallible>(sse_event(&ChatEvent::Done));
                return;
            }
        };

        let mut assistant_content = String::new();
        let mut finished = false;

        futures::pin_mut!(stream);
        while let Some(event) = stream.next().await {
            match &event {
                ChatEvent::MessageDelta { text } => {
                    assistant_content.push_str(text);
                }
                ChatEvent::Done if !finished => {
                    finished = true;

                    if !assistant_content.is_empty() {
                        session.add_assistant_message(assistant_content.clone());
                    }

                    let elapsed = (Utc::now() - started).num_milliseconds() as f64 / 1000.0;
                    let record = ResponseTimeRecord {
                        timestamp: logs::timestamp(Utc::now(), tz),
                        response_time: elapsed,
                        user_id: user_id.clone(),
                    };
                    if let Err(e) = logs.append(LogKind::ResponseTimes, &record) {
                        tracing::error!(error = %e, "Failed to append response-time row");
                    }

                    // Every attached material counts as referenced context.
                    for doc in &documents {
                        let record = ContentAccessRecord {
                            timestamp: logs::timestamp(Utc::now(), tz),
                            content_id: doc.name.clone(),
                            content_type: if doc.is_image { "image" } else { "document" }
                                .to_string(),
                            user_id: user_id.clone(),
                        };
                        if let Err(e) = logs.append(LogKind::ContentAccess, &record) {
                            tracing::error!(error = %e, "Failed to append content-access row");
                        }
                    }

                    info!(
                        session_id = %session_id,
                        content_length = assistant_content.len(),
                        response_seconds = elapsed,
                        "Stream complete"
                    );
                }
                _ => {}
            }

            yield Ok::<String, std::convert::Infallible>(sse_event(&event));
        }
    };

    let body = axum::body::Body::from_stream(sse_stream);
    build_sse_response(body)
}

// ─────────────────────────────────────────────────────────────────────────────
// Uploaded materials
// ─────────────────────────────────────────────────────────────────────────────

/// Document metadata returned to the client.
#[derive(Debug, Serialize)]
struct DocumentDto {
    id: String,
    name: String,
    is_image: bool,
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    documents: Vec<DocumentDto>,
    errors: Vec<String>,
}

/// POST /api/sessions/:id/documents - upload course materials.
async fn upload_documents(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let Some(session) = state.sessions.get(&id) else {
        return Err((StatusCode::NOT_FOUND, "Session not found".to_string()));
    };

    let mut documents = Vec::new();
    let mut errors = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to read multipart field: {e}")))?
    {
        let Some(filename) = field.file_name().map(ToString::to_string) else {
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to read '{filename}': {e}")))?;

        if data.len() > MAX_FILE_SIZE {
            errors.push(format!(
                "File '{filename}' exceeds max size ({}MB)",
                MAX_FILE_SIZE / (1024 * 1024)
            ));
            continue;
        }

        let extension = std::path::Path::new(&filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let document = if is_image_extension(&extension) {
            let mime = mime_guess::from_path(&filename)
                .first_or_octet_stream()
                .to_string();
            match state.tutor.analyze_image(&data, &mime).await {
                Ok(analysis) => SessionDocument {
                    id: uuid::Uuid::new_v4().to_string(),
                    name: filename.clone(),
                    content: format!("[Image Analysis: {analysis}]"),
                    is_image: true,
                    analysis: Some(analysis),
                },
                Err(e) => {
                    tracing::error!(file = %filename, error = %e, "Image analysis failed");
                    SessionDocument {
                        id: uuid::Uuid::new_v4().to_string(),
                        name: filename.clone(),
                        content: format!("[Image File: {filename}]"),
                        is_image: true,
                        analysis: None,
                    }
                }
            }
        } else {
            match extract_upload(&state.extractors, &filename, &extension, &data).await {
                Ok(content) => SessionDocument {
                    id: uuid::Uuid::new_v4().to_string(),
                    name: filename.clone(),
                    content,
                    is_image: false,
                    analysis: None,
                },
                Err(e) => {
                    errors.push(format!("{filename}: {e}"));
                    continue;
                }
            }
        };

        info!(
            name: "document.uploaded",
            session_id = %id,
            file = %filename,
            is_image = document.is_image,
            "Processed uploaded document"
        );

        let record = ContentAccessRecord {
            timestamp: logs::timestamp(Utc::now(), state.schedule.timezone()),
            content_id: filename,
            content_type: if document.is_image { "image" } else { "document" }.to_string(),
            user_id: session.profile().full_name.clone(),
        };
        if let Err(e) = state.logs.append(LogKind::ContentAccess, &record) {
            tracing::error!(error = %e, "Failed to append content-access row");
        }

        documents.push(DocumentDto {
            id: document.id.clone(),
            name: document.name.clone(),
            is_image: document.is_image,
        });
        session.add_document(document);
    }

    Ok(Json(UploadResponse { documents, errors }))
}

/// Spool upload bytes to a temp file and run the extension-dispatched
/// extractor over it.
async fn extract_upload(
    extractors: &ExtractorSet,
    filename: &str,
    extension: &str,
    data: &[u8],
) -> Result<String, crate::extract::ExtractError> {
    let tmp = std::env::temp_dir().join(format!("nuanswers-{}.{extension}", uuid::Uuid::new_v4()));
    tokio::fs::write(&tmp, data).await?;

    let result = extractors.extract_path(&tmp).await;

    if let Err(e) = tokio::fs::remove_file(&tmp).await {
        tracing::warn!(file = %filename, error = %e, "Failed to remove temp file");
    }

    result.map(|extracted| extracted.content)
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// GET /api/sessions/:id/documents?q= - list or search materials.
async fn list_documents(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SessionDocument>>, StatusCode> {
    match state.sessions.get(&id) {
        Some(session) => Ok(Json(session.search_documents(&query.q))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// DELETE /api/sessions/:id/documents/:doc_id - remove a material.
async fn delete_document(
    State(state): State<AppState>,
    Path((id, doc_id)): Path<(String, String)>,
) -> StatusCode {
    match state.sessions.get(&id) {
        Some(session) if session.remove_document(&doc_id) => StatusCode::NO_CONTENT,
        Some(_) | None => StatusCode::NOT_FOUND,
    }
}

#[derive(Debug, Deserialize)]
struct MoveRequest {
    direction: String,
}

/// POST /api/sessions/:id/documents/:doc_id/move - reorder materials.
async fn move_document(
    State(state): State<AppState>,
    Path((id, doc_id)): Path<(String, String)>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let Some(session) = state.sessions.get(&id) else {
        return Err((StatusCode::NOT_FOUND, "Session not found".to_string()));
    };

    let up = match req.direction.as_str() {
        "up" => true,
        "down" => false,
        other => {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("direction must be 'up' or 'down', got {other:?}"),
            ));
        }
    };

    let moved = session.move_document(&doc_id, up);
    Ok(Json(serde_json::json!({ "moved": moved })))
}

// ─────────────────────────────────────────────────────────────────────────────
// Feedback and session end
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    topic: String,
    /// Session helpfulness, 1-5.
    rating: u8,
    /// Topic difficulty, 1-5.
    difficulty: u8,
    #[serde(default)]
    comments: Option<String>,
}

/// POST /api/sessions/:id/feedback - record end-of-session feedback.
async fn submit_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let Some(session) = state.sessions.get(&id) else {
        return Err((StatusCode::NOT_FOUND, "Session not found".to_string()));
    };

    if req.topic.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Please enter the topics discussed.".to_string(),
        ));
    }
    if !(1..=5).contains(&req.rating) || !(1..=5).contains(&req.difficulty) {
        return Err((
            StatusCode::BAD_REQUEST,
            "rating and difficulty must be between 1 and 5".to_string(),
        ));
    }

    let tz = state.schedule.timezone();
    let now = Utc::now();
    let profile = session.profile();
    let course_id = profile.course_id.to_string();

    let rows: [(&str, Result<(), logs::LogError>); 5] = [
        (
            "feedback",
            state.logs.append(
                LogKind::Feedback,
                &FeedbackRecord {
                    timestamp: logs::timestamp(now, tz),
                    course_id: course_id.clone(),
                    rating: req.rating,
                    topic: req.topic.clone(),
                    difficulty: req.difficulty,
                },
            ),
        ),
        (
            "topic",
            state.logs.append(
                LogKind::Topic,
                &TopicRecord {
                    timestamp: logs::timestamp(now, tz),
                    course_id: course_id.clone(),
                    topic: req.topic.clone(),
                    difficulty: Some(req.difficulty),
                },
            ),
        ),
        (
            "completion",
            state.logs.append(
                LogKind::Completion,
                &CompletionRecord {
                    timestamp: logs::timestamp(now, tz),
                    course_id,
                    completed: true,
                },
            ),
        ),
        (
            "feedback-trend",
            state.logs.append(
                LogKind::FeedbackTrends,
                &FeedbackTrendRecord {
                    date: logs::datestamp(now, tz),
                    satisfaction_score: req.rating,
                    suggestions: req.comments.clone().filter(|c| !c.trim().is_empty()),
                    user_id: profile.full_name.clone(),
                },
            ),
        ),
        (
            "resolution-time",
            state.logs.append(
                LogKind::ResolutionTimes,
                &ResolutionTimeRecord {
                    timestamp: logs::timestamp(now, tz),
                    resolution_time: session.usage_minutes(now),
                    topic: req.topic.clone(),
                    user_id: profile.full_name.clone(),
                },
            ),
        ),
    ];
    for (log, result) in rows {
        if let Err(e) = result {
            tracing::error!(log, error = %e, "Failed to append feedback row");
        }
    }

    session.mark_feedback_submitted();
    info!(
        name: "session.feedback",
        session_id = %id,
        rating = req.rating,
        "Feedback recorded"
    );

    Ok(Json(serde_json::json!({ "status": "recorded" })))
}

#[derive(Debug, Serialize)]
struct EndSessionResponse {
    usage_time_minutes: f64,
    feedback_submitted: bool,
}

/// POST /api/sessions/:id/end - close a session and log its duration.
async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EndSessionResponse>, StatusCode> {
    let Some(session) = state.sessions.remove(&id) else {
        return Err(StatusCode::NOT_FOUND);
    };

    let usage = session.usage_minutes(Utc::now());
    append_registration(&state, &session, usage);

    info!(
        name: "session.ended",
        session_id = %id,
        usage_minutes = usage,
        feedback_submitted = session.feedback_submitted(),
        "Session ended"
    );

    Ok(Json(EndSessionResponse {
        usage_time_minutes: usage,
        feedback_submitted: session.feedback_submitted(),
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin API
// ─────────────────────────────────────────────────────────────────────────────

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[derive(Debug, Serialize)]
struct OverviewReport {
    overview: analytics::Overview,
    demographics: analytics::Demographics,
    semester: analytics::SemesterLabel,
}

/// GET /api/admin/overview - headline metrics and demographics.
async fn admin_overview(
    State(state): State<AppState>,
) -> Result<Json<OverviewReport>, (StatusCode, String)> {
    let rows: Vec<RegistrationRecord> =
        state.logs.read(LogKind::Registration).map_err(internal)?;

    let today = Utc::now()
        .with_timezone(&state.schedule.timezone())
        .date_naive();

    Ok(Json(OverviewReport {
        overview: analytics::overview(&rows),
        demographics: analytics::demographics(&rows),
        semester: analytics::semester_for(today),
    }))
}

#[derive(Debug, Serialize)]
struct UsageReport {
    daily: Vec<analytics::DailyStat>,
    weekly: Vec<analytics::WeekdayStat>,
    hourly: Vec<analytics::HourlyStat>,
}

/// GET /api/admin/usage - daily/weekly/hourly usage trends.
async fn admin_usage(
    State(state): State<AppState>,
) -> Result<Json<UsageReport>, (StatusCode, String)> {
    let rows: Vec<RegistrationRecord> =
        state.logs.read(LogKind::Registration).map_err(internal)?;

    Ok(Json(UsageReport {
        daily: analytics::daily_stats(&rows),
        weekly: analytics::weekday_stats(&rows),
        hourly: analytics::hourly_stats(&rows),
    }))
}

/// GET /api/admin/engagement - per-student engagement profiles.
async fn admin_engagement(
    State(state): State<AppState>,
) -> Result<Json<Vec<analytics::EngagementStat>>, (StatusCode, String)> {
    let rows: Vec<RegistrationRecord> =
        state.logs.read(LogKind::Registration).map_err(internal)?;
    Ok(Json(analytics::engagement(&rows)))
}

#[derive(Debug, Serialize)]
struct TopicsReport {
    top_topics: Vec<analytics::TopicCount>,
    hardest_topics: Vec<analytics::TopicDifficulty>,
    ratings: analytics::RatingSummary,
    completion: analytics::CompletionSummary,
}

/// GET /api/admin/topics - topic, rating, and completion analysis.
async fn admin_topics(
    State(state): State<AppState>,
) -> Result<Json<TopicsReport>, (StatusCode, String)> {
    let topics: Vec<TopicRecord> = state.logs.read(LogKind::Topic).map_err(internal)?;
    let feedback: Vec<FeedbackRecord> = state.logs.read(LogKind::Feedback).map_err(internal)?;
    let completions: Vec<CompletionRecord> =
        state.logs.read(LogKind::Completion).map_err(internal)?;

    Ok(Json(TopicsReport {
        top_topics: analytics::topic_counts(&topics, 10),
        hardest_topics: analytics::topic_difficulty(&topics, 10),
        ratings: analytics::rating_summary(&feedback),
        completion: analytics::completion_summary(&completions),
    }))
}

/// GET /api/admin/performance - assistant latency summary.
async fn admin_performance(
    State(state): State<AppState>,
) -> Result<Json<analytics::ResponseTimeSummary>, (StatusCode, String)> {
    let rows: Vec<ResponseTimeRecord> =
        state.logs.read(LogKind::ResponseTimes).map_err(internal)?;
    Ok(Json(analytics::response_time_summary(&rows)))
}

/// GET /api/admin/students/:name/success - success prediction for one student.
async fn admin_student_success(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<analytics::SuccessPrediction>, (StatusCode, String)> {
    let registrations: Vec<RegistrationRecord> =
        state.logs.read(LogKind::Registration).map_err(internal)?;
    let feedback: Vec<FeedbackRecord> = state.logs.read(LogKind::Feedback).map_err(internal)?;
    let topics: Vec<TopicRecord> = state.logs.read(LogKind::Topic).map_err(internal)?;
    let completions: Vec<CompletionRecord> =
        state.logs.read(LogKind::Completion).map_err(internal)?;

    if !registrations.iter().any(|r| r.full_name == name) {
        return Err((StatusCode::NOT_FOUND, format!("No sessions for {name:?}")));
    }

    let today = Utc::now()
        .with_timezone(&state.schedule.timezone())
        .date_naive();

    Ok(Json(analytics::predict_success(
        &name,
        &registrations,
        &feedback,
        &topics,
        &completions,
        today,
    )))
}

/// GET /api/admin/export/:log - download one log as CSV.
async fn admin_export_log(
    State(state): State<AppState>,
    Path(log): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    let kind: LogKind = log
        .parse()
        .map_err(|e: logs::LogError| (StatusCode::NOT_FOUND, e.to_string()))?;

    let Some(bytes) = state.logs.raw(kind).map_err(internal)? else {
        return Err((StatusCode::NOT_FOUND, format!("No data for {log}")));
    };

    let headers = [
        ("content-type", "text/csv; charset=utf-8".to_string()),
        (
            "content-disposition",
            format!("attachment; filename=\"{}\"", export::csv_filename(kind)),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// GET /api/admin/export/workbook - download all logs as one Excel file.
async fn admin_export_workbook(
    State(state): State<AppState>,
) -> Result<Response, (StatusCode, String)> {
    let bytes = export::workbook(&state.logs).map_err(internal)?;

    let headers = [
        (
            "content-type",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
        ),
        (
            "content-disposition",
            "attachment; filename=\"nuanswers_all_data.xlsx\"".to_string(),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// DELETE /api/admin/data/:log - clear one log.
async fn admin_clear_log(
    State(state): State<AppState>,
    Path(log): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let kind: LogKind = log
        .parse()
        .map_err(|e: logs::LogError| (StatusCode::NOT_FOUND, e.to_string()))?;

    if state.logs.clear(kind).map_err(internal)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}

/// DELETE /api/admin/data - clear every log.
async fn admin_clear_all(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let removed = state.logs.clear_all().map_err(internal)?;
    info!(name: "admin.data.cleared", removed, "All logs cleared");
    Ok(Json(serde_json::json!({ "removed": removed })))
}

// ─────────────────────────────────────────────────────────────────────────────
// SSE helpers
// ─────────────────────────────────────────────────────────────────────────────

fn single_error_sse(message: &str) -> Response {
    let err = ChatEvent::Error {
        message: message.to_string(),
        code: None,
    };
    let done = ChatEvent::Done;

    let payload = format!("{}{}", sse_event(&err), sse_event(&done));
    let body = axum::body::Body::from(payload);
    build_sse_response(body)
}

fn build_sse_response(body: axum::body::Body) -> Response {
    let mut resp = Response::new(body);
    let h = resp.headers_mut();
    h.insert("Content-Type", "text/event-stream".parse().unwrap());
    h.insert("Cache-Control", "no-cache".parse().unwrap());
    h.insert("Connection", "keep-alive".parse().unwrap());
    h.insert("X-Accel-Buffering", "no".parse().unwrap());
    resp
}

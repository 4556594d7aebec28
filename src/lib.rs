//! NuAnswers Tutoring Service
//!
//! An HTTP tutoring-chat backend: a registration gate, document ingestion
//! for course materials, a streaming chat engine wired to an
//! OpenAI-compatible chat-completions API, flat-file CSV usage logging,
//! and a password-protected admin analytics API.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP server with SSE streaming
//! - **Tutor engine**: guided-tutoring prompt over a streaming LLM driver
//! - **Logs**: append-only CSV files, one per event type
//! - **Analytics**: pure aggregations over the logs for the admin API
//!
//! # Modules
//!
//! - [`llm`]: LLM driver and the tutor engine
//! - [`session`]: conversation and uploaded-material state
//! - [`schedule`]: tutoring-hours windows
//! - [`intake`]: registration form validation
//! - [`logs`]: CSV log store
//! - [`extract`]: document text extraction
//! - [`analytics`] / [`export`]: admin aggregation and downloads

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::unused_async)]

pub mod analytics;
pub mod config;
pub mod events;
pub mod export;
pub mod extract;
pub mod intake;
pub mod llm;
pub mod logs;
pub mod schedule;
pub mod security;
pub mod server;
pub mod session;
pub mod telemetry;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::extract::ExtractorSet;
use crate::llm::Tutor;
use crate::logs::LogStore;
use crate::schedule::TutoringSchedule;
use crate::security::RateLimiter;
use crate::session::SessionStore;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Tutor engine for chat interactions.
    pub tutor: Arc<Tutor>,
    /// Session store for registered students.
    pub sessions: SessionStore,
    /// CSV log store.
    pub logs: Arc<LogStore>,
    /// Document text extractors.
    pub extractors: Arc<ExtractorSet>,
    /// Tutoring-hours schedule.
    pub schedule: Arc<TutoringSchedule>,
    /// Global rate limiter.
    pub rate_limiter: Arc<RateLimiter>,
    /// Global configuration.
    pub config: Arc<AppConfig>,
}

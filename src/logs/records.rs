//! Typed rows for each CSV log.
//!
//! Field order matches the CSV headers; timestamps are preformatted in the
//! campus time zone (`YYYY-MM-DD HH:MM:SS`, date-only for trend rows).

use serde::{Deserialize, Serialize};

/// One completed (or just-started) tutoring session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub timestamp: String,
    pub full_name: String,
    pub grade: String,
    pub campus: String,
    pub major: String,
    pub course_name: String,
    pub course_id: String,
    pub professor: String,
    pub usage_time_minutes: f64,
}

/// End-of-session feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub timestamp: String,
    pub course_id: String,
    /// Session helpfulness, 1-5.
    pub rating: u8,
    pub topic: String,
    /// Topic difficulty, 1-5.
    pub difficulty: u8,
}

/// A topic discussed during a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicRecord {
    pub timestamp: String,
    pub course_id: String,
    pub topic: String,
    pub difficulty: Option<u8>,
}

/// Whether a session's topic was worked to completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub timestamp: String,
    pub course_id: String,
    pub completed: bool,
}

/// Assistant response latency for one chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseTimeRecord {
    pub timestamp: String,
    /// Seconds from prompt to end of stream.
    pub response_time: f64,
    pub user_id: String,
}

/// An uploaded material referenced during a chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentAccessRecord {
    pub timestamp: String,
    pub content_id: String,
    /// "document" or "image".
    pub content_type: String,
    pub user_id: String,
}

/// Minutes from first raising a topic to wrapping it up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionTimeRecord {
    pub timestamp: String,
    pub resolution_time: f64,
    pub topic: String,
    pub user_id: String,
}

/// Daily satisfaction data point with optional free-form suggestions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackTrendRecord {
    pub date: String,
    pub satisfaction_score: u8,
    pub suggestions: Option<String>,
    pub user_id: String,
}

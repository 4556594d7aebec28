//! Session state and session storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::intake::StudentProfile;
use crate::llm::{Message, MessageRole, tutor::GREETING};

/// Default session timeout (2 hours of inactivity).
const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

/// An uploaded course material attached to a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionDocument {
    /// Unique document identifier.
    pub id: String,
    /// Original filename.
    pub name: String,
    /// Extracted text, or the vision description for images.
    pub content: String,
    /// Whether the upload was an image.
    pub is_image: bool,
    /// Vision analysis for images.
    pub analysis: Option<String>,
}

/// A single tutoring session.
///
/// Sessions hold the student profile, message history, and uploaded
/// documents. Cloning is cheap; state is shared behind an `Arc`.
#[derive(Debug)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    id: String,
    profile: StudentProfile,
    started_at: DateTime<Utc>,
    messages: RwLock<Vec<Message>>,
    documents: RwLock<Vec<SessionDocument>>,
    last_activity: RwLock<DateTime<Utc>>,
    feedback_submitted: RwLock<bool>,
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Session {
    fn new(id: String, profile: StudentProfile, started_at: DateTime<Utc>) -> Self {
        // Every conversation opens with the assistant greeting.
        let greeting = Message::text(MessageRole::Assistant, GREETING);
        Self {
            inner: Arc::new(SessionInner {
                id,
                profile,
                started_at,
                messages: RwLock::new(vec![greeting]),
                documents: RwLock::new(Vec::new()),
                last_activity: RwLock::new(started_at),
                feedback_submitted: RwLock::new(false),
            }),
        }
    }

    /// Get the session ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// The registered student's profile.
    #[must_use]
    pub fn profile(&self) -> &StudentProfile {
        &self.inner.profile
    }

    /// When the student registered.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }

    /// Minutes elapsed since registration.
    #[must_use]
    pub fn usage_minutes(&self, now: DateTime<Utc>) -> f64 {
        (now - self.inner.started_at).num_seconds() as f64 / 60.0
    }

    /// Add a user message to the conversation.
    pub fn add_user_message(&self, content: impl Into<String>) {
        self.add_message(Message::text(MessageRole::User, content));
    }

    /// Add an assistant message to the conversation.
    pub fn add_assistant_message(&self, content: impl Into<String>) {
        self.add_message(Message::text(MessageRole::Assistant, content));
    }

    /// Add a message to the conversation.
    pub fn add_message(&self, message: Message) {
        let mut guard = self.inner.messages.write().unwrap();
        guard.push(message);
        drop(guard);
        self.touch();
    }

    /// Get all messages in the conversation.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.inner.messages.read().unwrap().clone()
    }

    /// Get the number of messages in the conversation.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.inner.messages.read().unwrap().len()
    }

    /// Whether end-of-session feedback was recorded.
    #[must_use]
    pub fn feedback_submitted(&self) -> bool {
        *self.inner.feedback_submitted.read().unwrap()
    }

    /// Record that end-of-session feedback was submitted.
    pub fn mark_feedback_submitted(&self) {
        *self.inner.feedback_submitted.write().unwrap() = true;
        self.touch();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Uploaded materials
    // ─────────────────────────────────────────────────────────────────────

    /// Attach an uploaded document.
    pub fn add_document(&self, document: SessionDocument) {
        let mut guard = self.inner.documents.write().unwrap();
        guard.push(document);
        drop(guard);
        self.touch();
    }

    /// All attached documents, in context order.
    #[must_use]
    pub fn documents(&self) -> Vec<SessionDocument> {
        self.inner.documents.read().unwrap().clone()
    }

    /// Remove a document by ID. Returns whether it existed.
    pub fn remove_document(&self, id: &str) -> bool {
        let mut guard = self.inner.documents.write().unwrap();
        let before = guard.len();
        guard.retain(|d| d.id != id);
        let removed = guard.len() != before;
        drop(guard);
        if removed {
            self.touch();
        }
        removed
    }

    /// Move a document one position toward the front (`up` = true) or the
    /// back of the context order. Returns whether anything moved.
    pub fn move_document(&self, id: &str, up: bool) -> bool {
        let mut guard = self.inner.documents.write().unwrap();
        let Some(idx) = guard.iter().position(|d| d.id == id) else {
            return false;
        };

        let swapped = if up && idx > 0 {
            guard.swap(idx, idx - 1);
            true
        } else if !up && idx + 1 < guard.len() {
            guard.swap(idx, idx + 1);
            true
        } else {
            false
        };
        drop(guard);
        if swapped {
            self.touch();
        }
        swapped
    }

    /// Documents whose name or content contains the query
    /// (case-insensitive). An empty query matches everything.
    #[must_use]
    pub fn search_documents(&self, query: &str) -> Vec<SessionDocument> {
        let guard = self.inner.documents.read().unwrap();
        if query.is_empty() {
            return guard.clone();
        }
        let query = query.to_lowercase();
        guard
            .iter()
            .filter(|d| {
                d.name.to_lowercase().contains(&query)
                    || d.content.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    /// Render the uploaded documents as chat context, or `None` when
    /// nothing is attached.
    #[must_use]
    pub fn context(&self) -> Option<String> {
        let guard = self.inner.documents.read().unwrap();
        if guard.is_empty() {
            return None;
        }

        let blocks: Vec<String> = guard
            .iter()
            .map(|d| format!("Document: {}\nContent: {}", d.name, d.content))
            .collect();
        Some(format!(
            "Here is the context from uploaded documents:\n\n{}\n\n",
            blocks.join("\n\n")
        ))
    }

    /// Update the last activity timestamp.
    fn touch(&self) {
        let mut guard = self.inner.last_activity.write().unwrap();
        *guard = Utc::now();
    }

    /// Check if the session has been inactive longer than the timeout.
    #[must_use]
    pub fn is_expired_with_timeout(&self, timeout: Duration) -> bool {
        let last = *self.inner.last_activity.read().unwrap();
        let now = Utc::now();
        (now - last).to_std().is_ok_and(|d| d > timeout)
    }
}

/// Thread-safe store for sessions.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    sessions: RwLock<HashMap<String, Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a new session store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Register a student and return their new session.
    #[must_use]
    pub fn create(&self, profile: StudentProfile) -> Session {
        let id = Uuid::new_v4().to_string();
        let session = Session::new(id.clone(), profile, Utc::now());
        let mut guard = self.inner.sessions.write().unwrap();
        guard.insert(id, session.clone());
        session
    }

    /// Get a session by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Session> {
        let guard = self.inner.sessions.read().unwrap();
        guard.get(id).cloned()
    }

    /// Remove a session by ID.
    pub fn remove(&self, id: &str) -> Option<Session> {
        let mut guard = self.inner.sessions.write().unwrap();
        guard.remove(id)
    }

    /// Get the number of active sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.sessions.read().unwrap().len()
    }

    /// Check if there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove sessions inactive longer than the default timeout.
    /// Returns the number of sessions removed.
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_with_timeout(DEFAULT_SESSION_TIMEOUT)
    }

    /// Remove sessions inactive longer than `timeout`.
    pub fn cleanup_expired_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = self.inner.sessions.write().unwrap();
        let before = guard.len();
        guard.retain(|_, session| !session.is_expired_with_timeout(timeout));
        before - guard.len()
    }

    /// List all session IDs.
    #[must_use]
    pub fn list_ids(&self) -> Vec<String> {
        self.inner
            .sessions
            .read()
            .unwrap()
            .keys()
            .cloned()
            .collect()
    }
}

//! Session and conversation state management.
//!
//! This module provides in-memory session storage for registered students.
//! Sessions are identified by UUID and carry the student's intake profile,
//! the conversation history, and the uploaded course materials.
//!
//! # Architecture
//!
//! - [`Session`]: one student's conversation and materials
//! - [`SessionStore`]: thread-safe store for all active sessions

mod store;

pub use store::{Session, SessionDocument, SessionStore};

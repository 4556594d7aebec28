//! LLM driver abstractions and the tutoring engine.
//!
//! This module provides the streaming interface to an OpenAI-compatible
//! chat-completions API and the [`Tutor`] engine built on top of it.
//!
//! # Overview
//!
//! The [`LlmDriver`] trait defines the core streaming interface. The
//! [`Tutor`] composes a driver with the tutoring system prompt, uploaded
//! document context, and the vision call used to describe image uploads.

pub mod chat_completions;
pub mod tutor;

pub use chat_completions::ChatCompletionsDriver;
pub use tutor::Tutor;

use crate::events::ChatEvent;
use futures::Stream;

/// LLM connection and model settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Base URL for the chat-completions API.
    pub base_url: String,
    /// API key, sent as a bearer token.
    pub api_key: String,
    /// Model used for tutoring chat (e.g. `gpt-4.1`).
    pub model: String,
    /// Vision-capable model used for image analysis (e.g. `gpt-4o`).
    pub vision_model: String,
}

/// A message in a conversation.
///
/// Messages carry either simple text content or multimodal content with
/// image parts (used for vision analysis of uploaded images).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Content of the message (text or multimodal parts).
    #[serde(flatten)]
    pub content: MessageContent,
}

impl Message {
    /// Build a plain-text message.
    #[must_use]
    pub fn text(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::text(content),
        }
    }
}

/// Message content - either simple text or multimodal parts.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content.
    Text { content: String },
    /// Multimodal content with text and image parts.
    Parts { content: Vec<ContentPart> },
}

impl MessageContent {
    /// Create simple text content.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text { content: s.into() }
    }

    /// Create multimodal content from parts.
    #[must_use]
    pub fn parts(parts: Vec<ContentPart>) -> Self {
        Self::Parts { content: parts }
    }

    /// Get the text content (first text part or entire string).
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { content } => Some(content),
            Self::Parts { content } => content.iter().find_map(|p| {
                if let ContentPart::Text { text } = p {
                    Some(text.as_str())
                } else {
                    None
                }
            }),
        }
    }
}

impl std::fmt::Display for MessageContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_text() {
            Some(text) => write!(f, "{text}"),
            None => write!(f, "[multimodal content]"),
        }
    }
}

/// A content part for multimodal messages.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
    /// Image content (URL or base64 data URL).
    ImageUrl {
        /// Image URL configuration.
        image_url: ImageUrl,
    },
}

impl ContentPart {
    /// Create a text content part.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text { text: s.into() }
    }

    /// Create an image URL content part.
    #[must_use]
    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

/// Image URL configuration for multimodal content.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImageUrl {
    /// Image URL (can be HTTP URL or base64 data URL).
    pub url: String,
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
}

/// Request to an LLM driver.
#[derive(Debug)]
pub struct LlmRequest {
    /// Conversation messages in wire format.
    pub messages: Vec<serde_json::Value>,
    /// Model to use instead of the configured default (vision calls).
    pub model_override: Option<String>,
    /// Cap on generated tokens (vision calls are bounded).
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    /// Build a default request from messages.
    #[must_use]
    pub fn new(messages: Vec<serde_json::Value>) -> Self {
        Self {
            messages,
            model_override: None,
            max_tokens: None,
        }
    }
}

/// Trait for LLM streaming drivers.
///
/// Implementations provide streaming access to chat responses, emitting
/// [`ChatEvent`]s as the model generates output.
#[async_trait::async_trait]
pub trait LlmDriver: Send + Sync {
    /// Stream a response from the LLM.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the connection is interrupted.
    async fn stream(
        &self,
        req: LlmRequest,
    ) -> anyhow::Result<std::pin::Pin<Box<dyn Stream<Item = anyhow::Result<ChatEvent>> + Send>>>;
}

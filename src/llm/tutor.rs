//! The tutoring engine.
//!
//! Wraps an [`LlmDriver`] with the guided-tutoring system prompt, injects
//! uploaded-document context, and exposes streaming chat, a one-shot
//! reply for the plain `/chat` endpoint, and vision analysis for image
//! uploads.

use std::sync::Arc;

use base64::Engine as _;
use futures::{Stream, StreamExt};
use uuid::Uuid;

use crate::events::ChatEvent;

use super::{
    ChatCompletionsDriver, ContentPart, LlmDriver, LlmRequest, LlmSettings, Message,
    MessageContent, MessageRole,
};

/// Greeting seeded as the first assistant message of every session.
pub const GREETING: &str = "Hello! I'm NuAnswers. I'm here to help you understand concepts and \
     work through problems. What would you like to work on today?";

/// Guided-tutoring system prompt. The tutor leads with questions and never
/// hands out answers.
const SYSTEM_PROMPT: &str = "You are an Accounting & Finance Tutor. Your role is to guide students through their homework and exam preparation through a conversational, step-by-step approach.

IMPORTANT RULES:
1. NEVER give direct answers or solutions
2. Ask ONE question at a time and wait for the student's response
3. After each student response, ask a follow-up question to guide their thinking
4. If the student's answer is incorrect, ask a guiding question to help them think differently
5. If the student asks for the answer, respond with a question that helps them think about the problem differently
6. Use simple, clear questions that build on each other
7. Focus on one concept or step at a time
8. Validate their understanding before moving to the next step
9. Use encouraging phrases like \"Good thinking!\" or \"You're on the right track!\"
10. If the student seems stuck, ask a simpler question that breaks down the problem
11. Use the context from uploaded documents to provide more relevant guidance";

/// Prompt used when describing uploaded images.
const IMAGE_PROMPT: &str = "Please analyze this image in the context of accounting, finance, or \
     business studies. Describe any relevant equations, problems, charts, or concepts shown.";

/// Token cap for vision analysis responses.
const IMAGE_MAX_TOKENS: u32 = 300;

/// The tutoring engine.
#[derive(Clone)]
pub struct Tutor {
    settings: LlmSettings,
    driver: Arc<dyn LlmDriver>,
}

impl std::fmt::Debug for Tutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tutor")
            .field("model", &self.settings.model)
            .field("vision_model", &self.settings.vision_model)
            .finish()
    }
}

impl Tutor {
    /// Create a tutor backed by the Chat Completions driver.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        let driver: Arc<dyn LlmDriver> = Arc::new(ChatCompletionsDriver::new(settings.clone()));
        Self { settings, driver }
    }

    /// The configured settings.
    #[must_use]
    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    /// Stream a tutoring reply for the given conversation.
    ///
    /// `context` is the rendered uploaded-document context; when present it
    /// is injected as a second system message, as the tutor prompt expects.
    pub async fn stream_reply(
        &self,
        history: Vec<Message>,
        context: Option<String>,
    ) -> anyhow::Result<std::pin::Pin<Box<dyn Stream<Item = ChatEvent> + Send>>> {
        let request_id = Uuid::new_v4().to_string();

        let mut messages = vec![Message::text(MessageRole::System, SYSTEM_PROMPT)];
        if let Some(context) = context {
            messages.push(Message::text(MessageRole::System, context));
        }
        messages.extend(history);

        tracing::info!(
            request_id = %request_id,
            message_count = messages.len(),
            "Starting tutoring stream"
        );

        let req = LlmRequest::new(to_wire(&messages));
        let driver = Arc::clone(&self.driver);

        let stream = async_stream::stream! {
            yield ChatEvent::StreamStart {
                request_id: request_id.clone(),
            };

            let inner = match driver.stream(req).await {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!(request_id = %request_id, error = %e, "Failed to start stream");
                    yield ChatEvent::Error {
                        message: e.to_string(),
                        code: None,
                    };
                    yield ChatEvent::Done;
                    return;
                }
            };

            let mut done = false;
            futures::pin_mut!(inner);
            while let Some(result) = inner.next().await {
                match result {
                    Ok(ChatEvent::Done) => {
                        done = true;
                        yield ChatEvent::Done;
                    }
                    Ok(event) => yield event,
                    Err(e) => {
                        tracing::error!(request_id = %request_id, error = %e, "Stream error");
                        yield ChatEvent::Error {
                            message: e.to_string(),
                            code: None,
                        };
                        yield ChatEvent::Done;
                        return;
                    }
                }
            }

            if !done {
                yield ChatEvent::Done;
            }
        };

        Ok(Box::pin(stream))
    }

    /// One-shot reply for a single user message (no session, no context).
    ///
    /// Collects the streamed deltas into a single string.
    pub async fn reply(&self, user_message: &str) -> anyhow::Result<String> {
        let messages = vec![
            Message::text(MessageRole::System, SYSTEM_PROMPT),
            Message::text(MessageRole::User, user_message),
        ];
        self.collect(LlmRequest::new(to_wire(&messages))).await
    }

    /// Describe an uploaded image with the vision model.
    pub async fn analyze_image(&self, data: &[u8], mime_type: &str) -> anyhow::Result<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        let data_url = format!("data:{mime_type};base64,{encoded}");

        let messages = vec![Message {
            role: MessageRole::User,
            content: MessageContent::parts(vec![
                ContentPart::text(IMAGE_PROMPT),
                ContentPart::image_url(data_url),
            ]),
        }];

        let mut req = LlmRequest::new(to_wire(&messages));
        req.model_override = Some(self.settings.vision_model.clone());
        req.max_tokens = Some(IMAGE_MAX_TOKENS);

        self.collect(req).await
    }

    /// Drain a driver stream into the concatenated assistant text.
    async fn collect(&self, req: LlmRequest) -> anyhow::Result<String> {
        let mut stream = self.driver.stream(req).await?;
        let mut content = String::new();

        while let Some(event) = stream.next().await {
            match event? {
                ChatEvent::MessageDelta { text } => content.push_str(&text),
                ChatEvent::Error { message, .. } => anyhow::bail!(message),
                _ => {}
            }
        }

        Ok(content)
    }
}

fn to_wire(messages: &[Message]) -> Vec<serde_json::Value> {
    messages
        .iter()
        .map(|m| serde_json::to_value(m).unwrap_or_default())
        .collect()
}

//! Turn orchestration
//!
//! One chat turn runs `Idle → Sending → {Success, Failed}`. On success the
//! reply is split into prose and code, the code lands in the workspace, and
//! the model message referencing it is appended — in that order, so message
//! references are never dangling at append time. The first exchange of a
//! session additionally requests a short title; that second call is best
//! effort and its failure is swallowed.

use tracing::debug;

use crate::api::{ChatBackend, Content};
use crate::core::app::App;
use crate::core::config::Settings;
use crate::core::extract::{extract_blocks, resolve_identity};
use crate::core::message::Message;
use crate::core::workspace::CodeArtifact;

pub const NO_KEY_MESSAGE: &str =
    "No API key found. Please add one with /key or configure it on the server.";

pub const INVALID_KEY_MESSAGE: &str =
    "Your API key is invalid or has exceeded its quota. Please check your key and try again.";

pub const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "The AI service is unavailable. Please ensure an API key is configured correctly.";

pub const QUOTA_SEND_MESSAGE: &str =
    "The current API key has exceeded its quota. Please try again later or provide a different key.";

pub const GENERIC_SEND_MESSAGE: &str = "Sorry, something went wrong. Please try again later.";

/// Convention requested from the model so extracted blocks carry filenames.
pub const FENCE_CONVENTION: &str = "When you generate a code block, ALWAYS include a suggested filename with the correct extension after the language identifier. For example: ```python my_script.py";

/// Persona, context, and the fence convention, with empty parts skipped.
pub fn assemble_system_instruction(settings: &Settings) -> String {
    [
        settings.persona.as_str(),
        settings.context.as_str(),
        FENCE_CONVENTION,
    ]
    .iter()
    .filter(|part| !part.trim().is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join("\n\n")
}

fn title_prompt(message: &str) -> String {
    format!(
        "Generate a very short, concise title (4 words max) for a chat that starts with this message: \"{message}\". Respond with only the title."
    )
}

fn strip_wrapping_quotes(title: &str) -> &str {
    let title = title.strip_prefix('"').unwrap_or(title);
    title.strip_suffix('"').unwrap_or(title)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model answered; `new_files` lists workspace files created by this
    /// reply, in extraction order.
    Completed {
        reply: String,
        new_files: Vec<String>,
    },
    /// The send failed; an apologetic model message was appended instead.
    Failed { reply: String },
    /// Chat is blocked (credential absent/unvalidated). When a conversation
    /// exists the reason was also appended to it as a model message.
    Refused { reason: String },
    /// This chat already has a send in flight.
    Busy,
}

pub struct ConversationController<'a> {
    app: &'a mut App,
}

impl<'a> ConversationController<'a> {
    pub fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    /// Run one chat turn for the active session, creating a session when
    /// none is active.
    pub async fn send_message(&mut self, input: &str) -> TurnOutcome {
        if let Some(reason) = self.app.unavailable_reason() {
            if let Some(session) = self.app.sessions.active_mut() {
                session.push(Message::model(reason, Vec::new()));
                self.app.persist();
            }
            return TurnOutcome::Refused {
                reason: reason.to_string(),
            };
        }

        if let Some(active) = self.app.sessions.active_id() {
            if self.app.sending_chat.as_deref() == Some(active) {
                return TurnOutcome::Busy;
            }
        }

        let Some(backend) = self.app.backend() else {
            // unavailable_reason() covers the credential-less case; this is
            // unreachable in practice but must not panic.
            return TurnOutcome::Refused {
                reason: SERVICE_UNAVAILABLE_MESSAGE.to_string(),
            };
        };

        let chat_id = match self.app.sessions.active_id() {
            Some(id) => id.to_string(),
            None => self.app.sessions.open_new(),
        };
        let is_first_exchange = self
            .app
            .sessions
            .active()
            .map(|s| s.messages.is_empty())
            .unwrap_or(true);

        if let Some(session) = self.app.sessions.get_mut(&chat_id) {
            session.push(Message::user(input));
        }
        self.app.sending_chat = Some(chat_id.clone());

        let history: Vec<Content> = self
            .app
            .sessions
            .active()
            .map(|session| {
                session
                    .messages
                    .iter()
                    .map(|m| Content::text(m.role.as_str(), m.text_content.clone()))
                    .collect()
            })
            .unwrap_or_default();
        let system_instruction = assemble_system_instruction(&self.app.settings);

        let outcome = match backend.generate(history, &system_instruction).await {
            Ok(text) => {
                let extraction = extract_blocks(&text);

                let mut batch = Vec::with_capacity(extraction.blocks.len());
                for block in &extraction.blocks {
                    let identity =
                        resolve_identity(&block.info, self.app.workspace.len(), batch.len());
                    batch.push(CodeArtifact::new(
                        identity.filename,
                        identity.language,
                        block.content.clone(),
                    ));
                }
                let new_files: Vec<String> = batch.iter().map(|f| f.filename.clone()).collect();
                let artifact_ids: Vec<String> = batch.iter().map(|f| f.id.clone()).collect();

                // The batch is in the workspace before the message that
                // references it exists.
                self.app.workspace.append(batch);
                if let Some(session) = self.app.sessions.get_mut(&chat_id) {
                    session.push(Message::model(
                        extraction.conversational_text.clone(),
                        artifact_ids,
                    ));
                }

                if is_first_exchange {
                    self.synthesize_title(&chat_id, input, backend.as_ref()).await;
                }

                TurnOutcome::Completed {
                    reply: extraction.conversational_text,
                    new_files,
                }
            }
            Err(err) => {
                debug!("send failed: {err}");
                let wording = if err.is_quota_exceeded() {
                    QUOTA_SEND_MESSAGE
                } else {
                    GENERIC_SEND_MESSAGE
                };
                if let Some(session) = self.app.sessions.get_mut(&chat_id) {
                    session.push(Message::model(wording, Vec::new()));
                }
                TurnOutcome::Failed {
                    reply: wording.to_string(),
                }
            }
        };

        self.app.sending_chat = None;
        self.app.persist();
        outcome
    }

    /// Best-effort title request for a session's first exchange. Failure
    /// keeps the default title and is never surfaced.
    async fn synthesize_title(
        &mut self,
        chat_id: &str,
        first_message: &str,
        backend: &dyn ChatBackend,
    ) {
        match backend.generate_once(&title_prompt(first_message)).await {
            Ok(raw) => {
                let title = strip_wrapping_quotes(raw.trim());
                if !title.is_empty() {
                    if let Some(session) = self.app.sessions.get_mut(chat_id) {
                        session.title = title.to_string();
                    }
                }
            }
            Err(err) => {
                debug!("title synthesis failed, keeping default: {err}");
            }
        }
    }
}

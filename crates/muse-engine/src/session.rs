//! Caller-side turn bookkeeping around the router.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use muse_contracts::events::{EventPayload, EventWriter};
use muse_contracts::{
    conversation::validate_message, ActionLog, ChatMessage, ChatRequest, ChatResponse,
    ConversationContext, ToolType, UserIntent,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::decision::Analysis;
use crate::router::Router;

pub const MISSING_TOKEN_REPLY: &str =
    "Please configure your Replicate API token to use AI features.";
pub const GENERIC_FAILURE_REPLY: &str =
    "I'm having trouble processing your request right now. Please try again.";

/// A live conversation: context, router and an optional audit trail.
pub struct ChatSession {
    context: ConversationContext,
    router: Router,
    events: Option<EventWriter>,
    pinned_image: Option<String>,
    turns: usize,
}

impl ChatSession {
    pub fn new(router: Router) -> Self {
        Self {
            context: ConversationContext::new(uuid::Uuid::new_v4().to_string()),
            router,
            events: None,
            pinned_image: None,
            turns: 0,
        }
    }

    /// Appends session events to `path` from now on.
    pub fn record_events(mut self, path: impl Into<PathBuf>) -> Self {
        self.events = Some(EventWriter::new(path, self.context.session_id.clone()));
        self
    }

    pub fn session_id(&self) -> &str {
        &self.context.session_id
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn turns(&self) -> usize {
        self.turns
    }

    pub fn emit(&self, event_type: &str, payload: Value) -> Result<()> {
        if let Some(events) = &self.events {
            events.emit(event_type, map_object(payload))?;
        }
        Ok(())
    }

    /// Runs one conversation turn. The reply, or an error reply when the
    /// collaborator fails, is appended to the context and returned. Only
    /// invalid input and event I/O produce `Err`, and then the context,
    /// turn count and pinned image are left as they were.
    pub fn send(&mut self, message: &str) -> Result<ChatMessage> {
        validate_message(message)?;

        let mut user_message = ChatMessage::user(message);
        user_message.image_url = self.pinned_image.clone();
        self.context.push(user_message);

        let outcome = match self.run_turn(message, &self.context) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.context.messages.pop();
                return Err(err);
            }
        };
        self.pinned_image = None;
        self.turns += 1;

        let reply = match outcome {
            Ok(reply) => {
                self.context.last_user_intent = reply
                    .action_log
                    .as_ref()
                    .map(|log| UserIntent::from(log.tool_used));
                reply
            }
            Err(error) => error_reply(message, &error),
        };
        self.context.push(reply.clone());
        Ok(reply)
    }

    /// Single API-shaped turn against the request's own context. The
    /// caller is expected to have appended the user message already.
    pub fn handle_request(&self, request: &ChatRequest) -> ChatResponse {
        if let Err(err) = request.validate() {
            return ChatResponse::failed(format!("Invalid request format: {err}"));
        }
        match self.run_turn(&request.message, &request.context) {
            Ok(Ok(reply)) => ChatResponse::ok(reply),
            Ok(Err(error)) => ChatResponse::failed(error),
            Err(err) => ChatResponse::failed(format!("{err:#}")),
        }
    }

    /// The outer `Err` is an event write failure; the inner one is the
    /// collaborator's error chain.
    fn run_turn(
        &self,
        input: &str,
        context: &ConversationContext,
    ) -> Result<std::result::Result<ChatMessage, String>> {
        let decision = self.router.engine().decide(input, context);
        if let Some(events) = &self.events {
            events.emit_decision(input, &decision)?;
        }

        match self.router.dispatch(&decision, input, context) {
            Ok(result) => {
                let reply = ChatMessage::assistant(input, &result);
                if let (Some(events), Some(log)) = (&self.events, reply.action_log.as_ref()) {
                    events.emit_action(log)?;
                }
                Ok(Ok(reply))
            }
            Err(err) => {
                let error = format!("{err:#}");
                warn!(%error, tool = %decision.tool, "collaborator failed");
                self.emit("turn_failed", json!({ "input": input, "error": error }))?;
                Ok(Err(error))
            }
        }
    }

    /// Scores `text` against the current context without dispatching.
    pub fn explain(&self, text: &str) -> Analysis {
        self.router.engine().analyze(text, &self.context)
    }

    /// Attaches an image to the next user message so an image turn picks it
    /// up as the previous image.
    pub fn use_image(&mut self, url: impl Into<String>) {
        self.pinned_image = Some(url.into());
    }

    pub fn pinned_image(&self) -> Option<&str> {
        self.pinned_image.as_deref()
    }

    pub fn reset(&mut self) {
        self.context.clear();
        self.pinned_image = None;
    }

    pub fn export(&self, path: &Path) -> Result<()> {
        self.context
            .save(path)
            .with_context(|| format!("failed to export conversation to {}", path.display()))
    }

    pub fn finish(&self) -> Result<()> {
        self.emit("session_finished", json!({ "turns": self.turns }))
    }
}

/// Reply shown in place of a failed collaborator result.
pub fn error_reply(input: &str, error: &str) -> ChatMessage {
    let content = if error.contains("REPLICATE_API_TOKEN") {
        MISSING_TOKEN_REPLY
    } else {
        GENERIC_FAILURE_REPLY
    };
    ChatMessage::assistant_with_log(
        content,
        None,
        ActionLog {
            tool_used: ToolType::Clarification,
            reasoning: "Error occurred during processing".to_string(),
            input: input.to_string(),
            output: "Error response".to_string(),
            model_used: Some("error-handler".to_string()),
            execution_time: Some(0),
        },
    )
}

fn map_object(value: Value) -> EventPayload {
    match value {
        Value::Object(map) => map,
        _ => EventPayload::new(),
    }
}

use std::fmt;
use std::path::Path;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tools::{ToolResult, ToolType};

pub const MAX_MESSAGE_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserIntent {
    Text,
    Image,
    Unclear,
}

impl From<ToolType> for UserIntent {
    fn from(tool: ToolType) -> Self {
        match tool {
            ToolType::TextGeneration => Self::Text,
            ToolType::ImageGeneration => Self::Image,
            ToolType::Clarification => Self::Unclear,
        }
    }
}

/// Audit record attached to an assistant reply. Built once, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLog {
    pub tool_used: ToolType,
    pub reasoning: String,
    pub input: String,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<u64>,
}

impl ActionLog {
    pub fn from_result(input: &str, result: &ToolResult) -> Self {
        Self {
            tool_used: result.kind,
            reasoning: result.reasoning.clone(),
            input: input.to_string(),
            output: result.content.clone(),
            model_used: Some(result.model_used.clone()),
            execution_time: Some(result.execution_time),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_log: Option<ActionLog>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            image_url: None,
            action_log: None,
        }
    }

    pub fn assistant(input: &str, result: &ToolResult) -> Self {
        Self::assistant_with_log(
            result.content.clone(),
            result.image_url.clone(),
            ActionLog::from_result(input, result),
        )
    }

    pub fn assistant_with_log(
        content: impl Into<String>,
        image_url: Option<String>,
        action_log: ActionLog,
    ) -> Self {
        Self {
            id: new_message_id(),
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            image_url,
            action_log: Some(action_log),
        }
    }

    pub fn tool_used(&self) -> Option<ToolType> {
        self.action_log.as_ref().map(|log| log.tool_used)
    }

    /// `"<role>: <content>"`, the form text backends receive as context.
    pub fn render_line(&self) -> String {
        format!("{}: {}", self.role, self.content)
    }
}

/// Conversation window supplied by the caller. Read-only to the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    pub messages: Vec<ChatMessage>,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_user_intent: Option<UserIntent>,
}

impl ConversationContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            session_id: session_id.into(),
            last_user_intent: None,
        }
    }

    pub fn with_messages(session_id: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Self::new(session_id)
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading context {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid conversation context in {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(self)?;
        std::fs::write(path, payload + "\n")
            .with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The last `n` messages, oldest first.
    pub fn recent(&self, n: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Image URL of the most recent message that carries one.
    pub fn last_image_url(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find_map(|message| message.image_url.as_deref())
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.last_user_intent = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("message is {len} characters; the limit is {max}")]
    MessageTooLong { len: usize, max: usize },
}

/// Body of a single chat turn: the new message plus the caller's context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub context: ConversationContext,
}

impl ChatRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        validate_message(&self.message)
    }
}

pub fn validate_message(message: &str) -> Result<(), RequestError> {
    let len = message.chars().count();
    if len == 0 {
        return Err(RequestError::EmptyMessage);
    }
    if len > MAX_MESSAGE_CHARS {
        return Err(RequestError::MessageTooLong {
            len,
            max: MAX_MESSAGE_CHARS,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn ok(message: ChatMessage) -> Self {
        Self {
            success: true,
            message: Some(message),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

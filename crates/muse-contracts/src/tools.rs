use std::fmt;

use serde::{Deserialize, Serialize};

/// The three collaborators a turn can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolType {
    TextGeneration,
    ImageGeneration,
    Clarification,
}

impl ToolType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TextGeneration => "text-generation",
            Self::ImageGeneration => "image-generation",
            Self::Clarification => "clarification",
        }
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing verdict for a single turn.
///
/// `reasoning` always embeds the score(s) that justified the choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDecision {
    pub tool: ToolType,
    pub confidence: f64,
    pub reasoning: String,
}

impl ToolDecision {
    pub fn new(tool: ToolType, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            tool,
            confidence,
            reasoning: reasoning.into(),
        }
    }
}

/// What a collaborator hands back. The router returns it untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    #[serde(rename = "type")]
    pub kind: ToolType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub reasoning: String,
    pub model_used: String,
    pub execution_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextGenerationRequest {
    pub prompt: String,
    /// Prior turns rendered as `"<role>: <content>"`, oldest first.
    pub context: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageGenerationRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClarificationRequest {
    pub user_input: String,
}

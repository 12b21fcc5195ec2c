//! Data shapes shared by the routing engine and its callers.

pub mod chat;
pub mod conversation;
pub mod events;
pub mod models;
pub mod tools;

pub use conversation::{
    ActionLog, ChatMessage, ChatRequest, ChatResponse, ConversationContext, RequestError, Role,
    UserIntent,
};
pub use tools::{
    ClarificationRequest, ImageGenerationRequest, TextGenerationRequest, ToolDecision,
    ToolResult, ToolType,
};

//! Model boundary for vox.
//!
//! Defines the conversation data model (messages, tool-invocation requests,
//! tool schemas), the tagged reply type the orchestrator branches on, and
//! the `AiClient` trait with a Gemini implementation (function calling via
//! the Generative Language API).

pub mod gemini;

use async_trait::async_trait;

pub use gemini::{GeminiClient, GeminiConfig};

/// Opaque language-model capability: full history plus tool schemas in,
/// one reply out. Implementations must not retain conversation state —
/// the caller owns the history.
#[async_trait]
pub trait AiClient: Send + Sync {
    async fn generate(
        &self,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelReply, AiError>;
}

/// One entry in the session's conversation log.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// A recognized user utterance.
    User { content: String },
    /// A model reply. `content` is `None` for pure tool-call messages;
    /// `tool_calls` holds the invocation requests in emission order.
    Assistant {
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// The outcome of one tool invocation, success or error text alike.
    /// `call_id` refers back to a request in the preceding assistant message.
    #[serde(rename = "tool")]
    ToolResult {
        call_id: String,
        tool_name: String,
        content: String,
    },
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Plain-text assistant reply with no tool-invocation requests.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Assistant message recording tool-invocation requests, with optional
    /// preamble text.
    pub fn tool_use(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content,
            tool_calls,
        }
    }

    pub fn tool_result(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::ToolResult {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            content: content.into(),
        }
    }

    /// Role tag, for logging and assertions.
    pub fn role(&self) -> &'static str {
        match self {
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
            Self::ToolResult { .. } => "tool",
        }
    }
}

/// A model-emitted instruction to invoke one tool.
///
/// Gemini does not assign ids to function calls, so the client mints a
/// fresh one per request; results refer back to it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Schema describing one callable tool, exposed to the model as part of
/// its available-actions catalog.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the argument object.
    pub parameters: serde_json::Value,
}

/// What the model produced for one request: a final text reply, or a batch
/// of tool-invocation requests to execute before asking again.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// Terminal reply text. May be empty; callers substitute a fallback.
    Text(String),
    /// One or more tool-invocation requests. `preamble` is accompanying
    /// text that is not shown to the user until the turn completes.
    ToolUse {
        preamble: Option<String>,
        calls: Vec<ToolCall>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Timeout")]
    Timeout,
}

impl AiError {
    /// Map a transport error, distinguishing timeouts from other failures.
    pub(crate) fn from_request(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::NetworkError(e.to_string())
        }
    }
}

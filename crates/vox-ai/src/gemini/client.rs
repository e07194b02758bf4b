//! Gemini API client struct, request building, and response parsing.

use tracing::debug;

use crate::{AiError, Message, ModelReply, ToolCall, ToolDefinition};

use super::config::GeminiConfig;

pub(crate) const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API client.
pub struct GeminiClient {
    pub(crate) config: GeminiConfig,
    pub(crate) http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    pub(crate) fn api_url(&self) -> String {
        format!("{}/{}:generateContent", GEMINI_API_BASE, self.config.model)
    }

    /// Build the JSON request body for the Gemini API.
    ///
    /// Consecutive tool results collapse into a single `user` content with
    /// one `functionResponse` part per result, preserving result order.
    pub(crate) fn build_request_body(
        &self,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> serde_json::Value {
        let mut contents: Vec<serde_json::Value> = Vec::new();
        let mut pending_results: Vec<serde_json::Value> = Vec::new();

        for msg in history {
            match msg {
                Message::ToolResult {
                    tool_name, content, ..
                } => {
                    pending_results.push(serde_json::json!({
                        "functionResponse": {
                            "name": tool_name,
                            "response": { "result": content }
                        }
                    }));
                }
                Message::User { content } => {
                    flush_results(&mut contents, &mut pending_results);
                    contents.push(serde_json::json!({
                        "role": "user",
                        "parts": [{ "text": content }]
                    }));
                }
                Message::Assistant {
                    content,
                    tool_calls,
                } => {
                    flush_results(&mut contents, &mut pending_results);
                    let mut parts = Vec::new();
                    if let Some(text) = content {
                        if !text.is_empty() {
                            parts.push(serde_json::json!({ "text": text }));
                        }
                    }
                    for call in tool_calls {
                        parts.push(serde_json::json!({
                            "functionCall": { "name": call.name, "args": call.arguments }
                        }));
                    }
                    contents.push(serde_json::json!({ "role": "model", "parts": parts }));
                }
            }
        }
        flush_results(&mut contents, &mut pending_results);

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": self.config.max_output_tokens,
                "temperature": self.config.temperature,
            }
        });

        if let Some(ref system) = self.config.system_prompt {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": system }]
            });
        }

        if !tools.is_empty() {
            let declarations: Vec<_> = tools.iter().map(function_declaration).collect();
            body["tools"] = serde_json::json!([{
                "functionDeclarations": declarations
            }]);
        }

        body
    }

    /// Parse a Gemini response into a tagged reply.
    pub(crate) fn parse_reply(&self, json: serde_json::Value) -> Result<ModelReply, AiError> {
        let candidates = json["candidates"]
            .as_array()
            .ok_or_else(|| AiError::ParseError("no candidates in response".to_string()))?;

        let first = candidates
            .first()
            .ok_or_else(|| AiError::ParseError("empty candidates".to_string()))?;

        let parts = first["content"]["parts"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        let mut text = String::new();
        let mut calls = Vec::new();

        for part in &parts {
            if let Some(t) = part["text"].as_str() {
                text.push_str(t);
            }
            if let Some(fc) = part.get("functionCall") {
                calls.push(ToolCall {
                    id: uuid::Uuid::new_v4().to_string(),
                    name: fc["name"].as_str().unwrap_or("").to_string(),
                    arguments: fc["args"].clone(),
                });
            }
        }

        if let Some(meta) = json.get("usageMetadata") {
            debug!(
                input_tokens = meta["promptTokenCount"].as_u64().unwrap_or(0),
                output_tokens = meta["candidatesTokenCount"].as_u64().unwrap_or(0),
                "Gemini token usage"
            );
        }

        if calls.is_empty() {
            Ok(ModelReply::Text(text))
        } else {
            let preamble = if text.trim().is_empty() {
                None
            } else {
                Some(text)
            };
            Ok(ModelReply::ToolUse { preamble, calls })
        }
    }
}

/// Append pending `functionResponse` parts as one `user` content.
fn flush_results(contents: &mut Vec<serde_json::Value>, pending: &mut Vec<serde_json::Value>) {
    if !pending.is_empty() {
        contents.push(serde_json::json!({
            "role": "user",
            "parts": std::mem::take(pending)
        }));
    }
}

/// Convert a tool definition to a Gemini function declaration.
fn function_declaration(tool: &ToolDefinition) -> serde_json::Value {
    serde_json::json!({
        "name": tool.name,
        "description": tool.description,
        "parameters": tool.parameters,
    })
}

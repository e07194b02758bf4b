//! Tool layer for Vox.
//!
//! Provides the callable tools the agent exposes to AI models:
//! - An ordered registry with overwrite-on-collision registration
//! - Local tools (browser, app launcher, sandboxed file access)
//! - External tool providers discovered over JSON-RPC stdio

pub mod local;
pub mod provider;
pub mod registry;
pub mod sandbox;

use async_trait::async_trait;

use vox_ai::ToolDefinition;

pub use provider::{discover_into, ProviderCommand, StdioToolProvider, ToolProvider};
pub use registry::ToolRegistry;
pub use sandbox::Sandbox;

/// A callable capability advertised to the model.
///
/// Arguments arrive as a JSON object of named parameters; the result is
/// always text, ready for inclusion in conversation history.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Schema advertised to the model.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the supplied arguments.
    async fn invoke(&self, arguments: serde_json::Value) -> Result<String, ToolError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Failed(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Provider error: {0}")]
    Provider(String),
}

//! External tool providers.
//!
//! A provider is a separate process serving tool descriptors and executions
//! over JSON-RPC stdio. Discovery runs once at startup and is best-effort: a
//! provider that fails or times out is skipped with a warning, leaving the
//! registry usable with whatever is already in it.

mod stdio;

pub use stdio::{ProviderCommand, StdioToolProvider};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{Tool, ToolError, ToolRegistry};

#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Provider name, used in logs.
    fn name(&self) -> &str;

    /// Connect to the provider and list its tools.
    async fn discover(&self) -> Result<Vec<Arc<dyn Tool>>, ToolError>;
}

/// Discover every provider's tools into `registry`, bounding each provider
/// by `timeout`. Failures and timeouts degrade to whatever is already
/// registered; discovery never aborts startup.
pub async fn discover_into(
    registry: &mut ToolRegistry,
    providers: &[Arc<dyn ToolProvider>],
    timeout: Duration,
) {
    for provider in providers {
        match tokio::time::timeout(timeout, provider.discover()).await {
            Ok(Ok(tools)) => {
                info!(
                    provider = provider.name(),
                    count = tools.len(),
                    "discovered provider tools"
                );
                for tool in tools {
                    registry.register(tool);
                }
            }
            Ok(Err(e)) => {
                warn!(provider = provider.name(), error = %e, "tool provider failed, skipping");
            }
            Err(_) => {
                warn!(provider = provider.name(), "tool provider timed out, skipping");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vox_ai::ToolDefinition;

    struct NullTool(&'static str);

    #[async_trait]
    impl Tool for NullTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.0.to_string(),
                description: String::new(),
                parameters: serde_json::json!({ "type": "object", "properties": {} }),
            }
        }

        async fn invoke(&self, _arguments: serde_json::Value) -> Result<String, ToolError> {
            Ok(String::new())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl ToolProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn discover(&self) -> Result<Vec<Arc<dyn Tool>>, ToolError> {
            Err(ToolError::Provider("connection refused".to_string()))
        }
    }

    struct StallingProvider;

    #[async_trait]
    impl ToolProvider for StallingProvider {
        fn name(&self) -> &str {
            "stalling"
        }

        async fn discover(&self) -> Result<Vec<Arc<dyn Tool>>, ToolError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    struct HealthyProvider;

    #[async_trait]
    impl ToolProvider for HealthyProvider {
        fn name(&self) -> &str {
            "healthy"
        }

        async fn discover(&self) -> Result<Vec<Arc<dyn Tool>>, ToolError> {
            Ok(vec![Arc::new(NullTool("remote_search")) as Arc<dyn Tool>])
        }
    }

    #[tokio::test]
    async fn failed_provider_leaves_registry_usable() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(NullTool("local_echo")));

        let providers: Vec<Arc<dyn ToolProvider>> =
            vec![Arc::new(FailingProvider), Arc::new(HealthyProvider)];
        discover_into(&mut registry, &providers, Duration::from_secs(1)).await;

        assert_eq!(registry.names(), vec!["local_echo", "remote_search"]);
    }

    #[tokio::test]
    async fn stalled_provider_times_out_and_is_skipped() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(NullTool("local_echo")));

        let providers: Vec<Arc<dyn ToolProvider>> = vec![Arc::new(StallingProvider)];
        discover_into(&mut registry, &providers, Duration::from_millis(100)).await;

        assert_eq!(registry.names(), vec!["local_echo"]);
    }
}

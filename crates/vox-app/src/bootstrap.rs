//! Registry assembly at startup.
//!
//! Provider tools are discovered first and local tools registered last, so
//! a local tool wins any name collision with a discovered one.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use vox_tools::local::local_tools;
use vox_tools::{
    discover_into, ProviderCommand, Sandbox, StdioToolProvider, ToolProvider, ToolRegistry,
};

use crate::config::{Credentials, ToolsConfig};

/// Build the tool registry for one session.
///
/// Discovery is best-effort: an unreachable or slow provider is skipped and
/// the session runs with whatever else registered.
pub async fn bootstrap_registry(
    sandbox: Arc<Sandbox>,
    tools: &ToolsConfig,
    credentials: &Credentials,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    let providers = session_providers(sandbox.root(), credentials);
    let timeout = Duration::from_secs(tools.discovery_timeout_secs);
    discover_into(&mut registry, &providers, timeout).await;

    for tool in local_tools(sandbox) {
        registry.register(tool);
    }

    debug!(names = ?registry.names(), "registry assembled");
    registry
}

/// Provider processes for the session: the filesystem server always, the
/// Tavily search server when its key is present.
fn session_providers(root: &Path, credentials: &Credentials) -> Vec<Arc<dyn ToolProvider>> {
    let mut providers: Vec<Arc<dyn ToolProvider>> = vec![Arc::new(StdioToolProvider::new(
        "filesystem",
        ProviderCommand::new(
            "npx",
            vec![
                "-y".to_string(),
                "@modelcontextprotocol/server-filesystem".to_string(),
                root.display().to_string(),
            ],
        ),
    ))];

    if let Some(key) = &credentials.tavily_api_key {
        providers.push(Arc::new(StdioToolProvider::new(
            "tavily",
            ProviderCommand::new(
                "npx",
                vec!["-y".to_string(), "@mcptools/mcp-tavily".to_string()],
            )
            .with_env("TAVILY_API_KEY", key),
        )));
    }

    providers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(tavily: Option<&str>) -> Credentials {
        Credentials {
            google_api_key: "test-key".to_string(),
            tavily_api_key: tavily.map(str::to_string),
        }
    }

    #[test]
    fn filesystem_provider_is_always_configured() {
        let providers = session_providers(Path::new("/srv/files"), &credentials(None));
        let names: Vec<_> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["filesystem"]);
    }

    #[test]
    fn tavily_provider_requires_its_key() {
        let providers = session_providers(Path::new("."), &credentials(Some("tvly-test")));
        let names: Vec<_> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["filesystem", "tavily"]);
    }
}

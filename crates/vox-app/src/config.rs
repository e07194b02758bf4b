//! TOML configuration and environment credentials.
//!
//! Settings live in an optional `config.toml` under the platform config
//! directory (or a `--config` override). Every field carries a default, so
//! a missing or partial file works. API keys are resolved from the
//! environment only and never appear in the file or in Debug output.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config read error: {0}")]
    ReadError(String),

    #[error("config parse error: {0}")]
    ParseError(String),
}

/// Model settings for the Gemini client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Gemini model identifier.
    pub name: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gemini-2.5-flash".to_string(),
            temperature: 0.7,
            max_output_tokens: 2048,
        }
    }
}

/// Turn orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Upper bound on tool-call rounds within one turn.
    pub max_tool_rounds: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { max_tool_rounds: 8 }
    }
}

/// Speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct SpeechConfig {
    /// Synthesizer command (e.g. `say`, `espeak`). Empty string means
    /// replies are printed instead of voiced.
    pub program: String,
    /// Extra arguments passed before the reply text.
    pub args: Vec<String>,
}

/// Tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Directory file tools are confined to.
    pub root: String,
    /// Per-provider discovery timeout in seconds.
    pub discovery_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            discovery_timeout_secs: 20,
        }
    }
}

/// Root configuration for Vox.
///
/// Only override what you want to change; everything else keeps its
/// default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct VoxConfig {
    pub model: ModelConfig,
    pub agent: AgentConfig,
    pub speech: SpeechConfig,
    pub tools: ToolsConfig,
}

/// Get the platform-specific default config file path.
///
/// On macOS: `~/Library/Application Support/vox/config.toml`
/// On Linux: `~/.config/vox/config.toml`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::ReadError("could not determine config directory".into()))?;
    Ok(config_dir.join("vox").join("config.toml"))
}

/// Load config from a specific TOML file path.
///
/// Deserializes the file using serde defaults for any missing fields.
pub fn load_from_path(path: &Path) -> Result<VoxConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(path.to_path_buf())
        } else {
            ConfigError::ReadError(format!("failed to read {}: {e}", path.display()))
        }
    })?;

    let config: VoxConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// If the file does not exist, returns defaults with a log line.
pub fn load_default() -> Result<VoxConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            info!("no config found at {}, using defaults", path.display());
            Ok(VoxConfig::default())
        }
        other => other,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("GOOGLE_API_KEY is not set; the model backend cannot be reached")]
    MissingGoogleKey,
}

/// API credentials, resolved from the environment only.
#[derive(Clone)]
pub struct Credentials {
    pub google_api_key: String,
    pub tavily_api_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("google_api_key", &"[REDACTED]")
            .field(
                "tavily_api_key",
                &self.tavily_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Credentials {
    /// Resolve credentials from the environment.
    ///
    /// `GOOGLE_API_KEY` is required. `TAVILY_API_KEY` is optional and
    /// enables the web-search tool provider. Empty values count as unset.
    pub fn from_env() -> Result<Self, CredentialsError> {
        let google_api_key = std::env::var("GOOGLE_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(CredentialsError::MissingGoogleKey)?;
        let tavily_api_key = std::env::var("TAVILY_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        Ok(Self {
            google_api_key,
            tavily_api_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = VoxConfig::default();
        assert_eq!(config.model.name, "gemini-2.5-flash");
        assert!((config.model.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.model.max_output_tokens, 2048);
        assert_eq!(config.agent.max_tool_rounds, 8);
        assert!(config.speech.program.is_empty());
        assert!(config.speech.args.is_empty());
        assert_eq!(config.tools.root, ".");
        assert_eq!(config.tools.discovery_timeout_secs, 20);
    }

    #[test]
    fn empty_toml_gives_all_defaults() {
        let config: VoxConfig = toml::from_str("").unwrap();
        assert_eq!(config.model.name, "gemini-2.5-flash");
        assert_eq!(config.agent.max_tool_rounds, 8);
        assert_eq!(config.tools.root, ".");
    }

    #[test]
    fn partial_toml_preserves_sibling_defaults() {
        let toml_str = r#"
[model]
name = "gemini-2.0-pro"

[tools]
root = "/srv/files"
"#;
        let config: VoxConfig = toml::from_str(toml_str).unwrap();
        // Overridden values
        assert_eq!(config.model.name, "gemini-2.0-pro");
        assert_eq!(config.tools.root, "/srv/files");
        // Defaults preserved
        assert!((config.model.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.agent.max_tool_rounds, 8);
        assert_eq!(config.tools.discovery_timeout_secs, 20);
    }

    #[test]
    fn speech_section_in_toml() {
        let toml_str = r#"
[speech]
program = "espeak"
args = ["-s", "150"]
"#;
        let config: VoxConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.speech.program, "espeak");
        assert_eq!(config.speech.args, vec!["-s", "150"]);
    }

    #[test]
    fn toml_serialization_roundtrip() {
        let config = VoxConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: VoxConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized.model.name, config.model.name);
        assert_eq!(deserialized.agent.max_tool_rounds, config.agent.max_tool_rounds);
        assert_eq!(deserialized.tools.root, config.tools.root);
    }

    #[test]
    fn load_from_path_reads_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent]\nmax_tool_rounds = 3\n").unwrap();

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.agent.max_tool_rounds, 3);
        assert_eq!(config.model.name, "gemini-2.5-flash");
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from_path(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[model\nname = ").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let credentials = Credentials {
            google_api_key: "AIzaSyExample".to_string(),
            tavily_api_key: Some("tvly-example".to_string()),
        };
        let debug = format!("{credentials:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("AIzaSyExample"));
        assert!(!debug.contains("tvly-example"));
    }
}

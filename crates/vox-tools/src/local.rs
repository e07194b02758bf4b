//! Locally implemented tools: browser, app launcher, sandboxed file access.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use vox_ai::ToolDefinition;

use crate::sandbox::Sandbox;
use crate::{Tool, ToolError};

/// Reads are capped so one tool result cannot flood the conversation.
const MAX_READ_CHARS: usize = 8_000;

/// The locally implemented tools, in registration order.
pub fn local_tools(sandbox: Arc<Sandbox>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(OpenBrowserTool),
        Arc::new(OpenAppTool),
        Arc::new(ReadFileTool::new(Arc::clone(&sandbox))),
        Arc::new(WriteFileTool::new(Arc::clone(&sandbox))),
        Arc::new(ListDirectoryTool::new(sandbox)),
    ]
}

/// Extract a required string argument from a tool-call payload.
fn required_str<'a>(arguments: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing required '{key}'")))
}

/// Opens a website in the system default browser.
pub struct OpenBrowserTool;

#[async_trait]
impl Tool for OpenBrowserTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "open_browser".to_string(),
            description: "Open a website in the default browser.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "The URL to open (https:// is assumed when no scheme is given)"
                    }
                },
                "required": ["url"]
            }),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let url = required_str(&arguments, "url")?;
        let url = if url.starts_with("http") {
            url.to_string()
        } else {
            format!("https://{url}")
        };

        webbrowser::open(&url)
            .map_err(|e| ToolError::Failed(format!("Failed to open browser: {e}")))?;
        info!(%url, "opened browser");
        Ok(format!("Browser opened to {url}"))
    }
}

/// Launches a desktop application by friendly name.
pub struct OpenAppTool;

#[cfg(target_os = "windows")]
fn app_command(name: &str) -> (String, Vec<String>) {
    let target = match name.to_lowercase().as_str() {
        "notepad" => "notepad",
        "calculator" => "calc",
        "chrome" => "chrome",
        "edge" => "msedge",
        "command prompt" => "cmd",
        "excel" => "excel",
        "word" => "winword",
        _ => name,
    };
    (
        "cmd".to_string(),
        vec![
            "/C".to_string(),
            "start".to_string(),
            String::new(),
            target.to_string(),
        ],
    )
}

#[cfg(target_os = "macos")]
fn app_command(name: &str) -> (String, Vec<String>) {
    let target = match name.to_lowercase().as_str() {
        "notepad" | "notes" => "Notes",
        "calculator" => "Calculator",
        "chrome" => "Google Chrome",
        "terminal" | "command prompt" => "Terminal",
        _ => name,
    };
    ("open".to_string(), vec!["-a".to_string(), target.to_string()])
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn app_command(name: &str) -> (String, Vec<String>) {
    let key = name.to_lowercase();
    let target = match key.as_str() {
        "notepad" | "text editor" => "gedit",
        "calculator" => "gnome-calculator",
        "chrome" => "google-chrome",
        "files" | "file manager" => "nautilus",
        "terminal" | "command prompt" => "gnome-terminal",
        _ => &key,
    };
    (target.to_string(), Vec::new())
}

#[async_trait]
impl Tool for OpenAppTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "open_app".to_string(),
            description: "Launch a desktop application (notepad, calculator, chrome, etc.)."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Friendly application name"
                    }
                },
                "required": ["name"]
            }),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let name = required_str(&arguments, "name")?;
        let (program, args) = app_command(name);

        // The child is detached on purpose; the launched app outlives us.
        tokio::process::Command::new(&program)
            .args(&args)
            .spawn()
            .map_err(|e| ToolError::Failed(format!("Failed to open {name}: {e}")))?;
        info!(app = %name, %program, "launched application");
        Ok(format!("Launched {name}"))
    }
}

/// Reads a text file inside the sandbox.
pub struct ReadFileTool {
    sandbox: Arc<Sandbox>,
}

impl ReadFileTool {
    pub fn new(sandbox: Arc<Sandbox>) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "read_file".to_string(),
            description: "Read the contents of a file.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path to the file, relative to the allowed directory"
                    }
                },
                "required": ["path"]
            }),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let path = self.sandbox.resolve(required_str(&arguments, "path")?)?;
        let bytes = tokio::fs::read(&path).await?;
        let content = String::from_utf8_lossy(&bytes);

        let total = content.chars().count();
        if total > MAX_READ_CHARS {
            let truncated: String = content.chars().take(MAX_READ_CHARS).collect();
            Ok(format!(
                "{truncated}\n... [truncated, {} more characters]",
                total - MAX_READ_CHARS
            ))
        } else {
            Ok(content.into_owned())
        }
    }
}

/// Writes a text file inside the sandbox, creating it if needed.
pub struct WriteFileTool {
    sandbox: Arc<Sandbox>,
}

impl WriteFileTool {
    pub fn new(sandbox: Arc<Sandbox>) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "write_file".to_string(),
            description: "Write content to a file, creating it if it doesn't exist.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path to the file, relative to the allowed directory"
                    },
                    "content": {
                        "type": "string",
                        "description": "Content to write"
                    }
                },
                "required": ["path", "content"]
            }),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let path = self.sandbox.resolve(required_str(&arguments, "path")?)?;
        let content = required_str(&arguments, "content")?;

        tokio::fs::write(&path, content).await?;
        Ok(format!("Wrote {} bytes to {}", content.len(), path.display()))
    }
}

/// Lists a directory inside the sandbox.
pub struct ListDirectoryTool {
    sandbox: Arc<Sandbox>,
}

impl ListDirectoryTool {
    pub fn new(sandbox: Arc<Sandbox>) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_directory".to_string(),
            description: "List files and directories at a given path.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Directory path, relative to the allowed directory"
                    }
                },
                "required": ["path"]
            }),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let path = self.sandbox.resolve(required_str(&arguments, "path")?)?;

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().await?.is_dir() {
                name.push('/');
            }
            names.push(name);
        }
        names.sort();

        if names.is_empty() {
            Ok("(empty directory)".to_string())
        } else {
            Ok(names.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandboxed() -> (tempfile::TempDir, Arc<Sandbox>) {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = Arc::new(Sandbox::new(dir.path()).unwrap());
        (dir, sandbox)
    }

    #[tokio::test]
    async fn open_browser_requires_url() {
        let err = OpenBrowserTool
            .invoke(serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    #[test]
    fn app_aliases_are_case_insensitive() {
        let (program, args) = app_command("Calculator");
        assert_eq!(program, "gnome-calculator");
        assert!(args.is_empty());
    }

    #[tokio::test]
    async fn write_then_read() {
        let (_dir, sandbox) = sandboxed();
        let write = WriteFileTool::new(Arc::clone(&sandbox));
        let read = ReadFileTool::new(sandbox);

        let reply = write
            .invoke(serde_json::json!({ "path": "note.txt", "content": "remember this" }))
            .await
            .unwrap();
        assert!(reply.starts_with("Wrote 13 bytes"));

        let content = read
            .invoke(serde_json::json!({ "path": "note.txt" }))
            .await
            .unwrap();
        assert_eq!(content, "remember this");
    }

    #[tokio::test]
    async fn read_caps_large_files() {
        let (_dir, sandbox) = sandboxed();
        std::fs::write(sandbox.root().join("big.txt"), "x".repeat(MAX_READ_CHARS + 50)).unwrap();

        let content = ReadFileTool::new(sandbox)
            .invoke(serde_json::json!({ "path": "big.txt" }))
            .await
            .unwrap();
        assert!(content.contains("[truncated, 50 more characters]"));
    }

    #[tokio::test]
    async fn read_outside_sandbox_is_denied() {
        let (_dir, sandbox) = sandboxed();

        let err = ReadFileTool::new(sandbox)
            .invoke(serde_json::json!({ "path": "/etc/hostname" }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Access denied"));
    }

    #[tokio::test]
    async fn list_marks_directories() {
        let (_dir, sandbox) = sandboxed();
        std::fs::create_dir(sandbox.root().join("sub")).unwrap();
        std::fs::write(sandbox.root().join("plain.txt"), "").unwrap();

        let listing = ListDirectoryTool::new(sandbox)
            .invoke(serde_json::json!({ "path": "." }))
            .await
            .unwrap();
        assert_eq!(listing, "plain.txt\nsub/");
    }
}

//! JSON-RPC stdio transport for tool providers.
//!
//! Spawns the provider process, performs the `initialize` handshake, lists
//! its tools, and wraps each one as a [`Tool`] whose `invoke` issues a
//! `tools/call` through the shared connection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::debug;

use vox_ai::ToolDefinition;

use crate::provider::ToolProvider;
use crate::{Tool, ToolError};

const JSONRPC_VERSION: &str = "2.0";
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Capacity of the channel feeding the writer task.
const CHANNEL_CAPACITY: usize = 128;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How a provider process is launched.
#[derive(Debug, Clone)]
pub struct ProviderCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables, added on top of the inherited ones.
    pub env: Vec<(String, String)>,
}

impl ProviderCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// A tool provider reached by spawning a server process and speaking
/// line-delimited JSON-RPC over its stdio.
pub struct StdioToolProvider {
    name: String,
    command: ProviderCommand,
    request_timeout: Duration,
}

impl StdioToolProvider {
    pub fn new(name: impl Into<String>, command: ProviderCommand) -> Self {
        Self {
            name: name.into(),
            command,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[async_trait]
impl ToolProvider for StdioToolProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn discover(&self) -> Result<Vec<Arc<dyn Tool>>, ToolError> {
        let client = Arc::new(RpcClient::spawn(&self.command)?);

        client
            .request(
                "initialize",
                serde_json::json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "clientInfo": { "name": "vox", "version": env!("CARGO_PKG_VERSION") },
                    "capabilities": {}
                }),
                self.request_timeout,
            )
            .await?;
        client
            .notify("notifications/initialized", serde_json::json!({}))
            .await?;

        let listed = client
            .request("tools/list", serde_json::json!({}), self.request_timeout)
            .await?;
        let specs = parse_tool_list(&listed)?;

        Ok(specs
            .into_iter()
            .map(|spec| {
                Arc::new(RemoteTool {
                    provider: self.name.clone(),
                    spec,
                    client: Arc::clone(&client),
                    request_timeout: self.request_timeout,
                }) as Arc<dyn Tool>
            })
            .collect())
    }
}

/// One tool listed by a provider, proxying `invoke` over the connection.
struct RemoteTool {
    provider: String,
    spec: RemoteToolSpec,
    client: Arc<RpcClient>,
    request_timeout: Duration,
}

#[async_trait]
impl Tool for RemoteTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.spec.name.clone(),
            description: self.spec.description.clone(),
            parameters: self.spec.input_schema.clone(),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        debug!(provider = %self.provider, tool = %self.spec.name, "calling provider tool");
        let result = self
            .client
            .request(
                "tools/call",
                serde_json::json!({
                    "name": self.spec.name,
                    "arguments": arguments,
                }),
                self.request_timeout,
            )
            .await?;

        let text = render_call_result(&result);
        if result["isError"].as_bool().unwrap_or(false) {
            return Err(ToolError::Failed(text));
        }
        Ok(text)
    }
}

#[derive(Debug)]
struct RemoteToolSpec {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

/// Extract tool specs from a `tools/list` result.
fn parse_tool_list(result: &serde_json::Value) -> Result<Vec<RemoteToolSpec>, ToolError> {
    let tools = result["tools"]
        .as_array()
        .ok_or_else(|| ToolError::Provider("tools/list result has no tools array".to_string()))?;

    Ok(tools
        .iter()
        .filter_map(|t| {
            let name = t["name"].as_str()?;
            Some(RemoteToolSpec {
                name: name.to_string(),
                description: t["description"].as_str().unwrap_or("").to_string(),
                input_schema: if t["inputSchema"].is_object() {
                    t["inputSchema"].clone()
                } else {
                    serde_json::json!({ "type": "object", "properties": {} })
                },
            })
        })
        .collect())
}

/// Flatten a `tools/call` result's content blocks to plain text.
fn render_call_result(result: &serde_json::Value) -> String {
    let mut out = String::new();
    if let Some(content) = result["content"].as_array() {
        for block in content {
            if let Some(text) = block["text"].as_str() {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(text);
            }
        }
    }
    if out.is_empty() {
        result.to_string()
    } else {
        out
    }
}

type PendingMap = Arc<Mutex<HashMap<i64, oneshot::Sender<serde_json::Value>>>>;

/// Line-delimited JSON-RPC client over a child process's stdio.
struct RpcClient {
    // Held so the process lives as long as the connection; killed on drop.
    _child: tokio::process::Child,
    outgoing: mpsc::Sender<serde_json::Value>,
    pending: PendingMap,
    next_id: AtomicI64,
    /// Set by the reader task when the provider's stdout closes.
    closed: Arc<AtomicBool>,
}

impl RpcClient {
    fn spawn(command: &ProviderCommand) -> Result<Self, ToolError> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ToolError::Provider(format!("failed to spawn '{}': {e}", command.program))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ToolError::Provider("failed to capture child stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolError::Provider("failed to capture child stdout".to_string()))?;

        let (outgoing, mut outgoing_rx) = mpsc::channel::<serde_json::Value>(CHANNEL_CAPACITY);

        // Writer task: one JSON-RPC message per line.
        tokio::spawn(async move {
            while let Some(msg) = outgoing_rx.recv().await {
                let mut line = msg.to_string();
                line.push('\n');
                if stdin.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if stdin.flush().await.is_err() {
                    break;
                }
            }
        });

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));

        // Reader task: route responses to their waiting requests by id.
        // When the provider's stdout closes, mark the connection closed and
        // drop every pending sender so waiting requests fail immediately
        // instead of sitting out their timeout.
        let reader_pending = Arc::clone(&pending);
        let reader_closed = Arc::clone(&closed);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let msg: serde_json::Value = match serde_json::from_str(&line) {
                    Ok(v) => v,
                    Err(e) => {
                        debug!(error = %e, "skipping non-JSON line from provider");
                        continue;
                    }
                };
                // Server-initiated requests and notifications carry no
                // integer id we issued; ignore them.
                let Some(id) = msg["id"].as_i64() else {
                    continue;
                };
                if let Some(tx) = reader_pending.lock().await.remove(&id) {
                    let _ = tx.send(msg);
                }
            }
            reader_closed.store(true, Ordering::SeqCst);
            reader_pending.lock().await.clear();
        });

        Ok(Self {
            _child: child,
            outgoing,
            pending,
            next_id: AtomicI64::new(1),
            closed,
        })
    }

    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
        timeout: Duration,
    ) -> Result<serde_json::Value, ToolError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ToolError::Provider("provider connection closed".to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();

        // Register before sending so an immediate response cannot be lost.
        self.pending.lock().await.insert(id, tx);

        let msg = serde_json::json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": id,
            "method": method,
            "params": params,
        });
        if self.outgoing.send(msg).await.is_err() {
            self.pending.lock().await.remove(&id);
            return Err(ToolError::Provider("provider connection closed".to_string()));
        }

        let response = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(msg)) => msg,
            Ok(Err(_)) => {
                return Err(ToolError::Provider(
                    "provider closed before replying".to_string(),
                ));
            }
            Err(_) => {
                self.pending.lock().await.remove(&id);
                return Err(ToolError::Provider(format!("request '{method}' timed out")));
            }
        };

        if let Some(err) = response.get("error") {
            let message = err["message"].as_str().unwrap_or("unknown error");
            return Err(ToolError::Provider(format!("{method}: {message}")));
        }
        Ok(response["result"].clone())
    }

    async fn notify(&self, method: &str, params: serde_json::Value) -> Result<(), ToolError> {
        let msg = serde_json::json!({
            "jsonrpc": JSONRPC_VERSION,
            "method": method,
            "params": params,
        });
        self.outgoing
            .send(msg)
            .await
            .map_err(|_| ToolError::Provider("provider connection closed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tool_list_reads_specs() {
        let result = serde_json::json!({
            "tools": [
                {
                    "name": "search",
                    "description": "Web search",
                    "inputSchema": { "type": "object", "properties": { "query": { "type": "string" } } }
                },
                { "name": "bare" }
            ]
        });

        let specs = parse_tool_list(&result).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "search");
        assert_eq!(specs[0].description, "Web search");
        assert_eq!(specs[1].name, "bare");
        assert_eq!(specs[1].description, "");
        assert!(specs[1].input_schema.is_object());
    }

    #[test]
    fn parse_tool_list_without_tools_is_error() {
        let err = parse_tool_list(&serde_json::json!({})).unwrap_err();
        assert!(matches!(err, ToolError::Provider(_)));
    }

    #[test]
    fn render_joins_text_blocks() {
        let result = serde_json::json!({
            "content": [
                { "type": "text", "text": "first" },
                { "type": "text", "text": "second" }
            ]
        });
        assert_eq!(render_call_result(&result), "first\nsecond");
    }

    #[test]
    fn render_falls_back_to_raw_json() {
        let result = serde_json::json!({ "content": [] });
        assert_eq!(render_call_result(&result), r#"{"content":[]}"#);
    }

    // A scripted shell stand-in for a provider process: answers the
    // handshake, lists one tool, and serves one call.
    #[cfg(unix)]
    const FAKE_SERVER: &str = concat!(
        r#"read -r a && printf '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05"}}\n'; "#,
        r#"read -r b; "#,
        r#"read -r c && printf '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"greet","description":"Greets","inputSchema":{"type":"object","properties":{}}}]}}\n'; "#,
        r#"read -r d && printf '{"jsonrpc":"2.0","id":3,"result":{"content":[{"type":"text","text":"hello from provider"}]}}\n'; "#,
        r#"cat > /dev/null"#,
    );

    #[cfg(unix)]
    #[tokio::test]
    async fn discover_and_invoke_over_stdio() {
        let command = ProviderCommand::new("sh", vec!["-c".to_string(), FAKE_SERVER.to_string()]);
        let provider = StdioToolProvider::new("fake", command)
            .with_request_timeout(Duration::from_secs(5));

        let tools = provider.discover().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].definition().name, "greet");
        assert_eq!(tools[0].definition().description, "Greets");

        let reply = tools[0].invoke(serde_json::json!({})).await.unwrap();
        assert_eq!(reply, "hello from provider");
    }

    // Answers the handshake and tool list, then exits, leaving the
    // connection dead before any call arrives.
    #[cfg(unix)]
    const DYING_SERVER: &str = concat!(
        r#"read -r a && printf '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05"}}\n'; "#,
        r#"read -r b; "#,
        r#"read -r c && printf '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"greet","description":"Greets","inputSchema":{"type":"object","properties":{}}}]}}\n'"#,
    );

    #[cfg(unix)]
    #[tokio::test]
    async fn dead_provider_fails_calls_without_waiting_out_the_timeout() {
        let command = ProviderCommand::new("sh", vec!["-c".to_string(), DYING_SERVER.to_string()]);
        let provider = StdioToolProvider::new("dying", command);

        let tools = provider.discover().await.unwrap();
        assert_eq!(tools.len(), 1);

        // Give the process exit time to reach the reader task.
        tokio::time::sleep(Duration::from_millis(200)).await;

        let result =
            tokio::time::timeout(Duration::from_secs(2), tools[0].invoke(serde_json::json!({})))
                .await
                .expect("call against a dead provider should fail fast");
        assert!(matches!(result, Err(ToolError::Provider(_))));
    }

    #[tokio::test]
    async fn unspawnable_provider_is_an_error() {
        let command = ProviderCommand::new("vox-no-such-binary", Vec::new());
        let provider = StdioToolProvider::new("missing", command);

        let result = provider.discover().await;
        assert!(matches!(result, Err(ToolError::Provider(_))));
    }
}

mod bootstrap;
mod cli;
mod config;
mod prompt;
mod session_loop;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use vox_agent::{SessionMemory, TurnOrchestrator};
use vox_ai::{GeminiClient, GeminiConfig};
use vox_speech::{CommandSpeaker, ConsoleInput, ConsolePrinter, SpeechInput, SpeechOutput};
use vox_tools::Sandbox;

use session_loop::{LoopOutcome, SessionLoop};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    let args = cli::parse();

    let log_directive = args.log_level.as_deref().unwrap_or("vox=info");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| "vox=info".parse().unwrap()),
            ),
        )
        .init();

    tracing::info!("Vox v{} starting...", env!("CARGO_PKG_VERSION"));

    let credentials = match config::Credentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // An explicit --config must load; the ambient default file is optional.
    let config = match &args.config {
        Some(path) => match config::load_from_path(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to load config {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => config::load_default().unwrap_or_else(|e| {
            tracing::warn!("Config load failed, using defaults: {e}");
            config::VoxConfig::default()
        }),
    };
    tracing::info!("Config loaded (model: {})", config.model.name);

    let root = args
        .root
        .clone()
        .unwrap_or_else(|| config.tools.root.clone());
    let sandbox = match Sandbox::new(&root) {
        Ok(sandbox) => Arc::new(sandbox),
        Err(e) => {
            tracing::error!("Tool root '{root}' is unusable: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("File tools rooted at {}", sandbox.root().display());

    let registry =
        bootstrap::bootstrap_registry(Arc::clone(&sandbox), &config.tools, &credentials).await;
    tracing::info!("Tool registry ready ({} tools)", registry.len());

    let gemini = GeminiConfig::new(credentials.google_api_key)
        .with_model(config.model.name.clone())
        .with_temperature(config.model.temperature)
        .with_max_output_tokens(config.model.max_output_tokens)
        .with_system_prompt(prompt::system_prompt(sandbox.root()));
    let client = GeminiClient::new(gemini);

    let orchestrator = TurnOrchestrator::new(Box::new(client), registry)
        .with_max_tool_rounds(config.agent.max_tool_rounds);
    let memory = SessionMemory::new();

    tracing::info!("Say 'exit', 'stop', 'quit', or 'goodbye' to end the session");

    let outcome = if args.text {
        run_session(ConsoleInput::new(), ConsolePrinter, orchestrator, memory).await
    } else if !config.speech.program.is_empty() {
        let speaker =
            CommandSpeaker::new(config.speech.program.as_str(), config.speech.args.clone());
        run_session(ConsoleInput::new(), speaker, orchestrator, memory).await
    } else {
        tracing::info!("No synthesizer configured, printing replies");
        run_session(ConsoleInput::new(), ConsolePrinter, orchestrator, memory).await
    };

    tracing::info!("Session ended ({outcome:?})");
    ExitCode::SUCCESS
}

/// Drive one session to completion, letting Ctrl-C end it from outside.
async fn run_session<I, O>(
    input: I,
    output: O,
    orchestrator: TurnOrchestrator,
    memory: SessionMemory,
) -> LoopOutcome
where
    I: SpeechInput,
    O: SpeechOutput,
{
    let session = SessionLoop::new(input, output, orchestrator, memory);
    tokio::select! {
        outcome = session.run() => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received");
            LoopOutcome::Interrupted
        }
    }
}

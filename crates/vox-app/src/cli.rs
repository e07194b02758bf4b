use clap::Parser;

/// Vox — a voice-driven assistant with tool calling.
#[derive(Parser, Debug)]
#[command(name = "vox", version, about)]
pub struct Args {
    /// Directory file tools are allowed to work in.
    #[arg(short = 'r', long)]
    pub root: Option<String>,

    /// Type utterances and read replies instead of speaking them.
    #[arg(long)]
    pub text: bool,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}

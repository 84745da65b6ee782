use std::path::PathBuf;

use clap::Parser;
use kbchat_domain::Preset;

#[derive(Parser, Debug)]
#[command(name = "kbchat", version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Path to the TOML configuration file. A missing file is not an error.
    #[arg(long, short = 'c', default_value = "kbchat.toml")]
    pub config: PathBuf,

    /// Treatment preset overriding the configured one: plain, vanilla, rag
    /// or rag-cot.
    #[arg(long, short = 't')]
    pub treatment: Option<Preset>,

    /// Direct prompt to process without entering interactive mode.
    #[arg(long, short = 'p')]
    pub prompt: Option<String>,

    /// Enable verbose logging on stderr.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

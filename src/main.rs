//! exeprobe - interactive PE image console
//!
//! Usage:
//!   exeprobe <FILE>                  Open FILE and read commands from stdin
//!   exeprobe <FILE> --config cfg.json
//!   exeprobe <FILE> --log-json       Structured diagnostics on stderr

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use exeprobe::logging::{init_tracing, init_tracing_json};
use exeprobe::{CmdContext, Commander, CommanderConfig, Console, ExeCmdContext, PeImage};

#[derive(Parser)]
#[command(name = "exeprobe")]
#[command(about = "Inspect and patch PE executables from an interactive console", long_about = None)]
struct Cli {
    /// Path to the executable image
    file: PathBuf,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit diagnostics as JSON
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.log_json {
        init_tracing_json();
    } else {
        init_tracing();
    }

    let config = match &cli.config {
        Some(path) => CommanderConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CommanderConfig::default(),
    };

    let image = PeImage::load(&cli.file, config.io.clone())
        .with_context(|| format!("Failed to load {}", cli.file.display()))?;
    info!(path = %cli.file.display(), "Image ready");

    let mut exe_ctx = ExeCmdContext::new(Some(image), Some(cli.file.clone()));
    exe_ctx.fetch_size = config.fetch_size;
    let mut context = CmdContext::Exe(exe_ctx);

    let commander = Commander::for_exe(&config);
    let mut console = Console::stdio();
    commander.run(&mut context, &mut console)?;
    Ok(())
}

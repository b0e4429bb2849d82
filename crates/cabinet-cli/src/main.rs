mod cli;
mod cmd;
mod config_gen;
mod dispatch;
mod format;
mod prompt;
mod table;

use clap::Parser;

use cabinet_core::config::{self, CabinetConfig};

use cli::{Cli, Commands};
use config_gen::run_config_generate;
use dispatch::{dispatch_command, Context};

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // `config` writes a starter file and needs no existing config.
    if let Some(Commands::Config { dest }) = &cli.command {
        if let Err(e) = run_config_generate(dest.as_deref()) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        return;
    }

    let config = match config::resolve_config_path(cli.config.as_deref()) {
        Some(source) => {
            tracing::info!("Using config: {source}");
            match config::load_config(source.path()) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
        None => {
            tracing::debug!("no config file found, using defaults");
            CabinetConfig::default()
        }
    };

    let ctx = Context::new(config, cli.root.clone());
    let command = cli.command.unwrap_or(Commands::List { verbose: false });
    if let Err(e) = dispatch_command(&command, &ctx) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

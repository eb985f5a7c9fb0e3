// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Nexos - a WhatsApp chat-bot gateway.
//!
//! This is the binary entry point for the Nexos gateway.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod cli;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nexos_config::NexosConfig;

/// Nexos - a WhatsApp chat-bot gateway.
#[derive(Parser, Debug)]
#[command(name = "nexos", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway (the default).
    Serve,
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// List every command token the bot answers to.
    Commands,
    /// Manage the stored WhatsApp session.
    Auth {
        #[command(subcommand)]
        action: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate configuration, then print a summary.
    Check,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Forget stored credentials so the next start issues a new QR code.
    Reset,
}

fn load_config(path: Option<&PathBuf>) -> NexosConfig {
    let loaded = match path {
        Some(path) => nexos_config::load_and_validate_path(path),
        None => nexos_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            nexos_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Config {
            action: ConfigCommand::Check,
        } => {
            cli::print_config_summary(&config);
            Ok(())
        }
        Commands::Commands => cli::list_commands(&config),
        Commands::Auth {
            action: AuthCommand::Reset,
        } => cli::reset_auth(&config).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports the epoch/stats interface.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_is_the_default_subcommand() {
        let cli = Cli::try_parse_from(["nexos"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["nexos", "auth", "reset", "--config", "/tmp/n.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Auth {
                action: AuthCommand::Reset
            })
        ));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/n.toml")));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = nexos_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.bot.name, "nexos");
    }
}

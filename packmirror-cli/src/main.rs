//! packmirror: mirrors mod folders into backups while the game is closed.
//!
//! # Usage
//!
//! ```text
//! packmirror [run] [--autostart] [--detach]
//! packmirror setup
//! packmirror mirror [--json]
//! packmirror check
//! packmirror autostart enable|disable
//! packmirror config show|path|set-target [PATH]
//! packmirror logs [--lines N]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    autostart::AutostartCommand, check::CheckArgs, config::ConfigCommand, logs::LogsArgs,
    mirror::MirrorArgs, run::RunArgs, setup::SetupArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "packmirror",
    version,
    about = "Mirror gunpack and redux folders into backups while the game is not running",
    long_about = None,
)]
struct Cli {
    /// Write app.log as one JSON object per line.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the copy loop until interrupted (default).
    Run(RunArgs),

    /// Prompt for the mirrored directories and save config.json.
    Setup(SetupArgs),

    /// Run one cycle now: liveness check, then every pair if clear.
    Mirror(MirrorArgs),

    /// Report whether the target application is running.
    Check(CheckArgs),

    /// Register or remove login autostart.
    Autostart {
        #[command(subcommand)]
        command: AutostartCommand,
    },

    /// Inspect the persisted configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Print the tail of app.log.
    Logs(LogsArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_json = cli.log_json;
    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => args.run(log_json),
        Commands::Setup(args) => args.run(log_json),
        Commands::Mirror(args) => args.run(log_json),
        Commands::Check(args) => args.run(log_json),
        Commands::Autostart { command } => commands::autostart::run(command, log_json),
        Commands::Config { command } => commands::config::run(command),
        Commands::Logs(args) => args.run(),
    }
}

//! `packmirror autostart enable|disable`

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use packmirror_core::config as app_config;
use packmirror_daemon::{disable_autostart, enable_autostart};

use super::{home, quiet_sink};

#[derive(Subcommand, Debug)]
pub enum AutostartCommand {
    /// Start `packmirror run --autostart` at login.
    Enable,
    /// Remove the login registration.
    Disable,
}

pub fn run(command: AutostartCommand, log_json: bool) -> Result<()> {
    let home = home()?;
    let sink = quiet_sink(&home, log_json)?;

    sink.scope(|| -> Result<()> {
        let enabled = match command {
            AutostartCommand::Enable => {
                let exe =
                    std::env::current_exe().context("cannot locate the running executable")?;
                let record =
                    enable_autostart(&home, &exe).context("failed to enable autostart")?;
                println!("{} autostart enabled: {}", "✓".green(), record.display());
                true
            }
            AutostartCommand::Disable => {
                disable_autostart(&home).context("failed to disable autostart")?;
                println!("{} autostart disabled", "✓".green());
                false
            }
        };

        // The flag is only recorded once setup has produced a config.
        if app_config::exists_at(&home) {
            let mut config =
                app_config::load_at(&home).context("failed to load configuration")?;
            if config.autostart_enabled != enabled {
                config.autostart_enabled = enabled;
                app_config::save_at(&home, &config).context("failed to save configuration")?;
            }
        }
        Ok(())
    })
}

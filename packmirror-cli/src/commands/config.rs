//! `packmirror config show|path|set-target`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use tabled::{settings::Style, Table, Tabled};

use packmirror_core::config::{config_path_at, save_at};

use super::{home, load_config};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the persisted configuration and the pairs derived from it.
    Show {
        /// Emit config.json as stored.
        #[arg(long)]
        json: bool,
    },
    /// Print the location of config.json.
    Path,
    /// Set the target executable; omit the path to match by name only.
    SetTarget {
        /// Full path of the executable whose presence pauses mirroring.
        path: Option<PathBuf>,
    },
}

#[derive(Tabled)]
struct ConfigRow {
    #[tabled(rename = "key")]
    key: String,
    #[tabled(rename = "value")]
    value: String,
}

impl ConfigRow {
    fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

pub fn run(command: ConfigCommand) -> Result<()> {
    let home = home()?;
    match command {
        ConfigCommand::Path => {
            println!("{}", config_path_at(&home).display());
        }
        ConfigCommand::SetTarget { path } => {
            let mut config = load_config(&home)?;
            config.target_executable_path = path;
            save_at(&home, &config).context("failed to save configuration")?;
            println!("target: {}", config.process_target());
        }
        ConfigCommand::Show { json } => {
            let config = load_config(&home)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&config).context("failed to render config JSON")?
                );
                return Ok(());
            }

            let target = config.process_target();
            let mut rows = vec![
                ConfigRow::new("gunpackNewPath", config.gunpack_new_path.display().to_string()),
                ConfigRow::new("gunpackOldPath", config.gunpack_old_path.display().to_string()),
                ConfigRow::new("reduxNewPath", config.redux_new_path.display().to_string()),
                ConfigRow::new("reduxOldPath", config.redux_old_path.display().to_string()),
                ConfigRow::new(
                    "targetExecutablePath",
                    target
                        .full_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ),
                ConfigRow::new("autostartEnabled", config.autostart_enabled.to_string()),
                ConfigRow::new("target process", target.process_name.clone()),
            ];
            for pair in config.mirror_pairs_at(&home) {
                rows.push(ConfigRow::new(
                    format!("pair: {}", pair.label),
                    format!("{} -> {}", pair.source_root.display(), pair.dest_root.display()),
                ));
            }

            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{table}");
        }
    }
    Ok(())
}

//! `packmirror check`: is the target application running?

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use packmirror_detector::{platform_observer, Liveness};

use super::{home, load_config, quiet_sink};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct CheckJson {
    process: String,
    executable: Option<String>,
    by_name: bool,
    by_path: Option<bool>,
    running: bool,
}

impl CheckArgs {
    pub fn run(self, log_json: bool) -> Result<()> {
        let home = home()?;
        let sink = quiet_sink(&home, log_json)?;
        let target = sink.scope(|| load_config(&home))?.process_target();
        let probe = sink.scope(|| Liveness::new(platform_observer()).probe(&target));

        if self.json {
            let payload = CheckJson {
                process: target.process_name.clone(),
                executable: target.full_path.as_ref().map(|p| p.display().to_string()),
                by_name: probe.by_name,
                by_path: probe.by_path,
                running: probe.running(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to render check JSON")?
            );
            return Ok(());
        }

        println!("target:  {target}");
        println!("by name: {}", yes_no(probe.by_name));
        match probe.by_path {
            Some(found) => println!("by path: {}", yes_no(found)),
            None => println!("by path: {}", "not configured".dimmed()),
        }
        if probe.running() {
            println!("{} target is running; mirroring would pause", "⏸".yellow());
        } else {
            println!("{} target is not running; mirroring would proceed", "✓".green());
        }
        Ok(())
    }
}

fn yes_no(found: bool) -> colored::ColoredString {
    if found {
        "yes".yellow()
    } else {
        "no".green()
    }
}

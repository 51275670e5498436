//! `packmirror mirror [--json]`: one cycle, right now.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};
use tracing::instrument::WithSubscriber;

use packmirror_daemon::{CopyCycleController, CycleConfig, CycleReport};
use packmirror_detector::platform_observer;

use super::{home, load_config, quiet_sink, runtime};

#[derive(Args, Debug)]
pub struct MirrorArgs {
    /// Emit the cycle report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct PairRow {
    #[tabled(rename = "pair")]
    pair: String,
    #[tabled(rename = "source")]
    source: String,
    #[tabled(rename = "destination")]
    dest: String,
    #[tabled(rename = "copied")]
    copied: usize,
    #[tabled(rename = "bytes")]
    bytes: u64,
    #[tabled(rename = "failed")]
    failed: String,
}

impl MirrorArgs {
    pub fn run(self, log_json: bool) -> Result<()> {
        let home = home()?;
        let sink = quiet_sink(&home, log_json)?;
        let config = sink.scope(|| load_config(&home))?;

        let controller = CopyCycleController::new(
            CycleConfig::from_app_config(&config, &home),
            platform_observer(),
        );
        let cycle = controller.run_cycle().with_subscriber(sink.dispatch().clone());
        let report = runtime()?.block_on(cycle);

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to render cycle report JSON")?
            );
            return Ok(());
        }
        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &CycleReport) {
    let started = report.started_at.format("%Y-%m-%d %H:%M:%S UTC");
    if report.target_running {
        println!("{} {started}: target is running, nothing copied", "⏸".yellow());
        return;
    }

    let rows: Vec<PairRow> = report
        .pairs
        .iter()
        .map(|pair| {
            let failures = pair.files_failed + pair.traversal_errors;
            PairRow {
                pair: pair.label.map(|l| l.to_string()).unwrap_or_default(),
                source: pair.source.display().to_string(),
                dest: pair.dest.display().to_string(),
                copied: pair.files_copied,
                bytes: pair.bytes_copied,
                failed: if failures == 0 {
                    "0".green().to_string()
                } else {
                    failures.to_string().red().to_string()
                },
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let status = if report.is_clean() {
        "✓".green()
    } else {
        "!".yellow()
    };
    println!("{status} {started}: {} files copied", report.files_copied());
}

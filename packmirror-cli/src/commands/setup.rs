//! `packmirror setup`: first-run prompts.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use packmirror_core::{config as app_config, AppConfig, DEFAULT_TARGET_PROCESS};
use packmirror_daemon::enable_autostart;

use super::{home, quiet_sink};

#[derive(Args, Debug, Default)]
pub struct SetupArgs {}

impl SetupArgs {
    pub fn run(self, log_json: bool) -> Result<()> {
        let home = home()?;
        let sink = quiet_sink(&home, log_json)?;
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        sink.scope(|| setup_interactive(&home, &mut input, &mut output))?;
        Ok(())
    }
}

/// Answers collected by [`prompt`]; `autostart` is the y/n reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupAnswers {
    pub config: AppConfig,
    pub autostart: bool,
}

/// Prompt, register autostart if asked, save. Shared with `run` when no
/// config exists yet.
pub fn setup_interactive<R: BufRead, W: Write>(
    home: &Path,
    input: &mut R,
    output: &mut W,
) -> Result<AppConfig> {
    let answers = prompt(input, output)?;
    let mut config = answers.config;

    if answers.autostart {
        let exe = std::env::current_exe().context("cannot locate the running executable")?;
        match enable_autostart(home, &exe) {
            Ok(record) => {
                config.autostart_enabled = true;
                writeln!(output, "{} autostart enabled ({})", "✓".green(), record.display())?;
            }
            Err(err) => {
                tracing::warn!(error = %err, "autostart registration failed");
                writeln!(output, "{} autostart not enabled: {err}", "!".yellow())?;
            }
        }
    }

    let path = app_config::save_at(home, &config).context("failed to save configuration")?;
    tracing::info!(path = %path.display(), "configuration saved");
    writeln!(output, "{} Saved to: {}", "✓".green(), path.display())?;
    Ok(config)
}

/// Ask for the four directories, the optional target executable and the
/// autostart choice.
pub fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<SetupAnswers> {
    writeln!(output, "Initial directory setup:")?;
    writeln!(
        output,
        "  gunpack-new: directory with the current gunpack files, copied to gunpack-old"
    )?;
    writeln!(output, "  gunpack-old: directory the gunpack files are copied to")?;
    writeln!(output, "  redux-new:   directory with the current redux files, copied to redux-old")?;
    writeln!(output, "  redux-old:   directory the redux files are copied to")?;

    let gunpack_new_path = ask_path(input, output, "gunpack-new")?;
    let gunpack_old_path = ask_path(input, output, "gunpack-old")?;
    let redux_new_path = ask_path(input, output, "redux-new")?;
    let redux_old_path = ask_path(input, output, "redux-old")?;
    let target = ask(
        input,
        output,
        &format!("target executable (full path, blank to match {DEFAULT_TARGET_PROCESS} by name):"),
    )?;
    let target_executable_path = (!target.is_empty()).then(|| PathBuf::from(target));
    let autostart = ask_yes_no(input, output, "Use autostart? (y/n)")?;

    Ok(SetupAnswers {
        config: AppConfig {
            gunpack_new_path,
            gunpack_old_path,
            redux_new_path,
            redux_old_path,
            target_executable_path,
            ..AppConfig::default()
        },
        autostart,
    })
}

fn ask_path<R: BufRead, W: Write>(input: &mut R, output: &mut W, name: &str) -> Result<PathBuf> {
    let answer = ask(input, output, &format!("{name}:"))?;
    if answer.is_empty() {
        bail!("{name} must not be empty");
    }
    Ok(PathBuf::from(answer))
}

fn ask_yes_no<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<bool> {
    let answer = ask(input, output, question)?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "{question} ")?;
    output.flush()?;
    let mut line = String::new();
    let read = input.read_line(&mut line).context("failed to read answer")?;
    if read == 0 {
        bail!("input closed before setup finished");
    }
    Ok(line.trim().to_string())
}

//! Set command: write a new version.

use anyhow::Context;
use camino::Utf8Path;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{info, instrument};

use prepress_core::config::Config;
use prepress_core::ecosystem::Ecosystem;
use prepress_core::{Driver, SetOutcome};

/// Arguments for the `set` subcommand.
#[derive(Args, Debug)]
pub struct SetArgs {
    /// New version, e.g. 1.4.0 or v1.4.0
    pub version: String,

    /// Use this ecosystem instead of detecting one
    #[arg(long, value_enum)]
    pub ecosystem: Option<Ecosystem>,
}

#[derive(Debug, Serialize)]
struct SetReport<'a> {
    ecosystem: Ecosystem,
    requested: &'a str,
    #[serde(flatten)]
    outcome: &'a SetOutcome,
}

/// Apply the version and print what happened.
///
/// A skipped write (invalid version, already current, no git) is reported,
/// not treated as a failure.
///
/// # Errors
///
/// Fails when no project is recognized or a file cannot be read or written.
#[instrument(name = "cmd_set", skip_all, fields(version = %args.version))]
pub fn cmd_set(
    args: SetArgs,
    global_json: bool,
    config: &Config,
    cwd: &Utf8Path,
) -> anyhow::Result<()> {
    let driver = super::select_driver(args.ecosystem, config, cwd)?;
    let outcome = driver
        .set_version(&args.version)
        .with_context(|| format!("failed to set {} version", driver.ecosystem()))?;
    info!(ecosystem = %driver.ecosystem(), skipped = outcome.is_skipped(), "set finished");

    if global_json {
        let report = SetReport {
            ecosystem: driver.ecosystem(),
            requested: &args.version,
            outcome: &outcome,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &SetOutcome) {
    match outcome {
        SetOutcome::Updated { files } => {
            println!("{} {}", "✓".green(), outcome);
            for file in files {
                println!("  {}", file.dimmed());
            }
        }
        SetOutcome::Tagged { report, .. } if report.succeeded => {
            println!("{} {}", "✓".green(), outcome);
        }
        SetOutcome::Tagged { report, .. } => {
            println!("{} {}", "✗".red(), outcome);
            if let Some(ref detail) = report.detail {
                println!("  {}", detail.dimmed());
            }
        }
        SetOutcome::Skipped { .. } => println!("{} {}", "○".yellow(), outcome),
    }
}

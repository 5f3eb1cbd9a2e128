//! Detect command: report the project's ecosystem.

use camino::Utf8Path;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use prepress_core::config::Config;
use prepress_core::ecosystem::Ecosystem;
use prepress_core::{Driver, ProjectDriver};

/// Arguments for the `detect` subcommand.
#[derive(Args, Debug, Default)]
pub struct DetectArgs {}

#[derive(Debug, Serialize)]
struct Detection<'a> {
    ecosystem: Ecosystem,
    root: &'a Utf8Path,
    marker: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    lockfile: Option<&'static str>,
    versioned_by_tags: bool,
    /// `true` when `[project] type` chose the ecosystem.
    configured: bool,
}

/// Print the detected ecosystem and its marker file.
///
/// # Errors
///
/// Fails when no ecosystem is configured or detected.
#[instrument(name = "cmd_detect", skip_all)]
pub fn cmd_detect(
    _args: DetectArgs,
    global_json: bool,
    config: &Config,
    cwd: &Utf8Path,
) -> anyhow::Result<()> {
    let driver = super::select_driver(None, config, cwd)?;
    let ecosystem = driver.ecosystem();
    let configured = config
        .project
        .as_ref()
        .and_then(|p| p.project_type)
        .is_some();
    debug!(%ecosystem, configured, "detected");

    let detection = Detection {
        ecosystem,
        root: driver.root(),
        marker: ecosystem.marker_file(),
        lockfile: ecosystem.lockfile_path(),
        versioned_by_tags: ecosystem.versioned_by_tags(),
        configured,
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&detection)?);
        return Ok(());
    }

    print_detection(&detection, &driver);
    Ok(())
}

fn print_detection(detection: &Detection<'_>, driver: &ProjectDriver) {
    let source = if detection.configured {
        "configured"
    } else {
        detection.marker
    };
    println!("{} ({})", detection.ecosystem.to_string().cyan().bold(), source.dimmed());
    if !driver.detect() {
        println!(
            "  {} {} not found in {}",
            "!".yellow(),
            detection.marker,
            detection.root
        );
    }
    if detection.versioned_by_tags {
        println!("  {}", "version is read from git tags".dimmed());
    }
}

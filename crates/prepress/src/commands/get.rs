//! Get command: print the current version.

use anyhow::Context;
use camino::Utf8Path;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::instrument;

use prepress_core::Driver;
use prepress_core::config::Config;
use prepress_core::ecosystem::Ecosystem;

/// Arguments for the `get` subcommand.
#[derive(Args, Debug, Default)]
pub struct GetArgs {
    /// Use this ecosystem instead of detecting one
    #[arg(long, value_enum)]
    pub ecosystem: Option<Ecosystem>,
}

#[derive(Debug, Serialize)]
struct VersionReport {
    ecosystem: Ecosystem,
    version: Option<String>,
}

/// Print the project's version, or a notice when none is recorded.
///
/// # Errors
///
/// Fails when no project is recognized or the version cannot be read.
#[instrument(name = "cmd_get", skip_all, fields(ecosystem = ?args.ecosystem))]
pub fn cmd_get(
    args: GetArgs,
    global_json: bool,
    config: &Config,
    cwd: &Utf8Path,
) -> anyhow::Result<()> {
    let driver = super::select_driver(args.ecosystem, config, cwd)?;
    let report = VersionReport {
        ecosystem: driver.ecosystem(),
        version: driver
            .get_version()
            .with_context(|| format!("failed to read {} version", driver.ecosystem()))?,
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if let Some(ref version) = report.version {
        println!("{version}");
    } else {
        println!(
            "{} no version recorded for this {} project",
            "○".yellow(),
            report.ecosystem
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn absent_version_is_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let cwd = Utf8Path::from_path(tmp.path()).unwrap();
        let args = GetArgs {
            ecosystem: Some(Ecosystem::Node),
        };
        assert!(cmd_get(args, false, &Config::default(), cwd).is_ok());
    }

    #[test]
    fn report_serializes_null_version() {
        let report = VersionReport {
            ecosystem: Ecosystem::Go,
            version: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["version"].is_null());
    }
}

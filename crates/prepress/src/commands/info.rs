//! Info command: show package, config, and detected project information.

use camino::Utf8Path;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use prepress_core::config::{self, Config};
use prepress_core::ecosystem::Ecosystem;
use prepress_core::{Driver, ProjectDriver};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

#[derive(Serialize)]
struct ConfigInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_config_dir: Option<String>,
    log_level: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_type: Option<Ecosystem>,
}

impl ConfigInfo {
    fn from_config(config: &Config, cwd: &Utf8Path) -> Self {
        Self {
            config_file: config::find_project_config(cwd).map(|p| p.to_string()),
            user_config_dir: config::user_config_dir().map(|p| p.to_string()),
            log_level: config.log_level.as_str(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            project_type: config.project.as_ref().and_then(|p| p.project_type),
        }
    }
}

#[derive(Serialize)]
struct ProjectInfo {
    ecosystem: Ecosystem,
    root: String,
    version: Option<String>,
}

impl ProjectInfo {
    fn from_driver(driver: &ProjectDriver) -> Self {
        let version = driver.get_version().unwrap_or_else(|e| {
            debug!(error = %e, "could not read version");
            None
        });
        Self {
            ecosystem: driver.ecosystem(),
            root: driver.root().to_string(),
            version,
        }
    }
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<ProjectInfo>,
}

/// Print package information.
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `cwd` - Current working directory for config discovery and detection
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    cwd: &Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing info command");

    let info = FullInfo {
        package: PackageInfo::new(),
        config: ConfigInfo::from_config(config, cwd),
        project: ProjectDriver::resolve(cwd, config).map(|d| ProjectInfo::from_driver(&d)),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print_info(&info);
    }
    Ok(())
}

fn print_info(info: &FullInfo) {
    let label = |name: &str| format!("{}:", name.dimmed());

    println!("{} {}", info.package.name.bold(), info.package.version.green());
    if !info.package.description.is_empty() {
        println!("{}", info.package.description);
    }
    if !info.package.license.is_empty() {
        println!("{} {}", label("License"), info.package.license);
    }

    println!();
    println!("{}", "Configuration".bold().underline());
    match info.config.config_file {
        Some(ref path) => println!("{} {}", label("Config file"), path.cyan()),
        None => println!("{} {}", label("Config file"), "none loaded".yellow()),
    }
    if let Some(ref dir) = info.config.user_config_dir {
        println!("{} {}", label("User config dir"), dir);
    }
    println!("{} {}", label("Log level"), info.config.log_level);
    if let Some(ref dir) = info.config.log_dir {
        println!("{} {}", label("Log directory"), dir);
    }
    if let Some(ecosystem) = info.config.project_type {
        println!("{} {}", label("Project type"), ecosystem.to_string().cyan());
    }

    println!();
    println!("{}", "Project".bold().underline());
    match info.project {
        Some(ref project) => {
            println!("{} {}", label("Ecosystem"), project.ecosystem.to_string().cyan());
            println!("{} {}", label("Root"), project.root);
            match project.version {
                Some(ref v) => println!("{} {}", label("Version"), v.green()),
                None => println!("{} {}", label("Version"), "none recorded".yellow()),
            }
        }
        None => println!("  {} {}", "○".yellow(), "No recognized project detected".yellow()),
    }
}

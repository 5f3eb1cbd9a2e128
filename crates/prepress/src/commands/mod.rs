//! Command implementations

pub mod detect;

pub mod get;

pub mod info;

pub mod set;

use camino::Utf8Path;
use prepress_core::config::Config;
use prepress_core::driver::ProjectDriver;
use prepress_core::ecosystem::Ecosystem;

/// Pick the driver a command operates on.
///
/// An explicit `--ecosystem` wins, then the configured `project.type`, then
/// marker-file detection in `cwd`.
///
/// # Errors
///
/// Fails when nothing is forced and no marker file is present.
pub fn select_driver(
    ecosystem: Option<Ecosystem>,
    config: &Config,
    cwd: &Utf8Path,
) -> anyhow::Result<ProjectDriver> {
    if let Some(ecosystem) = ecosystem {
        return Ok(ProjectDriver::for_ecosystem(ecosystem, cwd));
    }
    ProjectDriver::resolve(cwd, config).ok_or_else(|| {
        let markers: Vec<&str> = Ecosystem::ALL.iter().map(|e| e.marker_file()).collect();
        anyhow::anyhow!(
            "no recognized project in {cwd} (looked for {})",
            markers.join(", ")
        )
    })
}

//! Core library for prepress.
//!
//! Detects which ecosystem a project belongs to, reads its version, and
//! writes a new one, touching only the version field of each file.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading and discovery
//! - [`driver`] - Per-ecosystem drivers and the [`ProjectDriver`] registry
//! - [`ecosystem`] - Supported ecosystems and their marker files
//! - [`edit`] - Format-preserving TOML/JSON edits and atomic writes
//! - [`error`] - Error types and result aliases
//! - [`git`] - Git plumbing for tag-versioned ecosystems
//! - [`version`] - Semantic version parsing and tag naming
//!
//! # Quick Start
//!
//! ```no_run
//! use camino::Utf8Path;
//! use prepress_core::{ConfigLoader, Driver, ProjectDriver};
//!
//! let root = Utf8Path::new(".");
//! let config = ConfigLoader::new().with_project_search(root).load()?;
//!
//! if let Some(driver) = ProjectDriver::resolve(root, &config) {
//!     println!("{} project at {:?}", driver.ecosystem(), driver.get_version()?);
//!     println!("{}", driver.set_version("2.0.0")?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
#![deny(unsafe_code)]

pub mod config;

pub mod driver;

pub mod ecosystem;

pub mod edit;

pub mod error;

pub mod git;

pub mod version;

pub use config::{Config, ConfigLoader, LogLevel};

pub use driver::{Driver, ProjectDriver, SetOutcome, SkipReason};

pub use ecosystem::Ecosystem;

pub use error::{ConfigError, ConfigResult, DriverError, DriverResult};

// Re-export semver so downstream crates don't need a direct dependency.
pub use semver;

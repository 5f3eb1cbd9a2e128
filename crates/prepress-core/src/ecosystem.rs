//! Ecosystem types.
//!
//! This module defines the recognized project ecosystems and the files each
//! one is identified and versioned by. It is pure types and data; the
//! drivers in [`crate::driver`] do the work.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A recognized project ecosystem.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    /// Rust project (detected via `Cargo.toml`).
    Rust,
    /// Node.js project (detected via `package.json`).
    Node,
    /// Python project (detected via `pyproject.toml`).
    Python,
    /// Go module (detected via `go.mod`, versioned by git tags).
    Go,
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rust => write!(f, "rust"),
            Self::Node => write!(f, "node"),
            Self::Python => write!(f, "python"),
            Self::Go => write!(f, "go"),
        }
    }
}

impl Ecosystem {
    /// Filename that signals this ecosystem when found in a directory.
    pub const fn marker_file(self) -> &'static str {
        match self {
            Self::Rust => "Cargo.toml",
            Self::Node => "package.json",
            Self::Python => "pyproject.toml",
            Self::Go => "go.mod",
        }
    }

    /// Lockfile kept in sync with the manifest version, relative to project root.
    pub const fn lockfile_path(self) -> Option<&'static str> {
        match self {
            Self::Rust => Some("Cargo.lock"),
            Self::Node => Some("package-lock.json"),
            Self::Python | Self::Go => None,
        }
    }

    /// Whether the version lives in git tags rather than a manifest field.
    pub const fn versioned_by_tags(self) -> bool {
        matches!(self, Self::Go)
    }

    /// All recognized ecosystems, in detection priority order.
    pub const ALL: &[Self] = &[Self::Rust, Self::Node, Self::Python, Self::Go];
}

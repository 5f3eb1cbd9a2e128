//! Ecosystem drivers: detect a project, read its version, write a new one.
//!
//! Every driver is bound to one project root and implements [`Driver`].
//! Manifest drivers ([`CargoDriver`], [`NodeDriver`], [`PythonDriver`])
//! rewrite exactly one field and keep every other byte of the file. The
//! [`GoDriver`] records versions as git tags instead.
//!
//! [`ProjectDriver`] is the closed set of drivers; use
//! [`ProjectDriver::discover`] to pick one by marker files.
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8Path;
//! use prepress_core::driver::{Driver, ProjectDriver};
//!
//! if let Some(driver) = ProjectDriver::discover(Utf8Path::new(".")) {
//!     println!("{}: {:?}", driver.ecosystem(), driver.get_version());
//!     let outcome = driver.set_version("1.4.0").expect("I/O failure");
//!     println!("{outcome}");
//! }
//! ```

mod cargo;
mod go;
mod node;
mod python;

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::ecosystem::Ecosystem;
use crate::error::DriverResult;
use crate::git::CommandReport;

pub use cargo::CargoDriver;
pub use go::GoDriver;
pub use node::NodeDriver;
pub use python::PythonDriver;

/// Capabilities shared by every ecosystem driver.
pub trait Driver {
    /// The ecosystem this driver handles.
    fn ecosystem(&self) -> Ecosystem;

    /// The project root this driver is bound to.
    fn root(&self) -> &Utf8Path;

    /// Whether this driver's marker file exists directly under the root.
    ///
    /// Never fails; a missing root is simply `false`.
    fn detect(&self) -> bool {
        self.root().join(self.ecosystem().marker_file()).is_file()
    }

    /// The currently recorded version, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Only for genuine I/O failures; absence is `Ok(None)`.
    fn get_version(&self) -> DriverResult<Option<String>>;

    /// Record `version` as the project's version.
    ///
    /// Invalid versions and unmet preconditions are reported as
    /// [`SetOutcome::Skipped`], not errors. Repeating a call with the same
    /// version leaves the same end state.
    ///
    /// # Errors
    ///
    /// Only for genuine I/O failures reading or writing project files.
    fn set_version(&self, version: &str) -> DriverResult<SetOutcome>;
}

/// What `set_version` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SetOutcome {
    /// Files were rewritten with the new version.
    Updated {
        /// Files whose content changed.
        files: Vec<Utf8PathBuf>,
    },
    /// Tag creation was attempted.
    Tagged {
        /// The tag name (e.g. `v1.2.3`).
        tag: String,
        /// Result of the best-effort `git tag` invocation.
        report: CommandReport,
    },
    /// Nothing was changed.
    Skipped {
        /// Why nothing happened.
        reason: SkipReason,
    },
}

impl SetOutcome {
    pub(crate) const fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }

    /// The skip reason, if nothing was changed.
    pub const fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Self::Skipped { reason } => Some(reason),
            _ => None,
        }
    }

    /// Whether the outcome left files and tags as they were.
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

impl fmt::Display for SetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Updated { files } => {
                let names: Vec<&str> = files
                    .iter()
                    .map(|p| p.file_name().unwrap_or(p.as_str()))
                    .collect();
                write!(f, "updated {}", names.join(", "))
            }
            Self::Tagged { tag, report } if report.succeeded => write!(f, "created tag {tag}"),
            Self::Tagged { tag, .. } => write!(f, "could not create tag {tag}"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

/// Why a `set_version` call changed nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The requested version is not a semantic version.
    InvalidVersion(String),
    /// The manifest file does not exist.
    ManifestMissing(Utf8PathBuf),
    /// The manifest exists but is not valid for its format.
    ManifestUnparsable(Utf8PathBuf),
    /// The manifest has no version field to rewrite.
    VersionFieldMissing(Utf8PathBuf),
    /// Every file already records this version.
    AlreadyCurrent,
    /// The git program could not be found.
    GitUnavailable,
    /// The repository has no commits (or is not a repository).
    NoCommits,
    /// A tag with this name already exists.
    TagExists(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidVersion(v) => write!(f, "{v:?} is not a semantic version"),
            Self::ManifestMissing(p) => write!(f, "{p} not found"),
            Self::ManifestUnparsable(p) => write!(f, "{p} could not be parsed"),
            Self::VersionFieldMissing(p) => write!(f, "{p} has no version field"),
            Self::AlreadyCurrent => write!(f, "version already current"),
            Self::GitUnavailable => write!(f, "git is not installed"),
            Self::NoCommits => write!(f, "repository has no commits"),
            Self::TagExists(t) => write!(f, "tag {t} already exists"),
        }
    }
}

/// One driver per recognized ecosystem.
#[derive(Debug, Clone)]
pub enum ProjectDriver {
    /// `Cargo.toml` / `Cargo.lock`.
    Cargo(CargoDriver),
    /// `package.json` / `package-lock.json`.
    Node(NodeDriver),
    /// `pyproject.toml`.
    Python(PythonDriver),
    /// `go.mod` with git tags.
    Go(GoDriver),
}

impl ProjectDriver {
    /// Build the driver for `ecosystem`, bound to `root`.
    pub fn for_ecosystem(ecosystem: Ecosystem, root: impl Into<Utf8PathBuf>) -> Self {
        let root = root.into();
        match ecosystem {
            Ecosystem::Rust => Self::Cargo(CargoDriver::new(root)),
            Ecosystem::Node => Self::Node(NodeDriver::new(root)),
            Ecosystem::Python => Self::Python(PythonDriver::new(root)),
            Ecosystem::Go => Self::Go(GoDriver::new(root)),
        }
    }

    /// Pick the first driver whose marker file exists, in
    /// [`Ecosystem::ALL`] priority order.
    #[instrument(fields(%root))]
    pub fn discover(root: &Utf8Path) -> Option<Self> {
        let driver = Ecosystem::ALL
            .iter()
            .map(|ecosystem| Self::for_ecosystem(*ecosystem, root))
            .find(|driver| driver.detect());
        match &driver {
            Some(d) => debug!(ecosystem = %d.ecosystem(), "detected ecosystem"),
            None => debug!("no marker file found"),
        }
        driver
    }

    /// Use the configured `project.type` if set, otherwise [`discover`](Self::discover).
    pub fn resolve(root: &Utf8Path, config: &Config) -> Option<Self> {
        if let Some(ref project) = config.project
            && let Some(ecosystem) = project.project_type
        {
            debug!(%ecosystem, "using configured project type");
            return Some(Self::for_ecosystem(ecosystem, root));
        }
        Self::discover(root)
    }

    fn inner(&self) -> &dyn Driver {
        match self {
            Self::Cargo(d) => d,
            Self::Node(d) => d,
            Self::Python(d) => d,
            Self::Go(d) => d,
        }
    }
}

impl Driver for ProjectDriver {
    fn ecosystem(&self) -> Ecosystem {
        self.inner().ecosystem()
    }

    fn root(&self) -> &Utf8Path {
        self.inner().root()
    }

    fn detect(&self) -> bool {
        self.inner().detect()
    }

    fn get_version(&self) -> DriverResult<Option<String>> {
        self.inner().get_version()
    }

    fn set_version(&self, version: &str) -> DriverResult<SetOutcome> {
        self.inner().set_version(version)
    }
}

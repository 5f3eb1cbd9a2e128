//! Go driver: versions live in annotated git tags, never in `go.mod`.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, instrument};

use super::{Driver, SetOutcome, SkipReason};
use crate::ecosystem::Ecosystem;
use crate::error::DriverResult;
use crate::git::Git;
use crate::version::{self, parse_version, tag_name};

/// Driver for Go modules, versioned by `v`-prefixed git tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoDriver {
    root: Utf8PathBuf,
    git: Git,
}

impl GoDriver {
    /// Bind a driver to `root`, using `git` from `PATH`.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self::with_git(root, Git::default())
    }

    /// Bind a driver to `root` with a specific git handle.
    pub fn with_git(root: impl Into<Utf8PathBuf>, git: Git) -> Self {
        Self {
            root: root.into(),
            git,
        }
    }
}

impl Driver for GoDriver {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// The highest semver tag, without its `v` prefix.
    ///
    /// Tags that are not semantic versions are ignored. No git, no
    /// repository, or no tags all read as `None`.
    #[instrument(skip(self), fields(root = %self.root))]
    fn get_version(&self) -> DriverResult<Option<String>> {
        if !self.git.is_available() {
            debug!("git not available");
            return Ok(None);
        }
        let tags = match self.git.list_tags(&self.root) {
            Ok(tags) => tags,
            Err(e) => {
                debug!(error = %e, "could not list tags");
                return Ok(None);
            }
        };
        Ok(version::latest(tags.iter().map(String::as_str)).map(|v| v.to_string()))
    }

    #[instrument(skip(self), fields(root = %self.root))]
    fn set_version(&self, version: &str) -> DriverResult<SetOutcome> {
        let Some(parsed) = parse_version(version) else {
            return Ok(SetOutcome::skipped(SkipReason::InvalidVersion(version.into())));
        };
        if !self.git.is_available() {
            return Ok(SetOutcome::skipped(SkipReason::GitUnavailable));
        }
        if !self.git.has_commits(&self.root) {
            return Ok(SetOutcome::skipped(SkipReason::NoCommits));
        }

        let tag = tag_name(&parsed);
        match self.git.tag_exists(&self.root, &tag) {
            Ok(true) => return Ok(SetOutcome::skipped(SkipReason::TagExists(tag))),
            Ok(false) => {}
            Err(e) => debug!(error = %e, "tag lookup failed, attempting creation anyway"),
        }

        let report = self
            .git
            .create_annotated_tag(&self.root, &tag, &format!("Release {tag}"));
        if report.succeeded {
            info!(%tag, "created release tag");
        }
        Ok(SetOutcome::Tagged { tag, report })
    }
}

//! Python driver: `pyproject.toml`.
//!
//! PEP 621 `[project].version` wins; Poetry's `[tool.poetry].version` is the
//! fallback. Other `[tool.*]` sections are never consulted.

use camino::{Utf8Path, Utf8PathBuf};
use toml_edit::DocumentMut;
use tracing::{debug, info, instrument};

use super::{Driver, SetOutcome, SkipReason};
use crate::ecosystem::Ecosystem;
use crate::edit::{self, FileEdit, toml};
use crate::error::DriverResult;
use crate::version::parse_version;

const VERSION_PATHS: &[&[&str]] = &[&["project", "version"], &["tool", "poetry", "version"]];

/// Driver for `pyproject.toml` projects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonDriver {
    root: Utf8PathBuf,
}

impl PythonDriver {
    /// Bind a driver to `root`.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn manifest_path(&self) -> Utf8PathBuf {
        self.root.join(Ecosystem::Python.marker_file())
    }
}

fn version_path(doc: &DocumentMut) -> Option<&'static [&'static str]> {
    VERSION_PATHS
        .iter()
        .copied()
        .find(|path| toml::string_at(doc, path).is_some())
}

impl Driver for PythonDriver {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    fn root(&self) -> &Utf8Path {
        &self.root
    }

    #[instrument(skip(self), fields(root = %self.root))]
    fn get_version(&self) -> DriverResult<Option<String>> {
        let Some(text) = edit::read_optional(&self.manifest_path())? else {
            return Ok(None);
        };
        let Some(doc) = toml::parse(&text) else {
            debug!("pyproject.toml is not valid TOML");
            return Ok(None);
        };

        Ok(version_path(&doc)
            .and_then(|path| toml::string_at(&doc, path))
            .map(str::to_string))
    }

    #[instrument(skip(self), fields(root = %self.root))]
    fn set_version(&self, version: &str) -> DriverResult<SetOutcome> {
        let Some(parsed) = parse_version(version) else {
            return Ok(SetOutcome::skipped(SkipReason::InvalidVersion(version.into())));
        };
        let new = parsed.to_string();

        let manifest = self.manifest_path();
        let Some(text) = edit::read_optional(&manifest)? else {
            return Ok(SetOutcome::skipped(SkipReason::ManifestMissing(manifest)));
        };
        let Some(mut doc) = toml::parse(&text) else {
            return Ok(SetOutcome::skipped(SkipReason::ManifestUnparsable(manifest)));
        };
        let Some(path) = version_path(&doc) else {
            debug!("no static version (dynamic or absent)");
            return Ok(SetOutcome::skipped(SkipReason::VersionFieldMissing(manifest)));
        };

        toml::replace_string_at(&mut doc, path, &new);
        let files = edit::commit(vec![FileEdit {
            path: manifest,
            before: text,
            after: doc.to_string(),
        }])?;

        if files.is_empty() {
            return Ok(SetOutcome::skipped(SkipReason::AlreadyCurrent));
        }
        info!(version = %new, field = %path.join("."), "updated pyproject version");
        Ok(SetOutcome::Updated { files })
    }
}

//! Rust driver: `Cargo.toml`, with the local entries of `Cargo.lock` kept in step.
//!
//! The version is read from `[package].version`. A package that inherits
//! its version (`version.workspace = true`), or a virtual manifest with no
//! `[package]` at all, is versioned through `[workspace.package].version`.
//! In that case every local lockfile entry still at the old workspace
//! version is moved along with it, which also catches a member that pins
//! the same version explicitly.

use camino::{Utf8Path, Utf8PathBuf};
use toml_edit::{DocumentMut, Item, Table};
use tracing::{debug, info, instrument, warn};

use super::{Driver, SetOutcome, SkipReason};
use crate::ecosystem::Ecosystem;
use crate::edit::{self, FileEdit, toml};
use crate::error::DriverResult;
use crate::version::parse_version;

const PACKAGE_VERSION: &[&str] = &["package", "version"];
const WORKSPACE_VERSION: &[&str] = &["workspace", "package", "version"];

/// Driver for Cargo projects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CargoDriver {
    root: Utf8PathBuf,
}

impl CargoDriver {
    /// Bind a driver to `root`.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn manifest_path(&self) -> Utf8PathBuf {
        self.root.join(Ecosystem::Rust.marker_file())
    }

    fn lockfile_path(&self) -> Option<Utf8PathBuf> {
        Ecosystem::Rust.lockfile_path().map(|name| self.root.join(name))
    }

    /// Rewrite the local `Cargo.lock` entries that `owner` claims.
    ///
    /// Registry and git packages carry a `source` key; local packages do
    /// not, which tells them apart from a dependency with the same name.
    fn lockfile_edit(&self, owner: &LockOwner, version: &str) -> DriverResult<Option<FileEdit>> {
        let Some(path) = self.lockfile_path() else {
            return Ok(None);
        };
        let Some(text) = edit::read_optional(&path)? else {
            debug!("no Cargo.lock, skipping lockfile sync");
            return Ok(None);
        };
        let Some(mut doc) = toml::parse(&text) else {
            warn!(%path, "Cargo.lock is not valid TOML, leaving it alone");
            return Ok(None);
        };

        let Some(packages) = doc.get_mut("package").and_then(Item::as_array_of_tables_mut) else {
            debug!("Cargo.lock has no packages");
            return Ok(None);
        };
        let mut synced = 0;
        for pkg in packages.iter_mut() {
            if pkg.contains_key("source") || !owner.claims(pkg) {
                continue;
            }
            if let Some(item) = pkg.get_mut("version")
                && toml::replace_string(item, version)
            {
                synced += 1;
            }
        }
        if synced == 0 {
            debug!(?owner, "no local package found in Cargo.lock");
            return Ok(None);
        }

        Ok(Some(FileEdit {
            path,
            before: text,
            after: doc.to_string(),
        }))
    }
}

/// Which local `Cargo.lock` entries follow the manifest version.
#[derive(Debug)]
struct LockOwner {
    /// The root package, by name.
    package: Option<String>,
    /// The workspace version being replaced. Members inheriting it are
    /// recognised by still carrying it in the lockfile.
    workspace_version: Option<String>,
}

impl LockOwner {
    fn claims(&self, pkg: &Table) -> bool {
        let field = |key: &str| pkg.get(key).and_then(Item::as_str);
        (self.package.is_some() && field("name") == self.package.as_deref())
            || (self.workspace_version.is_some()
                && field("version") == self.workspace_version.as_deref())
    }
}

/// Locate the key path holding this manifest's version.
fn version_path(doc: &DocumentMut) -> Option<&'static [&'static str]> {
    if toml::string_at(doc, PACKAGE_VERSION).is_some() {
        return Some(PACKAGE_VERSION);
    }

    let inherits = doc.get("package").is_none_or(|package| {
        toml::lookup(package, &["version", "workspace"]).and_then(Item::as_bool) == Some(true)
    });

    (inherits && toml::string_at(doc, WORKSPACE_VERSION).is_some()).then_some(WORKSPACE_VERSION)
}

impl Driver for CargoDriver {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rust
    }

    fn root(&self) -> &Utf8Path {
        &self.root
    }

    #[instrument(skip(self), fields(root = %self.root))]
    fn get_version(&self) -> DriverResult<Option<String>> {
        let Some(text) = edit::read_optional(&self.manifest_path())? else {
            debug!("no Cargo.toml");
            return Ok(None);
        };
        let Some(doc) = toml::parse(&text) else {
            debug!("Cargo.toml is not valid TOML");
            return Ok(None);
        };

        Ok(version_path(&doc)
            .and_then(|path| toml::string_at(&doc, path))
            .map(str::to_string))
    }

    #[instrument(skip(self), fields(root = %self.root))]
    fn set_version(&self, version: &str) -> DriverResult<SetOutcome> {
        let Some(parsed) = parse_version(version) else {
            debug!("not a semantic version");
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
            return Ok(SetOutcome::skipped(SkipReason::VersionFieldMissing(manifest)));
        };
        debug!(field = %path.join("."), "found version field");

        let owner = LockOwner {
            package: toml::string_at(&doc, &["package", "name"]).map(str::to_string),
            workspace_version: (path == WORKSPACE_VERSION)
                .then(|| toml::string_at(&doc, path).map(str::to_string))
                .flatten(),
        };
        toml::replace_string_at(&mut doc, path, &new);

        let mut edits = vec![FileEdit {
            path: manifest,
            before: text,
            after: doc.to_string(),
        }];
        edits.extend(self.lockfile_edit(&owner, &new)?);

        let files = edit::commit(edits)?;
        if files.is_empty() {
            return Ok(SetOutcome::skipped(SkipReason::AlreadyCurrent));
        }
        info!(version = %new, files = files.len(), "updated Cargo version");
        Ok(SetOutcome::Updated { files })
    }
}

//! Node driver: `package.json`, with `package-lock.json` kept in step.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, instrument, warn};

use super::{Driver, SetOutcome, SkipReason};
use crate::ecosystem::Ecosystem;
use crate::edit::{self, FileEdit, json};
use crate::error::DriverResult;
use crate::version::parse_version;

const MANIFEST_VERSION: &[&str] = &["version"];

/// Root package version fields in a lockfile: the top-level key (all
/// lockfile versions) and the `""` entry under `packages` (v2 and v3).
const LOCKFILE_VERSIONS: &[&[&str]] = &[&["version"], &["packages", "", "version"]];

/// Driver for npm-style `package.json` projects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDriver {
    root: Utf8PathBuf,
}

impl NodeDriver {
    /// Bind a driver to `root`.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn manifest_path(&self) -> Utf8PathBuf {
        self.root.join(Ecosystem::Node.marker_file())
    }

    fn lockfile_path(&self) -> Option<Utf8PathBuf> {
        Ecosystem::Node.lockfile_path().map(|name| self.root.join(name))
    }

    fn lockfile_edit(&self, version: &str) -> DriverResult<Option<FileEdit>> {
        let Some(path) = self.lockfile_path() else {
            return Ok(None);
        };
        let Some(text) = edit::read_optional(&path)? else {
            debug!("no package-lock.json, skipping lockfile sync");
            return Ok(None);
        };
        if json::parse(&text).is_none() {
            warn!(%path, "package-lock.json is not valid JSON, leaving it alone");
            return Ok(None);
        }

        Ok(json::replace_strings(&text, LOCKFILE_VERSIONS, version).map(|after| FileEdit {
            path,
            before: text,
            after,
        }))
    }
}

impl Driver for NodeDriver {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Node
    }

    fn root(&self) -> &Utf8Path {
        &self.root
    }

    #[instrument(skip(self), fields(root = %self.root))]
    fn get_version(&self) -> DriverResult<Option<String>> {
        let Some(text) = edit::read_optional(&self.manifest_path())? else {
            return Ok(None);
        };
        let Some(value) = json::parse(&text) else {
            debug!("package.json is not valid JSON");
            return Ok(None);
        };
        Ok(json::string_at(&value, MANIFEST_VERSION).map(str::to_string))
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
        if json::parse(&text).is_none() {
            return Ok(SetOutcome::skipped(SkipReason::ManifestUnparsable(manifest)));
        }
        let Some(after) = json::replace_strings(&text, &[MANIFEST_VERSION], &new) else {
            return Ok(SetOutcome::skipped(SkipReason::VersionFieldMissing(manifest)));
        };

        let mut edits = vec![FileEdit {
            path: manifest,
            before: text,
            after,
        }];
        edits.extend(self.lockfile_edit(&new)?);

        let files = edit::commit(edits)?;
        if files.is_empty() {
            return Ok(SetOutcome::skipped(SkipReason::AlreadyCurrent));
        }
        info!(version = %new, files = files.len(), "updated package version");
        Ok(SetOutcome::Updated { files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn utf8_tmp(tmp: &TempDir) -> &Utf8Path {
        Utf8Path::from_path(tmp.path()).expect("tempdir is UTF-8")
    }

    fn project(manifest: &str) -> (TempDir, NodeDriver) {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("package.json"), manifest).unwrap();
        let driver = NodeDriver::new(utf8_tmp(&tmp));
        (tmp, driver)
    }

    fn read(tmp: &TempDir, name: &str) -> String {
        fs::read_to_string(tmp.path().join(name)).unwrap()
    }

    #[test]
    fn compact_manifest_round_trip() {
        let (tmp, driver) = project(r#"{"name": "test", "version": "0.1.0"}"#);
        assert!(driver.detect());
        assert_eq!(driver.get_version().unwrap().as_deref(), Some("0.1.0"));

        driver.set_version("0.2.0").unwrap();
        assert_eq!(
            read(&tmp, "package.json"),
            r#"{"name": "test", "version": "0.2.0"}"#
        );
    }

    #[test]
    fn v1_lockfile_top_level_only() {
        let (tmp, driver) = project("{\n  \"version\": \"1.0.0\"\n}\n");
        let lock = "{\n  \"name\": \"x\",\n  \"version\": \"1.0.0\",\n  \"lockfileVersion\": 1,\n  \"dependencies\": {\n    \"left-pad\": {\n      \"version\": \"1.0.0\"\n    }\n  }\n}\n";
        fs::write(tmp.path().join("package-lock.json"), lock).unwrap();

        driver.set_version("1.0.1").unwrap();
        assert_eq!(
            read(&tmp, "package-lock.json"),
            lock.replacen("\"version\": \"1.0.0\"", "\"version\": \"1.0.1\"", 1)
        );
    }

    #[test]
    fn lockfile_packages_entry_without_top_level_version() {
        let (tmp, driver) = project("{\"version\": \"1.0.0\"}");
        let lock = "{\n  \"name\": \"x\",\n  \"lockfileVersion\": 3,\n  \"packages\": {\n    \"\": {\n      \"version\": \"1.0.0\"\n    },\n    \"node_modules/a\": {\n      \"version\": \"1.0.0\"\n    }\n  }\n}\n";
        fs::write(tmp.path().join("package-lock.json"), lock).unwrap();

        let outcome = driver.set_version("1.0.1").unwrap();
        assert_eq!(
            outcome,
            SetOutcome::Updated {
                files: vec![
                    utf8_tmp(&tmp).join("package.json"),
                    utf8_tmp(&tmp).join("package-lock.json"),
                ]
            }
        );
        assert_eq!(
            read(&tmp, "package-lock.json"),
            lock.replacen("\"version\": \"1.0.0\"", "\"version\": \"1.0.1\"", 1)
        );
        assert!(!read(&tmp, "package-lock.json").contains("\"name\": \"x\",\n  \"version\""));
    }

    #[test]
    fn lockfile_without_root_version_is_untouched() {
        let (tmp, driver) = project("{\"version\": \"1.0.0\"}");
        let lock = "{\"lockfileVersion\": 3, \"packages\": {\"node_modules/a\": {\"version\": \"1.0.0\"}}}";
        fs::write(tmp.path().join("package-lock.json"), lock).unwrap();

        let outcome = driver.set_version("2.0.0").unwrap();
        assert_eq!(
            outcome,
            SetOutcome::Updated {
                files: vec![utf8_tmp(&tmp).join("package.json")]
            }
        );
        assert_eq!(read(&tmp, "package-lock.json"), lock);
    }

    #[test]
    fn broken_lockfile_does_not_block_manifest() {
        let (tmp, driver) = project("{\"version\": \"1.0.0\"}");
        fs::write(tmp.path().join("package-lock.json"), "{ nope").unwrap();

        driver.set_version("1.1.0").unwrap();
        assert_eq!(driver.get_version().unwrap().as_deref(), Some("1.1.0"));
        assert_eq!(read(&tmp, "package-lock.json"), "{ nope");
    }

    #[test]
    fn nested_version_keys_are_not_the_package_version() {
        let manifest = r#"{"name": "x", "engines": {"version": "1.0.0"}}"#;
        let (tmp, driver) = project(manifest);
        assert_eq!(driver.get_version().unwrap(), None);

        let outcome = driver.set_version("1.0.0").unwrap();
        assert!(matches!(
            outcome.skip_reason(),
            Some(SkipReason::VersionFieldMissing(_))
        ));
        assert_eq!(read(&tmp, "package.json"), manifest);
    }

    #[test]
    fn non_object_manifest() {
        let (_tmp, driver) = project("[\"version\", \"1.0.0\"]");
        assert_eq!(driver.get_version().unwrap(), None);
    }

    #[test]
    fn unparsable_manifest_is_left_alone() {
        let (tmp, driver) = project("{\"version\": \"1.0.0\",");
        assert_eq!(driver.get_version().unwrap(), None);

        let outcome = driver.set_version("2.0.0").unwrap();
        assert!(matches!(
            outcome.skip_reason(),
            Some(SkipReason::ManifestUnparsable(_))
        ));
        assert_eq!(read(&tmp, "package.json"), "{\"version\": \"1.0.0\",");
    }

    #[test]
    fn lockfile_only_without_manifest_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let lock = "{\"version\": \"1.0.0\"}";
        fs::write(tmp.path().join("package-lock.json"), lock).unwrap();

        let driver = NodeDriver::new(utf8_tmp(&tmp));
        let outcome = driver.set_version("2.0.0").unwrap();
        assert!(matches!(
            outcome.skip_reason(),
            Some(SkipReason::ManifestMissing(_))
        ));
        assert_eq!(read(&tmp, "package-lock.json"), lock);
    }

    #[test]
    fn repeated_set_is_idempotent() {
        let (tmp, driver) = project("{\"version\": \"1.0.0\"}");
        fs::write(
            tmp.path().join("package-lock.json"),
            "{\"version\": \"1.0.0\", \"packages\": {\"\": {\"version\": \"1.0.0\"}}}",
        )
        .unwrap();

        assert!(!driver.set_version("1.2.0").unwrap().is_skipped());
        let manifest = read(&tmp, "package.json");
        let lock = read(&tmp, "package-lock.json");

        let again = driver.set_version("1.2.0").unwrap();
        assert_eq!(again.skip_reason(), Some(&SkipReason::AlreadyCurrent));
        assert_eq!(read(&tmp, "package.json"), manifest);
        assert_eq!(read(&tmp, "package-lock.json"), lock);
    }

    #[test]
    fn stale_lockfile_is_synced_even_when_manifest_is_current() {
        let (tmp, driver) = project("{\"version\": \"3.0.0\"}");
        fs::write(tmp.path().join("package-lock.json"), "{\"version\": \"2.9.0\"}").unwrap();

        let outcome = driver.set_version("3.0.0").unwrap();
        assert_eq!(
            outcome,
            SetOutcome::Updated {
                files: vec![utf8_tmp(&tmp).join("package-lock.json")]
            }
        );
        assert_eq!(read(&tmp, "package-lock.json"), "{\"version\": \"3.0.0\"}");
    }
}

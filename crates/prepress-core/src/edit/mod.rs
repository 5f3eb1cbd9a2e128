//! Minimal-diff editing of manifest and lockfile text.
//!
//! Drivers read a file fully, compute its new content with one of the
//! format helpers ([`toml`], [`json`]), and hand every changed file to
//! [`commit`]. All new contents are known before the first write, and each
//! file is replaced atomically.

pub mod json;
pub mod toml;

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::error::{DriverError, DriverResult};

/// A pending rewrite of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEdit {
    /// File to rewrite.
    pub path: Utf8PathBuf,
    /// Content as read.
    pub before: String,
    /// Content to write.
    pub after: String,
}

impl FileEdit {
    /// Whether writing this edit would change the file.
    pub fn changes(&self) -> bool {
        self.before != self.after
    }
}

/// Read a file, treating "does not exist" as `None`.
///
/// Any other I/O failure is a [`DriverError::Read`].
pub fn read_optional(path: &Utf8Path) -> DriverResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(DriverError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Write every edit that changes its file. Returns the paths written.
pub fn commit(edits: Vec<FileEdit>) -> DriverResult<Vec<Utf8PathBuf>> {
    let mut written = Vec::new();
    for edit in edits.into_iter().filter(FileEdit::changes) {
        write_atomic(&edit.path, &edit.after)?;
        debug!(path = %edit.path, "rewrote file");
        written.push(edit.path);
    }
    Ok(written)
}

/// Replace `path` with `contents` via a temporary file in the same directory.
///
/// A symlink is followed, so its target is rewritten and the link stays a
/// link. The original file's permissions carry over to the replacement.
pub fn write_atomic(path: &Utf8Path, contents: &str) -> DriverResult<()> {
    let write_err = |source: std::io::Error| DriverError::Write {
        path: path.to_path_buf(),
        source,
    };

    let target = fs::canonicalize(path).unwrap_or_else(|_| path.as_std_path().to_path_buf());
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    if let Ok(metadata) = fs::metadata(&target) {
        fs::set_permissions(tmp.path(), metadata.permissions()).map_err(write_err)?;
    }

    tmp.persist(&target).map_err(|e| write_err(e.error))?;
    if target != path.as_std_path() {
        debug!(%path, target = %target.display(), "wrote through symlink");
    }
    Ok(())
}

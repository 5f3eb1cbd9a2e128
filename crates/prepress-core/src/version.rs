//! Version parsing shared by every driver.
//!
//! Parsing is strict SemVer 2.0 via the [`semver`] crate. Anything that does
//! not parse is "not a version" and callers ignore it rather than fail.

use semver::Version;

/// Parse a version string, stripping surrounding whitespace and one optional
/// `v` prefix.
///
/// Returns `None` for anything that is not a strict semantic version.
pub fn parse_version(raw: &str) -> Option<Version> {
    let raw = raw.trim();
    let raw = raw.strip_prefix('v').unwrap_or(raw);
    Version::parse(raw).ok()
}

/// Render the git tag name used for a release (`v1.2.3`).
pub fn tag_name(version: &Version) -> String {
    format!("v{version}")
}

/// Pick the highest version among `candidates`, skipping unparsable entries.
pub fn latest<'a, I>(candidates: I) -> Option<Version>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates.into_iter().filter_map(parse_version).max()
}

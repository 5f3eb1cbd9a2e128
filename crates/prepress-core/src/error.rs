//! Error types for prepress-core

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Genuine I/O failures surfaced by drivers.
///
/// "File does not exist" is never an error; drivers report it as an absent
/// version or a skipped write instead.
#[derive(Error, Debug)]
pub enum DriverError {
    /// A manifest or lockfile exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that could not be read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A manifest or lockfile could not be written back.
    #[error("failed to write {path}: {source}")]
    Write {
        /// File that could not be written.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using [`DriverError`].
pub type DriverResult<T> = Result<T, DriverError>;

//! Git operations for tag-versioned ecosystems.
//!
//! Shells out to `git` for all operations so the user's signing, hooks and
//! identity configuration apply. Every command runs with the project root as
//! its working directory, stdin closed, and output captured; nothing reaches
//! the user's terminal.

use std::process::{Command, Stdio};

use camino::Utf8Path;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// Failed to execute the `git` command.
    #[error("failed to run git: {0}")]
    Exec(#[from] std::io::Error),

    /// `git` returned a non-zero exit code.
    #[error("git {command} failed: {stderr}")]
    Command {
        /// The git subcommand that failed (e.g., "tag").
        command: String,
        /// Captured stderr.
        stderr: String,
    },
}

/// Result alias for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Handle naming the git program to invoke.
///
/// Defaults to `git` resolved through `PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Git {
    program: String,
}

impl Default for Git {
    fn default() -> Self {
        Self::new()
    }
}

impl Git {
    /// Use `git` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Use a specific program name or path instead of `git`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The program this handle invokes.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether the git program can be found.
    pub fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    /// List every tag in the repository at `root`.
    #[instrument(skip(self), fields(%root))]
    pub fn list_tags(&self, root: &Utf8Path) -> GitResult<Vec<String>> {
        let output = self.run(root, &["tag", "--list"])?;
        let tags: Vec<String> = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        debug!(count = tags.len(), "listed tags");
        Ok(tags)
    }

    /// Whether `HEAD` resolves, i.e. the repository has at least one commit.
    ///
    /// Also `false` outside a repository or when git cannot run.
    #[instrument(skip(self), fields(%root))]
    pub fn has_commits(&self, root: &Utf8Path) -> bool {
        let has = self.run(root, &["rev-parse", "--verify", "--quiet", "HEAD"]).is_ok();
        debug!(has_commits = has, "checked HEAD");
        has
    }

    /// Whether a tag with exactly this name exists.
    #[instrument(skip(self), fields(%root))]
    pub fn tag_exists(&self, root: &Utf8Path, tag: &str) -> GitResult<bool> {
        let output = self.run(root, &["tag", "--list", tag])?;
        Ok(output.lines().any(|line| line.trim() == tag))
    }

    /// Create an annotated tag on `HEAD`.
    ///
    /// Best-effort: failure is logged and recorded in the returned report,
    /// never propagated.
    #[instrument(skip(self), fields(%root))]
    pub fn create_annotated_tag(&self, root: &Utf8Path, tag: &str, message: &str) -> CommandReport {
        best_effort(&self.program, &["tag", "-a", tag, "-m", message], root)
    }

    /// Run a git command and return its stdout.
    fn run(&self, root: &Utf8Path, args: &[&str]) -> GitResult<String> {
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(root.as_std_path())
            .stdin(Stdio::null())
            .output()?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(GitError::Command {
                command: args.first().unwrap_or(&"").to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// What happened when a best-effort command ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandReport {
    /// The command line, for display.
    pub command: String,
    /// Whether the command ran and exited successfully.
    pub succeeded: bool,
    /// Failure detail: captured stderr, exit status, or spawn error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Run a command whose failure must not interrupt the caller.
///
/// The exit status is inspected only to fill in the [`CommandReport`]; a
/// failure is logged at warn level and otherwise swallowed.
pub fn best_effort(program: &str, args: &[&str], cwd: &Utf8Path) -> CommandReport {
    let command = std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");

    let result = Command::new(program)
        .args(args)
        .current_dir(cwd.as_std_path())
        .stdin(Stdio::null())
        .output();

    let report = match result {
        Ok(output) if output.status.success() => CommandReport {
            command,
            succeeded: true,
            detail: None,
        },
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            CommandReport {
                command,
                succeeded: false,
                detail: Some(detail),
            }
        }
        Err(e) => CommandReport {
            command,
            succeeded: false,
            detail: Some(format!("failed to run: {e}")),
        },
    };

    if report.succeeded {
        debug!(command = %report.command, "best-effort command succeeded");
    } else {
        warn!(
            command = %report.command,
            detail = report.detail.as_deref().unwrap_or(""),
            "best-effort command failed, ignoring"
        );
    }
    report
}

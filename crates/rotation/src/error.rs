//! Error types for backup runs.
//!
//! [`StoreError`] describes a failed operation of an
//! [`ExecutionContext`](crate::store::ExecutionContext). [`BackupError`] wraps
//! it with the pipeline stage that was running, so the binary can report the
//! stage and exit with the status of the command that actually failed.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::exit_code::ExitCode;
use crate::tier::Tier;

/// Result type for execution context operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for the backup pipeline.
pub type BackupResult<T> = Result<T, BackupError>;

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// A failed operation against the snapshot store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Local filesystem operation failed.
    #[error("failed to {operation} '{}': {source}", .path.display())]
    Io {
        /// What was being attempted, e.g. `"rename"`.
        operation: &'static str,
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An entry that had to exist was missing.
    #[error("'{}' does not exist", .path.display())]
    Missing {
        /// The missing path.
        path: PathBuf,
    },

    /// The remote shell could not be started.
    #[error("failed to run `{command}` on {endpoint}: {source}")]
    Spawn {
        /// Rendered remote command.
        command: String,
        /// Remote endpoint description.
        endpoint: String,
        /// Spawn error.
        #[source]
        source: io::Error,
    },

    /// A remote query answered with a status outside its protocol.
    #[error("remote query `{command}` exited with unexpected status {status}{}", stderr_suffix(.stderr))]
    UnexpectedStatus {
        /// Rendered remote command.
        command: String,
        /// Exit status reported by the channel.
        status: i32,
        /// Captured stderr.
        stderr: String,
    },

    /// A mutating remote command failed.
    #[error("remote command `{command}` failed with status {status}{}", stderr_suffix(.stderr))]
    CommandFailed {
        /// Rendered remote command.
        command: String,
        /// Exit status reported by the channel.
        status: i32,
        /// Captured stderr.
        stderr: String,
    },

    /// An internally generated glob could not be compiled.
    #[error("invalid entry pattern '{pattern}': {source}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// Compilation error.
        #[source]
        source: globset::Error,
    },
}

impl StoreError {
    /// Wraps a local I/O failure.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Exit status a process should report for this failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { .. } | Self::Missing { .. } => ExitCode::FileIo.as_i32(),
            Self::Spawn { source, .. } => ExitCode::from_spawn_error(source).as_i32(),
            Self::UnexpectedStatus { .. } => ExitCode::StreamIo.as_i32(),
            Self::CommandFailed { status, .. } => {
                if *status > 0 {
                    *status
                } else {
                    ExitCode::StreamIo.as_i32()
                }
            }
            Self::Pattern { .. } => ExitCode::Syntax.as_i32(),
        }
    }
}

/// Step of the promotion protocol that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromotionStep {
    /// Checking for the staging and target entries.
    Inspect,
    /// Removing entries that occupy the target slot.
    ClearSlot,
    /// Renaming the staging entry to its final name.
    Rename,
    /// Removing the previous `latest.snapshot` alias.
    RemoveLatest,
    /// Pointing `latest.snapshot` at the new entry.
    LinkLatest,
}

impl fmt::Display for PromotionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inspect => "inspect staging entry",
            Self::ClearSlot => "clear target slot",
            Self::Rename => "rename staging entry",
            Self::RemoveLatest => "remove latest alias",
            Self::LinkLatest => "link latest alias",
        })
    }
}

/// Errors that abort a backup run.
#[derive(Debug, Error)]
pub enum BackupError {
    /// A source or destination could not be used.
    #[error("invalid location '{input}': {reason}")]
    InvalidLocation {
        /// The text as given.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An option value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The transfer engine exited with a non-zero status.
    #[error("transfer failed with status {status}; staging entry left in place")]
    TransferFailed {
        /// Exit status of the transfer.
        status: i32,
    },

    /// The transfer engine could not be started.
    #[error("failed to run transfer program '{program}': {source}")]
    TransferSpawn {
        /// Program that was executed.
        program: String,
        /// Spawn error.
        #[source]
        source: io::Error,
    },

    /// A slot holds more than one entry.
    #[error("{tier} slot {slot} holds {} entries ({}); refusing to pick one", .entries.len(), .entries.join(", "))]
    ConsistencyViolation {
        /// Tier containing the slot.
        tier: Tier,
        /// Rendered slot key.
        slot: String,
        /// Every entry found in the slot.
        entries: Vec<String>,
    },

    /// A promotion step failed; earlier steps are not rolled back.
    #[error("promotion failed at step '{step}': {source}")]
    PromotionFailed {
        /// Step that failed.
        step: PromotionStep,
        /// Underlying store failure.
        #[source]
        source: StoreError,
    },

    /// Removing an expired snapshot failed after a successful promotion.
    #[error("failed to prune '{entry}': {source}")]
    RetentionFailed {
        /// Entry being removed.
        entry: String,
        /// Underlying store failure.
        #[source]
        source: StoreError,
    },

    /// A remote inventory query returned a status outside its protocol.
    #[error("remote command `{command}` exited with unexpected status {status}{}", stderr_suffix(.stderr))]
    RemoteChannelError {
        /// Rendered remote command.
        command: String,
        /// Exit status reported by the channel.
        status: i32,
        /// Captured stderr.
        stderr: String,
    },

    /// A store operation outside promotion and retention failed.
    #[error(transparent)]
    Store(StoreError),
}

impl BackupError {
    /// Creates an [`BackupError::InvalidLocation`].
    pub fn invalid_location(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLocation {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Exit status a process should report for this failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidLocation { .. } | Self::InvalidConfig(_) => ExitCode::Syntax.as_i32(),
            Self::TransferFailed { status } => *status,
            Self::TransferSpawn { source, .. } => ExitCode::from_spawn_error(source).as_i32(),
            Self::ConsistencyViolation { .. } => ExitCode::FileSelect.as_i32(),
            Self::PromotionFailed { source, .. } | Self::RetentionFailed { source, .. } => {
                source.exit_code()
            }
            Self::RemoteChannelError { .. } => ExitCode::StreamIo.as_i32(),
            Self::Store(source) => source.exit_code(),
        }
    }
}

impl From<StoreError> for BackupError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UnexpectedStatus {
                command,
                status,
                stderr,
            } => Self::RemoteChannelError {
                command,
                status,
                stderr,
            },
            other => Self::Store(other),
        }
    }
}

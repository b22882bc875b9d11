use std::env;
use std::ffi::{OsStr, OsString};
use std::process::Command;

use rotation::{BackupError, BackupResult, TransferEngine, TransferRequest, TransferStatus};
use tracing::debug;
use transport::exit_status_code;

use crate::args::build_arguments;

/// Environment variable naming the rsync binary.
pub const RSYNC_ENV: &str = "OC_BACKUP_RSYNC";

/// Program used when neither `--rsync-path` nor [`RSYNC_ENV`] is given.
pub const DEFAULT_PROGRAM: &str = "rsync";

/// Runs the system rsync as a child process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RsyncEngine {
    program: OsString,
}

impl RsyncEngine {
    /// Uses `program` as the rsync binary.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Picks the binary from an explicit override, then [`RSYNC_ENV`], then
    /// [`DEFAULT_PROGRAM`].
    #[must_use]
    pub fn resolve(explicit: Option<OsString>) -> Self {
        Self::resolve_with(explicit, env::var_os(RSYNC_ENV))
    }

    /// Like [`RsyncEngine::resolve`] with the environment value supplied by
    /// the caller. Empty values are ignored.
    #[must_use]
    pub fn resolve_with(explicit: Option<OsString>, from_env: Option<OsString>) -> Self {
        let program = explicit
            .filter(|value| !value.is_empty())
            .or_else(|| from_env.filter(|value| !value.is_empty()))
            .unwrap_or_else(|| OsString::from(DEFAULT_PROGRAM));
        Self { program }
    }

    /// The rsync binary.
    #[must_use]
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// The full command for `request`, ready to spawn.
    #[must_use]
    pub fn command(&self, request: &TransferRequest) -> Command {
        let mut command = Command::new(&self.program);
        command.args(build_arguments(request));
        command
    }
}

impl Default for RsyncEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl TransferEngine for RsyncEngine {
    fn transfer(&self, request: &TransferRequest) -> BackupResult<TransferStatus> {
        let mut command = self.command(request);
        debug!(
            target: "backup::transfer",
            program = %self.program.to_string_lossy(),
            args = ?command.get_args().collect::<Vec<_>>(),
            "spawning rsync"
        );

        let status = command.status().map_err(|source| BackupError::TransferSpawn {
            program: self.program.to_string_lossy().into_owned(),
            source,
        })?;

        let exit_code = exit_status_code(status);
        debug!(target: "backup::transfer", exit_code, "rsync finished");
        Ok(TransferStatus { exit_code })
    }
}

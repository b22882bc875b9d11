//! Process exit codes reported by `oc-backup`.
//!
//! The values follow rsync's `errcode.h` so that scripts wrapping a backup
//! run can treat its status like the status of the transfer itself. Only the
//! codes a backup run can produce are modelled; a failing transfer or remote
//! command passes its own status through unchanged.

use std::fmt;
use std::io;

/// Exit codes produced by the backup pipeline itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful completion (RERR_OK = 0).
    Ok = 0,

    /// Syntax or usage error (RERR_SYNTAX = 1).
    ///
    /// Returned for unusable locations and invalid option values.
    Syntax = 1,

    /// Errors selecting input/output files or directories (RERR_FILESELECT = 3).
    ///
    /// Returned when the snapshot store holds more than one entry for a slot.
    FileSelect = 3,

    /// Error in file I/O (RERR_FILEIO = 11).
    ///
    /// Returned for local filesystem failures while maintaining the store.
    FileIo = 11,

    /// Error in the data stream (RERR_STREAMIO = 12).
    ///
    /// Returned when a remote query answers with a status it never produces
    /// for a well-formed request.
    StreamIo = 12,

    /// Command cannot be run (RERR_CMD_RUN = 126).
    CommandRun = 126,

    /// Command not found (RERR_CMD_NOTFOUND = 127).
    ///
    /// Returned when the remote shell or rsync binary is not found.
    CommandNotFound = 127,
}

impl ExitCode {
    /// Returns the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns a human-readable description of this exit code.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::Syntax => "syntax or usage error",
            Self::FileSelect => "errors selecting input/output files, dirs",
            Self::FileIo => "error in file IO",
            Self::StreamIo => "error in remote data stream",
            Self::CommandRun => "command could not be run",
            Self::CommandNotFound => "command not found",
        }
    }

    /// Maps a failure to start a child process onto an exit code.
    ///
    /// A missing program is `CommandNotFound`; anything else that prevents
    /// the spawn (permissions, resource limits) is `CommandRun`.
    #[must_use]
    pub fn from_spawn_error(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::CommandNotFound,
            _ => Self::CommandRun,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

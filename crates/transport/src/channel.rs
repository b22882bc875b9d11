//! The remote execution seam used by the snapshot store.

use std::ffi::OsString;
use std::io;
use std::process::ExitStatus;

#[cfg(unix)]
use std::os::unix::process::ExitStatusExt;

/// Maximum exit code representable by a Unix process.
pub const MAX_EXIT_CODE: i32 = u8::MAX as i32;

/// Captured result of a command executed on the remote side.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status of the remote command (see [`exit_status_code`]).
    pub status: i32,
    /// Captured standard output.
    pub stdout: Vec<u8>,
    /// Captured standard error.
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Builds an output with the given status and stdout text.
    #[must_use]
    pub fn new(status: i32, stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// Attaches stderr text.
    #[must_use]
    pub fn with_stderr(mut self, stderr: impl Into<Vec<u8>>) -> Self {
        self.stderr = stderr.into();
        self
    }

    /// Returns true when the command exited with status zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.status == 0
    }

    /// Non-empty stdout lines, decoded lossily.
    pub fn stdout_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.stdout)
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Trimmed stderr text, decoded lossily.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_owned()
    }
}

/// Executes argument vectors on a remote host.
///
/// Implementations receive the program and its arguments as discrete values
/// and are responsible for protecting them from the remote shell. Exit status
/// `0` is success; any other status is returned to the caller unchanged so it
/// can decide what the status means for the command it ran.
pub trait RemoteChannel {
    /// Runs `args[0]` with `args[1..]` on the remote side and waits for it.
    fn execute(&self, args: &[OsString]) -> io::Result<CommandOutput>;

    /// Human readable name of the remote endpoint, used in diagnostics.
    fn describe(&self) -> String;
}

impl<C: RemoteChannel + ?Sized> RemoteChannel for Box<C> {
    fn execute(&self, args: &[OsString]) -> io::Result<CommandOutput> {
        (**self).execute(args)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Converts a child's exit status into a process exit code.
///
/// Signal terminations map to `128 + signal`, capped at [`MAX_EXIT_CODE`].
#[must_use]
pub fn exit_status_code(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => {
            #[cfg(unix)]
            {
                if let Some(signal) = status.signal() {
                    return (128 + signal).min(MAX_EXIT_CODE);
                }
            }

            MAX_EXIT_CODE
        }
    }
}

//! [`RemoteChannel`] implementation backed by the system `ssh` client.

use std::ffi::OsString;
use std::io;

use tracing::trace;

use super::SshCommand;
use crate::channel::{CommandOutput, RemoteChannel};
use crate::quote::quote_args;

/// Runs remote commands through `ssh [options] [user@]host ...`.
#[derive(Clone, Debug)]
pub struct SshChannel {
    host: String,
    user: Option<String>,
    remote_shell: Vec<OsString>,
}

impl SshChannel {
    /// Creates a channel for `host` using the default `ssh` program.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: None,
            remote_shell: Vec::new(),
        }
    }

    /// Sets the remote login name.
    #[must_use]
    pub fn with_user(mut self, user: Option<impl Into<String>>) -> Self {
        self.user = user.map(Into::into);
        self
    }

    /// Uses a parsed remote shell (program followed by its options) instead
    /// of plain `ssh`.
    #[must_use]
    pub fn with_remote_shell(mut self, remote_shell: Vec<OsString>) -> Self {
        self.remote_shell = remote_shell;
        self
    }

    /// Builds the ssh command that would run `args` remotely.
    pub fn command_for(&self, args: &[OsString]) -> SshCommand {
        let mut command = SshCommand::new(&self.host);
        if let Some(user) = &self.user {
            command.set_user(user);
        }

        let mut shell = self.remote_shell.iter();
        if let Some(program) = shell.next() {
            command.set_program(program);
        }
        for option in shell {
            command.push_option(option);
        }

        command.set_remote_command(quote_args(args));
        command
    }
}

impl RemoteChannel for SshChannel {
    fn execute(&self, args: &[OsString]) -> io::Result<CommandOutput> {
        trace!(
            target: "backup::remote",
            "{}: {}",
            self.describe(),
            args.iter()
                .map(|arg| arg.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let output = self.command_for(args).output()?;

        trace!(target: "backup::remote", status = output.status, "remote command finished");
        Ok(output)
    }

    fn describe(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }
}

//! ssh command assembly and the [`SshChannel`] remote channel.

use std::ffi::{OsStr, OsString};
use std::io;
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::channel::{CommandOutput, exit_status_code};

mod channel;

pub use channel::SshChannel;

/// Errors raised while parsing a `-e`/`--rsh` remote shell specification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RemoteShellParseError {
    /// The specification contained no program.
    #[error("remote shell specification is empty")]
    Empty,
    /// A quote was opened but never closed.
    #[error("unterminated {0} quote in remote shell specification")]
    UnterminatedQuote(char),
    /// The specification ended with a lone backslash.
    #[error("trailing backslash in remote shell specification")]
    TrailingEscape,
}

/// Splits a remote shell specification such as `ssh -p 2222 -i '/a b/key'`
/// into program and arguments, honouring single quotes, double quotes and
/// backslash escapes the way a POSIX shell would.
pub fn parse_remote_shell(spec: &OsStr) -> Result<Vec<OsString>, RemoteShellParseError> {
    let text = spec.to_string_lossy();
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(inner) => current.push(inner),
                        None => return Err(RemoteShellParseError::UnterminatedQuote('\'')),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped @ ('"' | '\\' | '$' | '`')) => current.push(escaped),
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => return Err(RemoteShellParseError::UnterminatedQuote('"')),
                        },
                        Some(inner) => current.push(inner),
                        None => return Err(RemoteShellParseError::UnterminatedQuote('"')),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => return Err(RemoteShellParseError::TrailingEscape),
                }
            }
            ch if ch.is_whitespace() => {
                if in_word {
                    args.push(OsString::from(std::mem::take(&mut current)));
                    in_word = false;
                }
            }
            other => {
                in_word = true;
                current.push(other);
            }
        }
    }

    if in_word {
        args.push(OsString::from(current));
    }

    if args.is_empty() {
        return Err(RemoteShellParseError::Empty);
    }

    Ok(args)
}

/// Builder for an `ssh` invocation that runs one remote command.
///
/// Remote arguments are appended verbatim after the target; callers that
/// pass untrusted text must quote it first (see [`crate::quote_args`]).
#[derive(Clone, Debug)]
pub struct SshCommand {
    program: OsString,
    host: OsString,
    user: Option<OsString>,
    options: Vec<OsString>,
    remote_command: Vec<OsString>,
}

impl SshCommand {
    /// Creates a builder targeting `host` with the default `ssh` program.
    #[must_use]
    pub fn new(host: impl Into<OsString>) -> Self {
        Self {
            program: OsString::from("ssh"),
            host: host.into(),
            user: None,
            options: Vec::new(),
            remote_command: Vec::new(),
        }
    }

    /// Overrides the program used to reach the remote host.
    pub fn set_program(&mut self, program: impl Into<OsString>) {
        self.program = program.into();
    }

    /// Sets the remote login name.
    pub fn set_user(&mut self, user: impl Into<OsString>) {
        self.user = Some(user.into());
    }

    /// Appends an option placed before the target.
    pub fn push_option(&mut self, option: impl Into<OsString>) {
        self.options.push(option.into());
    }

    /// Replaces the remote command.
    pub fn set_remote_command<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.remote_command = args.into_iter().map(Into::into).collect();
    }

    fn target(&self) -> OsString {
        let mut target = OsString::new();
        if let Some(user) = &self.user {
            target.push(user);
            target.push("@");
        }
        target.push(&self.host);
        target
    }

    fn command_parts(&self) -> (OsString, Vec<OsString>) {
        // Batch mode makes a missing key fail the run instead of prompting.
        let mut args = vec![OsString::from("-oBatchMode=yes")];
        args.extend(self.options.iter().cloned());
        args.push(self.target());
        args.extend(self.remote_command.iter().cloned());

        (self.program.clone(), args)
    }

    #[cfg(test)]
    pub(crate) fn command_parts_for_testing(&self) -> (OsString, Vec<OsString>) {
        self.command_parts()
    }

    /// Builds the [`Command`] without running it.
    pub fn to_command(&self) -> Command {
        let (program, args) = self.command_parts();
        let mut command = Command::new(program);
        command.args(args);
        command
    }

    /// Runs the command to completion and captures its output.
    ///
    /// Stdin is closed so a remote command can never wait for input.
    pub fn output(&self) -> io::Result<CommandOutput> {
        let output = self
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        Ok(CommandOutput {
            status: exit_status_code(output.status),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(test)]
mod tests;

#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! # Overview
//!
//! `transport` runs commands on the host that holds a remote backup
//! destination. The snapshot store never talks to `ssh` directly; it issues
//! argument vectors through the [`RemoteChannel`] trait and interprets the
//! returned [`CommandOutput`].
//!
//! # Design
//!
//! - [`RemoteChannel`] is the seam between snapshot bookkeeping and process
//!   execution. Tests substitute scripted channels for it.
//! - [`SshChannel`] implements the trait on top of [`SshCommand`], a builder
//!   for `ssh [options] [user@]host command...` invocations.
//! - [`quote_arg`] protects every remote argument from the login shell on the
//!   far side, so directory names containing spaces or glob characters reach
//!   `find`, `mv` and `rm` unchanged.
//! - [`parse_remote_shell`] splits a `-e`/`--rsh` value into program and
//!   options using POSIX shell word rules.
//!
//! # Invariants
//!
//! - Remote commands never inherit stdin; a command that would prompt fails
//!   instead of hanging.
//! - Exit statuses are reported verbatim. Signal terminations map to
//!   `128 + signal`, capped at [`MAX_EXIT_CODE`].
//!
//! # Errors
//!
//! Spawning failures surface as [`std::io::Error`]. Non-zero exit statuses are
//! not errors at this layer; callers decide what a status means for the
//! command they issued.
//!
//! # Examples
//!
//! ```
//! use std::ffi::OsString;
//! use transport::SshChannel;
//!
//! let channel = SshChannel::new("nas").with_user(Some("backup"));
//! let command = channel.command_for(&[
//!     OsString::from("test"),
//!     OsString::from("-e"),
//!     OsString::from("/srv/my backups"),
//! ]);
//! let rendered: Vec<_> = command.to_command().get_args().map(|a| a.to_owned()).collect();
//! assert_eq!(rendered.last().unwrap(), "'/srv/my backups'");
//! ```

mod channel;
mod quote;
pub mod ssh;

pub use channel::{CommandOutput, MAX_EXIT_CODE, RemoteChannel, exit_status_code};
pub use quote::{quote_arg, quote_args};
pub use ssh::{RemoteShellParseError, SshChannel, SshCommand, parse_remote_shell};

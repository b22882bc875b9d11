#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` is the command-line front-end of `oc-backup`. It parses
//! `oc-backup [OPTIONS] SRC DEST`, installs the diagnostics subscriber, opens
//! the destination store and hands the run to [`rotation::run_backup`] with
//! an [`transfer::RsyncEngine`].
//!
//! # Design
//!
//! [`run`] takes the argument iterator together with handles for standard
//! output and error, so tests drive it with in-memory buffers. A `clap`
//! command definition with the built-in help and version flags disabled does
//! the parsing; help and version text are rendered here so their wording is
//! stable.
//!
//! # Invariants
//!
//! - `run` never panics; every failure becomes a non-zero exit code and one
//!   `oc-backup: error: ...` line on the error stream.
//! - Help and version output go to standard output and exit `0`.
//!
//! # Errors
//!
//! Usage errors exit `1`. Failures during the run exit with
//! [`rotation::BackupError::exit_code`].
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let exit_code = cli::run(["oc-backup", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(exit_code, 0);
//! assert!(String::from_utf8(stdout).unwrap().starts_with("oc-backup "));
//! assert!(stderr.is_empty());
//! ```

mod frontend;

pub use frontend::{exit_code_from, run};

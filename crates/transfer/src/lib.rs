#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `transfer` copies the source tree into a snapshot store's staging entry by
//! running the system `rsync`. [`RsyncEngine`] implements
//! [`rotation::TransferEngine`], so the orchestrator never builds command
//! lines itself.
//!
//! # Design
//!
//! [`build_arguments`] turns a [`rotation::TransferRequest`] into discrete
//! arguments: the [`FIXED_ARGS`], the hard-link base, the per-run toggles,
//! excludes, an optional remote shell and the two operands. Nothing passes
//! through a local shell.
//!
//! # Errors
//!
//! A binary that cannot be started yields
//! [`rotation::BackupError::TransferSpawn`]. A non-zero exit status is not an
//! error here; it is returned in [`rotation::TransferStatus`] and the
//! orchestrator decides what to do with it.

mod args;
mod engine;

pub use args::{FIXED_ARGS, build_arguments};
pub use engine::{DEFAULT_PROGRAM, RSYNC_ENV, RsyncEngine};

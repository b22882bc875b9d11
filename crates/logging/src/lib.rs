#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` provides the verbosity model shared by the oc-backup workspace.
//! Diagnostics are grouped into [`LogFlag`] categories (tier selection,
//! transfer, promotion, pruning, store inventory and remote commands), each
//! with its own level so `-v` can be widened per category from the command
//! line.
//!
//! # Design
//!
//! Library crates never print. They emit `tracing` events under the
//! `backup::<flag>` targets listed by [`LogFlag::target`]. With the `tracing`
//! feature enabled the binary installs [`BackupLayer`] through
//! [`init_tracing`], which filters those events through a
//! [`VerbosityConfig`] and renders them as `oc-backup: ...` lines.
//!
//! # Invariants
//!
//! - Error events are never filtered, even in quiet mode.
//! - Warnings are filtered only by quiet mode.
//! - Installing the subscriber twice is not an error; the second call reports
//!   `false` and leaves the first subscriber in place.

mod config;
mod levels;
#[cfg(feature = "tracing")]
mod tracing_bridge;

pub use config::VerbosityConfig;
pub use levels::{LogFlag, LogLevels};
#[cfg(feature = "tracing")]
pub use tracing_bridge::{BackupLayer, LINE_PREFIX, init_tracing, init_tracing_with_filter};

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `rotation` maintains a store of hard-linked snapshots spread over four
//! tiers (daily, weekly, monthly, yearly). Each run copies the source tree
//! into a staging entry, picks the coarsest tier whose slot for today is empty
//! or stale, promotes the staging entry into that slot, repoints
//! `latest.snapshot` and prunes the weekly tier.
//!
//! # Design
//!
//! - [`Location`] parses `[user@]host:path` and local path operands.
//! - [`SnapshotStore`] owns the layout and runs every filesystem operation
//!   through an [`ExecutionContext`]: [`LocalContext`] on this machine,
//!   [`RemoteContext`] over ssh otherwise.
//! - [`select_target`] decides the [`Selection`] for a date from an
//!   [`Inventory`] of slot occupants.
//! - [`promote`] and [`enforce_retention`] mutate the store after a
//!   successful transfer.
//! - [`run_backup`] strings the phases together around a [`TransferEngine`]
//!   supplied by the caller.
//!
//! # Invariants
//!
//! - Each slot holds at most one entry; anything more aborts the run before
//!   the store is touched.
//! - `latest.snapshot` is only repointed after the staging entry has been
//!   renamed into its slot.
//! - A failed transfer never promotes; the staging entry is kept and resumed
//!   by the next run.
//! - The weekly tier never holds more than the configured cap once retention
//!   has run.
//!
//! # Errors
//!
//! Store operations return [`StoreError`]; phases wrap them in
//! [`BackupError`], whose [`BackupError::exit_code`] is the process exit
//! status (see [`ExitCode`]).

mod config;
mod error;
mod exit_code;
mod location;
mod name;
mod orchestrator;
mod promotion;
mod retention;
mod selector;
/// Snapshot store layout and execution contexts.
pub mod store;
mod tier;

pub use config::{BackupConfig, BackupConfigBuilder};
pub use error::{BackupError, BackupResult, PromotionStep, StoreError, StoreResult};
pub use exit_code::ExitCode;
pub use location::Location;
pub use name::{
    LATEST_ENTRY, SNAPSHOT_SUFFIX, STAGING_ENTRY, SnapshotName, compact_date, parse_compact_date,
};
pub use orchestrator::{
    LINK_DEST, RunContext, RunOutcome, TransferEngine, TransferRequest, TransferStatus,
    local_today, run_backup,
};
pub use promotion::{PromotionReport, promote};
pub use retention::{DEFAULT_MAX_WEEKLY, enforce_retention, plan_pruning};
pub use selector::{Inventory, Selection, select_target};
pub use store::{ExecutionContext, LocalContext, RemoteContext, SnapshotStore};
pub use tier::{Slot, Tier, WEEKLY_SLOTS};

//! The backup pipeline: layout, selection, transfer, promotion, retention.
//!
//! A failing transfer aborts before promotion and leaves the staging entry in
//! place for the next run to resume; a failing promotion aborts before
//! retention. Nothing is retried.

use std::ffi::OsString;
use std::path::PathBuf;

use time::{Date, OffsetDateTime};
use tracing::{info, warn};

use crate::config::BackupConfig;
use crate::error::{BackupError, BackupResult};
use crate::location::Location;
use crate::promotion::promote;
use crate::retention::enforce_retention;
use crate::selector::{Selection, select_target};
use crate::store::SnapshotStore;
use crate::tier::Tier;

/// Hard-link base handed to the transfer, relative to the staging entry.
pub const LINK_DEST: &str = "../latest.snapshot";

/// Parameters of one transfer into the staging entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    /// Tree being backed up.
    pub source: Location,
    /// The staging entry.
    pub destination: Location,
    /// Directory unchanged files are hard-linked from, relative to
    /// `destination`.
    pub link_dest: String,
    /// Exclude patterns.
    pub excludes: Vec<String>,
    /// File of exclude patterns.
    pub exclude_from: Option<PathBuf>,
    /// Trial run.
    pub dry_run: bool,
    /// Compress file data.
    pub compress: bool,
    /// Fuzzy basis matching.
    pub fuzzy: bool,
    /// Show progress.
    pub progress: bool,
    /// Remote shell program and options; empty means the transfer default.
    pub remote_shell: Vec<OsString>,
}

impl TransferRequest {
    /// Builds the request for a run of `config` into `store`.
    #[must_use]
    pub fn for_run(config: &BackupConfig, store: &SnapshotStore) -> Self {
        Self {
            source: config.source().clone(),
            destination: store.staging_location(),
            link_dest: LINK_DEST.to_owned(),
            excludes: config.excludes().to_vec(),
            exclude_from: config.exclude_from().cloned(),
            dry_run: config.dry_run(),
            compress: config.compress(),
            fuzzy: config.fuzzy(),
            progress: config.progress(),
            remote_shell: config.remote_shell().to_vec(),
        }
    }
}

/// How the transfer ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferStatus {
    /// Exit status; zero is success.
    pub exit_code: i32,
}

impl TransferStatus {
    /// A successful transfer.
    pub const SUCCESS: Self = Self { exit_code: 0 };

    /// Returns `true` when the transfer completed.
    #[must_use]
    pub const fn success(self) -> bool {
        self.exit_code == 0
    }
}

/// Bulk copy of the source tree into the staging entry.
pub trait TransferEngine {
    /// Runs the transfer to completion.
    fn transfer(&self, request: &TransferRequest) -> BackupResult<TransferStatus>;
}

impl<E: TransferEngine + ?Sized> TransferEngine for &E {
    fn transfer(&self, request: &TransferRequest) -> BackupResult<TransferStatus> {
        (**self).transfer(request)
    }
}

/// Immutable inputs of one run.
#[derive(Debug)]
pub struct RunContext<'a> {
    config: &'a BackupConfig,
    store: &'a SnapshotStore,
    today: Date,
}

impl<'a> RunContext<'a> {
    /// Bundles the configuration, the destination store and the run date.
    #[must_use]
    pub const fn new(config: &'a BackupConfig, store: &'a SnapshotStore, today: Date) -> Self {
        Self {
            config,
            store,
            today,
        }
    }

    /// Run configuration.
    #[must_use]
    pub const fn config(&self) -> &BackupConfig {
        self.config
    }

    /// Destination store.
    #[must_use]
    pub const fn store(&self) -> &SnapshotStore {
        self.store
    }

    /// Date the snapshot is taken on.
    #[must_use]
    pub const fn today(&self) -> Date {
        self.today
    }
}

/// Summary of a completed run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    /// Where the snapshot went (or would have gone, for a dry run).
    pub selection: Selection,
    /// `true` when the staging entry was promoted.
    pub promoted: bool,
    /// `true` when a staging entry from an interrupted run was found.
    pub resumed: bool,
    /// Entries that replaced slot occupants during promotion.
    pub replaced: Vec<String>,
    /// Weekly entries removed by retention.
    pub pruned: Vec<String>,
    /// `true` when retention was not enforced because the store is remote.
    pub retention_skipped: bool,
}

/// Today's date in the local time zone, falling back to UTC when the local
/// offset cannot be determined.
#[must_use]
pub fn local_today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Runs one backup.
pub fn run_backup(context: &RunContext<'_>, engine: &dyn TransferEngine) -> BackupResult<RunOutcome> {
    let config = context.config();
    let store = context.store();

    if !config.dry_run() {
        store.ensure_tier_directories()?;
    }

    let resumed = store.has_staging()?;
    if resumed {
        info!(
            target: "backup::transfer",
            "resuming interrupted run from {}",
            store.staging_location()
        );
    }

    let selection = select_target(context.today(), store)?;

    let request = TransferRequest::for_run(config, store);
    info!(
        target: "backup::transfer",
        link_dest = %request.link_dest,
        "transferring {} to {}",
        request.source,
        request.destination
    );
    let status = engine.transfer(&request)?;
    if !status.success() {
        return Err(BackupError::TransferFailed {
            status: status.exit_code,
        });
    }

    let mut outcome = RunOutcome {
        selection,
        promoted: false,
        resumed,
        replaced: Vec::new(),
        pruned: Vec::new(),
        retention_skipped: false,
    };

    if config.dry_run() {
        info!(
            target: "backup::promote",
            "dry run: would promote to {}",
            outcome.selection.relative_path()
        );
        return Ok(outcome);
    }

    let report = promote(store, &outcome.selection)?;
    outcome.promoted = true;
    outcome.replaced = report.replaced;

    if store.is_remote() {
        warn!(
            target: "backup::prune",
            "weekly retention is not enforced on remote destinations; prune {} manually",
            store.tier_dir(Tier::Weekly).display()
        );
        outcome.retention_skipped = true;
    } else {
        outcome.pruned = enforce_retention(store, &outcome.selection, config.max_weekly())?;
    }

    Ok(outcome)
}

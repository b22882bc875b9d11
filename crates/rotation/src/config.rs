//! Run configuration assembled by the front-end.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::{BackupError, BackupResult};
use crate::location::Location;
use crate::retention::DEFAULT_MAX_WEEKLY;

/// Everything a backup run needs besides the date and the store handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackupConfig {
    source: Location,
    destination: Location,
    dry_run: bool,
    compress: bool,
    fuzzy: bool,
    progress: bool,
    excludes: Vec<String>,
    exclude_from: Option<PathBuf>,
    max_weekly: usize,
    remote_shell: Vec<OsString>,
}

impl BackupConfig {
    /// Creates a new [`BackupConfigBuilder`].
    #[must_use]
    pub fn builder(source: Location, destination: Location) -> BackupConfigBuilder {
        BackupConfigBuilder::new(source, destination)
    }

    /// Tree being backed up.
    #[must_use]
    pub const fn source(&self) -> &Location {
        &self.source
    }

    /// Root of the snapshot store.
    #[must_use]
    pub const fn destination(&self) -> &Location {
        &self.destination
    }

    /// Returns `true` for a trial run that changes nothing.
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Compress file data during the transfer.
    #[must_use]
    pub const fn compress(&self) -> bool {
        self.compress
    }

    /// Look for similar basis files for missing destination files.
    #[must_use]
    pub const fn fuzzy(&self) -> bool {
        self.fuzzy
    }

    /// Show transfer progress.
    #[must_use]
    pub const fn progress(&self) -> bool {
        self.progress
    }

    /// Exclude patterns in the order given.
    #[must_use]
    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }

    /// File of exclude patterns.
    #[must_use]
    pub fn exclude_from(&self) -> Option<&PathBuf> {
        self.exclude_from.as_ref()
    }

    /// Cap on weekly snapshots.
    #[must_use]
    pub const fn max_weekly(&self) -> usize {
        self.max_weekly
    }

    /// Remote shell program and options; empty means plain `ssh`.
    #[must_use]
    pub fn remote_shell(&self) -> &[OsString] {
        &self.remote_shell
    }
}

/// Builder for [`BackupConfig`].
#[derive(Clone, Debug)]
pub struct BackupConfigBuilder {
    source: Location,
    destination: Location,
    dry_run: bool,
    compress: bool,
    fuzzy: bool,
    progress: bool,
    excludes: Vec<String>,
    exclude_from: Option<PathBuf>,
    max_weekly: usize,
    remote_shell: Vec<OsString>,
}

impl BackupConfigBuilder {
    /// Starts from the defaults: compression, fuzzy matching and progress on,
    /// no excludes, five weekly snapshots.
    #[must_use]
    pub fn new(source: Location, destination: Location) -> Self {
        Self {
            source,
            destination,
            dry_run: false,
            compress: true,
            fuzzy: true,
            progress: true,
            excludes: Vec::new(),
            exclude_from: None,
            max_weekly: DEFAULT_MAX_WEEKLY,
            remote_shell: Vec::new(),
        }
    }

    /// Requests a trial run.
    #[must_use]
    #[doc(alias = "--dry-run")]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enables or disables transfer compression.
    #[must_use]
    #[doc(alias = "--no-compress")]
    pub const fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Enables or disables fuzzy basis matching.
    #[must_use]
    #[doc(alias = "--no-fuzzy")]
    pub const fn fuzzy(mut self, fuzzy: bool) -> Self {
        self.fuzzy = fuzzy;
        self
    }

    /// Enables or disables progress output.
    #[must_use]
    #[doc(alias = "--no-progress")]
    pub const fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Appends one exclude pattern.
    #[must_use]
    #[doc(alias = "--exclude")]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    /// Appends several exclude patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Sets the exclude file.
    #[must_use]
    #[doc(alias = "--exclude-from")]
    pub fn exclude_from(mut self, path: Option<PathBuf>) -> Self {
        self.exclude_from = path;
        self
    }

    /// Sets the weekly cap.
    #[must_use]
    #[doc(alias = "--max-weekly")]
    pub const fn max_weekly(mut self, max_weekly: usize) -> Self {
        self.max_weekly = max_weekly;
        self
    }

    /// Sets the remote shell program and options.
    #[must_use]
    #[doc(alias = "--rsh")]
    #[doc(alias = "-e")]
    pub fn remote_shell(mut self, remote_shell: Vec<OsString>) -> Self {
        self.remote_shell = remote_shell;
        self
    }

    /// Validates and finalises the configuration.
    pub fn build(self) -> BackupResult<BackupConfig> {
        if self.max_weekly == 0 {
            return Err(BackupError::InvalidConfig(
                "--max-weekly must be at least 1".to_owned(),
            ));
        }

        if self.source.is_remote() && self.destination.is_remote() {
            return Err(BackupError::invalid_location(
                self.destination.to_string(),
                "source and destination cannot both be remote",
            ));
        }

        Ok(BackupConfig {
            source: self.source,
            destination: self.destination,
            dry_run: self.dry_run,
            compress: self.compress,
            fuzzy: self.fuzzy,
            progress: self.progress,
            excludes: self.excludes,
            exclude_from: self.exclude_from,
            max_weekly: self.max_weekly,
            remote_shell: self.remote_shell,
        })
    }
}

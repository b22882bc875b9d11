//! The on-disk snapshot store.
//!
//! ```text
//! <root>/
//!   daily/   weekly/   monthly/   yearly/     <slot>-<YYYYMMDD>.snapshot
//!   incomplete.snapshot                        staging entry
//!   latest.snapshot -> <tier>/<entry>          alias of the newest snapshot
//! ```
//!
//! Every operation goes through one [`ExecutionContext`] chosen when the store
//! is opened: [`LocalContext`] for local destinations, [`RemoteContext`] over
//! an ssh [`SshChannel`](transport::SshChannel) otherwise.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;
use transport::SshChannel;

use crate::error::{BackupResult, StoreResult};
use crate::location::Location;
use crate::name::{LATEST_ENTRY, SNAPSHOT_SUFFIX, STAGING_ENTRY};
use crate::selector::Inventory;
use crate::tier::Tier;

mod context;
mod local;
mod remote;

pub use context::ExecutionContext;
pub use local::LocalContext;
pub use remote::RemoteContext;

/// A snapshot store rooted at a local or remote directory.
pub struct SnapshotStore {
    location: Location,
    context: Box<dyn ExecutionContext>,
}

impl SnapshotStore {
    /// Creates a store at `location` that runs operations through `context`.
    pub fn new(location: Location, context: Box<dyn ExecutionContext>) -> Self {
        Self { location, context }
    }

    /// Opens the store at `location`, choosing the execution context from
    /// it. `remote_shell` replaces plain `ssh` for remote locations.
    pub fn open(location: Location, remote_shell: &[OsString]) -> Self {
        let context: Box<dyn ExecutionContext> = match location.host() {
            Some(host) => Box::new(RemoteContext::new(
                SshChannel::new(host)
                    .with_user(location.user())
                    .with_remote_shell(remote_shell.to_vec()),
            )),
            None => Box::new(LocalContext::new()),
        };
        Self::new(location, context)
    }

    /// The location of the store root.
    #[must_use]
    pub const fn location(&self) -> &Location {
        &self.location
    }

    /// The store root on the side that owns it.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.location.path()
    }

    /// The execution context all operations go through.
    #[must_use]
    pub fn context(&self) -> &dyn ExecutionContext {
        self.context.as_ref()
    }

    /// Returns `true` when the store lives on another host.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.context.is_remote()
    }

    /// Directory of `tier`.
    #[must_use]
    pub fn tier_dir(&self, tier: Tier) -> PathBuf {
        self.root().join(tier.dir_name())
    }

    /// Path of entry `name` inside `tier`.
    #[must_use]
    pub fn entry_path(&self, tier: Tier, name: &str) -> PathBuf {
        self.tier_dir(tier).join(name)
    }

    /// Path of the staging entry.
    #[must_use]
    pub fn staging_path(&self) -> PathBuf {
        self.root().join(STAGING_ENTRY)
    }

    /// Path of the `latest.snapshot` alias.
    #[must_use]
    pub fn latest_path(&self) -> PathBuf {
        self.root().join(LATEST_ENTRY)
    }

    /// The staging entry as a transfer destination.
    #[must_use]
    pub fn staging_location(&self) -> Location {
        self.location.join(STAGING_ENTRY)
    }

    /// Creates the four tier directories. Idempotent.
    pub fn ensure_tier_directories(&self) -> StoreResult<()> {
        for tier in Tier::ALL {
            self.context.create_dirs(&self.tier_dir(tier))?;
        }
        debug!(target: "backup::store", root = %self.location, "tier directories present");
        Ok(())
    }

    /// Entry names in `tier` matching the glob `pattern`.
    pub fn exists(&self, tier: Tier, pattern: &str) -> StoreResult<Vec<String>> {
        let entries = self.context.find_entries(&self.tier_dir(tier), pattern)?;
        debug!(
            target: "backup::store",
            tier = %tier,
            pattern,
            matches = entries.len(),
            "inventory"
        );
        Ok(entries)
    }

    /// Every `*.snapshot` entry in `tier`, in lexical order.
    pub fn list_entries(&self, tier: Tier) -> StoreResult<Vec<String>> {
        self.exists(tier, &format!("*{SNAPSHOT_SUFFIX}"))
    }

    /// Returns `true` if a staging entry is present.
    pub fn has_staging(&self) -> StoreResult<bool> {
        self.context.path_exists(&self.staging_path())
    }

    /// Returns `true` if the `latest.snapshot` alias is present.
    pub fn has_latest(&self) -> StoreResult<bool> {
        Ok(self.latest_target()?.is_some())
    }

    /// Content of the `latest.snapshot` alias.
    pub fn latest_target(&self) -> StoreResult<Option<PathBuf>> {
        self.context.read_link(&self.latest_path())
    }
}

impl Inventory for SnapshotStore {
    fn matching(&self, tier: Tier, pattern: &str) -> BackupResult<Vec<String>> {
        Ok(self.exists(tier, pattern)?)
    }
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("location", &self.location)
            .field("context", &self.context.describe())
            .finish()
    }
}

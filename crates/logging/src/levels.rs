//! crates/logging/src/levels.rs
//! Flag enum and level structure for diagnostic categories.

/// Diagnostic categories emitted while rotating snapshots.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LogFlag {
    /// Tier and slot selection.
    Tier,
    /// Transfer engine invocation.
    Transfer,
    /// Promotion of the staging entry and alias updates.
    Promote,
    /// Retention pruning.
    Prune,
    /// Snapshot store layout and inventory queries.
    Store,
    /// Commands executed over the remote channel.
    Remote,
}

impl LogFlag {
    /// Every flag, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Tier,
        Self::Transfer,
        Self::Promote,
        Self::Prune,
        Self::Store,
        Self::Remote,
    ];

    /// Returns the token used for this flag on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tier => "tier",
            Self::Transfer => "transfer",
            Self::Promote => "promote",
            Self::Prune => "prune",
            Self::Store => "store",
            Self::Remote => "remote",
        }
    }

    /// Looks up a flag by its command-line token.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.name() == name)
    }

    /// Returns the tracing target that maps onto this flag.
    #[must_use]
    pub const fn target(self) -> &'static str {
        match self {
            Self::Tier => "backup::tier",
            Self::Transfer => "backup::transfer",
            Self::Promote => "backup::promote",
            Self::Prune => "backup::prune",
            Self::Store => "backup::store",
            Self::Remote => "backup::remote",
        }
    }
}

/// Verbosity level for each flag.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct LogLevels {
    /// Tier selection level.
    pub tier: u8,
    /// Transfer invocation level.
    pub transfer: u8,
    /// Promotion level.
    pub promote: u8,
    /// Retention level.
    pub prune: u8,
    /// Store inventory level.
    pub store: u8,
    /// Remote command level.
    pub remote: u8,
}

impl LogLevels {
    /// Get the level for a specific flag.
    pub fn get(&self, flag: LogFlag) -> u8 {
        match flag {
            LogFlag::Tier => self.tier,
            LogFlag::Transfer => self.transfer,
            LogFlag::Promote => self.promote,
            LogFlag::Prune => self.prune,
            LogFlag::Store => self.store,
            LogFlag::Remote => self.remote,
        }
    }

    /// Set the level for a specific flag.
    pub fn set(&mut self, flag: LogFlag, level: u8) {
        match flag {
            LogFlag::Tier => self.tier = level,
            LogFlag::Transfer => self.transfer = level,
            LogFlag::Promote => self.promote = level,
            LogFlag::Prune => self.prune = level,
            LogFlag::Store => self.store = level,
            LogFlag::Remote => self.remote = level,
        }
    }

    /// Set all flags to the specified level.
    pub fn set_all(&mut self, level: u8) {
        for flag in LogFlag::ALL {
            self.set(flag, level);
        }
    }
}

//! Choosing the tier and slot a new snapshot is promoted into.
//!
//! Tiers are checked coarsest first and the first unmet condition wins:
//!
//! 1. yearly, when this year's slot is empty;
//! 2. monthly, when this month's slot is empty or holds an entry from
//!    another year;
//! 3. weekly, when this week's slot is empty or holds an entry from another
//!    month;
//! 4. daily, keyed by ISO weekday, otherwise.
//!
//! A slot occupant whose name does not parse counts as stale. A slot holding
//! two or more entries is a consistency violation and aborts the run.

use std::fmt;

use time::Date;
use tracing::info;

use crate::error::{BackupError, BackupResult};
use crate::name::{SnapshotName, compact_date};
use crate::tier::{Slot, Tier};

/// Read access to the entries of a snapshot store.
pub trait Inventory {
    /// Entry names in `tier` matching the glob `pattern`.
    fn matching(&self, tier: Tier, pattern: &str) -> BackupResult<Vec<String>>;
}

impl<I: Inventory + ?Sized> Inventory for &I {
    fn matching(&self, tier: Tier, pattern: &str) -> BackupResult<Vec<String>> {
        (**self).matching(tier, pattern)
    }
}

/// Where today's snapshot goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    slot: Slot,
    date: Date,
}

impl Selection {
    /// Creates a selection for `date` in `tier`.
    #[must_use]
    pub fn new(tier: Tier, date: Date) -> Self {
        Self {
            slot: Slot::for_date(tier, date),
            date,
        }
    }

    /// Selected tier.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.slot.tier()
    }

    /// Selected slot.
    #[must_use]
    pub const fn slot(&self) -> Slot {
        self.slot
    }

    /// Date of the snapshot.
    #[must_use]
    pub const fn date(&self) -> Date {
        self.date
    }

    /// The parsed entry name.
    #[must_use]
    pub fn name(&self) -> SnapshotName {
        SnapshotName::new(self.slot.to_string(), self.date)
    }

    /// `<slot>-<YYYYMMDD>`, e.g. `03-20240301`.
    #[must_use]
    pub fn identifier(&self) -> String {
        format!("{}-{}", self.slot, compact_date(self.date))
    }

    /// `<slot>-<YYYYMMDD>.snapshot`.
    #[must_use]
    pub fn entry_name(&self) -> String {
        self.name().file_name()
    }

    /// `<tier>/<slot>-<YYYYMMDD>.snapshot`, the content of the latest alias.
    #[must_use]
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.tier().dir_name(), self.entry_name())
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tier(), self.identifier())
    }
}

/// What currently occupies a slot.
enum Occupant {
    Empty,
    Managed(SnapshotName),
    Foreign(String),
}

fn occupant<I: Inventory + ?Sized>(inventory: &I, slot: Slot) -> BackupResult<Occupant> {
    let mut entries = inventory.matching(slot.tier(), &slot.pattern())?;
    match entries.len() {
        0 => Ok(Occupant::Empty),
        1 => {
            let entry = entries.remove(0);
            Ok(SnapshotName::parse(&entry).map_or(Occupant::Foreign(entry), Occupant::Managed))
        }
        _ => Err(BackupError::ConsistencyViolation {
            tier: slot.tier(),
            slot: slot.to_string(),
            entries,
        }),
    }
}

/// Decides whether `tier` should receive today's snapshot.
fn wants(tier: Tier, today: Date, occupant: &Occupant) -> bool {
    match occupant {
        Occupant::Empty | Occupant::Foreign(_) => true,
        Occupant::Managed(name) => match tier {
            Tier::Yearly => false,
            Tier::Monthly => name.date().year() != today.year(),
            Tier::Weekly => {
                name.date().year() != today.year() || name.date().month() != today.month()
            }
            Tier::Daily => true,
        },
    }
}

/// Selects the tier and slot for a snapshot taken on `today`.
pub fn select_target<I: Inventory + ?Sized>(today: Date, inventory: &I) -> BackupResult<Selection> {
    let mut selected = Tier::Daily;
    for tier in [Tier::Yearly, Tier::Monthly, Tier::Weekly] {
        let occupant = occupant(inventory, Slot::for_date(tier, today))?;
        if let Occupant::Foreign(entry) = &occupant {
            info!(target: "backup::tier", tier = %tier, entry = %entry, "treating unrecognised entry as stale");
        }
        if wants(tier, today, &occupant) {
            selected = tier;
            break;
        }
    }

    let selection = Selection::new(selected, today);
    info!(target: "backup::tier", tier = %selected, slot = %selection.slot(), "selected");
    Ok(selection)
}

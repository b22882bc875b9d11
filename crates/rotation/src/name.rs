//! Entry names inside the snapshot store.
//!
//! A managed snapshot is named `<slot>-<YYYYMMDD>.snapshot`. Anything else in
//! a tier directory is left alone by retention and treated as a stale
//! occupant by tier selection.

use std::fmt;

use time::{Date, Month};

/// Suffix shared by every entry of the store, including the staging entry.
pub const SNAPSHOT_SUFFIX: &str = ".snapshot";

/// Name of the entry the transfer writes into.
pub const STAGING_ENTRY: &str = "incomplete.snapshot";

/// Name of the alias pointing at the most recently promoted snapshot.
pub const LATEST_ENTRY: &str = "latest.snapshot";

/// Renders a date as `YYYYMMDD`.
#[must_use]
pub fn compact_date(date: Date) -> String {
    format!(
        "{:04}{:02}{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Parses an 8-digit `YYYYMMDD` date.
#[must_use]
pub fn parse_compact_date(text: &str) -> Option<Date> {
    if text.len() != 8 || !text.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    let year: i32 = text[0..4].parse().ok()?;
    let month: u8 = text[4..6].parse().ok()?;
    let day: u8 = text[6..8].parse().ok()?;
    Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}

/// A parsed `<slot>-<YYYYMMDD>.snapshot` entry name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SnapshotName {
    slot: String,
    date: Date,
}

impl SnapshotName {
    /// Creates a name from its rendered slot and date.
    #[must_use]
    pub fn new(slot: impl Into<String>, date: Date) -> Self {
        Self {
            slot: slot.into(),
            date,
        }
    }

    /// Parses an entry name, returning `None` for anything that is not a
    /// managed snapshot.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(SNAPSHOT_SUFFIX)?;
        let (slot, date) = stem.rsplit_once('-')?;
        if slot.is_empty() || !slot.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
        Some(Self::new(slot, parse_compact_date(date)?))
    }

    /// The rendered slot key.
    #[must_use]
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// The date the snapshot was taken.
    #[must_use]
    pub const fn date(&self) -> Date {
        self.date
    }

    /// `<slot>-<YYYYMMDD>` without the suffix.
    #[must_use]
    pub fn identifier(&self) -> String {
        format!("{}-{}", self.slot, compact_date(self.date))
    }

    /// The full entry name including the `.snapshot` suffix.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}{SNAPSHOT_SUFFIX}", self.identifier())
    }
}

impl fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

//! Rotation tiers and the slot keys that name entries within them.

use std::fmt;

use time::Date;

/// One of the four rotation granularities of the snapshot store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// One entry per ISO weekday.
    Daily,
    /// Five rotating weekly slots.
    Weekly,
    /// One entry per calendar month.
    Monthly,
    /// One entry per calendar year.
    Yearly,
}

impl Tier {
    /// All tiers in directory-creation order.
    pub const ALL: [Self; 4] = [Self::Daily, Self::Weekly, Self::Monthly, Self::Yearly];

    /// Tiers in selection precedence, coarsest first.
    pub const PRECEDENCE: [Self; 4] = [Self::Yearly, Self::Monthly, Self::Weekly, Self::Daily];

    /// Name of the tier directory beneath the store root.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Parses a tier directory name.
    #[must_use]
    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.dir_name() == name)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Number of rotating weekly slots.
pub const WEEKLY_SLOTS: u8 = 5;

/// The slot a date occupies within a tier.
///
/// | tier    | key                        | rendered |
/// |---------|----------------------------|----------|
/// | yearly  | calendar year              | `2024`   |
/// | monthly | month number               | `03`     |
/// | weekly  | `(iso_week mod 5) + 1`     | `5`      |
/// | daily   | ISO weekday, Monday = 1    | `5`      |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Slot {
    tier: Tier,
    key: i32,
}

impl Slot {
    /// Computes the slot `date` falls into for `tier`.
    #[must_use]
    pub fn for_date(tier: Tier, date: Date) -> Self {
        let key = match tier {
            Tier::Yearly => date.year(),
            Tier::Monthly => i32::from(u8::from(date.month())),
            Tier::Weekly => i32::from(date.iso_week() % WEEKLY_SLOTS + 1),
            Tier::Daily => i32::from(date.weekday().number_from_monday()),
        };
        Self { tier, key }
    }

    /// The tier this slot belongs to.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    /// The numeric slot key.
    #[must_use]
    pub const fn key(&self) -> i32 {
        self.key
    }

    /// Glob matching every entry stored in this slot, whatever its date.
    #[must_use]
    pub fn pattern(&self) -> String {
        format!("{self}-*{}", crate::name::SNAPSHOT_SUFFIX)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tier {
            Tier::Yearly => write!(f, "{:04}", self.key),
            Tier::Monthly => write!(f, "{:02}", self.key),
            Tier::Weekly | Tier::Daily => write!(f, "{}", self.key),
        }
    }
}

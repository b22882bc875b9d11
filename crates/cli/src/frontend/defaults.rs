//! Constants shared across the CLI front-end.

use time::{format_description::FormatItem, macros::format_description};

/// Name used in diagnostics and help output.
pub(crate) const PROGRAM_NAME: &str = "oc-backup";

/// Exclude file picked up from the home directory when `--exclude-from` is
/// not given.
pub(super) const DEFAULT_EXCLUDE_FILE: &str = ".backup/excludes";

/// Accepted format of `--date`.
pub(super) const DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month padding:zero]-[day padding:zero]");

/// Deterministic help text.
pub(super) const HELP_TEXT: &str = concat!(
    "oc-backup ",
    env!("CARGO_PKG_VERSION"),
    "\n",
    "Rotating hard-linked snapshots on top of rsync.\n",
    "\n",
    "Usage: oc-backup [OPTIONS] SRC DEST\n",
    "\n",
    "SRC and DEST are local paths or [USER@]HOST:PATH; at most one may be remote.\n",
    "Each run copies SRC into DEST/incomplete.snapshot, promotes it into the\n",
    "daily, weekly, monthly or yearly tier and points DEST/latest.snapshot at it.\n",
    "\n",
    "Options:\n",
    "  -n, --dry-run           Select the tier and run rsync with --dry-run; change nothing.\n",
    "  -d, --debug             Same as --dry-run with debug output.\n",
    "      --no-compress       Do not compress file data during the transfer.\n",
    "      --no-fuzzy          Do not look for similar basis files.\n",
    "      --no-progress       Do not show transfer progress.\n",
    "      --exclude=PATTERN   Exclude files matching PATTERN (repeatable).\n",
    "      --exclude-from=FILE Read exclude patterns from FILE\n",
    "                          (default: ~/.backup/excludes when present).\n",
    "      --max-weekly=N      Keep at most N weekly snapshots (default 5).\n",
    "  -e, --rsh=COMMAND       Remote shell for rsync and remote store commands.\n",
    "      --rsync-path=PROGRAM\n",
    "                          rsync binary to run (default: $OC_BACKUP_RSYNC or rsync).\n",
    "      --date=YYYY-MM-DD   Take the snapshot as if today were this date.\n",
    "  -v, --verbose           Increase verbosity (repeatable).\n",
    "      --log=FLAG[N],...   Set one diagnostic category to level N (default 1):\n",
    "                          tier, transfer, promote, prune, store, remote.\n",
    "  -q, --quiet             Only report errors.\n",
    "  -h, --help              Show this help message and exit.\n",
    "  -V, --version           Output version information and exit.\n",
);

//! crates/logging/src/config.rs
//! Verbosity configuration derived from `-v`/`-q` and explicit flag tokens.

use super::levels::{LogFlag, LogLevels};

/// Combined verbosity configuration.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct VerbosityConfig {
    /// Per-flag levels.
    pub levels: LogLevels,
    /// Suppress everything except errors.
    pub quiet: bool,
}

impl VerbosityConfig {
    /// Create a configuration from a verbose level (0-3).
    ///
    /// Level 0 prints warnings and errors only, level 1 reports the selected
    /// tier and every change made to the store, level 2 adds the debug detail
    /// of each step and level 3 traces every remote command.
    pub fn from_verbose_level(level: u8) -> Self {
        let mut config = Self::default();

        match level {
            0 => {}
            1 => {
                config.levels.tier = 1;
                config.levels.transfer = 1;
                config.levels.promote = 1;
                config.levels.prune = 1;
            }
            2 => {
                config.levels.set_all(2);
                config.levels.remote = 1;
            }
            _ => config.levels.set_all(3),
        }

        config
    }

    /// Configuration that only lets errors through.
    pub fn quiet() -> Self {
        Self {
            levels: LogLevels::default(),
            quiet: true,
        }
    }

    /// Apply a single flag token (e.g., "prune2", "remote").
    pub fn apply_flag(&mut self, token: &str) -> Result<(), String> {
        let (name, level) = parse_flag_token(token)?;
        let flag = LogFlag::from_name(name).ok_or_else(|| format!("unknown log flag: {name}"))?;
        self.levels.set(flag, level);
        Ok(())
    }

    /// Returns true when an event of `level` in `flag` should be emitted.
    pub fn enabled(&self, flag: LogFlag, level: u8) -> bool {
        self.levels.get(flag) >= level
    }
}

/// Parse a flag token like "prune2" into ("prune", 2) or "tier" into ("tier", 1).
fn parse_flag_token(token: &str) -> Result<(&str, u8), String> {
    if token.is_empty() {
        return Err("empty flag token".to_owned());
    }

    match token.find(|c: char| c.is_ascii_digit()) {
        Some(0) => Err(format!("missing flag name in: {token}")),
        Some(pos) => {
            let level = token[pos..]
                .parse::<u8>()
                .map_err(|_| format!("invalid level in flag: {token}"))?;
            Ok((&token[..pos], level))
        }
        None => Ok((token, 1)),
    }
}

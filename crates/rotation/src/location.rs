//! Parsing of `SRC`/`DEST` operands into local or remote locations.
//!
//! An operand is remote when a `:` appears before the first `/`, matching the
//! way rsync tells `host:path` apart from a local path that merely contains a
//! colon further down (`./a:b`, `/mnt/c:d`). Local paths are expanded and
//! made absolute up front so every later stage works with a stable path.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::{BackupError, BackupResult};

/// A parsed source or destination operand.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    user: Option<String>,
    host: Option<String>,
    path: PathBuf,
}

impl Location {
    /// Creates a local location without any normalisation.
    #[must_use]
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            user: None,
            host: None,
            path: path.into(),
        }
    }

    /// Creates a remote location.
    #[must_use]
    pub fn remote(user: Option<String>, host: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            user,
            host: Some(host.into()),
            path: path.into(),
        }
    }

    /// Parses an operand, expanding `~` against `$HOME` and resolving relative
    /// local paths against the current directory.
    pub fn parse(input: &str) -> BackupResult<Self> {
        let home = env::var_os("HOME").map(PathBuf::from);
        let cwd = env::current_dir().map_err(|error| {
            BackupError::invalid_location(input, format!("current directory unavailable: {error}"))
        })?;
        Self::parse_with(input, home.as_deref(), &cwd)
    }

    /// Parses an operand against an explicit home and working directory.
    pub fn parse_with(input: &str, home: Option<&Path>, cwd: &Path) -> BackupResult<Self> {
        if input.is_empty() {
            return Err(BackupError::invalid_location(input, "empty location"));
        }

        if is_remote(input) {
            return parse_remote(input);
        }

        let expanded = expand_tilde(input, home);
        let absolute = if expanded.is_absolute() {
            expanded
        } else {
            cwd.join(expanded)
        };
        Ok(Self::local(normalize(&absolute)))
    }

    /// Login name for remote locations.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Host for remote locations; `None` means local.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Filesystem path on the host that owns the location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` when the location lives on another host.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        self.host.is_some()
    }

    /// A location for `segment` beneath this one, on the same host.
    #[must_use]
    pub fn join(&self, segment: impl AsRef<Path>) -> Self {
        Self {
            user: self.user.clone(),
            host: self.host.clone(),
            path: self.path.join(segment),
        }
    }

    /// Renders the location as a transfer operand: `[user@]host:path` for
    /// remote locations, the bare path otherwise.
    #[must_use]
    pub fn rsync_operand(&self) -> OsString {
        let mut operand = OsString::new();
        if let Some(host) = &self.host {
            if let Some(user) = &self.user {
                operand.push(user);
                operand.push("@");
            }
            operand.push(host);
            operand.push(":");
        }
        operand.push(self.path.as_os_str());
        operand
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rsync_operand().to_string_lossy())
    }
}

fn is_remote(input: &str) -> bool {
    match (input.find(':'), input.find('/')) {
        (Some(colon), Some(slash)) => colon < slash,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

fn parse_remote(input: &str) -> BackupResult<Location> {
    let Some((login, path)) = input.split_once(':') else {
        return Err(BackupError::invalid_location(input, "missing ':'"));
    };

    let (user, host) = match login.split_once('@') {
        Some((user, _)) => {
            let host = login.rsplit_once('@').map_or("", |(_, host)| host);
            ((!user.is_empty()).then(|| user.to_owned()), host)
        }
        None => (None, login),
    };

    if host.is_empty() {
        return Err(BackupError::invalid_location(input, "empty host name"));
    }

    let path = if path.is_empty() { "." } else { path };
    Ok(Location::remote(user, host, path))
}

fn expand_tilde(input: &str, home: Option<&Path>) -> PathBuf {
    match home {
        Some(home) if input == "~" => home.to_path_buf(),
        Some(home) => match input.strip_prefix("~/") {
            Some(rest) => home.join(rest),
            None => PathBuf::from(input),
        },
        None => PathBuf::from(input),
    }
}

/// Resolves `.` and `..` lexically; `..` never climbs above the root.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if normalized.parent().is_some() {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

//! The filesystem seam shared by local and remote stores.

use std::path::{Path, PathBuf};

use crate::error::StoreResult;

/// Filesystem operations the snapshot store needs, executed either directly
/// or on the host that owns the store.
///
/// Paths are interpreted on the side that owns the store. Removal operations
/// treat an absent path as success so that interrupted runs can be repeated.
pub trait ExecutionContext {
    /// Human readable name of the side operations run on.
    fn describe(&self) -> String;

    /// Returns `true` when operations run on another host.
    fn is_remote(&self) -> bool;

    /// Creates `path` and any missing parents.
    fn create_dirs(&self, path: &Path) -> StoreResult<()>;

    /// Names of the entries directly inside `dir` matching the glob
    /// `pattern`, sorted lexically. A missing `dir` has no entries.
    fn find_entries(&self, dir: &Path, pattern: &str) -> StoreResult<Vec<String>>;

    /// Returns `true` if `path` exists.
    fn path_exists(&self, path: &Path) -> StoreResult<bool>;

    /// Renames `from` to `to`.
    fn rename(&self, from: &Path, to: &Path) -> StoreResult<()>;

    /// Removes `path` recursively.
    fn remove_tree(&self, path: &Path) -> StoreResult<()>;

    /// Removes the symbolic link `path` without following it.
    fn remove_link(&self, path: &Path) -> StoreResult<()>;

    /// Creates a symbolic link at `link` whose content is `target`.
    fn symlink(&self, target: &Path, link: &Path) -> StoreResult<()>;

    /// Reads the content of the symbolic link `path`, or `None` if there is
    /// no link there.
    fn read_link(&self, path: &Path) -> StoreResult<Option<PathBuf>>;
}

impl<C: ExecutionContext + ?Sized> ExecutionContext for Box<C> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn is_remote(&self) -> bool {
        (**self).is_remote()
    }

    fn create_dirs(&self, path: &Path) -> StoreResult<()> {
        (**self).create_dirs(path)
    }

    fn find_entries(&self, dir: &Path, pattern: &str) -> StoreResult<Vec<String>> {
        (**self).find_entries(dir, pattern)
    }

    fn path_exists(&self, path: &Path) -> StoreResult<bool> {
        (**self).path_exists(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> StoreResult<()> {
        (**self).rename(from, to)
    }

    fn remove_tree(&self, path: &Path) -> StoreResult<()> {
        (**self).remove_tree(path)
    }

    fn remove_link(&self, path: &Path) -> StoreResult<()> {
        (**self).remove_link(path)
    }

    fn symlink(&self, target: &Path, link: &Path) -> StoreResult<()> {
        (**self).symlink(target, link)
    }

    fn read_link(&self, path: &Path) -> StoreResult<Option<PathBuf>> {
        (**self).read_link(path)
    }
}

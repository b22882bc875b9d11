//! [`ExecutionContext`] over the local filesystem.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::Glob;

use super::ExecutionContext;
use crate::error::{StoreError, StoreResult};

/// Runs store operations with `std::fs` on this host.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalContext;

impl LocalContext {
    /// Creates a local context.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn absent_is_ok(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

impl ExecutionContext for LocalContext {
    fn describe(&self) -> String {
        "local filesystem".to_owned()
    }

    fn is_remote(&self) -> bool {
        false
    }

    fn create_dirs(&self, path: &Path) -> StoreResult<()> {
        fs::create_dir_all(path).map_err(|error| StoreError::io("create directory", path, error))
    }

    fn find_entries(&self, dir: &Path, pattern: &str) -> StoreResult<Vec<String>> {
        let matcher = Glob::new(pattern)
            .map_err(|source| StoreError::Pattern {
                pattern: pattern.to_owned(),
                source,
            })?
            .compile_matcher();

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(StoreError::io("read directory", dir, error)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|error| StoreError::io("read directory", dir, error))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if matcher.is_match(name) {
                names.push(name.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn path_exists(&self, path: &Path) -> StoreResult<bool> {
        match fs::symlink_metadata(path) {
            Ok(_) => Ok(true),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(StoreError::io("inspect", path, error)),
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> StoreResult<()> {
        fs::rename(from, to).map_err(|error| StoreError::io("rename", from, error))
    }

    fn remove_tree(&self, path: &Path) -> StoreResult<()> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(error) => return Err(StoreError::io("inspect", path, error)),
        };

        let result = if metadata.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        absent_is_ok(result).map_err(|error| StoreError::io("remove", path, error))
    }

    fn remove_link(&self, path: &Path) -> StoreResult<()> {
        absent_is_ok(fs::remove_file(path)).map_err(|error| StoreError::io("remove", path, error))
    }

    #[cfg(unix)]
    fn symlink(&self, target: &Path, link: &Path) -> StoreResult<()> {
        std::os::unix::fs::symlink(target, link)
            .map_err(|error| StoreError::io("create symlink", link, error))
    }

    #[cfg(not(unix))]
    fn symlink(&self, _target: &Path, link: &Path) -> StoreResult<()> {
        Err(StoreError::io(
            "create symlink",
            link,
            io::Error::new(
                io::ErrorKind::Unsupported,
                "snapshot aliases require symbolic link support",
            ),
        ))
    }

    fn read_link(&self, path: &Path) -> StoreResult<Option<PathBuf>> {
        match fs::symlink_metadata(path) {
            Ok(metadata) if metadata.file_type().is_symlink() => fs::read_link(path)
                .map(Some)
                .map_err(|error| StoreError::io("read symlink", path, error)),
            Ok(_) => Ok(None),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(StoreError::io("inspect", path, error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn find_entries_matches_glob_and_sorts() {
        let dir = tempdir().expect("tempdir");
        for name in ["5-20240301.snapshot", "1-20240226.snapshot", "notes.txt"] {
            fs::create_dir(dir.path().join(name)).expect("create entry");
        }

        let context = LocalContext::new();
        assert_eq!(
            context
                .find_entries(dir.path(), "*.snapshot")
                .expect("find"),
            vec!["1-20240226.snapshot", "5-20240301.snapshot"]
        );
        assert_eq!(
            context
                .find_entries(dir.path(), "5-*.snapshot")
                .expect("find"),
            vec!["5-20240301.snapshot"]
        );
    }

    #[test]
    fn find_entries_in_missing_directory_is_empty() {
        let dir = tempdir().expect("tempdir");
        let entries = LocalContext::new()
            .find_entries(&dir.path().join("weekly"), "*.snapshot")
            .expect("find");
        assert!(entries.is_empty());
    }

    #[test]
    fn find_entries_reports_bad_patterns() {
        let dir = tempdir().expect("tempdir");
        let error = LocalContext::new()
            .find_entries(dir.path(), "[")
            .expect_err("invalid glob");
        assert!(matches!(error, StoreError::Pattern { .. }));
    }

    #[test]
    fn removals_tolerate_absent_paths() {
        let dir = tempdir().expect("tempdir");
        let context = LocalContext::new();
        context
            .remove_tree(&dir.path().join("missing"))
            .expect("absent tree");
        context
            .remove_link(&dir.path().join("missing"))
            .expect("absent link");
    }

    #[test]
    fn remove_tree_deletes_nested_content() {
        let dir = tempdir().expect("tempdir");
        let entry = dir.path().join("3-20240101.snapshot");
        fs::create_dir_all(entry.join("home/ana")).expect("create tree");
        fs::write(entry.join("home/ana/notes.txt"), b"notes").expect("write file");

        LocalContext::new().remove_tree(&entry).expect("remove");
        assert!(!entry.exists());
    }

    #[cfg(unix)]
    #[test]
    fn remove_tree_does_not_follow_symlinks() {
        let dir = tempdir().expect("tempdir");
        let target = dir.path().join("target");
        fs::create_dir(&target).expect("create target");
        fs::write(target.join("keep"), b"keep").expect("write file");
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).expect("symlink");

        LocalContext::new().remove_tree(&link).expect("remove");
        assert!(!link.exists());
        assert!(target.join("keep").exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_round_trip_and_dangling_links_exist() {
        let dir = tempdir().expect("tempdir");
        let link = dir.path().join("latest.snapshot");
        let context = LocalContext::new();

        assert_eq!(context.read_link(&link).expect("read"), None);
        context
            .symlink(Path::new("daily/5-20240301.snapshot"), &link)
            .expect("symlink");
        assert!(context.path_exists(&link).expect("exists"));
        assert_eq!(
            context.read_link(&link).expect("read"),
            Some(PathBuf::from("daily/5-20240301.snapshot"))
        );

        context.remove_link(&link).expect("remove");
        assert!(!context.path_exists(&link).expect("exists"));
    }

    #[test]
    fn read_link_on_plain_directory_is_none() {
        let dir = tempdir().expect("tempdir");
        assert_eq!(LocalContext::new().read_link(dir.path()).expect("read"), None);
    }

    #[test]
    fn rename_reports_source_path() {
        let dir = tempdir().expect("tempdir");
        let from = dir.path().join("incomplete.snapshot");
        let error = LocalContext::new()
            .rename(&from, &dir.path().join("daily"))
            .expect_err("missing source");
        assert!(error.to_string().contains("incomplete.snapshot"));
    }
}

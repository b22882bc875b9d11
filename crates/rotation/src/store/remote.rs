//! [`ExecutionContext`] that runs POSIX utilities on the store's host.
//!
//! Queries (`find`, `test`, `readlink`) use exit status `1` to say "nothing
//! there"; any other non-zero status means the query itself broke. Mutating
//! commands must exit `0`.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use tracing::debug;
use transport::{CommandOutput, RemoteChannel};

use super::ExecutionContext;
use crate::error::{StoreError, StoreResult};

/// Runs store operations through a [`RemoteChannel`].
#[derive(Debug)]
pub struct RemoteContext<C> {
    channel: C,
}

impl<C: RemoteChannel> RemoteContext<C> {
    /// Wraps a channel.
    pub const fn new(channel: C) -> Self {
        Self { channel }
    }

    /// The underlying channel.
    pub const fn channel(&self) -> &C {
        &self.channel
    }

    fn run(&self, args: &[OsString]) -> StoreResult<(String, CommandOutput)> {
        let command = render(args);
        debug!(target: "backup::remote", endpoint = %self.channel.describe(), "{command}");
        let output = self
            .channel
            .execute(args)
            .map_err(|source| StoreError::Spawn {
                command: command.clone(),
                endpoint: self.channel.describe(),
                source,
            })?;
        Ok((command, output))
    }

    /// Runs a query; `Ok(None)` for exit status 1.
    fn query(&self, args: &[OsString]) -> StoreResult<Option<CommandOutput>> {
        let (command, output) = self.run(args)?;
        match output.status {
            0 => Ok(Some(output)),
            1 => Ok(None),
            status => Err(StoreError::UnexpectedStatus {
                command,
                status,
                stderr: output.stderr_text(),
            }),
        }
    }

    fn mutate(&self, args: &[OsString]) -> StoreResult<()> {
        let (command, output) = self.run(args)?;
        if output.success() {
            Ok(())
        } else {
            Err(StoreError::CommandFailed {
                command,
                status: output.status,
                stderr: output.stderr_text(),
            })
        }
    }
}

fn argv<const N: usize>(parts: [&OsStr; N]) -> Vec<OsString> {
    parts.into_iter().map(OsStr::to_os_string).collect()
}

fn render(args: &[OsString]) -> String {
    args.iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

impl<C: RemoteChannel> ExecutionContext for RemoteContext<C> {
    fn describe(&self) -> String {
        self.channel.describe()
    }

    fn is_remote(&self) -> bool {
        true
    }

    fn create_dirs(&self, path: &Path) -> StoreResult<()> {
        self.mutate(&argv([
            OsStr::new("mkdir"),
            OsStr::new("-p"),
            OsStr::new("--"),
            path.as_os_str(),
        ]))
    }

    fn find_entries(&self, dir: &Path, pattern: &str) -> StoreResult<Vec<String>> {
        let output = self.query(&argv([
            OsStr::new("find"),
            dir.as_os_str(),
            OsStr::new("-mindepth"),
            OsStr::new("1"),
            OsStr::new("-maxdepth"),
            OsStr::new("1"),
            OsStr::new("-name"),
            OsStr::new(pattern),
        ]))?;

        let mut names: Vec<String> = output
            .map(|output| output.stdout_lines())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|line| {
                Path::new(&line)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .collect();
        names.sort();
        Ok(names)
    }

    fn path_exists(&self, path: &Path) -> StoreResult<bool> {
        Ok(self
            .query(&argv([OsStr::new("test"), OsStr::new("-e"), path.as_os_str()]))?
            .is_some())
    }

    fn rename(&self, from: &Path, to: &Path) -> StoreResult<()> {
        self.mutate(&argv([
            OsStr::new("mv"),
            OsStr::new("--"),
            from.as_os_str(),
            to.as_os_str(),
        ]))
    }

    fn remove_tree(&self, path: &Path) -> StoreResult<()> {
        self.mutate(&argv([
            OsStr::new("rm"),
            OsStr::new("-rf"),
            OsStr::new("--"),
            path.as_os_str(),
        ]))
    }

    fn remove_link(&self, path: &Path) -> StoreResult<()> {
        self.mutate(&argv([
            OsStr::new("rm"),
            OsStr::new("-f"),
            OsStr::new("--"),
            path.as_os_str(),
        ]))
    }

    fn symlink(&self, target: &Path, link: &Path) -> StoreResult<()> {
        self.mutate(&argv([
            OsStr::new("ln"),
            OsStr::new("-s"),
            OsStr::new("--"),
            target.as_os_str(),
            link.as_os_str(),
        ]))
    }

    fn read_link(&self, path: &Path) -> StoreResult<Option<PathBuf>> {
        let output = self.query(&argv([OsStr::new("readlink"), OsStr::new("--"), path.as_os_str()]))?;
        Ok(output
            .and_then(|output| output.stdout_lines().into_iter().next())
            .map(PathBuf::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::ScriptedChannel;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn find_entries_issues_single_level_find() {
        let channel = ScriptedChannel::new().respond(
            0,
            "/srv/backups/weekly/5-20240304.snapshot\n/srv/backups/weekly/1-20240205.snapshot\n",
        );
        let context = RemoteContext::new(channel);

        let entries = context
            .find_entries(Path::new("/srv/backups/weekly"), "*.snapshot")
            .expect("find");
        assert_eq!(entries, vec!["1-20240205.snapshot", "5-20240304.snapshot"]);
        assert_eq!(
            strings(&context.channel().calls()[0]),
            vec![
                "find",
                "/srv/backups/weekly",
                "-mindepth",
                "1",
                "-maxdepth",
                "1",
                "-name",
                "*.snapshot"
            ]
        );
    }

    #[test]
    fn find_status_one_means_no_entries() {
        let context = RemoteContext::new(ScriptedChannel::new().respond(1, ""));
        let entries = context
            .find_entries(Path::new("/srv/missing"), "*.snapshot")
            .expect("find");
        assert!(entries.is_empty());
    }

    #[test]
    fn other_query_statuses_are_errors() {
        let channel = ScriptedChannel::new().respond_with_stderr(2, "", "find: bad option");
        let context = RemoteContext::new(channel);
        let error = context
            .find_entries(Path::new("/srv"), "*.snapshot")
            .expect_err("unexpected status");
        match error {
            StoreError::UnexpectedStatus { status, stderr, .. } => {
                assert_eq!(status, 2);
                assert_eq!(stderr, "find: bad option");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn path_exists_maps_test_status() {
        let channel = ScriptedChannel::new().respond(0, "").respond(1, "");
        let context = RemoteContext::new(channel);
        assert!(context.path_exists(Path::new("/srv/a")).expect("exists"));
        assert!(!context.path_exists(Path::new("/srv/b")).expect("exists"));
        assert_eq!(
            strings(&context.channel().calls()[0]),
            vec!["test", "-e", "/srv/a"]
        );
    }

    #[test]
    fn mutating_commands_surface_their_status() {
        let channel = ScriptedChannel::new().respond_with_stderr(1, "", "mv: permission denied");
        let context = RemoteContext::new(channel);
        let error = context
            .rename(Path::new("/srv/incomplete.snapshot"), Path::new("/srv/daily/5-20240301.snapshot"))
            .expect_err("mv fails");
        assert_eq!(error.exit_code(), 1);
        assert!(error.to_string().contains("mv -- /srv/incomplete.snapshot"));
    }

    #[test]
    fn mutating_commands_use_option_terminators() {
        let channel = ScriptedChannel::new();
        let context = RemoteContext::new(channel);
        context.create_dirs(Path::new("/srv/daily")).expect("mkdir");
        context.remove_tree(Path::new("/srv/weekly/1-20240101.snapshot")).expect("rm");
        context.remove_link(Path::new("/srv/latest.snapshot")).expect("rm link");
        context
            .symlink(Path::new("daily/5-20240301.snapshot"), Path::new("/srv/latest.snapshot"))
            .expect("ln");

        let calls: Vec<Vec<String>> = context
            .channel()
            .calls()
            .iter()
            .map(Vec::as_slice)
            .map(strings)
            .collect();
        assert_eq!(
            calls,
            vec![
                vec!["mkdir", "-p", "--", "/srv/daily"],
                vec!["rm", "-rf", "--", "/srv/weekly/1-20240101.snapshot"],
                vec!["rm", "-f", "--", "/srv/latest.snapshot"],
                vec!["ln", "-s", "--", "daily/5-20240301.snapshot", "/srv/latest.snapshot"],
            ]
        );
    }

    #[test]
    fn spawn_failures_are_reported() {
        let channel = ScriptedChannel::new().fail_spawn(std::io::ErrorKind::NotFound);
        let context = RemoteContext::new(channel);
        let error = context.create_dirs(Path::new("/srv")).expect_err("spawn fails");
        assert!(matches!(error, StoreError::Spawn { .. }));
        assert_eq!(error.exit_code(), 127);
    }

    #[test]
    fn read_link_returns_first_line() {
        let channel = ScriptedChannel::new()
            .respond(0, "weekly/5-20240304.snapshot\n")
            .respond(1, "");
        let context = RemoteContext::new(channel);
        assert_eq!(
            context.read_link(Path::new("/srv/latest.snapshot")).expect("read"),
            Some(PathBuf::from("weekly/5-20240304.snapshot"))
        );
        assert_eq!(context.read_link(Path::new("/srv/other")).expect("read"), None);
    }
}

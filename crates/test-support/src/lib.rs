#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Fixtures shared by the oc-backup test suites.
//!
//! [`SnapshotRoot`] builds snapshot stores on disk inside a temporary
//! directory. [`ScriptedChannel`] stands in for ssh: it records every command
//! it is asked to run and answers from a queue of canned outputs.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::TempDir;
use transport::{CommandOutput, RemoteChannel};

/// Tier directory names in creation order.
pub const TIER_DIRS: [&str; 4] = ["daily", "weekly", "monthly", "yearly"];

/// A snapshot store rooted in a temporary directory.
pub struct SnapshotRoot {
    dir: TempDir,
}

impl SnapshotRoot {
    /// Creates an empty root without tier directories.
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temporary snapshot root"),
        }
    }

    /// Creates a root with all four tier directories.
    pub fn new() -> Self {
        let root = Self::empty();
        for tier in TIER_DIRS {
            fs::create_dir(root.path().join(tier)).expect("create tier directory");
        }
        root
    }

    /// Root directory of the store.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Adds a snapshot entry containing a marker file named after it.
    pub fn add_entry(&self, tier: &str, name: &str) -> PathBuf {
        let entry = self.path().join(tier).join(name);
        fs::create_dir_all(&entry).expect("create snapshot entry");
        fs::write(entry.join("marker"), name).expect("write marker");
        entry
    }

    /// Adds a staging entry holding one file.
    pub fn add_staging(&self, file: &str, contents: &str) -> PathBuf {
        let staging = self.path().join("incomplete.snapshot");
        fs::create_dir_all(&staging).expect("create staging entry");
        fs::write(staging.join(file), contents).expect("write staged file");
        staging
    }

    /// Points `latest.snapshot` at `target`, relative to the root.
    #[cfg(unix)]
    pub fn link_latest(&self, target: &str) {
        let link = self.path().join("latest.snapshot");
        let _ = fs::remove_file(&link);
        std::os::unix::fs::symlink(target, link).expect("create latest link");
    }

    /// Content of `latest.snapshot`, if it is a symlink.
    pub fn latest(&self) -> Option<PathBuf> {
        fs::read_link(self.path().join("latest.snapshot")).ok()
    }

    /// Entry names inside `tier`, sorted.
    pub fn entries(&self, tier: &str) -> Vec<String> {
        let Ok(read) = fs::read_dir(self.path().join(tier)) else {
            return Vec::new();
        };
        let mut names: Vec<String> = read
            .map(|entry| {
                entry
                    .expect("read tier entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }

    /// Returns `true` if the staging entry exists.
    pub fn has_staging(&self) -> bool {
        self.path().join("incomplete.snapshot").exists()
    }
}

impl Default for SnapshotRoot {
    fn default() -> Self {
        Self::new()
    }
}

enum Reply {
    Output(CommandOutput),
    SpawnError(io::ErrorKind),
}

/// A [`RemoteChannel`] answering from a script.
///
/// Replies are consumed in order; once the script is exhausted every
/// command succeeds with empty output. Clones share the script and the call
/// log, so a test can keep a handle after moving the channel into a store.
#[derive(Clone, Default)]
pub struct ScriptedChannel {
    replies: Rc<RefCell<VecDeque<Reply>>>,
    calls: Rc<RefCell<Vec<Vec<OsString>>>>,
}

impl ScriptedChannel {
    /// Creates a channel with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply with `status` and `stdout`.
    pub fn respond(self, status: i32, stdout: &str) -> Self {
        self.replies
            .borrow_mut()
            .push_back(Reply::Output(CommandOutput::new(status, stdout)));
        self
    }

    /// Queues a reply with `status`, `stdout` and `stderr`.
    pub fn respond_with_stderr(self, status: i32, stdout: &str, stderr: &str) -> Self {
        self.replies.borrow_mut().push_back(Reply::Output(
            CommandOutput::new(status, stdout).with_stderr(stderr),
        ));
        self
    }

    /// Queues a failure to start the remote shell.
    pub fn fail_spawn(self, kind: io::ErrorKind) -> Self {
        self.replies.borrow_mut().push_back(Reply::SpawnError(kind));
        self
    }

    /// Every command executed so far.
    pub fn calls(&self) -> Vec<Vec<OsString>> {
        self.calls.borrow().clone()
    }

    /// Every command executed so far, each joined with spaces.
    pub fn rendered_calls(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|call| {
                call.iter()
                    .map(|arg| arg.to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

impl RemoteChannel for ScriptedChannel {
    fn execute(&self, args: &[OsString]) -> io::Result<CommandOutput> {
        self.calls.borrow_mut().push(args.to_vec());
        match self.replies.borrow_mut().pop_front() {
            Some(Reply::Output(output)) => Ok(output),
            Some(Reply::SpawnError(kind)) => Err(io::Error::new(kind, "scripted spawn failure")),
            None => Ok(CommandOutput::default()),
        }
    }

    fn describe(&self) -> String {
        "scripted".to_owned()
    }
}

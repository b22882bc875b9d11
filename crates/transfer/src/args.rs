//! rsync command-line assembly.

use std::ffi::OsString;

use rotation::{Location, TransferRequest};
use transport::quote_args;

/// Options passed to every invocation, before the per-run toggles.
pub const FIXED_ARGS: [&str; 8] = [
    "--archive",
    "--partial",
    "--partial-dir=partially_transferred_files",
    "--one-file-system",
    "--delete",
    "--delete-excluded",
    "--itemize-changes",
    "--human-readable",
];

/// Builds the rsync arguments for `request`, excluding the program name.
#[must_use]
pub fn build_arguments(request: &TransferRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = FIXED_ARGS.iter().map(OsString::from).collect();

    let mut link_dest = OsString::from("--link-dest=");
    link_dest.push(&request.link_dest);
    args.push(link_dest);
    args.push(OsString::from("--quiet"));

    if request.compress {
        args.push(OsString::from("--compress"));
    }
    if request.fuzzy {
        args.push(OsString::from("--fuzzy"));
    }
    if request.progress {
        args.push(OsString::from("--progress"));
    }
    if let Some(path) = &request.exclude_from {
        let mut arg = OsString::from("--exclude-from=");
        arg.push(path.as_os_str());
        args.push(arg);
    }
    if request.dry_run {
        args.push(OsString::from("--dry-run"));
    }
    for pattern in &request.excludes {
        let mut arg = OsString::from("--exclude=");
        arg.push(pattern);
        args.push(arg);
    }
    if !request.remote_shell.is_empty() {
        args.push(OsString::from("-e"));
        args.push(remote_shell_value(&request.remote_shell));
    }

    args.push(source_operand(&request.source));
    args.push(request.destination.rsync_operand());
    args
}

/// Joins a parsed remote shell back into the single word rsync expects.
fn remote_shell_value(words: &[OsString]) -> OsString {
    let mut value = OsString::new();
    for (index, word) in quote_args(words).into_iter().enumerate() {
        if index > 0 {
            value.push(" ");
        }
        value.push(word);
    }
    value
}

/// The source operand with a trailing slash, so rsync copies the contents of
/// the directory rather than the directory itself.
fn source_operand(source: &Location) -> OsString {
    let mut operand = source.rsync_operand();
    if operand.as_encoded_bytes().last() != Some(&b'/') {
        operand.push("/");
    }
    operand
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn request() -> TransferRequest {
        TransferRequest {
            source: Location::local("/home/ana"),
            destination: Location::remote(
                Some("backup".to_owned()),
                "nas",
                "/srv/backups/incomplete.snapshot",
            ),
            link_dest: "../latest.snapshot".to_owned(),
            excludes: Vec::new(),
            exclude_from: None,
            dry_run: false,
            compress: true,
            fuzzy: true,
            progress: true,
            remote_shell: Vec::new(),
        }
    }

    fn rendered(args: &[OsString]) -> Vec<String> {
        args.iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn default_request_uses_the_documented_argument_order() {
        assert_eq!(
            rendered(&build_arguments(&request())),
            vec![
                "--archive",
                "--partial",
                "--partial-dir=partially_transferred_files",
                "--one-file-system",
                "--delete",
                "--delete-excluded",
                "--itemize-changes",
                "--human-readable",
                "--link-dest=../latest.snapshot",
                "--quiet",
                "--compress",
                "--fuzzy",
                "--progress",
                "/home/ana/",
                "backup@nas:/srv/backups/incomplete.snapshot",
            ]
        );
    }

    #[test]
    fn toggles_and_excludes_follow_the_request() {
        let mut request = request();
        request.compress = false;
        request.fuzzy = false;
        request.progress = false;
        request.dry_run = true;
        request.exclude_from = Some(PathBuf::from("/home/ana/.backup/excludes"));
        request.excludes = vec![".cache".to_owned(), "*.iso".to_owned()];

        let args = rendered(&build_arguments(&request));
        let tail: Vec<&str> = args[10..].iter().map(String::as_str).collect();
        assert_eq!(
            tail,
            vec![
                "--exclude-from=/home/ana/.backup/excludes",
                "--dry-run",
                "--exclude=.cache",
                "--exclude=*.iso",
                "/home/ana/",
                "backup@nas:/srv/backups/incomplete.snapshot",
            ]
        );
    }

    #[test]
    fn remote_shell_is_passed_as_one_quoted_word() {
        let mut request = request();
        request.remote_shell = vec![
            OsString::from("ssh"),
            OsString::from("-i"),
            OsString::from("/home/ana/my key"),
        ];
        let args = rendered(&build_arguments(&request));
        let position = args.iter().position(|arg| arg == "-e").expect("-e present");
        assert_eq!(args[position + 1], "ssh -i '/home/ana/my key'");
    }

    #[test]
    fn remote_source_keeps_single_trailing_slash() {
        let mut request = request();
        request.source = Location::remote(None, "laptop", "/home/ana/");
        request.destination = Location::local("/srv/backups/incomplete.snapshot");
        let args = rendered(&build_arguments(&request));
        let operands = &args[args.len() - 2..];
        assert_eq!(
            operands,
            &["laptop:/home/ana/", "/srv/backups/incomplete.snapshot"]
        );
    }

    #[test]
    fn patterns_are_never_split_or_quoted() {
        let mut request = request();
        request.excludes = vec!["My Documents/*.tmp".to_owned()];
        let args = rendered(&build_arguments(&request));
        assert!(args.contains(&"--exclude=My Documents/*.tmp".to_owned()));
    }
}

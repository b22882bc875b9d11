use super::{RemoteShellParseError, SshChannel, SshCommand, parse_remote_shell};
use crate::RemoteChannel;
use std::ffi::{OsStr, OsString};

fn args_to_strings(args: &[OsString]) -> Vec<String> {
    args.iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn bare_host_gets_batch_mode_only() {
    let command = SshCommand::new("example.com");
    let (program, args) = command.command_parts_for_testing();

    assert_eq!(program, OsString::from("ssh"));
    assert_eq!(
        args_to_strings(&args),
        vec!["-oBatchMode=yes".to_owned(), "example.com".to_owned()]
    );
}

#[test]
fn user_options_and_remote_command_follow_batch_mode() {
    let mut command = SshCommand::new("backup.example.com");
    command.set_user("backup");
    command.push_option("-p");
    command.push_option("2222");
    command.set_remote_command(["mkdir", "-p", "/srv/backups/daily"]);

    let (_, args) = command.command_parts_for_testing();

    assert_eq!(
        args_to_strings(&args),
        vec![
            "-oBatchMode=yes".to_owned(),
            "-p".to_owned(),
            "2222".to_owned(),
            "backup@backup.example.com".to_owned(),
            "mkdir".to_owned(),
            "-p".to_owned(),
            "/srv/backups/daily".to_owned(),
        ]
    );
}

#[test]
fn program_override_keeps_the_argument_layout() {
    let mut command = SshCommand::new("nas");
    command.set_program("/usr/local/bin/ssh");
    command.set_remote_command(["true"]);

    let (program, args) = command.command_parts_for_testing();
    assert_eq!(program, OsString::from("/usr/local/bin/ssh"));
    assert_eq!(args_to_strings(&args), vec!["-oBatchMode=yes", "nas", "true"]);
}

#[test]
fn rsh_words_split_on_whitespace() {
    let spec = OsStr::new("ssh -p 2222 -o ServerAliveInterval=30");
    let args = parse_remote_shell(spec).expect("parsing should succeed");

    assert_eq!(
        args_to_strings(&args),
        vec!["ssh", "-p", "2222", "-o", "ServerAliveInterval=30"]
    );
}

#[test]
fn rsh_quotes_group_words() {
    let spec = OsStr::new("ssh -i '/home/ana/.ssh/nas key' -o \"User=back up\"");
    let args = parse_remote_shell(spec).expect("parsing should succeed");

    assert_eq!(
        args_to_strings(&args),
        vec!["ssh", "-i", "/home/ana/.ssh/nas key", "-o", "User=back up"]
    );
}

#[test]
fn rsh_keeps_empty_quoted_words() {
    let spec = OsStr::new("ssh -o 'Option=' ''");
    let args = parse_remote_shell(spec).expect("parsing should succeed");

    assert_eq!(args_to_strings(&args), vec!["ssh", "-o", "Option=", ""]);
}

#[test]
fn rsh_collapses_runs_of_spaces_and_honours_escapes() {
    let spec = OsStr::new("ssh   -p    2222 -i key\\ file");
    let args = parse_remote_shell(spec).expect("parsing should succeed");

    assert_eq!(args_to_strings(&args), vec!["ssh", "-p", "2222", "-i", "key file"]);
}

#[test]
fn rsh_reports_malformed_values() {
    assert_eq!(
        parse_remote_shell(OsStr::new("   ")),
        Err(RemoteShellParseError::Empty)
    );
    assert_eq!(
        parse_remote_shell(OsStr::new("ssh -i 'key")),
        Err(RemoteShellParseError::UnterminatedQuote('\''))
    );
    assert_eq!(
        parse_remote_shell(OsStr::new("ssh \"-i")),
        Err(RemoteShellParseError::UnterminatedQuote('"'))
    );
    assert_eq!(
        parse_remote_shell(OsStr::new("ssh \\")),
        Err(RemoteShellParseError::TrailingEscape)
    );
}

#[test]
fn channel_quotes_remote_arguments() {
    let channel = SshChannel::new("nas").with_user(Some("backup"));
    let command = channel.command_for(&[
        OsString::from("mv"),
        OsString::from("--"),
        OsString::from("/srv/my backups/incomplete.snapshot"),
        OsString::from("/srv/my backups/daily/5-20240301.snapshot"),
    ]);

    let (program, args) = command.command_parts_for_testing();
    assert_eq!(program, OsString::from("ssh"));
    assert_eq!(
        args_to_strings(&args),
        vec![
            "-oBatchMode=yes",
            "backup@nas",
            "mv",
            "--",
            "'/srv/my backups/incomplete.snapshot'",
            "'/srv/my backups/daily/5-20240301.snapshot'",
        ]
    );
}

#[test]
fn channel_uses_configured_remote_shell() {
    let shell = parse_remote_shell(OsStr::new("ssh -p 2222")).expect("parse");
    let channel = SshChannel::new("nas").with_remote_shell(shell);
    let command = channel.command_for(&[OsString::from("true")]);

    let (_, args) = command.command_parts_for_testing();
    assert_eq!(
        args_to_strings(&args),
        vec!["-oBatchMode=yes", "-p", "2222", "nas", "true"]
    );
}

#[test]
fn channel_describes_endpoint() {
    assert_eq!(SshChannel::new("nas").describe(), "nas");
    assert_eq!(
        SshChannel::new("nas").with_user(Some("backup")).describe(),
        "backup@nas"
    );
}

/// Writes an executable stand-in for ssh that drops `-oBatchMode=yes` and
/// the target, then runs the remote words with `sh -c` inside `dir`.
#[cfg(unix)]
fn fake_ssh(dir: &std::path::Path) -> OsString {
    use std::os::unix::fs::PermissionsExt;

    let shell = dir.join("fake-ssh");
    std::fs::write(
        &shell,
        format!(
            "#!/bin/sh\nshift 2\ncd '{dir}' && HOME='{dir}' exec sh -c \"$*\"\n",
            dir = dir.display()
        ),
    )
    .expect("write fake ssh");
    std::fs::set_permissions(&shell, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    shell.into_os_string()
}

#[cfg(unix)]
#[test]
fn output_captures_status_and_streams() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut command = SshCommand::new("nas");
    command.set_program(fake_ssh(dir.path()));
    command.set_remote_command(["printf out; printf err >&2; exit 3"]);

    let output = command.output().expect("run fake ssh");
    assert_eq!(output.status, 3);
    assert_eq!(output.stdout, b"out");
    assert_eq!(output.stderr_text(), "err");
}

#[cfg(unix)]
#[test]
fn output_closes_stdin() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut command = SshCommand::new("nas");
    command.set_program(fake_ssh(dir.path()));
    command.set_remote_command(["cat; echo done"]);

    let output = command.output().expect("run fake ssh");
    assert!(output.success());
    assert_eq!(output.stdout_lines(), vec!["done".to_owned()]);
}

#[test]
fn channel_leaves_home_prefix_unquoted() {
    let channel = SshChannel::new("nas");
    let command = channel.command_for(&[
        OsString::from("mkdir"),
        OsString::from("-p"),
        OsString::from("--"),
        OsString::from("~/backups/daily"),
        OsString::from("~/my backups/weekly"),
    ]);

    let (_, args) = command.command_parts_for_testing();
    assert_eq!(
        args_to_strings(&args),
        vec![
            "-oBatchMode=yes",
            "nas",
            "mkdir",
            "-p",
            "--",
            "~/backups/daily",
            "~/'my backups/weekly'",
        ]
    );
}

#[cfg(unix)]
#[test]
fn home_relative_paths_resolve_against_the_remote_home() {
    let home = tempfile::tempdir().expect("home");
    let channel = SshChannel::new("nas").with_remote_shell(vec![fake_ssh(home.path())]);
    let output = channel
        .execute(&[
            OsString::from("mkdir"),
            OsString::from("-p"),
            OsString::from("--"),
            OsString::from("~/backups/daily"),
        ])
        .expect("run fake ssh");

    assert!(output.success(), "{}", output.stderr_text());
    assert!(home.path().join("backups/daily").is_dir());
    assert!(!home.path().join("~").exists());
}

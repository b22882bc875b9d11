//! Quoting of arguments that cross the remote shell.
//!
//! ssh joins its trailing arguments with spaces and hands the result to the
//! login shell on the remote host. Every argument is therefore wrapped in
//! single quotes unless it consists solely of characters the shell never
//! interprets.
//!
//! A leading `~` or `~user` segment stays outside the quotes together with the
//! slash that ends it, so the remote shell still expands it to the home
//! directory the same way rsync does for a `host:~/path` operand.

use std::ffi::{OsStr, OsString};

fn is_safe_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'_' | b'-' | b'.' | b'/' | b'=' | b':' | b',' | b'+' | b'@' | b'%'
        )
}

fn is_login_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.')
}

/// Length of a leading `~` / `~user` prefix including its terminating `/`.
fn tilde_prefix_len(bytes: &[u8]) -> Option<usize> {
    if bytes.first() != Some(&b'~') {
        return None;
    }
    let end = bytes.iter().position(|&byte| byte == b'/').unwrap_or(bytes.len());
    if !bytes[1..end].iter().copied().all(is_login_byte) {
        return None;
    }
    Some((end + 1).min(bytes.len()))
}

fn quote_bytes(bytes: &[u8]) -> Vec<u8> {
    if let Some(prefix) = tilde_prefix_len(bytes) {
        let mut quoted = bytes[..prefix].to_vec();
        let rest = &bytes[prefix..];
        if !rest.is_empty() {
            quoted.extend(quote_plain(rest));
        }
        return quoted;
    }
    quote_plain(bytes)
}

fn quote_plain(bytes: &[u8]) -> Vec<u8> {
    if !bytes.is_empty() && bytes.iter().copied().all(is_safe_byte) {
        return bytes.to_vec();
    }

    let mut quoted = Vec::with_capacity(bytes.len() + 2);
    quoted.push(b'\'');
    for &byte in bytes {
        if byte == b'\'' {
            quoted.extend_from_slice(b"'\\''");
        } else {
            quoted.push(byte);
        }
    }
    quoted.push(b'\'');
    quoted
}

/// Quotes a single argument for a POSIX shell.
#[cfg(unix)]
#[must_use]
pub fn quote_arg(arg: &OsStr) -> OsString {
    use std::os::unix::ffi::{OsStrExt, OsStringExt};

    OsString::from_vec(quote_bytes(arg.as_bytes()))
}

/// Quotes a single argument for a POSIX shell.
#[cfg(not(unix))]
#[must_use]
pub fn quote_arg(arg: &OsStr) -> OsString {
    let text = arg.to_string_lossy();
    let quoted = quote_bytes(text.as_bytes());
    OsString::from(String::from_utf8_lossy(&quoted).into_owned())
}

/// Quotes every argument of a command line.
pub fn quote_args<I, S>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    args.into_iter().map(|arg| quote_arg(arg.as_ref())).collect()
}

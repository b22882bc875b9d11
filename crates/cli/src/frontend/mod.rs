//! Argument handling and run dispatch for `oc-backup`.

mod arguments;
mod defaults;

use std::env;
use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::{Path, PathBuf};

use logging::VerbosityConfig;
use rotation::{
    BackupConfig, BackupError, BackupResult, Location, RunContext, RunOutcome, SnapshotStore,
    local_today, run_backup,
};
use time::Date;
use tracing_subscriber::EnvFilter;
use transfer::RsyncEngine;
use transport::parse_remote_shell;

use arguments::{ParsedArgs, parse_args};
use defaults::{DATE_FORMAT, DEFAULT_EXCLUDE_FILE, HELP_TEXT, PROGRAM_NAME};

/// Maximum exit code representable by a Unix process.
const MAX_EXIT_CODE: i32 = u8::MAX as i32;

/// Everything derived from the command line that a run needs.
#[derive(Debug)]
struct Invocation {
    config: BackupConfig,
    date: Option<Date>,
    rsync_path: Option<OsString>,
    verbosity: VerbosityConfig,
}

/// Runs the CLI using the provided argument iterator and output handles.
///
/// Returns the process exit code: `0` on success, `1` for usage errors and
/// the failing phase's status otherwise.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    match parse_args(arguments) {
        Ok(parsed) => execute(parsed, stdout, stderr),
        Err(error) => {
            let _ = writeln!(stderr, "{PROGRAM_NAME}: {}", error.to_string().trim_end());
            1
        }
    }
}

/// Converts a numeric exit code into an [`std::process::ExitCode`].
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    let clamped = status.clamp(0, MAX_EXIT_CODE);
    std::process::ExitCode::from(clamped as u8)
}

fn execute<Out, Err>(parsed: ParsedArgs, stdout: &mut Out, stderr: &mut Err) -> i32
where
    Out: Write,
    Err: Write,
{
    if parsed.show_help {
        return write_text(stdout, HELP_TEXT);
    }
    if parsed.show_version {
        return write_text(
            stdout,
            &format!("{PROGRAM_NAME} {}\n", env!("CARGO_PKG_VERSION")),
        );
    }
    if parsed.operands.len() != 2 {
        let _ = writeln!(
            stderr,
            "{PROGRAM_NAME}: error: expected SRC and DEST operands\n\
             Usage: {PROGRAM_NAME} [OPTIONS] SRC DEST\n\
             Try '{PROGRAM_NAME} --help' for more information."
        );
        return 1;
    }

    let home = env::var_os("HOME").map(PathBuf::from);
    let invocation = match prepare(parsed, home.as_deref()) {
        Ok(invocation) => invocation,
        Err(error) => return fail(stderr, &error),
    };
    let Invocation {
        config,
        date,
        rsync_path,
        verbosity,
    } = invocation;
    let quiet = verbosity.quiet;
    install_logging(verbosity);

    let store = SnapshotStore::open(config.destination().clone(), config.remote_shell());
    let engine = RsyncEngine::resolve(rsync_path);
    let today = date.unwrap_or_else(local_today);

    match run_backup(&RunContext::new(&config, &store, today), &engine) {
        Ok(outcome) => {
            if !quiet {
                report(stdout, &config, &outcome);
            }
            0
        }
        Err(error) => fail(stderr, &error),
    }
}

/// Validates the parsed arguments and assembles the run configuration.
fn prepare(parsed: ParsedArgs, home: Option<&Path>) -> BackupResult<Invocation> {
    let ParsedArgs {
        dry_run,
        debug,
        no_compress,
        no_fuzzy,
        no_progress,
        excludes,
        exclude_from,
        max_weekly,
        rsh,
        rsync_path,
        date,
        verbosity,
        log_flags,
        quiet,
        operands,
        ..
    } = parsed;

    let mut verbosity = if quiet {
        VerbosityConfig::quiet()
    } else if debug {
        VerbosityConfig::from_verbose_level(verbosity.max(2))
    } else {
        VerbosityConfig::from_verbose_level(verbosity)
    };
    for token in &log_flags {
        let token = token.to_string_lossy();
        verbosity
            .apply_flag(token.trim())
            .map_err(|error| BackupError::InvalidConfig(format!("invalid --log value: {error}")))?;
    }

    let [source, destination] = operands.as_slice() else {
        return Err(BackupError::InvalidConfig(
            "expected SRC and DEST operands".to_owned(),
        ));
    };
    let source = parse_location(source)?;
    let destination = parse_location(destination)?;

    let remote_shell = match rsh {
        Some(spec) => parse_remote_shell(&spec).map_err(|error| {
            BackupError::InvalidConfig(format!("invalid --rsh value: {error}"))
        })?,
        None => Vec::new(),
    };

    let excludes = excludes
        .into_iter()
        .map(|pattern| {
            pattern.into_string().map_err(|pattern| {
                BackupError::InvalidConfig(format!(
                    "exclude pattern '{}' is not valid UTF-8",
                    pattern.to_string_lossy()
                ))
            })
        })
        .collect::<BackupResult<Vec<String>>>()?;

    let exclude_from = exclude_from
        .map(PathBuf::from)
        .or_else(|| default_exclude_file(home));

    let date = date.as_deref().map(parse_date).transpose()?;

    let mut builder = BackupConfig::builder(source, destination)
        .dry_run(dry_run || debug)
        .compress(!no_compress)
        .fuzzy(!no_fuzzy)
        .progress(!no_progress)
        .excludes(excludes)
        .exclude_from(exclude_from)
        .remote_shell(remote_shell);
    if let Some(max_weekly) = max_weekly {
        builder = builder.max_weekly(max_weekly);
    }

    Ok(Invocation {
        config: builder.build()?,
        date,
        rsync_path,
        verbosity,
    })
}

fn parse_location(operand: &OsStr) -> BackupResult<Location> {
    let text = operand.to_str().ok_or_else(|| {
        BackupError::invalid_location(operand.to_string_lossy(), "not valid UTF-8")
    })?;
    Location::parse(text)
}

fn parse_date(value: &OsStr) -> BackupResult<Date> {
    let text = value.to_string_lossy();
    Date::parse(&text, DATE_FORMAT)
        .map_err(|error| BackupError::InvalidConfig(format!("invalid --date '{text}': {error}")))
}

/// `~/.backup/excludes`, when it exists.
fn default_exclude_file(home: Option<&Path>) -> Option<PathBuf> {
    let candidate = home?.join(DEFAULT_EXCLUDE_FILE);
    candidate.is_file().then_some(candidate)
}

fn install_logging(config: VerbosityConfig) {
    if env::var_os("RUST_LOG").is_some() {
        logging::init_tracing_with_filter(config, EnvFilter::from_default_env());
    } else {
        logging::init_tracing(config);
    }
}

fn report<Out: Write>(stdout: &mut Out, config: &BackupConfig, outcome: &RunOutcome) {
    let path = outcome.selection.relative_path();
    let _ = if config.dry_run() {
        writeln!(stdout, "dry run: would promote to {path}")
    } else {
        writeln!(stdout, "snapshot: {path}")
    };
}

fn write_text<Out: Write>(stdout: &mut Out, text: &str) -> i32 {
    if stdout.write_all(text.as_bytes()).is_err() {
        return 1;
    }
    0
}

fn fail<Err: Write>(stderr: &mut Err, error: &BackupError) -> i32 {
    let _ = writeln!(stderr, "{PROGRAM_NAME}: error: {error}");
    error.exit_code()
}

use std::ffi::OsString;

use clap::{Arg, ArgAction, Command, builder::OsStringValueParser, value_parser};

use super::defaults::PROGRAM_NAME;

/// Raw command-line values before validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ParsedArgs {
    pub(crate) show_help: bool,
    pub(crate) show_version: bool,
    pub(crate) dry_run: bool,
    pub(crate) debug: bool,
    pub(crate) no_compress: bool,
    pub(crate) no_fuzzy: bool,
    pub(crate) no_progress: bool,
    pub(crate) excludes: Vec<OsString>,
    pub(crate) exclude_from: Option<OsString>,
    pub(crate) max_weekly: Option<usize>,
    pub(crate) rsh: Option<OsString>,
    pub(crate) rsync_path: Option<OsString>,
    pub(crate) date: Option<OsString>,
    pub(crate) verbosity: u8,
    pub(crate) log_flags: Vec<OsString>,
    pub(crate) quiet: bool,
    pub(crate) operands: Vec<OsString>,
}

fn flag(name: &'static str) -> Arg {
    Arg::new(name).long(name).action(ArgAction::SetTrue)
}

fn value(name: &'static str, value_name: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name(value_name)
        .num_args(1)
        .action(ArgAction::Set)
        .value_parser(OsStringValueParser::new())
}

/// Builds the `clap` command used for parsing.
pub(crate) fn clap_command() -> Command {
    Command::new(PROGRAM_NAME)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(flag("help").short('h'))
        .arg(flag("version").short('V'))
        .arg(flag("dry-run").short('n'))
        .arg(flag("debug").short('d'))
        .arg(flag("no-compress"))
        .arg(flag("no-fuzzy"))
        .arg(flag("no-progress"))
        .arg(value("exclude", "PATTERN").action(ArgAction::Append))
        .arg(value("exclude-from", "FILE"))
        .arg(
            Arg::new("max-weekly")
                .long("max-weekly")
                .value_name("N")
                .num_args(1)
                .action(ArgAction::Set)
                .value_parser(value_parser!(usize)),
        )
        .arg(value("rsh", "COMMAND").short('e'))
        .arg(value("rsync-path", "PROGRAM"))
        .arg(value("date", "YYYY-MM-DD"))
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count),
        )
        .arg(
            value("log", "FLAG[N]")
                .action(ArgAction::Append)
                .value_delimiter(','),
        )
        .arg(flag("quiet").short('q'))
        .arg(
            Arg::new("operands")
                .action(ArgAction::Append)
                .num_args(0..)
                .value_parser(OsStringValueParser::new()),
        )
}

/// Parses command-line arguments into a [`ParsedArgs`] structure.
pub(crate) fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();
    if args.is_empty() {
        args.push(OsString::from(PROGRAM_NAME));
    }

    let mut matches = clap_command().try_get_matches_from(args)?;

    Ok(ParsedArgs {
        show_help: matches.get_flag("help"),
        show_version: matches.get_flag("version"),
        dry_run: matches.get_flag("dry-run"),
        debug: matches.get_flag("debug"),
        no_compress: matches.get_flag("no-compress"),
        no_fuzzy: matches.get_flag("no-fuzzy"),
        no_progress: matches.get_flag("no-progress"),
        excludes: matches
            .remove_many::<OsString>("exclude")
            .map(|values| values.collect())
            .unwrap_or_default(),
        exclude_from: matches.remove_one::<OsString>("exclude-from"),
        max_weekly: matches.remove_one::<usize>("max-weekly"),
        rsh: matches.remove_one::<OsString>("rsh"),
        rsync_path: matches.remove_one::<OsString>("rsync-path"),
        date: matches.remove_one::<OsString>("date"),
        verbosity: matches.get_count("verbose"),
        log_flags: matches
            .remove_many::<OsString>("log")
            .map(|values| values.collect())
            .unwrap_or_default(),
        quiet: matches.get_flag("quiet"),
        operands: matches
            .remove_many::<OsString>("operands")
            .map(|values| values.collect())
            .unwrap_or_default(),
    })
}

//! Command line arguments for netinv.

use clap::{Parser, ValueHint};
use clap_complete::Shell;
use std::path::PathBuf;

/// Collects network device inventory into timestamped tables.
///
/// netinv runs vendor commands against a set of targets, parses the
/// block-list output into documents, flattens the blocks of interest into
/// rows and appends them as one timestamped snapshot per table. Tables grow
/// new columns automatically when device output starts carrying fields the
/// table has not seen.
#[derive(Parser, Debug)]
#[command(
    name = "netinv",
    version,
    after_help = "Hint: `netinv -h` only provides a usage summary. Run `netinv --help` for the full details to each flag."
)]
pub struct Options {
    /// Comma-delimited list of collectors to run.
    ///
    /// Collectors a selection depends on are added automatically and run
    /// first. Use --list-collectors to see what is available.
    #[arg(
        short = 'c',
        long,
        value_name = "NAME",
        value_delimiter = ',',
        help_heading = "Collection Options"
    )]
    pub collectors: Vec<String>,

    /// Comma-delimited list of targets to collect from.
    ///
    /// A target is whatever identifier the execution layer understands,
    /// typically a hostname. The identifier is also written into every
    /// record's `device` column.
    #[arg(
        short = 't',
        long,
        value_name = "TARGET",
        value_delimiter = ',',
        help_heading = "Collection Options"
    )]
    pub targets: Vec<String>,

    /// Command template used to reach targets.
    ///
    /// `{target}` and `{command}` are replaced per invocation and the result
    /// is split into a command line, e.g. `ssh {target} tmsh -q -c
    /// {command}`. Mutually exclusive with --capture-dir.
    #[arg(
        long,
        value_name = "TEMPLATE",
        env = "NETINV_EXEC",
        conflicts_with = "capture_dir",
        help_heading = "Execution Options"
    )]
    pub exec: Option<String>,

    /// Directory of captured command output to replay instead of executing.
    ///
    /// Captures are expected at `<DIR>/<target>/<command-slug>.txt`, where
    /// the slug is the command lowercased with every non-alphanumeric run
    /// collapsed to a `-`, e.g. `list-net-vlan.txt`.
    #[arg(
        long,
        value_name = "DIR",
        value_hint = ValueHint::DirPath,
        help_heading = "Execution Options"
    )]
    pub capture_dir: Option<PathBuf>,

    /// Directory the tables are written to. Created if missing.
    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        default_value = "out",
        value_hint = ValueHint::DirPath,
        help_heading = "Output Options"
    )]
    pub out_dir: PathBuf,

    /// Timestamp tag for this snapshot.
    ///
    /// Every row written by this run carries the tag. Defaults to the
    /// current UTC time formatted as `%Y-%m-%dT%H:%M:%S`.
    #[arg(long, value_name = "TS", help_heading = "Output Options")]
    pub timestamp: Option<String>,

    /// Parse a single capture file and print it as pretty JSON.
    ///
    /// No collectors run and nothing is written; this is the debugging aid
    /// for inspecting what a buffer parses into.
    #[arg(
        long,
        value_name = "FILE",
        value_hint = ValueHint::FilePath,
        conflicts_with_all = ["collectors", "targets", "exec", "capture_dir"]
    )]
    pub parse_only: Option<PathBuf>,

    /// List the available collectors and exit.
    #[arg(long)]
    pub list_collectors: bool,

    /// If provided, outputs the completion file for the given shell.
    #[arg(value_enum, long, value_name = "SHELL")]
    pub generate_completion: Option<Shell>,
}

//! The remote-command execution layer.
//!
//! Collectors do not talk to devices themselves; they hand a command string
//! to a [`CommandRunner`] and get back one raw text buffer per target. A
//! failing target is reported in its own slot so the surrounding collection
//! loop can skip it and keep going.

use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use thiserror::Error;
use tracing::debug;

/// The error returned for a single target's command run.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The command template expanded to an empty command line.
    #[error("command template expanded to an empty command line")]
    EmptyCommand,

    /// The command template could not be split into arguments.
    #[error(transparent)]
    Template(#[from] shell_words::ParseError),

    /// The spawned command exited unsuccessfully.
    #[error("command on `{target}` exited with {status}: {stderr}")]
    CommandFailed {
        /// Target the command ran against.
        target: String,
        /// Exit status of the spawned process.
        status: ExitStatus,
        /// Captured standard error.
        stderr: String,
    },

    /// No capture file exists for the target/command pair.
    #[error("no capture for `{target}` at `{path}`")]
    MissingCapture {
        /// Target the capture was looked up for.
        target: String,
        /// Path that was probed.
        path: PathBuf,
    },

    /// IO errors.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The output of one command on one target.
#[derive(Debug)]
pub struct TargetOutput {
    /// The target identifier, e.g. a hostname.
    pub target: String,
    /// The command's standard output, or the per-target failure.
    pub output: Result<String, ExecError>,
}

/// Runs a command against a set of targets.
///
/// Implementations embed per-target failures in the returned slots; the run
/// itself never fails as a whole.
pub trait CommandRunner {
    /// Runs `command` on every target and returns the outputs in target
    /// order.
    fn run(&self, targets: &[String], command: &str) -> Vec<TargetOutput>;
}

/// Runs commands by expanding a template and spawning one local process per
/// target.
///
/// The template may reference `{target}` and `{command}`, e.g.
/// `ssh {target} tmsh -q -c {command}`. Expansion happens before the
/// template is split into arguments, so a multi-word command contributes
/// multiple arguments. Targets are spawned in parallel.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    template: String,
}

impl ProcessRunner {
    /// Creates a runner from a command template.
    pub fn new<T>(template: T) -> Self
    where
        T: Into<String>,
    {
        ProcessRunner {
            template: template.into(),
        }
    }

    fn run_one(&self, target: &str, command: &str) -> Result<String, ExecError> {
        let expanded = self
            .template
            .replace("{target}", target)
            .replace("{command}", command);

        let argv = shell_words::split(&expanded)?;
        let (program, args) = argv.split_first().ok_or(ExecError::EmptyCommand)?;

        debug!(target, program, "spawning collector command");

        let output = Command::new(program).args(args).output()?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(ExecError::CommandFailed {
                target: target.to_owned(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_owned(),
            })
        }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, targets: &[String], command: &str) -> Vec<TargetOutput> {
        targets
            .par_iter()
            .map(|target| TargetOutput {
                target: target.clone(),
                output: self.run_one(target, command),
            })
            .collect()
    }
}

/// Replays command output captured on disk, for offline runs and tests.
///
/// Captures live at `<dir>/<target>/<slug>.txt`, where `slug` is the result
/// of [`command_slug`] for the command.
#[derive(Debug, Clone)]
pub struct CaptureRunner {
    dir: PathBuf,
}

impl CaptureRunner {
    /// Creates a runner reading captures below `dir`.
    pub fn new<P>(dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        CaptureRunner { dir: dir.into() }
    }

    fn capture_path(&self, target: &str, command: &str) -> PathBuf {
        self.dir
            .join(target)
            .join(format!("{}.txt", command_slug(command)))
    }

    fn run_one(&self, target: &str, command: &str) -> Result<String, ExecError> {
        let path = self.capture_path(target, command);

        fs::read_to_string(&path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                ExecError::MissingCapture {
                    target: target.to_owned(),
                    path,
                }
            } else {
                ExecError::Io(err)
            }
        })
    }
}

impl CommandRunner for CaptureRunner {
    fn run(&self, targets: &[String], command: &str) -> Vec<TargetOutput> {
        targets
            .iter()
            .map(|target| TargetOutput {
                target: target.clone(),
                output: self.run_one(target, command),
            })
            .collect()
    }
}

/// Derives the capture file stem for a command: alphanumerics are kept
/// lowercase, every other run of characters collapses to a single `-`.
///
/// ## Example
///
/// ```
/// use netinv::exec::command_slug;
///
/// assert_eq!(command_slug("list net vlan /*/*"), "list-net-vlan");
/// ```
pub fn command_slug(command: &str) -> String {
    let mut slug = String::with_capacity(command.len());

    for ch in command.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }

    slug.trim_matches('-').to_owned()
}

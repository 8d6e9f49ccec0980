mod args;

use crate::args::Options;
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Command, CommandFactory, Parser};
use clap_complete::{generate, Shell};
use netinv::collector::{self, Collection, RunSummary};
use netinv::exec::{CaptureRunner, CommandRunner, ProcessRunner};
use netinv::sink::CsvSink;
use netinv::tmsh;
use std::io;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn print_completions(cmd: &mut Command, shell: Shell) {
    generate(shell, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

fn list_collectors() {
    for spec in collector::REGISTRY {
        println!(
            "{:<12} {:<36} -> {}",
            spec.name, spec.command, spec.table
        );
    }
}

fn parse_only(path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))?;

    let doc = tmsh::parse(&text)
        .with_context(|| format!("failed to parse `{}`", path.display()))?;

    serde_json::to_writer_pretty(io::stdout().lock(), &doc)?;
    println!();

    Ok(())
}

fn collect(opts: &Options, runner: &dyn CommandRunner) -> Result<RunSummary> {
    let resolved = collector::resolve(&opts.collectors)
        .context("failed to resolve collector selection")?;

    let timestamp = opts
        .timestamp
        .clone()
        .unwrap_or_else(|| Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string());

    let mut sink = CsvSink::new(&opts.out_dir);

    Collection::new(runner, &mut sink)
        .run(&resolved, &opts.targets, &timestamp)
        .with_context(|| {
            format!(
                "collection failed writing to `{}`",
                opts.out_dir.display()
            )
        })
}

fn main() -> Result<()> {
    let opts = Options::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("netinv=info")),
        )
        .with_writer(io::stderr)
        .init();

    if let Some(shell) = opts.generate_completion {
        let mut cmd = Options::command();
        print_completions(&mut cmd, shell);
        return Ok(());
    }

    if opts.list_collectors {
        list_collectors();
        return Ok(());
    }

    if let Some(path) = &opts.parse_only {
        return parse_only(path);
    }

    if opts.collectors.is_empty() {
        return Err(anyhow!("no collectors selected, pass -c/--collectors"));
    }

    if opts.targets.is_empty() {
        return Err(anyhow!("no targets selected, pass -t/--targets"));
    }

    let summary = match (&opts.capture_dir, &opts.exec) {
        (Some(dir), _) => collect(&opts, &CaptureRunner::new(dir.as_path()))?,
        (None, Some(template)) => collect(&opts, &ProcessRunner::new(template.as_str()))?,
        (None, None) => {
            return Err(anyhow!(
                "no execution layer selected, pass --exec or --capture-dir"
            ))
        }
    };

    println!(
        "wrote {} rows across {} tables to {}",
        summary.rows_written,
        summary.tables_written,
        opts.out_dir.display()
    );

    if summary.targets_skipped > 0 || summary.blocks_skipped > 0 {
        eprintln!(
            "skipped {} targets and {} blocks, see warnings above",
            summary.targets_skipped, summary.blocks_skipped
        );
    }

    Ok(())
}

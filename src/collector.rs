//! The declarative collector registry and the collection loop.
//!
//! A collector is a row in a static table: the command it runs, the block
//! prefix holding its records and the destination table. Dependencies
//! between collectors are part of the table and are resolved up front with a
//! topological sort, so the selection a user passes in is expanded and
//! ordered before anything runs.

use crate::error::Result;
use crate::exec::{CommandRunner, TargetOutput};
use crate::flatten::{self, FlatRecord};
use crate::sink::{self, TabularSink};
use crate::tmsh;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

/// A single inventory collector: which command to run and how to shape the
/// result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorSpec {
    /// Name the collector is selected by.
    pub name: &'static str,
    /// The command executed on each target.
    pub command: &'static str,
    /// Header prefix of the blocks holding this collector's records.
    pub block_prefix: &'static str,
    /// Destination table.
    pub table: &'static str,
    /// Collectors that must run before this one.
    pub depends_on: &'static [&'static str],
}

/// The built-in BIG-IP collectors.
pub const REGISTRY: &[CollectorSpec] = &[
    CollectorSpec {
        name: "interfaces",
        command: "list net interface all-properties",
        block_prefix: "net interface ",
        table: "bigip_interfaces",
        depends_on: &[],
    },
    CollectorSpec {
        name: "trunks",
        command: "list net trunk",
        block_prefix: "net trunk ",
        table: "bigip_trunks",
        depends_on: &["interfaces"],
    },
    CollectorSpec {
        name: "vlans",
        command: "list net vlan /*/*",
        block_prefix: "net vlan ",
        table: "bigip_vlans",
        depends_on: &["interfaces"],
    },
    CollectorSpec {
        name: "self_ips",
        command: "list net self /*/*",
        block_prefix: "net self ",
        table: "bigip_self_ips",
        depends_on: &["vlans"],
    },
];

static BY_NAME: Lazy<IndexMap<&'static str, &'static CollectorSpec>> =
    Lazy::new(|| REGISTRY.iter().map(|spec| (spec.name, spec)).collect());

/// The error returned when a collector selection cannot be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A selected or depended-on collector is not in the registry.
    #[error("unknown collector `{0}`")]
    UnknownCollector(String),

    /// The dependency graph contains a cycle.
    #[error("dependency cycle involving `{0}`")]
    DependencyCycle(String),
}

/// Expands a selection with its transitive dependencies, ordered so that
/// every collector runs after the collectors it depends on.
///
/// The order is deterministic: dependencies first, then selection order.
///
/// ## Example
///
/// ```
/// use netinv::collector;
///
/// let resolved = collector::resolve(&["self_ips"]).unwrap();
/// let names: Vec<_> = resolved.iter().map(|spec| spec.name).collect();
///
/// assert_eq!(names, ["interfaces", "vlans", "self_ips"]);
/// ```
pub fn resolve<S>(names: &[S]) -> Result<Vec<&'static CollectorSpec>, RegistryError>
where
    S: AsRef<str>,
{
    let mut state = IndexMap::new();
    let mut order = Vec::new();

    for name in names {
        visit(lookup(name.as_ref())?, &mut state, &mut order)?;
    }

    Ok(order)
}

fn lookup(name: &str) -> Result<&'static CollectorSpec, RegistryError> {
    BY_NAME
        .get(name)
        .copied()
        .ok_or_else(|| RegistryError::UnknownCollector(name.to_owned()))
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Visiting,
    Visited,
}

fn visit(
    spec: &'static CollectorSpec,
    state: &mut IndexMap<&'static str, Mark>,
    order: &mut Vec<&'static CollectorSpec>,
) -> Result<(), RegistryError> {
    match state.get(spec.name) {
        Some(Mark::Visited) => return Ok(()),
        Some(Mark::Visiting) => {
            return Err(RegistryError::DependencyCycle(spec.name.to_owned()))
        }
        None => {}
    }

    state.insert(spec.name, Mark::Visiting);

    for dep in spec.depends_on {
        visit(lookup(dep)?, state, order)?;
    }

    state.insert(spec.name, Mark::Visited);
    order.push(spec);

    Ok(())
}

/// What one [`Collection::run`] did, for reporting.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Tables that received rows.
    pub tables_written: usize,
    /// Rows appended across all tables.
    pub rows_written: usize,
    /// Targets skipped because the command or the parse failed.
    pub targets_skipped: usize,
    /// Blocks skipped because they did not hold key/value data.
    pub blocks_skipped: usize,
}

/// Runs resolved collectors against a target set and persists the records.
///
/// A failing target or a malformed block is logged and skipped; only sink
/// failures abort the run, since losing the store loses every snapshot.
pub struct Collection<'a> {
    runner: &'a dyn CommandRunner,
    sink: &'a mut dyn TabularSink,
}

impl<'a> Collection<'a> {
    /// Creates a collection over a runner and a sink.
    pub fn new(runner: &'a dyn CommandRunner, sink: &'a mut dyn TabularSink) -> Self {
        Collection { runner, sink }
    }

    /// Runs every collector in order and appends one snapshot per table,
    /// tagged with `timestamp`.
    pub fn run(
        &mut self,
        collectors: &[&CollectorSpec],
        targets: &[String],
        timestamp: &str,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for &spec in collectors {
            debug!(collector = spec.name, command = spec.command, "collecting");

            let outputs = self.runner.run(targets, spec.command);

            let harvests = outputs
                .par_iter()
                .map(|output| harvest_target(spec, output))
                .collect::<Vec<_>>();

            let mut records = Vec::new();

            for harvest in harvests {
                summary.targets_skipped += harvest.target_skipped as usize;
                summary.blocks_skipped += harvest.blocks_skipped;
                records.extend(harvest.records);
            }

            if records.is_empty() {
                debug!(collector = spec.name, "no records, skipping table write");
                continue;
            }

            self.sink.ensure_columns(spec.table, &sink::column_union(&records))?;
            self.sink.append_rows(spec.table, &records, timestamp)?;

            summary.tables_written += 1;
            summary.rows_written += records.len();
        }

        Ok(summary)
    }
}

#[derive(Debug, Default)]
struct Harvest {
    records: Vec<FlatRecord>,
    target_skipped: bool,
    blocks_skipped: usize,
}

fn harvest_target(spec: &CollectorSpec, output: &TargetOutput) -> Harvest {
    let mut harvest = Harvest::default();

    let text = match &output.output {
        Ok(text) => text,
        Err(err) => {
            warn!(
                collector = spec.name,
                target = output.target.as_str(),
                %err,
                "command failed, skipping target"
            );
            harvest.target_skipped = true;
            return harvest;
        }
    };

    let doc = match tmsh::parse(text) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(
                collector = spec.name,
                target = output.target.as_str(),
                %err,
                "parse failed, skipping target"
            );
            harvest.target_skipped = true;
            return harvest;
        }
    };

    for result in flatten::flatten_blocks(&doc, spec.block_prefix, &output.target) {
        match result {
            Ok(record) => harvest.records.push(record),
            Err(err) => {
                warn!(
                    collector = spec.name,
                    target = output.target.as_str(),
                    %err,
                    "skipping block"
                );
                harvest.blocks_skipped += 1;
            }
        }
    }

    harvest
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::exec::ExecError;
    use crate::sink::MemorySink;
    use pretty_assertions::assert_eq;

    /// A runner serving canned output per target.
    struct StaticRunner(Vec<(&'static str, Result<&'static str, ()>)>);

    impl CommandRunner for StaticRunner {
        fn run(&self, targets: &[String], _command: &str) -> Vec<TargetOutput> {
            targets
                .iter()
                .map(|target| {
                    let canned = self
                        .0
                        .iter()
                        .find(|(name, _)| name == target)
                        .map(|(_, output)| *output);

                    TargetOutput {
                        target: target.clone(),
                        output: match canned {
                            Some(Ok(text)) => Ok(text.to_owned()),
                            _ => Err(ExecError::EmptyCommand),
                        },
                    }
                })
                .collect()
        }
    }

    fn names(specs: &[&CollectorSpec]) -> Vec<&'static str> {
        specs.iter().map(|spec| spec.name).collect()
    }

    #[test]
    fn test_resolve_expands_dependencies() {
        assert_eq!(
            names(&resolve(&["self_ips"]).unwrap()),
            ["interfaces", "vlans", "self_ips"]
        );
    }

    #[test]
    fn test_resolve_deduplicates() {
        assert_eq!(
            names(&resolve(&["vlans", "self_ips", "vlans"]).unwrap()),
            ["interfaces", "vlans", "self_ips"]
        );
    }

    #[test]
    fn test_resolve_keeps_selection_order() {
        assert_eq!(
            names(&resolve(&["trunks", "vlans"]).unwrap()),
            ["interfaces", "trunks", "vlans"]
        );
    }

    #[test]
    fn test_resolve_rejects_unknown_names() {
        assert_eq!(
            resolve(&["bgp_neighbors"]),
            Err(RegistryError::UnknownCollector("bgp_neighbors".into()))
        );
    }

    #[test]
    fn test_registry_dependencies_resolve() {
        let all: Vec<&str> = REGISTRY.iter().map(|spec| spec.name).collect();

        assert_eq!(resolve(&all).unwrap().len(), REGISTRY.len());
    }

    #[test]
    fn test_run_skips_failing_targets() {
        let runner = StaticRunner(vec![
            ("ltm1", Ok("net vlan VLAN1 {\n    tag 100\n}")),
            ("ltm2", Err(())),
        ]);
        let mut sink = MemorySink::new();
        let vlans = lookup("vlans").unwrap();

        let summary = Collection::new(&runner, &mut sink)
            .run(&[vlans], &["ltm1".to_owned(), "ltm2".to_owned()], "t1")
            .unwrap();

        assert_eq!(
            summary,
            RunSummary {
                tables_written: 1,
                rows_written: 1,
                targets_skipped: 1,
                blocks_skipped: 0,
            }
        );

        let table = sink.table("bigip_vlans").unwrap();
        assert_eq!(table.columns, vec!["device", "name", "tag"]);
        assert_eq!(table.rows, vec![vec!["t1", "ltm1", "VLAN1", "100"]]);
    }

    #[test]
    fn test_run_skips_malformed_blocks() {
        let runner = StaticRunner(vec![(
            "ltm1",
            Ok("net vlan GOOD {\n    tag 100\n}\nnet vlan BARE { }"),
        )]);
        let mut sink = MemorySink::new();
        let vlans = lookup("vlans").unwrap();

        let summary = Collection::new(&runner, &mut sink)
            .run(&[vlans], &["ltm1".to_owned()], "t1")
            .unwrap();

        assert_eq!(summary.rows_written, 1);
        assert_eq!(summary.blocks_skipped, 1);
    }

    #[test]
    fn test_run_writes_nothing_for_empty_harvest() {
        let runner = StaticRunner(vec![("ltm1", Ok(""))]);
        let mut sink = MemorySink::new();
        let vlans = lookup("vlans").unwrap();

        let summary = Collection::new(&runner, &mut sink)
            .run(&[vlans], &["ltm1".to_owned()], "t1")
            .unwrap();

        assert_eq!(summary.tables_written, 0);
        assert!(sink.table("bigip_vlans").is_none());
    }
}

//! Tabular persistence for flat records.
//!
//! A [`TabularSink`] stores snapshots of [`FlatRecord`]s in named tables.
//! Device output is not stable across software versions, so sinks must
//! support online column migration: a column that first appears in a later
//! snapshot is added to the table and earlier rows read as empty for it.

use crate::flatten::FlatRecord;
use csv::StringRecord;
use indexmap::IndexMap;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// The timestamp column every sink table starts with.
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// The error returned by sink operations.
#[derive(Error, Debug)]
pub enum SinkError {
    /// IO errors.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Error emitted by csv.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Appends timestamped snapshots of flat records to named tables.
pub trait TabularSink {
    /// Creates the table if needed and adds any columns it is missing.
    /// Existing rows read as empty for added columns.
    fn ensure_columns(&mut self, table: &str, columns: &[String]) -> Result<(), SinkError>;

    /// Appends one snapshot of rows, each tagged with `timestamp`. Columns
    /// the table misses are added first.
    fn append_rows(
        &mut self,
        table: &str,
        rows: &[FlatRecord],
        timestamp: &str,
    ) -> Result<(), SinkError>;
}

/// One table held by a [`MemorySink`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryTable {
    /// Column names, without the leading timestamp column.
    pub columns: Vec<String>,
    /// Rows; the first cell of each row is the timestamp tag.
    pub rows: Vec<Vec<String>>,
}

/// An in-memory sink, used by tests and by callers that post-process the
/// records themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: IndexMap<String, MemoryTable>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a table by name, if it was written to.
    pub fn table(&self, name: &str) -> Option<&MemoryTable> {
        self.tables.get(name)
    }
}

impl TabularSink for MemorySink {
    fn ensure_columns(&mut self, table: &str, columns: &[String]) -> Result<(), SinkError> {
        let table = self.tables.entry(table.to_owned()).or_default();

        for column in columns {
            if !table.columns.contains(column) {
                table.columns.push(column.clone());

                for row in &mut table.rows {
                    row.push(String::new());
                }
            }
        }

        Ok(())
    }

    fn append_rows(
        &mut self,
        table: &str,
        rows: &[FlatRecord],
        timestamp: &str,
    ) -> Result<(), SinkError> {
        self.ensure_columns(table, &column_union(rows))?;

        let table = self.tables.get_mut(table).expect("ensured above");

        for record in rows {
            let mut row = Vec::with_capacity(table.columns.len() + 1);
            row.push(timestamp.to_owned());
            row.extend(
                table
                    .columns
                    .iter()
                    .map(|column| record.get(column).cloned().unwrap_or_default()),
            );
            table.rows.push(row);
        }

        Ok(())
    }
}

/// A sink writing one CSV file per table under a directory.
///
/// The first header field is always [`TIMESTAMP_COLUMN`]. Column migration
/// rewrites the file with the widened header and pads existing rows, the
/// file-based equivalent of `ALTER TABLE ... ADD COLUMN`.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    /// Creates a sink writing below `dir`. The directory is created on first
    /// write.
    pub fn new<P>(dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        CsvSink { dir: dir.into() }
    }

    /// The file a table is stored at.
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.csv"))
    }

    fn read_table(path: &Path) -> Result<(Vec<String>, Vec<StringRecord>), SinkError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let header = reader
            .headers()?
            .iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;

        Ok((header, rows))
    }

    fn write_table(
        path: &Path,
        header: &[String],
        rows: &[StringRecord],
    ) -> Result<(), SinkError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(header)?;

        for row in rows {
            let mut padded = row.iter().map(str::to_owned).collect::<Vec<_>>();
            padded.resize(header.len(), String::new());
            writer.write_record(&padded)?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl TabularSink for CsvSink {
    fn ensure_columns(&mut self, table: &str, columns: &[String]) -> Result<(), SinkError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.table_path(table);

        if !path.exists() {
            let mut header = vec![TIMESTAMP_COLUMN.to_owned()];
            header.extend(columns.iter().cloned());

            debug!(table, path = %path.display(), "creating table");
            return Self::write_table(&path, &header, &[]);
        }

        let (mut header, rows) = Self::read_table(&path)?;
        let missing = columns
            .iter()
            .filter(|&column| !header.contains(column))
            .cloned()
            .collect::<Vec<_>>();

        if !missing.is_empty() {
            debug!(table, columns = ?missing, "migrating table");
            header.extend(missing);
            Self::write_table(&path, &header, &rows)?;
        }

        Ok(())
    }

    fn append_rows(
        &mut self,
        table: &str,
        rows: &[FlatRecord],
        timestamp: &str,
    ) -> Result<(), SinkError> {
        self.ensure_columns(table, &column_union(rows))?;

        let path = self.table_path(table);
        let (header, _) = Self::read_table(&path)?;

        let file = OpenOptions::new().append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        for record in rows {
            let row = header.iter().map(|column| {
                if column == TIMESTAMP_COLUMN {
                    timestamp
                } else {
                    record.get(column).map(String::as_str).unwrap_or("")
                }
            });
            writer.write_record(row)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// The union of all column names across `rows`, in first-seen order.
pub fn column_union(rows: &[FlatRecord]) -> Vec<String> {
    let mut columns = Vec::new();

    for record in rows {
        for key in record.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    columns
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(pairs: &[(&str, &str)]) -> FlatRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_column_union_keeps_first_seen_order() {
        let rows = vec![
            record(&[("device", "a"), ("tag", "1")]),
            record(&[("device", "b"), ("mtu", "1500"), ("tag", "2")]),
        ];

        assert_eq!(column_union(&rows), columns(&["device", "tag", "mtu"]));
    }

    #[test]
    fn test_memory_sink_pads_heterogeneous_rows() {
        let mut sink = MemorySink::new();

        sink.append_rows(
            "vlans",
            &[
                record(&[("device", "ltm1"), ("tag", "100")]),
                record(&[("device", "ltm2"), ("mtu", "1500")]),
            ],
            "t1",
        )
        .unwrap();

        let table = sink.table("vlans").unwrap();
        assert_eq!(table.columns, columns(&["device", "tag", "mtu"]));
        assert_eq!(
            table.rows,
            vec![
                columns(&["t1", "ltm1", "100", ""]),
                columns(&["t1", "ltm2", "", "1500"]),
            ]
        );
    }

    #[test]
    fn test_memory_sink_migrates_existing_rows() {
        let mut sink = MemorySink::new();

        sink.append_rows("vlans", &[record(&[("tag", "100")])], "t1")
            .unwrap();
        sink.ensure_columns("vlans", &columns(&["tag", "mtu"])).unwrap();

        let table = sink.table("vlans").unwrap();
        assert_eq!(table.columns, columns(&["tag", "mtu"]));
        assert_eq!(table.rows, vec![columns(&["t1", "100", ""])]);
    }

    #[test]
    fn test_csv_sink_appends_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvSink::new(dir.path());

        sink.append_rows("vlans", &[record(&[("device", "ltm1"), ("tag", "100")])], "t1")
            .unwrap();
        sink.append_rows("vlans", &[record(&[("device", "ltm1"), ("tag", "100")])], "t2")
            .unwrap();

        let written = fs::read_to_string(sink.table_path("vlans")).unwrap();
        assert_eq!(
            written,
            "timestamp,device,tag\nt1,ltm1,100\nt2,ltm1,100\n"
        );
    }

    #[test]
    fn test_csv_sink_migrates_columns_online() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvSink::new(dir.path());

        sink.append_rows("vlans", &[record(&[("device", "ltm1"), ("tag", "100")])], "t1")
            .unwrap();
        // The next snapshot carries a column the table has not seen.
        sink.append_rows(
            "vlans",
            &[record(&[("device", "ltm2"), ("tag", "200"), ("mtu", "1500")])],
            "t2",
        )
        .unwrap();

        let written = fs::read_to_string(sink.table_path("vlans")).unwrap();
        assert_eq!(
            written,
            "timestamp,device,tag,mtu\nt1,ltm1,100,\nt2,ltm2,200,1500\n"
        );
    }
}

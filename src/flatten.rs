//! Projects parsed documents into flat tabular records.

use crate::document::Document;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

/// One tabular row derived from a single block's direct fields.
///
/// Keys are column names, values are scalar strings. Records produced from
/// sibling blocks may have heterogeneous key sets; reconciling them into a
/// uniform schema is the tabular sink's job.
pub type FlatRecord = IndexMap<String, String>;

/// The error returned when a block selected for flattening does not hold
/// key/value data, signaling malformed input or an unanticipated output
/// format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("block `{header}` is not an object (found {found})")]
pub struct ShapeError {
    /// Header of the offending block.
    pub header: String,
    /// The variant that was found instead.
    pub found: &'static str,
}

/// Flattens every root block whose header starts with `block_prefix` into one
/// [`FlatRecord`], with per-block error granularity.
///
/// Each record carries the block's direct scalar fields plus two injected
/// columns: `device` (the caller-supplied target id) and `name` (the last
/// whitespace-delimited token of the block header). Injected columns win
/// over block fields of the same name. Nested objects and lists are not
/// flattened; they are dropped from the record.
///
/// A block that is not an object yields an `Err` in its slot without
/// affecting sibling blocks, so callers can skip-and-continue at block
/// granularity. A root that is not an object matches nothing.
pub fn flatten_blocks(
    doc: &Document,
    block_prefix: &str,
    device: &str,
) -> Vec<Result<FlatRecord, ShapeError>> {
    let Some(root) = doc.as_object() else {
        return Vec::new();
    };

    root.iter()
        .filter(|(header, _)| header.starts_with(block_prefix))
        .map(|(header, value)| flatten_block(header, value, device))
        .collect()
}

/// Strict variant of [`flatten_blocks`]: fails on the first block that is
/// not an object.
///
/// ## Example
///
/// ```
/// use netinv::{flatten, tmsh};
/// # use std::error::Error;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let doc = tmsh::parse("net vlan VLAN1 {\n    tag 100\n}")?;
/// let records = flatten::flatten(&doc, "net vlan ", "ltm1")?;
///
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0]["device"], "ltm1");
/// assert_eq!(records[0]["name"], "VLAN1");
/// assert_eq!(records[0]["tag"], "100");
/// #     Ok(())
/// # }
/// ```
pub fn flatten(
    doc: &Document,
    block_prefix: &str,
    device: &str,
) -> Result<Vec<FlatRecord>, ShapeError> {
    flatten_blocks(doc, block_prefix, device).into_iter().collect()
}

fn flatten_block(header: &str, value: &Document, device: &str) -> Result<FlatRecord, ShapeError> {
    let fields = value.as_object().ok_or_else(|| ShapeError {
        header: header.to_owned(),
        found: if value.is_list() { "list" } else { "scalar" },
    })?;

    let name = header.split_whitespace().last().unwrap_or(header);

    let mut record = FlatRecord::new();
    record.insert("device".to_owned(), device.to_owned());
    record.insert("name".to_owned(), name.to_owned());

    for (key, field) in fields {
        if key == "device" || key == "name" {
            continue;
        }

        match field {
            Document::Scalar(s) => {
                record.insert(key.clone(), s.clone());
            }
            _ => debug!(header, field = key.as_str(), "dropping nested container"),
        }
    }

    Ok(record)
}

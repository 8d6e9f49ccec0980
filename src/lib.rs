//! netinv collects network device inventory into timestamped tables.
//!
//! The crate is built around two pure transformations and the glue that
//! feeds them:
//!
//! - [`tmsh::parse`] converts a device's brace-delimited `tmsh list` output
//!   into a typed [`Document`],
//! - [`flatten::flatten`] projects the document's named blocks into flat,
//!   string-keyed records,
//! - [`exec`] runs the vendor commands (or replays captures) per target,
//! - [`collector`] holds the declarative registry of collectors and drives
//!   the run-parse-flatten-store loop,
//! - [`sink`] persists the records as timestamped table snapshots with
//!   online column migration.
//!
//! Parsing and flattening are synchronous, reentrant and free of global
//! state; parallelism over targets lives entirely in the calling layers.

#![warn(missing_docs)]

pub mod collector;
pub mod document;
mod error;
pub mod exec;
pub mod flatten;
pub mod sink;
pub mod tmsh;

pub use document::Document;
pub use error::{Error, Result};

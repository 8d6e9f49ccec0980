//! Provides the document type produced by the parser.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An insertion-ordered map of keys to documents.
pub type Map = IndexMap<String, Document>;

/// The hierarchical value a configuration buffer parses into.
///
/// All leaf values are strings. The parser performs no numeric or boolean
/// coercion so that stored data stays byte-compatible across runs; callers
/// coerce downstream if they need typed values.
///
/// A `Document` serializes to plain JSON (strings, arrays and objects), which
/// is the round-trip format used for debugging and tests.
///
/// ## Example
///
/// ```
/// use netinv::Document;
/// use serde_json::json;
///
/// let doc = Document::from("up");
///
/// assert_eq!(serde_json::to_value(&doc).unwrap(), json!("up"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Document {
    /// A bare token or quoted string.
    Scalar(String),
    /// The members of a block whose body holds only bare tokens.
    List(Vec<Document>),
    /// A block with key/value data, nested blocks or named empty lists.
    Object(Map),
}

impl Document {
    /// Returns `true` if the document is a scalar.
    pub fn is_scalar(&self) -> bool {
        self.as_str().is_some()
    }

    /// Returns `true` if the document is a list.
    pub fn is_list(&self) -> bool {
        self.as_list().is_some()
    }

    /// Returns `true` if the document is an object.
    pub fn is_object(&self) -> bool {
        self.as_object().is_some()
    }

    /// If the document is a scalar, returns the string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// If the document is a list, returns its members.
    pub fn as_list(&self) -> Option<&[Document]> {
        match self {
            Document::List(list) => Some(list),
            _ => None,
        }
    }

    /// If the document is an object, returns the underlying map.
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Document::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a key if the document is an object, `None` otherwise.
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.as_object().and_then(|map| map.get(key))
    }
}

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Document::Scalar(s.to_owned())
    }
}

impl From<String> for Document {
    fn from(s: String) -> Self {
        Document::Scalar(s)
    }
}

impl FromIterator<Document> for Document {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        Document::List(iter.into_iter().collect())
    }
}

impl FromIterator<(String, Document)> for Document {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (String, Document)>,
    {
        Document::Object(iter.into_iter().collect())
    }
}

impl fmt::Display for Document {
    /// Formats the document as compact JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&s)
    }
}

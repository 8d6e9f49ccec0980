//! Parser for `tmsh list` style block-list output.
//!
//! BIG-IP `tmsh` prints configuration as named, brace-delimited blocks that
//! look close enough to JSON to be confusing but are neither JSON nor any
//! other standard format. This module recovers the structure from the line
//! syntax alone and produces a typed [`Document`]:
//!
//! - a line ending in `{` opens a block; the text before the marker is the
//!   block's key,
//! - a bare `}` closes the nearest open block,
//! - `name { }` on one line is a named empty list,
//! - any other line is data: a bare token (list member) or a key/value pair
//!   where quoted spans count as one token.
//!
//! Whether a block materializes as a list or an object is decided from its
//! body: if any data line carries more than one token, or the block contains
//! a nested or empty block, it is an object; if every data line is a single
//! token it is a list. In a mixed block, single-token lines become entries
//! keyed by the token with an empty value.
//!
//! Parsing is a pure function of the input buffer. It either returns a
//! complete document or fails with a [`ParseError`]; no partial state leaks
//! out of a failed call.

mod error;
mod line;

pub use error::ParseError;

use crate::document::{Document, Map};
use line::Line;

/// Parses block-list output into a [`Document`].
///
/// The root of the returned document is always an object whose keys are the
/// top-level block headers.
///
/// ## Example
///
/// ```
/// use netinv::tmsh;
/// use serde_json::json;
/// # use std::error::Error;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let doc = tmsh::parse("net vlan VLAN1 {\n    tag 100\n    interfaces { }\n}")?;
///
/// assert_eq!(
///     serde_json::to_value(&doc)?,
///     json!({"net vlan VLAN1": {"tag": "100", "interfaces": []}})
/// );
/// #     Ok(())
/// # }
/// ```
///
/// ## Errors
///
/// - [`ParseError::UnbalancedBlocks`] if a `}` has no matching open block.
/// - [`ParseError::UnterminatedBlock`] if the input ends with open blocks.
/// - [`ParseError::AmbiguousLine`] if a line fits none of the grammar rules.
pub fn parse(text: &str) -> Result<Document, ParseError> {
    let mut stack = vec![Frame::root()];

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;

        match line::classify(raw, line_no)? {
            Line::Blank => {}
            Line::Open(header) => stack.push(Frame::new(header, line_no)),
            Line::EmptyList(name) => {
                top(&mut stack).push_keyed(name, Document::List(Vec::new()));
            }
            Line::Data(tokens) => top(&mut stack).push_data(tokens),
            Line::Close => {
                if stack.len() == 1 {
                    return Err(ParseError::UnbalancedBlocks { line: line_no });
                }

                let frame = stack.pop().expect("stack holds at least the root");
                let (header, doc) = frame.finalize();
                top(&mut stack).push_keyed(header, doc);
            }
        }
    }

    if stack.len() > 1 {
        let frame = stack.last().expect("stack is non-empty");
        return Err(ParseError::UnterminatedBlock {
            header: frame.header.clone(),
            line: frame.line,
        });
    }

    let root = stack.pop().expect("stack holds the root");
    Ok(root.finalize_root())
}

fn top<'a>(stack: &'a mut [Frame]) -> &'a mut Frame {
    stack.last_mut().expect("stack holds at least the root")
}

/// One entry of a partially-built block, in source order.
#[derive(Debug)]
enum Entry {
    /// A key/value pair, nested block or named empty list.
    Keyed(String, Document),
    /// A bare single-token line.
    Member(String),
}

/// A block whose closing `}` has not been seen yet.
#[derive(Debug)]
struct Frame {
    header: String,
    line: usize,
    entries: Vec<Entry>,
}

impl Frame {
    fn root() -> Self {
        Frame::new(String::new(), 0)
    }

    fn new(header: String, line: usize) -> Self {
        Frame {
            header,
            line,
            entries: Vec::new(),
        }
    }

    fn push_keyed(&mut self, key: String, doc: Document) {
        self.entries.push(Entry::Keyed(key, doc));
    }

    fn push_data(&mut self, mut tokens: Vec<String>) {
        match tokens.len() {
            0 => {}
            1 => self.entries.push(Entry::Member(tokens.remove(0))),
            _ => {
                let key = tokens.remove(0);
                let value = tokens.join(" ");
                self.push_keyed(key, Document::Scalar(value));
            }
        }
    }

    /// Materializes the block. Any keyed entry makes it an object; a body of
    /// bare tokens only (or nothing at all) makes it a list.
    fn finalize(self) -> (String, Document) {
        let object = self.entries.iter().any(|e| matches!(e, Entry::Keyed(..)));

        if object {
            let doc = into_object(self.entries);
            (self.header, doc)
        } else {
            let members = self
                .entries
                .into_iter()
                .map(|entry| match entry {
                    Entry::Member(token) => Document::Scalar(token),
                    Entry::Keyed(..) => unreachable!("checked above"),
                })
                .collect();

            (self.header, Document::List(members))
        }
    }

    /// The root is an object regardless of its entries.
    fn finalize_root(self) -> Document {
        into_object(self.entries)
    }
}

fn into_object(entries: Vec<Entry>) -> Document {
    let mut map = Map::with_capacity(entries.len());

    for entry in entries {
        // A duplicate key overwrites the earlier value but keeps its
        // original position.
        match entry {
            Entry::Keyed(key, doc) => map.insert(key, doc),
            Entry::Member(token) => map.insert(token, Document::Scalar(String::new())),
        };
    }

    Document::Object(map)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parsed_json(text: &str) -> serde_json::Value {
        serde_json::to_value(parse(text).unwrap()).unwrap()
    }

    #[test]
    fn test_empty_block_is_empty_list() {
        assert_eq!(parsed_json("name { }"), json!({"name": []}));
    }

    #[test]
    fn test_flat_object_block() {
        let text = "block {\n  k1 v1\n  k2 \"v2 with space\"\n}";

        assert_eq!(
            parsed_json(text),
            json!({"block": {"k1": "v1", "k2": "v2 with space"}})
        );
    }

    #[test]
    fn test_pure_list_block() {
        let text = "block {\n  a\n  b\n  c\n}";

        assert_eq!(parsed_json(text), json!({"block": ["a", "b", "c"]}));
    }

    #[test]
    fn test_nested_block() {
        let text = "net self BIGIQ {\n    allow-service {\n        tcp:https\n        tcp:ssh\n    }\n}";

        assert_eq!(
            parsed_json(text),
            json!({"net self BIGIQ": {"allow-service": ["tcp:https", "tcp:ssh"]}})
        );
    }

    #[test]
    fn test_quoted_multi_word_value() {
        assert_eq!(
            parsed_json("block {\n    vendor \"F5 NETWORKS INC.\"\n}"),
            json!({"block": {"vendor": "F5 NETWORKS INC."}})
        );
    }

    #[test]
    fn test_unquoted_multi_token_value_is_folded() {
        assert_eq!(
            parsed_json("block {\n    description spare uplink port\n}"),
            json!({"block": {"description": "spare uplink port"}})
        );
    }

    #[test]
    fn test_interface_listing() {
        // Representative `list net interface` output.
        let text = "\
net interface 1.0 {
    if-index 542
    mac-address 00:94:a1:91:23:44
    media-active 1000SX-FD
    module-description \"F5 Qualified Optic\"
    mtu 9198
    vendor \"F5 NETWORKS INC.\"
}
net interface 2.0 { }
";

        assert_eq!(
            parsed_json(text),
            json!({
                "net interface 1.0": {
                    "if-index": "542",
                    "mac-address": "00:94:a1:91:23:44",
                    "media-active": "1000SX-FD",
                    "module-description": "F5 Qualified Optic",
                    "mtu": "9198",
                    "vendor": "F5 NETWORKS INC."
                },
                "net interface 2.0": []
            })
        );
    }

    #[test]
    fn test_mixed_block_materializes_as_object() {
        // The tie-break: any multi-token line makes the whole block an
        // object; bare tokens become keys with empty values.
        let text = "block {\n    default\n    fwd-mode l3\n}";

        assert_eq!(
            parsed_json(text),
            json!({"block": {"default": "", "fwd-mode": "l3"}})
        );
    }

    #[test]
    fn test_multi_line_empty_block_is_empty_list() {
        assert_eq!(parsed_json("foo {\n}"), json!({"foo": []}));
    }

    #[test]
    fn test_empty_input_is_empty_object() {
        assert_eq!(parsed_json(""), json!({}));
        assert_eq!(parsed_json("\n  \n"), json!({}));
    }

    #[test]
    fn test_duplicate_key_overwrites() {
        let text = "block {\n    mtu 1500\n    mtu 9198\n}";

        assert_eq!(parsed_json(text), json!({"block": {"mtu": "9198"}}));
    }

    #[test]
    fn test_deterministic_ordering() {
        let text = "b { }\na {\n    z 1\n    y 2\n}";

        let first = serde_json::to_string(&parse(text).unwrap()).unwrap();
        let second = serde_json::to_string(&parse(text).unwrap()).unwrap();

        assert_eq!(first, second);
        // Source order is preserved, not sorted.
        assert_eq!(first, r#"{"b":[],"a":{"z":"1","y":"2"}}"#);
    }

    #[test]
    fn test_unbalanced_close_fails() {
        assert_eq!(
            parse("block {\n}\n}"),
            Err(ParseError::UnbalancedBlocks { line: 3 })
        );
    }

    #[test]
    fn test_unterminated_block_fails() {
        assert_eq!(
            parse("outer {\n    inner {\n    }\n"),
            Err(ParseError::UnterminatedBlock {
                header: "outer".into(),
                line: 1,
            })
        );
    }

    #[test]
    fn test_ambiguous_line_fails_with_position() {
        assert_eq!(
            parse("block {\n    oops } here\n}"),
            Err(ParseError::AmbiguousLine {
                line: 2,
                text: "oops } here".into(),
            })
        );
    }
}

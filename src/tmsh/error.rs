use thiserror::Error;

/// The error returned when a buffer cannot be reduced to a well-formed
/// document.
///
/// Parsing fails atomically: no partial document is observable after any of
/// these errors. Line numbers are 1-based.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A `}` with no open block to close.
    #[error("unbalanced blocks: `}}` at line {line} has no matching `{{`")]
    UnbalancedBlocks {
        /// Line carrying the stray close marker.
        line: usize,
    },

    /// The input ended while blocks were still open.
    #[error("unterminated block `{header}` opened at line {line}")]
    UnterminatedBlock {
        /// Header of the innermost unclosed block.
        header: String,
        /// Line the block was opened at.
        line: usize,
    },

    /// A line that none of the grammar rules apply to, e.g. trailing text
    /// after an open marker or around a close marker.
    #[error("ambiguous line {line}: `{text}`")]
    AmbiguousLine {
        /// Line the offending text was found at.
        line: usize,
        /// The trimmed line content.
        text: String,
    },
}

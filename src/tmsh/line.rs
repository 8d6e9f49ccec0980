use super::ParseError;

/// A classified line of block-list output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Line {
    /// Nothing but whitespace.
    Blank,
    /// `net vlan VLAN1 {` opens a block; holds the text before the marker.
    Open(String),
    /// A bare `}`.
    Close,
    /// `2.0 { }` denotes a named empty list; holds the text before the
    /// braces.
    EmptyList(String),
    /// Anything else; holds the line's tokens.
    Data(Vec<String>),
}

/// Classifies one raw line. `line_no` is 1-based and only used in errors.
pub(crate) fn classify(raw: &str, line_no: usize) -> Result<Line, ParseError> {
    let line = raw.trim();

    if line.is_empty() {
        return Ok(Line::Blank);
    }

    let ambiguous = || ParseError::AmbiguousLine {
        line: line_no,
        text: line.to_owned(),
    };

    match (line.find('{'), line.rfind('}')) {
        (Some(open), Some(close)) => {
            // Open and close on one line is only valid as `name { }`, which
            // always denotes an empty list keyed by the text before the
            // braces, never an empty object.
            if close < open
                || !line[open + 1..close].trim().is_empty()
                || !line[close + 1..].trim().is_empty()
            {
                return Err(ambiguous());
            }

            let name = line[..open].trim();

            if name.is_empty() {
                Err(ambiguous())
            } else {
                Ok(Line::EmptyList(name.to_owned()))
            }
        }
        (Some(open), None) => {
            // Block header; the marker must be the last thing on the line.
            if !line[open + 1..].trim().is_empty() {
                return Err(ambiguous());
            }

            let header = line[..open].trim();

            if header.is_empty() {
                Err(ambiguous())
            } else {
                Ok(Line::Open(header.to_owned()))
            }
        }
        (None, Some(_)) => {
            if line == "}" {
                Ok(Line::Close)
            } else {
                Err(ambiguous())
            }
        }
        (None, None) => Ok(Line::Data(split_tokens(line))),
    }
}

/// Splits a data line into tokens.
///
/// If the line contains at least one non-empty quoted span, each
/// quote-delimited segment becomes one token (so quoted values keep their
/// inner whitespace). Otherwise the line is split on whitespace.
pub(crate) fn split_tokens(line: &str) -> Vec<String> {
    if line.contains('"') {
        let parts: Vec<&str> = line.split('"').collect();

        // Segments at odd indices sit between a quote pair.
        let has_quoted = parts
            .iter()
            .skip(1)
            .step_by(2)
            .any(|part| !part.trim().is_empty());

        if has_quoted {
            return parts
                .iter()
                .map(|part| part.trim())
                .filter(|part| !part.is_empty())
                .map(str::to_owned)
                .collect();
        }
    }

    line.split_whitespace().map(str::to_owned).collect()
}

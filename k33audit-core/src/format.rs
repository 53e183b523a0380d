//! Graph file encodings understood at the engine boundary.

use std::{
    fmt,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::error::{AuditError, FormatError, Result};

/// Header token that may prefix the first record of a graph6 file.
pub const GRAPH6_HEADER: &str = ">>graph6<<";

/// File suffix carried by graph6 collections.
pub const GRAPH6_SUFFIX: &str = "g6";

/// Header line of LEDA graph files.
pub const LEDA_HEADER: &str = "LEDA.GRAPH";

/// Encodings recognised by [`detect_input_format`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum InputFormat {
    /// LEDA graph format.
    Leda,
    /// Zero-based adjacency list headed by `N=<order>`.
    AdjacencyList,
    /// Upper-triangular adjacency matrix.
    AdjacencyMatrix,
    /// One graph6 record per line.
    Graph6,
}

impl InputFormat {
    /// Returns the label the planarity engine uses for the format.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Leda => "LEDA",
            Self::AdjacencyList => "AdjList",
            Self::AdjacencyMatrix => "AdjMat",
            Self::Graph6 => "G6",
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classifies `path` by its first line.
///
/// # Errors
/// Returns [`AuditError::Io`] when the file cannot be read and
/// [`AuditError::Format`] when it is empty or matches no known encoding.
pub fn detect_input_format(path: &Path) -> Result<InputFormat> {
    let file = File::open(path).map_err(|source| AuditError::io(path, source))?;
    let mut first_line = String::new();
    BufReader::new(file)
        .read_line(&mut first_line)
        .map_err(|source| AuditError::io(path, source))?;
    let has_graph6_suffix = path
        .extension()
        .is_some_and(|extension| extension == GRAPH6_SUFFIX);
    classify_first_line(&first_line, has_graph6_suffix)
        .map_err(|source| AuditError::format(path, source))
}

pub(crate) fn classify_first_line(
    first_line: &str,
    has_graph6_suffix: bool,
) -> core::result::Result<InputFormat, FormatError> {
    let Some(first_byte) = first_line.bytes().next() else {
        return Err(FormatError::EmptyFile);
    };
    if first_line.contains(LEDA_HEADER) {
        return Ok(InputFormat::Leda);
    }
    if parse_order_header(first_line).is_some() {
        return Ok(InputFormat::AdjacencyList);
    }
    if first_byte.is_ascii_digit() {
        return Ok(InputFormat::AdjacencyMatrix);
    }
    if has_graph6_suffix
        && (first_line.starts_with(GRAPH6_HEADER) || (63..=126).contains(&first_byte))
    {
        return Ok(InputFormat::Graph6);
    }
    Err(FormatError::UnknownEncoding)
}

/// Parses an `N=<digits>` prefix, ignoring anything after the digits.
pub(crate) fn parse_order_header(line: &str) -> Option<usize> {
    let digits = line.strip_prefix("N=")?;
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits.get(..end)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::leda("LEDA.GRAPH\n", false, InputFormat::Leda)]
    #[case::adjacency_list("N=5\n", false, InputFormat::AdjacencyList)]
    #[case::adjacency_matrix("5\n", false, InputFormat::AdjacencyMatrix)]
    #[case::graph6_with_header(">>graph6<<D~{\n", true, InputFormat::Graph6)]
    #[case::graph6_bare("D~{\n", true, InputFormat::Graph6)]
    fn classify_first_line_recognises_encodings(
        #[case] line: &str,
        #[case] suffix: bool,
        #[case] expected: InputFormat,
    ) {
        assert_eq!(classify_first_line(line, suffix), Ok(expected));
    }

    #[rstest]
    #[case::empty("", true, FormatError::EmptyFile)]
    #[case::graph6_without_suffix("D~{\n", false, FormatError::UnknownEncoding)]
    #[case::control_byte("\u{1}\n", true, FormatError::UnknownEncoding)]
    fn classify_first_line_rejects_unknown_input(
        #[case] line: &str,
        #[case] suffix: bool,
        #[case] expected: FormatError,
    ) {
        assert_eq!(classify_first_line(line, suffix), Err(expected));
    }

    #[rstest]
    #[case("N=12", Some(12))]
    #[case("N=7 trailing", Some(7))]
    #[case("N=", None)]
    #[case("M=3", None)]
    fn parse_order_header_reads_leading_digits(#[case] line: &str, #[case] expected: Option<usize>) {
        assert_eq!(parse_order_header(line), expected);
    }
}

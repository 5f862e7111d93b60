//! Source positions for tokens, declarations, and compile diagnostics.

use std::fmt;
use std::sync::Arc;

/// A location in story source.
///
/// Lines and columns are 1-based. Columns count characters rather than
/// bytes so that positions stay meaningful in prose-heavy sources.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    /// Name of the source this location refers to, usually a file name.
    pub source: Arc<str>,
    /// 1-based line number.
    pub line: u32,
    /// 1-based character column.
    pub column: u32,
}

impl Position {
    /// Creates a position at an explicit line and column.
    #[must_use]
    pub fn new(source: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            source: source.into(),
            line,
            column,
        }
    }

    /// Creates a position at the start of a source.
    #[must_use]
    pub fn start(source: impl Into<Arc<str>>) -> Self {
        Self::new(source, 1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({},{})", self.source, self.line, self.column)
    }
}

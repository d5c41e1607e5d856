//! Location of elements in a text interface.

use derive_more::{Constructor, Display, From};

/// Line and column position.
#[derive(Clone, Copy, Constructor, Debug, Default, Display, Eq, PartialEq, From, Ord, PartialOrd)]
#[display(fmt = "{line}:{column}")]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Span of position.
#[derive(Clone, Copy, Constructor, Debug, Default, Display, Eq, PartialEq, From, Ord, PartialOrd)]
#[display(fmt = "{start}-{end}")]
pub struct Location {
    #[from(forward)]
    pub start: Position,

    #[from(forward)]
    pub end: Position,
}

impl Location {
    /// The location spanning a whole source line.
    #[inline]
    #[must_use]
    pub const fn line(line: usize) -> Self {
        Self {
            start: Position { line, column: 1 },
            end: Position { line, column: 1 },
        }
    }

    /// Moves a location relative to a given line of a bigger file, keeping columns as is.
    #[inline]
    #[must_use]
    pub const fn offset_lines(self, line: usize) -> Self {
        Self {
            start: Position {
                line: self.start.line + line - 1,
                column: self.start.column,
            },
            end: Position {
                line: self.end.line + line - 1,
                column: self.end.column,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let loc = Location::new((1, 2).into(), (3, 4).into());
        assert_eq!(loc.to_string(), "1:2-3:4");
    }

    #[test]
    fn offset() {
        let loc = Location::new((1, 5).into(), (1, 9).into());
        assert_eq!(loc.offset_lines(12), Location::new((12, 5).into(), (12, 9).into()));
    }
}

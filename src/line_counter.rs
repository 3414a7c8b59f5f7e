use alloc::vec::Vec;

/// A position in the source.
///
/// `line` and `column` are zero-based; `column` counts characters.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub struct Mark {
    /// The position index, in bytes.
    pub index: usize,
    /// The position line.
    pub line: usize,
    /// The position column.
    pub column: usize,
}

impl core::fmt::Display for Mark {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "line {} column {}", self.line + 1, self.column + 1)
    }
}

/// Tracks the byte offsets at which lines start, so that offsets can be
/// turned into line and column numbers.
///
/// Filled in by a [`Parser`](crate::Parser) with
/// [`track_lines`](crate::Parser::track_lines) enabled.
#[derive(Clone, Debug, Default)]
pub struct LineCounter {
    line_starts: Vec<usize>,
}

impl LineCounter {
    pub fn new() -> LineCounter {
        LineCounter::default()
    }

    /// Record that a line starts at `offset`.
    pub fn add_new_line(&mut self, offset: usize) {
        self.line_starts.push(offset);
    }

    pub fn line_starts(&self) -> &[usize] {
        &self.line_starts
    }

    /// Convert `offset` into a [`Mark`].
    ///
    /// `source` is needed to count characters rather than bytes for the
    /// column; without it the column is a byte count.
    pub fn mark(&self, offset: usize, source: Option<&str>) -> Mark {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(0) => 0,
            Err(next) => next - 1,
        };
        let start = self.line_starts.get(line).copied().unwrap_or(0);
        let column = match source.and_then(|s| s.get(start..offset)) {
            Some(text) => text.chars().count(),
            None => offset.saturating_sub(start),
        };
        Mark {
            index: offset,
            line,
            column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks() {
        let source = "{\n  é: 1,\n}";
        let mut lines = LineCounter::new();
        for start in [0, 2, 11] {
            lines.add_new_line(start);
        }
        let mark = lines.mark(7, Some(source));
        assert_eq!((mark.line, mark.column), (1, 4));
        let mark = lines.mark(7, None);
        assert_eq!((mark.line, mark.column), (1, 5));
        let mark = lines.mark(11, Some(source));
        assert_eq!((mark.line, mark.column), (2, 0));
        assert_eq!(lines.mark(0, None), Mark::default());
    }
}

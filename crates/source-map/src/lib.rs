//! Source positions for view templates.
//!
//! Templates are parsed from a single string; every node, attribute and
//! diagnostic carries a byte [`Span`] into that string. [`LineIndex`] turns
//! those offsets back into line/column pairs when an error is reported.

use std::fmt;
use std::ops::Range;

/// A span in the source code, representing a half-open range [start, end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// Start offset (inclusive)
    pub start: u32,
    /// End offset (exclusive)
    pub end: u32,
}

impl Span {
    /// Create a new span from start and end offsets.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create an empty span at the given offset.
    #[inline]
    pub const fn empty(offset: u32) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Create a span from byte offsets.
    #[inline]
    pub fn from_offsets(start: usize, end: usize) -> Self {
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    /// Get the length of the span.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Check if the span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span contains an offset.
    #[inline]
    pub const fn contains_offset(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Merge two spans into one that covers both.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Convert to a `Range<usize>`.
    #[inline]
    pub fn to_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// The slice of `source` covered by this span, if it is in bounds.
    pub fn slice(self, source: &str) -> Option<&str> {
        source.get(self.to_range())
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::from_offsets(range.start, range.end)
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.to_range()
    }
}

/// A line index for converting between byte offsets and line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offsets of the start of each line.
    line_starts: Vec<u32>,
    /// Total length of the source.
    len: u32,
}

impl LineIndex {
    /// Create a new line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self {
            line_starts,
            len: text.len() as u32,
        }
    }

    /// Get the line and column for a byte offset.
    /// Line and column are 0-indexed. Offsets past the end clamp to the end.
    pub fn line_col(&self, offset: u32) -> LineCol {
        let offset = offset.min(self.len);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        LineCol {
            line: line as u32,
            col: offset - self.line_starts[line],
        }
    }

    /// Get the byte offset for a line and column.
    /// Returns None if the position is out of bounds.
    pub fn offset(&self, line_col: LineCol) -> Option<u32> {
        let line_start = self.line_starts.get(line_col.line as usize)?;
        let offset = line_start + line_col.col;
        (offset <= self.len).then_some(offset)
    }

    /// Get the number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of the start of a span.
    pub fn locate(&self, span: Span) -> LineCol {
        self.line_col(span.start)
    }
}

/// A line and column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed column (byte offset within line).
    pub col: u32,
}

impl LineCol {
    /// Create a new line/column position.
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Convert to 1-indexed for display.
    #[inline]
    pub const fn to_display(self) -> (u32, u32) {
        (self.line + 1, self.col + 1)
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line, col) = self.to_display();
        write!(f, "{}:{}", line, col)
    }
}

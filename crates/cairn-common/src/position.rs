//! Position and location utilities.
//!
//! Diagnostics are reported against byte-offset spans; hosts that render
//! them need line/column positions. This module provides the conversion.

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// A position in a source file (0-indexed line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed column, counted in characters
    pub column: u32,
}

impl Position {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A range in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Line map for efficient offset -> position conversion.
/// Stores the starting offset of each line.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Starting offset of each line (`line_starts[0]` is always 0)
    line_starts: Vec<u32>,
}

impl LineMap {
    /// Build a line map from source text.
    #[must_use]
    pub fn build(source: &str) -> Self {
        let mut line_starts = vec![0u32];

        for (i, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(u32::try_from(i + 1).unwrap_or(u32::MAX));
            } else if ch == '\r' {
                let next_idx = i + 1;
                if source.as_bytes().get(next_idx) != Some(&b'\n') {
                    line_starts.push(u32::try_from(next_idx).unwrap_or(u32::MAX));
                }
            }
        }

        Self { line_starts }
    }

    /// Convert a byte offset to a position (line, column).
    #[must_use]
    pub fn offset_to_position(&self, offset: u32, source: &str) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_point) => insert_point.saturating_sub(1),
        };

        let line_start = (self.line_starts.get(line).copied().unwrap_or(0) as usize).min(source.len());
        let clamped_end = (offset as usize).min(source.len());
        let start = line_start.min(clamped_end);
        let column = source
            .get(start..clamped_end)
            .map_or(0, |slice| slice.chars().count());

        Position {
            line: u32::try_from(line).unwrap_or(u32::MAX),
            column: u32::try_from(column).unwrap_or(u32::MAX),
        }
    }

    /// Convert a byte-offset span to a line/column range.
    #[must_use]
    pub fn span_to_range(&self, span: Span, source: &str) -> Range {
        Range {
            start: self.offset_to_position(span.start, source),
            end: self.offset_to_position(span.end, source),
        }
    }

    /// Get the number of lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Get the starting offset of a line.
    #[must_use]
    pub fn line_start(&self, line: usize) -> Option<u32> {
        self.line_starts.get(line).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_to_position() {
        let source = "let a = 1\nlet b = 2\n";
        let map = LineMap::build(source);
        assert_eq!(map.line_count(), 3);
        assert_eq!(map.offset_to_position(0, source), Position::new(0, 0));
        assert_eq!(map.offset_to_position(4, source), Position::new(0, 4));
        assert_eq!(map.offset_to_position(10, source), Position::new(1, 0));
        assert_eq!(map.offset_to_position(14, source), Position::new(1, 4));
    }

    #[test]
    fn test_span_to_range_multiline() {
        let source = "a\nbc\ndef";
        let map = LineMap::build(source);
        let range = map.span_to_range(Span::new(2, 7), source);
        assert_eq!(range.start, Position::new(1, 0));
        assert_eq!(range.end, Position::new(2, 2));
    }
}

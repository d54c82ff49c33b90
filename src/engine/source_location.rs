//! Source Location Utilities
//!
//! This module provides utilities for tracking and formatting source code positions.
//! It consolidates the line/column calculation and snippet rendering used by
//! every diagnostic the parser produces.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker inserted into snippets at the reported position
pub const SNIPPET_MARKER: &str = "→";

/// Default number of characters shown on each side of a snippet marker
pub const DEFAULT_SNIPPET_WINDOW: usize = 20;

/// A position in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    /// Byte offset from start of input
    pub offset: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, counted in characters)
    pub column: usize,
}

impl SourcePosition {
    /// Create a new source position
    #[inline]
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Create a position at the start of input
    #[inline]
    pub fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Calculate position from an offset in the input
    ///
    /// Offsets past the end are clamped to the input length.
    pub fn from_offset(input: &str, offset: usize) -> Self {
        let offset = offset.min(input.len());

        let mut line = 1;
        let mut column = 1;

        for (current_offset, ch) in input.char_indices() {
            if current_offset >= offset {
                break;
            }

            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self::start()
    }
}

/// Compute the 1-based line and column of a byte offset
///
/// The column is the number of characters since the last newline plus one.
#[inline]
pub fn compute_position(input: &str, offset: usize) -> SourcePosition {
    SourcePosition::from_offset(input, offset)
}

/// Render a bounded excerpt of `input` around `offset`
///
/// At most `window` characters are kept on each side of the offset, the
/// [`SNIPPET_MARKER`] is inserted at the offset, `...` marks truncation at
/// either end, and newlines, tabs and carriage returns are shown escaped.
///
/// ```rust
/// use precedent::engine::source_location::build_snippet;
///
/// assert_eq!(build_snippet("1 +\n2", 4, 20), "1 +\\n→2");
/// ```
pub fn build_snippet(input: &str, offset: usize, window: usize) -> String {
    let offset = floor_char_boundary(input, offset.min(input.len()));

    let start = input[..offset]
        .char_indices()
        .rev()
        .nth(window.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let start = if window == 0 { offset } else { start };

    let end = input[offset..]
        .char_indices()
        .nth(window)
        .map(|(i, _)| offset + i)
        .unwrap_or(input.len());

    let mut snippet = String::with_capacity(end - start + 8);
    if start > 0 {
        snippet.push_str("...");
    }
    push_escaped(&mut snippet, &input[start..offset]);
    snippet.push_str(SNIPPET_MARKER);
    push_escaped(&mut snippet, &input[offset..end]);
    if end < input.len() {
        snippet.push_str("...");
    }
    snippet
}

/// Get the line content at a given offset
pub fn get_line_at_offset(input: &str, offset: usize) -> &str {
    let offset = floor_char_boundary(input, offset.min(input.len()));

    // Find start of line
    let line_start = if let Some(pos) = input[..offset].rfind('\n') {
        pos + 1
    } else {
        0
    };

    // Find end of line
    let line_end = if let Some(pos) = input[offset..].find('\n') {
        offset + pos
    } else {
        input.len()
    };

    &input[line_start..line_end]
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
}

fn floor_char_boundary(input: &str, mut offset: usize) -> usize {
    while offset > 0 && !input.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

//! Source spans
//!
//! Offsets are character indices into the source text, not byte indices.

use serde::{Deserialize, Serialize};

/// Half-open range `[start, end)` of source characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span covering both `self` and `other`
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 1-based line and column of a character offset
pub fn line_column(chars: &[char], offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for c in chars.iter().take(offset) {
        if *c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// Text of the line containing `offset`, without its newline
pub fn line_text(chars: &[char], offset: usize) -> String {
    let offset = offset.min(chars.len());
    let start = chars[..offset]
        .iter()
        .rposition(|c| *c == '\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let end = chars[offset..]
        .iter()
        .position(|c| *c == '\n')
        .map(|i| offset + i)
        .unwrap_or(chars.len());
    chars[start..end].iter().collect()
}

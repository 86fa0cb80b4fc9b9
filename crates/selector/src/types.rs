use crate::range::{RangeEntry, RangeSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Location of a function in the full source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionSpan {
    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive)
    pub end_line: usize,
}

impl FunctionSpan {
    /// Create a new span
    #[must_use]
    pub const fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    /// Get the number of lines in this span
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Lines covered by the span, in order
    pub fn lines(&self) -> impl Iterator<Item = usize> {
        self.start_line..=self.end_line
    }
}

impl fmt::Display for FunctionSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_line, self.end_line)
    }
}

/// Merge located spans into one selection.
///
/// Lines are sorted ascending and de-duplicated; a gap marker separates every pair of
/// non-adjacent lines, and one trailing gap marker closes the selection.
#[must_use]
pub fn merge_spans(spans: &[FunctionSpan]) -> RangeSpec {
    if spans.is_empty() {
        return RangeSpec::default();
    }

    let mut lines: Vec<usize> = spans.iter().flat_map(FunctionSpan::lines).collect();
    lines.sort_unstable();
    lines.dedup();

    let mut entries = Vec::with_capacity(lines.len() + spans.len());
    for (idx, line) in lines.iter().enumerate() {
        if idx > 0 && line - lines[idx - 1] > 1 {
            entries.push(RangeEntry::Gap);
        }
        entries.push(RangeEntry::line(*line));
    }
    entries.push(RangeEntry::Gap);

    RangeSpec::from_entries(entries)
}

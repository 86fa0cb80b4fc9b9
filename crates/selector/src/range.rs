use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// One entry of a line selection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeEntry {
    /// Source line to show (1-indexed)
    Line(usize),

    /// Inclusive run of lines `start..=end`, expanded lazily against the source
    Span { start: usize, end: usize },

    /// Discontinuity, rendered as an ellipsis line
    Gap,

    /// Token that is not a line number; kept so callers can report it, never rendered
    Malformed(String),
}

impl RangeEntry {
    /// Build an entry from a line number; `0` is the gap marker
    #[must_use]
    pub const fn line(number: usize) -> Self {
        if number == 0 {
            Self::Gap
        } else {
            Self::Line(number)
        }
    }

    /// Lines covered by this entry, in order; `None` for gaps and malformed tokens
    fn numbers(&self) -> Option<RangeInclusive<usize>> {
        match self {
            Self::Line(number) => Some(*number..=*number),
            Self::Span { start, end } => Some(*start..=*end),
            Self::Gap | Self::Malformed(_) => None,
        }
    }
}

/// Ordered line selection with gap markers, built from a range expression
/// such as `1-3, 7, 10-12`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSpec {
    entries: Vec<RangeEntry>,
}

impl RangeSpec {
    /// Parse a comma-separated range expression.
    ///
    /// Whitespace anywhere in the expression is ignored. Every token (`N` or `A-B`)
    /// is followed by a gap marker, including the last one; the extractor trims it.
    /// `A-B` is kept as one [`RangeEntry::Span`] and only walked by the extractor.
    /// A reversed range (`A > B`) contributes nothing but its gap marker. Tokens that
    /// are not numbers survive as [`RangeEntry::Malformed`].
    #[must_use]
    pub fn parse(expr: &str) -> Self {
        let compact: String = expr.chars().filter(|c| !c.is_whitespace()).collect();
        let mut entries = Vec::new();

        for token in compact.split(',') {
            if is_range_token(token) {
                let mut bounds = token.split('-');
                let left = bounds.next().and_then(parse_line_number);
                let right = bounds.next().and_then(parse_line_number);
                match (left, right) {
                    (Some(left), Some(right)) => push_range(&mut entries, left, right),
                    _ => entries.push(RangeEntry::Malformed(token.to_string())),
                }
            } else {
                match parse_line_number(token) {
                    Some(number) => entries.push(RangeEntry::line(number)),
                    None => entries.push(RangeEntry::Malformed(token.to_string())),
                }
            }
            entries.push(RangeEntry::Gap);
        }

        let malformed = entries
            .iter()
            .filter(|entry| matches!(entry, RangeEntry::Malformed(_)))
            .count();
        if malformed > 0 {
            log::debug!("range expression {expr:?} has {malformed} malformed token(s)");
        }

        Self { entries }
    }

    #[must_use]
    pub fn from_entries(entries: Vec<RangeEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[RangeEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Line numbers in selection order, gaps and malformed tokens skipped.
    /// Spans are walked lazily.
    pub fn lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().filter_map(RangeEntry::numbers).flatten()
    }

    /// Tokens that could not be read as line numbers
    pub fn malformed_tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().filter_map(|entry| match entry {
            RangeEntry::Malformed(token) => Some(token.as_str()),
            _ => None,
        })
    }

    /// Numeric view: lines as themselves, gaps as `0`, malformed tokens dropped.
    ///
    /// Spans are expanded in full, so only call this on small selections.
    #[must_use]
    pub fn to_numbers(&self) -> Vec<usize> {
        let mut numbers = Vec::new();
        for entry in &self.entries {
            match entry {
                RangeEntry::Gap => numbers.push(0),
                RangeEntry::Malformed(_) => {}
                _ => numbers.extend(entry.numbers().into_iter().flatten()),
            }
        }
        numbers
    }
}

/// `left-right` as entries: nothing when reversed, a leading gap for `0-B`
fn push_range(entries: &mut Vec<RangeEntry>, left: usize, right: usize) {
    if left > right {
        return;
    }
    if left == 0 {
        entries.push(RangeEntry::Gap);
        if right == 0 {
            return;
        }
    }
    let start = left.max(1);
    if start == right {
        entries.push(RangeEntry::Line(start));
    } else {
        entries.push(RangeEntry::Span { start, end: right });
    }
}

/// `A-B` with word characters on both sides of the dash
static RANGE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_]-[A-Za-z0-9_]").expect("valid range regex"));

fn is_range_token(token: &str) -> bool {
    RANGE_TOKEN.is_match(token)
}

fn parse_line_number(raw: &str) -> Option<usize> {
    if raw.is_empty() {
        return None;
    }
    raw.parse::<usize>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_range_and_single() {
        let spec = RangeSpec::parse("3-5,8");
        assert_eq!(spec.to_numbers(), vec![3, 4, 5, 0, 8, 0]);
    }

    #[test]
    fn test_parse_strips_whitespace() {
        let spec = RangeSpec::parse(" 1 - 2 ,\t4 ");
        assert_eq!(spec.to_numbers(), vec![1, 2, 0, 4, 0]);
    }

    #[test]
    fn test_reversed_range_yields_only_gap() {
        let spec = RangeSpec::parse("5-3");
        assert_eq!(spec.entries(), &[RangeEntry::Gap]);
    }

    #[test]
    fn test_range_is_kept_as_span() {
        let spec = RangeSpec::parse("3-5,0-2,4-4");
        assert_eq!(
            spec.entries(),
            &[
                RangeEntry::Span { start: 3, end: 5 },
                RangeEntry::Gap,
                RangeEntry::Gap,
                RangeEntry::Span { start: 1, end: 2 },
                RangeEntry::Gap,
                RangeEntry::Line(4),
                RangeEntry::Gap
            ]
        );
    }

    #[test]
    fn test_huge_range_is_not_expanded() {
        let spec = RangeSpec::parse("1-18446744073709551615");
        assert_eq!(
            spec.entries(),
            &[
                RangeEntry::Span {
                    start: 1,
                    end: usize::MAX
                },
                RangeEntry::Gap
            ]
        );
        assert_eq!(spec.lines().take(3).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_zero_is_gap_marker() {
        let spec = RangeSpec::parse("0,2");
        assert_eq!(
            spec.entries(),
            &[
                RangeEntry::Gap,
                RangeEntry::Gap,
                RangeEntry::Line(2),
                RangeEntry::Gap
            ]
        );
    }

    #[test]
    fn test_trailing_comma_is_malformed() {
        let spec = RangeSpec::parse("2,");
        assert_eq!(
            spec.entries(),
            &[
                RangeEntry::Line(2),
                RangeEntry::Gap,
                RangeEntry::Malformed(String::new()),
                RangeEntry::Gap
            ]
        );
        assert_eq!(spec.to_numbers(), vec![2, 0, 0]);
    }

    #[test]
    fn test_non_numeric_tokens_are_kept_as_malformed() {
        let spec = RangeSpec::parse("abc,a-b,-3,7");
        let malformed: Vec<&str> = spec.malformed_tokens().collect();
        assert_eq!(malformed, vec!["abc", "a-b", "-3"]);
        assert_eq!(spec.lines().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_empty_expression() {
        let spec = RangeSpec::parse("");
        assert_eq!(
            spec.entries(),
            &[RangeEntry::Malformed(String::new()), RangeEntry::Gap]
        );
        assert_eq!(spec.lines().count(), 0);
    }

    #[test]
    fn test_range_token_detection() {
        assert!(is_range_token("1-2"));
        assert!(is_range_token("a-b"));
        assert!(!is_range_token("-3"));
        assert!(!is_range_token("3-"));
        assert!(!is_range_token("12"));
    }
}

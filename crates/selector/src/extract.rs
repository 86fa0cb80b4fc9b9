use crate::range::{RangeEntry, RangeSpec};

/// Line rendered in place of skipped source lines
pub const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Line(usize),
    Gap,
}

/// Render the selected lines of `full_text`.
///
/// An empty selection returns the text unchanged. Otherwise lines are emitted in
/// selection order (never re-sorted), gaps become a standalone `...` line, and an
/// ellipsis is prefixed when the first shown line is not line 1.
#[must_use]
pub fn extract(full_text: &str, spec: &RangeSpec) -> String {
    if spec.is_empty() {
        return full_text.to_string();
    }

    let source_lines: Vec<&str> = full_text.split('\n').collect();
    let slots = normalize(spec.entries(), source_lines.len());

    let mut out: Vec<&str> = Vec::with_capacity(slots.len() + 1);
    if matches!(slots.first(), Some(Slot::Line(first)) if *first != 1) {
        out.push(ELLIPSIS);
    }
    for slot in &slots {
        match slot {
            Slot::Line(number) => out.push(source_lines[number - 1]),
            Slot::Gap => out.push(ELLIPSIS),
        }
    }

    out.join("\n")
}

/// Drop lines past the end of the source and malformed tokens, collapse runs of
/// gaps, and trim gaps at both ends.
fn normalize(entries: &[RangeEntry], line_count: usize) -> Vec<Slot> {
    let mut slots: Vec<Slot> = Vec::with_capacity(entries.len());

    for entry in entries {
        match entry {
            RangeEntry::Malformed(_) => {}
            RangeEntry::Line(number) if *number > line_count => {}
            RangeEntry::Line(0) | RangeEntry::Gap => {
                if !matches!(slots.last(), None | Some(Slot::Gap)) {
                    slots.push(Slot::Gap);
                }
            }
            RangeEntry::Line(number) => slots.push(Slot::Line(*number)),
            RangeEntry::Span { start, end } => {
                // Never walk past the source, whatever the upper bound
                let start = (*start).max(1);
                slots.extend((start..=(*end).min(line_count)).map(Slot::Line));
            }
        }
    }

    while slots.last() == Some(&Slot::Gap) {
        slots.pop();
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn alphabet() -> String {
        ('a'..='z').map(String::from).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_extract_with_gaps() {
        let out = extract(&alphabet(), &RangeSpec::parse("3-5,8"));
        assert_eq!(out, "...\nc\nd\ne\n...\nh");
    }

    #[test]
    fn test_extract_from_first_line_has_no_prefix() {
        let out = extract(&alphabet(), &RangeSpec::parse("1-2"));
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn test_empty_selection_passes_text_through() {
        let text = "one\ntwo\n";
        assert_eq!(extract(text, &RangeSpec::default()), text);
    }

    #[test]
    fn test_lines_past_end_are_dropped() {
        let out = extract("a\nb\nc", &RangeSpec::parse("2,9,3"));
        assert_eq!(out, "...\nb\n...\nc");
    }

    #[test]
    fn test_out_of_range_between_gaps_collapses() {
        let out = extract("a\nb\nc\nd", &RangeSpec::parse("1,40,4"));
        assert_eq!(out, "a\n...\nd");
    }

    #[test]
    fn test_selection_reaching_last_line_has_no_trailing_ellipsis() {
        let out = extract("a\nb\nc", &RangeSpec::parse("2-3"));
        assert_eq!(out, "...\nb\nc");
    }

    #[test]
    fn test_unbounded_range_stops_at_last_line() {
        let out = extract("a\nb\nc", &RangeSpec::parse("2-18446744073709551615"));
        assert_eq!(out, "...\nb\nc");

        let out = extract("a\nb\nc", &RangeSpec::parse("9-18446744073709551615,1"));
        assert_eq!(out, "a");
    }

    #[test]
    fn test_order_is_preserved() {
        let out = extract("a\nb\nc\nd", &RangeSpec::parse("4,1"));
        assert_eq!(out, "...\nd\n...\na");
    }

    #[test]
    fn test_malformed_tokens_are_skipped() {
        let out = extract("a\nb\nc", &RangeSpec::parse("x,2,"));
        assert_eq!(out, "...\nb");
    }

    #[test]
    fn test_only_gaps_render_nothing() {
        assert_eq!(extract("a\nb", &RangeSpec::parse("")), "");
        assert_eq!(extract("a\nb", &RangeSpec::parse("0,0")), "");
        assert_eq!(extract("a\nb", &RangeSpec::parse("7")), "");
    }

    #[test]
    fn test_never_two_ellipses_in_a_row() {
        let text = alphabet();
        for expr in ["1,3,5", "2,0,0,4", "26,1,30,0,2", "5-3,1", "0,2-4,,9,"] {
            let out = extract(&text, &RangeSpec::parse(expr));
            let lines: Vec<&str> = out.split('\n').collect();
            assert!(
                !lines.windows(2).any(|pair| pair == [ELLIPSIS, ELLIPSIS]),
                "double ellipsis for {expr}: {out:?}"
            );
        }
    }
}

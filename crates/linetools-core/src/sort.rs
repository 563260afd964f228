use std::cmp::Ordering;
use std::mem;

use crate::compare::{CaseSensitivity, Direction, LineOrder, OrderKind};

/// Session-level sort preferences, passed by value into each operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSettings {
    pub match_case: bool,
    pub remove_duplicates: bool,
    pub natural: bool,
}

impl Default for SortSettings {
    fn default() -> Self {
        Self {
            match_case: true,
            remove_duplicates: false,
            natural: false,
        }
    }
}

impl SortSettings {
    pub fn order(&self, direction: Direction) -> LineOrder {
        let kind = if self.natural {
            OrderKind::Natural
        } else {
            OrderKind::Collation
        };
        LineOrder::new(kind, CaseSensitivity::from_match_case(self.match_case), direction)
    }
}

/// How [`join_lines`] terminates each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminators<'a> {
    /// Lines already carry their terminators; concatenate verbatim.
    Kept,
    /// Lines carry no terminators; append this one after every line.
    Rejoin(&'a str),
}

/// Optionally remove duplicates, then sort.
///
/// Lines may carry their terminators; only the content is compared and each
/// line keeps its own terminator. Duplicates are lines that `order` considers
/// equal, so a case-insensitive order merges `"Foo"` and `"foo"`; the first
/// one seen in `lines` survives. The result always follows `order`. Without
/// an order, lines compare by code point and only identical lines are
/// duplicates.
pub fn process<S: AsRef<str>>(
    lines: &[S],
    remove_duplicates: bool,
    order: Option<LineOrder>,
) -> Vec<String> {
    let cmp = |a: &String, b: &String| -> Ordering {
        let (a, b) = (strip_terminator(a).0, strip_terminator(b).0);
        match order {
            Some(order) => order.compare(a, b),
            None => a.cmp(b),
        }
    };

    let mut out: Vec<String> = lines.iter().map(|l| l.as_ref().to_string()).collect();
    out.sort_by(cmp);
    if remove_duplicates {
        let before = out.len();
        out.dedup_by(|later, kept| cmp(kept, later) == Ordering::Equal);
        log::trace!("dedup removed {} of {} lines", before - out.len(), before);
    }
    out
}

/// Concatenate lines into one block of text.
///
/// In kept mode no terminator is added or lost. An unterminated line that is
/// not last (the old final line, moved by sorting) takes the terminator of the
/// line that now ends the block, which is left unterminated in its place.
pub fn join_lines<S: AsRef<str>>(lines: &[S], terminators: Terminators<'_>) -> String {
    let mut out = String::new();
    match terminators {
        Terminators::Rejoin(eol) => {
            for line in lines {
                out.push_str(line.as_ref());
                out.push_str(eol);
            }
        }
        Terminators::Kept => {
            let Some((last, body)) = lines.split_last() else {
                return out;
            };
            let (last_content, mut spare) = strip_terminator(last.as_ref());
            for line in body {
                let (content, eol) = strip_terminator(line.as_ref());
                out.push_str(content);
                if eol.is_empty() {
                    out.push_str(mem::take(&mut spare));
                } else {
                    out.push_str(eol);
                }
            }
            out.push_str(last_content);
            out.push_str(spare);
        }
    }
    out
}

/// Split a line into its content and trailing `\n` or `\r\n`.
pub fn strip_terminator(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, &line[content.len()..])
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, &line[content.len()..])
    } else {
        (line, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(kind: OrderKind, case: CaseSensitivity) -> Option<LineOrder> {
        Some(LineOrder::new(kind, case, Direction::Ascending))
    }

    #[test]
    fn sort_keeps_multiset() {
        let lines = ["b", "a", "b", "c"];
        let out = process(&lines, false, order(OrderKind::Collation, CaseSensitivity::Sensitive));
        assert_eq!(out, vec!["a", "b", "b", "c"]);
    }

    #[test]
    fn dedup_uses_comparator_equality() {
        let lines = ["foo", "Bar", "Foo", "bar", "baz"];
        let out = process(&lines, true, order(OrderKind::Collation, CaseSensitivity::Insensitive));
        assert_eq!(out, vec!["Bar", "baz", "foo"]);

        let out = process(&lines, true, order(OrderKind::Collation, CaseSensitivity::Sensitive));
        assert_eq!(out, vec!["Bar", "bar", "baz", "Foo", "foo"]);
    }

    #[test]
    fn natural_dedup_merges_padded_numbers() {
        let lines = ["item 07", "item 7", "item 10"];
        let out = process(&lines, true, order(OrderKind::Natural, CaseSensitivity::Sensitive));
        assert_eq!(out, vec!["item 07", "item 10"]);
    }

    #[test]
    fn dedup_result_has_no_equal_neighbours() {
        let lines = ["a", "A", "b", "a", "B", "c", "C", "c"];
        for case in [CaseSensitivity::Sensitive, CaseSensitivity::Insensitive] {
            let order = LineOrder::natural(case, Direction::Descending);
            let out = process(&lines, true, Some(order));
            for (i, a) in out.iter().enumerate() {
                for b in &out[i + 1..] {
                    assert_ne!(order.compare(a, b), Ordering::Equal, "{a} vs {b}");
                }
            }
        }
    }

    #[test]
    fn no_order_means_code_point_order() {
        let out = process(&["b", "B", "a", "a"], true, None);
        assert_eq!(out, vec!["B", "a", "b"]);
    }

    #[test]
    fn settings_pick_the_order() {
        let settings = SortSettings {
            match_case: false,
            remove_duplicates: true,
            natural: true,
        };
        let order = settings.order(Direction::Descending);
        assert_eq!(order.kind, OrderKind::Natural);
        assert_eq!(order.case, CaseSensitivity::Insensitive);
        assert_eq!(SortSettings::default().order(Direction::Ascending).kind, OrderKind::Collation);
    }

    #[test]
    fn sorting_carries_each_terminator() {
        let lines = ["c\r\n", "b\n", "a"];
        let out = process(&lines, false, order(OrderKind::Collation, CaseSensitivity::Sensitive));
        assert_eq!(out, vec!["a", "b\n", "c\r\n"]);
        assert_eq!(join_lines(&out, Terminators::Kept), "a\r\nb\nc");

        let out = process(&["a\n", "a"], true, None);
        assert_eq!(out, vec!["a\n"]);
    }

    #[test]
    fn join_modes() {
        assert_eq!(join_lines(&["a\n", "b"], Terminators::Kept), "a\nb");
        assert_eq!(join_lines(&["b", "a\n"], Terminators::Kept), "b\na");
        assert_eq!(join_lines(&["a", "b"], Terminators::Rejoin("\r\n")), "a\r\nb\r\n");
        let empty: [&str; 0] = [];
        assert_eq!(join_lines(&empty, Terminators::Rejoin("\n")), "");
    }

    #[test]
    fn strip_terminator_variants() {
        assert_eq!(strip_terminator("a\r\n"), ("a", "\r\n"));
        assert_eq!(strip_terminator("a\n"), ("a", "\n"));
        assert_eq!(strip_terminator("a"), ("a", ""));
        assert_eq!(strip_terminator("\n"), ("", "\n"));
    }
}

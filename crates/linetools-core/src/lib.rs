//! linetools — line-range text tools (core library)
//!
//! Pure operations over sequences of lines: ordering, duplicate removal,
//! cyclic character substitution and in-line character motions. Nothing in
//! this crate touches a document or the operating system; callers extract the
//! lines, run an operation and write the result back.

mod charset;
mod compare;
mod cycle;
mod motion;
mod range;
mod sort;

pub use charset::{char_set, CharSet};
pub use compare::{collate, natural_cmp, CaseSensitivity, Direction, LineOrder, OrderKind};
pub use cycle::cycle;
pub use motion::{find_char, CharMotion};
pub use range::LineRange;
pub use sort::{join_lines, process, strip_terminator, SortSettings, Terminators};

/// Rejected line range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("invalid range: {start}..{end}")]
    Inverted { start: usize, end: usize },
    #[error("line out of range: {line} >= {len}")]
    OutOfBounds { line: usize, len: usize },
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn sort_then_cycle_markers() {
        let lines = vec!["- b".to_string(), "+ a".to_string(), "- c".to_string()];
        let order = LineOrder::collation(CaseSensitivity::Sensitive, Direction::Ascending);
        let sorted = process(&lines, false, Some(order));
        assert_eq!(sorted, vec!["+ a", "- b", "- c"]);

        let cycled: Vec<String> = sorted.iter().map(|l| cycle(l, Some("+-")).into_owned()).collect();
        assert_eq!(cycled, vec!["- a", "+ b", "+ c"]);
    }

    #[test]
    fn range_error_messages() {
        let err = LineRange::new(4, 2).unwrap_err();
        assert_eq!(err.to_string(), "invalid range: 4..2");
    }
}

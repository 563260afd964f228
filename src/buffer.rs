use linetools_core::{strip_terminator, LineRange, RangeError};

/// A selection as an anchor/head pair of character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// A collapsed selection (bare caret).
    pub fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    /// Content including its terminator; only the final line may lack one.
    text: String,
    modified: bool,
}

/// In-memory text held as lines with their terminators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<Line>,
}

impl LineBuffer {
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .split_inclusive('\n')
            .map(|l| Line {
                text: l.to_string(),
                modified: false,
            })
            .collect();
        Self { lines }
    }

    pub fn text(&self) -> String {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line `idx` including its terminator.
    pub fn line(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(|l| l.text.as_str())
    }

    /// Line `idx` without its terminator.
    pub fn line_content(&self, idx: usize) -> Option<&str> {
        self.line(idx).map(|l| strip_terminator(l).0)
    }

    /// Line contents (terminators stripped) for every line.
    pub fn contents(&self) -> Vec<&str> {
        self.lines.iter().map(|l| strip_terminator(&l.text).0).collect()
    }

    /// Line contents (terminators stripped) within `range`.
    pub fn range_contents(&self, range: LineRange) -> Result<Vec<&str>, RangeError> {
        range.check_bounds(self.lines.len())?;
        Ok(self.lines[range.start..=range.end]
            .iter()
            .map(|l| strip_terminator(&l.text).0)
            .collect())
    }

    /// The terminator of the first terminated line, `\n` if there is none.
    pub fn line_ending(&self) -> &'static str {
        self.lines
            .iter()
            .map(|l| strip_terminator(&l.text).1)
            .find(|eol| !eol.is_empty())
            .map(|eol| if eol == "\r\n" { "\r\n" } else { "\n" })
            .unwrap_or("\n")
    }

    /// Whether line `idx` ends with a terminator.
    pub fn is_terminated(&self, idx: usize) -> bool {
        self.line(idx).is_some_and(|l| !strip_terminator(l).1.is_empty())
    }

    /// 1-based numbers of lines touched since the buffer was created.
    pub fn modified_lines(&self) -> Vec<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.modified.then_some(i + 1))
            .collect()
    }

    pub fn char_len(&self) -> usize {
        self.lines.iter().map(|l| l.text.chars().count()).sum()
    }

    /// Character offset at which line `idx` starts.
    pub fn line_start(&self, idx: usize) -> Option<usize> {
        if idx >= self.lines.len() {
            return None;
        }
        Some(self.lines[..idx].iter().map(|l| l.text.chars().count()).sum())
    }

    /// Line holding the character offset `offset`.
    ///
    /// A caret at the very end of an unterminated last line belongs to that
    /// line; the empty tail after a final terminator belongs to no line.
    pub fn line_of_offset(&self, offset: usize) -> Option<usize> {
        let mut start = 0;
        for (idx, line) in self.lines.iter().enumerate() {
            let len = line.text.chars().count();
            if offset < start + len {
                return Some(idx);
            }
            start += len;
        }
        let last = self.lines.len().checked_sub(1)?;
        (offset == start && !self.is_terminated(last)).then_some(last)
    }

    /// Lines covered by a non-empty selection.
    ///
    /// The selection end is exclusive, so a selection that stops at the start
    /// of a line does not include it. Collapsed selections and offsets that
    /// map to no line do not resolve.
    pub fn resolve_selection(&self, selection: Selection) -> Option<LineRange> {
        if selection.is_collapsed() {
            return None;
        }
        LineRange::resolve(
            self.line_of_offset(selection.start()),
            self.line_of_offset(selection.end() - 1),
        )
    }

    /// Replace every line in `range` with `lines` in one step.
    ///
    /// Each new line must carry its own terminator. New lines that differ
    /// from the line previously at the same position are marked modified.
    pub fn replace_lines(&mut self, range: LineRange, lines: Vec<String>) -> Result<(), RangeError> {
        range.check_bounds(self.lines.len())?;
        let old = &self.lines[range.start..=range.end];
        let new: Vec<Line> = lines
            .into_iter()
            .enumerate()
            .map(|(i, text)| match old.get(i) {
                Some(prev) if prev.text == text => prev.clone(),
                _ => Line {
                    text,
                    modified: true,
                },
            })
            .collect();
        self.lines.splice(range.start..=range.end, new);
        Ok(())
    }

    /// Replace the characters in `start..end` with `text`.
    ///
    /// Only valid for replacements that keep every line terminator where it
    /// was, so line identities survive.
    pub(crate) fn replace_chars(
        &mut self,
        start: usize,
        end: usize,
        text: &str,
    ) -> Result<(), RangeError> {
        let last_char = end.saturating_sub(1).max(start);
        let range = LineRange::resolve(self.line_of_offset(start), self.line_of_offset(last_char))
            .ok_or(RangeError::OutOfBounds {
                line: self.lines.len(),
                len: self.lines.len(),
            })?;
        let first = range.start;
        let last = range.end;
        let base = self.line_start(first).unwrap_or(0);
        let block: String = self.lines[first..=last].iter().map(|l| l.text.as_str()).collect();

        let byte_at = |chars: usize| block.char_indices().nth(chars).map_or(block.len(), |(b, _)| b);
        let (s, e) = (byte_at(start - base), byte_at(end - base));
        let edited = format!("{}{}{}", &block[..s], text, &block[e..]);

        let lines = edited.split_inclusive('\n').map(str::to_string).collect();
        self.replace_lines(range, lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_terminators_and_round_trips() {
        for text in ["", "a", "a\n", "a\r\nb\r\n", "a\n\nb"] {
            assert_eq!(LineBuffer::from_text(text).text(), text);
        }
        let buf = LineBuffer::from_text("a\r\nb");
        assert_eq!(buf.line(0), Some("a\r\n"));
        assert_eq!(buf.line_content(0), Some("a"));
        assert_eq!(buf.line_ending(), "\r\n");
        assert!(!buf.is_terminated(1));
    }

    #[test]
    fn offsets_map_to_lines() {
        let buf = LineBuffer::from_text("ab\ncd\n");
        assert_eq!(buf.line_of_offset(0), Some(0));
        assert_eq!(buf.line_of_offset(2), Some(0));
        assert_eq!(buf.line_of_offset(3), Some(1));
        assert_eq!(buf.line_of_offset(6), None);

        let buf = LineBuffer::from_text("ab\ncd");
        assert_eq!(buf.line_of_offset(5), Some(1));
        assert_eq!(buf.line_of_offset(6), None);
        assert_eq!(LineBuffer::from_text("").line_of_offset(0), None);
    }

    #[test]
    fn selection_resolution() {
        let buf = LineBuffer::from_text("a\nb\nc\n");
        assert_eq!(buf.resolve_selection(Selection::caret(2)), None);
        // through the final newline
        assert_eq!(buf.resolve_selection(Selection::new(0, 6)), LineRange::new(0, 2).ok());
        // stopping at the start of line 2 leaves it out
        assert_eq!(buf.resolve_selection(Selection::new(4, 0)), LineRange::new(0, 1).ok());
        assert_eq!(buf.resolve_selection(Selection::new(3, 4)), Some(LineRange::single(1)));
        assert_eq!(buf.resolve_selection(Selection::new(0, 99)), None);
    }

    #[test]
    fn replace_lines_is_one_splice_and_tracks_modified() {
        let mut buf = LineBuffer::from_text("a\nb\nc\nd\n");
        let range = LineRange::new(1, 2).unwrap();
        buf.replace_lines(range, vec!["b\n".into(), "X\n".into(), "Y\n".into()]).unwrap();
        assert_eq!(buf.text(), "a\nb\nX\nY\nd\n");
        assert_eq!(buf.modified_lines(), vec![3, 4]);

        let err = buf.replace_lines(LineRange::single(9), vec![]).unwrap_err();
        assert_eq!(err, RangeError::OutOfBounds { line: 9, len: 5 });
    }

    #[test]
    fn replace_chars_within_and_across_lines() {
        let mut buf = LineBuffer::from_text("héllo\nworld\n");
        buf.replace_chars(1, 2, "e").unwrap();
        assert_eq!(buf.text(), "hello\nworld\n");
        buf.replace_chars(3, 8, "LO\nWO").unwrap();
        assert_eq!(buf.text(), "helLO\nWOrld\n");
        assert_eq!(buf.modified_lines(), vec![1, 2]);
    }
}

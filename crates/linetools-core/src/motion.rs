/// Where a character search starts and where the caret lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharMotion {
    /// Search backwards; land on the match.
    From,
    /// Search backwards; land just after the match.
    After,
    /// Search forwards; land on the match (the caret ends up before it).
    Upto,
    /// Search forwards; land just after the match.
    To,
}

/// Find the `count`-th occurrence of `target` around `caret` within `line`.
///
/// Columns are character indices. Backward motions look at `line[..caret]`,
/// forward motions at `line[caret + 1..]`. Returns the new caret column, or
/// `None` when there are fewer than `count` matches (or `count == 0`).
pub fn find_char(
    line: &str,
    caret: usize,
    target: char,
    motion: CharMotion,
    match_case: bool,
    count: usize,
) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let chars: Vec<char> = line.chars().collect();
    let caret = caret.min(chars.len());
    let wanted: Vec<char> = target.to_lowercase().collect();
    let is_match = |c: char| c == target || (!match_case && c.to_lowercase().eq(wanted.iter().copied()));

    match motion {
        CharMotion::From | CharMotion::After => {
            let col = (0..caret).rev().filter(|&i| is_match(chars[i])).nth(count - 1)?;
            Some(if motion == CharMotion::After { col + 1 } else { col })
        }
        CharMotion::Upto | CharMotion::To => {
            let col = (caret + 1..chars.len())
                .filter(|&i| is_match(chars[i]))
                .nth(count - 1)?;
            Some(if motion == CharMotion::To { col + 1 } else { col })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backward_motions() {
        let line = "a,b,c,d";
        assert_eq!(find_char(line, 6, ',', CharMotion::From, true, 1), Some(5));
        assert_eq!(find_char(line, 6, ',', CharMotion::After, true, 1), Some(6));
        assert_eq!(find_char(line, 6, ',', CharMotion::From, true, 2), Some(3));
        assert_eq!(find_char(line, 6, ',', CharMotion::From, true, 4), None);
    }

    #[test]
    fn forward_motions_skip_char_under_caret() {
        let line = "x(a(b))";
        assert_eq!(find_char(line, 1, '(', CharMotion::Upto, true, 1), Some(3));
        assert_eq!(find_char(line, 1, '(', CharMotion::To, true, 1), Some(4));
        assert_eq!(find_char(line, 0, ')', CharMotion::To, true, 2), Some(7));
    }

    #[test]
    fn case_folding_is_optional() {
        let line = "Alpha beta";
        assert_eq!(find_char(line, 10, 'a', CharMotion::From, true, 3), None);
        assert_eq!(find_char(line, 10, 'a', CharMotion::From, false, 3), Some(0));
    }

    #[test]
    fn zero_count_and_caret_past_end() {
        assert_eq!(find_char("aaa", 2, 'a', CharMotion::From, true, 0), None);
        assert_eq!(find_char("aaa", 99, 'a', CharMotion::From, true, 1), Some(2));
        assert_eq!(find_char("aaa", 99, 'a', CharMotion::To, true, 1), None);
    }
}

use std::borrow::Cow;

use crate::charset::char_set;

/// Cycle the characters of `alphabet` that occur in `target`.
///
/// - No alphabet, an alphabet with fewer than two distinct characters, or no
///   alphabet character in `target`: `target` is returned unchanged.
/// - Exactly one alphabet character present: every occurrence is replaced by
///   its cyclic successor in the alphabet.
/// - Several alphabet characters present: all of them collapse onto the
///   earliest one (in alphabet order) that occurs in `target`.
///
/// An absent target maps through `Option::map`.
pub fn cycle<'a>(target: &'a str, alphabet: Option<&str>) -> Cow<'a, str> {
    let Some(alphabet) = alphabet else {
        return Cow::Borrowed(target);
    };
    let cycle_set = char_set(alphabet);
    if cycle_set.len() <= 1 {
        return Cow::Borrowed(target);
    }

    let present = cycle_set.intersection(&char_set(target));
    let mut members = present.iter();
    let (first, second) = (members.next(), members.next());
    match (first, second) {
        (None, _) => Cow::Borrowed(target),
        (Some(from), None) => {
            let Some(to) = cycle_set.successor(from) else {
                return Cow::Borrowed(target);
            };
            Cow::Owned(target.chars().map(|c| if c == from { to } else { c }).collect())
        }
        (Some(first), Some(_)) => Cow::Owned(
            target
                .chars()
                .map(|c| if cycle_set.contains(c) { first } else { c })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_alphabet_char_present() {
        assert_eq!(cycle("foo", Some("ab")), "foo");
        assert!(matches!(cycle("foo", Some("ab")), Cow::Borrowed(_)));
    }

    #[test]
    fn single_char_rotates_with_wrap() {
        assert_eq!(cycle("cat", Some("abc")), "aat");
        assert_eq!(cycle("x = true", Some("tf")), "x = frue");
        assert_eq!(cycle("a-b-c", Some("-_")), "a_b_c");
        assert_eq!(cycle("a_b_c", Some("-_")), "a-b-c");
    }

    #[test]
    fn several_chars_collapse_to_earliest_in_alphabet() {
        assert_eq!(cycle("abc", Some("abc")), "aaa");
        assert_eq!(cycle("c-b", Some("abc")), "b-b");
        // alphabet order, not target order, picks the representative
        assert_eq!(cycle("ba", Some("abc")), "aa");
    }

    #[test]
    fn degenerate_alphabets_leave_target() {
        assert_eq!(cycle("aaa", None), "aaa");
        assert_eq!(cycle("aaa", Some("")), "aaa");
        assert_eq!(cycle("aaa", Some("aaaa")), "aaa");
    }

    #[test]
    fn repeated_alphabet_chars_are_deduplicated() {
        assert_eq!(cycle("b", Some("abab")), "a");
    }

    #[test]
    fn absent_target_stays_absent() {
        let target: Option<&str> = None;
        assert_eq!(target.map(|t| cycle(t, Some("ab"))), None);
    }

    #[test]
    fn never_changes_char_count() {
        for t in ["", "a", "abcabc", "zz", "héllo"] {
            let out = cycle(t, Some("aé"));
            assert_eq!(out.chars().count(), t.chars().count());
        }
    }
}

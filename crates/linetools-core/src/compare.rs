use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Which ordering strategy compares two lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderKind {
    /// Digit runs compare by numeric value.
    Natural,
    /// Fixed root/English collation rules.
    Collation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseSensitivity {
    Sensitive,
    /// Both operands are lowercased before comparing.
    Insensitive,
}

impl CaseSensitivity {
    pub fn from_match_case(match_case: bool) -> Self {
        if match_case {
            Self::Sensitive
        } else {
            Self::Insensitive
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// A complete line ordering: strategy, case handling and direction.
///
/// Values are stateless and cheap to copy, so one instance can serve an
/// entire sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineOrder {
    pub kind: OrderKind,
    pub case: CaseSensitivity,
    pub direction: Direction,
}

impl LineOrder {
    pub fn new(kind: OrderKind, case: CaseSensitivity, direction: Direction) -> Self {
        Self {
            kind,
            case,
            direction,
        }
    }

    pub fn natural(case: CaseSensitivity, direction: Direction) -> Self {
        Self::new(OrderKind::Natural, case, direction)
    }

    pub fn collation(case: CaseSensitivity, direction: Direction) -> Self {
        Self::new(OrderKind::Collation, case, direction)
    }

    /// The same ordering with the opposite direction.
    pub fn reversed(self) -> Self {
        let direction = match self.direction {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        };
        Self { direction, ..self }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let ord = match self.case {
            CaseSensitivity::Sensitive => self.compare_kind(a, b),
            CaseSensitivity::Insensitive => {
                self.compare_kind(&a.to_lowercase(), &b.to_lowercase())
            }
        };
        match self.direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    }

    fn compare_kind(&self, a: &str, b: &str) -> Ordering {
        match self.kind {
            OrderKind::Natural => natural_cmp(a, b),
            OrderKind::Collation => collate(a, b),
        }
    }
}

/// Collate two strings under fixed root rules.
///
/// Three levels over the canonical decomposition: base characters compared
/// case-folded, then combining marks, then raw code points. Only identical
/// strings compare equal.
pub fn collate(a: &str, b: &str) -> Ordering {
    let primary = |s: &str| {
        s.nfd()
            .filter(|c| !is_combining_mark(*c))
            .flat_map(char::to_lowercase)
            .collect::<Vec<_>>()
    };
    let secondary = |s: &str| s.nfd().filter(|c| is_combining_mark(*c)).collect::<Vec<_>>();

    primary(a)
        .cmp(&primary(b))
        .then_with(|| secondary(a).cmp(&secondary(b)))
        .then_with(|| a.cmp(b))
}

/// Compare strings so that embedded digit runs order by numeric value.
///
/// `"line2" < "line10"`; leading zeros are ignored (`"x7" == "x007"`); all
/// other characters compare by code point.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();
    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let ord = cmp_digit_runs(&take_digits(&mut left), &take_digits(&mut right));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(it: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = it.next_if(char::is_ascii_digit) {
        run.push(c);
    }
    run
}

fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    // equal-length ASCII digit strings order numerically as bytes
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

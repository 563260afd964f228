use std::ops::RangeInclusive;

use crate::RangeError;

/// An inclusive, zero-based range of line indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(line: usize) -> Self {
        Self {
            start: line,
            end: line,
        }
    }

    /// Combine two independently resolved endpoints.
    ///
    /// Either endpoint failing to resolve makes the whole range unresolved.
    pub fn resolve(start: Option<usize>, end: Option<usize>) -> Option<Self> {
        let (start, end) = (start?, end?);
        Some(Self {
            start: start.min(end),
            end: start.max(end),
        })
    }

    /// `end - start`: zero for a single line.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_single_line(&self) -> bool {
        self.len() == 0
    }

    pub fn line_count(&self) -> usize {
        self.len() + 1
    }

    pub fn indices(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    /// Check that every line in the range exists in a buffer of `len` lines.
    pub fn check_bounds(&self, len: usize) -> Result<(), RangeError> {
        if self.end >= len {
            return Err(RangeError::OutOfBounds {
                line: self.end,
                len,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_counts_gaps_not_lines() {
        let r = LineRange::new(2, 5).unwrap();
        assert_eq!(r.len(), 3);
        assert_eq!(r.line_count(), 4);
        assert!(!r.is_single_line());
        assert!(LineRange::single(7).is_single_line());
    }

    #[test]
    fn resolve_requires_both_endpoints() {
        assert_eq!(LineRange::resolve(Some(1), None), None);
        assert_eq!(LineRange::resolve(None, Some(1)), None);
        assert_eq!(LineRange::resolve(Some(4), Some(1)), Some(LineRange { start: 1, end: 4 }));
    }

    #[test]
    fn bounds_check() {
        let r = LineRange::new(0, 2).unwrap();
        assert!(r.check_bounds(3).is_ok());
        assert_eq!(
            r.check_bounds(2),
            Err(RangeError::OutOfBounds { line: 2, len: 2 })
        );
    }
}

use indexmap::IndexSet;

/// Distinct characters of a string, in first-occurrence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharSet {
    chars: IndexSet<char>,
}

impl CharSet {
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }

    /// Cyclic successor of `c`, wrapping from the last member to the first.
    ///
    /// Returns `None` when `c` is not a member.
    pub fn successor(&self, c: char) -> Option<char> {
        let idx = self.chars.get_index_of(&c)?;
        self.chars.get_index((idx + 1) % self.chars.len()).copied()
    }

    /// Members of `self` that also occur in `other`, in `self`'s order.
    pub fn intersection(&self, other: &CharSet) -> CharSet {
        self.iter().filter(|c| other.contains(*c)).collect()
    }

    /// Copy of `self` without the given characters.
    pub fn without(&self, excluded: &[char]) -> CharSet {
        self.iter().filter(|c| !excluded.contains(c)).collect()
    }
}

impl FromIterator<char> for CharSet {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        Self {
            chars: iter.into_iter().collect(),
        }
    }
}

/// Build the ordered set of distinct characters in `text`.
pub fn char_set(text: &str) -> CharSet {
    text.chars().collect()
}

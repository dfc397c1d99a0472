//! Immutable document coordinates.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::error::{Result, RichTextError};

/// A position in a styled document.
///
/// `offset` is the insertion index into the paragraph's plain text, counted in
/// Unicode scalar values. `char_index` is the index of the character the
/// position is attached to, and `leading` tells whether the position sits on
/// that character's leading edge.
///
/// Positions are totally ordered by paragraph index, then offset, then
/// `leading` (a trailing position sorts before a leading one at the same
/// offset). `char_index` takes no part in ordering or equality.
#[derive(Debug, Clone, Copy)]
pub struct TextPos {
    index: usize,
    offset: usize,
    char_index: usize,
    leading: bool,
}

impl TextPos {
    /// The start of the document.
    pub const ZERO: TextPos = TextPos {
        index: 0,
        offset: 0,
        char_index: 0,
        leading: true,
    };

    /// Create a position from its four components.
    pub const fn new(index: usize, offset: usize, char_index: usize, leading: bool) -> Self {
        Self {
            index,
            offset,
            char_index,
            leading,
        }
    }

    /// A position on the leading edge of the character at `offset`.
    pub const fn leading(index: usize, offset: usize) -> Self {
        Self::new(index, offset, offset, true)
    }

    /// A position on the trailing edge of the character before `offset`.
    pub const fn trailing(index: usize, offset: usize) -> Self {
        Self::new(index, offset, offset.saturating_sub(1), false)
    }

    /// Create a position from signed components, rejecting negative values.
    pub fn try_new(index: i64, offset: i64, char_index: i64, leading: bool) -> Result<Self> {
        let check = |value: i64, name: &str| {
            usize::try_from(value).map_err(|_| {
                RichTextError::invalid_argument(format!("{name} must not be negative, got {value}"))
            })
        };
        Ok(Self::new(
            check(index, "paragraph index")?,
            check(offset, "offset")?,
            check(char_index, "char index")?,
            leading,
        ))
    }

    /// Paragraph index.
    #[inline]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Insertion offset within the paragraph.
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Index of the character this position is attached to.
    #[inline]
    pub const fn char_index(&self) -> usize {
        self.char_index
    }

    /// Whether the position is on the leading edge of its character.
    #[inline]
    pub const fn is_leading(&self) -> bool {
        self.leading
    }

    /// The same edge at another paragraph/offset.
    pub(crate) const fn moved_to(&self, index: usize, offset: usize) -> Self {
        if self.leading {
            Self::leading(index, offset)
        } else {
            Self::trailing(index, offset)
        }
    }

    /// True if both positions denote the same insertion point, regardless
    /// of edge.
    pub fn is_same_insertion_index(&self, other: &TextPos) -> bool {
        self.index == other.index && self.offset == other.offset
    }

    /// True if both positions are in the same paragraph.
    pub fn is_same_paragraph(&self, other: &TextPos) -> bool {
        self.index == other.index
    }
}

impl Default for TextPos {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialEq for TextPos {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TextPos {}

impl PartialOrd for TextPos {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TextPos {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index
            .cmp(&other.index)
            .then(self.offset.cmp(&other.offset))
            .then(self.leading.cmp(&other.leading))
    }
}

impl Hash for TextPos {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.offset.hash(state);
        self.leading.hash(state);
    }
}

impl std::fmt::Display for TextPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}{})",
            self.index,
            self.offset,
            if self.leading { "" } else { ", trailing" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_by_index_then_offset() {
        assert!(TextPos::leading(0, 9) < TextPos::leading(1, 0));
        assert!(TextPos::leading(1, 2) < TextPos::leading(1, 3));
    }

    #[test]
    fn test_leading_sorts_after_trailing() {
        let trailing = TextPos::trailing(2, 4);
        let leading = TextPos::leading(2, 4);
        assert!(trailing < leading);
        assert_ne!(trailing, leading);
        assert!(trailing.is_same_insertion_index(&leading));
    }

    #[test]
    fn test_char_index_ignored_by_equality() {
        assert_eq!(TextPos::new(0, 3, 3, true), TextPos::new(0, 3, 7, true));
    }

    #[test]
    fn test_try_new_rejects_negative() {
        assert!(matches!(
            TextPos::try_new(-1, 0, 0, true),
            Err(RichTextError::InvalidArgument(_))
        ));
        assert!(matches!(
            TextPos::try_new(0, -5, 0, true),
            Err(RichTextError::InvalidArgument(_))
        ));
        assert_eq!(TextPos::try_new(3, 4, 4, true).unwrap(), TextPos::leading(3, 4));
    }

    #[test]
    fn test_display() {
        assert_eq!(TextPos::leading(1, 2).to_string(), "(1, 2)");
        assert_eq!(TextPos::trailing(1, 2).to_string(), "(1, 2, trailing)");
    }
}

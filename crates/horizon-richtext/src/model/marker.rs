//! Markers: lightweight handles to positions tracked by the model.
//!
//! The model owns a flat arena of positions. A [`Marker`] is only a key into
//! that arena; the model relocates every live entry synchronously inside each
//! edit, so a marker read after `replace` returns always reflects the
//! post-edit document.

use slotmap::new_key_type;

use super::position::TextPos;

new_key_type! {
    /// Handle to a position tracked by a [`StyledTextModel`](super::StyledTextModel).
    pub struct Marker;
}

/// Shape of an insertion, as needed to relocate positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct InsertExtent {
    /// Chars inserted into the first paragraph.
    pub chars_top: usize,
    /// Paragraph breaks inserted.
    pub lines_added: usize,
    /// Chars inserted at the start of the last paragraph (when lines were added).
    pub chars_bottom: usize,
}

/// Relocate `pos` across an edit that replaced `[start, end)` with content of
/// the given extent.
///
/// Positions before `start` are unchanged; positions inside the removed
/// range collapse to `start`; positions at or after `end` shift with the text
/// that follows the edit.
pub(crate) fn relocate(pos: TextPos, start: TextPos, end: TextPos, ins: InsertExtent) -> TextPos {
    if pos.index() < start.index()
        || (pos.index() == start.index() && pos.offset() < start.offset())
    {
        return pos;
    }

    let at_or_after_end = pos.index() > end.index()
        || (pos.index() == end.index() && pos.offset() >= end.offset());
    if !at_or_after_end {
        return pos.moved_to(start.index(), start.offset());
    }

    if pos.index() == end.index() {
        let tail = pos.offset() - end.offset();
        let (index, offset) = if ins.lines_added == 0 {
            (start.index(), start.offset() + ins.chars_top + tail)
        } else {
            (start.index() + ins.lines_added, ins.chars_bottom + tail)
        };
        pos.moved_to(index, offset)
    } else {
        let index = pos.index() - (end.index() - start.index()) + ins.lines_added;
        pos.moved_to(index, pos.offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(index: usize, offset: usize) -> TextPos {
        TextPos::leading(index, offset)
    }

    fn chars(n: usize) -> InsertExtent {
        InsertExtent {
            chars_top: n,
            ..Default::default()
        }
    }

    #[test]
    fn test_before_edit_unchanged() {
        assert_eq!(relocate(p(0, 1), p(0, 2), p(0, 4), chars(5)), p(0, 1));
        assert_eq!(relocate(p(0, 9), p(1, 0), p(1, 0), chars(5)), p(0, 9));
    }

    #[test]
    fn test_inside_deletion_collapses_to_start() {
        assert_eq!(relocate(p(0, 2), p(0, 2), p(0, 6), chars(0)), p(0, 2));
        assert_eq!(relocate(p(0, 4), p(0, 2), p(0, 6), chars(0)), p(0, 2));
        assert_eq!(relocate(p(1, 3), p(0, 2), p(2, 1), chars(0)), p(0, 2));
    }

    #[test]
    fn test_same_paragraph_shift() {
        // replace [2, 4) with 5 chars: delta = 5 - 2
        assert_eq!(relocate(p(0, 7), p(0, 2), p(0, 4), chars(5)), p(0, 10));
        // insertion exactly at the marker shifts it
        assert_eq!(relocate(p(0, 3), p(0, 3), p(0, 3), chars(2)), p(0, 5));
    }

    #[test]
    fn test_lines_added_moves_tail_to_new_paragraph() {
        let ins = InsertExtent {
            chars_top: 2,
            lines_added: 2,
            chars_bottom: 4,
        };
        assert_eq!(relocate(p(0, 5), p(0, 3), p(0, 3), ins), p(2, 6));
        assert_eq!(relocate(p(3, 1), p(0, 3), p(0, 3), ins), p(5, 1));
    }

    #[test]
    fn test_paragraphs_joined_by_deletion() {
        // delete from (1, 4) to (3, 2): paragraph 3 tail joins paragraph 1
        assert_eq!(relocate(p(3, 5), p(1, 4), p(3, 2), chars(0)), p(1, 7));
        assert_eq!(relocate(p(4, 0), p(1, 4), p(3, 2), chars(0)), p(2, 0));
    }

    #[test]
    fn test_trailing_edge_preserved() {
        let pos = TextPos::trailing(0, 6);
        let moved = relocate(pos, p(0, 0), p(0, 0), chars(1));
        assert!(!moved.is_leading());
        assert_eq!(moved.offset(), 7);
        assert_eq!(moved.char_index(), 6);
    }
}

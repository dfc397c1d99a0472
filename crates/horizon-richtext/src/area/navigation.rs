//! Caret movement.
//!
//! Character moves step over grapheme clusters; word moves use the
//! Unicode word boundaries of `unicode-segmentation`, where a word is a
//! segment starting with a letter or digit. Vertical and line moves need
//! the realized layout and go through the flow.

use unicode_bidi::BidiInfo;
use unicode_segmentation::UnicodeSegmentation;

use crate::model::{StyledTextModel, TextPos};

use super::RichTextArea;

/// Boundaries of one paragraph, in chars.
struct Breaks {
    chars: Vec<char>,
    bounds: Vec<usize>,
}

impl Breaks {
    fn words(text: &str) -> Self {
        Self::from_byte_bounds(text, text.split_word_bound_indices().map(|(i, _)| i))
    }

    fn graphemes(text: &str) -> Self {
        Self::from_byte_bounds(text, text.grapheme_indices(true).map(|(i, _)| i))
    }

    fn from_byte_bounds(text: &str, starts: impl Iterator<Item = usize>) -> Self {
        let mut bounds = Vec::new();
        let mut chars = 0;
        let mut last = 0;
        for start in starts {
            chars += text[last..start].chars().count();
            last = start;
            bounds.push(chars);
        }
        let chars: Vec<char> = text.chars().collect();
        bounds.push(chars.len());
        bounds.dedup();
        Self { chars, bounds }
    }

    fn len(&self) -> usize {
        self.chars.len()
    }

    /// Last boundary before `offset`.
    fn preceding(&self, offset: usize) -> Option<usize> {
        self.bounds.iter().rev().copied().find(|&b| b < offset)
    }

    /// First boundary after `offset`.
    fn following(&self, offset: usize) -> Option<usize> {
        self.bounds.iter().copied().find(|&b| b > offset)
    }

    fn is_word_char(&self, offset: usize) -> bool {
        self.chars.get(offset).is_some_and(|c| c.is_alphanumeric())
    }
}

/// The position one grapheme cluster before or after `pos`, crossing
/// paragraph boundaries. `None` when moving back from the document start.
pub fn next_character(model: &StyledTextModel, pos: TextPos, forward: bool) -> Option<TextPos> {
    let pos = model.clamp(pos);
    let index = pos.index();
    let text = model.plain_text(index);
    let breaks = Breaks::graphemes(text);

    if forward {
        if pos.offset() >= breaks.len() {
            return Some(if index + 1 < model.paragraph_count() {
                TextPos::leading(index + 1, 0)
            } else {
                TextPos::leading(index, breaks.len())
            });
        }
        breaks.following(pos.offset()).map(|off| TextPos::leading(index, off))
    } else {
        if pos.offset() == 0 {
            return index.checked_sub(1).map(|ix| model.paragraph_end(ix));
        }
        breaks.preceding(pos.offset()).map(|off| TextPos::leading(index, off))
    }
}

/// Start of the word before `pos`, skipping empty paragraphs.
pub fn previous_word(model: &StyledTextModel, pos: TextPos) -> TextPos {
    let mut index = pos.index().min(model.paragraph_count().saturating_sub(1));
    let mut offset = pos.offset();
    loop {
        if index == 0 && offset == 0 {
            return TextPos::ZERO;
        }
        let breaks = Breaks::words(model.plain_text(index));
        let mut off = breaks.preceding(offset.min(breaks.len()));
        while let Some(o) = off {
            if breaks.is_word_char(o) {
                return TextPos::leading(index, o);
            }
            off = breaks.preceding(o);
        }
        if index == 0 {
            return TextPos::ZERO;
        }
        index -= 1;
        offset = usize::MAX;
    }
}

/// Start of the next word after `pos`. An empty paragraph is a stop of its
/// own, except for the one the caret starts in.
pub fn next_word_start(model: &StyledTextModel, pos: TextPos) -> TextPos {
    let end = model.document_end();
    let mut index = pos.index();
    let mut offset = pos.offset();
    let mut skip_empty = true;
    loop {
        if index > end.index() || (index == end.index() && offset >= end.offset()) {
            return end;
        }
        let breaks = Breaks::words(model.plain_text(index));
        let len = breaks.len();
        if len == 0 {
            if skip_empty {
                index += 1;
            }
            return TextPos::leading(index, 0);
        }
        if offset >= len {
            return TextPos::leading(index + 1, 0);
        }

        match breaks.following(offset) {
            None => return TextPos::leading(index, len),
            Some(next) if next == len => return TextPos::leading(index, len),
            Some(mut next) => loop {
                if breaks.is_word_char(next) {
                    return TextPos::leading(index, next);
                }
                match breaks.following(next) {
                    Some(n) => next = n,
                    None => break,
                }
            },
        }

        index += 1;
        offset = 0;
        skip_empty = false;
    }
}

/// End of the word at or after `pos`.
pub fn next_word_end(model: &StyledTextModel, pos: TextPos) -> TextPos {
    let end = model.document_end();
    let mut index = pos.index();
    let mut offset = pos.offset();
    let mut skip_empty = true;
    loop {
        if index > end.index() || (index == end.index() && offset >= end.offset()) {
            return end;
        }
        let breaks = Breaks::words(model.plain_text(index));
        let len = breaks.len();
        if len == 0 {
            if skip_empty {
                index += 1;
            }
            return TextPos::leading(index, 0);
        }

        let offset_in = offset.min(len);
        if breaks.is_word_char(offset_in) {
            return TextPos::leading(index, breaks.following(offset_in).unwrap_or(len));
        }
        let mut cur = offset_in;
        while let Some(next) = breaks.following(cur) {
            if breaks.is_word_char(cur) {
                return TextPos::leading(index, next);
            }
            cur = next;
        }

        index += 1;
        offset = 0;
        skip_empty = false;
    }
}

/// The word segment holding `pos`, as a char range of its paragraph.
///
/// A position right after a word selects that word rather than the
/// separator following it. `None` for an empty paragraph.
pub fn word_at(model: &StyledTextModel, pos: TextPos) -> Option<(TextPos, TextPos)> {
    let pos = model.clamp(pos);
    let breaks = Breaks::words(model.plain_text(pos.index()));
    if breaks.len() == 0 {
        return None;
    }
    let segment = |off: usize| {
        let start = breaks.bounds.iter().rev().copied().find(|&b| b <= off).unwrap_or(0);
        let end = breaks.following(off).unwrap_or(breaks.len());
        (start, end)
    };

    let off = pos.offset().min(breaks.len() - 1);
    let (mut start, mut end) = segment(off);
    if !breaks.is_word_char(start) && pos.offset() > 0 && breaks.is_word_char(segment(pos.offset() - 1).0) {
        (start, end) = segment(pos.offset() - 1);
    }
    Some((TextPos::leading(pos.index(), start), TextPos::leading(pos.index(), end)))
}

/// Whether a paragraph reads right to left.
fn is_rtl_text(text: &str) -> bool {
    let info = BidiInfo::new(text, None);
    info.paragraphs.first().is_some_and(|p| p.level.is_rtl())
}

fn paragraph_start(_: &StyledTextModel, caret: TextPos) -> Option<TextPos> {
    Some(TextPos::leading(caret.index(), 0))
}

fn paragraph_end(model: &StyledTextModel, caret: TextPos) -> Option<TextPos> {
    Some(model.paragraph_end(caret.index()))
}

fn paragraph_down(model: &StyledTextModel, caret: TextPos) -> Option<TextPos> {
    let end = model.paragraph_end(caret.index());
    if !caret.is_same_insertion_index(&end) {
        return Some(end);
    }
    let next = caret.index() + 1;
    (next < model.paragraph_count()).then(|| model.paragraph_end(next))
}

fn paragraph_up(_: &StyledTextModel, caret: TextPos) -> Option<TextPos> {
    let start = TextPos::leading(caret.index(), 0);
    if !caret.is_same_insertion_index(&start) {
        return Some(start);
    }
    caret.index().checked_sub(1).map(|ix| TextPos::leading(ix, 0))
}

fn to_previous_word(model: &StyledTextModel, caret: TextPos) -> Option<TextPos> {
    Some(previous_word(model, caret))
}

fn to_next_word_start(model: &StyledTextModel, caret: TextPos) -> Option<TextPos> {
    Some(next_word_start(model, caret))
}

fn to_next_word_end(model: &StyledTextModel, caret: TextPos) -> Option<TextPos> {
    Some(next_word_end(model, caret))
}

type Motion = fn(&StyledTextModel, TextPos) -> Option<TextPos>;

/// The platform's forward word motion: word starts on Windows, word ends
/// elsewhere.
fn forward_word() -> Motion {
    if cfg!(target_os = "windows") {
        to_next_word_start
    } else {
        to_next_word_end
    }
}

impl RichTextArea {
    /// Apply `motion` to the caret and move or extend to the result.
    pub(super) fn move_with(&mut self, extend: bool, motion: Motion) {
        self.sync();
        let (Some(model), Some(caret)) = (self.model.as_ref(), self.caret_position()) else {
            return;
        };
        if let Some(pos) = motion(model, caret) {
            self.clear_phantom_x();
            self.move_caret(pos, extend);
        }
    }

    fn move_character(&mut self, forward: bool, extend: bool) {
        self.sync();
        let Some(segment) = self.selection() else {
            return;
        };
        self.clear_phantom_x();
        if !extend && !segment.is_collapsed() {
            let pos = if forward { segment.max() } else { segment.min() };
            self.move_caret(pos, false);
            return;
        }
        let Some(model) = self.model.as_ref() else {
            return;
        };
        if let Some(pos) = next_character(model, segment.caret(), forward) {
            self.move_caret(pos, extend);
        }
    }

    /// Move the caret `delta` pixels up (negative) or down, keeping its
    /// horizontal position across consecutive vertical moves.
    fn move_vertically(&mut self, delta: f64, extend: bool) {
        self.sync();
        let (Some(model), Some(caret)) = (self.model.as_ref(), self.caret_position()) else {
            return;
        };
        self.flow.scroll_caret_to_visible(model, caret);
        self.flow.reconcile(Some(model), self.selection.segment());
        let Some(info) = self.flow.caret_info(caret) else {
            return;
        };

        let x = *self.phantom_x.get_or_insert(info.mid_x());
        let down = delta > 0.0;
        let y = if down {
            info.max_y + delta + 0.5
        } else {
            info.min_y + delta - 0.5
        };
        if let Some(pos) = self.flow.move_vertically(model, caret.index(), x, y, down) {
            self.move_caret(pos, extend);
        }
    }

    fn move_line_edge(&mut self, start: bool, extend: bool) {
        self.sync();
        let (Some(model), Some(caret)) = (self.model.as_ref(), self.caret_position()) else {
            return;
        };
        self.flow.scroll_caret_to_visible(model, caret);
        self.flow.reconcile(Some(model), self.selection.segment());
        if let Some(pos) = self.flow.move_horizontally(start, caret) {
            self.clear_phantom_x();
            self.move_caret(pos, extend);
        }
    }

    fn caret_paragraph_is_rtl(&self) -> bool {
        self.caret_position()
            .is_some_and(|caret| is_rtl_text(self.plain_text(caret.index())))
    }

    fn move_word_left(&mut self, extend: bool) {
        let motion: Motion = if self.caret_paragraph_is_rtl() {
            forward_word()
        } else {
            to_previous_word
        };
        self.move_with(extend, motion);
    }

    fn move_word_right(&mut self, extend: bool) {
        let motion: Motion = if self.caret_paragraph_is_rtl() {
            to_previous_word
        } else {
            forward_word()
        };
        self.move_with(extend, motion);
    }

    // Characters

    pub fn move_left(&mut self) {
        self.move_character(false, false);
    }

    pub fn move_right(&mut self) {
        self.move_character(true, false);
    }

    pub fn select_left(&mut self) {
        self.move_character(false, true);
    }

    pub fn select_right(&mut self) {
        self.move_character(true, true);
    }

    // Lines

    pub fn move_up(&mut self) {
        self.move_vertically(-1.0, false);
    }

    pub fn move_down(&mut self) {
        self.move_vertically(1.0, false);
    }

    pub fn select_up(&mut self) {
        self.move_vertically(-1.0, true);
    }

    pub fn select_down(&mut self) {
        self.move_vertically(1.0, true);
    }

    /// Start of the visual line holding the caret.
    pub fn move_line_start(&mut self) {
        self.move_line_edge(true, false);
    }

    pub fn move_line_end(&mut self) {
        self.move_line_edge(false, false);
    }

    pub fn select_line_start(&mut self) {
        self.move_line_edge(true, true);
    }

    pub fn select_line_end(&mut self) {
        self.move_line_edge(false, true);
    }

    // Pages

    pub fn page_up(&mut self) {
        self.move_vertically(-self.flow.viewport_height(), false);
    }

    pub fn page_down(&mut self) {
        self.move_vertically(self.flow.viewport_height(), false);
    }

    pub fn select_page_up(&mut self) {
        self.move_vertically(-self.flow.viewport_height(), true);
    }

    pub fn select_page_down(&mut self) {
        self.move_vertically(self.flow.viewport_height(), true);
    }

    // Paragraphs

    pub fn move_paragraph_start(&mut self) {
        self.move_with(false, paragraph_start);
    }

    pub fn move_paragraph_end(&mut self) {
        self.move_with(false, paragraph_end);
    }

    pub fn select_paragraph_start(&mut self) {
        self.move_with(true, paragraph_start);
    }

    pub fn select_paragraph_end(&mut self) {
        self.move_with(true, paragraph_end);
    }

    /// End of the paragraph, or of the next one when already at the end.
    pub fn move_paragraph_down(&mut self) {
        self.move_with(false, paragraph_down);
    }

    /// Start of the paragraph, or of the previous one when already there.
    pub fn move_paragraph_up(&mut self) {
        self.move_with(false, paragraph_up);
    }

    pub fn select_paragraph_down(&mut self) {
        self.move_with(true, paragraph_down);
    }

    pub fn select_paragraph_up(&mut self) {
        self.move_with(true, paragraph_up);
    }

    // Document

    pub fn move_document_start(&mut self) {
        self.select_caret(TextPos::ZERO);
    }

    pub fn move_document_end(&mut self) {
        let end = self.document_end();
        self.select_caret(end);
    }

    /// Extend the selection to the document start.
    pub fn select_document_start(&mut self) {
        self.extend_selection(TextPos::ZERO);
    }

    pub fn select_document_end(&mut self) {
        let end = self.document_end();
        self.extend_selection(end);
    }

    pub fn select_all(&mut self) {
        let end = self.document_end();
        self.select(TextPos::ZERO, end);
        self.clear_phantom_x();
    }

    // Words

    pub fn previous_word(&mut self) {
        self.move_with(false, to_previous_word);
    }

    pub fn next_word(&mut self) {
        self.move_with(false, to_next_word_start);
    }

    pub fn next_word_end(&mut self) {
        self.move_with(false, to_next_word_end);
    }

    pub fn select_previous_word(&mut self) {
        self.move_with(true, to_previous_word);
    }

    pub fn select_next_word(&mut self) {
        self.move_with(true, to_next_word_start);
    }

    pub fn select_next_word_end(&mut self) {
        self.move_with(true, to_next_word_end);
    }

    /// Previous word in left-to-right text, next word in right-to-left text.
    pub fn word_left(&mut self) {
        self.move_word_left(false);
    }

    pub fn word_right(&mut self) {
        self.move_word_right(false);
    }

    pub fn select_word_left(&mut self) {
        self.move_word_left(true);
    }

    pub fn select_word_right(&mut self) {
        self.move_word_right(true);
    }

    /// Select the word at the caret.
    pub fn select_word(&mut self) {
        self.sync();
        let (Some(model), Some(caret)) = (self.model.as_ref(), self.caret_position()) else {
            return;
        };
        if let Some((start, end)) = word_at(model, caret) {
            self.select(start, end);
        }
    }

    /// Select the paragraph holding the caret.
    pub fn select_paragraph(&mut self) {
        let Some(caret) = self.caret_position() else {
            return;
        };
        let end = self.paragraph_end(caret.index());
        self.select(TextPos::leading(caret.index(), 0), end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(text: &str) -> StyledTextModel {
        StyledTextModel::with_text(text)
    }

    #[test]
    fn test_next_character_graphemes() {
        // "e" + combining acute is one cluster of two chars
        let m = model("ae\u{301}b");
        assert_eq!(next_character(&m, TextPos::leading(0, 1), true), Some(TextPos::leading(0, 3)));
        assert_eq!(next_character(&m, TextPos::leading(0, 3), false), Some(TextPos::leading(0, 1)));
    }

    #[test]
    fn test_next_character_crosses_paragraphs() {
        let m = model("ab\ncd");
        assert_eq!(next_character(&m, TextPos::leading(0, 2), true), Some(TextPos::leading(1, 0)));
        assert_eq!(next_character(&m, TextPos::leading(1, 0), false), Some(TextPos::leading(0, 2)));
        assert_eq!(next_character(&m, TextPos::ZERO, false), None);
        assert_eq!(next_character(&m, TextPos::leading(1, 2), true), Some(TextPos::leading(1, 2)));
    }

    #[test]
    fn test_previous_word() {
        let m = model("one two  three\n\nfour");
        assert_eq!(previous_word(&m, TextPos::leading(0, 14)), TextPos::leading(0, 9));
        assert_eq!(previous_word(&m, TextPos::leading(0, 9)), TextPos::leading(0, 4));
        assert_eq!(previous_word(&m, TextPos::leading(0, 5)), TextPos::leading(0, 4));
        assert_eq!(previous_word(&m, TextPos::leading(2, 0)), TextPos::leading(0, 9));
        assert_eq!(previous_word(&m, TextPos::leading(0, 2)), TextPos::ZERO);
    }

    #[test]
    fn test_next_word_start() {
        let m = model("one, two\n\nthree");
        assert_eq!(next_word_start(&m, TextPos::ZERO), TextPos::leading(0, 5));
        assert_eq!(next_word_start(&m, TextPos::leading(0, 5)), TextPos::leading(0, 8));
        // end of paragraph goes to the next one, which is empty
        assert_eq!(next_word_start(&m, TextPos::leading(0, 8)), TextPos::leading(1, 0));
        assert_eq!(next_word_start(&m, TextPos::leading(1, 0)), TextPos::leading(2, 0));
        assert_eq!(next_word_start(&m, TextPos::leading(2, 1)), TextPos::leading(2, 5));
    }

    #[test]
    fn test_next_word_end() {
        let m = model("one, two\nthree");
        assert_eq!(next_word_end(&m, TextPos::ZERO), TextPos::leading(0, 3));
        assert_eq!(next_word_end(&m, TextPos::leading(0, 3)), TextPos::leading(0, 8));
        assert_eq!(next_word_end(&m, TextPos::leading(0, 8)), TextPos::leading(1, 5));
        assert_eq!(next_word_end(&m, TextPos::leading(1, 5)), TextPos::leading(1, 5));
    }

    #[test]
    fn test_word_at() {
        let m = model("hello world");
        assert_eq!(word_at(&m, TextPos::leading(0, 2)), Some((TextPos::ZERO, TextPos::leading(0, 5))));
        // right after a word
        assert_eq!(word_at(&m, TextPos::leading(0, 5)), Some((TextPos::ZERO, TextPos::leading(0, 5))));
        assert_eq!(
            word_at(&m, TextPos::leading(0, 11)),
            Some((TextPos::leading(0, 6), TextPos::leading(0, 11)))
        );
        assert_eq!(word_at(&model(""), TextPos::ZERO), None);
    }

    #[test]
    fn test_rtl_detection() {
        assert!(is_rtl_text("\u{05e9}\u{05dc}\u{05d5}\u{05dd}"));
        assert!(!is_rtl_text("hello"));
        assert!(!is_rtl_text(""));
    }

    #[test]
    fn test_paragraph_motions() {
        let m = model("ab\ncd");
        assert_eq!(paragraph_down(&m, TextPos::ZERO), Some(TextPos::leading(0, 2)));
        assert_eq!(paragraph_down(&m, TextPos::leading(0, 2)), Some(TextPos::leading(1, 2)));
        assert_eq!(paragraph_down(&m, TextPos::leading(1, 2)), None);
        assert_eq!(paragraph_up(&m, TextPos::leading(1, 1)), Some(TextPos::leading(1, 0)));
        assert_eq!(paragraph_up(&m, TextPos::leading(1, 0)), Some(TextPos::ZERO));
        assert_eq!(paragraph_up(&m, TextPos::ZERO), None);
    }
}

//! Undo/redo history as plain data.
//!
//! Each entry is a list of [`EditRecord`]s. The model replays records with a
//! single interpreter: forward in order for redo, inverse in reverse order for
//! undo.

use super::attributes::StyleAttributeMap;
use super::input::StyledSegment;
use super::paragraph::{ParagraphStyle, RegionSpec};
use super::position::TextPos;

/// A reversible edit.
#[derive(Debug, Clone, PartialEq)]
pub enum EditRecord {
    /// `content` was inserted at `at`, ending at `end`.
    Insert {
        at: TextPos,
        end: TextPos,
        content: Vec<StyledSegment>,
        /// Attributes of the paragraph at `at` before the insertion.
        prior_attrs: StyleAttributeMap,
        /// Region of the paragraph at `at` before the insertion.
        prior_region: Option<RegionSpec>,
    },
    /// `[start, end)` was removed; `content` is what it held.
    Delete {
        start: TextPos,
        end: TextPos,
        content: Vec<StyledSegment>,
    },
    /// Paragraphs `first_index..first_index + before.len()` were restyled.
    StyleChange {
        first_index: usize,
        before: Vec<ParagraphStyle>,
        after: Vec<ParagraphStyle>,
    },
}

impl EditRecord {
    fn is_single_line_typing(&self) -> bool {
        match self {
            Self::Insert {
                at, end, content, ..
            } => {
                at.index() == end.index()
                    && content.iter().all(|s| matches!(s, StyledSegment::Text { .. }))
            }
            _ => false,
        }
    }
}

/// One undoable step.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoEntry {
    pub(crate) records: Vec<EditRecord>,
    /// Selection to restore after undo.
    pub(crate) undo_selection: (TextPos, TextPos),
    /// Selection to restore after redo.
    pub(crate) redo_selection: (TextPos, TextPos),
}

impl UndoEntry {
    pub fn records(&self) -> &[EditRecord] {
        &self.records
    }

    /// Merge a typing entry that continues exactly where this one ended.
    fn try_merge(&mut self, next: &UndoEntry) -> bool {
        let ([this], [other]) = (self.records.as_mut_slice(), next.records.as_slice()) else {
            return false;
        };
        if !this.is_single_line_typing() || !other.is_single_line_typing() {
            return false;
        }
        match (this, other) {
            (
                EditRecord::Insert { end, content, .. },
                EditRecord::Insert {
                    at: next_at,
                    end: next_end,
                    content: next_content,
                    ..
                },
            ) if end == next_at => {
                *end = *next_end;
                content.extend(next_content.iter().cloned());
                self.redo_selection.1 = *next_end;
                true
            }
            _ => false,
        }
    }
}

/// Undo availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoState {
    /// Nothing to undo or redo.
    Clean,
    UndoAvailable,
    RedoAvailable,
    /// Both undo and redo are possible (after a partial undo).
    Both,
}

/// History of undoable entries with a cursor.
#[derive(Debug)]
pub(crate) struct UndoStack {
    entries: Vec<UndoEntry>,
    index: usize,
    max_size: usize,
    coalesce: bool,
    merge_enabled: bool,
}

impl UndoStack {
    pub fn new(max_size: usize, coalesce: bool) -> Self {
        Self {
            entries: Vec::new(),
            index: 0,
            max_size: max_size.max(1),
            coalesce,
            merge_enabled: true,
        }
    }

    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size.max(1);
        self.enforce_max_size();
    }

    pub fn set_coalesce(&mut self, coalesce: bool) {
        self.coalesce = coalesce;
    }

    pub fn push(&mut self, entry: UndoEntry) {
        // Any new edit drops the redo history.
        self.entries.truncate(self.index);

        if self.coalesce && self.merge_enabled {
            if let Some(last) = self.entries.last_mut() {
                if last.try_merge(&entry) {
                    return;
                }
            }
        }

        self.entries.push(entry);
        self.index = self.entries.len();
        self.merge_enabled = true;
        self.enforce_max_size();
    }

    fn enforce_max_size(&mut self) {
        if self.entries.len() > self.max_size {
            let excess = self.entries.len() - self.max_size;
            self.entries.drain(0..excess);
            self.index = self.index.saturating_sub(excess);
        }
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.entries.len()
    }

    pub fn undo(&mut self) -> Option<UndoEntry> {
        if self.can_undo() {
            self.index -= 1;
            self.merge_enabled = false;
            Some(self.entries[self.index].clone())
        } else {
            None
        }
    }

    pub fn redo(&mut self) -> Option<UndoEntry> {
        if self.can_redo() {
            let entry = self.entries[self.index].clone();
            self.index += 1;
            self.merge_enabled = false;
            Some(entry)
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = 0;
        self.merge_enabled = true;
    }

    pub fn break_merge(&mut self) {
        self.merge_enabled = false;
    }

    pub fn state(&self) -> UndoState {
        match (self.can_undo(), self.can_redo()) {
            (false, false) => UndoState::Clean,
            (true, false) => UndoState::UndoAvailable,
            (false, true) => UndoState::RedoAvailable,
            (true, true) => UndoState::Both,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typing(at: usize, text: &str) -> UndoEntry {
        let start = TextPos::leading(0, at);
        let end = TextPos::leading(0, at + text.chars().count());
        UndoEntry {
            records: vec![EditRecord::Insert {
                at: start,
                end,
                content: vec![StyledSegment::text(text)],
                prior_attrs: StyleAttributeMap::new(),
                prior_region: None,
            }],
            undo_selection: (start, start),
            redo_selection: (start, end),
        }
    }

    #[test]
    fn test_state_machine() {
        let mut stack = UndoStack::new(10, false);
        assert_eq!(stack.state(), UndoState::Clean);

        stack.push(typing(0, "a"));
        stack.push(typing(1, "b"));
        assert_eq!(stack.state(), UndoState::UndoAvailable);

        stack.undo();
        assert_eq!(stack.state(), UndoState::Both);
        stack.undo();
        assert_eq!(stack.state(), UndoState::RedoAvailable);
        assert!(stack.undo().is_none());

        stack.push(typing(0, "c"));
        assert_eq!(stack.state(), UndoState::UndoAvailable);
        assert!(stack.redo().is_none());
    }

    #[test]
    fn test_max_size_drops_oldest() {
        let mut stack = UndoStack::new(2, false);
        stack.push(typing(0, "a"));
        stack.push(typing(1, "b"));
        stack.push(typing(2, "c"));
        assert_eq!(stack.undo(), Some(typing(2, "c")));
        assert_eq!(stack.undo(), Some(typing(1, "b")));
        assert!(stack.undo().is_none());
    }

    #[test]
    fn test_coalesce_consecutive_typing() {
        let mut stack = UndoStack::new(10, true);
        stack.push(typing(0, "a"));
        stack.push(typing(1, "b"));
        stack.push(typing(5, "z"));

        let last = stack.undo().unwrap();
        assert_eq!(last, typing(5, "z"));
        let merged = stack.undo().unwrap();
        assert_eq!(merged.redo_selection.1, TextPos::leading(0, 2));
        assert!(stack.undo().is_none());
    }

    #[test]
    fn test_no_merge_after_undo() {
        let mut stack = UndoStack::new(10, true);
        stack.push(typing(0, "a"));
        stack.undo();
        stack.redo();
        stack.push(typing(1, "b"));
        stack.undo();
        assert!(stack.can_undo());
    }
}

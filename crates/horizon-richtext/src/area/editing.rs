//! Editing commands.
//!
//! Commands act on the caret and selection, and do nothing when the area is
//! not editable, the model is read-only, or there is no caret. Every edit
//! creates an undo entry.

use horizon_richtext_core::logging::targets;

use crate::error::Result;
use crate::format::DataFormat;
use crate::model::{StyledInput, StyledTextModel, TextPos};

use super::RichTextArea;
use super::navigation::{next_character, next_word_end, next_word_start, previous_word};

impl RichTextArea {
    /// Whether the area is editable and its model writable.
    pub fn can_edit(&self) -> bool {
        self.editable && self.model.as_ref().is_some_and(StyledTextModel::is_writable)
    }

    /// Replace the selection with `text`, styled like the text before it.
    pub fn type_text(&mut self, text: &str) -> Result<()> {
        if text.is_empty() || !self.can_edit() {
            return Ok(());
        }
        self.sync();
        let (Some(model), Some(segment)) = (self.model.as_mut(), self.selection.segment()) else {
            return Ok(());
        };
        let attrs = model.typing_attributes(segment.min());
        let pos = model.replace(segment.min(), segment.max(), StyledInput::styled(text, attrs), true)?;
        tracing::trace!(target: targets::AREA, chars = text.chars().count(), %pos, "typed");
        self.sync();
        self.clear_phantom_x();
        self.move_caret(pos, false);
        Ok(())
    }

    pub fn insert_tab(&mut self) -> Result<()> {
        self.type_text("\t")
    }

    /// Split the paragraph at the caret, replacing the selection.
    pub fn insert_line_break(&mut self) -> Result<()> {
        if !self.can_edit() {
            return Ok(());
        }
        self.sync();
        let (Some(model), Some(segment)) = (self.model.as_mut(), self.selection.segment()) else {
            return Ok(());
        };
        let pos = model.replace(segment.min(), segment.max(), StyledInput::plain("\n"), true)?;
        self.sync();
        self.clear_phantom_x();
        self.move_caret(pos, false);
        Ok(())
    }

    /// Delete the selection, or the char before the caret. At a paragraph
    /// start this joins the paragraph with the previous one.
    ///
    /// Backspace removes one char at a time, so it takes apart grapheme
    /// clusters.
    pub fn backspace(&mut self) -> Result<()> {
        if !self.can_edit() {
            return Ok(());
        }
        if self.has_non_empty_selection() {
            return self.delete_selection();
        }
        let Some(caret) = self.caret_position() else {
            return Ok(());
        };
        let start = if caret.offset() == 0 {
            match caret.index().checked_sub(1) {
                Some(ix) => self.paragraph_end(ix),
                None => return Ok(()),
            }
        } else {
            TextPos::leading(caret.index(), caret.offset() - 1)
        };
        self.replace_text(start, caret, StyledInput::empty(), true)?;
        self.clear_phantom_x();
        self.move_caret(start, false);
        Ok(())
    }

    /// Delete the selection, or the grapheme cluster after the caret.
    pub fn delete(&mut self) -> Result<()> {
        if !self.can_edit() {
            return Ok(());
        }
        if self.has_non_empty_selection() {
            return self.delete_selection();
        }
        let (Some(model), Some(caret)) = (self.model.as_ref(), self.caret_position()) else {
            return Ok(());
        };
        let Some(end) = next_character(model, caret, true) else {
            return Ok(());
        };
        self.replace_text(caret, end, StyledInput::empty(), true)?;
        self.clear_phantom_x();
        self.move_caret(caret, false);
        Ok(())
    }

    /// Delete the selected text.
    pub fn delete_selection(&mut self) -> Result<()> {
        if !self.can_edit() {
            return Ok(());
        }
        let Some(segment) = self.selection() else {
            return Ok(());
        };
        self.replace_text(segment.min(), segment.max(), StyledInput::empty(), true)?;
        self.clear_phantom_x();
        self.move_caret(segment.min(), false);
        Ok(())
    }

    /// Delete every paragraph the selection touches. The last paragraph of
    /// the document keeps its place, emptied.
    pub fn delete_paragraph(&mut self) -> Result<()> {
        if !self.can_edit() {
            return Ok(());
        }
        let (Some(model), Some(segment)) = (self.model.as_ref(), self.selection()) else {
            return Ok(());
        };
        let start = TextPos::leading(segment.min().index(), 0);
        let end = model.clamp(TextPos::leading(segment.max().index() + 1, 0));
        self.replace_text(start, end, StyledInput::empty(), true)?;
        self.clear_phantom_x();
        self.move_caret(start, false);
        Ok(())
    }

    /// Delete from the paragraph start to the caret.
    pub fn delete_paragraph_start(&mut self) -> Result<()> {
        self.delete_to(|_, caret| TextPos::leading(caret.index(), 0))
    }

    pub fn delete_word_previous(&mut self) -> Result<()> {
        self.delete_to(previous_word)
    }

    pub fn delete_word_next_start(&mut self) -> Result<()> {
        self.delete_to(next_word_start)
    }

    pub fn delete_word_next_end(&mut self) -> Result<()> {
        self.delete_to(next_word_end)
    }

    /// Delete from the caret to `target(caret)`, ignoring the selection.
    fn delete_to(&mut self, target: impl Fn(&StyledTextModel, TextPos) -> TextPos) -> Result<()> {
        if !self.can_edit() {
            return Ok(());
        }
        self.sync();
        let (Some(model), Some(caret)) = (self.model.as_ref(), self.caret_position()) else {
            return Ok(());
        };
        let to = target(model, caret);
        self.clear_selection();
        self.clear_phantom_x();
        let pos = self.replace_text(caret, to, StyledInput::empty(), true)?;
        self.select_caret(pos);
        Ok(())
    }

    /// Collapse the selection onto the caret.
    pub fn deselect(&mut self) {
        if let Some(caret) = self.caret_position() {
            self.clear_phantom_x();
            self.move_caret(caret, false);
        }
    }

    // Transfer

    /// The selection serialized in `format`, or `None` when nothing is
    /// selected.
    pub fn copy(&self, format: DataFormat) -> Result<Option<String>> {
        match self.selection() {
            Some(segment) if !segment.is_collapsed() => self
                .export_range(format, segment.min(), segment.max())
                .map(Some),
            _ => Ok(None),
        }
    }

    /// Copy the selection and delete it.
    pub fn cut(&mut self, format: DataFormat) -> Result<Option<String>> {
        if !self.can_edit() {
            return Ok(None);
        }
        let copied = self.copy(format)?;
        if copied.is_some() {
            self.delete_selection()?;
        }
        Ok(copied)
    }

    /// Replace the selection with `text` decoded from `format`.
    pub fn paste(&mut self, format: DataFormat, text: &str) -> Result<()> {
        if !self.can_edit() {
            return Ok(());
        }
        let Some(segment) = self.selection() else {
            return Ok(());
        };
        let input = self.context.formats().import(format, text)?;
        let pos = self.replace_text(segment.min(), segment.max(), input, true)?;
        self.clear_phantom_x();
        self.move_caret(pos, false);
        Ok(())
    }
}

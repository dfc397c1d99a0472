//! The styled document model.

use std::sync::atomic::{AtomicU64, Ordering};

use horizon_richtext_core::Signal;
use horizon_richtext_core::logging::targets;
use slotmap::SlotMap;

use super::attributes::StyleAttributeMap;
use super::input::{StyledInput, StyledSegment};
use super::marker::{InsertExtent, Marker, relocate};
use super::paragraph::{Paragraph, ParagraphStyle};
use super::position::TextPos;
use super::undo::{EditRecord, UndoEntry, UndoStack, UndoState};
use crate::error::{Result, RichTextError};

const DEFAULT_UNDO_LIMIT: usize = 100;

/// Identity of a model instance.
///
/// Ids are opaque tokens used only to tell models apart, for instance so a
/// selection never releases markers into a model that did not create them.
/// The counter behind them holds no editor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(u64);

impl ModelId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Whether a change altered text or only styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Edit,
    Style,
}

/// Notification published once per edit.
///
/// `start` and `end` are the affected range in pre-edit coordinates. For
/// style changes the range covers every restyled paragraph in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentChange {
    pub kind: ChangeKind,
    pub start: TextPos,
    pub end: TextPos,
    /// Chars inserted into the first paragraph.
    pub chars_added_top: usize,
    /// Paragraph breaks inserted.
    pub lines_added: usize,
    /// Chars inserted at the start of the last paragraph.
    pub chars_added_bottom: usize,
}

impl ContentChange {
    pub fn is_edit(&self) -> bool {
        self.kind == ChangeKind::Edit
    }

    /// Net change in paragraph count.
    pub fn paragraph_delta(&self) -> isize {
        self.lines_added as isize - (self.end.index() - self.start.index()) as isize
    }

    /// Whether the change touches more than one paragraph.
    pub fn is_multi_paragraph(&self) -> bool {
        self.lines_added > 0 || self.start.index() != self.end.index()
    }
}

/// An ordered sequence of styled paragraphs with markers and undo history.
///
/// The model always holds at least one paragraph. Every position argument is
/// clamped into the document; edits fail with
/// [`RichTextError::NotWritable`] when the model is read-only.
///
/// ```
/// use horizon_richtext::model::{StyledTextModel, TextPos};
///
/// let mut model = StyledTextModel::with_text("hello\nworld");
/// let end = model.replace(TextPos::leading(0, 5), TextPos::leading(0, 5), ",", true).unwrap();
/// assert_eq!(model.plain_text(0), "hello,");
/// assert_eq!(end, TextPos::leading(0, 6));
///
/// model.undo().unwrap();
/// assert_eq!(model.plain_text(0), "hello");
/// ```
#[derive(Debug)]
pub struct StyledTextModel {
    id: ModelId,
    paragraphs: Vec<Paragraph>,
    markers: SlotMap<Marker, TextPos>,
    undo: UndoStack,
    writable: bool,
    content_changed: Signal<ContentChange>,
}

impl Default for StyledTextModel {
    fn default() -> Self {
        Self::new()
    }
}

impl StyledTextModel {
    /// An empty, writable model with a single empty paragraph.
    pub fn new() -> Self {
        Self {
            id: ModelId::next(),
            paragraphs: vec![Paragraph::new()],
            markers: SlotMap::with_key(),
            undo: UndoStack::new(DEFAULT_UNDO_LIMIT, false),
            writable: true,
            content_changed: Signal::new(),
        }
    }

    /// A model holding unstyled text; `\n` separates paragraphs.
    pub fn with_text(text: &str) -> Self {
        Self::from_input(StyledInput::plain(text))
    }

    /// A model built from styled content.
    pub fn from_input(input: impl Into<StyledInput>) -> Self {
        let mut model = Self::new();
        let segments: Vec<StyledSegment> = input.into().collect();
        model.insert_segments(TextPos::ZERO, &segments);
        model
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    /// Signal emitted after each edit or style change.
    pub fn content_changed(&self) -> &Signal<ContentChange> {
        &self.content_changed
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn set_writable(&mut self, writable: bool) {
        self.writable = writable;
    }

    // ---- read paths ----

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.paragraphs.get(index)
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Plain text of a paragraph, or `""` past the end of the document.
    pub fn plain_text(&self, index: usize) -> &str {
        self.paragraphs.get(index).map_or("", Paragraph::text)
    }

    /// Length in chars of a paragraph, or 0 past the end of the document.
    pub fn paragraph_length(&self, index: usize) -> usize {
        self.paragraphs.get(index).map_or(0, Paragraph::len)
    }

    /// Position after the last char of a paragraph.
    pub fn paragraph_end(&self, index: usize) -> TextPos {
        let index = index.min(self.last_index());
        TextPos::leading(index, self.paragraphs[index].len())
    }

    /// Position after the last char of the document.
    pub fn document_end(&self) -> TextPos {
        self.paragraph_end(self.last_index())
    }

    fn last_index(&self) -> usize {
        self.paragraphs.len().saturating_sub(1)
    }

    /// Clamp a position into the document.
    pub fn clamp(&self, pos: TextPos) -> TextPos {
        if pos.index() > self.last_index() {
            return self.document_end();
        }
        let len = self.paragraphs[pos.index()].len();
        if pos.offset() > len {
            TextPos::leading(pos.index(), len)
        } else {
            pos
        }
    }

    /// Clamp both ends and order them.
    fn normalize_range(&self, a: TextPos, b: TextPos) -> (TextPos, TextPos) {
        let a = self.clamp(a);
        let b = self.clamp(b);
        let (s, e) = if b < a { (b, a) } else { (a, b) };
        (
            TextPos::leading(s.index(), s.offset()),
            TextPos::leading(e.index(), e.offset()),
        )
    }

    /// Plain text of a range, paragraphs joined with `\n`.
    pub fn text_range(&self, start: TextPos, end: TextPos) -> String {
        let (start, end) = self.normalize_range(start, end);
        let mut out = String::new();
        for index in start.index()..=end.index() {
            if index > start.index() {
                out.push('\n');
            }
            let para = &self.paragraphs[index];
            let from = if index == start.index() { start.offset() } else { 0 };
            let to = if index == end.index() { end.offset() } else { para.len() };
            out.push_str(para.slice(from..to));
        }
        out
    }

    /// Styled copy of a range, suitable for feeding back into [`replace`](Self::replace).
    pub fn styled_range(&self, start: TextPos, end: TextPos) -> Vec<StyledSegment> {
        let (start, end) = self.normalize_range(start, end);
        self.copy_range(start, end)
    }

    /// Character attributes at `pos` combined with the paragraph attributes.
    pub fn attributes_at(&self, pos: TextPos) -> StyleAttributeMap {
        let pos = self.clamp(pos);
        let para = &self.paragraphs[pos.index()];
        let ci = pos.char_index().min(para.len().saturating_sub(1));
        para.attributes().combine(&para.char_attributes(ci))
    }

    /// Character attributes new text typed at `pos` should carry.
    pub fn typing_attributes(&self, pos: TextPos) -> StyleAttributeMap {
        let pos = self.clamp(pos);
        let para = &self.paragraphs[pos.index()];
        para.char_attributes(pos.offset().saturating_sub(1))
    }

    // ---- markers ----

    /// A new marker tracking `pos` (clamped).
    pub fn get_marker(&mut self, pos: TextPos) -> Marker {
        let pos = self.clamp(pos);
        self.markers.insert(pos)
    }

    /// Current position of a marker, or `None` once it has been released.
    pub fn marker_position(&self, marker: Marker) -> Option<TextPos> {
        self.markers.get(marker).copied()
    }

    pub fn release_marker(&mut self, marker: Marker) -> bool {
        self.markers.remove(marker).is_some()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    // ---- edits ----

    /// Replace `[start, end)` with `input` and return the position after the
    /// inserted content.
    ///
    /// Markers are relocated before this returns and one [`ContentChange`]
    /// is emitted. An edit that neither removes nor inserts anything is a
    /// no-op: no undo entry, no notification.
    ///
    /// With `create_undo == false` the undo history is cleared, since its
    /// records no longer describe the document.
    #[tracing::instrument(skip_all, target = "horizon_richtext::model", level = "debug")]
    pub fn replace(
        &mut self,
        start: TextPos,
        end: TextPos,
        input: impl Into<StyledInput>,
        create_undo: bool,
    ) -> Result<TextPos> {
        if !self.writable {
            return Err(RichTextError::NotWritable);
        }
        let (start, end) = self.normalize_range(start, end);
        let segments: Vec<StyledSegment> = input.into().filter(|s| !s.is_noop()).collect();
        if start == end && segments.is_empty() {
            return Ok(start);
        }

        let removed = if start == end {
            Vec::new()
        } else {
            self.copy_range(start, end)
        };
        self.remove_range(start, end);

        let prior = &self.paragraphs[start.index()];
        let prior_attrs = prior.attributes().clone();
        let prior_region = prior.region().cloned();

        let (inserted_end, extent) = self.insert_and_track(start, end, &segments);
        tracing::debug!(
            target: targets::MODEL,
            %start,
            %end,
            %inserted_end,
            lines_added = extent.lines_added,
            "replace"
        );

        if create_undo {
            let mut records = Vec::with_capacity(2);
            if !removed.is_empty() {
                records.push(EditRecord::Delete {
                    start,
                    end,
                    content: removed,
                });
            }
            if !segments.is_empty() {
                records.push(EditRecord::Insert {
                    at: start,
                    end: inserted_end,
                    content: segments,
                    prior_attrs,
                    prior_region,
                });
            }
            self.undo.push(UndoEntry {
                records,
                undo_selection: (start, end),
                redo_selection: (start, inserted_end),
            });
        } else {
            self.undo.clear();
        }

        self.emit_edit(start, end, extent);
        Ok(inserted_end)
    }

    /// Apply attributes to a range.
    ///
    /// Character attributes in `attrs` style the chars of the range, merged
    /// over (`merge == true`) or replacing the existing ones. With
    /// `merge == false` the character styling of the range is replaced
    /// wholesale, so an `attrs` holding no character attributes clears it.
    /// Paragraph attributes apply to every paragraph the range touches, even
    /// partially, and even when the range is empty.
    #[tracing::instrument(skip_all, target = "horizon_richtext::model", level = "debug")]
    pub fn apply_style(
        &mut self,
        start: TextPos,
        end: TextPos,
        attrs: &StyleAttributeMap,
        merge: bool,
    ) -> Result<()> {
        self.restyle(start, end, attrs, merge, true)
    }

    /// Replace the paragraph attributes of every paragraph `[start, end)`
    /// touches, leaving character styling alone.
    #[tracing::instrument(skip_all, target = "horizon_richtext::model", level = "debug")]
    pub fn set_paragraph_attributes(&mut self, start: TextPos, end: TextPos, attrs: &StyleAttributeMap) -> Result<()> {
        self.restyle(start, end, &attrs.paragraph_attributes(), false, false)
    }

    fn restyle(
        &mut self,
        start: TextPos,
        end: TextPos,
        attrs: &StyleAttributeMap,
        merge: bool,
        restyle_chars: bool,
    ) -> Result<()> {
        if !self.writable {
            return Err(RichTextError::NotWritable);
        }
        let (start, end) = self.normalize_range(start, end);
        let char_attrs = attrs.character_attributes();
        let para_attrs = attrs.paragraph_attributes();
        let first = start.index();
        let last = end.index();

        let before: Vec<ParagraphStyle> = self.paragraphs[first..=last].iter().map(Paragraph::style).collect();
        for index in first..=last {
            let para = &mut self.paragraphs[index];
            if restyle_chars && (!merge || !char_attrs.is_empty()) {
                let from = if index == first { start.offset() } else { 0 };
                let to = if index == last { end.offset() } else { para.len() };
                para.set_style(from..to, &char_attrs, merge);
            }
            if !para_attrs.is_empty() {
                let next = if merge {
                    para.attributes().combine(&para_attrs)
                } else {
                    para_attrs.clone()
                };
                para.set_attributes(next.normalized());
            }
        }
        let after: Vec<ParagraphStyle> = self.paragraphs[first..=last].iter().map(Paragraph::style).collect();
        if before == after {
            return Ok(());
        }

        self.undo.push(UndoEntry {
            records: vec![EditRecord::StyleChange {
                first_index: first,
                before,
                after,
            }],
            undo_selection: (start, end),
            redo_selection: (start, end),
        });
        self.emit_style(first, last);
        Ok(())
    }

    // ---- undo / redo ----

    /// Revert the most recent entry and return the range to select, or
    /// `None` if there is nothing to undo.
    #[tracing::instrument(skip_all, target = "horizon_richtext::model", level = "debug")]
    pub fn undo(&mut self) -> Result<Option<(TextPos, TextPos)>> {
        if !self.writable {
            return Err(RichTextError::NotWritable);
        }
        let Some(entry) = self.undo.undo() else {
            return Ok(None);
        };
        for record in entry.records.iter().rev() {
            self.apply_record(record, true);
        }
        Ok(Some(entry.undo_selection))
    }

    /// Re-apply the most recently undone entry and return the range of the
    /// re-applied content, or `None` if there is nothing to redo.
    #[tracing::instrument(skip_all, target = "horizon_richtext::model", level = "debug")]
    pub fn redo(&mut self) -> Result<Option<(TextPos, TextPos)>> {
        if !self.writable {
            return Err(RichTextError::NotWritable);
        }
        let Some(entry) = self.undo.redo() else {
            return Ok(None);
        };
        for record in &entry.records {
            self.apply_record(record, false);
        }
        Ok(Some(entry.redo_selection))
    }

    pub fn undo_state(&self) -> UndoState {
        self.undo.state()
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    pub fn clear_undo_redo(&mut self) {
        self.undo.clear();
    }

    pub fn set_undo_limit(&mut self, limit: usize) {
        self.undo.set_max_size(limit);
    }

    /// Merge consecutive single-paragraph typing into one undo entry.
    pub fn set_coalesce_typing(&mut self, coalesce: bool) {
        self.undo.set_coalesce(coalesce);
    }

    /// Make the next edit start a new undo entry even when coalescing.
    pub fn break_undo_coalescing(&mut self) {
        self.undo.break_merge();
    }

    /// Replay one record forward, or its inverse.
    fn apply_record(&mut self, record: &EditRecord, inverse: bool) {
        match (record, inverse) {
            (EditRecord::Insert { at, content, .. }, false) => {
                let (_, extent) = self.insert_and_track(*at, *at, content);
                self.emit_edit(*at, *at, extent);
            }
            (
                EditRecord::Insert {
                    at,
                    end,
                    prior_attrs,
                    prior_region,
                    ..
                },
                true,
            ) => {
                let (at, end) = (*at, *end);
                self.remove_range(at, end);
                let (_, extent) = self.insert_and_track(at, end, &[]);
                let para = &mut self.paragraphs[at.index()];
                para.set_attributes(prior_attrs.clone());
                para.set_region(prior_region.clone());
                self.emit_edit(at, end, extent);
            }
            (EditRecord::Delete { start, end, .. }, false) => {
                self.remove_range(*start, *end);
                let (_, extent) = self.insert_and_track(*start, *end, &[]);
                self.emit_edit(*start, *end, extent);
            }
            (EditRecord::Delete { start, content, .. }, true) => {
                let (_, extent) = self.insert_and_track(*start, *start, content);
                self.emit_edit(*start, *start, extent);
            }
            (
                EditRecord::StyleChange {
                    first_index,
                    before,
                    after,
                },
                inverse,
            ) => {
                let styles = if inverse { before } else { after };
                for (offset, style) in styles.iter().enumerate() {
                    if let Some(para) = self.paragraphs.get_mut(first_index + offset) {
                        para.restore_style(style);
                    }
                }
                let last = first_index + styles.len().saturating_sub(1);
                self.emit_style(*first_index, last.min(self.last_index()));
            }
        }
    }

    // ---- internals ----

    /// Copy `[start, end)` as segments. Every paragraph copied from its
    /// start carries its paragraph attributes (and region) so that
    /// re-inserting the copy restores them exactly.
    fn copy_range(&self, start: TextPos, end: TextPos) -> Vec<StyledSegment> {
        let mut out = Vec::new();
        for index in start.index()..=end.index() {
            if index > start.index() {
                out.push(StyledSegment::LineBreak);
            }
            let para = &self.paragraphs[index];
            let from = if index == start.index() { start.offset() } else { 0 };
            let to = if index == end.index() { end.offset() } else { para.len() };
            if from == 0 {
                out.push(StyledSegment::ParagraphAttributes(para.attributes().clone()));
                if let Some(region) = para.region() {
                    out.push(StyledSegment::Region(region.clone()));
                }
            }
            for (text, attrs) in para.spans(from..to) {
                out.push(StyledSegment::styled(text, attrs));
            }
        }
        out
    }

    /// Remove `[start, end)`, joining the boundary paragraphs. The joined
    /// paragraph keeps the attributes of the first one.
    fn remove_range(&mut self, start: TextPos, end: TextPos) {
        if start.index() == end.index() {
            self.paragraphs[start.index()].delete(start.offset()..end.offset());
            return;
        }

        let mut removed: Vec<Paragraph> = self.paragraphs.drain(start.index() + 1..=end.index()).collect();
        let Some(mut last) = removed.pop() else {
            return;
        };
        let last_region = last.region().cloned();
        let tail = last.split_off(end.offset());

        let first = &mut self.paragraphs[start.index()];
        let first_len = first.len();
        first.delete(start.offset()..first_len);
        if start.offset() == 0 {
            first.set_region(if end.offset() == 0 { last_region } else { None });
        }
        first.append(tail);
    }

    /// Insert segments at `at`, relocate markers across the edit of the
    /// original range `[at, end)`, and return the position after the
    /// inserted content.
    fn insert_and_track(
        &mut self,
        at: TextPos,
        end: TextPos,
        segments: &[StyledSegment],
    ) -> (TextPos, InsertExtent) {
        let (inserted_end, extent) = self.insert_segments(at, segments);
        for pos in self.markers.values_mut() {
            *pos = relocate(*pos, at, end, extent);
        }
        (inserted_end, extent)
    }

    fn insert_segments(&mut self, at: TextPos, segments: &[StyledSegment]) -> (TextPos, InsertExtent) {
        let mut index = at.index();
        let mut offset = at.offset();
        let tail = self.paragraphs[index].split_off(offset);
        let mut lines_added = 0;

        for segment in segments {
            match segment {
                StyledSegment::Text { text, attrs } => {
                    let attrs = attrs.character_attributes();
                    for (n, line) in text.split('\n').enumerate() {
                        if n > 0 {
                            self.break_paragraph(&mut index, &mut offset);
                            lines_added += 1;
                        }
                        let line: String = line.chars().filter(|&c| c != '\r').collect();
                        self.paragraphs[index].insert(offset, &line, &attrs);
                        offset += line.chars().count();
                    }
                }
                StyledSegment::LineBreak => {
                    self.break_paragraph(&mut index, &mut offset);
                    lines_added += 1;
                }
                StyledSegment::ParagraphAttributes(attrs) => {
                    self.paragraphs[index].set_attributes(attrs.paragraph_attributes().normalized());
                }
                StyledSegment::Region(region) => {
                    self.paragraphs[index].set_region(Some(region.clone()));
                }
            }
        }

        let extent = if lines_added == 0 {
            InsertExtent {
                chars_top: offset - at.offset(),
                lines_added: 0,
                chars_bottom: 0,
            }
        } else {
            InsertExtent {
                chars_top: self.paragraphs[at.index()].len() - at.offset(),
                lines_added,
                chars_bottom: offset,
            }
        };
        self.paragraphs[index].append(tail);
        (TextPos::leading(index, offset), extent)
    }

    fn break_paragraph(&mut self, index: &mut usize, offset: &mut usize) {
        let mut next = Paragraph::new();
        next.set_attributes(self.paragraphs[*index].attributes().clone());
        *index += 1;
        *offset = 0;
        self.paragraphs.insert(*index, next);
    }

    fn emit_edit(&self, start: TextPos, end: TextPos, extent: InsertExtent) {
        self.content_changed.emit(ContentChange {
            kind: ChangeKind::Edit,
            start,
            end,
            chars_added_top: extent.chars_top,
            lines_added: extent.lines_added,
            chars_added_bottom: extent.chars_bottom,
        });
    }

    fn emit_style(&self, first: usize, last: usize) {
        self.content_changed.emit(ContentChange {
            kind: ChangeKind::Style,
            start: TextPos::leading(first, 0),
            end: self.paragraph_end(last),
            chars_added_top: 0,
            lines_added: 0,
            chars_added_bottom: 0,
        });
    }
}

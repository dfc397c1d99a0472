//! The rich text controller.
//!
//! [`RichTextArea`] ties a [`StyledTextModel`], its [`SelectionModel`] and a
//! [`VFlow`] together and implements the editing and navigation commands on
//! top of them. Everything runs on the owning thread:
//!
//! - model edits queue their [`ContentChange`]s, which are handed to the
//!   flow and the selection before the next command or layout pass;
//! - [`tick`](RichTextArea::tick) drives the caret blink and auto-scroll
//!   timers and collects background search results;
//! - [`reconcile`](RichTextArea::reconcile) runs at most one layout pass.
//!
//! ```
//! use horizon_richtext::{EditorConfig, EditorContext, RichTextArea, StyledTextModel, TextPos};
//!
//! let context = EditorContext::new(EditorConfig::default()).unwrap();
//! let mut area = RichTextArea::with_model(context, StyledTextModel::with_text("hello"));
//! area.select_caret(TextPos::leading(0, 5));
//! area.type_text(", world").unwrap();
//! assert_eq!(area.plain_text(0), "hello, world");
//! ```

mod editing;
mod navigation;
mod timers;

use std::sync::Arc;
use std::time::{Duration, Instant};

use horizon_richtext_core::logging::targets;
use horizon_richtext_core::{ConnectionId, TimerId};
use parking_lot::Mutex;

use crate::context::EditorContext;
use crate::error::{Result, RichTextError};
use crate::format::DataFormat;
use crate::layout::{Insets, SideDecorator, VFlow};
use crate::model::{ContentChange, StyleAttributeMap, StyledInput, StyledTextModel, TextPos};
use crate::search::{BackgroundSearch, FindOptions, SearchMatch, SearchQuery, snapshot};
use crate::selection::{SelectionModel, SelectionSegment};

pub use navigation::{next_character, next_word_end, next_word_start, previous_word, word_at};

use timers::AutoScroll;

/// A virtualized rich text editor.
pub struct RichTextArea {
    context: EditorContext,
    model: Option<StyledTextModel>,
    connection: Option<ConnectionId>,
    changes: Arc<Mutex<Vec<ContentChange>>>,
    selection: SelectionModel,
    flow: VFlow,
    editable: bool,
    use_content_height: bool,
    left_decorator: Option<Arc<dyn SideDecorator>>,
    right_decorator: Option<Arc<dyn SideDecorator>>,
    /// Horizontal position kept across vertical moves.
    phantom_x: Option<f64>,
    blink: Option<TimerId>,
    blink_period: Duration,
    auto_scroll: Option<AutoScroll>,
    search: BackgroundSearch,
    search_results: Option<Vec<SearchMatch>>,
    now: Instant,
    disposed: bool,
}

impl std::fmt::Debug for RichTextArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RichTextArea")
            .field("paragraphs", &self.paragraph_count())
            .field("selection", &self.selection.segment())
            .field("editable", &self.editable)
            .field("origin", &self.flow.origin())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(RichTextArea: Send, Sync);

impl RichTextArea {
    /// An editor without a model.
    pub fn new(context: EditorContext) -> Self {
        let config = context.config();
        let flow = VFlow::new(
            config,
            Arc::clone(context.layout_engine()),
            Arc::clone(context.style_resolver()),
        );
        let blink_period = config.caret_blink_period();
        let use_content_height = config.use_content_height;
        Self {
            context,
            model: None,
            connection: None,
            changes: Arc::new(Mutex::new(Vec::new())),
            selection: SelectionModel::new(),
            flow,
            editable: true,
            use_content_height,
            left_decorator: None,
            right_decorator: None,
            phantom_x: None,
            blink: None,
            blink_period,
            auto_scroll: None,
            search: BackgroundSearch::new(),
            search_results: None,
            now: Instant::now(),
            disposed: false,
        }
    }

    /// An editor showing `model`.
    pub fn with_model(context: EditorContext, model: StyledTextModel) -> Self {
        let mut area = Self::new(context);
        area.set_model(Some(model));
        area
    }

    pub fn context(&self) -> &EditorContext {
        &self.context
    }

    pub fn flow(&self) -> &VFlow {
        &self.flow
    }

    /// Direct access to the layout, for scrolling.
    pub fn flow_mut(&mut self) -> &mut VFlow {
        &mut self.flow
    }

    pub fn selection_model(&self) -> &SelectionModel {
        &self.selection
    }

    // Model

    /// Replace the model and return the previous one. The selection is
    /// cleared and the view scrolls back to the top.
    pub fn set_model(&mut self, model: Option<StyledTextModel>) -> Option<StyledTextModel> {
        let mut old = std::mem::replace(&mut self.model, model);
        if let (Some(old), Some(id)) = (old.as_ref(), self.connection.take()) {
            old.content_changed().disconnect(id);
        }
        match old.as_mut() {
            Some(old) => self.selection.clear(old),
            None => self.selection.reset(),
        }
        self.changes.lock().clear();
        self.search.cancel();
        self.search_results = None;
        self.phantom_x = None;

        let config = self.context.config();
        if let Some(model) = self.model.as_mut() {
            model.set_undo_limit(config.undo_limit);
            model.set_coalesce_typing(config.coalesce_typing);
            let queue = Arc::clone(&self.changes);
            self.connection = Some(
                model
                    .content_changed()
                    .connect(move |change: &ContentChange| queue.lock().push(*change)),
            );
        }
        self.flow.invalidate_cells();
        self.flow.set_origin(crate::layout::Origin::ZERO);
        self.stop_blink();
        tracing::debug!(target: targets::AREA, paragraphs = self.paragraph_count(), "model set");
        old
    }

    pub fn model(&self) -> Option<&StyledTextModel> {
        self.model.as_ref()
    }

    /// Mutable access to the model. Edits made through it are picked up by
    /// the next command or [`reconcile`](Self::reconcile).
    pub fn model_mut(&mut self) -> Option<&mut StyledTextModel> {
        self.model.as_mut()
    }

    /// Whether the editing commands may change the document. The model's
    /// own writability applies on top of this.
    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    fn require_model(&mut self) -> Result<&mut StyledTextModel> {
        self.model.as_mut().ok_or(RichTextError::NoModel)
    }

    // Text

    /// Append content at the end of the document, with undo.
    pub fn append_text(&mut self, input: impl Into<StyledInput>) -> Result<TextPos> {
        let end = self.document_end();
        self.insert_text(end, input)
    }

    /// Insert content at `pos`, with undo.
    pub fn insert_text(&mut self, pos: TextPos, input: impl Into<StyledInput>) -> Result<TextPos> {
        self.replace_text(pos, pos, input, true)
    }

    /// Replace `[start, end)` with `input`. Returns the position after the
    /// inserted content.
    pub fn replace_text(
        &mut self,
        start: TextPos,
        end: TextPos,
        input: impl Into<StyledInput>,
        allow_undo: bool,
    ) -> Result<TextPos> {
        let pos = self.require_model()?.replace(start, end, input, allow_undo)?;
        self.sync();
        Ok(pos)
    }

    /// Merge `attrs` over the styling of `[start, end)`.
    pub fn apply_style(&mut self, start: TextPos, end: TextPos, attrs: &StyleAttributeMap) -> Result<()> {
        self.require_model()?.apply_style(start, end, attrs, true)?;
        self.sync();
        Ok(())
    }

    /// Replace the styling of `[start, end)` with `attrs`.
    pub fn set_style(&mut self, start: TextPos, end: TextPos, attrs: &StyleAttributeMap) -> Result<()> {
        self.require_model()?.apply_style(start, end, attrs, false)?;
        self.sync();
        Ok(())
    }

    /// Replace the paragraph attributes of every paragraph `[start, end)`
    /// touches. Character attributes in `attrs` are ignored; an `attrs`
    /// without paragraph attributes changes nothing.
    pub fn set_paragraph_attributes(&mut self, start: TextPos, end: TextPos, attrs: &StyleAttributeMap) -> Result<()> {
        let attrs = attrs.paragraph_attributes();
        if attrs.is_empty() {
            return Ok(());
        }
        self.require_model()?.set_paragraph_attributes(start, end, &attrs)?;
        self.sync();
        Ok(())
    }

    /// Delete the whole document, with undo.
    pub fn clear(&mut self) -> Result<()> {
        let end = self.document_end();
        self.replace_text(TextPos::ZERO, end, StyledInput::empty(), true)?;
        Ok(())
    }

    /// Plain text of a paragraph, `""` without a model.
    pub fn plain_text(&self, index: usize) -> &str {
        self.model.as_ref().map_or("", |m| m.plain_text(index))
    }

    /// The whole document, paragraphs joined with `\n`.
    pub fn text(&self) -> String {
        self.model
            .as_ref()
            .map(|m| m.text_range(TextPos::ZERO, m.document_end()))
            .unwrap_or_default()
    }

    pub fn document_end(&self) -> TextPos {
        self.model.as_ref().map_or(TextPos::ZERO, StyledTextModel::document_end)
    }

    pub fn paragraph_end(&self, index: usize) -> TextPos {
        self.model.as_ref().map_or(TextPos::ZERO, |m| m.paragraph_end(index))
    }

    /// Number of paragraphs, zero without a model.
    pub fn paragraph_count(&self) -> usize {
        self.model.as_ref().map_or(0, StyledTextModel::paragraph_count)
    }

    /// Attributes in effect at the selection: those of the first selected
    /// character, or of the character before the caret, combined with the
    /// paragraph attributes and resolved against the base style.
    pub fn active_style_attributes(&self) -> StyleAttributeMap {
        let (Some(model), Some(segment)) = (self.model.as_ref(), self.selection.segment()) else {
            return StyleAttributeMap::new();
        };
        let pos = if segment.is_collapsed() {
            let caret = segment.caret();
            TextPos::leading(caret.index(), caret.offset().saturating_sub(1))
        } else {
            let min = segment.min();
            TextPos::leading(min.index(), min.offset())
        };
        self.context.style_resolver().resolve_styles(&model.attributes_at(pos))
    }

    // History

    /// Undo the last edit and select the restored range. Returns whether
    /// anything was undone.
    pub fn undo(&mut self) -> Result<bool> {
        let range = match self.model.as_mut() {
            Some(model) => model.undo()?,
            None => return Ok(false),
        };
        self.sync();
        match range {
            Some((start, end)) => {
                self.select(start, end);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Redo the last undone edit and select the re-applied range.
    pub fn redo(&mut self) -> Result<bool> {
        let range = match self.model.as_mut() {
            Some(model) => model.redo()?,
            None => return Ok(false),
        };
        self.sync();
        match range {
            Some((start, end)) => {
                self.select(start, end);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn is_undoable(&self) -> bool {
        self.model.as_ref().is_some_and(StyledTextModel::can_undo)
    }

    pub fn is_redoable(&self) -> bool {
        self.model.as_ref().is_some_and(StyledTextModel::can_redo)
    }

    pub fn clear_undo_redo(&mut self) {
        if let Some(model) = self.model.as_mut() {
            model.clear_undo_redo();
        }
    }

    // Selection

    /// Select from `anchor` to `caret`. Does nothing without a model.
    pub fn select(&mut self, anchor: TextPos, caret: TextPos) {
        self.sync();
        let Some(model) = self.model.as_mut() else {
            return;
        };
        self.selection.set_selection(model, anchor, caret);
        self.on_selection_changed();
    }

    /// Place the caret at `pos`, clearing any selection.
    pub fn select_caret(&mut self, pos: TextPos) {
        self.select(pos, pos);
    }

    /// Move the caret to `pos`, keeping the far end of the selection.
    pub fn extend_selection(&mut self, pos: TextPos) {
        self.sync();
        let Some(model) = self.model.as_mut() else {
            return;
        };
        self.selection.extend_selection(model, pos);
        self.on_selection_changed();
    }

    pub fn clear_selection(&mut self) {
        match self.model.as_mut() {
            Some(model) => self.selection.clear(model),
            None => self.selection.reset(),
        }
        self.on_selection_changed();
    }

    pub fn caret_position(&self) -> Option<TextPos> {
        self.selection.caret()
    }

    pub fn anchor_position(&self) -> Option<TextPos> {
        self.selection.anchor()
    }

    pub fn selection(&self) -> Option<SelectionSegment> {
        self.selection.segment()
    }

    /// Whether the anchor and caret are at different insertion indices.
    pub fn has_non_empty_selection(&self) -> bool {
        match (self.selection.caret(), self.selection.anchor()) {
            (Some(caret), Some(anchor)) => !caret.is_same_insertion_index(&anchor),
            _ => false,
        }
    }

    fn move_caret(&mut self, pos: TextPos, extend: bool) {
        if extend {
            self.extend_selection(pos);
        } else {
            self.select(pos, pos);
        }
    }

    fn clear_phantom_x(&mut self) {
        self.phantom_x = None;
    }

    fn on_selection_changed(&mut self) {
        self.restart_blink();
        let (Some(model), Some(caret)) = (self.model.as_ref(), self.selection.caret()) else {
            return;
        };
        if self.flow.height() > 0.0 {
            self.flow.scroll_caret_to_visible(model, caret);
        }
    }

    /// Hand queued model changes to the flow and re-read the selection
    /// markers. Returns whether the selection moved.
    fn sync(&mut self) -> bool {
        let changes = std::mem::take(&mut *self.changes.lock());
        for change in &changes {
            self.flow.on_content_change(change);
        }
        match self.model.as_ref() {
            Some(model) if !changes.is_empty() => self.selection.refresh(model),
            _ => false,
        }
    }

    // View

    /// Resize the viewport, including gutters and scroll bars.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.flow.set_size(width, height);
    }

    pub fn set_wrap_text(&mut self, wrap: bool) {
        self.flow.set_wrap_text(wrap);
    }

    pub fn set_content_padding(&mut self, padding: Insets) {
        self.flow.set_content_padding(padding);
    }

    /// Size to the content height. Turns auto-scroll off.
    pub fn set_use_content_height(&mut self, on: bool) {
        self.use_content_height = on;
        if on {
            self.stop_auto_scroll();
        }
        self.flow.set_use_content_height(on);
    }

    pub fn set_use_content_width(&mut self, on: bool) {
        self.flow.set_use_content_width(on);
    }

    pub fn set_highlight_current_paragraph(&mut self, on: bool) {
        self.flow.set_highlight_current_paragraph(on);
    }

    pub fn set_display_caret(&mut self, on: bool) {
        self.flow.set_display_caret(on);
    }

    pub fn set_left_decorator(&mut self, decorator: Option<Arc<dyn SideDecorator>>) {
        self.left_decorator = decorator;
        self.flow
            .set_decorators(self.left_decorator.clone(), self.right_decorator.clone());
    }

    pub fn set_right_decorator(&mut self, decorator: Option<Arc<dyn SideDecorator>>) {
        self.right_decorator = decorator;
        self.flow
            .set_decorators(self.left_decorator.clone(), self.right_decorator.clone());
    }

    /// Text position under a point in viewport coordinates.
    pub fn text_pos_at(&self, x: f64, y: f64) -> Option<TextPos> {
        self.flow.text_pos_at(x, y)
    }

    /// Run one layout pass if anything changed since the last one.
    pub fn reconcile(&mut self) -> bool {
        self.sync();
        self.flow.reconcile(self.model.as_ref(), self.selection.segment())
    }

    // Data formats

    /// Serialize the whole document.
    pub fn export(&self, format: DataFormat) -> Result<String> {
        let model = self.model.as_ref().ok_or(RichTextError::NoModel)?;
        self.context
            .formats()
            .export(format, model, TextPos::ZERO, model.document_end())
    }

    /// Serialize `[start, end)`.
    pub fn export_range(&self, format: DataFormat, start: TextPos, end: TextPos) -> Result<String> {
        let model = self.model.as_ref().ok_or(RichTextError::NoModel)?;
        self.context.formats().export(format, model, start, end)
    }

    /// Replace the whole document with `text` in `format`. The undo history
    /// is cleared. A decode failure leaves the document untouched.
    pub fn import(&mut self, format: DataFormat, text: &str) -> Result<()> {
        let input = self.context.formats().import(format, text)?;
        let end = self.document_end();
        self.replace_text(TextPos::ZERO, end, input, false)?;
        self.select_caret(TextPos::ZERO);
        Ok(())
    }

    // Search

    /// Search the document in the background. A running search is
    /// cancelled. Returns the generation of the new search.
    pub fn start_search(&mut self, text: &str, options: &FindOptions) -> Result<u64> {
        let query = SearchQuery::new(text, options)?;
        let paragraphs = self.model.as_ref().map(snapshot).unwrap_or_default();
        self.search_results = None;
        self.search.start(self.context.worker(), paragraphs, query)
    }

    /// Matches of the latest search, once it has completed.
    pub fn poll_search(&mut self) -> Option<Vec<SearchMatch>> {
        if self.disposed {
            return None;
        }
        if let Some(matches) = self.search.poll(self.context.worker()) {
            return Some(matches);
        }
        self.search_results.take()
    }

    pub fn cancel_search(&mut self) {
        self.search.cancel();
        self.search_results = None;
    }

    pub fn is_search_pending(&self) -> bool {
        self.search.is_pending()
    }

    // Lifecycle

    /// Stop every timer and background task. Nothing fires afterwards.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.stop_blink();
        self.stop_auto_scroll();
        self.search.cancel();
        self.search_results = None;
        self.disposed = true;
        self.context.shutdown();
        if let (Some(model), Some(id)) = (self.model.as_ref(), self.connection.take()) {
            model.content_changed().disconnect(id);
        }
        tracing::debug!(target: targets::AREA, "rich text area disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for RichTextArea {
    fn drop(&mut self) {
        self.dispose();
    }
}

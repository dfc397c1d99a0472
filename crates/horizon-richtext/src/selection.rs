//! Selection state: an anchor and a caret tracked by model markers.

use horizon_richtext_core::Signal;
use horizon_richtext_core::logging::targets;

use crate::model::{Marker, ModelId, StyledTextModel, TextPos};

/// An immutable, normalized selection range.
///
/// `min <= max` always holds; the segment remembers which end the caret is
/// on, so [`anchor`](Self::anchor) and [`caret`](Self::caret) return the
/// values it was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionSegment {
    min: TextPos,
    max: TextPos,
    caret_at_min: bool,
}

impl SelectionSegment {
    pub fn new(anchor: TextPos, caret: TextPos) -> Self {
        if caret < anchor {
            Self {
                min: caret,
                max: anchor,
                caret_at_min: true,
            }
        } else {
            Self {
                min: anchor,
                max: caret,
                caret_at_min: false,
            }
        }
    }

    pub fn min(&self) -> TextPos {
        self.min
    }

    pub fn max(&self) -> TextPos {
        self.max
    }

    pub fn anchor(&self) -> TextPos {
        if self.caret_at_min { self.max } else { self.min }
    }

    pub fn caret(&self) -> TextPos {
        if self.caret_at_min { self.min } else { self.max }
    }

    /// Whether the caret is the smaller end.
    pub fn is_caret_at_min(&self) -> bool {
        self.caret_at_min
    }

    pub fn is_collapsed(&self) -> bool {
        self.min == self.max
    }
}

/// Selection of a single model.
///
/// The anchor and caret live as markers in the model, so they move with
/// edits. After an edit the owner calls [`refresh`](Self::refresh) to
/// re-read them. Every update publishes the anchor, then the caret, then the
/// segment, after all three have been stored.
#[derive(Debug, Default)]
pub struct SelectionModel {
    model_id: Option<ModelId>,
    anchor: Option<Marker>,
    caret: Option<Marker>,
    segment: Option<SelectionSegment>,
    anchor_changed: Signal<Option<TextPos>>,
    caret_changed: Signal<Option<TextPos>>,
    selection_changed: Signal<Option<SelectionSegment>>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchor_changed(&self) -> &Signal<Option<TextPos>> {
        &self.anchor_changed
    }

    pub fn caret_changed(&self) -> &Signal<Option<TextPos>> {
        &self.caret_changed
    }

    pub fn selection_changed(&self) -> &Signal<Option<SelectionSegment>> {
        &self.selection_changed
    }

    pub fn segment(&self) -> Option<SelectionSegment> {
        self.segment
    }

    pub fn anchor(&self) -> Option<TextPos> {
        self.segment.map(|s| s.anchor())
    }

    pub fn caret(&self) -> Option<TextPos> {
        self.segment.map(|s| s.caret())
    }

    /// The model the current selection belongs to.
    pub fn model_id(&self) -> Option<ModelId> {
        self.model_id
    }

    /// Select from `anchor` to `caret`, both clamped into the model.
    pub fn set_selection(&mut self, model: &mut StyledTextModel, anchor: TextPos, caret: TextPos) {
        let anchor = model.clamp(anchor);
        let caret = model.clamp(caret);

        if self.model_id == Some(model.id()) {
            for marker in [self.anchor.take(), self.caret.take()].into_iter().flatten() {
                model.release_marker(marker);
            }
        }
        self.model_id = Some(model.id());
        self.anchor = Some(model.get_marker(anchor));
        self.caret = Some(model.get_marker(caret));

        tracing::trace!(target: targets::SELECTION, %anchor, %caret, "set selection");
        self.publish(Some(SelectionSegment::new(anchor, caret)));
    }

    /// Move the caret to `pos`, keeping the far end of the current selection
    /// as the anchor.
    ///
    /// If `pos` lies before the selection the anchor becomes its end; if
    /// after, its start; otherwise the anchor is kept. A selection of a
    /// different model is replaced by a caret at `pos`.
    pub fn extend_selection(&mut self, model: &mut StyledTextModel, pos: TextPos) {
        if self.model_id != Some(model.id()) {
            self.set_selection(model, pos, pos);
            return;
        }
        self.refresh(model);
        let Some(segment) = self.segment else {
            self.set_selection(model, pos, pos);
            return;
        };

        let pos = model.clamp(pos);
        let anchor = if pos < segment.min() {
            segment.max()
        } else if pos > segment.max() {
            segment.min()
        } else {
            segment.anchor()
        };
        self.set_selection(model, anchor, pos);
    }

    /// Remove the selection and release its markers from `model`.
    pub fn clear(&mut self, model: &mut StyledTextModel) {
        if self.model_id == Some(model.id()) {
            for marker in [self.anchor.take(), self.caret.take()].into_iter().flatten() {
                model.release_marker(marker);
            }
        }
        self.reset();
    }

    /// Remove the selection without touching any model. Only for when the
    /// owning model is gone; its markers are dropped with it.
    pub fn reset(&mut self) {
        self.anchor = None;
        self.caret = None;
        self.model_id = None;
        self.publish(None);
    }

    /// Re-read the markers after an edit. Returns whether the selection
    /// moved.
    pub fn refresh(&mut self, model: &StyledTextModel) -> bool {
        if self.model_id != Some(model.id()) {
            return false;
        }
        let (Some(anchor), Some(caret)) = (self.anchor, self.caret) else {
            return false;
        };
        let (Some(anchor), Some(caret)) = (model.marker_position(anchor), model.marker_position(caret)) else {
            return false;
        };
        let segment = SelectionSegment::new(anchor, caret);
        if self.segment == Some(segment) {
            return false;
        }
        self.publish(Some(segment));
        true
    }

    fn publish(&mut self, segment: Option<SelectionSegment>) {
        let old = self.segment;
        self.segment = segment;

        let old_anchor = old.map(|s| s.anchor());
        let old_caret = old.map(|s| s.caret());
        let anchor = segment.map(|s| s.anchor());
        let caret = segment.map(|s| s.caret());

        if old_anchor != anchor {
            self.anchor_changed.emit(anchor);
        }
        if old_caret != caret {
            self.caret_changed.emit(caret);
        }
        if old != segment {
            self.selection_changed.emit(segment);
        }
    }
}

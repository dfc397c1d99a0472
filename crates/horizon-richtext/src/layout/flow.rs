//! The virtualized flow.
//!
//! [`VFlow`] owns the sliding window of realized cells, the scroll origin,
//! the horizontal offset, both scroll bars and the caret and selection
//! geometry. Changes only mark it dirty; [`VFlow::reconcile`] then runs a
//! single pass that recomputes what is stale.
//!
//! Coordinates used by the public API are viewport coordinates: the origin
//! is the top-left corner of the viewport, which sits to the right of the
//! left gutter. [`VFlow::paint`] emits control coordinates.

use std::sync::Arc;

use horizon_richtext_core::PerfSpan;
use horizon_richtext_core::logging::targets;

use super::arrangement::CellArrangement;
use super::cache::FastCache;
use super::cell::{CaretInfo, CellPainter, PathRole, TextCell};
use super::decorator::{SideColumn, SideDecorator, SideNode};
use super::geometry::{Insets, PathBuilder, PathElement, Point, Rect};
use super::invalidation::Invalidation;
use super::scroll::{Origin, ScrollBarState, from_scroll_bar_value, to_scroll_bar_value};
use super::selection_shape::{SelectionEdge, SelectionShape};
use super::text_layout::TextLayoutEngine;
use crate::config::EditorConfig;
use crate::model::{ContentChange, StyledTextModel, TextPos};
use crate::selection::SelectionSegment;
use crate::style::StyleResolver;

/// Scroll bar visibility can flip at most twice per bar.
const MAX_PASSES: usize = 4;

/// Stop realizing cells past this height when sizing to the content.
const MAX_HEIGHT_SAFEGUARD: f64 = 100_000.0;

/// The virtualized layout engine.
pub struct VFlow {
    engine: Arc<dyn TextLayoutEngine>,
    resolver: Arc<dyn StyleResolver>,

    window_extent: f64,
    horizontal_guard: f64,
    min_viewport_width: f64,
    layout_min_width: f64,
    scroll_bar_size: f64,
    unit_increment: f64,
    block_increment: f64,

    width: f64,
    height: f64,
    padding: Insets,
    wrap_text: bool,
    use_content_height: bool,
    use_content_width: bool,
    highlight_current_paragraph: bool,
    display_caret: bool,
    caret_visible: bool,

    left: Option<SideColumn>,
    right: Option<SideColumn>,
    side_cache_size: usize,

    origin: Origin,
    offset_x: f64,
    cache: FastCache<TextCell>,
    cache_wrap_width: Option<f64>,
    arrangement: CellArrangement,
    invalidation: Invalidation,
    paragraph_count: usize,
    selection: Option<SelectionSegment>,

    viewport_width: f64,
    viewport_height: f64,
    unwrapped_content_width: f64,
    vscroll: ScrollBarState,
    hscroll: ScrollBarState,

    caret_path: Vec<PathElement>,
    selection_path: Vec<PathElement>,
    current_line_highlight: Vec<PathElement>,
    layout_pass_count: u64,
}

impl VFlow {
    pub fn new(config: &EditorConfig, engine: Arc<dyn TextLayoutEngine>, resolver: Arc<dyn StyleResolver>) -> Self {
        let padding = config.content_padding;
        let mut invalidation = Invalidation::new();
        invalidation.request_layout();
        Self {
            engine,
            resolver,
            window_extent: config.effective_window_extent(),
            horizontal_guard: config.horizontal_guard,
            min_viewport_width: config.min_viewport_width,
            layout_min_width: config.layout_min_width,
            scroll_bar_size: config.scroll_bar_size,
            unit_increment: config.scroll_bar_unit_increment,
            block_increment: config.scroll_bar_block_increment,
            width: 0.0,
            height: 0.0,
            padding,
            wrap_text: config.wrap_text,
            use_content_height: config.use_content_height,
            use_content_width: config.use_content_width,
            highlight_current_paragraph: config.highlight_current_paragraph,
            display_caret: config.display_caret,
            caret_visible: true,
            left: None,
            right: None,
            side_cache_size: config.cell_cache_size,
            origin: Origin::new(0, -padding.top),
            offset_x: 0.0,
            cache: FastCache::new(config.cell_cache_size),
            cache_wrap_width: None,
            arrangement: CellArrangement::default(),
            invalidation,
            paragraph_count: 0,
            selection: None,
            viewport_width: 0.0,
            viewport_height: 0.0,
            unwrapped_content_width: 0.0,
            vscroll: ScrollBarState::default(),
            hscroll: ScrollBarState::default(),
            caret_path: Vec::new(),
            selection_path: Vec::new(),
            current_line_highlight: Vec::new(),
            layout_pass_count: 0,
        }
    }

    // Properties

    pub fn set_size(&mut self, width: f64, height: f64) {
        if width != self.width || height != self.height {
            self.width = width.max(0.0);
            self.height = height.max(0.0);
            self.invalidation.request_layout();
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn content_padding(&self) -> Insets {
        self.padding
    }

    pub fn set_content_padding(&mut self, padding: Insets) {
        if padding == self.padding {
            return;
        }
        let at_top = self.origin.index() == 0 && self.origin.offset() <= 0.0;
        self.padding = padding;
        if at_top {
            self.origin = Origin::new(0, -padding.top);
        }
        self.invalidation.invalidate_all();
    }

    pub fn is_wrap_text(&self) -> bool {
        self.wrap_text
    }

    pub fn set_wrap_text(&mut self, wrap: bool) {
        if wrap != self.wrap_text {
            self.wrap_text = wrap;
            self.offset_x = 0.0;
            self.invalidation.invalidate_all();
        }
    }

    pub fn set_use_content_height(&mut self, on: bool) {
        if on != self.use_content_height {
            self.use_content_height = on;
            if on {
                self.unwrapped_content_width = 0.0;
                self.origin = Origin::new(0, -self.padding.top);
                self.offset_x = 0.0;
            }
            self.invalidation.request_layout();
        }
    }

    pub fn set_use_content_width(&mut self, on: bool) {
        if on != self.use_content_width {
            self.use_content_width = on;
            if on {
                self.unwrapped_content_width = 0.0;
                self.origin = Origin::new(0, -self.padding.top);
                self.offset_x = 0.0;
            }
            // the effective wrap mode changes with this flag
            self.invalidation.invalidate_all();
        }
    }

    /// Install gutter decorators; either side may be absent.
    pub fn set_decorators(&mut self, left: Option<Arc<dyn SideDecorator>>, right: Option<Arc<dyn SideDecorator>>) {
        self.left = left.map(|d| SideColumn::new(d, self.side_cache_size));
        self.right = right.map(|d| SideColumn::new(d, self.side_cache_size));
        self.invalidation.invalidate_decorators();
    }

    pub fn set_highlight_current_paragraph(&mut self, on: bool) {
        if on != self.highlight_current_paragraph {
            self.highlight_current_paragraph = on;
            self.invalidation.invalidate_geometry();
        }
    }

    pub fn set_display_caret(&mut self, on: bool) {
        if on != self.display_caret {
            self.display_caret = on;
            self.invalidation.invalidate_geometry();
        }
    }

    /// Blink phase of the caret. Does not touch geometry.
    pub fn set_caret_visible(&mut self, on: bool) {
        self.caret_visible = on;
    }

    pub fn is_caret_visible(&self) -> bool {
        self.caret_visible
    }

    /// Mark the flow for a layout pass, keeping cached cells.
    pub fn request_layout(&mut self) {
        self.invalidation.request_layout();
    }

    /// Mark the flow for a layout pass from scratch.
    pub fn invalidate_cells(&mut self) {
        self.invalidation.invalidate_all();
        self.invalidation.invalidate_decorators();
    }

    /// Whether the next [`reconcile`](Self::reconcile) has work to do.
    pub fn needs_reconcile(&self) -> bool {
        !self.invalidation.is_clean()
    }

    // State

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Move the scroll origin. `(0, 0)` and any origin while sizing to the
    /// content height are normalized to `(0, -padding_top)`.
    pub fn set_origin(&mut self, origin: Origin) {
        let origin = if self.use_content_height || origin == Origin::ZERO {
            Origin::new(0, -self.padding.top)
        } else {
            origin
        };
        if origin != self.origin {
            self.origin = origin;
            self.invalidation.request_layout();
        }
    }

    pub fn offset_x(&self) -> f64 {
        self.offset_x
    }

    fn set_offset_x(&mut self, x: f64) {
        let x = if self.use_content_width || self.is_wrapping() {
            0.0
        } else {
            x.max(0.0)
        };
        if x != self.offset_x {
            self.offset_x = x;
            self.invalidation.request_layout();
        }
    }

    fn is_wrapping(&self) -> bool {
        self.wrap_text && !self.use_content_width
    }

    pub fn arrangement(&self) -> &CellArrangement {
        &self.arrangement
    }

    pub fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    pub fn left_side_width(&self) -> f64 {
        self.left.as_ref().map_or(0.0, SideColumn::width)
    }

    pub fn right_side_width(&self) -> f64 {
        self.right.as_ref().map_or(0.0, SideColumn::width)
    }

    /// The viewport in control coordinates.
    pub fn viewport_rect(&self) -> Rect {
        Rect::new(self.left_side_width(), 0.0, self.viewport_width, self.viewport_height)
    }

    /// Width of the widest laid out paragraph, or the viewport width when
    /// wrapping.
    pub fn unwrapped_content_width(&self) -> f64 {
        self.unwrapped_content_width
    }

    /// Scrollable content width, padding and guard included.
    pub fn content_width(&self) -> f64 {
        self.unwrapped_content_width + self.padding.horizontal() + self.horizontal_guard
    }

    pub fn vertical_scroll_bar(&self) -> ScrollBarState {
        self.vscroll
    }

    pub fn horizontal_scroll_bar(&self) -> ScrollBarState {
        self.hscroll
    }

    pub fn caret_path(&self) -> &[PathElement] {
        &self.caret_path
    }

    pub fn selection_path(&self) -> &[PathElement] {
        &self.selection_path
    }

    pub fn current_line_highlight(&self) -> &[PathElement] {
        &self.current_line_highlight
    }

    /// Number of reconcile passes that laid out cells.
    pub fn layout_pass_count(&self) -> u64 {
        self.layout_pass_count
    }

    pub fn cached_cell_count(&self) -> usize {
        self.cache.len()
    }

    /// Caret geometry in viewport coordinates, when the paragraph is
    /// realized.
    pub fn caret_info(&self, pos: TextPos) -> Option<CaretInfo> {
        self.arrangement.caret_info(pos)
    }

    /// Text position under a point in viewport coordinates.
    pub fn text_pos_at(&self, x: f64, y: f64) -> Option<TextPos> {
        self.arrangement.text_pos_at(x, y)
    }

    // Reconcile

    /// Run one pass over everything marked stale. Returns whether anything
    /// was recomputed. Calling it again without new changes does nothing.
    #[tracing::instrument(skip_all, target = "horizon_richtext::layout", level = "trace")]
    pub fn reconcile(&mut self, model: Option<&StyledTextModel>, selection: Option<SelectionSegment>) -> bool {
        let selection_changed = self.selection != selection;
        self.selection = selection;
        if self.invalidation.is_clean() && !selection_changed {
            return false;
        }

        let pending = self.invalidation.take();
        if pending.clear_cache {
            self.cache.clear();
        } else {
            for index in &pending.stale {
                self.cache.remove(*index);
            }
        }
        if pending.decorators {
            for column in [self.left.as_mut(), self.right.as_mut()].into_iter().flatten() {
                column.clear();
            }
        }

        if pending.layout {
            let _perf = PerfSpan::new("vflow.layout");
            self.layout_cells(model);
            if !self.use_content_height {
                let before = self.origin;
                self.check_for_excessive_whitespace_at_the_end();
                if self.origin != before {
                    self.layout_cells(model);
                }
            }
            self.update_vertical_scroll_bar();
            self.update_horizontal_scroll_bar();
            self.layout_pass_count += 1;
            tracing::debug!(
                target: targets::LAYOUT,
                origin = %self.origin,
                visible = self.arrangement.visible_cell_count(),
                cells = self.arrangement.cell_count(),
                cached = self.cache.len(),
                "layout pass"
            );
        }

        self.update_caret_and_selection();
        // scroll helpers above may have re-marked the layout they just did
        self.invalidation = Invalidation::new();
        true
    }

    fn layout_cells(&mut self, model: Option<&StyledTextModel>) {
        for _ in 0..MAX_PASSES {
            if !self.layout_pass(model) {
                break;
            }
        }
    }

    /// Rebuild the sliding window. Returns true when a scroll bar changed
    /// visibility and another pass is needed.
    fn layout_pass(&mut self, model: Option<&StyledTextModel>) -> bool {
        let pad = self.padding;
        let line_height = self.engine.line_height();
        let mut arrangement = CellArrangement::new(self.origin, pad.left - self.offset_x, pad.top, line_height);

        let model = match model {
            Some(model) if self.width > 0.0 => model,
            _ => {
                self.paragraph_count = model.map_or(0, StyledTextModel::paragraph_count);
                self.arrangement = arrangement;
                self.viewport_width = self.width;
                self.viewport_height = self.height;
                self.vscroll.visible = false;
                self.hscroll.visible = false;
                return false;
            }
        };
        let count = model.paragraph_count();
        self.paragraph_count = count;
        if self.origin.index() >= count {
            self.origin = Origin::new(count.saturating_sub(1), 0.0);
            arrangement = CellArrangement::new(self.origin, pad.left - self.offset_x, pad.top, line_height);
        }

        let engine = Arc::clone(&self.engine);
        let top_index = self.origin.index();
        let width = self.width;
        let left_w = match self.left.as_mut() {
            Some(column) => column.compute_width(width, top_index, engine.as_ref()),
            None => 0.0,
        };
        let right_w = match self.right.as_mut() {
            Some(column) => column.compute_width(width, top_index, engine.as_ref()),
            None => 0.0,
        };
        let sides = left_w + right_w;

        let wrap = self.is_wrapping();
        let vsb_w = if self.vscroll.visible { self.scroll_bar_size } else { 0.0 };
        let hsb_h = if self.hscroll.visible { self.scroll_bar_size } else { 0.0 };
        let wrap_width = wrap.then(|| (width - sides - pad.horizontal() - vsb_w).max(self.layout_min_width));
        if wrap_width != self.cache_wrap_width {
            self.cache.clear();
            self.cache_wrap_width = wrap_width;
        }

        let height = (self.height - hsb_h).max(0.0);
        let extent = self.window_extent;

        // visible part plus the bottom margin
        let mut y = -self.origin.offset();
        let mut laid_height = 0.0;
        let mut unwrapped: f64 = 0.0;
        let mut on_screen = true;
        let mut bottom_margin = 0;
        let mut shortfall = 0;
        let mut n = 0;
        let mut ix = self.origin.index();
        while ix < count {
            let Some(mut cell) = self.prepare_cell(model, ix, wrap_width) else {
                break;
            };
            cell.set_y(y);
            let h = cell.height();
            if !wrap && on_screen {
                unwrapped = unwrapped.max(cell.width());
            }
            y += h;
            laid_height += h;
            n += 1;
            ix += 1;
            arrangement.push_bottom(cell);

            if self.use_content_height {
                if y > MAX_HEIGHT_SAFEGUARD {
                    break;
                }
            } else if on_screen {
                if y > height {
                    arrangement.set_visible_cell_count(n);
                    on_screen = false;
                    bottom_margin = n + (extent * n as f64).ceil() as usize;
                    shortfall = (self.origin.index() + bottom_margin).saturating_sub(count);
                }
            } else if n > bottom_margin && (y - height) > extent * height {
                break;
            }
        }
        if on_screen {
            arrangement.set_visible_cell_count(n);
        }
        if ix == count {
            y += pad.bottom;
        }
        arrangement.set_bottom_height(y);
        arrangement.set_unwrapped_width(unwrapped);

        // top margin, walking up from the origin
        let visible = arrangement.visible_cell_count();
        let top_margin = (extent * visible as f64).ceil() as usize + shortfall;
        let mut y = -self.origin.offset();
        let mut top_cells = Vec::new();
        let mut i = self.origin.index();
        while i > 0 && !self.use_content_height {
            i -= 1;
            let Some(mut cell) = self.prepare_cell(model, i, wrap_width) else {
                break;
            };
            y -= cell.height();
            cell.set_y(y);
            top_cells.push(cell);
            if top_cells.len() > top_margin && -y > extent * height {
                break;
            }
        }
        arrangement.set_top_height(-y);
        arrangement.prepend_top(top_cells);

        // side nodes of the visible cells
        let visible_indices: Vec<usize> = arrangement.visible_cells().iter().map(TextCell::index).collect();
        let nodes = |column: Option<&mut SideColumn>| -> Vec<Option<SideNode>> {
            match column {
                Some(column) => visible_indices.iter().map(|&ix| column.node(ix)).collect(),
                None => Vec::new(),
            }
        };
        let left_nodes = nodes(self.left.as_mut());
        let right_nodes = nodes(self.right.as_mut());
        arrangement.set_side_nodes(left_nodes, right_nodes);

        self.viewport_width = if self.use_content_width {
            unwrapped + pad.horizontal()
        } else {
            (width - sides - vsb_w).max(self.min_viewport_width)
        };
        self.viewport_height = if self.use_content_height {
            arrangement.bottom_height().max(0.0)
        } else {
            height
        };
        self.unwrapped_content_width = if wrap {
            self.viewport_width
        } else {
            unwrapped.max(self.layout_min_width)
        };
        self.arrangement = arrangement;

        let vsb_visible =
            !self.use_content_height && (self.origin.index() > 0 || laid_height + pad.vertical() > self.viewport_height);
        if vsb_visible != self.vscroll.visible {
            self.vscroll.visible = vsb_visible;
            return true;
        }
        let hsb_visible =
            !(wrap || self.use_content_width) && unwrapped + pad.horizontal() > self.viewport_width;
        if hsb_visible != self.hscroll.visible {
            self.hscroll.visible = hsb_visible;
            return true;
        }
        false
    }

    /// A measured cell for paragraph `index`, from the cache when possible.
    fn prepare_cell(&mut self, model: &StyledTextModel, index: usize, wrap_width: Option<f64>) -> Option<TextCell> {
        if let Some(cell) = self.cache.get(index) {
            return Some(cell.clone());
        }
        let paragraph = model.paragraph(index)?;
        let attrs = self.resolver.resolve_styles(paragraph.attributes());
        let cell = TextCell::build(index, paragraph, &attrs, self.engine.as_ref(), wrap_width);
        self.cache.put(index, cell.clone());
        Some(cell)
    }

    fn check_for_excessive_whitespace_at_the_end(&mut self) {
        let delta = self.arrangement.bottom_height() - self.viewport_height;
        if delta < 0.0 {
            if self.origin.index() == 0 && self.origin.offset() <= -self.padding.top {
                return;
            }
            self.scroll_vertical_pixels(delta);
        }
    }

    // Scroll bars

    fn update_vertical_scroll_bar(&mut self) {
        let count = self.paragraph_count;
        let max = self.arrangement.estimated_max(count);
        if count == 0 || max <= 0.0 {
            self.vscroll.visible_amount = 1.0;
            self.vscroll.value = 0.0;
            return;
        }
        let h = self.viewport_height;
        let offset = self.arrangement.estimated_offset();
        self.vscroll.visible_amount = (h / max).min(1.0);
        self.vscroll.value = to_scroll_bar_value(offset, h, max).clamp(0.0, 1.0);
    }

    fn update_horizontal_scroll_bar(&mut self) {
        if self.is_wrapping() {
            self.hscroll.visible_amount = 1.0;
            self.hscroll.value = 0.0;
            return;
        }
        let max = self.content_width();
        let w = self.viewport_width;
        self.hscroll.visible_amount = if max > 0.0 { (w / max).min(1.0) } else { 1.0 };
        self.hscroll.value = to_scroll_bar_value(self.offset_x, w, max).clamp(0.0, 1.0);
    }

    /// The user dragged the vertical scroll bar to `value` in `[0, 1]`.
    ///
    /// Heights of unrealized paragraphs are unknown, so the origin is first
    /// placed by index and then corrected by the pixel error of the
    /// estimated position.
    pub fn handle_vertical_scroll(&mut self, model: &StyledTextModel, value: f64) {
        let count = model.paragraph_count();
        if count == 0 || self.use_content_height {
            return;
        }
        let pos = value.clamp(0.0, 1.0);
        let ix = (pos * (count - 1) as f64).round() as usize;
        self.set_origin(Origin::new(ix, 0.0));
        self.layout_cells(Some(model));

        let total = (self.arrangement.estimated_max(count) - self.viewport_height).max(0.0);
        if total > 0.0 {
            let estimated = self.arrangement.estimated_offset() / total;
            self.scroll_vertical_pixels((pos - estimated) * total);
        }
        self.invalidation.request_layout();
    }

    /// The user dragged the horizontal scroll bar to `value` in `[0, 1]`.
    pub fn handle_horizontal_scroll(&mut self, value: f64) {
        if self.is_wrapping() {
            return;
        }
        let off = from_scroll_bar_value(value.clamp(0.0, 1.0), self.viewport_width, self.content_width());
        self.set_offset_x(off);
    }

    // Scrolling

    /// Scroll by `delta` pixels, positive down.
    pub fn scroll_vertical_pixels(&mut self, delta: f64) {
        if self.paragraph_count == 0 || self.use_content_height {
            return;
        }
        let origin = self.arrangement.move_origin(delta, self.paragraph_count);
        self.set_origin(origin);
    }

    /// Scroll by a fraction of the viewport height.
    pub fn scroll_vertical_fraction(&mut self, fraction: f64) {
        self.scroll_vertical_pixels(self.viewport_height * fraction);
    }

    pub fn page_up(&mut self) {
        self.scroll_vertical_pixels(-self.viewport_height);
    }

    pub fn page_down(&mut self) {
        self.scroll_vertical_pixels(self.viewport_height);
    }

    /// One scroll bar unit up or down.
    pub fn unit_increment(&mut self, down: bool) {
        let f = if down { self.unit_increment } else { -self.unit_increment };
        self.scroll_vertical_fraction(f);
    }

    /// One scroll bar block up or down.
    pub fn block_increment(&mut self, down: bool) {
        let f = if down { self.block_increment } else { -self.block_increment };
        self.scroll_vertical_fraction(f);
    }

    /// Scroll horizontally by `delta` pixels, without going past the content.
    pub fn scroll_horizontal_pixels(&mut self, delta: f64) {
        let mut x = self.offset_x + delta;
        let max = self.content_width();
        if x + self.viewport_width > max {
            x = max - self.viewport_width;
        }
        self.set_offset_x(x);
    }

    /// Scroll horizontally by a fraction of the content width.
    pub fn scroll_horizontal_fraction(&mut self, fraction: f64) {
        let w = self.unwrapped_content_width + self.padding.horizontal();
        self.scroll_horizontal_pixels(w * fraction);
    }

    fn scroll_horizontal_to_visible(&mut self, x: f64) {
        if self.is_wrapping() {
            return;
        }
        let off = if x < 0.0 {
            self.offset_x + x - self.horizontal_guard
        } else if x > self.viewport_width {
            self.offset_x + x + self.horizontal_guard - self.viewport_width
        } else {
            return;
        };
        self.set_offset_x(off);
    }

    /// Scroll so that a point in viewport coordinates becomes visible.
    pub fn scroll_to_visible(&mut self, x: f64, y: f64) {
        if y < 0.0 {
            self.scroll_vertical_pixels(y);
        } else if y >= self.viewport_height {
            self.scroll_vertical_pixels(y - self.viewport_height);
        }
        self.scroll_horizontal_to_visible(x);
    }

    /// Scroll so that the caret at `caret` is fully visible.
    pub fn scroll_caret_to_visible(&mut self, model: &StyledTextModel, caret: TextPos) {
        self.reconcile(Some(model), self.selection);
        let caret = model.clamp(caret);
        let vh = self.viewport_height;

        match self.arrangement.caret_info(caret) {
            None => {
                // not realized: jump there, then back off so the caret sits
                // at the bottom when moving down
                let move_down = caret.index() > self.origin.index();
                self.set_origin(Origin::new(caret.index(), 0.0));
                self.layout_cells(Some(model));
                if move_down {
                    if let Some(c) = self.arrangement.caret_info(caret) {
                        self.scroll_vertical_pixels(c.max_y - vh);
                        self.layout_cells(Some(model));
                    }
                }
                self.check_for_excessive_whitespace_at_the_end();
            }
            Some(c) => {
                if c.min_y < 0.0 {
                    self.scroll_vertical_pixels(c.min_y);
                } else if c.max_y > vh {
                    self.scroll_vertical_pixels(c.max_y - vh);
                }
            }
        }

        if !self.is_wrapping() {
            self.layout_cells(Some(model));
            if let Some(c) = self.arrangement.caret_info(caret) {
                let x = if c.min_x < 0.0 { c.min_x } else { c.max_x };
                self.scroll_horizontal_to_visible(x);
            }
        }
        self.invalidation.request_layout();
    }

    // Content changes

    /// React to a model change: adjust the origin and mark stale cells.
    pub fn on_content_change(&mut self, change: &ContentChange) {
        if change.is_edit() {
            if let Some(origin) = self.origin_after(change) {
                tracing::trace!(target: targets::LAYOUT, from = %self.origin, to = %origin, "origin moved by edit");
                self.origin = origin;
            }
        }
        if change.is_edit() && change.is_multi_paragraph() {
            self.invalidation.invalidate_all();
            self.invalidation.invalidate_decorators();
        } else {
            self.invalidation
                .invalidate_paragraphs(change.start.index()..=change.end.index());
        }
    }

    fn origin_after(&self, change: &ContentChange) -> Option<Origin> {
        let ix = self.origin.index();
        let (start, end) = (change.start.index(), change.end.index());
        if change.is_multi_paragraph() && start <= ix && ix <= end {
            return Some(if start == 0 {
                Origin::new(0, -self.padding.top)
            } else {
                Origin::new(start, 0.0)
            });
        }
        let delta = change.paragraph_delta();
        if end < ix && delta != 0 {
            let moved = (ix as isize + delta).max(0) as usize;
            return Some(Origin::new(moved, self.origin.offset()));
        }
        None
    }

    // Geometry

    /// Horizontal extent of full-width selection and highlight shapes.
    fn shape_extent(&self) -> (f64, f64) {
        let left = -self.offset_x;
        let right = if self.is_wrapping() {
            self.viewport_width
        } else {
            self.viewport_width.max(self.content_width())
        };
        (left, right - self.offset_x)
    }

    fn update_caret_and_selection(&mut self) {
        self.caret_path.clear();
        self.selection_path.clear();
        self.current_line_highlight.clear();
        let Some(segment) = self.selection else {
            return;
        };
        let caret = segment.caret();
        let (left, right) = self.shape_extent();

        if self.highlight_current_paragraph {
            if let Some(cell) = self.arrangement.visible_cell(caret.index()) {
                let mut builder = PathBuilder::new();
                builder.extend_translated(&cell.box_outline(left, right), 0.0, cell.y());
                self.current_line_highlight = builder.build();
            }
        }

        if !segment.is_collapsed() {
            self.selection_path = self.selection_shape(segment.min(), segment.max(), left, right);
        }

        if self.display_caret {
            if let Some(c) = self.arrangement.caret_info(caret) {
                self.caret_path = c.path;
            }
        }
    }

    fn range_rects(&self, index: usize, start: usize, end: Option<usize>) -> Option<(Vec<Rect>, bool)> {
        let cell = self.arrangement.visible_cell(index)?;
        let end = end.unwrap_or_else(|| cell.text_length());
        let dx = self.arrangement.content_x();
        let rects = cell
            .range_rects(start, end)
            .into_iter()
            .map(|r| r.translate(dx, cell.y()))
            .collect();
        Some((rects, !cell.is_rtl()))
    }

    fn selection_shape(&self, start: TextPos, end: TextPos, left: f64, right: f64) -> Vec<PathElement> {
        let top_index = self.origin.index();
        let visible = self.arrangement.visible_cell_count();
        if end.index() < top_index || start.index() >= top_index + visible {
            return Vec::new();
        }

        let shape = SelectionShape::new(left, right);
        let mut builder = PathBuilder::new();
        if start.index() == end.index() {
            if let Some((rects, _)) = self.range_rects(start.index(), start.offset(), Some(end.offset())) {
                shape.single(&mut builder, &rects);
            }
            return builder.build();
        }

        let top = self
            .range_rects(start.index(), start.offset(), None)
            .and_then(|(rects, ltr)| SelectionEdge::top(&rects, ltr))
            .unwrap_or(SelectionEdge {
                line: Rect::new(left, -1.0, right - left, 1.0),
                x: left,
                ltr: true,
            });
        let bottom = self
            .range_rects(end.index(), 0, Some(end.offset()))
            .and_then(|(rects, ltr)| SelectionEdge::bottom(&rects, ltr))
            .unwrap_or(SelectionEdge {
                line: Rect::new(left, self.viewport_height, right - left, 1.0),
                x: right,
                ltr: true,
            });
        shape.generate(&mut builder, top, bottom);
        builder.build()
    }

    // Navigation support

    /// Start or end of the visual line holding `pos`.
    pub fn move_horizontally(&self, start: bool, pos: TextPos) -> Option<TextPos> {
        let cell = self.arrangement.cell(pos.index())?;
        let off = cell.line_edge(pos.offset(), pos.is_leading(), !start);
        Some(if start || off == 0 || off == cell.text_length() {
            TextPos::leading(pos.index(), off)
        } else {
            TextPos::trailing(pos.index(), off)
        })
    }

    /// The position a vertical caret move lands on.
    ///
    /// `x` and `y` are the target point in viewport coordinates, just past
    /// the caret line in the direction of the move. Returns `None` when the
    /// target paragraph is not realized.
    pub fn move_vertically(
        &self,
        model: &StyledTextModel,
        caret_index: usize,
        x: f64,
        y: f64,
        down: bool,
    ) -> Option<TextPos> {
        let cell = self.arrangement.cell(caret_index)?;
        let inside = cell.is_inside_text(y - cell.y());
        let p = self.arrangement.text_pos_at(x, y)?;
        if inside {
            return Some(p);
        }

        let mut ix = p.index();
        if ix == caret_index {
            if down {
                ix += 1;
                if ix >= model.paragraph_count() {
                    return Some(model.document_end());
                }
            } else {
                if ix == 0 {
                    return Some(TextPos::ZERO);
                }
                ix -= 1;
            }
        }

        let cell = self.arrangement.cell(ix)?;
        let py = cell.find_hit_candidate(y - cell.y(), down);
        self.arrangement.text_pos_at(x, py + cell.y())
    }

    // Sizing

    /// Height that shows the whole content, when sizing to the content.
    pub fn pref_height(&self) -> Option<f64> {
        if !self.use_content_height {
            return None;
        }
        let mut h = self.arrangement.bottom_height().max(self.engine.line_height());
        if self.hscroll.visible {
            h += self.scroll_bar_size;
        }
        Some(h)
    }

    /// Width that shows the widest paragraph, when sizing to the content.
    pub fn pref_width(&self) -> Option<f64> {
        if !self.use_content_width {
            return None;
        }
        let mut w = self.content_width() + self.left_side_width() + self.right_side_width();
        if self.vscroll.visible {
            w += self.scroll_bar_size;
        }
        Some(w)
    }

    // Painting

    /// Paint gutters, highlights, cells and the caret in control
    /// coordinates.
    pub fn paint(&self, painter: &mut dyn CellPainter) {
        let dx = self.left_side_width();
        let shifted = |path: &[PathElement]| -> Vec<PathElement> { path.iter().map(|e| e.translate(dx, 0.0)).collect() };

        if !self.current_line_highlight.is_empty() {
            painter.draw_path(&shifted(&self.current_line_highlight), PathRole::CurrentLine);
        }
        if !self.selection_path.is_empty() {
            painter.draw_path(&shifted(&self.selection_path), PathRole::Selection);
        }

        let content_x = dx + self.arrangement.content_x();
        let right_x = dx + self.viewport_width;
        for (i, cell) in self.arrangement.visible_cells().iter().enumerate() {
            cell.paint(painter, content_x, cell.y(), self.unwrapped_content_width);
            if let Some(node) = self.arrangement.left_node(i) {
                painter.draw_text(Point::new(0.0, cell.y()), &node.text, &node.attrs);
            }
            if let Some(node) = self.arrangement.right_node(i) {
                painter.draw_text(Point::new(right_x, cell.y()), &node.text, &node.attrs);
            }
        }

        if self.caret_visible && !self.caret_path.is_empty() {
            painter.draw_path(&shifted(&self.caret_path), PathRole::Caret);
        }
    }
}

impl std::fmt::Debug for VFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VFlow")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("origin", &self.origin)
            .field("offset_x", &self.offset_x)
            .field("visible", &self.arrangement.visible_cell_count())
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LineNumberDecorator, MonospaceLayoutEngine, RecordingPainter, PaintOp};
    use crate::model::ChangeKind;
    use crate::style::DefaultStyleResolver;

    fn flow_with(config: EditorConfig) -> VFlow {
        let mut flow = VFlow::new(
            &config,
            Arc::new(MonospaceLayoutEngine::new(10.0, 20.0)),
            Arc::new(DefaultStyleResolver::default()),
        );
        flow.set_size(200.0, 100.0);
        flow
    }

    fn flow() -> VFlow {
        flow_with(EditorConfig::default())
    }

    fn lines(n: usize) -> StyledTextModel {
        let text: Vec<String> = (0..n).map(|i| format!("line {i}")).collect();
        StyledTextModel::with_text(&text.join("\n"))
    }

    fn caret(pos: TextPos) -> Option<SelectionSegment> {
        Some(SelectionSegment::new(pos, pos))
    }

    #[test]
    fn test_no_model_scroll_bar() {
        let mut flow = flow();
        assert!(flow.reconcile(None, None));
        let vsb = flow.vertical_scroll_bar();
        assert_eq!(vsb.visible_amount, 1.0);
        assert_eq!(vsb.value, 0.0);
        assert!(!vsb.visible);
    }

    #[test]
    fn test_content_fits() {
        let model = lines(3);
        let mut flow = flow();
        flow.reconcile(Some(&model), None);
        assert_eq!(flow.arrangement().visible_cell_count(), 3);
        assert!(!flow.vertical_scroll_bar().visible);
        assert_eq!(flow.vertical_scroll_bar().value, 0.0);
        assert_eq!(flow.viewport_width(), 200.0);
    }

    #[test]
    fn test_sliding_window() {
        let model = lines(1000);
        let mut flow = flow();
        flow.reconcile(Some(&model), None);

        let ar = flow.arrangement();
        assert_eq!(ar.visible_cell_count(), 6);
        assert_eq!(ar.top_count(), 0);
        assert_eq!(ar.bottom_count(), 19);
        assert_eq!(ar.average_height(), 20.0);
        assert_eq!(ar.estimated_max(1000), 20_000.0);
        assert!(flow.vertical_scroll_bar().visible);
        assert_eq!(flow.viewport_width(), 188.0);
        assert_eq!(flow.layout_pass_count(), 1);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let model = lines(50);
        let mut flow = flow();
        flow.reconcile(Some(&model), caret(TextPos::leading(2, 1)));
        let arrangement = flow.arrangement().clone();
        let vsb = flow.vertical_scroll_bar();
        let caret_path = flow.caret_path().to_vec();

        assert!(!flow.reconcile(Some(&model), caret(TextPos::leading(2, 1))));

        flow.request_layout();
        flow.request_layout();
        assert!(flow.reconcile(Some(&model), caret(TextPos::leading(2, 1))));
        assert_eq!(flow.arrangement(), &arrangement);
        assert_eq!(flow.vertical_scroll_bar(), vsb);
        assert_eq!(flow.caret_path(), caret_path.as_slice());
        assert_eq!(flow.layout_pass_count(), 2);
    }

    #[test]
    fn test_scroll_pixels_moves_origin() {
        let model = lines(1000);
        let mut flow = flow();
        flow.reconcile(Some(&model), None);
        flow.scroll_vertical_pixels(30.0);
        assert_eq!(flow.origin(), Origin::new(1, 10.0));

        flow.reconcile(Some(&model), None);
        flow.scroll_vertical_pixels(-100.0);
        assert_eq!(flow.origin(), Origin::new(0, 0.0));
    }

    #[test]
    fn test_trailing_whitespace_removed() {
        let model = lines(1000);
        let mut flow = flow();
        flow.reconcile(Some(&model), None);
        flow.scroll_vertical_pixels(1.0e6);
        flow.reconcile(Some(&model), None);
        assert_eq!(flow.origin(), Origin::new(995, 0.0));
        assert_eq!(flow.arrangement().bottom_height(), 100.0);
    }

    #[test]
    fn test_vertical_scroll_bar_drag_to_end() {
        let model = lines(1000);
        let mut flow = flow();
        flow.reconcile(Some(&model), None);
        flow.handle_vertical_scroll(&model, 1.0);
        flow.reconcile(Some(&model), None);
        assert_eq!(flow.origin(), Origin::new(995, 0.0));
        assert!((flow.vertical_scroll_bar().value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_edit_before_origin_shifts_it() {
        let model = lines(1000);
        let mut flow = flow();
        flow.reconcile(Some(&model), None);
        flow.scroll_vertical_pixels(200.0);
        assert_eq!(flow.origin(), Origin::new(10, 0.0));

        flow.on_content_change(&ContentChange {
            kind: ChangeKind::Edit,
            start: TextPos::leading(2, 0),
            end: TextPos::leading(2, 0),
            chars_added_top: 1,
            lines_added: 2,
            chars_added_bottom: 1,
        });
        assert_eq!(flow.origin(), Origin::new(12, 0.0));

        flow.on_content_change(&ContentChange {
            kind: ChangeKind::Edit,
            start: TextPos::leading(8, 3),
            end: TextPos::leading(14, 0),
            chars_added_top: 0,
            lines_added: 0,
            chars_added_bottom: 0,
        });
        assert_eq!(flow.origin(), Origin::new(8, 0.0));
    }

    #[test]
    fn test_single_paragraph_edit_evicts_only_that_cell() {
        let model = lines(3);
        let mut flow = flow();
        flow.reconcile(Some(&model), None);
        assert_eq!(flow.cached_cell_count(), 3);

        flow.on_content_change(&ContentChange {
            kind: ChangeKind::Edit,
            start: TextPos::leading(1, 0),
            end: TextPos::leading(1, 0),
            chars_added_top: 1,
            lines_added: 0,
            chars_added_bottom: 0,
        });
        assert!(flow.needs_reconcile());
        flow.reconcile(Some(&model), None);
        assert_eq!(flow.cached_cell_count(), 3);
    }

    #[test]
    fn test_caret_and_selection_paths() {
        let model = lines(3);
        let mut flow = flow();
        flow.reconcile(Some(&model), caret(TextPos::leading(1, 2)));
        assert_eq!(
            flow.caret_path(),
            &[
                PathElement::MoveTo(Point::new(20.0, 20.0)),
                PathElement::LineTo(Point::new(20.0, 40.0)),
            ]
        );
        assert!(flow.selection_path().is_empty());

        let segment = SelectionSegment::new(TextPos::leading(0, 2), TextPos::leading(2, 3));
        flow.reconcile(Some(&model), Some(segment));
        let bounds = crate::layout::path_bounds(flow.selection_path()).unwrap();
        assert_eq!(bounds.min_y(), 0.0);
        assert_eq!(bounds.max_y(), 60.0);
        assert_eq!(flow.caret_path()[0], PathElement::MoveTo(Point::new(30.0, 40.0)));
    }

    #[test]
    fn test_line_number_gutter() {
        let model = lines(3);
        let mut flow = flow();
        flow.set_decorators(Some(Arc::new(LineNumberDecorator::new())), None);
        flow.reconcile(Some(&model), None);
        assert_eq!(flow.left_side_width(), 40.0);
        assert_eq!(flow.viewport_width(), 160.0);

        let mut painter = RecordingPainter::new();
        flow.paint(&mut painter);
        let gutter: Vec<&str> = painter
            .ops()
            .iter()
            .filter_map(|op| match op {
                PaintOp::Text { origin, text, .. } if origin.x == 0.0 => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(gutter, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_use_content_height() {
        let model = lines(3);
        let mut flow = flow_with(EditorConfig {
            use_content_height: true,
            content_padding: Insets::new(5.0, 0.0, 5.0, 0.0),
            ..Default::default()
        });
        flow.reconcile(Some(&model), None);
        assert_eq!(flow.origin(), Origin::new(0, -5.0));
        assert_eq!(flow.pref_height(), Some(70.0));
        assert!(!flow.vertical_scroll_bar().visible);
        flow.scroll_vertical_pixels(20.0);
        assert_eq!(flow.origin(), Origin::new(0, -5.0));
    }

    #[test]
    fn test_horizontal_scroll() {
        let model = StyledTextModel::with_text(&"x".repeat(100));
        let mut flow = flow();
        flow.reconcile(Some(&model), None);
        assert!(flow.horizontal_scroll_bar().visible);
        assert_eq!(flow.viewport_height(), 88.0);

        flow.scroll_horizontal_pixels(50.0);
        assert_eq!(flow.offset_x(), 50.0);
        flow.scroll_horizontal_pixels(1.0e6);
        assert_eq!(flow.offset_x(), flow.content_width() - flow.viewport_width());
        flow.scroll_horizontal_pixels(-1.0e6);
        assert_eq!(flow.offset_x(), 0.0);
    }

    #[test]
    fn test_scroll_caret_into_view() {
        let model = lines(1000);
        let mut flow = flow();
        flow.reconcile(Some(&model), None);
        let target = TextPos::leading(500, 0);
        flow.scroll_caret_to_visible(&model, target);
        flow.reconcile(Some(&model), caret(target));
        let c = flow.caret_info(target).unwrap();
        assert!(c.min_y >= 0.0 && c.max_y <= flow.viewport_height());
    }

    #[test]
    fn test_move_vertically_between_paragraphs() {
        let model = lines(3);
        let mut flow = flow();
        flow.reconcile(Some(&model), None);
        let p = flow.move_vertically(&model, 0, 25.0, 20.5, true).unwrap();
        assert_eq!(p.index(), 1);
        let p = flow.move_vertically(&model, 2, 25.0, 60.5, true).unwrap();
        assert_eq!(p, model.document_end());
        let p = flow.move_vertically(&model, 0, 25.0, -0.5, false).unwrap();
        assert_eq!(p, TextPos::ZERO);
    }

    #[test]
    fn test_move_horizontally_to_line_edges() {
        let model = StyledTextModel::with_text("abcdef");
        let mut flow = flow_with(EditorConfig {
            wrap_text: true,
            ..Default::default()
        });
        flow.set_size(35.0, 100.0);
        flow.reconcile(Some(&model), None);
        assert_eq!(flow.move_horizontally(false, TextPos::leading(0, 1)), Some(TextPos::trailing(0, 3)));
        assert_eq!(flow.move_horizontally(true, TextPos::leading(0, 4)), Some(TextPos::leading(0, 3)));
        assert_eq!(flow.move_horizontally(false, TextPos::leading(0, 4)), Some(TextPos::leading(0, 6)));
    }
}

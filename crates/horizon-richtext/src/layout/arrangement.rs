//! The sliding window produced by one layout pass.

use super::cell::{CaretInfo, TextCell};
use super::decorator::SideNode;
use super::scroll::Origin;
use crate::model::TextPos;

/// Realized cells around the viewport.
///
/// Cells are stored in paragraph order. The cells from the origin down to
/// the bottom of the viewport are the visible ones; the rest form the top
/// and bottom margins, measured so that scrolling a little does not need a
/// new pass. All y values are in viewport coordinates: the origin cell sits
/// at `-origin.offset()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellArrangement {
    origin: Origin,
    cells: Vec<TextCell>,
    /// Number of cells above the origin.
    top_count: usize,
    top_height: f64,
    /// Number of cells from the origin down, visible ones included.
    bottom_count: usize,
    bottom_height: f64,
    visible_count: usize,
    unwrapped_width: f64,
    content_x: f64,
    pad_top: f64,
    fallback_height: f64,
    left_nodes: Vec<Option<SideNode>>,
    right_nodes: Vec<Option<SideNode>>,
}

impl CellArrangement {
    pub(crate) fn new(origin: Origin, content_x: f64, pad_top: f64, fallback_height: f64) -> Self {
        Self {
            origin,
            content_x,
            pad_top,
            fallback_height,
            ..Self::default()
        }
    }

    pub(crate) fn push_bottom(&mut self, cell: TextCell) {
        self.bottom_count += 1;
        self.cells.push(cell);
    }

    /// Prepend cells collected walking up from the origin, nearest first.
    pub(crate) fn prepend_top(&mut self, mut cells: Vec<TextCell>) {
        self.top_count = cells.len();
        cells.reverse();
        cells.append(&mut self.cells);
        self.cells = cells;
    }

    pub(crate) fn set_visible_cell_count(&mut self, count: usize) {
        self.visible_count = count;
    }

    pub(crate) fn set_bottom_height(&mut self, height: f64) {
        self.bottom_height = height;
    }

    pub(crate) fn set_top_height(&mut self, height: f64) {
        self.top_height = height;
    }

    pub(crate) fn set_unwrapped_width(&mut self, width: f64) {
        self.unwrapped_width = width;
    }

    pub(crate) fn set_side_nodes(&mut self, left: Vec<Option<SideNode>>, right: Vec<Option<SideNode>>) {
        self.left_nodes = left;
        self.right_nodes = right;
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn visible_cell_count(&self) -> usize {
        self.visible_count
    }

    pub fn top_count(&self) -> usize {
        self.top_count
    }

    /// Pixels realized above the viewport top.
    pub fn top_height(&self) -> f64 {
        self.top_height
    }

    pub fn bottom_count(&self) -> usize {
        self.bottom_count
    }

    /// y of the bottom of the last realized cell, plus the bottom padding
    /// when that cell is the last paragraph.
    pub fn bottom_height(&self) -> f64 {
        self.bottom_height
    }

    /// Widest visible cell, when not wrapping.
    pub fn unwrapped_width(&self) -> f64 {
        self.unwrapped_width
    }

    /// x of the content box in viewport coordinates.
    pub fn content_x(&self) -> f64 {
        self.content_x
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Index of the first realized paragraph.
    pub fn first_index(&self) -> usize {
        self.origin.index() - self.top_count.min(self.origin.index())
    }

    pub fn cells(&self) -> &[TextCell] {
        &self.cells
    }

    /// Cells from the origin to the bottom of the viewport.
    pub fn visible_cells(&self) -> &[TextCell] {
        let start = self.top_count.min(self.cells.len());
        let end = (start + self.visible_count).min(self.cells.len());
        &self.cells[start..end]
    }

    pub fn left_node(&self, visible_index: usize) -> Option<&SideNode> {
        self.left_nodes.get(visible_index).and_then(Option::as_ref)
    }

    pub fn right_node(&self, visible_index: usize) -> Option<&SideNode> {
        self.right_nodes.get(visible_index).and_then(Option::as_ref)
    }

    /// Mean height of the realized cells.
    pub fn average_height(&self) -> f64 {
        if self.cells.is_empty() {
            return self.fallback_height;
        }
        let total: f64 = self.cells.iter().map(TextCell::height).sum();
        total / self.cells.len() as f64
    }

    /// Estimated height of the whole document including padding.
    pub fn estimated_max(&self, paragraph_count: usize) -> f64 {
        let av = self.average_height();
        let below = paragraph_count.saturating_sub(self.origin.index() + self.bottom_count);
        self.pad_top
            + self.first_index() as f64 * av
            + self.top_height
            + self.bottom_height
            + below as f64 * av
    }

    /// Estimated distance from the document top to the viewport top.
    pub fn estimated_offset(&self) -> f64 {
        self.pad_top + self.first_index() as f64 * self.average_height() + self.top_height
    }

    /// Realized cell for paragraph `index`, margins included.
    pub fn cell(&self, index: usize) -> Option<&TextCell> {
        let first = self.first_index();
        let i = index.checked_sub(first)?;
        self.cells.get(i).filter(|c| c.index() == index)
    }

    /// Cell for paragraph `index` when it is on screen.
    pub fn visible_cell(&self, index: usize) -> Option<&TextCell> {
        let start = self.origin.index();
        if index < start || index >= start + self.visible_count {
            return None;
        }
        self.cell(index)
    }

    /// Caret geometry in viewport coordinates, or `None` when the paragraph
    /// is not realized.
    pub fn caret_info(&self, pos: TextPos) -> Option<CaretInfo> {
        let cell = self.cell(pos.index())?;
        Some(cell.caret_info_at(pos.offset(), pos.is_leading(), self.content_x))
    }

    /// Text position at a point in viewport coordinates. Points above or
    /// below the realized cells hit the first or last one.
    pub fn text_pos_at(&self, x: f64, y: f64) -> Option<TextPos> {
        let cell = self
            .cells
            .iter()
            .find(|c| y < c.bottom())
            .or_else(|| self.cells.last())?;
        let local_y = (y - cell.y()).clamp(0.0, (cell.height() - 0.5).max(0.0));
        let (offset, leading) = cell.text_pos_at(x - self.content_x, local_y);
        Some(if leading {
            TextPos::leading(cell.index(), offset)
        } else {
            TextPos::trailing(cell.index(), offset)
        })
    }

    /// Height of paragraph `index`, estimated when it is not realized.
    fn height_of(&self, index: usize) -> f64 {
        self.cell(index).map_or_else(|| self.average_height(), TextCell::height)
    }

    /// The origin after scrolling by `delta` pixels.
    ///
    /// Scrolling up stops at `(0, -pad_top)`. Scrolling down stops at the
    /// last paragraph; trailing whitespace is removed by the next pass.
    pub fn move_origin(&self, delta: f64, paragraph_count: usize) -> Origin {
        let mut ix = self.origin.index();
        let mut off = self.origin.offset() + delta;

        if off < 0.0 {
            while off < 0.0 && ix > 0 {
                ix -= 1;
                off += self.height_of(ix);
            }
            if ix == 0 {
                off = off.max(-self.pad_top);
            }
        } else {
            while ix + 1 < paragraph_count {
                let h = self.height_of(ix);
                if off < h {
                    break;
                }
                off -= h;
                ix += 1;
            }
        }
        Origin::new(ix, off)
    }
}

//! Renderable paragraph cells.
//!
//! A [`TextCell`] is the measured form of one paragraph. Its content is a
//! closed set of kinds ([`TextCellKind`]) that all answer the same
//! [`CellCapability`] questions, so the flow never needs to know what a cell
//! holds.

use super::geometry::{PathBuilder, PathElement, Point, Rect, Size};
use super::text_layout::{ParagraphLayout, TextLayoutEngine};
use crate::model::{Color, Paragraph, RegionSpec, StyleAttributeMap};

/// Receives the drawing commands of a cell.
pub trait CellPainter {
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn draw_text(&mut self, origin: Point, text: &str, attrs: &StyleAttributeMap);
    fn draw_region(&mut self, rect: Rect, kind: &str);
    fn draw_path(&mut self, path: &[PathElement], role: PathRole);
}

/// What a path drawn by the flow represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRole {
    Caret,
    Selection,
    CurrentLine,
}

/// A recorded drawing command.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintOp {
    FillRect(Rect, Color),
    Text {
        origin: Point,
        text: String,
        attrs: StyleAttributeMap,
    },
    Region(Rect, String),
    Path(Vec<PathElement>, PathRole),
}

/// A painter that stores every command, for tests and for replay.
#[derive(Debug, Clone, Default)]
pub struct RecordingPainter {
    ops: Vec<PaintOp>,
}

impl RecordingPainter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[PaintOp] {
        &self.ops
    }

    pub fn take(&mut self) -> Vec<PaintOp> {
        std::mem::take(&mut self.ops)
    }

    /// Concatenated text of every text command, in paint order.
    pub fn text(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PaintOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl CellPainter for RecordingPainter {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ops.push(PaintOp::FillRect(rect, color));
    }

    fn draw_text(&mut self, origin: Point, text: &str, attrs: &StyleAttributeMap) {
        self.ops.push(PaintOp::Text {
            origin,
            text: text.to_string(),
            attrs: attrs.clone(),
        });
    }

    fn draw_region(&mut self, rect: Rect, kind: &str) {
        self.ops.push(PaintOp::Region(rect, kind.to_string()));
    }

    fn draw_path(&mut self, path: &[PathElement], role: PathRole) {
        self.ops.push(PaintOp::Path(path.to_vec(), role));
    }
}

/// The operations every cell kind supports. Coordinates are relative to the
/// top-left corner of the content box.
pub trait CellCapability {
    /// Size of the content box.
    fn measure(&self) -> Size;

    /// Draw the content with its top-left corner at `origin`.
    fn paint(&self, painter: &mut dyn CellPainter, origin: Point);

    /// Char offset and leading flag nearest to `p`.
    fn hit_test(&self, p: Point) -> (usize, bool);
}

/// The content of a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum TextCellKind {
    /// Styled text broken into lines.
    PlainText {
        paragraph: Paragraph,
        layout: ParagraphLayout,
    },
    /// A non-text block with a fixed height.
    EmbeddedRegion { region: RegionSpec, width: f64 },
}

impl CellCapability for TextCellKind {
    fn measure(&self) -> Size {
        match self {
            TextCellKind::PlainText { layout, .. } => Size::new(layout.width(), layout.height()),
            TextCellKind::EmbeddedRegion { region, width } => Size::new(*width, region.height.max(0.0)),
        }
    }

    fn paint(&self, painter: &mut dyn CellPainter, origin: Point) {
        match self {
            TextCellKind::PlainText { paragraph, layout } => {
                for line in layout.lines() {
                    let mut offset = line.start;
                    for (text, attrs) in paragraph.spans(line.start..line.end) {
                        let x = line.x_at(offset).min(line.x_at(offset + text.chars().count()));
                        painter.draw_text(origin.translate(x, line.y), text, &attrs);
                        offset += text.chars().count();
                    }
                }
            }
            TextCellKind::EmbeddedRegion { region, .. } => {
                let size = self.measure();
                painter.draw_region(
                    Rect::new(origin.x, origin.y, size.width, size.height),
                    &region.kind,
                );
            }
        }
    }

    fn hit_test(&self, p: Point) -> (usize, bool) {
        match self {
            TextCellKind::PlainText { layout, .. } => layout.hit(p.x, p.y),
            TextCellKind::EmbeddedRegion { .. } => (0, true),
        }
    }
}

/// Caret geometry in flow coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct CaretInfo {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    /// Extra space below the caret line, zero on the last line.
    pub line_spacing: f64,
    pub path: Vec<PathElement>,
}

impl CaretInfo {
    pub fn mid_x(&self) -> f64 {
        (self.min_x + self.max_x) / 2.0
    }

    fn translate(mut self, dx: f64, dy: f64) -> Self {
        self.min_x += dx;
        self.max_x += dx;
        self.min_y += dy;
        self.max_y += dy;
        self.path = self.path.into_iter().map(|e| e.translate(dx, dy)).collect();
        self
    }
}

/// A measured paragraph.
///
/// Local coordinates have their origin at the top-left corner of the cell,
/// which includes the paragraph's space above and below.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCell {
    index: usize,
    kind: TextCellKind,
    space_above: f64,
    space_below: f64,
    y: f64,
    background: Option<Color>,
}

impl TextCell {
    /// Measure paragraph `index`. `attrs` are its resolved paragraph
    /// attributes.
    pub fn build(
        index: usize,
        paragraph: &Paragraph,
        attrs: &StyleAttributeMap,
        engine: &dyn TextLayoutEngine,
        wrap_width: Option<f64>,
    ) -> Self {
        let kind = match paragraph.region() {
            Some(region) => TextCellKind::EmbeddedRegion {
                region: region.clone(),
                width: wrap_width.unwrap_or(0.0),
            },
            None => TextCellKind::PlainText {
                paragraph: paragraph.clone(),
                layout: engine.layout(paragraph.text(), attrs, wrap_width),
            },
        };
        Self {
            index,
            kind,
            space_above: attrs.space_above().unwrap_or(0.0).max(0.0),
            space_below: attrs.space_below().unwrap_or(0.0).max(0.0),
            y: 0.0,
            background: attrs.paragraph_background(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> &TextCellKind {
        &self.kind
    }

    /// Top of the cell in flow coordinates, set by the arrangement.
    pub fn y(&self) -> f64 {
        self.y
    }

    pub(crate) fn set_y(&mut self, y: f64) {
        self.y = y;
    }

    pub fn height(&self) -> f64 {
        self.space_above + self.kind.measure().height + self.space_below
    }

    /// Width of the content without padding.
    pub fn width(&self) -> f64 {
        self.kind.measure().width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height()
    }

    pub fn background(&self) -> Option<Color> {
        self.background
    }

    /// Length of the paragraph text in chars, zero for regions.
    pub fn text_length(&self) -> usize {
        match &self.kind {
            TextCellKind::PlainText { paragraph, .. } => paragraph.len(),
            TextCellKind::EmbeddedRegion { .. } => 0,
        }
    }

    fn layout(&self) -> Option<&ParagraphLayout> {
        match &self.kind {
            TextCellKind::PlainText { layout, .. } => Some(layout),
            TextCellKind::EmbeddedRegion { .. } => None,
        }
    }

    /// Caret geometry for `offset`, in cell coordinates.
    pub fn caret_info(&self, offset: usize, leading: bool) -> CaretInfo {
        let (x, top, bottom, spacing) = match self.layout() {
            Some(layout) => {
                let ix = layout.line_index(offset, leading);
                let line = &layout.lines()[ix];
                let spacing = layout
                    .lines()
                    .get(ix + 1)
                    .map_or(0.0, |next| next.y - line.bottom());
                (line.x_at(offset), line.y, line.bottom(), spacing)
            }
            None => {
                let size = self.kind.measure();
                let x = if offset == 0 { 0.0 } else { size.width };
                (x, 0.0, size.height, 0.0)
            }
        };
        let top = top + self.space_above;
        let bottom = bottom + self.space_above;
        let mut path = PathBuilder::new();
        path.move_to(x, top).line_to(x, bottom);
        CaretInfo {
            min_x: x,
            max_x: x,
            min_y: top,
            max_y: bottom,
            line_spacing: spacing,
            path: path.build(),
        }
    }

    /// Caret geometry in flow coordinates, given the x of the content box.
    pub fn caret_info_at(&self, offset: usize, leading: bool, content_x: f64) -> CaretInfo {
        self.caret_info(offset, leading).translate(content_x, self.y)
    }

    /// Outline of `start..end`, one rectangle per line, in cell coordinates.
    pub fn range_shape(&self, start: usize, end: usize) -> Vec<PathElement> {
        let mut builder = PathBuilder::new();
        for rect in self.range_rects(start, end) {
            builder.add_rect(rect);
        }
        builder.build()
    }

    /// Rectangles covering `start..end`, in cell coordinates.
    pub fn range_rects(&self, start: usize, end: usize) -> Vec<Rect> {
        match self.layout() {
            Some(layout) => layout
                .range_rects(start, end)
                .into_iter()
                .map(|r| r.translate(0.0, self.space_above))
                .collect(),
            None => {
                let size = self.kind.measure();
                vec![Rect::new(0.0, self.space_above, size.width, size.height)]
            }
        }
    }

    /// Char offset and leading flag at a point in cell coordinates.
    pub fn text_pos_at(&self, x: f64, y: f64) -> (usize, bool) {
        self.kind.hit_test(Point::new(x, y - self.space_above))
    }

    /// Offset of the start or end of the visual line holding `offset`.
    pub fn line_edge(&self, offset: usize, leading: bool, end: bool) -> usize {
        match self.layout() {
            Some(layout) => {
                let line = layout.line(offset, leading);
                if end { line.end } else { line.start }
            }
            None => 0,
        }
    }

    pub fn is_rtl(&self) -> bool {
        self.layout().is_some_and(ParagraphLayout::is_rtl)
    }

    /// The y in cell coordinates to hit test for a vertical move that
    /// landed at `y`.
    ///
    /// Points in the space above or below the text snap into the first or
    /// last line. Points outside the cell snap to the first line when moving
    /// down and to the last line when moving up.
    pub fn find_hit_candidate(&self, y: f64, down: bool) -> f64 {
        let top = self.space_above;
        let last = (top + self.kind.measure().height - 0.5).max(top);
        if !(0.0..self.height()).contains(&y) {
            return if down { top } else { last };
        }
        y.clamp(top, last)
    }

    /// Whether a cell-local y falls on the text rather than its padding.
    pub fn is_inside_text(&self, y: f64) -> bool {
        let top = self.space_above;
        y >= top && y < top + self.kind.measure().height
    }

    /// Closed outline of the full cell width, used for the current line
    /// highlight.
    pub fn box_outline(&self, left: f64, right: f64) -> Vec<PathElement> {
        let mut builder = PathBuilder::new();
        builder.add_rect(Rect::new(left, 0.0, right - left, self.height()));
        builder.build()
    }

    /// Paint the cell with its content box at `content_x` and its top at
    /// `y` (both in viewport coordinates).
    pub fn paint(&self, painter: &mut dyn CellPainter, content_x: f64, y: f64, width: f64) {
        if let Some(color) = self.background {
            painter.fill_rect(Rect::new(content_x, y, width, self.height()), color);
        }
        self.kind
            .paint(painter, Point::new(content_x, y + self.space_above));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::MonospaceLayoutEngine;

    fn engine() -> MonospaceLayoutEngine {
        MonospaceLayoutEngine::new(10.0, 20.0)
    }

    #[test]
    fn test_text_cell_measures_with_padding() {
        let attrs = StyleAttributeMap::new().with_space_above(4.0).with_space_below(6.0);
        let cell = TextCell::build(3, &Paragraph::from_text("hello"), &attrs, &engine(), None);
        assert_eq!(cell.index(), 3);
        assert_eq!(cell.height(), 30.0);
        assert_eq!(cell.width(), 50.0);
        assert!(cell.is_inside_text(4.0));
        assert!(!cell.is_inside_text(2.0));
    }

    #[test]
    fn test_region_cell() {
        let paragraph = Paragraph::from_region(RegionSpec::new("image", 64.0));
        let cell = TextCell::build(0, &paragraph, &StyleAttributeMap::new(), &engine(), Some(200.0));
        assert!(matches!(cell.kind(), TextCellKind::EmbeddedRegion { .. }));
        assert_eq!(cell.height(), 64.0);
        assert_eq!(cell.text_pos_at(150.0, 10.0), (0, true));

        let mut painter = RecordingPainter::new();
        cell.paint(&mut painter, 0.0, 0.0, 200.0);
        assert_eq!(
            painter.ops(),
            &[PaintOp::Region(Rect::new(0.0, 0.0, 200.0, 64.0), "image".into())]
        );
    }

    #[test]
    fn test_caret_info() {
        let attrs = StyleAttributeMap::new().with_space_above(5.0);
        let cell = TextCell::build(0, &Paragraph::from_text("abcdef"), &attrs, &engine(), Some(35.0));
        let caret = cell.caret_info(4, true);
        assert_eq!((caret.min_x, caret.min_y, caret.max_y), (10.0, 25.0, 45.0));
        assert_eq!(caret.path.len(), 2);

        let trailing = cell.caret_info(3, false);
        assert_eq!((trailing.min_x, trailing.min_y), (30.0, 5.0));
    }

    #[test]
    fn test_line_edges() {
        let cell = TextCell::build(0, &Paragraph::from_text("abcdef"), &StyleAttributeMap::new(), &engine(), Some(35.0));
        assert_eq!(cell.line_edge(1, true, true), 3);
        assert_eq!(cell.line_edge(4, true, false), 3);
        assert_eq!(cell.line_edge(4, true, true), 6);
        assert_eq!(cell.line_edge(3, false, false), 0);
    }

    #[test]
    fn test_hit_candidate_snaps_padding() {
        let attrs = StyleAttributeMap::new().with_space_above(10.0).with_space_below(10.0);
        let cell = TextCell::build(0, &Paragraph::from_text("ab"), &attrs, &engine(), None);
        assert_eq!(cell.find_hit_candidate(2.0, true), 10.0);
        assert_eq!(cell.find_hit_candidate(38.0, false), 29.5);
        assert_eq!(cell.find_hit_candidate(40.0, true), 10.0);
        assert_eq!(cell.find_hit_candidate(-1.0, false), 29.5);
    }

    #[test]
    fn test_paint_spans() {
        let mut paragraph = Paragraph::from_text("abcd");
        paragraph.set_style(1..3, &StyleAttributeMap::new().with_bold(true), true);
        let attrs = StyleAttributeMap::new().with_paragraph_background(Color::BLUE);
        let cell = TextCell::build(0, &paragraph, &attrs, &engine(), None);

        let mut painter = RecordingPainter::new();
        cell.paint(&mut painter, 5.0, 100.0, 300.0);
        assert_eq!(painter.text(), "abcd");
        assert_eq!(painter.ops()[0], PaintOp::FillRect(Rect::new(5.0, 100.0, 300.0, 20.0), Color::BLUE));
        match &painter.ops()[2] {
            PaintOp::Text { origin, text, attrs } => {
                assert_eq!(*origin, Point::new(15.0, 100.0));
                assert_eq!(text, "bc");
                assert!(attrs.is_bold());
            }
            other => panic!("unexpected op {other:?}"),
        }
    }
}

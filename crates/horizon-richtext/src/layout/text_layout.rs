//! The text shaping boundary.
//!
//! The layout engine never shapes glyphs. It hands a paragraph's text and
//! attributes to a [`TextLayoutEngine`] and gets back lines with caret stops.
//! [`MonospaceLayoutEngine`] is a deterministic implementation with a fixed
//! advance per grapheme cluster, used for headless operation and tests.

use unicode_bidi::BidiInfo;
use unicode_segmentation::UnicodeSegmentation;

use super::geometry::{Rect, Size};
use crate::model::{ParagraphDirection, StyleAttributeMap, TextAlignment};

/// One visual line of a laid out paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    /// First char offset on the line.
    pub start: usize,
    /// Char offset one past the last char on the line.
    pub end: usize,
    /// Top of the line, relative to the paragraph.
    pub y: f64,
    pub height: f64,
    /// Caret x for every char boundary `start..=end`.
    pub stops: Vec<f64>,
}

impl LineLayout {
    /// Caret x at `offset`, clamped to the line.
    pub fn x_at(&self, offset: usize) -> f64 {
        let i = offset.clamp(self.start, self.end) - self.start;
        self.stops.get(i).copied().unwrap_or(0.0)
    }

    /// Leftmost caret stop.
    pub fn min_x(&self) -> f64 {
        self.stops.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Rightmost caret stop.
    pub fn max_x(&self) -> f64 {
        self.stops.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Char offset whose caret stop is closest to `x`.
    pub fn offset_near(&self, x: f64) -> usize {
        let mut best = self.start;
        let mut best_distance = f64::INFINITY;
        for (i, stop) in self.stops.iter().enumerate() {
            let distance = (stop - x).abs();
            if distance < best_distance {
                best_distance = distance;
                best = self.start + i;
            }
        }
        best
    }
}

/// A paragraph broken into lines.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphLayout {
    lines: Vec<LineLayout>,
    width: f64,
    height: f64,
    rtl: bool,
}

impl ParagraphLayout {
    /// Assemble a layout from lines. There is always at least one line.
    pub fn new(lines: Vec<LineLayout>, rtl: bool) -> Self {
        let lines = if lines.is_empty() {
            vec![LineLayout {
                start: 0,
                end: 0,
                y: 0.0,
                height: 0.0,
                stops: vec![0.0],
            }]
        } else {
            lines
        };
        let width = lines.iter().map(LineLayout::max_x).fold(0.0, f64::max);
        let height = lines.last().map_or(0.0, LineLayout::bottom);
        Self {
            lines,
            width,
            height,
            rtl,
        }
    }

    pub fn lines(&self) -> &[LineLayout] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Right edge of the widest line.
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn is_rtl(&self) -> bool {
        self.rtl
    }

    /// Index of the line holding a caret at `offset`.
    ///
    /// At a wrap boundary a leading position belongs to the following line
    /// and a trailing position to the preceding one.
    pub fn line_index(&self, offset: usize, leading: bool) -> usize {
        let last = self.lines.len() - 1;
        for (i, line) in self.lines.iter().enumerate() {
            if offset < line.end || (offset == line.end && (!leading || i == last)) {
                return i;
            }
        }
        last
    }

    pub fn line(&self, offset: usize, leading: bool) -> &LineLayout {
        &self.lines[self.line_index(offset, leading)]
    }

    /// Index of the line under `y`, clamped to the first and last line.
    pub fn line_index_at_y(&self, y: f64) -> usize {
        self.lines
            .iter()
            .position(|line| y < line.bottom())
            .unwrap_or(self.lines.len() - 1)
    }

    /// Char offset and leading flag nearest to `(x, y)`.
    pub fn hit(&self, x: f64, y: f64) -> (usize, bool) {
        let ix = self.line_index_at_y(y);
        let line = &self.lines[ix];
        let offset = line.offset_near(x);
        let leading = !(offset == line.end && ix + 1 < self.lines.len());
        (offset, leading)
    }

    /// One rectangle per line covering `start..end`.
    pub fn range_rects(&self, start: usize, end: usize) -> Vec<Rect> {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let mut rects = Vec::new();
        for line in &self.lines {
            if line.end < start || line.start > end {
                continue;
            }
            let from = start.max(line.start);
            let to = end.min(line.end);
            if from == to && start != end {
                continue;
            }
            let (x0, x1) = (line.x_at(from), line.x_at(to));
            rects.push(Rect::new(x0.min(x1), line.y, (x1 - x0).abs(), line.height));
        }
        rects
    }
}

/// Lays out paragraph text.
pub trait TextLayoutEngine: Send + Sync {
    /// Break `text` into lines. `wrap_width` is `None` when not wrapping.
    fn layout(&self, text: &str, attrs: &StyleAttributeMap, wrap_width: Option<f64>) -> ParagraphLayout;

    /// Size of a single unwrapped line of text, used for side decorations.
    fn measure_text(&self, text: &str) -> Size;

    /// Height of an empty line.
    fn line_height(&self) -> f64;
}

/// Fixed advance per grapheme cluster and fixed line height.
#[derive(Debug, Clone, PartialEq)]
pub struct MonospaceLayoutEngine {
    advance: f64,
    line_height: f64,
    tab_size: usize,
}

impl Default for MonospaceLayoutEngine {
    fn default() -> Self {
        Self::new(8.0, 16.0)
    }
}

impl MonospaceLayoutEngine {
    pub fn new(advance: f64, line_height: f64) -> Self {
        Self {
            advance,
            line_height,
            tab_size: 8,
        }
    }

    pub fn with_tab_size(mut self, tab_size: usize) -> Self {
        self.tab_size = tab_size.max(1);
        self
    }

    pub fn advance(&self) -> f64 {
        self.advance
    }

    /// Width of one grapheme starting at `x`.
    fn grapheme_width(&self, grapheme: &str, x: f64) -> f64 {
        if grapheme == "\t" {
            let stop = self.advance * self.tab_size as f64;
            stop - (x % stop)
        } else {
            self.advance
        }
    }

    fn direction(text: &str, attrs: &StyleAttributeMap) -> ParagraphDirection {
        if let Some(direction) = attrs.direction() {
            return direction;
        }
        let info = BidiInfo::new(text, None);
        match info.paragraphs.first() {
            Some(para) if para.level.is_rtl() => ParagraphDirection::RightToLeft,
            _ => ParagraphDirection::LeftToRight,
        }
    }
}

/// A line before alignment: char offsets and advances from the line start.
struct RawLine {
    start: usize,
    end: usize,
    indent: f64,
    advances: Vec<f64>,
}

impl RawLine {
    fn width(&self) -> f64 {
        self.indent + self.advances.last().copied().unwrap_or(0.0)
    }
}

impl TextLayoutEngine for MonospaceLayoutEngine {
    fn layout(&self, text: &str, attrs: &StyleAttributeMap, wrap_width: Option<f64>) -> ParagraphLayout {
        let direction = Self::direction(text, attrs);
        let indent = attrs.first_line_indent().unwrap_or(0.0);
        let spacing = attrs.line_spacing().unwrap_or(0.0);

        let mut raw = Vec::new();
        let mut current = RawLine {
            start: 0,
            end: 0,
            indent,
            advances: vec![0.0],
        };
        let mut offset = 0;
        for grapheme in text.graphemes(true) {
            let chars = grapheme.chars().count();
            let x = current.advances.last().copied().unwrap_or(0.0);
            let w = self.grapheme_width(grapheme, current.indent + x);
            if let Some(limit) = wrap_width {
                if current.end > current.start && current.indent + x + w > limit {
                    let next = RawLine {
                        start: offset,
                        end: offset,
                        indent: 0.0,
                        advances: vec![0.0],
                    };
                    raw.push(std::mem::replace(&mut current, next));
                }
            }
            let x = current.advances.last().copied().unwrap_or(0.0);
            // Caret stops inside a cluster snap to its start.
            current.advances.extend(std::iter::repeat_n(x, chars - 1));
            current.advances.push(x + w);
            offset += chars;
            current.end = offset;
        }
        raw.push(current);

        let natural = raw.iter().map(RawLine::width).fold(0.0, f64::max);
        let available = wrap_width.map_or(natural, |w| w.max(natural));
        let alignment = attrs.alignment().unwrap_or(match direction {
            ParagraphDirection::LeftToRight => TextAlignment::Left,
            ParagraphDirection::RightToLeft => TextAlignment::Right,
        });
        let rtl = direction == ParagraphDirection::RightToLeft;

        let mut y = 0.0;
        let count = raw.len();
        let lines = raw
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let width = line.width();
                let shift = match alignment {
                    TextAlignment::Center => (available - width) / 2.0,
                    TextAlignment::Right => available - width,
                    TextAlignment::Left | TextAlignment::Justify => 0.0,
                };
                let stops = line
                    .advances
                    .iter()
                    .map(|a| {
                        if rtl {
                            shift + width - line.indent - a
                        } else {
                            shift + line.indent + a
                        }
                    })
                    .collect();
                let layout = LineLayout {
                    start: line.start,
                    end: line.end,
                    y,
                    height: self.line_height,
                    stops,
                };
                y += self.line_height;
                if i + 1 < count {
                    y += spacing;
                }
                layout
            })
            .collect();

        ParagraphLayout::new(lines, rtl)
    }

    fn measure_text(&self, text: &str) -> Size {
        let mut x = 0.0;
        for grapheme in text.graphemes(true) {
            x += self.grapheme_width(grapheme, x);
        }
        Size::new(x, self.line_height)
    }

    fn line_height(&self) -> f64 {
        self.line_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> MonospaceLayoutEngine {
        MonospaceLayoutEngine::new(10.0, 20.0).with_tab_size(4)
    }

    #[test]
    fn test_single_line() {
        let layout = engine().layout("abc", &StyleAttributeMap::new(), None);
        assert_eq!(layout.line_count(), 1);
        assert_eq!(layout.width(), 30.0);
        assert_eq!(layout.height(), 20.0);
        assert_eq!(layout.lines()[0].stops, vec![0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_empty_paragraph_has_one_line() {
        let layout = engine().layout("", &StyleAttributeMap::new(), Some(100.0));
        assert_eq!(layout.line_count(), 1);
        assert_eq!(layout.height(), 20.0);
        assert_eq!(layout.hit(50.0, 5.0), (0, true));
    }

    #[test]
    fn test_wrapping_and_boundary_affinity() {
        let layout = engine().layout("abcdef", &StyleAttributeMap::new(), Some(35.0));
        assert_eq!(layout.line_count(), 2);
        assert_eq!((layout.lines()[0].start, layout.lines()[0].end), (0, 3));
        assert_eq!((layout.lines()[1].start, layout.lines()[1].end), (3, 6));
        assert_eq!(layout.line_index(3, true), 1);
        assert_eq!(layout.line_index(3, false), 0);
        assert_eq!(layout.line_index(6, true), 1);
        assert_eq!(layout.hit(100.0, 5.0), (3, false));
        assert_eq!(layout.hit(100.0, 25.0), (6, true));
    }

    #[test]
    fn test_grapheme_cluster_single_advance() {
        // 'e' followed by a combining acute accent
        let layout = engine().layout("e\u{301}x", &StyleAttributeMap::new(), None);
        assert_eq!(layout.lines()[0].stops, vec![0.0, 0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_tab_stops() {
        let size = engine().measure_text("a\tb");
        assert_eq!(size.width, 50.0);
    }

    #[test]
    fn test_alignment_and_rtl() {
        let attrs = StyleAttributeMap::new().with_alignment(TextAlignment::Right);
        let layout = engine().layout("ab", &attrs, Some(100.0));
        assert_eq!(layout.lines()[0].stops, vec![80.0, 90.0, 100.0]);

        let attrs = StyleAttributeMap::new().with_direction(ParagraphDirection::RightToLeft);
        let layout = engine().layout("ab", &attrs, Some(100.0));
        assert!(layout.is_rtl());
        assert_eq!(layout.lines()[0].stops, vec![100.0, 90.0, 80.0]);
    }

    #[test]
    fn test_line_spacing_and_indent() {
        let attrs = StyleAttributeMap::new().with_line_spacing(5.0).with_first_line_indent(10.0);
        let layout = engine().layout("abcd", &attrs, Some(30.0));
        assert_eq!(layout.line_count(), 2);
        assert_eq!(layout.lines()[0].stops[0], 10.0);
        assert_eq!(layout.lines()[1].y, 25.0);
        assert_eq!(layout.height(), 45.0);
    }

    #[test]
    fn test_range_rects() {
        let layout = engine().layout("abcdef", &StyleAttributeMap::new(), Some(35.0));
        let rects = layout.range_rects(1, 5);
        assert_eq!(rects, vec![Rect::new(10.0, 0.0, 20.0, 20.0), Rect::new(0.0, 20.0, 20.0, 20.0)]);
    }
}

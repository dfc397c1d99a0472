//! A single paragraph: plain text, character style runs and paragraph
//! attributes.

use std::ops::Range;

use super::attributes::StyleAttributeMap;

/// Byte index of the char at `offset`, or the text length past the end.
pub(crate) fn byte_offset(text: &str, offset: usize) -> usize {
    text.char_indices().nth(offset).map_or(text.len(), |(i, _)| i)
}

/// A contiguous char range sharing one attribute set.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRun {
    pub range: Range<usize>,
    pub attrs: StyleAttributeMap,
}

impl StyleRun {
    pub fn new(range: Range<usize>, attrs: StyleAttributeMap) -> Self {
        Self { range, attrs }
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// An embedded, non-text block occupying a whole paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSpec {
    /// Application-defined kind, e.g. `"image"` or `"table"`.
    pub kind: String,
    /// Preferred height in pixels.
    pub height: f64,
}

impl RegionSpec {
    pub fn new(kind: impl Into<String>, height: f64) -> Self {
        Self {
            kind: kind.into(),
            height,
        }
    }
}

/// Style state of one paragraph, used by undo records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParagraphStyle {
    pub runs: Vec<StyleRun>,
    pub attrs: StyleAttributeMap,
}

/// One paragraph of a styled document.
///
/// Runs are kept sorted, non-overlapping, merged when adjacent runs share the
/// same attributes, and never carry the default (empty) style. Offsets are
/// counted in chars.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    text: String,
    len: usize,
    runs: Vec<StyleRun>,
    attrs: StyleAttributeMap,
    region: Option<RegionSpec>,
}

impl Paragraph {
    /// An empty, unstyled paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// An unstyled paragraph holding `text`. Line breaks are not interpreted.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            len: text.chars().count(),
            text,
            ..Default::default()
        }
    }

    /// A paragraph holding an embedded region instead of text.
    pub fn from_region(region: RegionSpec) -> Self {
        Self {
            region: Some(region),
            ..Default::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn runs(&self) -> &[StyleRun] {
        &self.runs
    }

    /// Paragraph-level attributes.
    pub fn attributes(&self) -> &StyleAttributeMap {
        &self.attrs
    }

    pub fn region(&self) -> Option<&RegionSpec> {
        self.region.as_ref()
    }

    pub fn is_region(&self) -> bool {
        self.region.is_some()
    }

    /// The text of a char range, clamped to the paragraph.
    pub fn slice(&self, range: Range<usize>) -> &str {
        let end = range.end.min(self.len);
        let start = range.start.min(end);
        let from = byte_offset(&self.text, start);
        let to = from + byte_offset(&self.text[from..], end - start);
        &self.text[from..to]
    }

    /// Character attributes of the char at `char_index` (empty past the end).
    pub fn char_attributes(&self, char_index: usize) -> StyleAttributeMap {
        self.runs
            .iter()
            .find(|run| run.range.contains(&char_index))
            .map(|run| run.attrs.clone())
            .unwrap_or_default()
    }

    /// Ranges covering the whole paragraph, unstyled gaps included.
    pub fn intervals(&self) -> Vec<StyleRun> {
        let mut out = Vec::with_capacity(self.runs.len() * 2 + 1);
        let mut pos = 0;
        for run in &self.runs {
            if run.range.start > pos {
                out.push(StyleRun::new(pos..run.range.start, StyleAttributeMap::new()));
            }
            out.push(run.clone());
            pos = run.range.end;
        }
        if pos < self.len {
            out.push(StyleRun::new(pos..self.len, StyleAttributeMap::new()));
        }
        out
    }

    /// Text and attributes of each styled piece within `range`.
    pub fn spans(&self, range: Range<usize>) -> Vec<(&str, StyleAttributeMap)> {
        self.intervals()
            .into_iter()
            .filter_map(|run| {
                let start = run.range.start.max(range.start);
                let end = run.range.end.min(range.end);
                (start < end).then(|| (self.slice(start..end), run.attrs))
            })
            .collect()
    }

    pub(crate) fn set_attributes(&mut self, attrs: StyleAttributeMap) {
        self.attrs = attrs;
    }

    pub(crate) fn set_region(&mut self, region: Option<RegionSpec>) {
        self.region = region;
    }

    pub(crate) fn style(&self) -> ParagraphStyle {
        ParagraphStyle {
            runs: self.runs.clone(),
            attrs: self.attrs.clone(),
        }
    }

    pub(crate) fn restore_style(&mut self, style: &ParagraphStyle) {
        self.runs = style.runs.clone();
        self.attrs = style.attrs.clone();
        self.normalize_runs();
    }

    /// Insert `text` at char `offset`, styled exactly with `attrs`.
    pub(crate) fn insert(&mut self, offset: usize, text: &str, attrs: &StyleAttributeMap) {
        let count = text.chars().count();
        if count == 0 {
            return;
        }
        let offset = offset.min(self.len);

        let at = byte_offset(&self.text, offset);
        self.text.insert_str(at, text);
        self.len += count;

        for run in &mut self.runs {
            if run.range.start >= offset {
                run.range.start += count;
                run.range.end += count;
            } else if run.range.end > offset {
                run.range.end += count;
            }
        }

        self.set_style(offset..offset + count, attrs, false);
    }

    /// Delete a char range.
    pub(crate) fn delete(&mut self, range: Range<usize>) {
        let end = range.end.min(self.len);
        let start = range.start.min(end);
        if start == end {
            return;
        }

        let from = byte_offset(&self.text, start);
        let to = from + byte_offset(&self.text[from..], end - start);
        self.text.replace_range(from..to, "");
        self.len -= end - start;

        let removed = end - start;
        let map = |x: usize| {
            if x <= start {
                x
            } else if x >= end {
                x - removed
            } else {
                start
            }
        };
        for run in &mut self.runs {
            run.range = map(run.range.start)..map(run.range.end);
        }
        self.normalize_runs();
    }

    /// Split at char `offset`; the returned paragraph holds the tail and
    /// inherits the paragraph attributes.
    pub(crate) fn split_off(&mut self, offset: usize) -> Paragraph {
        let offset = offset.min(self.len);
        let at = byte_offset(&self.text, offset);
        let tail_text = self.text.split_off(at);
        let tail_len = self.len - offset;
        self.len = offset;

        let mut tail_runs = Vec::new();
        for run in &mut self.runs {
            if run.range.end > offset {
                let start = run.range.start.max(offset);
                tail_runs.push(StyleRun::new(start - offset..run.range.end - offset, run.attrs.clone()));
                run.range.end = run.range.end.min(offset);
            }
        }
        self.normalize_runs();

        let mut tail = Paragraph {
            text: tail_text,
            len: tail_len,
            runs: tail_runs,
            attrs: self.attrs.clone(),
            region: None,
        };
        tail.normalize_runs();
        tail
    }

    /// Append another paragraph's text and runs; this paragraph keeps its
    /// own paragraph attributes.
    pub(crate) fn append(&mut self, other: Paragraph) {
        let shift = self.len;
        self.text.push_str(&other.text);
        self.len += other.len;
        self.runs.extend(
            other
                .runs
                .into_iter()
                .map(|run| StyleRun::new(run.range.start + shift..run.range.end + shift, run.attrs)),
        );
        self.normalize_runs();
    }

    /// Apply character attributes to a char range, merging over or replacing
    /// the existing ones.
    pub(crate) fn set_style(&mut self, range: Range<usize>, attrs: &StyleAttributeMap, merge: bool) {
        let end = range.end.min(self.len);
        let start = range.start.min(end);
        if start == end {
            return;
        }

        let mut runs = Vec::new();
        for run in self.intervals() {
            let pieces = [
                (run.range.start, run.range.end.min(start), false),
                (run.range.start.max(start), run.range.end.min(end), true),
                (run.range.start.max(end), run.range.end, false),
            ];
            for (s, e, inside) in pieces {
                if s >= e {
                    continue;
                }
                let piece_attrs = match (inside, merge) {
                    (false, _) => run.attrs.clone(),
                    (true, true) => run.attrs.combine(attrs),
                    (true, false) => attrs.clone(),
                };
                runs.push(StyleRun::new(s..e, piece_attrs));
            }
        }
        self.runs = runs;
        self.normalize_runs();
    }

    /// Sort, normalize, merge adjacent equal runs, and drop empty or
    /// unstyled runs.
    fn normalize_runs(&mut self) {
        let len = self.len;
        for run in &mut self.runs {
            run.range.end = run.range.end.min(len);
            run.range.start = run.range.start.min(run.range.end);
            run.attrs = std::mem::take(&mut run.attrs).character_attributes().normalized();
        }
        self.runs.retain(|r| !r.is_empty() && !r.attrs.is_empty());
        self.runs.sort_by_key(|r| r.range.start);

        let mut i = 0;
        while i + 1 < self.runs.len() {
            if self.runs[i].range.end == self.runs[i + 1].range.start
                && self.runs[i].attrs == self.runs[i + 1].attrs
            {
                self.runs[i].range.end = self.runs[i + 1].range.end;
                self.runs.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attributes::TextAlignment;

    fn bold() -> StyleAttributeMap {
        StyleAttributeMap::new().with_bold(true)
    }

    #[test]
    fn test_insert_styled_then_plain() {
        let mut p = Paragraph::from_text("hello");
        p.insert(5, " world", &bold());
        assert_eq!(p.text(), "hello world");
        assert_eq!(p.runs(), &[StyleRun::new(5..11, bold())]);

        p.insert(0, ">", &StyleAttributeMap::new());
        assert_eq!(p.runs(), &[StyleRun::new(6..12, bold())]);
    }

    #[test]
    fn test_insert_counts_chars_not_bytes() {
        let mut p = Paragraph::from_text("héllo");
        p.insert(2, "ü", &bold());
        assert_eq!(p.text(), "héüllo");
        assert_eq!(p.len(), 6);
        assert_eq!(p.slice(2..3), "ü");
    }

    #[test]
    fn test_delete_shrinks_runs() {
        let mut p = Paragraph::from_text("abcdefgh");
        p.set_style(2..6, &bold(), false);
        p.delete(4..7);
        assert_eq!(p.text(), "abcdh");
        assert_eq!(p.runs(), &[StyleRun::new(2..4, bold())]);

        p.delete(0..5);
        assert!(p.runs().is_empty());
        assert!(p.is_empty());
    }

    #[test]
    fn test_set_style_merge_and_replace() {
        let italic = StyleAttributeMap::new().with_italic(true);
        let mut p = Paragraph::from_text("abcdef");
        p.set_style(0..4, &bold(), false);
        p.set_style(2..6, &italic, true);
        assert_eq!(
            p.runs(),
            &[
                StyleRun::new(0..2, bold()),
                StyleRun::new(2..4, bold().with_italic(true)),
                StyleRun::new(4..6, italic.clone()),
            ]
        );

        p.set_style(0..6, &italic, false);
        assert_eq!(p.runs(), &[StyleRun::new(0..6, italic)]);
    }

    #[test]
    fn test_adjacent_equal_runs_merge() {
        let mut p = Paragraph::from_text("abcdef");
        p.set_style(0..3, &bold(), false);
        p.set_style(3..6, &bold(), false);
        assert_eq!(p.runs(), &[StyleRun::new(0..6, bold())]);
    }

    #[test]
    fn test_split_and_append() {
        let mut p = Paragraph::from_text("abcdef");
        p.set_attributes(StyleAttributeMap::new().with_alignment(TextAlignment::Right));
        p.set_style(2..5, &bold(), false);

        let tail = p.split_off(3);
        assert_eq!(p.text(), "abc");
        assert_eq!(tail.text(), "def");
        assert_eq!(p.runs(), &[StyleRun::new(2..3, bold())]);
        assert_eq!(tail.runs(), &[StyleRun::new(0..2, bold())]);
        assert_eq!(tail.attributes().alignment(), Some(TextAlignment::Right));

        p.append(tail);
        assert_eq!(p.text(), "abcdef");
        assert_eq!(p.runs(), &[StyleRun::new(2..5, bold())]);
    }

    #[test]
    fn test_spans_cover_range() {
        let mut p = Paragraph::from_text("abcdef");
        p.set_style(2..4, &bold(), false);
        let spans = p.spans(1..5);
        assert_eq!(
            spans,
            vec![
                ("b", StyleAttributeMap::new()),
                ("cd", bold()),
                ("e", StyleAttributeMap::new()),
            ]
        );
    }

    #[test]
    fn test_paragraph_attributes_not_stored_in_runs() {
        let mut p = Paragraph::from_text("abc");
        p.set_style(0..3, &bold().with_alignment(TextAlignment::Center), false);
        assert_eq!(p.runs(), &[StyleRun::new(0..3, bold())]);
    }
}

//! Styled content fed into [`StyledTextModel::replace`](super::StyledTextModel::replace).

use std::fmt;

use super::attributes::StyleAttributeMap;
use super::paragraph::RegionSpec;

/// One piece of styled content.
#[derive(Debug, Clone, PartialEq)]
pub enum StyledSegment {
    /// Text with character attributes. Embedded `\n` (or `\r\n`) breaks
    /// the paragraph.
    Text {
        text: String,
        attrs: StyleAttributeMap,
    },
    /// Paragraph break.
    LineBreak,
    /// Replace the attributes of the paragraph currently being written.
    ParagraphAttributes(StyleAttributeMap),
    /// Turn the paragraph currently being written into an embedded region.
    Region(RegionSpec),
}

impl StyledSegment {
    /// Unstyled text.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            attrs: StyleAttributeMap::new(),
        }
    }

    /// Text with character attributes.
    pub fn styled(text: impl Into<String>, attrs: StyleAttributeMap) -> Self {
        Self::Text {
            text: text.into(),
            attrs,
        }
    }

    /// Whether inserting this segment changes nothing.
    pub(crate) fn is_noop(&self) -> bool {
        matches!(self, Self::Text { text, .. } if text.is_empty())
    }
}

/// A lazily produced sequence of [`StyledSegment`]s.
pub struct StyledInput {
    segments: Box<dyn Iterator<Item = StyledSegment> + Send>,
}

impl StyledInput {
    /// No content.
    pub fn empty() -> Self {
        Self::from_segments(std::iter::empty())
    }

    /// Unstyled text; `\n` starts a new paragraph.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::from_segments(std::iter::once(StyledSegment::text(text)))
    }

    /// Text with one set of character attributes.
    pub fn styled(text: impl Into<String>, attrs: StyleAttributeMap) -> Self {
        Self::from_segments(std::iter::once(StyledSegment::styled(text, attrs)))
    }

    /// Any segment source. The iterator is consumed once, during the edit.
    pub fn from_segments<I>(segments: I) -> Self
    where
        I: IntoIterator<Item = StyledSegment>,
        I::IntoIter: Send + 'static,
    {
        Self {
            segments: Box::new(segments.into_iter()),
        }
    }
}

impl Iterator for StyledInput {
    type Item = StyledSegment;

    fn next(&mut self) -> Option<StyledSegment> {
        self.segments.next()
    }
}

impl fmt::Debug for StyledInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyledInput").finish_non_exhaustive()
    }
}

impl From<&str> for StyledInput {
    fn from(text: &str) -> Self {
        Self::plain(text.to_string())
    }
}

impl From<String> for StyledInput {
    fn from(text: String) -> Self {
        Self::plain(text)
    }
}

impl From<Vec<StyledSegment>> for StyledInput {
    fn from(segments: Vec<StyledSegment>) -> Self {
        Self::from_segments(segments)
    }
}

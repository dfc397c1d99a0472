//! Style attributes attached to character runs and paragraphs.
//!
//! A [`StyleAttributeMap`] is an ordered map from a closed set of
//! [`StyleAttribute`] keys to typed [`AttrValue`]s. Character attributes live
//! on style runs; paragraph attributes apply to a whole paragraph.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, RichTextError};

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 128, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    /// An opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// A color with explicit alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.strip_prefix('#').unwrap_or(text);
        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Format as `#rrggbbaa`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Horizontal alignment of the lines in a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Base direction of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParagraphDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

/// The closed set of style attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleAttribute {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    FontFamily,
    FontSize,
    TextColor,
    Background,
    Alignment,
    Direction,
    ParagraphBackground,
    LineSpacing,
    SpaceAbove,
    SpaceBelow,
    FirstLineIndent,
}

impl StyleAttribute {
    /// Every attribute, character attributes first.
    pub const ALL: [StyleAttribute; 15] = [
        Self::Bold,
        Self::Italic,
        Self::Underline,
        Self::Strikethrough,
        Self::FontFamily,
        Self::FontSize,
        Self::TextColor,
        Self::Background,
        Self::Alignment,
        Self::Direction,
        Self::ParagraphBackground,
        Self::LineSpacing,
        Self::SpaceAbove,
        Self::SpaceBelow,
        Self::FirstLineIndent,
    ];

    /// Whether the attribute applies to whole paragraphs.
    pub fn is_paragraph_attribute(&self) -> bool {
        matches!(
            self,
            Self::Alignment
                | Self::Direction
                | Self::ParagraphBackground
                | Self::LineSpacing
                | Self::SpaceAbove
                | Self::SpaceBelow
                | Self::FirstLineIndent
        )
    }

    /// A stable, human readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Strikethrough => "strikethrough",
            Self::FontFamily => "font-family",
            Self::FontSize => "font-size",
            Self::TextColor => "text-color",
            Self::Background => "background",
            Self::Alignment => "alignment",
            Self::Direction => "direction",
            Self::ParagraphBackground => "paragraph-background",
            Self::LineSpacing => "line-spacing",
            Self::SpaceAbove => "space-above",
            Self::SpaceBelow => "space-below",
            Self::FirstLineIndent => "first-line-indent",
        }
    }

    fn accepts(&self, value: &AttrValue) -> bool {
        match self {
            Self::Bold | Self::Italic | Self::Underline | Self::Strikethrough => {
                matches!(value, AttrValue::Bool(_))
            }
            Self::FontFamily => matches!(value, AttrValue::Text(_)),
            Self::FontSize
            | Self::LineSpacing
            | Self::SpaceAbove
            | Self::SpaceBelow
            | Self::FirstLineIndent => matches!(value, AttrValue::Number(n) if n.is_finite()),
            Self::TextColor | Self::Background | Self::ParagraphBackground => {
                matches!(value, AttrValue::Color(_))
            }
            Self::Alignment => matches!(value, AttrValue::Alignment(_)),
            Self::Direction => matches!(value, AttrValue::Direction(_)),
        }
    }
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Color(Color),
    Alignment(TextAlignment),
    Direction(ParagraphDirection),
}

/// An immutable-by-convention set of style attributes.
///
/// Boolean attributes set to `false` are equivalent to absent ones once a map
/// has been [normalized](Self::normalized); the model stores normalized maps
/// only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleAttributeMap {
    entries: BTreeMap<StyleAttribute, AttrValue>,
}

impl StyleAttributeMap {
    /// An empty map (the default style).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, attr: StyleAttribute) -> Option<&AttrValue> {
        self.entries.get(&attr)
    }

    pub fn contains(&self, attr: StyleAttribute) -> bool {
        self.entries.contains_key(&attr)
    }

    /// Iterate in attribute order.
    pub fn iter(&self) -> impl Iterator<Item = (StyleAttribute, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Set an attribute, checking that the value has the attribute's type.
    pub fn set(&mut self, attr: StyleAttribute, value: AttrValue) -> Result<()> {
        if !attr.accepts(&value) {
            return Err(RichTextError::invalid_argument(format!(
                "{} cannot hold {value:?}",
                attr.name()
            )));
        }
        self.entries.insert(attr, value);
        Ok(())
    }

    pub fn remove(&mut self, attr: StyleAttribute) -> Option<AttrValue> {
        self.entries.remove(&attr)
    }

    // Builders only produce well-typed values.
    fn with(mut self, attr: StyleAttribute, value: AttrValue) -> Self {
        self.entries.insert(attr, value);
        self
    }

    pub fn with_bold(self, on: bool) -> Self {
        self.with(StyleAttribute::Bold, AttrValue::Bool(on))
    }

    pub fn with_italic(self, on: bool) -> Self {
        self.with(StyleAttribute::Italic, AttrValue::Bool(on))
    }

    pub fn with_underline(self, on: bool) -> Self {
        self.with(StyleAttribute::Underline, AttrValue::Bool(on))
    }

    pub fn with_strikethrough(self, on: bool) -> Self {
        self.with(StyleAttribute::Strikethrough, AttrValue::Bool(on))
    }

    pub fn with_font_family(self, family: impl Into<String>) -> Self {
        self.with(StyleAttribute::FontFamily, AttrValue::Text(family.into()))
    }

    pub fn with_font_size(self, size: f64) -> Self {
        self.with(StyleAttribute::FontSize, AttrValue::Number(size))
    }

    pub fn with_text_color(self, color: Color) -> Self {
        self.with(StyleAttribute::TextColor, AttrValue::Color(color))
    }

    pub fn with_background(self, color: Color) -> Self {
        self.with(StyleAttribute::Background, AttrValue::Color(color))
    }

    pub fn with_alignment(self, alignment: TextAlignment) -> Self {
        self.with(StyleAttribute::Alignment, AttrValue::Alignment(alignment))
    }

    pub fn with_direction(self, direction: ParagraphDirection) -> Self {
        self.with(StyleAttribute::Direction, AttrValue::Direction(direction))
    }

    pub fn with_paragraph_background(self, color: Color) -> Self {
        self.with(StyleAttribute::ParagraphBackground, AttrValue::Color(color))
    }

    pub fn with_line_spacing(self, spacing: f64) -> Self {
        self.with(StyleAttribute::LineSpacing, AttrValue::Number(spacing))
    }

    pub fn with_space_above(self, space: f64) -> Self {
        self.with(StyleAttribute::SpaceAbove, AttrValue::Number(space))
    }

    pub fn with_space_below(self, space: f64) -> Self {
        self.with(StyleAttribute::SpaceBelow, AttrValue::Number(space))
    }

    pub fn with_first_line_indent(self, indent: f64) -> Self {
        self.with(StyleAttribute::FirstLineIndent, AttrValue::Number(indent))
    }

    fn flag(&self, attr: StyleAttribute) -> bool {
        matches!(self.entries.get(&attr), Some(AttrValue::Bool(true)))
    }

    fn number(&self, attr: StyleAttribute) -> Option<f64> {
        match self.entries.get(&attr) {
            Some(AttrValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    fn color(&self, attr: StyleAttribute) -> Option<Color> {
        match self.entries.get(&attr) {
            Some(AttrValue::Color(c)) => Some(*c),
            _ => None,
        }
    }

    pub fn is_bold(&self) -> bool {
        self.flag(StyleAttribute::Bold)
    }

    pub fn is_italic(&self) -> bool {
        self.flag(StyleAttribute::Italic)
    }

    pub fn is_underline(&self) -> bool {
        self.flag(StyleAttribute::Underline)
    }

    pub fn is_strikethrough(&self) -> bool {
        self.flag(StyleAttribute::Strikethrough)
    }

    pub fn font_family(&self) -> Option<&str> {
        match self.entries.get(&StyleAttribute::FontFamily) {
            Some(AttrValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn font_size(&self) -> Option<f64> {
        self.number(StyleAttribute::FontSize)
    }

    pub fn text_color(&self) -> Option<Color> {
        self.color(StyleAttribute::TextColor)
    }

    pub fn background(&self) -> Option<Color> {
        self.color(StyleAttribute::Background)
    }

    pub fn alignment(&self) -> Option<TextAlignment> {
        match self.entries.get(&StyleAttribute::Alignment) {
            Some(AttrValue::Alignment(a)) => Some(*a),
            _ => None,
        }
    }

    pub fn direction(&self) -> Option<ParagraphDirection> {
        match self.entries.get(&StyleAttribute::Direction) {
            Some(AttrValue::Direction(d)) => Some(*d),
            _ => None,
        }
    }

    pub fn paragraph_background(&self) -> Option<Color> {
        self.color(StyleAttribute::ParagraphBackground)
    }

    pub fn line_spacing(&self) -> Option<f64> {
        self.number(StyleAttribute::LineSpacing)
    }

    pub fn space_above(&self) -> Option<f64> {
        self.number(StyleAttribute::SpaceAbove)
    }

    pub fn space_below(&self) -> Option<f64> {
        self.number(StyleAttribute::SpaceBelow)
    }

    pub fn first_line_indent(&self) -> Option<f64> {
        self.number(StyleAttribute::FirstLineIndent)
    }

    /// Union of both maps; values from `other` win on conflict.
    pub fn combine(&self, other: &StyleAttributeMap) -> StyleAttributeMap {
        let mut entries = self.entries.clone();
        entries.extend(other.entries.iter().map(|(k, v)| (*k, v.clone())));
        StyleAttributeMap { entries }
    }

    /// Only the character-level attributes.
    pub fn character_attributes(&self) -> StyleAttributeMap {
        self.filtered(|a| !a.is_paragraph_attribute())
    }

    /// Only the paragraph-level attributes.
    pub fn paragraph_attributes(&self) -> StyleAttributeMap {
        self.filtered(|a| a.is_paragraph_attribute())
    }

    fn filtered(&self, keep: impl Fn(StyleAttribute) -> bool) -> StyleAttributeMap {
        StyleAttributeMap {
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| keep(**k))
                .map(|(k, v)| (*k, v.clone()))
                .collect(),
        }
    }

    /// The canonical form: boolean attributes set to `false` are dropped.
    pub fn normalized(mut self) -> StyleAttributeMap {
        self.entries.retain(|_, v| !matches!(v, AttrValue::Bool(false)));
        self
    }
}

impl FromIterator<(StyleAttribute, AttrValue)> for StyleAttributeMap {
    fn from_iter<I: IntoIterator<Item = (StyleAttribute, AttrValue)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .filter(|(k, v)| k.accepts(v))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::from_hex("#ff8000"), Some(Color::rgb(255, 128, 0)));
        assert_eq!(Color::from_hex("10203040"), Some(Color::rgba(16, 32, 48, 64)));
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#gg0000"), None);
        assert_eq!(Color::RED.to_hex(), "#ff0000ff");
    }

    #[test]
    fn test_combine_other_wins() {
        let base = StyleAttributeMap::new().with_bold(true).with_font_size(12.0);
        let over = StyleAttributeMap::new().with_font_size(20.0).with_italic(true);
        let merged = base.combine(&over);
        assert!(merged.is_bold());
        assert!(merged.is_italic());
        assert_eq!(merged.font_size(), Some(20.0));
    }

    #[test]
    fn test_split_character_and_paragraph() {
        let attrs = StyleAttributeMap::new()
            .with_bold(true)
            .with_alignment(TextAlignment::Center)
            .with_space_above(4.0);
        assert_eq!(attrs.character_attributes().len(), 1);
        assert_eq!(attrs.paragraph_attributes().len(), 2);
        assert_eq!(attrs.paragraph_attributes().alignment(), Some(TextAlignment::Center));
    }

    #[test]
    fn test_set_checks_type() {
        let mut attrs = StyleAttributeMap::new();
        assert!(attrs.set(StyleAttribute::FontSize, AttrValue::Number(11.0)).is_ok());
        assert!(attrs.set(StyleAttribute::Bold, AttrValue::Number(1.0)).is_err());
        assert!(attrs.set(StyleAttribute::FontSize, AttrValue::Number(f64::NAN)).is_err());
    }

    #[test]
    fn test_normalized_drops_false_flags() {
        let attrs = StyleAttributeMap::new().with_bold(false).with_italic(true);
        let normalized = attrs.normalized();
        assert!(!normalized.contains(StyleAttribute::Bold));
        assert_eq!(normalized, StyleAttributeMap::new().with_italic(true));
    }
}

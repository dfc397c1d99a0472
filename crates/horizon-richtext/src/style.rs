//! Mapping of abstract style attributes to presentation.
//!
//! The layout engine never interprets attributes itself. A [`StyleResolver`]
//! turns the attributes stored in the model into concrete ones, and a
//! [`StyleHandlerRegistry`] turns concrete attributes into [`Directive`]s a
//! renderer can apply.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, RichTextError};
use crate::layout::{Size, TextCell};
use crate::model::{AttrValue, ParagraphDirection, StyleAttribute, StyleAttributeMap, TextAlignment};

/// What a directive applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveTarget {
    /// A run of text.
    Text,
    /// The whole paragraph cell.
    Paragraph,
}

/// A single presentation property, e.g. `font-weight: bold`.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub target: DirectiveTarget,
    pub property: &'static str,
    pub value: String,
}

impl Directive {
    pub fn text(property: &'static str, value: impl Into<String>) -> Self {
        Self {
            target: DirectiveTarget::Text,
            property,
            value: value.into(),
        }
    }

    pub fn paragraph(property: &'static str, value: impl Into<String>) -> Self {
        Self {
            target: DirectiveTarget::Paragraph,
            property,
            value: value.into(),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.value)
    }
}

/// Converts one attribute value into a directive, or nothing.
pub type StyleHandler = Arc<dyn Fn(&AttrValue) -> Option<Directive> + Send + Sync>;

/// Handlers by attribute.
#[derive(Clone, Default)]
pub struct StyleHandlerRegistry {
    handlers: HashMap<StyleAttribute, StyleHandler>,
}

impl fmt::Debug for StyleHandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut attrs: Vec<_> = self.handlers.keys().map(|a| a.name()).collect();
        attrs.sort_unstable();
        f.debug_struct("StyleHandlerRegistry").field("attributes", &attrs).finish()
    }
}

impl StyleHandlerRegistry {
    pub fn builder() -> StyleHandlerRegistryBuilder {
        StyleHandlerRegistryBuilder::default()
    }

    /// Handlers for every attribute, producing CSS-like properties.
    pub fn standard() -> Self {
        fn flag(property: &'static str, on: &'static str) -> impl Fn(&AttrValue) -> Option<Directive> {
            move |v| matches!(v, AttrValue::Bool(true)).then(|| Directive::text(property, on))
        }
        fn px(target: DirectiveTarget, property: &'static str) -> impl Fn(&AttrValue) -> Option<Directive> {
            move |v| match v {
                AttrValue::Number(n) => Some(Directive {
                    target,
                    property,
                    value: format!("{n}px"),
                }),
                _ => None,
            }
        }
        fn color(target: DirectiveTarget, property: &'static str) -> impl Fn(&AttrValue) -> Option<Directive> {
            move |v| match v {
                AttrValue::Color(c) => Some(Directive {
                    target,
                    property,
                    value: c.to_hex(),
                }),
                _ => None,
            }
        }

        Self::builder()
            .handler(StyleAttribute::Bold, flag("font-weight", "bold"))
            .handler(StyleAttribute::Italic, flag("font-style", "italic"))
            .handler(StyleAttribute::Underline, flag("text-decoration", "underline"))
            .handler(StyleAttribute::Strikethrough, flag("text-decoration", "line-through"))
            .handler(StyleAttribute::FontFamily, |v| match v {
                AttrValue::Text(family) => Some(Directive::text("font-family", family.clone())),
                _ => None,
            })
            .handler(StyleAttribute::FontSize, px(DirectiveTarget::Text, "font-size"))
            .handler(StyleAttribute::TextColor, color(DirectiveTarget::Text, "color"))
            .handler(StyleAttribute::Background, color(DirectiveTarget::Text, "background-color"))
            .handler(StyleAttribute::Alignment, |v| match v {
                AttrValue::Alignment(a) => Some(Directive::paragraph(
                    "text-align",
                    match a {
                        TextAlignment::Left => "left",
                        TextAlignment::Center => "center",
                        TextAlignment::Right => "right",
                        TextAlignment::Justify => "justify",
                    },
                )),
                _ => None,
            })
            .handler(StyleAttribute::Direction, |v| match v {
                AttrValue::Direction(d) => Some(Directive::paragraph(
                    "direction",
                    match d {
                        ParagraphDirection::LeftToRight => "ltr",
                        ParagraphDirection::RightToLeft => "rtl",
                    },
                )),
                _ => None,
            })
            .handler(
                StyleAttribute::ParagraphBackground,
                color(DirectiveTarget::Paragraph, "background-color"),
            )
            .handler(StyleAttribute::LineSpacing, px(DirectiveTarget::Paragraph, "line-spacing"))
            .handler(StyleAttribute::SpaceAbove, px(DirectiveTarget::Paragraph, "padding-top"))
            .handler(StyleAttribute::SpaceBelow, px(DirectiveTarget::Paragraph, "padding-bottom"))
            .handler(StyleAttribute::FirstLineIndent, px(DirectiveTarget::Paragraph, "text-indent"))
            .build()
    }

    pub fn has_handler(&self, attr: StyleAttribute) -> bool {
        self.handlers.contains_key(&attr)
    }

    /// Directives for every attribute that has a handler, in attribute order.
    pub fn directives(&self, attrs: &StyleAttributeMap) -> Vec<Directive> {
        attrs
            .iter()
            .filter_map(|(attr, value)| self.handlers.get(&attr).and_then(|h| h(value)))
            .collect()
    }
}

/// Builder for [`StyleHandlerRegistry`].
#[derive(Default)]
pub struct StyleHandlerRegistryBuilder {
    handlers: HashMap<StyleAttribute, StyleHandler>,
}

impl StyleHandlerRegistryBuilder {
    /// Set the handler for an attribute, replacing any previous one.
    pub fn handler<F>(mut self, attr: StyleAttribute, handler: F) -> Self
    where
        F: Fn(&AttrValue) -> Option<Directive> + Send + Sync + 'static,
    {
        self.handlers.insert(attr, Arc::new(handler));
        self
    }

    pub fn build(self) -> StyleHandlerRegistry {
        StyleHandlerRegistry {
            handlers: self.handlers,
        }
    }
}

/// A rasterized cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub size: Size,
    /// RGBA pixels, row major.
    pub pixels: Vec<u8>,
}

/// Boundary to the rendering subsystem.
pub trait StyleResolver: Send + Sync {
    /// Attributes every run starts from.
    fn base_style(&self) -> StyleAttributeMap {
        StyleAttributeMap::new()
    }

    /// Resolve logical style references into concrete attributes. The
    /// default merges `attrs` over [`base_style`](Self::base_style).
    fn resolve_styles(&self, attrs: &StyleAttributeMap) -> StyleAttributeMap {
        self.base_style().combine(attrs)
    }

    /// Rasterize a cell for export.
    fn snapshot(&self, cell: &TextCell) -> Result<Snapshot> {
        let _ = cell;
        Err(RichTextError::NotSupported("snapshot".into()))
    }
}

/// A resolver with a fixed base style and no rasterizer.
#[derive(Debug, Clone, Default)]
pub struct DefaultStyleResolver {
    base: StyleAttributeMap,
}

impl DefaultStyleResolver {
    pub fn new(base: StyleAttributeMap) -> Self {
        Self { base }
    }
}

impl StyleResolver for DefaultStyleResolver {
    fn base_style(&self) -> StyleAttributeMap {
        self.base.clone()
    }
}

//! Import and export of document content.
//!
//! Each [`DataFormat`] is served by a [`DataFormatHandler`]. Handlers are
//! looked up through a [`DataFormatRegistry`], which the editor context owns.

mod plain;
mod rich;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use plain::{LineEnding, PlainTextHandler};
pub use rich::{RichTextHandler, decode, encode};

use crate::error::{Result, RichTextError};
use crate::model::{StyledInput, StyledTextModel, TextPos};

/// MIME types of the known formats.
pub mod mime {
    /// Plain text.
    pub const TEXT_PLAIN: &str = "text/plain";
    /// The backtick-delimited rich text codec.
    pub const RICH_TEXT: &str = "application/x-horizon-richtext";
    /// HTML.
    pub const TEXT_HTML: &str = "text/html";
    /// Rich Text Format.
    pub const TEXT_RTF: &str = "text/rtf";
}

/// A data format content can be exported to or imported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    PlainText,
    RichText,
    Html,
    Rtf,
}

impl DataFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::PlainText => mime::TEXT_PLAIN,
            Self::RichText => mime::RICH_TEXT,
            Self::Html => mime::TEXT_HTML,
            Self::Rtf => mime::TEXT_RTF,
        }
    }

    /// Look a format up by MIME type.
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        [Self::PlainText, Self::RichText, Self::Html, Self::Rtf]
            .into_iter()
            .find(|f| f.mime_type() == mime_type)
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Converts between a model range and one data format.
pub trait DataFormatHandler: Send + Sync {
    /// The format this handler serves.
    fn format(&self) -> DataFormat;

    /// Serialize `[start, end)` of `model`.
    fn export(&self, model: &StyledTextModel, start: TextPos, end: TextPos) -> Result<String>;

    /// Parse `text` into content for [`StyledTextModel::replace`].
    ///
    /// Malformed input fails as a whole; nothing is produced.
    fn import(&self, text: &str) -> Result<StyledInput>;
}

/// Handlers by format.
#[derive(Clone, Default)]
pub struct DataFormatRegistry {
    handlers: HashMap<DataFormat, Arc<dyn DataFormatHandler>>,
}

impl fmt::Debug for DataFormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataFormatRegistry")
            .field("formats", &self.supported_formats())
            .finish()
    }
}

impl DataFormatRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain text (with the given line ending) and the rich text codec.
    pub fn standard(line_ending: LineEnding) -> Self {
        let mut registry = Self::new();
        registry.register(PlainTextHandler::new(line_ending));
        registry.register(RichTextHandler);
        registry
    }

    /// Register a handler, replacing any previous one for its format.
    pub fn register(&mut self, handler: impl DataFormatHandler + 'static) {
        self.handlers.insert(handler.format(), Arc::new(handler));
    }

    pub fn handler(&self, format: DataFormat) -> Result<&dyn DataFormatHandler> {
        self.handlers
            .get(&format)
            .map(|h| h.as_ref())
            .ok_or_else(|| RichTextError::NotSupported(format.to_string()))
    }

    pub fn is_supported(&self, format: DataFormat) -> bool {
        self.handlers.contains_key(&format)
    }

    /// Registered formats, in a stable order.
    pub fn supported_formats(&self) -> Vec<DataFormat> {
        let mut formats: Vec<DataFormat> = self.handlers.keys().copied().collect();
        formats.sort_by_key(|f| f.mime_type());
        formats
    }

    pub fn export(&self, format: DataFormat, model: &StyledTextModel, start: TextPos, end: TextPos) -> Result<String> {
        self.handler(format)?.export(model, start, end)
    }

    pub fn import(&self, format: DataFormat, text: &str) -> Result<StyledInput> {
        self.handler(format)?.import(text)
    }
}

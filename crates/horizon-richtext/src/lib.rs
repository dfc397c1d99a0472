//! Horizon rich text - a virtualized rich text editing engine.
//!
//! The engine is split into layers that can be used on their own:
//!
//! - [`model`]: the styled paragraph document, position markers and the
//!   undo/redo history
//! - [`selection`]: an anchor and caret held as markers, so they follow edits
//! - [`layout`]: [`VFlow`], the sliding window that lays out only the
//!   paragraphs near the viewport, plus caret and selection geometry
//! - [`format`]: plain text and the rich text interchange format
//! - [`style`]: attribute to directive mapping and the style resolver
//! - [`search`]: find-in-document on the background worker
//! - [`RichTextArea`]: the controller tying them together with the editing
//!   and navigation commands
//!
//! Hosts drive the engine: they deliver input as commands, call
//! [`RichTextArea::tick`] to advance timers, and
//! [`RichTextArea::reconcile`] before painting.
//!
//! # Example
//!
//! ```
//! use horizon_richtext::{EditorConfig, EditorContext, RichTextArea, StyledTextModel, TextPos};
//!
//! let context = EditorContext::new(EditorConfig::default()).unwrap();
//! let mut area = RichTextArea::with_model(context, StyledTextModel::with_text("one\ntwo"));
//! area.set_size(320.0, 200.0);
//!
//! area.select_caret(TextPos::leading(1, 3));
//! area.insert_line_break().unwrap();
//! area.type_text("three").unwrap();
//! assert_eq!(area.text(), "one\ntwo\nthree");
//!
//! area.undo().unwrap();
//! assert_eq!(area.text(), "one\ntwo\n");
//! area.reconcile();
//! ```

pub mod area;
pub mod config;
pub mod context;
pub mod error;
pub mod format;
pub mod layout;
pub mod model;
pub mod search;
pub mod selection;
pub mod style;

pub use area::RichTextArea;
pub use config::EditorConfig;
pub use context::{EditorContext, EditorContextBuilder};
pub use error::{Result, RichTextError};
pub use format::{DataFormat, DataFormatHandler, DataFormatRegistry, LineEnding};
pub use layout::{CaretInfo, Insets, LineNumberDecorator, MonospaceLayoutEngine, Origin, SideDecorator, TextLayoutEngine, VFlow};
pub use model::{
    ChangeKind, ContentChange, StyleAttribute, StyleAttributeMap, StyledInput, StyledSegment, StyledTextModel,
    TextPos, UndoState,
};
pub use search::{FindOptions, SearchMatch};
pub use selection::{SelectionModel, SelectionSegment};
pub use style::{DefaultStyleResolver, StyleHandlerRegistry, StyleResolver};

/// Re-exported runtime primitives.
pub use horizon_richtext_core::{CancellationToken, ConnectionId, Signal, TimerId};

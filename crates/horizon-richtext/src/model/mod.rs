//! The styled document model: positions, markers, paragraphs, styled input
//! and undo history.

mod attributes;
mod input;
mod marker;
mod paragraph;
mod position;
mod styled_model;
mod undo;

pub use attributes::{AttrValue, Color, ParagraphDirection, StyleAttribute, StyleAttributeMap, TextAlignment};
pub use input::{StyledInput, StyledSegment};
pub use marker::Marker;
pub use paragraph::{Paragraph, ParagraphStyle, RegionSpec, StyleRun};
pub use position::TextPos;
pub use styled_model::{ChangeKind, ContentChange, ModelId, StyledTextModel};
pub use undo::{EditRecord, UndoEntry, UndoState};


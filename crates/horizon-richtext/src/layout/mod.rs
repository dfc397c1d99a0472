//! Virtualized layout.
//!
//! Only the paragraphs around the viewport are measured. They are held in a
//! [`CellArrangement`] rebuilt by [`VFlow`] whenever something it depends on
//! is invalidated:
//!
//! ```text
//!   top margin     cells above the origin, measured, not painted
//!   ------------   viewport top (origin.index at -origin.offset)
//!   visible cells
//!   ------------   viewport bottom
//!   bottom margin  measured, not painted
//! ```
//!
//! Shaping is delegated to a [`TextLayoutEngine`]; the deterministic
//! [`MonospaceLayoutEngine`] serves headless use and tests.

mod arrangement;
mod cache;
mod cell;
mod decorator;
mod flow;
mod geometry;
mod invalidation;
mod scroll;
mod selection_shape;
mod text_layout;

pub use arrangement::CellArrangement;
pub use cache::FastCache;
pub use cell::{CaretInfo, CellCapability, CellPainter, PaintOp, PathRole, RecordingPainter, TextCell, TextCellKind};
pub use decorator::{LineNumberDecorator, SideDecorator, SideNode, snap_side_width};
pub use flow::VFlow;
pub use geometry::{Insets, PathBuilder, PathElement, Point, Rect, Size, path_bounds};
pub use invalidation::{Invalidation, Pending};
pub use scroll::{Origin, ScrollBarState, from_scroll_bar_value, to_scroll_bar_value};
pub use selection_shape::{SelectionEdge, SelectionShape};
pub use text_layout::{LineLayout, MonospaceLayoutEngine, ParagraphLayout, TextLayoutEngine};

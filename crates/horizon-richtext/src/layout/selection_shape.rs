//! Outline of a selection spanning several paragraphs.
//!
//! The selection covers the tail of the first line (from the start position
//! to the right edge), every full line in between, and the head of the last
//! line. When both ends are left-to-right this is a single eight-point
//! "zig-zag" polygon; otherwise the three pieces are emitted separately with
//! the partial lines mirrored for right-to-left paragraphs.

use super::geometry::{PathBuilder, Rect};

/// One end of a selection: the line rectangle holding the end position and
/// the paragraph direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionEdge {
    pub line: Rect,
    /// x of the selection boundary on that line.
    pub x: f64,
    pub ltr: bool,
}

impl SelectionEdge {
    /// Edge of the first selected line, from the rectangles of the
    /// selected part of the top paragraph.
    pub fn top(rects: &[Rect], ltr: bool) -> Option<Self> {
        let line = *rects.first()?;
        let x = if ltr { line.min_x() } else { line.max_x() };
        Some(Self { line, x, ltr })
    }

    /// Edge of the last selected line, from the rectangles of the selected
    /// part of the bottom paragraph.
    pub fn bottom(rects: &[Rect], ltr: bool) -> Option<Self> {
        let line = *rects.last()?;
        let x = if ltr { line.max_x() } else { line.min_x() };
        Some(Self { line, x, ltr })
    }
}

/// Builds selection outlines between a left and a right boundary.
#[derive(Debug, Clone, Copy)]
pub struct SelectionShape {
    left: f64,
    right: f64,
}

impl SelectionShape {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    /// A selection within one paragraph: one rectangle per line.
    pub fn single(&self, builder: &mut PathBuilder, rects: &[Rect]) {
        for rect in rects {
            builder.add_rect(*rect);
        }
    }

    /// A selection from `top` to `bottom` in different paragraphs.
    pub fn generate(&self, builder: &mut PathBuilder, top: SelectionEdge, bottom: SelectionEdge) {
        let (left, right) = (self.left, self.right);
        let (ty0, ty1) = (top.line.min_y(), top.line.max_y());
        let (by0, by1) = (bottom.line.min_y(), bottom.line.max_y());

        if top.ltr && bottom.ltr {
            builder
                .move_to(top.x, ty0)
                .line_to(right, ty0)
                .line_to(right, by0)
                .line_to(bottom.x, by0)
                .line_to(bottom.x, by1)
                .line_to(left, by1)
                .line_to(left, ty1)
                .line_to(top.x, ty1)
                .close();
            return;
        }

        let top_rect = if top.ltr {
            Rect::from_corners((top.x, ty0).into(), (right, ty1).into())
        } else {
            Rect::from_corners((left, ty0).into(), (top.x, ty1).into())
        };
        builder.add_rect(top_rect);

        if by0 > ty1 {
            builder.add_rect(Rect::from_corners((left, ty1).into(), (right, by0).into()));
        }

        let bottom_rect = if bottom.ltr {
            Rect::from_corners((left, by0).into(), (bottom.x, by1).into())
        } else {
            Rect::from_corners((bottom.x, by0).into(), (right, by1).into())
        };
        builder.add_rect(bottom_rect);
    }
}

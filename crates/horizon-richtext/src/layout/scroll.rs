//! Scroll origin and scroll bar arithmetic.

use std::fmt;

/// The scroll anchor: the paragraph at the top of the viewport and how far
/// its top edge sits above the viewport top.
///
/// A negative offset places the paragraph below the viewport top, which is
/// how the top content padding is shown: `(0, -padding_top)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Origin {
    index: usize,
    offset: f64,
}

impl Origin {
    pub const ZERO: Origin = Origin { index: 0, offset: 0.0 };

    pub const fn new(index: usize, offset: f64) -> Self {
        Self { index, offset }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Origin{{index={}, offset={}}}", self.index, self.offset)
    }
}

/// State of a scroll bar in the `[0, 1]` domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollBarState {
    /// Fraction of the content shown.
    pub visible_amount: f64,
    /// Thumb position.
    pub value: f64,
    /// Whether the bar is shown.
    pub visible: bool,
}

impl Default for ScrollBarState {
    fn default() -> Self {
        Self {
            visible_amount: 1.0,
            value: 0.0,
            visible: false,
        }
    }
}

/// Convert a pixel offset into a scroll bar value.
///
/// The value spans `[0, max - visible]` of the content, normalized to
/// `[0, 1]`. Degenerates to 0 when everything is visible.
pub fn to_scroll_bar_value(offset: f64, visible: f64, max: f64) -> f64 {
    if (max - visible).abs() < 1e-10 {
        0.0
    } else {
        offset / (max - visible)
    }
}

/// Inverse of [`to_scroll_bar_value`].
pub fn from_scroll_bar_value(value: f64, visible: f64, max: f64) -> f64 {
    value * (max - visible)
}

//! Side decorations: per-paragraph annotations in a gutter column.

use std::sync::Arc;

use super::cache::FastCache;
use super::text_layout::TextLayoutEngine;
use crate::model::StyleAttributeMap;

/// Content of one gutter entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SideNode {
    pub text: String,
    pub attrs: StyleAttributeMap,
}

impl SideNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attrs: StyleAttributeMap::new(),
        }
    }
}

/// Supplies the nodes of a gutter column.
pub trait SideDecorator: Send + Sync {
    /// Width of the column for a flow `viewport_width` wide. A value of zero
    /// or less asks the flow to measure
    /// [`measurement_node`](Self::measurement_node) instead.
    fn pref_width(&self, viewport_width: f64) -> f64;

    /// A throwaway node whose width is used for the whole column, given the
    /// index of the top paragraph.
    fn measurement_node(&self, top_index: usize) -> SideNode;

    /// The node shown next to paragraph `index`.
    fn node(&self, index: usize) -> Option<SideNode>;
}

/// Numbers each paragraph, starting at one.
#[derive(Debug, Clone, Default)]
pub struct LineNumberDecorator;

impl LineNumberDecorator {
    pub fn new() -> Self {
        Self
    }
}

impl SideDecorator for LineNumberDecorator {
    fn pref_width(&self, _viewport_width: f64) -> f64 {
        0.0
    }

    fn measurement_node(&self, top_index: usize) -> SideNode {
        // Wide enough for the numbers a screenful below the top.
        let digits = (top_index + 101).to_string().len();
        SideNode::new("8".repeat(digits))
    }

    fn node(&self, index: usize) -> Option<SideNode> {
        Some(SideNode::new((index + 1).to_string()))
    }
}

/// Round a column width up to a coarse step, so the gutter does not jitter
/// as its ideal width changes by a pixel while scrolling.
pub fn snap_side_width(width: f64) -> f64 {
    const GRANULARITY: f64 = 10.0;
    (((width + 1.0) / GRANULARITY).round() + 1.0) * GRANULARITY
}

/// A decorator with its node cache.
pub(crate) struct SideColumn {
    decorator: Arc<dyn SideDecorator>,
    cache: FastCache<SideNode>,
    width: f64,
}

impl SideColumn {
    pub(crate) fn new(decorator: Arc<dyn SideDecorator>, cache_size: usize) -> Self {
        Self {
            decorator,
            cache: FastCache::new(cache_size),
            width: 0.0,
        }
    }

    pub(crate) fn width(&self) -> f64 {
        self.width
    }

    /// Compute and store the column width.
    pub(crate) fn compute_width(&mut self, viewport_width: f64, top_index: usize, engine: &dyn TextLayoutEngine) -> f64 {
        let mut w = self.decorator.pref_width(viewport_width);
        if w <= 0.0 {
            let node = self.decorator.measurement_node(top_index);
            w = engine.measure_text(&node.text).width;
        }
        self.width = snap_side_width(w);
        self.width
    }

    /// Node for paragraph `index`, from the cache when possible.
    pub(crate) fn node(&mut self, index: usize) -> Option<SideNode> {
        if let Some(node) = self.cache.get(index) {
            return Some(node.clone());
        }
        let node = self.decorator.node(index)?;
        self.cache.put(index, node.clone());
        Some(node)
    }

    pub(crate) fn clear(&mut self) {
        self.cache.clear();
    }
}

impl std::fmt::Debug for SideColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SideColumn")
            .field("width", &self.width)
            .field("cached", &self.cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::MonospaceLayoutEngine;

    #[test]
    fn test_snap_side_width() {
        assert_eq!(snap_side_width(0.0), 10.0);
        assert_eq!(snap_side_width(24.0), 40.0);
        assert_eq!(snap_side_width(25.0), 40.0);
        assert_eq!(snap_side_width(33.0), 40.0);
        assert_eq!(snap_side_width(34.0), 50.0);
    }

    #[test]
    fn test_line_numbers() {
        let decorator = LineNumberDecorator::new();
        assert_eq!(decorator.node(0), Some(SideNode::new("1")));
        assert_eq!(decorator.measurement_node(0).text, "888");
        assert_eq!(decorator.measurement_node(9_950).text, "88888");
    }

    #[test]
    fn test_measured_column_width() {
        let engine = MonospaceLayoutEngine::new(8.0, 16.0);
        let mut column = SideColumn::new(Arc::new(LineNumberDecorator::new()), 4);
        // "888" measures 24 pixels.
        assert_eq!(column.compute_width(500.0, 0, &engine), 40.0);
        assert_eq!(column.node(5), Some(SideNode::new("6")));
    }

    struct Fixed;

    impl SideDecorator for Fixed {
        fn pref_width(&self, _viewport_width: f64) -> f64 {
            12.0
        }

        fn measurement_node(&self, _top_index: usize) -> SideNode {
            SideNode::new("unused because the width is fixed")
        }

        fn node(&self, _index: usize) -> Option<SideNode> {
            None
        }
    }

    #[test]
    fn test_pref_width_wins() {
        let engine = MonospaceLayoutEngine::default();
        let mut column = SideColumn::new(Arc::new(Fixed), 4);
        assert_eq!(column.compute_width(500.0, 0, &engine), 20.0);
        assert_eq!(column.node(0), None);
    }
}

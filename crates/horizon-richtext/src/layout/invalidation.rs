//! Deferred layout invalidation.
//!
//! Changes mark the flow dirty instead of laying out immediately. Any number
//! of requests between two passes coalesce into a single
//! [`VFlow::reconcile`](super::VFlow::reconcile) pass, which recomputes only
//! the stale pieces.

use std::collections::BTreeSet;

/// What the next pass must recompute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invalidation {
    /// Cells must be re-arranged.
    layout: bool,
    /// Drop every cached cell.
    clear_cache: bool,
    /// Drop cached cells of these paragraphs only.
    stale: BTreeSet<usize>,
    /// Caret and selection geometry must be rebuilt.
    geometry: bool,
    /// Side column caches must be dropped.
    decorators: bool,
}

impl Invalidation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a layout pass, keeping cached cells.
    pub fn request_layout(&mut self) {
        self.layout = true;
        self.geometry = true;
    }

    /// Request a layout pass after discarding every cached cell.
    pub fn invalidate_all(&mut self) {
        self.request_layout();
        self.clear_cache = true;
        self.stale.clear();
    }

    /// Request a layout pass after discarding the cells of `range`.
    pub fn invalidate_paragraphs(&mut self, range: std::ops::RangeInclusive<usize>) {
        self.request_layout();
        if !self.clear_cache {
            self.stale.extend(range);
        }
    }

    /// Request new caret and selection geometry only.
    pub fn invalidate_geometry(&mut self) {
        self.geometry = true;
    }

    pub fn invalidate_decorators(&mut self) {
        self.request_layout();
        self.decorators = true;
    }

    pub fn needs_layout(&self) -> bool {
        self.layout
    }

    pub fn needs_geometry(&self) -> bool {
        self.geometry
    }

    pub fn is_clean(&self) -> bool {
        !self.layout && !self.geometry
    }

    /// Take the pending work, leaving everything clean.
    pub fn take(&mut self) -> Pending {
        let taken = std::mem::take(self);
        Pending {
            layout: taken.layout,
            clear_cache: taken.clear_cache,
            stale: taken.stale,
            geometry: taken.geometry,
            decorators: taken.decorators,
        }
    }
}

/// Work taken from an [`Invalidation`] for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pending {
    pub layout: bool,
    pub clear_cache: bool,
    pub stale: BTreeSet<usize>,
    pub geometry: bool,
    pub decorators: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_coalesce() {
        let mut inv = Invalidation::new();
        assert!(inv.is_clean());
        inv.request_layout();
        inv.request_layout();
        inv.invalidate_paragraphs(2..=3);
        inv.invalidate_paragraphs(3..=4);

        let pending = inv.take();
        assert!(pending.layout);
        assert!(!pending.clear_cache);
        assert_eq!(pending.stale.into_iter().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert!(inv.is_clean());
    }

    #[test]
    fn test_clear_cache_supersedes_stale() {
        let mut inv = Invalidation::new();
        inv.invalidate_paragraphs(1..=1);
        inv.invalidate_all();
        inv.invalidate_paragraphs(5..=5);
        let pending = inv.take();
        assert!(pending.clear_cache);
        assert!(pending.stale.is_empty());
    }

    #[test]
    fn test_geometry_only() {
        let mut inv = Invalidation::new();
        inv.invalidate_geometry();
        assert!(!inv.needs_layout());
        assert!(inv.needs_geometry());
        assert!(!inv.is_clean());
    }
}

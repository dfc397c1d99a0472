//! Caret blink and auto-scroll.
//!
//! Both run on the context's [`TimerManager`](horizon_richtext_core::TimerManager)
//! and fire from [`RichTextArea::tick`].

use std::time::{Duration, Instant};

use horizon_richtext_core::TimerId;
use horizon_richtext_core::logging::targets;

use super::RichTextArea;

/// A running auto-scroll.
#[derive(Debug, Clone, Copy)]
pub(super) struct AutoScroll {
    timer: TimerId,
    up: bool,
    fast: bool,
}

impl RichTextArea {
    /// Advance to `now`: fire due timers and collect finished background
    /// searches. Does nothing once disposed.
    pub fn tick(&mut self, now: Instant) {
        if self.disposed {
            return;
        }
        self.now = now;
        let fired = self.context.timers_mut().process_expired(now);
        for id in fired {
            if self.blink == Some(id) {
                let visible = !self.flow.is_caret_visible();
                self.flow.set_caret_visible(visible);
            } else if self.auto_scroll.is_some_and(|a| a.timer == id) {
                self.auto_scroll_step();
            }
        }
        if let Some(matches) = self.search.poll(self.context.worker()) {
            self.search_results = Some(matches);
        }
    }

    /// Time until the next timer fires, for hosts that sleep between ticks.
    pub fn time_until_next_tick(&mut self, now: Instant) -> Option<Duration> {
        self.context.timers_mut().time_until_next(now)
    }

    // Caret blink

    pub fn caret_blink_period(&self) -> Duration {
        self.blink_period
    }

    /// Set the full blink cycle. A zero period keeps the caret steady.
    pub fn set_caret_blink_period(&mut self, period: Duration) {
        self.blink_period = period;
        if self.blink.is_some() {
            self.restart_blink();
        }
    }

    /// Whether the caret is in the shown half of its blink cycle.
    pub fn is_caret_visible(&self) -> bool {
        self.flow.is_caret_visible()
    }

    pub fn is_blinking(&self) -> bool {
        self.blink.is_some()
    }

    /// Show the caret and start a fresh blink cycle, toggling every half
    /// period.
    pub(super) fn restart_blink(&mut self) {
        self.stop_blink();
        let half = self.blink_period / 2;
        if self.disposed || half.is_zero() || self.selection.caret().is_none() {
            return;
        }
        self.blink = Some(self.context.start_repeating_timer(self.now, half));
    }

    pub(super) fn stop_blink(&mut self) {
        if let Some(id) = self.blink.take() {
            self.context.stop_timer(id);
        }
        self.flow.set_caret_visible(true);
    }

    // Auto-scroll

    /// Keep scrolling while a drag is `delta` pixels past the top
    /// (negative) or bottom edge. Far drags scroll in fast steps.
    pub fn auto_scroll(&mut self, delta: f64) {
        if self.disposed || self.use_content_height {
            return;
        }
        let config = self.context.config();
        let up = delta < 0.0;
        let fast = delta.abs() > config.auto_scroll_fast_threshold;
        let period = config.auto_scroll_period();
        match self.auto_scroll.as_mut() {
            Some(scroll) => {
                scroll.up = up;
                scroll.fast = fast;
            }
            None => {
                let timer = self.context.start_repeating_timer(self.now, period);
                tracing::trace!(target: targets::AREA, up, fast, "auto-scroll started");
                self.auto_scroll = Some(AutoScroll { timer, up, fast });
            }
        }
    }

    pub fn stop_auto_scroll(&mut self) {
        if let Some(scroll) = self.auto_scroll.take() {
            self.context.stop_timer(scroll.timer);
        }
    }

    pub fn is_auto_scrolling(&self) -> bool {
        self.auto_scroll.is_some()
    }

    /// Scroll one step and drag the caret to the viewport edge.
    fn auto_scroll_step(&mut self) {
        let Some(scroll) = self.auto_scroll else {
            return;
        };
        if self.use_content_height {
            return;
        }
        let config = self.context.config();
        let step = if scroll.fast {
            config.auto_scroll_step_fast
        } else {
            config.auto_scroll_step_slow
        };
        let delta = if scroll.up { -step } else { step };

        self.flow.scroll_vertical_pixels(delta);
        self.reconcile();

        let x = self.phantom_x.unwrap_or(0.0).max(0.0);
        let y = if scroll.up { 0.0 } else { self.flow.viewport_height() };
        self.flow.scroll_to_visible(x, y);
        self.reconcile();

        if let Some(pos) = self.flow.text_pos_at(x, y) {
            self.extend_selection(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crate::area::RichTextArea;
    use crate::config::EditorConfig;
    use crate::context::EditorContext;
    use crate::model::{StyledTextModel, TextPos};

    fn area_with(config: EditorConfig, text: &str) -> RichTextArea {
        let context = EditorContext::new(config).unwrap();
        RichTextArea::with_model(context, StyledTextModel::with_text(text))
    }

    fn lines(n: usize) -> String {
        (0..n).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_blink_toggles_every_half_period() {
        let mut area = area_with(EditorConfig::default(), "abc");
        let t0 = Instant::now();
        area.tick(t0);
        area.select_caret(TextPos::ZERO);
        assert!(area.is_blinking());
        assert!(area.is_caret_visible());

        area.tick(t0 + Duration::from_millis(500));
        assert!(!area.is_caret_visible());
        area.tick(t0 + Duration::from_millis(1000));
        assert!(area.is_caret_visible());
    }

    #[test]
    fn test_selection_change_restarts_blink() {
        let mut area = area_with(EditorConfig::default(), "abc");
        let t0 = Instant::now();
        area.tick(t0);
        area.select_caret(TextPos::ZERO);
        area.tick(t0 + Duration::from_millis(500));
        assert!(!area.is_caret_visible());

        area.select_caret(TextPos::leading(0, 1));
        assert!(area.is_caret_visible());
        // a new cycle started at the last tick
        area.tick(t0 + Duration::from_millis(900));
        assert!(area.is_caret_visible());
        area.tick(t0 + Duration::from_millis(1000));
        assert!(!area.is_caret_visible());
    }

    #[test]
    fn test_zero_period_keeps_caret_steady() {
        let mut area = area_with(EditorConfig::default(), "abc");
        area.set_caret_blink_period(Duration::ZERO);
        area.select_caret(TextPos::ZERO);
        assert!(!area.is_blinking());
        assert!(area.is_caret_visible());
    }

    #[test]
    fn test_clear_selection_stops_blink() {
        let mut area = area_with(EditorConfig::default(), "abc");
        area.select_caret(TextPos::ZERO);
        area.clear_selection();
        assert!(!area.is_blinking());
        assert_eq!(area.context().timers().active_count(), 0);
    }

    #[test]
    fn test_auto_scroll_extends_selection_down() {
        let mut area = area_with(EditorConfig::default(), &lines(100));
        area.set_size(200.0, 160.0);
        area.reconcile();
        let t0 = Instant::now();
        area.tick(t0);
        area.select_caret(TextPos::ZERO);

        area.auto_scroll(50.0);
        assert!(area.is_auto_scrolling());
        area.tick(t0 + Duration::from_millis(100));

        // a slow step of 20px, then the caret follows the bottom edge
        assert!(area.flow().origin().index() >= 1);
        assert_eq!(area.anchor_position(), Some(TextPos::ZERO));
        let caret = area.caret_position().unwrap();
        assert!(caret.index() >= 10);

        area.stop_auto_scroll();
        assert!(!area.is_auto_scrolling());
    }

    #[test]
    fn test_auto_scroll_disabled_with_content_height() {
        let config = EditorConfig {
            use_content_height: true,
            ..Default::default()
        };
        let mut area = area_with(config, "abc");
        area.auto_scroll(-500.0);
        assert!(!area.is_auto_scrolling());
    }

    #[test]
    fn test_dispose_stops_timers() {
        let mut area = area_with(EditorConfig::default(), &lines(10));
        let t0 = Instant::now();
        area.tick(t0);
        area.select_caret(TextPos::ZERO);
        area.auto_scroll(10.0);
        assert_eq!(area.context().timers().active_count(), 2);

        area.dispose();
        assert_eq!(area.context().timers().active_count(), 0);
        area.tick(t0 + Duration::from_secs(10));
        assert!(area.is_caret_visible());
        assert!(!area.is_auto_scrolling());
    }
}

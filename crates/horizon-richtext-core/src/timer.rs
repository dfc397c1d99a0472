//! Cooperative timers for caret blinking and auto-scroll.
//!
//! The manager never spawns threads and never reads the clock on its own: the
//! owner passes the current [`Instant`] in and receives the IDs of the timers
//! that fired. This keeps every periodic callback on the UI thread and makes
//! the whole schedule deterministic under test.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use slotmap::{SlotMap, new_key_type};

use crate::error::TimerError;

new_key_type! {
    /// A unique identifier for a timer.
    pub struct TimerId;
}

/// The type of timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Fires once after the specified duration.
    OneShot,
    /// Fires repeatedly at the specified interval.
    Repeating,
}

#[derive(Debug)]
struct TimerData {
    next_fire: Instant,
    interval: Duration,
    kind: TimerKind,
}

/// An entry in the timer queue (min-heap by fire time).
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    fire_time: Instant,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_time == other.fire_time
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other.fire_time.cmp(&self.fire_time)
    }
}

/// Manages the periodic and one-shot timers of one editor.
#[derive(Debug, Default)]
pub struct TimerManager {
    timers: SlotMap<TimerId, TimerData>,
    queue: BinaryHeap<TimerQueueEntry>,
}

impl TimerManager {
    /// Create a new timer manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a one-shot timer that fires `duration` after `now`.
    pub fn start_one_shot(&mut self, now: Instant, duration: Duration) -> TimerId {
        self.insert(now, duration, TimerKind::OneShot)
    }

    /// Start a repeating timer. The first fire occurs `interval` after `now`.
    pub fn start_repeating(&mut self, now: Instant, interval: Duration) -> TimerId {
        self.insert(now, interval, TimerKind::Repeating)
    }

    fn insert(&mut self, now: Instant, interval: Duration, kind: TimerKind) -> TimerId {
        let next_fire = now + interval;
        let id = self.timers.insert(TimerData {
            next_fire,
            interval,
            kind,
        });
        self.queue.push(TimerQueueEntry {
            id,
            fire_time: next_fire,
        });
        tracing::trace!(target: "horizon_richtext_core::timer", ?id, ?kind, ?interval, "timer started");
        id
    }

    /// Stop and remove a timer.
    pub fn stop(&mut self, id: TimerId) -> Result<(), TimerError> {
        if self.timers.remove(id).is_some() {
            tracing::trace!(target: "horizon_richtext_core::timer", ?id, "timer stopped");
            Ok(())
        } else {
            Err(TimerError::InvalidTimerId)
        }
    }

    /// Stop every timer. Nothing fires after this returns.
    pub fn stop_all(&mut self) {
        self.timers.clear();
        self.queue.clear();
    }

    /// Check if a timer is currently active.
    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// Get the duration from `now` until the next timer fires, if any.
    pub fn time_until_next(&mut self, now: Instant) -> Option<Duration> {
        self.discard_stale();
        self.queue
            .peek()
            .map(|entry| entry.fire_time.saturating_duration_since(now))
    }

    // Stopped timers leave their queue entries behind; drop them lazily.
    fn discard_stale(&mut self) {
        while let Some(entry) = self.queue.peek() {
            let live = self
                .timers
                .get(entry.id)
                .is_some_and(|t| t.next_fire == entry.fire_time);
            if live {
                break;
            }
            self.queue.pop();
        }
    }

    /// Process all timers due at `now`, returning the IDs that fired in
    /// fire-time order.
    ///
    /// A repeating timer fires at most once per call; its next fire is
    /// rescheduled relative to `now`.
    #[tracing::instrument(skip(self), target = "horizon_richtext_core::timer", level = "trace")]
    pub fn process_expired(&mut self, now: Instant) -> Vec<TimerId> {
        let mut fired = Vec::new();
        let mut rescheduled = Vec::new();

        while let Some(entry) = self.queue.peek().copied() {
            if entry.fire_time > now {
                break;
            }
            self.queue.pop();

            let Some(timer) = self.timers.get_mut(entry.id) else {
                continue;
            };
            if timer.next_fire != entry.fire_time {
                continue;
            }

            tracing::trace!(target: "horizon_richtext_core::timer", id = ?entry.id, "timer fired");
            fired.push(entry.id);

            match timer.kind {
                TimerKind::OneShot => {
                    self.timers.remove(entry.id);
                }
                TimerKind::Repeating => {
                    timer.next_fire = now + timer.interval;
                    rescheduled.push(TimerQueueEntry {
                        id: entry.id,
                        fire_time: timer.next_fire,
                    });
                }
            }
        }

        self.queue.extend(rescheduled);
        fired
    }

    /// Get the number of active timers.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_one_shot_fires_once() {
        let start = Instant::now();
        let mut timers = TimerManager::new();
        let id = timers.start_one_shot(start, 10 * MS);

        assert!(timers.process_expired(start + 5 * MS).is_empty());
        assert_eq!(timers.process_expired(start + 10 * MS), vec![id]);
        assert!(!timers.is_active(id));
        assert!(timers.process_expired(start + 100 * MS).is_empty());
    }

    #[test]
    fn test_repeating_reschedules() {
        let start = Instant::now();
        let mut timers = TimerManager::new();
        let id = timers.start_repeating(start, 10 * MS);

        assert_eq!(timers.process_expired(start + 10 * MS), vec![id]);
        assert_eq!(timers.time_until_next(start + 10 * MS), Some(10 * MS));
        // A long stall still fires only once per call.
        assert_eq!(timers.process_expired(start + 95 * MS), vec![id]);
        assert!(timers.is_active(id));
    }

    #[test]
    fn test_stop_prevents_fire() {
        let start = Instant::now();
        let mut timers = TimerManager::new();
        let id = timers.start_repeating(start, 10 * MS);

        timers.stop(id).unwrap();
        assert!(timers.process_expired(start + 50 * MS).is_empty());
        assert_eq!(timers.stop(id), Err(TimerError::InvalidTimerId));
        assert_eq!(timers.time_until_next(start), None);
    }

    #[test]
    fn test_fire_order_and_stop_all() {
        let start = Instant::now();
        let mut timers = TimerManager::new();
        let slow = timers.start_one_shot(start, 20 * MS);
        let fast = timers.start_one_shot(start, 5 * MS);

        assert_eq!(timers.process_expired(start + 30 * MS), vec![fast, slow]);

        timers.start_repeating(start, MS);
        timers.start_repeating(start, 2 * MS);
        assert_eq!(timers.active_count(), 2);
        timers.stop_all();
        assert_eq!(timers.active_count(), 0);
        assert!(timers.process_expired(start + 10 * MS).is_empty());
    }
}

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct PendingTimer<E> {
    id: TimerId,
    due_at: Duration,
    event: E,
}

/// One-shot delayed events on the simulation clock. Events fire from `tick`
/// in due order, ties broken by scheduling order.
#[derive(Debug)]
pub struct TimerQueue<E> {
    now: Duration,
    next_id: u64,
    pending: Vec<PendingTimer<E>>,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn delayed_call(&mut self, delay: Duration, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.pending.push(PendingTimer {
            id,
            due_at: self.now.saturating_add(delay),
            event,
        });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.id != id);
        self.pending.len() != before
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|timer| timer.id == id)
    }

    pub fn remaining(&self, id: TimerId) -> Option<Duration> {
        self.pending
            .iter()
            .find(|timer| timer.id == id)
            .map(|timer| timer.due_at.saturating_sub(self.now))
    }

    /// Drops every pending event without firing it. The clock keeps running.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn tick(&mut self, dt: Duration) -> Vec<E> {
        self.now = self.now.saturating_add(dt);
        if self.pending.iter().all(|timer| timer.due_at > self.now) {
            return Vec::new();
        }

        let now = self.now;
        let (mut due, waiting): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|timer| timer.due_at <= now);
        self.pending = waiting;
        due.sort_by_key(|timer| (timer.due_at, timer.id));
        due.into_iter().map(|timer| timer.event).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick_ms(queue: &mut TimerQueue<&'static str>, ms: u64) -> Vec<&'static str> {
        queue.tick(Duration::from_millis(ms))
    }

    #[test]
    fn event_fires_once_after_delay() {
        let mut queue = TimerQueue::new();
        queue.delayed_call(Duration::from_millis(100), "revert");

        assert!(tick_ms(&mut queue, 99).is_empty());
        assert_eq!(tick_ms(&mut queue, 1), vec!["revert"]);
        assert!(tick_ms(&mut queue, 1000).is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn events_fire_in_due_order() {
        let mut queue = TimerQueue::new();
        queue.delayed_call(Duration::from_millis(300), "late");
        queue.delayed_call(Duration::from_millis(100), "early");
        queue.delayed_call(Duration::from_millis(100), "early_second");

        assert_eq!(
            tick_ms(&mut queue, 500),
            vec!["early", "early_second", "late"]
        );
    }

    #[test]
    fn cancelled_events_never_fire() {
        let mut queue = TimerQueue::new();
        let id = queue.delayed_call(Duration::from_millis(100), "revert");
        assert!(queue.is_pending(id));
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        assert!(tick_ms(&mut queue, 200).is_empty());
    }

    #[test]
    fn remaining_tracks_clock() {
        let mut queue = TimerQueue::new();
        let id = queue.delayed_call(Duration::from_millis(100), "revert");
        tick_ms(&mut queue, 40);
        assert_eq!(queue.remaining(id), Some(Duration::from_millis(60)));
    }

    #[test]
    fn clear_drops_pending_without_firing() {
        let mut queue = TimerQueue::new();
        queue.delayed_call(Duration::from_millis(10), "a");
        queue.delayed_call(Duration::from_millis(20), "b");
        queue.clear();
        assert!(tick_ms(&mut queue, 100).is_empty());
        assert_eq!(queue.now(), Duration::from_millis(100));
    }
}

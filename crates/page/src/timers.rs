//! Page clock and one-shot timers.
//!
//! The clock is a `Duration` since page start and only moves when the embedder advances it.
//! Due timers fire in deadline order; equal deadlines fire in scheduling order.
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use core_types::{RequestId, TimerId};
use html::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageTimer {
    /// A navigation outlived its grace period; start the loading indicator for it.
    NavGrace { request_id: RequestId },
    IndicatorGrace,
    IndicatorFadeDone { overlay: NodeId },
    ToastReveal { toast: NodeId },
    ToastDismiss { toast: NodeId },
    ToastRemove { toast: NodeId },
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_id: TimerId,
    queue: BTreeMap<(Duration, TimerId), PageTimer>,
    deadlines: HashMap<TimerId, Duration>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, timer: PageTimer) -> TimerId {
        self.next_id += 1;
        let id = self.next_id;
        let deadline = self.now + delay;
        self.queue.insert((deadline, id), timer);
        self.deadlines.insert(id, deadline);
        log::trace!("timer {id} {timer:?} due at {deadline:?}");
        id
    }

    /// Returns whether the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(deadline) => self.queue.remove(&(deadline, id)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Remove and return the earliest timer due at or before `until`, moving the clock to
    /// its deadline.
    pub(crate) fn pop_due(&mut self, until: Duration) -> Option<(TimerId, PageTimer)> {
        let (&(deadline, id), _) = self.queue.first_key_value()?;
        if deadline > until {
            return None;
        }
        let timer = self.queue.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        if deadline > self.now {
            self.now = deadline;
        }
        Some((id, timer))
    }

    /// The clock never moves backwards.
    pub(crate) fn settle(&mut self, now: Duration) {
        if now > self.now {
            self.now = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn fires_in_deadline_then_creation_order() {
        let mut s = Scheduler::new();
        let late = s.schedule(ms(30), PageTimer::IndicatorGrace);
        let a = s.schedule(ms(10), PageTimer::NavGrace { request_id: 1 });
        let b = s.schedule(ms(10), PageTimer::NavGrace { request_id: 2 });

        let order: Vec<TimerId> = std::iter::from_fn(|| s.pop_due(ms(100)).map(|(id, _)| id)).collect();
        assert_eq!(order, vec![a, b, late]);
        assert_eq!(s.now(), ms(30));
    }

    #[test]
    fn cancel_removes_pending_timer_once() {
        let mut s = Scheduler::new();
        let id = s.schedule(ms(5), PageTimer::IndicatorGrace);
        assert!(s.is_pending(id));
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert_eq!(s.next_deadline(), None);
        assert!(s.pop_due(ms(50)).is_none());
    }

    #[test]
    fn not_yet_due_stays_queued() {
        let mut s = Scheduler::new();
        s.schedule(ms(50), PageTimer::IndicatorGrace);
        assert!(s.pop_due(ms(49)).is_none());
        assert_eq!(s.next_deadline(), Some(ms(50)));
        s.settle(ms(49));
        s.settle(ms(10));
        assert_eq!(s.now(), ms(49));
    }
}

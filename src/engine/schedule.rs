//! Cancellable deferred actions
//!
//! The engines never sleep. Work that must happen "later" (the settle delay
//! between phases) is scheduled here and fires once enough tick time has
//! been fed through [`DeferredQueue::advance`]. Every scheduled action is
//! identified by a [`DeferredHandle`]; cancelling the handle guarantees the
//! action will never be returned.

use std::time::Duration;

/// Identifies one scheduled action. Handles are never reused by a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeferredHandle(u64);

#[derive(Debug)]
struct Pending<T> {
    handle: DeferredHandle,
    remaining: Duration,
    action: T,
}

/// Queue of actions due after a delay measured in tick time.
#[derive(Debug)]
pub struct DeferredQueue<T> {
    next_id: u64,
    pending: Vec<Pending<T>>,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> DeferredQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `action` to fire after `delay` of tick time.
    ///
    /// A zero delay fires on the next call to [`advance`](Self::advance).
    pub fn schedule(&mut self, delay: Duration, action: T) -> DeferredHandle {
        let handle = DeferredHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            handle,
            remaining: delay,
            action,
        });
        handle
    }

    /// Cancels a scheduled action.
    ///
    /// Returns `true` if the action was still pending.
    pub fn cancel(&mut self, handle: DeferredHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        self.pending.len() != before
    }

    /// Cancels everything, returning how many actions were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }

    /// Returns whether `handle` is still waiting to fire.
    #[must_use]
    pub fn is_pending(&self, handle: DeferredHandle) -> bool {
        self.pending.iter().any(|p| p.handle == handle)
    }

    /// Number of pending actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Feeds `dt` of tick time and returns the actions that became due,
    /// earliest first, ties in scheduling order.
    pub fn advance(&mut self, dt: Duration) -> Vec<(DeferredHandle, T)> {
        if self.pending.is_empty() {
            return Vec::new();
        }

        let mut due = Vec::new();
        let mut kept = Vec::with_capacity(self.pending.len());
        for mut p in self.pending.drain(..) {
            if p.remaining <= dt {
                due.push((p.remaining, p.handle, p.action));
            } else {
                p.remaining -= dt;
                kept.push(p);
            }
        }
        self.pending = kept;

        // stable: equal deadlines keep scheduling order
        due.sort_by_key(|(remaining, _, _)| *remaining);
        due.into_iter()
            .map(|(_, handle, action)| (handle, action))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_fires_after_delay() {
        let mut q = DeferredQueue::new();
        let h = q.schedule(ms(500), "advance");

        assert!(q.advance(ms(200)).is_empty());
        assert!(q.is_pending(h));
        assert!(q.advance(ms(299)).is_empty());

        let fired = q.advance(ms(1));
        assert_eq!(fired, vec![(h, "advance")]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_cancelled_never_fires() {
        let mut q = DeferredQueue::new();
        let h = q.schedule(ms(100), 1);
        assert!(q.cancel(h));
        assert!(!q.cancel(h));
        assert!(q.advance(ms(1000)).is_empty());
    }

    #[test]
    fn test_zero_delay_fires_on_next_advance() {
        let mut q = DeferredQueue::new();
        let h = q.schedule(Duration::ZERO, ());
        assert_eq!(q.advance(Duration::ZERO), vec![(h, ())]);
    }

    #[test]
    fn test_due_order() {
        let mut q = DeferredQueue::new();
        let late = q.schedule(ms(300), "late");
        let early = q.schedule(ms(100), "early");
        let tie = q.schedule(ms(100), "tie");

        let fired = q.advance(ms(400));
        assert_eq!(fired, vec![(early, "early"), (tie, "tie"), (late, "late")]);
    }

    #[test]
    fn test_handles_are_unique() {
        let mut q = DeferredQueue::new();
        let a = q.schedule(ms(1), ());
        q.advance(ms(1));
        let b = q.schedule(ms(1), ());
        assert_ne!(a, b);
    }

    #[test]
    fn test_cancel_all() {
        let mut q = DeferredQueue::new();
        q.schedule(ms(1), ());
        q.schedule(ms(2), ());
        assert_eq!(q.cancel_all(), 2);
        assert_eq!(q.len(), 0);
    }
}

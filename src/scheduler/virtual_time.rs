use std::{collections::BTreeMap, sync::Arc, time::Duration};

use parking_lot::Mutex;

use super::{Scheduler, Task};
use crate::subscribe::{Subscription, UnsubscribeLogic};

struct VirtualState {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<(Duration, u64), Task>,
}

/// Scheduler whose clock only moves when told to.
///
/// Tasks run inside [`advance_by`](Self::advance_by) / [`advance_to`](Self::advance_to)
/// on the calling thread, ordered by due time and, for equal due times, by the
/// order in which they were scheduled. This makes time-based operators fully
/// deterministic in tests.
#[derive(Clone)]
pub struct VirtualTimeScheduler {
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualTimeScheduler {
    #[must_use]
    pub fn new() -> Self {
        VirtualTimeScheduler {
            state: Arc::new(Mutex::new(VirtualState {
                now: Duration::ZERO,
                next_id: 0,
                queue: BTreeMap::new(),
            })),
        }
    }

    /// Move the clock forward by `duration`, running every task that falls due.
    pub fn advance_by(&self, duration: Duration) {
        let target = self.now() + duration;
        self.advance_to(target);
    }

    /// Move the clock to `target`, running every task due at or before it. Tasks
    /// scheduled by running tasks are picked up in the same pass.
    pub fn advance_to(&self, target: Duration) {
        loop {
            let task = {
                let mut state = self.state.lock();
                let key = match state.queue.keys().next() {
                    Some(key) if key.0 <= target => *key,
                    _ => break,
                };
                if state.now < key.0 {
                    state.now = key.0;
                }
                state.queue.remove(&key)
            };
            if let Some(task) = task {
                task();
            }
        }

        let mut state = self.state.lock();
        if state.now < target {
            state.now = target;
        }
    }

    /// Number of tasks waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Handles, clones and queued tasks still referring to this clock.
    #[cfg(test)]
    pub(crate) fn references(&self) -> usize {
        Arc::strong_count(&self.state)
    }
}

impl Default for VirtualTimeScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for VirtualTimeScheduler {
    fn now(&self) -> Duration {
        self.state.lock().now
    }

    fn schedule(&self, delay: Duration, task: Task) -> Subscription {
        let mut state = self.state.lock();
        let key = (state.now + delay, state.next_id);
        state.next_id += 1;

        let queue = Arc::clone(&self.state);
        let subscription = Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
            queue.lock().queue.remove(&key);
        })));
        let finished = subscription.finish_handle();
        state.queue.insert(
            key,
            Box::new(move || {
                finished.finish();
                task();
            }),
        );
        subscription
    }
}

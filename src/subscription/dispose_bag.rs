use std::sync::Arc;

use parking_lot::Mutex;

use super::subscribe::{Subscription, Unsubscribeable};

struct BagState {
    subscriptions: Vec<Subscription>,
    disposed: bool,
}

/// An owned set of subscriptions released together.
///
/// Every `Subscription` added to the bag is released exactly once, either by an
/// explicit [`dispose`](DisposeBag::dispose) or when the last handle of the bag is
/// dropped. Subscriptions inserted after the bag was disposed are released
/// immediately.
///
/// ```
/// use rxstudy::{DisposeBag, Observable, Subscribeable, Subscriber};
///
/// let bag = DisposeBag::new();
/// Observable::of([1, 2, 3])
///     .subscribe(Subscriber::on_next(|v| println!("{v}")))
///     .disposed_by(&bag);
/// bag.dispose();
/// ```
#[derive(Clone)]
pub struct DisposeBag {
    state: Arc<Mutex<BagState>>,
}

impl DisposeBag {
    #[must_use]
    pub fn new() -> Self {
        DisposeBag {
            state: Arc::new(Mutex::new(BagState {
                subscriptions: Vec::new(),
                disposed: false,
            })),
        }
    }

    pub fn insert(&self, subscription: Subscription) {
        {
            let mut state = self.state.lock();
            if !state.disposed {
                // Drop handles of streams that already terminated.
                state.subscriptions.retain(|s| !s.is_closed());
                state.subscriptions.push(subscription);
                return;
            }
        }
        subscription.unsubscribe();
    }

    /// Number of handles currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    /// Release every held subscription and mark the bag disposed.
    pub fn dispose(&self) {
        let subscriptions = {
            let mut state = self.state.lock();
            state.disposed = true;
            std::mem::take(&mut state.subscriptions)
        };
        if !subscriptions.is_empty() {
            tracing::debug!(count = subscriptions.len(), "disposing subscriptions");
        }
        for s in subscriptions {
            s.unsubscribe();
        }
    }
}

impl Default for DisposeBag {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DisposeBag {
    fn drop(&mut self) {
        // Only the last handle releases the bag.
        if Arc::strong_count(&self.state) == 1 {
            self.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::subscribe::UnsubscribeLogic;

    fn counting_subscription(counter: &Arc<AtomicUsize>) -> Subscription {
        let counter = Arc::clone(counter);
        Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })))
    }

    #[test]
    fn dispose_releases_each_subscription_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let bag = DisposeBag::new();

        for _ in 0..3 {
            counting_subscription(&released).disposed_by(&bag);
        }
        assert_eq!(bag.len(), 3);

        bag.dispose();
        bag.dispose();

        assert_eq!(released.load(Ordering::SeqCst), 3);
        assert!(bag.is_empty());
        assert!(bag.is_disposed());
    }

    #[test]
    fn insert_after_dispose_releases_immediately() {
        let released = Arc::new(AtomicUsize::new(0));
        let bag = DisposeBag::new();
        bag.dispose();

        counting_subscription(&released).disposed_by(&bag);

        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(bag.is_empty());
    }

    #[test]
    fn dropping_last_handle_disposes() {
        let released = Arc::new(AtomicUsize::new(0));
        let bag = DisposeBag::new();
        let clone = bag.clone();
        counting_subscription(&released).disposed_by(&bag);

        drop(clone);
        assert_eq!(released.load(Ordering::SeqCst), 0);

        drop(bag);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}

use std::time::Duration;

use tokio::{runtime::Handle, time::Instant};

use super::{Scheduler, Task};
use crate::{
    subscribe::{Subscription, UnsubscribeLogic},
    RxError,
};

/// Real-time scheduler backed by a Tokio runtime.
///
/// Every scheduled task becomes a Tokio task that sleeps for the requested delay
/// before running. Unsubscribing aborts the task.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    handle: Handle,
    origin: Instant,
}

impl TokioScheduler {
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        TokioScheduler {
            handle,
            origin: Instant::now(),
        }
    }

    /// Scheduler bound to the runtime of the calling context.
    ///
    /// # Errors
    ///
    /// Returns [`RxError::SchedulerUnavailable`] when called outside of a Tokio
    /// runtime.
    pub fn try_current() -> Result<Self, RxError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| RxError::SchedulerUnavailable)
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn schedule(&self, delay: Duration, task: Task) -> Subscription {
        tracing::trace!(?delay, "spawning scheduled task");
        let subscription = Subscription::empty();
        let finished = subscription.finish_handle();
        let join_handle = self.handle.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            finished.finish();
            task();
        });
        // Aborting a task that already ran is a no-op.
        subscription.attach(UnsubscribeLogic::Logic(Box::new(move || {
            join_handle.abort();
        })));
        subscription
    }
}

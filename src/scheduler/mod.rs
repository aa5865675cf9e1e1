//! Clocks that drive the time-based operators.
//!
//! `timer`, `interval`, `delay`, `buffer` and `window` never sleep themselves; they
//! hand work to a [`Scheduler`]. [`TokioScheduler`] runs the work on a Tokio runtime
//! in real time, while [`VirtualTimeScheduler`] only moves when a test advances it.

mod tokio_scheduler;
mod virtual_time;

pub use tokio_scheduler::TokioScheduler;
pub use virtual_time::VirtualTimeScheduler;

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::subscribe::{SerialSubscription, Subscription};

/// A unit of scheduled work.
pub type Task = Box<dyn FnOnce() + Send>;

/// The timing authority used by time-based operators.
pub trait Scheduler: Send + Sync + 'static {
    /// Time elapsed on this scheduler's clock since it was created.
    fn now(&self) -> Duration;

    /// Run `task` once after `delay`. Unsubscribing the returned `Subscription`
    /// before the task runs prevents it from running.
    fn schedule(&self, delay: Duration, task: Task) -> Subscription;
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn schedule(&self, delay: Duration, task: Task) -> Subscription {
        (**self).schedule(delay, task)
    }
}

type Tick = Arc<Mutex<dyn FnMut(u64) -> bool + Send>>;

/// Run `tick(0)` after `initial_delay` and then `tick(n)` every `period` for as long
/// as `tick` returns `true` and the returned subscription is not released.
pub fn schedule_periodic<S>(
    scheduler: &S,
    initial_delay: Duration,
    period: Duration,
    tick: impl FnMut(u64) -> bool + Send + 'static,
) -> Subscription
where
    S: Scheduler + Clone,
{
    let serial = SerialSubscription::new();
    let tick: Tick = Arc::new(Mutex::new(tick));
    schedule_tick(scheduler.clone(), serial.clone(), tick, 0, initial_delay, period);
    serial.to_subscription()
}

fn schedule_tick<S>(
    scheduler: S,
    serial: SerialSubscription,
    tick: Tick,
    count: u64,
    delay: Duration,
    period: Duration,
) where
    S: Scheduler + Clone,
{
    if serial.is_disposed() {
        return;
    }
    let next_scheduler = scheduler.clone();
    let next_serial = serial.clone();

    let handle = scheduler.schedule(
        delay,
        Box::new(move || {
            if next_serial.is_disposed() {
                return;
            }
            let keep_going = (&mut *tick.lock())(count);
            if keep_going {
                schedule_tick(next_scheduler, next_serial, tick, count + 1, period, period);
            }
        }),
    );
    serial.set(count, handle);
}

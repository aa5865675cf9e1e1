use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{
    observer::Observer,
    scheduler::{schedule_periodic, Scheduler},
    subscription::subscribe::{Subscribeable, Subscription},
    ObservableError,
};

use super::Observable;

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    /// Emits every value of `values` in order and then completes.
    pub fn of<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let values: Vec<T> = values.into_iter().collect();

        Observable::new(move |mut o| {
            for v in &values {
                if o.is_closed() {
                    break;
                }
                o.next(v.clone());
            }
            o.complete();
            Subscription::empty()
        })
    }

    /// Emits a single value and completes.
    pub fn just(value: T) -> Self {
        Self::of([value])
    }

    /// Emits `value` forever.
    ///
    /// The producer stops only once the subscriber is closed, so pair it with an
    /// operator such as `take` when subscribing synchronously.
    pub fn repeat_element(value: T) -> Self {
        Observable::new(move |mut o| {
            while !o.is_closed() {
                o.next(value.clone());
            }
            Subscription::empty()
        })
    }
}

impl<T: Send + 'static> Observable<T> {
    /// Emits the items of a fresh iterator over `iterable` for every subscription.
    pub fn from_iter<I>(iterable: I) -> Self
    where
        I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
    {
        Observable::new(move |mut o| {
            for v in iterable.clone() {
                if o.is_closed() {
                    break;
                }
                o.next(v);
            }
            o.complete();
            Subscription::empty()
        })
    }

    /// Completes immediately without emitting.
    pub fn empty() -> Self {
        Observable::new(|mut o| {
            o.complete();
            Subscription::empty()
        })
    }

    /// Never emits and never terminates.
    pub fn never() -> Self {
        Observable::new(|_| Subscription::empty())
    }

    /// Terminates immediately with `error`.
    pub fn error(error: ObservableError) -> Self {
        Observable::new(move |mut o| {
            o.error(Arc::clone(&error));
            Subscription::empty()
        })
    }

    /// Calls `factory` on every subscription and subscribes to the observable it
    /// returns.
    pub fn deferred<F>(factory: F) -> Self
    where
        F: Fn() -> Observable<T> + Send + Sync + 'static,
    {
        Observable::new(move |o| factory().subscribe(o))
    }
}

impl Observable<i64> {
    /// Emits `count` consecutive integers starting at `start`, then completes.
    pub fn range(start: i64, count: usize) -> Self {
        Observable::from_iter((0..count as i64).map(move |i| start + i))
    }
}

impl Observable<u64> {
    /// Emits `0` once `due` has elapsed on `scheduler`, then completes.
    pub fn timer<S>(due: Duration, scheduler: S) -> Self
    where
        S: Scheduler + Clone,
    {
        Observable::new(move |o| {
            let o = Arc::new(Mutex::new(o));
            scheduler.schedule(
                due,
                Box::new(move || {
                    let mut o = o.lock();
                    o.next(0);
                    o.complete();
                }),
            )
        })
    }

    /// Emits `0` once `due` has elapsed and then the next number every `period`.
    pub fn timer_periodic<S>(due: Duration, period: Duration, scheduler: S) -> Self
    where
        S: Scheduler + Clone,
    {
        Observable::new(move |o| {
            let o = Arc::new(Mutex::new(o));
            schedule_periodic(&scheduler, due, period, move |n| {
                let mut o = o.lock();
                o.next(n);
                !o.is_closed()
            })
        })
    }

    /// Emits `0, 1, 2, ...` every `period`.
    pub fn interval<S>(period: Duration, scheduler: S) -> Self
    where
        S: Scheduler + Clone,
    {
        Self::timer_periodic(period, period, scheduler)
    }
}

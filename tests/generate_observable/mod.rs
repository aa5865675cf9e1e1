#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc, Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use rxstudy::{
    subscribe::{Subscriber, Subscription},
    Observable, Observer,
};

use crate::custom_error::custom_error;

/// Emits `0..=end` from a background thread, one value per millisecond, and
/// reports the last emitted value through `last_emit` once the thread stops.
pub fn generate_u32_observable(end: u32, last_emit: mpsc::Sender<u32>) -> Observable<u32> {
    let last_emit = Arc::new(Mutex::new(last_emit));

    Observable::new(move |mut o: Subscriber<_>| {
        let last_emit = Arc::clone(&last_emit);

        std::thread::spawn(move || {
            let mut last = 0;

            for i in 0..=end {
                if o.is_closed() {
                    break;
                }
                last = i;
                o.next(i);
                std::thread::sleep(Duration::from_millis(1));
            }
            o.complete();
            let _ = last_emit.lock().send(last);
        });

        Subscription::empty()
    })
}

/// Emits `values` and then fails with `custom_error()`, counting subscriptions in
/// `subscriptions`.
pub fn generate_failing_observable(
    values: Vec<i32>,
    subscriptions: Arc<AtomicUsize>,
) -> Observable<i32> {
    Observable::new(move |mut o: Subscriber<_>| {
        subscriptions.fetch_add(1, Ordering::SeqCst);
        for v in &values {
            o.next(*v);
        }
        o.error(custom_error());
        Subscription::empty()
    })
}

/// Fails on the first `failures` subscriptions and completes after emitting
/// `values` afterwards.
pub fn generate_flaky_observable(values: Vec<i32>, failures: usize) -> Observable<i32> {
    let attempts = Arc::new(AtomicUsize::new(0));

    Observable::new(move |mut o: Subscriber<_>| {
        let attempt = attempts.fetch_add(1, Ordering::SeqCst);
        for v in &values {
            o.next(*v);
        }
        if attempt < failures {
            o.error(custom_error());
        } else {
            o.complete();
        }
        Subscription::empty()
    })
}

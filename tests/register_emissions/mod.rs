#![allow(dead_code)]

use std::{fmt::Debug, sync::Arc};

use parking_lot::Mutex;
use rxstudy::{subscribe::Subscriber, Notification};

pub fn register_emissions_subscriber<T: Send + 'static>() -> (
    Vec<impl FnOnce() -> Subscriber<T>>,
    Arc<Mutex<Vec<T>>>,
    Arc<Mutex<Vec<i32>>>,
    Arc<Mutex<Vec<String>>>,
) {
    let nexts: Vec<T> = Vec::with_capacity(5);
    let nexts = Arc::new(Mutex::new(nexts));
    let nexts_c = Arc::clone(&nexts);

    let completes: Vec<i32> = Vec::with_capacity(5);
    let completes = Arc::new(Mutex::new(completes));
    let completes_c = Arc::clone(&completes);

    let errors: Vec<String> = Vec::with_capacity(5);
    let errors = Arc::new(Mutex::new(errors));
    let errors_c = Arc::clone(&errors);

    let make_subscriber = vec![
        move || {
            Subscriber::new(
                move |n| {
                    // Track next() calls.
                    nexts_c.lock().push(n);
                },
                move |e| {
                    // Track error() calls.
                    errors_c.lock().push(e.to_string());
                },
                move || {
                    // Track complete() calls.
                    completes_c.lock().push(1);
                },
            )
        };
        10
    ];
    (make_subscriber, nexts, completes, errors)
}

/// Subscriber recording every event the way it is printed, `next(1)`, `completed`.
pub fn register_events_subscriber<T: Debug + Send + 'static>(
) -> (Subscriber<T>, Arc<Mutex<Vec<String>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_c = Arc::clone(&events);

    let s = Subscriber::on_event(move |e: Notification<T>| {
        events_c.lock().push(e.to_string());
    });
    (s, events)
}

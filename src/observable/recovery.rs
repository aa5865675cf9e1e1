use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    observer::Observer,
    subscription::subscribe::{SerialSubscription, Subscribeable, Subscriber},
    ObservableError,
};

use super::{wrap_subscriber, Observable};

pub(super) fn catch_error<T, F>(source: Observable<T>, handler: F) -> Observable<T>
where
    T: Send + 'static,
    F: Fn(ObservableError) -> Observable<T> + Send + Sync + 'static,
{
    let handler = Arc::new(handler);

    Observable::new(move |o| {
        let upstream = o.token().child();
        let o_shared = Arc::new(Mutex::new(o));
        let o_cloned_e = Arc::clone(&o_shared);
        let o_cloned_c = Arc::clone(&o_shared);
        let serial = SerialSubscription::new();
        let serial_e = serial.clone();
        let handler = Arc::clone(&handler);

        let u = Subscriber::new(
            move |v| {
                o_shared.lock().next(v);
            },
            move |observable_error| {
                tracing::debug!(error = %observable_error, "switching to fallback observable");
                let fallback = handler(observable_error);
                let s = fallback.subscribe(wrap_subscriber(Arc::clone(&o_cloned_e)));
                serial_e.set(1, s);
            },
            move || {
                o_cloned_c.lock().complete();
            },
        )
        .with_token(upstream);
        serial.set(0, source.subscribe(u));
        serial.to_subscription()
    })
}

pub(super) fn retry<T: Send + 'static>(source: Observable<T>, max_attempts: usize) -> Observable<T> {
    let max_attempts = max_attempts.max(1);

    Observable::new(move |o| {
        let serial = SerialSubscription::new();
        subscribe_attempt(
            source.clone(),
            Arc::new(Mutex::new(o)),
            serial.clone(),
            1,
            max_attempts,
        );
        serial.to_subscription()
    })
}

fn subscribe_attempt<T: Send + 'static>(
    source: Observable<T>,
    o: Arc<Mutex<Subscriber<T>>>,
    serial: SerialSubscription,
    attempt: usize,
    max_attempts: usize,
) {
    if serial.is_disposed() {
        return;
    }
    let upstream = o.lock().token().child();
    let o_cloned_n = Arc::clone(&o);
    let o_cloned_c = Arc::clone(&o);
    let retry_source = source.clone();
    let retry_serial = serial.clone();

    let u = Subscriber::new(
        move |v| {
            o_cloned_n.lock().next(v);
        },
        move |observable_error| {
            if attempt >= max_attempts {
                tracing::debug!(attempt, error = %observable_error, "retry attempts exhausted");
                o.lock().error(observable_error);
                return;
            }
            tracing::debug!(attempt, max_attempts, error = %observable_error, "resubscribing after error");
            subscribe_attempt(
                retry_source.clone(),
                Arc::clone(&o),
                retry_serial.clone(),
                attempt + 1,
                max_attempts,
            );
        },
        move || {
            o_cloned_c.lock().complete();
        },
    )
    .with_token(upstream);
    serial.set(attempt as u64, source.subscribe(u));
}

mod custom_error;
mod generate_observable;
mod register_emissions;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use custom_error::custom_error;
use generate_observable::{generate_failing_observable, generate_flaky_observable};
use parking_lot::Mutex;
use register_emissions::{register_emissions_subscriber, register_events_subscriber};
use rxstudy::{Observable, ObservableExt, Observer, RxError, Subject, Subscribeable};

#[test]
fn catch_error_switches_to_fallback() {
    let (s, events) = register_events_subscriber();

    generate_failing_observable(vec![1, 2], Arc::new(AtomicUsize::new(0)))
        .catch_error(|_| Observable::of([-1, -2]))
        .subscribe(s);

    assert_eq!(
        *events.lock(),
        vec!["next(1)", "next(2)", "next(-1)", "next(-2)", "completed"]
    );
}

#[test]
fn catch_error_handler_receives_error() {
    let seen = Arc::new(Mutex::new(None));
    let seen_c = Arc::clone(&seen);
    let (s, _events) = register_events_subscriber::<i32>();

    Observable::error(custom_error())
        .catch_error(move |e| {
            *seen_c.lock() = Some(e.to_string());
            Observable::empty()
        })
        .subscribe(s);

    assert_eq!(seen.lock().as_deref(), Some("Custom error occurred"));
}

#[test]
fn catch_error_fallback_error_propagates() {
    let (mut make_subscriber, nexts, completes, errors) = register_emissions_subscriber::<i32>();

    Observable::error(custom_error())
        .catch_error(|_| {
            Observable::error(RxError::custom("fallback failed").into_observable_error())
        })
        .subscribe(make_subscriber.pop().unwrap()());

    assert!(nexts.lock().is_empty());
    assert!(completes.lock().is_empty());
    assert_eq!(*errors.lock(), vec!["fallback failed"]);
}

#[test]
fn catch_error_passes_through_without_error() {
    let (s, events) = register_events_subscriber();

    Observable::of([1, 2])
        .catch_error(|_| Observable::just(-1))
        .subscribe(s);

    assert_eq!(*events.lock(), vec!["next(1)", "next(2)", "completed"]);
}

#[test]
fn catch_error_releases_failed_source() {
    let (mut tx, rx) = Subject::<i32>::emitter_receiver();
    let (mut fallback_tx, fallback_rx) = Subject::<i32>::emitter_receiver();
    let (s, events) = register_events_subscriber();

    let fallback = fallback_rx.clone().into_observable();
    rx.clone().catch_error(move |_| fallback.clone()).subscribe(s);

    tx.next(1);
    tx.error(custom_error());
    assert_eq!(rx.len(), 0);
    assert_eq!(fallback_rx.len(), 1);

    fallback_tx.next(2);
    fallback_tx.complete();
    assert_eq!(*events.lock(), vec!["next(1)", "next(2)", "completed"]);
}

#[test]
fn catch_error_just_return_replaces_error() {
    let (s, events) = register_events_subscriber();

    generate_failing_observable(vec![1], Arc::new(AtomicUsize::new(0)))
        .catch_error_just_return(0)
        .subscribe(s);

    assert_eq!(*events.lock(), vec!["next(1)", "next(0)", "completed"]);
}

#[test]
fn retry_resubscribes_up_to_the_bound() {
    let subscriptions = Arc::new(AtomicUsize::new(0));
    let (mut make_subscriber, nexts, completes, errors) = register_emissions_subscriber();

    generate_failing_observable(vec![1, 2], Arc::clone(&subscriptions))
        .retry(2)
        .subscribe(make_subscriber.pop().unwrap()());

    assert_eq!(*nexts.lock(), vec![1, 2, 1, 2]);
    assert_eq!(*errors.lock(), vec!["Custom error occurred"]);
    assert!(completes.lock().is_empty());
    assert_eq!(subscriptions.load(Ordering::SeqCst), 2);
}

#[test]
fn retry_stops_once_source_completes() {
    let (s, events) = register_events_subscriber();

    generate_flaky_observable(vec![7], 1).retry(3).subscribe(s);

    assert_eq!(*events.lock(), vec!["next(7)", "next(7)", "completed"]);
}

#[test]
fn retry_one_never_resubscribes() {
    let subscriptions = Arc::new(AtomicUsize::new(0));
    let (s, events) = register_events_subscriber();

    generate_failing_observable(vec![1], Arc::clone(&subscriptions))
        .retry(1)
        .subscribe(s);

    assert_eq!(
        *events.lock(),
        vec!["next(1)", "error(Custom error occurred)"]
    );
    assert_eq!(subscriptions.load(Ordering::SeqCst), 1);
}

#[test]
fn retry_then_catch() {
    let subscriptions = Arc::new(AtomicUsize::new(0));
    let (s, events) = register_events_subscriber();

    generate_failing_observable(vec![], Arc::clone(&subscriptions))
        .retry(3)
        .catch_error_just_return(-1)
        .subscribe(s);

    assert_eq!(*events.lock(), vec!["next(-1)", "completed"]);
    assert_eq!(subscriptions.load(Ordering::SeqCst), 3);
}

#[test]
fn error_is_delivered_once() {
    let (mut tx, rx) = Subject::<i32>::emitter_receiver();
    let (mut make_subscriber, _, _, errors) = register_emissions_subscriber();

    rx.map(|v| v + 1).subscribe(make_subscriber.pop().unwrap()());
    tx.error(custom_error());
    tx.error(custom_error());

    assert_eq!(errors.lock().len(), 1);
}

mod register_emissions;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use register_emissions::register_events_subscriber;
use rxstudy::{
    DisposeBag, Observable, ObservableExt, Observer, Subject, Subscribeable, Subscription,
    UnsubscribeLogic, Unsubscribeable,
};

fn counting_observable(cleanups: &Arc<AtomicUsize>) -> Observable<i32> {
    let cleanups = Arc::clone(cleanups);
    Observable::new(move |_| {
        let cleanups = Arc::clone(&cleanups);
        Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
            cleanups.fetch_add(1, Ordering::SeqCst);
        })))
    })
}

#[test]
fn cancelling_twice_runs_cleanup_once() {
    let cleanups = Arc::new(AtomicUsize::new(0));
    let (s, _) = register_events_subscriber();

    let subscription = counting_observable(&cleanups).subscribe(s);
    let copy = subscription.clone();
    subscription.unsubscribe();
    copy.unsubscribe();

    assert_eq!(cleanups.load(Ordering::SeqCst), 1);
}

#[test]
fn bag_releases_every_subscription() {
    let cleanups = Arc::new(AtomicUsize::new(0));
    let bag = DisposeBag::new();

    for _ in 0..4 {
        let (s, _) = register_events_subscriber();
        counting_observable(&cleanups).subscribe(s).disposed_by(&bag);
    }
    assert_eq!(cleanups.load(Ordering::SeqCst), 0);

    bag.dispose();
    bag.dispose();
    assert_eq!(cleanups.load(Ordering::SeqCst), 4);
}

#[test]
fn bag_releases_on_drop() {
    let cleanups = Arc::new(AtomicUsize::new(0));

    {
        let bag = DisposeBag::new();
        let (s, _) = register_events_subscriber();
        counting_observable(&cleanups).subscribe(s).disposed_by(&bag);
    }

    assert_eq!(cleanups.load(Ordering::SeqCst), 1);
}

#[test]
fn subscription_added_to_disposed_bag_is_released() {
    let cleanups = Arc::new(AtomicUsize::new(0));
    let bag = DisposeBag::new();
    bag.dispose();

    let (s, _) = register_events_subscriber();
    let subscription = counting_observable(&cleanups).subscribe(s);
    subscription.clone().disposed_by(&bag);

    assert_eq!(cleanups.load(Ordering::SeqCst), 1);
    assert!(subscription.is_closed());
}

#[test]
fn cancelled_subscription_receives_nothing_further() {
    let (mut tx, rx) = Subject::<i32>::emitter_receiver();
    let (s, events) = register_events_subscriber();
    let bag = DisposeBag::new();

    rx.clone().map(|v| v * 2).subscribe(s).disposed_by(&bag);
    tx.next(1);
    bag.dispose();
    tx.next(2);
    tx.complete();

    assert_eq!(*events.lock(), vec!["next(2)"]);
    assert!(rx.is_empty());
}

#[test]
fn terminated_streams_leave_the_bag() {
    let bag = DisposeBag::new();

    for _ in 0..3 {
        let (s, _) = register_events_subscriber();
        Observable::of([1]).subscribe(s).disposed_by(&bag);
    }

    // Handles of completed streams are dropped on the next insert.
    assert_eq!(bag.len(), 1);
}

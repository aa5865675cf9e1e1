use super::*;

use std::sync::mpsc;

use crate::{
    notification::Notification, scheduler::TokioScheduler, RxError, VirtualTimeScheduler,
};

/// Emits `0..=end` from a background thread, one value per millisecond, and sends
/// the last emitted value through `last_emit` once it stops.
pub fn make_emit_u32_observable(end: u32, last_emit: mpsc::Sender<u32>) -> Observable<u32> {
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

fn record<T: Send + 'static>() -> (Subscriber<T>, Arc<Mutex<Vec<Notification<T>>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_c = Arc::clone(&events);
    (
        Subscriber::on_event(move |e: Notification<T>| events_c.lock().push(e)),
        events,
    )
}

fn nexts<T: Clone>(events: &Arc<Mutex<Vec<Notification<T>>>>) -> Vec<T> {
    events
        .lock()
        .iter()
        .filter_map(|e| e.value().cloned())
        .collect()
}

#[test]
fn take_stops_background_producer() {
    let (tx, rx) = mpsc::channel();
    let (s, events) = record();

    make_emit_u32_observable(1000, tx).take(5).subscribe(s);

    let last = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("producer did not stop");
    assert_eq!(last, 4, "producer kept emitting after take was satisfied");
    assert_eq!(nexts(&events), vec![0, 1, 2, 3, 4]);
    assert!(matches!(events.lock().last(), Some(Notification::Completed)));
}

#[test]
fn unsubscribe_stops_background_producer() {
    let (tx, rx) = mpsc::channel();
    let (s, events) = record();

    let subscription = make_emit_u32_observable(100_000, tx).subscribe(s);
    std::thread::sleep(Duration::from_millis(10));
    subscription.unsubscribe();

    let last = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("producer did not stop");
    assert!(last < 100_000, "producer ran to completion after unsubscribe");

    let emitted = events.lock().len();
    std::thread::sleep(Duration::from_millis(10));
    assert_eq!(events.lock().len(), emitted, "events delivered after unsubscribe");
    assert!(events.lock().iter().all(|e| !e.is_terminal()));
}

#[test]
fn take_terminates_infinite_synchronous_producer() {
    let (s, events) = record();

    Observable::repeat_element("🔴").take(3).subscribe(s);

    assert_eq!(nexts(&events), vec!["🔴", "🔴", "🔴"]);
    assert_eq!(events.lock().len(), 4);
}

#[test]
fn take_terminates_infinite_producer_through_other_operators() {
    let (s, events) = record();

    Observable::repeat_element(1_u8)
        .map(|v| v + 1)
        .filter(|_| true)
        .scan(0_u32, |acc, v| *acc + u32::from(v))
        .take(3)
        .subscribe(s);

    assert_eq!(nexts(&events), vec![2, 4, 6]);
    assert!(matches!(events.lock().last(), Some(Notification::Completed)));
}

#[test]
fn take_stops_background_producer_behind_map() {
    let (tx, rx) = mpsc::channel();
    let (s, events) = record();

    make_emit_u32_observable(1000, tx)
        .map(|v| v * 2)
        .do_on_next(|_| {})
        .take(3)
        .subscribe(s);

    let last = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("producer did not stop");
    assert_eq!(last, 2, "producer kept emitting after take was satisfied");
    assert_eq!(nexts(&events), vec![0, 2, 4]);
}

#[test]
fn inner_observables_stop_with_downstream() {
    let (s, events) = record();

    Observable::of([1, 2])
        .flat_map(|v| Observable::repeat_element(v).map(|v| v * 10))
        .take(2)
        .subscribe(s);

    assert_eq!(nexts(&events), vec![10, 10]);
}

#[test]
fn release_runs_after_completion() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let order_c = Arc::clone(&order);
    let order_p = Arc::clone(&order);

    let observable = Observable::new(move |mut o: Subscriber<i32>| {
        o.next(1);
        o.complete();
        let order_p = Arc::clone(&order_p);
        Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
            order_p.lock().push("disposed".to_string());
        })))
    });

    let subscription = observable.subscribe(Subscriber::on_event(move |e: Notification<i32>| {
        order_c.lock().push(e.to_string());
    }));

    assert!(subscription.is_closed());
    assert_eq!(*order.lock(), vec!["next(1)", "completed", "disposed"]);

    // Releasing a terminated subscription again is a no-op.
    subscription.unsubscribe();
    assert_eq!(order.lock().len(), 3);
}

#[test]
fn do_on_dispose_runs_once_per_subscription() {
    let disposed = Arc::new(Mutex::new(0));
    let disposed_c = Arc::clone(&disposed);

    let observable = Observable::of([1, 2]).do_on_dispose(move || *disposed_c.lock() += 1);

    observable.subscribe(Subscriber::on_next(|_| {}));
    let s = observable.subscribe(Subscriber::on_next(|_| {}));
    s.unsubscribe();

    assert_eq!(*disposed.lock(), 2);
}

#[test]
fn deferred_builds_a_fresh_source_per_subscription() {
    let calls = Arc::new(Mutex::new(0));
    let calls_c = Arc::clone(&calls);

    let observable = Observable::deferred(move || {
        let mut calls = calls_c.lock();
        *calls += 1;
        Observable::just(*calls)
    });

    let (s1, first) = record();
    let (s2, second) = record();
    observable.subscribe(s1);
    observable.subscribe(s2);

    assert_eq!(nexts(&first), vec![1]);
    assert_eq!(nexts(&second), vec![2]);
}

#[test]
fn merge_error_releases_remaining_sources() {
    let (mut tx, rx) = crate::Subject::<i32>::emitter_receiver();
    let (s, events) = record();

    let failing = Observable::<i32>::error(RxError::custom("boom").into_observable_error());
    rx.clone().merge_one(failing).subscribe(s);

    tx.next(1);
    assert_eq!(rx.len(), 0, "subject still observed after merge errored");
    assert_eq!(events.lock().len(), 1);
    assert_eq!(events.lock()[0].to_string(), "error(boom)");
}

#[test]
fn scan_emits_running_total() {
    let (s, events) = record();

    Observable::of([1, 2, 3]).scan(0, |acc, v| *acc + v).subscribe(s);

    assert_eq!(nexts(&events), vec![1, 3, 6]);
}

#[test]
fn delay_keeps_order_on_virtual_time() {
    let scheduler = VirtualTimeScheduler::new();
    let (s, events) = record();

    Observable::of([1, 2, 3])
        .delay(Duration::from_secs(2), scheduler.clone())
        .subscribe(s);

    scheduler.advance_by(Duration::from_secs(1));
    assert!(events.lock().is_empty());

    scheduler.advance_by(Duration::from_secs(1));
    assert_eq!(nexts(&events), vec![1, 2, 3]);
    assert!(matches!(events.lock().last(), Some(Notification::Completed)));
}

#[test]
fn delay_does_not_retain_finished_timers() {
    let scheduler = VirtualTimeScheduler::new();
    let (s, events) = record();

    let subscription = Observable::interval(Duration::from_secs(1), scheduler.clone())
        .delay(Duration::from_millis(10), scheduler.clone())
        .subscribe(s);

    scheduler.advance_by(Duration::from_secs(10));
    let after_ten = scheduler.references();
    scheduler.advance_by(Duration::from_secs(1000));

    assert_eq!(nexts(&events).len(), 1009);
    assert_eq!(scheduler.references(), after_ten);

    subscription.unsubscribe();
    assert_eq!(scheduler.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn interval_on_tokio_scheduler() {
    let scheduler = TokioScheduler::try_current().expect("inside a runtime");
    let (s, events) = record();

    Observable::interval(Duration::from_millis(100), scheduler)
        .take(3)
        .subscribe(s);

    tokio::time::sleep(Duration::from_millis(350)).await;

    assert_eq!(nexts(&events), vec![0, 1, 2]);
    assert!(matches!(events.lock().last(), Some(Notification::Completed)));
}

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;

use crate::{
    observer::Observer,
    subscription::{
        subscribe::{
            SerialSubscription, Subscribeable, Subscriber, Subscription, UnsubscribeLogic,
        },
        DisposeBag,
    },
    Unsubscribeable,
};

use super::Observable;

impl<T: Send + 'static> Observable<T> {
    /// Interleaves the emissions of every source. See [`merge`].
    pub fn merge_all(sources: Vec<Observable<T>>) -> Self {
        merge(sources)
    }

    /// Subscribes to the sources one after another. See [`concat`].
    pub fn concat_all(sources: Vec<Observable<T>>) -> Self {
        concat(sources)
    }
}

/// Interleaves the emissions of `sources` as they arrive.
///
/// Completes after every source completed; the first error terminates the result
/// and releases the remaining sources.
pub fn merge<T: Send + 'static>(sources: Vec<Observable<T>>) -> Observable<T> {
    Observable::new(move |mut o| {
        if sources.is_empty() {
            o.complete();
            return Subscription::empty();
        }
        let downstream = o.token();
        let o_shared = Arc::new(Mutex::new(o));
        let remaining = Arc::new(AtomicUsize::new(sources.len()));
        let subscriptions = DisposeBag::new();

        for source in &sources {
            if o_shared.lock().is_closed() {
                break;
            }
            let o_cloned_n = Arc::clone(&o_shared);
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let remaining = Arc::clone(&remaining);

            let u = Subscriber::new(
                move |v| {
                    o_cloned_n.lock().next(v);
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    if remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
                        o_cloned_c.lock().complete();
                    }
                },
            )
            .with_token(downstream.child());
            source.subscribe(u).disposed_by(&subscriptions);
        }

        Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
            subscriptions.dispose();
        })))
    })
}

/// Subscribes to each source only after the previous one completed.
pub fn concat<T: Send + 'static>(sources: Vec<Observable<T>>) -> Observable<T> {
    let sources = Arc::new(sources);

    Observable::new(move |o| {
        let serial = SerialSubscription::new();
        concat_from(
            Arc::clone(&sources),
            0,
            Arc::new(Mutex::new(o)),
            serial.clone(),
        );
        serial.to_subscription()
    })
}

fn concat_from<T: Send + 'static>(
    sources: Arc<Vec<Observable<T>>>,
    index: usize,
    o: Arc<Mutex<Subscriber<T>>>,
    serial: SerialSubscription,
) {
    if serial.is_disposed() {
        return;
    }
    let Some(source) = sources.get(index).cloned() else {
        o.lock().complete();
        return;
    };

    let upstream = o.lock().token().child();
    let o_cloned_n = Arc::clone(&o);
    let o_cloned_e = Arc::clone(&o);
    let next_serial = serial.clone();

    let u = Subscriber::new(
        move |v| {
            o_cloned_n.lock().next(v);
        },
        move |observable_error| {
            o_cloned_e.lock().error(observable_error);
        },
        move || {
            concat_from(
                Arc::clone(&sources),
                index + 1,
                Arc::clone(&o),
                next_serial.clone(),
            );
        },
    )
    .with_token(upstream);
    serial.set(index as u64, source.subscribe(u));
}

struct CombineLatestState<A, B> {
    observer: Subscriber<(A, B)>,
    left: Option<A>,
    right: Option<B>,
    left_done: bool,
    right_done: bool,
}

impl<A: Clone, B: Clone> CombineLatestState<A, B> {
    fn latest_pair(&self) -> Option<(A, B)> {
        match (&self.left, &self.right) {
            (Some(a), Some(b)) => Some((a.clone(), b.clone())),
            _ => None,
        }
    }
}

/// Emits the latest pair every time either side emits, once both sides emitted
/// at least once.
///
/// Completes when both sides completed, or as soon as one side completes without
/// ever having emitted.
pub fn combine_latest<A, B>(left: Observable<A>, right: Observable<B>) -> Observable<(A, B)>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
{
    Observable::new(move |o| {
        let downstream = o.token();
        let state = Arc::new(Mutex::new(CombineLatestState {
            observer: o,
            left: None,
            right: None,
            left_done: false,
            right_done: false,
        }));

        let state_n = Arc::clone(&state);
        let state_e = Arc::clone(&state);
        let state_c = Arc::clone(&state);
        let left_subscriber = Subscriber::new(
            move |v| {
                let mut st = state_n.lock();
                st.left = Some(v);
                if let Some(pair) = st.latest_pair() {
                    st.observer.next(pair);
                }
            },
            move |observable_error| {
                state_e.lock().observer.error(observable_error);
            },
            move || {
                let mut st = state_c.lock();
                st.left_done = true;
                if st.right_done || st.left.is_none() {
                    st.observer.complete();
                }
            },
        )
        .with_token(downstream.child());

        let state_n = Arc::clone(&state);
        let state_e = Arc::clone(&state);
        let state_c = Arc::clone(&state);
        let right_subscriber = Subscriber::new(
            move |v| {
                let mut st = state_n.lock();
                st.right = Some(v);
                if let Some(pair) = st.latest_pair() {
                    st.observer.next(pair);
                }
            },
            move |observable_error| {
                state_e.lock().observer.error(observable_error);
            },
            move || {
                let mut st = state_c.lock();
                st.right_done = true;
                if st.left_done || st.right.is_none() {
                    st.observer.complete();
                }
            },
        )
        .with_token(downstream.child());

        subscribe_pair(&left, left_subscriber, &right, right_subscriber, || {
            state.lock().observer.is_closed()
        })
    })
}

struct ZipState<A, B> {
    observer: Subscriber<(A, B)>,
    left: VecDeque<A>,
    right: VecDeque<B>,
    left_done: bool,
    right_done: bool,
}

impl<A, B> ZipState<A, B> {
    fn drain(&mut self) {
        while !self.left.is_empty() && !self.right.is_empty() {
            if let (Some(a), Some(b)) = (self.left.pop_front(), self.right.pop_front()) {
                self.observer.next((a, b));
            }
        }
        if (self.left_done && self.left.is_empty()) || (self.right_done && self.right.is_empty())
        {
            self.observer.complete();
        }
    }
}

/// Pairs the nth item of `left` with the nth item of `right`.
///
/// Completes once a completed side has no queued items left; unpaired items of
/// the other side are discarded.
pub fn zip<A, B>(left: Observable<A>, right: Observable<B>) -> Observable<(A, B)>
where
    A: Send + 'static,
    B: Send + 'static,
{
    Observable::new(move |o| {
        let downstream = o.token();
        let state = Arc::new(Mutex::new(ZipState {
            observer: o,
            left: VecDeque::new(),
            right: VecDeque::new(),
            left_done: false,
            right_done: false,
        }));

        let state_n = Arc::clone(&state);
        let state_e = Arc::clone(&state);
        let state_c = Arc::clone(&state);
        let left_subscriber = Subscriber::new(
            move |v| {
                let mut st = state_n.lock();
                st.left.push_back(v);
                st.drain();
            },
            move |observable_error| {
                state_e.lock().observer.error(observable_error);
            },
            move || {
                let mut st = state_c.lock();
                st.left_done = true;
                st.drain();
            },
        )
        .with_token(downstream.child());

        let state_n = Arc::clone(&state);
        let state_e = Arc::clone(&state);
        let state_c = Arc::clone(&state);
        let right_subscriber = Subscriber::new(
            move |v| {
                let mut st = state_n.lock();
                st.right.push_back(v);
                st.drain();
            },
            move |observable_error| {
                state_e.lock().observer.error(observable_error);
            },
            move || {
                let mut st = state_c.lock();
                st.right_done = true;
                st.drain();
            },
        )
        .with_token(downstream.child());

        subscribe_pair(&left, left_subscriber, &right, right_subscriber, || {
            state.lock().observer.is_closed()
        })
    })
}

fn subscribe_pair<A: 'static, B: 'static>(
    left: &Observable<A>,
    left_subscriber: Subscriber<A>,
    right: &Observable<B>,
    right_subscriber: Subscriber<B>,
    closed: impl Fn() -> bool,
) -> Subscription {
    let left_subscription = left.subscribe(left_subscriber);
    let right_subscription = if closed() {
        Subscription::empty()
    } else {
        right.subscribe(right_subscriber)
    };

    Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
        left_subscription.unsubscribe();
        right_subscription.unsubscribe();
    })))
}

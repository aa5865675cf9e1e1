//! The `observable` module provides the building blocks for creating and manipulating
//! observables.

mod combine;
mod creation;
mod recovery;
mod time;

use std::{
    collections::VecDeque,
    sync::Arc,
    time::Duration,
};

use parking_lot::Mutex;

use crate::{
    observer::Observer,
    scheduler::Scheduler,
    subscription::{
        subscribe::{Subscribeable, Subscriber, Subscription, UnsubscribeLogic},
        DisposeBag,
    },
    ObservableError, Unsubscribeable,
};

pub use combine::{combine_latest, concat, merge, zip};

type SubscribeFn<T> = dyn Fn(Subscriber<T>) -> Subscription + Send + Sync;

/// The `Observable` struct represents a source of values that can be observed
/// and transformed.
///
/// An `Observable` is cold: nothing happens until it is subscribed, and every
/// subscription runs the subscribe function again. Cloning an `Observable` is cheap
/// and yields another handle to the same subscribe function, which is what lets
/// operators such as `retry` and `concat` subscribe more than once.
///
/// # Example: custom synchronous `Observable`
///
/// ```
/// use rxstudy::{
///     subscribe::{Subscription, UnsubscribeLogic},
///     Observable, ObservableExt, Observer, Subscribeable, Subscriber,
/// };
///
/// let observable = Observable::new(|mut subscriber| {
///     for i in 1..=3 {
///         subscriber.next(i);
///     }
///     subscriber.complete();
///
///     Subscription::new(UnsubscribeLogic::Logic(Box::new(|| println!("disposed"))))
/// });
///
/// observable
///     .map(|v| v * 10)
///     .subscribe(Subscriber::on_event(|event| println!("{event}")));
/// // next(10)
/// // next(20)
/// // next(30)
/// // completed
/// // disposed
/// ```
///
/// # Example: asynchronous `Observable`
///
/// Producers that emit from another task or thread must stop once the subscriber is
/// closed, which happens when the subscription is released or a downstream
/// operator such as `take` is satisfied.
///
/// ```no_run
/// use std::time::Duration;
///
/// use rxstudy::{subscribe::Subscription, Observable, ObservableExt, Observer, Subscribeable, Subscriber};
///
/// #[tokio::main]
/// async fn main() {
///     let observable = Observable::new(|mut o| {
///         tokio::spawn(async move {
///             let mut i = 0;
///             while !o.is_closed() {
///                 o.next(i);
///                 i += 1;
///                 tokio::time::sleep(Duration::from_millis(10)).await;
///             }
///         });
///         Subscription::empty()
///     });
///
///     observable
///         .take(5)
///         .subscribe(Subscriber::on_next(|v| println!("Emitted {v}")));
///
///     tokio::time::sleep(Duration::from_millis(100)).await;
/// }
/// ```
pub struct Observable<T> {
    subscribe_fn: Arc<SubscribeFn<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Observable {
            subscribe_fn: Arc::clone(&self.subscribe_fn),
        }
    }
}

impl<T> Observable<T> {
    /// Creates a new `Observable` with the provided subscribe function.
    ///
    /// The subscribe function is invoked once per subscription to deliver values to
    /// the `Subscriber`. It returns a `Subscription` holding the cleanup for
    /// whatever the producer started; that cleanup runs exactly once, when the
    /// subscription is released or when the stream terminates.
    pub fn new(sf: impl Fn(Subscriber<T>) -> Subscription + Send + Sync + 'static) -> Self {
        Observable {
            subscribe_fn: Arc::new(sf),
        }
    }
}

impl<T: 'static> Subscribeable for Observable<T> {
    type ObsType = T;

    fn subscribe(&self, mut v: Subscriber<Self::ObsType>) -> Subscription {
        let subscription = Subscription::pending(v.token());
        v.release_on_terminal(subscription.clone());

        let inner = (self.subscribe_fn)(v);
        subscription.attach(UnsubscribeLogic::Wrapped(Box::new(inner)));
        subscription
    }

    fn into_observable(self) -> Observable<T> {
        self
    }
}

/// Forward every event into a shared downstream subscriber.
pub(crate) fn wrap_subscriber<S: 'static>(s: Arc<Mutex<Subscriber<S>>>) -> Subscriber<S> {
    let upstream = s.lock().token().child();
    let s_complete = Arc::clone(&s);
    let s_error = Arc::clone(&s);

    Subscriber::new(
        move |v| {
            s.lock().next(v);
        },
        move |e| {
            s_error.lock().error(e);
        },
        move || {
            s_complete.lock().complete();
        },
    )
    .with_token(upstream)
}

/// The `ObservableExt` trait provides the operators that can be applied to
/// observables and subject receivers to transform and manipulate their behavior.
///
/// Every operator returns a new cold `Observable`; the source is only subscribed
/// when the returned observable is.
pub trait ObservableExt<T: Send + 'static>: Subscribeable<ObsType = T> + Sized {
    /// Transforms the items emitted by the observable using a transformation
    /// function.
    fn map<U, F>(self, f: F) -> Observable<U>
    where
        F: Fn(T) -> U + Send + Sync + 'static,
        U: Send + 'static,
    {
        let source = self.into_observable();
        let f = Arc::new(f);

        Observable::new(move |o| {
            let upstream = o.token().child();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let f = Arc::clone(&f);

            let u = Subscriber::new(
                move |v| {
                    let t = f(v);
                    o_shared.lock().next(t);
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().complete();
                },
            )
            .with_token(upstream);
            source.subscribe(u)
        })
    }

    /// Filters the items emitted by the observable based on a predicate function.
    ///
    /// Only items for which the predicate function returns `true` will be emitted
    /// by the resulting observable.
    fn filter<P>(self, predicate: P) -> Observable<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let source = self.into_observable();
        let predicate = Arc::new(predicate);

        Observable::new(move |o| {
            let upstream = o.token().child();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let predicate = Arc::clone(&predicate);

            let u = Subscriber::new(
                move |v| {
                    if predicate(&v) {
                        o_shared.lock().next(v);
                    }
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().complete();
                },
            )
            .with_token(upstream);
            source.subscribe(u)
        })
    }

    /// Skips the first `n` items emitted by the observable and then emits the rest.
    fn skip(self, n: usize) -> Observable<T> {
        let source = self.into_observable();

        Observable::new(move |o| {
            let upstream = o.token().child();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);

            let mut n = n;
            let u = Subscriber::new(
                move |v| {
                    if n > 0 {
                        n -= 1;
                        return;
                    }
                    o_shared.lock().next(v);
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().complete();
                },
            )
            .with_token(upstream);
            source.subscribe(u)
        })
    }

    /// Emits at most the first `n` items emitted by the observable, then completes
    /// and stops the source.
    ///
    /// `take` closes its upstream subscriber as soon as `n` items went through, so
    /// even infinite synchronous producers such as `repeat_element` terminate.
    fn take(self, n: usize) -> Observable<T> {
        let source = self.into_observable();

        Observable::new(move |mut o| {
            if n == 0 {
                o.complete();
                return Subscription::empty();
            }
            let upstream = o.token().child();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);

            let upstream_cloned = upstream.clone();
            let mut taken = 0;

            let u = Subscriber::new(
                move |v| {
                    taken += 1;
                    let mut o = o_shared.lock();
                    o.next(v);
                    if taken >= n {
                        upstream_cloned.cancel();
                        o.complete();
                    }
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().complete();
                },
            )
            .with_token(upstream);
            source.subscribe(u)
        })
    }

    /// Emits only the last `n` items, once the source completes.
    ///
    /// Nothing is emitted before completion. If the source errors, the buffered
    /// items are discarded and the error is forwarded.
    fn take_last(self, n: usize) -> Observable<T> {
        let source = self.into_observable();

        Observable::new(move |o| {
            let upstream = o.token().child();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);

            let buffer = Arc::new(Mutex::new(VecDeque::with_capacity(n)));
            let buffer_c = Arc::clone(&buffer);

            let u = Subscriber::new(
                move |v| {
                    if n == 0 {
                        return;
                    }
                    let mut buffer = buffer.lock();
                    if buffer.len() == n {
                        buffer.pop_front();
                    }
                    buffer.push_back(v);
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    let last: Vec<T> = buffer_c.lock().drain(..).collect();
                    let mut o = o_cloned_c.lock();
                    for v in last {
                        o.next(v);
                    }
                    o.complete();
                },
            )
            .with_token(upstream);
            source.subscribe(u)
        })
    }

    /// Emits the running accumulation of the source: `f(seed, v1)`, then
    /// `f(that, v2)` and so on.
    fn scan<A, F>(self, seed: A, f: F) -> Observable<A>
    where
        A: Clone + Send + Sync + 'static,
        F: Fn(&A, T) -> A + Send + Sync + 'static,
    {
        let source = self.into_observable();
        let f = Arc::new(f);

        Observable::new(move |o| {
            let upstream = o.token().child();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let f = Arc::clone(&f);

            let mut accumulator = seed.clone();
            let u = Subscriber::new(
                move |v| {
                    accumulator = f(&accumulator, v);
                    o_shared.lock().next(accumulator.clone());
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().complete();
                },
            )
            .with_token(upstream);
            source.subscribe(u)
        })
    }

    /// Folds the source into a single value emitted when the source completes.
    fn reduce<A, F>(self, seed: A, f: F) -> Observable<A>
    where
        A: Clone + Send + Sync + 'static,
        F: Fn(A, T) -> A + Send + Sync + 'static,
    {
        let source = self.into_observable();
        let f = Arc::new(f);

        Observable::new(move |o| {
            let upstream = o.token().child();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let f = Arc::clone(&f);

            let accumulator = Arc::new(Mutex::new(Some(seed.clone())));
            let accumulator_c = Arc::clone(&accumulator);

            let u = Subscriber::new(
                move |v| {
                    let mut accumulator = accumulator.lock();
                    if let Some(current) = accumulator.take() {
                        *accumulator = Some(f(current, v));
                    }
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    let result = accumulator_c.lock().take();
                    let mut o = o_shared.lock();
                    if let Some(result) = result {
                        o.next(result);
                    }
                    o.complete();
                },
            )
            .with_token(upstream);
            source.subscribe(u)
        })
    }

    /// Collects every item into one `Vec` emitted when the source completes.
    fn to_array(self) -> Observable<Vec<T>> {
        let source = self.into_observable();

        Observable::new(move |o| {
            let upstream = o.token().child();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);

            let items = Arc::new(Mutex::new(Vec::new()));
            let items_c = Arc::clone(&items);

            let u = Subscriber::new(
                move |v| {
                    items.lock().push(v);
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    let items = std::mem::take(&mut *items_c.lock());
                    let mut o = o_shared.lock();
                    o.next(items);
                    o.complete();
                },
            )
            .with_token(upstream);
            source.subscribe(u)
        })
    }

    /// Emits `values` before the items of the source.
    fn start_with<I>(self, values: I) -> Observable<T>
    where
        I: IntoIterator<Item = T>,
        T: Clone + Sync,
    {
        concat(vec![Observable::of(values), self.into_observable()])
    }

    /// Transforms every item into an inner observable and merges the emissions of
    /// all inner observables into a single stream.
    ///
    /// The result completes once the source and every inner observable completed.
    /// The first error from any of them terminates the result.
    fn flat_map<R, F>(self, project: F) -> Observable<R>
    where
        R: Send + 'static,
        F: Fn(T) -> Observable<R> + Send + Sync + 'static,
    {
        struct Active {
            outer_done: bool,
            inner: usize,
        }

        let source = self.into_observable();
        let project = Arc::new(project);

        Observable::new(move |o| {
            let downstream = o.token();
            let upstream = downstream.child();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);

            let project = Arc::clone(&project);
            let active = Arc::new(Mutex::new(Active {
                outer_done: false,
                inner: 0,
            }));
            let active_c = Arc::clone(&active);
            let inner_subscriptions = DisposeBag::new();
            let inner_subscriptions_c = inner_subscriptions.clone();

            let u = Subscriber::new(
                move |v| {
                    let inner_observable = project(v);
                    active.lock().inner += 1;

                    let o_inner = Arc::clone(&o_shared);
                    let o_inner_e = Arc::clone(&o_shared);
                    let o_inner_c = Arc::clone(&o_shared);
                    let active = Arc::clone(&active);

                    let inner_subscriber = Subscriber::new(
                        move |k| {
                            o_inner.lock().next(k);
                        },
                        move |observable_error| {
                            o_inner_e.lock().error(observable_error);
                        },
                        move || {
                            let finished = {
                                let mut active = active.lock();
                                active.inner -= 1;
                                active.outer_done && active.inner == 0
                            };
                            if finished {
                                o_inner_c.lock().complete();
                            }
                        },
                    )
                    .with_token(downstream.child());
                    inner_observable
                        .subscribe(inner_subscriber)
                        .disposed_by(&inner_subscriptions);
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    let finished = {
                        let mut active = active_c.lock();
                        active.outer_done = true;
                        active.inner == 0
                    };
                    if finished {
                        o_cloned_c.lock().complete();
                    }
                },
            )
            .with_token(upstream);

            let outer = source.subscribe(u);
            Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
                outer.unsubscribe();
                inner_subscriptions_c.dispose();
            })))
        })
    }

    /// Merges the current observable with a vector of observables, emitting items
    /// from all of them as they arrive.
    fn merge(self, sources: Vec<Observable<T>>) -> Observable<T> {
        let mut all = Vec::with_capacity(sources.len() + 1);
        all.push(self.into_observable());
        all.extend(sources);
        merge(all)
    }

    /// Merges the current observable with another observable.
    fn merge_one(self, source: impl Subscribeable<ObsType = T>) -> Observable<T> {
        merge(vec![self.into_observable(), source.into_observable()])
    }

    /// Subscribes to `other` once this observable completes.
    fn concat(self, other: impl Subscribeable<ObsType = T>) -> Observable<T> {
        concat(vec![self.into_observable(), other.into_observable()])
    }

    /// Pairs the latest item of this observable with the latest item of `other`
    /// every time either of them emits, once both have emitted.
    fn combine_latest<U>(self, other: impl Subscribeable<ObsType = U>) -> Observable<(T, U)>
    where
        T: Clone,
        U: Clone + Send + 'static,
    {
        combine_latest(self.into_observable(), other.into_observable())
    }

    /// Pairs the nth item of this observable with the nth item of `other`.
    fn zip<U>(self, other: impl Subscribeable<ObsType = U>) -> Observable<(T, U)>
    where
        U: Send + 'static,
    {
        zip(self.into_observable(), other.into_observable())
    }

    /// On error, switch to the observable returned by `handler`.
    fn catch_error<F>(self, handler: F) -> Observable<T>
    where
        F: Fn(ObservableError) -> Observable<T> + Send + Sync + 'static,
    {
        recovery::catch_error(self.into_observable(), handler)
    }

    /// On error, emit `value` and complete.
    fn catch_error_just_return(self, value: T) -> Observable<T>
    where
        T: Clone + Sync,
    {
        self.catch_error(move |_| Observable::just(value.clone()))
    }

    /// Resubscribes to the source after an error, subscribing at most
    /// `max_attempts` times in total. The last error is forwarded.
    ///
    /// `retry(2)` over a source emitting `1, 2` and then failing yields
    /// `1, 2, 1, 2` followed by the error.
    fn retry(self, max_attempts: usize) -> Observable<T> {
        recovery::retry(self.into_observable(), max_attempts)
    }

    /// Shifts every item and the completion by `delay` on `scheduler`. Errors are
    /// forwarded immediately.
    fn delay<S>(self, delay: Duration, scheduler: S) -> Observable<T>
    where
        S: Scheduler + Clone,
    {
        time::delay(self.into_observable(), delay, scheduler)
    }

    /// Groups items into batches emitted when `count` items were collected or
    /// `time_span` elapsed, whichever comes first.
    fn buffer<S>(self, time_span: Duration, count: usize, scheduler: S) -> Observable<Vec<T>>
    where
        S: Scheduler + Clone,
    {
        time::buffer(self.into_observable(), time_span, count, scheduler)
    }

    /// Like `buffer`, but each batch is itself an observable that emits the items
    /// as they arrive.
    fn window<S>(self, time_span: Duration, count: usize, scheduler: S) -> Observable<Observable<T>>
    where
        T: Clone,
        S: Scheduler + Clone,
    {
        time::window(self.into_observable(), time_span, count, scheduler)
    }

    /// Calls `f` with every item before forwarding it.
    fn do_on_next<F>(self, f: F) -> Observable<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let source = self.into_observable();
        let f = Arc::new(f);

        Observable::new(move |o| {
            let upstream = o.token().child();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let f = Arc::clone(&f);

            let u = Subscriber::new(
                move |v| {
                    f(&v);
                    o_shared.lock().next(v);
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().complete();
                },
            )
            .with_token(upstream);
            source.subscribe(u)
        })
    }

    /// Calls `f` with the error before forwarding it.
    fn do_on_error<F>(self, f: F) -> Observable<T>
    where
        F: Fn(&ObservableError) + Send + Sync + 'static,
    {
        let source = self.into_observable();
        let f = Arc::new(f);

        Observable::new(move |o| {
            let upstream = o.token().child();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let f = Arc::clone(&f);

            let u = Subscriber::new(
                move |v| {
                    o_shared.lock().next(v);
                },
                move |observable_error| {
                    f(&observable_error);
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().complete();
                },
            )
            .with_token(upstream);
            source.subscribe(u)
        })
    }

    /// Calls `f` before forwarding completion.
    fn do_on_completed<F>(self, f: F) -> Observable<T>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let source = self.into_observable();
        let f = Arc::new(f);

        Observable::new(move |o| {
            let upstream = o.token().child();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let f = Arc::clone(&f);

            let u = Subscriber::new(
                move |v| {
                    o_shared.lock().next(v);
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    f();
                    o_cloned_c.lock().complete();
                },
            )
            .with_token(upstream);
            source.subscribe(u)
        })
    }

    /// Calls `f` once the subscription is released, whether by unsubscribing or
    /// because the stream terminated.
    fn do_on_dispose<F>(self, f: F) -> Observable<T>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let source = self.into_observable();
        let f = Arc::new(f);

        Observable::new(move |o| {
            let inner = source.subscribe(o);
            let f = Arc::clone(&f);
            Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
                inner.unsubscribe();
                f();
            })))
        })
    }
}

impl<O, T: Send + 'static> ObservableExt<T> for O where O: Subscribeable<ObsType = T> {}

#[cfg(test)]
mod tests;

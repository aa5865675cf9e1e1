use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Weak,
};

use parking_lot::Mutex;

use crate::{notification::Notification, observer::Observer, ObservableError};

use super::DisposeBag;

/// A trait for types that can be subscribed to, allowing consumers to receive
/// values emitted by an observable stream.
pub trait Subscribeable {
    /// The type of items emitted by the observable stream.
    type ObsType;

    /// Subscribes to the observable stream and specifies how to handle emitted values.
    ///
    /// The `Subscriber` parameter defines the behavior for processing values emitted
    /// by the observable stream. The returned `Subscription` releases the resources
    /// held by this subscription when unsubscribed.
    fn subscribe(&self, s: Subscriber<Self::ObsType>) -> Subscription;

    /// Converts this source into a plain `Observable` so operators can be chained
    /// on it.
    fn into_observable(self) -> crate::Observable<Self::ObsType>;
}

/// A trait for types that can be unsubscribed, allowing the clean release of resources
/// associated with a subscription.
///
/// This method also serves as a signal to notify the producer that it should stop
/// emitting values. Producers observe the signal cooperatively through
/// [`Subscriber::is_closed`].
pub trait Unsubscribeable {
    /// Unsubscribes from a subscription and releases associated resources.
    ///
    /// The release action of a `Subscription` runs at most once no matter how many
    /// clones of it are unsubscribed.
    fn unsubscribe(self);
}

/// Shared cancellation flag connecting a `Subscriber` with the producer feeding it.
///
/// Cancelling the token closes the subscriber: every further event is dropped and
/// producers that poll [`Subscriber::is_closed`] stop emitting.
///
/// Operators subscribe their source with a [`child`](CancelToken::child) of the
/// downstream token, so closing the end of a chain closes every stage above it.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<TokenInner>);

#[derive(Debug, Default)]
struct TokenInner {
    cancelled: AtomicBool,
    parent: Option<CancelToken>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that is cancelled on its own or together with `self`. Cancelling
    /// the child leaves `self` untouched.
    #[must_use]
    pub fn child(&self) -> Self {
        CancelToken(Arc::new(TokenInner {
            cancelled: AtomicBool::new(false),
            parent: Some(self.clone()),
        }))
    }

    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
            || self
                .0
                .parent
                .as_ref()
                .map_or(false, CancelToken::is_cancelled)
    }
}

/// Lifecycle of a single `Subscriber`.
///
/// `Active` is the only state that accepts events; every other state is final.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriberState {
    Active,
    Completed,
    Errored,
    Cancelled,
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;
type ErrorFn = Box<dyn FnMut(ObservableError) + Send>;

/// A type that acts as an observer, allowing users to handle emitted values, errors,
/// and completion when subscribing to an `Observable` or `Subject`.
///
/// Users can create a `Subscriber` instance using the `new` method and provide
/// custom functions to handle the `next`, `error`, and `complete` events.
pub struct Subscriber<NextFnType> {
    next_fn: NextFn<NextFnType>,
    complete_fn: Option<CompleteFn>,
    error_fn: Option<ErrorFn>,
    state: SubscriberState,
    token: CancelToken,
    release_handles: Vec<Subscription>,
}

impl<NextFnType> Subscriber<NextFnType> {
    /// Creates a new `Subscriber` instance with custom handling functions for emitted
    /// values, errors, and completion.
    pub fn new(
        next_fn: impl FnMut(NextFnType) + 'static + Send,
        error_fn: impl FnMut(ObservableError) + 'static + Send,
        complete_fn: impl FnMut() + 'static + Send,
    ) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: Some(Box::new(complete_fn)),
            error_fn: Some(Box::new(error_fn)),
            state: SubscriberState::Active,
            token: CancelToken::new(),
            release_handles: Vec::new(),
        }
    }

    /// Create a new Subscriber with the provided `next` function.
    ///
    /// The `next` closure is called when the observable emits a new item.
    pub fn on_next(next_fn: impl FnMut(NextFnType) + 'static + Send) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: None,
            error_fn: None,
            state: SubscriberState::Active,
            token: CancelToken::new(),
            release_handles: Vec::new(),
        }
    }

    /// Set the completion function for the Subscriber.
    pub fn on_complete(&mut self, complete_fn: impl FnMut() + 'static + Send) {
        self.complete_fn = Some(Box::new(complete_fn));
    }

    /// Set the error-handling function for the Subscriber.
    pub fn on_error(&mut self, error_fn: impl FnMut(ObservableError) + 'static + Send) {
        self.error_fn = Some(Box::new(error_fn));
    }

    /// Create a Subscriber that receives every event as a [`Notification`].
    ///
    /// This mirrors subscribing with a single event closure, which is how the demo
    /// catalogue prints `next(..)`, `error(..)` and `completed` lines.
    pub fn on_event(event_fn: impl FnMut(Notification<NextFnType>) + 'static + Send) -> Self
    where
        NextFnType: 'static,
    {
        let event_fn = Arc::new(Mutex::new(event_fn));
        let event_fn_e = Arc::clone(&event_fn);
        let event_fn_c = Arc::clone(&event_fn);

        Subscriber::new(
            move |v| event_fn.lock()(Notification::Next(v)),
            move |e| event_fn_e.lock()(Notification::Error(e)),
            move || event_fn_c.lock()(Notification::Completed),
        )
    }

    /// Adapt any `Observer` implementation into a `Subscriber`.
    pub fn from_observer<O>(observer: O) -> Self
    where
        O: Observer<NextFnType = NextFnType> + Send + 'static,
        NextFnType: 'static,
    {
        let observer = Arc::new(Mutex::new(observer));
        let observer_e = Arc::clone(&observer);
        let observer_c = Arc::clone(&observer);

        Subscriber::new(
            move |v| observer.lock().next(v),
            move |e| observer_e.lock().error(e),
            move || observer_c.lock().complete(),
        )
    }

    /// Replace the cancellation token so an operator can close this subscriber from
    /// inside its own callbacks.
    #[must_use]
    pub(crate) fn with_token(mut self, token: CancelToken) -> Self {
        self.token = token;
        self
    }

    pub(crate) fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Release `subscription` once this subscriber terminates. A subscriber handed
    /// straight through to another source collects one handle per stage; they are
    /// released innermost first.
    pub(crate) fn release_on_terminal(&mut self, subscription: Subscription) {
        self.release_handles.push(subscription);
    }

    /// Returns `true` once this subscriber stopped accepting events, either because
    /// it terminated or because its subscription was cancelled.
    ///
    /// Long running producers should poll this between emissions.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state != SubscriberState::Active || self.token.is_cancelled()
    }

    #[must_use]
    pub fn state(&self) -> SubscriberState {
        if self.state == SubscriberState::Active && self.token.is_cancelled() {
            return SubscriberState::Cancelled;
        }
        self.state
    }

    fn terminate(&mut self, state: SubscriberState) {
        self.state = state;
        self.token.cancel();
    }

    fn release(&mut self) {
        while let Some(handle) = self.release_handles.pop() {
            handle.dispose();
        }
    }
}

impl<T> Observer for Subscriber<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        if self.is_closed() {
            return;
        }
        (self.next_fn)(v);
    }

    fn complete(&mut self) {
        if self.is_closed() {
            return;
        }
        self.terminate(SubscriberState::Completed);
        if let Some(cfn) = &mut self.complete_fn {
            (cfn)();
        }
        self.release();
    }

    fn error(&mut self, observable_error: ObservableError) {
        if self.is_closed() {
            return;
        }
        self.terminate(SubscriberState::Errored);
        match &mut self.error_fn {
            Some(efn) => (efn)(observable_error),
            None => tracing::debug!(error = %observable_error, "unhandled observable error"),
        }
        self.release();
    }
}

/// Enumerates the unsubscribe logic options for a subscription.
pub enum UnsubscribeLogic {
    /// No specific unsubscribe logic.
    Nil,

    /// If one subscription depends on another. Wrapped subscription's unsubscribe
    /// will be called upon unsubscribing.
    Wrapped(Box<Subscription>),

    /// Unsubscribe logic defined by a function.
    Logic(Box<dyn FnOnce() + Send>),
}

impl UnsubscribeLogic {
    fn run(self) {
        match self {
            UnsubscribeLogic::Nil => (),
            UnsubscribeLogic::Logic(fnc) => fnc(),
            UnsubscribeLogic::Wrapped(subscription) => subscription.unsubscribe(),
        }
    }
}

struct SubscriptionInner {
    token: Option<CancelToken>,
    unsubscribe_logic: Mutex<Option<UnsubscribeLogic>>,
    released: AtomicBool,
}

/// Represents a subscription to an observable or a subject, allowing control over
/// the subscription.
///
/// Cloning a `Subscription` yields another handle to the same subscription. The
/// release action runs exactly once, on the first `unsubscribe` of any clone or when
/// the subscribed stream terminates on its own.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
}

impl Subscription {
    /// Creates a new Subscription instance with the specified unsubscribe logic.
    #[must_use]
    pub fn new(unsubscribe_logic: UnsubscribeLogic) -> Self {
        Subscription {
            inner: Arc::new(SubscriptionInner {
                token: None,
                unsubscribe_logic: Mutex::new(Some(unsubscribe_logic)),
                released: AtomicBool::new(false),
            }),
        }
    }

    /// A subscription without any release logic.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(UnsubscribeLogic::Nil)
    }

    /// Subscription whose release logic is attached later with `attach`; releasing
    /// it cancels `token`.
    pub(crate) fn pending(token: CancelToken) -> Self {
        Subscription {
            inner: Arc::new(SubscriptionInner {
                token: Some(token),
                unsubscribe_logic: Mutex::new(None),
                released: AtomicBool::new(false),
            }),
        }
    }

    /// Attach release logic to a pending or empty subscription. If the subscription
    /// has been released in the meantime the logic runs immediately.
    pub(crate) fn attach(&self, unsubscribe_logic: UnsubscribeLogic) {
        if self.inner.released.load(Ordering::SeqCst) {
            unsubscribe_logic.run();
            return;
        }
        *self.inner.unsubscribe_logic.lock() = Some(unsubscribe_logic);
        // Released while the lock was being taken.
        if self.inner.released.load(Ordering::SeqCst) {
            self.run_logic();
        }
    }

    /// Handle the work behind this subscription uses to report that it finished,
    /// closing the subscription without running its release logic.
    pub(crate) fn finish_handle(&self) -> FinishHandle {
        FinishHandle(Arc::downgrade(&self.inner))
    }

    /// Returns `true` once the subscription was released or its stream terminated.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.released.load(Ordering::SeqCst)
            || self
                .inner
                .token
                .as_ref()
                .map_or(false, CancelToken::is_cancelled)
    }

    /// Register this subscription in a [`DisposeBag`] so it is released together with
    /// the bag.
    pub fn disposed_by(self, bag: &DisposeBag) {
        bag.insert(self);
    }

    pub(crate) fn dispose(&self) {
        if let Some(token) = &self.inner.token {
            token.cancel();
        }
        self.inner.released.store(true, Ordering::SeqCst);
        self.run_logic();
    }

    fn run_logic(&self) {
        let logic = self.inner.unsubscribe_logic.lock().take();
        if let Some(logic) = logic {
            logic.run();
        }
    }
}

/// Weak reference used by scheduled work to close its own `Subscription` once it
/// ran, so holders such as a `DisposeBag` can drop the handle.
pub(crate) struct FinishHandle(Weak<SubscriptionInner>);

impl FinishHandle {
    pub(crate) fn finish(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.released.store(true, Ordering::SeqCst);
            let logic = inner.unsubscribe_logic.lock().take();
            drop(logic);
        }
    }
}

impl Unsubscribeable for Subscription {
    fn unsubscribe(self) {
        self.dispose();
    }
}

struct SerialState {
    current: Option<(u64, Subscription)>,
    disposed: bool,
}

/// Holds the subscription of the latest generation of a resubscribing operator
/// (`retry`, `catch_error`, `concat`), releasing replaced ones.
#[derive(Clone)]
pub(crate) struct SerialSubscription {
    state: Arc<Mutex<SerialState>>,
}

impl SerialSubscription {
    pub(crate) fn new() -> Self {
        SerialSubscription {
            state: Arc::new(Mutex::new(SerialState {
                current: None,
                disposed: false,
            })),
        }
    }

    /// Store the subscription of `generation`. Nested synchronous resubscription
    /// returns newer generations first, so an older generation never replaces a
    /// newer one.
    pub(crate) fn set(&self, generation: u64, subscription: Subscription) {
        let stale = {
            let mut state = self.state.lock();
            if state.disposed {
                Some(subscription)
            } else {
                match &state.current {
                    Some((current, _)) if *current > generation => Some(subscription),
                    _ => state
                        .current
                        .replace((generation, subscription))
                        .map(|(_, old)| old),
                }
            }
        };
        if let Some(s) = stale {
            s.unsubscribe();
        }
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    pub(crate) fn dispose(&self) {
        let current = {
            let mut state = self.state.lock();
            state.disposed = true;
            state.current.take()
        };
        if let Some((_, s)) = current {
            s.unsubscribe();
        }
    }

    pub(crate) fn to_subscription(&self) -> Subscription {
        let serial = self.clone();
        Subscription::new(UnsubscribeLogic::Logic(Box::new(move || serial.dispose())))
    }
}

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    observer::Observer,
    subscription::subscribe::{
        Subscribeable, Subscriber, Subscription, UnsubscribeLogic, Unsubscribeable,
    },
    Observable, ObservableError,
};

type SharedSubscriber<T> = Arc<Mutex<Subscriber<T>>>;

/// A `Subject` multicasts the values pushed through its emitter to every
/// `Subscriber` registered on its receiver.
///
/// Subscribers only see values emitted after they subscribed. Once the subject
/// completes or errors, later subscribers immediately receive the same terminal
/// event.
///
/// # Examples
///
///```
/// use rxstudy::{subjects::Subject, Observer, ObservableExt, Subscribeable, Subscriber};
///
/// let (mut emitter, receiver) = Subject::emitter_receiver();
///
/// receiver
///     .clone()
///     .map(|v: i32| v * 10)
///     .subscribe(Subscriber::on_next(|v| println!("mapped {v}")));
///
/// emitter.next(1); // prints "mapped 10"
/// emitter.complete();
///
/// // Subscribed after completion, completes immediately.
/// receiver.subscribe(Subscriber::on_next(|v| println!("never {v}")));
///```
pub struct Subject<T> {
    observers: Vec<(u64, SharedSubscriber<T>)>,
    next_key: u64,
    completed: bool,
    closed: bool,
    error: Option<ObservableError>,
}

impl<T: 'static> Subject<T> {
    /// Creates a new pair of `SubjectEmitter` for emitting values and
    /// `SubjectReceiver` for subscribing to values.
    #[must_use]
    pub fn emitter_receiver() -> (SubjectEmitter<T>, SubjectReceiver<T>) {
        let s = Arc::new(Mutex::new(Subject {
            observers: Vec::with_capacity(4),
            next_key: 0,
            completed: false,
            closed: false,
            error: None,
        }));

        (
            SubjectEmitter(Arc::clone(&s)),
            SubjectReceiver(Arc::clone(&s)),
        )
    }
}

/// Subscribing half of a [`Subject`].
pub struct SubjectReceiver<T>(Arc<Mutex<Subject<T>>>);

/// Emitting half of a [`Subject`].
pub struct SubjectEmitter<T>(Arc<Mutex<Subject<T>>>);

impl<T> Clone for SubjectReceiver<T> {
    fn clone(&self) -> Self {
        SubjectReceiver(Arc::clone(&self.0))
    }
}

impl<T> Clone for SubjectEmitter<T> {
    fn clone(&self) -> Self {
        SubjectEmitter(Arc::clone(&self.0))
    }
}

impl<T> SubjectReceiver<T> {
    /// Returns the number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.lock().observers.len()
    }

    /// Returns `true` if no observers are registered, `false` otherwise.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Subscribeable for SubjectReceiver<T> {
    type ObsType = T;

    fn subscribe(&self, mut v: Subscriber<Self::ObsType>) -> Subscription {
        let subscription = Subscription::pending(v.token());
        v.release_on_terminal(subscription.clone());

        let mut src = self.0.lock();

        // A closed Subject neither emits nor registers.
        if src.closed {
            drop(src);
            subscription.dispose();
            return subscription;
        }
        // A terminated Subject replays its terminal event.
        if src.completed {
            let error = src.error.clone();
            drop(src);
            match error {
                Some(err) => v.error(err),
                None => v.complete(),
            }
            subscription.attach(UnsubscribeLogic::Nil);
            return subscription;
        }

        let key = src.next_key;
        src.next_key += 1;
        src.observers.push((key, Arc::new(Mutex::new(v))));
        drop(src);

        let source_cloned = Arc::clone(&self.0);
        subscription.attach(UnsubscribeLogic::Logic(Box::new(move || {
            source_cloned.lock().observers.retain(|(k, _)| *k != key);
        })));
        subscription
    }

    fn into_observable(self) -> Observable<T> {
        Observable::new(move |subscriber| self.subscribe(subscriber))
    }
}

impl<T> Unsubscribeable for SubjectReceiver<T> {
    /// Close the subject: drop every registered observer and refuse new ones.
    fn unsubscribe(self) {
        let mut r = self.0.lock();
        r.closed = true;
        r.observers.clear();
    }
}

impl<T> SubjectEmitter<T> {
    fn snapshot(&self) -> Option<Vec<SharedSubscriber<T>>> {
        let src = self.0.lock();
        if src.completed || src.closed {
            return None;
        }
        Some(src.observers.iter().map(|(_, o)| Arc::clone(o)).collect())
    }

    fn terminate(&self, error: Option<ObservableError>) -> Option<Vec<SharedSubscriber<T>>> {
        let mut src = self.0.lock();
        if src.completed || src.closed {
            return None;
        }
        src.completed = true;
        src.error = error;
        Some(src.observers.drain(..).map(|(_, o)| o).collect())
    }
}

impl<T: Clone> Observer for SubjectEmitter<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        // Observers are called without holding the subject lock so they may
        // subscribe to or unsubscribe from this subject.
        if let Some(observers) = self.snapshot() {
            for o in observers {
                o.lock().next(v.clone());
            }
        }
    }

    fn error(&mut self, e: ObservableError) {
        if let Some(observers) = self.terminate(Some(Arc::clone(&e))) {
            for o in observers {
                o.lock().error(Arc::clone(&e));
            }
        }
    }

    fn complete(&mut self) {
        if let Some(observers) = self.terminate(None) {
            for o in observers {
                o.lock().complete();
            }
        }
    }
}

impl<T: Clone + 'static> From<SubjectEmitter<T>> for Subscriber<T> {
    fn from(mut value: SubjectEmitter<T>) -> Self {
        let mut vn = value.clone();
        let mut ve = value.clone();
        Subscriber::new(
            move |v| {
                vn.next(v);
            },
            move |e| ve.error(e),
            move || value.complete(),
        )
    }
}

impl<T: 'static> From<SubjectReceiver<T>> for Observable<T> {
    fn from(value: SubjectReceiver<T>) -> Self {
        value.into_observable()
    }
}

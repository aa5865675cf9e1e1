use std::{collections::VecDeque, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{
    notification::Notification,
    observer::Observer,
    scheduler::Scheduler,
    subjects::{Subject, SubjectEmitter},
    subscription::{
        subscribe::{
            SerialSubscription, Subscribeable, Subscriber, Subscription, UnsubscribeLogic,
        },
        DisposeBag,
    },
    Unsubscribeable,
};

use super::Observable;

struct BufferState<T> {
    observer: Subscriber<Vec<T>>,
    batch: Vec<T>,
    generation: u64,
}

impl<T> BufferState<T> {
    fn flush(&mut self) -> u64 {
        let batch = std::mem::take(&mut self.batch);
        self.generation += 1;
        self.observer.next(batch);
        self.generation
    }
}

pub(super) fn buffer<T, S>(
    source: Observable<T>,
    time_span: Duration,
    count: usize,
    scheduler: S,
) -> Observable<Vec<T>>
where
    T: Send + 'static,
    S: Scheduler + Clone,
{
    Observable::new(move |o| {
        let upstream = o.token().child();
        let state = Arc::new(Mutex::new(BufferState {
            observer: o,
            batch: Vec::new(),
            generation: 0,
        }));
        let timer = SerialSubscription::new();
        start_buffer_timer(&scheduler, &state, &timer, 0, time_span);

        let state_n = Arc::clone(&state);
        let state_e = Arc::clone(&state);
        let timer_n = timer.clone();
        let timer_e = timer.clone();
        let timer_c = timer.clone();
        let scheduler_n = scheduler.clone();

        let u = Subscriber::new(
            move |v| {
                let mut st = state_n.lock();
                st.batch.push(v);
                if count > 0 && st.batch.len() >= count {
                    let generation = st.flush();
                    drop(st);
                    start_buffer_timer(&scheduler_n, &state_n, &timer_n, generation, time_span);
                }
            },
            move |observable_error| {
                timer_e.dispose();
                state_e.lock().observer.error(observable_error);
            },
            move || {
                timer_c.dispose();
                let mut st = state.lock();
                st.flush();
                st.observer.complete();
            },
        )
        .with_token(upstream);

        let source_subscription = source.subscribe(u);
        Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
            timer.dispose();
            source_subscription.unsubscribe();
        })))
    })
}

fn start_buffer_timer<T, S>(
    scheduler: &S,
    state: &Arc<Mutex<BufferState<T>>>,
    timer: &SerialSubscription,
    generation: u64,
    time_span: Duration,
) where
    T: Send + 'static,
    S: Scheduler + Clone,
{
    let next_scheduler = scheduler.clone();
    let next_state = Arc::clone(state);
    let next_timer = timer.clone();

    let handle = scheduler.schedule(
        time_span,
        Box::new(move || {
            let next_generation = {
                let mut st = next_state.lock();
                if st.generation != generation || st.observer.is_closed() {
                    return;
                }
                st.flush()
            };
            start_buffer_timer(
                &next_scheduler,
                &next_state,
                &next_timer,
                next_generation,
                time_span,
            );
        }),
    );
    timer.set(generation, handle);
}

struct WindowState<T> {
    observer: Subscriber<Observable<T>>,
    current: SubjectEmitter<T>,
    count: usize,
    generation: u64,
}

impl<T: Clone + Send + 'static> WindowState<T> {
    fn open(observer: Subscriber<Observable<T>>) -> Self {
        let (emitter, receiver) = Subject::emitter_receiver();
        let mut state = WindowState {
            observer,
            current: emitter,
            count: 0,
            generation: 0,
        };
        state.observer.next(receiver.into_observable());
        state
    }

    fn roll_over(&mut self) -> u64 {
        self.current.complete();
        let (emitter, receiver) = Subject::emitter_receiver();
        self.current = emitter;
        self.count = 0;
        self.generation += 1;
        self.observer.next(receiver.into_observable());
        self.generation
    }
}

pub(super) fn window<T, S>(
    source: Observable<T>,
    time_span: Duration,
    count: usize,
    scheduler: S,
) -> Observable<Observable<T>>
where
    T: Clone + Send + 'static,
    S: Scheduler + Clone,
{
    Observable::new(move |o| {
        let upstream = o.token().child();
        let state = Arc::new(Mutex::new(WindowState::open(o)));
        let timer = SerialSubscription::new();
        start_window_timer(&scheduler, &state, &timer, 0, time_span);

        let state_n = Arc::clone(&state);
        let state_e = Arc::clone(&state);
        let timer_n = timer.clone();
        let timer_e = timer.clone();
        let timer_c = timer.clone();
        let scheduler_n = scheduler.clone();

        let u = Subscriber::new(
            move |v| {
                let mut st = state_n.lock();
                st.current.next(v);
                st.count += 1;
                if count > 0 && st.count >= count {
                    let generation = st.roll_over();
                    drop(st);
                    start_window_timer(&scheduler_n, &state_n, &timer_n, generation, time_span);
                }
            },
            move |observable_error| {
                timer_e.dispose();
                let mut st = state_e.lock();
                st.current.error(Arc::clone(&observable_error));
                st.observer.error(observable_error);
            },
            move || {
                timer_c.dispose();
                let mut st = state.lock();
                st.current.complete();
                st.observer.complete();
            },
        )
        .with_token(upstream);

        let source_subscription = source.subscribe(u);
        Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
            timer.dispose();
            source_subscription.unsubscribe();
        })))
    })
}

fn start_window_timer<T, S>(
    scheduler: &S,
    state: &Arc<Mutex<WindowState<T>>>,
    timer: &SerialSubscription,
    generation: u64,
    time_span: Duration,
) where
    T: Clone + Send + 'static,
    S: Scheduler + Clone,
{
    let next_scheduler = scheduler.clone();
    let next_state = Arc::clone(state);
    let next_timer = timer.clone();

    let handle = scheduler.schedule(
        time_span,
        Box::new(move || {
            let next_generation = {
                let mut st = next_state.lock();
                if st.generation != generation || st.observer.is_closed() {
                    return;
                }
                st.roll_over()
            };
            start_window_timer(
                &next_scheduler,
                &next_state,
                &next_timer,
                next_generation,
                time_span,
            );
        }),
    );
    timer.set(generation, handle);
}

struct DelayState<T> {
    observer: Subscriber<T>,
    queue: VecDeque<(Duration, Notification<T>)>,
}

impl<T> DelayState<T> {
    fn drain_due(&mut self, now: Duration) {
        while self.queue.front().map_or(false, |(due, _)| *due <= now) {
            match self.queue.pop_front() {
                Some((_, Notification::Next(v))) => self.observer.next(v),
                Some((_, Notification::Completed)) => self.observer.complete(),
                Some((_, Notification::Error(e))) => self.observer.error(e),
                None => break,
            }
        }
    }
}

pub(super) fn delay<T, S>(source: Observable<T>, delay: Duration, scheduler: S) -> Observable<T>
where
    T: Send + 'static,
    S: Scheduler + Clone,
{
    Observable::new(move |o| {
        let upstream = o.token().child();
        let state = Arc::new(Mutex::new(DelayState {
            observer: o,
            queue: VecDeque::new(),
        }));
        let timers = DisposeBag::new();

        let enqueue = {
            let state = Arc::clone(&state);
            let timers = timers.clone();
            let scheduler = scheduler.clone();
            move |event: Notification<T>| {
                let due = scheduler.now() + delay;
                state.lock().queue.push_back((due, event));

                let state = Arc::clone(&state);
                let clock = scheduler.clone();
                scheduler
                    .schedule(
                        delay,
                        Box::new(move || state.lock().drain_due(clock.now())),
                    )
                    .disposed_by(&timers);
            }
        };
        let enqueue = Arc::new(enqueue);
        let enqueue_c = Arc::clone(&enqueue);

        let u = Subscriber::new(
            move |v| {
                enqueue(Notification::Next(v));
            },
            move |observable_error| {
                let mut st = state.lock();
                st.queue.clear();
                st.observer.error(observable_error);
            },
            move || {
                enqueue_c(Notification::Completed);
            },
        )
        .with_token(upstream);

        let source_subscription = source.subscribe(u);
        Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
            timers.dispose();
            source_subscription.unsubscribe();
        })))
    })
}

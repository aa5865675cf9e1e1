use std::{fmt::Debug, sync::Arc, time::Duration};

use crate::{
    observer::Observer,
    scheduler::Scheduler,
    subjects::Subject,
    subscription::{
        subscribe::{Subscribeable, Subscriber, Subscription, UnsubscribeLogic},
        DisposeBag,
    },
    Observable, ObservableExt, RxError,
};

use super::{Console, ConsoleObserver, DemoKind};

/// The demo procedures, sharing one dispose bag, one scheduler and one console.
pub struct DemoCatalogue {
    bag: DisposeBag,
    scheduler: Arc<dyn Scheduler>,
    console: Console,
}

impl DemoCatalogue {
    #[must_use]
    pub fn new(scheduler: Arc<dyn Scheduler>, console: Console) -> Self {
        DemoCatalogue {
            bag: DisposeBag::new(),
            scheduler,
            console,
        }
    }

    #[must_use]
    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Subscriptions started by the demos so far.
    #[must_use]
    pub fn bag(&self) -> &DisposeBag {
        &self.bag
    }

    /// Release every subscription started by the demos.
    pub fn dispose(&self) {
        self.bag.dispose();
    }

    pub fn run(&self, kind: DemoKind) {
        tracing::info!(demo = %kind, "running demo");
        match kind {
            DemoKind::Create => self.create(),
            DemoKind::Of => self.of(),
            DemoKind::From => self.from(),
            DemoKind::Deferred => self.deferred(),
            DemoKind::Empty => self.empty(),
            DemoKind::Repeat => self.repeat(),
            DemoKind::Interval => self.interval(),
            DemoKind::Range => self.range(),
            DemoKind::StartWith => self.start_with(),
            DemoKind::Timer => self.timer(),
            DemoKind::Buffer => self.buffer(),
            DemoKind::Window => self.window(),
            DemoKind::Map => self.map(),
            DemoKind::FlatMap => self.flat_map(),
            DemoKind::Scan => self.scan(),
            DemoKind::Filter => self.filter(),
            DemoKind::Skip => self.skip(),
            DemoKind::TakeLast => self.take_last(),
            DemoKind::Merge => self.merge(),
            DemoKind::CombineLatest => self.combine_latest(),
            DemoKind::Zip => self.zip(),
            DemoKind::Concat => self.concat(),
            DemoKind::CatchError => self.catch_error(),
            DemoKind::Retry => self.retry(),
            DemoKind::Delay => self.delay(),
            DemoKind::Do => self.do_taps(),
            DemoKind::ToArray => self.to_array(),
            DemoKind::Reduce => self.reduce(),
            DemoKind::Driver => self.driver(),
        }
    }

    fn printer<T: Debug + 'static>(&self) -> Subscriber<T> {
        Subscriber::from_observer(ConsoleObserver::new(self.console.clone()))
    }

    fn show<T: Debug + 'static>(&self, observable: impl Subscribeable<ObsType = T>) {
        observable.subscribe(self.printer()).disposed_by(&self.bag);
    }

    // Creating observables

    /// next(1) next(2) next(3) completed disposed
    fn create(&self) {
        let console = self.console.clone();
        let observable = Observable::new(move |mut o: Subscriber<i32>| {
            o.next(1);
            o.next(2);
            o.next(3);
            o.complete();

            let console = console.clone();
            Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
                console.print("disposed");
            })))
        });
        self.show(observable);
    }

    fn of(&self) {
        self.show(Observable::of([1, 2, 3]));
    }

    fn from(&self) {
        self.show(Observable::from_iter(vec![1, 2, 3]));
    }

    /// The factory only runs once subscribed.
    fn deferred(&self) {
        self.show(Observable::deferred(|| Observable::just(1)));
    }

    fn empty(&self) {
        self.show(Observable::<i32>::empty());
    }

    fn repeat(&self) {
        self.show(Observable::repeat_element("a").take(5));
    }

    /// next(0) next(1) ... every second until the bag is disposed.
    fn interval(&self) {
        self.show(Observable::interval(
            Duration::from_secs(1),
            self.scheduler.clone(),
        ));
    }

    fn range(&self) {
        self.show(Observable::range(0, 3));
    }

    fn start_with(&self) {
        self.show(Observable::of([1, 2, 3]).start_with([0]));
    }

    /// next(0) completed after three seconds.
    fn timer(&self) {
        self.show(Observable::timer(
            Duration::from_secs(3),
            self.scheduler.clone(),
        ));
    }

    // Transforming observables

    /// next(["1", "1"]) next(["2"]) completed
    fn buffer(&self) {
        self.show(Observable::of(["1", "1", "2"]).buffer(
            Duration::from_secs(1),
            2,
            self.scheduler.clone(),
        ));
    }

    /// next("1") next("1") completed next("2") completed
    fn window(&self) {
        let windows = Observable::of(["1", "1", "2"]).window(
            Duration::from_secs(1),
            2,
            self.scheduler.clone(),
        );

        let bag = self.bag.clone();
        let console = self.console.clone();
        windows
            .subscribe(Subscriber::on_next(move |window: Observable<&'static str>| {
                window
                    .subscribe(Subscriber::from_observer(ConsoleObserver::new(
                        console.clone(),
                    )))
                    .disposed_by(&bag);
            }))
            .disposed_by(&self.bag);
    }

    fn map(&self) {
        self.show(Observable::of([1, 2, 3]).map(|v| v.to_string()));
    }

    /// Every tick becomes two emissions: next("0") next("0") next("1") next("1") ...
    fn flat_map(&self) {
        self.show(
            Observable::interval(Duration::from_secs(1), self.scheduler.clone())
                .flat_map(|count| Observable::of([count.to_string(), count.to_string()])),
        );
    }

    /// next(0) next(1) next(3) next(6) next(10) ...
    fn scan(&self) {
        self.show(
            Observable::interval(Duration::from_secs(1), self.scheduler.clone())
                .scan(0_u64, |accumulator, n| *accumulator + n),
        );
    }

    // Filtering observables

    fn filter(&self) {
        self.show(Observable::of([1, 2, 3, 4, 5, 6, 1]).filter(|v| *v > 3));
    }

    fn skip(&self) {
        self.show(Observable::of([1, 2, 3, 4, 5, 6, 1]).skip(2));
    }

    /// next(6) next(1) completed
    fn take_last(&self) {
        self.show(Observable::of([1, 2, 3, 4, 5, 6, 1]).take_last(2));
    }

    // Combining observables

    fn merge(&self) {
        self.show(Observable::of([1, 2, 3]).merge_one(Observable::of([4, 5, 6])));
    }

    /// next((1, 2)) next((3, 2)) next((3, 4)) completed
    fn combine_latest(&self) {
        let (mut first, first_rx) = Subject::<i32>::emitter_receiver();
        let (mut second, second_rx) = Subject::<i32>::emitter_receiver();

        self.show(first_rx.combine_latest(second_rx));

        first.next(1);
        second.next(2);
        first.next(3);
        second.next(4);
        first.complete();
        second.complete();
    }

    /// next((1, 2)) next((3, 4)) completed
    fn zip(&self) {
        let (mut first, first_rx) = Subject::<i32>::emitter_receiver();
        let (mut second, second_rx) = Subject::<i32>::emitter_receiver();

        self.show(first_rx.zip(second_rx));

        first.next(1);
        second.next(2);
        first.next(3);
        second.next(4);
        first.complete();
        second.complete();
    }

    fn concat(&self) {
        self.show(Observable::of([1, 2]).concat(Observable::of([3, 4])));
    }

    // Error handling

    /// next(1) next(2) next(-1) completed
    fn catch_error(&self) {
        self.show(failing_source().catch_error(|_| Observable::just(-1)));
    }

    /// next(1) next(2) next(1) next(2) error(test error)
    fn retry(&self) {
        self.show(failing_source().retry(2));
    }

    // Utility operators

    fn delay(&self) {
        self.show(Observable::of([1, 2, 3]).delay(Duration::from_secs(1), self.scheduler.clone()));
    }

    fn do_taps(&self) {
        let on_next = self.console.clone();
        let on_completed = self.console.clone();
        let on_dispose = self.console.clone();

        self.show(
            Observable::of([1, 2, 3])
                .do_on_next(move |v| on_next.print(format!("do: next({v})")))
                .do_on_completed(move || on_completed.print("do: completed"))
                .do_on_dispose(move || on_dispose.print("do: disposed")),
        );
    }

    /// next([1, 2, 3]) completed
    fn to_array(&self) {
        self.show(Observable::of([1, 2, 3]).to_array());
    }

    /// next(6) completed
    fn reduce(&self) {
        self.show(Observable::of([1, 2, 3]).reduce(0, |accumulator, v| accumulator + v));
    }

    /// A stream that never errors: failures are replaced by a fallback value and
    /// an initial value is shown before anything else.
    ///
    /// next("initial") next("tap") next("tap") next("fallback") completed
    fn driver(&self) {
        self.show(
            Observable::of(["tap", "tap"])
                .concat(Observable::error(
                    RxError::custom("tap failed").into_observable_error(),
                ))
                .catch_error_just_return("fallback")
                .start_with(["initial"]),
        );
    }
}

/// Emits 1 and 2, then fails.
fn failing_source() -> Observable<i32> {
    Observable::new(|mut o| {
        o.next(1);
        o.next(2);
        o.error(RxError::custom("test error").into_observable_error());
        Subscription::empty()
    })
}

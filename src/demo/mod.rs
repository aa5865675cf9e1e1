//! Operator demos.
//!
//! Every demo builds one pipeline, subscribes a [`ConsoleObserver`] to it and
//! registers the subscription in the catalogue's [`DisposeBag`](crate::DisposeBag).
//! Demos share nothing but that bag.

mod catalogue;

pub use catalogue::DemoCatalogue;

use std::{fmt, marker::PhantomData, str::FromStr, sync::Arc};

use parking_lot::Mutex;

use crate::{notification::Notification, observer::Observer, ObservableError, RxError};

/// Output sink of the demos.
///
/// Lines are written to stdout when echo is on and are always kept in memory so
/// they can be inspected afterwards.
#[derive(Clone, Default)]
pub struct Console {
    echo: bool,
    lines: Arc<Mutex<Vec<String>>>,
}

impl Console {
    /// A console printing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Console {
            echo: true,
            lines: Arc::default(),
        }
    }

    /// A console that only records.
    #[must_use]
    pub fn recording() -> Self {
        Console::default()
    }

    pub fn print(&self, line: impl Into<String>) {
        let line = line.into();
        if self.echo {
            println!("{line}");
        }
        self.lines.lock().push(line);
    }

    /// Every line printed so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

/// Prints every event it observes as `next(..)`, `error(..)` or `completed`.
pub struct ConsoleObserver<T> {
    console: Console,
    _marker: PhantomData<fn(T)>,
}

impl<T> ConsoleObserver<T> {
    #[must_use]
    pub fn new(console: Console) -> Self {
        ConsoleObserver {
            console,
            _marker: PhantomData,
        }
    }
}

impl<T: fmt::Debug> Observer for ConsoleObserver<T> {
    type NextFnType = T;

    fn next(&mut self, v: T) {
        self.console.print(Notification::Next(v).to_string());
    }

    fn complete(&mut self) {
        self.console
            .print(Notification::<T>::Completed.to_string());
    }

    fn error(&mut self, e: ObservableError) {
        self.console.print(Notification::<T>::Error(e).to_string());
    }
}

macro_rules! demo_kinds {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Names every demo of the [`DemoCatalogue`].
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum DemoKind {
            $($variant),+
        }

        impl DemoKind {
            /// Every demo, in catalogue order.
            pub const ALL: &'static [DemoKind] = &[$(DemoKind::$variant),+];

            /// Name used on the command line.
            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $(DemoKind::$variant => $name),+
                }
            }
        }
    };
}

demo_kinds! {
    Create => "create",
    Of => "of",
    From => "from",
    Deferred => "deferred",
    Empty => "empty",
    Repeat => "repeat",
    Interval => "interval",
    Range => "range",
    StartWith => "start-with",
    Timer => "timer",
    Buffer => "buffer",
    Window => "window",
    Map => "map",
    FlatMap => "flat-map",
    Scan => "scan",
    Filter => "filter",
    Skip => "skip",
    TakeLast => "take-last",
    Merge => "merge",
    CombineLatest => "combine-latest",
    Zip => "zip",
    Concat => "concat",
    CatchError => "catch-error",
    Retry => "retry",
    Delay => "delay",
    Do => "do",
    ToArray => "to-array",
    Reduce => "reduce",
    Driver => "driver",
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DemoKind {
    type Err = RxError;

    /// Accepts the command line name, with `_` allowed in place of `-`, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        DemoKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| RxError::UnknownDemo {
                name: s.to_string(),
            })
    }
}

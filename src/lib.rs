//! `rxstudy` is a small reactive extensions library together with a catalogue of
//! demos exercising its operators.
//!
//! An [`Observable`] is a cold producer of values. Subscribing to it with a
//! [`Subscriber`] starts the producer and returns a [`Subscription`] whose release
//! stops it. Operators from [`ObservableExt`] build new observables out of existing
//! ones, and time-based operators take a [`Scheduler`] so they can run in real time
//! on Tokio or deterministically on a [`VirtualTimeScheduler`].
//!
//! ```
//! use rxstudy::{DisposeBag, Notification, Observable, ObservableExt, Subscribeable, Subscriber};
//!
//! let bag = DisposeBag::new();
//!
//! Observable::of([1, 2, 3, 4, 5, 6])
//!     .filter(|v| v % 2 == 0)
//!     .map(|v| v * 10)
//!     .subscribe(Subscriber::on_event(|event: Notification<i32>| println!("{event}")))
//!     .disposed_by(&bag);
//! // next(20)
//! // next(40)
//! // next(60)
//! // completed
//! ```
//!
//! The [`demo`] module holds the operator catalogue and [`screen`] the lifecycle
//! shell that runs one demo, which is what the `rxstudy` binary drives.

pub mod demo;
pub mod notification;
pub mod observable;
pub mod observer;
pub mod scheduler;
pub mod screen;
pub mod subjects;
pub mod subscription;

mod errors;

pub use errors::*;
pub use notification::Notification;
pub use observable::{Observable, ObservableExt};
pub use observer::Observer;
pub use scheduler::{schedule_periodic, Scheduler, TokioScheduler, VirtualTimeScheduler};
pub use subjects::Subject;
pub use subscription::{subscribe, DisposeBag};
pub use subscribe::{
    CancelToken, Subscribeable, Subscriber, SubscriberState, Subscription, UnsubscribeLogic,
    Unsubscribeable,
};

//! The `subjects` module provides a publish subject for pushing values into a
//! stream from the outside. A subject serves both as an observer and an observable,
//! allowing multiple observers to subscribe to a single source of values.
//!
//! Subjects are split into an emitter and a receiver using the `emitter_receiver`
//! function. The `SubjectEmitter` behaves as an `Observer`, enabling `next()`,
//! `error()` and `complete()` calls, so it can also be passed to the `subscribe`
//! method of another `Observable`. The `SubjectReceiver` functions as an
//! `Observable`, so every operator can be chained on it.

mod subject;

pub use subject::*;

//! Provides structures and traits related to subscription management.
//!
//! This module includes types such as `Subscriber` for handling observed values,
//! errors, and completions, `Subscription` for controlling subscriptions to
//! observables and subjects, and `DisposeBag` for releasing a group of
//! subscriptions together.
mod dispose_bag;
pub mod subscribe;

pub use dispose_bag::DisposeBag;

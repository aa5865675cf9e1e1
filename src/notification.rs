//! Materialized observable events.

use std::fmt::{self, Debug, Display};

use crate::ObservableError;

/// One event of an observable stream.
///
/// Rendered with `Display` the same way a ReactiveX event is printed:
/// `next(1)`, `error(boom)` and `completed`.
pub enum Notification<T> {
    Next(T),
    Error(ObservableError),
    Completed,
}

impl<T> Notification<T> {
    /// Returns `true` for `Error` and `Completed`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Notification::Next(_))
    }

    /// Borrow the value of a `Next` event.
    pub fn value(&self) -> Option<&T> {
        match self {
            Notification::Next(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: Clone> Clone for Notification<T> {
    fn clone(&self) -> Self {
        match self {
            Notification::Next(v) => Notification::Next(v.clone()),
            Notification::Error(e) => Notification::Error(e.clone()),
            Notification::Completed => Notification::Completed,
        }
    }
}

impl<T: Debug> Debug for Notification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Next(v) => f.debug_tuple("Next").field(v).finish(),
            Notification::Error(e) => f.debug_tuple("Error").field(&e.to_string()).finish(),
            Notification::Completed => f.write_str("Completed"),
        }
    }
}

impl<T: Debug> Display for Notification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Next(v) => write!(f, "next({v:?})"),
            Notification::Error(e) => write!(f, "error({e})"),
            Notification::Completed => f.write_str("completed"),
        }
    }
}

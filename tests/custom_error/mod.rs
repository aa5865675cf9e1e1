#![allow(dead_code)]

use rxstudy::{ObservableError, RxError};

pub const CUSTOM_ERROR: &str = "Custom error occurred";

/// The error injected into streams by the integration tests.
pub fn custom_error() -> ObservableError {
    RxError::custom(CUSTOM_ERROR).into_observable_error()
}

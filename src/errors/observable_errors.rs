use std::{error::Error, sync::Arc};

/// Error payload carried by the `error` event of an observable stream.
///
/// Errors travel through operator chains by reference count, so a single error
/// can be observed by `catch_error` handlers, taps and the final `Subscriber`
/// without cloning the underlying value.
pub type ObservableError = Arc<dyn Error + Send + Sync>;

/// Errors produced by `rxstudy` itself.
#[derive(Debug, thiserror::Error)]
pub enum RxError {
    /// Free-form error, used by demos and tests to inject failures into a stream.
    #[error("{message}")]
    Custom {
        /// Description of the failure.
        message: String,
    },

    /// The requested demo does not exist in the catalogue.
    #[error("unknown demo `{name}`")]
    UnknownDemo {
        /// Name that failed to resolve.
        name: String,
    },

    /// A real-time scheduler was requested outside of a Tokio runtime.
    #[error("no Tokio runtime available for the real-time scheduler")]
    SchedulerUnavailable,
}

impl RxError {
    /// Create a custom error with the given message.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }

    /// Wrap this error into the shared payload used by `Observer::error`.
    #[must_use]
    pub fn into_observable_error(self) -> ObservableError {
        Arc::new(self)
    }
}

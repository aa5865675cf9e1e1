use crate::ObservableError;

/// The three-callback sink that receives events pushed by an observable.
///
/// `Subscriber`, `SubjectEmitter` and the demo `ConsoleObserver` all implement
/// this trait. A well behaved producer calls `next` zero or more times followed by
/// at most one of `error` or `complete`.
pub trait Observer {
    type NextFnType;

    fn next(&mut self, _: Self::NextFnType);
    fn complete(&mut self);
    fn error(&mut self, _: ObservableError);
}

//! Error types shared by observables, schedulers and the demo catalogue.
mod observable_errors;

pub use observable_errors::*;

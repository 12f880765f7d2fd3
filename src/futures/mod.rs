//! The single-assignment future and its building blocks.
//!
//! The following sub-modules are exposed by the `futures` module:
//!
//! - `deadline`: Absolute expiry times, checked lazily by readers.
//! - `future`: The [Future](future::Future) itself, filled once by a producer
//!   and read by any number of consumers.
//! - `state`: The lifecycle flag that every read and write synchronises on.
//!
//! Most users only need [crate::Future] and the [crate::task] helpers, which
//! are re-exported from the crate root.
pub mod deadline;
pub mod future;
pub mod state;

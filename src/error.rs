//! Failure outcomes.
//!
//! Neither outcome is a fault: a reader that gives up on an expired future and
//! a producer that loses the race are both expected parts of the protocol, so
//! they are reported as plain values and never as panics.
use std::fmt;

use crate::futures::state::State;

/// Why a future did not yield a value, or did not accept one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The deadline elapsed before any value was written.
    #[error("deadline elapsed before a value was written")]
    Expired,
    /// A write was attempted on a future that already holds a value or has
    /// already expired. The written value was discarded.
    #[error("future already holds a value or has expired")]
    AlreadySet,
}

/// A write that lost the race out of `Idle`.
///
/// Hands the undelivered value back to the producer together with the state
/// that beat it, either `Committing`/`Ready` (another write) or `Failed` (the
/// deadline).
pub struct Rejected<T> {
    pub value: T,
    pub state: State,
}

impl<T> Rejected<T> {
    /// Whether the write was beaten by the deadline rather than by another
    /// write.
    pub fn expired(&self) -> bool {
        self.state == State::Failed
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> fmt::Debug for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("value", &"<opaque>")
            .field("state", &self.state)
            .finish()
    }
}

impl<T> fmt::Display for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "write rejected, future is {:?}", self.state)
    }
}

impl<T> std::error::Error for Rejected<T> {}

impl<T> From<Rejected<T>> for Error {
    fn from(_: Rejected<T>) -> Self {
        Error::AlreadySet
    }
}

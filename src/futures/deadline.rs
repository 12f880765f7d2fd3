//! Reader-driven deadlines.
//!
//! A [Deadline] is an absolute point on the monotonic clock. There is no
//! background timer behind it: it only takes effect when a reader checks it,
//! so a future with an elapsed deadline that nobody reads stays `Idle`.
//!
//! # Example
//! ```
//! use settle::futures::deadline::Deadline;
//! use std::time::Duration;
//!
//! let deadline = Deadline::after(Duration::from_millis(20)).unwrap();
//! assert!(!deadline.has_elapsed());
//!
//! std::thread::sleep(Duration::from_millis(30));
//! assert!(deadline.has_elapsed());
//! assert_eq!(deadline.remaining(), Duration::ZERO);
//! ```
use std::time::{Duration, Instant};

use log::warn;

/// An absolute expiry time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    expiration: Instant,
}

impl Deadline {
    /// Compute a deadline `d` from now.
    ///
    /// Returns `None` if `d` is too large to be represented on this platform's
    /// clock. Such a deadline could never be reached, so callers treat it as
    /// no deadline at all.
    #[must_use]
    pub fn after(d: Duration) -> Option<Self> {
        match Instant::now().checked_add(d) {
            Some(expiration) => Some(Self { expiration }),
            None => {
                warn!("timeout of {:?} overflows the clock, ignoring", d);
                None
            }
        }
    }

    /// The absolute instant at which this deadline elapses.
    pub fn instant(&self) -> Instant {
        self.expiration
    }

    pub fn has_elapsed(&self) -> bool {
        Instant::now() >= self.expiration
    }

    /// Time left until the deadline, or zero once it has elapsed.
    pub fn remaining(&self) -> Duration {
        self.expiration.saturating_duration_since(Instant::now())
    }
}

impl From<Instant> for Deadline {
    fn from(expiration: Instant) -> Self {
        Self { expiration }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::Deadline;

    #[test]
    fn elapses() {
        let before = Instant::now();
        let deadline = Deadline::after(Duration::from_millis(100)).unwrap();

        assert!(!deadline.has_elapsed());
        assert!(deadline.remaining() <= Duration::from_millis(100));
        assert!(deadline.instant() >= before + Duration::from_millis(100));

        while !deadline.has_elapsed() {
            std::thread::yield_now();
        }

        assert!(Instant::now() - before >= Duration::from_millis(100));
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }

    #[test]
    fn zero_is_already_elapsed() {
        let deadline = Deadline::after(Duration::ZERO).unwrap();
        assert!(deadline.has_elapsed());
    }

    #[test]
    fn overflow_is_no_deadline() {
        assert!(Deadline::after(Duration::MAX).is_none());
    }

    #[test]
    fn ordering_follows_instant() {
        let now = Instant::now();
        let early = Deadline::from(now);
        let late = Deadline::from(now + Duration::from_secs(1));

        assert!(early < late);
    }
}

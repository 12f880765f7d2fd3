//! Lifecycle flag of a [Future](super::future::Future).
//!
//! A future moves through a small state machine:
//!
//! ```text
//!          write wins            value stored
//!   Idle ─────────────▶ Committing ─────────▶ Ready
//!     │
//!     │ deadline elapsed and a reader wins
//!     ▼
//!   Failed
//! ```
//!
//! Leaving `Idle` is always done with a compare-and-swap, so of all the
//! parties racing to move a future out of `Idle` exactly one succeeds. `Ready`
//! and `Failed` are terminal.
use std::sync::atomic::{AtomicU8, Ordering};

use log::trace;

/// The lifecycle state of a future.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum State {
    /// No value yet and no expiry observed.
    Idle = 0,
    /// A producer won the race and is storing its value.
    Committing = 1,
    /// The value has been published and may be read.
    Ready = 2,
    /// The deadline elapsed before any producer committed.
    Failed = 3,
}

impl State {
    /// Returns `true` for `Ready` and `Failed`, the states that are never
    /// left again.
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Ready | State::Failed)
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => State::Idle,
            1 => State::Committing,
            2 => State::Ready,
            _ => State::Failed,
        }
    }
}

/// An atomically updated [State].
///
/// Every access reloads the underlying atomic; callers must not cache the
/// result across a retry.
pub(crate) struct AtomicState(AtomicU8);

impl AtomicState {
    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(State::Idle as u8))
    }

    pub(crate) fn load(&self) -> State {
        State::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Guarded transition from `from` to `to`.
    ///
    /// On failure the state that is currently held is returned, which is the
    /// outcome of whichever party got there first.
    pub(crate) fn transition(&self, from: State, to: State) -> Result<State, State> {
        match self.0.compare_exchange(
            from as u8,
            to as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                trace!("state {:?} -> {:?}", from, to);
                Ok(to)
            }
            Err(actual) => Err(State::from_u8(actual)),
        }
    }

    /// Publish `Ready` after the value has been stored.
    ///
    /// Only the producer holding `Committing` may call this. The release store
    /// makes the value write visible to any reader that acquires `Ready`.
    pub(crate) fn publish(&self) {
        debug_assert_eq!(self.load(), State::Committing);
        self.0.store(State::Ready as u8, Ordering::Release);
        trace!("state {:?} -> {:?}", State::Committing, State::Ready);
    }
}

impl std::fmt::Debug for AtomicState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AtomicState").field(&self.load()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Barrier,
        },
        thread,
    };

    use super::{AtomicState, State};

    #[test]
    fn starts_idle() {
        let state = AtomicState::new();
        assert_eq!(state.load(), State::Idle);
        assert!(!state.load().is_terminal());
    }

    #[test]
    fn commit_then_publish() {
        let state = AtomicState::new();

        assert_eq!(state.transition(State::Idle, State::Committing), Ok(State::Committing));
        assert_eq!(state.load(), State::Committing);

        state.publish();
        assert_eq!(state.load(), State::Ready);
        assert!(state.load().is_terminal());
    }

    #[test]
    fn losing_transition_reports_winner() {
        let state = AtomicState::new();

        state.transition(State::Idle, State::Failed).unwrap();

        assert_eq!(
            state.transition(State::Idle, State::Committing),
            Err(State::Failed)
        );
        assert_eq!(state.load(), State::Failed);
    }

    #[test]
    fn single_winner_under_contention() {
        const THREADS: usize = 16;

        let state = Arc::new(AtomicState::new());
        let barrier = Arc::new(Barrier::new(THREADS));
        let wins = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let state = state.clone();
                let barrier = barrier.clone();
                let wins = wins.clone();

                thread::spawn(move || {
                    let to = if i % 2 == 0 {
                        State::Committing
                    } else {
                        State::Failed
                    };

                    barrier.wait();

                    if state.transition(State::Idle, to).is_ok() {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(wins.load(Ordering::SeqCst), 1);
        assert_ne!(state.load(), State::Idle);
    }
}

//! Single-assignment futures.
//!
//! A [Future] holds at most one value. A producer fills it with
//! [Future::write], and any number of consumers wait for it with
//! [Future::read], [Future::get] or, from async code, by `.await`ing
//! [Future::wait]. Handles are cheap to clone; every clone refers to the same
//! shared slot, which is freed once the last handle is dropped.
//!
//! A future may carry a [Deadline]. Once it has elapsed, the next reader that
//! finds the future still `Idle` moves it to `Failed`, and every later read
//! fails. The deadline and the producer race to leave `Idle`; exactly one of
//! them wins and all readers observe that outcome.
//!
//! # Example
//! ```
//! use settle::Future;
//! use std::thread;
//!
//! let future = Future::new();
//! let producer = future.clone();
//!
//! thread::spawn(move || {
//!     assert!(producer.write(String::from("done")));
//!     // A second write is rejected and its value dropped.
//!     assert!(!producer.write(String::from("again")));
//! });
//!
//! assert_eq!(future.read(), (String::from("done"), true));
//! ```
//!
//! Reading an expired future:
//! ```
//! use settle::{Error, Future};
//! use std::time::Duration;
//!
//! let future = Future::<u32>::with_timeout(Duration::from_millis(10));
//!
//! assert_eq!(future.get(), Err(Error::Expired));
//! assert_eq!(future.read(), (0, false));
//! // The expiry is terminal; a late write is rejected.
//! assert!(!future.write(1));
//! ```
use std::{
    cell::UnsafeCell,
    fmt,
    future::IntoFuture,
    mem::MaybeUninit,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    thread,
    time::Duration,
};

use log::debug;

use super::{
    deadline::Deadline,
    state::{AtomicState, State},
};
use crate::{Error, Rejected};

struct Inner<T> {
    state: AtomicState,
    value: UnsafeCell<MaybeUninit<T>>,
    deadline: Option<Deadline>,
}

// The value is only written by the single producer that won `Idle ->
// Committing`, and only read through shared references after `Ready` has been
// acquired.
unsafe impl<T: Send + Sync> Sync for Inner<T> {}

impl<T> Inner<T> {
    fn new(deadline: Option<Deadline>) -> Self {
        Self {
            state: AtomicState::new(),
            value: UnsafeCell::new(MaybeUninit::uninit()),
            deadline,
        }
    }

    fn commit(&self, value: T) -> Result<(), Rejected<T>> {
        if let Err(state) = self.state.transition(State::Idle, State::Committing) {
            debug!("write rejected, future is {:?}", state);
            return Err(Rejected { value, state });
        }

        // SAFETY: winning `Idle -> Committing` gives this thread exclusive
        // access to the slot. No reader touches it until `Ready` is published
        // below.
        unsafe { (*self.value.get()).write(value) };

        self.state.publish();

        Ok(())
    }

    /// One step of the read loop: check the deadline, then the state.
    fn poll_outcome(&self) -> Poll<Result<&T, Error>> {
        let state = match self.deadline {
            Some(deadline) if deadline.has_elapsed() => {
                match self.state.transition(State::Idle, State::Failed) {
                    Ok(state) => {
                        debug!("deadline elapsed with no value, future expired");
                        state
                    }
                    Err(state) => state,
                }
            }
            _ => self.state.load(),
        };

        match state {
            // SAFETY: `Ready` was acquired, so the producer's write to the slot
            // happened-before this read, and the slot is never written again.
            State::Ready => Poll::Ready(Ok(unsafe { (*self.value.get()).assume_init_ref() })),
            State::Failed => Poll::Ready(Err(Error::Expired)),
            State::Idle | State::Committing => Poll::Pending,
        }
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        if self.state.load() == State::Ready {
            // SAFETY: `Ready` means the slot was initialised, and with `&mut
            // self` no other handle can observe it any more.
            unsafe { self.value.get_mut().assume_init_drop() };
        }
    }
}

/// A single-assignment value shared between one producer and many consumers.
///
/// See the [module-level documentation](self) for more information.
pub struct Future<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Future<T> {
    /// Create an empty future with no deadline.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner::new(None)),
        }
    }

    /// Create an empty future that expires `timeout` from now.
    ///
    /// The deadline is only enforced by readers. A timeout too large to
    /// represent is treated as no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Deadline::after(timeout))
    }

    pub(crate) fn with_deadline(deadline: Option<Deadline>) -> Self {
        Self {
            inner: Arc::new(Inner::new(deadline)),
        }
    }

    /// Attempt to deliver `value`.
    ///
    /// Returns `true` for the one write that moves the future out of `Idle`.
    /// Any later write, or a write after the deadline has been observed,
    /// returns `false` and `value` is dropped: a `false` return means the
    /// value was not delivered to anyone. Use [Future::try_write] to get the
    /// value back instead.
    pub fn write(&self, value: T) -> bool {
        self.try_write(value).is_ok()
    }

    /// Attempt to deliver `value`, handing it back if the future was already
    /// set or has expired.
    pub fn try_write(&self, value: T) -> Result<(), Rejected<T>> {
        self.inner.commit(value)
    }

    /// Current lifecycle state. Does not evaluate the deadline.
    pub fn state(&self) -> State {
        self.inner.state.load()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == State::Ready
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn deadline(&self) -> Option<Deadline> {
        self.inner.deadline
    }

    /// Return a future that resolves once this one is `Ready` or has expired.
    ///
    /// The returned future never blocks the executor; while the value is
    /// outstanding it re-schedules itself on every poll.
    pub fn wait(&self) -> Wait<T> {
        Wait {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone> Future<T> {
    /// Block until the future is `Ready` or its deadline has elapsed.
    ///
    /// Between checks the calling thread yields to the scheduler, so an
    /// expired future is noticed within roughly one scheduling quantum of its
    /// deadline. Without a deadline this blocks until a producer writes; if
    /// none ever does, it never returns.
    pub fn get(&self) -> Result<T, Error> {
        loop {
            if let Poll::Ready(outcome) = self.inner.poll_outcome() {
                return outcome.cloned();
            }

            thread::yield_now();
        }
    }

    /// A single non-blocking check. `None` means the value is still
    /// outstanding.
    pub fn try_get(&self) -> Option<Result<T, Error>> {
        match self.inner.poll_outcome() {
            Poll::Ready(outcome) => Some(outcome.cloned()),
            Poll::Pending => None,
        }
    }
}

impl<T: Clone + Default> Future<T> {
    /// Block like [Future::get], returning `(value, true)` on success and
    /// `(T::default(), false)` once the future has expired.
    pub fn read(&self) -> (T, bool) {
        match self.get() {
            Ok(value) => (value, true),
            Err(_) => (T::default(), false),
        }
    }
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for Future<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("state", &self.state())
            .field("deadline", &self.inner.deadline)
            .finish()
    }
}

impl<T: Clone> IntoFuture for Future<T> {
    type Output = Result<T, Error>;
    type IntoFuture = Wait<T>;

    fn into_future(self) -> Self::IntoFuture {
        Wait { inner: self.inner }
    }
}

/// Future returned by [Future::wait].
pub struct Wait<T> {
    inner: Arc<Inner<T>>,
}

impl<T: Clone> std::future::Future for Wait<T> {
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.inner.poll_outcome() {
            Poll::Ready(outcome) => Poll::Ready(outcome.cloned()),
            Poll::Pending => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }
}

impl<T> fmt::Debug for Wait<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wait")
            .field("state", &self.inner.state.load())
            .finish()
    }
}

//! # `settle`: single-assignment futures with deadlines
//!
//! A [Future] lets one thread produce a value while any number of other
//! threads wait for it. It is written at most once; every reader observes the
//! same outcome. A future can carry a deadline, after which readers stop
//! waiting and the future becomes permanently failed, even if the producer
//! later finishes.
//!
//! Synchronisation is lock-free: a single atomic state is advanced with
//! compare-and-swap, and the value is published with release/acquire
//! ordering. Blocking readers spin and yield to the scheduler between checks;
//! async readers can `.await` the future on any executor.
//!
//! For running a closure on its own thread and getting its result back as a
//! future, see the [task] module. The state machine and deadline types live in
//! [futures].
//!
//! ## Example
//!
//! ```
//! use settle::task;
//! use std::{thread, time::Duration};
//!
//! let fast = task::spawn_with_timeout(Duration::from_secs(5), || "fast");
//! let slow = task::spawn_with_timeout(Duration::from_millis(10), || {
//!     thread::sleep(Duration::from_millis(500));
//!     "slow"
//! });
//!
//! assert_eq!(fast.read(), ("fast", true));
//! assert_eq!(slow.read(), ("", false));
//! ```
mod error;
pub mod futures;
pub mod task;

pub use error::{Error, Rejected};
pub use futures::{
    deadline::Deadline,
    future::{Future, Wait},
    state::State,
};
pub use task::{spawn, spawn_with_timeout};

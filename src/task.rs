//! Spawning work into futures.
//!
//! This module turns any closure returning a value into a [Future]. The
//! closure runs on its own OS thread and its return value is written into a
//! fresh future, which is handed back to the caller straight away.
//!
//! # Example
//!
//! ```
//! use settle::task;
//! let f = task::spawn(|| 2 + 8);
//! assert_eq!(f.read(), (10, true));
//! ```
//!
//! # Timeouts
//!
//! A timeout only bounds how long readers wait. The spawned closure is *not*
//! interrupted when the deadline elapses; it runs to completion and then tries
//! to write its result, which is dropped if a reader has already observed the
//! expiry.
//!
//! ```
//! use settle::task;
//! use std::{thread, time::Duration};
//!
//! let f = task::spawn_with_timeout(Duration::from_millis(10), || {
//!     thread::sleep(Duration::from_millis(200));
//!     1
//! });
//!
//! assert_eq!(f.read(), (0, false));
//! ```
//!
//! Use a [Builder] to name the producer thread or to pick its stack size:
//!
//! ```
//! use settle::task::Builder;
//! use std::time::Duration;
//!
//! let f = Builder::new()
//!     .name("answer".into())
//!     .timeout(Duration::from_secs(5))
//!     .spawn(|| 42)
//!     .unwrap();
//!
//! assert_eq!(f.get(), Ok(42));
//! ```
use std::{io, thread, time::Duration};

use log::{trace, warn};

use crate::{futures::deadline::Deadline, Future};

/// Run `task` on a new thread and return a future for its result.
///
/// # Panics
///
/// Panics if the OS fails to create a thread; use [Builder::spawn] to handle
/// that case.
pub fn spawn<F, T>(task: F) -> Future<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + Sync + 'static,
{
    launch(Future::new(), task)
}

/// Like [spawn], but the returned future expires `timeout` from now.
///
/// The task keeps running past the deadline; only readers give up.
pub fn spawn_with_timeout<F, T>(timeout: Duration, task: F) -> Future<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + Sync + 'static,
{
    launch(Future::with_timeout(timeout), task)
}

fn launch<F, T>(future: Future<T>, task: F) -> Future<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + Sync + 'static,
{
    let producer = future.clone();

    thread::spawn(move || deliver(&producer, task()));

    future
}

fn deliver<T>(producer: &Future<T>, value: T) {
    match producer.try_write(value) {
        Ok(()) => trace!("{}: result delivered", thread_name()),
        Err(rejected) => warn!(
            "{}: finished after its future became {:?}, result dropped",
            thread_name(),
            rejected.state
        ),
    }
}

fn thread_name() -> String {
    thread::current()
        .name()
        .unwrap_or("<unnamed task>")
        .to_owned()
}

/// Task configuration.
///
/// Mirrors [std::thread::Builder], with an optional timeout for the returned
/// future.
#[derive(Debug, Default)]
pub struct Builder {
    name: Option<String>,
    stack_size: Option<usize>,
    timeout: Option<Duration>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the producer thread. The name shows up in panic messages and in
    /// the log line emitted when a late result is dropped.
    pub fn name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Expire the returned future `timeout` after [Builder::spawn] is called.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Spawn `task` with this configuration.
    ///
    /// Unlike [spawn], failing to create the thread is reported as an error.
    /// The deadline is computed before the thread is started.
    pub fn spawn<F, T>(self, task: F) -> io::Result<Future<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + Sync + 'static,
    {
        let future = Future::with_deadline(self.timeout.and_then(Deadline::after));
        let producer = future.clone();

        let mut builder = thread::Builder::new();

        if let Some(name) = self.name {
            builder = builder.name(name);
        }

        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }

        builder.spawn(move || deliver(&producer, task()))?;

        Ok(future)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            mpsc, Arc,
        },
        thread,
        time::{Duration, Instant},
    };

    use anyhow::Result;

    use super::{spawn, spawn_with_timeout, Builder};
    use crate::{Error, State};

    #[test]
    fn spawn_simple() {
        let f = spawn(|| 1);
        assert_eq!(f.read(), (1, true));
    }

    #[test]
    fn spawn_returns_immediately() {
        let before = Instant::now();
        let f = spawn(|| {
            thread::sleep(Duration::from_millis(500));
            String::from("slow")
        });

        assert!(Instant::now() - before < Duration::from_millis(250));
        assert_eq!(f.get(), Ok(String::from("slow")));
        assert!(Instant::now() - before > Duration::from_millis(450));
    }

    #[test]
    fn spawn_with_timeout_in_time() {
        let f = spawn_with_timeout(Duration::from_millis(10), || 1);

        assert_eq!(f.read(), (1, true));

        // Long after the deadline, the delivered value is still there.
        thread::sleep(Duration::from_secs(1));
        assert_eq!(f.read(), (1, true));
        assert_eq!(f.state(), State::Ready);
    }

    #[test]
    fn spawn_with_timeout_expired() {
        let before = Instant::now();
        let f = spawn_with_timeout(Duration::from_millis(10), || {
            thread::sleep(Duration::from_secs(1));
            1
        });

        assert_eq!(f.read(), (0, false));
        assert!(Instant::now() - before < Duration::from_millis(500));

        // Well after the late write has been attempted.
        thread::sleep(Duration::from_millis(1100));
        assert_eq!(f.read(), (0, false));
        assert_eq!(f.state(), State::Failed);
    }

    #[test]
    fn task_runs_to_completion_after_expiry() {
        let (tx, rx) = mpsc::channel();
        let f = spawn_with_timeout(Duration::from_millis(10), move || {
            thread::sleep(Duration::from_millis(200));
            tx.send(()).unwrap();
            7u8
        });

        assert_eq!(f.get(), Err(Error::Expired));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(()));
    }

    #[test]
    fn builder_names_thread() -> Result<()> {
        let f = Builder::new()
            .name("producer".into())
            .spawn(|| thread::current().name().map(str::to_owned))?;

        assert_eq!(f.get(), Ok(Some(String::from("producer"))));

        Ok(())
    }

    #[test]
    fn builder_without_timeout_has_no_deadline() -> Result<()> {
        let f = Builder::new().stack_size(64 * 1024).spawn(|| 3)?;

        assert!(f.deadline().is_none());
        assert_eq!(f.read(), (3, true));

        Ok(())
    }

    #[test]
    fn builder_timeout_expires() -> Result<()> {
        let released = Arc::new(AtomicBool::new(false));
        let flag = released.clone();

        let f = Builder::new()
            .timeout(Duration::from_millis(20))
            .spawn(move || {
                while !flag.load(Ordering::SeqCst) {
                    thread::yield_now();
                }
                5
            })?;

        assert!(f.deadline().is_some());
        assert_eq!(f.read(), (0, false));

        released.store(true, Ordering::SeqCst);
        assert_eq!(f.read(), (0, false));

        Ok(())
    }
}

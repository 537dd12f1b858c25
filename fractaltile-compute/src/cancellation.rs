use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Trait for checking if a render should be cancelled.
///
/// Checked from rayon workers, hence `Send + Sync`.
pub trait CancellationChecker: Clone + Send + Sync {
    /// Returns true if computation should be cancelled
    fn is_cancelled(&self) -> bool;
}

/// Never cancels - for callers without a cancel signal
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancel;

impl CancellationChecker for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Checks an atomic boolean flag for cancellation
#[derive(Clone, Debug)]
pub struct AtomicBoolChecker {
    flag: Arc<AtomicBool>,
}

impl AtomicBoolChecker {
    pub fn new(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    /// Checker with a fresh flag, plus the handle that trips it.
    pub fn pair() -> (Self, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (Self::new(Arc::clone(&flag)), flag)
    }
}

impl CancellationChecker for AtomicBoolChecker {
    fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Cancels once a point in time has passed
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    pub fn after(timeout: Duration) -> Self {
        Self::at(Instant::now() + timeout)
    }
}

impl CancellationChecker for Deadline {
    fn is_cancelled(&self) -> bool {
        Instant::now() >= self.at
    }
}

/// Cancels when the inner checker does or when the deadline passes
#[derive(Clone, Debug)]
pub struct WithDeadline<C> {
    inner: C,
    deadline: Option<Deadline>,
}

impl<C: CancellationChecker> WithDeadline<C> {
    /// `None` leaves the inner checker unchanged.
    pub fn new(inner: C, timeout: Option<Duration>) -> Self {
        Self {
            inner,
            deadline: timeout.map(Deadline::after),
        }
    }
}

impl<C: CancellationChecker> CancellationChecker for WithDeadline<C> {
    fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled() || self.deadline.is_some_and(|d| d.is_cancelled())
    }
}

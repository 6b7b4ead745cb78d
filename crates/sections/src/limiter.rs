use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Semaphore, SemaphorePermit};

/// Point-in-time view of a [`Limiter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterSnapshot {
    /// Configured bound (`None` = unbounded)
    pub limit: Option<usize>,
    pub in_flight: usize,
    pub waiters: usize,
    /// Highest `in_flight` observed since the limiter was created
    pub peak_in_flight: usize,
}

/// Counting admission gate for provider calls.
///
/// Waiters are admitted in FIFO order (tokio's semaphore is fair). An unbounded limiter never
/// suspends. Each limiter belongs to one engine invocation; nothing here is process-global.
#[derive(Debug)]
pub struct Limiter {
    semaphore: Option<Semaphore>,
    limit: Option<usize>,
    in_flight: AtomicUsize,
    waiters: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl Limiter {
    /// Create a limiter admitting at most `limit` holders at once (`None` = unbounded).
    ///
    /// A limit of zero would never admit anyone; callers validate it away beforehand and it is
    /// treated as one here.
    #[must_use]
    pub fn new(limit: Option<usize>) -> Self {
        let limit = limit.filter(|&l| l < Semaphore::MAX_PERMITS).map(|l| l.max(1));
        Self {
            semaphore: limit.map(Semaphore::new),
            limit,
            in_flight: AtomicUsize::new(0),
            waiters: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Wait for a free slot and reserve it. The slot is released when the permit is dropped,
    /// admitting the longest-waiting caller.
    pub async fn acquire(&self) -> LimiterPermit<'_> {
        let permit = match &self.semaphore {
            Some(semaphore) => {
                let waiter = WaiterGuard::new(&self.waiters);
                // The semaphore is never closed; acquire failures are not expected.
                let permit = semaphore
                    .acquire()
                    .await
                    .unwrap_or_else(|_| unreachable!("limiter semaphore closed"));
                drop(waiter);
                Some(permit)
            }
            None => None,
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        LimiterPermit {
            _permit: permit,
            in_flight: &self.in_flight,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> LimiterSnapshot {
        LimiterSnapshot {
            limit: self.limit,
            in_flight: self.in_flight.load(Ordering::SeqCst),
            waiters: self.waiters.load(Ordering::SeqCst),
            peak_in_flight: self.peak_in_flight.load(Ordering::SeqCst),
        }
    }
}

/// A reserved slot in a [`Limiter`]; dropping it releases the slot
#[derive(Debug)]
pub struct LimiterPermit<'a> {
    _permit: Option<SemaphorePermit<'a>>,
    in_flight: &'a AtomicUsize,
}

impl Drop for LimiterPermit<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

struct WaiterGuard<'a>(&'a AtomicUsize);

impl<'a> WaiterGuard<'a> {
    fn new(waiters: &'a AtomicUsize) -> Self {
        waiters.fetch_add(1, Ordering::SeqCst);
        Self(waiters)
    }
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{CounterExhausted, Identity};

/// A lock-free, run-scoped counter that hands out sequential [`Identity`]
/// values.
///
/// The counter starts at zero and every successful call to [`Self::next`]
/// advances it by exactly one, so after `N` successful calls from any number
/// of threads the issued identities are exactly `1..=N`. The internal state is
/// private; [`Self::next`] is the only way to mutate it.
///
/// ## Features
/// - ✅ Thread-safe, no external locking required
/// - ✅ Optional upper bound via [`Self::with_max`]
///
/// ## Caveats
/// There is no global instance. Construct one per run and share it (usually
/// behind an `Arc`) with the [`WorkerDispatcher`].
///
/// [`WorkerDispatcher`]: crate::WorkerDispatcher
#[derive(Debug)]
pub struct IdentityCounter {
    #[cfg(feature = "cache-padded")]
    value: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    value: AtomicU64,
    max: Option<u64>,
}

impl IdentityCounter {
    /// Creates an uncapped counter starting at zero.
    ///
    /// # Example
    /// ```
    /// use herald::IdentityCounter;
    ///
    /// let counter = IdentityCounter::new();
    /// assert_eq!(counter.next().unwrap().get(), 1);
    /// assert_eq!(counter.next().unwrap().get(), 2);
    /// assert_eq!(counter.current(), 2);
    /// ```
    pub const fn new() -> Self {
        Self::from_parts(None)
    }

    /// Creates a counter that issues at most `max` identities.
    ///
    /// Once `max` identities have been issued, [`Self::next`] fails with
    /// [`CounterExhausted`] and leaves the value untouched.
    ///
    /// # Example
    /// ```
    /// use herald::IdentityCounter;
    ///
    /// let counter = IdentityCounter::with_max(1);
    /// assert!(counter.next().is_ok());
    /// assert!(counter.next().is_err());
    /// assert_eq!(counter.current(), 1);
    /// ```
    pub const fn with_max(max: u64) -> Self {
        Self::from_parts(Some(max))
    }

    const fn from_parts(max: Option<u64>) -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            value: crossbeam_utils::CachePadded::new(AtomicU64::new(0)),
            #[cfg(not(feature = "cache-padded"))]
            value: AtomicU64::new(0),
            max,
        }
    }

    /// Issues the next identity.
    ///
    /// Linearizable: concurrent callers each observe a distinct value and the
    /// sorted set of returned values has no gaps.
    ///
    /// # Errors
    /// Returns [`CounterExhausted`] when a maximum is configured and has been
    /// reached. An uncapped counter never fails.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next(&self) -> Result<Identity, CounterExhausted> {
        let Some(max) = self.max else {
            let previous = self.value.fetch_add(1, Ordering::AcqRel);
            return Ok(Identity::new(previous + 1));
        };

        // Never advance past `max`, so a refused call leaves no trace.
        self.value
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < max).then_some(current + 1)
            })
            .map(|previous| Identity::new(previous + 1))
            .map_err(|_| CounterExhausted { max })
    }

    /// Returns the number of identities issued so far.
    ///
    /// With no calls to [`Self::next`] in flight, repeated reads return the
    /// same value.
    pub fn current(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Returns the configured maximum, if any.
    pub const fn max(&self) -> Option<u64> {
        self.max
    }
}

impl Default for IdentityCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Barrier, Mutex};
    use std::thread::scope;

    #[test]
    fn starts_at_zero_and_issues_from_one() {
        let counter = IdentityCounter::new();
        assert_eq!(counter.current(), 0);
        assert_eq!(counter.max(), None);

        let ids: Vec<u64> = (0..5).map(|_| counter.next().unwrap().get()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(counter.current(), 5);
    }

    #[test]
    fn repeated_reads_are_stable() {
        let counter = IdentityCounter::new();
        for _ in 0..3 {
            counter.next().unwrap();
        }
        assert_eq!(counter.current(), 3);
        assert_eq!(counter.current(), 3);
    }

    #[test]
    fn capped_counter_refuses_without_advancing() {
        let counter = IdentityCounter::with_max(2);
        assert_eq!(counter.next().unwrap().get(), 1);
        assert_eq!(counter.next().unwrap().get(), 2);
        assert_eq!(counter.next(), Err(CounterExhausted { max: 2 }));
        assert_eq!(counter.next(), Err(CounterExhausted { max: 2 }));
        assert_eq!(counter.current(), 2);
    }

    #[test]
    fn zero_cap_issues_nothing() {
        let counter = IdentityCounter::with_max(0);
        assert!(counter.next().is_err());
        assert_eq!(counter.current(), 0);
    }

    fn run_concurrent_uniqueness(counter: IdentityCounter, threads: usize, per_thread: usize) {
        let counter = Arc::new(counter);
        let barrier = Arc::new(Barrier::new(threads));
        let seen = Arc::new(Mutex::new(HashSet::with_capacity(threads * per_thread)));

        scope(|s| {
            for _ in 0..threads {
                let counter = Arc::clone(&counter);
                let barrier = Arc::clone(&barrier);
                let seen = Arc::clone(&seen);
                s.spawn(move || {
                    barrier.wait();
                    let mut local = Vec::with_capacity(per_thread);
                    for _ in 0..per_thread {
                        if let Ok(id) = counter.next() {
                            local.push(id.get());
                        }
                    }
                    let mut seen = seen.lock().unwrap();
                    for id in local {
                        assert!(seen.insert(id), "duplicate identity {id}");
                    }
                });
            }
        });

        let issued = counter.current();
        let mut ids: Vec<u64> = seen.lock().unwrap().iter().copied().collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=issued).collect::<Vec<_>>());
    }

    #[test]
    fn concurrent_callers_get_gapless_unique_identities() {
        let threads = num_cpus::get().max(4);
        for _ in 0..20 {
            run_concurrent_uniqueness(IdentityCounter::new(), threads, 1_000);
        }
    }

    #[test]
    fn concurrent_callers_respect_the_cap() {
        let threads = num_cpus::get().max(4);
        for _ in 0..20 {
            let counter = IdentityCounter::with_max(1_500);
            run_concurrent_uniqueness(counter, threads, 1_000);
        }

        let counter = Arc::new(IdentityCounter::with_max(1_500));
        scope(|s| {
            for _ in 0..threads {
                let counter = Arc::clone(&counter);
                s.spawn(move || {
                    for _ in 0..1_000 {
                        let _ = counter.next();
                    }
                });
            }
        });
        assert_eq!(counter.current(), 1_500);
    }
}

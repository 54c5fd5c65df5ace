use core::time::Duration;

/// Delay each task waits before greeting, matching the one-second pause of
/// the original roster script.
pub const DEFAULT_GREETING_DELAY: Duration = Duration::from_secs(1);

/// Tunables for a [`WorkerDispatcher`](crate::WorkerDispatcher).
///
/// # Example
/// ```
/// use core::time::Duration;
/// use herald::DispatchConfig;
///
/// let config = DispatchConfig::default()
///     .with_greeting_delay(Duration::from_millis(10))
///     .with_max_identities(100);
/// assert_eq!(config.max_identities, Some(100));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchConfig {
    /// How long each task sleeps before emitting its greeting.
    pub greeting_delay: Duration,
    /// Upper bound on identities issued in one run. `None` means unbounded.
    pub max_identities: Option<u64>,
}

impl DispatchConfig {
    pub const fn with_greeting_delay(mut self, delay: Duration) -> Self {
        self.greeting_delay = delay;
        self
    }

    pub const fn with_max_identities(mut self, max: u64) -> Self {
        self.max_identities = Some(max);
        self
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            greeting_delay: DEFAULT_GREETING_DELAY,
            max_identities: None,
        }
    }
}

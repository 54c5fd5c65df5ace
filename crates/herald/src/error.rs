//! Error types surfaced by identity assignment and dispatch.
//!
//! ## Error Cases
//! - [`InvalidEntity`]: an input record failed validation. Recoverable, the
//!   record is skipped and the run continues.
//! - [`CounterExhausted`]: a capped [`IdentityCounter`] has no identities
//!   left. Fatal only for the entity that asked.
//! - [`DispatchFailure`]: tasks cannot be launched at all. Fatal for the whole
//!   run.
//!
//! [`IdentityCounter`]: crate::IdentityCounter

/// A result type whose error defaults to [`DispatchFailure`].
pub type Result<T, E = DispatchFailure> = core::result::Result<T, E>;

/// Why an input record was rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidReason {
    /// No `first_name` was supplied.
    #[error("first_name is required")]
    MissingFirstName,

    /// `first_name` was supplied but is empty or whitespace.
    #[error("first_name must not be empty")]
    EmptyFirstName,

    /// No `age` was supplied.
    #[error("age is required")]
    MissingAge,

    /// `age` was supplied but is not a whole number.
    #[error("age must be a whole number (got {0:?})")]
    MalformedAge(String),

    /// `age` is below zero.
    #[error("age must not be negative (got {0})")]
    NegativeAge(i64),

    /// `age` does not fit the supported range.
    #[error("age {0} is out of range")]
    AgeOutOfRange(i64),
}

/// An input record that failed validation before any identity was issued.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid entity at input index {index}: {reason}")]
pub struct InvalidEntity {
    /// Position of the record in the caller's input.
    pub index: usize,
    /// What was wrong with it.
    pub reason: InvalidReason,
}

/// A capped [`IdentityCounter`](crate::IdentityCounter) refused to issue
/// another identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("identity counter exhausted (max = {max})")]
pub struct CounterExhausted {
    /// The configured maximum that was reached.
    pub max: u64,
}

/// The whole run could not be dispatched.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DispatchFailure {
    /// No tokio runtime is available to launch tasks on.
    #[error("no tokio runtime available to launch tasks")]
    NoRuntime,

    /// The tokio runtime was built without `enable_time`, so no task could
    /// wait out its delay.
    #[error("tokio runtime has no timer; build it with `enable_time`")]
    TimerDisabled,
}

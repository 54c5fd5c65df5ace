use core::fmt;

/// A unique, sequential identity issued to one entity within a run.
///
/// Identities start at `1` and are handed out by an
/// [`IdentityCounter`](crate::IdentityCounter) in the order entities are
/// dispatched. The raw value is only reachable through [`Identity::get`];
/// nothing outside this crate can mint one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Identity(u64);

impl Identity {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw integer value of this identity.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Identity> for u64 {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

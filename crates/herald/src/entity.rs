use crate::{CounterExhausted, Identity, IdentityCounter, InvalidEntity, InvalidReason};

/// An unvalidated input record as supplied by an external caller.
///
/// Both fields are optional so that transport layers (JSON bodies, CLI
/// arguments) can hand over exactly what they received. Validation happens in
/// [`RawEntity::validate`], before any identity is issued.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawEntity {
    pub first_name: Option<String>,
    pub age: Option<RawAge>,
}

/// An age exactly as it arrived: a whole number, or text that may hold one.
///
/// Text is parsed during [`RawEntity::validate`], so a record like
/// `{"age": "41"}` is accepted and `{"age": "forty"}` is rejected for that
/// record alone.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum RawAge {
    Number(i64),
    Text(String),
}

impl RawAge {
    fn years(&self) -> Result<i64, InvalidReason> {
        match self {
            Self::Number(age) => Ok(*age),
            Self::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| InvalidReason::MalformedAge(text.clone())),
        }
    }
}

impl From<i64> for RawAge {
    fn from(age: i64) -> Self {
        Self::Number(age)
    }
}

impl From<String> for RawAge {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RawAge {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl RawEntity {
    /// Builds a raw record with both fields present.
    pub fn new(first_name: impl Into<String>, age: i64) -> Self {
        Self {
            first_name: Some(first_name.into()),
            age: Some(RawAge::Number(age)),
        }
    }

    /// Checks the record and returns its normalized form.
    ///
    /// `index` is the record's position in the caller's input and is carried
    /// into the error for reporting.
    ///
    /// # Errors
    /// Returns [`InvalidEntity`] when the name is missing or blank, or when
    /// the age is missing, not a whole number, negative or larger than
    /// [`u32::MAX`].
    pub fn validate(&self, index: usize) -> Result<ValidEntity, InvalidEntity> {
        let reject = |reason| InvalidEntity { index, reason };

        let first_name = match self.first_name.as_deref() {
            None => return Err(reject(InvalidReason::MissingFirstName)),
            Some(name) if name.trim().is_empty() => {
                return Err(reject(InvalidReason::EmptyFirstName));
            }
            Some(name) => name.trim().to_owned(),
        };

        let age = match &self.age {
            None => return Err(reject(InvalidReason::MissingAge)),
            Some(raw) => raw.years().map_err(reject)?,
        };
        if age < 0 {
            return Err(reject(InvalidReason::NegativeAge(age)));
        }
        let age = u32::try_from(age).map_err(|_| reject(InvalidReason::AgeOutOfRange(age)))?;

        Ok(ValidEntity { first_name, age })
    }
}

impl<S: Into<String>> From<(S, i64)> for RawEntity {
    fn from((first_name, age): (S, i64)) -> Self {
        Self::new(first_name, age)
    }
}

/// A record that passed validation but has not been given an identity yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidEntity {
    first_name: String,
    age: u32,
}

impl ValidEntity {
    /// Requests the next identity from `counter` and binds it to this record.
    ///
    /// # Errors
    /// Propagates [`CounterExhausted`] from a capped counter. No identity is
    /// consumed in that case.
    pub fn with_identity_from(self, counter: &IdentityCounter) -> Result<Entity, CounterExhausted> {
        let identity = counter.next()?;
        Ok(Entity {
            identity,
            first_name: self.first_name,
            age: self.age,
        })
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn age(&self) -> u32 {
        self.age
    }
}

/// One validated record together with the identity it was assigned.
///
/// An `Entity` can only be built from a [`ValidEntity`] once an
/// [`IdentityCounter`] has issued its identity, and no field can change
/// afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    identity: Identity,
    first_name: String,
    age: u32,
}

impl Entity {
    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    /// The line this entity's task emits when its delay elapses.
    ///
    /// # Example
    /// ```
    /// use herald::{IdentityCounter, RawEntity};
    ///
    /// let counter = IdentityCounter::new();
    /// let entity = RawEntity::new("John", 30)
    ///     .validate(0)
    ///     .unwrap()
    ///     .with_identity_from(&counter)
    ///     .unwrap();
    /// assert_eq!(
    ///     entity.greeting(),
    ///     "Hello, my first name is John and I am 30 years old."
    /// );
    /// ```
    pub fn greeting(&self) -> String {
        format!(
            "Hello, my first name is {} and I am {} years old.",
            self.first_name, self.age
        )
    }
}

//! User data model.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error returned when a textual identifier cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid id: {source}")]
pub struct IdParseError {
    #[from]
    source: ParseIntError,
}

/// Storage-assigned user identifier.
///
/// Identifiers are generated by the backing store on insert and never change
/// afterwards, so there is no way to mint one from a caller-side record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i32);

impl UserId {
    /// Wrap a raw identifier as read from storage or user input.
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Access the raw integer value.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl From<i32> for UserId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl FromStr for UserId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse::<i32>()?))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-supplied user fields for inserts and updates.
///
/// The password is stored exactly as given; hashing is out of scope for the
/// repository layer.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Short display name.
    pub name: String,
    /// Contact email address.
    pub email: String,
    /// Opaque password text.
    pub password: String,
}

impl NewUser {
    /// Build a new user payload.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Persisted user record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Storage-assigned identifier.
    pub id: UserId,
    /// Short display name.
    pub name: String,
    /// Contact email address.
    pub email: String,
    /// Opaque password text.
    pub password: String,
    /// Set by storage on insert and rewritten on every update.
    pub registered_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("registered_at", &self.registered_at)
            .finish()
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.id,
            self.name,
            self.email,
            self.registered_at.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// Result of a write operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOutcome {
    /// Number of rows the statement touched.
    pub rows_affected: u64,
    /// Identifier assigned by storage, present only for inserts.
    pub inserted_id: Option<UserId>,
}

impl WriteOutcome {
    /// Outcome for an insert that produced `id`.
    pub const fn inserted(id: UserId) -> Self {
        Self {
            rows_affected: 1,
            inserted_id: Some(id),
        }
    }

    /// Outcome for an update or delete touching `rows_affected` rows.
    pub const fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            inserted_id: None,
        }
    }
}

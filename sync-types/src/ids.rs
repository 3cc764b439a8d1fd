//! Identifier types for matrix-sync.
//!
//! Room and user identifiers are validated newtypes: the homeserver assigns
//! them, but callers also construct them by hand, so parsing enforces the
//! protocol's sigil and domain-component rules up front.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::MatrixError;

/// A stable, server-assigned room identifier (`!opaque:domain`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Parse and validate a room identifier.
    ///
    /// Room ids start with `!` and carry a `:`-separated domain component.
    pub fn parse(s: impl Into<String>) -> Result<Self, MatrixError> {
        let s = s.into();
        if !s.starts_with('!') {
            return Err(MatrixError::Validation("room ids start with !".into()));
        }
        if !s.contains(':') {
            return Err(MatrixError::Validation(
                "room ids must have a domain component, separated by a :".into(),
            ));
        }
        Ok(Self(s))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoomId({})", self.0)
    }
}

impl FromStr for RoomId {
    type Err = MatrixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A federated user identifier (`@localpart:domain`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Parse and validate a user identifier.
    ///
    /// User ids start with `@` and carry a `:`-separated domain component.
    pub fn parse(s: impl Into<String>) -> Result<Self, MatrixError> {
        let s = s.into();
        if !s.starts_with('@') {
            return Err(MatrixError::Validation("user ids start with @".into()));
        }
        if !s.contains(':') {
            return Err(MatrixError::Validation(
                "user ids must have a domain component, separated by a :".into(),
            ));
        }
        Ok(Self(s))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl FromStr for UserId {
    type Err = MatrixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;

/// Opaque identifier issued by the external identity provider.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdentityId(String);

impl IdentityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for IdentityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for IdentityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The authenticated principal as announced by the identity stream.
///
/// Identities are owned by the external provider; the resolver treats them as immutable and only
/// ever compares their ids. Sign-in creates one, sign-out is announced as the absence of one.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identity {
    pub id: IdentityId,
    pub email: String,
}

impl Identity {
    pub fn new(id: impl Into<IdentityId>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }
}

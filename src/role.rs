// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

/// Access-level attribute attached to an identity by the role store.
///
/// `Viewer` is the default role: it is the lowest privilege level and the fallback whenever a
/// role cannot be resolved (new user, degraded store, timeout).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Role {
    /// Permission to create and change documents.
    Editor,

    /// Read-only access.
    #[default]
    Viewer,
}

impl Role {
    /// Role grants write access.
    pub fn is_editor(&self) -> bool {
        matches!(self, Role::Editor)
    }

    /// Role grants read-only access.
    pub fn is_viewer(&self) -> bool {
        matches!(self, Role::Viewer)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        };

        write!(f, "{}", s)
    }
}

/// Error returned when parsing an unknown role string.
#[derive(Debug, Error, Eq, PartialEq)]
#[error("unknown role \"{0}\"")]
pub struct UnknownRole(String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "editor" => Ok(Role::Editor),
            "viewer" => Ok(Role::Viewer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_role_is_viewer() {
        assert_eq!(Role::default(), Role::Viewer);
        assert!(Role::default().is_viewer());
    }

    #[test]
    fn parse_wire_form() {
        assert_eq!("editor".parse(), Ok(Role::Editor));
        assert_eq!("viewer".parse(), Ok(Role::Viewer));
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for role in [Role::Editor, Role::Viewer] {
            assert_eq!(role.to_string().parse(), Ok(role));
        }
    }
}

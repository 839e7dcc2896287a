use std::str::FromStr;

use serde::{Deserialize, Serialize};
use warden_core::AppError;

/// Roles owned by the engine itself.
///
/// System roles are protected from rename, permission changes through the
/// update path, and deletion; bootstrap re-ensures them on every start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemRole {
    /// Holds every permission that exists at bootstrap time.
    Admin,
    /// Holds only the read permissions of the catalog.
    User,
}

impl SystemRole {
    /// Returns a stable storage value for this role name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    /// Returns the role description persisted at bootstrap.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Admin => "Full access to every resource",
            Self::User => "Read-only access to every resource",
        }
    }

    /// Returns both system roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[SystemRole] = &[SystemRole::Admin, SystemRole::User];

        ALL
    }
}

impl FromStr for SystemRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(AppError::Validation(format!(
                "unknown system role '{value}'"
            ))),
        }
    }
}

use serde::{Deserialize, Serialize};

/// Base role string that short-circuits every permission check.
pub const SUPERUSER_ROLE: &str = "admin";

/// Sentinel subject recorded for unauthenticated audit events.
pub const ANONYMOUS_SUBJECT: &str = "anonymous";

/// Sentinel subject recorded for engine-initiated audit events.
pub const SYSTEM_SUBJECT: &str = "system";

/// Coarse role string established by the authentication provider.
///
/// This is independent of role assignments: the provider hands every
/// authenticated actor exactly one base role, and only the
/// [`SUPERUSER_ROLE`] value carries special meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseRole(String);

impl BaseRole {
    /// Creates a base role from the provider's role string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the underlying role string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether this role is the superuser sentinel.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0 == SUPERUSER_ROLE
    }
}

/// Identity of the actor performing a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    subject: String,
    base_role: BaseRole,
}

impl Actor {
    /// Creates an actor from authentication data.
    #[must_use]
    pub fn new(subject: impl Into<String>, base_role: BaseRole) -> Self {
        Self {
            subject: subject.into(),
            base_role,
        }
    }

    /// Returns the stable subject claim from the identity provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the provider-established base role.
    #[must_use]
    pub fn base_role(&self) -> &BaseRole {
        &self.base_role
    }
}

#[cfg(test)]
mod tests {
    use super::BaseRole;

    #[test]
    fn admin_sentinel_is_exact_match() {
        assert!(BaseRole::new("admin").is_admin());
        assert!(!BaseRole::new("Admin").is_admin());
        assert!(!BaseRole::new("administrator").is_admin());
        assert!(!BaseRole::new("user").is_admin());
    }
}

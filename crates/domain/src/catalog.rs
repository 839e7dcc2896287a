/// Action verb shared by every read-only permission in the catalog.
pub const READ_ACTION: &str = "read";

/// One row of the fixed permission catalog ensured at bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultPermission {
    /// Unique short label.
    pub name: &'static str,
    /// Resource namespace the permission protects.
    pub resource: &'static str,
    /// Verb the permission grants on the resource.
    pub action: &'static str,
    /// Human-readable description.
    pub description: &'static str,
}

const fn permission(
    name: &'static str,
    resource: &'static str,
    action: &'static str,
    description: &'static str,
) -> DefaultPermission {
    DefaultPermission {
        name,
        resource,
        action,
        description,
    }
}

/// Returns the fixed permission catalog.
///
/// Bootstrap upserts every row by its `(resource, action)` pair, so the
/// catalog can gain rows between releases without duplicating existing
/// ones. Category-level grants are explicit rows (`system:manage`), not
/// wildcard patterns.
#[must_use]
pub fn default_permissions() -> &'static [DefaultPermission] {
    const CATALOG: &[DefaultPermission] = &[
        permission("content_read", "content", "read", "View published and draft content"),
        permission("content_create", "content", "create", "Create draft content"),
        permission("content_update", "content", "update", "Edit existing content"),
        permission("content_delete", "content", "delete", "Delete content"),
        permission("content_publish", "content", "publish", "Publish or unpublish content"),
        permission("media_read", "media", "read", "Browse the media library"),
        permission("media_upload", "media", "upload", "Upload media files"),
        permission("media_update", "media", "update", "Edit media metadata"),
        permission("media_delete", "media", "delete", "Delete media files"),
        permission("user_read", "user", "read", "View user profiles"),
        permission("user_create", "user", "create", "Create user accounts"),
        permission("user_update", "user", "update", "Edit user accounts"),
        permission("user_delete", "user", "delete", "Delete user accounts"),
        permission("role_read", "role", "read", "View roles and the permission catalog"),
        permission("role_create", "role", "create", "Create custom roles"),
        permission("role_update", "role", "update", "Edit custom roles"),
        permission("role_delete", "role", "delete", "Delete custom roles"),
        permission("role_assign", "role", "assign", "Assign and remove user roles"),
        permission("audit_read", "audit", "read", "Query the audit log"),
        permission("audit_export", "audit", "export", "Export the audit log"),
        permission("system_read", "system", "read", "View system settings"),
        permission("system_manage", "system", "manage", "Change system settings"),
    ];

    CATALOG
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{READ_ACTION, default_permissions};

    #[test]
    fn catalog_keys_and_names_are_unique() {
        let catalog = default_permissions();
        let keys: HashSet<_> = catalog
            .iter()
            .map(|entry| (entry.resource, entry.action))
            .collect();
        let names: HashSet<_> = catalog.iter().map(|entry| entry.name).collect();

        assert_eq!(keys.len(), catalog.len());
        assert_eq!(names.len(), catalog.len());
    }

    #[test]
    fn every_resource_has_a_read_permission() {
        let catalog = default_permissions();
        let resources: HashSet<_> = catalog.iter().map(|entry| entry.resource).collect();
        let readable: HashSet<_> = catalog
            .iter()
            .filter(|entry| entry.action == READ_ACTION)
            .map(|entry| entry.resource)
            .collect();

        assert_eq!(resources, readable);
    }
}

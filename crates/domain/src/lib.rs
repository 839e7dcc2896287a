//! Domain vocabulary and invariants for the Warden access-control engine.

#![forbid(unsafe_code)]

mod audit;
mod catalog;
mod role;

pub use audit::{
    RbacAction, admin_access_action, content_action, media_action, permission_check_action,
};
pub use catalog::{DefaultPermission, READ_ACTION, default_permissions};
pub use role::SystemRole;

//! `jumuiya-auth`: role-based access control for the marketplace.
//!
//! Pure and decoupled from HTTP and storage: the resolver and the ownership
//! authorizer return booleans and never fail; only configuration and table
//! construction can error.

pub mod authorize;
pub mod config;
pub mod error;
pub mod guide;
pub mod ownership;
pub mod permissions;
pub mod resolver;
pub mod roles;
pub mod tables;
pub mod user;

pub use authorize::{AuthorizationExplanation, RbacRegistry, explain_permission};
pub use config::{PolicyConfig, UnknownResourcePolicy};
pub use error::PolicyError;
pub use ownership::{Authorizer, OwnedResource, ResourceKind, ResourceOwner, can_manage_resource};
pub use permissions::Permission;
pub use resolver::{
    get_role_permissions, has_all_permissions, has_any_permission, has_effective_permission,
    has_permission, is_valid_permission,
};
pub use roles::{KnownRole, Role};
pub use tables::{PermissionTable, TableDefinition};
pub use user::{AuthUser, GuideStatus, effective_user, get_effective_role};

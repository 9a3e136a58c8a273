//! Ownership-based authorization.
//!
//! A resource's creator gets a narrower set of permissions than a blanket
//! role grant; staff roles bypass ownership entirely. This is the only path
//! by which a `user`/`guide` may act on a resource they lack the blanket
//! permission for.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use jumuiya_core::{DomainError, UserId};

use crate::config::{PolicyConfig, UnknownResourcePolicy};
use crate::permissions::names;
use crate::roles::KnownRole;
use crate::tables::PermissionTable;
use crate::user::AuthUser;

/// Owner metadata supplied by the data layer.
pub trait OwnedResource {
    fn created_by(&self) -> Option<UserId>;
}

impl<T: OwnedResource + ?Sized> OwnedResource for &T {
    fn created_by(&self) -> Option<UserId> {
        (**self).created_by()
    }
}

/// Minimal owner record for resources that are not modeled in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOwner {
    pub created_by: Option<UserId>,
}

impl ResourceOwner {
    pub fn new(created_by: UserId) -> Self {
        Self {
            created_by: Some(created_by),
        }
    }
}

impl OwnedResource for ResourceOwner {
    fn created_by(&self) -> Option<UserId> {
        self.created_by
    }
}

/// Resource kinds with a dedicated owner permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Destination,
    Booking,
    Tour,
}

const OWNER_PERMISSIONS: &[(ResourceKind, &str)] = &[
    (ResourceKind::Destination, names::EDIT_OWN_DESTINATIONS),
    (ResourceKind::Booking, names::MANAGE_OWN_BOOKINGS),
    (ResourceKind::Tour, names::EDIT_OWN_TOURS),
];

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Destination => "destination",
            ResourceKind::Booking => "booking",
            ResourceKind::Tour => "tour",
        }
    }

    /// Case-insensitive; `None` for kinds this table does not cover.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "destination" => Some(ResourceKind::Destination),
            "booking" => Some(ResourceKind::Booking),
            "tour" => Some(ResourceKind::Tour),
            _ => None,
        }
    }

    /// Permission an owner needs to manage a resource of this kind.
    pub fn owner_permission(self) -> &'static str {
        OWNER_PERMISSIONS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, perm)| *perm)
            .unwrap_or(names::WILDCARD)
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `user` may manage `resource`, with the built-in table and the
/// default (legacy) policy.
///
/// Owners of a resource whose kind is unrecognized (`None`) pass
/// unconditionally under the default policy.
pub fn can_manage_resource<R>(
    user: Option<&AuthUser>,
    resource: Option<&R>,
    kind: Option<ResourceKind>,
) -> bool
where
    R: OwnedResource + ?Sized,
{
    decide(PermissionTable::global(), &PolicyConfig::default(), user, resource, kind)
}

/// Permission and ownership checks bound to a table and a policy config.
#[derive(Debug, Clone)]
pub struct Authorizer {
    table: Arc<PermissionTable>,
    config: PolicyConfig,
}

impl Default for Authorizer {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}

impl Authorizer {
    pub fn new(config: PolicyConfig) -> Self {
        Self::with_table(Arc::new(PermissionTable::global().clone()), config)
    }

    pub fn with_table(table: Arc<PermissionTable>, config: PolicyConfig) -> Self {
        Self { table, config }
    }

    pub fn table(&self) -> &PermissionTable {
        &self.table
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn permits(&self, user: Option<&AuthUser>, permission: &str) -> bool {
        permits(&self.table, &self.config, user, permission)
    }

    /// Like [`permits`](Self::permits), but reports which guard failed.
    pub fn require<'u>(
        &self,
        user: Option<&'u AuthUser>,
        permission: &str,
    ) -> Result<&'u AuthUser, DomainError> {
        let user = user.ok_or(DomainError::Unauthorized)?;
        if self.permits(Some(user), permission) {
            Ok(user)
        } else {
            Err(DomainError::forbidden(format!("missing permission '{permission}'")))
        }
    }

    pub fn can_manage_resource<R>(
        &self,
        user: Option<&AuthUser>,
        resource: Option<&R>,
        kind: Option<ResourceKind>,
    ) -> bool
    where
        R: OwnedResource + ?Sized,
    {
        decide(&self.table, &self.config, user, resource, kind)
    }

    pub fn require_manage<'u, R>(
        &self,
        user: Option<&'u AuthUser>,
        resource: &R,
        kind: Option<ResourceKind>,
    ) -> Result<&'u AuthUser, DomainError>
    where
        R: OwnedResource + ?Sized,
    {
        let user = user.ok_or(DomainError::Unauthorized)?;
        if self.can_manage_resource(Some(user), Some(resource), kind) {
            Ok(user)
        } else {
            Err(DomainError::forbidden("not the owner of this resource"))
        }
    }
}

fn permits(
    table: &PermissionTable,
    config: &PolicyConfig,
    user: Option<&AuthUser>,
    permission: &str,
) -> bool {
    if config.enforce_guide_verification {
        table.has_effective_permission(user, permission)
    } else {
        table.has_permission(user, permission)
    }
}

fn decide<R>(
    table: &PermissionTable,
    config: &PolicyConfig,
    user: Option<&AuthUser>,
    resource: Option<&R>,
    kind: Option<ResourceKind>,
) -> bool
where
    R: OwnedResource + ?Sized,
{
    let (Some(user), Some(resource)) = (user, resource) else {
        return false;
    };

    if raw_role_is_privileged(user) {
        return true;
    }

    if resource.created_by() != Some(user.id) {
        return false;
    }

    match kind {
        Some(kind) => permits(table, config, Some(user), kind.owner_permission()),
        None => match config.unknown_resource_kind {
            UnknownResourcePolicy::AllowOwner => {
                tracing::debug!(user_id = %user.id, "owner granted access to unrecognized resource kind");
                true
            }
            UnknownResourcePolicy::Deny => false,
        },
    }
}

/// Staff bypass compares the stored role string exactly, not case-folded.
fn raw_role_is_privileged(user: &AuthUser) -> bool {
    user.role.as_ref().is_some_and(|role| {
        role.as_str() == KnownRole::Admin.as_str() || role.as_str() == KnownRole::Auditor.as_str()
    })
}

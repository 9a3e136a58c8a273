//! Authorization explanations and the role/permission registry.
//!
//! Both are read-only views over a [`PermissionTable`] meant for the UI and
//! for debugging denials; neither influences a decision.

use std::collections::BTreeMap;

use serde::Serialize;

use jumuiya_core::UserId;

use crate::permissions::names;
use crate::roles::{KnownRole, Role};
use crate::tables::PermissionTable;
use crate::user::{AuthUser, GuideStatus, get_effective_role};

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of a `has_permission` decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub required_permission: String,
    pub granted: bool,
    pub reason: String,
    pub source: Option<GrantSource>,
    pub principal: Option<PrincipalState>,
    pub denial_reason: Option<DenialReason>,
    /// Caveats that do not change the decision (e.g. effective-role downgrade).
    pub notes: Vec<String>,
}

/// Which rule granted the permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrantSource {
    AdminOverride,
    OwnRole { role: KnownRole },
    Inherited { role: KnownRole },
}

#[derive(Debug, Clone, Serialize)]
pub struct PrincipalState {
    pub user_id: UserId,
    pub role: Option<String>,
    pub guide_status: GuideStatus,
    pub effective_role: Option<String>,
    pub inherited_roles: Vec<KnownRole>,
    pub effective_permissions: Vec<String>,
    pub has_wildcard: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    NoUser,
    NoRole,
    UnknownRole,
    EmptyPermission,
    MissingPermission,
}

/// Explain why `has_permission(user, permission)` is (or would be) decided
/// the way it is. `granted` always agrees with the resolver.
pub fn explain_permission(
    table: &PermissionTable,
    user: Option<&AuthUser>,
    permission: &str,
) -> AuthorizationExplanation {
    let Some(user) = user else {
        return denied(permission, None, DenialKind::NoUser, "no authenticated user", vec![]);
    };

    let principal = principal_state(table, user);
    let mut notes = Vec::new();
    if let Some(effective) = &principal.effective_role {
        if principal.role.as_deref() != Some(effective.as_str()) {
            notes.push(format!(
                "effective role is '{effective}' while guide_status is '{}'; has_permission does not apply this downgrade",
                user.guide_status
            ));
        }
    }

    let Some(role) = &user.role else {
        return denied(permission, Some(principal), DenialKind::NoRole, "user has no role", vec![]);
    };

    if role.normalized() == "ADMIN" {
        return granted(
            permission,
            principal,
            GrantSource::AdminOverride,
            "admin role is granted every permission".to_string(),
            notes,
        );
    }

    if permission.is_empty() {
        return denied(
            permission,
            Some(principal),
            DenialKind::EmptyPermission,
            "permission name is empty",
            vec![],
        );
    }

    let Some(known) = role.known() else {
        return denied(
            permission,
            Some(principal),
            DenialKind::UnknownRole,
            &format!("role '{role}' is not defined"),
            vec![format!("assign one of: {}", role_list())],
        );
    };

    if table.grants_directly(known, permission) {
        let reason = format!("role '{known}' lists '{permission}' or '*'");
        return granted(permission, principal, GrantSource::OwnRole { role: known }, reason, notes);
    }

    if let Some(parent) = table
        .inherited_roles(known)
        .find(|parent| table.grants_directly(*parent, permission))
    {
        let reason = format!("role '{known}' inherits '{permission}' from '{parent}'");
        return granted(permission, principal, GrantSource::Inherited { role: parent }, reason, notes);
    }

    let granting: Vec<String> = KnownRole::ALL
        .into_iter()
        .filter(|r| table.role_has_permission(&Role::from(*r), permission))
        .map(|r| r.as_str().to_string())
        .collect();

    let mut suggestions = Vec::new();
    if !table.is_valid_permission(permission) {
        suggestions.push(format!("'{permission}' is not listed in any permission category"));
    }
    if !granting.is_empty() {
        suggestions.push(format!("roles granting it: {}", granting.join(", ")));
    }

    let mut explanation = denied(
        permission,
        Some(principal),
        DenialKind::MissingPermission,
        &format!("role '{known}' does not grant '{permission}'"),
        suggestions,
    );
    explanation.notes = notes;
    explanation
}

fn principal_state(table: &PermissionTable, user: &AuthUser) -> PrincipalState {
    let (inherited_roles, effective_permissions) = match &user.role {
        Some(role) => (
            role.known()
                .map(|k| table.inherited_roles(k).collect::<Vec<_>>())
                .unwrap_or_default(),
            table
                .role_permissions(role)
                .into_iter()
                .map(|p| p.as_str().to_string())
                .collect::<Vec<_>>(),
        ),
        None => (Vec::new(), Vec::new()),
    };

    PrincipalState {
        user_id: user.id,
        role: user.role.as_ref().map(|r| r.as_str().to_string()),
        guide_status: user.guide_status,
        effective_role: get_effective_role(user).map(|r| r.as_str().to_string()),
        inherited_roles,
        has_wildcard: effective_permissions.iter().any(|p| p == names::WILDCARD),
        effective_permissions,
    }
}

fn granted(
    permission: &str,
    principal: PrincipalState,
    source: GrantSource,
    reason: String,
    notes: Vec<String>,
) -> AuthorizationExplanation {
    AuthorizationExplanation {
        required_permission: permission.to_string(),
        granted: true,
        reason,
        source: Some(source),
        principal: Some(principal),
        denial_reason: None,
        notes,
    }
}

fn denied(
    permission: &str,
    principal: Option<PrincipalState>,
    kind: DenialKind,
    message: &str,
    suggestions: Vec<String>,
) -> AuthorizationExplanation {
    AuthorizationExplanation {
        required_permission: permission.to_string(),
        granted: false,
        reason: message.to_string(),
        source: None,
        principal,
        denial_reason: Some(DenialReason {
            kind,
            message: message.to_string(),
            suggestions,
        }),
        notes: Vec::new(),
    }
}

fn role_list() -> String {
    KnownRole::ALL.map(KnownRole::as_str).join(", ")
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Role definition with its granted permissions (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub name: String,
    pub description: String,
    pub inherits: Vec<String>,
    pub own_permissions: Vec<String>,
    pub permissions: Vec<String>,
}

/// Permission definition (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct PermissionDefinition {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// Complete view of the RBAC configuration, keyed by name.
#[derive(Debug, Clone, Serialize)]
pub struct RbacRegistry {
    pub roles: BTreeMap<String, RoleDefinition>,
    pub permissions: BTreeMap<String, PermissionDefinition>,
}

impl RbacRegistry {
    pub fn from_table(table: &PermissionTable) -> Self {
        let mut roles = BTreeMap::new();
        let mut permissions = BTreeMap::new();

        for role in KnownRole::ALL {
            let own: Vec<String> = table.own_permissions(role).map(str::to_string).collect();
            roles.insert(
                role.as_str().to_string(),
                RoleDefinition {
                    name: role.as_str().to_string(),
                    description: role_description(role).to_string(),
                    inherits: table.inherited_roles(role).map(|r| r.as_str().to_string()).collect(),
                    permissions: table
                        .role_permissions(&Role::from(role))
                        .into_iter()
                        .map(|p| p.as_str().to_string())
                        .collect(),
                    own_permissions: own,
                },
            );
        }

        let categorized = table
            .categories()
            .flat_map(|(category, perms)| perms.iter().map(move |p| (*p, Some(category))));
        let assigned = KnownRole::ALL
            .into_iter()
            .flat_map(|role| table.own_permissions(role))
            .map(|p| (p, table.category_of(p)));

        for (perm, category) in categorized.chain(assigned) {
            permissions.entry(perm.to_string()).or_insert_with(|| PermissionDefinition {
                name: perm.to_string(),
                description: permission_description(perm),
                category: category.map(str::to_string),
            });
        }

        Self { roles, permissions }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

fn role_description(role: KnownRole) -> &'static str {
    match role {
        KnownRole::User => "Traveller who browses, books and submits destinations",
        KnownRole::Guide => "Tour guide who publishes tours once verified",
        KnownRole::Auditor => "Staff moderator who reviews content and verifies guides",
        KnownRole::Admin => "Administrator with every permission",
    }
}

fn permission_description(perm: &str) -> Option<String> {
    if perm == names::WILDCARD {
        return Some("Wildcard permission - grants all permissions".to_string());
    }

    // "verb_object" tokens, e.g. "edit_own_destinations".
    let (verb, object) = perm.split_once('_')?;
    let mut chars = verb.chars();
    let first = chars.next()?;
    Some(format!(
        "{}{} {}",
        first.to_uppercase(),
        chars.as_str(),
        object.replace('_', " ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::GuideStatus;

    fn table() -> &'static PermissionTable {
        PermissionTable::global()
    }

    #[test]
    fn explanation_agrees_with_resolver() {
        let users = [
            AuthUser::new(UserId::new(), "user"),
            AuthUser::new(UserId::new(), "guide"),
            AuthUser::new(UserId::new(), "auditor"),
            AuthUser::new(UserId::new(), "admin"),
            AuthUser::new(UserId::new(), "visitor"),
            AuthUser::without_role(UserId::new()),
        ];
        let perms = [
            names::VIEW_DESTINATIONS,
            names::CREATE_TOURS,
            names::APPROVE_DESTINATIONS,
            names::MANAGE_SETTINGS,
            "",
            "launch_rockets",
        ];

        for user in &users {
            for perm in perms {
                assert_eq!(
                    explain_permission(table(), Some(user), perm).granted,
                    table().has_permission(Some(user), perm),
                    "{:?} / {perm:?}",
                    user.role
                );
            }
        }
        assert!(!explain_permission(table(), None, names::VIEW_TOURS).granted);
    }

    #[test]
    fn inherited_grants_name_the_source_role() {
        let auditor = AuthUser::new(UserId::new(), "auditor");
        let explanation = explain_permission(table(), Some(&auditor), names::CREATE_TOURS);

        assert!(explanation.granted);
        assert_eq!(explanation.source, Some(GrantSource::Inherited { role: KnownRole::Guide }));
    }

    #[test]
    fn denial_lists_granting_roles() {
        let guide = AuthUser::new(UserId::new(), "guide");
        let explanation = explain_permission(table(), Some(&guide), names::VERIFY_GUIDES);

        let denial = explanation.denial_reason.unwrap();
        assert_eq!(denial.kind, DenialKind::MissingPermission);
        assert!(denial.suggestions.iter().any(|s| s.contains("auditor")));
    }

    #[test]
    fn pending_guide_gets_downgrade_note() {
        let guide = AuthUser::new(UserId::new(), "guide").with_guide_status(GuideStatus::Pending);
        let explanation = explain_permission(table(), Some(&guide), names::CREATE_TOURS);

        assert!(explanation.granted);
        assert_eq!(explanation.notes.len(), 1);
        assert!(explanation.notes[0].contains("'user'"));
    }

    #[test]
    fn registry_covers_roles_and_categories() {
        let registry = RbacRegistry::from_table(table());

        assert_eq!(registry.roles.len(), 4);
        assert_eq!(registry.roles["admin"].inherits, vec!["user", "guide", "auditor"]);
        assert!(registry.roles["guide"].permissions.contains(&names::VIEW_DESTINATIONS.to_string()));

        let approve = &registry.permissions[names::APPROVE_DESTINATIONS];
        assert_eq!(approve.category.as_deref(), Some("DESTINATION_MANAGEMENT"));
        assert_eq!(approve.description.as_deref(), Some("Approve destinations"));
        assert_eq!(registry.permissions["*"].category, None);

        let json = registry.to_json();
        assert_eq!(json["roles"]["auditor"]["name"], "auditor");
    }
}

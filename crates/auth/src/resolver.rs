//! Permission resolution: may this user perform this action, given only
//! their role?
//!
//! Every check is pure and fails closed. The free functions consult
//! [`PermissionTable::global`]; the methods let callers use their own table.

use std::collections::BTreeSet;

use crate::permissions::{Permission, names};
use crate::roles::{KnownRole, Role};
use crate::tables::PermissionTable;
use crate::user::{AuthUser, effective_user};

impl PermissionTable {
    pub fn has_permission(&self, user: Option<&AuthUser>, permission: &str) -> bool {
        let Some(role) = user.and_then(|u| u.role.as_ref()) else {
            return false;
        };
        let granted = self.role_has_permission(role, permission);
        if !granted {
            tracing::trace!(role = %role, permission, "permission denied");
        }
        granted
    }

    /// Resolution for a bare role name.
    pub fn role_has_permission(&self, role: &Role, permission: &str) -> bool {
        let normalized = role.normalized();

        // Escape hatch, independent of ADMIN's `*` entry.
        if normalized == "ADMIN" {
            return true;
        }
        if permission.is_empty() {
            return false;
        }

        let Some(known) = KnownRole::parse(&normalized) else {
            return false;
        };

        self.grants_directly(known, permission)
            || self
                .inherited_roles(known)
                .any(|parent| self.grants_directly(parent, permission))
    }

    /// Own plus inherited permissions; empty for an unknown role.
    pub fn role_permissions(&self, role: &Role) -> BTreeSet<Permission> {
        let Some(known) = role.known() else {
            return BTreeSet::new();
        };

        std::iter::once(known)
            .chain(self.inherited_roles(known))
            .flat_map(|r| self.own_permissions(r))
            .map(Permission::from_static)
            .collect()
    }

    pub fn has_any_permission<I, P>(&self, user: Option<&AuthUser>, permissions: I) -> bool
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        permissions
            .into_iter()
            .any(|p| self.has_permission(user, p.as_ref()))
    }

    pub fn has_all_permissions<I, P>(&self, user: Option<&AuthUser>, permissions: I) -> bool
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        permissions
            .into_iter()
            .all(|p| self.has_permission(user, p.as_ref()))
    }

    /// `*`, or a token listed in at least one category.
    ///
    /// Checks the category index, not the role lists.
    pub fn is_valid_permission(&self, permission: &str) -> bool {
        permission == names::WILDCARD || self.category_of(permission).is_some()
    }

    /// `has_permission` evaluated against the user's effective role.
    pub fn has_effective_permission(&self, user: Option<&AuthUser>, permission: &str) -> bool {
        user.is_some_and(|u| self.has_permission(Some(&effective_user(u)), permission))
    }
}

/// Whether `user` may perform `permission` based on their raw role.
///
/// Does not apply the unverified-guide downgrade; see [`get_effective_role`].
///
/// [`get_effective_role`]: crate::user::get_effective_role
pub fn has_permission(user: Option<&AuthUser>, permission: &str) -> bool {
    PermissionTable::global().has_permission(user, permission)
}

pub fn has_any_permission<I, P>(user: Option<&AuthUser>, permissions: I) -> bool
where
    I: IntoIterator<Item = P>,
    P: AsRef<str>,
{
    PermissionTable::global().has_any_permission(user, permissions)
}

pub fn has_all_permissions<I, P>(user: Option<&AuthUser>, permissions: I) -> bool
where
    I: IntoIterator<Item = P>,
    P: AsRef<str>,
{
    PermissionTable::global().has_all_permissions(user, permissions)
}

pub fn get_role_permissions(role: &Role) -> BTreeSet<Permission> {
    PermissionTable::global().role_permissions(role)
}

pub fn is_valid_permission(permission: &str) -> bool {
    PermissionTable::global().is_valid_permission(permission)
}

pub fn has_effective_permission(user: Option<&AuthUser>, permission: &str) -> bool {
    PermissionTable::global().has_effective_permission(user, permission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::names::*;
    use crate::user::{GuideStatus, get_effective_role};
    use jumuiya_core::UserId;

    fn user(role: &'static str) -> AuthUser {
        AuthUser::new(UserId::new(), role)
    }

    #[test]
    fn absent_user_or_role_is_denied() {
        assert!(!has_permission(None, VIEW_DESTINATIONS));
        assert!(!has_permission(Some(&AuthUser::without_role(UserId::new())), VIEW_DESTINATIONS));
    }

    #[test]
    fn admin_is_granted_anything() {
        let admin = user("admin");
        assert!(has_permission(Some(&admin), APPROVE_DESTINATIONS));
        assert!(has_permission(Some(&admin), "launch_rockets"));
        assert!(has_permission(Some(&admin), WILDCARD));
        assert!(has_permission(Some(&user("ADMIN")), "anything_at_all"));
    }

    #[test]
    fn own_and_inherited_permissions_resolve() {
        let guide = user("guide");
        assert!(has_permission(Some(&guide), CREATE_TOURS));
        assert!(has_permission(Some(&guide), EDIT_OWN_DESTINATIONS));

        let auditor = user("Auditor");
        assert!(has_permission(Some(&auditor), APPROVE_DESTINATIONS));
        assert!(has_permission(Some(&auditor), CREATE_TOURS));
        assert!(has_permission(Some(&auditor), CREATE_BOOKINGS));
    }

    #[test]
    fn lower_roles_do_not_inherit_upwards() {
        assert!(!has_permission(Some(&user("user")), CREATE_TOURS));
        assert!(!has_permission(Some(&user("guide")), APPROVE_DESTINATIONS));
        assert!(!has_permission(Some(&user("auditor")), MANAGE_SETTINGS));
    }

    #[test]
    fn unknown_roles_and_permissions_are_denied() {
        assert!(!has_permission(Some(&user("superuser")), VIEW_DESTINATIONS));
        assert!(!has_permission(Some(&user("auditor")), "launch_rockets"));
        assert!(!has_permission(Some(&user("auditor")), ""));
        assert!(!has_permission(Some(&user("user")), WILDCARD));
    }

    #[test]
    fn role_permissions_union_inheritance() {
        let user_perms = get_role_permissions(&Role::from("user"));
        let guide_perms = get_role_permissions(&Role::from("guide"));
        let admin_perms = get_role_permissions(&Role::from("admin"));

        assert!(guide_perms.is_superset(&user_perms));
        assert!(guide_perms.contains(&Permission::from_static(CREATE_TOURS)));
        assert!(admin_perms.contains(&Permission::WILDCARD));
        for role in ["user", "guide", "auditor"] {
            assert!(admin_perms.is_superset(&get_role_permissions(&Role::from(role))));
        }
        assert!(get_role_permissions(&Role::from("visitor")).is_empty());
    }

    #[test]
    fn any_and_all_combinators() {
        let guide = user("guide");
        assert!(has_any_permission(Some(&guide), [APPROVE_TOURS, CREATE_TOURS]));
        assert!(!has_any_permission(Some(&guide), [APPROVE_TOURS, VERIFY_GUIDES]));
        assert!(has_all_permissions(Some(&guide), [CREATE_TOURS, VIEW_DESTINATIONS]));
        assert!(!has_all_permissions(Some(&guide), [CREATE_TOURS, APPROVE_TOURS]));

        let none: [&str; 0] = [];
        assert!(!has_any_permission(Some(&guide), none));
        assert!(has_all_permissions(Some(&guide), none));
    }

    #[test]
    fn validity_follows_category_index() {
        assert!(is_valid_permission(WILDCARD));
        assert!(is_valid_permission(VERIFY_GUIDES));
        assert!(!is_valid_permission("launch_rockets"));
    }

    // The resolver and the effective-role helper deliberately disagree for
    // unverified guides; only explicit composition applies the downgrade.
    #[test]
    fn pending_guide_discrepancy_is_preserved() {
        let guide = user("guide").with_guide_status(GuideStatus::Pending);

        assert!(has_permission(Some(&guide), EDIT_OWN_DESTINATIONS));
        assert_eq!(get_effective_role(&guide), Some(Role::from("user")));

        assert!(has_permission(Some(&guide), CREATE_TOURS));
        assert!(!has_effective_permission(Some(&guide), CREATE_TOURS));
        assert!(has_effective_permission(Some(&guide), EDIT_OWN_DESTINATIONS));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_role() -> impl Strategy<Value = KnownRole> {
            prop::sample::select(KnownRole::ALL.to_vec())
        }

        proptest! {
            #[test]
            fn admin_escape_hatch_covers_every_token(permission in "\\PC*") {
                prop_assert!(has_permission(Some(&user("admin")), &permission));
            }

            #[test]
            fn non_admins_are_denied_tokens_outside_their_closure(
                role in any_role(),
                permission in "[a-z_]{1,24}",
            ) {
                prop_assume!(role != KnownRole::Admin);
                let granted = get_role_permissions(&Role::from(role));
                prop_assume!(!granted.contains(&Permission::new(permission.clone())));

                let subject = AuthUser::new(UserId::new(), role);
                prop_assert!(!has_permission(Some(&subject), &permission));
            }

            #[test]
            fn inheritance_is_monotonic(role in any_role()) {
                let table = PermissionTable::global();
                let mine = get_role_permissions(&Role::from(role));
                for parent in table.inherited_roles(role) {
                    prop_assert!(mine.is_superset(&get_role_permissions(&Role::from(parent))));
                }
            }

            #[test]
            fn case_does_not_change_decisions(role in any_role(), upper in any::<bool>()) {
                let name = if upper { role.as_str().to_uppercase() } else { role.as_str().to_string() };
                let subject = AuthUser::new(UserId::new(), Role::new(name));
                for permission in [VIEW_DESTINATIONS, CREATE_TOURS, APPROVE_DESTINATIONS, MANAGE_SETTINGS] {
                    prop_assert_eq!(
                        has_permission(Some(&subject), permission),
                        has_permission(Some(&AuthUser::new(subject.id, role)), permission)
                    );
                }
            }
        }
    }
}

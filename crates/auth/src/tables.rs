//! Static role/permission configuration.
//!
//! The tables are declared as literals, built into a [`PermissionTable`] once
//! (the hierarchy closure is computed at build time) and never mutated
//! afterwards, so they can be shared across threads without locking.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

use crate::error::PolicyError;
use crate::permissions::names::*;
use crate::roles::KnownRole;

/// Literal description of a permission table.
#[derive(Debug, Clone, Copy)]
pub struct TableDefinition {
    /// Category name → permissions it groups. Only used for validation and UI.
    pub categories: &'static [(&'static str, &'static [&'static str])],
    /// Role → its own (non-inherited) permissions.
    pub role_permissions: &'static [(KnownRole, &'static [&'static str])],
    /// Role → the roles it inherits from directly.
    pub role_parents: &'static [(KnownRole, &'static [KnownRole])],
}

/// The marketplace's built-in policy.
pub const BUILTIN: TableDefinition = TableDefinition {
    categories: &[
        (
            "DESTINATION_MANAGEMENT",
            &[
                VIEW_DESTINATIONS,
                CREATE_DESTINATIONS,
                EDIT_OWN_DESTINATIONS,
                EDIT_DESTINATIONS,
                DELETE_DESTINATIONS,
                APPROVE_DESTINATIONS,
                FEATURE_DESTINATIONS,
            ],
        ),
        (
            "TOUR_MANAGEMENT",
            &[VIEW_TOURS, CREATE_TOURS, EDIT_OWN_TOURS, EDIT_TOURS, APPROVE_TOURS, FEATURE_TOURS],
        ),
        (
            "BOOKING_MANAGEMENT",
            &[
                CREATE_BOOKINGS,
                VIEW_OWN_BOOKINGS,
                MANAGE_OWN_BOOKINGS,
                VIEW_ALL_BOOKINGS,
                MANAGE_BOOKINGS,
            ],
        ),
        (
            "GUIDE_MANAGEMENT",
            &[APPLY_AS_GUIDE, MANAGE_GUIDE_PROFILE, VIEW_GUIDES, VERIFY_GUIDES],
        ),
        (
            "MODERATION",
            &[VIEW_MODERATION_QUEUE, MODERATE_CONTENT, VIEW_AUDIT_LOGS],
        ),
        ("USER_MANAGEMENT", &[VIEW_USERS, MANAGE_USERS, MANAGE_ROLES]),
        ("SYSTEM", &[MANAGE_SETTINGS, VIEW_ANALYTICS]),
    ],
    role_permissions: &[
        (
            KnownRole::User,
            &[
                VIEW_DESTINATIONS,
                VIEW_TOURS,
                CREATE_DESTINATIONS,
                EDIT_OWN_DESTINATIONS,
                CREATE_BOOKINGS,
                VIEW_OWN_BOOKINGS,
                MANAGE_OWN_BOOKINGS,
                APPLY_AS_GUIDE,
            ],
        ),
        (
            KnownRole::Guide,
            &[MANAGE_GUIDE_PROFILE, CREATE_TOURS, EDIT_OWN_TOURS],
        ),
        (
            KnownRole::Auditor,
            &[
                VIEW_MODERATION_QUEUE,
                MODERATE_CONTENT,
                VIEW_AUDIT_LOGS,
                APPROVE_DESTINATIONS,
                APPROVE_TOURS,
                FEATURE_DESTINATIONS,
                FEATURE_TOURS,
                EDIT_DESTINATIONS,
                EDIT_TOURS,
                VERIFY_GUIDES,
                VIEW_GUIDES,
                VIEW_ALL_BOOKINGS,
                VIEW_USERS,
            ],
        ),
        (KnownRole::Admin, &[WILDCARD]),
    ],
    role_parents: &[
        (KnownRole::User, &[]),
        (KnownRole::Guide, &[KnownRole::User]),
        (KnownRole::Auditor, &[KnownRole::Guide]),
        (KnownRole::Admin, &[KnownRole::Auditor]),
    ],
};

/// Resolved permission table.
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    own: HashMap<KnownRole, BTreeSet<&'static str>>,
    inherited: HashMap<KnownRole, BTreeSet<KnownRole>>,
    categories: BTreeMap<&'static str, BTreeSet<&'static str>>,
}

static GLOBAL: LazyLock<PermissionTable> = LazyLock::new(PermissionTable::builtin);

impl PermissionTable {
    /// Build a table, computing each role's inherited set as the transitive
    /// closure of its declared parents.
    pub fn build(definition: &TableDefinition) -> Result<Self, PolicyError> {
        let own: HashMap<KnownRole, BTreeSet<&'static str>> = definition
            .role_permissions
            .iter()
            .map(|(role, perms)| (*role, perms.iter().copied().collect()))
            .collect();

        let parents: HashMap<KnownRole, &'static [KnownRole]> =
            definition.role_parents.iter().copied().collect();

        let mut inherited = HashMap::new();
        for role in KnownRole::ALL {
            let closure = closure_of(role, &parents);
            if closure.contains(&role) {
                return Err(PolicyError::HierarchyCycle(role));
            }
            inherited.insert(role, closure);
        }

        let categories = definition
            .categories
            .iter()
            .map(|(name, perms)| (*name, perms.iter().copied().collect()))
            .collect();

        Ok(Self {
            own,
            inherited,
            categories,
        })
    }

    /// The built-in marketplace table.
    ///
    /// Falls back to an empty (deny-everything except the admin escape hatch)
    /// table if the literals are ever made inconsistent.
    pub fn builtin() -> Self {
        Self::build(&BUILTIN).unwrap_or_else(|err| {
            tracing::error!(error = %err, "built-in permission table is invalid; denying by default");
            Self::default()
        })
    }

    /// Process-wide table, built on first use.
    pub fn global() -> &'static PermissionTable {
        &GLOBAL
    }

    pub fn own_permissions(&self, role: KnownRole) -> impl Iterator<Item = &'static str> + '_ {
        self.own.get(&role).into_iter().flatten().copied()
    }

    /// Roles whose permissions `role` inherits (never includes `role` itself).
    pub fn inherited_roles(&self, role: KnownRole) -> impl Iterator<Item = KnownRole> + '_ {
        self.inherited.get(&role).into_iter().flatten().copied()
    }

    pub fn categories(&self) -> impl Iterator<Item = (&'static str, &BTreeSet<&'static str>)> {
        self.categories.iter().map(|(name, perms)| (*name, perms))
    }

    pub fn category_of(&self, permission: &str) -> Option<&'static str> {
        self.categories
            .iter()
            .find(|(_, perms)| perms.contains(permission))
            .map(|(name, _)| *name)
    }

    /// Role-list permissions that appear in no category.
    ///
    /// Such tokens resolve normally but fail `is_valid_permission`; a
    /// non-empty result means the configuration drifted.
    pub fn unlisted_permissions(&self) -> Vec<(KnownRole, &'static str)> {
        let mut out: Vec<_> = self
            .own
            .iter()
            .flat_map(|(role, perms)| perms.iter().map(move |p| (*role, *p)))
            .filter(|(_, p)| *p != WILDCARD && self.category_of(p).is_none())
            .collect();
        out.sort();
        out
    }

    pub(crate) fn grants_directly(&self, role: KnownRole, permission: &str) -> bool {
        self.own
            .get(&role)
            .is_some_and(|perms| perms.contains(permission) || perms.contains(WILDCARD))
    }
}

fn closure_of(
    role: KnownRole,
    parents: &HashMap<KnownRole, &'static [KnownRole]>,
) -> BTreeSet<KnownRole> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<KnownRole> = parents.get(&role).copied().unwrap_or_default().to_vec();
    while let Some(next) = stack.pop() {
        if seen.insert(next) {
            stack.extend(parents.get(&next).copied().unwrap_or_default());
        }
    }
    seen
}

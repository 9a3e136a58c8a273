use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque action tokens (e.g. "approve_destinations"). The
/// special wildcard `"*"` grants every action. Token strings are the stable
/// contract with every caller; renaming one means updating every category
/// and role list in lockstep.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission::from_static(names::WILDCARD);

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == names::WILDCARD
    }
}

impl AsRef<str> for Permission {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Permission token names.
pub mod names {
    pub const WILDCARD: &str = "*";

    // DESTINATION_MANAGEMENT
    pub const VIEW_DESTINATIONS: &str = "view_destinations";
    pub const CREATE_DESTINATIONS: &str = "create_destinations";
    pub const EDIT_OWN_DESTINATIONS: &str = "edit_own_destinations";
    pub const EDIT_DESTINATIONS: &str = "edit_destinations";
    pub const DELETE_DESTINATIONS: &str = "delete_destinations";
    pub const APPROVE_DESTINATIONS: &str = "approve_destinations";
    pub const FEATURE_DESTINATIONS: &str = "feature_destinations";

    // TOUR_MANAGEMENT
    pub const VIEW_TOURS: &str = "view_tours";
    pub const CREATE_TOURS: &str = "create_tours";
    pub const EDIT_OWN_TOURS: &str = "edit_own_tours";
    pub const EDIT_TOURS: &str = "edit_tours";
    pub const APPROVE_TOURS: &str = "approve_tours";
    pub const FEATURE_TOURS: &str = "feature_tours";

    // BOOKING_MANAGEMENT
    pub const CREATE_BOOKINGS: &str = "create_bookings";
    pub const VIEW_OWN_BOOKINGS: &str = "view_own_bookings";
    pub const MANAGE_OWN_BOOKINGS: &str = "manage_own_bookings";
    pub const VIEW_ALL_BOOKINGS: &str = "view_all_bookings";
    pub const MANAGE_BOOKINGS: &str = "manage_bookings";

    // GUIDE_MANAGEMENT
    pub const APPLY_AS_GUIDE: &str = "apply_as_guide";
    pub const MANAGE_GUIDE_PROFILE: &str = "manage_guide_profile";
    pub const VIEW_GUIDES: &str = "view_guides";
    pub const VERIFY_GUIDES: &str = "verify_guides";

    // MODERATION
    pub const VIEW_MODERATION_QUEUE: &str = "view_moderation_queue";
    pub const MODERATE_CONTENT: &str = "moderate_content";
    pub const VIEW_AUDIT_LOGS: &str = "view_audit_logs";

    // USER_MANAGEMENT
    pub const VIEW_USERS: &str = "view_users";
    pub const MANAGE_USERS: &str = "manage_users";
    pub const MANAGE_ROLES: &str = "manage_roles";

    // SYSTEM
    pub const MANAGE_SETTINGS: &str = "manage_settings";
    pub const VIEW_ANALYTICS: &str = "view_analytics";
}

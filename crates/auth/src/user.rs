//! The authorization view of a user.

use serde::{Deserialize, Serialize};

use jumuiya_core::UserId;

use crate::error::PolicyError;
use crate::roles::{KnownRole, Role};

/// Verification state of a guide application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuideStatus {
    #[default]
    Unverified,
    Pending,
    Verified,
}

impl GuideStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GuideStatus::Unverified => "unverified",
            GuideStatus::Pending => "pending",
            GuideStatus::Verified => "verified",
        }
    }
}

impl core::fmt::Display for GuideStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for GuideStatus {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unverified" => Ok(GuideStatus::Unverified),
            "pending" => Ok(GuideStatus::Pending),
            "verified" => Ok(GuideStatus::Verified),
            _ => Err(PolicyError::InvalidConfig {
                key: "guide_status".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// `{id, role, guide_status}` as supplied by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub role: Option<Role>,
    #[serde(default)]
    pub guide_status: GuideStatus,
}

impl AuthUser {
    pub fn new(id: UserId, role: impl Into<Role>) -> Self {
        Self {
            id,
            role: Some(role.into()),
            guide_status: GuideStatus::default(),
        }
    }

    /// A user record with no role assigned; every check fails closed.
    pub fn without_role(id: UserId) -> Self {
        Self {
            id,
            role: None,
            guide_status: GuideStatus::default(),
        }
    }

    pub fn with_guide_status(mut self, status: GuideStatus) -> Self {
        self.guide_status = status;
        self
    }

    pub fn known_role(&self) -> Option<KnownRole> {
        self.role.as_ref().and_then(Role::known)
    }

    /// Raw-role staff check (no effective-role downgrade).
    pub fn is_privileged(&self) -> bool {
        self.known_role().is_some_and(KnownRole::is_privileged)
    }
}

/// Role used for authorization after the guide-verification downgrade.
///
/// A `guide` whose status is not `verified` acts as a plain `user`. The
/// resolver does not call this on its own; callers compose it explicitly.
pub fn get_effective_role(user: &AuthUser) -> Option<Role> {
    match &user.role {
        Some(role) if role.is(KnownRole::Guide) && user.guide_status != GuideStatus::Verified => {
            Some(Role::from(KnownRole::User))
        }
        other => other.clone(),
    }
}

/// Copy of `user` carrying its effective role.
pub fn effective_user(user: &AuthUser) -> AuthUser {
    AuthUser {
        role: get_effective_role(user),
        ..user.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unverified_guides_act_as_users() {
        let id = UserId::new();
        for status in [GuideStatus::Unverified, GuideStatus::Pending] {
            let guide = AuthUser::new(id, "guide").with_guide_status(status);
            assert_eq!(get_effective_role(&guide), Some(Role::from("user")));
        }

        let verified = AuthUser::new(id, "guide").with_guide_status(GuideStatus::Verified);
        assert_eq!(get_effective_role(&verified), Some(Role::from("guide")));
    }

    #[test]
    fn other_roles_are_left_alone() {
        let id = UserId::new();
        let auditor = AuthUser::new(id, "auditor");
        assert_eq!(get_effective_role(&auditor), Some(Role::from("auditor")));
        assert_eq!(get_effective_role(&AuthUser::without_role(id)), None);
    }

    #[test]
    fn effective_user_keeps_identity() {
        let guide = AuthUser::new(UserId::new(), "Guide").with_guide_status(GuideStatus::Pending);
        let effective = effective_user(&guide);
        assert_eq!(effective.id, guide.id);
        assert_eq!(effective.known_role(), Some(KnownRole::User));
        assert_eq!(effective.guide_status, GuideStatus::Pending);
    }

    #[test]
    fn guide_status_deserializes_from_snake_case() {
        let user: AuthUser = serde_json::from_value(serde_json::json!({
            "id": UserId::new(),
            "role": "guide",
            "guide_status": "pending",
        }))
        .unwrap();
        assert_eq!(user.guide_status, GuideStatus::Pending);
        assert_eq!("VERIFIED".parse::<GuideStatus>(), Ok(GuideStatus::Verified));
    }
}

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// Role name as stored on the user record.
///
/// Kept opaque at this layer: comparisons go through [`Role::normalized`]
/// (upper case) so `admin`, `Admin` and `ADMIN` resolve identically, and
/// unknown names simply resolve to no permissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Upper-cased lookup key.
    pub fn normalized(&self) -> String {
        self.0.to_uppercase()
    }

    pub fn known(&self) -> Option<KnownRole> {
        KnownRole::parse(&self.0)
    }

    pub fn is(&self, role: KnownRole) -> bool {
        self.known() == Some(role)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<KnownRole> for Role {
    fn from(value: KnownRole) -> Self {
        Self::from_static(value.as_str())
    }
}

impl From<&'static str> for Role {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// The four roles the permission tables know about, least privileged first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnownRole {
    User,
    Guide,
    Auditor,
    Admin,
}

impl KnownRole {
    pub const ALL: [KnownRole; 4] = [
        KnownRole::User,
        KnownRole::Guide,
        KnownRole::Auditor,
        KnownRole::Admin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            KnownRole::User => "user",
            KnownRole::Guide => "guide",
            KnownRole::Auditor => "auditor",
            KnownRole::Admin => "admin",
        }
    }

    /// Case-insensitive lookup.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "USER" => Some(KnownRole::User),
            "GUIDE" => Some(KnownRole::Guide),
            "AUDITOR" => Some(KnownRole::Auditor),
            "ADMIN" => Some(KnownRole::Admin),
            _ => None,
        }
    }

    /// Staff roles that bypass ownership checks.
    pub fn is_privileged(self) -> bool {
        matches!(self, KnownRole::Auditor | KnownRole::Admin)
    }
}

impl core::fmt::Display for KnownRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for KnownRole {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| PolicyError::UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_lookup_ignores_case() {
        assert_eq!(Role::new("Admin").known(), Some(KnownRole::Admin));
        assert_eq!(Role::from_static("GUIDE").known(), Some(KnownRole::Guide));
        assert_eq!(Role::new("superuser").known(), None);
        assert_eq!(Role::new("auditor").normalized(), "AUDITOR");
    }

    #[test]
    fn only_staff_roles_are_privileged() {
        let privileged: Vec<_> = KnownRole::ALL.into_iter().filter(|r| r.is_privileged()).collect();
        assert_eq!(privileged, vec![KnownRole::Auditor, KnownRole::Admin]);
    }

    #[test]
    fn from_str_rejects_unknown_names() {
        assert_eq!("user".parse::<KnownRole>(), Ok(KnownRole::User));
        assert!(matches!(
            "owner".parse::<KnownRole>(),
            Err(PolicyError::UnknownRole(ref name)) if name == "owner"
        ));
    }
}

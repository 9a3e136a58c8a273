//! Policy configuration, read once at startup.

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// What an owner may do with a resource kind the authorizer does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownResourcePolicy {
    /// Owners pass unconditionally (legacy behavior).
    #[default]
    AllowOwner,
    /// Owners are denied unless a privileged role applies.
    Deny,
}

impl core::str::FromStr for UnknownResourcePolicy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow_owner" | "allow" => Ok(UnknownResourcePolicy::AllowOwner),
            "deny" => Ok(UnknownResourcePolicy::Deny),
            _ => Err(invalid(PolicyConfig::UNKNOWN_RESOURCE_POLICY_VAR, s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub unknown_resource_kind: UnknownResourcePolicy,
    /// Evaluate ownership and workflow permission checks against the
    /// effective role, so unverified guides act as users.
    pub enforce_guide_verification: bool,
}

impl PolicyConfig {
    pub const UNKNOWN_RESOURCE_POLICY_VAR: &'static str = "JUMUIYA_UNKNOWN_RESOURCE_POLICY";
    pub const ENFORCE_GUIDE_VERIFICATION_VAR: &'static str = "JUMUIYA_ENFORCE_GUIDE_VERIFICATION";

    pub fn from_env() -> Result<Self, PolicyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PolicyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(Self::UNKNOWN_RESOURCE_POLICY_VAR) {
            config.unknown_resource_kind = raw.parse()?;
        }

        if let Some(raw) = lookup(Self::ENFORCE_GUIDE_VERIFICATION_VAR) {
            config.enforce_guide_verification = parse_bool(&raw)
                .ok_or_else(|| invalid(Self::ENFORCE_GUIDE_VERIFICATION_VAR, &raw))?;
        }

        tracing::info!(
            unknown_resource_kind = ?config.unknown_resource_kind,
            enforce_guide_verification = config.enforce_guide_verification,
            "policy configuration loaded"
        );

        Ok(config)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid(key: &str, value: &str) -> PolicyError {
    PolicyError::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
    }
}

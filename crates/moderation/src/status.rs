use serde::{Deserialize, Serialize};

use jumuiya_auth::ResourceKind;
use jumuiya_auth::permissions::names;
use jumuiya_core::{DomainError, ResourceId};

/// Kinds of user-submitted content that go through moderation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Destination,
    Tour,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Destination => "destination",
            ContentType::Tour => "tour",
        }
    }

    /// Ownership kind used for owner checks on this content.
    pub fn resource_kind(self) -> ResourceKind {
        match self {
            ContentType::Destination => ResourceKind::Destination,
            ContentType::Tour => ResourceKind::Tour,
        }
    }

    pub fn create_permission(self) -> &'static str {
        match self {
            ContentType::Destination => names::CREATE_DESTINATIONS,
            ContentType::Tour => names::CREATE_TOURS,
        }
    }

    /// Needed to approve, reject or request revision.
    pub fn approval_permission(self) -> &'static str {
        match self {
            ContentType::Destination => names::APPROVE_DESTINATIONS,
            ContentType::Tour => names::APPROVE_TOURS,
        }
    }

    pub fn feature_permission(self) -> &'static str {
        match self {
            ContentType::Destination => names::FEATURE_DESTINATIONS,
            ContentType::Tour => names::FEATURE_TOURS,
        }
    }
}

impl core::fmt::Display for ContentType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ContentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "destination" => Ok(ContentType::Destination),
            "tour" => Ok(ContentType::Tour),
            other => Err(DomainError::validation(format!("unknown content type '{other}'"))),
        }
    }
}

/// Moderation state of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    #[default]
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl core::fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ModerationStatus::Draft => "draft",
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
        })
    }
}

/// State of one moderation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Pending,
    Approved,
    Rejected,
}

impl core::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            LogStatus::Pending => "pending",
            LogStatus::Approved => "approved",
            LogStatus::Rejected => "rejected",
        })
    }
}

/// `(content_type, content_id)`: the unit transitions are serialized on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentKey {
    pub content_type: ContentType,
    pub content_id: ResourceId,
}

impl ContentKey {
    pub fn new(content_type: ContentType, content_id: ResourceId) -> Self {
        Self {
            content_type,
            content_id,
        }
    }

    pub fn destination(content_id: ResourceId) -> Self {
        Self::new(ContentType::Destination, content_id)
    }

    pub fn tour(content_id: ResourceId) -> Self {
        Self::new(ContentType::Tour, content_id)
    }
}

impl core::fmt::Display for ContentKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.content_type, self.content_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_maps_to_permissions() {
        assert_eq!(ContentType::Destination.approval_permission(), "approve_destinations");
        assert_eq!(ContentType::Tour.feature_permission(), "feature_tours");
        assert_eq!(ContentType::Tour.resource_kind(), ResourceKind::Tour);
        assert_eq!("Destination".parse::<ContentType>(), Ok(ContentType::Destination));
        assert!("review".parse::<ContentType>().is_err());
    }

    #[test]
    fn key_display_is_type_prefixed() {
        let id = ResourceId::new();
        assert_eq!(ContentKey::tour(id).to_string(), format!("tour:{id}"));
    }
}

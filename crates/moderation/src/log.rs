//! Moderation log: one submission's path through review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jumuiya_core::{DomainError, DomainResult, ModerationLogId, ResourceId, UserId};

use crate::status::{ContentKey, ContentType, LogStatus};

/// Prefix on log notes written by a revision request.
pub const REVISION_REQUESTED_TAG: &str = "revision-requested";

/// Audit record of one submission. Never deleted; terminal once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationLog {
    pub id: ModerationLogId,
    pub content_type: ContentType,
    pub content_id: ResourceId,
    pub user_id: UserId,
    pub status: LogStatus,
    pub notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub resolved_by: Option<UserId>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ModerationLog {
    pub fn pending(key: ContentKey, submitter: UserId, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id: ModerationLogId::new(),
            content_type: key.content_type,
            content_id: key.content_id,
            user_id: submitter,
            status: LogStatus::Pending,
            notes: None,
            submitted_at,
            resolved_by: None,
            resolved_at: None,
        }
    }

    pub fn key(&self) -> ContentKey {
        ContentKey::new(self.content_type, self.content_id)
    }

    pub fn is_pending(&self) -> bool {
        self.status == LogStatus::Pending
    }

    /// Close a pending log.
    pub fn resolve(&mut self, resolution: &LogResolution) -> DomainResult<()> {
        if !self.is_pending() {
            return Err(DomainError::conflict(format!(
                "moderation log {} is already {}",
                self.id, self.status
            )));
        }
        if resolution.status == LogStatus::Pending {
            return Err(DomainError::validation("a resolution must be terminal"));
        }
        self.status = resolution.status;
        self.resolved_by = Some(resolution.resolved_by);
        self.resolved_at = Some(resolution.resolved_at);
        if resolution.notes.is_some() {
            self.notes = resolution.notes.clone();
        }
        Ok(())
    }
}

/// Terminal outcome written onto a pending log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogResolution {
    pub status: LogStatus,
    pub resolved_by: UserId,
    pub resolved_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl LogResolution {
    pub fn approved(by: UserId, at: DateTime<Utc>, notes: Option<String>) -> Self {
        Self {
            status: LogStatus::Approved,
            resolved_by: by,
            resolved_at: at,
            notes,
        }
    }

    pub fn rejected(by: UserId, at: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self {
            status: LogStatus::Rejected,
            resolved_by: by,
            resolved_at: at,
            notes: Some(reason.into()),
        }
    }

    pub fn revision_requested(by: UserId, at: DateTime<Utc>, notes: &str) -> Self {
        Self::rejected(by, at, format!("{REVISION_REQUESTED_TAG}: {notes}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_is_one_shot() {
        let key = ContentKey::destination(ResourceId::new());
        let mut log = ModerationLog::pending(key, UserId::new(), Utc::now());
        let moderator = UserId::new();

        log.resolve(&LogResolution::approved(moderator, Utc::now(), None))
            .unwrap();
        assert_eq!(log.status, LogStatus::Approved);
        assert_eq!(log.resolved_by, Some(moderator));

        let err = log
            .resolve(&LogResolution::rejected(moderator, Utc::now(), "late"))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(log.status, LogStatus::Approved);
    }

    #[test]
    fn revision_notes_are_tagged() {
        let resolution = LogResolution::revision_requested(UserId::new(), Utc::now(), "more photos");
        assert_eq!(resolution.status, LogStatus::Rejected);
        assert_eq!(resolution.notes.as_deref(), Some("revision-requested: more photos"));
    }
}

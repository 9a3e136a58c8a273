//! Moderated resource aggregate (destinations, tours).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jumuiya_auth::OwnedResource;
use jumuiya_core::{Aggregate, AggregateRoot, DomainError, DomainResult, ResourceId, UserId};
use jumuiya_events::Event;

use crate::status::{ContentKey, ContentType, ModerationStatus};

/// # Invariants
/// - `approved_by`/`approved_at` are set only while `approved`.
/// - `rejection_reason` is set only while `rejected`.
/// - `featured` implies `approved`.
/// - Only the creator submits, and only from `draft`; rejected content is
///   reset to draft before it can be resubmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeratedResource {
    pub id: ResourceId,
    pub content_type: ContentType,
    pub created_by: Option<UserId>,
    pub status: ModerationStatus,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub revision_requested: bool,
    pub submitted_at: Option<DateTime<Utc>>,
    pub featured: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl ModeratedResource {
    /// Uncreated shell; feed it a `Create` command.
    pub fn empty(id: ResourceId, content_type: ContentType) -> Self {
        Self {
            id,
            content_type,
            created_by: None,
            status: ModerationStatus::Draft,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            revision_requested: false,
            submitted_at: None,
            featured: false,
            created_at: None,
            updated_at: None,
            version: 0,
        }
    }

    pub fn key(&self) -> ContentKey {
        ContentKey::new(self.content_type, self.id)
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.created_by == Some(user_id)
    }

    /// Submissions come from the creator only.
    pub fn ensure_submitter(&self, user_id: UserId) -> DomainResult<()> {
        if self.is_owned_by(user_id) {
            Ok(())
        } else {
            Err(DomainError::forbidden(format!(
                "{} {} can only be submitted by its creator",
                self.content_type, self.id
            )))
        }
    }

    fn ensure_status(&self, allowed: &[ModerationStatus], action: &str) -> DomainResult<()> {
        if allowed.contains(&self.status) {
            return Ok(());
        }
        Err(DomainError::conflict(format!(
            "cannot {action} {} {} while it is {}",
            self.content_type, self.id, self.status
        )))
    }
}

impl AggregateRoot for ModeratedResource {
    type Id = ResourceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl OwnedResource for ModeratedResource {
    fn created_by(&self) -> Option<UserId> {
        self.created_by
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum ModerationCommand {
    Create {
        created_by: UserId,
        occurred_at: DateTime<Utc>,
    },
    Submit {
        submitted_by: UserId,
        occurred_at: DateTime<Utc>,
    },
    Approve {
        moderator: UserId,
        occurred_at: DateTime<Utc>,
    },
    Reject {
        moderator: UserId,
        reason: String,
        occurred_at: DateTime<Utc>,
    },
    RequestRevision {
        moderator: UserId,
        notes: String,
        occurred_at: DateTime<Utc>,
    },
    ResetToDraft {
        actor: UserId,
        occurred_at: DateTime<Utc>,
    },
    SetFeatured {
        actor: UserId,
        featured: bool,
        occurred_at: DateTime<Utc>,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCreated {
    pub key: ContentKey,
    pub created_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSubmitted {
    pub key: ContentKey,
    pub submitted_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceApproved {
    pub key: ContentKey,
    pub approved_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRejected {
    pub key: ContentKey,
    pub rejected_by: UserId,
    pub reason: String,
    pub revision_requested: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceResetToDraft {
    pub key: ContentKey,
    pub reset_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedChanged {
    pub key: ContentKey,
    pub changed_by: UserId,
    pub featured: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModerationEvent {
    Created(ResourceCreated),
    Submitted(ResourceSubmitted),
    Approved(ResourceApproved),
    Rejected(ResourceRejected),
    ResetToDraft(ResourceResetToDraft),
    FeaturedChanged(FeaturedChanged),
}

impl ModerationEvent {
    pub fn key(&self) -> ContentKey {
        match self {
            ModerationEvent::Created(e) => e.key,
            ModerationEvent::Submitted(e) => e.key,
            ModerationEvent::Approved(e) => e.key,
            ModerationEvent::Rejected(e) => e.key,
            ModerationEvent::ResetToDraft(e) => e.key,
            ModerationEvent::FeaturedChanged(e) => e.key,
        }
    }
}

impl Event for ModerationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ModerationEvent::Created(_) => "moderation.resource.created",
            ModerationEvent::Submitted(_) => "moderation.resource.submitted",
            ModerationEvent::Approved(_) => "moderation.resource.approved",
            ModerationEvent::Rejected(_) => "moderation.resource.rejected",
            ModerationEvent::ResetToDraft(_) => "moderation.resource.reset_to_draft",
            ModerationEvent::FeaturedChanged(_) => "moderation.resource.featured_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ModerationEvent::Created(e) => e.occurred_at,
            ModerationEvent::Submitted(e) => e.occurred_at,
            ModerationEvent::Approved(e) => e.occurred_at,
            ModerationEvent::Rejected(e) => e.occurred_at,
            ModerationEvent::ResetToDraft(e) => e.occurred_at,
            ModerationEvent::FeaturedChanged(e) => e.occurred_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Aggregate Implementation
// ─────────────────────────────────────────────────────────────────────────────

fn non_empty(text: &str, what: &str) -> DomainResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{what} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

impl Aggregate for ModeratedResource {
    type Command = ModerationCommand;
    type Event = ModerationEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ModerationEvent::Created(e) => {
                self.created_by = Some(e.created_by);
                self.status = ModerationStatus::Draft;
                self.created_at = Some(e.occurred_at);
            }
            ModerationEvent::Submitted(e) => {
                self.status = ModerationStatus::Pending;
                self.submitted_at = Some(e.occurred_at);
                self.rejection_reason = None;
                self.revision_requested = false;
            }
            ModerationEvent::Approved(e) => {
                self.status = ModerationStatus::Approved;
                self.approved_by = Some(e.approved_by);
                self.approved_at = Some(e.occurred_at);
                self.rejection_reason = None;
                self.revision_requested = false;
            }
            ModerationEvent::Rejected(e) => {
                self.status = ModerationStatus::Rejected;
                self.rejection_reason = Some(e.reason.clone());
                self.revision_requested = e.revision_requested;
                self.approved_by = None;
                self.approved_at = None;
                self.featured = false;
            }
            ModerationEvent::ResetToDraft(_) => {
                self.status = ModerationStatus::Draft;
                self.submitted_at = None;
                self.approved_by = None;
                self.approved_at = None;
                self.rejection_reason = None;
                self.revision_requested = false;
                self.featured = false;
            }
            ModerationEvent::FeaturedChanged(e) => {
                self.featured = e.featured;
            }
        }
        self.updated_at = Some(event.occurred_at());
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let key = self.key();
        match command {
            ModerationCommand::Create {
                created_by,
                occurred_at,
            } => {
                if self.version != 0 {
                    return Err(DomainError::conflict(format!("{key} already exists")));
                }
                Ok(vec![ModerationEvent::Created(ResourceCreated {
                    key,
                    created_by: *created_by,
                    occurred_at: *occurred_at,
                })])
            }

            ModerationCommand::Submit {
                submitted_by,
                occurred_at,
            } => {
                self.ensure_submitter(*submitted_by)?;
                self.ensure_status(&[ModerationStatus::Draft], "submit")?;
                Ok(vec![ModerationEvent::Submitted(ResourceSubmitted {
                    key,
                    submitted_by: *submitted_by,
                    occurred_at: *occurred_at,
                })])
            }

            ModerationCommand::Approve {
                moderator,
                occurred_at,
            } => {
                self.ensure_status(&[ModerationStatus::Pending], "approve")?;
                Ok(vec![ModerationEvent::Approved(ResourceApproved {
                    key,
                    approved_by: *moderator,
                    occurred_at: *occurred_at,
                })])
            }

            ModerationCommand::Reject {
                moderator,
                reason,
                occurred_at,
            } => {
                let reason = non_empty(reason, "rejection reason")?;
                self.ensure_status(&[ModerationStatus::Pending], "reject")?;
                Ok(vec![ModerationEvent::Rejected(ResourceRejected {
                    key,
                    rejected_by: *moderator,
                    reason,
                    revision_requested: false,
                    occurred_at: *occurred_at,
                })])
            }

            ModerationCommand::RequestRevision {
                moderator,
                notes,
                occurred_at,
            } => {
                let reason = non_empty(notes, "revision notes")?;
                self.ensure_status(&[ModerationStatus::Pending], "request revision for")?;
                Ok(vec![ModerationEvent::Rejected(ResourceRejected {
                    key,
                    rejected_by: *moderator,
                    reason,
                    revision_requested: true,
                    occurred_at: *occurred_at,
                })])
            }

            ModerationCommand::ResetToDraft { actor, occurred_at } => {
                self.ensure_status(
                    &[ModerationStatus::Rejected, ModerationStatus::Approved],
                    "reset",
                )?;
                Ok(vec![ModerationEvent::ResetToDraft(ResourceResetToDraft {
                    key,
                    reset_by: *actor,
                    occurred_at: *occurred_at,
                })])
            }

            ModerationCommand::SetFeatured {
                actor,
                featured,
                occurred_at,
            } => {
                self.ensure_status(&[ModerationStatus::Approved], "feature")?;
                if self.featured == *featured {
                    return Ok(Vec::new());
                }
                Ok(vec![ModerationEvent::FeaturedChanged(FeaturedChanged {
                    key,
                    changed_by: *actor,
                    featured: *featured,
                    occurred_at: *occurred_at,
                })])
            }
        }
    }
}

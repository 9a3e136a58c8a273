//! Moderation workflow orchestration.
//!
//! Each operation follows the same pipeline:
//!
//! ```text
//! authorize actor
//!   ↓
//! begin transaction, load resource (NotFound)
//!   ↓
//! handle command on the aggregate (pure guards, produces events)
//!   ↓
//! stage resource + log writes, commit atomically
//!   ↓
//! publish events to the bus (after commit; failures are logged only)
//! ```
//!
//! Nothing is written when a guard fails, and a commit either applies the
//! resource and log changes together or not at all.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use jumuiya_auth::permissions::names;
use jumuiya_auth::{AuthUser, Authorizer};
use jumuiya_core::{Aggregate, DomainError, ExpectedVersion, ResourceId};
use jumuiya_events::{EventBus, EventEnvelope};

use crate::error::ModerationError;
use crate::log::{LogResolution, ModerationLog};
use crate::resource::{ModeratedResource, ModerationCommand, ModerationEvent};
use crate::status::{ContentKey, ContentType};
use crate::store::{ModerationStore, ModerationTx};

/// Envelope type published for every committed transition.
pub type ModerationEnvelope = EventEnvelope<ModerationEvent>;

/// `aggregate_type` stamped on published envelopes.
pub const AGGREGATE_TYPE: &str = "moderation.resource";

type Result<T> = core::result::Result<T, ModerationError>;

/// Drives [`ModeratedResource`]s through review.
#[derive(Debug)]
pub struct ModerationWorkflow<S, B> {
    store: S,
    bus: B,
    authorizer: Authorizer,
}

impl<S, B> ModerationWorkflow<S, B> {
    pub fn new(store: S, bus: B, authorizer: Authorizer) -> Self {
        Self {
            store,
            bus,
            authorizer,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn authorizer(&self) -> &Authorizer {
        &self.authorizer
    }

    pub fn into_parts(self) -> (S, B, Authorizer) {
        (self.store, self.bus, self.authorizer)
    }
}

impl<S, B> ModerationWorkflow<S, B>
where
    S: ModerationStore,
    B: EventBus<ModerationEnvelope>,
{
    /// Create a draft owned by `user`. Needs the content type's create permission.
    pub fn create_draft(
        &self,
        user: Option<&AuthUser>,
        content_type: ContentType,
        content_id: ResourceId,
        now: DateTime<Utc>,
    ) -> Result<ModeratedResource> {
        let key = ContentKey::new(content_type, content_id);
        guarded("create_draft", key, || {
            let user = self.authorizer.require(user, content_type.create_permission())?;

            let mut tx = self.store.begin()?;
            if tx.find_resource_by_id(content_type, content_id)?.is_some() {
                return Err(DomainError::conflict(format!("{key} already exists")).into());
            }

            let mut resource = ModeratedResource::empty(content_id, content_type);
            let events = run(
                &mut resource,
                ModerationCommand::Create {
                    created_by: user.id,
                    occurred_at: now,
                },
            )?;
            tx.insert_resource(&resource)?;
            tx.commit()?;

            info!(
                content_type = %content_type,
                content_id = %content_id,
                user_id = %user.id,
                status = %resource.status,
                "draft created"
            );
            self.publish(&resource, events);
            Ok(resource)
        })
    }

    /// Submit a draft for review. Creator only.
    pub fn submit(
        &self,
        user: Option<&AuthUser>,
        key: ContentKey,
        now: DateTime<Utc>,
    ) -> Result<ModerationLog> {
        guarded("submit", key, || {
            let user = user.ok_or(DomainError::Unauthorized)?;

            let mut tx = self.store.begin()?;
            let mut resource = load(&tx, key)?;
            resource.ensure_submitter(user.id)?;
            if let Some(pending) = tx.find_pending_log_for(key.content_type, key.content_id)? {
                return Err(DomainError::conflict(format!(
                    "{key} already has pending moderation log {}",
                    pending.id
                ))
                .into());
            }

            let read_version = resource.version;
            let events = run(
                &mut resource,
                ModerationCommand::Submit {
                    submitted_by: user.id,
                    occurred_at: now,
                },
            )?;
            let log = ModerationLog::pending(key, user.id, now);
            tx.create_log(&log)?;
            tx.update_resource_status(&resource, ExpectedVersion::Exact(read_version))?;
            tx.commit()?;

            info!(
                content_type = %key.content_type,
                content_id = %key.content_id,
                user_id = %user.id,
                log_id = %log.id,
                status = %resource.status,
                "content submitted for moderation"
            );
            self.publish(&resource, events);
            Ok(log)
        })
    }

    pub fn approve(
        &self,
        moderator: Option<&AuthUser>,
        key: ContentKey,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ModeratedResource> {
        guarded("approve", key, || {
            let moderator = self
                .authorizer
                .require(moderator, key.content_type.approval_permission())?;
            let command = ModerationCommand::Approve {
                moderator: moderator.id,
                occurred_at: now,
            };
            let notes = notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty());
            let resolution = LogResolution::approved(moderator.id, now, notes);
            self.resolve(moderator, key, command, resolution)
        })
    }

    /// Reject a pending item. `reason` must not be blank.
    pub fn reject(
        &self,
        moderator: Option<&AuthUser>,
        key: ContentKey,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<ModeratedResource> {
        guarded("reject", key, || {
            let moderator = self
                .authorizer
                .require(moderator, key.content_type.approval_permission())?;
            let command = ModerationCommand::Reject {
                moderator: moderator.id,
                reason: reason.to_string(),
                occurred_at: now,
            };
            let resolution = LogResolution::rejected(moderator.id, now, reason.trim());
            self.resolve(moderator, key, command, resolution)
        })
    }

    /// Reject with the door left open; the log notes carry the revision tag.
    pub fn request_revision(
        &self,
        moderator: Option<&AuthUser>,
        key: ContentKey,
        notes: &str,
        now: DateTime<Utc>,
    ) -> Result<ModeratedResource> {
        guarded("request_revision", key, || {
            let moderator = self
                .authorizer
                .require(moderator, key.content_type.approval_permission())?;
            let command = ModerationCommand::RequestRevision {
                moderator: moderator.id,
                notes: notes.to_string(),
                occurred_at: now,
            };
            let resolution = LogResolution::revision_requested(moderator.id, now, notes.trim());
            self.resolve(moderator, key, command, resolution)
        })
    }

    /// Move a rejected or approved item back to draft. Owner or privileged role.
    pub fn reset_to_draft(
        &self,
        user: Option<&AuthUser>,
        key: ContentKey,
        now: DateTime<Utc>,
    ) -> Result<ModeratedResource> {
        guarded("reset_to_draft", key, || {
            let user = user.ok_or(DomainError::Unauthorized)?;

            let mut tx = self.store.begin()?;
            let mut resource = load(&tx, key)?;
            self.authorizer.require_manage(
                Some(user),
                &resource,
                Some(key.content_type.resource_kind()),
            )?;

            let read_version = resource.version;
            let events = run(
                &mut resource,
                ModerationCommand::ResetToDraft {
                    actor: user.id,
                    occurred_at: now,
                },
            )?;
            tx.update_resource_status(&resource, ExpectedVersion::Exact(read_version))?;
            tx.commit()?;

            info!(
                content_type = %key.content_type,
                content_id = %key.content_id,
                user_id = %user.id,
                status = %resource.status,
                "content reset to draft"
            );
            self.publish(&resource, events);
            Ok(resource)
        })
    }

    /// Toggle `featured` on an approved item. Setting the current value is a no-op.
    pub fn set_featured(
        &self,
        user: Option<&AuthUser>,
        key: ContentKey,
        featured: bool,
        now: DateTime<Utc>,
    ) -> Result<ModeratedResource> {
        guarded("set_featured", key, || {
            let user = self
                .authorizer
                .require(user, key.content_type.feature_permission())?;

            let mut tx = self.store.begin()?;
            let mut resource = load(&tx, key)?;
            let read_version = resource.version;
            let events = run(
                &mut resource,
                ModerationCommand::SetFeatured {
                    actor: user.id,
                    featured,
                    occurred_at: now,
                },
            )?;
            if events.is_empty() {
                return Ok(resource);
            }
            tx.update_resource_status(&resource, ExpectedVersion::Exact(read_version))?;
            tx.commit()?;

            info!(
                content_type = %key.content_type,
                content_id = %key.content_id,
                user_id = %user.id,
                featured,
                "featured flag changed"
            );
            self.publish(&resource, events);
            Ok(resource)
        })
    }

    /// Pending submissions, oldest first.
    pub fn pending_queue(
        &self,
        moderator: Option<&AuthUser>,
        content_type: Option<ContentType>,
    ) -> Result<Vec<ModerationLog>> {
        self.authorizer
            .require(moderator, names::VIEW_MODERATION_QUEUE)
            .inspect_err(|err| debug!(operation = "pending_queue", error = %err, "moderation guard failed"))?;

        let mut queue = self.store.pending_logs(content_type)?;
        sort_oldest_first(&mut queue);
        Ok(queue)
    }

    /// Every log for one item, oldest first. Owner or `view_audit_logs`.
    pub fn history(&self, user: Option<&AuthUser>, key: ContentKey) -> Result<Vec<ModerationLog>> {
        guarded("history", key, || {
            let user = user.ok_or(DomainError::Unauthorized)?;
            let resource = self
                .store
                .resource(key)?
                .ok_or_else(|| DomainError::not_found(key.to_string()))?;

            if !resource.is_owned_by(user.id)
                && !self.authorizer.permits(Some(user), names::VIEW_AUDIT_LOGS)
            {
                return Err(DomainError::forbidden(format!(
                    "missing permission '{}'",
                    names::VIEW_AUDIT_LOGS
                ))
                .into());
            }

            let mut logs = self.store.logs_for(key)?;
            sort_oldest_first(&mut logs);
            Ok(logs)
        })
    }

    /// Shared tail of approve / reject / request revision: the resource and its
    /// pending log change in one commit.
    fn resolve(
        &self,
        moderator: &AuthUser,
        key: ContentKey,
        command: ModerationCommand,
        resolution: LogResolution,
    ) -> Result<ModeratedResource> {
        let mut tx = self.store.begin()?;
        let mut resource = load(&tx, key)?;
        let read_version = resource.version;
        let events = run(&mut resource, command)?;

        let log = tx
            .find_pending_log_for(key.content_type, key.content_id)?
            .ok_or_else(|| DomainError::not_found(format!("pending moderation log for {key}")))?;
        tx.update_log_status(log.id, &resolution)?;
        tx.update_resource_status(&resource, ExpectedVersion::Exact(read_version))?;
        tx.commit()?;

        info!(
            content_type = %key.content_type,
            content_id = %key.content_id,
            user_id = %moderator.id,
            log_id = %log.id,
            status = %resource.status,
            "moderation resolved"
        );
        self.publish(&resource, events);
        Ok(resource)
    }

    fn publish(&self, resource: &ModeratedResource, events: Vec<ModerationEvent>) {
        let first = resource.version + 1 - events.len() as u64;
        for (offset, event) in events.into_iter().enumerate() {
            let envelope = EventEnvelope::new(
                Uuid::now_v7(),
                resource.id,
                AGGREGATE_TYPE,
                first + offset as u64,
                event,
            );
            if let Err(err) = self.bus.publish(envelope) {
                warn!(
                    content_type = %resource.content_type,
                    content_id = %resource.id,
                    error = ?err,
                    "moderation event publication failed"
                );
            }
        }
    }
}

fn guarded<T>(operation: &'static str, key: ContentKey, f: impl FnOnce() -> Result<T>) -> Result<T> {
    f().inspect_err(|err| {
        debug!(
            operation,
            content_type = %key.content_type,
            content_id = %key.content_id,
            kind = ?err.kind(),
            error = %err,
            "moderation guard failed"
        )
    })
}

fn load(tx: &impl ModerationTx, key: ContentKey) -> Result<ModeratedResource> {
    tx.find_resource_by_id(key.content_type, key.content_id)?
        .ok_or_else(|| DomainError::not_found(key.to_string()).into())
}

fn run(resource: &mut ModeratedResource, command: ModerationCommand) -> Result<Vec<ModerationEvent>> {
    let events = resource.handle(&command)?;
    for event in &events {
        resource.apply(event);
    }
    Ok(events)
}

fn sort_oldest_first(logs: &mut [ModerationLog]) {
    logs.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then(a.id.cmp(&b.id)));
}

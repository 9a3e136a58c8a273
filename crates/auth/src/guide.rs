//! Guide verification lifecycle (event-sourced).
//!
//! Drives `guide_status` on a user: a user applies (`unverified → pending`,
//! role becomes `guide`), then staff verify (`pending → verified`) or reject
//! (`pending → unverified`). Snapshots feed the permission resolver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jumuiya_core::{Aggregate, AggregateRoot, DomainError, UserId};
use jumuiya_events::Event;

use crate::permissions::names;
use crate::roles::{KnownRole, Role};
use crate::tables::PermissionTable;
use crate::user::{AuthUser, GuideStatus};

// ─────────────────────────────────────────────────────────────────────────────
// Guide Profile Aggregate
// ─────────────────────────────────────────────────────────────────────────────

/// # Invariants
/// - Only the user themself may apply, and only from `unverified`.
/// - Staff roles cannot apply (it would demote them to `guide`).
/// - Verify/reject require `verify_guides` and a `pending` application.
/// - A rejection always carries a reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideProfile {
    pub user_id: UserId,
    pub role: Option<Role>,
    pub guide_status: GuideStatus,
    pub applied_at: Option<DateTime<Utc>>,
    pub verified_by: Option<UserId>,
    pub verified_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub version: u64,
}

impl GuideProfile {
    /// Start from the user's current authorization record.
    pub fn for_user(user: &AuthUser) -> Self {
        Self {
            user_id: user.id,
            role: user.role.clone(),
            guide_status: user.guide_status,
            applied_at: None,
            verified_by: None,
            verified_at: None,
            rejection_reason: None,
            version: 0,
        }
    }

    /// Authorization view after the applied events.
    pub fn snapshot(&self) -> AuthUser {
        AuthUser {
            id: self.user_id,
            role: self.role.clone(),
            guide_status: self.guide_status,
        }
    }

    fn ensure_pending(&self) -> Result<(), DomainError> {
        if self.guide_status != GuideStatus::Pending {
            return Err(DomainError::conflict(format!(
                "guide application is {}, not pending",
                self.guide_status
            )));
        }
        Ok(())
    }
}

impl AggregateRoot for GuideProfile {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.user_id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ApplyAsGuide {
    pub applicant: AuthUser,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct VerifyGuide {
    pub actor: AuthUser,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RejectGuide {
    pub actor: AuthUser,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum GuideCommand {
    Apply(ApplyAsGuide),
    Verify(VerifyGuide),
    Reject(RejectGuide),
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideApplied {
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideVerified {
    pub user_id: UserId,
    pub verified_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideRejected {
    pub user_id: UserId,
    pub rejected_by: UserId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuideEvent {
    Applied(GuideApplied),
    Verified(GuideVerified),
    Rejected(GuideRejected),
}

impl Event for GuideEvent {
    fn event_type(&self) -> &'static str {
        match self {
            GuideEvent::Applied(_) => "auth.guide.applied",
            GuideEvent::Verified(_) => "auth.guide.verified",
            GuideEvent::Rejected(_) => "auth.guide.rejected",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            GuideEvent::Applied(e) => e.occurred_at,
            GuideEvent::Verified(e) => e.occurred_at,
            GuideEvent::Rejected(e) => e.occurred_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Aggregate Implementation
// ─────────────────────────────────────────────────────────────────────────────

impl Aggregate for GuideProfile {
    type Command = GuideCommand;
    type Event = GuideEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            GuideEvent::Applied(e) => {
                self.role = Some(Role::from(KnownRole::Guide));
                self.guide_status = GuideStatus::Pending;
                self.applied_at = Some(e.occurred_at);
                self.rejection_reason = None;
            }
            GuideEvent::Verified(e) => {
                self.guide_status = GuideStatus::Verified;
                self.verified_by = Some(e.verified_by);
                self.verified_at = Some(e.occurred_at);
            }
            GuideEvent::Rejected(e) => {
                self.guide_status = GuideStatus::Unverified;
                self.rejection_reason = Some(e.reason.clone());
            }
        }
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            GuideCommand::Apply(cmd) => self.handle_apply(cmd),
            GuideCommand::Verify(cmd) => self.handle_verify(cmd),
            GuideCommand::Reject(cmd) => self.handle_reject(cmd),
        }
    }
}

impl GuideProfile {
    fn handle_apply(&self, cmd: &ApplyAsGuide) -> Result<Vec<GuideEvent>, DomainError> {
        if cmd.applicant.id != self.user_id {
            return Err(DomainError::forbidden("cannot apply on behalf of another user"));
        }
        if cmd.applicant.is_privileged() {
            return Err(DomainError::conflict("staff roles cannot apply as guides"));
        }
        if !PermissionTable::global().has_permission(Some(&cmd.applicant), names::APPLY_AS_GUIDE) {
            return Err(DomainError::forbidden(format!(
                "missing permission '{}'",
                names::APPLY_AS_GUIDE
            )));
        }
        if self.guide_status != GuideStatus::Unverified {
            return Err(DomainError::conflict(format!(
                "guide application is already {}",
                self.guide_status
            )));
        }

        Ok(vec![GuideEvent::Applied(GuideApplied {
            user_id: self.user_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_verify(&self, cmd: &VerifyGuide) -> Result<Vec<GuideEvent>, DomainError> {
        ensure_verifier(&cmd.actor)?;
        self.ensure_pending()?;

        Ok(vec![GuideEvent::Verified(GuideVerified {
            user_id: self.user_id,
            verified_by: cmd.actor.id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reject(&self, cmd: &RejectGuide) -> Result<Vec<GuideEvent>, DomainError> {
        ensure_verifier(&cmd.actor)?;

        let reason = cmd.reason.trim();
        if reason.is_empty() {
            return Err(DomainError::validation("rejection reason is required"));
        }
        self.ensure_pending()?;

        Ok(vec![GuideEvent::Rejected(GuideRejected {
            user_id: self.user_id,
            rejected_by: cmd.actor.id,
            reason: reason.to_string(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

fn ensure_verifier(actor: &AuthUser) -> Result<(), DomainError> {
    if PermissionTable::global().has_permission(Some(actor), names::VERIFY_GUIDES) {
        Ok(())
    } else {
        Err(DomainError::forbidden(format!(
            "missing permission '{}'",
            names::VERIFY_GUIDES
        )))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::has_effective_permission;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn run(profile: &mut GuideProfile, cmd: GuideCommand) -> Result<(), DomainError> {
        for event in profile.handle(&cmd)? {
            profile.apply(&event);
        }
        Ok(())
    }

    fn applied(user: &AuthUser) -> GuideProfile {
        let mut profile = GuideProfile::for_user(user);
        run(
            &mut profile,
            GuideCommand::Apply(ApplyAsGuide {
                applicant: user.clone(),
                occurred_at: now(),
            }),
        )
        .unwrap();
        profile
    }

    #[test]
    fn apply_moves_user_to_pending_guide() {
        let user = AuthUser::new(UserId::new(), "user");
        let profile = applied(&user);

        assert_eq!(profile.guide_status, GuideStatus::Pending);
        assert_eq!(profile.snapshot().known_role(), Some(KnownRole::Guide));
        assert_eq!(profile.version, 1);

        // Pending guides keep user-level permissions only.
        assert!(!has_effective_permission(Some(&profile.snapshot()), names::CREATE_TOURS));
    }

    #[test]
    fn cannot_apply_for_someone_else() {
        let user = AuthUser::new(UserId::new(), "user");
        let other = AuthUser::new(UserId::new(), "user");
        let profile = GuideProfile::for_user(&user);

        let err = profile
            .handle(&GuideCommand::Apply(ApplyAsGuide {
                applicant: other,
                occurred_at: now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn staff_cannot_apply() {
        let auditor = AuthUser::new(UserId::new(), "auditor");
        let err = GuideProfile::for_user(&auditor)
            .handle(&GuideCommand::Apply(ApplyAsGuide {
                applicant: auditor.clone(),
                occurred_at: now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn duplicate_application_conflicts() {
        let user = AuthUser::new(UserId::new(), "user");
        let mut profile = applied(&user);
        let applicant = profile.snapshot();

        let err = run(
            &mut profile,
            GuideCommand::Apply(ApplyAsGuide {
                applicant,
                occurred_at: now(),
            }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("already pending"));
    }

    #[test]
    fn auditor_verifies_pending_guide() {
        let user = AuthUser::new(UserId::new(), "user");
        let auditor = AuthUser::new(UserId::new(), "auditor");
        let mut profile = applied(&user);

        run(
            &mut profile,
            GuideCommand::Verify(VerifyGuide {
                actor: auditor.clone(),
                occurred_at: now(),
            }),
        )
        .unwrap();

        assert_eq!(profile.guide_status, GuideStatus::Verified);
        assert_eq!(profile.verified_by, Some(auditor.id));
        assert!(has_effective_permission(Some(&profile.snapshot()), names::CREATE_TOURS));
    }

    #[test]
    fn guides_cannot_verify_each_other() {
        let user = AuthUser::new(UserId::new(), "user");
        let peer = AuthUser::new(UserId::new(), "guide").with_guide_status(GuideStatus::Verified);
        let profile = applied(&user);

        let err = profile
            .handle(&GuideCommand::Verify(VerifyGuide {
                actor: peer,
                occurred_at: now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn rejection_requires_reason_and_resets_status() {
        let user = AuthUser::new(UserId::new(), "user");
        let admin = AuthUser::new(UserId::new(), "admin");
        let mut profile = applied(&user);

        let err = run(
            &mut profile,
            GuideCommand::Reject(RejectGuide {
                actor: admin.clone(),
                reason: "   ".to_string(),
                occurred_at: now(),
            }),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(profile.guide_status, GuideStatus::Pending);

        run(
            &mut profile,
            GuideCommand::Reject(RejectGuide {
                actor: admin,
                reason: "licence expired".to_string(),
                occurred_at: now(),
            }),
        )
        .unwrap();
        assert_eq!(profile.guide_status, GuideStatus::Unverified);
        assert_eq!(profile.rejection_reason.as_deref(), Some("licence expired"));
    }

    #[test]
    fn event_types_are_namespaced() {
        let event = GuideEvent::Applied(GuideApplied {
            user_id: UserId::new(),
            occurred_at: now(),
        });
        assert_eq!(event.event_type(), "auth.guide.applied");
        assert_eq!(event.version(), 1);
    }
}

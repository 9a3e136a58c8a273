//! Persistence boundary for the moderation workflow.
//!
//! Every workflow operation runs inside one [`ModerationTx`]. Writes are
//! staged and become visible together on [`ModerationTx::commit`]; dropping
//! the transaction discards them.

use jumuiya_core::{ExpectedVersion, ModerationLogId, ResourceId};
use thiserror::Error;

use crate::log::{LogResolution, ModerationLog};
use crate::resource::ModeratedResource;
use crate::status::{ContentKey, ContentType};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The stored resource moved past the version the transaction read.
    #[error("concurrency conflict on {key}: expected {expected:?}, found {actual}")]
    Concurrency {
        key: ContentKey,
        expected: ExpectedVersion,
        actual: u64,
    },

    /// A second pending log for the same content.
    #[error("a pending moderation log already exists for {0}")]
    UniqueViolation(ContentKey),

    /// The log was resolved by another transaction.
    #[error("moderation log {0} is already resolved")]
    AlreadyResolved(ModerationLogId),

    #[error("{0} not found")]
    Missing(String),

    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Read side plus the transaction factory.
pub trait ModerationStore: Send + Sync {
    type Tx<'a>: ModerationTx
    where
        Self: 'a;

    fn begin(&self) -> Result<Self::Tx<'_>, StoreError>;

    /// Committed state of one resource.
    fn resource(&self, key: ContentKey) -> Result<Option<ModeratedResource>, StoreError>;

    /// Pending logs, unordered.
    fn pending_logs(&self, content_type: Option<ContentType>) -> Result<Vec<ModerationLog>, StoreError>;

    /// Every log ever written for one content item, unordered.
    fn logs_for(&self, key: ContentKey) -> Result<Vec<ModerationLog>, StoreError>;
}

/// One unit of work. Reads observe this transaction's own staged writes.
pub trait ModerationTx {
    fn find_resource_by_id(
        &self,
        content_type: ContentType,
        id: ResourceId,
    ) -> Result<Option<ModeratedResource>, StoreError>;

    fn find_pending_log_for(
        &self,
        content_type: ContentType,
        content_id: ResourceId,
    ) -> Result<Option<ModerationLog>, StoreError>;

    fn insert_resource(&mut self, resource: &ModeratedResource) -> Result<(), StoreError>;

    fn create_log(&mut self, log: &ModerationLog) -> Result<(), StoreError>;

    /// Stage the new resource state; `expected` is the version it was read at.
    fn update_resource_status(
        &mut self,
        resource: &ModeratedResource,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError>;

    fn update_log_status(
        &mut self,
        log_id: ModerationLogId,
        resolution: &LogResolution,
    ) -> Result<(), StoreError>;

    /// Apply every staged write atomically, or none of them.
    fn commit(self) -> Result<(), StoreError>;
}

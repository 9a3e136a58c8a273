//! `jumuiya-moderation`: content moderation workflow.
//!
//! Submitted destinations and tours move through
//! `draft → pending → {approved, rejected}` and back to `draft` for
//! resubmission. Every transition is authorized through `jumuiya-auth`,
//! decided by the [`ModeratedResource`] aggregate and persisted through a
//! [`ModerationStore`] transaction together with its [`ModerationLog`].

pub mod error;
pub mod in_memory;
pub mod log;
pub mod resource;
pub mod status;
pub mod store;
pub mod workflow;

pub use error::{ErrorKind, ModerationError};
pub use in_memory::InMemoryModerationStore;
pub use log::{LogResolution, ModerationLog, REVISION_REQUESTED_TAG};
pub use resource::{ModeratedResource, ModerationCommand, ModerationEvent};
pub use status::{ContentKey, ContentType, LogStatus, ModerationStatus};
pub use store::{ModerationStore, ModerationTx, StoreError};
pub use workflow::{ModerationEnvelope, ModerationWorkflow};

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use jumuiya_core::{ExpectedVersion, ModerationLogId, ResourceId};

use crate::log::{LogResolution, ModerationLog};
use crate::resource::ModeratedResource;
use crate::status::{ContentKey, ContentType};
use crate::store::{ModerationStore, ModerationTx, StoreError};

#[derive(Debug, Default)]
struct State {
    resources: HashMap<ContentKey, ModeratedResource>,
    logs: BTreeMap<ModerationLogId, ModerationLog>,
    /// Pending log per content item (the uniqueness constraint).
    pending: HashMap<ContentKey, ModerationLogId>,
}

/// In-memory moderation store.
///
/// Intended for tests/dev. Commits are serialized by one write lock, so the
/// version and pending-log checks at commit act like row locks.
#[derive(Debug, Default)]
pub struct InMemoryModerationStore {
    state: RwLock<State>,
}

impl InMemoryModerationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource and its logs read under a single lock.
    pub fn snapshot(
        &self,
        key: ContentKey,
    ) -> Result<(Option<ModeratedResource>, Vec<ModerationLog>), StoreError> {
        let state = self.read()?;
        let resource = state.resources.get(&key).cloned();
        let logs = state.logs.values().filter(|l| l.key() == key).cloned().collect();
        Ok((resource, logs))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

impl ModerationStore for InMemoryModerationStore {
    type Tx<'a> = InMemoryTx<'a>;

    fn begin(&self) -> Result<Self::Tx<'_>, StoreError> {
        Ok(InMemoryTx {
            store: self,
            resources: HashMap::new(),
            new_logs: Vec::new(),
            resolutions: Vec::new(),
        })
    }

    fn resource(&self, key: ContentKey) -> Result<Option<ModeratedResource>, StoreError> {
        Ok(self.read()?.resources.get(&key).cloned())
    }

    fn pending_logs(&self, content_type: Option<ContentType>) -> Result<Vec<ModerationLog>, StoreError> {
        let state = self.read()?;
        Ok(state
            .pending
            .values()
            .filter_map(|id| state.logs.get(id))
            .filter(|l| content_type.is_none_or(|t| l.content_type == t))
            .cloned()
            .collect())
    }

    fn logs_for(&self, key: ContentKey) -> Result<Vec<ModerationLog>, StoreError> {
        let state = self.read()?;
        Ok(state.logs.values().filter(|l| l.key() == key).cloned().collect())
    }
}

#[derive(Debug)]
struct StagedResource {
    resource: ModeratedResource,
    expected: ExpectedVersion,
    insert: bool,
}

/// Staged writes against an [`InMemoryModerationStore`].
#[derive(Debug)]
pub struct InMemoryTx<'a> {
    store: &'a InMemoryModerationStore,
    resources: HashMap<ContentKey, StagedResource>,
    new_logs: Vec<ModerationLog>,
    resolutions: Vec<(ModerationLogId, LogResolution)>,
}

impl InMemoryTx<'_> {
    fn is_resolved_here(&self, id: ModerationLogId) -> bool {
        self.resolutions.iter().any(|(r, _)| *r == id)
    }
}

impl ModerationTx for InMemoryTx<'_> {
    fn find_resource_by_id(
        &self,
        content_type: ContentType,
        id: ResourceId,
    ) -> Result<Option<ModeratedResource>, StoreError> {
        let key = ContentKey::new(content_type, id);
        if let Some(staged) = self.resources.get(&key) {
            return Ok(Some(staged.resource.clone()));
        }
        self.store.resource(key)
    }

    fn find_pending_log_for(
        &self,
        content_type: ContentType,
        content_id: ResourceId,
    ) -> Result<Option<ModerationLog>, StoreError> {
        let key = ContentKey::new(content_type, content_id);
        if let Some(log) = self
            .new_logs
            .iter()
            .find(|l| l.key() == key && !self.is_resolved_here(l.id))
        {
            return Ok(Some(log.clone()));
        }

        let state = self.store.read()?;
        Ok(state
            .pending
            .get(&key)
            .filter(|id| !self.is_resolved_here(**id))
            .and_then(|id| state.logs.get(id))
            .cloned())
    }

    fn insert_resource(&mut self, resource: &ModeratedResource) -> Result<(), StoreError> {
        let key = resource.key();
        if self.resources.contains_key(&key) {
            return Err(StoreError::Backend(format!("{key} staged twice")));
        }
        self.resources.insert(
            key,
            StagedResource {
                resource: resource.clone(),
                expected: ExpectedVersion::Exact(0),
                insert: true,
            },
        );
        Ok(())
    }

    fn create_log(&mut self, log: &ModerationLog) -> Result<(), StoreError> {
        if self.find_pending_log_for(log.content_type, log.content_id)?.is_some() {
            return Err(StoreError::UniqueViolation(log.key()));
        }
        self.new_logs.push(log.clone());
        Ok(())
    }

    fn update_resource_status(
        &mut self,
        resource: &ModeratedResource,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let key = resource.key();
        match self.resources.get_mut(&key) {
            // Already staged here: keep the first expectation, it is what commit checks.
            Some(staged) => staged.resource = resource.clone(),
            None => {
                self.resources.insert(
                    key,
                    StagedResource {
                        resource: resource.clone(),
                        expected,
                        insert: false,
                    },
                );
            }
        }
        Ok(())
    }

    fn update_log_status(
        &mut self,
        log_id: ModerationLogId,
        resolution: &LogResolution,
    ) -> Result<(), StoreError> {
        if self.is_resolved_here(log_id) {
            return Err(StoreError::AlreadyResolved(log_id));
        }
        self.resolutions.push((log_id, resolution.clone()));
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        let mut state = self
            .store
            .state
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        // Validate everything before the first write.
        for (key, staged) in &self.resources {
            let current = state.resources.get(key);
            if current.is_none() && !staged.insert {
                return Err(StoreError::Missing(key.to_string()));
            }
            let actual = current.map(|r| r.version).unwrap_or(0);
            if !staged.expected.matches(actual) {
                return Err(StoreError::Concurrency {
                    key: *key,
                    expected: staged.expected,
                    actual,
                });
            }
        }

        let mut new_logs = self.new_logs;
        let mut resolved = Vec::with_capacity(self.resolutions.len());
        for (id, resolution) in &self.resolutions {
            if let Some(log) = new_logs.iter_mut().find(|l| l.id == *id) {
                log.resolve(resolution)
                    .map_err(|_| StoreError::AlreadyResolved(*id))?;
                continue;
            }
            let mut log = state
                .logs
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::Missing(format!("moderation log {id}")))?;
            log.resolve(resolution)
                .map_err(|_| StoreError::AlreadyResolved(*id))?;
            resolved.push(log);
        }

        for log in new_logs.iter().filter(|l| l.is_pending()) {
            let key = log.key();
            let freed = state
                .pending
                .get(&key)
                .is_none_or(|existing| resolved.iter().any(|r| r.id == *existing));
            let duplicated = new_logs
                .iter()
                .filter(|l| l.is_pending() && l.key() == key)
                .count()
                > 1;
            if !freed || duplicated {
                return Err(StoreError::UniqueViolation(key));
            }
        }

        for log in resolved {
            state.pending.remove(&log.key());
            state.logs.insert(log.id, log);
        }
        for log in new_logs {
            if log.is_pending() {
                state.pending.insert(log.key(), log.id);
            }
            state.logs.insert(log.id, log);
        }
        for (key, staged) in self.resources {
            state.resources.insert(key, staged.resource);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jumuiya_core::{Aggregate, UserId};

    use crate::resource::ModerationCommand;
    use crate::status::{LogStatus, ModerationStatus};

    fn seeded(store: &InMemoryModerationStore, owner: UserId) -> ModeratedResource {
        let mut resource = ModeratedResource::empty(ResourceId::new(), ContentType::Destination);
        let events = resource
            .handle(&ModerationCommand::Create {
                created_by: owner,
                occurred_at: Utc::now(),
            })
            .unwrap();
        for e in &events {
            resource.apply(e);
        }
        let mut tx = store.begin().unwrap();
        tx.insert_resource(&resource).unwrap();
        tx.commit().unwrap();
        resource
    }

    #[test]
    fn dropped_transaction_applies_nothing() {
        let store = InMemoryModerationStore::new();
        let owner = UserId::new();
        let resource = seeded(&store, owner);

        {
            let mut tx = store.begin().unwrap();
            tx.create_log(&ModerationLog::pending(resource.key(), owner, Utc::now()))
                .unwrap();
            assert!(tx
                .find_pending_log_for(resource.content_type, resource.id)
                .unwrap()
                .is_some());
        }

        assert!(store.logs_for(resource.key()).unwrap().is_empty());
    }

    #[test]
    fn second_pending_log_violates_uniqueness_at_commit() {
        let store = InMemoryModerationStore::new();
        let owner = UserId::new();
        let resource = seeded(&store, owner);

        let mut first = store.begin().unwrap();
        let mut second = store.begin().unwrap();
        first
            .create_log(&ModerationLog::pending(resource.key(), owner, Utc::now()))
            .unwrap();
        second
            .create_log(&ModerationLog::pending(resource.key(), owner, Utc::now()))
            .unwrap();

        first.commit().unwrap();
        assert_eq!(
            second.commit(),
            Err(StoreError::UniqueViolation(resource.key()))
        );
        assert_eq!(store.pending_logs(None).unwrap().len(), 1);
    }

    #[test]
    fn stale_version_rejects_the_whole_commit() {
        let store = InMemoryModerationStore::new();
        let owner = UserId::new();
        let resource = seeded(&store, owner);

        let mut newer = resource.clone();
        newer.status = ModerationStatus::Pending;
        newer.version += 1;

        let mut tx = store.begin().unwrap();
        tx.update_resource_status(&newer, ExpectedVersion::Exact(resource.version))
            .unwrap();
        tx.commit().unwrap();

        let mut stale = store.begin().unwrap();
        stale
            .create_log(&ModerationLog::pending(resource.key(), owner, Utc::now()))
            .unwrap();
        stale
            .update_resource_status(&newer, ExpectedVersion::Exact(resource.version))
            .unwrap();
        assert!(matches!(stale.commit(), Err(StoreError::Concurrency { .. })));

        let (current, logs) = store.snapshot(resource.key()).unwrap();
        assert_eq!(current.unwrap().status, ModerationStatus::Pending);
        assert!(logs.is_empty());
    }

    #[test]
    fn resolving_frees_the_pending_slot() {
        let store = InMemoryModerationStore::new();
        let owner = UserId::new();
        let moderator = UserId::new();
        let resource = seeded(&store, owner);
        let log = ModerationLog::pending(resource.key(), owner, Utc::now());

        let mut tx = store.begin().unwrap();
        tx.create_log(&log).unwrap();
        tx.commit().unwrap();

        let mut tx = store.begin().unwrap();
        tx.update_log_status(log.id, &LogResolution::approved(moderator, Utc::now(), None))
            .unwrap();
        tx.commit().unwrap();

        assert!(store.pending_logs(None).unwrap().is_empty());
        let logs = store.logs_for(resource.key()).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, LogStatus::Approved);

        let mut again = store.begin().unwrap();
        again
            .update_log_status(log.id, &LogResolution::rejected(moderator, Utc::now(), "x"))
            .unwrap();
        assert_eq!(again.commit(), Err(StoreError::AlreadyResolved(log.id)));
    }

    #[test]
    fn updating_unknown_resource_is_missing() {
        let store = InMemoryModerationStore::new();
        let ghost = ModeratedResource::empty(ResourceId::new(), ContentType::Tour);
        let mut tx = store.begin().unwrap();
        tx.update_resource_status(&ghost, ExpectedVersion::Any).unwrap();
        assert!(matches!(tx.commit(), Err(StoreError::Missing(_))));
    }
}

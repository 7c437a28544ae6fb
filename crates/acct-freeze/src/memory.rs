//! # In-Memory Store
//!
//! A [`FreezeStore`] over plain maps, used by tests and local tooling.
//!
//! A transaction takes the store lock for its whole lifetime and works on a
//! private copy of the tables; `commit` swaps the copy in. Transactions are
//! therefore fully serialized, and a dropped transaction leaves no trace.
//!
//! Writes can be made to fail on demand with [`MemoryStore::fail_at`], which
//! is how the all-or-nothing behaviour of the lifecycle is exercised.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use acct_core::{AccountId, ProjectId, UsageLimits};

use crate::account::{Account, AccountStatus, Project};
use crate::error::StoreError;
use crate::event::{EventKey, FreezeEvent, FreezeEvents, FreezeEventsCursor, FreezeEventsPage};
use crate::kind::FreezeKind;
use crate::store::{FreezeStore, FreezeTx};

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    Begin,
    UpdateAccountStatus,
    UpdateAccountLimits,
    UpdateProjectLimits,
    DeleteSessions,
    UpsertEvent,
    DeleteEvent,
    IncrementNotifications,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    accounts: BTreeMap<AccountId, Account>,
    projects: BTreeMap<ProjectId, Project>,
    members: BTreeMap<ProjectId, BTreeSet<AccountId>>,
    sessions: BTreeMap<AccountId, u64>,
    events: BTreeMap<EventKey, FreezeEvent>,
}

type Faults = Arc<parking_lot::Mutex<HashSet<FaultPoint>>>;

fn check(faults: &Faults, point: FaultPoint) -> Result<(), StoreError> {
    if faults.lock().contains(&point) {
        return Err(StoreError::Unavailable(format!("injected fault at {point:?}")));
    }
    Ok(())
}

/// Transactional in-memory store. Cloning shares the tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    faults: Faults,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Fault Injection ─────────────────────────────────────────────

    /// Make every later call at `point` fail with `StoreError::Unavailable`.
    pub fn fail_at(&self, point: FaultPoint) {
        self.faults.lock().insert(point);
    }

    pub fn clear_faults(&self) {
        self.faults.lock().clear();
    }

    // ─── Seeding ─────────────────────────────────────────────────────

    pub async fn insert_account(&self, account: Account) {
        self.tables.lock().await.accounts.insert(account.id, account);
    }

    /// Add a project owned by `owner`. The owner is its first member.
    pub async fn insert_project(&self, owner: AccountId, limits: UsageLimits) -> ProjectId {
        let id = ProjectId::new();
        let mut tables = self.tables.lock().await;
        tables.projects.insert(
            id,
            Project {
                id,
                owner_id: owner,
                limits,
            },
        );
        tables.members.entry(id).or_default().insert(owner);
        id
    }

    pub async fn add_member(&self, project: ProjectId, member: AccountId) {
        self.tables
            .lock()
            .await
            .members
            .entry(project)
            .or_default()
            .insert(member);
    }

    pub async fn add_session(&self, account: AccountId) {
        *self.tables.lock().await.sessions.entry(account).or_default() += 1;
    }

    /// Write an event directly, bypassing the lifecycle.
    pub async fn put_event(&self, event: FreezeEvent) {
        self.tables.lock().await.events.insert(event.key(), event);
    }

    /// Delete an event directly, as a concurrent actor would.
    pub async fn remove_event(&self, account: AccountId, kind: FreezeKind) -> Option<FreezeEvent> {
        self.tables
            .lock()
            .await
            .events
            .remove(&EventKey { account_id: account, kind })
    }

    // ─── Inspection ──────────────────────────────────────────────────

    pub async fn account(&self, id: AccountId) -> Option<Account> {
        self.tables.lock().await.accounts.get(&id).cloned()
    }

    pub async fn project(&self, id: ProjectId) -> Option<Project> {
        self.tables.lock().await.projects.get(&id).cloned()
    }

    pub async fn event(&self, account: AccountId, kind: FreezeKind) -> Option<FreezeEvent> {
        self.tables
            .lock()
            .await
            .events
            .get(&EventKey { account_id: account, kind })
            .cloned()
    }

    pub async fn session_count(&self, account: AccountId) -> u64 {
        self.tables
            .lock()
            .await
            .sessions
            .get(&account)
            .copied()
            .unwrap_or(0)
    }
}

impl FreezeStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        check(&self.faults, FaultPoint::Begin)?;
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let work = guard.clone();
        Ok(MemoryTx {
            guard,
            work,
            faults: Arc::clone(&self.faults),
        })
    }
}

/// A unit of work over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
    faults: Faults,
}

impl MemoryTx {
    fn fault(&self, point: FaultPoint) -> Result<(), StoreError> {
        check(&self.faults, point)
    }

    fn account_mut(&mut self, id: &AccountId) -> Result<&mut Account, StoreError> {
        self.work
            .accounts
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "account",
                id: id.to_string(),
            })
    }
}

impl FreezeTx for MemoryTx {
    async fn account(&mut self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.work.accounts.get(id).cloned())
    }

    async fn update_account_status(
        &mut self,
        id: &AccountId,
        status: AccountStatus,
    ) -> Result<(), StoreError> {
        self.fault(FaultPoint::UpdateAccountStatus)?;
        self.account_mut(id)?.status = status;
        Ok(())
    }

    async fn update_account_limits(
        &mut self,
        id: &AccountId,
        limits: &UsageLimits,
    ) -> Result<(), StoreError> {
        self.fault(FaultPoint::UpdateAccountLimits)?;
        self.account_mut(id)?.limits = *limits;
        Ok(())
    }

    async fn owned_projects(&mut self, owner: &AccountId) -> Result<Vec<Project>, StoreError> {
        Ok(self
            .work
            .projects
            .values()
            .filter(|p| p.owner_id == *owner)
            .cloned()
            .collect())
    }

    async fn update_project_limits(
        &mut self,
        id: &ProjectId,
        limits: &UsageLimits,
    ) -> Result<bool, StoreError> {
        self.fault(FaultPoint::UpdateProjectLimits)?;
        match self.work.projects.get_mut(id) {
            Some(project) => {
                project.limits = *limits;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn shared_project_count(&mut self, owner: &AccountId) -> Result<u64, StoreError> {
        let shared = self
            .work
            .projects
            .values()
            .filter(|p| p.owner_id == *owner)
            .filter(|p| {
                self.work
                    .members
                    .get(&p.id)
                    .is_some_and(|m| m.iter().any(|member| member != owner))
            })
            .count();
        Ok(shared as u64)
    }

    async fn delete_sessions(&mut self, account: &AccountId) -> Result<u64, StoreError> {
        self.fault(FaultPoint::DeleteSessions)?;
        Ok(self.work.sessions.remove(account).unwrap_or(0))
    }

    async fn freeze_event(
        &mut self,
        account: &AccountId,
        kind: FreezeKind,
    ) -> Result<Option<FreezeEvent>, StoreError> {
        Ok(self
            .work
            .events
            .get(&EventKey {
                account_id: *account,
                kind,
            })
            .cloned())
    }

    async fn freeze_events(&mut self, account: &AccountId) -> Result<FreezeEvents, StoreError> {
        Ok(self
            .work
            .events
            .values()
            .filter(|e| e.account_id == *account)
            .cloned()
            .collect())
    }

    async fn upsert_freeze_event(&mut self, event: &FreezeEvent) -> Result<FreezeEvent, StoreError> {
        self.fault(FaultPoint::UpsertEvent)?;
        let mut stored = event.clone();
        if let Some(existing) = self.work.events.get(&event.key()) {
            stored.created_at = existing.created_at;
        }
        self.work.events.insert(stored.key(), stored.clone());
        Ok(stored)
    }

    async fn delete_freeze_event(
        &mut self,
        account: &AccountId,
        kind: FreezeKind,
    ) -> Result<bool, StoreError> {
        self.fault(FaultPoint::DeleteEvent)?;
        Ok(self
            .work
            .events
            .remove(&EventKey {
                account_id: *account,
                kind,
            })
            .is_some())
    }

    async fn list_freeze_events(
        &mut self,
        cursor: &FreezeEventsCursor,
        kinds: Option<&[FreezeKind]>,
    ) -> Result<FreezeEventsPage, StoreError> {
        let limit = cursor.page_size();
        let rows: Vec<FreezeEvent> = self
            .work
            .events
            .iter()
            .filter(|(key, _)| cursor.admits(key))
            .filter(|(key, _)| kinds.map_or(true, |ks| ks.contains(&key.kind)))
            .take(limit + 1)
            .map(|(_, event)| event.clone())
            .collect();
        Ok(FreezeEventsPage::from_overfetch(rows, limit))
    }

    async fn increment_notifications(
        &mut self,
        account: &AccountId,
        kind: FreezeKind,
    ) -> Result<bool, StoreError> {
        self.fault(FaultPoint::IncrementNotifications)?;
        match self.work.events.get_mut(&EventKey {
            account_id: *account,
            kind,
        }) {
            Some(event) => {
                event.notifications_count += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn commit(self) -> Result<(), StoreError> {
        check(&self.faults, FaultPoint::Commit)?;
        let MemoryTx { mut guard, work, .. } = self;
        *guard = work;
        Ok(())
    }
}

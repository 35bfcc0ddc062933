//! Per-account reader/writer locks.
//!
//! Mutations of an account's ledger hold its write lock for the whole
//! retract-then-generate sequence; optimized reads hold the read lock. Locks of
//! different accounts are independent.

use std::{collections::BTreeSet, sync::Arc};

use dashmap::DashMap;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use uuid::Uuid;

#[derive(Debug, Default)]
pub(crate) struct AccountLocks {
    locks: DashMap<Uuid, Arc<RwLock<()>>>,
}

impl AccountLocks {
    fn lock_for(&self, account_id: Uuid) -> Arc<RwLock<()>> {
        self.locks.entry(account_id).or_default().clone()
    }

    pub(crate) async fn read(&self, account_id: Uuid) -> OwnedRwLockReadGuard<()> {
        self.lock_for(account_id).read_owned().await
    }

    /// Write-lock every account in `account_ids`, always in ascending id order
    /// so two writers touching the same pair cannot deadlock.
    pub(crate) async fn write(
        &self,
        account_ids: impl IntoIterator<Item = Uuid>,
    ) -> Vec<OwnedRwLockWriteGuard<()>> {
        let ordered: BTreeSet<Uuid> = account_ids.into_iter().collect();
        let mut guards = Vec::with_capacity(ordered.len());
        for account_id in ordered {
            guards.push(self.lock_for(account_id).write_owned().await);
        }
        guards
    }
}

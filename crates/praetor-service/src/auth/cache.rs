//! Account privilege cache.
//!
//! The cache holds one immutable [`PrivilegeSnapshot`] at a time. A refresh
//! builds a complete new snapshot from the [`PrivilegeSource`] and publishes it
//! with a single swap, so readers see either the old mapping or the new one.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::ServiceResult;

use super::{
    privilege::{AccountPrivileges, PrivilegeKey},
    source::{AccountGrants, PrivilegeSource},
};

/// Account id to privilege set, as of one refresh.
#[derive(Debug, Clone, Default)]
pub struct PrivilegeSnapshot {
    accounts: HashMap<String, AccountPrivileges>,
    generation: u64,
}

impl PrivilegeSnapshot {
    /// Builds a snapshot. Grants for the same account are merged; empty ids are ignored.
    #[must_use]
    pub fn from_grants(grants: impl IntoIterator<Item = AccountGrants>) -> Self {
        let mut accounts: HashMap<String, HashSet<PrivilegeKey>> = HashMap::new();
        for grant in grants {
            if grant.account_id.is_empty() {
                continue;
            }
            accounts
                .entry(grant.account_id)
                .or_default()
                .extend(grant.privileges);
        }

        Self {
            accounts: accounts
                .into_iter()
                .map(|(account_id, privileges)| (account_id, AccountPrivileges::new(privileges)))
                .collect(),
            generation: 0,
        }
    }

    #[must_use]
    pub fn get(&self, account_id: &str) -> Option<&AccountPrivileges> {
        self.accounts.get(account_id)
    }

    #[must_use]
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Number of refreshes completed before this snapshot was published. Zero when never refreshed.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` if both snapshots hold the same accounts with the same privileges.
    #[must_use]
    pub fn same_grants(&self, other: &Self) -> bool {
        self.accounts == other.accounts
    }
}

/// Shared, refreshable account privilege cache.
#[derive(Debug)]
pub struct PrivilegeCache {
    current: watch::Sender<Arc<PrivilegeSnapshot>>,
}

impl Default for PrivilegeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PrivilegeCache {
    /// An empty cache: every lookup is absent until the first refresh.
    #[must_use]
    pub fn new() -> Self {
        let (current, _) = watch::channel(Arc::new(PrivilegeSnapshot::default()));
        Self { current }
    }

    /// ## Summary
    /// Rebuilds the whole mapping from the source and swaps it in.
    ///
    /// ## Errors
    /// Returns the source's error. The previous snapshot stays in place.
    #[tracing::instrument(skip(self, source))]
    pub async fn refresh(&self, source: &dyn PrivilegeSource) -> ServiceResult<()> {
        let grants = source.load_grants().await?;
        let mut snapshot = PrivilegeSnapshot::from_grants(grants);
        let account_count = snapshot.account_count();

        let mut generation = 0;
        self.current.send_modify(|current| {
            generation = current.generation + 1;
            snapshot.generation = generation;
            *current = Arc::new(snapshot);
        });

        tracing::info!(account_count, generation, "Privilege cache refreshed");

        Ok(())
    }

    /// The current snapshot. Holding it does not block refreshes.
    #[must_use]
    pub fn snapshot(&self) -> Arc<PrivilegeSnapshot> {
        Arc::clone(&self.current.borrow())
    }

    /// The privileges of an active account, or `None` for an empty, unknown,
    /// locked or roleless account.
    #[must_use]
    pub fn lookup(&self, account_id: &str) -> Option<AccountPrivileges> {
        if account_id.is_empty() {
            return None;
        }

        self.current.borrow().get(account_id).cloned()
    }

    /// Subscribes to snapshot replacements.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<PrivilegeSnapshot>> {
        self.current.subscribe()
    }
}

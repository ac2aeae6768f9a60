//! Where the privilege cache loads account grants from.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::RwLock;

use praetor_db::db::{DbProvider, query::authorization::load_account_grants};

use crate::error::ServiceResult;

use super::privilege::PrivilegeKey;

/// The privileges one active account holds through its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountGrants {
    pub account_id: String,
    pub privileges: Vec<PrivilegeKey>,
}

/// Read side of the account/role/privilege store.
///
/// Implementations return one entry per account that is not locked and has a
/// role, and nothing for locked or roleless accounts.
pub trait PrivilegeSource: Send + Sync {
    fn load_grants<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = ServiceResult<Vec<AccountGrants>>> + Send + 'a>>;
}

/// Loads grants from the database.
pub struct DatabasePrivilegeSource {
    provider: Arc<dyn DbProvider + Send + Sync>,
}

impl DatabasePrivilegeSource {
    #[must_use]
    pub fn new(provider: Arc<dyn DbProvider + Send + Sync>) -> Self {
        Self { provider }
    }
}

impl PrivilegeSource for DatabasePrivilegeSource {
    #[tracing::instrument(skip(self))]
    fn load_grants<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = ServiceResult<Vec<AccountGrants>>> + Send + 'a>> {
        Box::pin(async move {
            let mut conn = self.provider.get_connection().await?;
            let granted = load_account_grants(&mut conn).await?;

            Ok(granted
                .into_iter()
                .map(|account| AccountGrants {
                    account_id: account.account_id.to_string(),
                    privileges: account.privileges.iter().map(PrivilegeKey::from).collect(),
                })
                .collect())
        })
    }
}

/// An account as held by [`MemoryPrivilegeSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
struct MemoryAccount {
    is_locked: bool,
    role: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    roles: HashMap<String, Vec<PrivilegeKey>>,
    accounts: HashMap<String, MemoryAccount>,
}

/// Accounts and roles kept in memory, filtered the same way the database query is.
///
/// Used for demos and tests that exercise refresh without a database.
#[derive(Debug, Default)]
pub struct MemoryPrivilegeSource {
    state: RwLock<MemoryState>,
}

impl MemoryPrivilegeSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or replaces a role and the privileges it grants.
    pub async fn set_role(&self, role: &str, privileges: impl IntoIterator<Item = PrivilegeKey>) {
        self.state
            .write()
            .await
            .roles
            .insert(role.to_string(), privileges.into_iter().collect());
    }

    /// Deletes a role. Accounts holding it become roleless.
    pub async fn remove_role(&self, role: &str) {
        let mut state = self.state.write().await;
        state.roles.remove(role);
        for account in state.accounts.values_mut() {
            if account.role.as_deref() == Some(role) {
                account.role = None;
            }
        }
    }

    /// Creates or replaces an account.
    pub async fn set_account(&self, account_id: &str, role: Option<&str>, is_locked: bool) {
        self.state.write().await.accounts.insert(
            account_id.to_string(),
            MemoryAccount {
                is_locked,
                role: role.map(str::to_string),
            },
        );
    }
}

impl PrivilegeSource for MemoryPrivilegeSource {
    fn load_grants<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = ServiceResult<Vec<AccountGrants>>> + Send + 'a>> {
        Box::pin(async move {
            let state = self.state.read().await;

            Ok(state
                .accounts
                .iter()
                .filter(|(_, account)| !account.is_locked)
                .filter_map(|(account_id, account)| {
                    let privileges = state.roles.get(account.role.as_deref()?)?;
                    Some(AccountGrants {
                        account_id: account_id.clone(),
                        privileges: privileges.clone(),
                    })
                })
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit_roles() -> PrivilegeKey {
        PrivilegeKey::new(Some("Administration"), "Roles", "Edit")
    }

    #[test_log::test(tokio::test)]
    async fn memory_source_skips_locked_and_roleless_accounts() {
        let source = MemoryPrivilegeSource::new();
        source.set_role("R1", [edit_roles()]).await;
        source.set_role("Empty", Vec::new()).await;
        source.set_account("active", Some("R1"), false).await;
        source.set_account("locked", Some("R1"), true).await;
        source.set_account("roleless", None, false).await;
        source.set_account("nothing-granted", Some("Empty"), false).await;

        let mut grants = source.load_grants().await.expect("load grants");
        grants.sort_by(|a, b| a.account_id.cmp(&b.account_id));

        assert_eq!(
            grants,
            [
                AccountGrants {
                    account_id: "active".to_string(),
                    privileges: vec![edit_roles()],
                },
                AccountGrants {
                    account_id: "nothing-granted".to_string(),
                    privileges: vec![],
                },
            ]
        );
    }

    #[test_log::test(tokio::test)]
    async fn removing_a_role_makes_accounts_roleless() {
        let source = MemoryPrivilegeSource::new();
        source.set_role("R1", [edit_roles()]).await;
        source.set_account("A1", Some("R1"), false).await;

        source.remove_role("R1").await;

        assert!(source.load_grants().await.expect("load grants").is_empty());
    }
}

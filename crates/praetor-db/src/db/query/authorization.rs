//! Queries backing the account privilege cache.

use std::collections::HashMap;

use diesel::prelude::*;
use diesel_async::{RunQueryDsl, scoped_futures::ScopedFutureExt};

use crate::{
    db::{connection::DbConnection, schema},
    error::{DbError, DbResult},
    model::privilege::{NewPrivilege, Privilege},
};

/// Every privilege an active account holds through its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantedAccount {
    pub account_id: uuid::Uuid,
    pub privileges: Vec<Privilege>,
}

/// ## Summary
/// Loads the privileges of every account that is not locked and has a role.
///
/// Accounts whose role grants nothing are returned with an empty privilege list.
/// Locked and roleless accounts are omitted entirely. Accounts and role
/// grants are read from one repeatable-read snapshot, so a role deleted
/// mid-load is either fully present or fully absent.
///
/// ## Errors
/// Returns an error if the transaction or either query fails.
#[tracing::instrument(skip(conn))]
pub async fn load_account_grants(conn: &mut DbConnection<'_>) -> DbResult<Vec<GrantedAccount>> {
    let (accounts, role_privileges) = conn
        .build_transaction()
        .repeatable_read()
        .read_only()
        .run(|conn| {
            async move {
                let accounts: Vec<(uuid::Uuid, uuid::Uuid)> = schema::account::table
                    .filter(schema::account::is_locked.eq(false))
                    .filter(schema::account::role_id.is_not_null())
                    .select((
                        schema::account::id,
                        schema::account::role_id.assume_not_null(),
                    ))
                    .load(conn)
                    .await?;

                let role_privileges: Vec<(uuid::Uuid, Privilege)> = schema::role_privilege::table
                    .inner_join(schema::privilege::table)
                    .select((schema::role_privilege::role_id, Privilege::as_select()))
                    .load(conn)
                    .await?;

                Ok::<_, DbError>((accounts, role_privileges))
            }
            .scope_boxed()
        })
        .await?;

    let mut by_role: HashMap<uuid::Uuid, Vec<Privilege>> = HashMap::new();
    for (role_id, privilege) in role_privileges {
        by_role.entry(role_id).or_default().push(privilege);
    }

    tracing::debug!(
        account_count = accounts.len(),
        role_count = by_role.len(),
        "Loaded account grants"
    );

    Ok(accounts
        .into_iter()
        .map(|(account_id, role_id)| GrantedAccount {
            account_id,
            privileges: by_role.get(&role_id).cloned().unwrap_or_default(),
        })
        .collect())
}

/// ## Summary
/// Inserts the given privileges, skipping triples that already exist.
///
/// Returns the number of rows inserted.
///
/// ## Errors
/// Returns an error if the insert fails.
#[tracing::instrument(skip(conn, privileges), fields(candidate_count = privileges.len()))]
pub async fn sync_privileges(
    conn: &mut DbConnection<'_>,
    privileges: &[NewPrivilege<'_>],
) -> DbResult<usize> {
    if privileges.is_empty() {
        return Ok(0);
    }

    let inserted = diesel::insert_into(schema::privilege::table)
        .values(privileges)
        .on_conflict_do_nothing()
        .execute(conn)
        .await?;

    tracing::info!(inserted, "Privilege table synchronized");

    Ok(inserted)
}

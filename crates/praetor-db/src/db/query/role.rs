//! Role reads and the role mutations that invalidate cached privileges.

use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl, scoped_futures::ScopedFutureExt};

use praetor_core::error::CoreError;

use crate::{
    db::{connection::DbConnection, schema},
    error::{DbError, DbResult},
    model::{
        privilege::Privilege,
        role::{NewRole, NewRolePrivilege, Role, RolePrivilege, RoleWithPrivileges},
    },
};

/// ## Summary
/// Lists every role with its privileges, ordered by title.
///
/// ## Errors
/// Returns an error if a query fails.
#[tracing::instrument(skip(conn))]
pub async fn list_roles(conn: &mut DbConnection<'_>) -> DbResult<Vec<RoleWithPrivileges>> {
    let roles: Vec<Role> = schema::role::table
        .order(schema::role::title.asc())
        .select(Role::as_select())
        .load(conn)
        .await?;

    attach_privileges(conn, roles).await
}

/// ## Summary
/// Finds a single role with its privileges.
///
/// ## Errors
/// Returns an error if a query fails.
#[tracing::instrument(skip(conn))]
pub async fn find_role(
    conn: &mut DbConnection<'_>,
    role_id: uuid::Uuid,
) -> DbResult<Option<RoleWithPrivileges>> {
    let Some(role) = schema::role::table
        .find(role_id)
        .select(Role::as_select())
        .first::<Role>(conn)
        .await
        .optional()?
    else {
        return Ok(None);
    };

    Ok(attach_privileges(conn, vec![role]).await?.pop())
}

async fn attach_privileges(
    conn: &mut DbConnection<'_>,
    roles: Vec<Role>,
) -> DbResult<Vec<RoleWithPrivileges>> {
    let granted: Vec<(RolePrivilege, Privilege)> = RolePrivilege::belonging_to(&roles)
        .inner_join(schema::privilege::table)
        .select((RolePrivilege::as_select(), Privilege::as_select()))
        .load(conn)
        .await?;

    Ok(granted
        .grouped_by(&roles)
        .into_iter()
        .zip(roles)
        .map(|(granted, role)| RoleWithPrivileges {
            role,
            privileges: granted
                .into_iter()
                .map(|(_, privilege)| privilege)
                .collect(),
        })
        .collect())
}

/// ## Summary
/// Creates a role granting the given privileges.
///
/// ## Side Effects
/// Inserts the `role` row and its `role_privilege` rows in one transaction.
///
/// ## Errors
/// Returns an error if the transaction fails, including when the title is
/// taken or a privilege id is unknown.
#[tracing::instrument(skip(conn, privilege_ids), fields(privilege_count = privilege_ids.len()))]
pub async fn create_role<'a>(
    conn: &mut DbConnection<'a>,
    title: &'a str,
    privilege_ids: &[uuid::Uuid],
) -> DbResult<RoleWithPrivileges> {
    let role_id = uuid::Uuid::now_v7();
    let rows: Vec<NewRolePrivilege> = privilege_ids
        .iter()
        .map(|&privilege_id| NewRolePrivilege {
            role_id,
            privilege_id,
        })
        .collect();

    conn.transaction::<_, DbError, _>(|conn| {
        async move {
            let role: Role = diesel::insert_into(schema::role::table)
                .values(NewRole { id: role_id, title })
                .returning(Role::as_returning())
                .get_result(conn)
                .await?;

            if !rows.is_empty() {
                diesel::insert_into(schema::role_privilege::table)
                    .values(&rows)
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .await?;
            }

            Ok(attach_privileges(conn, vec![role])
                .await?
                .pop()
                .ok_or(CoreError::InvariantViolation("created role was not returned"))?)
        }
        .scope_boxed()
    })
    .await
}

/// ## Summary
/// Replaces the privileges granted by a role.
///
/// Returns `false` when the role does not exist.
///
/// ## Side Effects
/// Deletes and re-inserts the role's `role_privilege` rows in one transaction.
///
/// ## Errors
/// Returns an error if the transaction fails, including when a privilege id is unknown.
#[tracing::instrument(skip(conn, privilege_ids), fields(privilege_count = privilege_ids.len()))]
pub async fn replace_role_privileges(
    conn: &mut DbConnection<'_>,
    role_id: uuid::Uuid,
    privilege_ids: &[uuid::Uuid],
) -> DbResult<bool> {
    let rows: Vec<NewRolePrivilege> = privilege_ids
        .iter()
        .map(|&privilege_id| NewRolePrivilege {
            role_id,
            privilege_id,
        })
        .collect();

    conn.transaction::<_, DbError, _>(|conn| {
        async move {
            let updated = diesel::update(schema::role::table.find(role_id))
                .set(schema::role::updated_at.eq(chrono::Utc::now()))
                .execute(conn)
                .await?;
            if updated == 0 {
                return Ok(false);
            }

            diesel::delete(
                schema::role_privilege::table.filter(schema::role_privilege::role_id.eq(role_id)),
            )
            .execute(conn)
            .await?;

            if !rows.is_empty() {
                diesel::insert_into(schema::role_privilege::table)
                    .values(&rows)
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .await?;
            }

            Ok(true)
        }
        .scope_boxed()
    })
    .await
}

/// ## Summary
/// Deletes a role. Accounts holding it become roleless.
///
/// Returns `false` when the role does not exist.
///
/// ## Errors
/// Returns an error if the delete fails.
#[tracing::instrument(skip(conn))]
pub async fn delete_role(conn: &mut DbConnection<'_>, role_id: uuid::Uuid) -> DbResult<bool> {
    let deleted = diesel::delete(schema::role::table.find(role_id))
        .execute(conn)
        .await?;

    Ok(deleted > 0)
}

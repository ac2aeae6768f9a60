use std::sync::Arc;

use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};
use serde::Deserialize;
use tracing::error;

use crate::{
    catalog::{ADMINISTRATION_AREA, ROLES_CONTROLLER},
    db_handler::get_db_from_depot,
    error::{AppResult, render_error},
    middleware::authorize::RequireAction,
};
use praetor_db::{
    db::{
        DbProvider,
        connection::DbConnection,
        query::role::{create_role, delete_role, find_role, list_roles, replace_role_privileges},
    },
    error::DbResult,
    model::role::RoleWithPrivileges,
};
use praetor_service::auth::get_authorizer_from_depot;

/// ## Summary
/// Create role request payload
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub title: String,
    #[serde(default)]
    pub privilege_ids: Vec<uuid::Uuid>,
}

/// ## Summary
/// Replace role privileges request payload
#[derive(Debug, Deserialize)]
pub struct ReplacePrivilegesRequest {
    pub privilege_ids: Vec<uuid::Uuid>,
}

fn guard(action: &str) -> RequireAction {
    RequireAction::new(Some(ADMINISTRATION_AREA), ROLES_CONTROLLER, action)
}

fn provider_or_render(depot: &Depot, res: &mut Response) -> Option<Arc<dyn DbProvider + Send + Sync>> {
    match get_db_from_depot(depot) {
        Ok(provider) => Some(provider),
        Err(e) => {
            error!(error = ?e, "Failed to get database provider");
            render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            None
        }
    }
}

async fn connection_or_render<'a>(
    provider: &'a (dyn DbProvider + Send + Sync),
    res: &mut Response,
) -> Option<DbConnection<'a>> {
    match provider.get_connection().await {
        Ok(conn) => Some(conn),
        Err(e) => {
            error!(error = ?e, "Failed to get database connection");
            render_error(res, StatusCode::SERVICE_UNAVAILABLE, "Database unavailable");
            None
        }
    }
}

fn role_id_or_render(req: &Request, res: &mut Response) -> Option<uuid::Uuid> {
    let role_id = req.param::<uuid::Uuid>("id");
    if role_id.is_none() {
        render_error(res, StatusCode::BAD_REQUEST, "Invalid role id");
    }
    role_id
}

/// Role changes only take effect once the cache is reloaded.
async fn refresh_privileges(depot: &Depot) -> AppResult<()> {
    get_authorizer_from_depot(depot)?.refresh().await?;
    Ok(())
}

/// Reloads the privilege cache after a committed role change, rendering 500
/// on failure. The reload checks out its own connection, so callers must not
/// hold one while awaiting it.
async fn refresh_or_render(depot: &Depot, res: &mut Response) -> bool {
    match refresh_privileges(depot).await {
        Ok(()) => true,
        Err(e) => {
            error!(error = ?e, "Role changed but privilege cache refresh failed");
            render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "Failed to refresh privileges");
            false
        }
    }
}

fn render_role(res: &mut Response, role_id: uuid::Uuid, found: DbResult<Option<RoleWithPrivileges>>) {
    match found {
        Ok(Some(role)) => res.render(Json(role)),
        Ok(None) => render_error(res, StatusCode::NOT_FOUND, "Role not found"),
        Err(e) => {
            error!(error = ?e, %role_id, "Failed to load role");
            render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "Failed to load role");
        }
    }
}

/// ## Summary
/// GET /api/administration/roles - List roles with their privileges
#[handler]
async fn list_roles_handler(depot: &mut Depot, res: &mut Response) {
    let Some(provider) = provider_or_render(depot, res) else {
        return;
    };
    let Some(mut conn) = connection_or_render(provider.as_ref(), res).await else {
        return;
    };

    match list_roles(&mut conn).await {
        Ok(roles) => res.render(Json(roles)),
        Err(e) => {
            error!(error = ?e, "Failed to list roles");
            render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "Failed to list roles");
        }
    }
}

/// ## Summary
/// GET /api/administration/roles/{id} - One role with its privileges
///
/// Authorized as the role index.
#[handler]
async fn role_details_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(role_id) = role_id_or_render(req, res) else {
        return;
    };
    let Some(provider) = provider_or_render(depot, res) else {
        return;
    };
    let Some(mut conn) = connection_or_render(provider.as_ref(), res).await else {
        return;
    };

    let found = find_role(&mut conn, role_id).await;
    render_role(res, role_id, found);
}

/// ## Summary
/// POST /api/administration/roles - Create a role granting the given privileges
///
/// ## Side Effects
/// Inserts the role and its `role_privilege` rows, then reloads the privilege
/// cache. A new role has no accounts yet, but the reload keeps the cache
/// generation in step with every role write.
///
/// ## Errors
/// Returns HTTP 400 for a malformed body or blank title, 409 for a taken title
/// and 500 if the insert or the cache reload fails.
#[handler]
async fn create_role_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let body: CreateRoleRequest = match req.parse_json().await {
        Ok(body) => body,
        Err(e) => {
            error!(error = ?e, "Failed to parse create role request");
            render_error(res, StatusCode::BAD_REQUEST, "Invalid request body");
            return;
        }
    };

    let title = body.title.trim();
    if title.is_empty() {
        render_error(res, StatusCode::BAD_REQUEST, "Role title is required");
        return;
    }

    let Some(provider) = provider_or_render(depot, res) else {
        return;
    };

    let created = {
        let Some(mut conn) = connection_or_render(provider.as_ref(), res).await else {
            return;
        };
        create_role(&mut conn, title, &body.privilege_ids).await
    };

    let role = match created {
        Ok(role) => role,
        Err(e) if e.is_unique_violation() => {
            render_error(res, StatusCode::CONFLICT, "Role title already exists");
            return;
        }
        Err(e) => {
            error!(error = ?e, title, "Failed to create role");
            render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "Failed to create role");
            return;
        }
    };

    if !refresh_or_render(depot, res).await {
        return;
    }

    tracing::info!(role_id = %role.role.id, title, "Role created");

    res.status_code(StatusCode::CREATED);
    res.render(Json(role));
}

/// ## Summary
/// PUT /api/administration/roles/{id}/privileges - Replace the privileges a role grants
///
/// ## Side Effects
/// Replaces the role's `role_privilege` rows and reloads the privilege cache.
///
/// ## Errors
/// Returns HTTP 400 for a malformed body, 404 for an unknown role and 500 if
/// the update or the cache reload fails.
#[handler]
async fn replace_privileges_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(role_id) = role_id_or_render(req, res) else {
        return;
    };

    let body: ReplacePrivilegesRequest = match req.parse_json().await {
        Ok(body) => body,
        Err(e) => {
            error!(error = ?e, "Failed to parse replace privileges request");
            render_error(res, StatusCode::BAD_REQUEST, "Invalid request body");
            return;
        }
    };

    let Some(provider) = provider_or_render(depot, res) else {
        return;
    };

    let replaced = {
        let Some(mut conn) = connection_or_render(provider.as_ref(), res).await else {
            return;
        };
        replace_role_privileges(&mut conn, role_id, &body.privilege_ids).await
    };

    match replaced {
        Ok(true) => {}
        Ok(false) => {
            render_error(res, StatusCode::NOT_FOUND, "Role not found");
            return;
        }
        Err(e) => {
            error!(error = ?e, %role_id, "Failed to replace role privileges");
            render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "Failed to update role");
            return;
        }
    }

    if !refresh_or_render(depot, res).await {
        return;
    }

    tracing::info!(%role_id, privilege_count = body.privilege_ids.len(), "Role privileges replaced");

    let Some(mut conn) = connection_or_render(provider.as_ref(), res).await else {
        return;
    };
    let found = find_role(&mut conn, role_id).await;
    render_role(res, role_id, found);
}

/// ## Summary
/// DELETE /api/administration/roles/{id} - Delete a role
///
/// Accounts holding the role become roleless and lose access to everything
/// that is not public once the cache is reloaded, which happens here.
#[handler]
async fn delete_role_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(role_id) = role_id_or_render(req, res) else {
        return;
    };
    let Some(provider) = provider_or_render(depot, res) else {
        return;
    };

    let deleted = {
        let Some(mut conn) = connection_or_render(provider.as_ref(), res).await else {
            return;
        };
        delete_role(&mut conn, role_id).await
    };

    match deleted {
        Ok(true) => {}
        Ok(false) => {
            render_error(res, StatusCode::NOT_FOUND, "Role not found");
            return;
        }
        Err(e) => {
            error!(error = ?e, %role_id, "Failed to delete role");
            render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete role");
            return;
        }
    }

    if !refresh_or_render(depot, res).await {
        return;
    }

    tracing::info!(%role_id, "Role deleted");
    res.status_code(StatusCode::NO_CONTENT);
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("roles")
        .push(Router::new().hoop(guard("Index")).get(list_roles_handler))
        .push(Router::new().hoop(guard("Create")).post(create_role_handler))
        .push(
            Router::with_path("{id}")
                .push(Router::new().hoop(guard("Details")).get(role_details_handler))
                .push(Router::new().hoop(guard("Delete")).delete(delete_role_handler))
                .push(
                    Router::with_path("privileges")
                        .hoop(guard("Edit"))
                        .put(replace_privileges_handler),
                ),
        )
}

//! Handler types served by this application and their authorization tags.
//!
//! Every route is guarded by a [`RequireAction`](crate::middleware::authorize::RequireAction)
//! naming one action declared here.

use praetor_db::{
    db::{DbProvider, query::authorization::sync_privileges},
    model::privilege::NewPrivilege,
};
use praetor_service::{
    auth::{HandlerAction, HandlerCatalog, HandlerType, PolicyError, PolicyResolver, PolicyTag},
    error::ServiceError,
};

use crate::error::AppResult;

pub const ADMINISTRATION_AREA: &str = "Administration";

pub const SYSTEM_CONTROLLER: &str = "System";
pub const HOME_CONTROLLER: &str = "Home";
pub const ROLES_CONTROLLER: &str = "Roles";
pub const AUTHORIZATION_CONTROLLER: &str = "Authorization";

/// The handler types, base types included.
#[must_use]
pub fn handler_types() -> Vec<HandlerType> {
    vec![
        HandlerType::base("ApplicationHandler"),
        HandlerType::base("AdministrationHandler")
            .derives_from("ApplicationHandler")
            .tagged(PolicyTag::RequirePrivilege),
        HandlerType::new("SystemHandler")
            .derives_from("ApplicationHandler")
            .tagged(PolicyTag::AllowAnonymous)
            .action(HandlerAction::new("Healthcheck").read_only()),
        HandlerType::new("HomeHandler")
            .derives_from("ApplicationHandler")
            .tagged(PolicyTag::RequireAuthentication)
            .action(HandlerAction::new("Whoami").read_only()),
        HandlerType::new("RolesHandler")
            .in_area(ADMINISTRATION_AREA)
            .derives_from("AdministrationHandler")
            .action(HandlerAction::new("Index").read_only())
            .action(HandlerAction::new("Details").read_only().authorize_as("Index"))
            .action(HandlerAction::new("Create"))
            .action(HandlerAction::new("Edit"))
            .action(HandlerAction::new("Delete")),
        HandlerType::new("AuthorizationHandler")
            .in_area(ADMINISTRATION_AREA)
            .derives_from("AdministrationHandler")
            .action(HandlerAction::new("Refresh")),
    ]
}

/// ## Summary
/// Builds the policy resolver over [`handler_types`].
///
/// ## Errors
/// Returns a `PolicyError` if the declarations are inconsistent.
pub fn build_resolver() -> Result<PolicyResolver, PolicyError> {
    PolicyResolver::new(HandlerCatalog::new(handler_types())?)
}

/// ## Summary
/// Inserts a privilege row for every privilege-guarded action, so roles can be granted them.
///
/// Existing rows are left untouched. Returns the number of rows inserted.
///
/// ## Errors
/// Returns an error if the catalog does not resolve or the insert fails.
pub async fn seed_privileges(
    provider: &dyn DbProvider,
    resolver: &PolicyResolver,
) -> AppResult<usize> {
    let required = resolver
        .required_privileges()
        .map_err(ServiceError::from)?;

    let rows: Vec<NewPrivilege<'_>> = required
        .iter()
        .map(|key| NewPrivilege {
            id: uuid::Uuid::now_v7(),
            area: key.area(),
            controller: key.controller(),
            action: key.action(),
        })
        .collect();

    let mut conn = provider.get_connection().await?;
    Ok(sync_privileges(&mut conn, &rows).await?)
}

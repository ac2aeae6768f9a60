use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Response, Router, handler};
use serde::Serialize;
use tracing::error;

use crate::{
    catalog::{ADMINISTRATION_AREA, AUTHORIZATION_CONTROLLER},
    error::render_error,
    middleware::authorize::RequireAction,
};
use praetor_service::auth::get_authorizer_from_depot;

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub generation: u64,
    pub account_count: usize,
}

/// ## Summary
/// POST /api/administration/authorization/refresh - Reload the account privilege cache.
///
/// ## Errors
/// Returns HTTP 500 if the privileges cannot be loaded; the previous cache stays in effect.
#[handler]
async fn refresh(depot: &mut Depot, res: &mut Response) {
    let authorizer = match get_authorizer_from_depot(depot) {
        Ok(authorizer) => authorizer,
        Err(e) => {
            error!(error = ?e, "Failed to get authorizer from depot");
            render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            return;
        }
    };

    if let Err(e) = authorizer.refresh().await {
        error!(error = ?e, "Failed to refresh privilege cache");
        render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "Failed to refresh privileges");
        return;
    }

    let snapshot = authorizer.cache().snapshot();
    res.render(Json(RefreshResponse {
        generation: snapshot.generation(),
        account_count: snapshot.account_count(),
    }));
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("authorization/refresh")
        .hoop(RequireAction::new(
            Some(ADMINISTRATION_AREA),
            AUTHORIZATION_CONTROLLER,
            "Refresh",
        ))
        .post(refresh)
}

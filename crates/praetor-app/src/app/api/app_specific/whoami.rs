use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Response, Router, handler};
use serde::Serialize;
use tracing::error;

use crate::{catalog::HOME_CONTROLLER, error::render_error, middleware::authorize::RequireAction};
use praetor_service::auth::{get_authorizer_from_depot, require_account_id_from_depot};

#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub account_id: String,
    pub privileges: Vec<String>,
}

/// ## Summary
/// Returns the caller's account id and the privileges currently cached for it.
#[handler]
async fn whoami(depot: &mut Depot, res: &mut Response) {
    let authorizer = match get_authorizer_from_depot(depot) {
        Ok(authorizer) => authorizer,
        Err(e) => {
            error!(error = ?e, "Failed to get authorizer from depot");
            render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            return;
        }
    };

    let Ok(account_id) = require_account_id_from_depot(depot) else {
        render_error(res, StatusCode::UNAUTHORIZED, "Authentication required");
        return;
    };

    let privileges: Vec<String> = authorizer
        .cache()
        .lookup(account_id)
        .map(|privileges| {
            privileges
                .sorted()
                .iter()
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default();

    res.render(Json(WhoamiResponse {
        account_id: account_id.to_string(),
        privileges,
    }));
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("whoami")
        .hoop(RequireAction::new(None, HOME_CONTROLLER, "Whoami"))
        .get(whoami)
}

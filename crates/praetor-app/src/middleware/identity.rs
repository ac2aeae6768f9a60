use salvo::Depot;
use salvo::http::StatusCode;
use tracing::error;

use crate::{config::get_config_from_depot, error::render_error};
use praetor_service::auth::depot::depot_keys;

/// ## Summary
/// Middleware that records the account id established by the upstream authenticator.
///
/// The id is read from the configured account header. A missing or blank
/// header leaves the request anonymous; rejecting it is left to the
/// authorization check of the route.
///
/// ## Side Effects
/// Inserts the account id into the depot under `depot_keys::ACCOUNT_ID`.
pub struct IdentityMiddleware;

#[salvo::async_trait]
impl salvo::Handler for IdentityMiddleware {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        let config = match get_config_from_depot(depot) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!(error = ?e, "Failed to get config from depot");
                render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
                ctrl.skip_rest();
                return;
            }
        };

        let account_id = req
            .headers()
            .get(config.auth.account_header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        match account_id {
            Some(account_id) => {
                tracing::trace!(account_id, "Request carries an account id");
                depot.insert(depot_keys::ACCOUNT_ID, account_id.to_string());
            }
            None => tracing::trace!("Anonymous request"),
        }
    }
}

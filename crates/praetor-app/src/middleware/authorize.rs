use salvo::Depot;
use salvo::http::StatusCode;
use tracing::error;

use crate::error::render_error;
use praetor_service::auth::{
    ActionReference, Decision, get_account_id_from_depot, get_authorizer_from_depot,
};

/// ## Summary
/// Route guard that lets a request through only if its account may invoke `action`.
///
/// Anonymous requests that are denied get 401, known accounts 403. A route
/// naming an action that does not resolve is a deployment defect and answers 500.
pub struct RequireAction {
    action: ActionReference,
}

impl RequireAction {
    #[must_use]
    pub fn new(area: Option<&str>, controller: &str, action: &str) -> Self {
        Self {
            action: ActionReference::new(area, controller, action),
        }
    }

    #[must_use]
    pub const fn action(&self) -> &ActionReference {
        &self.action
    }
}

#[salvo::async_trait]
impl salvo::Handler for RequireAction {
    #[tracing::instrument(skip(self, _req, depot, res, ctrl), fields(action = %self.action))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        let authorizer = match get_authorizer_from_depot(depot) {
            Ok(authorizer) => authorizer,
            Err(e) => {
                error!(error = ?e, "Failed to get authorizer from depot");
                render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
                ctrl.skip_rest();
                return;
            }
        };

        let account_id = get_account_id_from_depot(depot);

        match authorizer.decide(account_id, &self.action) {
            Ok(Decision::Allowed) => {}
            Ok(Decision::Unauthenticated) => {
                tracing::debug!("Anonymous request denied");
                render_error(res, StatusCode::UNAUTHORIZED, "Authentication required");
                ctrl.skip_rest();
            }
            Ok(Decision::Forbidden) => {
                tracing::warn!(account_id, "Account denied");
                render_error(res, StatusCode::FORBIDDEN, "Forbidden");
                ctrl.skip_rest();
            }
            Err(e) => {
                error!(error = %e, "Route names an action that does not resolve");
                render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
                ctrl.skip_rest();
            }
        }
    }
}

use salvo::{Router, handler};

use crate::{catalog::SYSTEM_CONTROLLER, middleware::authorize::RequireAction};

#[handler]
async fn healthcheck() -> &'static str {
    "OK"
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("healthcheck")
        .hoop(RequireAction::new(None, SYSTEM_CONTROLLER, "Healthcheck"))
        .get(healthcheck)
}

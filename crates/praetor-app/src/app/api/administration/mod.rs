use salvo::Router;

use praetor_core::constants::ADMINISTRATION_ROUTE_COMPONENT;

mod authorization;
mod roles;

#[must_use]
pub fn routes() -> Router {
    Router::with_path(ADMINISTRATION_ROUTE_COMPONENT)
        .push(roles::routes())
        .push(authorization::routes())
}

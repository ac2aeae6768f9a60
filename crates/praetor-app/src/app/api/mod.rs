mod administration;
mod app_specific;


use salvo::Router;

use crate::middleware::identity::IdentityMiddleware;

// Re-export route constants from core
pub use praetor_core::constants::{
    ADMINISTRATION_ROUTE_COMPONENT, ADMINISTRATION_ROUTE_PREFIX, API_ROUTE_COMPONENT,
    API_ROUTE_PREFIX, APP_ROUTE_COMPONENT, APP_ROUTE_PREFIX,
};

/// ## Summary
/// Constructs the API router. Every route carries its own authorization guard.
#[must_use]
pub fn routes() -> Router {
    Router::with_path(API_ROUTE_COMPONENT)
        .hoop(IdentityMiddleware)
        .push(app_specific::routes())
        .push(administration::routes())
}

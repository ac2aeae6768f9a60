//! Depot helpers for carrying authorization context through Salvo requests.

use std::sync::Arc;

use salvo::async_trait;

use crate::error::{ServiceError, ServiceResult};

use super::service::Authorizer;

pub mod depot_keys {
    /// Account id established by the upstream authenticator.
    pub const ACCOUNT_ID: &str = "__account_id";
}

/// Injects the shared [`Authorizer`] into every request's depot.
pub struct AuthorizerHandler {
    pub authorizer: Arc<Authorizer>,
}

#[async_trait]
impl salvo::Handler for AuthorizerHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(Arc::clone(&self.authorizer));
    }
}

/// ## Summary
/// Retrieves the authorizer from the depot.
///
/// ## Errors
/// Returns an error if the authorizer is not found in the depot.
pub fn get_authorizer_from_depot(depot: &salvo::Depot) -> ServiceResult<Arc<Authorizer>> {
    depot
        .obtain::<Arc<Authorizer>>()
        .cloned()
        .map_err(|_err| ServiceError::InvariantViolation("Authorizer not found in depot"))
}

/// The request's account id, or `None` for an anonymous request.
#[must_use]
pub fn get_account_id_from_depot(depot: &salvo::Depot) -> Option<&str> {
    depot
        .get::<String>(depot_keys::ACCOUNT_ID)
        .ok()
        .map(String::as_str)
        .filter(|account_id| !account_id.is_empty())
}

/// ## Summary
/// Retrieves the account id of an authenticated request.
///
/// ## Errors
/// Returns `NotAuthenticated` if the request carries no account id.
pub fn require_account_id_from_depot(depot: &salvo::Depot) -> ServiceResult<&str> {
    get_account_id_from_depot(depot).ok_or(ServiceError::NotAuthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_account_id_is_anonymous() {
        let mut depot = salvo::Depot::new();
        assert_eq!(get_account_id_from_depot(&depot), None);

        depot.insert(depot_keys::ACCOUNT_ID, String::new());
        assert_eq!(get_account_id_from_depot(&depot), None);
        assert!(matches!(
            require_account_id_from_depot(&depot),
            Err(ServiceError::NotAuthenticated)
        ));

        depot.insert(depot_keys::ACCOUNT_ID, "A1".to_string());
        assert_eq!(get_account_id_from_depot(&depot), Some("A1"));
    }

    #[test]
    fn missing_authorizer_is_an_invariant_violation() {
        let depot = salvo::Depot::new();

        assert!(matches!(
            get_authorizer_from_depot(&depot),
            Err(ServiceError::InvariantViolation(_))
        ));
    }
}

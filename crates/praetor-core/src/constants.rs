/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_ROUTE_COMPONENT);

pub const APP_ROUTE_COMPONENT: &str = "app";
pub const APP_ROUTE_PREFIX: &str = const_str::concat!(API_ROUTE_PREFIX, "/", APP_ROUTE_COMPONENT);

pub const ADMINISTRATION_ROUTE_COMPONENT: &str = "administration";
pub const ADMINISTRATION_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", ADMINISTRATION_ROUTE_COMPONENT);

/// Header carrying the account id established by the upstream authenticator.
pub const DEFAULT_ACCOUNT_HEADER: &str = "x-account-id";

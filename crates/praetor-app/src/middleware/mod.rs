pub mod authorize;
pub mod identity;

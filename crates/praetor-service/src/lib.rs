//! Request authorization for Praetor handlers.

pub mod auth;
pub mod error;

//! Persistence for accounts, roles and privileges.

pub mod db;
pub mod error;
pub mod model;

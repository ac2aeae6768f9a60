//! Request authorization.
//!
//! ## Module Organization
//!
//! - `action`: Case-insensitive `area/controller/action` references
//! - `cache`: Account privilege cache with atomic snapshot replacement
//! - `catalog`: Declared handler types, their actions and policy tags
//! - `depot`: Salvo depot integration for the authorizer and account id
//! - `policy`: Policy tags, resolved policies and resolution errors
//! - `privilege`: Privilege keys and per-account privilege sets
//! - `resolver`: Policy resolution, including alias chains
//! - `service`: Centralized authorization service (`Authorizer`)
//! - `source`: Where the cache loads account grants from

pub mod action;
pub mod cache;
pub mod catalog;
pub mod depot;
pub mod policy;
pub mod privilege;
pub mod resolver;
pub mod service;
pub mod source;

// Re-export commonly used types at module level
pub use action::ActionReference;
pub use cache::{PrivilegeCache, PrivilegeSnapshot};
pub use catalog::{HandlerAction, HandlerCatalog, HandlerKind, HandlerType};
pub use depot::{
    AuthorizerHandler, get_account_id_from_depot, get_authorizer_from_depot,
    require_account_id_from_depot,
};
pub use policy::{ActionPolicy, PolicyError, PolicyTag, TerminalPolicy};
pub use privilege::{AccountPrivileges, PrivilegeKey};
pub use resolver::{PolicyResolver, ResolvedPolicy};
pub use service::{Authorizer, Decision};
pub use source::{AccountGrants, DatabasePrivilegeSource, MemoryPrivilegeSource, PrivilegeSource};

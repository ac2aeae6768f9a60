//! Policy tags declared on handlers and the policies they resolve to.

use thiserror::Error;

use super::action::ActionReference;

/// A declarative marker on a handler type or action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyTag {
    /// The action's own (area, controller, action) triple must be granted.
    RequirePrivilege,
    /// Anyone may call, including anonymous requests.
    AllowAnonymous,
    /// Any active account may call.
    RequireAuthentication,
    /// Negation of [`PolicyTag::AllowAnonymous`]; at least an active account is required.
    DenyAnonymous,
}

/// Outcome of resolving one action reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPolicy {
    Public,
    AuthenticatedOnly,
    RequiresPrivilege,
    /// Authorize exactly as another action of the same controller.
    AliasOf(ActionReference),
}

/// A policy at the end of an alias chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalPolicy {
    Public,
    AuthenticatedOnly,
    RequiresPrivilege,
}

impl TerminalPolicy {
    /// The policy declared by a single scope, or `None` if the scope carries no policy tag.
    ///
    /// A privilege tag wins over everything else in the same scope, and denying
    /// anonymous access wins over allowing it.
    #[must_use]
    pub fn from_tags(tags: &[PolicyTag]) -> Option<Self> {
        if tags.contains(&PolicyTag::RequirePrivilege) {
            Some(Self::RequiresPrivilege)
        } else if tags.contains(&PolicyTag::DenyAnonymous) {
            Some(Self::AuthenticatedOnly)
        } else if tags.contains(&PolicyTag::AllowAnonymous) {
            Some(Self::Public)
        } else if tags.contains(&PolicyTag::RequireAuthentication) {
            Some(Self::AuthenticatedOnly)
        } else {
            None
        }
    }
}

impl From<TerminalPolicy> for ActionPolicy {
    fn from(policy: TerminalPolicy) -> Self {
        match policy {
            TerminalPolicy::Public => Self::Public,
            TerminalPolicy::AuthenticatedOnly => Self::AuthenticatedOnly,
            TerminalPolicy::RequiresPrivilege => Self::RequiresPrivilege,
        }
    }
}

/// A mismatch between declared routes and declared policy.
///
/// These are configuration defects. They are surfaced as-is and never
/// defaulted to an allow or deny decision.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("No handler for controller '{controller}' in area {area:?}")]
    HandlerNotFound {
        area: Option<String>,
        controller: String,
    },

    #[error("{count} handlers match controller '{controller}' in area {area:?}")]
    AmbiguousHandler {
        area: Option<String>,
        controller: String,
        count: usize,
    },

    #[error("'{handler}' does not have '{action}' action")]
    ActionNotFound { handler: String, action: String },

    #[error("Authorization alias cycle: {0}")]
    AliasCycle(String),

    #[error("'{handler}' derives from unknown handler type '{base}'")]
    UnknownBaseType { handler: String, base: String },

    #[error("'{handler}' derives from ambiguous handler type '{base}'")]
    AmbiguousBaseType { handler: String, base: String },

    #[error("Inheritance cycle through '{0}'")]
    InheritanceCycle(String),
}

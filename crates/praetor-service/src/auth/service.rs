//! Authorization service for centralized access control.
//!
//! This module provides the single authorization query handlers go through. It
//! combines the resolved action policy with the account privilege cache.

use std::sync::Arc;

use crate::error::ServiceResult;

use super::{
    action::ActionReference,
    cache::PrivilegeCache,
    policy::{PolicyError, TerminalPolicy},
    resolver::PolicyResolver,
    source::PrivilegeSource,
};

/// Result of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Access is allowed.
    Allowed,
    /// Access is denied and the request carried no account id.
    Unauthenticated,
    /// Access is denied for the account the request carried.
    Forbidden,
}

impl Decision {
    /// Returns `true` if access is allowed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Authorization service for checking permissions.
///
/// Owns the policy resolver and the privilege cache. Share it behind an `Arc`;
/// checks and refreshes may run concurrently.
///
/// ## Usage
///
/// ```ignore
/// let authorizer = Authorizer::new(resolver, Arc::new(source));
/// authorizer.refresh().await?;
/// if authorizer.is_authorized_for(Some("A1"), Some("Administration"), "Roles", "Edit")? {
///     // proceed
/// }
/// ```
pub struct Authorizer {
    resolver: PolicyResolver,
    cache: PrivilegeCache,
    source: Arc<dyn PrivilegeSource>,
}

impl Authorizer {
    /// Create an authorizer with an empty cache. Call [`Authorizer::refresh`] before serving.
    #[must_use]
    pub fn new(resolver: PolicyResolver, source: Arc<dyn PrivilegeSource>) -> Self {
        Self {
            resolver,
            cache: PrivilegeCache::new(),
            source,
        }
    }

    #[must_use]
    pub const fn resolver(&self) -> &PolicyResolver {
        &self.resolver
    }

    #[must_use]
    pub const fn cache(&self) -> &PrivilegeCache {
        &self.cache
    }

    /// ## Summary
    /// Reloads every account's privileges from the source.
    ///
    /// Call at startup and after any change to roles, privileges or account
    /// role assignments.
    ///
    /// ## Errors
    /// Returns the source's error; the previous cache contents stay in effect.
    pub async fn refresh(&self) -> ServiceResult<()> {
        self.cache.refresh(self.source.as_ref()).await
    }

    /// ## Summary
    /// Decides whether an account may invoke an action.
    ///
    /// 1. Resolve the action's policy, following aliases.
    /// 2. Public actions are allowed for everyone.
    /// 3. Otherwise the account must be in the cache (active, with a role).
    /// 4. Privilege-guarded actions additionally need the terminal action's
    ///    own triple in the account's privilege set.
    ///
    /// ## Errors
    /// Returns a `PolicyError` if the reference does not resolve; this is a
    /// configuration defect, not a denial.
    pub fn decide(
        &self,
        account_id: Option<&str>,
        reference: &ActionReference,
    ) -> Result<Decision, PolicyError> {
        let resolved = self.resolver.resolve_terminal(reference)?;

        if resolved.policy == TerminalPolicy::Public {
            return Ok(Decision::Allowed);
        }

        let account_id = account_id.filter(|id| !id.is_empty());
        let Some(privileges) = account_id.and_then(|id| self.cache.lookup(id)) else {
            tracing::debug!(
                action = %reference,
                authenticated = account_id.is_some(),
                "Account not in privilege cache"
            );
            return Ok(if account_id.is_some() {
                Decision::Forbidden
            } else {
                Decision::Unauthenticated
            });
        };

        let allowed = match resolved.policy {
            TerminalPolicy::Public | TerminalPolicy::AuthenticatedOnly => true,
            TerminalPolicy::RequiresPrivilege => privileges.permits(&resolved.reference),
        };

        tracing::debug!(
            action = %reference,
            authorized_as = %resolved.reference,
            policy = ?resolved.policy,
            allowed,
            "Authorization decided"
        );

        Ok(if allowed {
            Decision::Allowed
        } else {
            Decision::Forbidden
        })
    }

    /// ## Summary
    /// Returns `true` if the account may invoke `area/controller/action`.
    ///
    /// An empty or absent area means no area. All names compare case-insensitively.
    ///
    /// ## Errors
    /// Returns a `PolicyError` if the action reference does not resolve.
    pub fn is_authorized_for(
        &self,
        account_id: Option<&str>,
        area: Option<&str>,
        controller: &str,
        action: &str,
    ) -> Result<bool, PolicyError> {
        let reference = ActionReference::new(area, controller, action);
        Ok(self.decide(account_id, &reference)?.is_allowed())
    }
}

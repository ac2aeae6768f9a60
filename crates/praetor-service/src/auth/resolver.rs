//! Maps action references to authorization policies.

use std::collections::{BTreeSet, HashSet};

use super::{
    action::ActionReference,
    catalog::HandlerCatalog,
    policy::{ActionPolicy, PolicyError, TerminalPolicy},
    privilege::PrivilegeKey,
};

/// A policy with its alias chain fully followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPolicy {
    /// The action whose policy applies, after following aliases.
    pub reference: ActionReference,
    pub policy: TerminalPolicy,
}

/// Resolves policies against an immutable [`HandlerCatalog`].
#[derive(Debug)]
pub struct PolicyResolver {
    catalog: HandlerCatalog,
}

impl PolicyResolver {
    /// ## Summary
    /// Creates a resolver and checks that every addressable action resolves.
    ///
    /// ## Errors
    /// Returns the first configuration defect found: an alias pointing at a
    /// missing action (`ActionNotFound`) or an alias chain that loops
    /// (`AliasCycle`).
    pub fn new(catalog: HandlerCatalog) -> Result<Self, PolicyError> {
        let resolver = Self { catalog };

        for reference in resolver.catalog.addressable_actions() {
            resolver.resolve_terminal(&reference)?;
        }

        Ok(resolver)
    }

    #[must_use]
    pub const fn catalog(&self) -> &HandlerCatalog {
        &self.catalog
    }

    /// ## Summary
    /// Resolves one step: the policy declared for the referenced action.
    ///
    /// The action's own tags are checked first, then the handler type's, then
    /// each base type's, nearest first. The first scope carrying any policy tag
    /// decides. An action with no tag anywhere is public.
    ///
    /// ## Errors
    /// Returns `HandlerNotFound`, `AmbiguousHandler` or `ActionNotFound` if the
    /// reference does not name exactly one declared action.
    pub fn resolve(&self, reference: &ActionReference) -> Result<ActionPolicy, PolicyError> {
        let handler = self
            .catalog
            .find_handler(reference.area(), reference.controller())?;
        let action = self.catalog.find_action(handler, reference.action())?;

        if let Some(target) = action.alias_target() {
            return Ok(ActionPolicy::AliasOf(reference.with_action(target)));
        }

        let policy = TerminalPolicy::from_tags(action.tags())
            .or_else(|| {
                self.catalog
                    .lineage(handler)
                    .find_map(|handler| TerminalPolicy::from_tags(handler.tags()))
            })
            .unwrap_or(TerminalPolicy::Public);

        tracing::trace!(
            action = %reference,
            handler = self.catalog.handler(handler).name(),
            policy = ?policy,
            "Resolved action policy"
        );

        Ok(policy.into())
    }

    /// ## Summary
    /// Resolves a reference and follows aliases until a non-alias policy.
    ///
    /// ## Errors
    /// Returns any `resolve` error for a link of the chain, or `AliasCycle` if
    /// the chain revisits an action.
    pub fn resolve_terminal(
        &self,
        reference: &ActionReference,
    ) -> Result<ResolvedPolicy, PolicyError> {
        let mut current = reference.clone();
        let mut chain = vec![current.to_string()];
        let mut visited = HashSet::from([PrivilegeKey::from(&current)]);

        loop {
            let policy = match self.resolve(&current)? {
                ActionPolicy::AliasOf(target) => {
                    chain.push(target.to_string());
                    if !visited.insert(PrivilegeKey::from(&target)) {
                        return Err(PolicyError::AliasCycle(chain.join(" -> ")));
                    }
                    current = target;
                    continue;
                }
                ActionPolicy::Public => TerminalPolicy::Public,
                ActionPolicy::AuthenticatedOnly => TerminalPolicy::AuthenticatedOnly,
                ActionPolicy::RequiresPrivilege => TerminalPolicy::RequiresPrivilege,
            };

            return Ok(ResolvedPolicy {
                reference: current,
                policy,
            });
        }
    }

    /// ## Summary
    /// Every privilege some addressable action requires, sorted.
    ///
    /// Aliased actions are skipped; the privilege of their target is listed
    /// under the target.
    ///
    /// ## Errors
    /// Returns a resolution error if the catalog references missing actions.
    pub fn required_privileges(&self) -> Result<Vec<PrivilegeKey>, PolicyError> {
        let mut required = BTreeSet::new();

        for reference in self.catalog.addressable_actions() {
            if self.resolve(&reference)? == ActionPolicy::RequiresPrivilege {
                required.insert(PrivilegeKey::from(&reference));
            }
        }

        Ok(required.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::catalog::{HandlerAction, HandlerType};
    use crate::auth::policy::PolicyTag;

    fn resolver() -> PolicyResolver {
        let catalog = HandlerCatalog::new([
            HandlerType::base("ApplicationHandler"),
            HandlerType::base("AdministrationHandler")
                .derives_from("ApplicationHandler")
                .tagged(PolicyTag::RequirePrivilege),
            HandlerType::new("HomeHandler")
                .derives_from("ApplicationHandler")
                .tagged(PolicyTag::RequireAuthentication)
                .action(HandlerAction::new("Index").read_only())
                .action(
                    HandlerAction::new("About")
                        .read_only()
                        .tagged(PolicyTag::AllowAnonymous),
                ),
            HandlerType::base("StatusHandler")
                .derives_from("ApplicationHandler")
                .action(
                    HandlerAction::new("Ping")
                        .read_only()
                        .tagged(PolicyTag::RequireAuthentication),
                )
                .action(HandlerAction::new("Version").read_only()),
            HandlerType::new("SystemHandler")
                .derives_from("StatusHandler")
                .tagged(PolicyTag::AllowAnonymous)
                .action(HandlerAction::new("Status").read_only().authorize_as("Ping")),
            HandlerType::new("AuthHandler")
                .derives_from("ApplicationHandler")
                .action(HandlerAction::new("Login").read_only()),
            HandlerType::new("ProfileHandler")
                .derives_from("ApplicationHandler")
                .tagged(PolicyTag::AllowAnonymous)
                .action(HandlerAction::new("Edit").tagged(PolicyTag::DenyAnonymous)),
            HandlerType::new("RolesHandler")
                .in_area("Administration")
                .derives_from("AdministrationHandler")
                .action(HandlerAction::new("Index").read_only())
                .action(HandlerAction::new("Details").read_only().authorize_as("Index"))
                .action(HandlerAction::new("Preview").read_only().authorize_as("Details"))
                .action(HandlerAction::new("Edit").read_only().authorize_as("Edit"))
                .action(
                    HandlerAction::new("Help")
                        .read_only()
                        .tagged(PolicyTag::AllowAnonymous),
                ),
        ])
        .unwrap();

        PolicyResolver::new(catalog).unwrap()
    }

    fn roles(action: &str) -> ActionReference {
        ActionReference::new(Some("Administration"), "Roles", action)
    }

    #[test]
    fn action_tag_wins_over_type_tag() {
        let resolver = resolver();

        assert_eq!(
            resolver.resolve(&ActionReference::new(None, "Home", "About")),
            Ok(ActionPolicy::Public)
        );
        assert_eq!(
            resolver.resolve(&ActionReference::new(None, "Profile", "Edit")),
            Ok(ActionPolicy::AuthenticatedOnly)
        );
    }

    #[test]
    fn type_tag_applies_to_untagged_actions() {
        assert_eq!(
            resolver().resolve(&ActionReference::new(None, "Home", "Index")),
            Ok(ActionPolicy::AuthenticatedOnly)
        );
    }

    #[test]
    fn ancestor_tag_applies_when_type_is_untagged() {
        assert_eq!(
            resolver().resolve(&roles("Index")),
            Ok(ActionPolicy::RequiresPrivilege)
        );
    }

    #[test]
    fn untagged_everywhere_is_public() {
        assert_eq!(
            resolver().resolve(&ActionReference::new(None, "Auth", "Login")),
            Ok(ActionPolicy::Public)
        );
    }

    #[test]
    fn inherited_action_keeps_its_own_tag() {
        assert_eq!(
            resolver().resolve(&ActionReference::new(None, "System", "Ping")),
            Ok(ActionPolicy::AuthenticatedOnly)
        );
    }

    #[test]
    fn inherited_untagged_action_takes_derived_type_tag() {
        assert_eq!(
            resolver().resolve(&ActionReference::new(None, "system", "version")),
            Ok(ActionPolicy::Public)
        );
    }

    #[test]
    fn alias_may_target_inherited_action() {
        let terminal = resolver()
            .resolve_terminal(&ActionReference::new(None, "System", "Status"))
            .unwrap();

        assert_eq!(terminal.policy, TerminalPolicy::AuthenticatedOnly);
        assert_eq!(terminal.reference.action(), "Ping");
    }

    #[test]
    fn alias_resolves_one_step_at_a_time() {
        let resolver = resolver();

        assert_eq!(
            resolver.resolve(&roles("Preview")),
            Ok(ActionPolicy::AliasOf(roles("Details")))
        );
        assert_eq!(
            resolver.resolve(&roles("Details")),
            Ok(ActionPolicy::AliasOf(roles("Index")))
        );
    }

    #[test]
    fn alias_chain_is_transitive() {
        let resolver = resolver();

        let via_chain = resolver.resolve_terminal(&roles("preview")).unwrap();
        let direct = resolver.resolve_terminal(&roles("Index")).unwrap();

        assert_eq!(via_chain, direct);
        assert_eq!(via_chain.policy, TerminalPolicy::RequiresPrivilege);
        assert_eq!(via_chain.reference.action(), "Index");
    }

    #[test]
    fn self_alias_is_ignored() {
        assert_eq!(
            resolver().resolve(&roles("Edit")),
            Ok(ActionPolicy::RequiresPrivilege)
        );
    }

    #[test]
    fn resolution_is_case_insensitive() {
        let resolver = resolver();

        assert_eq!(
            resolver.resolve(&ActionReference::new(Some("ADMINISTRATION"), "ROLES", "HELP")),
            resolver.resolve(&roles("help"))
        );
    }

    #[test]
    fn unknown_action_is_an_error() {
        assert_eq!(
            resolver().resolve(&roles("Purge")),
            Err(PolicyError::ActionNotFound {
                handler: "RolesHandler".to_string(),
                action: "Purge".to_string(),
            })
        );
    }

    #[test]
    fn unknown_controller_is_an_error() {
        assert!(matches!(
            resolver().resolve(&ActionReference::new(None, "Roles", "Index")),
            Err(PolicyError::HandlerNotFound { .. })
        ));
    }

    #[test]
    fn alias_cycle_is_rejected_at_construction() {
        let catalog = HandlerCatalog::new([HandlerType::new("LoopHandler")
            .action(HandlerAction::new("A").authorize_as("B"))
            .action(HandlerAction::new("B").authorize_as("C"))
            .action(HandlerAction::new("C").authorize_as("a"))])
        .unwrap();

        assert!(matches!(
            PolicyResolver::new(catalog),
            Err(PolicyError::AliasCycle(_))
        ));
    }

    #[test]
    fn dangling_alias_is_rejected_at_construction() {
        let catalog = HandlerCatalog::new([
            HandlerType::new("RolesHandler").action(HandlerAction::new("Details").authorize_as("Index"))
        ])
        .unwrap();

        assert_eq!(
            PolicyResolver::new(catalog).err(),
            Some(PolicyError::ActionNotFound {
                handler: "RolesHandler".to_string(),
                action: "Index".to_string(),
            })
        );
    }

    #[test]
    fn required_privileges_skip_aliases_and_public_actions() {
        let required = resolver().required_privileges().unwrap();

        assert_eq!(
            required,
            [
                PrivilegeKey::new(Some("Administration"), "Roles", "Edit"),
                PrivilegeKey::new(Some("Administration"), "Roles", "Index"),
            ]
        );
    }
}

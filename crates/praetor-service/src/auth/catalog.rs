//! The handler catalog: every handler type and action the application declares,
//! with the policy tags attached to each.
//!
//! The catalog is built once at startup and is immutable afterwards. Handler
//! types may derive from other catalog types; the chain is walked when an
//! action carries no policy tag of its own.

use std::collections::{HashMap, HashSet};

use super::{
    action::{ActionReference, normalize_area},
    policy::{PolicyError, PolicyTag},
};

/// Suffix every addressable handler type name carries after its controller name.
pub const HANDLER_SUFFIX: &str = "Handler";

/// Whether a handler type can be addressed by requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Addressable by (area, controller).
    Concrete,
    /// Only contributes type-level tags to the types deriving from it.
    Base,
}

/// One entry point of a handler type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerAction {
    name: String,
    action_name: Option<String>,
    read_only: bool,
    tags: Vec<PolicyTag>,
    authorize_as: Option<String>,
}

impl HandlerAction {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            action_name: None,
            read_only: false,
            tags: Vec::new(),
            authorize_as: None,
        }
    }

    /// Marks the action as a read-only query entry point.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Routes the action under a different name than its member name.
    #[must_use]
    pub fn named(mut self, action_name: &str) -> Self {
        self.action_name = Some(action_name.to_string());
        self
    }

    #[must_use]
    pub fn tagged(mut self, tag: PolicyTag) -> Self {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// Authorizes the action exactly as `action` of the same controller.
    #[must_use]
    pub fn authorize_as(mut self, action: &str) -> Self {
        self.authorize_as = Some(action.to_string());
        self
    }

    /// The member name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name requests address this action by.
    #[must_use]
    pub fn action_name(&self) -> &str {
        self.action_name.as_deref().unwrap_or(&self.name)
    }

    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    #[must_use]
    pub fn tags(&self) -> &[PolicyTag] {
        &self.tags
    }

    /// The alias target, unless the alias points back at this member.
    #[must_use]
    pub fn alias_target(&self) -> Option<&str> {
        self.authorize_as
            .as_deref()
            .filter(|target| !super::action::names_match(target, &self.name))
    }
}

/// A named group of actions, optionally inside an area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerType {
    name: String,
    area: Option<String>,
    base: Option<String>,
    kind: HandlerKind,
    tags: Vec<PolicyTag>,
    actions: Vec<HandlerAction>,
}

impl HandlerType {
    /// An addressable handler type. The name is the controller name plus [`HANDLER_SUFFIX`].
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            area: None,
            base: None,
            kind: HandlerKind::Concrete,
            tags: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// A type that is never addressed directly but shares tags with derived types.
    #[must_use]
    pub fn base(name: &str) -> Self {
        Self {
            kind: HandlerKind::Base,
            ..Self::new(name)
        }
    }

    #[must_use]
    pub fn in_area(mut self, area: &str) -> Self {
        self.area = normalize_area(Some(area)).map(str::to_string);
        self
    }

    #[must_use]
    pub fn derives_from(mut self, base: &str) -> Self {
        self.base = Some(base.to_string());
        self
    }

    #[must_use]
    pub fn tagged(mut self, tag: PolicyTag) -> Self {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    #[must_use]
    pub fn action(mut self, action: HandlerAction) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn area(&self) -> Option<&str> {
        self.area.as_deref()
    }

    #[must_use]
    pub const fn kind(&self) -> HandlerKind {
        self.kind
    }

    #[must_use]
    pub fn tags(&self) -> &[PolicyTag] {
        &self.tags
    }

    #[must_use]
    pub fn actions(&self) -> &[HandlerAction] {
        &self.actions
    }

    /// The controller name, if the type name ends with [`HANDLER_SUFFIX`].
    #[must_use]
    pub fn controller_name(&self) -> Option<&str> {
        let split = self.name.len().checked_sub(HANDLER_SUFFIX.len())?;
        let controller = self.name.get(..split)?;
        let suffix = self.name.get(split..)?;

        (!controller.is_empty() && suffix.eq_ignore_ascii_case(HANDLER_SUFFIX)).then_some(controller)
    }
}

#[derive(Debug)]
struct CatalogEntry {
    handler: HandlerType,
    base: Option<usize>,
    actions: HashMap<String, Vec<usize>>,
}

/// Immutable index over the application's handler types.
#[derive(Debug)]
pub struct HandlerCatalog {
    entries: Vec<CatalogEntry>,
    by_controller: HashMap<(Option<String>, String), Vec<usize>>,
}

impl HandlerCatalog {
    /// ## Summary
    /// Indexes the handler types and links every type to its base type.
    ///
    /// ## Errors
    /// Returns `UnknownBaseType` or `AmbiguousBaseType` if a base name does not
    /// identify exactly one catalog type, and `InheritanceCycle` if a type
    /// derives from itself.
    pub fn new(handlers: impl IntoIterator<Item = HandlerType>) -> Result<Self, PolicyError> {
        let handlers: Vec<HandlerType> = handlers.into_iter().collect();

        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, handler) in handlers.iter().enumerate() {
            by_name
                .entry(handler.name.to_lowercase())
                .or_default()
                .push(index);
        }

        let mut entries = Vec::with_capacity(handlers.len());
        for handler in handlers {
            let base = match &handler.base {
                None => None,
                Some(base) => match by_name.get(&base.to_lowercase()).map(Vec::as_slice) {
                    Some([index]) => Some(*index),
                    Some([]) | None => {
                        return Err(PolicyError::UnknownBaseType {
                            handler: handler.name.clone(),
                            base: base.clone(),
                        });
                    }
                    Some(_) => {
                        return Err(PolicyError::AmbiguousBaseType {
                            handler: handler.name.clone(),
                            base: base.clone(),
                        });
                    }
                },
            };

            let mut actions: HashMap<String, Vec<usize>> = HashMap::new();
            for (index, action) in handler.actions.iter().enumerate() {
                actions
                    .entry(action.action_name().to_lowercase())
                    .or_default()
                    .push(index);
            }

            entries.push(CatalogEntry {
                handler,
                base,
                actions,
            });
        }

        let mut by_controller: HashMap<(Option<String>, String), Vec<usize>> = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            if entry.handler.kind == HandlerKind::Concrete {
                by_controller
                    .entry((
                        entry.handler.area.as_deref().map(str::to_lowercase),
                        entry.handler.name.to_lowercase(),
                    ))
                    .or_default()
                    .push(index);
            }
        }

        let catalog = Self {
            entries,
            by_controller,
        };
        catalog.check_inheritance()?;

        tracing::debug!(
            handler_count = catalog.entries.len(),
            "Handler catalog built"
        );

        Ok(catalog)
    }

    fn check_inheritance(&self) -> Result<(), PolicyError> {
        for (index, entry) in self.entries.iter().enumerate() {
            let mut seen = HashSet::new();
            let mut current = Some(index);
            while let Some(step) = current {
                if !seen.insert(step) {
                    return Err(PolicyError::InheritanceCycle(entry.handler.name.clone()));
                }
                current = self.entries[step].base;
            }
        }
        Ok(())
    }

    /// Number of handler types, base types included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn handlers(&self) -> impl Iterator<Item = &HandlerType> {
        self.entries.iter().map(|entry| &entry.handler)
    }

    /// ## Summary
    /// Finds the single concrete handler type for a controller in an area.
    ///
    /// ## Errors
    /// Returns `HandlerNotFound` when nothing matches and `AmbiguousHandler`
    /// when more than one type does.
    pub(crate) fn find_handler(
        &self,
        area: Option<&str>,
        controller: &str,
    ) -> Result<usize, PolicyError> {
        let area = normalize_area(area);
        let key = (
            area.map(str::to_lowercase),
            format!("{controller}{HANDLER_SUFFIX}").to_lowercase(),
        );

        match self.by_controller.get(&key).map(Vec::as_slice) {
            Some([index]) => Ok(*index),
            Some([]) | None => Err(PolicyError::HandlerNotFound {
                area: area.map(str::to_string),
                controller: controller.to_string(),
            }),
            Some(matches) => Err(PolicyError::AmbiguousHandler {
                area: area.map(str::to_string),
                controller: controller.to_string(),
                count: matches.len(),
            }),
        }
    }

    pub(crate) fn handler(&self, index: usize) -> &HandlerType {
        &self.entries[index].handler
    }

    /// ## Summary
    /// Finds the action a request name selects within a handler type.
    ///
    /// Actions declared on the handler itself are searched first, then each
    /// base type, nearest first. Within one level, when several members answer
    /// to the same name, the first read-only one wins, otherwise the first
    /// declared.
    ///
    /// ## Errors
    /// Returns `ActionNotFound` if no member in the lineage answers to the name.
    pub(crate) fn find_action(
        &self,
        index: usize,
        action: &str,
    ) -> Result<&HandlerAction, PolicyError> {
        let key = action.to_lowercase();
        std::iter::successors(Some(index), |&current| self.entries[current].base)
            .find_map(|current| self.select_overload(current, &key))
            .ok_or_else(|| PolicyError::ActionNotFound {
                handler: self.entries[index].handler.name.clone(),
                action: action.to_string(),
            })
    }

    fn select_overload(&self, index: usize, key: &str) -> Option<&HandlerAction> {
        let entry = &self.entries[index];
        let candidates: Vec<&HandlerAction> = entry
            .actions
            .get(key)
            .into_iter()
            .flatten()
            .map(|&position| &entry.handler.actions[position])
            .collect();

        candidates
            .iter()
            .find(|candidate| candidate.is_read_only())
            .or_else(|| candidates.first())
            .copied()
    }

    /// The handler type itself, then each base type, nearest first.
    pub(crate) fn lineage(&self, index: usize) -> impl Iterator<Item = &HandlerType> {
        std::iter::successors(Some(index), |&current| self.entries[current].base)
            .map(|current| &self.entries[current].handler)
    }

    /// Every (area, controller, action) a request can name, in declaration
    /// order, own actions before inherited ones.
    pub fn addressable_actions(&self) -> impl Iterator<Item = ActionReference> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.handler.kind == HandlerKind::Concrete)
            .filter_map(|(index, entry)| {
                entry
                    .handler
                    .controller_name()
                    .map(|controller| (index, entry, controller))
            })
            .flat_map(move |(index, entry, controller)| {
                let mut seen = HashSet::new();
                self.lineage(index)
                    .flat_map(|handler| handler.actions.iter())
                    .filter(move |action| seen.insert(action.action_name().to_lowercase()))
                    .map(move |action| {
                        ActionReference::new(
                            entry.handler.area(),
                            controller,
                            action.action_name(),
                        )
                    })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles_handler() -> HandlerType {
        HandlerType::new("RolesHandler")
            .in_area("Administration")
            .action(HandlerAction::new("Index").read_only())
            .action(HandlerAction::new("Delete").read_only())
            .action(HandlerAction::new("DeleteConfirmed").named("Delete"))
    }

    #[test]
    fn controller_name_strips_suffix() {
        assert_eq!(
            HandlerType::new("RolesHandler").controller_name(),
            Some("Roles")
        );
        assert_eq!(
            HandlerType::new("roleshandler").controller_name(),
            Some("roles")
        );
        assert_eq!(HandlerType::new("Handler").controller_name(), None);
        assert_eq!(HandlerType::new("Roles").controller_name(), None);
    }

    #[test]
    fn finds_handler_by_area_and_controller() {
        let catalog = HandlerCatalog::new([
            roles_handler(),
            HandlerType::new("RolesHandler").action(HandlerAction::new("Index")),
        ])
        .unwrap();

        let in_area = catalog.find_handler(Some("ADMINISTRATION"), "roles").unwrap();
        assert_eq!(catalog.handler(in_area).area(), Some("Administration"));

        let without_area = catalog.find_handler(Some(""), "Roles").unwrap();
        assert_eq!(catalog.handler(without_area).area(), None);
    }

    #[test]
    fn missing_and_duplicate_handlers_are_errors() {
        let catalog = HandlerCatalog::new([roles_handler(), roles_handler()]).unwrap();

        assert_eq!(
            catalog.find_handler(Some("Administration"), "Roles"),
            Err(PolicyError::AmbiguousHandler {
                area: Some("Administration".to_string()),
                controller: "Roles".to_string(),
                count: 2,
            })
        );
        assert_eq!(
            catalog.find_handler(None, "Roles"),
            Err(PolicyError::HandlerNotFound {
                area: None,
                controller: "Roles".to_string(),
            })
        );
    }

    #[test]
    fn base_types_are_not_addressable() {
        let catalog = HandlerCatalog::new([
            HandlerType::base("AdministrationHandler").action(HandlerAction::new("Index"))
        ])
        .unwrap();

        assert!(catalog.find_handler(None, "Administration").is_err());
        assert_eq!(catalog.addressable_actions().count(), 0);
    }

    #[test]
    fn overloads_prefer_read_only_member() {
        let catalog = HandlerCatalog::new([roles_handler()]).unwrap();
        let index = catalog.find_handler(Some("Administration"), "Roles").unwrap();

        let delete = catalog.find_action(index, "delete").unwrap();
        assert_eq!(delete.name(), "Delete");
        assert!(delete.is_read_only());
    }

    #[test]
    fn overloads_without_read_only_take_first_declared() {
        let catalog = HandlerCatalog::new([HandlerType::new("AccountsHandler")
            .action(HandlerAction::new("Save"))
            .action(HandlerAction::new("SaveDraft").named("save"))])
        .unwrap();
        let index = catalog.find_handler(None, "Accounts").unwrap();

        assert_eq!(catalog.find_action(index, "SAVE").unwrap().name(), "Save");
    }

    #[test]
    fn action_name_override_hides_member_name() {
        let catalog = HandlerCatalog::new([roles_handler()]).unwrap();
        let index = catalog.find_handler(Some("Administration"), "Roles").unwrap();

        assert_eq!(
            catalog.find_action(index, "DeleteConfirmed"),
            Err(PolicyError::ActionNotFound {
                handler: "RolesHandler".to_string(),
                action: "DeleteConfirmed".to_string(),
            })
        );
    }

    #[test]
    fn lineage_walks_nearest_first() {
        let catalog = HandlerCatalog::new([
            HandlerType::base("BaseHandler"),
            HandlerType::base("AdministrationHandler").derives_from("BaseHandler"),
            roles_handler().derives_from("AdministrationHandler"),
        ])
        .unwrap();
        let index = catalog.find_handler(Some("Administration"), "Roles").unwrap();

        let names: Vec<&str> = catalog.lineage(index).map(HandlerType::name).collect();
        assert_eq!(
            names,
            ["RolesHandler", "AdministrationHandler", "BaseHandler"]
        );
    }

    #[test]
    fn unknown_base_is_rejected() {
        let result = HandlerCatalog::new([roles_handler().derives_from("MissingHandler")]);

        assert_eq!(
            result.err(),
            Some(PolicyError::UnknownBaseType {
                handler: "RolesHandler".to_string(),
                base: "MissingHandler".to_string(),
            })
        );
    }

    #[test]
    fn inheritance_cycle_is_rejected() {
        let result = HandlerCatalog::new([
            HandlerType::base("AHandler").derives_from("BHandler"),
            HandlerType::base("BHandler").derives_from("AHandler"),
        ]);

        assert!(matches!(result, Err(PolicyError::InheritanceCycle(_))));
    }

    #[test]
    fn addressable_actions_deduplicates_overloads() {
        let catalog = HandlerCatalog::new([roles_handler()]).unwrap();

        let actions: Vec<String> = catalog
            .addressable_actions()
            .map(|reference| reference.to_string())
            .collect();
        assert_eq!(
            actions,
            ["Administration/Roles/Index", "Administration/Roles/Delete"]
        );
    }

    #[test]
    fn inherited_actions_are_found_through_base_types() {
        let catalog = HandlerCatalog::new([
            HandlerType::base("BaseHandler").action(HandlerAction::new("Ping")),
            HandlerType::new("HomeHandler")
                .derives_from("BaseHandler")
                .action(HandlerAction::new("Index")),
        ])
        .unwrap();
        let index = catalog.find_handler(None, "Home").unwrap();

        assert_eq!(catalog.find_action(index, "ping").unwrap().name(), "Ping");
        assert_eq!(
            catalog.find_action(index, "Pong"),
            Err(PolicyError::ActionNotFound {
                handler: "HomeHandler".to_string(),
                action: "Pong".to_string(),
            })
        );
    }

    #[test]
    fn own_action_shadows_inherited_one() {
        let catalog = HandlerCatalog::new([
            HandlerType::base("BaseHandler").action(HandlerAction::new("Index").read_only()),
            HandlerType::new("HomeHandler")
                .derives_from("BaseHandler")
                .action(HandlerAction::new("Overview").named("Index")),
        ])
        .unwrap();
        let index = catalog.find_handler(None, "Home").unwrap();

        assert_eq!(
            catalog.find_action(index, "Index").unwrap().name(),
            "Overview"
        );
    }

    #[test]
    fn addressable_actions_include_inherited() {
        let catalog = HandlerCatalog::new([
            HandlerType::base("BaseHandler")
                .action(HandlerAction::new("Ping"))
                .action(HandlerAction::new("Index")),
            HandlerType::new("HomeHandler")
                .derives_from("BaseHandler")
                .action(HandlerAction::new("Index")),
        ])
        .unwrap();

        let actions: Vec<String> = catalog
            .addressable_actions()
            .map(|reference| reference.to_string())
            .collect();
        assert_eq!(actions, ["Home/Index", "Home/Ping"]);
    }

    #[test]
    fn self_alias_is_no_alias() {
        let action = HandlerAction::new("Edit").authorize_as("edit");
        assert_eq!(action.alias_target(), None);

        let action = HandlerAction::new("Details").authorize_as("Index");
        assert_eq!(action.alias_target(), Some("Index"));
    }
}

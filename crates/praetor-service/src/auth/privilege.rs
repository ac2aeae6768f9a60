//! Granted privileges and per-account privilege sets.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use super::action::{ActionReference, normalize_area};

/// A granted (area, controller, action) triple.
///
/// All parts are stored lowercased and an empty area is stored as `None`, so
/// two keys are equal exactly when the triples match case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PrivilegeKey {
    area: Option<String>,
    controller: String,
    action: String,
}

impl PrivilegeKey {
    #[must_use]
    pub fn new(area: Option<&str>, controller: &str, action: &str) -> Self {
        Self {
            area: normalize_area(area).map(str::to_lowercase),
            controller: controller.to_lowercase(),
            action: action.to_lowercase(),
        }
    }

    #[must_use]
    pub fn area(&self) -> Option<&str> {
        self.area.as_deref()
    }

    #[must_use]
    pub fn controller(&self) -> &str {
        &self.controller
    }

    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }
}

impl From<&ActionReference> for PrivilegeKey {
    fn from(reference: &ActionReference) -> Self {
        Self::new(reference.area(), reference.controller(), reference.action())
    }
}

impl From<&praetor_db::model::privilege::Privilege> for PrivilegeKey {
    fn from(privilege: &praetor_db::model::privilege::Privilege) -> Self {
        Self::new(
            privilege.area.as_deref(),
            &privilege.controller,
            &privilege.action,
        )
    }
}

impl std::fmt::Display for PrivilegeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.area {
            Some(area) => write!(f, "{area}/{}/{}", self.controller, self.action),
            None => write!(f, "{}/{}", self.controller, self.action),
        }
    }
}

/// The privileges one account holds through its role.
///
/// An empty set is a real state: the account is active and has a role that
/// grants nothing. Cheap to clone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPrivileges {
    privileges: Arc<HashSet<PrivilegeKey>>,
}

impl AccountPrivileges {
    #[must_use]
    pub fn new(privileges: impl IntoIterator<Item = PrivilegeKey>) -> Self {
        Self {
            privileges: Arc::new(privileges.into_iter().collect::<HashSet<_>>()),
        }
    }

    #[must_use]
    pub fn contains(&self, key: &PrivilegeKey) -> bool {
        self.privileges.contains(key)
    }

    /// Returns `true` if the action's own triple is granted.
    #[must_use]
    pub fn permits(&self, reference: &ActionReference) -> bool {
        self.contains(&PrivilegeKey::from(reference))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.privileges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.privileges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrivilegeKey> {
        self.privileges.iter()
    }

    /// Privileges in a stable order, for display.
    #[must_use]
    pub fn sorted(&self) -> Vec<PrivilegeKey> {
        let mut privileges: Vec<PrivilegeKey> = self.privileges.iter().cloned().collect();
        privileges.sort();
        privileges
    }
}

impl FromIterator<PrivilegeKey> for AccountPrivileges {
    fn from_iter<T: IntoIterator<Item = PrivilegeKey>>(iter: T) -> Self {
        Self::new(iter)
    }
}

//! Action references: the (area, controller, action) address of a handler entry point.

use serde::Serialize;

/// Case-insensitive name comparison used for every catalog and privilege lookup.
pub(crate) fn names_match(left: &str, right: &str) -> bool {
    left.eq_ignore_ascii_case(right) || left.to_lowercase() == right.to_lowercase()
}

/// Folds an empty area into "no area".
pub(crate) fn normalize_area(area: Option<&str>) -> Option<&str> {
    area.filter(|area| !area.is_empty())
}

/// Reference to a single action of a controller, optionally inside an area.
///
/// Equality ignores case on all three parts, and an empty area equals no area.
#[derive(Debug, Clone, Eq, Serialize)]
pub struct ActionReference {
    area: Option<String>,
    controller: String,
    action: String,
}

impl ActionReference {
    #[must_use]
    pub fn new(area: Option<&str>, controller: &str, action: &str) -> Self {
        Self {
            area: normalize_area(area).map(str::to_string),
            controller: controller.to_string(),
            action: action.to_string(),
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

    /// The same area and controller with a different action.
    #[must_use]
    pub fn with_action(&self, action: &str) -> Self {
        Self {
            area: self.area.clone(),
            controller: self.controller.clone(),
            action: action.to_string(),
        }
    }
}

impl PartialEq for ActionReference {
    fn eq(&self, other: &Self) -> bool {
        let same_area = match (self.area(), other.area()) {
            (None, None) => true,
            (Some(left), Some(right)) => names_match(left, right),
            _ => false,
        };

        same_area
            && names_match(&self.controller, &other.controller)
            && names_match(&self.action, &other.action)
    }
}

impl std::fmt::Display for ActionReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.area {
            Some(area) => write!(f, "{area}/{}/{}", self.controller, self.action),
            None => write!(f, "{}/{}", self.controller, self.action),
        }
    }
}

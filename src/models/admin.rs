//! Administrative hierarchy extracted from a reverse-geocoded address.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Address levels reported in the hierarchy, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AdminLevel {
    Country,
    State,
    County,
    City,
    Town,
    Village,
    Suburb,
    Postcode,
}

impl AdminLevel {
    /// Get all admin levels in hierarchical order (country first)
    pub fn all() -> &'static [AdminLevel] {
        &[
            AdminLevel::Country,
            AdminLevel::State,
            AdminLevel::County,
            AdminLevel::City,
            AdminLevel::Town,
            AdminLevel::Village,
            AdminLevel::Suburb,
            AdminLevel::Postcode,
        ]
    }

    /// Key of this level in the provider's address mapping
    pub fn address_key(&self) -> &'static str {
        match self {
            AdminLevel::Country => "country",
            AdminLevel::State => "state",
            AdminLevel::County => "county",
            AdminLevel::City => "city",
            AdminLevel::Town => "town",
            AdminLevel::Village => "village",
            AdminLevel::Suburb => "suburb",
            AdminLevel::Postcode => "postcode",
        }
    }
}

/// Single level of the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminEntry {
    pub level: AdminLevel,
    pub name: String,
}

/// Ordered administrative hierarchy for a location.
///
/// Levels missing from the address are omitted, never filled in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminHierarchy {
    pub display_name: String,
    pub levels: Vec<AdminEntry>,
}

impl AdminHierarchy {
    pub fn from_address(display_name: &str, address: &HashMap<String, String>) -> Self {
        let levels = AdminLevel::all()
            .iter()
            .filter_map(|level| {
                address.get(level.address_key()).map(|name| AdminEntry {
                    level: *level,
                    name: name.clone(),
                })
            })
            .collect();

        Self {
            display_name: display_name.to_string(),
            levels,
        }
    }

    /// Get the name recorded for a given level
    pub fn get(&self, level: AdminLevel) -> Option<&str> {
        self.levels
            .iter()
            .find(|e| e.level == level)
            .map(|e| e.name.as_str())
    }
}

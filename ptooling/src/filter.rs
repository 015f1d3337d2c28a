//! Enable/disable filter applied when a registry snapshot is built.
//!
//! ```rust
//! use ptooling::ToolFilter;
//!
//! let entries = ["*".to_string(), "!list_devices".to_string()];
//! let filter = ToolFilter::from_entries(Some(entries.as_slice()));
//! assert!(filter.allows("add_two_numbers"));
//! assert!(!filter.allows("list_devices"));
//! ```

use std::collections::BTreeSet;

/// Tools whose name starts with this prefix are never exposed.
pub const HIDDEN_TOOL_PREFIX: &str = "_";

const WILDCARDS: [&str; 2] = ["*", "all"];
const NEGATION: char = '!';

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ToolFilter {
    #[default]
    AllowAll,
    AllowAllExcept(BTreeSet<String>),
    AllowOnly(BTreeSet<String>),
}

impl ToolFilter {
    /// Builds a filter from an optional allow-list.
    ///
    /// No list enables everything. A list whose first entry is `*` or `all` enables
    /// everything except `!name` entries. Any other list enables exactly its names.
    pub fn from_entries<S: AsRef<str>>(entries: Option<&[S]>) -> Self {
        let Some(entries) = entries else {
            return Self::AllowAll;
        };

        let is_wildcard = entries
            .first()
            .map(|first| {
                let first = first.as_ref().trim();
                WILDCARDS
                    .iter()
                    .any(|wildcard| first.eq_ignore_ascii_case(wildcard))
            })
            .unwrap_or(false);

        if is_wildcard {
            let denied = entries
                .iter()
                .skip(1)
                .filter_map(|entry| entry.as_ref().trim().strip_prefix(NEGATION))
                .map(|name| name.trim().to_string())
                .collect();
            return Self::AllowAllExcept(denied);
        }

        Self::AllowOnly(
            entries
                .iter()
                .map(|entry| entry.as_ref().trim().to_string())
                .filter(|entry| !entry.is_empty())
                .collect(),
        )
    }

    pub fn allows(&self, name: &str) -> bool {
        if is_hidden(name) {
            return false;
        }

        match self {
            Self::AllowAll => true,
            Self::AllowAllExcept(denied) => !denied.contains(name),
            Self::AllowOnly(allowed) => allowed.contains(name),
        }
    }
}

pub fn is_hidden(name: &str) -> bool {
    name.starts_with(HIDDEN_TOOL_PREFIX)
}

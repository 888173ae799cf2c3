//! Pen catalog entries
//!
//! A pen has one formal (display) name and a non-empty, ordered set of
//! lowercase aliases. Entries are persisted one per line as
//! `Formal Name | alias one, alias two`.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Separator between the formal name and the alias list in the alias file
pub const FIELD_SEPARATOR: char = '|';

/// Separator between aliases in the alias file
pub const ALIAS_SEPARATOR: char = ',';

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenEntry {
    /// Canonical display name
    pub formal_name: String,

    /// Lowercased aliases, unique within the entry, never empty
    pub aliases: Vec<String>,
}

impl PenEntry {
    /// Build an entry from raw user input.
    ///
    /// Aliases are normalized and deduplicated; when none survive, the
    /// lowercased formal name becomes the only alias.
    pub fn new(formal_name: &str, aliases: &[String]) -> Result<Self> {
        let formal_name = validate_formal_name(formal_name)?;

        let mut entry = Self {
            formal_name,
            aliases: Vec::new(),
        };
        for alias in aliases {
            let alias = normalize_alias(alias)?;
            if !alias.is_empty() && !entry.has_alias(&alias) {
                entry.aliases.push(alias);
            }
        }
        if entry.aliases.is_empty() {
            entry.aliases.push(normalize_alias(&entry.formal_name)?);
        }
        Ok(entry)
    }

    /// Case-insensitive lookup key of the formal name
    pub fn key(&self) -> String {
        name_key(&self.formal_name)
    }

    /// Check whether the entry already carries an (already normalized) alias
    pub fn has_alias(&self, alias: &str) -> bool {
        self.aliases.iter().any(|a| a == alias)
    }

    /// Formal name lowercased plus every alias, in that order
    pub fn search_terms(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.formal_name.to_lowercase()).chain(self.aliases.iter().cloned())
    }

    /// Serialize to one line of the alias file
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {}",
            self.formal_name,
            FIELD_SEPARATOR,
            self.aliases.join(&format!("{ALIAS_SEPARATOR} "))
        )
    }

    /// Parse one line of the alias file
    pub fn parse_line(line_number: usize, line: &str) -> Result<Self> {
        let corrupt = |reason: String| AppError::CorruptStore {
            line: line_number,
            reason,
        };

        let (name, aliases) = line
            .split_once(FIELD_SEPARATOR)
            .ok_or_else(|| corrupt(format!("missing '{FIELD_SEPARATOR}' separator")))?;

        if aliases.contains(FIELD_SEPARATOR) {
            return Err(corrupt(format!("more than one '{FIELD_SEPARATOR}' separator")));
        }

        let aliases: Vec<String> = aliases
            .split(ALIAS_SEPARATOR)
            .map(str::to_string)
            .collect();

        PenEntry::new(name, &aliases).map_err(|e| corrupt(e.to_string()))
    }
}

/// Case- and whitespace-insensitive key for formal name comparison.
///
/// Spaces are dropped entirely, the same way the resolver scores names, so
/// "Lamy 2000" and "Lamy2000" are one pen.
pub fn name_key(name: &str) -> String {
    name.split_whitespace().collect::<String>().to_lowercase()
}

/// Lookup form of an alias without the reserved-character check
pub fn alias_key(alias: &str) -> String {
    collapse_whitespace(alias).to_lowercase()
}

/// Trim, collapse internal whitespace and lowercase an alias.
///
/// An empty result is returned as-is so callers can skip it.
pub fn normalize_alias(alias: &str) -> Result<String> {
    if alias.contains([ALIAS_SEPARATOR, FIELD_SEPARATOR, '\n', '\r']) {
        return Err(AppError::Validation(format!(
            "alias '{}' may not contain '{ALIAS_SEPARATOR}', '{FIELD_SEPARATOR}' or line breaks",
            alias.trim()
        )));
    }
    Ok(alias_key(alias))
}

fn validate_formal_name(name: &str) -> Result<String> {
    let name = collapse_whitespace(name);
    if name.is_empty() {
        return Err(AppError::Validation("pen name cannot be empty".to_string()));
    }
    if name.contains([FIELD_SEPARATOR, ALIAS_SEPARATOR, '\n', '\r']) || name.starts_with('#') {
        return Err(AppError::Validation(format!(
            "pen name '{name}' may not start with '#' or contain '{FIELD_SEPARATOR}', '{ALIAS_SEPARATOR}' or line breaks"
        )));
    }
    Ok(name)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

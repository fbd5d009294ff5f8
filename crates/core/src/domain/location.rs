use std::fmt;

use serde::{Deserialize, Serialize};

/// Cache identity for a location: trimmed, and lower-cased unless keys are case-sensitive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationKey(pub String);

impl LocationKey {
    pub fn normalize(location: &str, case_sensitive: bool) -> Self {
        let trimmed = location.trim();
        if case_sensitive {
            Self(trimmed.to_owned())
        } else {
            Self(trimmed.to_lowercase())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A location as the user typed it (trimmed), with the fallback applied when blank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub query: String,
    pub key: LocationKey,
}

impl ResolvedLocation {
    pub fn resolve(raw: Option<&str>, default_location: &str, case_sensitive: bool) -> Self {
        let trimmed = raw.map(str::trim).unwrap_or_default();
        let query = if trimmed.is_empty() { default_location.trim() } else { trimmed };
        Self { query: query.to_owned(), key: LocationKey::normalize(query, case_sensitive) }
    }
}

#[cfg(test)]
mod tests {
    use super::{LocationKey, ResolvedLocation};

    #[test]
    fn normalize_trims_and_lowercases_by_default() {
        assert_eq!(LocationKey::normalize("  Austin, TX ", false).as_str(), "austin, tx");
    }

    #[test]
    fn case_sensitive_keys_keep_original_casing() {
        assert_eq!(LocationKey::normalize(" Austin ", true).as_str(), "Austin");
    }

    #[test]
    fn blank_input_falls_back_to_default_location() {
        for raw in [None, Some(""), Some("   \t")] {
            let resolved = ResolvedLocation::resolve(raw, "NYC", false);
            assert_eq!(resolved.query, "NYC");
            assert_eq!(resolved.key, LocationKey("nyc".to_owned()));
        }
    }

    #[test]
    fn provided_input_keeps_user_casing_for_the_query() {
        let resolved = ResolvedLocation::resolve(Some(" Austin "), "NYC", false);

        assert_eq!(resolved.query, "Austin");
        assert_eq!(resolved.key.as_str(), "austin");
    }
}

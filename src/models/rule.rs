//! Glob-keyed asset rules.
//!
//! Rules are an ordered list of `(pattern, definition)` pairs. The first
//! rule whose glob matches a file's build-relative path wins, so order is
//! part of the data and the table is never stored in an unordered map.

use globset::{GlobBuilder, GlobMatcher};
use serde::{
    Deserialize, Deserializer,
    de::{MapAccess, Visitor},
};
use std::fmt;
use thiserror::Error;

/// Per-asset overrides for how an asset is written to the bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AssetDefinition {
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub acl: Option<String>,
}

/// What a matching rule does with an asset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawDefinition")]
pub enum RuleDefinition {
    /// `false` in the config: never deploy the asset.
    Ignore,
    /// `true` or an object: deploy, applying any overrides.
    Deploy(AssetDefinition),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDefinition {
    Flag(bool),
    Definition(AssetDefinition),
}

impl From<RawDefinition> for RuleDefinition {
    fn from(raw: RawDefinition) -> Self {
        match raw {
            RawDefinition::Flag(false) => RuleDefinition::Ignore,
            RawDefinition::Flag(true) => RuleDefinition::Deploy(AssetDefinition::default()),
            RawDefinition::Definition(def) => RuleDefinition::Deploy(def),
        }
    }
}

/// Rule table as written in the config file, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable(pub Vec<(String, RuleDefinition)>);

impl<'de> Deserialize<'de> for RuleTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = RuleTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of glob patterns to `false`, `true` or an asset definition")
            }

            fn visit_map<A>(self, mut map: A) -> Result<RuleTable, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut rules = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((pattern, definition)) =
                    map.next_entry::<String, RuleDefinition>()?
                {
                    rules.push((pattern, definition));
                }
                Ok(RuleTable(rules))
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid glob pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// A compiled rule, ready for matching.
#[derive(Debug, Clone)]
pub struct AssetRule {
    pub pattern: String,
    pub definition: RuleDefinition,
    /// True when the rule came from the built-in defaults rather than the
    /// user's config.
    pub is_default: bool,
    matcher: GlobMatcher,
}

impl AssetRule {
    pub fn new(
        pattern: impl Into<String>,
        definition: RuleDefinition,
        is_default: bool,
    ) -> Result<Self, RuleError> {
        let pattern = pattern.into();
        let matcher = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| RuleError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?
            .compile_matcher();

        Ok(Self {
            pattern,
            definition,
            is_default,
            matcher,
        })
    }

    /// Test a build-relative path (with its leading `/`).
    pub fn matches(&self, relative_path: &str) -> bool {
        self.matcher.is_match(relative_path)
    }
}

/// Rules applied before anything the user configures.
pub fn default_rules() -> Vec<(String, RuleDefinition)> {
    vec![("**/.DS_Store".to_string(), RuleDefinition::Ignore)]
}

/// Merge user rules over the defaults and compile them.
///
/// A user rule with the same pattern as a default replaces that default in
/// place, keeping the default's position. Other user rules follow in
/// declaration order; a repeated user pattern keeps its first position and
/// its last definition.
pub fn resolve_rules(user: &RuleTable) -> Result<Vec<AssetRule>, RuleError> {
    let mut merged: Vec<(String, RuleDefinition, bool)> = default_rules()
        .into_iter()
        .map(|(pattern, definition)| (pattern, definition, true))
        .collect();

    for (pattern, definition) in &user.0 {
        match merged.iter_mut().find(|(existing, _, _)| existing == pattern) {
            Some(slot) => {
                slot.1 = definition.clone();
                slot.2 = false;
            }
            None => merged.push((pattern.clone(), definition.clone(), false)),
        }
    }

    merged
        .into_iter()
        .map(|(pattern, definition, is_default)| AssetRule::new(pattern, definition, is_default))
        .collect()
}

/// First rule matching `relative_path`, in list order.
pub fn first_match<'a>(rules: &'a [AssetRule], relative_path: &str) -> Option<&'a AssetRule> {
    rules.iter().find(|rule| rule.matches(relative_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(json: &str) -> RuleTable {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn table_keeps_declaration_order() {
        let rules = table(r#"{"z/**": false, "a/**": true, "m/**": {"acl": "private"}}"#);
        let patterns: Vec<&str> = rules.0.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(patterns, ["z/**", "a/**", "m/**"]);
        assert_eq!(rules.0[0].1, RuleDefinition::Ignore);
        assert_eq!(rules.0[1].1, RuleDefinition::Deploy(AssetDefinition::default()));
        assert_eq!(
            rules.0[2].1,
            RuleDefinition::Deploy(AssetDefinition {
                acl: Some("private".into()),
                ..Default::default()
            })
        );
    }

    #[test]
    fn unknown_definition_fields_are_rejected() {
        let result: Result<RuleTable, _> = serde_json::from_str(r#"{"*.js": {"gzip": true}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn first_matching_rule_wins() {
        let user = table(r#"{"**/*.json": false, "**/data.json": {"cacheControl": "no-cache"}}"#);
        let rules = resolve_rules(&user).unwrap();
        let rule = first_match(&rules, "/data.json").unwrap();
        assert_eq!(rule.pattern, "**/*.json");
        assert_eq!(rule.definition, RuleDefinition::Ignore);
    }

    #[test]
    fn defaults_come_first_and_ignore_ds_store() {
        let rules = resolve_rules(&RuleTable::default()).unwrap();
        let rule = first_match(&rules, "/nested/dir/.DS_Store").unwrap();
        assert!(rule.is_default);
        assert!(first_match(&rules, "/.DS_Store").is_some());
        assert!(first_match(&rules, "/index.html").is_none());
    }

    #[test]
    fn user_rule_overrides_default_in_place() {
        let user = table(r#"{"**/*.txt": false, "**/.DS_Store": true}"#);
        let rules = resolve_rules(&user).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].pattern, "**/.DS_Store");
        assert!(!rules[0].is_default);
        assert_eq!(
            rules[0].definition,
            RuleDefinition::Deploy(AssetDefinition::default())
        );
        assert_eq!(rules[1].pattern, "**/*.txt");
    }

    #[test]
    fn star_does_not_cross_directories() {
        let rule = AssetRule::new("/*.html", RuleDefinition::Ignore, false).unwrap();
        assert!(rule.matches("/index.html"));
        assert!(!rule.matches("/docs/index.html"));
    }

    #[test]
    fn invalid_pattern_names_the_pattern() {
        let err = AssetRule::new("[", RuleDefinition::Ignore, false).unwrap_err();
        assert!(err.to_string().contains("`[`"));
    }
}

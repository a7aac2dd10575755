//! Rule provider resolution.
//!
//! Provider descriptors are flattened into a single ordered, deduplicated
//! [`RuleProviderSet`] that every engine is built from.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::{Deserialize, Serialize};

/// Identifier of the provider whose rules always come first.
pub const STANDARD_PROVIDER_ID: &str = "standard";

/// A source of rules, e.g. a builtin rule set or a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderDescriptor {
    /// Provider identifier (`"standard"` for the builtin rule set).
    pub id: String,

    /// Rule identifiers offered by this provider.
    #[serde(default)]
    pub rules: Vec<String>,
}

impl ProviderDescriptor {
    /// Creates a descriptor from an id and its rule identifiers.
    pub fn new<I, S>(id: impl Into<String>, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            rules: rules.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` if this is the standard provider.
    pub fn is_standard(&self) -> bool {
        self.id == STANDARD_PROVIDER_ID
    }
}

/// A single resolved rule and the provider that supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RuleProvider {
    pub rule_id: String,
    pub provider_id: String,
}

/// Immutable, deduplicated, canonically ordered set of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleProviderSet {
    rules: Vec<RuleProvider>,
}

impl RuleProviderSet {
    pub fn iter(&self) -> impl Iterator<Item = &RuleProvider> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns `true` if a rule with this identifier was resolved.
    pub fn contains(&self, rule_id: &str) -> bool {
        self.rules.iter().any(|r| r.rule_id == rule_id)
    }

    /// Rule identifiers in resolution order.
    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.rule_id.as_str())
    }
}

/// Resolves provider descriptors into a [`RuleProviderSet`].
pub struct RuleProviderResolver;

impl RuleProviderResolver {
    /// Resolves providers into an ordered set of rules.
    ///
    /// The standard provider sorts before all others; the remaining providers
    /// keep their input order. A rule whose identifier was already seen
    /// replaces the earlier entry in place, so each identifier keeps the
    /// position where it first appeared.
    pub fn resolve<'a, I>(providers: I) -> RuleProviderSet
    where
        I: IntoIterator<Item = &'a ProviderDescriptor>,
    {
        let mut sorted: Vec<&ProviderDescriptor> = providers.into_iter().collect();
        // Stable sort: ties keep insertion order.
        sorted.sort_by_key(|p| !p.is_standard());

        let mut rules: Vec<RuleProvider> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();

        for provider in sorted {
            for rule_id in &provider.rules {
                let resolved = RuleProvider {
                    rule_id: rule_id.clone(),
                    provider_id: provider.id.clone(),
                };
                match positions.entry(rule_id.as_str()) {
                    Entry::Occupied(slot) => rules[*slot.get()] = resolved,
                    Entry::Vacant(slot) => {
                        slot.insert(rules.len());
                        rules.push(resolved);
                    }
                }
            }
        }

        RuleProviderSet { rules }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(set: &RuleProviderSet) -> Vec<&str> {
        set.rule_ids().collect()
    }

    #[test]
    fn test_resolve_empty() {
        let set = RuleProviderResolver::resolve(&Vec::<ProviderDescriptor>::new());
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_standard_sorts_first() {
        let providers = vec![
            ProviderDescriptor::new("plugin-a", ["a:one"]),
            ProviderDescriptor::new("standard", ["standard:x", "standard:y"]),
            ProviderDescriptor::new("plugin-b", ["b:one"]),
        ];

        let set = RuleProviderResolver::resolve(&providers);
        assert_eq!(
            ids(&set),
            vec!["standard:x", "standard:y", "a:one", "b:one"]
        );
    }

    #[test]
    fn test_non_standard_order_is_stable() {
        let providers = vec![
            ProviderDescriptor::new("zeta", ["z:1"]),
            ProviderDescriptor::new("alpha", ["a:1"]),
            ProviderDescriptor::new("mid", ["m:1"]),
        ];

        let set = RuleProviderResolver::resolve(&providers);
        assert_eq!(ids(&set), vec!["z:1", "a:1", "m:1"]);
    }

    #[test]
    fn test_duplicate_rule_replaced_in_place() {
        let providers = vec![
            ProviderDescriptor::new("standard", ["shared", "standard:only"]),
            ProviderDescriptor::new("plugin", ["plugin:only", "shared"]),
        ];

        let set = RuleProviderResolver::resolve(&providers);
        assert_eq!(ids(&set), vec!["shared", "standard:only", "plugin:only"]);

        let shared = set.iter().find(|r| r.rule_id == "shared").unwrap();
        assert_eq!(shared.provider_id, "plugin");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let providers = vec![
            ProviderDescriptor::new("plugin", ["p:1", "p:1"]),
            ProviderDescriptor::new("standard", ["s:1"]),
        ];

        let first = RuleProviderResolver::resolve(&providers);
        let second = RuleProviderResolver::resolve(&providers);
        assert_eq!(first, second);
        assert_eq!(ids(&first), vec!["s:1", "p:1"]);
    }

    #[test]
    fn test_contains() {
        let providers = vec![ProviderDescriptor::new("standard", ["standard:no-tabs"])];
        let set = RuleProviderResolver::resolve(&providers);
        assert!(set.contains("standard:no-tabs"));
        assert!(!set.contains("standard:missing"));
    }
}

//! Storage of merged rules, keyed by type identifiers.

use crate::rule::Rule;
use crate::type_name::TypeName;
use crate::type_registry::TypeHierarchy;
use fxhash::FxHashMap;
use tracing::trace;

/// Rules in registration order, with an index for exact lookups.
#[derive(Clone, Debug, Default)]
pub struct RuleStore {
    rules: Vec<(TypeName, Rule)>,
    index: FxHashMap<TypeName, usize>,
}

impl RuleStore {
    /// Merges the fragment into the rule currently applying to `type_name` and stores the
    /// result. A fragment with an inheritable `instanceOf` type is first merged on top of the rule
    /// for that type.
    pub fn add_rule(&mut self, type_name: TypeName, fragment: Rule, hierarchy: &dyn TypeHierarchy) {
        let fragment = match fragment.instance_of_type() {
            Some(target) if fragment.is_inheritable() => {
                self.rule(target, hierarchy).merge(fragment)
            }
            _ => fragment,
        };

        let rule = self.rule(&type_name, hierarchy).merge(fragment);

        trace!(%type_name, "Registering rule.");

        match self.index.get(&type_name) {
            Some(index) => self.rules[*index].1 = rule,
            None => {
                self.index.insert(type_name.clone(), self.rules.len());
                self.rules.push((type_name, rule));
            }
        }
    }

    /// Returns the rule applying to `type_name`: an exact match, else the first registered
    /// inheritable type rule for a supertype, else the wildcard rule, else an empty rule.
    pub fn rule(&self, type_name: &TypeName, hierarchy: &dyn TypeHierarchy) -> Rule {
        if let Some(index) = self.index.get(type_name) {
            return self.rules[*index].1.clone();
        }

        self.rules
            .iter()
            .find(|(key, rule)| {
                !key.is_wildcard()
                    && rule.instance_of.is_none()
                    && rule.is_inheritable()
                    && hierarchy.is_subclass_of(type_name, key)
            })
            .or_else(|| {
                self.index
                    .get(&TypeName::wildcard())
                    .map(|index| &self.rules[*index])
            })
            .map(|(_, rule)| rule.clone())
            .unwrap_or_default()
    }
}

//! Legacy capability aliases.
//!
//! Job records written before a capability rename still carry the old
//! identifier. The alias table maps each deprecated identifier to exactly
//! one canonical capability and is consulted before any graph traversal,
//! so renames never require rewriting historical data.

use std::collections::BTreeMap;

use tracing::debug;

use super::CapabilityTaxonomy;
use crate::error::{CatalogError, CatalogResult, UnknownCapability};
use crate::models::{Capability, LegacyAlias};
use crate::validation::validate_aliases;

/// Validated alias table (deprecated ID → canonical ID).
#[derive(Debug, Clone, Default)]
pub struct LegacyAliasResolver {
    aliases: BTreeMap<String, String>,
}

impl LegacyAliasResolver {
    /// Builds a resolver, checking every alias against `taxonomy`.
    ///
    /// # Errors
    /// [`CatalogError::Invalid`] if an alias is duplicated, shadows a
    /// canonical capability, is chained, or targets an unknown capability.
    pub fn new(
        aliases: impl IntoIterator<Item = LegacyAlias>,
        taxonomy: &CapabilityTaxonomy,
    ) -> CatalogResult<Self> {
        let aliases: Vec<LegacyAlias> = aliases.into_iter().collect();
        validate_aliases(&aliases, taxonomy).map_err(CatalogError::from_validation)?;

        Ok(Self {
            aliases: aliases.into_iter().map(|a| (a.alias, a.target)).collect(),
        })
    }

    /// Resolves an identifier to its canonical capability.
    ///
    /// Canonical IDs are returned unchanged; registered aliases are
    /// rewritten to their target.
    pub fn normalize<'t>(
        &self,
        taxonomy: &'t CapabilityTaxonomy,
        id: &str,
    ) -> Result<&'t Capability, UnknownCapability> {
        if let Ok(cap) = taxonomy.capability(id) {
            return Ok(cap);
        }
        match self.aliases.get(id) {
            Some(target) => {
                debug!(alias = id, canonical = %target, "rewrote legacy capability alias");
                taxonomy.capability(target)
            }
            None => Err(UnknownCapability::new(id)),
        }
    }

    /// The canonical target of an alias.
    pub fn target_of(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    /// Whether `id` is a registered alias.
    pub fn is_alias(&self, id: &str) -> bool {
        self.aliases.contains_key(id)
    }

    /// Aliases pointing at a canonical capability, ordered.
    pub fn aliases_of<'a>(&'a self, canonical: &'a str) -> impl Iterator<Item = &'a str> {
        self.aliases
            .iter()
            .filter(move |(_, target)| target.as_str() == canonical)
            .map(|(alias, _)| alias.as_str())
    }

    /// All aliases, ordered by alias ID.
    pub fn iter(&self) -> impl Iterator<Item = LegacyAlias> + '_ {
        self.aliases
            .iter()
            .map(|(alias, target)| LegacyAlias::new(alias, target))
    }

    /// Number of registered aliases.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Whether no alias is registered.
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CapabilityFamily, SubstitutionEdge};
    use crate::taxonomy::TaxonomyBuilder;

    fn taxonomy() -> CapabilityTaxonomy {
        TaxonomyBuilder::new()
            .with_family(CapabilityFamily::new("turning", "lathe"))
            .with_capability(Capability::new("single_spindle_turning", "turning").with_tier(1))
            .with_capability(Capability::new("live_tooling_turning", "turning").with_tier(2))
            .with_edge(SubstitutionEdge::new(
                "live_tooling_turning",
                "single_spindle_turning",
            ))
            .build()
            .unwrap()
    }

    fn resolver(t: &CapabilityTaxonomy) -> LegacyAliasResolver {
        LegacyAliasResolver::new(
            vec![
                LegacyAlias::new("turning", "single_spindle_turning"),
                LegacyAlias::new("lathe_basic", "single_spindle_turning"),
                LegacyAlias::new("live_tool", "live_tooling_turning"),
            ],
            t,
        )
        .unwrap()
    }

    #[test]
    fn test_canonical_passthrough() {
        let t = taxonomy();
        let r = resolver(&t);
        assert_eq!(r.normalize(&t, "live_tooling_turning").unwrap().id, "live_tooling_turning");
    }

    #[test]
    fn test_alias_rewritten() {
        let t = taxonomy();
        let r = resolver(&t);
        assert_eq!(r.normalize(&t, "turning").unwrap().id, "single_spindle_turning");
        assert_eq!(r.target_of("live_tool"), Some("live_tooling_turning"));
        assert!(r.is_alias("turning"));
        assert!(!r.is_alias("single_spindle_turning"));
    }

    #[test]
    fn test_unknown_identifier() {
        let t = taxonomy();
        let r = resolver(&t);
        let err = r.normalize(&t, "not_a_real_capability").unwrap_err();
        assert_eq!(err, UnknownCapability::new("not_a_real_capability"));
    }

    #[test]
    fn test_aliases_of() {
        let t = taxonomy();
        let r = resolver(&t);
        let aliases: Vec<&str> = r.aliases_of("single_spindle_turning").collect();
        assert_eq!(aliases, vec!["lathe_basic", "turning"]);
        assert_eq!(r.len(), 3);
        assert_eq!(r.iter().count(), 3);
    }

    #[test]
    fn test_invalid_alias_rejected() {
        let t = taxonomy();
        let err = LegacyAliasResolver::new(vec![LegacyAlias::new("edm", "wire_edm")], &t)
            .unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
    }

    #[test]
    fn test_empty_resolver() {
        let t = taxonomy();
        let r = LegacyAliasResolver::default();
        assert!(r.is_empty());
        assert!(r.normalize(&t, "turning").is_err());
    }
}

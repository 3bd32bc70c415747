//! Declarative catalog configuration (TOML).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Capability, CapabilityFamily, LegacyAlias, SubstitutionEdge};

/// The embedded default catalog.
pub(crate) const STANDARD_CATALOG: &str = include_str!("standard.toml");

/// Raw catalog contents as written in a catalog file.
///
/// ```toml
/// [tiers]
/// standard = 1
///
/// [[families]]
/// id = "turning"
/// category = "lathe"
///
/// [[capabilities]]
/// id = "single_spindle_turning"
/// family = "turning"
/// tier = 1
///
/// [[substitutions]]
/// specialized = "bar_fed_turning"
/// base = "single_spindle_turning"
///
/// [aliases]
/// turning = "single_spindle_turning"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Tier display label → rank.
    #[serde(default)]
    pub tiers: BTreeMap<String, i32>,
    /// Capability families.
    #[serde(default)]
    pub families: Vec<CapabilityFamily>,
    /// Canonical capabilities.
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    /// Substitution edges (specialized → base).
    #[serde(default)]
    pub substitutions: Vec<SubstitutionEdge>,
    /// Legacy alias → canonical capability.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl CatalogConfig {
    /// Parses a catalog from TOML text.
    pub fn from_toml_str(text: &str) -> CatalogResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// The embedded default catalog.
    pub fn standard() -> CatalogResult<Self> {
        Self::from_toml_str(STANDARD_CATALOG)
    }

    /// Alias entries as models.
    pub fn legacy_aliases(&self) -> Vec<LegacyAlias> {
        self.aliases
            .iter()
            .map(|(alias, target)| LegacyAlias::new(alias, target))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard() {
        let config = CatalogConfig::standard().unwrap();
        assert_eq!(config.families.len(), 2);
        assert_eq!(config.capabilities.len(), 7);
        assert_eq!(config.substitutions.len(), 6);
        assert_eq!(config.tiers.get("advanced"), Some(&2));
        assert_eq!(
            config.aliases.get("turning").map(String::as_str),
            Some("single_spindle_turning")
        );
    }

    #[test]
    fn test_sections_optional() {
        let config = CatalogConfig::from_toml_str("").unwrap();
        assert_eq!(config, CatalogConfig::default());
    }

    #[test]
    fn test_parse_error() {
        let err = CatalogConfig::from_toml_str("[[families]]\nid = 3").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = CatalogConfig::from_path("/nonexistent/catalog.toml").unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }

    #[test]
    fn test_legacy_aliases() {
        let config = CatalogConfig::from_toml_str("[aliases]\nturning = \"single_spindle_turning\"")
            .unwrap();
        assert_eq!(
            config.legacy_aliases(),
            vec![LegacyAlias::new("turning", "single_spindle_turning")]
        );
    }
}

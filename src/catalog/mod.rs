//! Process-wide catalog snapshot: taxonomy, aliases and tier labels.
//!
//! A [`Catalog`] only exists once every integrity check has passed, so
//! holding one is proof that queries may run. [`CatalogHandle`] shares the
//! current snapshot between query tasks and supports hot reload by swapping
//! the whole snapshot, never editing it in place.
//!
//! # Concurrency
//!
//! ```text
//! query ──snapshot()──▶ Arc<Catalog> (kept for the whole query)
//! reload ─validate─▶ replace() ──▶ new Arc<Catalog>
//!            │ fail
//!            ▼
//!      previous snapshot stays live
//! ```

mod config;

pub use config::CatalogConfig;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::error::{CatalogError, CatalogResult, UnknownCapability};
use crate::models::Capability;
use crate::taxonomy::{CapabilityTaxonomy, LegacyAliasResolver, TaxonomyBuilder};
use crate::validation::{validate_catalog, validate_tiers};

/// Immutable, validated capability catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    taxonomy: CapabilityTaxonomy,
    aliases: LegacyAliasResolver,
    /// Lower-cased tier label → rank.
    tiers: BTreeMap<String, i32>,
}

impl Catalog {
    /// Assembles a catalog from already-validated parts plus tier labels.
    pub fn new(
        taxonomy: CapabilityTaxonomy,
        aliases: LegacyAliasResolver,
        tiers: BTreeMap<String, i32>,
    ) -> CatalogResult<Self> {
        validate_tiers(&tiers).map_err(CatalogError::from_validation)?;
        Ok(Self {
            taxonomy,
            aliases,
            tiers: tiers
                .into_iter()
                .map(|(label, rank)| (label.to_lowercase(), rank))
                .collect(),
        })
    }

    /// Validates a declarative configuration into a catalog.
    ///
    /// All findings across taxonomy, aliases and tier labels are reported
    /// together; a substitution cycle is reported as [`CatalogError::Cycle`].
    pub fn from_config(config: CatalogConfig) -> CatalogResult<Self> {
        validate_catalog(&config).map_err(CatalogError::from_validation)?;

        let aliases = config.legacy_aliases();
        let taxonomy = TaxonomyBuilder::new()
            .with_families(config.families)
            .with_capabilities(config.capabilities)
            .with_edges(config.substitutions)
            .build()?;
        let aliases = LegacyAliasResolver::new(aliases, &taxonomy)?;
        let catalog = Self::new(taxonomy, aliases, config.tiers)?;

        info!(
            families = catalog.taxonomy.families().count(),
            capabilities = catalog.taxonomy.len(),
            substitutions = catalog.taxonomy.edges().len(),
            aliases = catalog.aliases.len(),
            "capability catalog loaded"
        );
        Ok(catalog)
    }

    /// Parses and validates a TOML catalog.
    pub fn from_toml_str(text: &str) -> CatalogResult<Self> {
        Self::from_config(CatalogConfig::from_toml_str(text)?)
    }

    /// Reads, parses and validates a TOML catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> CatalogResult<Self> {
        Self::from_config(CatalogConfig::from_path(path)?)
    }

    /// The embedded default catalog (turning and milling families).
    pub fn standard() -> CatalogResult<Self> {
        Self::from_config(CatalogConfig::standard()?)
    }

    pub fn taxonomy(&self) -> &CapabilityTaxonomy {
        &self.taxonomy
    }

    pub fn aliases(&self) -> &LegacyAliasResolver {
        &self.aliases
    }

    /// Resolves a canonical or legacy identifier to its canonical capability.
    pub fn normalize(&self, id: &str) -> Result<&Capability, UnknownCapability> {
        self.aliases.normalize(&self.taxonomy, id)
    }

    /// Rank of a tier label (case-insensitive).
    pub fn tier_rank(&self, label: &str) -> Option<i32> {
        self.tiers.get(&label.to_lowercase()).copied()
    }

    /// Tier labels ordered by label.
    pub fn tiers(&self) -> &BTreeMap<String, i32> {
        &self.tiers
    }
}

/// Shared handle to the live catalog snapshot.
///
/// Cloning the handle shares the same slot. Readers take an `Arc` to the
/// current snapshot and keep it for the rest of their query, so a reload
/// never changes the taxonomy under an in-flight query.
#[derive(Debug, Clone)]
pub struct CatalogHandle {
    current: Arc<RwLock<Arc<Catalog>>>,
}

impl CatalogHandle {
    /// Wraps an initial catalog.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(catalog))),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Catalog> {
        // The slot only ever holds a complete Arc, so a poisoned lock still
        // guards a consistent value.
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Swaps in a new snapshot and returns the previous one.
    pub fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        let next = Arc::new(catalog);
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *guard, next)
    }

    /// Validates TOML text and swaps it in.
    ///
    /// On failure the previous snapshot stays live and the error is returned.
    pub fn reload_from_toml(&self, text: &str) -> CatalogResult<()> {
        match Catalog::from_toml_str(text) {
            Ok(catalog) => {
                self.replace(catalog);
                info!("capability catalog swapped");
                Ok(())
            }
            Err(err) => {
                warn!(
                    error = %err,
                    findings = err.validation_errors().len(),
                    "catalog reload rejected, keeping previous snapshot"
                );
                Err(err)
            }
        }
    }

    /// Reads a catalog file, validates it and swaps it in.
    pub fn reload_from_path(&self, path: impl AsRef<Path>) -> CatalogResult<()> {
        let path = path.as_ref();
        match Catalog::from_path(path) {
            Ok(catalog) => {
                self.replace(catalog);
                info!(path = %path.display(), "capability catalog swapped");
                Ok(())
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    findings = err.validation_errors().len(),
                    "catalog reload rejected, keeping previous snapshot"
                );
                Err(err)
            }
        }
    }
}

impl From<Catalog> for CatalogHandle {
    fn from(catalog: Catalog) -> Self {
        Self::new(catalog)
    }
}

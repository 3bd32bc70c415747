//! Compatibility resolution: which machines may run a job.
//!
//! # Algorithm
//!
//! 1. Normalize the requested identifier through the legacy alias table.
//! 2. Take the admissible closure of the canonical capability: itself plus
//!    every specialized capability with a substitution path to it.
//! 3. Read candidates from the registry: the filter category if given,
//!    otherwise the category of the capability's family.
//! 4. Keep `Active` machines holding at least one admissible capability.
//! 5. Deduplicate by machine ID and order best fit first.
//! 6. Drop matches below the minimum tier, if one was requested.
//!
//! Eligibility never compares tier numbers; tiers only order the listing
//! and feed the optional minimum-tier post-filter.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::catalog::{Catalog, CatalogHandle};
use crate::error::UnknownCapability;
use crate::models::{CompatibilityResult, Machine, MachineMatch};
use crate::registry::{MachineRegistry, RegistryError};

/// Resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    UnknownCapability(#[from] UnknownCapability),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Optional query constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveFilters {
    /// Restrict candidates to one machine category.
    pub category: Option<String>,
    /// Discard matches whose capability tier rank is below this.
    pub min_tier: Option<i32>,
}

impl ResolveFilters {
    /// No constraints.
    pub fn none() -> Self {
        Self::default()
    }

    /// Restricts to a machine category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the minimum tier rank.
    pub fn with_min_tier(mut self, rank: i32) -> Self {
        self.min_tier = Some(rank);
        self
    }
}

/// Computes eligible machines for capability queries.
///
/// Holds the catalog handle and the registry; both are shared, so the
/// resolver is cheap to clone and safe to use from many tasks at once.
#[derive(Clone)]
pub struct CompatibilityResolver {
    catalog: CatalogHandle,
    registry: Arc<dyn MachineRegistry>,
}

impl CompatibilityResolver {
    /// Creates a resolver over a catalog and a registry.
    pub fn new(catalog: impl Into<CatalogHandle>, registry: Arc<dyn MachineRegistry>) -> Self {
        Self {
            catalog: catalog.into(),
            registry,
        }
    }

    /// The catalog handle (for hot reload).
    pub fn catalog(&self) -> &CatalogHandle {
        &self.catalog
    }

    /// Resolves the machines eligible for `requested`.
    ///
    /// `requested` may be canonical or a legacy alias; the result carries
    /// the canonical ID it resolved to. An unknown category filter yields an
    /// empty result; an unknown capability is an error.
    pub async fn resolve(
        &self,
        requested: &str,
        filters: &ResolveFilters,
    ) -> Result<CompatibilityResult, ResolveError> {
        // One snapshot per query: a concurrent reload never mixes taxonomies.
        let catalog = self.catalog.snapshot();

        let capability = catalog.normalize(requested)?;
        let taxonomy = catalog.taxonomy();
        let admissible = taxonomy.admissible_for(&capability.id)?;

        let category = match &filters.category {
            Some(category) => category.clone(),
            None => taxonomy.family_of(&capability.id)?.category.clone(),
        };
        let candidates = self.registry.list_by_category(&category).await?;
        let candidate_count = candidates.len();

        let mut result = CompatibilityResult::from_matches(
            capability.id.as_str(),
            candidates
                .into_iter()
                .filter(Machine::is_active)
                .filter_map(|m| best_match(&catalog, admissible, m)),
        );
        if let Some(min_tier) = filters.min_tier {
            result.retain_min_tier(min_tier);
        }

        debug!(
            requested,
            canonical = %capability.id,
            category = %category,
            admissible = admissible.len(),
            candidates = candidate_count,
            eligible = result.len(),
            "resolved compatible machines"
        );
        Ok(result)
    }

    /// Whether `machine` may run a job requiring `requested`, ignoring status.
    pub fn is_eligible(&self, machine: &Machine, requested: &str) -> Result<bool, ResolveError> {
        let catalog = self.catalog.snapshot();
        let capability = catalog.normalize(requested)?;
        let admissible = catalog.taxonomy().admissible_for(&capability.id)?;
        Ok(machine.capabilities.iter().any(|c| admissible.contains(c)))
    }

    /// Canonical capabilities `machine` can serve through its native
    /// capabilities and their substitution closures.
    ///
    /// Native capabilities unknown to the catalog are skipped.
    pub fn servable_by(&self, machine: &Machine) -> BTreeSet<String> {
        let catalog = self.catalog.snapshot();
        machine
            .capabilities
            .iter()
            .filter_map(|c| catalog.taxonomy().reachable_from(c).ok())
            .flatten()
            .cloned()
            .collect()
    }
}

/// The highest-tier admissible native capability of `machine`, if any.
fn best_match(
    catalog: &Catalog,
    admissible: &BTreeSet<String>,
    machine: Machine,
) -> Option<MachineMatch> {
    let (tier, capability) = machine
        .capabilities
        .iter()
        .filter(|c| admissible.contains(c.as_str()))
        .filter_map(|c| catalog.taxonomy().tier_of(c).map(|tier| (tier, c)))
        // Highest tier wins; on equal tiers the smaller ID.
        .max_by(|(ta, ca), (tb, cb)| ta.cmp(tb).then_with(|| cb.cmp(ca)))?;
    let capability = capability.clone();
    Some(MachineMatch::new(machine, capability, tier))
}

impl std::fmt::Debug for CompatibilityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompatibilityResolver")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

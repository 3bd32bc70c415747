//! Capability taxonomy: families, tiers and substitution edges.
//!
//! The taxonomy is built once from declarative parts, validated, and never
//! mutated afterwards. Both closures of every capability are computed at
//! build time:
//!
//! - **reachable**: the capability plus every base it can stand in for
//!   (follows edges specialized → base).
//! - **admissible**: the capability plus every specialized capability with
//!   a path to it. A machine is eligible for a requested capability iff one
//!   of its native capabilities is in that capability's admissible set.
//!
//! # Example
//! ```
//! use u_capability::models::{Capability, CapabilityFamily, SubstitutionEdge};
//! use u_capability::taxonomy::TaxonomyBuilder;
//!
//! let taxonomy = TaxonomyBuilder::new()
//!     .with_family(CapabilityFamily::new("milling", "mill"))
//!     .with_capability(Capability::new("three_axis_milling", "milling").with_tier(1))
//!     .with_capability(Capability::new("true_4th_axis_milling", "milling").with_tier(2))
//!     .with_edge(SubstitutionEdge::new("true_4th_axis_milling", "three_axis_milling"))
//!     .build()
//!     .unwrap();
//!
//! let admissible = taxonomy.admissible_for("three_axis_milling").unwrap();
//! assert!(admissible.contains("true_4th_axis_milling"));
//! ```

pub mod alias;

pub use alias::LegacyAliasResolver;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{CatalogError, CatalogResult, UnknownCapability};
use crate::models::{Capability, CapabilityFamily, SubstitutionEdge};
use crate::validation::validate_taxonomy;

/// Validated, immutable capability taxonomy.
#[derive(Debug, Clone)]
pub struct CapabilityTaxonomy {
    families: BTreeMap<String, CapabilityFamily>,
    capabilities: BTreeMap<String, Capability>,
    edges: Vec<SubstitutionEdge>,
    reachable: HashMap<String, BTreeSet<String>>,
    admissible: HashMap<String, BTreeSet<String>>,
}

/// Collects taxonomy parts and validates them into a [`CapabilityTaxonomy`].
#[derive(Debug, Clone, Default)]
pub struct TaxonomyBuilder {
    families: Vec<CapabilityFamily>,
    capabilities: Vec<Capability>,
    edges: Vec<SubstitutionEdge>,
}

impl TaxonomyBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a family.
    pub fn with_family(mut self, family: CapabilityFamily) -> Self {
        self.families.push(family);
        self
    }

    /// Adds several families.
    pub fn with_families(mut self, families: impl IntoIterator<Item = CapabilityFamily>) -> Self {
        self.families.extend(families);
        self
    }

    /// Adds a capability.
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Adds several capabilities.
    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    /// Adds a substitution edge.
    pub fn with_edge(mut self, edge: SubstitutionEdge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Adds several substitution edges.
    pub fn with_edges(mut self, edges: impl IntoIterator<Item = SubstitutionEdge>) -> Self {
        self.edges.extend(edges);
        self
    }

    /// Validates the parts and precomputes both closures.
    ///
    /// # Errors
    /// [`CatalogError::Cycle`] if the substitution graph has a cycle,
    /// [`CatalogError::Invalid`] for any other integrity failure.
    pub fn build(self) -> CatalogResult<CapabilityTaxonomy> {
        validate_taxonomy(&self.families, &self.capabilities, &self.edges)
            .map_err(CatalogError::from_validation)?;

        let mut edges = self.edges;
        edges.sort_by(|a, b| (&a.specialized, &a.base).cmp(&(&b.specialized, &b.base)));
        edges.dedup();

        let mut bases: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut specializations: HashMap<&str, Vec<&str>> = HashMap::new();
        for e in &edges {
            bases.entry(&e.specialized).or_default().push(&e.base);
            specializations.entry(&e.base).or_default().push(&e.specialized);
        }

        let mut reachable = HashMap::new();
        let mut admissible = HashMap::new();
        for id in self.capabilities.iter().map(|c| c.id.as_str()) {
            reachable.insert(id.to_string(), closure(id, &bases));
            admissible.insert(id.to_string(), closure(id, &specializations));
        }

        Ok(CapabilityTaxonomy {
            families: self
                .families
                .into_iter()
                .map(|f| (f.id.clone(), f))
                .collect(),
            capabilities: self
                .capabilities
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect(),
            edges,
            reachable,
            admissible,
        })
    }
}

/// Reflexive-transitive closure of `start` over `adj`.
///
/// Iterative DFS; the graph is a validated DAG so every path is bounded.
fn closure(start: &str, adj: &HashMap<&str, Vec<&str>>) -> BTreeSet<String> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        if !seen.insert(node.to_string()) {
            continue;
        }
        if let Some(next) = adj.get(node) {
            stack.extend(next.iter().copied().filter(|n| !seen.contains(*n)));
        }
    }
    seen
}

impl CapabilityTaxonomy {
    /// Whether `id` is a canonical capability.
    pub fn capability_exists(&self, id: &str) -> bool {
        self.capabilities.contains_key(id)
    }

    /// Looks up a canonical capability.
    pub fn capability(&self, id: &str) -> Result<&Capability, UnknownCapability> {
        self.capabilities
            .get(id)
            .ok_or_else(|| UnknownCapability::new(id))
    }

    /// Tier rank of a capability.
    pub fn tier_of(&self, id: &str) -> Option<i32> {
        self.capabilities.get(id).map(|c| c.tier)
    }

    /// Looks up a family.
    pub fn family(&self, id: &str) -> Option<&CapabilityFamily> {
        self.families.get(id)
    }

    /// The family owning a capability.
    pub fn family_of(&self, capability: &str) -> Result<&CapabilityFamily, UnknownCapability> {
        let cap = self.capability(capability)?;
        // Validation guarantees the family exists.
        self.families
            .get(&cap.family)
            .ok_or_else(|| UnknownCapability::new(capability))
    }

    /// The capability itself plus every base capability it may substitute for.
    pub fn reachable_from(&self, id: &str) -> Result<&BTreeSet<String>, UnknownCapability> {
        self.reachable
            .get(id)
            .ok_or_else(|| UnknownCapability::new(id))
    }

    /// The capability itself plus every specialized capability that may
    /// substitute for it.
    ///
    /// A capability nothing substitutes for admits only itself.
    pub fn admissible_for(&self, id: &str) -> Result<&BTreeSet<String>, UnknownCapability> {
        self.admissible
            .get(id)
            .ok_or_else(|| UnknownCapability::new(id))
    }

    /// All families, ordered by ID.
    pub fn families(&self) -> impl Iterator<Item = &CapabilityFamily> {
        self.families.values()
    }

    /// All capabilities, ordered by ID.
    pub fn capabilities(&self) -> impl Iterator<Item = &Capability> {
        self.capabilities.values()
    }

    /// Capabilities of one family, ordered by ID.
    pub fn capabilities_in<'a>(&'a self, family: &'a str) -> impl Iterator<Item = &'a Capability> {
        self.capabilities.values().filter(move |c| c.family == family)
    }

    /// All substitution edges, deduplicated and sorted.
    pub fn edges(&self) -> &[SubstitutionEdge] {
        &self.edges
    }

    /// Number of canonical capabilities.
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Whether the taxonomy declares no capability.
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

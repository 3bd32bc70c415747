//! Capability taxonomy model.
//!
//! A capability is a discrete manufacturing process a machine can perform
//! and a job can require. Capabilities are grouped into families that share
//! one machine category. Within a family, substitution edges state which
//! specialized capabilities may stand in for more generic ones.
//!
//! Tier ranks order listings only. Eligibility follows the edges, because
//! specialization is a lattice: a dual-spindle lathe serves both the
//! live-tooling and the bar-fed branch.

use serde::{Deserialize, Serialize};

/// A family of related capabilities sharing one machine category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFamily {
    /// Unique family identifier (e.g., "turning").
    pub id: String,
    /// Machine category serving this family (e.g., "lathe").
    pub category: String,
}

/// A canonical capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Unique capability identifier (e.g., "live_tooling_turning").
    pub id: String,
    /// Owning family ID.
    pub family: String,
    /// Specialization rank (higher = more specialized).
    #[serde(default)]
    pub tier: i32,
}

/// Directed substitution permission: machines natively holding
/// `specialized` may also serve jobs requiring `base`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubstitutionEdge {
    /// The more specialized capability.
    pub specialized: String,
    /// The more generic capability it can stand in for.
    pub base: String,
}

/// A deprecated identifier mapped to exactly one canonical capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyAlias {
    /// The deprecated identifier.
    pub alias: String,
    /// The canonical capability it resolves to.
    pub target: String,
}

impl CapabilityFamily {
    /// Creates a new family.
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
        }
    }
}

impl Capability {
    /// Creates a capability at tier 0.
    pub fn new(id: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            family: family.into(),
            tier: 0,
        }
    }

    /// Sets the tier rank.
    pub fn with_tier(mut self, tier: i32) -> Self {
        self.tier = tier;
        self
    }
}

impl SubstitutionEdge {
    /// Creates an edge `specialized → base`.
    pub fn new(specialized: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            specialized: specialized.into(),
            base: base.into(),
        }
    }
}

impl LegacyAlias {
    /// Creates an alias `alias → target`.
    pub fn new(alias: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            target: target.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_builder() {
        let c = Capability::new("live_tooling_turning", "turning").with_tier(2);
        assert_eq!(c.id, "live_tooling_turning");
        assert_eq!(c.family, "turning");
        assert_eq!(c.tier, 2);
    }

    #[test]
    fn test_capability_tier_defaults_on_deserialize() {
        let c: Capability =
            serde_json::from_str(r#"{"id": "single_spindle_turning", "family": "turning"}"#)
                .unwrap();
        assert_eq!(c.tier, 0);
    }

    #[test]
    fn test_edge_and_alias() {
        let e = SubstitutionEdge::new("dual_spindle_turning", "bar_fed_turning");
        assert_eq!(e.specialized, "dual_spindle_turning");
        assert_eq!(e.base, "bar_fed_turning");

        let a = LegacyAlias::new("turning", "single_spindle_turning");
        assert_eq!(a.alias, "turning");
        assert_eq!(a.target, "single_spindle_turning");
    }
}

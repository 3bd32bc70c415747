//! Compatibility result model.
//!
//! The ordered, duplicate-free list of machines eligible for one query.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use super::Machine;

/// One eligible machine together with the capability it qualified through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineMatch {
    /// The eligible machine.
    pub machine: Machine,
    /// The native capability that placed the machine in the admissible set.
    pub matched_capability: String,
    /// Tier rank of `matched_capability`.
    pub tier: i32,
}

/// Machines satisfying a query, best fit first.
///
/// Carries the canonical capability the query resolved to, taken from the
/// same catalog snapshot that produced the matches.
///
/// # Ordering
/// Descending tier of the matched capability, then display name, then
/// machine ID. Each machine appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityResult {
    /// Canonical capability the request resolved to.
    pub capability: String,
    /// Ordered matches.
    pub matches: Vec<MachineMatch>,
}

impl MachineMatch {
    /// Creates a match.
    pub fn new(machine: Machine, matched_capability: impl Into<String>, tier: i32) -> Self {
        Self {
            machine,
            matched_capability: matched_capability.into(),
            tier,
        }
    }

    fn listing_order(&self, other: &Self) -> Ordering {
        other
            .tier
            .cmp(&self.tier)
            .then_with(|| self.machine.name.cmp(&other.machine.name))
            .then_with(|| self.machine.id.cmp(&other.machine.id))
    }

    /// Whether `self` is a better qualifying match than `other` for the same machine.
    fn outranks(&self, other: &Self) -> bool {
        self.tier > other.tier
            || (self.tier == other.tier && self.matched_capability < other.matched_capability)
    }
}

impl CompatibilityResult {
    /// Builds the result for `capability` from unordered matches.
    ///
    /// Keeps one entry per machine ID (the highest-tier match, ties broken
    /// by capability ID) and sorts by the listing order.
    pub fn from_matches(
        capability: impl Into<String>,
        matches: impl IntoIterator<Item = MachineMatch>,
    ) -> Self {
        let mut best: HashMap<String, MachineMatch> = HashMap::new();
        for m in matches {
            match best.get(&m.machine.id) {
                Some(existing) if !m.outranks(existing) => {}
                _ => {
                    best.insert(m.machine.id.clone(), m);
                }
            }
        }

        let mut matches: Vec<MachineMatch> = best.into_values().collect();
        matches.sort_by(|a, b| a.listing_order(b));
        Self {
            capability: capability.into(),
            matches,
        }
    }

    /// Drops matches whose tier is below `min_tier`. Order is preserved.
    pub fn retain_min_tier(&mut self, min_tier: i32) {
        self.matches.retain(|m| m.tier >= min_tier);
    }

    /// Number of eligible machines.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Whether no machine is eligible.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Machine IDs in listing order.
    pub fn machine_ids(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.machine.id.as_str()).collect()
    }

    /// Whether a machine is part of the result.
    pub fn contains(&self, machine_id: &str) -> bool {
        self.matches.iter().any(|m| m.machine.id == machine_id)
    }

    /// Returns the match for a machine.
    pub fn get(&self, machine_id: &str) -> Option<&MachineMatch> {
        self.matches.iter().find(|m| m.machine.id == machine_id)
    }

    /// Iterates over matches in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &MachineMatch> {
        self.matches.iter()
    }
}

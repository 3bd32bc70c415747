//! Integrity checks for capability catalogs and machine records.
//!
//! Runs once when a catalog is loaded (or hot-swapped) and before machine
//! records are imported into a registry. Detects:
//! - Duplicate IDs
//! - References to unknown families or capabilities
//! - Substitution edges that cross families or loop onto themselves
//! - Circular substitution (the graph must be a DAG)
//! - Alias targets that are missing, chained, or shadowed
//! - Machines with no or unknown native capabilities
//!
//! Every check runs; all findings are returned together.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::catalog::CatalogConfig;
use crate::models::{Capability, CapabilityFamily, LegacyAlias, Machine, SubstitutionEdge};
use crate::taxonomy::CapabilityTaxonomy;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// ID of the offending entity (capability, family, alias, machine, tier label).
    pub subject: String,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A capability references a family that doesn't exist.
    UnknownFamily,
    /// An edge or machine references a capability that doesn't exist.
    UnknownCapability,
    /// An edge connects capabilities of different families.
    CrossFamilySubstitution,
    /// An edge points from a capability to itself.
    SelfSubstitution,
    /// Substitution graph contains a cycle.
    CyclicSubstitution,
    /// An alias targets a capability that doesn't exist.
    AliasTargetMissing,
    /// An alias targets another alias.
    AliasChained,
    /// An alias reuses the ID of a canonical capability.
    AliasShadowsCapability,
    /// Two tier labels differ only by case.
    DuplicateTierLabel,
    /// A machine declares no native capability.
    MachineWithoutCapability,
    /// A machine's native capability belongs to a family of another category.
    CategoryMismatch,
}

impl ValidationError {
    pub(crate) fn new(
        kind: ValidationErrorKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

fn into_result(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates the declarative parts of a capability taxonomy.
///
/// Checks:
/// 1. No duplicate family IDs
/// 2. No duplicate capability IDs
/// 3. Every capability names an existing family
/// 4. Both ends of every edge are existing capabilities
/// 5. No edge points at its own source
/// 6. No edge crosses families
/// 7. No circular substitution
pub fn validate_taxonomy(
    families: &[CapabilityFamily],
    capabilities: &[Capability],
    edges: &[SubstitutionEdge],
) -> ValidationResult {
    let mut errors = Vec::new();

    let mut family_ids = HashSet::new();
    for f in families {
        if !family_ids.insert(f.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                &f.id,
                format!("Duplicate family ID: {}", f.id),
            ));
        }
    }

    let mut family_of: HashMap<&str, &str> = HashMap::new();
    for c in capabilities {
        if family_of.insert(c.id.as_str(), c.family.as_str()).is_some() {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                &c.id,
                format!("Duplicate capability ID: {}", c.id),
            ));
        }
        if !family_ids.contains(c.family.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownFamily,
                &c.id,
                format!("Capability '{}' references unknown family '{}'", c.id, c.family),
            ));
        }
    }

    for e in edges {
        let mut endpoints_known = true;
        for end in [&e.specialized, &e.base] {
            if !family_of.contains_key(end.as_str()) {
                endpoints_known = false;
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownCapability,
                    end,
                    format!(
                        "Substitution '{}' -> '{}' references unknown capability '{}'",
                        e.specialized, e.base, end
                    ),
                ));
            }
        }

        if e.specialized == e.base {
            errors.push(ValidationError::new(
                ValidationErrorKind::SelfSubstitution,
                &e.specialized,
                format!("Capability '{}' substitutes for itself", e.specialized),
            ));
            continue;
        }

        if endpoints_known && family_of[e.specialized.as_str()] != family_of[e.base.as_str()] {
            errors.push(ValidationError::new(
                ValidationErrorKind::CrossFamilySubstitution,
                &e.specialized,
                format!(
                    "Substitution '{}' -> '{}' crosses families '{}' and '{}'",
                    e.specialized,
                    e.base,
                    family_of[e.specialized.as_str()],
                    family_of[e.base.as_str()]
                ),
            ));
        }
    }

    if let Some(cycle_err) = detect_cycles(edges) {
        errors.push(cycle_err);
    }

    into_result(errors)
}

/// Validates a whole catalog configuration in one pass.
///
/// Runs the taxonomy, alias and tier checks against the declared data and
/// returns every finding together, so one load reports all problems.
pub fn validate_catalog(config: &CatalogConfig) -> ValidationResult {
    let mut errors = Vec::new();

    let taxonomy = validate_taxonomy(
        &config.families,
        &config.capabilities,
        &config.substitutions,
    );
    if let Err(found) = taxonomy {
        errors.extend(found);
    }

    let declared: HashSet<&str> = config.capabilities.iter().map(|c| c.id.as_str()).collect();
    if let Err(found) = check_aliases(&config.legacy_aliases(), |id| declared.contains(id)) {
        errors.extend(found);
    }

    if let Err(found) = validate_tiers(&config.tiers) {
        errors.extend(found);
    }

    into_result(errors)
}

/// Validates legacy aliases against a built taxonomy.
///
/// Checks:
/// 1. No alias is declared twice
/// 2. No alias reuses a canonical capability ID
/// 3. No alias targets another alias
/// 4. Every target exists in the taxonomy
pub fn validate_aliases(aliases: &[LegacyAlias], taxonomy: &CapabilityTaxonomy) -> ValidationResult {
    check_aliases(aliases, |id| taxonomy.capability_exists(id))
}

fn check_aliases(aliases: &[LegacyAlias], is_capability: impl Fn(&str) -> bool) -> ValidationResult {
    let mut errors = Vec::new();

    let mut alias_ids = HashSet::new();
    for a in aliases {
        if !alias_ids.insert(a.alias.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                &a.alias,
                format!("Duplicate alias: {}", a.alias),
            ));
        }
        if is_capability(&a.alias) {
            errors.push(ValidationError::new(
                ValidationErrorKind::AliasShadowsCapability,
                &a.alias,
                format!("Alias '{}' shadows a canonical capability", a.alias),
            ));
        }
    }

    for a in aliases {
        if is_capability(&a.target) {
            continue;
        }
        if alias_ids.contains(a.target.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::AliasChained,
                &a.alias,
                format!("Alias '{}' points at alias '{}'", a.alias, a.target),
            ));
        } else {
            errors.push(ValidationError::new(
                ValidationErrorKind::AliasTargetMissing,
                &a.alias,
                format!(
                    "Alias '{}' targets unknown capability '{}'",
                    a.alias, a.target
                ),
            ));
        }
    }

    into_result(errors)
}

/// Validates tier labels: no two labels may differ only by case.
pub fn validate_tiers(tiers: &BTreeMap<String, i32>) -> ValidationResult {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for label in tiers.keys() {
        if !seen.insert(label.to_lowercase()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateTierLabel,
                label,
                format!("Tier label '{label}' differs from another only by case"),
            ));
        }
    }
    into_result(errors)
}

/// Validates machine records against a taxonomy before they enter a registry.
///
/// Checks:
/// 1. No duplicate machine IDs
/// 2. Every machine declares at least one native capability
/// 3. Every native capability exists in the taxonomy
/// 4. Every native capability's family is served by the machine's category
pub fn validate_machines(machines: &[Machine], taxonomy: &CapabilityTaxonomy) -> ValidationResult {
    let mut errors = Vec::new();

    let mut machine_ids = HashSet::new();
    for m in machines {
        if !machine_ids.insert(m.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                &m.id,
                format!("Duplicate machine ID: {}", m.id),
            ));
        }

        if m.capabilities.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MachineWithoutCapability,
                &m.id,
                format!("Machine '{}' has no native capability", m.id),
            ));
        }

        for cap in &m.capabilities {
            match taxonomy.family_of(cap) {
                Err(_) => errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownCapability,
                    &m.id,
                    format!("Machine '{}' references unknown capability '{}'", m.id, cap),
                )),
                Ok(family) if family.category != m.category => {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::CategoryMismatch,
                        &m.id,
                        format!(
                            "Machine '{}' ({}) holds '{}' from family '{}' ({})",
                            m.id, m.category, cap, family.id, family.category
                        ),
                    ))
                }
                Ok(_) => {}
            }
        }
    }

    into_result(errors)
}

/// Detects cycles in the substitution graph using DFS.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently in the recursion stack), a cycle exists. Self-loops are
/// reported separately and skipped here.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
fn detect_cycles(edges: &[SubstitutionEdge]) -> Option<ValidationError> {
    // specialized → bases
    let mut adj: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for e in edges.iter().filter(|e| e.specialized != e.base) {
        adj.entry(e.specialized.as_str())
            .or_default()
            .push(e.base.as_str());
    }

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    for &node in adj.keys() {
        if visited.contains(node) {
            continue;
        }
        if let Some(at) = find_back_edge(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicSubstitution,
                at,
                format!("Substitution cycle detected involving capability '{at}'"),
            ));
        }
    }

    None
}

/// Returns the node a back edge points at, if one is reachable from `node`.
fn find_back_edge<'a>(
    node: &'a str,
    adj: &BTreeMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    in_stack: &mut HashSet<&'a str>,
) -> Option<&'a str> {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(node) {
        for &next in neighbors {
            if in_stack.contains(next) {
                return Some(next);
            }
            if !visited.contains(next) {
                if let Some(at) = find_back_edge(next, adj, visited, in_stack) {
                    return Some(at);
                }
            }
        }
    }

    in_stack.remove(node);
    None
}

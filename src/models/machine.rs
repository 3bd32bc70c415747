//! Machine model.
//!
//! Machines are the physical resources jobs run on: lathes, mills,
//! mill-turn cells. Each machine belongs to one category, natively
//! provides one or more capabilities, and carries an operational status.
//!
//! Machines are owned by the external registry; the resolver only reads them.

use serde::{Deserialize, Serialize};

/// A machine as seen by the resolution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    /// Stable machine identifier.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Machine category (e.g., "lathe", "mill").
    pub category: String,
    /// Capability ids this machine natively provides.
    pub capabilities: Vec<String>,
    /// Tier label for display (e.g., "advanced").
    pub tier_label: String,
    /// Operational status.
    pub status: MachineStatus,
}

/// Operational status of a machine.
///
/// Only `Active` machines can execute work and are therefore eligible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineStatus {
    /// Available for work.
    #[default]
    Active,
    /// Decommissioned or parked.
    Inactive,
    /// Under maintenance.
    Maintenance,
}

impl Machine {
    /// Creates an active machine with the given ID and category.
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            category: category.into(),
            capabilities: Vec::new(),
            tier_label: String::new(),
            status: MachineStatus::Active,
        }
    }

    /// Creates an active lathe.
    pub fn lathe(id: impl Into<String>) -> Self {
        Self::new(id, "lathe")
    }

    /// Creates an active mill.
    pub fn mill(id: impl Into<String>) -> Self {
        Self::new(id, "mill")
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a native capability. Duplicates are ignored.
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        let capability = capability.into();
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    /// Sets the display tier label.
    pub fn with_tier_label(mut self, label: impl Into<String>) -> Self {
        self.tier_label = label.into();
        self
    }

    /// Sets the operational status.
    pub fn with_status(mut self, status: MachineStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether this machine natively provides a capability.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// Whether this machine can currently execute work.
    pub fn is_active(&self) -> bool {
        self.status == MachineStatus::Active
    }
}

impl MachineStatus {
    /// Lower-case status label.
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineStatus::Active => "active",
            MachineStatus::Inactive => "inactive",
            MachineStatus::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_builder() {
        let m = Machine::lathe("M1")
            .with_name("Okuma LB3000")
            .with_capability("live_tooling_turning")
            .with_capability("bar_fed_turning")
            .with_tier_label("advanced");

        assert_eq!(m.id, "M1");
        assert_eq!(m.name, "Okuma LB3000");
        assert_eq!(m.category, "lathe");
        assert_eq!(m.tier_label, "advanced");
        assert!(m.has_capability("bar_fed_turning"));
        assert!(!m.has_capability("dual_spindle_turning"));
        assert!(m.is_active());
    }

    #[test]
    fn test_duplicate_capability_ignored() {
        let m = Machine::mill("V1")
            .with_capability("three_axis_milling")
            .with_capability("three_axis_milling");
        assert_eq!(m.capabilities.len(), 1);
    }

    #[test]
    fn test_status() {
        let m = Machine::mill("V1").with_status(MachineStatus::Maintenance);
        assert!(!m.is_active());
        assert_eq!(m.status.to_string(), "maintenance");
        assert_eq!(MachineStatus::default(), MachineStatus::Active);
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&MachineStatus::Maintenance).unwrap();
        assert_eq!(json, "\"maintenance\"");
        let back: MachineStatus = serde_json::from_str("\"inactive\"").unwrap();
        assert_eq!(back, MachineStatus::Inactive);
    }

    #[test]
    fn test_machine_record_fields() {
        let m = Machine::mill("V1")
            .with_name("Haas VF2")
            .with_capability("three_axis_milling");
        let value = serde_json::to_value(&m).unwrap();
        let mut keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["capabilities", "category", "id", "name", "status", "tier_label"]
        );
    }
}

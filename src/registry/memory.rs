//! In-memory machine registry.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{MachineRegistry, RegistryError, RegistryResult};
use crate::models::{Machine, MachineStatus};

/// A [`MachineRegistry`] backed by a map behind a lock.
///
/// Suitable for tests, demos and embedders that mirror machine state in
/// process. Listings are ordered by machine ID.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    machines: RwLock<BTreeMap<String, Machine>>,
}

impl InMemoryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding `machines`. Later duplicates replace earlier ones.
    pub fn with_machines(machines: impl IntoIterator<Item = Machine>) -> Self {
        Self {
            machines: RwLock::new(machines.into_iter().map(|m| (m.id.clone(), m)).collect()),
        }
    }

    /// Inserts or replaces a machine, returning the previous record.
    pub fn upsert(&self, machine: Machine) -> RegistryResult<Option<Machine>> {
        let mut guard = self.machines.write().map_err(poisoned)?;
        Ok(guard.insert(machine.id.clone(), machine))
    }

    /// Removes a machine.
    pub fn remove(&self, id: &str) -> RegistryResult<Option<Machine>> {
        let mut guard = self.machines.write().map_err(poisoned)?;
        Ok(guard.remove(id))
    }

    /// Updates a machine's status. Returns `false` if the machine is unknown.
    pub fn set_status(&self, id: &str, status: MachineStatus) -> RegistryResult<bool> {
        let mut guard = self.machines.write().map_err(poisoned)?;
        match guard.get_mut(id) {
            Some(machine) => {
                machine.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Returns a copy of one machine.
    pub fn get(&self, id: &str) -> RegistryResult<Option<Machine>> {
        let guard = self.machines.read().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    /// Number of machines.
    pub fn len(&self) -> RegistryResult<usize> {
        Ok(self.machines.read().map_err(poisoned)?.len())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> RegistryError {
    RegistryError::Unavailable("registry lock poisoned".to_string())
}

#[async_trait]
impl MachineRegistry for InMemoryRegistry {
    async fn list_by_category(&self, category: &str) -> RegistryResult<Vec<Machine>> {
        let guard = self.machines.read().map_err(poisoned)?;
        Ok(guard
            .values()
            .filter(|m| m.category == category)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> RegistryResult<Vec<Machine>> {
        let guard = self.machines.read().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }
}

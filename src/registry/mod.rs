//! Machine registry read model.
//!
//! The registry is owned outside the engine (database, ERP sync, import
//! jobs). The resolver reads it through [`MachineRegistry`] on every query
//! and never caches what it reads, because machine status changes between
//! scheduling decisions.
//!
//! Both reads may suspend. Timeouts, retries and cancellation belong to the
//! implementation; the resolver propagates its errors unchanged.

mod memory;

pub use memory::InMemoryRegistry;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Machine;

/// Registry result type alias.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Registry read failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("machine registry unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the current machine records.
#[async_trait]
pub trait MachineRegistry: Send + Sync {
    /// Machines of one category, in any status. Unknown categories yield
    /// an empty list.
    async fn list_by_category(&self, category: &str) -> RegistryResult<Vec<Machine>>;

    /// Every machine, in any status.
    async fn list_all(&self) -> RegistryResult<Vec<Machine>>;
}

//! Capability-tier resolution for manufacturing scheduling.
//!
//! Answers one question for an external scheduler: which machines may run a
//! job that requires a given capability? Substitution between capabilities
//! follows explicit per-family DAGs (a dual-spindle lathe serves live-tooling
//! and bar-fed jobs, never the reverse), and deprecated capability names keep
//! resolving through a legacy alias table.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Capability`, `CapabilityFamily`,
//!   `SubstitutionEdge`, `LegacyAlias`, `Machine`, `CompatibilityResult`
//! - **`taxonomy`**: Validated substitution graph with precomputed closures,
//!   and the legacy alias resolver
//! - **`catalog`**: TOML-configured catalog snapshot with atomic hot reload
//! - **`validation`**: Integrity checks (duplicate IDs, DAG cycles, alias
//!   chains, machine records)
//! - **`registry`**: Machine read model trait and an in-memory implementation
//! - **`resolver`**: The eligibility computation
//! - **`query`**: Caller-facing validation and response shaping
//! - **`notify`**: Change notice shape for the live-update channel
//!
//! # Architecture
//!
//! This crate computes eligibility only. Sequencing, time slots and
//! utilization belong to the scheduler (`u-schedule`); persistence and the
//! push channel belong to their owners and are reached through traits.

pub mod catalog;
pub mod error;
pub mod models;
pub mod notify;
pub mod query;
pub mod registry;
pub mod resolver;
pub mod taxonomy;
pub mod validation;

pub use catalog::{Catalog, CatalogHandle};
pub use error::{CatalogError, UnknownCapability};
pub use query::{ResolutionQueryService, ResolveQuery};
pub use resolver::{CompatibilityResolver, ResolveError, ResolveFilters};

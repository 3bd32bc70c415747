//! Capability resolution domain models.
//!
//! Plain data types shared by the taxonomy, the machine registry and the
//! resolver. All types are serde-serializable so they can be loaded from
//! catalog files or registry snapshots.
//!
//! # Domain Mappings
//!
//! | u-capability | Shop floor | u-schedule |
//! |--------------|------------|------------|
//! | CapabilityFamily | Process family (turning, milling) | - |
//! | Capability | Required process of a work order | Skill |
//! | Machine | Lathe / mill on the floor | Resource |
//! | CompatibilityResult | Eligible machine list | Candidate list |

mod capability;
mod machine;
mod result;

pub use capability::{Capability, CapabilityFamily, LegacyAlias, SubstitutionEdge};
pub use machine::{Machine, MachineStatus};
pub use result::{CompatibilityResult, MachineMatch};

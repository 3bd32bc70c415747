//! Error types for catalog loading and capability lookup.

use std::path::PathBuf;
use thiserror::Error;

use crate::validation::{ValidationError, ValidationErrorKind};

/// A capability identifier that is neither canonical nor a registered alias.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown capability '{id}'")]
pub struct UnknownCapability {
    /// The identifier as it was looked up.
    pub id: String,
}

impl UnknownCapability {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Catalog result type alias.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Failures while building or loading a capability catalog.
///
/// Any of these is fatal at startup: no resolver can be built from a
/// catalog that failed to load.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("substitution cycle detected involving capability '{capability}'")]
    Cycle { capability: String },

    #[error("invalid catalog: {}", summarize(.0))]
    Invalid(Vec<ValidationError>),

    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
}

impl CatalogError {
    /// Builds the error for a failed validation pass.
    ///
    /// A substitution cycle takes precedence over every other finding.
    pub fn from_validation(errors: Vec<ValidationError>) -> Self {
        match errors
            .iter()
            .find(|e| e.kind == ValidationErrorKind::CyclicSubstitution)
        {
            Some(cycle) => CatalogError::Cycle {
                capability: cycle.subject.clone(),
            },
            None => CatalogError::Invalid(errors),
        }
    }

    /// Validation findings carried by this error, if any.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            CatalogError::Invalid(errors) => errors,
            _ => &[],
        }
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

//! Query boundary for schedulers, dashboards and tests.
//!
//! Turns free-text query parameters into typed filters, runs the resolver,
//! and shapes both results and failures into serializable responses.
//! Bad input becomes a structured 400-class error; registry outages become
//! 503; catalog integrity failures become 500.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::CatalogError;
use crate::models::{CompatibilityResult, MachineMatch};
use crate::resolver::{CompatibilityResolver, ResolveError, ResolveFilters};

/// Raw query as received from a caller (query string or JSON body).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveQuery {
    /// Canonical or legacy capability identifier.
    pub capability: String,
    /// Optional machine category.
    #[serde(default)]
    pub category: Option<String>,
    /// Optional minimum tier: a catalog tier label or an integer rank.
    #[serde(default)]
    pub min_tier: Option<String>,
}

/// One eligible machine as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineView {
    pub machine_id: String,
    pub name: String,
    pub category: String,
    pub matched_capability: String,
    pub tier_label: String,
}

/// Successful response: the canonical capability and its eligible machines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    /// Canonical capability the request resolved to.
    pub capability: String,
    /// Eligible machines, best fit first.
    pub machines: Vec<MachineView>,
}

/// Error class exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStatus {
    /// Caller input was wrong; do not retry unchanged.
    BadRequest,
    /// A collaborator is down; the caller may retry.
    ServiceUnavailable,
    /// Catalog integrity failure.
    Internal,
}

/// Client-facing error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code}: {message}")]
pub struct QueryError {
    pub status: ErrorStatus,
    /// Stable machine-readable code (e.g., "unknown_capability").
    pub code: String,
    pub message: String,
    /// Individual catalog findings, when a reload was rejected.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// Status code and JSON body, ready for any transport.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryReply {
    pub status: u16,
    pub body: Value,
}

impl ErrorStatus {
    /// HTTP-style status code.
    pub fn code(&self) -> u16 {
        match self {
            ErrorStatus::BadRequest => 400,
            ErrorStatus::ServiceUnavailable => 503,
            ErrorStatus::Internal => 500,
        }
    }
}

impl QueryError {
    fn new(status: ErrorStatus, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.into(),
            details: Vec::new(),
        }
    }

    fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorStatus::BadRequest, "malformed_query", message)
    }

    /// HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        self.status.code()
    }
}

impl From<ResolveError> for QueryError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::UnknownCapability(e) => {
                QueryError::new(ErrorStatus::BadRequest, "unknown_capability", e.to_string())
            }
            ResolveError::Registry(e) => {
                QueryError::new(ErrorStatus::ServiceUnavailable, "registry_unavailable", e.to_string())
            }
        }
    }
}

impl From<CatalogError> for QueryError {
    fn from(err: CatalogError) -> Self {
        let details = err
            .validation_errors()
            .iter()
            .map(|e| format!("{}: {}", e.subject, e.message))
            .collect();
        QueryError {
            details,
            ..QueryError::new(ErrorStatus::Internal, "catalog_invalid", err.to_string())
        }
    }
}

impl From<MachineMatch> for MachineView {
    fn from(m: MachineMatch) -> Self {
        Self {
            machine_id: m.machine.id,
            name: m.machine.name,
            category: m.machine.category,
            matched_capability: m.matched_capability,
            tier_label: m.machine.tier_label,
        }
    }
}

impl ResolveQuery {
    /// Creates a query for a capability.
    pub fn new(capability: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            category: None,
            min_tier: None,
        }
    }

    /// Sets the category filter.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the minimum tier filter.
    pub fn with_min_tier(mut self, min_tier: impl Into<String>) -> Self {
        self.min_tier = Some(min_tier.into());
        self
    }
}

/// Validation and response-shaping wrapper around [`CompatibilityResolver`].
#[derive(Debug, Clone)]
pub struct ResolutionQueryService {
    resolver: CompatibilityResolver,
}

impl ResolutionQueryService {
    pub fn new(resolver: CompatibilityResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &CompatibilityResolver {
        &self.resolver
    }

    /// Validates a raw query, resolves it and shapes the response.
    pub async fn resolve(&self, query: &ResolveQuery) -> Result<ResolveResponse, QueryError> {
        let capability = normalize_capability(&query.capability)?;
        let filters = self.filters(query)?;
        let result = self.resolver.resolve(&capability, &filters).await?;
        Ok(shape(result))
    }

    /// JSON-in, JSON-out entry point for transports.
    ///
    /// Never fails: every error is folded into the reply body.
    pub async fn handle_json(&self, body: &str) -> QueryReply {
        let outcome = match serde_json::from_str::<ResolveQuery>(body) {
            Ok(query) => self.resolve(&query).await,
            Err(e) => Err(QueryError::malformed(format!("invalid request body: {e}"))),
        };
        match outcome.and_then(|response| to_value(&response)) {
            Ok(body) => QueryReply { status: 200, body },
            Err(err) => QueryReply {
                status: err.status_code(),
                body: to_value(&err).unwrap_or(Value::Null),
            },
        }
    }

    /// Validates and swaps in a new catalog. Failures keep the current one.
    pub fn reload_catalog(&self, toml_text: &str) -> Result<(), QueryError> {
        self.resolver
            .catalog()
            .reload_from_toml(toml_text)
            .map_err(QueryError::from)
    }

    fn filters(&self, query: &ResolveQuery) -> Result<ResolveFilters, QueryError> {
        let mut filters = ResolveFilters::none();
        if let Some(category) = &query.category {
            filters.category = Some(normalize_category(category)?);
        }
        if let Some(min_tier) = &query.min_tier {
            filters.min_tier = Some(self.parse_tier(min_tier)?);
        }
        Ok(filters)
    }

    fn parse_tier(&self, raw: &str) -> Result<i32, QueryError> {
        let label = raw.trim();
        if let Ok(rank) = label.parse::<i32>() {
            return Ok(rank);
        }
        self.resolver
            .catalog()
            .snapshot()
            .tier_rank(label)
            .ok_or_else(|| QueryError::malformed(format!("unknown tier '{label}'")))
    }
}

fn normalize_capability(raw: &str) -> Result<String, QueryError> {
    let capability = raw.trim().to_string();
    if capability.is_empty() {
        return Err(QueryError::malformed("capability is required"));
    }
    Ok(capability)
}

fn normalize_category(raw: &str) -> Result<String, QueryError> {
    let category = raw.trim().to_string();
    if category.is_empty() {
        return Err(QueryError::malformed("category must not be blank"));
    }
    if !category
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '))
    {
        return Err(QueryError::malformed(format!("invalid category '{}'", raw.trim())));
    }
    Ok(category)
}

fn shape(result: CompatibilityResult) -> ResolveResponse {
    ResolveResponse {
        capability: result.capability,
        machines: result.matches.into_iter().map(MachineView::from).collect(),
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, QueryError> {
    serde_json::to_value(value).map_err(|e| {
        QueryError::new(ErrorStatus::Internal, "serialization_failed", e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CatalogHandle};
    use crate::models::{Machine, MachineStatus};
    use crate::registry::{InMemoryRegistry, MachineRegistry, RegistryError, RegistryResult};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    fn service_with(registry: Arc<dyn MachineRegistry>) -> ResolutionQueryService {
        ResolutionQueryService::new(CompatibilityResolver::new(
            Catalog::standard().unwrap(),
            registry,
        ))
    }

    fn service() -> ResolutionQueryService {
        service_with(Arc::new(InMemoryRegistry::with_machines(vec![
            Machine::lathe("M1")
                .with_name("Twin Turret")
                .with_capability("dual_spindle_turning")
                .with_tier_label("premium"),
            Machine::lathe("M2")
                .with_name("Basic Lathe")
                .with_capability("single_spindle_turning")
                .with_tier_label("standard"),
            Machine::lathe("M3")
                .with_name("Idle")
                .with_capability("dual_spindle_turning")
                .with_status(MachineStatus::Inactive),
        ])))
    }

    #[tokio::test]
    async fn test_resolve_shapes_response() {
        let response = service()
            .resolve(&ResolveQuery::new("  turning "))
            .await
            .unwrap();
        assert_eq!(response.capability, "single_spindle_turning");
        assert_eq!(
            response.machines,
            vec![
                MachineView {
                    machine_id: "M1".into(),
                    name: "Twin Turret".into(),
                    category: "lathe".into(),
                    matched_capability: "dual_spindle_turning".into(),
                    tier_label: "premium".into(),
                },
                MachineView {
                    machine_id: "M2".into(),
                    name: "Basic Lathe".into(),
                    category: "lathe".into(),
                    matched_capability: "single_spindle_turning".into(),
                    tier_label: "standard".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_min_tier_by_label_and_rank() {
        let s = service();
        let by_label = s
            .resolve(&ResolveQuery::new("single_spindle_turning").with_min_tier("Premium"))
            .await
            .unwrap();
        let by_rank = s
            .resolve(&ResolveQuery::new("single_spindle_turning").with_min_tier(" 3 "))
            .await
            .unwrap();
        assert_eq!(by_label, by_rank);
        assert_eq!(by_label.machines.len(), 1);
        assert_eq!(by_label.machines[0].machine_id, "M1");
    }

    #[tokio::test]
    async fn test_unknown_tier_is_bad_request() {
        let err = service()
            .resolve(&ResolveQuery::new("turning").with_min_tier("legendary"))
            .await
            .unwrap_err();
        assert_eq!(err.status, ErrorStatus::BadRequest);
        assert_eq!(err.code, "malformed_query");
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_category_normalized() {
        let response = service()
            .resolve(&ResolveQuery::new("turning").with_category(" lathe "))
            .await
            .unwrap();
        assert_eq!(response.machines.len(), 2);
    }

    #[tokio::test]
    async fn test_identifiers_are_case_sensitive() {
        let catalog = Catalog::from_toml_str(
            r#"
            [[families]]
            id = "Turning"
            category = "Lathe"

            [[capabilities]]
            id = "LiveTooling"
            family = "Turning"
            tier = 2
            "#,
        )
        .unwrap();
        let registry = InMemoryRegistry::with_machines(vec![Machine::new("M1", "Lathe")
            .with_name("Mixed Case Lathe")
            .with_capability("LiveTooling")]);
        let s = ResolutionQueryService::new(CompatibilityResolver::new(
            catalog,
            Arc::new(registry),
        ));

        let response = s.resolve(&ResolveQuery::new(" LiveTooling ")).await.unwrap();
        assert_eq!(response.capability, "LiveTooling");
        assert_eq!(response.machines.len(), 1);

        let filtered = s
            .resolve(&ResolveQuery::new("LiveTooling").with_category("Lathe"))
            .await
            .unwrap();
        assert_eq!(filtered.machines.len(), 1);

        let err = s.resolve(&ResolveQuery::new("livetooling")).await.unwrap_err();
        assert_eq!(err.code, "unknown_capability");
    }

    #[tokio::test]
    async fn test_unknown_category_is_empty_success() {
        let response = service()
            .resolve(&ResolveQuery::new("turning").with_category("grinder"))
            .await
            .unwrap();
        assert!(response.machines.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_inputs() {
        let s = service();
        for query in [
            ResolveQuery::new("   "),
            ResolveQuery::new("turning").with_category(""),
            ResolveQuery::new("turning").with_category("lathe; drop table"),
        ] {
            let err = s.resolve(&query).await.unwrap_err();
            assert_eq!(err.status, ErrorStatus::BadRequest, "{query:?}");
        }
    }

    #[tokio::test]
    async fn test_unknown_capability_is_bad_request() {
        let err = service()
            .resolve(&ResolveQuery::new("not_a_real_capability"))
            .await
            .unwrap_err();
        assert_eq!(err.code, "unknown_capability");
        assert_eq!(err.status_code(), 400);
    }

    struct Offline;

    #[async_trait]
    impl MachineRegistry for Offline {
        async fn list_by_category(&self, _category: &str) -> RegistryResult<Vec<Machine>> {
            Err(RegistryError::Unavailable("timeout".into()))
        }

        async fn list_all(&self) -> RegistryResult<Vec<Machine>> {
            Err(RegistryError::Unavailable("timeout".into()))
        }
    }

    /// Swaps the catalog while the resolver is waiting on the registry.
    struct ReloadingRegistry {
        catalog: CatalogHandle,
        machines: InMemoryRegistry,
    }

    #[async_trait]
    impl MachineRegistry for ReloadingRegistry {
        async fn list_by_category(&self, category: &str) -> RegistryResult<Vec<Machine>> {
            self.catalog
                .reload_from_toml(
                    r#"
                    [[families]]
                    id = "turning"
                    category = "lathe"

                    [[capabilities]]
                    id = "plain_turning"
                    family = "turning"

                    [aliases]
                    turning = "plain_turning"
                    "#,
                )
                .map_err(|e| RegistryError::Unavailable(e.to_string()))?;
            self.machines.list_by_category(category).await
        }

        async fn list_all(&self) -> RegistryResult<Vec<Machine>> {
            self.machines.list_all().await
        }
    }

    #[tokio::test]
    async fn test_reload_during_query_keeps_one_snapshot() {
        let catalog = CatalogHandle::new(Catalog::standard().unwrap());
        let registry = ReloadingRegistry {
            catalog: catalog.clone(),
            machines: InMemoryRegistry::with_machines(vec![Machine::lathe("M2")
                .with_name("Basic Lathe")
                .with_capability("single_spindle_turning")]),
        };
        let s = ResolutionQueryService::new(CompatibilityResolver::new(
            catalog.clone(),
            Arc::new(registry),
        ));

        let response = s.resolve(&ResolveQuery::new("turning")).await.unwrap();
        assert_eq!(response.capability, "single_spindle_turning");
        assert_eq!(response.machines.len(), 1);
        assert_eq!(response.machines[0].matched_capability, "single_spindle_turning");

        // The next query sees the swapped catalog.
        let response = s.resolve(&ResolveQuery::new("turning")).await.unwrap();
        assert_eq!(response.capability, "plain_turning");
        assert!(response.machines.is_empty());
    }

    #[tokio::test]
    async fn test_registry_outage_is_unavailable() {
        let err = service_with(Arc::new(Offline))
            .resolve(&ResolveQuery::new("turning"))
            .await
            .unwrap_err();
        assert_eq!(err.status, ErrorStatus::ServiceUnavailable);
        assert_eq!(err.status_code(), 503);
    }

    #[tokio::test]
    async fn test_handle_json_success() {
        let reply = service()
            .handle_json(r#"{"capability": "dual_spindle_turning", "minTier": "premium"}"#)
            .await;
        assert_eq!(reply.status, 200);
        assert_eq!(
            reply.body,
            json!({
                "capability": "dual_spindle_turning",
                "machines": [{
                    "machineId": "M1",
                    "name": "Twin Turret",
                    "category": "lathe",
                    "matchedCapability": "dual_spindle_turning",
                    "tierLabel": "premium"
                }]
            })
        );
    }

    #[test]
    fn test_reload_cycle_has_no_details() {
        let err = service()
            .reload_catalog(
                r#"
                [[families]]
                id = "milling"
                category = "mill"

                [[capabilities]]
                id = "a"
                family = "milling"

                [[capabilities]]
                id = "b"
                family = "milling"

                [[substitutions]]
                specialized = "a"
                base = "b"

                [[substitutions]]
                specialized = "b"
                base = "a"
                "#,
            )
            .unwrap_err();
        assert_eq!(err.code, "catalog_invalid");
        assert!(err.details.is_empty());
        assert!(err.message.contains("cycle"));
    }

    #[tokio::test]
    async fn test_handle_json_errors() {
        let s = service();

        let reply = s.handle_json("not json").await;
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body["code"], "malformed_query");

        let reply = s.handle_json(r#"{"capability": "bogus"}"#).await;
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body["status"], "bad_request");
        assert_eq!(reply.body["code"], "unknown_capability");
    }

    #[test]
    fn test_reload_failure_is_internal() {
        let s = service();
        let err = s
            .reload_catalog("[[capabilities]]\nid = \"x\"\nfamily = \"nowhere\"\n")
            .unwrap_err();
        assert_eq!(err.status, ErrorStatus::Internal);
        assert_eq!(err.status_code(), 500);
        assert_eq!(
            err.details,
            vec!["x: Capability 'x' references unknown family 'nowhere'".to_string()]
        );
        assert!(s.resolver().catalog().snapshot().taxonomy().capability_exists("bar_fed_turning"));
    }
}

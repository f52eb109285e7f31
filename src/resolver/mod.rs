//! Configuration resolver
//!
//! Three stages run in sequence, each consuming the previous stage's output:
//!
//! 1. [`validation::validate_config`] rejects bad input with every problem listed
//! 2. [`normalize::normalize`] fills defaults and merges tags and labels
//! 3. [`graph::build_plan`] emits ordered resource intents
//!
//! The only I/O is the Kubernetes version lookup between stages 1 and 2, and it
//! only happens when no version is pinned. Graph constraints never depend on the
//! version, so [`precheck_constraints`] reports them before the lookup.

pub mod diff;
pub mod graph;
pub mod intent;
pub mod normalize;
pub mod validation;

use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{LookupError, VersionCatalog, VersionLookup};
use crate::config::input::ClusterConfig;
use crate::model::ValidatedConfig;

pub use diff::{diff_plans, ChangeAction, PlannedChange};
pub use graph::{build_plan, check_constraints, GraphConstraint};
pub use intent::{Plan, ResourceIntent, ResourceKind, ResourceParams};
pub use normalize::{normalize, NormalizedConfig, ResolverDefaults};
pub use validation::{validate_config, ValidationMessage, ValidationResult, ValidationSeverity};

/// Errors from a resolution pass
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Configuration is invalid ({} error(s))", .0.errors().count())]
    Validation(ValidationResult),

    #[error("Kubernetes version lookup failed: {0}")]
    ExternalLookup(#[from] LookupError),

    #[error("Resource graph is invalid: {}", format_constraints(.0))]
    GraphConstraint(Vec<GraphConstraint>),

    #[error("Default node pool '{pool}' cannot be removed; replace it only after it autoscales to zero")]
    CannotRemoveDefaultPool { pool: String },

    #[error("Plan could not be serialized: {0}")]
    Serialize(String),
}

fn format_constraints(constraints: &[GraphConstraint]) -> String {
    constraints
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Version stamped on the throwaway normalization used by [`precheck_constraints`]
const PRECHECK_VERSION: &str = "0.0.0-precheck";

/// Graph constraints for a validated configuration, without a version lookup
pub fn precheck_constraints(
    validated: &ValidatedConfig,
    defaults: &ResolverDefaults,
) -> Vec<GraphConstraint> {
    let normalized = normalize(validated.clone(), PRECHECK_VERSION.to_string(), defaults);
    check_constraints(&normalized)
}

/// Resolves cluster configurations into plans
pub struct Resolver<'a> {
    catalog: &'a dyn VersionCatalog,
    defaults: ResolverDefaults,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a dyn VersionCatalog) -> Self {
        Self {
            catalog,
            defaults: ResolverDefaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: ResolverDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Run all three stages. The catalog is only consulted after validation
    /// succeeds and when the configuration pins no version.
    pub async fn resolve(&self, config: &ClusterConfig) -> Result<Plan, ResolveError> {
        let validated = validate_config(config).map_err(ResolveError::Validation)?;
        debug!(
            "Validated cluster '{}' with {} warning(s)",
            validated.cluster.name,
            validated.warnings.len()
        );

        let violations = precheck_constraints(&validated, &self.defaults);
        if !violations.is_empty() {
            return Err(ResolveError::GraphConstraint(violations));
        }

        let version = match &validated.cluster.version {
            Some(version) => version.clone(),
            None => {
                let prefix = validated
                    .cluster
                    .version_prefix
                    .clone()
                    .unwrap_or_else(|| self.defaults.version_prefix.clone());
                let lookup = VersionLookup::new(self.catalog);
                lookup.resolve(&prefix).await?
            }
        };

        let normalized = normalize(validated, version, &self.defaults);
        let plan = build_plan(normalized)?;

        info!(
            "Resolved cluster '{}' into {} resource intent(s)",
            config.cluster_name,
            plan.intents.len()
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{KubernetesVersion, StaticCatalog};
    use crate::config::input::{MaintenancePolicyInput, NodePoolInput};
    use async_trait::async_trait;

    /// Fails the test if the resolver reaches the catalog
    struct UnreachableCatalog;

    #[async_trait]
    impl VersionCatalog for UnreachableCatalog {
        async fn available_versions(&self) -> Result<Vec<KubernetesVersion>, LookupError> {
            panic!("catalog must not be consulted");
        }
    }

    struct FailingCatalog;

    #[async_trait]
    impl VersionCatalog for FailingCatalog {
        async fn available_versions(&self) -> Result<Vec<KubernetesVersion>, LookupError> {
            Err(LookupError::Status(503))
        }
    }

    fn catalog() -> StaticCatalog {
        StaticCatalog::from_slugs(["1.30.5-do.2", "1.31.1-do.4", "1.31.2-do.0"])
    }

    #[tokio::test]
    async fn test_resolves_latest_version() {
        let catalog = catalog();
        let resolver = Resolver::new(&catalog);
        let plan = resolver
            .resolve(&ClusterConfig::new("prod-k8s", "nyc3"))
            .await
            .unwrap();
        assert_eq!(plan.cluster().unwrap().version, "1.31.2-do.0");
    }

    #[tokio::test]
    async fn test_version_prefix_override() {
        let catalog = catalog();
        let mut config = ClusterConfig::new("prod-k8s", "nyc3");
        config.version_prefix = Some("1.30.".to_string());

        let plan = Resolver::new(&catalog).resolve(&config).await.unwrap();
        assert_eq!(plan.cluster().unwrap().version, "1.30.5-do.2");
    }

    #[tokio::test]
    async fn test_pinned_version_skips_catalog() {
        let mut config = ClusterConfig::new("prod-k8s", "nyc3");
        config.kubernetes_version = Some("1.29.9-do.0".to_string());

        let plan = Resolver::new(&UnreachableCatalog)
            .resolve(&config)
            .await
            .unwrap();
        assert_eq!(plan.cluster().unwrap().version, "1.29.9-do.0");
    }

    #[tokio::test]
    async fn test_invalid_config_never_reaches_catalog() {
        let mut config = ClusterConfig::new("UPPER", "nyc3");
        config.node_pools = vec![NodePoolInput::new("compute", "c-4", 3)];

        match Resolver::new(&UnreachableCatalog).resolve(&config).await {
            Err(ResolveError::Validation(result)) => {
                assert!(result.has_code(validation::codes::INVALID_NAME));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_graph_constraints_reported_before_lookup() {
        let mut config = ClusterConfig::new("prod-k8s", "nyc3");
        config.create_vpc = false;
        config.existing_vpc_uuid = Some(String::new());

        match Resolver::new(&FailingCatalog).resolve(&config).await {
            Err(ResolveError::GraphConstraint(violations)) => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].code, graph::codes::EMPTY_VPC_REFERENCE);
            }
            other => panic!("Expected graph constraint error, got {:?}", other),
        }
    }

    #[test]
    fn test_precheck_constraints() {
        let mut config = ClusterConfig::new("prod-k8s", "nyc3");
        config.registry_integration = true;
        let validated = validate_config(&config).unwrap();

        let violations = precheck_constraints(&validated, &ResolverDefaults::default());
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].code,
            graph::codes::REGISTRY_INTEGRATION_WITHOUT_REGISTRY
        );

        let validated = validate_config(&ClusterConfig::new("prod-k8s", "nyc3")).unwrap();
        assert!(precheck_constraints(&validated, &ResolverDefaults::default()).is_empty());
    }

    #[tokio::test]
    async fn test_bad_maintenance_time() {
        let mut config = ClusterConfig::new("prod-k8s", "nyc3");
        config.maintenance_policy = Some(MaintenancePolicyInput {
            start_time: "25:00".to_string(),
            day: "sunday".to_string(),
        });

        let err = Resolver::new(&UnreachableCatalog)
            .resolve(&config)
            .await
            .unwrap_err();
        match err {
            ResolveError::Validation(result) => {
                let msg = result.errors().next().unwrap();
                assert!(msg.message.contains("HH:MM"));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_surfaces() {
        let err = Resolver::new(&FailingCatalog)
            .resolve(&ClusterConfig::new("prod-k8s", "nyc3"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::ExternalLookup(LookupError::Status(503))
        ));
    }

    #[tokio::test]
    async fn test_custom_defaults() {
        let catalog = catalog();
        let defaults = ResolverDefaults {
            default_pool_count: 5,
            ..ResolverDefaults::default()
        };
        let plan = Resolver::new(&catalog)
            .with_defaults(defaults)
            .resolve(&ClusterConfig::new("prod-k8s", "nyc3"))
            .await
            .unwrap();
        assert_eq!(plan.cluster().unwrap().default_node_pool.node_count, 5);
    }

    #[test]
    fn test_error_display() {
        let err = ResolveError::CannotRemoveDefaultPool {
            pool: "main".to_string(),
        };
        assert!(err.to_string().contains("'main'"));

        let err = ResolveError::Validation(ValidationResult::new().error(
            "INVALID_NAME",
            "cluster_name",
            "bad",
            None,
        ));
        assert_eq!(err.to_string(), "Configuration is invalid (1 error(s))");
    }
}

//! Resource graph builder
//!
//! Emits one [`ResourceIntent`] per infrastructure object and orders them so
//! every dependency precedes its dependents. Intents are first laid out in a
//! fixed insertion order; Kahn's algorithm then breaks ties by that order, so
//! identical input always produces the same sequence.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::intent::{
    names, AddonParams, NetworkRef, Plan, RegistryIntegrationParams, ResourceIntent,
    ResourceParams,
};
use super::normalize::{NormalizedConfig, NormalizedNetwork};
use super::validation::{ValidationMessage, ValidationSeverity};
use super::ResolveError;
use crate::model::AddonKind;

/// Stable codes for graph constraint violations
pub mod codes {
    pub const EMPTY_VPC_REFERENCE: &str = "EMPTY_VPC_REFERENCE";
    pub const UNKNOWN_ADDON_KEY: &str = "UNKNOWN_ADDON_KEY";
    pub const REGISTRY_INTEGRATION_WITHOUT_REGISTRY: &str = "REGISTRY_INTEGRATION_WITHOUT_REGISTRY";
    pub const DANGLING_DEPENDENCY: &str = "DANGLING_DEPENDENCY";
    pub const DEPENDENCY_CYCLE: &str = "DEPENDENCY_CYCLE";
}

/// A structural problem that prevents a valid plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConstraint {
    pub code: String,
    /// Logical name of the offending resource
    pub resource: String,
    pub message: String,
}

impl GraphConstraint {
    fn new(code: &str, resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            resource: resource.into(),
            message: message.into(),
        }
    }
}

impl From<GraphConstraint> for ValidationMessage {
    fn from(constraint: GraphConstraint) -> Self {
        ValidationMessage {
            severity: ValidationSeverity::Error,
            code: constraint.code,
            field: constraint.resource,
            message: constraint.message,
            suggestion: None,
        }
    }
}

impl fmt::Display for GraphConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.resource, self.message)
    }
}

// ============================================================================
// SBIO: Pure graph construction (no I/O)
// ============================================================================

/// Constraints that only become visible once everything is put together
pub fn check_constraints(config: &NormalizedConfig) -> Vec<GraphConstraint> {
    let mut violations = Vec::new();

    if let NormalizedNetwork::Existing { vpc_uuid } = &config.network {
        if vpc_uuid.is_empty() {
            violations.push(GraphConstraint::new(
                codes::EMPTY_VPC_REFERENCE,
                names::CLUSTER,
                "create_vpc is false but existing_vpc_uuid is empty",
            ));
        }
    }

    for (kind, addon) in &config.addons {
        for key in addon.config.keys() {
            if !kind.accepts_key(key) {
                violations.push(GraphConstraint::new(
                    codes::UNKNOWN_ADDON_KEY,
                    names::addon(kind.name()),
                    format!(
                        "Config key '{}' is not recognised; known keys: {}",
                        key,
                        kind.known_config_keys().join(", ")
                    ),
                ));
            }
        }
    }

    if config.cluster.registry_integration && config.registry.is_none() {
        violations.push(GraphConstraint::new(
            codes::REGISTRY_INTEGRATION_WITHOUT_REGISTRY,
            names::REGISTRY_INTEGRATION,
            "registry_integration is enabled but no registry is configured",
        ));
    }

    violations
}

/// Intents in insertion order, before topological sorting
pub fn emit_intents(config: &NormalizedConfig) -> Vec<ResourceIntent> {
    let mut intents = Vec::new();

    if let NormalizedNetwork::Create(vpc) = &config.network {
        intents.push(ResourceIntent::new(names::VPC, ResourceParams::Vpc(vpc.clone())));
    }

    let mut cluster = ResourceIntent::new(
        names::CLUSTER,
        ResourceParams::Cluster(config.cluster.clone()),
    );
    if let NetworkRef::Managed { resource } = &config.cluster.vpc {
        cluster = cluster.depends_on(resource.clone());
    }
    intents.push(cluster);

    for pool in &config.node_pools {
        intents.push(
            ResourceIntent::new(
                names::node_pool(&pool.name),
                ResourceParams::NodePool(pool.clone()),
            )
            .depends_on(names::CLUSTER),
        );
    }

    if let Some(firewall) = &config.firewall {
        intents.push(
            ResourceIntent::new(names::FIREWALL, ResourceParams::Firewall(firewall.clone()))
                .depends_on(names::CLUSTER),
        );
    }

    if let Some(registry) = &config.registry {
        intents.push(ResourceIntent::new(
            names::CONTAINER_REGISTRY,
            ResourceParams::ContainerRegistry(registry.registry.clone()),
        ));
        intents.push(
            ResourceIntent::new(
                names::REGISTRY_CREDENTIALS,
                ResourceParams::RegistryCredentials(registry.credentials.clone()),
            )
            .depends_on(names::CONTAINER_REGISTRY),
        );
        if config.cluster.registry_integration {
            intents.push(
                ResourceIntent::new(
                    names::REGISTRY_INTEGRATION,
                    ResourceParams::RegistryIntegration(RegistryIntegrationParams {
                        cluster: config.cluster.name.clone(),
                        registry: registry.registry.name.clone(),
                    }),
                )
                .depends_on(names::CLUSTER)
                .depends_on(names::REGISTRY_CREDENTIALS),
            );
        }
    }

    for kind in AddonKind::ALL {
        let Some(addon) = config.addons.get(&kind).filter(|a| a.enabled) else {
            continue;
        };
        intents.push(
            ResourceIntent::new(
                names::addon(kind.name()),
                ResourceParams::AddonRelease(AddonParams {
                    addon: kind,
                    chart: kind.chart().to_string(),
                    repository: kind.repository().to_string(),
                    namespace: kind.namespace().to_string(),
                    version: addon.version.clone(),
                    values: addon.config.clone(),
                }),
            )
            .depends_on(names::CLUSTER),
        );
    }

    if let Some(project) = &config.project {
        let mut intent = ResourceIntent::new(
            names::PROJECT,
            ResourceParams::Project(project.clone()),
        )
        .depends_on(names::CLUSTER);
        for member in [names::VPC, names::FIREWALL, names::CONTAINER_REGISTRY] {
            if intents.iter().any(|i| i.name == member) {
                intent = intent.depends_on(member);
            }
        }
        intents.push(intent);
    }

    intents
}

/// Stable topological sort. Among ready intents the one inserted first wins.
pub fn order_intents(
    intents: Vec<ResourceIntent>,
) -> Result<Vec<ResourceIntent>, Vec<GraphConstraint>> {
    let index: HashMap<&str, usize> = intents
        .iter()
        .enumerate()
        .map(|(i, intent)| (intent.name.as_str(), i))
        .collect();

    let mut violations = Vec::new();
    let mut in_degree = vec![0usize; intents.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); intents.len()];

    for (i, intent) in intents.iter().enumerate() {
        for dep in &intent.depends_on {
            match index.get(dep.as_str()) {
                Some(&d) => {
                    in_degree[i] += 1;
                    dependents[d].push(i);
                }
                None => violations.push(GraphConstraint::new(
                    codes::DANGLING_DEPENDENCY,
                    intent.name.clone(),
                    format!("Depends on '{}', which is not part of the plan", dep),
                )),
            }
        }
    }
    if !violations.is_empty() {
        return Err(violations);
    }

    let mut ready: BTreeSet<usize> = (0..intents.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(intents.len());

    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &dependent in &dependents[next] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() != intents.len() {
        let stuck: Vec<_> = intents
            .iter()
            .enumerate()
            .filter(|(i, _)| in_degree[*i] > 0)
            .map(|(_, intent)| intent.name.clone())
            .collect();
        return Err(stuck
            .into_iter()
            .map(|name| {
                GraphConstraint::new(
                    codes::DEPENDENCY_CYCLE,
                    name,
                    "Part of a dependency cycle",
                )
            })
            .collect());
    }

    let mut slots: Vec<Option<ResourceIntent>> = intents.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect())
}

/// Record the project's members in plan order
fn fill_project_members(intents: &mut [ResourceIntent]) {
    let positions: HashMap<String, usize> = intents
        .iter()
        .enumerate()
        .map(|(i, intent)| (intent.name.clone(), i))
        .collect();

    for intent in intents.iter_mut() {
        let depends_on = intent.depends_on.clone();
        if let ResourceParams::Project(project) = &mut intent.resource {
            let mut members = depends_on;
            members.sort_by_key(|name| positions.get(name).copied().unwrap_or(usize::MAX));
            project.resources = members;
        }
    }
}

/// Build the ordered plan for a normalized configuration.
/// Pure function - no I/O.
pub fn build_plan(config: NormalizedConfig) -> Result<Plan, ResolveError> {
    let violations = check_constraints(&config);
    if !violations.is_empty() {
        return Err(ResolveError::GraphConstraint(violations));
    }

    let intents = emit_intents(&config);
    let mut ordered = order_intents(intents).map_err(ResolveError::GraphConstraint)?;
    fill_project_members(&mut ordered);

    debug!("Built plan with {} resource intent(s)", ordered.len());

    Plan::new(ordered, config.common_tags, config.warnings)
        .map_err(|e| ResolveError::Serialize(e.to_string()))
}

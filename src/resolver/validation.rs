//! Input validation for cluster configurations
//!
//! Every rule runs on every input; failures are collected into a single
//! [`ValidationResult`] so a user sees all problems in one pass. Warnings ride
//! along with a successful result and end up in the emitted plan.

use std::collections::{BTreeMap, HashSet};
use std::net::IpAddr;

use ipnet::{IpNet, Ipv4Net};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::input::{
    AddonInput, ClusterConfig, FirewallInput, MaintenancePolicyInput, NodePoolInput,
    RegistryInput,
};
use crate::model::{
    AddonKind, AddonSpec, ClusterSpec, Environment, FirewallRuleSpec, FirewallSpec,
    MaintenanceWindow, NetworkSpec, NodePoolSpec, PortRange, ProjectSpec, Protocol, Region,
    RegistrySpec, RegistryTier, Taint, TaintEffect, ValidatedConfig, Weekday, DEFAULT_POOL_NAME,
    MAX_NAME_LEN, NODE_POOL_LABEL,
};

/// Name rule shared by clusters, node pools, registries and firewalls
pub const NAME_PATTERN: &str = r"^[a-z0-9-]+$";

const TIME_PATTERN: &str = r"^([01][0-9]|2[0-3]):([0-5][0-9])$";

/// Stable codes for every rule the validator enforces
pub mod codes {
    pub const INVALID_NAME: &str = "INVALID_NAME";
    pub const DUPLICATE_NODE_POOL: &str = "DUPLICATE_NODE_POOL";
    pub const UNSUPPORTED_REGION: &str = "UNSUPPORTED_REGION";
    pub const INVALID_CIDR: &str = "INVALID_CIDR";
    pub const INVALID_MAINTENANCE_TIME: &str = "INVALID_MAINTENANCE_TIME";
    pub const INVALID_MAINTENANCE_DAY: &str = "INVALID_MAINTENANCE_DAY";
    pub const INVALID_REGISTRY_TIER: &str = "INVALID_REGISTRY_TIER";
    pub const INVALID_ENVIRONMENT: &str = "INVALID_ENVIRONMENT";
    pub const INVALID_AUTOSCALE_BOUNDS: &str = "INVALID_AUTOSCALE_BOUNDS";
    pub const INVALID_NODE_SIZE: &str = "INVALID_NODE_SIZE";
    pub const INVALID_TAINT: &str = "INVALID_TAINT";
    pub const INVALID_TAINT_EFFECT: &str = "INVALID_TAINT_EFFECT";
    pub const INVALID_PROTOCOL: &str = "INVALID_PROTOCOL";
    pub const INVALID_PORT_RANGE: &str = "INVALID_PORT_RANGE";
    pub const INVALID_PROJECT_NAME: &str = "INVALID_PROJECT_NAME";
    pub const UNKNOWN_ADDON: &str = "UNKNOWN_ADDON";

    pub const FIREWALL_RULE_NO_SOURCES: &str = "FIREWALL_RULE_NO_SOURCES";
    pub const FIREWALL_RULES_IGNORED: &str = "FIREWALL_RULES_IGNORED";
    pub const VPC_CIDR_HOST_BITS: &str = "VPC_CIDR_HOST_BITS";
    pub const VPC_CIDR_IGNORED: &str = "VPC_CIDR_IGNORED";
    pub const VPC_UUID_IGNORED: &str = "VPC_UUID_IGNORED";
    pub const RESERVED_LABEL: &str = "RESERVED_LABEL";
    pub const AUTOSCALE_BOUNDS_IGNORED: &str = "AUTOSCALE_BOUNDS_IGNORED";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    /// Accepted, but probably not what the user meant
    Warning,
    /// Rejected
    Error,
}

/// A single validation finding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationMessage {
    pub severity: ValidationSeverity,
    pub code: String,
    /// Path of the offending input field, e.g. `node_pools[1].min_nodes`
    pub field: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Every finding from one validation pass, in rule order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationResult {
    pub messages: Vec<ValidationMessage>,
    pub passed: bool,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            passed: true,
        }
    }

    pub fn add(&mut self, msg: ValidationMessage) {
        if msg.severity == ValidationSeverity::Error {
            self.passed = false;
        }
        self.messages.push(msg);
    }

    pub fn warning(
        mut self,
        code: &str,
        field: &str,
        message: &str,
        suggestion: Option<&str>,
    ) -> Self {
        self.push(ValidationSeverity::Warning, code, field, message, suggestion);
        self
    }

    pub fn error(
        mut self,
        code: &str,
        field: &str,
        message: &str,
        suggestion: Option<&str>,
    ) -> Self {
        self.push(ValidationSeverity::Error, code, field, message, suggestion);
        self
    }

    fn push(
        &mut self,
        severity: ValidationSeverity,
        code: &str,
        field: &str,
        message: &str,
        suggestion: Option<&str>,
    ) {
        self.add(ValidationMessage {
            severity,
            code: code.to_string(),
            field: field.to_string(),
            message: message.to_string(),
            suggestion: suggestion.map(String::from),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.severity == ValidationSeverity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.severity == ValidationSeverity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationMessage> {
        self.messages
            .iter()
            .filter(|m| m.severity == ValidationSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationMessage> {
        self.messages
            .iter()
            .filter(|m| m.severity == ValidationSeverity::Warning)
    }

    /// True if any message carries `code`
    pub fn has_code(&self, code: &str) -> bool {
        self.messages.iter().any(|m| m.code == code)
    }
}

// ============================================================================
// SBIO: Pure rule checks (no I/O)
// ============================================================================

/// Non-empty, lowercase alphanumeric plus hyphen, at most 63 characters
pub fn is_valid_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return false;
    }
    Regex::new(NAME_PATTERN)
        .map(|re| re.is_match(name))
        .unwrap_or(false)
}

/// `HH:MM` on a 24 hour clock
pub fn is_valid_start_time(value: &str) -> bool {
    Regex::new(TIME_PATTERN)
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

/// Parse an IPv4 CIDR block such as `10.10.0.0/16`
pub fn parse_ipv4_cidr(value: &str) -> Option<Ipv4Net> {
    value.trim().parse::<Ipv4Net>().ok()
}

/// Firewall sources may be a bare address or a CIDR block of either family
pub fn is_valid_source_address(value: &str) -> bool {
    value.parse::<IpNet>().is_ok() || value.parse::<IpAddr>().is_ok()
}

/// Validate a raw configuration, collecting every failure.
/// Pure function - no I/O.
pub fn validate_config(config: &ClusterConfig) -> Result<ValidatedConfig, ValidationResult> {
    Validator::default().run(config)
}

#[derive(Default)]
struct Validator {
    result: ValidationResult,
}

impl Validator {
    fn run(mut self, config: &ClusterConfig) -> Result<ValidatedConfig, ValidationResult> {
        self.result.passed = true;

        self.check_name("cluster_name", &config.cluster_name);
        let region = self.parse_region("region", &config.region);
        let environment = self.parse_environment(&config.environment);
        let maintenance = config
            .maintenance_policy
            .as_ref()
            .and_then(|policy| self.check_maintenance(policy));

        let network = self.check_network(config);

        let default_pool = config
            .default_node_pool
            .as_ref()
            .map(|pool| self.check_node_pool("default_node_pool", pool));
        let node_pools: Vec<_> = config
            .node_pools
            .iter()
            .enumerate()
            .map(|(i, pool)| self.check_node_pool(&format!("node_pools[{}]", i), pool))
            .collect();
        self.check_unique_pools(config);

        let firewall = self.check_firewall(&config.firewall);
        let registry = config
            .registry
            .as_ref()
            .map(|registry| self.check_registry(registry));
        let project = config.project.as_ref().and_then(|project| {
            if project.name.trim().is_empty() {
                self.error(
                    codes::INVALID_PROJECT_NAME,
                    "project.name",
                    "Project name must not be empty".to_string(),
                    None,
                );
                return None;
            }
            Some(ProjectSpec {
                name: project.name.clone(),
                description: project.description.clone(),
                purpose: project.purpose.clone(),
            })
        });
        let addons = self.check_addons(&config.addons);

        if self.result.has_errors() {
            return Err(self.result);
        }

        // Every Option below is Some when no error was recorded
        let (Some(region), Some(environment), Some(network), Some(firewall), Some(addons)) =
            (region, environment, network, firewall, addons)
        else {
            return Err(self.result);
        };
        let default_pool = match default_pool {
            Some(Some(pool)) => Some(pool),
            Some(None) => return Err(self.result),
            None => None,
        };
        let Some(node_pools) = node_pools.into_iter().collect::<Option<Vec<_>>>() else {
            return Err(self.result);
        };
        let registry = match registry {
            Some(Some(registry)) => Some(registry),
            Some(None) => return Err(self.result),
            None => None,
        };

        let version = config
            .kubernetes_version
            .as_ref()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let version_prefix = config
            .version_prefix
            .as_ref()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(ValidatedConfig {
            cluster: ClusterSpec {
                name: config.cluster_name.clone(),
                region,
                version,
                version_prefix,
                auto_upgrade: config.auto_upgrade,
                surge_upgrade: config.surge_upgrade,
                high_availability: config.high_availability,
                maintenance,
                registry_integration: config.registry_integration,
                tags: config.tags.clone(),
                environment,
            },
            default_pool,
            node_pools,
            network,
            firewall,
            registry,
            project,
            addons,
            warnings: self.result.warnings().cloned().collect(),
        })
    }

    fn error(&mut self, code: &str, field: &str, message: String, suggestion: Option<String>) {
        self.result.add(ValidationMessage {
            severity: ValidationSeverity::Error,
            code: code.to_string(),
            field: field.to_string(),
            message,
            suggestion,
        });
    }

    fn warn(&mut self, code: &str, field: &str, message: String, suggestion: Option<String>) {
        self.result.add(ValidationMessage {
            severity: ValidationSeverity::Warning,
            code: code.to_string(),
            field: field.to_string(),
            message,
            suggestion,
        });
    }

    fn check_name(&mut self, field: &str, name: &str) -> bool {
        if is_valid_name(name) {
            return true;
        }
        let reason = if name.is_empty() {
            "must not be empty".to_string()
        } else if name.len() > MAX_NAME_LEN {
            format!("is {} characters long (max {})", name.len(), MAX_NAME_LEN)
        } else {
            format!("does not match {}", NAME_PATTERN)
        };
        self.error(
            codes::INVALID_NAME,
            field,
            format!("Name '{}' {}", name, reason),
            Some("Use lowercase letters, digits and hyphens only".to_string()),
        );
        false
    }

    fn parse_region(&mut self, field: &str, value: &str) -> Option<Region> {
        let region = Region::from_slug(value);
        if region.is_none() {
            self.error(
                codes::UNSUPPORTED_REGION,
                field,
                format!("Region '{}' is not supported", value),
                Some(format!("Choose one of: {}", Region::supported_list())),
            );
        }
        region
    }

    fn parse_environment(&mut self, value: &str) -> Option<Environment> {
        let environment = Environment::from_name(value);
        if environment.is_none() {
            self.error(
                codes::INVALID_ENVIRONMENT,
                "environment",
                format!("Environment '{}' is not recognised", value),
                Some("Use development, staging or production".to_string()),
            );
        }
        environment
    }

    fn check_maintenance(&mut self, policy: &MaintenancePolicyInput) -> Option<MaintenanceWindow> {
        let time_ok = is_valid_start_time(&policy.start_time);
        if !time_ok {
            self.error(
                codes::INVALID_MAINTENANCE_TIME,
                "maintenance_policy.start_time",
                format!(
                    "Start time '{}' is not a valid HH:MM time (HH 00-23, MM 00-59)",
                    policy.start_time
                ),
                Some("Use a zero-padded 24 hour time such as 04:00".to_string()),
            );
        }

        let day = Weekday::from_name(&policy.day);
        if day.is_none() {
            self.error(
                codes::INVALID_MAINTENANCE_DAY,
                "maintenance_policy.day",
                format!("Day '{}' is not a full weekday name", policy.day),
                Some("Use monday through sunday".to_string()),
            );
        }

        match (time_ok, day) {
            (true, Some(day)) => Some(MaintenanceWindow {
                start_time: policy.start_time.clone(),
                day,
            }),
            _ => None,
        }
    }

    fn check_network(&mut self, config: &ClusterConfig) -> Option<NetworkSpec> {
        if !config.create_vpc {
            if config.vpc_cidr.is_some() {
                self.warn(
                    codes::VPC_CIDR_IGNORED,
                    "vpc_cidr",
                    "vpc_cidr is ignored when create_vpc is false".to_string(),
                    None,
                );
            }
            // An empty reference is a graph constraint, reported by the builder
            return Some(NetworkSpec::Existing {
                vpc_uuid: config
                    .existing_vpc_uuid
                    .as_deref()
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
            });
        }

        if config
            .existing_vpc_uuid
            .as_deref()
            .is_some_and(|uuid| !uuid.trim().is_empty())
        {
            self.warn(
                codes::VPC_UUID_IGNORED,
                "existing_vpc_uuid",
                "existing_vpc_uuid is ignored when create_vpc is true".to_string(),
                Some("Set create_vpc to false to attach the cluster to that VPC".to_string()),
            );
        }

        let cidr = match config.vpc_cidr.as_deref() {
            None => None,
            Some(raw) => match parse_ipv4_cidr(raw) {
                Some(net) => {
                    if net != net.trunc() {
                        self.warn(
                            codes::VPC_CIDR_HOST_BITS,
                            "vpc_cidr",
                            format!("CIDR '{}' has host bits set", raw),
                            Some(format!("The network address is {}", net.trunc())),
                        );
                    }
                    Some(net)
                }
                None => {
                    self.error(
                        codes::INVALID_CIDR,
                        "vpc_cidr",
                        format!("'{}' is not a valid IPv4 CIDR block", raw),
                        Some("Use a block such as 10.10.0.0/16".to_string()),
                    );
                    return None;
                }
            },
        };

        if let Some(name) = &config.vpc_name {
            if !self.check_name("vpc_name", name) {
                return None;
            }
        }

        Some(NetworkSpec::Create {
            cidr,
            name: config.vpc_name.clone(),
            description: config.vpc_description.clone(),
        })
    }

    fn check_node_pool(&mut self, field: &str, pool: &NodePoolInput) -> Option<NodePoolSpec> {
        let mut ok = self.check_name(&format!("{}.name", field), &pool.name);

        if pool.size.trim().is_empty() {
            self.error(
                codes::INVALID_NODE_SIZE,
                &format!("{}.size", field),
                format!("Node pool '{}' has no machine size", pool.name),
                Some("Use a droplet size slug such as s-2vcpu-4gb".to_string()),
            );
            ok = false;
        }

        if pool.auto_scale {
            ok &= self.check_autoscale_bounds(field, pool);
        } else if pool
            .min_nodes
            .into_iter()
            .chain(pool.max_nodes)
            .any(|bound| bound != pool.node_count)
        {
            self.warn(
                codes::AUTOSCALE_BOUNDS_IGNORED,
                field,
                format!(
                    "Node pool '{}' has autoscale disabled; min_nodes/max_nodes are treated as {}",
                    pool.name, pool.node_count
                ),
                Some("Set auto_scale: true to use the bounds".to_string()),
            );
        }

        if pool.labels.contains_key(NODE_POOL_LABEL) {
            self.warn(
                codes::RESERVED_LABEL,
                &format!("{}.labels.{}", field, NODE_POOL_LABEL),
                format!(
                    "Label '{}' is reserved and will be set to '{}'",
                    NODE_POOL_LABEL, pool.name
                ),
                None,
            );
        }

        let mut taints = Vec::with_capacity(pool.taints.len());
        for (i, taint) in pool.taints.iter().enumerate() {
            let taint_field = format!("{}.taints[{}]", field, i);
            if taint.key.trim().is_empty() {
                self.error(
                    codes::INVALID_TAINT,
                    &format!("{}.key", taint_field),
                    "Taint key must not be empty".to_string(),
                    None,
                );
                ok = false;
            }
            match TaintEffect::from_name(&taint.effect) {
                Some(effect) => taints.push(Taint {
                    key: taint.key.clone(),
                    value: taint.value.clone(),
                    effect,
                }),
                None => {
                    self.error(
                        codes::INVALID_TAINT_EFFECT,
                        &format!("{}.effect", taint_field),
                        format!("Taint effect '{}' is not recognised", taint.effect),
                        Some("Use NoSchedule, PreferNoSchedule or NoExecute".to_string()),
                    );
                    ok = false;
                }
            }
        }

        if !ok {
            return None;
        }

        Some(NodePoolSpec {
            name: pool.name.clone(),
            size: pool.size.clone(),
            node_count: pool.node_count,
            auto_scale: pool.auto_scale,
            min_nodes: pool.min_nodes,
            max_nodes: pool.max_nodes,
            labels: pool.labels.clone(),
            taints,
            tags: pool.tags.clone(),
        })
    }

    fn check_autoscale_bounds(&mut self, field: &str, pool: &NodePoolInput) -> bool {
        let (Some(min), Some(max)) = (pool.min_nodes, pool.max_nodes) else {
            self.error(
                codes::INVALID_AUTOSCALE_BOUNDS,
                field,
                format!(
                    "Node pool '{}' enables autoscale but does not set both min_nodes and max_nodes",
                    pool.name
                ),
                None,
            );
            return false;
        };

        if min <= pool.node_count && pool.node_count <= max {
            return true;
        }

        self.error(
            codes::INVALID_AUTOSCALE_BOUNDS,
            field,
            format!(
                "Node pool '{}' requires min_nodes <= node_count <= max_nodes, got {} <= {} <= {}",
                pool.name, min, pool.node_count, max
            ),
            Some("Adjust node_count or the autoscale bounds; values are never clamped".to_string()),
        );
        false
    }

    fn check_unique_pools(&mut self, config: &ClusterConfig) {
        let default_name = config
            .default_node_pool
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or(DEFAULT_POOL_NAME);

        let mut seen = HashSet::new();
        seen.insert(default_name);
        for (i, pool) in config.node_pools.iter().enumerate() {
            if !seen.insert(pool.name.as_str()) {
                self.error(
                    codes::DUPLICATE_NODE_POOL,
                    &format!("node_pools[{}].name", i),
                    format!("Node pool name '{}' is used more than once", pool.name),
                    None,
                );
            }
        }
    }

    fn check_firewall(&mut self, firewall: &FirewallInput) -> Option<Option<FirewallSpec>> {
        if !firewall.enabled {
            if !firewall.inbound_rules.is_empty() {
                self.warn(
                    codes::FIREWALL_RULES_IGNORED,
                    "firewall.inbound_rules",
                    format!(
                        "{} inbound rule(s) ignored because the firewall is disabled",
                        firewall.inbound_rules.len()
                    ),
                    Some("Set firewall.enabled: true".to_string()),
                );
            }
            return Some(None);
        }

        let mut ok = true;
        if let Some(name) = &firewall.name {
            ok &= self.check_name("firewall.name", name);
        }

        let mut rules = Vec::with_capacity(firewall.inbound_rules.len());
        for (i, rule) in firewall.inbound_rules.iter().enumerate() {
            let field = format!("firewall.inbound_rules[{}]", i);

            let protocol = Protocol::from_name(&rule.protocol);
            if protocol.is_none() {
                self.error(
                    codes::INVALID_PROTOCOL,
                    &format!("{}.protocol", field),
                    format!("Protocol '{}' is not recognised", rule.protocol),
                    Some("Use tcp, udp or icmp".to_string()),
                );
            }

            let ports = match rule.port_range.parse::<PortRange>() {
                Ok(ports) => Some(ports),
                Err(reason) => {
                    self.error(
                        codes::INVALID_PORT_RANGE,
                        &format!("{}.port_range", field),
                        format!("Port range '{}' is invalid: {}", rule.port_range, reason),
                        Some("Use all, a single port, or low-high".to_string()),
                    );
                    None
                }
            };

            let mut sources_ok = true;
            for (j, address) in rule.source_addresses.iter().enumerate() {
                if !is_valid_source_address(address) {
                    self.error(
                        codes::INVALID_CIDR,
                        &format!("{}.source_addresses[{}]", field, j),
                        format!("'{}' is not a valid address or CIDR block", address),
                        None,
                    );
                    sources_ok = false;
                }
            }

            let (Some(protocol), Some(ports), true) = (protocol, ports, sources_ok) else {
                ok = false;
                continue;
            };

            let spec = FirewallRuleSpec {
                protocol,
                // ICMP has no ports
                ports: if protocol == Protocol::Icmp {
                    PortRange::All
                } else {
                    ports
                },
                source_addresses: rule.source_addresses.clone(),
                source_load_balancer_uids: rule.source_load_balancer_uids.clone(),
                source_tags: rule.source_tags.clone(),
                source_droplet_ids: rule.source_droplet_ids.clone(),
            };

            if !spec.has_sources() {
                self.warn(
                    codes::FIREWALL_RULE_NO_SOURCES,
                    &field,
                    format!(
                        "Inbound {} rule on ports {} has no sources and will match nothing",
                        rule.protocol, spec.ports
                    ),
                    Some(
                        "Add source_addresses, source_tags, source_load_balancer_uids or source_droplet_ids"
                            .to_string(),
                    ),
                );
            }
            rules.push(spec);
        }

        if !ok {
            return None;
        }
        Some(Some(FirewallSpec {
            name: firewall.name.clone(),
            inbound_rules: rules,
        }))
    }

    fn check_registry(&mut self, registry: &RegistryInput) -> Option<RegistrySpec> {
        let mut ok = self.check_name("registry.name", &registry.name);

        let tier = RegistryTier::from_name(&registry.subscription_tier);
        if tier.is_none() {
            self.error(
                codes::INVALID_REGISTRY_TIER,
                "registry.subscription_tier",
                format!(
                    "Subscription tier '{}' is not recognised",
                    registry.subscription_tier
                ),
                Some("Use starter, basic or professional".to_string()),
            );
        }

        let region = match registry.region.as_deref() {
            Some(slug) => {
                let region = self.parse_region("registry.region", slug);
                ok &= region.is_some();
                region
            }
            None => None,
        };

        let tier = tier?;
        if !ok {
            return None;
        }
        Some(RegistrySpec {
            name: registry.name.clone(),
            tier,
            region,
            write_access: registry.write_access,
            expiry_seconds: registry.expiry_seconds,
        })
    }

    fn check_addons(
        &mut self,
        addons: &BTreeMap<String, AddonInput>,
    ) -> Option<BTreeMap<AddonKind, AddonSpec>> {
        let mut specs = BTreeMap::new();
        let mut ok = true;
        for (name, addon) in addons {
            match AddonKind::from_name(name) {
                Some(kind) => {
                    specs.insert(
                        kind,
                        AddonSpec {
                            enabled: addon.enabled,
                            version: addon
                                .version
                                .as_ref()
                                .map(|v| v.trim().to_string())
                                .filter(|v| !v.is_empty()),
                            config: addon.config.clone(),
                        },
                    );
                }
                None => {
                    let known: Vec<_> = AddonKind::ALL.iter().map(|a| a.name()).collect();
                    self.error(
                        codes::UNKNOWN_ADDON,
                        &format!("addons.{}", name),
                        format!("Add-on '{}' is not supported", name),
                        Some(format!("Supported add-ons: {}", known.join(", "))),
                    );
                    ok = false;
                }
            }
        }
        ok.then_some(specs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::input::{FirewallRuleInput, ProjectInput, TaintInput};

    fn base_config() -> ClusterConfig {
        ClusterConfig::new("prod-k8s", "nyc3")
    }

    fn errors_of(config: &ClusterConfig) -> ValidationResult {
        validate_config(config).expect_err("expected validation failure")
    }

    fn tcp_rule(sources: &[&str]) -> FirewallRuleInput {
        FirewallRuleInput {
            protocol: "tcp".to_string(),
            port_range: "443".to_string(),
            source_addresses: sources.iter().map(|s| s.to_string()).collect(),
            source_load_balancer_uids: vec![],
            source_tags: vec![],
            source_droplet_ids: vec![],
        }
    }

    #[test]
    fn test_name_rule() {
        assert!(is_valid_name("prod-k8s"));
        assert!(is_valid_name("a"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("UPPER"));
        assert!(!is_valid_name("under_score"));
        assert!(!is_valid_name(&"a".repeat(64)));
        assert!(is_valid_name(&"a".repeat(63)));
    }

    #[test]
    fn test_start_time_rule() {
        assert!(is_valid_start_time("00:00"));
        assert!(is_valid_start_time("23:59"));
        assert!(!is_valid_start_time("24:00"));
        assert!(!is_valid_start_time("25:00"));
        assert!(!is_valid_start_time("12:60"));
        assert!(!is_valid_start_time("4:00"));
    }

    #[test]
    fn test_valid_minimal_config() {
        let validated = validate_config(&base_config()).unwrap();
        assert_eq!(validated.cluster.name, "prod-k8s");
        assert_eq!(validated.cluster.region, Region::Nyc3);
        assert_eq!(validated.cluster.environment, Environment::Development);
        assert!(validated.default_pool.is_none());
        assert!(validated.warnings.is_empty());
    }

    #[test]
    fn test_uppercase_cluster_name_rejected() {
        let mut config = base_config();
        config.cluster_name = "UPPER".to_string();

        let result = errors_of(&config);
        assert!(!result.passed);
        assert_eq!(result.errors().count(), 1);
        let msg = result.errors().next().unwrap();
        assert_eq!(msg.code, codes::INVALID_NAME);
        assert_eq!(msg.field, "cluster_name");
        assert!(msg.message.contains(NAME_PATTERN));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = base_config();
        config.cluster_name = "Bad_Name".to_string();
        config.region = "mars1".to_string();
        config.vpc_cidr = Some("10.10.0.0/33".to_string());
        config.environment = "qa".to_string();
        config.maintenance_policy = Some(MaintenancePolicyInput {
            start_time: "25:00".to_string(),
            day: "mon".to_string(),
        });

        let result = errors_of(&config);
        let codes_seen: Vec<_> = result.errors().map(|m| m.code.as_str()).collect();
        assert_eq!(
            codes_seen,
            vec![
                codes::INVALID_NAME,
                codes::UNSUPPORTED_REGION,
                codes::INVALID_ENVIRONMENT,
                codes::INVALID_MAINTENANCE_TIME,
                codes::INVALID_MAINTENANCE_DAY,
                codes::INVALID_CIDR,
            ]
        );
    }

    #[test]
    fn test_maintenance_time_out_of_range() {
        let mut config = base_config();
        config.maintenance_policy = Some(MaintenancePolicyInput {
            start_time: "25:00".to_string(),
            day: "monday".to_string(),
        });

        let result = errors_of(&config);
        assert_eq!(result.errors().count(), 1);
        assert!(result.has_code(codes::INVALID_MAINTENANCE_TIME));
        assert!(result.messages[0].message.contains("HH:MM"));
    }

    #[test]
    fn test_maintenance_day_case_insensitive() {
        let mut config = base_config();
        config.maintenance_policy = Some(MaintenancePolicyInput {
            start_time: "04:30".to_string(),
            day: "Saturday".to_string(),
        });

        let validated = validate_config(&config).unwrap();
        let window = validated.cluster.maintenance.unwrap();
        assert_eq!(window.day, Weekday::Saturday);
        assert_eq!(window.start_time, "04:30");
    }

    #[test]
    fn test_cidr_only_checked_when_creating() {
        let mut config = base_config();
        config.create_vpc = false;
        config.vpc_cidr = Some("not-a-cidr".to_string());
        config.existing_vpc_uuid = Some("c5a2e3f0-1111-2222-3333-444455556666".to_string());

        let validated = validate_config(&config).unwrap();
        assert!(matches!(validated.network, NetworkSpec::Existing { .. }));
        assert_eq!(validated.warnings[0].code, codes::VPC_CIDR_IGNORED);
    }

    #[test]
    fn test_vpc_uuid_ignored_when_creating() {
        let mut config = base_config();
        config.existing_vpc_uuid = Some("c5a2e3f0-1111-2222-3333-444455556666".to_string());

        let validated = validate_config(&config).unwrap();
        assert!(matches!(validated.network, NetworkSpec::Create { .. }));
        assert_eq!(validated.warnings.len(), 1);
        assert_eq!(validated.warnings[0].code, codes::VPC_UUID_IGNORED);
        assert_eq!(validated.warnings[0].field, "existing_vpc_uuid");

        config.existing_vpc_uuid = Some("  ".to_string());
        assert!(validate_config(&config).unwrap().warnings.is_empty());
    }

    #[test]
    fn test_empty_existing_vpc_passes_validation() {
        let mut config = base_config();
        config.create_vpc = false;
        config.existing_vpc_uuid = Some(String::new());

        let validated = validate_config(&config).unwrap();
        assert_eq!(
            validated.network,
            NetworkSpec::Existing {
                vpc_uuid: String::new()
            }
        );
    }

    #[test]
    fn test_cidr_host_bits_warning() {
        let mut config = base_config();
        config.vpc_cidr = Some("10.10.1.0/16".to_string());

        let validated = validate_config(&config).unwrap();
        assert_eq!(validated.warnings.len(), 1);
        assert_eq!(validated.warnings[0].code, codes::VPC_CIDR_HOST_BITS);
    }

    #[test]
    fn test_autoscale_bounds_enforced() {
        let mut config = base_config();
        config.node_pools = vec![
            NodePoolInput::new("ok", "s-2vcpu-4gb", 3).with_autoscale(1, 5),
            NodePoolInput::new("too-many", "s-2vcpu-4gb", 6).with_autoscale(1, 5),
            NodePoolInput::new("too-few", "s-2vcpu-4gb", 0).with_autoscale(1, 5),
        ];

        let result = errors_of(&config);
        let fields: Vec<_> = result.errors().map(|m| m.field.as_str()).collect();
        assert_eq!(fields, vec!["node_pools[1]", "node_pools[2]"]);
        assert!(result
            .errors()
            .all(|m| m.code == codes::INVALID_AUTOSCALE_BOUNDS));
    }

    #[test]
    fn test_autoscale_requires_both_bounds() {
        let mut config = base_config();
        let mut pool = NodePoolInput::new("workers", "s-2vcpu-4gb", 2);
        pool.auto_scale = true;
        pool.max_nodes = Some(4);
        config.node_pools = vec![pool];

        let result = errors_of(&config);
        assert!(result.has_code(codes::INVALID_AUTOSCALE_BOUNDS));
    }

    #[test]
    fn test_disabled_autoscale_ignores_bounds() {
        let mut config = base_config();
        let mut pool = NodePoolInput::new("workers", "s-2vcpu-4gb", 2);
        pool.min_nodes = Some(10);
        pool.max_nodes = Some(1);
        config.node_pools = vec![pool];

        let validated = validate_config(&config).unwrap();
        assert_eq!(validated.node_pools.len(), 1);
        assert_eq!(validated.warnings[0].code, codes::AUTOSCALE_BOUNDS_IGNORED);
    }

    #[test]
    fn test_duplicate_pool_names() {
        let mut config = base_config();
        config.node_pools = vec![
            NodePoolInput::new("workers", "s-2vcpu-4gb", 2),
            NodePoolInput::new("workers", "s-4vcpu-8gb", 2),
            NodePoolInput::new(DEFAULT_POOL_NAME, "s-4vcpu-8gb", 2),
        ];

        let result = errors_of(&config);
        let dupes: Vec<_> = result
            .errors()
            .filter(|m| m.code == codes::DUPLICATE_NODE_POOL)
            .map(|m| m.field.as_str())
            .collect();
        assert_eq!(dupes, vec!["node_pools[1].name", "node_pools[2].name"]);
    }

    #[test]
    fn test_pool_names_validated() {
        let mut config = base_config();
        config.default_node_pool = Some(NodePoolInput::new("Main", "s-2vcpu-4gb", 3));
        config.node_pools = vec![NodePoolInput::new("gpu_pool", "", 1)];

        let result = errors_of(&config);
        let fields: Vec<_> = result.errors().map(|m| m.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "default_node_pool.name",
                "node_pools[0].name",
                "node_pools[0].size"
            ]
        );
    }

    #[test]
    fn test_taint_effect_enum() {
        let mut config = base_config();
        let mut pool = NodePoolInput::new("gpu", "g-2vcpu-8gb", 1);
        pool.taints = vec![
            TaintInput {
                key: "nvidia.com/gpu".to_string(),
                value: "true".to_string(),
                effect: "NoSchedule".to_string(),
            },
            TaintInput {
                key: "dedicated".to_string(),
                value: "gpu".to_string(),
                effect: "Evict".to_string(),
            },
        ];
        config.node_pools = vec![pool];

        let result = errors_of(&config);
        assert_eq!(result.errors().count(), 1);
        assert_eq!(result.messages[0].field, "node_pools[0].taints[1].effect");
    }

    #[test]
    fn test_reserved_label_warns() {
        let mut config = base_config();
        config.node_pools =
            vec![NodePoolInput::new("workers", "s-2vcpu-4gb", 2).with_label("node-pool", "x")];

        let validated = validate_config(&config).unwrap();
        assert_eq!(validated.warnings[0].code, codes::RESERVED_LABEL);
    }

    #[test]
    fn test_registry_tier_enum() {
        let mut config = base_config();
        config.registry = Some(RegistryInput {
            name: "acme".to_string(),
            subscription_tier: "enterprise".to_string(),
            region: Some("moon".to_string()),
            write_access: false,
            expiry_seconds: None,
        });

        let result = errors_of(&config);
        let codes_seen: Vec<_> = result.errors().map(|m| m.code.as_str()).collect();
        assert_eq!(
            codes_seen,
            vec![codes::INVALID_REGISTRY_TIER, codes::UNSUPPORTED_REGION]
        );
    }

    #[test]
    fn test_firewall_rule_without_sources_warns() {
        let mut config = base_config();
        config.firewall.enabled = true;
        config.firewall.inbound_rules = vec![tcp_rule(&[]), tcp_rule(&["203.0.113.0/24"])];

        let validated = validate_config(&config).unwrap();
        let firewall = validated.firewall.unwrap();
        assert_eq!(firewall.inbound_rules.len(), 2);
        assert_eq!(validated.warnings.len(), 1);
        assert_eq!(validated.warnings[0].code, codes::FIREWALL_RULE_NO_SOURCES);
        assert_eq!(validated.warnings[0].field, "firewall.inbound_rules[0]");
    }

    #[test]
    fn test_firewall_rule_errors() {
        let mut config = base_config();
        config.firewall.enabled = true;
        let mut bad = tcp_rule(&["300.1.1.1/8", "::/0"]);
        bad.protocol = "sctp".to_string();
        bad.port_range = "90-80".to_string();
        config.firewall.inbound_rules = vec![bad];

        let result = errors_of(&config);
        let codes_seen: Vec<_> = result.errors().map(|m| m.code.as_str()).collect();
        assert_eq!(
            codes_seen,
            vec![
                codes::INVALID_PROTOCOL,
                codes::INVALID_PORT_RANGE,
                codes::INVALID_CIDR
            ]
        );
    }

    #[test]
    fn test_icmp_rule_ignores_ports() {
        let mut config = base_config();
        config.firewall.enabled = true;
        let mut rule = tcp_rule(&["0.0.0.0/0"]);
        rule.protocol = "icmp".to_string();
        config.firewall.inbound_rules = vec![rule];

        let validated = validate_config(&config).unwrap();
        let firewall = validated.firewall.unwrap();
        assert_eq!(firewall.inbound_rules[0].ports, PortRange::All);
    }

    #[test]
    fn test_disabled_firewall_rules_ignored() {
        let mut config = base_config();
        config.firewall.inbound_rules = vec![tcp_rule(&["0.0.0.0/0"])];

        let validated = validate_config(&config).unwrap();
        assert!(validated.firewall.is_none());
        assert_eq!(validated.warnings[0].code, codes::FIREWALL_RULES_IGNORED);
    }

    #[test]
    fn test_unknown_addon_rejected() {
        let mut config = base_config();
        config
            .addons
            .insert("traefik".to_string(), AddonInput::default());
        config
            .addons
            .insert("istio".to_string(), AddonInput::default());

        let result = errors_of(&config);
        assert_eq!(result.errors().count(), 1);
        assert_eq!(result.messages[0].field, "addons.traefik");
    }

    #[test]
    fn test_empty_project_name() {
        let mut config = base_config();
        config.project = Some(ProjectInput {
            name: " ".to_string(),
            description: None,
            purpose: None,
        });

        let result = errors_of(&config);
        assert!(result.has_code(codes::INVALID_PROJECT_NAME));
    }

    #[test]
    fn test_empty_version_treated_as_unset() {
        let mut config = base_config();
        config.kubernetes_version = Some("  ".to_string());

        let validated = validate_config(&config).unwrap();
        assert!(validated.cluster.version.is_none());
    }

    #[test]
    fn test_validation_result_builder() {
        let result = ValidationResult::new()
            .warning("TEST_WARN", "a", "Warning message", Some("Do this"))
            .error("TEST_ERR", "b", "Error message", None);

        assert_eq!(result.messages.len(), 2);
        assert!(result.has_errors());
        assert!(result.has_warnings());
        assert!(!result.passed);
    }
}

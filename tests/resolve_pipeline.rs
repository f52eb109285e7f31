//! End-to-end resolution tests over the public library surface

use std::collections::HashSet;

use doksplan::config::{parse_cluster_config, InputFormat};
use doksplan::resolver::graph::codes as graph_codes;
use doksplan::resolver::validation::codes;
use doksplan::resolver::{ResourceKind, ResourceParams};
use doksplan::{ClusterConfig, Plan, ResolveError, Resolver, StaticCatalog};

fn catalog() -> StaticCatalog {
    StaticCatalog::from_slugs(["1.30.5-do.2", "1.31.1-do.4"])
}

async fn resolve_yaml(yaml: &str) -> Result<Plan, ResolveError> {
    let config = parse_cluster_config(yaml, InputFormat::Yaml).unwrap();
    let catalog = catalog();
    Resolver::new(&catalog).resolve(&config).await
}

const FULL_CONFIG: &str = r#"
cluster_name: platform
region: fra1
environment: production
tags: [team-platform]
maintenance_policy:
  start_time: "03:00"
  day: sunday
registry_integration: true
node_pools:
  - name: web
    size: s-4vcpu-8gb
    node_count: 3
    auto_scale: true
    min_nodes: 2
    max_nodes: 6
    labels:
      workload: web
  - name: gpu
    size: g-2vcpu-8gb
    node_count: 1
    taints:
      - key: nvidia.com/gpu
        value: "true"
        effect: NoSchedule
firewall:
  enabled: true
  inbound_rules:
    - protocol: tcp
      port_range: "443"
      source_addresses: ["0.0.0.0/0", "::/0"]
    - protocol: tcp
      port_range: 30000-32767
      source_tags: [platform]
registry:
  name: platform-images
  subscription_tier: professional
project:
  name: platform
addons:
  cert-manager:
    enabled: true
    config:
      install_crds: true
  ingress-nginx:
    enabled: true
    version: 4.12.0
"#;

#[tokio::test]
async fn test_minimal_scenario() {
    let mut config = ClusterConfig::new("prod-k8s", "nyc3");
    config.vpc_cidr = Some("10.10.0.0/16".to_string());
    config.node_pools = vec![doksplan::config::NodePoolInput::new("compute", "c-4", 3)];

    let catalog = catalog();
    let plan = Resolver::new(&catalog).resolve(&config).await.unwrap();

    assert_eq!(plan.names(), vec!["vpc", "cluster", "node_pool.compute"]);
    assert_eq!(plan.intents[1].depends_on, vec!["vpc"]);
    assert_eq!(plan.intents[2].depends_on, vec!["cluster"]);

    match &plan.intents[2].resource {
        ResourceParams::NodePool(pool) => {
            assert_eq!(pool.min_nodes, 3);
            assert_eq!(pool.max_nodes, 3);
            assert_eq!(pool.labels["node-pool"], "compute");
        }
        other => panic!("Expected node pool, got {:?}", other),
    }
}

#[tokio::test]
async fn test_full_configuration() {
    let plan = resolve_yaml(FULL_CONFIG).await.unwrap();

    assert_eq!(
        plan.names(),
        vec![
            "vpc",
            "cluster",
            "node_pool.web",
            "node_pool.gpu",
            "firewall",
            "container_registry",
            "registry_credentials",
            "registry_integration",
            "addon.ingress-nginx",
            "addon.cert-manager",
            "project",
        ]
    );

    let cluster = plan.cluster().unwrap();
    assert_eq!(cluster.version, "1.31.1-do.4");
    assert!(cluster.tags.contains("team-platform"));
    assert!(cluster.tags.contains("managed-by=doksplan"));
    assert_eq!(plan.common_tags["environment"], "production");

    match &plan.intent("addon.ingress-nginx").unwrap().resource {
        ResourceParams::AddonRelease(addon) => assert_eq!(addon.version, "4.12.0"),
        other => panic!("Expected add-on release, got {:?}", other),
    }
    match &plan.intent("firewall").unwrap().resource {
        ResourceParams::Firewall(fw) => {
            assert_eq!(fw.name, "platform-firewall");
            assert_eq!(fw.inbound_rules[1].ports.to_string(), "30000-32767");
        }
        other => panic!("Expected firewall, got {:?}", other),
    }
}

#[tokio::test]
async fn test_dependencies_precede_dependents() {
    let plan = resolve_yaml(FULL_CONFIG).await.unwrap();

    let mut seen = HashSet::new();
    for intent in &plan.intents {
        for dep in &intent.depends_on {
            assert!(seen.contains(dep.as_str()), "{} came before {}", intent.name, dep);
        }
        seen.insert(intent.name.as_str());
    }
}

#[tokio::test]
async fn test_resolution_is_deterministic() {
    let first = resolve_yaml(FULL_CONFIG).await.unwrap();
    let second = resolve_yaml(FULL_CONFIG).await.unwrap();

    assert_eq!(first.digest, second.digest);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_plan_survives_json() {
    let plan = resolve_yaml(FULL_CONFIG).await.unwrap();
    let json = serde_json::to_string_pretty(&plan).unwrap();
    let parsed: Plan = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, plan);
    assert_eq!(
        parsed.intent("project").unwrap().kind(),
        ResourceKind::Project
    );
}

#[tokio::test]
async fn test_uppercase_name_rejected() {
    let err = resolve_yaml("cluster_name: UPPER\nregion: nyc3\n")
        .await
        .unwrap_err();
    match err {
        ResolveError::Validation(result) => {
            let msg = result.errors().next().unwrap();
            assert_eq!(msg.code, codes::INVALID_NAME);
            assert!(msg.message.contains("^[a-z0-9-]+$"));
        }
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_existing_vpc_rejected() {
    let err = resolve_yaml(
        "cluster_name: prod-k8s\nregion: nyc3\ncreate_vpc: false\nexisting_vpc_uuid: \"\"\n",
    )
    .await
    .unwrap_err();
    match err {
        ResolveError::GraphConstraint(violations) => {
            assert_eq!(violations[0].code, graph_codes::EMPTY_VPC_REFERENCE);
        }
        other => panic!("Expected graph constraint, got {:?}", other),
    }
}

#[tokio::test]
async fn test_bad_maintenance_time_rejected() {
    let err = resolve_yaml(
        "cluster_name: prod-k8s\nregion: nyc3\nmaintenance_policy:\n  start_time: \"25:00\"\n  day: monday\n",
    )
    .await
    .unwrap_err();
    match err {
        ResolveError::Validation(result) => {
            assert!(result.has_code(codes::INVALID_MAINTENANCE_TIME));
            assert!(result.messages[0].message.contains("HH:MM"));
        }
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_warnings_carried_into_plan() {
    let plan = resolve_yaml(
        r#"
cluster_name: prod-k8s
region: nyc3
firewall:
  enabled: true
  inbound_rules:
    - protocol: udp
      port_range: "53"
"#,
    )
    .await
    .unwrap();
    assert_eq!(plan.warnings.len(), 1);
    assert_eq!(plan.warnings[0].code, codes::FIREWALL_RULE_NO_SOURCES);
}

//! Display formatting for CLI output
//!
//! SBIO pattern: Pure functions that format data for display

use crate::catalog::KubernetesVersion;
use crate::resolver::{
    ChangeAction, GraphConstraint, Plan, PlannedChange, ResourceIntent, ResourceParams,
    ValidationMessage, ValidationResult, ValidationSeverity,
};

// ============================================================================
// Table formatting helpers
// ============================================================================

/// Format a simple table with headers and rows
pub fn format_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "No resources found.\n".to_string();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let render = |cells: Vec<String>| -> String {
        let line = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| match widths.get(i) {
                Some(&width) => format!("{:width$}", cell, width = width),
                None => cell.clone(),
            })
            .collect::<Vec<_>>()
            .join("   ");
        format!("{}\n", line.trim_end())
    };

    let mut output = render(headers.iter().map(|h| h.to_uppercase()).collect());
    for row in rows {
        output.push_str(&render(row));
    }
    output
}

// ============================================================================
// Validation display
// ============================================================================

fn format_message(msg: &ValidationMessage) -> String {
    let marker = match msg.severity {
        ValidationSeverity::Error => "error",
        ValidationSeverity::Warning => "warning",
    };
    let mut line = format!("  {}[{}] {}: {}\n", marker, msg.code, msg.field, msg.message);
    if let Some(ref suggestion) = msg.suggestion {
        line.push_str(&format!("      hint: {}\n", suggestion));
    }
    line
}

/// Format a full validation batch
pub fn format_validation_report(result: &ValidationResult, path: &str) -> String {
    let mut output = String::new();

    if result.passed {
        output.push_str(&format!("✓ {} is valid\n", path));
    } else {
        output.push_str(&format!(
            "✗ {} is invalid ({} error(s))\n",
            path,
            result.errors().count()
        ));
    }

    if !result.messages.is_empty() {
        output.push('\n');
    }
    for msg in result.errors().chain(result.warnings()) {
        output.push_str(&format_message(msg));
    }

    output
}

/// Format graph constraint violations
pub fn format_constraints(constraints: &[GraphConstraint]) -> String {
    let rows = constraints
        .iter()
        .map(|c| vec![c.code.clone(), c.resource.clone(), c.message.clone()])
        .collect();
    format_table(&["code", "resource", "message"], rows)
}

// ============================================================================
// Plan display
// ============================================================================

/// One-line summary of what an intent will create
fn summarize(intent: &ResourceIntent) -> String {
    match &intent.resource {
        ResourceParams::Vpc(vpc) => format!("{} {} in {}", vpc.name, vpc.ip_range, vpc.region),
        ResourceParams::Cluster(cluster) => format!(
            "{} {} in {}, default pool {} x{}",
            cluster.name,
            cluster.version,
            cluster.region,
            cluster.default_node_pool.size,
            cluster.default_node_pool.node_count
        ),
        ResourceParams::NodePool(pool) if pool.auto_scale => format!(
            "{} x{} (autoscale {}-{})",
            pool.size, pool.node_count, pool.min_nodes, pool.max_nodes
        ),
        ResourceParams::NodePool(pool) => format!("{} x{}", pool.size, pool.node_count),
        ResourceParams::Firewall(fw) => format!(
            "{} ({} inbound, {} outbound)",
            fw.name,
            fw.inbound_rules.len(),
            fw.outbound_rules.len()
        ),
        ResourceParams::ContainerRegistry(reg) => {
            format!("{} ({}, {})", reg.name, reg.subscription_tier, reg.region)
        }
        ResourceParams::RegistryCredentials(creds) => format!(
            "{} {}",
            creds.registry,
            if creds.write { "read-write" } else { "read-only" }
        ),
        ResourceParams::RegistryIntegration(link) => {
            format!("{} -> {}", link.registry, link.cluster)
        }
        ResourceParams::AddonRelease(addon) => {
            format!("{} {} in {}", addon.chart, addon.version, addon.namespace)
        }
        ResourceParams::Project(project) => {
            format!("{} ({} member(s))", project.name, project.resources.len())
        }
    }
}

/// Format a plan as an ordered table followed by warnings
pub fn format_plan(plan: &Plan) -> String {
    let rows = plan
        .intents
        .iter()
        .enumerate()
        .map(|(i, intent)| {
            vec![
                (i + 1).to_string(),
                intent.name.clone(),
                intent.kind().to_string(),
                if intent.depends_on.is_empty() {
                    "-".to_string()
                } else {
                    intent.depends_on.join(",")
                },
                summarize(intent),
            ]
        })
        .collect();

    let mut output = format_table(&["#", "name", "kind", "depends on", "details"], rows);

    let tags = plan
        .common_tags
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ");
    output.push_str(&format!("\nTags:   {}\n", tags));
    output.push_str(&format!("Digest: {}\n", plan.digest));

    if !plan.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &plan.warnings {
            output.push_str(&format_message(warning));
        }
    }

    output
}

// ============================================================================
// Diff display
// ============================================================================

/// Format a change list, hiding unchanged resources behind a count
pub fn format_changes(changes: &[PlannedChange]) -> String {
    let symbol = |action: ChangeAction| match action {
        ChangeAction::Create => "+",
        ChangeAction::Update => "~",
        ChangeAction::Delete => "-",
        ChangeAction::Unchanged => " ",
    };

    let rows: Vec<Vec<String>> = changes
        .iter()
        .filter(|c| c.action != ChangeAction::Unchanged)
        .map(|c| {
            vec![
                symbol(c.action).to_string(),
                c.name.clone(),
                c.kind.to_string(),
                c.action.to_string(),
            ]
        })
        .collect();

    let unchanged = changes.len() - rows.len();
    if rows.is_empty() {
        return format!("No changes. {} resource(s) up to date.\n", unchanged);
    }

    let mut output = format_table(&["", "name", "kind", "action"], rows);
    output.push_str(&format!("\n{} unchanged\n", unchanged));
    output
}

// ============================================================================
// Versions display
// ============================================================================

pub fn format_versions(versions: &[KubernetesVersion]) -> String {
    let rows = versions
        .iter()
        .enumerate()
        .map(|(i, v)| {
            vec![
                v.slug.clone(),
                v.kubernetes_version.clone(),
                if i == 0 { "latest" } else { "" }.to_string(),
            ]
        })
        .collect();
    format_table(&["slug", "kubernetes", ""], rows)
}

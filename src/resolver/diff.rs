//! Plan comparison
//!
//! Compares a previously emitted plan with a freshly resolved one by logical
//! name. The resolver never touches live infrastructure; this is the view an
//! operator reviews before handing the new plan to an apply engine.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::intent::{Plan, ResourceIntent, ResourceKind};
use super::ResolveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
    Unchanged,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeAction::Create => "create",
            ChangeAction::Update => "update",
            ChangeAction::Delete => "delete",
            ChangeAction::Unchanged => "unchanged",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedChange {
    pub name: String,
    pub kind: ResourceKind,
    pub action: ChangeAction,
}

impl PlannedChange {
    fn new(intent: &ResourceIntent, action: ChangeAction) -> Self {
        Self {
            name: intent.name.clone(),
            kind: intent.kind(),
            action,
        }
    }
}

// ============================================================================
// SBIO: Pure diff (no I/O)
// ============================================================================

/// The default pool can only go away if it was already allowed to drain to zero
fn check_default_pool(previous: &Plan, next: &Plan) -> Result<(), ResolveError> {
    let (Some(before), Some(after)) = (previous.cluster(), next.cluster()) else {
        return Ok(());
    };
    let old_pool = &before.default_node_pool;
    if old_pool.name == after.default_node_pool.name {
        return Ok(());
    }
    if old_pool.can_scale_to_zero() {
        warn!(
            "Default pool '{}' is replaced by '{}'",
            old_pool.name, after.default_node_pool.name
        );
        return Ok(());
    }
    Err(ResolveError::CannotRemoveDefaultPool {
        pool: old_pool.name.clone(),
    })
}

/// One change per logical name: creates and updates in the new plan's order,
/// then deletes in reverse order of the previous plan.
/// Pure function - no I/O.
pub fn diff_plans(previous: &Plan, next: &Plan) -> Result<Vec<PlannedChange>, ResolveError> {
    check_default_pool(previous, next)?;

    let before: HashMap<&str, &ResourceIntent> = previous
        .intents
        .iter()
        .map(|intent| (intent.name.as_str(), intent))
        .collect();
    let after: HashMap<&str, &ResourceIntent> = next
        .intents
        .iter()
        .map(|intent| (intent.name.as_str(), intent))
        .collect();

    let mut changes: Vec<PlannedChange> = next
        .intents
        .iter()
        .map(|intent| {
            let action = match before.get(intent.name.as_str()) {
                None => ChangeAction::Create,
                Some(old) if *old == intent => ChangeAction::Unchanged,
                Some(_) => ChangeAction::Update,
            };
            PlannedChange::new(intent, action)
        })
        .collect();

    changes.extend(
        previous
            .intents
            .iter()
            .rev()
            .filter(|intent| !after.contains_key(intent.name.as_str()))
            .map(|intent| PlannedChange::new(intent, ChangeAction::Delete)),
    );

    debug!(
        "Diffed plans: {} change(s), {} unchanged",
        changes
            .iter()
            .filter(|c| c.action != ChangeAction::Unchanged)
            .count(),
        changes
            .iter()
            .filter(|c| c.action == ChangeAction::Unchanged)
            .count()
    );

    Ok(changes)
}

/// True when the diff would change nothing
pub fn is_noop(changes: &[PlannedChange]) -> bool {
    changes.iter().all(|c| c.action == ChangeAction::Unchanged)
}

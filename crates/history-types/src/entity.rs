//! Entity types handled by the importer.

use serde::{Deserialize, Serialize};

/// One variant per imported entity type.
///
/// Each entity type has its own import service and its own job executor,
/// so this is also the routing key for logs, stats, and output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    CompletedProcessInstance,
    RunningProcessInstance,
    CompletedActivityInstance,
    RunningActivityInstance,
    CompletedUserTask,
    RunningUserTask,
    DecisionInstance,
    DecisionDefinition,
    ProcessDefinition,
    IdentityLinkLog,
    UserOperationLog,
    VariableUpdate,
    Tenant,
    ImportIndex,
}

impl EntityType {
    /// Every entity type, in import order.
    pub const ALL: [EntityType; 14] = [
        EntityType::Tenant,
        EntityType::ProcessDefinition,
        EntityType::DecisionDefinition,
        EntityType::CompletedProcessInstance,
        EntityType::RunningProcessInstance,
        EntityType::CompletedActivityInstance,
        EntityType::RunningActivityInstance,
        EntityType::CompletedUserTask,
        EntityType::RunningUserTask,
        EntityType::IdentityLinkLog,
        EntityType::UserOperationLog,
        EntityType::VariableUpdate,
        EntityType::DecisionInstance,
        EntityType::ImportIndex,
    ];

    /// Stable snake_case identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::CompletedProcessInstance => "completed_process_instance",
            EntityType::RunningProcessInstance => "running_process_instance",
            EntityType::CompletedActivityInstance => "completed_activity_instance",
            EntityType::RunningActivityInstance => "running_activity_instance",
            EntityType::CompletedUserTask => "completed_user_task",
            EntityType::RunningUserTask => "running_user_task",
            EntityType::DecisionInstance => "decision_instance",
            EntityType::DecisionDefinition => "decision_definition",
            EntityType::ProcessDefinition => "process_definition",
            EntityType::IdentityLinkLog => "identity_link_log",
            EntityType::UserOperationLog => "user_operation_log",
            EntityType::VariableUpdate => "variable_update",
            EntityType::Tenant => "tenant",
            EntityType::ImportIndex => "import_index",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identifiers_are_unique() {
        let ids: HashSet<_> = EntityType::ALL.iter().map(|e| e.as_str()).collect();
        assert_eq!(ids.len(), EntityType::ALL.len());
    }

    #[test]
    fn test_serde_matches_display() {
        for entity in EntityType::ALL {
            let json = serde_json::to_string(&entity).unwrap();
            assert_eq!(json, format!("\"{}\"", entity));
            let back: EntityType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, entity);
        }
    }
}

//! Entity-specific import strategies.
//!
//! Each strategy plugs into [`crate::ImportService`]. Services are built
//! per engine and share that engine's [`crate::DefinitionResolver`].

mod activity_instance;
mod decision_instance;
mod definition;
mod identity_link;
mod import_index;
mod process_instance;
mod tenant;
mod user_operation_log;
mod user_task;
mod variable;

pub use activity_instance::ActivityInstanceImport;
pub use decision_instance::DecisionInstanceImport;
pub use definition::DefinitionImport;
pub use identity_link::{IdentityLinkLogImport, SUPPORTED_IDENTITY_LINK_TYPES};
pub use import_index::ImportIndexImport;
pub use process_instance::ProcessInstanceImport;
pub use tenant::TenantImport;
pub use user_operation_log::UserOperationLogImport;
pub use user_task::UserTaskImport;
pub use variable::VariableUpdateImport;

use history_types::EngineDateTime;

/// Whether a service imports finished or still running history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceScope {
    Completed,
    Running,
}

/// Treat empty strings like missing values.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Milliseconds between two engine timestamps.
pub(crate) fn duration_millis(start: &EngineDateTime, end: &EngineDateTime) -> i64 {
    (*end - *start).num_milliseconds()
}

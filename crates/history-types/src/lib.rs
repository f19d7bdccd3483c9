//! # history-types
//!
//! Shared domain types for the engine history importer.
//!
//! This crate defines the data structures that flow through the import
//! pipeline:
//! - Engine records: immutable historic records produced by the engine
//! - Definition descriptors: process/decision definition metadata
//! - Store documents: the shapes persisted to the search store
//! - Variables: store variable types and flattened variables
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use history_types::{EntityType, VariableType};
//!
//! assert_eq!(EntityType::VariableUpdate.as_str(), "variable_update");
//! assert_eq!(VariableType::Long.id(), "Long");
//! ```

pub mod config;
pub mod date_format;
pub mod definition;
pub mod document;
pub mod engine;
pub mod entity;
pub mod error;
pub mod variable;

pub use config::{EngineSettings, ImportSettings, Settings};
pub use date_format::{format_date, parse_date, EngineDateTime, STORE_DATE_FORMAT};
pub use definition::{DefinitionDescriptor, DefinitionKind};
pub use document::{
    DecisionInputDocument, DecisionInstanceDocument, DecisionOutputDocument, DefinitionDocument,
    FlowNodeInstanceDocument, IdentityLinkLogDocument, ImportIndexDocument,
    ProcessInstanceDocument, ProcessVariableDocument, SuspensionState, TenantDocument,
    UserOperationLogDocument, UserOperationType, UserTaskDocument,
};
pub use engine::{
    EngineDefinition, EngineTenant, HistoricActivityInstance, HistoricDecisionInput,
    HistoricDecisionInstance, HistoricDecisionOutput, HistoricIdentityLinkLog,
    HistoricProcessInstance, HistoricUserOperationLog, HistoricUserTaskInstance,
    HistoricVariableUpdate, ImportIndexSnapshot, ValueInfo,
};
pub use entity::EntityType;
pub use error::SettingsError;
pub use variable::{FlattenedVariable, RawVariable, VariableType};

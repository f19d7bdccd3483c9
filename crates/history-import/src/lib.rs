//! # history-import
//!
//! Per-entity import services for engine history.
//!
//! Each page of engine records flows through one [`ImportService`]:
//!
//! 1. definition keys are resolved via the shared [`DefinitionResolver`]
//!    (records that stay unresolved are dropped)
//! 2. the entity's [`ImportStrategy`] maps records to store documents
//!    and runs the plugin adapter chains
//! 3. the surviving batch is submitted as one job to the service's
//!    bounded executor, which persists it and calls the page's
//!    completion callback
//!
//! Pages that yield no documents complete immediately. Batch suspension
//! operations reset the running process instance cursor instead of
//! producing a job (see [`SuspensionController`]).

pub mod context;
pub mod engine;
pub mod error;
pub mod flatten;
pub mod resolver;
pub mod service;
pub mod services;
pub mod stats;
pub mod suspension;

pub use context::EngineContext;
pub use engine::{EngineClient, ImportCursor};
pub use error::{EngineError, ImportError};
pub use flatten::{is_primitive_or_homogeneous_list, VariableFlattener, JSON_DATA_FORMAT};
pub use resolver::DefinitionResolver;
pub use service::{ImportService, ImportStrategy};
pub use services::{
    ActivityInstanceImport, DecisionInstanceImport, DefinitionImport, IdentityLinkLogImport,
    ImportIndexImport, InstanceScope, ProcessInstanceImport, TenantImport,
    UserOperationLogImport, UserTaskImport, VariableUpdateImport,
    SUPPORTED_IDENTITY_LINK_TYPES,
};
pub use stats::PageStats;
pub use suspension::{ControllerState, SuspensionController};

pub type ProcessInstanceImportService = ImportService<ProcessInstanceImport>;
pub type ActivityInstanceImportService = ImportService<ActivityInstanceImport>;
pub type UserTaskImportService = ImportService<UserTaskImport>;
pub type DecisionInstanceImportService = ImportService<DecisionInstanceImport>;
pub type DefinitionImportService = ImportService<DefinitionImport>;
pub type IdentityLinkLogImportService = ImportService<IdentityLinkLogImport>;
pub type UserOperationLogImportService = ImportService<UserOperationLogImport>;
pub type VariableUpdateImportService = ImportService<VariableUpdateImport>;
pub type TenantImportService = ImportService<TenantImport>;
pub type ImportIndexImportService = ImportService<ImportIndexImport>;

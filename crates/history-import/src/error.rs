//! Error types for the import services.

use history_jobs::JobError;
use thiserror::Error;

/// Errors from the engine collaborator.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine does not know the requested entity
    #[error("Not found: {entity} {id}")]
    NotFound { entity: &'static str, id: String },

    /// The request itself failed
    #[error("Engine request error: {0}")]
    Request(String),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound { .. })
    }
}

/// Errors that escape `execute_import`.
///
/// Record-level problems never surface here; they are logged and the
/// record is dropped.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Executor lifecycle error
    #[error("Job error: {0}")]
    Job(#[from] JobError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::not_found("process definition", "invoice:1");
        assert_eq!(err.to_string(), "Not found: process definition invoice:1");
        assert!(err.is_not_found());

        let err = EngineError::Request("connection refused".to_string());
        assert!(!err.is_not_found());

        let err = ImportError::Job(JobError::Closed("tenant".to_string()));
        assert_eq!(err.to_string(), "Job error: Executor tenant is closed");
    }

    #[test]
    fn test_job_error_converts() {
        fn submit() -> Result<(), ImportError> {
            Err(JobError::Closed("variable".to_string()))?;
            Ok(())
        }
        let err = submit().unwrap_err();
        assert!(matches!(err, ImportError::Job(JobError::Closed(ref name)) if name == "variable"));
    }
}

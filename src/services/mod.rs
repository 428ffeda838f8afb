use thiserror::Error;

use crate::domain::audit::NewAuditEvent;
use crate::domain::upload::UploadStatus;
use crate::repository::EventRecorder;
use crate::repository::errors::RepositoryError;

pub mod intake;
pub mod merge;
pub mod rules;
pub mod timeline;
pub mod uploads;
pub mod validation;

/// Errors surfaced by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("upload contains no rows")]
    EmptyUpload,
    #[error("unknown supplier {0}")]
    UnknownSupplier(i32),
    /// A request payload failed validation.
    #[error("invalid input: {0}")]
    Form(String),
    /// The upload is not in a state the requested phase accepts.
    #[error("cannot {action} an upload in state {status:?}")]
    InvalidState {
        action: &'static str,
        status: UploadStatus,
    },
    #[error("not found")]
    NotFound,
    /// The execution log already holds a rule pass for this upload.
    #[error("rules already ran for upload {0}")]
    RulesAlreadyRan(i32),
    /// The supplier has active rules with no recorded execution yet.
    #[error("supplier rules have not run for upload {0}")]
    RulesPending(i32),
    #[error("merge failed: {0}")]
    Merge(String),
    #[error("repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Appends an audit event without letting an audit failure fail the phase
/// that produced it.
pub(crate) fn record_best_effort<R>(repo: &R, event: NewAuditEvent)
where
    R: EventRecorder + ?Sized,
{
    if let Err(err) = repo.record_event(&event) {
        log::error!("failed to record audit event {}: {err}", event.action);
    }
}

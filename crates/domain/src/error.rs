//! Domain error types.

use event_store::{EventStoreError, ValidationError};
use projections::ProjectionError;
use thiserror::Error;

/// Errors that can occur while submitting to the ledger.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The submission was refused and nothing was stored.
    #[error("{0}")]
    Validation(ValidationError),

    /// The store failed to persist the event.
    #[error("Event store error: {0}")]
    EventStore(EventStoreError),

    /// Reading the log for a projection failed.
    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),
}

impl DomainError {
    /// Returns the user-facing reason if this is a validation failure.
    pub fn validation_reason(&self) -> Option<&ValidationError> {
        match self {
            DomainError::Validation(reason) => Some(reason),
            DomainError::EventStore(_) | DomainError::Projection(_) => None,
        }
    }
}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::Validation(err)
    }
}

// Store-side validation failures surface the same way as command ones
impl From<EventStoreError> for DomainError {
    fn from(err: EventStoreError) -> Self {
        match err {
            EventStoreError::Validation(reason) => DomainError::Validation(reason),
            other => DomainError::EventStore(other),
        }
    }
}

use thiserror::Error;

/// Reasons an event is refused before it reaches the log.
///
/// The messages are meant to be shown to the person who submitted the event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required form field was left blank.
    #[error("{0}")]
    MissingField(&'static str),

    #[error("product name is required")]
    MissingProduct,

    #[error("quantity must be a positive whole number")]
    NonPositiveQuantity,

    #[error("price must not be negative")]
    NegativePrice,

    #[error("{field} must be numeric")]
    NonNumeric { field: &'static str },

    /// The cash moved by one event is beyond what the ledger can total.
    #[error("amount is too large")]
    AmountOutOfRange,
}

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// The event failed validation and was not stored.
    #[error("Invalid event: {0}")]
    Validation(#[from] ValidationError),

    /// A stored row carries a kind outside the closed set.
    #[error("Unknown event kind '{kind}' for event {id}")]
    UnknownKind { id: i64, kind: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;

//! Append-only event store for the stock ledger.
//!
//! Events are validated before they are written, receive a strictly
//! increasing [`EventId`] from the store and are never changed afterwards.

pub mod error;
pub mod event;
pub mod memory;
pub mod query;
pub mod sqlite;
pub mod store;

pub use common::EventId;
pub use error::{EventStoreError, Result, ValidationError};
pub use event::{Adjustment, EventKind, LedgerEvent, MAX_AMOUNT, StoredEvent, Trade};
pub use memory::InMemoryEventStore;
pub use query::EventRange;
pub use sqlite::SqliteEventStore;
pub use store::{EventStore, EventStoreExt, EventStream};

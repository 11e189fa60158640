//! Shared types for the stock ledger workspace.

mod types;

pub use types::EventId;

//! State derivation and history queries for the stock ledger.
//!
//! This crate is the read side of the ledger:
//! - [`Projector`] folds events into a [`Snapshot`] of stock and cash
//! - [`LedgerQueries`] answers "current state" and "history" requests against a store

pub mod error;
pub mod projector;
pub mod queries;

pub use error::{ProjectionError, Result};
pub use projector::{ProjectionPosition, Projector, Snapshot, project, project_stream};
pub use queries::{History, LedgerQueries};

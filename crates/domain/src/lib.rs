//! Write side of the stock ledger.
//!
//! This crate provides:
//! - Raw-text submission commands that coerce form input into ledger events
//! - [`LedgerService`], the service object the presentation layer talks to

pub mod commands;
pub mod error;
pub mod service;

pub use commands::{AdjustBalance, RecordPurchase, RecordSale};
pub use error::DomainError;
pub use service::LedgerService;

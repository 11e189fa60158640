pub mod health;
pub mod ledger;
pub mod metrics;
